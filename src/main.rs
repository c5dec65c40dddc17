//! FixHub binary — owns the process lifetime: config, wiring, scheduler
//! start/stop. The HTTP API layer lives elsewhere; this binary runs the
//! recurring tasks (`serve`) or walks the lifecycle flows against seeded
//! demo data (`demo`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fixhub_audit::ActivityLogger;
use fixhub_core::clock::{Clock, SystemClock};
use fixhub_core::config::FixHubConfig;
use fixhub_core::traits::{AuditSink, ChannelKind};
use fixhub_core::types::{
    Business, Customer, NewJob, NewOrder, NewOrderItem, NewPart, JobPatch, JobStatus,
    OrderStatus, PartStatus, User, UserRole,
};
use fixhub_notify::NotificationDispatcher;
use fixhub_scheduler::{
    DailyCleanupTask, ScheduleRule, SchedulerRegistry, TaskRunner, WeeklyReportTask,
};
use fixhub_services::{JobService, OrderService, PartService, StaffNotifier};
use fixhub_store::{MemoryStore, SqliteAuditLog};

#[derive(Parser)]
#[command(name = "fixhub", version, about = "Repair-shop operations core")]
struct Cli {
    /// Config file path (default: ~/.fixhub/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the recurring task scheduler until interrupted
    Serve,
    /// Seed a demo tenant and walk the job/order/part lifecycles
    Demo,
}

/// Everything the process wires together at startup.
struct App {
    store: Arc<MemoryStore>,
    audit_db: Arc<SqliteAuditLog>,
    dispatcher: Arc<NotificationDispatcher>,
    jobs: Arc<JobService>,
    orders: Arc<OrderService>,
    parts: PartService,
    clock: Arc<SystemClock>,
}

fn build_app(config: &FixHubConfig, audit_db: SqliteAuditLog) -> App {
    let store = Arc::new(MemoryStore::new());
    let audit_db = Arc::new(audit_db);
    let clock = Arc::new(SystemClock);

    let dispatcher = Arc::new(NotificationDispatcher::from_config(
        &config.notify,
        audit_db.clone(),
    ));
    tracing::info!(
        "📨 Email chain: {:?} — SMS chain: {:?}",
        dispatcher.chain_names(ChannelKind::Email),
        dispatcher.chain_names(ChannelKind::Sms)
    );

    let activity = ActivityLogger::new(audit_db.clone());
    let staff = StaffNotifier::new(store.clone(), store.clone(), clock.clone());
    let jobs = Arc::new(JobService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        dispatcher.clone(),
        activity.clone(),
        clock.clone(),
    ));
    let orders = Arc::new(OrderService::new(
        store.clone(),
        store.clone(),
        dispatcher.clone(),
        staff,
        activity.clone(),
        jobs.clone(),
        clock.clone(),
    ));
    let parts = PartService::new(
        store.clone(),
        store.clone(),
        dispatcher.clone(),
        activity,
        jobs.clone(),
        clock.clone(),
    );

    App {
        store,
        audit_db,
        dispatcher,
        jobs,
        orders,
        parts,
        clock,
    }
}

fn start_tasks(app: &App, config: &FixHubConfig, registry: &SchedulerRegistry) {
    let scheduler = &config.scheduler;

    if scheduler.weekly_report_enabled {
        let weekday = scheduler
            .weekly_report_weekday
            .parse::<chrono::Weekday>()
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "⚠️ Invalid weekday '{}' — defaulting to mon",
                    scheduler.weekly_report_weekday
                );
                chrono::Weekday::Mon
            });
        let task = Arc::new(WeeklyReportTask::new(
            app.store.clone(),
            app.jobs.clone(),
            app.orders.clone(),
            app.dispatcher.clone(),
        ));
        let runner: TaskRunner = Arc::new(move || {
            let task = task.clone();
            Box::pin(async move {
                task.run()
                    .await
                    .map(|n| format!("notified {n} tenant(s)"))
            })
        });
        registry.start(
            "weekly-report",
            ScheduleRule::Weekly {
                weekday,
                hour: scheduler.weekly_report_hour,
                minute: scheduler.weekly_report_minute,
            },
            runner,
        );
    }

    if scheduler.cleanup_enabled {
        let task = Arc::new(DailyCleanupTask::new(
            app.audit_db.clone(),
            scheduler.activity_retention_days,
            app.clock.clone(),
        ));
        let runner: TaskRunner = Arc::new(move || {
            let task = task.clone();
            Box::pin(async move {
                task.run().await.map(|n| format!("removed {n} record(s)"))
            })
        });
        registry.start(
            "daily-cleanup",
            ScheduleRule::Daily {
                hour: scheduler.cleanup_hour,
                minute: scheduler.cleanup_minute,
            },
            runner,
        );
    }
}

async fn serve(config: FixHubConfig) -> anyhow::Result<()> {
    let audit_db = SqliteAuditLog::open(&FixHubConfig::home_dir().join("audit.db"))
        .context("open audit database")?;
    let app = build_app(&config, audit_db);

    let registry = SchedulerRegistry::new(app.clock.clone());
    start_tasks(&app, &config, &registry);
    tracing::info!("🚀 FixHub running — tasks: {:?}", registry.task_names());

    tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;
    tracing::info!("Shutting down");
    registry.stop();
    Ok(())
}

async fn demo(config: FixHubConfig) -> anyhow::Result<()> {
    let app = build_app(&config, SqliteAuditLog::open_in_memory()?);
    let business_id = "demo";

    app.store
        .seed_business(Business {
            id: business_id.into(),
            name: "North Shore Repairs".into(),
            email: Some("owner@example.com".into()),
            phone: None,
            active: true,
            created_at: app.clock.now(),
        })
        .await;
    let customer = app
        .store
        .seed_customer(Customer {
            id: 0,
            business_id: business_id.into(),
            name: "Sam Porter".into(),
            email: Some("sam@example.com".into()),
            phone: Some("+15550123".into()),
        })
        .await;
    for (email, role) in [
        ("tech@example.com", UserRole::Staff),
        ("owner@example.com", UserRole::Admin),
    ] {
        app.store
            .seed_user(User {
                id: 0,
                business_id: business_id.into(),
                email: email.into(),
                name: email.into(),
                role,
            })
            .await;
    }

    // Job lifecycle: booked → in progress → ready → completed.
    let job = app
        .jobs
        .create(
            business_id,
            NewJob {
                customer_id: Some(customer.id),
                description: "Stihl MS 180 chainsaw — won't start".into(),
                estimated_hours: Some(1.5),
                ..Default::default()
            },
            Some(1),
        )
        .await?;
    app.jobs
        .add_update(business_id, job.id, "Assessed: carburetor rebuild", true, Some(1))
        .await?;
    for status in [JobStatus::InProgress, JobStatus::ReadyForPickup, JobStatus::Completed] {
        app.jobs
            .update(
                business_id,
                job.id,
                JobPatch {
                    status: Some(status),
                    ..Default::default()
                },
                Some(1),
            )
            .await?;
    }

    // Order lifecycle: placed (customer + staff notified) → arrived.
    let order = app
        .orders
        .create(
            business_id,
            NewOrder {
                customer_name: customer.name.clone(),
                customer_email: customer.email.clone(),
                notify_on_placed: true,
                job_id: Some(job.id),
                items: vec![NewOrderItem {
                    name: "Carburetor kit".into(),
                    sku: Some("CK-180".into()),
                    quantity: 1,
                    unit_price_cents: 4250,
                }],
                ..Default::default()
            },
            Some(1),
        )
        .await?;
    app.orders
        .set_status(business_id, order.id, OrderStatus::Arrived, true, Some(1))
        .await?;

    // Single part with its own arrival feed.
    let part = app
        .parts
        .create(
            business_id,
            NewPart {
                name: "Recoil starter".into(),
                customer_name: customer.name.clone(),
                customer_email: customer.email.clone(),
                notify: true,
                ..Default::default()
            },
            Some(1),
        )
        .await?;
    app.parts
        .set_status(business_id, part.id, PartStatus::Arrived, None, Some(1))
        .await?;

    // Recurring task bodies, run once by hand.
    let report = WeeklyReportTask::new(
        app.store.clone(),
        app.jobs.clone(),
        app.orders.clone(),
        app.dispatcher.clone(),
    );
    let notified = report.run().await?;
    let cleanup = DailyCleanupTask::new(app.audit_db.clone(), 365, app.clock.clone());
    let removed = cleanup.run().await?;

    tracing::info!("📊 Report notified {notified} tenant(s); cleanup removed {removed} row(s)");
    tracing::info!("📜 Activity trail:");
    for entry in AuditSink::find_all(&*app.audit_db, business_id).await? {
        tracing::info!(
            "  [{}] {}",
            entry.created_at.format("%H:%M:%S"),
            entry.description
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FixHubConfig::load_from(path)?,
        None => FixHubConfig::load()?,
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Demo => demo(config).await,
    }
}
