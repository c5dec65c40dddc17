//! # FixHub Audit
//! Tenant-scoped activity logging.
//!
//! `ActivityLogger` appends immutable records through an `AuditSink` and
//! guarantees the caller never sees a failure: an audit append that errors
//! must not undo or block the business mutation that already succeeded.
//! `describe_activity` renders the human-readable description per activity
//! type.

use std::sync::Arc;

use fixhub_core::error::SideEffectError;
use fixhub_core::traits::AuditSink;
use fixhub_core::types::{ActivityLogEntry, NewActivity};

/// Append-only activity logger wrapping the audit sink.
#[derive(Clone)]
pub struct ActivityLogger {
    sink: Arc<dyn AuditSink>,
}

impl ActivityLogger {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Append one activity record. Failures are logged and swallowed.
    pub async fn log(
        &self,
        business_id: &str,
        actor_id: Option<i64>,
        activity_type: &str,
        entity_type: &str,
        entity_id: &str,
        metadata: serde_json::Value,
    ) {
        if let Err(e) = self
            .try_log(business_id, actor_id, activity_type, entity_type, entity_id, metadata)
            .await
        {
            tracing::warn!("⚠️ Audit append failed ({activity_type}): {e}");
        }
    }

    /// Append one activity record, surfacing the failure as a typed
    /// side-effect error for callers that want to observe it.
    pub async fn try_log(
        &self,
        business_id: &str,
        actor_id: Option<i64>,
        activity_type: &str,
        entity_type: &str,
        entity_id: &str,
        metadata: serde_json::Value,
    ) -> Result<ActivityLogEntry, SideEffectError> {
        let description = describe_activity(activity_type, entity_type, entity_id, &metadata);
        let activity = NewActivity {
            business_id: business_id.to_string(),
            actor_id,
            activity_type: activity_type.to_string(),
            description,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            metadata,
        };
        self.sink
            .append(activity)
            .await
            .map_err(|e| SideEffectError::Audit(e.to_string()))
    }
}

fn meta_str<'a>(metadata: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(|v| v.as_str())
}

/// Render the human-readable description for an activity type from its
/// metadata. Unknown types fall back to a generic form.
pub fn describe_activity(
    activity_type: &str,
    entity_type: &str,
    entity_id: &str,
    metadata: &serde_json::Value,
) -> String {
    let code = meta_str(metadata, "code").unwrap_or(entity_id);
    match activity_type {
        "job_created" => format!("Created job {code}"),
        "job_updated" => {
            let fields = metadata
                .get("fields")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            if fields.is_empty() {
                format!("Updated job {code}")
            } else {
                format!("Updated job {code}: changed {fields}")
            }
        }
        "job_status_changed" => format!(
            "Changed job {code} status from {} to {}",
            meta_str(metadata, "from").unwrap_or("?"),
            meta_str(metadata, "to").unwrap_or("?"),
        ),
        "job_completed" => format!("Completed job {code}"),
        "job_deleted" => format!("Deleted job {code}"),
        "order_created" => format!("Created order {code}"),
        "order_updated" => {
            let fields = metadata
                .get("fields")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|f| f.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            if fields.is_empty() {
                format!("Updated order {code}")
            } else {
                format!("Updated order {code}: changed {fields}")
            }
        }
        "order_status_changed" => format!(
            "Changed order {code} status from {} to {}",
            meta_str(metadata, "from").unwrap_or("?"),
            meta_str(metadata, "to").unwrap_or("?"),
        ),
        "order_completed" => format!("Completed order {code}"),
        "order_deleted" => format!("Deleted order {code}"),
        "part_created" => format!(
            "Ordered part {}",
            meta_str(metadata, "name").unwrap_or(code)
        ),
        "part_status_changed" => format!(
            "Part {} marked {}",
            meta_str(metadata, "name").unwrap_or(code),
            meta_str(metadata, "to").unwrap_or("?"),
        ),
        "part_deleted" => format!(
            "Deleted part {}",
            meta_str(metadata, "name").unwrap_or(code)
        ),
        _ => format!("{activity_type} - {entity_type} {entity_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use fixhub_core::error::{FixHubError, Result};
    use serde_json::json;
    use std::sync::Mutex;

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _activity: NewActivity) -> Result<ActivityLogEntry> {
            Err(FixHubError::Store("disk full".into()))
        }
        async fn find_all(&self, _business_id: &str) -> Result<Vec<ActivityLogEntry>> {
            Ok(vec![])
        }
        async fn delete_older_than(&self, _cutoff: chrono::DateTime<Utc>) -> Result<u64> {
            Ok(0)
        }
    }

    struct RecordingSink {
        entries: Mutex<Vec<NewActivity>>,
    }

    #[async_trait]
    impl AuditSink for RecordingSink {
        async fn append(&self, activity: NewActivity) -> Result<ActivityLogEntry> {
            let entry = ActivityLogEntry {
                id: 1,
                business_id: activity.business_id.clone(),
                actor_id: activity.actor_id,
                activity_type: activity.activity_type.clone(),
                description: activity.description.clone(),
                entity_type: activity.entity_type.clone(),
                entity_id: activity.entity_id.clone(),
                metadata: activity.metadata.clone(),
                created_at: Utc::now(),
            };
            self.entries.lock().unwrap().push(activity);
            Ok(entry)
        }
        async fn find_all(&self, _business_id: &str) -> Result<Vec<ActivityLogEntry>> {
            Ok(vec![])
        }
        async fn delete_older_than(&self, _cutoff: chrono::DateTime<Utc>) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let logger = ActivityLogger::new(Arc::new(FailingSink));
        // Must not panic or propagate.
        logger
            .log("biz-1", Some(7), "job_created", "job", "1", json!({"code": "J-001"}))
            .await;

        let err = logger
            .try_log("biz-1", Some(7), "job_created", "job", "1", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SideEffectError::Audit(_)));
    }

    #[tokio::test]
    async fn test_description_rendered_on_append() {
        let sink = Arc::new(RecordingSink {
            entries: Mutex::new(Vec::new()),
        });
        let logger = ActivityLogger::new(sink.clone());
        logger
            .log(
                "biz-1",
                None,
                "job_status_changed",
                "job",
                "4",
                json!({"code": "J-004", "from": "Waiting Assessment", "to": "In Progress"}),
            )
            .await;

        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].description,
            "Changed job J-004 status from Waiting Assessment to In Progress"
        );
        assert!(entries[0].actor_id.is_none());
    }

    #[test]
    fn test_describe_known_types() {
        assert_eq!(
            describe_activity("job_created", "job", "1", &json!({"code": "J-001"})),
            "Created job J-001"
        );
        assert_eq!(
            describe_activity(
                "job_updated",
                "job",
                "1",
                &json!({"code": "J-001", "fields": ["description", "assignee_id"]})
            ),
            "Updated job J-001: changed description, assignee_id"
        );
        assert_eq!(
            describe_activity("part_status_changed", "part", "3", &json!({"name": "Carburetor", "to": "Arrived"})),
            "Part Carburetor marked Arrived"
        );
    }

    #[test]
    fn test_describe_unknown_type_falls_back() {
        assert_eq!(
            describe_activity("export_requested", "report", "99", &json!({})),
            "export_requested - report 99"
        );
    }
}
