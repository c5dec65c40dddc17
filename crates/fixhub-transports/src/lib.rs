//! # FixHub Transports
//! Outbound channel implementations behind the `Transport` trait.
//!
//! One adapter per provider: SMTP (lettre) and Mailgun for email, Twilio for
//! SMS, plus a demo adapter that logs instead of sending. Each adapter makes
//! exactly one delivery attempt per `send` call; chain ordering and fallback
//! live in `fixhub-notify`.

pub mod demo;
pub mod mailgun;
pub mod smtp;
pub mod twilio;

pub use demo::DemoTransport;
pub use mailgun::MailgunTransport;
pub use smtp::SmtpTransport;
pub use twilio::TwilioTransport;
