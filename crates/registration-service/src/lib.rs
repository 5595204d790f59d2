//! Event registration service.
//!
//! Accepts registration form submissions over HTTP and:
//! - Validates the required fields and email format
//! - Appends a row to a shared CSV record in blob storage
//! - Emails the operations team about each new registration

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod recorder;
pub mod registration;

pub use config::Config;
pub use error::{NotifyError, RecordError, ServiceError};
pub use notifier::Notifier;
pub use recorder::{Recorder, RecordStore};
pub use registration::{Registration, Submission, ValidationError};
