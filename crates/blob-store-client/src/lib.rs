//! Azure Blob Storage client for small text records.
//!
//! Covers the handful of Blob service operations needed to keep a single
//! text object up to date: create a container if absent, download a blob as
//! text (with a distinct not-found signal), and upload a block blob with an
//! optional entity-tag precondition.

mod client;
mod connection;
mod error;
mod signing;
mod types;

pub use client::{BlobClient, API_VERSION};
pub use connection::{ConnectionString, Credentials};
pub use error::BlobError;
pub use types::*;
