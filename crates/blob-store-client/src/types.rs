//! Blob storage request and response types.

/// Text content of a blob along with its entity tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobText {
    pub content: String,
    /// `ETag` response header, used for conditional writes
    pub etag: Option<String>,
}

/// Precondition attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WriteCondition {
    /// Overwrite whatever is there.
    #[default]
    Unconditional,
    /// Only overwrite if the blob still carries this entity tag.
    IfMatch(String),
    /// Only create; fail if the blob already exists.
    IfNotExists,
}
