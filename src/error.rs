/// Errors surfaced by this crate.
///
/// Tracking inconsistencies reported by sources are deliberately *not* in
/// here: a derived view logs those and carries on.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// `auto_dispose_after` was set to zero.
    #[error("auto-dispose timeout must be greater than zero")]
    ZeroIdleTimeout,

    /// The serialized view configuration could not be parsed.
    #[error("invalid view configuration: {0}")]
    InvalidConfig(#[source] serde_json::Error),

    /// A recorded change does not fit the list it is replayed onto.
    #[error("diff index {idx} out of range for list of length {len}")]
    DiffOutOfRange { idx: usize, len: usize },

    /// Reading or writing a diff log failed.
    #[error("diff log i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON diff record could not be decoded.
    #[error("malformed JSON diff record: {0}")]
    Json(#[from] serde_json::Error),

    /// A binary diff record could not be encoded or decoded.
    #[error("malformed binary diff record: {0}")]
    Bincode(#[from] bincode::Error),
}
