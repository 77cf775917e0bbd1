pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed schedule document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("no event with id `{0}`")]
    UnknownEvent(String),

    #[error("unknown event type `{0}`")]
    UnknownKind(String),

    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}
