use thiserror::Error;

pub type Result<T> = std::result::Result<T, GactError>;

#[derive(Error, Debug)]
pub enum GactError {
    #[error("Invalid window: {0}")]
    InvalidWindow(String),
    #[error("Git error: {0}")]
    Git(String),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Commit {sha}: {reason}")]
    Commit { sha: String, reason: String },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GactError {
    /// Exit code for the CLI: a malformed time window is a usage error,
    /// everything else is a runtime failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            GactError::InvalidWindow(_) => 2,
            _ => 1,
        }
    }
}

// Manual From implementation for unboxed to boxed conversion
impl From<gix::discover::Error> for GactError {
    fn from(err: gix::discover::Error) -> Self {
        GactError::GitDiscover(Box::new(err))
    }
}
