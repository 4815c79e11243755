use thiserror::Error;

pub type Result<T> = std::result::Result<T, GroupStatError>;

#[derive(Error, Debug)]
pub enum GroupStatError {
    /// Any failure reported by gix while opening or reading a repository.
    #[error("Git error: {0}")]
    Git(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Remote sync error: {0}")]
    Sync(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

macro_rules! from_git_errors {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for GroupStatError {
                fn from(err: $err) -> Self {
                    GroupStatError::Git(Box::new(err))
                }
            }
        )*
    };
}

// The errors the repository walker can hit.
from_git_errors!(
    gix::open::Error,
    gix::object::find::existing::Error,
    gix::object::find::existing::with_conversion::Error,
    gix::object::commit::Error,
    gix::objs::decode::Error,
    gix::reference::find::existing::Error,
    gix::head::peel::to_commit::Error,
    gix::repository::diff_tree_to_tree::Error,
    gix::config::time::Error,
);
