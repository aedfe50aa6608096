use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("not a taskchain directory (run `taskchain init` first)")]
    NotInitialized,

    #[error("taskchain already initialized in this directory")]
    AlreadyInitialized,

    #[error("task {0} not found")]
    TaskNotFound(u64),

    #[error("task {0} cannot depend on itself")]
    SelfDependency(u64),

    #[error("dependency would create a cycle involving task {0}")]
    CycleDetected(u64),

    #[error("dependency {0} does not refer to a known task")]
    UnknownDependency(u64),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl ChainError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::TaskNotFound(_) => "task_not_found",
            Self::SelfDependency(_) => "self_dependency",
            Self::CycleDetected(_) => "cycle_detected",
            Self::UnknownDependency(_) => "unknown_dependency",
            Self::EmptyField(_) => "empty_field",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Db(_) => "db_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
