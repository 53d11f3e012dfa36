use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlsentryError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// No GET, POST, Cookie or User-Agent source was supplied at all.
    #[error("Configuration error: {0}")]
    MissingParameters(String),

    /// Sources exist but the test-parameter filter excluded every one of them.
    #[error("Configuration error: {0}")]
    FilteredParameters(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("File path error: {0}")]
    FilePath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SqlsentryError {
    /// Generic configuration errors share one exit path; the variants only
    /// differ in the remediation they point at.
    pub fn is_config_kind(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::MissingParameters(_) | Self::FilteredParameters(_)
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Syntax(_) => 2,
            e if e.is_config_kind() => 3,
            Self::FilePath(_) => 4,
            Self::InvalidTarget(_) => 5,
            _ => 1,
        }
    }
}
