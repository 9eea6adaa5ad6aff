use thiserror::Error;

/// Error enum for the restore service using thiserror
#[derive(Error, Debug)]
pub enum RestoreServiceError {
    // Core operational errors
    #[error("Authentication failed: Invalid credentials or access denied")]
    AuthenticationFailed,

    #[error("Network error: Cannot connect to storage or database")]
    NetworkError,

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Command not found or execution error: {0}")]
    CommandNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // Provider lookups
    #[error("Unknown storage provider: {0}")]
    UnknownStorageProvider(String),

    #[error("Unknown database provider: {0}")]
    UnknownDatabaseProvider(String),

    #[error("Provider '{provider}' has no '{key}' setting")]
    MissingProviderSetting { provider: String, key: String },

    #[error("Unsupported driver '{driver}' for provider '{provider}'")]
    UnsupportedDriver { provider: String, driver: String },

    // Parameter resolution
    #[error("Unsupported compression '{0}', expected one of: none, gzip")]
    InvalidCompression(String),

    #[error("Unresolved parameters: {}", .0.join(", "))]
    UnresolvedParameters(Vec<String>),

    #[error("Restore into database '{database}' failed")]
    RestoreFailed {
        database: String,
        #[source]
        cause: Box<RestoreServiceError>,
    },

    // Automatic conversions from library errors
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    DialogueError(#[from] dialoguer::Error),

    #[error(transparent)]
    TemplateError(#[from] indicatif::style::TemplateError),
}

impl RestoreServiceError {
    pub fn with_restore_context(self, database: &str) -> RestoreServiceError {
        RestoreServiceError::RestoreFailed {
            database: database.to_string(),
            cause: Box::new(self),
        }
    }

    /// Parse stderr output of an external tool to determine the error type
    pub fn from_stderr(stderr: &str, context: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("access denied")
            || stderr_lower.contains("invalid credentials")
            || stderr_lower.contains("authentication failed")
            || stderr_lower.contains("forbidden")
            || stderr_lower.contains("invalidaccesskeyid")
        {
            RestoreServiceError::AuthenticationFailed
        } else if stderr_lower.contains("could not connect")
            || stderr_lower.contains("can't connect")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("timeout")
            || stderr_lower.contains("unreachable")
        {
            RestoreServiceError::NetworkError
        } else if stderr_lower.contains("no such file")
            || stderr_lower.contains("nosuchkey")
            || stderr_lower.contains("does not exist")
            || stderr_lower.contains("not found")
        {
            RestoreServiceError::BackupNotFound(context.to_string())
        } else {
            RestoreServiceError::CommandFailed(stderr.trim().to_string())
        }
    }
}
