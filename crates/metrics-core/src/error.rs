use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sheet-metrics crates.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or rendered.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Neither a key file nor a key environment variable was available.
    #[error("No service account key found in {path} or in ${env_vars}")]
    CredentialsNotFound { path: PathBuf, env_vars: String },

    /// A service account key was found but is unusable.
    #[error("Invalid service account key: {0}")]
    InvalidCredentials(String),

    /// The OAuth token exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level HTTP failure (DNS, TLS, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The row source answered with a non-success status.
    #[error("Row source returned HTTP {status}: {body}")]
    SourceHttp { status: u16, body: String },

    /// A raw dump document does not have the expected shape.
    #[error("Invalid data format: {0}")]
    InvalidDump(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the metrics crates.
pub type Result<T> = std::result::Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = MetricsError::FileRead {
            path: PathBuf::from("/some/data.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/data.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_credentials_not_found() {
        let err = MetricsError::CredentialsNotFound {
            path: PathBuf::from("service-account.json"),
            env_vars: "GOOGLE_SERVICE_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No service account key found in service-account.json or in $GOOGLE_SERVICE_KEY"
        );
    }

    #[test]
    fn test_error_display_source_http() {
        let err = MetricsError::SourceHttp {
            status: 403,
            body: "PERMISSION_DENIED".to_string(),
        };
        assert_eq!(err.to_string(), "Row source returned HTTP 403: PERMISSION_DENIED");
    }

    #[test]
    fn test_error_display_invalid_dump() {
        let err = MetricsError::InvalidDump("missing \"data\" property".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid data format: missing \"data\" property"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = MetricsError::Config("spreadsheet id is empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: spreadsheet id is empty");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: MetricsError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
