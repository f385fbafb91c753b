//! Error types for the grambank retrieval pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Entity store or index files are missing or malformed.
    #[error("Load error: {0}")]
    Load(String),

    /// Index vectors and identifiers (or query vectors) disagree.
    #[error("Index mismatch: {0}")]
    IndexMismatch(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl Error {
    /// True for errors that must halt query serving (startup failures).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Load(_) | Error::IndexMismatch(_) | Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_load() {
        let err = Error::Load("all_entities_properties.json".to_string());
        assert!(err.to_string().contains("Load error"));
        assert!(err.to_string().contains("all_entities_properties.json"));
    }

    #[test]
    fn test_error_display_index_mismatch() {
        let err = Error::IndexMismatch("3 vectors, 2 identifiers".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Index mismatch"));
        assert!(msg.contains("3 vectors"));
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("rate limit exceeded".to_string());
        assert!(err.to_string().contains("Embedding"));
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn test_error_display_generation() {
        let err = Error::Generation("model overloaded".to_string());
        assert!(err.to_string().contains("Generation error"));
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("unknown backend 'foo'".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();

        assert!(matches!(err, Error::SerializationError(_)));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn fatal_errors_are_startup_errors() {
        assert!(Error::Load("x".into()).is_fatal());
        assert!(Error::IndexMismatch("x".into()).is_fatal());
        assert!(Error::Config("x".into()).is_fatal());
        assert!(!Error::Embedding("x".into()).is_fatal());
        assert!(!Error::Generation("x".into()).is_fatal());
        assert!(!Error::InvalidArgument("x".into()).is_fatal());
    }

    #[test]
    fn test_result_unwrap_or_else() {
        let result: Result<i32> = Err(Error::Generation("error".to_string()));
        let value = result.unwrap_or_else(|_| 42);
        assert_eq!(value, 42);
    }
}
