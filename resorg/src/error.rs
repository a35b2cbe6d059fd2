//! All error types for the resorg crate.
//!
//! These are returned from all fallible operations (parsing, persistence,
//! archive export, etc.). Data-quality findings such as duplicate names or
//! conflicting translations are *not* errors; they are reported through
//! [`crate::diagnostics::DiagnosticSink`] and processing continues.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("invalid data: {0}")]
    DataMismatch(String),
}

impl Error {
    /// Creates a new invalid-resource error.
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Error::InvalidResource(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_invalid_resource_error() {
        let error = Error::invalid_resource("data element missing 'name'");
        assert_eq!(
            error.to_string(),
            "invalid resource: data element missing 'name'"
        );
    }

    #[test]
    fn test_data_mismatch_error() {
        let error = Error::DataMismatch("bad attribute".to_string());
        assert_eq!(error.to_string(), "invalid data: bad attribute");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::InvalidResource("test".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("InvalidResource"));
        assert!(debug.contains("test"));
    }
}
