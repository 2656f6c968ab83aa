//! Tests for `error` module

use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    // Arrange - create all error variants
    let errors: Vec<Error> = vec![
        Error::Connection {
            path: "./data".into(),
            reason: "denied".into(),
        },
        Error::CollectionNotFound("test".into()),
        Error::PrerequisiteNotFound("statistics".into()),
        Error::Storage("test".into()),
        Error::Io(std::io::Error::other("test")),
        Error::Serialization("test".into()),
        Error::Csv("test".into()),
        Error::Config("test".into()),
        Error::SchemaValidation("test".into()),
        Error::Internal("test".into()),
    ];

    // Act
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");

    for code in &codes {
        assert!(
            code.starts_with("TABSTAT-"),
            "Code {code} should start with TABSTAT-"
        );
    }
}

#[test]
fn test_prerequisite_display_includes_code_and_subject() {
    // Arrange
    let err = Error::PrerequisiteNotFound("statistics document in 'water_statistics'".into());

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.contains("TABSTAT-003"));
    assert!(display.contains("water_statistics"));
}

#[test]
fn test_connection_error_is_not_recoverable() {
    let err = Error::Connection {
        path: "/nope".into(),
        reason: "read-only filesystem".into(),
    };
    assert!(!err.is_recoverable());
    assert!(Error::PrerequisiteNotFound("x".into()).is_recoverable());
    assert!(!Error::Internal("bug".into()).is_recoverable());
}

#[test]
fn test_io_error_conversion() {
    // Arrange
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");

    // Act
    let err: Error = io_err.into();

    // Assert
    assert_eq!(err.code(), "TABSTAT-005");
    assert!(err.to_string().contains("gone"));
}

#[test]
fn test_serde_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: Error = json_err.into();
    assert_eq!(err.code(), "TABSTAT-006");
}
