//! Unit tests for error.rs
//!
//! Tests all Error variants, their Display text and the fatal/non-fatal split.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("CreateCommandAllocator failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("CreateCommandAllocator failed"));
}

#[test]
fn test_device_lost_display() {
    let err = Error::DeviceLost("fence wait returned device removed".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Device lost"));
    assert!(display.contains("device removed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("no binding for 'Transform'".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("Transform"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("queue creation failed".to_string());
    assert!(format!("{}", err).contains("Initialization failed"));
}

// ============================================================================
// FATALITY
// ============================================================================

#[test]
fn test_native_failures_are_fatal() {
    assert!(Error::BackendError("x".to_string()).is_fatal());
    assert!(Error::DeviceLost("x".to_string()).is_fatal());
    assert!(Error::OutOfMemory.is_fatal());
    assert!(Error::InitializationFailed("x".to_string()).is_fatal());
}

#[test]
fn test_invalid_resource_is_not_fatal() {
    assert!(!Error::InvalidResource("x".to_string()).is_fatal());
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_keeps_message() {
    let err1 = Error::DeviceLost("hung".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::BackendError("signal failed".to_string()))
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    match outer() {
        Err(Error::BackendError(msg)) => assert_eq!(msg, "signal failed"),
        other => panic!("unexpected result: {:?}", other),
    }
}
