//! Integration tests for diagnostics emitted through the logger slot
//!
//! The logger slot is process-wide, so every test here is #[serial].
//!
//! Run with: cargo test --test logging_integration_tests

mod gpu_test_utils;

use galaxy_3d_gpu_core::galaxy3d::{Error, ResourceBindings};
use galaxy_3d_gpu_core::galaxy3d::command::SubmissionBatch;
use galaxy_3d_gpu_core::galaxy3d::log::{LogEntry, LogSeverity, Logger};
use galaxy_3d_gpu_core::galaxy3d::native::{
    FixedFunctionState, NativeTexture, ResourceState, TextureFormat, TextureUsage,
};
use galaxy_3d_gpu_core::galaxy3d::FrameTarget;
use galaxy_3d_gpu_core::log;
use gpu_test_utils::{device, immediate_gpu, texture, textured_combination};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Captures every entry for later inspection
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    fn install() -> Arc<Mutex<Vec<LogEntry>>> {
        let entries = Arc::new(Mutex::new(Vec::new()));
        log::set_logger(Self { entries: entries.clone() });
        entries
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn from_source(entries: &Arc<Mutex<Vec<LogEntry>>>, source: &str) -> Vec<LogEntry> {
    entries.lock().unwrap().iter().filter(|e| e.source == source).cloned().collect()
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_device_creation_is_logged() {
    let entries = CaptureLogger::install();

    let gpu = immediate_gpu();
    let _device = device(&gpu);

    let device_logs = from_source(&entries, "galaxy3d::RenderDevice");
    assert!(device_logs.iter().any(|e| e.severity == LogSeverity::Info && e.message.contains("Galaxy3D Device")));
    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_cache_miss_logged_once() {
    let entries = CaptureLogger::install();
    let gpu = immediate_gpu();
    let mut device = device(&gpu);
    let shaders = textured_combination("textured_ps");
    let state = FixedFunctionState::default();

    device.get_pipeline(&state, &shaders).unwrap();
    device.get_pipeline(&state, &shaders).unwrap();

    let misses = from_source(&entries, "galaxy3d::PipelineStateCache")
        .into_iter()
        .filter(|e| e.message.starts_with("Cache miss"))
        .count();
    assert_eq!(misses, 1);
    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_invalid_material_logs_error_with_location() {
    let entries = CaptureLogger::install();
    let gpu = immediate_gpu();
    let mut device = device(&gpu);

    let result = device.create_material_binding(&textured_combination("textured_ps"), &ResourceBindings::new());

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    let errors: Vec<LogEntry> = from_source(&entries, "galaxy3d::RenderDevice")
        .into_iter()
        .filter(|e| e.severity == LogSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Transform"));
    assert!(errors[0].file.is_some());
    assert!(errors[0].line.is_some());
    log::reset_logger();
}

#[test]
#[serial]
fn test_integration_barrier_mismatch_warns() {
    let entries = CaptureLogger::install();
    let gpu = immediate_gpu();
    let mut device = device(&gpu);
    let back: Arc<dyn NativeTexture> = texture(
        &device, "back_buffer", TextureFormat::B8G8R8A8_UNORM, TextureUsage::RenderTarget, ResourceState::RenderTarget,
    );
    let frame = FrameTarget::new(back, None);

    let allocator = device.obtain_command_allocator().unwrap();
    let mut list = device.obtain_command_list(&allocator, None).unwrap();
    frame.record_begin_frame(&mut list);
    device.submit(SubmissionBatch::single(allocator, list)).unwrap();

    let warnings = from_source(&entries, "galaxy3d::HeadlessValidation");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, LogSeverity::Warn);
    assert!(warnings[0].message.contains("back_buffer"));
    log::reset_logger();
}
