use super::*;
use crate::headless::{FailurePoint, HeadlessDevice};
use crate::native::{NativeDevice, ResourceHeapDesc, ResourceHeapType};

// ============================================================================
// Helpers
// ============================================================================

fn recording_list(gpu: &HeadlessDevice) -> (PooledCommandAllocator, PooledCommandList) {
    let allocator = PooledCommandAllocator::new(AllocatorId(0), gpu.create_command_allocator().unwrap());
    let list = PooledCommandList::new(gpu.create_command_list(allocator.native(), None).unwrap(), allocator.id());
    (allocator, list)
}

// ============================================================================
// Close / reset tests
// ============================================================================

#[test]
fn test_close_then_reset() {
    let gpu = HeadlessDevice::default();
    let (allocator, mut list) = recording_list(&gpu);

    list.close().unwrap();
    assert!(!list.is_recording());
    list.close().unwrap();

    list.reset(&allocator, None).unwrap();
    assert!(list.is_recording());
}

#[test]
fn test_failed_close_leaves_list_recording() {
    let gpu = HeadlessDevice::default();
    let (allocator, mut list) = recording_list(&gpu);

    gpu.inject_failure(FailurePoint::CloseCommandList);
    assert!(list.close().is_err());
    assert!(list.is_recording());

    // The native list is still open, so reset closes it first
    list.reset(&allocator, None).unwrap();
    assert!(list.is_recording());
}

#[test]
#[should_panic(expected = "recording into a closed command list")]
fn test_recording_into_closed_list_panics() {
    let gpu = HeadlessDevice::default();
    let (_allocator, mut list) = recording_list(&gpu);
    list.close().unwrap();
    list.commands();
}

#[test]
#[should_panic(expected = "recording into a protected command list")]
fn test_protected_check_wins_over_closed() {
    let gpu = HeadlessDevice::default();
    let (_allocator, mut list) = recording_list(&gpu);
    list.close().unwrap();
    list.protect(1);
    list.commands();
}

// ============================================================================
// Retained heap tests
// ============================================================================

#[test]
fn test_retain_heap_once_until_recycled() {
    let gpu = HeadlessDevice::default();
    let (_allocator, mut list) = recording_list(&gpu);
    let heap = gpu.create_resource_heap(&ResourceHeapDesc {
        heap_type: ResourceHeapType::Sampler,
        capacity: 1,
        shader_visible: true,
    }).unwrap();

    list.retain_heap(&heap);
    list.retain_heap(&heap);
    assert_eq!(list.retained_heaps().len(), 1);
    assert_eq!(Arc::strong_count(&heap), 2);

    list.recycle().unwrap();
    assert!(list.retained_heaps().is_empty());
    assert_eq!(Arc::strong_count(&heap), 1);
}
