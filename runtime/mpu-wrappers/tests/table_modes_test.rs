//! Handle translation modes
//!
//! Pass-through tables skip the pool entirely but keep the privilege gate;
//! the process-wide default table follows the `handle-pool` feature.

#![cfg(feature = "dynamic-allocation")]

use kernel_api::{KernelObject, QueuePosition, QueueType, TaskKernel, TaskParams, TaskPriority};
use kernel_mock::MockKernel;
use mpu_port::{MockPort, NullPort};
use mpu_wrappers::config::{self, WrapperFeatures};
use mpu_wrappers::{Handle, MpuWrappers, PassThrough, HANDLE_POOL_SIZE};

fn entry(_: usize) {}

/// Without the pool the handle is the kernel address
#[test]
fn test_pass_through_handles_are_addresses() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let table = PassThrough::new();
    let mpu = MpuWrappers::new(&port, &kernel, &table);

    let queue = mpu.queue_create(2, 1, QueueType::Base).expect("created");
    assert!(queue.raw() > HANDLE_POOL_SIZE as isize);
    assert!(mpu.queue_send(queue, &[3], 0, QueuePosition::Back));
    assert_eq!(mpu.messages_waiting(queue), 1);

    let counters = port.counters();
    assert_eq!(counters.raises, 3);
    assert_eq!(counters.resets, 3);
    // No pool, so no reservation exclusion either
    assert_eq!(counters.suspends, 0);
}

/// Kernel-returned references come back as their address
#[test]
fn test_pass_through_reverse_translation() {
    let kernel = MockKernel::new();
    let table = PassThrough::new();
    let mpu = MpuWrappers::new(&NullPort, &kernel, &table);

    let idle = kernel.idle_task().expect("kernel has an idle task");
    let handle = mpu.idle_task_handle().expect("always translatable");
    assert_eq!(handle.raw() as usize, idle.addr().get());

    let worker = mpu
        .task_create(&TaskParams {
            entry,
            name: "worker",
            stack_depth: 128,
            parameter: 0,
            priority: TaskPriority::level(1),
        })
        .expect("created");
    assert_eq!(mpu.task_handle_by_name("worker"), Some(worker));
}

/// Null and deleted handles in pass-through mode
#[test]
fn test_pass_through_null_and_delete() {
    let kernel = MockKernel::new();
    let table = PassThrough::new();
    let mpu = MpuWrappers::new(&NullPort, &kernel, &table);

    assert!(!mpu.queue_send(Handle::NULL, &[1], 0, QueuePosition::Back));
    assert!(kernel.calls().is_empty());

    let queue = mpu.queue_create(1, 1, QueueType::Base).expect("created");
    mpu.queue_delete(queue);
    // Nothing to retire in the table
    assert_eq!(kernel.call_count("queue_delete"), 1);
}

/// The shared table matches the build configuration
#[test]
fn test_default_table_follows_features() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let mpu = MpuWrappers::with_default_table(&port, &kernel);

    let group = mpu.event_group_create().expect("created");
    if config::is_handle_pool() {
        assert!(group.raw() >= 1 && group.raw() <= HANDLE_POOL_SIZE as isize);
        assert_eq!(config::table_mode(), "handle-pool");
    } else {
        assert!(group.raw() > HANDLE_POOL_SIZE as isize);
        assert_eq!(config::table_mode(), "pass-through");
    }

    assert_eq!(
        config::enabled_features().contains(WrapperFeatures::HANDLE_POOL),
        config::is_handle_pool()
    );
    mpu.event_group_delete(group);
}
