//! Integration tests for the MPU wrapper layer
//!
//! These tests drive the adapters end to end against the in-memory kernel:
//! - Handle allocation, reuse and exhaustion
//! - Invalid handle robustness
//! - Privilege symmetry and barrier placement
//! - Creation rollback
//! - Timeouts passed through untouched

#![cfg(all(
    feature = "handle-pool",
    feature = "dynamic-allocation",
    feature = "timers",
    feature = "stream-buffers",
    feature = "queue-sets"
))]

use kernel_api::{
    QueuePosition, QueueType, StreamBufferParams, TaskKernel, TaskParams, TaskPriority,
    TaskState, TimerCommand, TimerParams, TimerRef, MAX_DELAY,
};
use kernel_mock::MockKernel;
use mpu_port::{MockPort, PortEvent, PrivilegePort};
use mpu_wrappers::{
    EventGroupHandle, Handle, HandlePool, MpuWrappers, QueueHandle, QueueSetHandle, Slot,
    StreamBufferHandle, TaskHandle, TimerHandle,
};

fn entry(_: usize) {}

fn expired(_: TimerRef) {}

fn task_params(name: &str) -> TaskParams<'_> {
    TaskParams {
        entry,
        name,
        stack_depth: 512,
        parameter: 0,
        priority: TaskPriority::level(2),
    }
}

fn timer_params() -> TimerParams<'static> {
    TimerParams {
        name: "tick",
        period: 20,
        auto_reload: true,
        id: 0,
        callback: expired,
    }
}

/// Run one adapter call and check how many times it raised privilege
macro_rules! assert_gated {
    ($port:expr, $raises:expr, $call:expr) => {{
        $port.reset_counters();
        let _ = $call;
        let counters = $port.counters();
        assert_eq!(
            (counters.raises, counters.resets),
            ($raises, $raises),
            "privilege raised/reset unevenly in `{}`",
            stringify!($call)
        );
    }};
}

// ============================================================
// Handle Allocation
// ============================================================

/// Capacity 4: A-D get 1..4, B is deleted, E reuses 2, F fails
#[test]
fn test_allocation_reuse_and_exhaustion() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let handles: Vec<QueueHandle> = (0..4)
        .map(|_| mpu.queue_create(4, 4, QueueType::Base).expect("pool has room"))
        .collect();
    assert_eq!(
        handles.iter().map(|h| h.raw()).collect::<Vec<_>>(),
        [1, 2, 3, 4]
    );

    let b = pool.lookup(1).expect("B is bound");
    mpu.queue_delete(handles[1]);
    assert_eq!(pool.slot(1), Some(Slot::Free));
    assert!(!kernel.is_live(b));

    let e = mpu.queue_create(4, 4, QueueType::Base).expect("slot 2 is free");
    assert_eq!(e.raw(), 2);

    let before = pool.snapshot();
    kernel.clear_calls();
    assert_eq!(mpu.queue_create(4, 4, QueueType::Base), None);
    assert_eq!(pool.snapshot(), before);
    assert_eq!(kernel.call_count("queue_create"), 0);
}

/// Every handle kind shares the one pool, and each handle resolves to the
/// object created for it
#[test]
fn test_mixed_kinds_share_pool() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<8>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let task: TaskHandle = mpu.task_create(&task_params("worker")).unwrap();
    let queue: QueueHandle = mpu.queue_create(2, 1, QueueType::Base).unwrap();
    let set: QueueSetHandle = mpu.queue_set_create(2).unwrap();
    let group: EventGroupHandle = mpu.event_group_create().unwrap();
    let timer: TimerHandle = mpu.timer_create(&timer_params()).unwrap();
    let stream: StreamBufferHandle = mpu
        .stream_buffer_create(&StreamBufferParams::stream(16, 1))
        .unwrap();

    let raws = [
        task.raw(),
        queue.raw(),
        set.raw(),
        group.raw(),
        timer.raw(),
        stream.raw(),
    ];
    assert_eq!(raws, [1, 2, 3, 4, 5, 6]);

    for raw in raws {
        let object = pool.lookup(raw as usize - 1).expect("bound after create");
        assert!(kernel.is_live(object));
    }

    assert_eq!(mpu.task_state(task), TaskState::Ready);
    assert!(mpu.queue_set_add(queue, set));
    assert_eq!(mpu.event_group_set_bits(group, 0x3), 0x3);
    assert!(mpu.timer_start(timer, 0));
    assert_eq!(mpu.stream_buffer_send(stream, b"abc", 0), 3);
}

/// A kernel-side creation failure gives the reserved slot back
#[test]
fn test_rollback_on_kernel_failure() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<2>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    kernel.fail_next_creates(1);
    assert_eq!(mpu.event_group_create(), None);
    assert_eq!(pool.snapshot(), [Slot::Free, Slot::Free]);
    assert_eq!(kernel.call_count("event_group_create"), 1);

    // Invalid parameters are a kernel failure too
    assert_eq!(mpu.timer_create(&TimerParams { period: 0, ..timer_params() }), None);
    assert_eq!(pool.snapshot(), [Slot::Free, Slot::Free]);

    let group = mpu.event_group_create().expect("kernel recovered");
    assert_eq!(group.raw(), 1);

    let counters = port.counters();
    assert_eq!(counters.raises, 3);
    assert_eq!(counters.resets, 3);
}

/// Objects outliving their handle slot are never reachable again through it
#[test]
fn test_reused_slot_never_reaches_old_object() {
    let port = MockPort::privileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<1>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let queue = mpu.queue_create(1, 1, QueueType::Base).unwrap();
    mpu.queue_delete(queue);

    let group = mpu.event_group_create().unwrap();
    assert_eq!(queue.raw(), group.raw());

    // The stale queue handle now points at an event group
    kernel.clear_calls();
    assert!(!mpu.queue_send(queue, &[1], 0, QueuePosition::Back));
    assert_eq!(mpu.messages_waiting(queue), 0);
    assert!(kernel.calls().is_empty());
}

// ============================================================
// Invalid Handles
// ============================================================

/// Handles 0, capacity + offset and negatives fail without side effects
#[test]
fn test_invalid_handles_are_ignored() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    mpu.queue_create(1, 1, QueueType::Base).unwrap();
    let before = pool.snapshot();
    kernel.clear_calls();

    for raw in [0, 5, -1, isize::MIN, isize::MAX] {
        let mut buffer = [0u8; 4];
        let mut woken = false;

        assert!(!mpu.queue_send(Handle::from_raw(raw), &[1], 0, QueuePosition::Back));
        assert!(!mpu.queue_receive(Handle::from_raw(raw), &mut buffer, 0));
        assert!(!mpu.queue_receive_from_isr(Handle::from_raw(raw), &mut buffer, &mut woken));
        assert_eq!(mpu.messages_waiting(Handle::from_raw(raw)), 0);
        mpu.queue_delete(Handle::from_raw(raw));

        assert_eq!(mpu.queue_set_select(Handle::from_raw(raw), 0), None);
        assert_eq!(mpu.event_group_wait_bits(Handle::from_raw(raw), 1, false, true, 0), 0);
        assert!(!mpu.timer_command(Handle::from_raw(raw), TimerCommand::Start, 0));
        assert!(!mpu.timer_delete(Handle::from_raw(raw), 0));
        assert_eq!(mpu.timer_name(Handle::from_raw(raw)), None);
        assert_eq!(mpu.stream_buffer_send(Handle::from_raw(raw), b"x", 0), 0);
        mpu.stream_buffer_delete(Handle::from_raw(raw));
    }

    // Null task handles mean "the caller", so only non-null values here
    for raw in [5, -1, isize::MIN] {
        assert_eq!(mpu.task_state(Handle::from_raw(raw)), TaskState::Invalid);
        assert_eq!(mpu.task_priority_get(Handle::from_raw(raw)), 0);
        assert_eq!(mpu.task_name(Handle::from_raw(raw)), None);
        mpu.task_delete(Handle::from_raw(raw));
    }

    assert!(kernel.calls().is_empty());
    assert_eq!(pool.snapshot(), before);
    assert!(!port.is_privileged());
}

/// A valid handle of the wrong kind is treated like an invalid one
#[test]
fn test_kind_mismatch_is_ignored() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let group = mpu.event_group_create().unwrap();
    let as_timer: TimerHandle = Handle::from_raw(group.raw());
    let as_queue: QueueHandle = Handle::from_raw(group.raw());
    kernel.clear_calls();

    assert!(!mpu.timer_delete(as_timer, 0));
    mpu.queue_delete(as_queue);

    assert!(kernel.calls().is_empty());
    assert_eq!(pool.bound_count(), 1);
    assert_eq!(mpu.event_group_set_bits(group, 1), 1);
}

// ============================================================
// Privilege Gate
// ============================================================

/// Each adapter call from an unprivileged task raises and resets exactly once
#[test]
fn test_unprivileged_calls_raise_once() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<8>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let bogus = 99;
    let mut buffer = [0u8; 4];

    assert_gated!(port, 1, mpu.task_create(&task_params("t")));
    let task = mpu.task_handle_by_name("t").unwrap();
    assert_gated!(port, 1, mpu.task_priority_set(task, TaskPriority::level(4)));
    assert_gated!(port, 1, mpu.task_priority_get(Handle::NULL));
    assert_gated!(port, 1, mpu.task_suspend(task));
    assert_gated!(port, 1, mpu.task_state(Handle::from_raw(bogus)));
    assert_gated!(port, 1, mpu.current_task_handle());
    assert_gated!(port, 1, mpu.tick_count());

    assert_gated!(port, 1, mpu.queue_create(1, 4, QueueType::Base));
    let queue: QueueHandle = Handle::from_raw(2);
    assert_gated!(port, 1, mpu.queue_send(queue, &[1, 2, 3, 4], 0, QueuePosition::Back));
    assert_gated!(port, 1, mpu.queue_peek(queue, &mut buffer, 0));
    assert_gated!(port, 1, mpu.queue_receive(Handle::from_raw(bogus), &mut buffer, 0));
    assert_gated!(port, 1, mpu.mutex_holder(queue));

    assert_gated!(port, 1, mpu.queue_set_create(1));
    assert_gated!(port, 1, mpu.queue_set_add(queue, Handle::from_raw(3)));
    assert_gated!(port, 1, mpu.queue_set_select(Handle::from_raw(3), 0));

    assert_gated!(port, 1, mpu.event_group_create());
    assert_gated!(port, 1, mpu.event_group_sync(Handle::from_raw(4), 1, 1, 0));

    assert_gated!(port, 1, mpu.timer_create(&timer_params()));
    assert_gated!(port, 1, mpu.timer_command(Handle::from_raw(5), TimerCommand::Delete, 0));
    assert_gated!(port, 1, mpu.timer_daemon_task_handle());

    assert_gated!(port, 1, mpu.stream_buffer_create(&StreamBufferParams::stream(8, 1)));
    assert_gated!(port, 1, mpu.stream_buffer_send(Handle::from_raw(5), b"hi", 0));
    assert_gated!(port, 1, mpu.stream_buffer_delete(Handle::from_raw(5)));

    assert_gated!(port, 1, mpu.run_privileged(|| ()));

    // Create through an exhausted pool still raises once
    for _ in 0..8 {
        mpu.event_group_create();
    }
    assert_gated!(port, 1, mpu.event_group_create());

    assert!(!port.is_privileged());
}

/// Privileged callers never touch the raise/reset primitives
#[test]
fn test_privileged_calls_never_raise() {
    let port = MockPort::privileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    assert_gated!(port, 0, mpu.task_create(&task_params("t")));
    assert_gated!(port, 0, mpu.task_state(Handle::from_raw(1)));
    assert_gated!(port, 0, mpu.queue_create(1, 1, QueueType::Base));
    assert_gated!(port, 0, mpu.queue_send(Handle::from_raw(2), &[0], 0, QueuePosition::Back));
    assert_gated!(port, 0, mpu.queue_send(Handle::from_raw(0), &[0], 0, QueuePosition::Back));
    assert_gated!(port, 0, mpu.timer_create(&timer_params()));
    assert_gated!(port, 0, mpu.timer_delete(Handle::from_raw(3), 0));
    assert_gated!(port, 0, mpu.run_privileged(|| 1));

    assert!(port.events().iter().all(|e| !matches!(e, PortEvent::Barrier)));
    assert!(port.is_privileged());
}

/// Barriers sit on both sides of the privileged section
#[test]
fn test_barrier_placement() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<2>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let queue = mpu.queue_create(1, 1, QueueType::Base).unwrap();
    port.reset_counters();

    assert!(mpu.queue_send(queue, &[5], 0, QueuePosition::Back));
    assert_eq!(
        port.events(),
        [
            PortEvent::Raise,
            PortEvent::Barrier,
            PortEvent::Barrier,
            PortEvent::Reset,
            PortEvent::Barrier,
        ]
    );
}

/// Reservation suspends the scheduler, release enters a critical section,
/// both while privileged
#[test]
fn test_pool_exclusion_inside_gate() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<2>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let group = mpu.event_group_create().unwrap();
    assert_eq!(
        port.events(),
        [
            PortEvent::Raise,
            PortEvent::Barrier,
            PortEvent::SuspendAll,
            PortEvent::ResumeAll,
            PortEvent::Barrier,
            PortEvent::Reset,
            PortEvent::Barrier,
        ]
    );

    port.reset_counters();
    mpu.event_group_delete(group);
    assert_eq!(
        port.events(),
        [
            PortEvent::Raise,
            PortEvent::Barrier,
            PortEvent::EnterCritical,
            PortEvent::ExitCritical,
            PortEvent::Barrier,
            PortEvent::Reset,
            PortEvent::Barrier,
        ]
    );
}

/// Interrupt-context variants translate and forward only
#[test]
fn test_isr_variants_skip_gate() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let task = mpu.task_create(&task_params("t")).unwrap();
    let queue = mpu.queue_create(2, 1, QueueType::Base).unwrap();
    let group = mpu.event_group_create().unwrap();
    let timer = mpu.timer_create(&timer_params()).unwrap();
    port.reset_counters();

    let mut woken = false;
    let mut buffer = [0u8; 1];
    assert!(mpu.queue_send_from_isr(queue, &[1], QueuePosition::Back, &mut woken));
    assert_eq!(mpu.messages_waiting_from_isr(queue), 1);
    assert!(mpu.queue_receive_from_isr(queue, &mut buffer, &mut woken));
    assert!(mpu.event_group_set_bits_from_isr(group, 0x10, &mut woken));
    assert_eq!(mpu.event_group_bits_from_isr(group), 0x10);
    assert!(mpu.timer_command_from_isr(timer, TimerCommand::Start, &mut woken));
    assert_eq!(mpu.task_priority_get_from_isr(task), 2);
    mpu.tick_count_from_isr();

    // Invalid handle from an ISR: failure value, still no gate
    assert!(!mpu.queue_send_from_isr(Handle::from_raw(-3), &[1], QueuePosition::Back, &mut woken));

    assert!(port.events().is_empty());
}

// ============================================================
// Pass-through of Values
// ============================================================

/// Timeouts reach the kernel unchanged
#[test]
fn test_timeouts_passed_through() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let queue = mpu.queue_create(1, 1, QueueType::Base).unwrap();
    let group = mpu.event_group_create().unwrap();
    let mut buffer = [0u8; 1];

    assert!(!mpu.queue_receive(queue, &mut buffer, MAX_DELAY));
    assert_eq!(kernel.last_ticks(), Some(MAX_DELAY));

    mpu.event_group_wait_bits(group, 1, true, false, 123);
    assert_eq!(kernel.last_ticks(), Some(123));

    mpu.task_delay(7);
    assert_eq!(kernel.last_ticks(), Some(7));
}

/// Handle-returning queries translate kernel references back
#[test]
fn test_reverse_translation() {
    let port = MockPort::unprivileged();
    let kernel = MockKernel::new();
    let pool = HandlePool::<4>::new();
    let mpu = MpuWrappers::new(&port, &kernel, &pool);

    let worker = mpu.task_create(&task_params("worker")).unwrap();
    assert_eq!(mpu.task_handle_by_name("worker"), Some(worker));
    assert_eq!(mpu.task_handle_by_name("missing"), None);

    // Kernel-created tasks have no handle until adopted
    assert_eq!(mpu.idle_task_handle(), None);

    kernel.set_current(kernel.task_by_name("worker"));
    assert_eq!(mpu.current_task_handle(), Some(worker));
}
