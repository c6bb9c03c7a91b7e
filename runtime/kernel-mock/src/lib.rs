//! In-memory mock kernel for host testing
//!
//! # WARNING: This is NOT a real scheduler!
//!
//! `MockKernel` implements every primitive of `kernel_api` against plain
//! collections so the MPU wrappers can be exercised on the host. Nothing
//! ever blocks: timeouts are recorded and an operation that would block
//! simply fails.
//!
//! ## Test Hooks
//!
//! - **Failure injection**: [`MockKernel::fail_next_creates`] and
//!   [`MockKernel::set_object_limit`] make create primitives return `None`
//! - **Call log**: every primitive records its name, see
//!   [`MockKernel::calls`] and [`MockKernel::call_count`]
//! - **Timeouts**: the last `ticks` argument is kept, see
//!   [`MockKernel::last_ticks`]
//! - **Identity**: [`MockKernel::set_current`] picks the calling task
//!
//! Object addresses start at `0x1000` and advance by `0x10`; they are
//! never reused, so a stale reference can never alias a new object.

use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;

use kernel_api::{
    EventBits, KernelObject, MemoryRegion, ObjectKind, ObjectName, ObjectRef, QueueRef,
    QueueType, SchedulerState, StreamBufferKind, TaskHook, TaskPriority, TaskRef, TaskState,
    TickType, TimerCallback, NUM_THREAD_LOCAL_STORAGE_POINTERS, TASK_NOTIFICATION_ARRAY_ENTRIES,
};
use spin::Mutex;

mod event_group;
mod queue;
mod stream_buffer;
mod task;
mod timer;

const FIRST_ADDR: usize = 0x1000;
const ADDR_STEP: usize = 0x10;

/// Name given to the idle task created with the kernel
pub const IDLE_TASK_NAME: &str = "IDLE";

/// Name given to the timer service task created with the kernel
pub const TIMER_TASK_NAME: &str = "Tmr Svc";

// ========== Object State ==========

pub(crate) struct MockTask {
    pub name: ObjectName,
    pub priority: u32,
    pub privileged: bool,
    pub state: TaskState,
    pub stack_depth: u32,
    pub regions: Vec<MemoryRegion>,
    pub notify_value: [u32; TASK_NOTIFICATION_ARRAY_ENTRIES],
    pub notify_pending: [bool; TASK_NOTIFICATION_ARRAY_ENTRIES],
    pub thread_local: [usize; NUM_THREAD_LOCAL_STORAGE_POINTERS],
    pub tag: Option<TaskHook>,
    pub number: u32,
}

impl MockTask {
    pub fn new(name: &str, priority: TaskPriority, stack_depth: u32) -> Self {
        Self {
            name: ObjectName::new(name),
            priority: priority.value(),
            privileged: priority.is_privileged(),
            state: TaskState::Ready,
            stack_depth,
            regions: Vec::new(),
            notify_value: [0; TASK_NOTIFICATION_ARRAY_ENTRIES],
            notify_pending: [false; TASK_NOTIFICATION_ARRAY_ENTRIES],
            thread_local: [0; NUM_THREAD_LOCAL_STORAGE_POINTERS],
            tag: None,
            number: 0,
        }
    }
}

pub(crate) struct MockQueue {
    pub queue_type: QueueType,
    pub length: u32,
    pub item_size: u32,
    pub items: VecDeque<Vec<u8>>,
    pub holder: Option<TaskRef>,
    pub recursion: u32,
    pub name: Option<ObjectName>,
    pub set: Option<usize>,
}

pub(crate) struct MockQueueSet {
    pub length: u32,
    pub members: Vec<usize>,
    pub ready: VecDeque<usize>,
}

pub(crate) struct MockEventGroup {
    pub bits: EventBits,
    pub number: u32,
}

pub(crate) struct MockTimer {
    pub name: ObjectName,
    pub period: TickType,
    pub auto_reload: bool,
    pub id: usize,
    pub active: bool,
    pub expiry: TickType,
    #[allow(dead_code)]
    pub callback: TimerCallback,
}

pub(crate) struct MockStreamBuffer {
    pub kind: StreamBufferKind,
    pub size: usize,
    pub trigger_level: usize,
    pub bytes: VecDeque<u8>,
    /// Frame lengths, message buffers only
    pub frames: VecDeque<usize>,
}

/// Bytes of length prefix stored with each message
pub(crate) const MESSAGE_LENGTH_BYTES: usize = core::mem::size_of::<u32>();

impl MockStreamBuffer {
    pub fn used(&self) -> usize {
        self.bytes.len() + self.frames.len() * MESSAGE_LENGTH_BYTES
    }

    pub fn space(&self) -> usize {
        self.size - self.used()
    }
}

pub(crate) struct State {
    next_addr: usize,
    fail_creates: usize,
    object_limit: Option<usize>,
    reject_timer_commands: bool,

    pub tasks: BTreeMap<usize, MockTask>,
    pub queues: BTreeMap<usize, MockQueue>,
    pub sets: BTreeMap<usize, MockQueueSet>,
    pub groups: BTreeMap<usize, MockEventGroup>,
    pub timers: BTreeMap<usize, MockTimer>,
    pub streams: BTreeMap<usize, MockStreamBuffer>,

    pub current: Option<TaskRef>,
    pub idle: Option<TaskRef>,
    pub daemon: Option<TaskRef>,
    pub tick: TickType,
    pub scheduler: SchedulerState,

    calls: Vec<&'static str>,
    last_ticks: Option<TickType>,
}

impl State {
    fn new() -> Self {
        Self {
            next_addr: FIRST_ADDR,
            fail_creates: 0,
            object_limit: None,
            reject_timer_commands: false,
            tasks: BTreeMap::new(),
            queues: BTreeMap::new(),
            sets: BTreeMap::new(),
            groups: BTreeMap::new(),
            timers: BTreeMap::new(),
            streams: BTreeMap::new(),
            current: None,
            idle: None,
            daemon: None,
            tick: 0,
            scheduler: SchedulerState::NotStarted,
            calls: Vec::new(),
            last_ticks: None,
        }
    }

    fn live_objects(&self) -> usize {
        self.tasks.len()
            + self.queues.len()
            + self.sets.len()
            + self.groups.len()
            + self.timers.len()
            + self.streams.len()
    }

    /// Hand out the next object address, or `None` if creation must fail
    pub fn allocate(&mut self) -> Option<NonZeroUsize> {
        if self.fail_creates > 0 {
            self.fail_creates -= 1;
            log::debug!("mock kernel: injected create failure");
            return None;
        }
        if let Some(limit) = self.object_limit {
            if self.live_objects() >= limit {
                log::debug!("mock kernel: object limit {} reached", limit);
                return None;
            }
        }

        let addr = NonZeroUsize::new(self.next_addr)?;
        self.next_addr += ADDR_STEP;
        Some(addr)
    }

    pub fn ticks(&mut self, ticks: TickType) {
        self.last_ticks = Some(ticks);
    }

    pub fn rejects_timer_commands(&self) -> bool {
        self.reject_timer_commands
    }

    /// Resolve `None` to the calling task
    pub fn task_or_current(&self, task: Option<TaskRef>) -> Option<usize> {
        task.or(self.current).map(|t| t.addr().get())
    }

    pub fn task_mut(&mut self, task: Option<TaskRef>) -> Option<&mut MockTask> {
        let addr = self.task_or_current(task)?;
        self.tasks.get_mut(&addr)
    }

    pub fn task(&self, task: Option<TaskRef>) -> Option<&MockTask> {
        let addr = self.task_or_current(task)?;
        self.tasks.get(&addr)
    }

    pub fn queue_mut(&mut self, queue: QueueRef) -> Option<&mut MockQueue> {
        self.queues.get_mut(&queue.addr().get())
    }

    pub fn queue(&self, queue: QueueRef) -> Option<&MockQueue> {
        self.queues.get(&queue.addr().get())
    }
}

// ========== Mock Kernel ==========

/// In-memory kernel implementing every `kernel_api` primitive
pub struct MockKernel {
    state: Mutex<State>,
}

impl MockKernel {
    /// Create a kernel with an idle task and a timer service task
    pub fn new() -> Self {
        let mut state = State::new();

        for (name, slot) in [(IDLE_TASK_NAME, 0usize), (TIMER_TASK_NAME, 1)] {
            if let Some(addr) = state.allocate() {
                state
                    .tasks
                    .insert(addr.get(), MockTask::new(name, TaskPriority::level(slot as u32), 0));
                let task = TaskRef::from_addr(addr);
                if slot == 0 {
                    state.idle = Some(task);
                } else {
                    state.daemon = Some(task);
                }
            }
        }

        Self {
            state: Mutex::new(state),
        }
    }

    /// Run `f` on the kernel state, recording `call` in the call log
    pub(crate) fn with<R>(&self, call: &'static str, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock();
        state.calls.push(call);
        f(&mut state)
    }

    /// Create a task directly in the kernel, bypassing any wrapper
    ///
    /// Models tasks the kernel creates for itself or that startup code
    /// creates before the wrappers are in use.
    pub fn spawn_task(&self, name: &str, priority: u32) -> Option<TaskRef> {
        let mut state = self.state.lock();
        let addr = state.allocate()?;
        state
            .tasks
            .insert(addr.get(), MockTask::new(name, TaskPriority::level(priority), 0));
        Some(TaskRef::from_addr(addr))
    }

    // ========== Failure Injection ==========

    /// Make the next `count` create primitives fail
    pub fn fail_next_creates(&self, count: usize) {
        self.state.lock().fail_creates = count;
    }

    /// Fail creates once `limit` objects are live, `None` for no limit
    pub fn set_object_limit(&self, limit: Option<usize>) {
        self.state.lock().object_limit = limit;
    }

    /// Make the timer command queue refuse every command
    pub fn set_reject_timer_commands(&self, reject: bool) {
        self.state.lock().reject_timer_commands = reject;
    }

    // ========== Scheduling Model ==========

    /// Make `task` the calling task
    pub fn set_current(&self, task: Option<TaskRef>) {
        self.state.lock().current = task;
    }

    pub fn advance_ticks(&self, ticks: TickType) {
        let mut state = self.state.lock();
        state.tick = state.tick.wrapping_add(ticks);
    }

    // ========== Inspection ==========

    /// Names of the primitives invoked so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    /// Number of times primitive `call` was invoked
    pub fn call_count(&self, call: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock();
        state.calls.clear();
        state.last_ticks = None;
    }

    /// Last timeout passed to a blocking primitive
    pub fn last_ticks(&self) -> Option<TickType> {
        self.state.lock().last_ticks
    }

    /// Number of live kernel objects, idle and timer tasks included
    pub fn live_objects(&self) -> usize {
        self.state.lock().live_objects()
    }

    /// True if `object` has been created and not yet deleted
    pub fn is_live(&self, object: ObjectRef) -> bool {
        let state = self.state.lock();
        let addr = object.addr().get();
        match object.kind() {
            ObjectKind::Task => state.tasks.contains_key(&addr),
            ObjectKind::Queue => state.queues.contains_key(&addr),
            ObjectKind::QueueSet => state.sets.contains_key(&addr),
            ObjectKind::EventGroup => state.groups.contains_key(&addr),
            ObjectKind::Timer => state.timers.contains_key(&addr),
            ObjectKind::StreamBuffer => state.streams.contains_key(&addr),
        }
    }

    /// Whether `task` was created privileged
    pub fn task_is_privileged(&self, task: TaskRef) -> Option<bool> {
        self.state.lock().task(Some(task)).map(|t| t.privileged)
    }

    /// Number of MPU regions granted to `task`
    pub fn task_region_count(&self, task: TaskRef) -> Option<usize> {
        self.state.lock().task(Some(task)).map(|t| t.regions.len())
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}
