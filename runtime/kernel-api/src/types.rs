//! Parameter and value types shared by the kernel primitives

use core::fmt;
use core::num::NonZeroUsize;

use bitflags::bitflags;

use crate::object::TimerRef;

/// Kernel tick count
pub type TickType = u32;

/// Block indefinitely
pub const MAX_DELAY: TickType = TickType::MAX;

/// Event group bit mask
pub type EventBits = u32;

/// Maximum stored length of an object name, in bytes
pub const MAX_NAME_LEN: usize = 16;

/// Number of task notification slots per task
pub const TASK_NOTIFICATION_ARRAY_ENTRIES: usize = 1;

/// Number of thread-local storage pointers per task
pub const NUM_THREAD_LOCAL_STORAGE_POINTERS: usize = 5;

/// Task entry point, receives the creation parameter
pub type TaskFunction = fn(usize);

/// Application-defined per-task hook
pub type TaskHook = fn(usize) -> usize;

/// Timer expiry callback, receives the timer itself
pub type TimerCallback = fn(TimerRef);

/// Stream buffer send/receive completion callback
pub type StreamBufferCallback = fn(usize);

bitflags! {
    /// Task priority word
    ///
    /// The low bits carry the numeric priority. The top bit requests that the
    /// task be created privileged; the MPU wrappers clear it when the creator
    /// itself is unprivileged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TaskPriority: u32 {
        const PRIVILEGED = 0x8000_0000;

        const _ = !0;
    }
}

impl TaskPriority {
    /// Priority `level` without the privilege bit
    pub const fn level(level: u32) -> Self {
        Self::from_bits_retain(level & !Self::PRIVILEGED.bits())
    }

    /// Numeric priority, privilege bit excluded
    pub const fn value(self) -> u32 {
        self.bits() & !Self::PRIVILEGED.bits()
    }

    pub const fn is_privileged(self) -> bool {
        self.contains(Self::PRIVILEGED)
    }
}

/// Object name stored inline, truncated to [`MAX_NAME_LEN`] bytes
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ObjectName {
    bytes: [u8; MAX_NAME_LEN],
    len: u8,
}

impl ObjectName {
    /// Copy `name`, truncating on a character boundary
    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(MAX_NAME_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }

        let mut bytes = [0u8; MAX_NAME_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self { bytes, len: len as u8 }
    }

    pub fn as_str(&self) -> &str {
        // Only ever built from a &str cut on a char boundary
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Debug for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl PartialEq<&str> for ObjectName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Caller-supplied memory for a statically allocated object
///
/// Opaque to the wrapper layer; only the kernel interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticBuffer {
    pub addr: NonZeroUsize,
    pub len: usize,
}

/// One MPU region granted to a restricted task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: usize,
    pub length: u32,
    pub attributes: u32,
}

/// Parameters of a dynamically or statically created task
#[derive(Debug, Clone, Copy)]
pub struct TaskParams<'a> {
    pub entry: TaskFunction,
    pub name: &'a str,
    pub stack_depth: u32,
    pub parameter: usize,
    pub priority: TaskPriority,
}

/// Parameters of an MPU-restricted task
#[derive(Debug, Clone, Copy)]
pub struct RestrictedTaskParams<'a> {
    pub task: TaskParams<'a>,
    pub regions: &'a [MemoryRegion],
    /// Caller-supplied stack, `None` for kernel-allocated
    pub stack: Option<StaticBuffer>,
}

/// Scheduling state of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Ready,
    Blocked,
    Suspended,
    Deleted,
    /// Reported for a task that cannot be identified
    #[default]
    Invalid,
}

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    NotStarted,
    Running,
    Suspended,
}

/// How a notification updates the target's notification value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    NoAction,
    SetBits,
    Increment,
    SetValueWithOverwrite,
    SetValueWithoutOverwrite,
}

/// Where a send places the item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    Back,
    Front,
    Overwrite,
}

/// Flavor of queue-backed object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueType {
    Base,
    Set,
    Mutex,
    CountingSemaphore,
    BinarySemaphore,
    RecursiveMutex,
}

/// Command posted to the timer service task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Stop,
    Reset,
    ChangePeriod(TickType),
    Delete,
}

/// Parameters of a software timer
#[derive(Debug, Clone, Copy)]
pub struct TimerParams<'a> {
    pub name: &'a str,
    pub period: TickType,
    pub auto_reload: bool,
    pub id: usize,
    pub callback: TimerCallback,
}

/// Stream buffer framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamBufferKind {
    /// Byte stream
    Stream,
    /// Length-prefixed discrete messages
    Message,
}

/// Parameters of a stream or message buffer
#[derive(Debug, Clone, Copy)]
pub struct StreamBufferParams {
    pub size_bytes: usize,
    pub trigger_level_bytes: usize,
    pub kind: StreamBufferKind,
    pub send_completed: Option<StreamBufferCallback>,
    pub receive_completed: Option<StreamBufferCallback>,
}

impl StreamBufferParams {
    pub const fn stream(size_bytes: usize, trigger_level_bytes: usize) -> Self {
        Self {
            size_bytes,
            trigger_level_bytes,
            kind: StreamBufferKind::Stream,
            send_completed: None,
            receive_completed: None,
        }
    }

    pub const fn message(size_bytes: usize) -> Self {
        Self {
            size_bytes,
            trigger_level_bytes: 0,
            kind: StreamBufferKind::Message,
            send_completed: None,
            receive_completed: None,
        }
    }

    pub const fn has_callbacks(&self) -> bool {
        self.send_completed.is_some() || self.receive_completed.is_some()
    }
}
