//! Opaque external handles
//!
//! A handle is the only thing unprivileged code ever holds for a kernel
//! object. With the handle pool enabled its value is `slot index + 1`; in
//! pass-through mode it is the kernel address. Zero is always the null
//! handle and means "the calling task" where the kernel API allows it.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use kernel_api::{
    EventGroupRef, ObjectKind, QueueRef, QueueSetRef, StreamBufferRef, TaskRef, TimerRef,
};
use thiserror::Error;

/// Opaque handle to a kernel object of type `K`
pub struct Handle<K> {
    raw: isize,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Handle<K> {
    /// The null handle
    pub const NULL: Self = Self::from_raw(0);

    /// Wrap a raw handle value received from application code
    pub const fn from_raw(raw: isize) -> Self {
        Self {
            raw,
            _kind: PhantomData,
        }
    }

    /// Raw value handed to application code
    pub const fn raw(self) -> isize {
        self.raw
    }

    pub const fn is_null(self) -> bool {
        self.raw == 0
    }
}

impl<K> Clone for Handle<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Handle<K> {}

impl<K> PartialEq for Handle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<K> Eq for Handle<K> {}

impl<K> Hash for Handle<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<K> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.raw).finish()
    }
}

impl<K> Default for Handle<K> {
    fn default() -> Self {
        Self::NULL
    }
}

pub type TaskHandle = Handle<TaskRef>;
/// Queues, semaphores and mutexes share one handle type
pub type QueueHandle = Handle<QueueRef>;
pub type SemaphoreHandle = QueueHandle;
pub type QueueSetHandle = Handle<QueueSetRef>;
pub type QueueSetMemberHandle = QueueHandle;
pub type EventGroupHandle = Handle<EventGroupRef>;
pub type TimerHandle = Handle<TimerRef>;
pub type StreamBufferHandle = Handle<StreamBufferRef>;
pub type MessageBufferHandle = StreamBufferHandle;

/// Why a caller-supplied handle could not be translated
///
/// Never surfaced to application code: adapters turn every variant into the
/// kernel API's designated failure value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("null handle")]
    Null,

    #[error("handle {raw} is outside the handle pool")]
    OutOfRange { raw: isize },

    #[error("handle slot {index} is not bound to an object")]
    Stale { index: usize },

    #[error("handle refers to a {found}, expected a {expected}")]
    KindMismatch {
        expected: ObjectKind,
        found: ObjectKind,
    },
}

/// Result type for handle translation
pub type Result<T> = core::result::Result<T, HandleError>;

static_assertions::assert_eq_size!(TaskHandle, isize);
