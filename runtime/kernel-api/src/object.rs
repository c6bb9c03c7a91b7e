//! Typed kernel-object references
//!
//! A reference is the kernel's own address for an object. It is non-owning:
//! copying or dropping a reference never affects the object, and nothing here
//! dereferences the address. Only the kernel that handed out a reference may
//! interpret it.

use core::fmt;
use core::num::NonZeroUsize;

/// Kind of kernel object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Task,
    Queue,
    QueueSet,
    EventGroup,
    Timer,
    StreamBuffer,
}

impl ObjectKind {
    /// All object kinds
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Task,
        ObjectKind::Queue,
        ObjectKind::QueueSet,
        ObjectKind::EventGroup,
        ObjectKind::Timer,
        ObjectKind::StreamBuffer,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ObjectKind::Task => "task",
            ObjectKind::Queue => "queue",
            ObjectKind::QueueSet => "queue set",
            ObjectKind::EventGroup => "event group",
            ObjectKind::Timer => "timer",
            ObjectKind::StreamBuffer => "stream buffer",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped kernel-object reference tagged with its kind
///
/// This is the value the handle pool stores. Two references are equal when
/// both kind and address match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    kind: ObjectKind,
    addr: NonZeroUsize,
}

impl ObjectRef {
    pub const fn new(kind: ObjectKind, addr: NonZeroUsize) -> Self {
        Self { kind, addr }
    }

    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub const fn addr(&self) -> NonZeroUsize {
        self.addr
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.kind, self.addr.get())
    }
}

/// A typed kernel-object reference
pub trait KernelObject: Copy + fmt::Debug {
    /// Kind of object this reference designates
    const KIND: ObjectKind;

    /// Build a reference from a kernel address
    fn from_addr(addr: NonZeroUsize) -> Self;

    /// Kernel address of the object
    fn addr(self) -> NonZeroUsize;

    /// Erase the type, keeping the kind tag
    fn object_ref(self) -> ObjectRef {
        ObjectRef::new(Self::KIND, self.addr())
    }

    /// Recover a typed reference, or `None` if `object` is of another kind
    fn from_object_ref(object: ObjectRef) -> Option<Self> {
        (object.kind() == Self::KIND).then(|| Self::from_addr(object.addr()))
    }
}

macro_rules! kernel_object_ref {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(NonZeroUsize);

        impl KernelObject for $name {
            const KIND: ObjectKind = ObjectKind::$kind;

            #[inline]
            fn from_addr(addr: NonZeroUsize) -> Self {
                Self(addr)
            }

            #[inline]
            fn addr(self) -> NonZeroUsize {
                self.0
            }
        }

        impl From<$name> for ObjectRef {
            fn from(object: $name) -> Self {
                object.object_ref()
            }
        }
    };
}

kernel_object_ref!(
    /// Reference to a task control block
    TaskRef => Task
);
kernel_object_ref!(
    /// Reference to a queue (semaphores and mutexes are queues too)
    QueueRef => Queue
);
kernel_object_ref!(
    /// Reference to a queue set
    QueueSetRef => QueueSet
);
kernel_object_ref!(
    /// Reference to an event group
    EventGroupRef => EventGroup
);
kernel_object_ref!(
    /// Reference to a software timer
    TimerRef => Timer
);
kernel_object_ref!(
    /// Reference to a stream or message buffer
    StreamBufferRef => StreamBuffer
);

/// Queue set members are queues, semaphores or mutexes
pub type QueueSetMemberRef = QueueRef;

static_assertions::assert_eq_size!(TaskRef, usize);
static_assertions::assert_eq_size!(Option<TaskRef>, usize);
