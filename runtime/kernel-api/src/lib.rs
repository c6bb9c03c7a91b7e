//! Kernel Object Primitive Interface
//!
//! # Purpose
//! Describes the kernel-object primitives (tasks, queues, queue sets, event
//! groups, timers, stream buffers) that the MPU wrapper layer forwards to.
//! The primitives themselves are black boxes: they return `None`/`false`/`0`
//! on resource exhaustion or invalid input and otherwise succeed.
//!
//! # Integration Points
//! - Depends on: nothing (pure interface)
//! - Provides to: MPU wrappers (consumer), kernel implementations (providers)
//!
//! # Architecture
//! - [`object`]: typed, non-owning kernel-object references and [`ObjectKind`]
//! - [`types`]: parameter and value types shared by the primitives
//! - one trait per object kind ([`TaskKernel`], [`QueueKernel`],
//!   [`QueueSetKernel`], [`EventGroupKernel`], [`TimerKernel`],
//!   [`StreamBufferKernel`]) plus the umbrella [`Kernel`] trait
//!
//! # Testing Strategy
//! - Unit tests: reference typing, priority flags, name truncation
//! - Integration tests: provided by `kaal-kernel-mock`

#![no_std]

#[cfg(test)]
extern crate std;

pub mod event_group;
pub mod object;
pub mod queue;
pub mod stream_buffer;
pub mod task;
pub mod timer;
pub mod types;

pub use event_group::EventGroupKernel;
pub use object::{
    EventGroupRef, KernelObject, ObjectKind, ObjectRef, QueueRef, QueueSetMemberRef, QueueSetRef,
    StreamBufferRef, TaskRef, TimerRef,
};
pub use queue::{QueueKernel, QueueSetKernel};
pub use stream_buffer::StreamBufferKernel;
pub use task::TaskKernel;
pub use timer::TimerKernel;
pub use types::*;

/// Every kernel-object primitive the wrapper layer can forward to
pub trait Kernel:
    TaskKernel + QueueKernel + QueueSetKernel + EventGroupKernel + TimerKernel + StreamBufferKernel
{
}

impl<T> Kernel for T where
    T: TaskKernel
        + QueueKernel
        + QueueSetKernel
        + EventGroupKernel
        + TimerKernel
        + StreamBufferKernel
        + ?Sized
{
}
