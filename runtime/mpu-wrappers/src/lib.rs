//! KaaL MPU Wrappers
//!
//! # Purpose
//! Privilege boundary between unprivileged application tasks and kernel
//! objects on an MPU-protected kernel. Application code only ever holds
//! opaque [`Handle`]s; every kernel call goes through an adapter that
//! translates the handle and runs the call behind the [`PrivilegeGate`].
//!
//! # Integration Points
//! - Depends on: `kaal-mpu-port` (privilege and exclusion primitives),
//!   `kaal-kernel-api` (kernel-object primitives)
//! - Provides to: application tasks, via [`MpuWrappers`]
//!
//! # Architecture
//! - [`pool`]: Handle Pool, fixed-capacity slot table
//! - [`gate`]: Privilege Gate combinator
//! - [`table`]: handle translation (pool or pass-through)
//! - adapters, one module per object kind, all `impl MpuWrappers`
//!
//! ```text
//! app call -> adapter -> HandleTable::resolve -> PrivilegeGate::run(kernel op)
//!                                             -> HandleTable::handle_of (results)
//! ```
//!
//! # Configuration
//! Pool capacity comes from `mpu-config.toml` ([`HANDLE_POOL_SIZE`]).
//! Cargo features select pool vs. pass-through and which adapter families
//! are built; see [`config::enabled_features`].
//!
//! # Testing Strategy
//! - Unit tests: pool transitions, gate ordering, translation
//! - Integration tests: adapters against `kaal-kernel-mock` and `MockPort`
//! - Benchmarks: `benches/handle_pool.rs`

#![no_std]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod gate;
pub mod handle;
pub mod pool;
pub mod table;

mod event_group;
mod queue;
#[cfg(feature = "queue-sets")]
mod queue_set;
#[cfg(feature = "stream-buffers")]
mod stream_buffer;
mod task;
#[cfg(feature = "timers")]
mod timer;
mod wrappers;

pub use config::{WrapperFeatures, HANDLE_POOL_SIZE};
pub use gate::PrivilegeGate;
pub use handle::{
    EventGroupHandle, Handle, HandleError, MessageBufferHandle, QueueHandle,
    QueueSetHandle, QueueSetMemberHandle, Result, SemaphoreHandle, StreamBufferHandle,
    TaskHandle, TimerHandle,
};
pub use pool::{HandlePool, Slot, HANDLE_OFFSET};
pub use table::{DefaultTable, HandleTable, PassThrough, Reservation};
pub use wrappers::MpuWrappers;

/// Process-wide handle table, all slots free at start-up
pub static DEFAULT_TABLE: DefaultTable = DefaultTable::new();

static_assertions::assert_eq_size!(Handle<kernel_api::TaskRef>, usize);
