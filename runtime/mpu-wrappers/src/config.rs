//! Build configuration
//!
//! The pool capacity comes from `mpu-config.toml` (or `MPU_HANDLE_POOL_SIZE`)
//! via `build.rs`; everything else is a Cargo feature.

use bitflags::bitflags;

include!(concat!(env!("OUT_DIR"), "/pool_config.rs"));

static_assertions::const_assert!(HANDLE_POOL_SIZE > 0);

bitflags! {
    /// Adapter families compiled into this build
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WrapperFeatures: u32 {
        const HANDLE_POOL          = 1 << 0;
        const DYNAMIC_ALLOCATION   = 1 << 1;
        const STATIC_ALLOCATION    = 1 << 2;
        const QUEUE_SETS           = 1 << 3;
        const MUTEXES              = 1 << 4;
        const COUNTING_SEMAPHORES  = 1 << 5;
        const TIMERS               = 1 << 6;
        const STREAM_BUFFERS       = 1 << 7;
        const TASK_NOTIFICATIONS   = 1 << 8;
        const TRACE_FACILITY       = 1 << 9;
        const THREAD_LOCAL_STORAGE = 1 << 10;
        const APPLICATION_TASK_TAG = 1 << 11;
    }
}

/// Feature switches compiled into this build
pub const fn enabled_features() -> WrapperFeatures {
    let mut bits = 0;
    if cfg!(feature = "handle-pool") {
        bits |= WrapperFeatures::HANDLE_POOL.bits();
    }
    if cfg!(feature = "dynamic-allocation") {
        bits |= WrapperFeatures::DYNAMIC_ALLOCATION.bits();
    }
    if cfg!(feature = "static-allocation") {
        bits |= WrapperFeatures::STATIC_ALLOCATION.bits();
    }
    if cfg!(feature = "queue-sets") {
        bits |= WrapperFeatures::QUEUE_SETS.bits();
    }
    if cfg!(feature = "mutexes") {
        bits |= WrapperFeatures::MUTEXES.bits();
    }
    if cfg!(feature = "counting-semaphores") {
        bits |= WrapperFeatures::COUNTING_SEMAPHORES.bits();
    }
    if cfg!(feature = "timers") {
        bits |= WrapperFeatures::TIMERS.bits();
    }
    if cfg!(feature = "stream-buffers") {
        bits |= WrapperFeatures::STREAM_BUFFERS.bits();
    }
    if cfg!(feature = "task-notifications") {
        bits |= WrapperFeatures::TASK_NOTIFICATIONS.bits();
    }
    if cfg!(feature = "trace-facility") {
        bits |= WrapperFeatures::TRACE_FACILITY.bits();
    }
    if cfg!(feature = "thread-local-storage") {
        bits |= WrapperFeatures::THREAD_LOCAL_STORAGE.bits();
    }
    if cfg!(feature = "application-task-tag") {
        bits |= WrapperFeatures::APPLICATION_TASK_TAG.bits();
    }
    WrapperFeatures::from_bits_truncate(bits)
}

/// Handle translation mode of this build
pub fn table_mode() -> &'static str {
    if is_handle_pool() {
        "handle-pool"
    } else {
        "pass-through"
    }
}

/// Check if handles go through the pool
pub const fn is_handle_pool() -> bool {
    cfg!(feature = "handle-pool")
}
