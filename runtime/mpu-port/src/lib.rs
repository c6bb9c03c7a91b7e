//! # MPU Port Layer Interface
//!
//! This crate describes the primitives a hardware port must supply to the
//! MPU wrapper layer:
//! - **Privilege control**: query, raise and reset the privilege level of the
//!   running task
//! - **Memory barriers**: ordering fences around privilege transitions
//! - **Scheduler exclusion**: scheduler suspension and critical sections
//!
//! ## Backends
//!
//! ```bash
//! # NullPort only (always privileged, no MPU)
//! cargo build
//!
//! # Instrumented mock (testing only)
//! cargo build --features mock
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use mpu_port::{NullPort, PrivilegePort, SchedulerPort, SchedulerSuspended};
//!
//! let port = NullPort;
//! assert!(port.is_privileged());
//!
//! {
//!     let _suspended = SchedulerSuspended::new(&port);
//!     // other tasks cannot run here
//! }
//! ```

#![no_std]

#[cfg(feature = "mock")]
extern crate alloc;

#[cfg(test)]
extern crate std;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockPort, PortCounters, PortEvent};

// ========== Port Traits ==========

/// Privilege control primitives of the hardware port
///
/// Implementations are unconditional: `raise_privilege` always raises and
/// `reset_privilege` always drops back to unprivileged execution. Callers
/// are responsible for never raising twice without an intervening reset.
pub trait PrivilegePort {
    /// Returns true if the calling context currently runs privileged
    fn is_privileged(&self) -> bool;

    /// Raise the calling context to privileged execution
    fn raise_privilege(&self);

    /// Drop the calling context back to unprivileged execution
    fn reset_privilege(&self);

    /// Insert a memory barrier
    ///
    /// Orders memory accesses across a privilege transition on architectures
    /// where changing privilege does not imply a fence.
    fn memory_barrier(&self);
}

/// Scheduler exclusion primitives of the hardware port
pub trait SchedulerPort {
    /// Suspend the scheduler (no context switches, interrupts stay enabled)
    fn suspend_all(&self);

    /// Resume the scheduler after `suspend_all`
    fn resume_all(&self);

    /// Enter a critical section (interrupts masked)
    fn enter_critical(&self);

    /// Leave a critical section entered with `enter_critical`
    fn exit_critical(&self);
}

/// A complete port: privilege control plus scheduler exclusion
pub trait Port: PrivilegePort + SchedulerPort {}

impl<T: PrivilegePort + SchedulerPort + ?Sized> Port for T {}

impl<T: PrivilegePort + ?Sized> PrivilegePort for &T {
    #[inline]
    fn is_privileged(&self) -> bool {
        (**self).is_privileged()
    }

    #[inline]
    fn raise_privilege(&self) {
        (**self).raise_privilege()
    }

    #[inline]
    fn reset_privilege(&self) {
        (**self).reset_privilege()
    }

    #[inline]
    fn memory_barrier(&self) {
        (**self).memory_barrier()
    }
}

impl<T: SchedulerPort + ?Sized> SchedulerPort for &T {
    #[inline]
    fn suspend_all(&self) {
        (**self).suspend_all()
    }

    #[inline]
    fn resume_all(&self) {
        (**self).resume_all()
    }

    #[inline]
    fn enter_critical(&self) {
        (**self).enter_critical()
    }

    #[inline]
    fn exit_critical(&self) {
        (**self).exit_critical()
    }
}

// ========== Exclusion Guards ==========

/// Scheduler suspension held for the lifetime of the guard
#[must_use = "the scheduler resumes as soon as the guard is dropped"]
pub struct SchedulerSuspended<'a, S: SchedulerPort + ?Sized> {
    port: &'a S,
}

impl<'a, S: SchedulerPort + ?Sized> SchedulerSuspended<'a, S> {
    /// Suspend the scheduler until the returned guard is dropped
    pub fn new(port: &'a S) -> Self {
        port.suspend_all();
        Self { port }
    }
}

impl<S: SchedulerPort + ?Sized> Drop for SchedulerSuspended<'_, S> {
    fn drop(&mut self) {
        self.port.resume_all();
    }
}

/// Critical section held for the lifetime of the guard
#[must_use = "the critical section ends as soon as the guard is dropped"]
pub struct CriticalSection<'a, S: SchedulerPort + ?Sized> {
    port: &'a S,
}

impl<'a, S: SchedulerPort + ?Sized> CriticalSection<'a, S> {
    /// Enter a critical section until the returned guard is dropped
    pub fn new(port: &'a S) -> Self {
        port.enter_critical();
        Self { port }
    }
}

impl<S: SchedulerPort + ?Sized> Drop for CriticalSection<'_, S> {
    fn drop(&mut self) {
        self.port.exit_critical();
    }
}

// ========== Null Port ==========

/// Port for targets without a memory protection unit
///
/// Everything runs privileged, so the privilege gate always takes its
/// direct branch. Scheduler exclusion is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPort;

impl PrivilegePort for NullPort {
    #[inline]
    fn is_privileged(&self) -> bool {
        true
    }

    #[inline]
    fn raise_privilege(&self) {}

    #[inline]
    fn reset_privilege(&self) {}

    #[inline]
    fn memory_barrier(&self) {
        core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
    }
}

impl SchedulerPort for NullPort {
    #[inline]
    fn suspend_all(&self) {}

    #[inline]
    fn resume_all(&self) {}

    #[inline]
    fn enter_critical(&self) {}

    #[inline]
    fn exit_critical(&self) {}
}

/// Port backend configuration and detection
pub mod config {
    /// Name of the port backend compiled in
    pub fn port_mode() -> &'static str {
        if is_mock() {
            "mock"
        } else {
            "null"
        }
    }

    /// Check if the instrumented mock backend is available
    pub const fn is_mock() -> bool {
        cfg!(feature = "mock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Port that only counts exclusion calls
    #[derive(Default)]
    struct CountingPort {
        suspended: Cell<i32>,
        critical: Cell<i32>,
    }

    impl SchedulerPort for CountingPort {
        fn suspend_all(&self) {
            self.suspended.set(self.suspended.get() + 1);
        }

        fn resume_all(&self) {
            self.suspended.set(self.suspended.get() - 1);
        }

        fn enter_critical(&self) {
            self.critical.set(self.critical.get() + 1);
        }

        fn exit_critical(&self) {
            self.critical.set(self.critical.get() - 1);
        }
    }

    #[test]
    fn test_null_port_is_privileged() {
        let port = NullPort;
        assert!(port.is_privileged());

        // Raise/reset are no-ops, state does not change
        port.raise_privilege();
        port.reset_privilege();
        assert!(port.is_privileged());
    }

    #[test]
    fn test_scheduler_guard_resumes_on_drop() {
        let port = CountingPort::default();
        {
            let _guard = SchedulerSuspended::new(&port);
            assert_eq!(port.suspended.get(), 1);
        }
        assert_eq!(port.suspended.get(), 0);
    }

    #[test]
    fn test_critical_guard_exits_on_drop() {
        let port = CountingPort::default();
        {
            let _guard = CriticalSection::new(&port);
            assert_eq!(port.critical.get(), 1);
            assert_eq!(port.suspended.get(), 0);
        }
        assert_eq!(port.critical.get(), 0);
    }

    #[test]
    fn test_port_via_reference() {
        fn takes_port<P: Port>(port: P) -> bool {
            port.is_privileged()
        }

        let port = NullPort;
        assert!(takes_port(&port));
    }

    #[test]
    fn test_port_mode_detection() {
        let mode = config::port_mode();
        assert!(mode == "mock" || mode == "null");
        assert_eq!(config::is_mock(), mode == "mock");
    }
}
