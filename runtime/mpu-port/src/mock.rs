//! Instrumented mock port for host testing
//!
//! `MockPort` records every primitive the wrapper layer invokes so tests can
//! check privilege symmetry, barrier placement and which exclusion primitive
//! protected a pool mutation.
//!
//! The mock also enforces the port contract: raising privilege while a
//! raise is outstanding, resetting without a raise, or unbalanced
//! suspend/critical nesting panics immediately.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::Mutex;

use crate::{PrivilegePort, SchedulerPort};

/// A primitive invocation recorded by `MockPort`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Raise,
    Reset,
    Barrier,
    SuspendAll,
    ResumeAll,
    EnterCritical,
    ExitCritical,
}

/// Snapshot of the primitive call counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortCounters {
    pub raises: usize,
    pub resets: usize,
    pub barriers: usize,
    pub suspends: usize,
    pub resumes: usize,
    pub critical_enters: usize,
    pub critical_exits: usize,
}

/// Mock port with counters and an event log
pub struct MockPort {
    privileged: AtomicBool,
    raise_outstanding: AtomicBool,
    suspend_depth: AtomicUsize,
    critical_depth: AtomicUsize,

    raises: AtomicUsize,
    resets: AtomicUsize,
    barriers: AtomicUsize,
    suspends: AtomicUsize,
    resumes: AtomicUsize,
    critical_enters: AtomicUsize,
    critical_exits: AtomicUsize,

    events: Mutex<Vec<PortEvent>>,
}

impl MockPort {
    /// Create a port whose caller starts unprivileged (application task)
    pub fn unprivileged() -> Self {
        Self::with_privilege(false)
    }

    /// Create a port whose caller starts privileged (kernel/startup code)
    pub fn privileged() -> Self {
        Self::with_privilege(true)
    }

    fn with_privilege(privileged: bool) -> Self {
        Self {
            privileged: AtomicBool::new(privileged),
            raise_outstanding: AtomicBool::new(false),
            suspend_depth: AtomicUsize::new(0),
            critical_depth: AtomicUsize::new(0),
            raises: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
            barriers: AtomicUsize::new(0),
            suspends: AtomicUsize::new(0),
            resumes: AtomicUsize::new(0),
            critical_enters: AtomicUsize::new(0),
            critical_exits: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Force the caller's privilege level (simulates a task switch)
    ///
    /// # Panics
    /// Panics if a raise is outstanding.
    pub fn set_privileged(&self, privileged: bool) {
        assert!(
            !self.raise_outstanding.load(Ordering::SeqCst),
            "cannot change privilege while a raise is outstanding"
        );
        self.privileged.store(privileged, Ordering::SeqCst);
    }

    /// Snapshot the call counters
    pub fn counters(&self) -> PortCounters {
        PortCounters {
            raises: self.raises.load(Ordering::SeqCst),
            resets: self.resets.load(Ordering::SeqCst),
            barriers: self.barriers.load(Ordering::SeqCst),
            suspends: self.suspends.load(Ordering::SeqCst),
            resumes: self.resumes.load(Ordering::SeqCst),
            critical_enters: self.critical_enters.load(Ordering::SeqCst),
            critical_exits: self.critical_exits.load(Ordering::SeqCst),
        }
    }

    /// Copy of the recorded event log
    pub fn events(&self) -> Vec<PortEvent> {
        self.events.lock().clone()
    }

    /// Clear counters and the event log, keeping the privilege level
    pub fn reset_counters(&self) {
        for counter in [
            &self.raises,
            &self.resets,
            &self.barriers,
            &self.suspends,
            &self.resumes,
            &self.critical_enters,
            &self.critical_exits,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        self.events.lock().clear();
    }

    /// True while the scheduler is suspended
    pub fn scheduler_suspended(&self) -> bool {
        self.suspend_depth.load(Ordering::SeqCst) > 0
    }

    /// True while a critical section is held
    pub fn in_critical(&self) -> bool {
        self.critical_depth.load(Ordering::SeqCst) > 0
    }

    fn record(&self, event: PortEvent) {
        self.events.lock().push(event);
    }
}

impl Default for MockPort {
    fn default() -> Self {
        Self::unprivileged()
    }
}

impl PrivilegePort for MockPort {
    fn is_privileged(&self) -> bool {
        self.privileged.load(Ordering::SeqCst)
    }

    fn raise_privilege(&self) {
        let was_outstanding = self.raise_outstanding.swap(true, Ordering::SeqCst);
        assert!(!was_outstanding, "privilege raised twice without a reset");

        self.privileged.store(true, Ordering::SeqCst);
        self.raises.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::Raise);
    }

    fn reset_privilege(&self) {
        let was_outstanding = self.raise_outstanding.swap(false, Ordering::SeqCst);
        assert!(was_outstanding, "privilege reset without a matching raise");

        self.privileged.store(false, Ordering::SeqCst);
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::Reset);
    }

    fn memory_barrier(&self) {
        core::sync::atomic::fence(Ordering::SeqCst);
        self.barriers.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::Barrier);
    }
}

impl SchedulerPort for MockPort {
    fn suspend_all(&self) {
        self.suspend_depth.fetch_add(1, Ordering::SeqCst);
        self.suspends.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::SuspendAll);
    }

    fn resume_all(&self) {
        let depth = self.suspend_depth.fetch_sub(1, Ordering::SeqCst);
        assert!(depth > 0, "scheduler resumed without being suspended");

        self.resumes.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::ResumeAll);
    }

    fn enter_critical(&self) {
        self.critical_depth.fetch_add(1, Ordering::SeqCst);
        self.critical_enters.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::EnterCritical);
    }

    fn exit_critical(&self) {
        let depth = self.critical_depth.fetch_sub(1, Ordering::SeqCst);
        assert!(depth > 0, "critical section exited without being entered");

        self.critical_exits.fetch_add(1, Ordering::SeqCst);
        self.record(PortEvent::ExitCritical);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CriticalSection, SchedulerSuspended};

    #[test]
    fn test_raise_reset_counts() {
        let port = MockPort::unprivileged();
        assert!(!port.is_privileged());

        port.raise_privilege();
        assert!(port.is_privileged());
        port.reset_privilege();
        assert!(!port.is_privileged());

        let counters = port.counters();
        assert_eq!(counters.raises, 1);
        assert_eq!(counters.resets, 1);
        assert_eq!(port.events(), [PortEvent::Raise, PortEvent::Reset]);
    }

    #[test]
    #[should_panic(expected = "privilege raised twice")]
    fn test_double_raise_panics() {
        let port = MockPort::unprivileged();
        port.raise_privilege();
        port.raise_privilege();
    }

    #[test]
    #[should_panic(expected = "without a matching raise")]
    fn test_reset_without_raise_panics() {
        let port = MockPort::privileged();
        port.reset_privilege();
    }

    #[test]
    fn test_exclusion_tracking() {
        let port = MockPort::privileged();
        {
            let _suspended = SchedulerSuspended::new(&port);
            assert!(port.scheduler_suspended());
            assert!(!port.in_critical());
        }
        {
            let _critical = CriticalSection::new(&port);
            assert!(port.in_critical());
        }
        assert!(!port.scheduler_suspended());
        assert!(!port.in_critical());

        let counters = port.counters();
        assert_eq!(counters.suspends, 1);
        assert_eq!(counters.resumes, 1);
        assert_eq!(counters.critical_enters, 1);
        assert_eq!(counters.critical_exits, 1);
    }

    #[test]
    fn test_reset_counters_keeps_privilege() {
        let port = MockPort::privileged();
        port.memory_barrier();
        port.reset_counters();

        assert_eq!(port.counters(), PortCounters::default());
        assert!(port.events().is_empty());
        assert!(port.is_privileged());
    }
}
