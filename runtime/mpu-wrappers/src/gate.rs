//! Privilege Gate
//!
//! Brackets a forwarded operation with a privilege raise and reset:
//!
//! ```text
//! unprivileged caller:  raise, barrier, op(), barrier, reset, barrier
//! privileged caller:    op()
//! ```
//!
//! The gate keeps no nesting count. A nested gate sees the caller already
//! privileged and takes the direct branch, which is what keeps raise and
//! reset paired.

use mpu_port::PrivilegePort;

/// Raise/execute/reset combinator over a port
pub struct PrivilegeGate<'a, P: PrivilegePort + ?Sized> {
    port: &'a P,
}

impl<'a, P: PrivilegePort + ?Sized> PrivilegeGate<'a, P> {
    pub const fn new(port: &'a P) -> Self {
        Self { port }
    }

    /// Run `op` with privilege, restoring the entry privilege afterwards
    pub fn run<R>(&self, op: impl FnOnce() -> R) -> R {
        if self.port.is_privileged() {
            return op();
        }

        let _raised = Raised::new(self.port);
        op()
    }
}

impl<P: PrivilegePort + ?Sized> Clone for PrivilegeGate<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: PrivilegePort + ?Sized> Copy for PrivilegeGate<'_, P> {}

/// Outstanding privilege raise, reset on drop (also on unwind)
struct Raised<'a, P: PrivilegePort + ?Sized> {
    port: &'a P,
}

impl<'a, P: PrivilegePort + ?Sized> Raised<'a, P> {
    fn new(port: &'a P) -> Self {
        port.raise_privilege();
        port.memory_barrier();
        Self { port }
    }
}

impl<P: PrivilegePort + ?Sized> Drop for Raised<'_, P> {
    fn drop(&mut self) {
        self.port.memory_barrier();
        self.port.reset_privilege();
        self.port.memory_barrier();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpu_port::{MockPort, NullPort, PortEvent};

    #[test]
    fn test_unprivileged_brackets_op() {
        let port = MockPort::unprivileged();
        let gate = PrivilegeGate::new(&port);

        let seen = gate.run(|| port.is_privileged());
        assert!(seen, "op must run privileged");
        assert!(!port.is_privileged());

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

    #[test]
    fn test_privileged_runs_directly() {
        let port = MockPort::privileged();
        let gate = PrivilegeGate::new(&port);

        assert_eq!(gate.run(|| 42), 42);
        assert!(port.events().is_empty());
        assert!(port.is_privileged());
    }

    #[test]
    fn test_nested_gate_raises_once() {
        let port = MockPort::unprivileged();
        let gate = PrivilegeGate::new(&port);

        gate.run(|| gate.run(|| gate.run(|| ())));

        let counters = port.counters();
        assert_eq!(counters.raises, 1);
        assert_eq!(counters.resets, 1);
        assert_eq!(counters.barriers, 3);
    }

    #[test]
    fn test_reset_on_panic() {
        let port = MockPort::unprivileged();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            PrivilegeGate::new(&port).run(|| panic!("forwarded op failed"))
        }));

        assert!(result.is_err());
        assert!(!port.is_privileged());
        assert_eq!(port.counters().resets, 1);
    }

    #[test]
    fn test_null_port_gate() {
        let gate = PrivilegeGate::new(&NullPort);
        assert_eq!(gate.run(|| "direct"), "direct");
    }
}
