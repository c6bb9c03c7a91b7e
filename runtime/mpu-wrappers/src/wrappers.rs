//! Adapter contract shared by every object kind
//!
//! Each adapter is one of the shapes below, always run inside the privilege
//! gate (ISR variants excepted):
//!
//! ```text
//! operate:  validate handle -> translate -> forward -> translate back?
//! create:   reserve -> forward -> commit | abort
//! delete:   validate handle -> translate -> forward -> retire
//! ```
//!
//! A handle that fails validation yields the operation's failure value
//! (`Default::default()`: `false`, `0`, `None`) and nothing is forwarded.

use kernel_api::{KernelObject, TaskRef};
use mpu_port::Port;

use crate::gate::PrivilegeGate;
use crate::handle::{Handle, Result, TaskHandle};
use crate::table::{DefaultTable, HandleTable};

/// The MPU wrapper layer: port, kernel and handle table
///
/// Cheap to copy; holds only references. The table outlives every
/// `MpuWrappers` built over it.
pub struct MpuWrappers<'a, P: ?Sized, K: ?Sized, T = DefaultTable> {
    port: &'a P,
    kernel: &'a K,
    table: &'a T,
}

impl<P: ?Sized, K: ?Sized, T> Clone for MpuWrappers<'_, P, K, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized, K: ?Sized, T> Copy for MpuWrappers<'_, P, K, T> {}

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: ?Sized,
    T: HandleTable,
{
    pub const fn new(port: &'a P, kernel: &'a K, table: &'a T) -> Self {
        Self {
            port,
            kernel,
            table,
        }
    }

    pub fn port(&self) -> &'a P {
        self.port
    }

    pub fn kernel(&self) -> &'a K {
        self.kernel
    }

    pub fn table(&self) -> &'a T {
        self.table
    }

    pub fn gate(&self) -> PrivilegeGate<'a, P> {
        PrivilegeGate::new(self.port)
    }

    /// Run an application-defined privileged function
    ///
    /// The caller's privilege level on return equals the level on entry.
    pub fn run_privileged<R>(&self, op: impl FnOnce() -> R) -> R {
        self.gate().run(op)
    }

    // ========== Translation ==========

    /// Translate a caller handle to a typed kernel reference
    pub(crate) fn resolve<O: KernelObject>(&self, handle: Handle<O>) -> Result<O> {
        let object = self.table.resolve(handle.raw(), O::KIND)?;
        // resolve() already checked the kind
        O::from_object_ref(object).ok_or(crate::HandleError::KindMismatch {
            expected: O::KIND,
            found: object.kind(),
        })
    }

    /// Like `resolve`, but the null handle means "the calling task"
    pub(crate) fn resolve_task(&self, handle: TaskHandle) -> Result<Option<TaskRef>> {
        if handle.is_null() {
            return Ok(None);
        }
        self.resolve(handle).map(Some)
    }

    /// Re-express a reference returned by the kernel as a caller handle
    pub(crate) fn encode<O: KernelObject>(&self, object: Option<O>) -> Option<Handle<O>> {
        let object = object?;
        let raw = self.table.handle_of(object.object_ref());
        if raw.is_none() {
            log::trace!("{} has no handle", object.object_ref());
        }
        raw.map(Handle::from_raw)
    }

    // ========== Contract Shapes ==========

    /// Forward a call that takes no handle
    pub(crate) fn forward<R>(&self, op: impl FnOnce(&'a K) -> R) -> R {
        let kernel = self.kernel;
        self.gate().run(|| op(kernel))
    }

    /// Forward a call on the object behind `handle`
    pub(crate) fn operate<O, R>(&self, handle: Handle<O>, op: impl FnOnce(&'a K, O) -> R) -> R
    where
        O: KernelObject,
        R: Default,
    {
        self.gate().run(|| self.operate_ungated(handle, op))
    }

    /// Forward a call on a task, the null handle meaning the calling task
    pub(crate) fn operate_task<R>(
        &self,
        handle: TaskHandle,
        op: impl FnOnce(&'a K, Option<TaskRef>) -> R,
    ) -> R
    where
        R: Default,
    {
        self.gate().run(|| match self.resolve_task(handle) {
            Ok(task) => op(self.kernel, task),
            Err(_) => R::default(),
        })
    }

    /// ISR variant of `operate`: no privilege change
    pub(crate) fn operate_from_isr<O, R>(
        &self,
        handle: Handle<O>,
        op: impl FnOnce(&'a K, O) -> R,
    ) -> R
    where
        O: KernelObject,
        R: Default,
    {
        self.operate_ungated(handle, op)
    }

    /// ISR variant of `operate_task`: no privilege change
    pub(crate) fn operate_task_from_isr<R>(
        &self,
        handle: TaskHandle,
        op: impl FnOnce(&'a K, Option<TaskRef>) -> R,
    ) -> R
    where
        R: Default,
    {
        match self.resolve_task(handle) {
            Ok(task) => op(self.kernel, task),
            Err(_) => R::default(),
        }
    }

    fn operate_ungated<O, R>(&self, handle: Handle<O>, op: impl FnOnce(&'a K, O) -> R) -> R
    where
        O: KernelObject,
        R: Default,
    {
        match self.resolve(handle) {
            Ok(object) => {
                log::trace!("forwarding to {}", object.object_ref());
                op(self.kernel, object)
            }
            Err(_) => R::default(),
        }
    }

    /// Reserve room, create the object, then commit or roll back
    pub(crate) fn create<O: KernelObject>(
        &self,
        op: impl FnOnce(&'a K) -> Option<O>,
    ) -> Option<Handle<O>> {
        self.gate().run(|| {
            let reservation = self.table.reserve(self.port)?;

            match op(self.kernel) {
                Some(object) => {
                    let raw = self.table.commit(reservation, object.object_ref());
                    Some(Handle::from_raw(raw))
                }
                None => {
                    self.table.abort(reservation, self.port);
                    None
                }
            }
        })
    }

    /// Forward a deletion and retire the handle
    pub(crate) fn delete<O: KernelObject>(&self, handle: Handle<O>, op: impl FnOnce(&'a K, O)) {
        self.delete_if(handle, |kernel, object| {
            op(kernel, object);
            true
        });
    }

    /// Forward a deletion that may be refused; retire the handle only if
    /// the kernel accepted it
    pub(crate) fn delete_if<O: KernelObject>(
        &self,
        handle: Handle<O>,
        op: impl FnOnce(&'a K, O) -> bool,
    ) -> bool {
        self.gate().run(|| {
            let Ok(object) = self.resolve(handle) else {
                return false;
            };
            let accepted = op(self.kernel, object);
            if accepted {
                self.table.retire(handle.raw(), self.port);
            }
            accepted
        })
    }
}

impl<'a, P, K> MpuWrappers<'a, P, K, DefaultTable>
where
    P: Port + ?Sized,
    K: ?Sized,
{
    /// Wrappers over the process-wide [`DEFAULT_TABLE`](crate::DEFAULT_TABLE)
    pub fn with_default_table(port: &'a P, kernel: &'a K) -> Self {
        Self::new(port, kernel, &crate::DEFAULT_TABLE)
    }
}
