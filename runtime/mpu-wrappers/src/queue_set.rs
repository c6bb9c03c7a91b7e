//! Queue set adapters

use kernel_api::{QueueKernel, QueueSetKernel, TickType};
use mpu_port::Port;

use crate::handle::{QueueSetHandle, QueueSetMemberHandle};
use crate::table::HandleTable;
use crate::wrappers::MpuWrappers;

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: QueueKernel + QueueSetKernel + ?Sized,
    T: HandleTable,
{
    #[cfg(feature = "dynamic-allocation")]
    pub fn queue_set_create(&self, length: u32) -> Option<QueueSetHandle> {
        self.create(|kernel| kernel.queue_set_create(length))
    }

    pub fn queue_set_delete(&self, handle: QueueSetHandle) {
        self.delete(handle, |kernel, set| kernel.queue_set_delete(set))
    }

    /// Add a queue or semaphore to a set; both handles must be valid
    pub fn queue_set_add(&self, member: QueueSetMemberHandle, set: QueueSetHandle) -> bool {
        self.gate().run(|| {
            let (Ok(member), Ok(set)) = (self.resolve(member), self.resolve(set)) else {
                return false;
            };
            self.kernel().queue_set_add(member, set)
        })
    }

    pub fn queue_set_remove(&self, member: QueueSetMemberHandle, set: QueueSetHandle) -> bool {
        self.gate().run(|| {
            let (Ok(member), Ok(set)) = (self.resolve(member), self.resolve(set)) else {
                return false;
            };
            self.kernel().queue_set_remove(member, set)
        })
    }

    /// Block until a member has data; the selected member comes back as
    /// its handle
    pub fn queue_set_select(
        &self,
        handle: QueueSetHandle,
        ticks: TickType,
    ) -> Option<QueueSetMemberHandle> {
        self.operate(handle, |kernel, set| self.encode(kernel.queue_set_select(set, ticks)))
    }

    pub fn queue_set_select_from_isr(&self, handle: QueueSetHandle) -> Option<QueueSetMemberHandle> {
        self.operate_from_isr(handle, |kernel, set| {
            self.encode(kernel.queue_set_select_from_isr(set))
        })
    }
}
