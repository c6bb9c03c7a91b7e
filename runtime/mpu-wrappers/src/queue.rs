//! Queue, semaphore and mutex adapters

use kernel_api::{ObjectName, QueueKernel, QueuePosition, TickType};
#[cfg(any(feature = "dynamic-allocation", feature = "static-allocation"))]
use kernel_api::QueueType;
#[cfg(feature = "static-allocation")]
use kernel_api::StaticBuffer;
use mpu_port::Port;

#[cfg(feature = "mutexes")]
use crate::handle::TaskHandle;
use crate::handle::QueueHandle;
use crate::table::HandleTable;
use crate::wrappers::MpuWrappers;

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: QueueKernel + ?Sized,
    T: HandleTable,
{
    // ========== Creation / Deletion ==========

    #[cfg(feature = "dynamic-allocation")]
    pub fn queue_create(
        &self,
        length: u32,
        item_size: u32,
        queue_type: QueueType,
    ) -> Option<QueueHandle> {
        self.create(|kernel| kernel.queue_create(length, item_size, queue_type))
    }

    #[cfg(feature = "static-allocation")]
    pub fn queue_create_static(
        &self,
        length: u32,
        item_size: u32,
        storage: StaticBuffer,
        queue_type: QueueType,
    ) -> Option<QueueHandle> {
        self.create(|kernel| kernel.queue_create_static(length, item_size, storage, queue_type))
    }

    #[cfg(feature = "dynamic-allocation")]
    pub fn binary_semaphore_create(&self) -> Option<QueueHandle> {
        self.queue_create(1, 0, QueueType::BinarySemaphore)
    }

    #[cfg(all(feature = "mutexes", feature = "dynamic-allocation"))]
    pub fn mutex_create(&self, mutex_type: QueueType) -> Option<QueueHandle> {
        self.create(|kernel| kernel.mutex_create(mutex_type))
    }

    #[cfg(all(feature = "mutexes", feature = "static-allocation"))]
    pub fn mutex_create_static(
        &self,
        mutex_type: QueueType,
        storage: StaticBuffer,
    ) -> Option<QueueHandle> {
        self.create(|kernel| kernel.mutex_create_static(mutex_type, storage))
    }

    #[cfg(all(feature = "counting-semaphores", feature = "dynamic-allocation"))]
    pub fn counting_semaphore_create(
        &self,
        max_count: u32,
        initial_count: u32,
    ) -> Option<QueueHandle> {
        self.create(|kernel| kernel.counting_semaphore_create(max_count, initial_count))
    }

    #[cfg(all(feature = "counting-semaphores", feature = "static-allocation"))]
    pub fn counting_semaphore_create_static(
        &self,
        max_count: u32,
        initial_count: u32,
        storage: StaticBuffer,
    ) -> Option<QueueHandle> {
        self.create(|kernel| {
            kernel.counting_semaphore_create_static(max_count, initial_count, storage)
        })
    }

    pub fn queue_delete(&self, handle: QueueHandle) {
        self.delete(handle, |kernel, queue| kernel.queue_delete(queue))
    }

    pub fn queue_reset(&self, handle: QueueHandle) -> bool {
        self.operate(handle, |kernel, queue| kernel.queue_reset(queue))
    }

    // ========== Data Transfer ==========

    pub fn queue_send(
        &self,
        handle: QueueHandle,
        item: &[u8],
        ticks: TickType,
        position: QueuePosition,
    ) -> bool {
        self.operate(handle, |kernel, queue| kernel.queue_send(queue, item, ticks, position))
    }

    pub fn queue_send_from_isr(
        &self,
        handle: QueueHandle,
        item: &[u8],
        position: QueuePosition,
        woken: &mut bool,
    ) -> bool {
        self.operate_from_isr(handle, |kernel, queue| {
            kernel.queue_send_from_isr(queue, item, position, woken)
        })
    }

    pub fn queue_receive(&self, handle: QueueHandle, buffer: &mut [u8], ticks: TickType) -> bool {
        self.operate(handle, |kernel, queue| kernel.queue_receive(queue, buffer, ticks))
    }

    pub fn queue_receive_from_isr(
        &self,
        handle: QueueHandle,
        buffer: &mut [u8],
        woken: &mut bool,
    ) -> bool {
        self.operate_from_isr(handle, |kernel, queue| {
            kernel.queue_receive_from_isr(queue, buffer, woken)
        })
    }

    pub fn queue_peek(&self, handle: QueueHandle, buffer: &mut [u8], ticks: TickType) -> bool {
        self.operate(handle, |kernel, queue| kernel.queue_peek(queue, buffer, ticks))
    }

    pub fn queue_peek_from_isr(&self, handle: QueueHandle, buffer: &mut [u8]) -> bool {
        self.operate_from_isr(handle, |kernel, queue| kernel.queue_peek_from_isr(queue, buffer))
    }

    pub fn semaphore_take(&self, handle: QueueHandle, ticks: TickType) -> bool {
        self.operate(handle, |kernel, queue| kernel.semaphore_take(queue, ticks))
    }

    /// Give a semaphore or mutex: an empty item sent to the back
    pub fn semaphore_give(&self, handle: QueueHandle) -> bool {
        self.queue_send(handle, &[], 0, QueuePosition::Back)
    }

    pub fn semaphore_give_from_isr(&self, handle: QueueHandle, woken: &mut bool) -> bool {
        self.operate_from_isr(handle, |kernel, queue| {
            kernel.semaphore_give_from_isr(queue, woken)
        })
    }

    #[cfg(feature = "mutexes")]
    pub fn mutex_take_recursive(&self, handle: QueueHandle, ticks: TickType) -> bool {
        self.operate(handle, |kernel, queue| kernel.mutex_take_recursive(queue, ticks))
    }

    #[cfg(feature = "mutexes")]
    pub fn mutex_give_recursive(&self, handle: QueueHandle) -> bool {
        self.operate(handle, |kernel, queue| kernel.mutex_give_recursive(queue))
    }

    // ========== Queries ==========

    pub fn messages_waiting(&self, handle: QueueHandle) -> u32 {
        self.operate(handle, |kernel, queue| kernel.messages_waiting(queue))
    }

    pub fn messages_waiting_from_isr(&self, handle: QueueHandle) -> u32 {
        self.operate_from_isr(handle, |kernel, queue| kernel.messages_waiting_from_isr(queue))
    }

    pub fn spaces_available(&self, handle: QueueHandle) -> u32 {
        self.operate(handle, |kernel, queue| kernel.spaces_available(queue))
    }

    pub fn queue_is_empty_from_isr(&self, handle: QueueHandle) -> bool {
        self.operate_from_isr(handle, |kernel, queue| kernel.queue_is_empty_from_isr(queue))
    }

    pub fn queue_is_full_from_isr(&self, handle: QueueHandle) -> bool {
        self.operate_from_isr(handle, |kernel, queue| kernel.queue_is_full_from_isr(queue))
    }

    /// Task holding the mutex, as a handle
    #[cfg(feature = "mutexes")]
    pub fn mutex_holder(&self, handle: QueueHandle) -> Option<TaskHandle> {
        self.operate(handle, |kernel, queue| self.encode(kernel.mutex_holder(queue)))
    }

    #[cfg(feature = "mutexes")]
    pub fn mutex_holder_from_isr(&self, handle: QueueHandle) -> Option<TaskHandle> {
        self.operate_from_isr(handle, |kernel, queue| {
            self.encode(kernel.mutex_holder_from_isr(queue))
        })
    }

    // ========== Registry ==========

    pub fn queue_add_to_registry(&self, handle: QueueHandle, name: &str) {
        self.operate(handle, |kernel, queue| kernel.queue_add_to_registry(queue, name))
    }

    pub fn queue_unregister(&self, handle: QueueHandle) {
        self.operate(handle, |kernel, queue| kernel.queue_unregister(queue))
    }

    pub fn queue_name(&self, handle: QueueHandle) -> Option<ObjectName> {
        self.operate(handle, |kernel, queue| kernel.queue_name(queue))
    }
}

#[cfg(all(
    test,
    feature = "dynamic-allocation",
    feature = "mutexes",
    feature = "counting-semaphores"
))]
mod tests {
    use super::*;
    use crate::pool::HandlePool;
    use kernel_api::TaskKernel;
    use kernel_mock::MockKernel;
    use mpu_port::{MockPort, PrivilegePort};

    #[test]
    fn test_send_receive_through_handle() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<4>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let q = mpu.queue_create(2, 4, QueueType::Base).unwrap();
        assert!(mpu.queue_send(q, &[1, 2, 3, 4], 0, QueuePosition::Back));
        assert_eq!(mpu.messages_waiting(q), 1);
        assert_eq!(mpu.spaces_available(q), 1);

        let mut out = [0u8; 4];
        assert!(mpu.queue_receive(q, &mut out, 10));
        assert_eq!(out, [1, 2, 3, 4]);
        assert!(!port.is_privileged());
    }

    #[test]
    fn test_mutex_holder_is_translated() {
        let port = MockPort::privileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<4>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let owner = kernel.spawn_task("owner", 1).unwrap();
        let owner_handle = mpu.adopt_task(owner).unwrap();
        kernel.set_current(Some(owner));

        let m = mpu.mutex_create(QueueType::Mutex).unwrap();
        assert_eq!(mpu.mutex_holder(m), None);

        assert!(mpu.semaphore_take(m, 0));
        assert_eq!(mpu.mutex_holder(m), Some(owner_handle));
        assert_eq!(mpu.mutex_holder_from_isr(m), Some(owner_handle));

        assert!(mpu.semaphore_give(m));
        assert_eq!(mpu.mutex_holder(m), None);
    }

    #[test]
    fn test_holder_without_handle_is_none() {
        let port = MockPort::privileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<4>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        // Task never went through the wrappers
        kernel.set_current(kernel.spawn_task("hidden", 1));
        let m = mpu.mutex_create(QueueType::Mutex).unwrap();
        assert!(mpu.semaphore_take(m, 0));

        assert_eq!(mpu.mutex_holder(m), None);
        assert!(kernel.current_task().is_some());
    }

    #[test]
    fn test_isr_variants_do_not_touch_privilege() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<4>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let q = mpu.queue_create(1, 1, QueueType::Base).unwrap();
        port.reset_counters();

        let mut woken = false;
        assert!(mpu.queue_send_from_isr(q, &[9], QueuePosition::Back, &mut woken));
        assert!(mpu.queue_is_full_from_isr(q));
        let mut out = [0u8; 1];
        assert!(mpu.queue_peek_from_isr(q, &mut out));
        assert!(mpu.queue_receive_from_isr(q, &mut out, &mut woken));
        assert!(mpu.queue_is_empty_from_isr(q));

        assert_eq!(port.counters().raises, 0);
        assert_eq!(port.counters().resets, 0);
    }

    #[test]
    fn test_counting_semaphore_and_registry() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<4>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let sem = mpu.counting_semaphore_create(3, 1).unwrap();
        assert!(mpu.semaphore_take(sem, 0));
        assert!(!mpu.semaphore_take(sem, 0));

        mpu.queue_add_to_registry(sem, "pool-sem");
        assert_eq!(mpu.queue_name(sem).unwrap(), "pool-sem");
        mpu.queue_unregister(sem);
        assert_eq!(mpu.queue_name(sem), None);
    }

    #[test]
    fn test_recursive_mutex() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<4>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        kernel.set_current(kernel.spawn_task("me", 1));
        let m = mpu.mutex_create(QueueType::RecursiveMutex).unwrap();

        assert!(mpu.mutex_take_recursive(m, 0));
        assert!(mpu.mutex_take_recursive(m, 0));
        assert!(mpu.mutex_give_recursive(m));
        assert!(mpu.mutex_give_recursive(m));
        assert!(!mpu.mutex_give_recursive(m));
    }
}
