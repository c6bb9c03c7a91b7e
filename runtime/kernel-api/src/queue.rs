//! Queue, semaphore, mutex and queue set primitives
//!
//! Semaphores and mutexes are queues with zero-sized items, so a single
//! [`QueueRef`] designates all of them.

use crate::object::{QueueRef, QueueSetMemberRef, QueueSetRef, TaskRef};
use crate::types::{ObjectName, QueuePosition, QueueType, StaticBuffer, TickType};

pub trait QueueKernel {
    // ========== Creation / Deletion ==========

    fn queue_create(&self, length: u32, item_size: u32, queue_type: QueueType)
        -> Option<QueueRef>;

    fn queue_create_static(
        &self,
        length: u32,
        item_size: u32,
        storage: StaticBuffer,
        queue_type: QueueType,
    ) -> Option<QueueRef>;

    fn mutex_create(&self, mutex_type: QueueType) -> Option<QueueRef>;

    fn mutex_create_static(&self, mutex_type: QueueType, storage: StaticBuffer)
        -> Option<QueueRef>;

    fn counting_semaphore_create(&self, max_count: u32, initial_count: u32) -> Option<QueueRef>;

    fn counting_semaphore_create_static(
        &self,
        max_count: u32,
        initial_count: u32,
        storage: StaticBuffer,
    ) -> Option<QueueRef>;

    fn queue_delete(&self, queue: QueueRef);

    fn queue_reset(&self, queue: QueueRef) -> bool;

    // ========== Data Transfer ==========

    fn queue_send(
        &self,
        queue: QueueRef,
        item: &[u8],
        ticks: TickType,
        position: QueuePosition,
    ) -> bool;

    fn queue_send_from_isr(
        &self,
        queue: QueueRef,
        item: &[u8],
        position: QueuePosition,
        woken: &mut bool,
    ) -> bool;

    fn queue_receive(&self, queue: QueueRef, buffer: &mut [u8], ticks: TickType) -> bool;

    fn queue_receive_from_isr(&self, queue: QueueRef, buffer: &mut [u8], woken: &mut bool)
        -> bool;

    fn queue_peek(&self, queue: QueueRef, buffer: &mut [u8], ticks: TickType) -> bool;

    fn queue_peek_from_isr(&self, queue: QueueRef, buffer: &mut [u8]) -> bool;

    fn semaphore_take(&self, queue: QueueRef, ticks: TickType) -> bool;

    fn semaphore_give_from_isr(&self, queue: QueueRef, woken: &mut bool) -> bool;

    fn mutex_take_recursive(&self, queue: QueueRef, ticks: TickType) -> bool;

    fn mutex_give_recursive(&self, queue: QueueRef) -> bool;

    // ========== Queries ==========

    fn messages_waiting(&self, queue: QueueRef) -> u32;

    fn messages_waiting_from_isr(&self, queue: QueueRef) -> u32;

    fn spaces_available(&self, queue: QueueRef) -> u32;

    fn queue_is_empty_from_isr(&self, queue: QueueRef) -> bool;

    fn queue_is_full_from_isr(&self, queue: QueueRef) -> bool;

    fn mutex_holder(&self, queue: QueueRef) -> Option<TaskRef>;

    fn mutex_holder_from_isr(&self, queue: QueueRef) -> Option<TaskRef>;

    // ========== Registry ==========

    fn queue_add_to_registry(&self, queue: QueueRef, name: &str);

    fn queue_unregister(&self, queue: QueueRef);

    fn queue_name(&self, queue: QueueRef) -> Option<ObjectName>;
}

pub trait QueueSetKernel {
    fn queue_set_create(&self, length: u32) -> Option<QueueSetRef>;

    fn queue_set_delete(&self, set: QueueSetRef);

    fn queue_set_add(&self, member: QueueSetMemberRef, set: QueueSetRef) -> bool;

    fn queue_set_remove(&self, member: QueueSetMemberRef, set: QueueSetRef) -> bool;

    /// Member that has data available, `None` on timeout
    fn queue_set_select(&self, set: QueueSetRef, ticks: TickType) -> Option<QueueSetMemberRef>;

    fn queue_set_select_from_isr(&self, set: QueueSetRef) -> Option<QueueSetMemberRef>;
}
