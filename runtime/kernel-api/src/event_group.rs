//! Event group primitives

use crate::object::EventGroupRef;
use crate::types::{EventBits, StaticBuffer, TickType};

pub trait EventGroupKernel {
    fn event_group_create(&self) -> Option<EventGroupRef>;

    fn event_group_create_static(&self, storage: StaticBuffer) -> Option<EventGroupRef>;

    fn event_group_delete(&self, group: EventGroupRef);

    /// Returns the bits at the time the call returned
    fn event_group_set_bits(&self, group: EventGroupRef, bits: EventBits) -> EventBits;

    /// Returns the bits before clearing
    fn event_group_clear_bits(&self, group: EventGroupRef, bits: EventBits) -> EventBits;

    fn event_group_wait_bits(
        &self,
        group: EventGroupRef,
        bits: EventBits,
        clear_on_exit: bool,
        wait_for_all: bool,
        ticks: TickType,
    ) -> EventBits;

    fn event_group_sync(
        &self,
        group: EventGroupRef,
        set: EventBits,
        wait_for: EventBits,
        ticks: TickType,
    ) -> EventBits;

    fn event_group_bits_from_isr(&self, group: EventGroupRef) -> EventBits;

    fn event_group_set_bits_from_isr(
        &self,
        group: EventGroupRef,
        bits: EventBits,
        woken: &mut bool,
    ) -> bool;

    fn event_group_clear_bits_from_isr(&self, group: EventGroupRef, bits: EventBits) -> bool;

    fn event_group_number(&self, group: EventGroupRef) -> u32;

    fn set_event_group_number(&self, group: EventGroupRef, number: u32);
}
