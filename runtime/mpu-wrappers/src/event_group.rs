//! Event group adapters

use kernel_api::{EventBits, EventGroupKernel, TickType};
#[cfg(feature = "static-allocation")]
use kernel_api::StaticBuffer;
use mpu_port::Port;

use crate::handle::EventGroupHandle;
use crate::table::HandleTable;
use crate::wrappers::MpuWrappers;

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: EventGroupKernel + ?Sized,
    T: HandleTable,
{
    #[cfg(feature = "dynamic-allocation")]
    pub fn event_group_create(&self) -> Option<EventGroupHandle> {
        self.create(|kernel| kernel.event_group_create())
    }

    #[cfg(feature = "static-allocation")]
    pub fn event_group_create_static(&self, storage: StaticBuffer) -> Option<EventGroupHandle> {
        self.create(|kernel| kernel.event_group_create_static(storage))
    }

    pub fn event_group_delete(&self, handle: EventGroupHandle) {
        self.delete(handle, |kernel, group| kernel.event_group_delete(group))
    }

    pub fn event_group_set_bits(&self, handle: EventGroupHandle, bits: EventBits) -> EventBits {
        self.operate(handle, |kernel, group| kernel.event_group_set_bits(group, bits))
    }

    pub fn event_group_clear_bits(&self, handle: EventGroupHandle, bits: EventBits) -> EventBits {
        self.operate(handle, |kernel, group| kernel.event_group_clear_bits(group, bits))
    }

    pub fn event_group_wait_bits(
        &self,
        handle: EventGroupHandle,
        bits: EventBits,
        clear_on_exit: bool,
        wait_for_all: bool,
        ticks: TickType,
    ) -> EventBits {
        self.operate(handle, |kernel, group| {
            kernel.event_group_wait_bits(group, bits, clear_on_exit, wait_for_all, ticks)
        })
    }

    /// Set `set`, then wait for every bit in `wait_for`
    pub fn event_group_sync(
        &self,
        handle: EventGroupHandle,
        set: EventBits,
        wait_for: EventBits,
        ticks: TickType,
    ) -> EventBits {
        self.operate(handle, |kernel, group| {
            kernel.event_group_sync(group, set, wait_for, ticks)
        })
    }

    pub fn event_group_bits_from_isr(&self, handle: EventGroupHandle) -> EventBits {
        self.operate_from_isr(handle, |kernel, group| kernel.event_group_bits_from_isr(group))
    }

    pub fn event_group_set_bits_from_isr(
        &self,
        handle: EventGroupHandle,
        bits: EventBits,
        woken: &mut bool,
    ) -> bool {
        self.operate_from_isr(handle, |kernel, group| {
            kernel.event_group_set_bits_from_isr(group, bits, woken)
        })
    }

    pub fn event_group_clear_bits_from_isr(&self, handle: EventGroupHandle, bits: EventBits) -> bool {
        self.operate_from_isr(handle, |kernel, group| {
            kernel.event_group_clear_bits_from_isr(group, bits)
        })
    }

    #[cfg(feature = "trace-facility")]
    pub fn event_group_number(&self, handle: EventGroupHandle) -> u32 {
        self.operate(handle, |kernel, group| kernel.event_group_number(group))
    }

    #[cfg(feature = "trace-facility")]
    pub fn set_event_group_number(&self, handle: EventGroupHandle, number: u32) {
        self.operate(handle, |kernel, group| kernel.set_event_group_number(group, number))
    }
}

#[cfg(all(test, feature = "dynamic-allocation", feature = "trace-facility"))]
mod tests {
    use super::*;
    use crate::handle::Handle;
    use crate::pool::HandlePool;
    use kernel_mock::MockKernel;
    use mpu_port::MockPort;

    #[test]
    fn test_bits_round_trip() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<2>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let group = mpu.event_group_create().unwrap();
        assert_eq!(mpu.event_group_set_bits(group, 0b101), 0b101);
        assert_eq!(mpu.event_group_clear_bits(group, 0b001), 0b101);
        assert_eq!(mpu.event_group_bits_from_isr(group), 0b100);

        mpu.set_event_group_number(group, 12);
        assert_eq!(mpu.event_group_number(group), 12);
    }

    #[test]
    fn test_invalid_group_reads_zero() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<2>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let mut woken = false;
        assert_eq!(mpu.event_group_set_bits(Handle::from_raw(3), 1), 0);
        assert_eq!(mpu.event_group_wait_bits(Handle::NULL, 1, true, true, 5), 0);
        assert!(!mpu.event_group_set_bits_from_isr(Handle::from_raw(-4), 1, &mut woken));

        assert!(kernel.calls().is_empty());
        // Two gated calls, the ISR variant stays unprivileged
        assert_eq!(port.counters().raises, 2);
        assert_eq!(port.counters().resets, 2);
    }

    #[test]
    fn test_stale_handle_after_delete() {
        let port = MockPort::privileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<2>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let group = mpu.event_group_create().unwrap();
        mpu.event_group_delete(group);
        kernel.clear_calls();

        assert_eq!(mpu.event_group_set_bits(group, 1), 0);
        assert_eq!(kernel.call_count("event_group_set_bits"), 0);
    }
}
