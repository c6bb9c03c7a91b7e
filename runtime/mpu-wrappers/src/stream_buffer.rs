//! Stream and message buffer adapters
//!
//! Completion callbacks are not supported. Creation with a send- or
//! receive-completed callback is refused: no slot is reserved and the
//! kernel is not called.

use kernel_api::{StreamBufferKernel, StreamBufferParams, TickType};
#[cfg(feature = "static-allocation")]
use kernel_api::StaticBuffer;
use mpu_port::Port;

use crate::handle::{MessageBufferHandle, StreamBufferHandle};
use crate::table::HandleTable;
use crate::wrappers::MpuWrappers;

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: StreamBufferKernel + ?Sized,
    T: HandleTable,
{
    fn accepts_stream_params(params: &StreamBufferParams) -> bool {
        if params.has_callbacks() {
            log::warn!("stream buffer completion callbacks are not supported behind the MPU");
            return false;
        }
        true
    }

    // ========== Creation / Deletion ==========

    #[cfg(feature = "dynamic-allocation")]
    pub fn stream_buffer_create(&self, params: &StreamBufferParams) -> Option<StreamBufferHandle> {
        self.gate().run(|| {
            if !Self::accepts_stream_params(params) {
                return None;
            }
            self.create(|kernel| kernel.stream_buffer_create(params))
        })
    }

    #[cfg(feature = "static-allocation")]
    pub fn stream_buffer_create_static(
        &self,
        params: &StreamBufferParams,
        storage: StaticBuffer,
    ) -> Option<StreamBufferHandle> {
        self.gate().run(|| {
            if !Self::accepts_stream_params(params) {
                return None;
            }
            self.create(|kernel| kernel.stream_buffer_create_static(params, storage))
        })
    }

    /// Message buffer of `size_bytes`, without callbacks
    #[cfg(feature = "dynamic-allocation")]
    pub fn message_buffer_create(&self, size_bytes: usize) -> Option<MessageBufferHandle> {
        self.stream_buffer_create(&StreamBufferParams::message(size_bytes))
    }

    pub fn stream_buffer_delete(&self, handle: StreamBufferHandle) {
        self.delete(handle, |kernel, buffer| kernel.stream_buffer_delete(buffer))
    }

    // ========== Data Transfer ==========

    pub fn stream_buffer_send(
        &self,
        handle: StreamBufferHandle,
        data: &[u8],
        ticks: TickType,
    ) -> usize {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_send(buffer, data, ticks))
    }

    pub fn stream_buffer_send_from_isr(
        &self,
        handle: StreamBufferHandle,
        data: &[u8],
        woken: &mut bool,
    ) -> usize {
        self.operate_from_isr(handle, |kernel, buffer| {
            kernel.stream_buffer_send_from_isr(buffer, data, woken)
        })
    }

    pub fn stream_buffer_receive(
        &self,
        handle: StreamBufferHandle,
        out: &mut [u8],
        ticks: TickType,
    ) -> usize {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_receive(buffer, out, ticks))
    }

    pub fn stream_buffer_receive_from_isr(
        &self,
        handle: StreamBufferHandle,
        out: &mut [u8],
        woken: &mut bool,
    ) -> usize {
        self.operate_from_isr(handle, |kernel, buffer| {
            kernel.stream_buffer_receive_from_isr(buffer, out, woken)
        })
    }

    // ========== Queries / Control ==========

    pub fn stream_buffer_bytes_available(&self, handle: StreamBufferHandle) -> usize {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_bytes_available(buffer))
    }

    pub fn stream_buffer_spaces_available(&self, handle: StreamBufferHandle) -> usize {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_spaces_available(buffer))
    }

    pub fn stream_buffer_is_empty(&self, handle: StreamBufferHandle) -> bool {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_is_empty(buffer))
    }

    pub fn stream_buffer_is_full(&self, handle: StreamBufferHandle) -> bool {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_is_full(buffer))
    }

    pub fn stream_buffer_reset(&self, handle: StreamBufferHandle) -> bool {
        self.operate(handle, |kernel, buffer| kernel.stream_buffer_reset(buffer))
    }

    pub fn stream_buffer_set_trigger_level(&self, handle: StreamBufferHandle, level: usize) -> bool {
        self.operate(handle, |kernel, buffer| {
            kernel.stream_buffer_set_trigger_level(buffer, level)
        })
    }

    /// Length of the next message in a message buffer, 0 when empty
    pub fn stream_buffer_next_message_length(&self, handle: MessageBufferHandle) -> usize {
        self.operate(handle, |kernel, buffer| {
            kernel.stream_buffer_next_message_length(buffer)
        })
    }
}

#[cfg(all(test, feature = "dynamic-allocation"))]
mod tests {
    use super::*;
    use crate::pool::HandlePool;
    use kernel_mock::MockKernel;
    use mpu_port::MockPort;

    fn on_complete(_: usize) {}

    #[test]
    fn test_callbacks_rejected_without_reservation() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<2>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let mut params = StreamBufferParams::stream(32, 1);
        params.send_completed = Some(on_complete);

        assert_eq!(mpu.stream_buffer_create(&params), None);
        assert_eq!(pool.bound_count(), 0);
        assert!(kernel.calls().is_empty());
        assert_eq!(port.counters().raises, 1);
        assert_eq!(port.counters().resets, 1);
    }

    #[test]
    fn test_stream_transfer() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<2>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let buffer = mpu
            .stream_buffer_create(&StreamBufferParams::stream(8, 1))
            .unwrap();
        assert!(mpu.stream_buffer_is_empty(buffer));
        assert_eq!(mpu.stream_buffer_send(buffer, b"hello", 25), 5);
        assert_eq!(kernel.last_ticks(), Some(25));
        assert_eq!(mpu.stream_buffer_bytes_available(buffer), 5);
        assert_eq!(mpu.stream_buffer_spaces_available(buffer), 3);

        let mut out = [0u8; 8];
        let mut woken = false;
        assert_eq!(mpu.stream_buffer_receive_from_isr(buffer, &mut out, &mut woken), 5);
        assert_eq!(&out[..5], b"hello");

        assert!(mpu.stream_buffer_set_trigger_level(buffer, 4));
        assert!(!mpu.stream_buffer_set_trigger_level(buffer, 9));
        assert!(mpu.stream_buffer_reset(buffer));
    }

    #[test]
    fn test_message_buffer() {
        let port = MockPort::unprivileged();
        let kernel = MockKernel::new();
        let pool = HandlePool::<2>::new();
        let mpu = MpuWrappers::new(&port, &kernel, &pool);

        let buffer = mpu.message_buffer_create(32).unwrap();
        assert_eq!(mpu.stream_buffer_next_message_length(buffer), 0);
        assert_eq!(mpu.stream_buffer_send(buffer, b"ping", 0), 4);
        assert_eq!(mpu.stream_buffer_next_message_length(buffer), 4);

        mpu.stream_buffer_delete(buffer);
        assert_eq!(pool.bound_count(), 0);
        assert_eq!(mpu.stream_buffer_next_message_length(buffer), 0);
    }
}
