//! Stream and message buffer primitives

use crate::object::StreamBufferRef;
use crate::types::{StaticBuffer, StreamBufferParams, TickType};

pub trait StreamBufferKernel {
    fn stream_buffer_create(&self, params: &StreamBufferParams) -> Option<StreamBufferRef>;

    fn stream_buffer_create_static(
        &self,
        params: &StreamBufferParams,
        storage: StaticBuffer,
    ) -> Option<StreamBufferRef>;

    fn stream_buffer_delete(&self, buffer: StreamBufferRef);

    /// Returns the number of bytes written
    fn stream_buffer_send(&self, buffer: StreamBufferRef, data: &[u8], ticks: TickType) -> usize;

    fn stream_buffer_send_from_isr(
        &self,
        buffer: StreamBufferRef,
        data: &[u8],
        woken: &mut bool,
    ) -> usize;

    /// Returns the number of bytes read
    fn stream_buffer_receive(
        &self,
        buffer: StreamBufferRef,
        out: &mut [u8],
        ticks: TickType,
    ) -> usize;

    fn stream_buffer_receive_from_isr(
        &self,
        buffer: StreamBufferRef,
        out: &mut [u8],
        woken: &mut bool,
    ) -> usize;

    fn stream_buffer_bytes_available(&self, buffer: StreamBufferRef) -> usize;

    fn stream_buffer_spaces_available(&self, buffer: StreamBufferRef) -> usize;

    fn stream_buffer_is_empty(&self, buffer: StreamBufferRef) -> bool;

    fn stream_buffer_is_full(&self, buffer: StreamBufferRef) -> bool;

    fn stream_buffer_reset(&self, buffer: StreamBufferRef) -> bool;

    fn stream_buffer_set_trigger_level(&self, buffer: StreamBufferRef, level: usize) -> bool;

    fn stream_buffer_next_message_length(&self, buffer: StreamBufferRef) -> usize;
}
