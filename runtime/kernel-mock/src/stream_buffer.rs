use std::collections::VecDeque;

use kernel_api::{
    KernelObject, StaticBuffer, StreamBufferKernel, StreamBufferKind, StreamBufferParams,
    StreamBufferRef, TickType,
};

use crate::{MockKernel, MockStreamBuffer, State, MESSAGE_LENGTH_BYTES};

fn create(state: &mut State, params: &StreamBufferParams) -> Option<StreamBufferRef> {
    if params.size_bytes == 0 || params.trigger_level_bytes > params.size_bytes {
        return None;
    }
    let addr = state.allocate()?;
    state.streams.insert(
        addr.get(),
        MockStreamBuffer {
            kind: params.kind,
            size: params.size_bytes,
            trigger_level: params.trigger_level_bytes.max(1),
            bytes: VecDeque::new(),
            frames: VecDeque::new(),
        },
    );
    Some(StreamBufferRef::from_addr(addr))
}

fn buffer(state: &mut State, buffer: StreamBufferRef) -> Option<&mut MockStreamBuffer> {
    state.streams.get_mut(&buffer.addr().get())
}

fn send(b: &mut MockStreamBuffer, data: &[u8]) -> usize {
    match b.kind {
        StreamBufferKind::Stream => {
            let len = data.len().min(b.space());
            b.bytes.extend(&data[..len]);
            len
        }
        StreamBufferKind::Message => {
            if data.len() + MESSAGE_LENGTH_BYTES > b.space() {
                return 0;
            }
            b.bytes.extend(data);
            b.frames.push_back(data.len());
            data.len()
        }
    }
}

fn receive(b: &mut MockStreamBuffer, out: &mut [u8]) -> usize {
    let len = match b.kind {
        StreamBufferKind::Stream => out.len().min(b.bytes.len()),
        StreamBufferKind::Message => match b.frames.front() {
            Some(&frame) if frame <= out.len() => {
                b.frames.pop_front();
                frame
            }
            _ => return 0,
        },
    };
    for (dst, src) in out.iter_mut().zip(b.bytes.drain(..len)) {
        *dst = src;
    }
    len
}

impl StreamBufferKernel for MockKernel {
    fn stream_buffer_create(&self, params: &StreamBufferParams) -> Option<StreamBufferRef> {
        self.with("stream_buffer_create", |s| create(s, params))
    }

    fn stream_buffer_create_static(
        &self,
        params: &StreamBufferParams,
        _storage: StaticBuffer,
    ) -> Option<StreamBufferRef> {
        self.with("stream_buffer_create_static", |s| create(s, params))
    }

    fn stream_buffer_delete(&self, b: StreamBufferRef) {
        self.with("stream_buffer_delete", |s| {
            s.streams.remove(&b.addr().get());
        })
    }

    fn stream_buffer_send(&self, b: StreamBufferRef, data: &[u8], ticks: TickType) -> usize {
        self.with("stream_buffer_send", |s| {
            s.ticks(ticks);
            buffer(s, b).map_or(0, |b| send(b, data))
        })
    }

    fn stream_buffer_send_from_isr(
        &self,
        b: StreamBufferRef,
        data: &[u8],
        woken: &mut bool,
    ) -> usize {
        self.with("stream_buffer_send_from_isr", |s| {
            *woken = false;
            buffer(s, b).map_or(0, |b| send(b, data))
        })
    }

    fn stream_buffer_receive(&self, b: StreamBufferRef, out: &mut [u8], ticks: TickType) -> usize {
        self.with("stream_buffer_receive", |s| {
            s.ticks(ticks);
            buffer(s, b).map_or(0, |b| receive(b, out))
        })
    }

    fn stream_buffer_receive_from_isr(
        &self,
        b: StreamBufferRef,
        out: &mut [u8],
        woken: &mut bool,
    ) -> usize {
        self.with("stream_buffer_receive_from_isr", |s| {
            *woken = false;
            buffer(s, b).map_or(0, |b| receive(b, out))
        })
    }

    fn stream_buffer_bytes_available(&self, b: StreamBufferRef) -> usize {
        self.with("stream_buffer_bytes_available", |s| {
            buffer(s, b).map_or(0, |b| b.used())
        })
    }

    fn stream_buffer_spaces_available(&self, b: StreamBufferRef) -> usize {
        self.with("stream_buffer_spaces_available", |s| {
            buffer(s, b).map_or(0, |b| b.space())
        })
    }

    fn stream_buffer_is_empty(&self, b: StreamBufferRef) -> bool {
        self.with("stream_buffer_is_empty", |s| {
            buffer(s, b).map_or(false, |b| b.used() == 0)
        })
    }

    fn stream_buffer_is_full(&self, b: StreamBufferRef) -> bool {
        self.with("stream_buffer_is_full", |s| {
            buffer(s, b).map_or(false, |b| match b.kind {
                StreamBufferKind::Stream => b.space() == 0,
                StreamBufferKind::Message => b.space() <= MESSAGE_LENGTH_BYTES,
            })
        })
    }

    fn stream_buffer_reset(&self, b: StreamBufferRef) -> bool {
        self.with("stream_buffer_reset", |s| {
            buffer(s, b).map_or(false, |b| {
                b.bytes.clear();
                b.frames.clear();
                true
            })
        })
    }

    fn stream_buffer_set_trigger_level(&self, b: StreamBufferRef, level: usize) -> bool {
        self.with("stream_buffer_set_trigger_level", |s| {
            buffer(s, b).map_or(false, |b| {
                if level > b.size {
                    return false;
                }
                b.trigger_level = level.max(1);
                true
            })
        })
    }

    fn stream_buffer_next_message_length(&self, b: StreamBufferRef) -> usize {
        self.with("stream_buffer_next_message_length", |s| {
            buffer(s, b).map_or(0, |b| b.frames.front().copied().unwrap_or(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_partial_send() {
        let kernel = MockKernel::new();
        let b = kernel
            .stream_buffer_create(&StreamBufferParams::stream(4, 1))
            .unwrap();

        assert_eq!(kernel.stream_buffer_send(b, b"abcdef", 0), 4);
        assert!(kernel.stream_buffer_is_full(b));

        let mut out = [0u8; 3];
        assert_eq!(kernel.stream_buffer_receive(b, &mut out, 0), 3);
        assert_eq!(&out, b"abc");
        assert_eq!(kernel.stream_buffer_bytes_available(b), 1);
    }

    #[test]
    fn test_message_framing() {
        let kernel = MockKernel::new();
        let b = kernel
            .stream_buffer_create(&StreamBufferParams::message(32))
            .unwrap();

        assert_eq!(kernel.stream_buffer_send(b, b"hello", 0), 5);
        assert_eq!(kernel.stream_buffer_next_message_length(b), 5);

        // Too small for the whole message: nothing is read
        let mut small = [0u8; 2];
        assert_eq!(kernel.stream_buffer_receive(b, &mut small, 0), 0);

        let mut out = [0u8; 8];
        assert_eq!(kernel.stream_buffer_receive(b, &mut out, 0), 5);
        assert_eq!(&out[..5], b"hello");
        assert!(kernel.stream_buffer_is_empty(b));
    }

    #[test]
    fn test_trigger_level_bounds() {
        let kernel = MockKernel::new();
        let b = kernel
            .stream_buffer_create(&StreamBufferParams::stream(16, 4))
            .unwrap();

        assert!(kernel.stream_buffer_set_trigger_level(b, 16));
        assert!(!kernel.stream_buffer_set_trigger_level(b, 17));
    }
}
