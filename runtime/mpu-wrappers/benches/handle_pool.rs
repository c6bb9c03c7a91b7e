//! Handle pool and privilege gate overhead

use std::hint::black_box;
use std::num::NonZeroUsize;

use criterion::{criterion_group, criterion_main, Criterion};
use kernel_api::{EventGroupRef, KernelObject, QueuePosition, QueueType};
use kernel_mock::MockKernel;
use mpu_port::{MockPort, NullPort};
use mpu_wrappers::{Handle, HandlePool, HandleTable, MpuWrappers, PrivilegeGate};

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");
    let object = EventGroupRef::from_addr(NonZeroUsize::new(0x1000).unwrap()).object_ref();

    group.bench_function("reserve_bind_release", |b| {
        let pool = HandlePool::<64>::new();
        b.iter(|| {
            let index = pool.reserve_free_slot(&NullPort).unwrap();
            pool.bind(index, black_box(object));
            pool.release_slot(index, &NullPort);
        })
    });

    group.bench_function("reserve_last_slot", |b| {
        let pool = HandlePool::<64>::new();
        for _ in 0..63 {
            pool.reserve_free_slot(&NullPort).unwrap();
        }
        b.iter(|| {
            let index = pool.reserve_free_slot(&NullPort).unwrap();
            pool.release_slot(black_box(index), &NullPort);
        })
    });

    group.bench_function("resolve", |b| {
        let pool = HandlePool::<64>::new();
        let reservation = pool.reserve(&NullPort).unwrap();
        let raw = pool.commit(reservation, object);
        b.iter(|| pool.resolve(black_box(raw), object.kind()))
    });

    group.finish();
}

fn bench_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate");

    group.bench_function("privileged", |b| {
        let gate = PrivilegeGate::new(&NullPort);
        b.iter(|| gate.run(|| black_box(1)))
    });

    group.bench_function("unprivileged_mock", |b| {
        let port = MockPort::unprivileged();
        let gate = PrivilegeGate::new(&port);
        b.iter(|| {
            gate.run(|| black_box(1));
            port.reset_counters();
        })
    });

    group.finish();
}

fn bench_adapter(c: &mut Criterion) {
    let kernel = MockKernel::new();
    let pool = HandlePool::<64>::new();
    let mpu = MpuWrappers::new(&NullPort, &kernel, &pool);
    let queue = mpu.queue_create(1, 4, QueueType::Base).unwrap();
    let mut buffer = [0u8; 4];

    c.bench_function("adapter/send_receive", |b| {
        b.iter(|| {
            mpu.queue_send(queue, black_box(&[1, 2, 3, 4]), 0, QueuePosition::Back);
            mpu.queue_receive(queue, &mut buffer, 0);
            kernel.clear_calls();
        })
    });

    c.bench_function("adapter/invalid_handle", |b| {
        b.iter(|| mpu.messages_waiting(black_box(Handle::from_raw(-1))))
    });
}

criterion_group!(benches, bench_pool, bench_gate, bench_adapter);
criterion_main!(benches);
