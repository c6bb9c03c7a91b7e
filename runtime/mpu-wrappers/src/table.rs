//! Handle translation strategies
//!
//! Adapters are written once against [`HandleTable`]; the `handle-pool`
//! feature picks which table backs [`DefaultTable`]:
//!
//! - [`HandlePool`]: handles are `slot index + HANDLE_OFFSET`
//! - [`PassThrough`]: handles are kernel addresses, nothing is stored
//!
//! Both report bad caller handles as [`HandleError`]s; bounds violations on
//! indices the layer computed itself stay fatal inside the pool.

use core::num::NonZeroUsize;

use kernel_api::{ObjectKind, ObjectRef};
use mpu_port::SchedulerPort;

use crate::handle::{HandleError, Result};
use crate::pool::{HandlePool, HANDLE_OFFSET};

/// Room claimed for an object that is about to be created
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be committed or aborted"]
pub struct Reservation(usize);

/// Maps raw external handles to kernel-object references and back
pub trait HandleTable {
    /// Claim room for one object; `None` if the table is full
    fn reserve<S: SchedulerPort + ?Sized>(&self, port: &S) -> Option<Reservation>;

    /// Record the object created for `reservation` and return its raw handle
    fn commit(&self, reservation: Reservation, object: ObjectRef) -> isize;

    /// Like `commit`, but if `object` already has a handle the reservation
    /// is given back and that handle is returned instead
    fn commit_or_existing<S: SchedulerPort + ?Sized>(
        &self,
        reservation: Reservation,
        object: ObjectRef,
        port: &S,
    ) -> isize;

    /// Give back a reservation whose creation failed
    fn abort<S: SchedulerPort + ?Sized>(&self, reservation: Reservation, port: &S);

    /// Translate a raw handle to an object of kind `expected`
    fn resolve(&self, raw: isize, expected: ObjectKind) -> Result<ObjectRef>;

    /// Forget a handle whose object was deleted
    ///
    /// `raw` must have resolved successfully just before.
    fn retire<S: SchedulerPort + ?Sized>(&self, raw: isize, port: &S);

    /// Raw handle currently designating `object`, if any
    fn handle_of(&self, object: ObjectRef) -> Option<isize>;
}

// ========== Handle Pool ==========

impl<const N: usize> HandlePool<N> {
    /// Slot index behind a raw handle, if it is in range
    pub fn index_of(&self, raw: isize) -> Result<usize> {
        if raw == 0 {
            return Err(HandleError::Null);
        }

        usize::try_from(raw)
            .ok()
            .and_then(|raw| raw.checked_sub(HANDLE_OFFSET))
            .filter(|index| *index < N)
            .ok_or(HandleError::OutOfRange { raw })
    }

    fn handle_for(index: usize) -> isize {
        // N < isize::MAX is checked when the pool is built
        (index + HANDLE_OFFSET) as isize
    }
}

impl<const N: usize> HandleTable for HandlePool<N> {
    fn reserve<S: SchedulerPort + ?Sized>(&self, port: &S) -> Option<Reservation> {
        self.reserve_free_slot(port).map(Reservation)
    }

    fn commit(&self, reservation: Reservation, object: ObjectRef) -> isize {
        self.bind(reservation.0, object);
        Self::handle_for(reservation.0)
    }

    fn commit_or_existing<S: SchedulerPort + ?Sized>(
        &self,
        reservation: Reservation,
        object: ObjectRef,
        port: &S,
    ) -> isize {
        let index = self.bind_or_existing(reservation.0, object);
        if index != reservation.0 {
            self.release_slot(reservation.0, port);
        }
        Self::handle_for(index)
    }

    fn abort<S: SchedulerPort + ?Sized>(&self, reservation: Reservation, port: &S) {
        log::debug!("creation failed, rolling back handle slot {}", reservation.0);
        self.release_slot(reservation.0, port);
    }

    fn resolve(&self, raw: isize, expected: ObjectKind) -> Result<ObjectRef> {
        let index = self.index_of(raw)?;
        let object = self.lookup(index).ok_or(HandleError::Stale { index })?;

        if object.kind() != expected {
            log::warn!(
                "handle {} refers to a {}, used as a {}",
                raw,
                object.kind(),
                expected
            );
            return Err(HandleError::KindMismatch {
                expected,
                found: object.kind(),
            });
        }
        Ok(object)
    }

    fn retire<S: SchedulerPort + ?Sized>(&self, raw: isize, port: &S) {
        if let Ok(index) = self.index_of(raw) {
            self.release_slot(index, port);
        }
    }

    fn handle_of(&self, object: ObjectRef) -> Option<isize> {
        self.reverse_lookup(object).map(Self::handle_for)
    }
}

// ========== Pass-through ==========

/// No indirection: the handle is the kernel address
///
/// Used on builds without the handle pool. The privilege gate still applies.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl PassThrough {
    pub const fn new() -> Self {
        Self
    }
}

impl HandleTable for PassThrough {
    fn reserve<S: SchedulerPort + ?Sized>(&self, _port: &S) -> Option<Reservation> {
        Some(Reservation(0))
    }

    fn commit(&self, _reservation: Reservation, object: ObjectRef) -> isize {
        object.addr().get() as isize
    }

    fn commit_or_existing<S: SchedulerPort + ?Sized>(
        &self,
        reservation: Reservation,
        object: ObjectRef,
        _port: &S,
    ) -> isize {
        self.commit(reservation, object)
    }

    fn abort<S: SchedulerPort + ?Sized>(&self, _reservation: Reservation, _port: &S) {}

    fn resolve(&self, raw: isize, expected: ObjectKind) -> Result<ObjectRef> {
        let addr = NonZeroUsize::new(raw as usize).ok_or(HandleError::Null)?;
        Ok(ObjectRef::new(expected, addr))
    }

    fn retire<S: SchedulerPort + ?Sized>(&self, _raw: isize, _port: &S) {}

    fn handle_of(&self, object: ObjectRef) -> Option<isize> {
        Some(object.addr().get() as isize)
    }
}

/// Table selected by the `handle-pool` feature
#[cfg(feature = "handle-pool")]
pub type DefaultTable = HandlePool<{ crate::config::HANDLE_POOL_SIZE }>;

/// Table selected by the `handle-pool` feature
#[cfg(not(feature = "handle-pool"))]
pub type DefaultTable = PassThrough;
