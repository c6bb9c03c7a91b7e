//! Handle Pool
//!
//! # Purpose
//! Fixed-capacity table mapping external handles to kernel-object references.
//! The pool knows nothing about privilege or about what the objects are; it
//! only tracks which slot holds which reference.
//!
//! # Slot Lifecycle
//! ```text
//! Free --reserve_free_slot--> Reserved --bind--> Bound(ref)
//!   ^                            |                   |
//!   +-------release_slot---------+---release_slot----+
//! ```
//! `Reserved` only exists inside a single creation call.
//!
//! # Exclusion
//! - `reserve_free_slot`: scheduler suspended for the scan-and-claim
//! - `release_slot`: critical section around the single-slot write
//! - `bind`, `lookup`, `reverse_lookup`: no additional exclusion
//!
//! The slot array also sits behind a spin lock so host threads in tests see
//! the same exclusivity the port primitives give on target.
//!
//! # Testing Strategy
//! - Unit tests: ordering, reuse, exhaustion, fatal bounds checks
//! - Integration tests: interleaved and multi-threaded reservation

use kernel_api::ObjectRef;
use mpu_port::{CriticalSection, SchedulerPort, SchedulerSuspended};
use spin::Mutex;

/// Added to a slot index to form the external handle, so handle 0 stays null
pub const HANDLE_OFFSET: usize = 1;

static_assertions::const_assert_eq!(HANDLE_OFFSET, 1);

/// State of one pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Free,
    /// Claimed by a creation call that has not finished yet
    Reserved,
    /// Non-owning reference to a live kernel object
    Bound(ObjectRef),
}

/// Bounded handle pool with `N` slots
pub struct HandlePool<const N: usize> {
    slots: Mutex<[Slot; N]>,
}

impl<const N: usize> HandlePool<N> {
    const CAPACITY_OK: () = assert!(
        N > 0 && N < isize::MAX as usize,
        "handle pool capacity must be non-zero and fit a handle"
    );

    /// Create a pool with every slot `Free`
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            slots: Mutex::new([Slot::Free; N]),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    // ========== Slot Transitions ==========

    /// Claim the lowest-indexed free slot
    ///
    /// Runs with the scheduler suspended so no other task can scan the pool
    /// at the same time. Returns `None` if every slot is in use.
    pub fn reserve_free_slot<S: SchedulerPort + ?Sized>(&self, port: &S) -> Option<usize> {
        let _suspended = SchedulerSuspended::new(port);
        let mut slots = self.slots.lock();

        let Some(index) = slots.iter().position(|slot| *slot == Slot::Free) else {
            log::debug!("handle pool exhausted ({} slots)", N);
            return None;
        };

        slots[index] = Slot::Reserved;
        log::trace!("reserved handle slot {}", index);
        Some(index)
    }

    /// Return a slot to `Free`, whatever its state
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn release_slot<S: SchedulerPort + ?Sized>(&self, index: usize, port: &S) {
        assert!(index < N, "handle slot {} out of bounds (capacity {})", index, N);

        let _critical = CriticalSection::new(port);
        self.slots.lock()[index] = Slot::Free;
        log::debug!("released handle slot {}", index);
    }

    /// Bind a `Reserved` slot to the object just created for it
    ///
    /// # Panics
    /// Panics if `index` is out of bounds, the slot is not `Reserved`, or
    /// `object` is already bound to another slot.
    pub fn bind(&self, index: usize, object: ObjectRef) {
        assert!(index < N, "handle slot {} out of bounds (capacity {})", index, N);

        let mut slots = self.slots.lock();
        assert_eq!(
            slots[index],
            Slot::Reserved,
            "binding handle slot {} that was not reserved",
            index
        );
        assert!(
            !slots.contains(&Slot::Bound(object)),
            "{} is already bound to another handle slot",
            object
        );

        slots[index] = Slot::Bound(object);
        log::trace!("bound handle slot {} to {}", index, object);
    }

    /// Bind a `Reserved` slot unless `object` already holds another slot
    ///
    /// Returns the index now designating `object`. When that is not `index`
    /// the slot stays `Reserved` and the caller releases it.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds or the slot is not `Reserved`.
    pub fn bind_or_existing(&self, index: usize, object: ObjectRef) -> usize {
        assert!(index < N, "handle slot {} out of bounds (capacity {})", index, N);

        let mut slots = self.slots.lock();
        assert_eq!(
            slots[index],
            Slot::Reserved,
            "binding handle slot {} that was not reserved",
            index
        );
        if let Some(existing) = slots.iter().position(|slot| *slot == Slot::Bound(object)) {
            log::debug!("{} already bound to handle slot {}", object, existing);
            return existing;
        }

        slots[index] = Slot::Bound(object);
        log::trace!("bound handle slot {} to {}", index, object);
        index
    }

    /// Reference held by slot `index`, `None` unless the slot is `Bound`
    ///
    /// # Panics
    /// Panics if `index` is out of bounds; callers range-check external
    /// handles first.
    pub fn lookup(&self, index: usize) -> Option<ObjectRef> {
        assert!(index < N, "handle slot {} out of bounds (capacity {})", index, N);

        match self.slots.lock()[index] {
            Slot::Bound(object) => Some(object),
            Slot::Free | Slot::Reserved => None,
        }
    }

    /// Index of the slot bound to `object`
    pub fn reverse_lookup(&self, object: ObjectRef) -> Option<usize> {
        self.slots
            .lock()
            .iter()
            .position(|slot| *slot == Slot::Bound(object))
    }

    // ========== Diagnostics ==========

    /// State of slot `index`, `None` if out of bounds
    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.slots.lock().get(index).copied()
    }

    /// Copy of every slot, in index order
    pub fn snapshot(&self) -> [Slot; N] {
        *self.slots.lock()
    }

    /// Number of slots currently `Bound`
    pub fn bound_count(&self) -> usize {
        self.slots
            .lock()
            .iter()
            .filter(|slot| matches!(slot, Slot::Bound(_)))
            .count()
    }
}

impl<const N: usize> Default for HandlePool<N> {
    fn default() -> Self {
        Self::new()
    }
}
