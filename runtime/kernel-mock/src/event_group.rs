use kernel_api::{EventBits, EventGroupKernel, EventGroupRef, KernelObject, StaticBuffer, TickType};

use crate::{MockEventGroup, MockKernel, State};

fn create(state: &mut State) -> Option<EventGroupRef> {
    let addr = state.allocate()?;
    state
        .groups
        .insert(addr.get(), MockEventGroup { bits: 0, number: 0 });
    Some(EventGroupRef::from_addr(addr))
}

fn group(state: &mut State, group: EventGroupRef) -> Option<&mut MockEventGroup> {
    state.groups.get_mut(&group.addr().get())
}

impl EventGroupKernel for MockKernel {
    fn event_group_create(&self) -> Option<EventGroupRef> {
        self.with("event_group_create", create)
    }

    fn event_group_create_static(&self, _storage: StaticBuffer) -> Option<EventGroupRef> {
        self.with("event_group_create_static", create)
    }

    fn event_group_delete(&self, g: EventGroupRef) {
        self.with("event_group_delete", |s| {
            s.groups.remove(&g.addr().get());
        })
    }

    fn event_group_set_bits(&self, g: EventGroupRef, bits: EventBits) -> EventBits {
        self.with("event_group_set_bits", |s| {
            group(s, g).map_or(0, |g| {
                g.bits |= bits;
                g.bits
            })
        })
    }

    fn event_group_clear_bits(&self, g: EventGroupRef, bits: EventBits) -> EventBits {
        self.with("event_group_clear_bits", |s| {
            group(s, g).map_or(0, |g| {
                let before = g.bits;
                g.bits &= !bits;
                before
            })
        })
    }

    fn event_group_wait_bits(
        &self,
        g: EventGroupRef,
        bits: EventBits,
        clear_on_exit: bool,
        wait_for_all: bool,
        ticks: TickType,
    ) -> EventBits {
        self.with("event_group_wait_bits", |s| {
            s.ticks(ticks);
            group(s, g).map_or(0, |g| {
                let current = g.bits;
                let satisfied = if wait_for_all {
                    current & bits == bits
                } else {
                    current & bits != 0
                };
                if satisfied && clear_on_exit {
                    g.bits &= !bits;
                }
                current
            })
        })
    }

    fn event_group_sync(
        &self,
        g: EventGroupRef,
        set: EventBits,
        wait_for: EventBits,
        ticks: TickType,
    ) -> EventBits {
        self.with("event_group_sync", |s| {
            s.ticks(ticks);
            group(s, g).map_or(0, |g| {
                g.bits |= set;
                let current = g.bits;
                if current & wait_for == wait_for {
                    g.bits &= !wait_for;
                }
                current
            })
        })
    }

    fn event_group_bits_from_isr(&self, g: EventGroupRef) -> EventBits {
        self.with("event_group_bits_from_isr", |s| group(s, g).map_or(0, |g| g.bits))
    }

    fn event_group_set_bits_from_isr(
        &self,
        g: EventGroupRef,
        bits: EventBits,
        woken: &mut bool,
    ) -> bool {
        self.with("event_group_set_bits_from_isr", |s| {
            *woken = false;
            group(s, g).map_or(false, |g| {
                g.bits |= bits;
                true
            })
        })
    }

    fn event_group_clear_bits_from_isr(&self, g: EventGroupRef, bits: EventBits) -> bool {
        self.with("event_group_clear_bits_from_isr", |s| {
            group(s, g).map_or(false, |g| {
                g.bits &= !bits;
                true
            })
        })
    }

    fn event_group_number(&self, g: EventGroupRef) -> u32 {
        self.with("event_group_number", |s| group(s, g).map_or(0, |g| g.number))
    }

    fn set_event_group_number(&self, g: EventGroupRef, number: u32) {
        self.with("set_event_group_number", |s| {
            if let Some(g) = group(s, g) {
                g.number = number;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_any_and_all() {
        let kernel = MockKernel::new();
        let g = kernel.event_group_create().unwrap();

        assert_eq!(kernel.event_group_set_bits(g, 0b01), 0b01);
        assert_eq!(kernel.event_group_wait_bits(g, 0b11, false, true, 5), 0b01);
        assert_eq!(kernel.event_group_bits_from_isr(g), 0b01);

        assert_eq!(kernel.event_group_wait_bits(g, 0b11, true, false, 5), 0b01);
        assert_eq!(kernel.event_group_bits_from_isr(g), 0);
    }

    #[test]
    fn test_sync_clears_on_rendezvous() {
        let kernel = MockKernel::new();
        let g = kernel.event_group_create().unwrap();

        assert_eq!(kernel.event_group_sync(g, 0b01, 0b11, 0), 0b01);
        assert_eq!(kernel.event_group_sync(g, 0b10, 0b11, 0), 0b11);
        assert_eq!(kernel.event_group_bits_from_isr(g), 0);
    }

    #[test]
    fn test_clear_returns_previous() {
        let kernel = MockKernel::new();
        let g = kernel.event_group_create().unwrap();
        kernel.event_group_set_bits(g, 0b111);

        assert_eq!(kernel.event_group_clear_bits(g, 0b010), 0b111);
        assert_eq!(kernel.event_group_bits_from_isr(g), 0b101);
    }
}
