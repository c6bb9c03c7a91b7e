use kernel_api::{
    KernelObject, ObjectName, StaticBuffer, TaskRef, TickType, TimerCommand, TimerKernel,
    TimerParams, TimerRef,
};

use crate::{MockKernel, MockTimer, State};

fn create(state: &mut State, params: &TimerParams<'_>) -> Option<TimerRef> {
    if params.period == 0 {
        return None;
    }
    let addr = state.allocate()?;
    state.timers.insert(
        addr.get(),
        MockTimer {
            name: ObjectName::new(params.name),
            period: params.period,
            auto_reload: params.auto_reload,
            id: params.id,
            active: false,
            expiry: 0,
            callback: params.callback,
        },
    );
    Some(TimerRef::from_addr(addr))
}

fn command(state: &mut State, timer: TimerRef, command: TimerCommand) -> bool {
    if state.rejects_timer_commands() {
        return false;
    }
    let addr = timer.addr().get();
    let now = state.tick;
    let Some(t) = state.timers.get_mut(&addr) else {
        return false;
    };

    match command {
        TimerCommand::Start | TimerCommand::Reset => {
            t.active = true;
            t.expiry = now.wrapping_add(t.period);
        }
        TimerCommand::Stop => t.active = false,
        TimerCommand::ChangePeriod(period) => {
            if period == 0 {
                return false;
            }
            t.period = period;
            t.active = true;
            t.expiry = now.wrapping_add(period);
        }
        TimerCommand::Delete => {
            state.timers.remove(&addr);
        }
    }
    true
}

impl TimerKernel for MockKernel {
    fn timer_create(&self, params: &TimerParams<'_>) -> Option<TimerRef> {
        self.with("timer_create", |s| create(s, params))
    }

    fn timer_create_static(&self, params: &TimerParams<'_>, _storage: StaticBuffer)
        -> Option<TimerRef> {
        self.with("timer_create_static", |s| create(s, params))
    }

    fn timer_command(&self, timer: TimerRef, cmd: TimerCommand, ticks: TickType) -> bool {
        self.with("timer_command", |s| {
            s.ticks(ticks);
            command(s, timer, cmd)
        })
    }

    fn timer_command_from_isr(&self, timer: TimerRef, cmd: TimerCommand, woken: &mut bool)
        -> bool {
        self.with("timer_command_from_isr", |s| {
            *woken = false;
            command(s, timer, cmd)
        })
    }

    fn timer_id(&self, timer: TimerRef) -> usize {
        self.with("timer_id", |s| {
            s.timers.get(&timer.addr().get()).map_or(0, |t| t.id)
        })
    }

    fn set_timer_id(&self, timer: TimerRef, id: usize) {
        self.with("set_timer_id", |s| {
            if let Some(t) = s.timers.get_mut(&timer.addr().get()) {
                t.id = id;
            }
        })
    }

    fn timer_is_active(&self, timer: TimerRef) -> bool {
        self.with("timer_is_active", |s| {
            s.timers.get(&timer.addr().get()).map_or(false, |t| t.active)
        })
    }

    fn timer_period(&self, timer: TimerRef) -> TickType {
        self.with("timer_period", |s| {
            s.timers.get(&timer.addr().get()).map_or(0, |t| t.period)
        })
    }

    fn timer_expiry_time(&self, timer: TimerRef) -> TickType {
        self.with("timer_expiry_time", |s| {
            s.timers.get(&timer.addr().get()).map_or(0, |t| t.expiry)
        })
    }

    fn timer_name(&self, timer: TimerRef) -> ObjectName {
        self.with("timer_name", |s| {
            s.timers
                .get(&timer.addr().get())
                .map_or(ObjectName::new(""), |t| t.name)
        })
    }

    fn timer_auto_reload(&self, timer: TimerRef) -> bool {
        self.with("timer_auto_reload", |s| {
            s.timers.get(&timer.addr().get()).map_or(false, |t| t.auto_reload)
        })
    }

    fn set_timer_auto_reload(&self, timer: TimerRef, auto_reload: bool) {
        self.with("set_timer_auto_reload", |s| {
            if let Some(t) = s.timers.get_mut(&timer.addr().get()) {
                t.auto_reload = auto_reload;
            }
        })
    }

    fn timer_daemon_task(&self) -> Option<TaskRef> {
        self.with("timer_daemon_task", |s| s.daemon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expired(_: TimerRef) {}

    fn params() -> TimerParams<'static> {
        TimerParams {
            name: "blink",
            period: 100,
            auto_reload: true,
            id: 7,
            callback: expired,
        }
    }

    #[test]
    fn test_start_sets_expiry() {
        let kernel = MockKernel::new();
        let t = kernel.timer_create(&params()).unwrap();
        kernel.advance_ticks(10);

        assert!(!kernel.timer_is_active(t));
        assert!(kernel.timer_command(t, TimerCommand::Start, 0));
        assert!(kernel.timer_is_active(t));
        assert_eq!(kernel.timer_expiry_time(t), 110);
        assert_eq!(kernel.timer_id(t), 7);
        assert_eq!(kernel.timer_name(t), "blink");
    }

    #[test]
    fn test_rejected_commands() {
        let kernel = MockKernel::new();
        let t = kernel.timer_create(&params()).unwrap();
        kernel.set_reject_timer_commands(true);

        assert!(!kernel.timer_command(t, TimerCommand::Delete, 0));
        assert!(kernel.is_live(t.object_ref()));

        kernel.set_reject_timer_commands(false);
        assert!(kernel.timer_command(t, TimerCommand::Delete, 0));
        assert!(!kernel.is_live(t.object_ref()));
    }
}
