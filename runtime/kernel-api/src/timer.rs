//! Software timer primitives
//!
//! Timer state changes are posted to the timer service task as commands; a
//! successful `timer_command` only means the command was queued.

use crate::object::{TaskRef, TimerRef};
use crate::types::{ObjectName, StaticBuffer, TickType, TimerCommand, TimerParams};

pub trait TimerKernel {
    fn timer_create(&self, params: &TimerParams<'_>) -> Option<TimerRef>;

    fn timer_create_static(&self, params: &TimerParams<'_>, storage: StaticBuffer)
        -> Option<TimerRef>;

    fn timer_command(&self, timer: TimerRef, command: TimerCommand, ticks: TickType) -> bool;

    fn timer_command_from_isr(
        &self,
        timer: TimerRef,
        command: TimerCommand,
        woken: &mut bool,
    ) -> bool;

    fn timer_id(&self, timer: TimerRef) -> usize;

    fn set_timer_id(&self, timer: TimerRef, id: usize);

    fn timer_is_active(&self, timer: TimerRef) -> bool;

    fn timer_period(&self, timer: TimerRef) -> TickType;

    fn timer_expiry_time(&self, timer: TimerRef) -> TickType;

    fn timer_name(&self, timer: TimerRef) -> ObjectName;

    fn timer_auto_reload(&self, timer: TimerRef) -> bool;

    fn set_timer_auto_reload(&self, timer: TimerRef, auto_reload: bool);

    fn timer_daemon_task(&self) -> Option<TaskRef>;
}
