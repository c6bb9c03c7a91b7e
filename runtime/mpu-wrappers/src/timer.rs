//! Software timer adapters
//!
//! Timer deletion is a command posted to the timer service task and can be
//! refused when the command queue is full. The handle is retired only once
//! the kernel accepts the command, so a refused delete leaves it usable.

use kernel_api::{ObjectName, TickType, TimerCommand, TimerKernel, TimerParams};
#[cfg(feature = "static-allocation")]
use kernel_api::StaticBuffer;
use mpu_port::Port;

use crate::handle::{TaskHandle, TimerHandle};
use crate::table::HandleTable;
use crate::wrappers::MpuWrappers;

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: TimerKernel + ?Sized,
    T: HandleTable,
{
    // ========== Creation / Deletion ==========

    #[cfg(feature = "dynamic-allocation")]
    pub fn timer_create(&self, params: &TimerParams<'_>) -> Option<TimerHandle> {
        self.create(|kernel| kernel.timer_create(params))
    }

    #[cfg(feature = "static-allocation")]
    pub fn timer_create_static(
        &self,
        params: &TimerParams<'_>,
        storage: StaticBuffer,
    ) -> Option<TimerHandle> {
        self.create(|kernel| kernel.timer_create_static(params, storage))
    }

    /// Post a delete command; true if the timer service accepted it
    pub fn timer_delete(&self, handle: TimerHandle, ticks: TickType) -> bool {
        self.delete_if(handle, |kernel, timer| {
            kernel.timer_command(timer, TimerCommand::Delete, ticks)
        })
    }

    // ========== Commands ==========

    /// Post `command` to the timer service task
    ///
    /// [`TimerCommand::Delete`] behaves exactly like [`Self::timer_delete`].
    pub fn timer_command(&self, handle: TimerHandle, command: TimerCommand, ticks: TickType) -> bool {
        if command == TimerCommand::Delete {
            return self.timer_delete(handle, ticks);
        }
        self.operate(handle, |kernel, timer| kernel.timer_command(timer, command, ticks))
    }

    /// ISR variant of [`Self::timer_command`]
    ///
    /// Deletion is not available from an interrupt: a delete command is
    /// refused without being posted.
    pub fn timer_command_from_isr(
        &self,
        handle: TimerHandle,
        command: TimerCommand,
        woken: &mut bool,
    ) -> bool {
        if command == TimerCommand::Delete {
            log::debug!("timer delete refused from interrupt context");
            return false;
        }
        self.operate_from_isr(handle, |kernel, timer| {
            kernel.timer_command_from_isr(timer, command, woken)
        })
    }

    pub fn timer_start(&self, handle: TimerHandle, ticks: TickType) -> bool {
        self.timer_command(handle, TimerCommand::Start, ticks)
    }

    pub fn timer_stop(&self, handle: TimerHandle, ticks: TickType) -> bool {
        self.timer_command(handle, TimerCommand::Stop, ticks)
    }

    pub fn timer_reset(&self, handle: TimerHandle, ticks: TickType) -> bool {
        self.timer_command(handle, TimerCommand::Reset, ticks)
    }

    pub fn timer_change_period(&self, handle: TimerHandle, period: TickType, ticks: TickType) -> bool {
        self.timer_command(handle, TimerCommand::ChangePeriod(period), ticks)
    }

    // ========== Queries ==========

    pub fn timer_id(&self, handle: TimerHandle) -> usize {
        self.operate(handle, |kernel, timer| kernel.timer_id(timer))
    }

    pub fn set_timer_id(&self, handle: TimerHandle, id: usize) {
        self.operate(handle, |kernel, timer| kernel.set_timer_id(timer, id))
    }

    pub fn timer_is_active(&self, handle: TimerHandle) -> bool {
        self.operate(handle, |kernel, timer| kernel.timer_is_active(timer))
    }

    pub fn timer_period(&self, handle: TimerHandle) -> TickType {
        self.operate(handle, |kernel, timer| kernel.timer_period(timer))
    }

    pub fn timer_expiry_time(&self, handle: TimerHandle) -> TickType {
        self.operate(handle, |kernel, timer| kernel.timer_expiry_time(timer))
    }

    /// `None` for an invalid handle
    pub fn timer_name(&self, handle: TimerHandle) -> Option<ObjectName> {
        self.operate(handle, |kernel, timer| Some(kernel.timer_name(timer)))
    }

    pub fn timer_auto_reload(&self, handle: TimerHandle) -> bool {
        self.operate(handle, |kernel, timer| kernel.timer_auto_reload(timer))
    }

    pub fn set_timer_auto_reload(&self, handle: TimerHandle, auto_reload: bool) {
        self.operate(handle, |kernel, timer| kernel.set_timer_auto_reload(timer, auto_reload))
    }

    /// Handle of the timer service task, if it has one
    pub fn timer_daemon_task_handle(&self) -> Option<TaskHandle> {
        self.forward(|kernel| self.encode(kernel.timer_daemon_task()))
    }
}
