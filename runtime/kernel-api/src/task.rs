//! Task primitives
//!
//! Operations that accept `Option<TaskRef>` treat `None` as "the calling
//! task".

use crate::object::TaskRef;
use crate::types::{
    MemoryRegion, NotifyAction, ObjectName, RestrictedTaskParams, SchedulerState, StaticBuffer,
    TaskHook, TaskParams, TaskPriority, TaskState, TickType,
};

pub trait TaskKernel {
    // ========== Creation / Deletion ==========

    fn task_create(&self, params: &TaskParams<'_>) -> Option<TaskRef>;

    fn task_create_static(
        &self,
        params: &TaskParams<'_>,
        stack: StaticBuffer,
        tcb: StaticBuffer,
    ) -> Option<TaskRef>;

    fn task_create_restricted(&self, params: &RestrictedTaskParams<'_>) -> Option<TaskRef>;

    fn task_delete(&self, task: Option<TaskRef>);

    fn task_allocate_mpu_regions(&self, task: Option<TaskRef>, regions: &[MemoryRegion]);

    // ========== Scheduling ==========

    fn task_delay(&self, ticks: TickType);

    /// Returns false if the wake time was already in the past
    fn task_delay_until(&self, previous_wake: &mut TickType, increment: TickType) -> bool;

    fn task_abort_delay(&self, task: TaskRef) -> bool;

    fn task_priority_get(&self, task: Option<TaskRef>) -> u32;

    fn task_priority_get_from_isr(&self, task: Option<TaskRef>) -> u32;

    fn task_priority_set(&self, task: Option<TaskRef>, priority: TaskPriority);

    fn task_state(&self, task: TaskRef) -> TaskState;

    fn task_suspend(&self, task: Option<TaskRef>);

    fn task_resume(&self, task: TaskRef);

    /// Returns true if a context switch is required
    fn task_resume_from_isr(&self, task: TaskRef) -> bool;

    fn task_suspend_all(&self);

    /// Returns true if resuming caused a context switch
    fn task_resume_all(&self) -> bool;

    fn scheduler_state(&self) -> SchedulerState;

    // ========== Queries ==========

    fn current_task(&self) -> Option<TaskRef>;

    fn idle_task(&self) -> Option<TaskRef>;

    fn task_by_name(&self, name: &str) -> Option<TaskRef>;

    fn task_name(&self, task: Option<TaskRef>) -> Option<ObjectName>;

    fn tick_count(&self) -> TickType;

    fn tick_count_from_isr(&self) -> TickType;

    fn number_of_tasks(&self) -> u32;

    fn stack_high_water_mark(&self, task: Option<TaskRef>) -> u32;

    fn task_number(&self, task: Option<TaskRef>) -> u32;

    fn set_task_number(&self, task: Option<TaskRef>, number: u32);

    // ========== Notifications ==========

    fn task_notify(
        &self,
        task: TaskRef,
        index: usize,
        value: u32,
        action: NotifyAction,
        previous: Option<&mut u32>,
    ) -> bool;

    fn task_notify_from_isr(
        &self,
        task: TaskRef,
        index: usize,
        value: u32,
        action: NotifyAction,
        previous: Option<&mut u32>,
        woken: &mut bool,
    ) -> bool;

    fn task_notify_give_from_isr(&self, task: TaskRef, index: usize, woken: &mut bool);

    fn task_notify_wait(
        &self,
        index: usize,
        clear_on_entry: u32,
        clear_on_exit: u32,
        value: Option<&mut u32>,
        ticks: TickType,
    ) -> bool;

    fn task_notify_take(&self, index: usize, clear_on_exit: bool, ticks: TickType) -> u32;

    fn task_notify_state_clear(&self, task: Option<TaskRef>, index: usize) -> bool;

    /// Returns the value before clearing
    fn task_notify_value_clear(&self, task: Option<TaskRef>, index: usize, bits: u32) -> u32;

    // ========== Per-task Storage ==========

    fn set_thread_local(&self, task: Option<TaskRef>, index: usize, value: usize);

    fn thread_local(&self, task: Option<TaskRef>, index: usize) -> usize;

    fn set_application_tag(&self, task: Option<TaskRef>, hook: Option<TaskHook>);

    fn application_tag(&self, task: Option<TaskRef>) -> Option<TaskHook>;

    fn application_tag_from_isr(&self, task: Option<TaskRef>) -> Option<TaskHook>;

    /// Invoke the task's hook with `parameter`, 0 if no hook is set
    fn call_application_hook(&self, task: Option<TaskRef>, parameter: usize) -> usize;
}
