//! Task adapters
//!
//! The null task handle is forwarded as "the calling task" wherever the
//! kernel accepts one. Task creation strips [`TaskPriority::PRIVILEGED`]
//! when the creator is unprivileged, so an application task can never
//! create a privileged one.

use kernel_api::{
    KernelObject, MemoryRegion, ObjectName, RestrictedTaskParams, SchedulerState, TaskKernel,
    TaskParams, TaskPriority, TaskRef, TaskState, TickType,
};
#[cfg(feature = "task-notifications")]
use kernel_api::NotifyAction;
#[cfg(feature = "static-allocation")]
use kernel_api::StaticBuffer;
#[cfg(feature = "application-task-tag")]
use kernel_api::TaskHook;
use mpu_port::{Port, PrivilegePort};

use crate::handle::TaskHandle;
use crate::table::HandleTable;
use crate::wrappers::MpuWrappers;

impl<'a, P, K, T> MpuWrappers<'a, P, K, T>
where
    P: Port + ?Sized,
    K: TaskKernel + ?Sized,
    T: HandleTable,
{
    /// Priority actually requested from the kernel
    fn creation_priority(&self, priority: TaskPriority) -> TaskPriority {
        if self.port().is_privileged() {
            priority
        } else {
            if priority.is_privileged() {
                log::debug!("unprivileged creator, dropping privileged task bit");
            }
            priority - TaskPriority::PRIVILEGED
        }
    }

    fn creation_params<'p>(&self, params: &TaskParams<'p>) -> TaskParams<'p> {
        TaskParams {
            priority: self.creation_priority(params.priority),
            ..*params
        }
    }

    // ========== Creation / Deletion ==========

    #[cfg(feature = "dynamic-allocation")]
    pub fn task_create(&self, params: &TaskParams<'_>) -> Option<TaskHandle> {
        let params = self.creation_params(params);
        self.create(|kernel| kernel.task_create(&params))
    }

    #[cfg(feature = "static-allocation")]
    pub fn task_create_static(
        &self,
        params: &TaskParams<'_>,
        stack: StaticBuffer,
        tcb: StaticBuffer,
    ) -> Option<TaskHandle> {
        let params = self.creation_params(params);
        self.create(|kernel| kernel.task_create_static(&params, stack, tcb))
    }

    pub fn task_create_restricted(&self, params: &RestrictedTaskParams<'_>) -> Option<TaskHandle> {
        let params = RestrictedTaskParams {
            task: self.creation_params(&params.task),
            ..*params
        };
        self.create(|kernel| kernel.task_create_restricted(&params))
    }

    /// Delete a task; the null handle deletes the calling task
    ///
    /// The handle is retired before the kernel is asked: a task deleting
    /// itself does not return from the kernel call.
    pub fn task_delete(&self, handle: TaskHandle) {
        if !handle.is_null() {
            self.gate().run(|| {
                let Ok(task) = self.resolve(handle) else {
                    return;
                };
                self.table().retire(handle.raw(), self.port());
                self.kernel().task_delete(Some(task));
            });
            return;
        }

        self.forward(|kernel| {
            // The caller may hold a handle to itself
            let own = kernel
                .current_task()
                .and_then(|task| self.table().handle_of(task.object_ref()));
            if let Some(raw) = own {
                self.table().retire(raw, self.port());
            }
            kernel.task_delete(None);
        })
    }

    pub fn task_allocate_mpu_regions(&self, handle: TaskHandle, regions: &[MemoryRegion]) {
        self.operate_task(handle, |kernel, task| {
            kernel.task_allocate_mpu_regions(task, regions)
        })
    }

    /// Bind a task the kernel created on its own (idle, timer service) so
    /// handle-returning queries can report it
    ///
    /// Returns the existing handle if `task` is already bound, `None` if
    /// the table is full.
    pub fn adopt_task(&self, task: TaskRef) -> Option<TaskHandle> {
        self.gate().run(|| {
            let object = task.object_ref();
            if let Some(raw) = self.table().handle_of(object) {
                return Some(TaskHandle::from_raw(raw));
            }
            let reservation = self.table().reserve(self.port())?;
            // Another task may have bound it while the scheduler resumed
            let raw = self.table().commit_or_existing(reservation, object, self.port());
            Some(TaskHandle::from_raw(raw))
        })
    }

    // ========== Scheduling ==========

    pub fn task_delay(&self, ticks: TickType) {
        self.forward(|kernel| kernel.task_delay(ticks))
    }

    pub fn task_delay_until(&self, previous_wake: &mut TickType, increment: TickType) -> bool {
        self.forward(|kernel| kernel.task_delay_until(previous_wake, increment))
    }

    pub fn task_abort_delay(&self, handle: TaskHandle) -> bool {
        self.operate(handle, |kernel, task| kernel.task_abort_delay(task))
    }

    pub fn task_priority_get(&self, handle: TaskHandle) -> u32 {
        self.operate_task(handle, |kernel, task| kernel.task_priority_get(task))
    }

    pub fn task_priority_get_from_isr(&self, handle: TaskHandle) -> u32 {
        self.operate_task_from_isr(handle, |kernel, task| {
            kernel.task_priority_get_from_isr(task)
        })
    }

    pub fn task_priority_set(&self, handle: TaskHandle, priority: TaskPriority) {
        self.operate_task(handle, |kernel, task| kernel.task_priority_set(task, priority))
    }

    pub fn task_state(&self, handle: TaskHandle) -> TaskState {
        self.operate(handle, |kernel, task| kernel.task_state(task))
    }

    pub fn task_suspend(&self, handle: TaskHandle) {
        self.operate_task(handle, |kernel, task| kernel.task_suspend(task))
    }

    pub fn task_resume(&self, handle: TaskHandle) {
        self.operate(handle, |kernel, task| kernel.task_resume(task))
    }

    pub fn task_resume_from_isr(&self, handle: TaskHandle) -> bool {
        self.operate_from_isr(handle, |kernel, task| kernel.task_resume_from_isr(task))
    }

    pub fn task_suspend_all(&self) {
        self.forward(|kernel| kernel.task_suspend_all())
    }

    pub fn task_resume_all(&self) -> bool {
        self.forward(|kernel| kernel.task_resume_all())
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.forward(|kernel| kernel.scheduler_state())
    }

    // ========== Queries ==========

    pub fn current_task_handle(&self) -> Option<TaskHandle> {
        self.forward(|kernel| self.encode(kernel.current_task()))
    }

    /// Handle of the idle task, `None` unless it was adopted
    pub fn idle_task_handle(&self) -> Option<TaskHandle> {
        self.forward(|kernel| self.encode(kernel.idle_task()))
    }

    pub fn task_handle_by_name(&self, name: &str) -> Option<TaskHandle> {
        self.forward(|kernel| self.encode(kernel.task_by_name(name)))
    }

    pub fn task_name(&self, handle: TaskHandle) -> Option<ObjectName> {
        self.operate_task(handle, |kernel, task| kernel.task_name(task))
    }

    pub fn tick_count(&self) -> TickType {
        self.forward(|kernel| kernel.tick_count())
    }

    pub fn tick_count_from_isr(&self) -> TickType {
        self.kernel().tick_count_from_isr()
    }

    pub fn number_of_tasks(&self) -> u32 {
        self.forward(|kernel| kernel.number_of_tasks())
    }

    pub fn stack_high_water_mark(&self, handle: TaskHandle) -> u32 {
        self.operate_task(handle, |kernel, task| kernel.stack_high_water_mark(task))
    }

    #[cfg(feature = "trace-facility")]
    pub fn task_number(&self, handle: TaskHandle) -> u32 {
        self.operate_task(handle, |kernel, task| kernel.task_number(task))
    }

    #[cfg(feature = "trace-facility")]
    pub fn set_task_number(&self, handle: TaskHandle, number: u32) {
        self.operate_task(handle, |kernel, task| kernel.set_task_number(task, number))
    }

    // ========== Notifications ==========

    #[cfg(feature = "task-notifications")]
    pub fn task_notify(
        &self,
        handle: TaskHandle,
        index: usize,
        value: u32,
        action: NotifyAction,
        previous: Option<&mut u32>,
    ) -> bool {
        self.operate(handle, |kernel, task| {
            kernel.task_notify(task, index, value, action, previous)
        })
    }

    #[cfg(feature = "task-notifications")]
    pub fn task_notify_from_isr(
        &self,
        handle: TaskHandle,
        index: usize,
        value: u32,
        action: NotifyAction,
        previous: Option<&mut u32>,
        woken: &mut bool,
    ) -> bool {
        self.operate_from_isr(handle, |kernel, task| {
            kernel.task_notify_from_isr(task, index, value, action, previous, woken)
        })
    }

    #[cfg(feature = "task-notifications")]
    pub fn task_notify_give_from_isr(&self, handle: TaskHandle, index: usize, woken: &mut bool) {
        self.operate_from_isr(handle, |kernel, task| {
            kernel.task_notify_give_from_isr(task, index, woken)
        })
    }

    #[cfg(feature = "task-notifications")]
    pub fn task_notify_wait(
        &self,
        index: usize,
        clear_on_entry: u32,
        clear_on_exit: u32,
        value: Option<&mut u32>,
        ticks: TickType,
    ) -> bool {
        self.forward(|kernel| {
            kernel.task_notify_wait(index, clear_on_entry, clear_on_exit, value, ticks)
        })
    }

    #[cfg(feature = "task-notifications")]
    pub fn task_notify_take(&self, index: usize, clear_on_exit: bool, ticks: TickType) -> u32 {
        self.forward(|kernel| kernel.task_notify_take(index, clear_on_exit, ticks))
    }

    #[cfg(feature = "task-notifications")]
    pub fn task_notify_state_clear(&self, handle: TaskHandle, index: usize) -> bool {
        self.operate_task(handle, |kernel, task| kernel.task_notify_state_clear(task, index))
    }

    #[cfg(feature = "task-notifications")]
    pub fn task_notify_value_clear(&self, handle: TaskHandle, index: usize, bits: u32) -> u32 {
        self.operate_task(handle, |kernel, task| {
            kernel.task_notify_value_clear(task, index, bits)
        })
    }

    // ========== Per-task Storage ==========

    #[cfg(feature = "thread-local-storage")]
    pub fn set_thread_local(&self, handle: TaskHandle, index: usize, value: usize) {
        self.operate_task(handle, |kernel, task| kernel.set_thread_local(task, index, value))
    }

    #[cfg(feature = "thread-local-storage")]
    pub fn thread_local(&self, handle: TaskHandle, index: usize) -> usize {
        self.operate_task(handle, |kernel, task| kernel.thread_local(task, index))
    }

    #[cfg(feature = "application-task-tag")]
    pub fn set_application_tag(&self, handle: TaskHandle, hook: Option<TaskHook>) {
        self.operate_task(handle, |kernel, task| kernel.set_application_tag(task, hook))
    }

    #[cfg(feature = "application-task-tag")]
    pub fn application_tag(&self, handle: TaskHandle) -> Option<TaskHook> {
        self.operate_task(handle, |kernel, task| kernel.application_tag(task))
    }

    #[cfg(feature = "application-task-tag")]
    pub fn application_tag_from_isr(&self, handle: TaskHandle) -> Option<TaskHook> {
        self.operate_task_from_isr(handle, |kernel, task| kernel.application_tag_from_isr(task))
    }

    #[cfg(feature = "application-task-tag")]
    pub fn call_application_hook(&self, handle: TaskHandle, parameter: usize) -> usize {
        self.operate_task(handle, |kernel, task| {
            kernel.call_application_hook(task, parameter)
        })
    }
}
