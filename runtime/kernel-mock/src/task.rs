use kernel_api::{
    KernelObject, MemoryRegion, NotifyAction, ObjectName, RestrictedTaskParams, SchedulerState,
    StaticBuffer, TaskHook, TaskKernel, TaskParams, TaskPriority, TaskRef, TaskState, TickType,
    NUM_THREAD_LOCAL_STORAGE_POINTERS, TASK_NOTIFICATION_ARRAY_ENTRIES,
};

use crate::{MockKernel, MockTask, State};

fn create(state: &mut State, params: &TaskParams<'_>) -> Option<TaskRef> {
    if params.stack_depth == 0 {
        return None;
    }
    let addr = state.allocate()?;
    state.tasks.insert(
        addr.get(),
        MockTask::new(params.name, params.priority, params.stack_depth),
    );
    Some(TaskRef::from_addr(addr))
}

fn apply_notify(task: &mut MockTask, index: usize, value: u32, action: NotifyAction) -> bool {
    let was_pending = task.notify_pending[index];
    let slot = &mut task.notify_value[index];
    match action {
        NotifyAction::NoAction => {}
        NotifyAction::SetBits => *slot |= value,
        NotifyAction::Increment => *slot = slot.wrapping_add(1),
        NotifyAction::SetValueWithOverwrite => *slot = value,
        NotifyAction::SetValueWithoutOverwrite => {
            if was_pending {
                return false;
            }
            *slot = value;
        }
    }
    task.notify_pending[index] = true;
    true
}

impl TaskKernel for MockKernel {
    fn task_create(&self, params: &TaskParams<'_>) -> Option<TaskRef> {
        self.with("task_create", |s| create(s, params))
    }

    fn task_create_static(
        &self,
        params: &TaskParams<'_>,
        _stack: StaticBuffer,
        _tcb: StaticBuffer,
    ) -> Option<TaskRef> {
        self.with("task_create_static", |s| create(s, params))
    }

    fn task_create_restricted(&self, params: &RestrictedTaskParams<'_>) -> Option<TaskRef> {
        self.with("task_create_restricted", |s| {
            let task = create(s, &params.task)?;
            if let Some(t) = s.task_mut(Some(task)) {
                t.regions = params.regions.to_vec();
            }
            Some(task)
        })
    }

    fn task_delete(&self, task: Option<TaskRef>) {
        self.with("task_delete", |s| {
            if let Some(addr) = s.task_or_current(task) {
                s.tasks.remove(&addr);
                if s.current.map(|c| c.addr().get()) == Some(addr) {
                    s.current = None;
                }
            }
        })
    }

    fn task_allocate_mpu_regions(&self, task: Option<TaskRef>, regions: &[MemoryRegion]) {
        self.with("task_allocate_mpu_regions", |s| {
            if let Some(t) = s.task_mut(task) {
                t.regions = regions.to_vec();
            }
        })
    }

    fn task_delay(&self, ticks: TickType) {
        self.with("task_delay", |s| {
            s.ticks(ticks);
            s.tick = s.tick.wrapping_add(ticks);
        })
    }

    fn task_delay_until(&self, previous_wake: &mut TickType, increment: TickType) -> bool {
        self.with("task_delay_until", |s| {
            s.ticks(increment);
            let wake = previous_wake.wrapping_add(increment);
            *previous_wake = wake;
            if wake <= s.tick {
                return false;
            }
            s.tick = wake;
            true
        })
    }

    fn task_abort_delay(&self, task: TaskRef) -> bool {
        self.with("task_abort_delay", |s| match s.task_mut(Some(task)) {
            Some(t) if t.state == TaskState::Blocked => {
                t.state = TaskState::Ready;
                true
            }
            _ => false,
        })
    }

    fn task_priority_get(&self, task: Option<TaskRef>) -> u32 {
        self.with("task_priority_get", |s| s.task(task).map_or(0, |t| t.priority))
    }

    fn task_priority_get_from_isr(&self, task: Option<TaskRef>) -> u32 {
        self.with("task_priority_get_from_isr", |s| {
            s.task(task).map_or(0, |t| t.priority)
        })
    }

    fn task_priority_set(&self, task: Option<TaskRef>, priority: TaskPriority) {
        self.with("task_priority_set", |s| {
            if let Some(t) = s.task_mut(task) {
                t.priority = priority.value();
            }
        })
    }

    fn task_state(&self, task: TaskRef) -> TaskState {
        self.with("task_state", |s| {
            if s.current == Some(task) {
                return TaskState::Running;
            }
            s.task(Some(task)).map_or(TaskState::Deleted, |t| t.state)
        })
    }

    fn task_suspend(&self, task: Option<TaskRef>) {
        self.with("task_suspend", |s| {
            if let Some(t) = s.task_mut(task) {
                t.state = TaskState::Suspended;
            }
        })
    }

    fn task_resume(&self, task: TaskRef) {
        self.with("task_resume", |s| {
            if let Some(t) = s.task_mut(Some(task)) {
                if t.state == TaskState::Suspended {
                    t.state = TaskState::Ready;
                }
            }
        })
    }

    fn task_resume_from_isr(&self, task: TaskRef) -> bool {
        self.with("task_resume_from_isr", |s| {
            if let Some(t) = s.task_mut(Some(task)) {
                if t.state == TaskState::Suspended {
                    t.state = TaskState::Ready;
                }
            }
            false
        })
    }

    fn task_suspend_all(&self) {
        self.with("task_suspend_all", |s| s.scheduler = SchedulerState::Suspended)
    }

    fn task_resume_all(&self) -> bool {
        self.with("task_resume_all", |s| {
            s.scheduler = SchedulerState::Running;
            false
        })
    }

    fn scheduler_state(&self) -> SchedulerState {
        self.with("scheduler_state", |s| s.scheduler)
    }

    fn current_task(&self) -> Option<TaskRef> {
        self.with("current_task", |s| s.current)
    }

    fn idle_task(&self) -> Option<TaskRef> {
        self.with("idle_task", |s| s.idle)
    }

    fn task_by_name(&self, name: &str) -> Option<TaskRef> {
        self.with("task_by_name", |s| {
            let wanted = ObjectName::new(name);
            s.tasks
                .iter()
                .find(|(_, t)| t.name == wanted)
                .and_then(|(addr, _)| core::num::NonZeroUsize::new(*addr))
                .map(TaskRef::from_addr)
        })
    }

    fn task_name(&self, task: Option<TaskRef>) -> Option<ObjectName> {
        self.with("task_name", |s| s.task(task).map(|t| t.name))
    }

    fn tick_count(&self) -> TickType {
        self.with("tick_count", |s| s.tick)
    }

    fn tick_count_from_isr(&self) -> TickType {
        self.with("tick_count_from_isr", |s| s.tick)
    }

    fn number_of_tasks(&self) -> u32 {
        self.with("number_of_tasks", |s| s.tasks.len() as u32)
    }

    fn stack_high_water_mark(&self, task: Option<TaskRef>) -> u32 {
        self.with("stack_high_water_mark", |s| {
            s.task(task).map_or(0, |t| t.stack_depth)
        })
    }

    fn task_number(&self, task: Option<TaskRef>) -> u32 {
        self.with("task_number", |s| s.task(task).map_or(0, |t| t.number))
    }

    fn set_task_number(&self, task: Option<TaskRef>, number: u32) {
        self.with("set_task_number", |s| {
            if let Some(t) = s.task_mut(task) {
                t.number = number;
            }
        })
    }

    fn task_notify(
        &self,
        task: TaskRef,
        index: usize,
        value: u32,
        action: NotifyAction,
        previous: Option<&mut u32>,
    ) -> bool {
        self.with("task_notify", |s| {
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return false;
            }
            let Some(t) = s.task_mut(Some(task)) else {
                return false;
            };
            if let Some(previous) = previous {
                *previous = t.notify_value[index];
            }
            apply_notify(t, index, value, action)
        })
    }

    fn task_notify_from_isr(
        &self,
        task: TaskRef,
        index: usize,
        value: u32,
        action: NotifyAction,
        previous: Option<&mut u32>,
        woken: &mut bool,
    ) -> bool {
        self.with("task_notify_from_isr", |s| {
            *woken = false;
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return false;
            }
            let Some(t) = s.task_mut(Some(task)) else {
                return false;
            };
            if let Some(previous) = previous {
                *previous = t.notify_value[index];
            }
            apply_notify(t, index, value, action)
        })
    }

    fn task_notify_give_from_isr(&self, task: TaskRef, index: usize, woken: &mut bool) {
        self.with("task_notify_give_from_isr", |s| {
            *woken = false;
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return;
            }
            if let Some(t) = s.task_mut(Some(task)) {
                apply_notify(t, index, 0, NotifyAction::Increment);
            }
        })
    }

    fn task_notify_wait(
        &self,
        index: usize,
        clear_on_entry: u32,
        clear_on_exit: u32,
        value: Option<&mut u32>,
        ticks: TickType,
    ) -> bool {
        self.with("task_notify_wait", |s| {
            s.ticks(ticks);
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return false;
            }
            let Some(t) = s.task_mut(None) else {
                return false;
            };
            if !t.notify_pending[index] {
                t.notify_value[index] &= !clear_on_entry;
            }
            if let Some(value) = value {
                *value = t.notify_value[index];
            }
            if !t.notify_pending[index] {
                return false;
            }
            t.notify_value[index] &= !clear_on_exit;
            t.notify_pending[index] = false;
            true
        })
    }

    fn task_notify_take(&self, index: usize, clear_on_exit: bool, ticks: TickType) -> u32 {
        self.with("task_notify_take", |s| {
            s.ticks(ticks);
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return 0;
            }
            let Some(t) = s.task_mut(None) else {
                return 0;
            };
            let value = t.notify_value[index];
            if value != 0 {
                t.notify_value[index] = if clear_on_exit { 0 } else { value - 1 };
            }
            t.notify_pending[index] = false;
            value
        })
    }

    fn task_notify_state_clear(&self, task: Option<TaskRef>, index: usize) -> bool {
        self.with("task_notify_state_clear", |s| {
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return false;
            }
            s.task_mut(task).map_or(false, |t| {
                core::mem::replace(&mut t.notify_pending[index], false)
            })
        })
    }

    fn task_notify_value_clear(&self, task: Option<TaskRef>, index: usize, bits: u32) -> u32 {
        self.with("task_notify_value_clear", |s| {
            if index >= TASK_NOTIFICATION_ARRAY_ENTRIES {
                return 0;
            }
            s.task_mut(task).map_or(0, |t| {
                let before = t.notify_value[index];
                t.notify_value[index] &= !bits;
                before
            })
        })
    }

    fn set_thread_local(&self, task: Option<TaskRef>, index: usize, value: usize) {
        self.with("set_thread_local", |s| {
            if index >= NUM_THREAD_LOCAL_STORAGE_POINTERS {
                return;
            }
            if let Some(t) = s.task_mut(task) {
                t.thread_local[index] = value;
            }
        })
    }

    fn thread_local(&self, task: Option<TaskRef>, index: usize) -> usize {
        self.with("thread_local", |s| {
            if index >= NUM_THREAD_LOCAL_STORAGE_POINTERS {
                return 0;
            }
            s.task(task).map_or(0, |t| t.thread_local[index])
        })
    }

    fn set_application_tag(&self, task: Option<TaskRef>, hook: Option<TaskHook>) {
        self.with("set_application_tag", |s| {
            if let Some(t) = s.task_mut(task) {
                t.tag = hook;
            }
        })
    }

    fn application_tag(&self, task: Option<TaskRef>) -> Option<TaskHook> {
        self.with("application_tag", |s| s.task(task).and_then(|t| t.tag))
    }

    fn application_tag_from_isr(&self, task: Option<TaskRef>) -> Option<TaskHook> {
        self.with("application_tag_from_isr", |s| s.task(task).and_then(|t| t.tag))
    }

    fn call_application_hook(&self, task: Option<TaskRef>, parameter: usize) -> usize {
        // Hook runs outside the state lock
        let hook = self.with("call_application_hook", |s| s.task(task).and_then(|t| t.tag));
        hook.map_or(0, |hook| hook(parameter))
    }
}
