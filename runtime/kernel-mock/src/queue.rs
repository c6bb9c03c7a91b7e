use std::collections::VecDeque;

use kernel_api::{
    KernelObject, ObjectName, QueueKernel, QueuePosition, QueueRef, QueueSetKernel,
    QueueSetMemberRef, QueueSetRef, QueueType, StaticBuffer, TaskRef, TickType,
};

use crate::{MockKernel, MockQueue, MockQueueSet, State};

fn create(
    state: &mut State,
    length: u32,
    item_size: u32,
    queue_type: QueueType,
    initial: u32,
) -> Option<QueueRef> {
    if length == 0 || initial > length {
        return None;
    }
    let addr = state.allocate()?;
    let items = (0..initial).map(|_| Vec::new()).collect();
    state.queues.insert(
        addr.get(),
        MockQueue {
            queue_type,
            length,
            item_size,
            items,
            holder: None,
            recursion: 0,
            name: None,
            set: None,
        },
    );
    Some(QueueRef::from_addr(addr))
}

fn create_mutex(state: &mut State, mutex_type: QueueType) -> Option<QueueRef> {
    match mutex_type {
        QueueType::Mutex | QueueType::RecursiveMutex => create(state, 1, 0, mutex_type, 1),
        _ => None,
    }
}

fn send(state: &mut State, queue: QueueRef, item: &[u8], position: QueuePosition) -> bool {
    let Some(q) = state.queue_mut(queue) else {
        return false;
    };

    let full = q.items.len() as u32 >= q.length;
    if full && !(position == QueuePosition::Overwrite && q.length == 1) {
        return false;
    }

    let len = (q.item_size as usize).min(item.len());
    let mut stored = item[..len].to_vec();
    stored.resize(q.item_size as usize, 0);

    match position {
        QueuePosition::Back => q.items.push_back(stored),
        QueuePosition::Front => q.items.push_front(stored),
        QueuePosition::Overwrite => {
            q.items.clear();
            q.items.push_back(stored);
        }
    }

    if matches!(q.queue_type, QueueType::Mutex | QueueType::RecursiveMutex) {
        q.holder = None;
    }

    let set = q.set;
    if let Some(set) = set.and_then(|addr| state.sets.get_mut(&addr)) {
        set.ready.push_back(queue.addr().get());
    }
    true
}

fn take(state: &mut State, queue: QueueRef, buffer: &mut [u8], remove: bool) -> bool {
    let current = state.current;
    let Some(q) = state.queue_mut(queue) else {
        return false;
    };

    let item = if remove {
        q.items.pop_front()
    } else {
        q.items.front().cloned()
    };
    let Some(item) = item else {
        return false;
    };

    let len = item.len().min(buffer.len());
    buffer[..len].copy_from_slice(&item[..len]);

    if remove && matches!(q.queue_type, QueueType::Mutex | QueueType::RecursiveMutex) {
        q.holder = current;
    }
    true
}

fn holder(state: &State, queue: QueueRef) -> Option<TaskRef> {
    state
        .queue(queue)
        .filter(|q| matches!(q.queue_type, QueueType::Mutex | QueueType::RecursiveMutex))
        .and_then(|q| q.holder)
}

impl QueueKernel for MockKernel {
    fn queue_create(&self, length: u32, item_size: u32, queue_type: QueueType)
        -> Option<QueueRef> {
        self.with("queue_create", |s| create(s, length, item_size, queue_type, 0))
    }

    fn queue_create_static(
        &self,
        length: u32,
        item_size: u32,
        _storage: StaticBuffer,
        queue_type: QueueType,
    ) -> Option<QueueRef> {
        self.with("queue_create_static", |s| {
            create(s, length, item_size, queue_type, 0)
        })
    }

    fn mutex_create(&self, mutex_type: QueueType) -> Option<QueueRef> {
        self.with("mutex_create", |s| create_mutex(s, mutex_type))
    }

    fn mutex_create_static(&self, mutex_type: QueueType, _storage: StaticBuffer)
        -> Option<QueueRef> {
        self.with("mutex_create_static", |s| create_mutex(s, mutex_type))
    }

    fn counting_semaphore_create(&self, max_count: u32, initial_count: u32) -> Option<QueueRef> {
        self.with("counting_semaphore_create", |s| {
            create(s, max_count, 0, QueueType::CountingSemaphore, initial_count)
        })
    }

    fn counting_semaphore_create_static(
        &self,
        max_count: u32,
        initial_count: u32,
        _storage: StaticBuffer,
    ) -> Option<QueueRef> {
        self.with("counting_semaphore_create_static", |s| {
            create(s, max_count, 0, QueueType::CountingSemaphore, initial_count)
        })
    }

    fn queue_delete(&self, queue: QueueRef) {
        self.with("queue_delete", |s| {
            let addr = queue.addr().get();
            if let Some(q) = s.queues.remove(&addr) {
                if let Some(set) = q.set.and_then(|set| s.sets.get_mut(&set)) {
                    set.members.retain(|m| *m != addr);
                    set.ready.retain(|m| *m != addr);
                }
            }
        })
    }

    fn queue_reset(&self, queue: QueueRef) -> bool {
        self.with("queue_reset", |s| {
            s.queue_mut(queue).map_or(false, |q| {
                q.items.clear();
                true
            })
        })
    }

    fn queue_send(
        &self,
        queue: QueueRef,
        item: &[u8],
        ticks: TickType,
        position: QueuePosition,
    ) -> bool {
        self.with("queue_send", |s| {
            s.ticks(ticks);
            send(s, queue, item, position)
        })
    }

    fn queue_send_from_isr(
        &self,
        queue: QueueRef,
        item: &[u8],
        position: QueuePosition,
        woken: &mut bool,
    ) -> bool {
        self.with("queue_send_from_isr", |s| {
            *woken = false;
            send(s, queue, item, position)
        })
    }

    fn queue_receive(&self, queue: QueueRef, buffer: &mut [u8], ticks: TickType) -> bool {
        self.with("queue_receive", |s| {
            s.ticks(ticks);
            take(s, queue, buffer, true)
        })
    }

    fn queue_receive_from_isr(&self, queue: QueueRef, buffer: &mut [u8], woken: &mut bool)
        -> bool {
        self.with("queue_receive_from_isr", |s| {
            *woken = false;
            take(s, queue, buffer, true)
        })
    }

    fn queue_peek(&self, queue: QueueRef, buffer: &mut [u8], ticks: TickType) -> bool {
        self.with("queue_peek", |s| {
            s.ticks(ticks);
            take(s, queue, buffer, false)
        })
    }

    fn queue_peek_from_isr(&self, queue: QueueRef, buffer: &mut [u8]) -> bool {
        self.with("queue_peek_from_isr", |s| take(s, queue, buffer, false))
    }

    fn semaphore_take(&self, queue: QueueRef, ticks: TickType) -> bool {
        self.with("semaphore_take", |s| {
            s.ticks(ticks);
            take(s, queue, &mut [], true)
        })
    }

    fn semaphore_give_from_isr(&self, queue: QueueRef, woken: &mut bool) -> bool {
        self.with("semaphore_give_from_isr", |s| {
            *woken = false;
            send(s, queue, &[], QueuePosition::Back)
        })
    }

    fn mutex_take_recursive(&self, queue: QueueRef, ticks: TickType) -> bool {
        self.with("mutex_take_recursive", |s| {
            s.ticks(ticks);
            let current = s.current;
            let Some(q) = s.queue_mut(queue) else {
                return false;
            };
            if q.queue_type != QueueType::RecursiveMutex {
                return false;
            }
            if q.holder.is_some() && q.holder == current {
                q.recursion += 1;
                return true;
            }
            if q.items.pop_front().is_none() {
                return false;
            }
            q.holder = current;
            q.recursion = 1;
            true
        })
    }

    fn mutex_give_recursive(&self, queue: QueueRef) -> bool {
        self.with("mutex_give_recursive", |s| {
            let current = s.current;
            let Some(q) = s.queue_mut(queue) else {
                return false;
            };
            if q.queue_type != QueueType::RecursiveMutex
                || q.holder.is_none()
                || q.holder != current
            {
                return false;
            }
            q.recursion -= 1;
            if q.recursion == 0 {
                q.holder = None;
                q.items.push_back(Vec::new());
            }
            true
        })
    }

    fn messages_waiting(&self, queue: QueueRef) -> u32 {
        self.with("messages_waiting", |s| {
            s.queue(queue).map_or(0, |q| q.items.len() as u32)
        })
    }

    fn messages_waiting_from_isr(&self, queue: QueueRef) -> u32 {
        self.with("messages_waiting_from_isr", |s| {
            s.queue(queue).map_or(0, |q| q.items.len() as u32)
        })
    }

    fn spaces_available(&self, queue: QueueRef) -> u32 {
        self.with("spaces_available", |s| {
            s.queue(queue).map_or(0, |q| q.length - q.items.len() as u32)
        })
    }

    fn queue_is_empty_from_isr(&self, queue: QueueRef) -> bool {
        self.with("queue_is_empty_from_isr", |s| {
            s.queue(queue).map_or(false, |q| q.items.is_empty())
        })
    }

    fn queue_is_full_from_isr(&self, queue: QueueRef) -> bool {
        self.with("queue_is_full_from_isr", |s| {
            s.queue(queue).map_or(false, |q| q.items.len() as u32 >= q.length)
        })
    }

    fn mutex_holder(&self, queue: QueueRef) -> Option<TaskRef> {
        self.with("mutex_holder", |s| holder(s, queue))
    }

    fn mutex_holder_from_isr(&self, queue: QueueRef) -> Option<TaskRef> {
        self.with("mutex_holder_from_isr", |s| holder(s, queue))
    }

    fn queue_add_to_registry(&self, queue: QueueRef, name: &str) {
        self.with("queue_add_to_registry", |s| {
            if let Some(q) = s.queue_mut(queue) {
                q.name = Some(ObjectName::new(name));
            }
        })
    }

    fn queue_unregister(&self, queue: QueueRef) {
        self.with("queue_unregister", |s| {
            if let Some(q) = s.queue_mut(queue) {
                q.name = None;
            }
        })
    }

    fn queue_name(&self, queue: QueueRef) -> Option<ObjectName> {
        self.with("queue_name", |s| s.queue(queue).and_then(|q| q.name))
    }
}

impl QueueSetKernel for MockKernel {
    fn queue_set_create(&self, length: u32) -> Option<QueueSetRef> {
        self.with("queue_set_create", |s| {
            if length == 0 {
                return None;
            }
            let addr = s.allocate()?;
            s.sets.insert(
                addr.get(),
                MockQueueSet {
                    length,
                    members: Vec::new(),
                    ready: VecDeque::new(),
                },
            );
            Some(QueueSetRef::from_addr(addr))
        })
    }

    fn queue_set_delete(&self, set: QueueSetRef) {
        self.with("queue_set_delete", |s| {
            let addr = set.addr().get();
            if let Some(removed) = s.sets.remove(&addr) {
                for member in removed.members {
                    if let Some(q) = s.queues.get_mut(&member) {
                        q.set = None;
                    }
                }
            }
        })
    }

    fn queue_set_add(&self, member: QueueSetMemberRef, set: QueueSetRef) -> bool {
        self.with("queue_set_add", |s| {
            let set_addr = set.addr().get();
            match s.sets.get(&set_addr) {
                Some(set) if (set.members.len() as u32) < set.length => {}
                _ => return false,
            }
            let Some(q) = s.queue_mut(member) else {
                return false;
            };
            // Only empty queues that belong to no set may join
            if q.set.is_some() || !q.items.is_empty() {
                return false;
            }
            q.set = Some(set_addr);
            if let Some(set) = s.sets.get_mut(&set_addr) {
                set.members.push(member.addr().get());
            }
            true
        })
    }

    fn queue_set_remove(&self, member: QueueSetMemberRef, set: QueueSetRef) -> bool {
        self.with("queue_set_remove", |s| {
            let set_addr = set.addr().get();
            let Some(q) = s.queue_mut(member) else {
                return false;
            };
            if q.set != Some(set_addr) || !q.items.is_empty() {
                return false;
            }
            q.set = None;
            if let Some(set) = s.sets.get_mut(&set_addr) {
                set.members.retain(|m| *m != member.addr().get());
            }
            true
        })
    }

    fn queue_set_select(&self, set: QueueSetRef, ticks: TickType) -> Option<QueueSetMemberRef> {
        self.with("queue_set_select", |s| {
            s.ticks(ticks);
            select(s, set)
        })
    }

    fn queue_set_select_from_isr(&self, set: QueueSetRef) -> Option<QueueSetMemberRef> {
        self.with("queue_set_select_from_isr", |s| select(s, set))
    }
}

fn select(state: &mut State, set: QueueSetRef) -> Option<QueueSetMemberRef> {
    let set = state.sets.get_mut(&set.addr().get())?;
    let ready = set.ready.pop_front()?;
    core::num::NonZeroUsize::new(ready).map(QueueRef::from_addr)
}
