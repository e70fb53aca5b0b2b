//! Virtual-clock timer queue.
//!
//! Time never moves on its own: the owning [`Page`](crate::Page) advances the
//! clock and pulls due tasks out one at a time. Tasks due at the same instant
//! run in the order they were scheduled.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) i64);

impl TimerId {
    pub fn get(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: i64,
    pub order: i64,
    pub interval_ms: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ScheduledTask<T> {
    pub(crate) id: TimerId,
    pub(crate) due_at: i64,
    order: i64,
    interval_ms: Option<i64>,
    pub(crate) task: T,
}

#[derive(Debug, Clone)]
pub(crate) struct TimerQueue<T> {
    tasks: Vec<ScheduledTask<T>>,
    now_ms: i64,
    next_timer_id: i64,
    next_task_order: i64,
    running_timer_id: Option<TimerId>,
    running_timer_canceled: bool,
}

impl<T> TimerQueue<T> {
    pub(crate) fn new(now_ms: i64) -> Self {
        Self {
            tasks: Vec::new(),
            now_ms,
            next_timer_id: 1,
            next_task_order: 0,
            running_timer_id: None,
            running_timer_canceled: false,
        }
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn set_now_ms(&mut self, now_ms: i64) {
        self.now_ms = now_ms;
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn set_timeout(&mut self, task: T, delay_ms: i64) -> TimerId {
        let id = self.push(task, delay_ms.max(0), None);
        tracing::trace!(id = id.0, delay_ms, "schedule timeout");
        id
    }

    pub(crate) fn set_interval(&mut self, task: T, interval_ms: i64) -> TimerId {
        let interval_ms = interval_ms.max(0);
        let id = self.push(task, interval_ms, Some(interval_ms));
        tracing::trace!(id = id.0, interval_ms, "schedule interval");
        id
    }

    fn push(&mut self, task: T, delay_ms: i64, interval_ms: Option<i64>) -> TimerId {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        let order = self.next_order();
        self.tasks.push(ScheduledTask {
            id,
            due_at: self.now_ms.saturating_add(delay_ms),
            order,
            interval_ms,
            task,
        });
        id
    }

    fn next_order(&mut self) -> i64 {
        let order = self.next_task_order;
        self.next_task_order += 1;
        order
    }

    /// Cancels a pending timer, or stops an interval from re-arming while its
    /// own callback is running.
    pub(crate) fn clear(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = before != self.tasks.len();
        let running = self.running_timer_id == Some(id);
        if running {
            self.running_timer_canceled = true;
        }
        tracing::trace!(id = id.0, removed, running, "clear timer");
        removed || running
    }

    pub(crate) fn clear_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !predicate(&task.task));
        before - self.tasks.len()
    }

    pub(crate) fn pending(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .tasks
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                interval_ms: task.interval_ms,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub(crate) fn next_due_at(&self, due_limit: Option<i64>) -> Option<i64> {
        self.next_task_index(due_limit)
            .map(|idx| self.tasks[idx].due_at)
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    /// Removes the earliest task due at or before `due_limit` (any task when
    /// `None`) and marks it running. Pair with [`TimerQueue::finish`].
    pub(crate) fn begin_next(
        &mut self,
        due_limit: Option<i64>,
        advance_clock: bool,
    ) -> Option<ScheduledTask<T>> {
        let idx = self.next_task_index(due_limit)?;
        let task = self.tasks.remove(idx);
        if advance_clock && task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        self.running_timer_id = Some(task.id);
        self.running_timer_canceled = false;
        tracing::trace!(
            id = task.id.0,
            due_at = task.due_at,
            now_ms = self.now_ms,
            "run timer"
        );
        Some(task)
    }

    /// Re-arms interval tasks unless they were cleared while running.
    pub(crate) fn finish(&mut self, task: ScheduledTask<T>) {
        let canceled = self.running_timer_canceled;
        self.running_timer_id = None;
        self.running_timer_canceled = false;

        let Some(interval_ms) = task.interval_ms else {
            return;
        };
        if canceled {
            return;
        }
        let due_at = task.due_at.saturating_add(interval_ms);
        let order = self.next_order();
        tracing::trace!(id = task.id.0, due_at, interval_ms, "requeue interval");
        self.tasks.push(ScheduledTask {
            due_at,
            order,
            ..task
        });
    }
}
