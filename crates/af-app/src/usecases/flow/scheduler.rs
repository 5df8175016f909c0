use std::collections::VecDeque;

use af_core::flow::ScheduledTask;

/// FIFO of work deferred to a later turn of the event loop.
///
/// The controller only enqueues; whoever owns the loop drains the queue
/// after each handler returns, so a deferred task always observes the
/// state the handler left behind.
#[derive(Debug, Default)]
pub(crate) struct TaskQueue {
    tasks: VecDeque<ScheduledTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: ScheduledTask) {
        self.tasks.push_back(task);
    }

    /// Remove and return every queued task, oldest first.
    pub fn drain(&mut self) -> Vec<ScheduledTask> {
        self.tasks.drain(..).collect()
    }
}
