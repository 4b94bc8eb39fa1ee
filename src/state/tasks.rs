// TaskQueue - Deterministic single-thread deferred work
//
// Construction-time collaborators sometimes need a one-shot recomputation
// that must run after the triggering call returns but before the next
// externally-delivered event. Instead of toolkit-specific "run later" hooks,
// this is an explicit queue: schedule() from anywhere in the turn, and the
// event loop drains it with run_pending() between external events.

use tokio::sync::mpsc;

type Task = Box<dyn FnOnce()>;

/// Cloneable scheduling handle for a [`TaskQueue`].
///
/// Handles may outlive the queue; scheduling onto a dropped queue is a
/// no-op that reports `false`.
#[derive(Clone)]
pub struct TaskHandle {
    task_tx: mpsc::UnboundedSender<Task>,
}

impl TaskHandle {
    /// Enqueue a deferred task. Returns whether the queue still existed.
    ///
    /// There is no cancellation primitive: a task whose subject may be
    /// disposed before the queue drains should capture a `Weak` reference
    /// and no-op when the upgrade fails.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        match self.task_tx.send(Box::new(task)) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("Task scheduled after its queue was dropped - ignored");
                false
            }
        }
    }
}

/// Single-threaded FIFO queue of deferred tasks.
///
/// Tasks run in scheduling order. Tasks scheduled *while* draining are
/// picked up by the same drain, so a deferred task may itself defer work
/// and still complete within the same turn; ordering between tasks
/// scheduled in the same turn follows scheduling order only.
pub struct TaskQueue {
    task_tx: mpsc::UnboundedSender<Task>,
    task_rx: mpsc::UnboundedReceiver<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        Self { task_tx, task_rx }
    }

    /// A scheduling handle to hand to components that defer work here.
    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            task_tx: self.task_tx.clone(),
        }
    }

    /// Drain and execute every pending task. Returns how many ran.
    ///
    /// The owning event loop calls this after each externally-delivered
    /// event, so every deferred task is guaranteed to run before the next
    /// one arrives.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.task_rx.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!("Drained {} deferred task(s)", ran);
        }
        ran
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    #[test]
    fn test_tasks_run_in_fifo_order() {
        let mut queue = TaskQueue::new();
        let handle = queue.handle();
        let order = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let order = Rc::clone(&order);
            handle.schedule(move || order.borrow_mut().push(i));
        }

        // Nothing runs until the drain.
        assert!(order.borrow().is_empty());
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_tasks_scheduled_while_draining_run_in_same_drain() {
        let mut queue = TaskQueue::new();
        let handle = queue.handle();
        let order = Rc::new(RefCell::new(Vec::new()));

        {
            let order = Rc::clone(&order);
            let inner_handle = handle.clone();
            handle.schedule(move || {
                order.borrow_mut().push("outer");
                let order = Rc::clone(&order);
                inner_handle.schedule(move || order.borrow_mut().push("inner"));
            });
        }

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_schedule_after_queue_dropped_is_noop() {
        let queue = TaskQueue::new();
        let handle = queue.handle();
        drop(queue);

        assert!(!handle.schedule(|| panic!("must never run")));
    }

    #[test]
    fn test_disposed_subject_noops_via_weak() {
        let mut queue = TaskQueue::new();
        let handle = queue.handle();

        let subject = Rc::new(RefCell::new(0));
        let weak: Weak<RefCell<i32>> = Rc::downgrade(&subject);
        handle.schedule(move || {
            if let Some(subject) = weak.upgrade() {
                *subject.borrow_mut() += 1;
            }
        });

        drop(subject);
        // The task fires after disposal and must be a silent no-op.
        assert_eq!(queue.run_pending(), 1);
    }

    #[test]
    fn test_drain_is_idempotent_when_empty() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.run_pending(), 0);
        assert_eq!(queue.run_pending(), 0);
    }
}
