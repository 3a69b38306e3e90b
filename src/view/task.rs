use std::sync::{Arc, Mutex};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub trait UpdateTask: Send + Sync {
    fn update(&self);
}

/// Runs deferred work once the current synchronous work has unwound.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: Arc<dyn UpdateTask>);
}

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                Task Queue
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// Collects scheduled tasks until someone calls [`TaskQueue::flush`].
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<Vec<Arc<dyn UpdateTask>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        TaskQueue::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs queued tasks, including the ones they schedule, until the queue
    /// is empty. Returns how many tasks ran.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch = std::mem::take(&mut *self.tasks.lock().unwrap());
            if batch.is_empty() {
                return ran;
            }
            for task in batch {
                task.update();
                ran += 1;
            }
        }
    }
}

impl Scheduler for TaskQueue {
    fn schedule(&self, task: Arc<dyn UpdateTask>) {
        self.tasks.lock().unwrap().push(task);
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.len()).finish()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Runs every task on the async-std executor.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnScheduler;

impl Scheduler for SpawnScheduler {
    fn schedule(&self, task: Arc<dyn UpdateTask>) {
        async_std::task::spawn(async move { task.update() });
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Bump(Arc<AtomicUsize>);

    impl UpdateTask for Bump {
        fn update(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn queue_runs_only_on_flush() {
        let hits = Arc::new(AtomicUsize::new(0));
        let queue = TaskQueue::new();

        queue.schedule(Arc::new(Bump(hits.clone())));
        queue.schedule(Arc::new(Bump(hits.clone())));
        assert_eq!(queue.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(queue.flush(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.flush(), 0);
    }
}
