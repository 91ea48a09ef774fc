//! # Task Management System
//!
//! A fixed-size worker pool for CPU-bound jobs such as decoding and resizing textures.
//!
//! ## Architecture Overview
//! - `TaskManager`: owns the worker count and runs batches of tasks
//! - `Task`: a unit of work with an owned output
//!
//! ## Task Lifecycle
//! 1. A batch of tasks is handed to `TaskManager::run_to_completion()`
//! 2. Workers drain a shared, mutex-guarded queue, one task at a time
//! 3. Each output is sent back over an mpsc channel as soon as it is ready
//! 4. The calling thread blocks until every worker has exited, then returns the outputs
//!    in completion order
//!
//! Completion order depends on scheduling and is not stable between runs. Callers that
//! need stable identifiers must carry them inside the output.
//!
//! ## Example Usage
//! ```rust
//! use voxel_world::engine_state::task_management::{task::Task, TaskManager};
//!
//! struct Square(u64);
//!
//! impl Task for Square {
//!     type Output = u64;
//!     fn process(self) -> u64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! let manager = TaskManager::new(4);
//! let mut results = manager.run_to_completion((1..=5).map(Square).collect());
//! results.sort_unstable();
//! assert_eq!(results, vec![1, 4, 9, 16, 25]);
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::channel;
use std::sync::Mutex;
use std::thread;

use log::{debug, info};
use task::Task;

/// Runs batches of tasks on a pool of scoped worker threads.
///
/// Workers only live for the duration of a batch, so no thread outlives the data it
/// borrows and nothing needs to be joined on drop.
#[derive(Debug, Clone, Copy)]
pub struct TaskManager {
    num_workers: usize,
}

impl TaskManager {
    /// Creates a new `TaskManager`.
    ///
    /// # Arguments
    /// * `num_workers` - Maximum number of worker threads per batch. Zero is treated as one.
    pub fn new(num_workers: usize) -> Self {
        info!(
            "Available parallelism: {:?}",
            thread::available_parallelism()
        );
        TaskManager {
            num_workers: num_workers.max(1),
        }
    }

    /// Number of workers a full batch is spread across.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Executes every task and blocks until all of them have finished.
    ///
    /// # Arguments
    /// * `tasks` - The batch to execute
    ///
    /// # Returns
    /// One output per task, in the order the tasks completed.
    ///
    /// # Panics
    /// Propagates a panic raised inside a task.
    pub fn run_to_completion<T: Task>(&self, tasks: Vec<T>) -> Vec<T::Output> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let total = tasks.len();
        let workers = self.num_workers.min(total);
        let queue = Mutex::new(VecDeque::from(tasks));
        let (result_tx, result_rx) = channel::<T::Output>();

        thread::scope(|scope| {
            for worker in 0..workers {
                let result_tx = result_tx.clone();
                let queue = &queue;
                scope.spawn(move || {
                    let mut processed = 0usize;
                    loop {
                        let next = match queue.lock() {
                            Ok(mut queue) => queue.pop_front(),
                            Err(poisoned) => poisoned.into_inner().pop_front(),
                        };
                        let Some(task) = next else {
                            break;
                        };
                        if result_tx.send(task.process()).is_err() {
                            break;
                        }
                        processed += 1;
                    }
                    debug!("Worker {worker} processed {processed} tasks");
                });
            }
        });
        drop(result_tx);

        let results: Vec<T::Output> = result_rx.into_iter().collect();
        debug!("Batch finished: {}/{} tasks on {workers} workers", results.len(), total);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Sleepy {
        id: usize,
        millis: u64,
    }

    impl Task for Sleepy {
        type Output = usize;

        fn process(self) -> usize {
            thread::sleep(Duration::from_millis(self.millis));
            self.id
        }
    }

    #[test]
    fn every_task_produces_one_output() {
        let manager = TaskManager::new(3);
        let tasks = (0..20).map(|id| Sleepy { id, millis: (id % 3) as u64 }).collect();
        let mut ids = manager.run_to_completion(tasks);
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn outputs_arrive_in_completion_order() {
        let manager = TaskManager::new(2);
        let tasks = vec![Sleepy { id: 0, millis: 200 }, Sleepy { id: 1, millis: 0 }];
        assert_eq!(manager.run_to_completion(tasks), vec![1, 0]);
    }

    #[test]
    fn empty_batch_and_zero_workers_are_fine() {
        let manager = TaskManager::new(0);
        assert_eq!(manager.num_workers(), 1);
        assert!(manager.run_to_completion(Vec::<Sleepy>::new()).is_empty());
        assert_eq!(manager.run_to_completion(vec![Sleepy { id: 7, millis: 0 }]), vec![7]);
    }
}
