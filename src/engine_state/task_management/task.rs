//! # Task Trait
//!
//! A `Task` is a self-contained unit of CPU-bound work handed to a worker thread.
//! It owns all the data it needs and returns an owned output that is sent back to the
//! thread that published it.
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - `Task::Output` must be `Send` to be transferred back
//! - Tasks must never touch GPU state; all GPU work stays on the publishing thread

/// A unit of work that can be executed on a worker thread.
///
/// # Implementation Guidelines
/// - Should be relatively coarse-grained to amortize scheduling overhead
/// - Should report failures through its output rather than panicking
pub trait Task: Send {
    /// Value produced by the task.
    type Output: Send;

    /// Performs the work, consuming the task.
    fn process(self) -> Self::Output;
}
