//! Job orchestration: accepts profile-creation requests, fans platform work
//! out to the registered tasks, and folds the outcomes back into the store.
//!
//! Ordering contract: Facebook and YouTube run concurrently; Instagram waits
//! for both to settle, since its signup competes for leased OTP numbers and
//! cloud phones from a limited pool. Every task runs inside a hard deadline
//! and a panic fence, so one bad automation run can never wedge the worker
//! pool.

pub mod callback;
pub mod error;
pub mod orchestrator;
pub mod task;

pub use callback::{HttpNotifier, Notifier};
pub use error::{OrchestratorError, Result};
pub use orchestrator::{Orchestrator, Submission, SubmitRequest};
pub use task::{PlatformTask, TaskInput};
