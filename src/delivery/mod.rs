//! Result delivery.
//!
//! Finished jobs leave the worker through one of two doors: a GET callback
//! to the originating CMS ([`notifier`]) when outputs were written to disk,
//! or the in-memory poll store ([`store`]) when the requester retrieves
//! results itself. Delivery failures are logged and never alter the job
//! outcome.

pub mod notifier;
pub mod store;

pub use notifier::CallbackNotifier;
pub use store::{JobResult, ResultStore};
