//! Synchronous seams over the managed services. Handlers depend on these
//! traits; the AWS implementations bridge onto the ambient tokio runtime.

use std::future::Future;

pub mod queue;
pub mod table;
pub mod topic;

/// Drives an SDK future to completion from synchronous handler code.
/// Requires a multi-threaded tokio runtime.
pub(crate) fn block_on_sdk<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
