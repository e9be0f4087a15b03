//! Shared plumbing used by the service wrappers

pub mod retry;
pub mod shutdown;
pub mod sync;
