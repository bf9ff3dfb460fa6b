//! Provided [`ConflictResolver`](crate::ConflictResolver) implementations.

pub mod policy;
pub mod prompt;
pub mod scripted;
