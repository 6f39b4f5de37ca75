//! Core run-time plumbing: year calendar and cooperative cancellation

pub mod stop;
pub mod time;
