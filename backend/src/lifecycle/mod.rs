//! Lifecycle state machine

pub mod controller;

pub use controller::LifecycleController;
