//! Read/write access to values owned by components
//!
//! The registry never owns the numbers it exposes. A component keeps its
//! value and hands the registry an `Accessor` that reads and writes it.
//! `SharedValue` is the common case: the component and the registry each
//! hold a handle to the same slot, so a registry write is visible to the
//! component immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Getter/setter pair bound to a value owned elsewhere
pub trait Accessor: Send {
    fn get(&self) -> f64;
    fn set(&mut self, value: f64);
}

/// Numeric slot shared between its owning component and the registry
///
/// Stored as the bit pattern of an `f64` so the handle stays `Send + Sync`
/// and a model can be moved into a worker thread.
///
/// # Example
/// ```
/// use stock_model_core_rs::SharedValue;
///
/// let r0 = SharedValue::new(1.0e6);
/// let handle = r0.clone();
/// handle.set(2.5e6);
/// assert_eq!(r0.get(), 2.5e6);
/// ```
#[derive(Debug, Clone)]
pub struct SharedValue(Arc<AtomicU64>);

impl SharedValue {
    pub fn new(value: f64) -> Self {
        Self(Arc::new(AtomicU64::new(value.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Accessor for SharedValue {
    fn get(&self) -> f64 {
        SharedValue::get(self)
    }

    fn set(&mut self, value: f64) {
        SharedValue::set(self, value)
    }
}

/// Accessor built from a getter and a setter closure
pub struct FnAccessor<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> Accessor for FnAccessor<G, S>
where
    G: Fn() -> f64 + Send,
    S: FnMut(f64) + Send,
{
    fn get(&self) -> f64 {
        (self.getter)()
    }

    fn set(&mut self, value: f64) {
        (self.setter)(value)
    }
}

/// Bind a getter/setter closure pair
///
/// Useful when the owner stores the value in a derived form, e.g. on a
/// log scale.
///
/// # Example
/// ```
/// use stock_model_core_rs::{accessor, Accessor, SharedValue};
///
/// let log_r0 = SharedValue::new(0.0);
/// let read = log_r0.clone();
/// let write = log_r0.clone();
/// let mut r0 = accessor(move || read.get().exp(), move |v: f64| write.set(v.ln()));
///
/// r0.set(1.0);
/// assert_eq!(log_r0.get(), 0.0);
/// ```
pub fn accessor<G, S>(getter: G, setter: S) -> FnAccessor<G, S>
where
    G: Fn() -> f64 + Send,
    S: FnMut(f64) + Send,
{
    FnAccessor { getter, setter }
}
