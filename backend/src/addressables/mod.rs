//! Addressable parameters
//!
//! Components expose their estimable fields by registering them here during
//! Build. Run modes then read and write those fields by label without
//! knowing anything about the component that owns them.

pub mod binding;
pub mod path;
pub mod prior;
pub mod registry;

pub use binding::{accessor, Accessor, FnAccessor, SharedValue};
pub use path::AddressablePath;
pub use prior::Prior;
pub use registry::{AddressableError, AddressableOptions, AddressableRegistry, Bounds};
