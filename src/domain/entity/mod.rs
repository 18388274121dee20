//! Business entities under approval
//!
//! Owning modules register one [`EntitySource`] per entity type at startup.
//! The engine only sees [`EntityHandle`] and its opt-in capabilities.

mod handle;
mod registry;
mod resolver;

pub use handle::{EntityHandle, HasPrimaryEmployee, HasStatusField};
pub use registry::{EntityRegistry, EntitySource, DEFAULT_ALIASES, KNOWN_ENTITY_TYPES};
pub use resolver::{normalize_entity_type, EntityResolver, ResolvedEntity};
