//! Workflow infrastructure implementations

mod cached_definitions;
mod in_memory_definitions;
mod in_memory_store;

pub use cached_definitions::CachedDefinitionRepository;
pub use in_memory_definitions::InMemoryDefinitionRepository;
pub use in_memory_store::InMemoryWorkflowStore;
