//! Employee directory implementations

mod in_memory;

pub use in_memory::InMemoryEmployeeDirectory;
