//! Message history implementations for Solace.

pub mod in_memory;
pub mod noop;

pub use in_memory::InMemoryHistory;
pub use noop::NoopHistory;
