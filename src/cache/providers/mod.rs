//! Cache provider implementations

pub mod memory;
pub mod noop;

pub use memory::MemoryCacheService;
pub use noop::NoOpCacheService;
