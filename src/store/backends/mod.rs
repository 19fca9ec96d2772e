mod memory;
mod redis;

pub use self::memory::MemoryRangeStore;
pub use self::redis::RedisRangeStore;
