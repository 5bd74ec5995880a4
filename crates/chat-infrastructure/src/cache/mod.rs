//! Session cache backends

mod redis_cache;

pub use redis_cache::RedisSessionCache;
