pub mod memory;

pub use memory::{Memory, MemoryConfig};

use anyhow::Result;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// 缓存适配器 trait
pub trait CacheAdapter: Send + Sync {
    /// 写入缓存，`expiry` 为空时永不过期
    fn write(&self, key: &str, value: JsonValue, expiry: Option<Duration>) -> Result<()>;

    /// 读取缓存，键不存在或已过期时返回 None
    fn read(&self, key: &str) -> Result<Option<JsonValue>>;

    /// 删除缓存，返回键是否存在
    fn delete(&self, key: &str) -> Result<bool>;

    /// 清空缓存
    fn clear(&self) -> Result<()>;
}
