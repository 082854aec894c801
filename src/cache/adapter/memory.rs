use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::CacheAdapter;

/// Memory 适配器配置
///
/// 直接由配置记录反序列化而来，`adapter`、`filters` 保留以便与配置对照。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    pub adapter: Option<String>,
    pub filters: Vec<JsonValue>,
    /// 初始容量（可选）
    pub initial_capacity: Option<usize>,
}

struct Entry {
    value: JsonValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// 基于 RwLock + HashMap 的进程内缓存
///
/// 过期键在读取该键或任意一次写入时清理。
pub struct Memory {
    config: MemoryConfig,
    entries: RwLock<HashMap<String, Entry>>,
}

impl Memory {
    pub fn new(config: MemoryConfig) -> Self {
        let entries = match config.initial_capacity {
            Some(capacity) => HashMap::with_capacity(capacity),
            None => HashMap::new(),
        };

        Self {
            config,
            entries: RwLock::new(entries),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// 进程内缓存始终可用
    pub fn enabled() -> bool {
        true
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").field("config", &self.config).finish()
    }
}

impl CacheAdapter for Memory {
    fn write(&self, key: &str, value: JsonValue, expiry: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("Failed to acquire write lock"))?;
        // 写入时顺带清理所有已过期的键
        entries.retain(|_, entry| !entry.expired(now));
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: expiry.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<JsonValue>> {
        let now = Instant::now();
        {
            let entries = self
                .entries
                .read()
                .map_err(|_| anyhow!("Failed to acquire read lock"))?;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // 过期键惰性清理
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("Failed to acquire write lock"))?;
        if entries.get(key).map(|entry| entry.expired(now)).unwrap_or(false) {
            entries.remove(key);
        }
        Ok(None)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("Failed to acquire write lock"))?;
        Ok(entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("Failed to acquire write lock"))?
            .clear();
        Ok(())
    }
}

crate::impl_from!(MemoryConfig => Memory);
crate::impl_box_from!(Memory => dyn CacheAdapter);
