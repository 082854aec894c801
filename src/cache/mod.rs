//! cache 模块 - 可适配缓存
//!
//! 基于 adaptable 核心的缓存类型：按名称配置适配器，写入前/读取后经过策略链。
//!
//! ```ignore
//! use adaptable::cache::Cache;
//! use adaptable::cfg::Configs;
//!
//! let cache = Cache::new()?;
//! cache.set_config(Configs::from_json(r#"{
//!     default: { adapter: "Memory", strategies: ["Serializer", "Base64"] }
//! }"#)?)?;
//!
//! cache.write("default", "user:1", json!({ "name": "Alice" }), None)?;
//! let user = cache.read("default", "user:1")?;
//! ```

pub mod adapter;
pub mod register;
pub mod strategy;

pub use adapter::{CacheAdapter, Memory, MemoryConfig};
pub use register::{register_adapters, register_strategies};
pub use strategy::{Base64, Base64Config, Serializer, SerializerConfig};

use anyhow::Result;
use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::adaptable::{Adaptable, AdaptableOptions, ApplyOptions, Environment, TestMode};

pub const CACHE_CLASS: &str = "adaptable::cache::Cache";
pub const ADAPTER_NAMESPACE: &str = "adaptable::cache::adapter";
pub const STRATEGY_NAMESPACE: &str = "adaptable::cache::strategy";

/// 缓存类型的默认配置
pub fn default_options() -> AdaptableOptions {
    AdaptableOptions {
        class: CACHE_CLASS.to_string(),
        adapter_namespace: ADAPTER_NAMESPACE.to_string(),
        strategy_namespace: STRATEGY_NAMESPACE.to_string(),
        ..Default::default()
    }
}

/// 可适配缓存
///
/// 通过 `Deref` 暴露 `Adaptable` 的配置、适配器与策略接口。
pub struct Cache {
    adaptable: Adaptable<dyn CacheAdapter>,
}

impl Cache {
    /// 创建缓存并注册内置适配器和策略
    pub fn new() -> Result<Self> {
        Self::with_options(default_options())
    }

    pub fn with_options(options: AdaptableOptions) -> Result<Self> {
        let adaptable = Adaptable::new(options);
        register_adapters(adaptable.adapter_factory())?;
        register_strategies(adaptable.strategy_factory())?;
        Ok(Self { adaptable })
    }

    pub fn with_environment(self, environment: Arc<dyn Environment>) -> Self {
        Self {
            adaptable: self.adaptable.with_environment(environment),
        }
    }

    pub fn with_test_mode(self, test_mode: Arc<dyn TestMode>) -> Self {
        Self {
            adaptable: self.adaptable.with_test_mode(test_mode),
        }
    }

    /// 写入缓存，数据先按声明顺序经过策略链
    pub fn write(&self, name: &str, key: &str, value: JsonValue, expiry: Option<Duration>) -> Result<()> {
        let data = self
            .apply_strategies("write", name, value.clone(), &ApplyOptions::new())?
            .unwrap_or(value);
        self.adapter(name)?.write(key, data, expiry)
    }

    /// 读取缓存，数据按声明的逆序经过策略链
    pub fn read(&self, name: &str, key: &str) -> Result<Option<JsonValue>> {
        let raw = match self.adapter(name)?.read(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let data = self
            .apply_strategies("read", name, raw.clone(), &ApplyOptions::new())?
            .unwrap_or(raw);
        Ok(Some(data))
    }

    pub fn delete(&self, name: &str, key: &str) -> Result<bool> {
        self.adapter(name)?.delete(key)
    }

    pub fn clear(&self, name: &str) -> Result<()> {
        self.adapter(name)?.clear()
    }
}

impl Deref for Cache {
    type Target = Adaptable<dyn CacheAdapter>;

    fn deref(&self) -> &Self::Target {
        &self.adaptable
    }
}

/// 全局 Cache 单例
static GLOBAL_CACHE: Lazy<Arc<Cache>> =
    Lazy::new(|| Arc::new(Cache::new().expect("Failed to create global Cache")));

/// 获取全局 Cache
pub fn global() -> Arc<Cache> {
    Arc::clone(&GLOBAL_CACHE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptable::{AdaptableError, FixedEnvironment};
    use crate::cfg::Configs;
    use serde_json::json;
    use serial_test::serial;

    fn test_cache() -> Result<Cache> {
        Ok(Cache::new()?.with_environment(Arc::new(FixedEnvironment::new("test"))))
    }

    #[test]
    fn test_cache_write_read_with_strategies() -> Result<()> {
        let cache = test_cache()?;
        cache.set_config(Configs::from_json(
            r#"{ default: { adapter: "Memory", strategies: ["Serializer", "Base64"] } }"#,
        )?)?;

        let data = json!({ "some": "data" });
        cache.write("default", "key", data.clone(), None)?;

        // 适配器中保存的是编码后的数据
        let stored = cache.adapter("default")?.read("key")?.unwrap();
        assert_eq!(stored, json!("eyJzb21lIjoiZGF0YSJ9"));

        assert_eq!(cache.read("default", "key")?, Some(data));
        Ok(())
    }

    #[test]
    fn test_cache_without_strategies() -> Result<()> {
        let cache = test_cache()?;
        cache.set_config(vec![("default", json!({ "adapter": "Memory" }))])?;

        cache.write("default", "key", json!([1, 2, 3]), None)?;
        assert_eq!(cache.adapter("default")?.read("key")?, Some(json!([1, 2, 3])));
        assert_eq!(cache.read("default", "key")?, Some(json!([1, 2, 3])));
        assert_eq!(cache.read("default", "missing")?, None);
        Ok(())
    }

    #[test]
    fn test_cache_delete_and_clear() -> Result<()> {
        let cache = test_cache()?;
        cache.set_config(vec![("default", json!({ "adapter": "Memory" }))])?;

        cache.write("default", "a", json!(1), None)?;
        cache.write("default", "b", json!(2), None)?;
        assert!(cache.delete("default", "a")?);
        assert_eq!(cache.read("default", "a")?, None);

        cache.clear("default")?;
        assert_eq!(cache.read("default", "b")?, None);
        Ok(())
    }

    #[test]
    fn test_cache_environment_configuration() -> Result<()> {
        let cache = test_cache()?;
        cache.set_config(Configs::from_yaml(
            r#"
default:
  development:
    adapter: Missing
  test:
    adapter: Memory
"#,
        )?)?;

        assert!(cache.enabled("default")?);
        Ok(())
    }

    #[test]
    fn test_cache_unknown_configuration() -> Result<()> {
        let cache = test_cache()?;
        let err = cache.write("session", "key", json!(1), None).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AdaptableError>(),
            Some(AdaptableError::ConfigurationNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    #[serial]
    fn test_global_cache() -> Result<()> {
        let cache = global();
        assert!(Arc::ptr_eq(&cache, &global()));
        assert_eq!(cache.class(), CACHE_CLASS);

        cache.set_config(vec![("global", json!([{ "adapter": "Memory" }]))])?;
        cache.write("global", "key", json!("value"), None)?;
        assert_eq!(global().read("global", "key")?, Some(json!("value")));

        cache.reset()?;
        assert!(cache.is_empty()?);
        Ok(())
    }
}
