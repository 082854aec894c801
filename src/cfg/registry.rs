// 类型工厂表
//
// 每个可适配类型持有自己的工厂表（引用名 → 构造函数），不依赖全局注册表。
// 查找时先按完整引用匹配，未命中再到约定命名空间下按短名匹配。

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// 构造函数类型：从 JSON 参数构造出 trait object
type Constructor<T> = Arc<dyn Fn(JsonValue) -> Result<Box<T>> + Send + Sync>;

/// 可用性探测：在不构造实例的情况下判断实现是否可用
pub type Probe = fn() -> bool;

fn always_enabled() -> bool {
    true
}

/// 工厂表中的一条注册记录
pub struct Registration<T: ?Sized> {
    key: String,
    constructor: Constructor<T>,
    probe: Probe,
}

impl<T: ?Sized> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            constructor: Arc::clone(&self.constructor),
            probe: self.probe,
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .finish()
    }
}

impl<T: ?Sized> Registration<T> {
    /// 注册时使用的完整引用名
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 使用给定参数构造实例
    pub fn create(&self, options: JsonValue) -> Result<Box<T>> {
        (self.constructor)(options)
    }

    /// 调用注册时提供的可用性探测
    pub fn enabled(&self) -> bool {
        (self.probe)()
    }
}

/// 某个 trait 的实现工厂表
///
/// # 类型参数
/// - `T`: 目标 trait（使用 `dyn Trait` 形式）
///
/// # 示例
/// ```ignore
/// let factory: Factory<dyn CacheAdapter> = Factory::new("adaptable::cache::adapter");
/// factory.register_with_name::<Memory, MemoryConfig>(&factory.qualify("Memory"))?;
///
/// // 短名和完整引用都能解析到同一个构造函数
/// assert!(factory.contains("Memory"));
/// assert!(factory.contains("adaptable::cache::adapter::Memory"));
/// ```
pub struct Factory<T: ?Sized> {
    namespace: String,
    entries: RwLock<HashMap<String, Registration<T>>>,
}

impl<T: ?Sized + 'static> Factory<T> {
    /// 创建工厂表，`namespace` 为短名查找时使用的约定命名空间
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 将短名补全为约定命名空间下的完整引用
    pub fn qualify(&self, short_name: &str) -> String {
        if self.namespace.is_empty() {
            short_name.to_string()
        } else {
            format!("{}::{}", self.namespace, short_name)
        }
    }

    /// 以指定的引用名注册实现
    pub fn register_with_name<I, Config>(&self, key: &str) -> Result<()>
    where
        I: From<Config> + Send + Sync + 'static,
        Config: DeserializeOwned + 'static,
        Box<I>: Into<Box<T>>,
    {
        self.register_with_probe::<I, Config>(key, always_enabled)
    }

    /// 以指定的引用名注册实现，并附带可用性探测
    pub fn register_with_probe<I, Config>(&self, key: &str, probe: Probe) -> Result<()>
    where
        I: From<Config> + Send + Sync + 'static,
        Config: DeserializeOwned + 'static,
        Box<I>: Into<Box<T>>,
    {
        let key = key.trim_start_matches("::").to_string();
        let constructor: Constructor<T> = Arc::new(|value: JsonValue| -> Result<Box<T>> {
            let config: Config = serde_json::from_value(value)?;
            let instance = I::from(config);
            Ok(Box::new(instance).into())
        });

        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("Failed to acquire write lock"))?;
        entries.insert(
            key.clone(),
            Registration {
                key,
                constructor,
                probe,
            },
        );
        Ok(())
    }

    /// 自动生成引用名注册
    ///
    /// 同时注册完整类型名（`std::any::type_name`）和命名空间下的简短类型名，
    /// 配置中两种写法都可以使用。
    pub fn register<I, Config>(&self) -> Result<()>
    where
        I: From<Config> + Send + Sync + 'static,
        Config: DeserializeOwned + 'static,
        Box<I>: Into<Box<T>>,
    {
        self.register_with_name::<I, Config>(std::any::type_name::<I>())?;
        self.register_with_name::<I, Config>(&self.qualify(&short_type_name::<I>()))?;
        Ok(())
    }

    /// 解析引用：先按完整引用查找，再按命名空间下的短名查找
    pub fn resolve(&self, reference: &str) -> Result<Option<Registration<T>>> {
        let reference = reference.trim_start_matches("::");
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("Failed to acquire read lock"))?;

        if let Some(registration) = entries.get(reference) {
            return Ok(Some(registration.clone()));
        }
        Ok(entries.get(&self.qualify(reference)).cloned())
    }

    pub fn contains(&self, reference: &str) -> bool {
        matches!(self.resolve(reference), Ok(Some(_)))
    }

    /// 已注册的完整引用名（排序后返回）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.entries.read() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// 生成简短类型名：去掉每一段路径前缀，保留泛型结构
///
/// 例如 `my_crate::cache::Memory<alloc::string::String>` 简化为 `Memory<String>`
pub fn short_type_name<I: ?Sized>() -> String {
    simplify_type_name(std::any::type_name::<I>())
}

fn simplify_type_name(full_name: &str) -> String {
    fn last_segment(path: &str) -> &str {
        path.rsplit("::").next().unwrap_or(path)
    }

    let mut simplified = String::with_capacity(full_name.len());
    let mut path = String::new();
    for ch in full_name.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '&' | '(' | ')' | '[' | ']' | ';' => {
                simplified.push_str(last_segment(&path));
                path.clear();
                simplified.push(ch);
            }
            _ => path.push(ch),
        }
    }
    simplified.push_str(last_segment(&path));
    simplified
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    trait Backend: Send + Sync {
        fn describe(&self) -> String;
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(default)]
    struct FileConfig {
        path: String,
    }

    struct File {
        config: FileConfig,
    }

    crate::impl_from!(FileConfig => File, field: config);
    crate::impl_box_from!(File => dyn Backend);

    impl Backend for File {
        fn describe(&self) -> String {
            format!("file:{}", self.config.path)
        }
    }

    fn disabled() -> bool {
        false
    }

    #[test]
    fn test_resolve_short_and_qualified_name() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("app::backend");
        factory.register_with_name::<File, FileConfig>(&factory.qualify("File"))?;

        let short = factory.resolve("File")?.expect("short name should resolve");
        let qualified = factory
            .resolve("app::backend::File")?
            .expect("qualified name should resolve");
        let rooted = factory
            .resolve("::app::backend::File")?
            .expect("leading separator should be ignored");

        assert_eq!(short.key(), "app::backend::File");
        assert_eq!(qualified.key(), short.key());
        assert_eq!(rooted.key(), short.key());
        Ok(())
    }

    #[test]
    fn test_resolve_prefers_qualified_reference() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("app::backend");
        factory.register_with_name::<File, FileConfig>("File")?;
        factory.register_with_name::<File, FileConfig>("app::backend::File")?;

        let registration = factory.resolve("File")?.unwrap();
        assert_eq!(registration.key(), "File");
        Ok(())
    }

    #[test]
    fn test_unknown_reference() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("app::backend");
        assert!(factory.resolve("Missing")?.is_none());
        assert!(!factory.contains("Missing"));
        Ok(())
    }

    #[test]
    fn test_create_with_options() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("app::backend");
        factory.register_with_name::<File, FileConfig>(&factory.qualify("File"))?;

        let backend = factory
            .resolve("File")?
            .unwrap()
            .create(json!({ "path": "/tmp/cache", "adapter": "File" }))?;
        assert_eq!(backend.describe(), "file:/tmp/cache");
        Ok(())
    }

    #[test]
    fn test_create_with_invalid_options() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("app::backend");
        factory.register_with_name::<File, FileConfig>("File")?;

        let result = factory.resolve("File")?.unwrap().create(json!({ "path": 42 }));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_register_generates_names() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("app::backend");
        factory.register::<File, FileConfig>()?;

        assert!(factory.contains(std::any::type_name::<File>()));
        assert!(factory.contains("File"));
        assert_eq!(factory.names().len(), 2);
        Ok(())
    }

    #[test]
    fn test_probe() -> Result<()> {
        let factory: Factory<dyn Backend> = Factory::new("");
        factory.register_with_probe::<File, FileConfig>("Disabled", disabled)?;
        factory.register_with_name::<File, FileConfig>("Enabled")?;

        assert!(!factory.resolve("Disabled")?.unwrap().enabled());
        assert!(factory.resolve("Enabled")?.unwrap().enabled());
        Ok(())
    }

    #[test]
    fn test_simplify_type_name() {
        assert_eq!(simplify_type_name("app::cache::Memory"), "Memory");
        assert_eq!(
            simplify_type_name("app::Store<alloc::string::String, alloc::vec::Vec<u8>>"),
            "Store<String, Vec<u8>>"
        );
        assert_eq!(simplify_type_name("Plain"), "Plain");
    }
}
