//! 可适配类型核心
//!
//! 按名称保存配置，按需构造并缓存适配器，按声明顺序构造并缓存策略链。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use smart_default::SmartDefault;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::environment::{self, EnvVarEnvironment, Environment, DEFAULT_ENVIRONMENTS};
use super::error::{AdaptableError, Result};
use super::strategy::{ApplyOptions, Strategy, StrategyChain};
use super::test_mode::TestMode;
use crate::cfg::{ConfigRecord, Factory, Registration};

/// 可适配类型的配置
#[derive(Debug, Clone, Deserialize, Serialize, SmartDefault)]
#[serde(default)]
pub struct AdaptableOptions {
    /// 所属类型名称，出现在错误信息中
    #[default = "Adaptable"]
    pub class: String,

    /// 适配器短名查找使用的命名空间
    pub adapter_namespace: String,

    /// 策略短名查找使用的命名空间
    pub strategy_namespace: String,

    /// 识别为环境分支的键
    #[default(DEFAULT_ENVIRONMENTS.iter().map(|env| env.to_string()).collect())]
    pub environments: Vec<String>,
}

/// `config()` 返回的单个配置：记录本身和已缓存的适配器实例
pub struct Configuration<A: ?Sized> {
    pub record: ConfigRecord,
    pub object: Option<Arc<A>>,
}

impl<A: ?Sized> Clone for Configuration<A> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            object: self.object.clone(),
        }
    }
}

impl<A: ?Sized> std::fmt::Debug for Configuration<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("record", &self.record)
            .field("object", &self.object.as_ref().map(|_| "..."))
            .finish()
    }
}

// 注册表中的一项
struct Slot<A: ?Sized> {
    record: ConfigRecord,
    object: Option<Arc<A>>,
    // 构造 object 时使用的注册项，与 object 同时写入
    registration: Option<Registration<A>>,
    chain: Option<Arc<StrategyChain>>,
}

impl<A: ?Sized> Slot<A> {
    fn new(record: ConfigRecord) -> Self {
        Self {
            record,
            object: None,
            registration: None,
            chain: None,
        }
    }
}

/// 可适配类型
///
/// 持有该类型的全部命名配置，以及适配器和策略的工厂表。
/// 整个注册表由一把读写锁保护：命中缓存只需读锁，
/// 构造适配器或策略链时持有写锁并再次检查缓存，保证每个名称只构造一次。
///
/// # 类型参数
/// - `A`: 适配器 trait（使用 `dyn Trait` 形式）
///
/// # 示例
/// ```ignore
/// let cache: Adaptable<dyn CacheAdapter> = Adaptable::new(options);
/// cache.adapter_factory().register_with_name::<Memory, MemoryConfig>("Memory")?;
///
/// cache.set_config(Configs::from_json(r#"{ default: { adapter: "Memory" } }"#)?)?;
/// let adapter = cache.adapter("default")?;
/// ```
pub struct Adaptable<A: ?Sized> {
    options: AdaptableOptions,
    adapter_factory: Factory<A>,
    strategy_factory: Factory<dyn Strategy>,
    environment: Arc<dyn Environment>,
    test_mode: Arc<dyn TestMode>,
    configurations: RwLock<HashMap<String, Slot<A>>>,
}

impl<A: ?Sized + Send + Sync + 'static> Adaptable<A> {
    /// 创建可适配类型
    ///
    /// 当前环境默认读取 `ADAPTABLE_ENV`（未设置时为 development），测试模式默认关闭。
    pub fn new(options: AdaptableOptions) -> Self {
        Self {
            adapter_factory: Factory::new(options.adapter_namespace.clone()),
            strategy_factory: Factory::new(options.strategy_namespace.clone()),
            environment: Arc::new(EnvVarEnvironment::new("ADAPTABLE_ENV", "development")),
            test_mode: Arc::new(false),
            configurations: RwLock::new(HashMap::new()),
            options,
        }
    }

    /// 替换当前环境来源
    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// 替换测试模式开关
    pub fn with_test_mode(mut self, test_mode: Arc<dyn TestMode>) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn class(&self) -> &str {
        &self.options.class
    }

    pub fn options(&self) -> &AdaptableOptions {
        &self.options
    }

    pub fn adapter_factory(&self) -> &Factory<A> {
        &self.adapter_factory
    }

    pub fn strategy_factory(&self) -> &Factory<dyn Strategy> {
        &self.strategy_factory
    }

    // ============ 配置 ============

    /// 整体替换配置
    ///
    /// 每个配置在写入前按当前环境折叠；任意一项无效时保留原有配置不变。
    /// 已缓存的适配器和策略链随旧配置一起丢弃。
    pub fn set_config<I, K>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: Into<String>,
    {
        let active = self.environment.current();
        let mut resolved = HashMap::new();
        for (name, raw) in items {
            let name = name.into();
            let record = environment::resolve(raw, &self.options.environments, &active)
                .map_err(|reason| AdaptableError::InvalidConfiguration {
                    name: name.clone(),
                    reason,
                })?;
            resolved.insert(name, Slot::new(record));
        }

        let count = resolved.len();
        *self.lock_write()? = resolved;
        log::debug!(
            "{}: {} configuration(s) set for environment `{}`",
            self.options.class,
            count,
            active
        );
        Ok(())
    }

    /// 当前全部配置，包含已缓存的适配器实例
    pub fn config(&self) -> Result<HashMap<String, Configuration<A>>> {
        Ok(self
            .lock_read()?
            .iter()
            .map(|(name, slot)| (name.clone(), Self::configuration(slot)))
            .collect())
    }

    /// 当前全部配置记录
    pub fn records(&self) -> Result<HashMap<String, ConfigRecord>> {
        Ok(self
            .lock_read()?
            .iter()
            .map(|(name, slot)| (name.clone(), slot.record.clone()))
            .collect())
    }

    /// 单个名称的配置
    pub fn config_of(&self, name: &str) -> Result<Option<Configuration<A>>> {
        Ok(self.lock_read()?.get(name).map(Self::configuration))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_read()?.is_empty())
    }

    /// 清空全部配置
    pub fn reset(&self) -> Result<()> {
        self.lock_write()?.clear();
        log::debug!("{}: configurations reset", self.options.class);
        Ok(())
    }

    // ============ 适配器 ============

    /// 获取名称对应的适配器实例，首次调用时构造并缓存
    pub fn adapter(&self, name: &str) -> Result<Arc<A>> {
        self.instance(name).map(|(object, _)| object)
    }

    /// 名称对应的适配器是否可用
    ///
    /// 测试模式下只校验配置和适配器引用，不构造实例。
    /// 否则返回的是实际构造该实例的注册项的探测结果。
    pub fn enabled(&self, name: &str) -> Result<bool> {
        if !self.test_mode.active() {
            let (_, registration) = self.instance(name)?;
            return Ok(registration.enabled());
        }

        let configurations = self.lock_read()?;
        let slot = configurations
            .get(name)
            .ok_or_else(|| self.not_found(name))?;
        Ok(self.resolve_adapter(name, &slot.record)?.enabled())
    }

    /// 是否已经为该名称构造过真实的适配器实例
    pub fn test_initialized(&self, name: &str) -> bool {
        match self.configurations.read() {
            Ok(configurations) => configurations
                .get(name)
                .map(|slot| slot.object.is_some())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    // ============ 策略 ============

    /// 获取名称对应的策略链，首次调用时构造并缓存
    ///
    /// 配置中没有 `strategies` 字段时返回 `None`。
    pub fn strategies(&self, name: &str) -> Result<Option<Arc<StrategyChain>>> {
        {
            let configurations = self.lock_read()?;
            let slot = configurations
                .get(name)
                .ok_or_else(|| self.not_found(name))?;
            if !slot.record.has_strategies() {
                return Ok(None);
            }
            if let Some(chain) = &slot.chain {
                return Ok(Some(Arc::clone(chain)));
            }
        }

        let mut configurations = self.lock_write()?;
        let slot = configurations
            .get_mut(name)
            .ok_or_else(|| self.not_found(name))?;
        if let Some(chain) = &slot.chain {
            return Ok(Some(Arc::clone(chain)));
        }

        let specs = match slot.record.strategies() {
            Ok(Some(specs)) => specs,
            Ok(None) => return Ok(None),
            Err(err) => {
                return Err(AdaptableError::InvalidConfiguration {
                    name: name.to_string(),
                    reason: err.to_string(),
                })
            }
        };

        let mut chain = StrategyChain::new();
        for spec in specs {
            let registration = self
                .strategy_factory
                .resolve(&spec.reference)
                .map_err(|err| AdaptableError::LockPoisoned(err.to_string()))?
                .ok_or_else(|| AdaptableError::StrategyNotFound {
                    strategy: spec.reference.clone(),
                    class: self.options.class.clone(),
                })?;
            let strategy = registration.create(spec.params).map_err(|source| {
                AdaptableError::StrategyConstruction {
                    name: name.to_string(),
                    strategy: spec.reference.clone(),
                    source,
                }
            })?;
            chain.push_back(spec.reference, strategy);
        }

        let chain = Arc::new(chain);
        slot.chain = Some(Arc::clone(&chain));
        log::debug!(
            "{}: strategy chain {:?} built for configuration `{}`",
            self.options.class,
            chain.references(),
            name
        );
        Ok(Some(chain))
    }

    /// 让数据依次经过名称对应的策略链
    ///
    /// - 配置中没有 `strategies` 字段：返回 `None`
    /// - `strategies` 为空：原样返回数据
    /// - 否则按 `options.mode`（未指定时由方法名推断）遍历策略链
    pub fn apply_strategies(
        &self,
        method: &str,
        name: &str,
        data: JsonValue,
        options: &ApplyOptions,
    ) -> Result<Option<JsonValue>> {
        let chain = match self.strategies(name)? {
            Some(chain) => chain,
            None => return Ok(None),
        };

        chain
            .apply(method, data, options)
            .map(Some)
            .map_err(|source| AdaptableError::StrategyFailed {
                name: name.to_string(),
                source,
            })
    }

    // ============ 内部方法 ============

    // 返回缓存的实例及其注册项，未构造时在写锁内构造
    fn instance(&self, name: &str) -> Result<(Arc<A>, Registration<A>)> {
        {
            let configurations = self.lock_read()?;
            let slot = configurations
                .get(name)
                .ok_or_else(|| self.not_found(name))?;
            if let Some(built) = Self::built(slot) {
                return Ok(built);
            }
        }

        let mut configurations = self.lock_write()?;
        let slot = configurations
            .get_mut(name)
            .ok_or_else(|| self.not_found(name))?;
        // 等锁期间可能已被其它调用方构造
        if let Some(built) = Self::built(slot) {
            return Ok(built);
        }

        let registration = self.resolve_adapter(name, &slot.record)?;
        let instance = registration
            .create(slot.record.to_options())
            .map_err(|source| AdaptableError::AdapterConstruction {
                name: name.to_string(),
                adapter: registration.key().to_string(),
                source,
            })?;

        let object: Arc<A> = Arc::from(instance);
        slot.object = Some(Arc::clone(&object));
        slot.registration = Some(registration.clone());
        log::debug!(
            "{}: adapter `{}` constructed for configuration `{}`",
            self.options.class,
            registration.key(),
            name
        );
        Ok((object, registration))
    }

    fn built(slot: &Slot<A>) -> Option<(Arc<A>, Registration<A>)> {
        match (&slot.object, &slot.registration) {
            (Some(object), Some(registration)) => Some((Arc::clone(object), registration.clone())),
            _ => None,
        }
    }

    fn configuration(slot: &Slot<A>) -> Configuration<A> {
        Configuration {
            record: slot.record.clone(),
            object: slot.object.clone(),
        }
    }

    fn resolve_adapter(&self, name: &str, record: &ConfigRecord) -> Result<Registration<A>> {
        let reference = record
            .adapter()
            .ok_or_else(|| AdaptableError::NoAdapterSet {
                name: name.to_string(),
                class: self.options.class.clone(),
            })?;

        self.adapter_factory
            .resolve(&reference)
            .map_err(|err| AdaptableError::LockPoisoned(err.to_string()))?
            .ok_or_else(|| AdaptableError::AdapterNotFound {
                adapter: reference,
                class: self.options.class.clone(),
            })
    }

    fn not_found(&self, name: &str) -> AdaptableError {
        AdaptableError::ConfigurationNotFound {
            name: name.to_string(),
        }
    }

    fn lock_read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Slot<A>>>> {
        self.configurations
            .read()
            .map_err(|_| AdaptableError::LockPoisoned(format!("{} configurations", self.options.class)))
    }

    fn lock_write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Slot<A>>>> {
        self.configurations
            .write()
            .map_err(|_| AdaptableError::LockPoisoned(format!("{} configurations", self.options.class)))
    }
}
