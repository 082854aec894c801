//! rustx-adaptable - 可适配服务核心
//!
//! 按名称配置后端适配器，按环境折叠配置，并在调用前后串联可逆的数据策略。
//!
//! ## 模块
//!
//! - **cfg**: 配置记录、配置文件加载与类型工厂
//! - **adaptable**: 可适配类型核心（配置注册表、适配器解析、策略链、测试模式）
//! - **cache**: 基于核心构建的可适配缓存（内存适配器、序列化与 Base64 策略）

pub mod adaptable;
pub mod cache;
pub mod cfg;

// 重新导出主要的公共 API
pub use adaptable::{
    Adaptable, AdaptableError, AdaptableOptions, ApplyOptions, Configuration, EnvVarEnvironment,
    Environment, FixedEnvironment, Mode, Strategy, StrategyChain, StrategyFailure, TestMode,
    TestModeFlag,
};

pub use cfg::{ConfigRecord, Configs, Factory, Probe, Registration, StrategySpec};

pub use cache::{Cache, CacheAdapter};
