//! adaptable 模块 - 可适配服务核心
//!
//! 按名称配置可插拔服务：每个名称解析到一个延迟构造的适配器，
//! 数据可以在进出适配器前后经过一条有序、双向的策略链。

#[allow(clippy::module_inception)]
pub mod adaptable;
pub mod environment;
pub mod error;
pub mod strategy;
pub mod test_mode;

// 重新导出公共 API
pub use adaptable::{Adaptable, AdaptableOptions, Configuration};
pub use environment::{EnvVarEnvironment, Environment, FixedEnvironment, DEFAULT_ENVIRONMENTS};
pub use error::{AdaptableError, Result};
pub use strategy::{ApplyOptions, Mode, Strategy, StrategyChain, StrategyFailure};
pub use test_mode::{TestMode, TestModeFlag};
