//! cfg 模块 - 配置记录与类型工厂
//!
//! 提供配置记录的加载（JSON5/YAML/TOML）以及按引用名构造 trait object 的工厂表

#[macro_use]
pub mod macros;
pub mod record;
pub mod registry;

// 重新导出公共 API
pub use record::{ConfigRecord, Configs, StrategySpec};
pub use registry::{short_type_name, Factory, Probe, Registration};
