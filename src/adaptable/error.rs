use thiserror::Error;

use super::strategy::StrategyFailure;

/// 可适配类型的统一错误类型
///
/// 均为配置或调用方错误，立即返回，不做重试。
#[derive(Error, Debug)]
pub enum AdaptableError {
    #[error("Configuration `{name}` has not been defined.")]
    ConfigurationNotFound { name: String },

    #[error("No adapter set for configuration in class `{class}`.")]
    NoAdapterSet { name: String, class: String },

    #[error("Could not find adapter `{adapter}` in class `{class}`.")]
    AdapterNotFound { adapter: String, class: String },

    #[error("Could not find strategy `{strategy}` in class `{class}`.")]
    StrategyNotFound { strategy: String, class: String },

    #[error("Could not construct adapter `{adapter}` for configuration `{name}`: {source}")]
    AdapterConstruction {
        name: String,
        adapter: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Could not construct strategy `{strategy}` for configuration `{name}`: {source}")]
    StrategyConstruction {
        name: String,
        strategy: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration `{name}`: {source}")]
    StrategyFailed {
        name: String,
        #[source]
        source: StrategyFailure,
    },

    #[error("Invalid configuration `{name}`: {reason}")]
    InvalidConfiguration { name: String, reason: String },

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type Result<T> = std::result::Result<T, AdaptableError>;
