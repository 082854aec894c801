//! 运行环境解析
//!
//! 配置写入时按当前环境折叠分支：`{development: X, test: Y}` 在 test 环境下变为 `Y`。

use serde_json::Value as JsonValue;

use crate::cfg::ConfigRecord;

/// 默认识别的环境名
pub const DEFAULT_ENVIRONMENTS: [&str; 3] = ["development", "test", "production"];

/// 提供当前环境名
pub trait Environment: Send + Sync {
    fn current(&self) -> String;
}

/// 固定环境名
#[derive(Debug, Clone)]
pub struct FixedEnvironment(String);

impl FixedEnvironment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Environment for FixedEnvironment {
    fn current(&self) -> String {
        self.0.clone()
    }
}

/// 从进程环境变量读取环境名，未设置时使用 fallback
#[derive(Debug, Clone)]
pub struct EnvVarEnvironment {
    var: String,
    fallback: String,
}

impl EnvVarEnvironment {
    pub fn new(var: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            fallback: fallback.into(),
        }
    }
}

impl Environment for EnvVarEnvironment {
    fn current(&self) -> String {
        match std::env::var(&self.var) {
            Ok(name) if !name.is_empty() => name,
            _ => self.fallback.clone(),
        }
    }
}

impl<F> Environment for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current(&self) -> String {
        self()
    }
}

/// 将原始配置解析为当前环境下的配置记录
///
/// - `[record, ...]`：已解析形式，直接取第一项
/// - 含有环境键的记录：取 `active` 对应分支，丢弃其它分支和同级字段；
///   没有 `active` 分支时保留去掉所有环境分支后的同级字段
/// - 不含环境键的记录：原样返回
pub fn resolve(
    raw: JsonValue,
    environments: &[String],
    active: &str,
) -> Result<ConfigRecord, String> {
    let mut map = match raw {
        JsonValue::Object(map) => map,
        JsonValue::Array(items) => {
            return match items.into_iter().next() {
                Some(JsonValue::Object(record)) => Ok(record.into()),
                Some(other) => Err(format!("expected a record as first element, got `{}`", other)),
                None => Err("empty configuration list".to_string()),
            };
        }
        other => return Err(format!("expected a record, got `{}`", other)),
    };

    let is_environment = |key: &str| environments.iter().any(|env| env == key);
    if !map.keys().any(|key| is_environment(key)) {
        return Ok(map.into());
    }

    if let Some(branch) = map.remove(active) {
        return match branch {
            JsonValue::Object(record) => Ok(record.into()),
            other => Err(format!("environment `{}` is not a record: `{}`", active, other)),
        };
    }

    map.retain(|key, _| !is_environment(key));
    Ok(map.into())
}
