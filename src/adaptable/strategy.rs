//! 策略链
//!
//! 策略是可逆的数据变换插件，按声明顺序组成双端链表。
//! 写入时从前往后（FIFO）执行 `write`，读取时从后往前（LIFO）执行 `read`，
//! 这样 `[A, B, C]` 写入为 A→B→C，读取为 C→B→A，正好互逆。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// 可逆数据变换插件
pub trait Strategy: Send + Sync {
    /// 正向变换
    fn write(&self, data: JsonValue, options: &JsonMap<String, JsonValue>) -> Result<JsonValue>;

    /// 逆向变换
    fn read(&self, data: JsonValue, options: &JsonMap<String, JsonValue>) -> Result<JsonValue>;
}

/// 读类方法名：以 `read` 开头
pub fn is_read_method(method: &str) -> bool {
    method.starts_with("read")
}

/// 策略链遍历方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// 从前往后
    Fifo,
    /// 从后往前
    Lifo,
}

impl Mode {
    /// 未显式指定方向时，根据方法名推断
    pub fn infer(method: &str) -> Self {
        if is_read_method(method) {
            Mode::Lifo
        } else {
            Mode::Fifo
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Fifo => write!(f, "FIFO"),
            Mode::Lifo => write!(f, "LIFO"),
        }
    }
}

/// `apply_strategies` 的选项
///
/// `mode` 控制遍历方向，其余选项原样传给每个策略。
/// 可以直接从选项记录反序列化：`{"mode": "LIFO", "ttl": 60}`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(flatten)]
    pub options: JsonMap<String, JsonValue>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

impl TryFrom<JsonValue> for ApplyOptions {
    type Error = serde_json::Error;

    fn try_from(value: JsonValue) -> std::result::Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

/// 策略执行失败
#[derive(Error, Debug)]
#[error("strategy `{strategy}` failed to {method}: {source}")]
pub struct StrategyFailure {
    pub strategy: String,
    pub method: String,
    #[source]
    pub source: anyhow::Error,
}

struct Link {
    reference: String,
    strategy: Box<dyn Strategy>,
}

impl Link {
    fn entry(&self) -> (&str, &dyn Strategy) {
        (self.reference.as_str(), self.strategy.as_ref())
    }
}

/// 有序双端策略链，构建完成后只读
#[derive(Default)]
pub struct StrategyChain {
    links: VecDeque<Link>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, reference: impl Into<String>, strategy: Box<dyn Strategy>) {
        self.links.push_back(Link {
            reference: reference.into(),
            strategy,
        });
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// 最后加入的策略
    pub fn top(&self) -> Option<&dyn Strategy> {
        self.links.back().map(|link| link.entry().1)
    }

    /// 最后加入的策略的引用名
    pub fn top_reference(&self) -> Option<&str> {
        self.links.back().map(|link| link.reference.as_str())
    }

    /// 按声明顺序的引用名
    pub fn references(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.reference.as_str()).collect()
    }

    /// 从前往后遍历，可 `.rev()` 反向
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &dyn Strategy)> + '_ {
        self.links.iter().map(Link::entry)
    }

    fn traverse(&self, mode: Mode) -> Box<dyn Iterator<Item = &Link> + '_> {
        match mode {
            Mode::Fifo => Box::new(self.links.iter()),
            Mode::Lifo => Box::new(self.links.iter().rev()),
        }
    }

    /// 依次执行策略，上一个的输出作为下一个的输入
    ///
    /// 方法名以 `read` 开头时调用 `read`，否则调用 `write`；
    /// `options.mode` 未指定时方向同样由方法名推断。
    pub fn apply(
        &self,
        method: &str,
        data: JsonValue,
        options: &ApplyOptions,
    ) -> std::result::Result<JsonValue, StrategyFailure> {
        let mode = options.mode.unwrap_or_else(|| Mode::infer(method));
        let read = is_read_method(method);

        self.traverse(mode).try_fold(data, |data, link| {
            let result = if read {
                link.strategy.read(data, &options.options)
            } else {
                link.strategy.write(data, &options.options)
            };
            result.map_err(|source| StrategyFailure {
                strategy: link.reference.clone(),
                method: method.to_string(),
                source,
            })
        })
    }
}

impl fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyChain")
            .field("strategies", &self.references())
            .finish()
    }
}
