// 配置记录及其加载

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::path::Path;

pub const NAME_KEY: &str = "name";
pub const ADAPTER_KEY: &str = "adapter";
pub const FILTERS_KEY: &str = "filters";
pub const STRATEGIES_KEY: &str = "strategies";

/// 单个命名配置（已完成环境解析）
///
/// 保留原始字段及其顺序，`adapter`、`filters`、`strategies` 之外的字段原样传给适配器构造函数。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigRecord(JsonMap<String, JsonValue>);

impl ConfigRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置字段，便于构造配置
    pub fn with(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &JsonMap<String, JsonValue> {
        &self.0
    }

    pub fn into_map(self) -> JsonMap<String, JsonValue> {
        self.0
    }

    /// 适配器引用，字段缺失或为 null 时返回 None
    pub fn adapter(&self) -> Option<String> {
        match self.0.get(ADAPTER_KEY) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(reference)) => Some(reference.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// 过滤器列表，原样透传
    pub fn filters(&self) -> &[JsonValue] {
        match self.0.get(FILTERS_KEY) {
            Some(JsonValue::Array(filters)) => filters,
            _ => &[],
        }
    }

    /// 是否声明了 strategies 字段（空列表也算声明）
    pub fn has_strategies(&self) -> bool {
        self.0.contains_key(STRATEGIES_KEY)
    }

    /// 解析 strategies 字段
    ///
    /// - 字段缺失返回 `None`
    /// - 列表：每项为裸引用 `"Ref"` 或单键映射 `{"Ref": {...}}`
    /// - 映射：`{"RefA": {...}, "RefB": null}`，按声明顺序展开
    pub fn strategies(&self) -> Result<Option<Vec<StrategySpec>>> {
        let value = match self.0.get(STRATEGIES_KEY) {
            Some(value) => value,
            None => return Ok(None),
        };

        let specs = match value {
            JsonValue::Null => Vec::new(),
            JsonValue::Array(entries) => entries
                .iter()
                .map(StrategySpec::from_entry)
                .collect::<Result<Vec<_>>>()?,
            JsonValue::Object(entries) => entries
                .iter()
                .map(|(reference, params)| StrategySpec::with_params(reference, params.clone()))
                .collect(),
            JsonValue::String(reference) => vec![StrategySpec::bare(reference)],
            other => return Err(anyhow!("invalid strategies `{}`", other)),
        };
        Ok(Some(specs))
    }

    /// 适配器构造参数：去掉 `name` 后的全部字段
    pub fn to_options(&self) -> JsonValue {
        let mut options = self.0.clone();
        options.remove(NAME_KEY);
        JsonValue::Object(options)
    }
}

impl From<JsonMap<String, JsonValue>> for ConfigRecord {
    fn from(map: JsonMap<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl TryFrom<JsonValue> for ConfigRecord {
    type Error = anyhow::Error;

    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            other => Err(anyhow!("expected a configuration record, got `{}`", other)),
        }
    }
}

/// strategies 列表中的一项
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySpec {
    /// 策略引用（完整引用或短名）
    pub reference: String,
    /// 构造参数，裸引用时为空对象
    pub params: JsonValue,
}

impl StrategySpec {
    pub fn bare(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            params: JsonValue::Object(JsonMap::new()),
        }
    }

    pub fn with_params(reference: &str, params: JsonValue) -> Self {
        match params {
            JsonValue::Null => Self::bare(reference),
            params => Self {
                reference: reference.to_string(),
                params,
            },
        }
    }

    fn from_entry(entry: &JsonValue) -> Result<Self> {
        match entry {
            JsonValue::String(reference) => Ok(Self::bare(reference)),
            JsonValue::Object(map) if map.len() == 1 => {
                let (reference, params) = map
                    .iter()
                    .next()
                    .ok_or_else(|| anyhow!("empty strategy entry"))?;
                Ok(Self::with_params(reference, params.clone()))
            }
            other => Err(anyhow!("invalid strategy entry `{}`", other)),
        }
    }
}

/// 原始配置集合：名称 → 未经环境解析的配置
///
/// 每个值可以是普通记录、按环境分支的记录，或 `[record]` 形式的已解析记录。
///
/// # 示例
/// ```ignore
/// let configs = Configs::from_yaml(r#"
/// default:
///   adapter: Memory
///   strategies: [Serializer, Base64]
/// "#)?;
/// cache.set_config(configs)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configs(JsonMap<String, JsonValue>);

impl Configs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 从 JSON 字符串创建（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(json5::from_str(json_str)?)
    }

    /// 从 YAML 字符串创建
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// 从 TOML 字符串创建
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// 从文件加载，根据扩展名选择解析器
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| anyhow!("无法识别的配置文件: {}", path.display()))?;
        let content = std::fs::read_to_string(path)?;

        match ext {
            "json" | "json5" => Self::from_json(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "toml" => Self::from_toml(&content),
            _ => Err(anyhow!("不支持的文件格式: {}", ext)),
        }
    }

    /// 导出为 JSON 字符串
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl IntoIterator for Configs {
    type Item = (String, JsonValue);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, JsonValue)> for Configs {
    fn from_iter<I: IntoIterator<Item = (K, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn record(value: JsonValue) -> ConfigRecord {
        ConfigRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_adapter_reference() {
        assert_eq!(
            record(json!({ "adapter": "Memory" })).adapter(),
            Some("Memory".to_string())
        );
        assert_eq!(record(json!({ "adapter": null })).adapter(), None);
        assert_eq!(record(json!({ "filters": [] })).adapter(), None);
    }

    #[test]
    fn test_filters_pass_through() {
        let record = record(json!({ "filters": ["filter1", "filter2"] }));
        assert_eq!(record.filters(), &[json!("filter1"), json!("filter2")]);
    }

    #[test]
    fn test_strategies_absent_and_empty() -> Result<()> {
        assert_eq!(record(json!({ "adapter": null })).strategies()?, None);
        assert_eq!(record(json!({ "strategies": [] })).strategies()?, Some(vec![]));
        assert!(record(json!({ "strategies": [] })).has_strategies());
        Ok(())
    }

    #[test]
    fn test_strategies_list_entries() -> Result<()> {
        let record = record(json!({
            "strategies": ["Serializer", { "Configurizer": { "key1": "value1" } }]
        }));

        let specs = record.strategies()?.unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0], StrategySpec::bare("Serializer"));
        assert_eq!(specs[1].reference, "Configurizer");
        assert_eq!(specs[1].params, json!({ "key1": "value1" }));
        Ok(())
    }

    #[test]
    fn test_strategies_map_keeps_declaration_order() -> Result<()> {
        let record = record(json!({
            "strategies": { "Serializer": null, "Base64": { "url_safe": true } }
        }));

        let specs = record.strategies()?.unwrap();
        let references: Vec<&str> = specs.iter().map(|s| s.reference.as_str()).collect();
        assert_eq!(references, vec!["Serializer", "Base64"]);
        assert_eq!(specs[0].params, json!({}));
        Ok(())
    }

    #[test]
    fn test_invalid_strategy_entry() {
        let scalar = record(json!({ "strategies": [42] }));
        assert!(scalar.strategies().is_err());

        let ambiguous = record(json!({ "strategies": [{ "A": {}, "B": {} }] }));
        assert!(ambiguous.strategies().is_err());
    }

    #[test]
    fn test_to_options_drops_name() {
        let record = record(json!({ "name": "default", "adapter": "Memory", "filters": [] }));
        assert_eq!(record.to_options(), json!({ "adapter": "Memory", "filters": [] }));
    }

    #[test]
    fn test_try_from_non_object() {
        assert!(ConfigRecord::try_from(json!("Memory")).is_err());
    }

    #[test]
    fn test_configs_from_json5() -> Result<()> {
        let configs = Configs::from_json(
            r#"{
                // 默认缓存
                default: { adapter: 'Memory', filters: [] },
            }"#,
        )?;

        assert_eq!(configs.len(), 1);
        assert_eq!(
            configs.get("default"),
            Some(&json!({ "adapter": "Memory", "filters": [] }))
        );
        Ok(())
    }

    #[test]
    fn test_configs_from_yaml() -> Result<()> {
        let configs = Configs::from_yaml(
            r#"
default:
  adapter: Memory
  strategies:
    - Serializer
    - Base64
"#,
        )?;

        assert_eq!(
            configs.get("default"),
            Some(&json!({ "adapter": "Memory", "strategies": ["Serializer", "Base64"] }))
        );
        Ok(())
    }

    #[test]
    fn test_configs_from_toml() -> Result<()> {
        let configs = Configs::from_toml(
            r#"
[default.development]
adapter = "Memory"

[default.production]
adapter = "Redis"
"#,
        )?;

        assert_eq!(
            configs.get("default"),
            Some(&json!({
                "development": { "adapter": "Memory" },
                "production": { "adapter": "Redis" }
            }))
        );
        Ok(())
    }

    #[test]
    fn test_configs_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("cache.yaml");
        fs::write(&path, "session:\n  adapter: Memory\n")?;

        let configs = Configs::from_file(&path)?;
        assert_eq!(configs.get("session"), Some(&json!({ "adapter": "Memory" })));
        Ok(())
    }

    #[test]
    fn test_configs_from_file_unsupported() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("cache.ini");
        fs::write(&path, "adapter=Memory")?;

        let result = Configs::from_file(&path);
        assert!(result.unwrap_err().to_string().contains("不支持的文件格式"));
        Ok(())
    }

    #[test]
    fn test_configs_iteration_order() {
        let configs: Configs = vec![("b", json!({})), ("a", json!({}))].into_iter().collect();
        let names: Vec<String> = configs.into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);
    }
}
