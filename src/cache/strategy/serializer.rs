use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::adaptable::Strategy;

/// Serializer 策略配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerializerConfig {
    /// 是否格式化输出（美化 JSON）
    pub pretty: bool,
}

/// 将任意数据序列化为 JSON 文本，读取时还原
pub struct Serializer {
    config: SerializerConfig,
}

impl Serializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }
}

impl Strategy for Serializer {
    fn write(&self, data: JsonValue, _options: &JsonMap<String, JsonValue>) -> Result<JsonValue> {
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&data)?
        } else {
            serde_json::to_string(&data)?
        };
        Ok(JsonValue::String(text))
    }

    fn read(&self, data: JsonValue, _options: &JsonMap<String, JsonValue>) -> Result<JsonValue> {
        match data {
            JsonValue::String(text) => Ok(serde_json::from_str(&text)?),
            other => Err(anyhow!("expected serialized string, got `{}`", other)),
        }
    }
}

crate::impl_from!(SerializerConfig => Serializer);
crate::impl_box_from!(Serializer => dyn Strategy);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializer_write() -> Result<()> {
        let serializer = Serializer::new(SerializerConfig::default());
        let written = serializer.write(json!({ "some": "data" }), &JsonMap::new())?;
        assert_eq!(written, json!(r#"{"some":"data"}"#));
        Ok(())
    }

    #[test]
    fn test_serializer_pretty() -> Result<()> {
        let serializer = Serializer::new(SerializerConfig { pretty: true });
        let written = serializer.write(json!({ "some": "data" }), &JsonMap::new())?;
        assert!(written.as_str().unwrap().contains('\n'));

        let read = serializer.read(written, &JsonMap::new())?;
        assert_eq!(read, json!({ "some": "data" }));
        Ok(())
    }

    #[test]
    fn test_serializer_read_invalid() {
        let serializer = Serializer::new(SerializerConfig::default());
        assert!(serializer.read(json!(42), &JsonMap::new()).is_err());
        assert!(serializer.read(json!("{broken"), &JsonMap::new()).is_err());
    }
}
