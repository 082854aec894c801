use anyhow::{anyhow, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::adaptable::Strategy;

/// Base64 策略配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Base64Config {
    /// 使用 URL 安全字符集且不补齐
    pub url_safe: bool,
}

/// 对字符串做 Base64 编码，读取时解码
pub struct Base64 {
    config: Base64Config,
}

impl Base64 {
    pub fn new(config: Base64Config) -> Self {
        Self { config }
    }

    fn engine(&self) -> &'static base64::engine::GeneralPurpose {
        if self.config.url_safe {
            &URL_SAFE_NO_PAD
        } else {
            &STANDARD
        }
    }
}

impl Strategy for Base64 {
    fn write(&self, data: JsonValue, _options: &JsonMap<String, JsonValue>) -> Result<JsonValue> {
        match data {
            JsonValue::String(text) => Ok(JsonValue::String(self.engine().encode(text.as_bytes()))),
            other => Err(anyhow!("expected string, got `{}`", other)),
        }
    }

    fn read(&self, data: JsonValue, _options: &JsonMap<String, JsonValue>) -> Result<JsonValue> {
        let encoded = data
            .as_str()
            .ok_or_else(|| anyhow!("expected base64 string, got `{}`", data))?;
        let bytes = self.engine().decode(encoded)?;
        Ok(JsonValue::String(String::from_utf8(bytes)?))
    }
}

crate::impl_from!(Base64Config => Base64);
crate::impl_box_from!(Base64 => dyn Strategy);
