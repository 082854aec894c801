use anyhow::Result;

use crate::adaptable::Strategy;
use crate::cfg::Factory;

use super::adapter::{CacheAdapter, Memory, MemoryConfig};
use super::strategy::{Base64, Base64Config, Serializer, SerializerConfig};

/// 注册所有内置缓存适配器
///
/// # 注册的类型
/// - `Memory` - 进程内缓存
///
/// 在适配器命名空间下注册，配置中可写短名 `Memory` 或完整引用。
pub fn register_adapters(factory: &Factory<dyn CacheAdapter>) -> Result<()> {
    factory.register_with_probe::<Memory, MemoryConfig>(&factory.qualify("Memory"), Memory::enabled)?;
    Ok(())
}

/// 注册所有内置缓存策略
///
/// # 注册的类型
/// - `Serializer` - JSON 序列化
/// - `Base64` - Base64 编码
pub fn register_strategies(factory: &Factory<dyn Strategy>) -> Result<()> {
    factory.register_with_name::<Serializer, SerializerConfig>(&factory.qualify("Serializer"))?;
    factory.register_with_name::<Base64, Base64Config>(&factory.qualify("Base64"))?;
    Ok(())
}
