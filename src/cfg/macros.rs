//! 工厂注册相关的宏定义
//!
//! `Factory::register*` 要求实现类型满足 `From<Config>` 且 `Box<T>: Into<Box<dyn Trait>>`，
//! 这里的两个宏用来省掉这两段样板代码。

/// 为配置类型实现 From trait
///
/// 支持两种模式：
/// 1. `impl_from!(ConfigType => Type)` - 调用 Type::new(config)
/// 2. `impl_from!(ConfigType => Type, field: config)` - 使用 Self { config }
#[macro_export]
macro_rules! impl_from {
    ($config_type:ty => $target_type:ty) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                <$target_type>::new(config)
            }
        }
    };

    ($config_type:ty => $target_type:ty, field: $field:ident) => {
        impl From<$config_type> for $target_type {
            fn from(config: $config_type) -> Self {
                Self { $field: config }
            }
        }
    };
}

/// 实现 Box<T> 到 Box<dyn Trait> 的转换，供工厂表构造 trait object
///
/// 用法：`impl_box_from!(Memory => dyn CacheAdapter)`
#[macro_export]
macro_rules! impl_box_from {
    ($source_type:ty => dyn $trait_name:path) => {
        impl From<Box<$source_type>> for Box<dyn $trait_name> {
            fn from(source: Box<$source_type>) -> Self {
                source as Box<dyn $trait_name>
            }
        }
    };
}
