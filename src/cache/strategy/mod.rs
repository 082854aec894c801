pub mod base64;
pub mod serializer;

pub use self::base64::{Base64, Base64Config};
pub use self::serializer::{Serializer, SerializerConfig};
