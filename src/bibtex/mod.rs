pub mod serializer;
pub mod validator;

pub use serializer::{OptionalFields, serialize_entry};
