//! Serde helpers for byte fields stored as standard base64 strings.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<Vec<u8>>,
{
    let text = String::deserialize(deserializer)?;
    let raw = STANDARD.decode(text.as_bytes()).map_err(de::Error::custom)?;
    let len = raw.len();
    T::try_from(raw).map_err(|_| de::Error::custom(format!("unexpected byte length {}", len)))
}
