//! Shared helpers for request normalisation and store value decoding.
//!
//! - `non_blank`: empty or whitespace-only strings count as "not provided"
//! - `deserialize_u64_lenient`: ClickHouse may quote 64-bit integers in JSON output,
//!   so counters are accepted both as numbers and as numeric strings.

use serde::de::{self, Deserializer, Visitor};

/// Trim a string and drop it if nothing is left.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Owned variant of [`non_blank`] for values taken out of a request.
pub(crate) fn non_blank_owned(value: Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(str::to_string)
}

/// Deserialize a `u64` from either a JSON number or a numeric string.
pub(crate) fn deserialize_u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientU64;

    impl Visitor<'_> for LenientU64 {
        type Value = u64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an unsigned integer or a string containing one")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative count {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid count '{}'", v)))
        }
    }

    deserializer.deserialize_any(LenientU64)
}
