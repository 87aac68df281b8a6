//! Conversions between domain values and the scalar columns SQLite stores.
//!
//! Every row read or written by the repositories passes through these
//! functions. Decoding is strict: a value that cannot be decoded is reported as
//! a [`CodecError`] and never replaced with a default.

use std::ops::RangeInclusive;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// ISO 8601 local date-time, no offset. Fractional seconds only when non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Separator used for delimited tag columns
pub const TAG_DELIMITER: char = ',';

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed timestamp in {column}: '{value}'")]
    MalformedTimestamp { column: &'static str, value: String },
    #[error("Unrecognized {kind} value: '{value}'")]
    MalformedEnumeration { kind: &'static str, value: String },
    #[error("Malformed structured list in {column}: {source}")]
    MalformedStructuredList {
        column: &'static str,
        source: serde_json::Error,
    },
    #[error("Out of range value in {column}: {value}")]
    OutOfRange { column: &'static str, value: i64 },
    #[error("Failed to serialize {column}: {source}")]
    Unserializable {
        column: &'static str,
        source: serde_json::Error,
    },
}

/// Current local wall-clock time
pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn encode_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn encode_optional_timestamp(value: Option<&NaiveDateTime>) -> Option<String> {
    value.map(encode_timestamp)
}

/// Decode a stored timestamp. `column` names the source column in the error.
pub fn decode_timestamp(column: &'static str, text: &str) -> Result<NaiveDateTime, CodecError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|_| CodecError::MalformedTimestamp {
        column,
        value: text.to_string(),
    })
}

pub fn decode_optional_timestamp(
    column: &'static str,
    text: Option<&str>,
) -> Result<Option<NaiveDateTime>, CodecError> {
    text.map(|t| decode_timestamp(column, t)).transpose()
}

/// An enumeration persisted as its canonical name
pub trait StorageEnum: Sized + Copy + 'static {
    /// Human readable name of the enumeration, used in error messages
    const KIND: &'static str;
    const VARIANTS: &'static [Self];

    fn name(self) -> &'static str;

    /// Look up a variant by its stored name. Unknown names yield `None`.
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.name() == name)
    }
}

/// Implements [`StorageEnum`] for a plain enum given its variant/name pairs.
macro_rules! storage_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $crate::codec::StorageEnum for $ty {
            const KIND: &'static str = $kind;
            const VARIANTS: &'static [Self] = &[$($ty::$variant),+];

            fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::codec::StorageEnum::name(*self))
            }
        }
    };
}

pub(crate) use storage_enum;

pub fn encode_enum<E: StorageEnum>(value: E) -> &'static str {
    value.name()
}

pub fn decode_enum<E: StorageEnum>(name: &str) -> Option<E> {
    E::from_name(name)
}

/// Decode a stored enumeration that must be recognized.
pub fn require_enum<E: StorageEnum>(name: &str) -> Result<E, CodecError> {
    decode_enum(name).ok_or_else(|| CodecError::MalformedEnumeration {
        kind: E::KIND,
        value: name.to_string(),
    })
}

/// A NULL column decodes to `None`; a present but unknown name is an error.
pub fn require_optional_enum<E: StorageEnum>(name: Option<&str>) -> Result<Option<E>, CodecError> {
    name.map(require_enum).transpose()
}

pub fn encode_list<T: Serialize>(column: &'static str, items: &[T]) -> Result<String, CodecError> {
    serde_json::to_string(items).map_err(|source| CodecError::Unserializable { column, source })
}

/// Decode a JSON list column. An empty list is stored as `[]`; anything that
/// is not a JSON array of `T` is reported, including the empty string.
pub fn decode_list<T: DeserializeOwned>(column: &'static str, text: &str) -> Result<Vec<T>, CodecError> {
    serde_json::from_str(text).map_err(|source| CodecError::MalformedStructuredList { column, source })
}

/// Narrow a stored integer to `T`, rejecting anything outside `range`.
pub fn decode_bounded<T>(column: &'static str, value: i64, range: RangeInclusive<T>) -> Result<T, CodecError>
where
    T: TryFrom<i64> + PartialOrd,
{
    T::try_from(value)
        .ok()
        .filter(|narrowed| range.contains(narrowed))
        .ok_or(CodecError::OutOfRange { column, value })
}

/// Join tags into a single delimited column, dropping blank tags.
/// Callers reject tags that would not survive the trip back.
pub fn encode_delimited(items: &[String]) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(&TAG_DELIMITER.to_string())
}

pub fn decode_delimited(text: &str) -> Vec<String> {
    text.split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Shade {
        Light,
        Dark,
    }

    storage_enum!(Shade, "shade", { Light => "LIGHT", Dark => "DARK" });

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        text: String,
        done: bool,
    }

    fn at(h: u32, m: u32, s: u32, nanos: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_nano_opt(h, m, s, nanos)
            .unwrap()
    }

    #[test]
    fn timestamp_uses_iso_local_format() {
        assert_eq!(encode_timestamp(&at(8, 5, 3, 0)), "2024-03-09T08:05:03");
        assert_eq!(encode_timestamp(&at(8, 5, 3, 250_000_000)), "2024-03-09T08:05:03.250");
    }

    #[test]
    fn timestamp_round_trips_with_sub_second_precision() {
        for nanos in [0, 1, 120_000_000, 123_456_000, 999_999_999] {
            let value = at(23, 59, 59, nanos);
            let decoded = decode_timestamp("created_at", &encode_timestamp(&value)).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let err = decode_timestamp("due_date", "yesterday").unwrap_err();
        match err {
            CodecError::MalformedTimestamp { column, value } => {
                assert_eq!(column, "due_date");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(decode_timestamp("due_date", "2024-03-09 08:05:03+02:00").is_err());
    }

    #[test]
    fn optional_timestamp_passes_null_through() {
        assert_eq!(decode_optional_timestamp("due_date", None).unwrap(), None);
        assert_eq!(encode_optional_timestamp(None), None);
    }

    #[test]
    fn enum_names_decode_and_unknown_names_are_absent() {
        assert_eq!(encode_enum(Shade::Dark), "DARK");
        assert_eq!(decode_enum::<Shade>("LIGHT"), Some(Shade::Light));
        assert_eq!(decode_enum::<Shade>("light"), None);
        assert_eq!(decode_enum::<Shade>("PURPLE"), None);
        assert_eq!(Shade::Light.to_string(), "LIGHT");
    }

    #[test]
    fn required_enum_surfaces_unknown_names() {
        let err = require_enum::<Shade>("PURPLE").unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnumeration { kind: "shade", .. }));
        assert_eq!(require_optional_enum::<Shade>(None).unwrap(), None);
    }

    #[test]
    fn empty_list_is_distinct_from_malformed_list() {
        let empty: Vec<Item> = Vec::new();
        let encoded = encode_list("checklists", &empty).unwrap();
        assert_eq!(encoded, "[]");
        assert!(decode_list::<Item>("checklists", &encoded).unwrap().is_empty());

        for bad in ["", "{not json", "null", "{\"text\":\"x\"}", "[{\"text\":1}]"] {
            let err = decode_list::<Item>("checklists", bad).unwrap_err();
            assert!(
                matches!(err, CodecError::MalformedStructuredList { column: "checklists", .. }),
                "expected malformed list error for {bad:?}"
            );
        }
    }

    #[test]
    fn list_round_trips() {
        let items = vec![
            Item { text: "first".into(), done: false },
            Item { text: "second, with \"quotes\"".into(), done: true },
        ];
        let decoded: Vec<Item> = decode_list("checklists", &encode_list("checklists", &items).unwrap()).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn bounded_integers_reject_out_of_range_values() {
        assert_eq!(decode_bounded("books.rating", 3, 1u8..=5).unwrap(), 3);
        assert_eq!(decode_bounded("books.pages_read", 0, 0..=u32::MAX).unwrap(), 0);
        for (value, range) in [(0, 1u8..=5), (9, 1u8..=5), (-1, 1u8..=5)] {
            let err = decode_bounded("books.rating", value, range).unwrap_err();
            assert!(matches!(err, CodecError::OutOfRange { column: "books.rating", value: v } if v == value));
        }
        assert!(decode_bounded("books.pages_read", 5_000_000_000, 0..=u32::MAX).is_err());
        assert!(decode_bounded("books.total_pages", -5, 0..=u32::MAX).is_err());
    }

    #[test]
    fn delimited_tags_drop_blanks() {
        let tags = vec!["work".to_string(), " ideas ".to_string(), String::new()];
        let encoded = encode_delimited(&tags);
        assert_eq!(encoded, "work,ideas");
        assert_eq!(decode_delimited(&encoded), vec!["work", "ideas"]);
        assert!(decode_delimited("").is_empty());
    }
}
