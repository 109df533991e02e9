//! This module defines `BucketKey`, the identifier of one reporting interval.

use std::{cmp::Ordering, fmt};

use serde::{Serialize, Serializer};

/// An opaque, totally ordered identifier for one reporting interval (a minute
/// or hour label as produced upstream).
///
/// The key is never interpreted as a calendar value. A token that is the
/// canonical decimal rendering of an integer (e.g. an epoch or a bucket index)
/// orders numerically, so `"9" < "10"`. Every other token orders lexically,
/// which keeps zero-padded labels such as `"00:59"` or
/// `"2024-05-01 10:00:00"` in chronological order. Integer keys sort before
/// label keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketKey {
    /// A key whose token is a canonical integer.
    Ordinal(i64),
    /// Any other, non-empty label.
    Label(String),
}

impl BucketKey {
    /// Builds a key from a raw token. Surrounding whitespace is ignored.
    ///
    /// Returns `None` for an empty token.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match token.parse::<i64>() {
            // "007" and "+7" stay labels so the key renders exactly as received.
            Ok(n) if n.to_string() == token => Some(Self::Ordinal(n)),
            _ => Some(Self::Label(token.to_string())),
        }
    }
}

impl Ord for BucketKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Ordinal(a), Self::Ordinal(b)) => a.cmp(b),
            (Self::Label(a), Self::Label(b)) => a.cmp(b),
            (Self::Ordinal(_), Self::Label(_)) => Ordering::Less,
            (Self::Label(_), Self::Ordinal(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for BucketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(n) => write!(f, "{n}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&str> for BucketKey {
    /// Convenience conversion for callers holding a known-good token.
    ///
    /// An empty token becomes an empty label rather than failing.
    fn from(token: &str) -> Self {
        Self::parse(token).unwrap_or_else(|| Self::Label(String::new()))
    }
}

impl From<i64> for BucketKey {
    fn from(n: i64) -> Self {
        Self::Ordinal(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_integer_is_ordinal() {
        assert_eq!(BucketKey::parse("42"), Some(BucketKey::Ordinal(42)));
        assert_eq!(BucketKey::parse(" -3 "), Some(BucketKey::Ordinal(-3)));
    }

    #[test]
    fn test_parse_non_canonical_integer_stays_label() {
        assert_eq!(BucketKey::parse("007"), Some(BucketKey::Label("007".into())));
        assert_eq!(BucketKey::parse("+7"), Some(BucketKey::Label("+7".into())));
    }

    #[test]
    fn test_parse_empty_token_is_none() {
        assert_eq!(BucketKey::parse(""), None);
        assert_eq!(BucketKey::parse("   "), None);
    }

    #[test]
    fn test_ordinals_order_numerically() {
        assert!(BucketKey::from("9") < BucketKey::from("10"));
    }

    #[test]
    fn test_labels_order_lexically() {
        assert!(BucketKey::from("00:59") < BucketKey::from("01:00"));
        assert!(BucketKey::from("2024-05-01 09:00:00") < BucketKey::from("2024-05-01 10:00:00"));
    }

    #[test]
    fn test_ordinals_sort_before_labels() {
        assert!(BucketKey::from("999999") < BucketKey::from("00:00"));
    }

    #[test]
    fn test_display_and_serialize_keep_original_token() {
        let key = BucketKey::from("00:01");
        assert_eq!(key.to_string(), "00:01");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""00:01""#);
        assert_eq!(serde_json::to_string(&BucketKey::from(12i64)).unwrap(), r#""12""#);
    }
}
