use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TypeError, TypeResult};

/// Scalar identity of a stored object.
///
/// Backends key objects either by an integer sequence or by an opaque string.
/// Numeric strings are always normalized to [`ObjectId::Int`] so that `"42"`
/// and `42` name the same object. Empty strings and `0` are not identities;
/// the constructors return `None` for them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    /// Integer key (auto-increment style).
    Int(i64),
    /// Opaque string key (slug, UUID, ...).
    Str(String),
}

impl ObjectId {
    /// Parse raw text into an identity.
    ///
    /// Leading/trailing whitespace is ignored. Integer text becomes
    /// [`ObjectId::Int`]; blank text and `"0"` yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(0) => None,
            Ok(n) => Some(Self::Int(n)),
            Err(_) => Some(Self::Str(trimmed.to_string())),
        }
    }

    /// Normalize an existing identity, dropping blank values.
    pub fn normalize(self) -> Option<Self> {
        match self {
            Self::Int(0) => None,
            Self::Int(n) => Some(Self::Int(n)),
            Self::Str(s) => Self::parse(&s),
        }
    }

    /// Generate a fresh time-ordered string identity (UUID v7).
    pub fn generate() -> Self {
        Self::Str(uuid::Uuid::now_v7().to_string())
    }

    /// Read an identity out of a dynamic JSON value.
    ///
    /// `null` is "no identity". Numbers must be integral; booleans, arrays
    /// and objects are rejected.
    pub fn from_value(value: &Value) -> TypeResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i).normalize()),
                None => Err(TypeError::NonScalarId(format!("non-integral number {n}"))),
            },
            Value::String(s) => Ok(Self::parse(s)),
            Value::Bool(_) => Err(TypeError::NonScalarId("boolean".into())),
            Value::Array(_) => Err(TypeError::NonScalarId("array".into())),
            Value::Object(_) => Err(TypeError::NonScalarId("object".into())),
        }
    }

    /// Convert to a JSON value suitable for a record field or query filter.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::String(s.clone()),
        }
    }

    /// Integer form, if this is an integer key.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "ObjectId({n})"),
            Self::Str(s) => write!(f, "ObjectId({s:?})"),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ObjectId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ObjectId {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Str(s.to_string()),
        }
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_become_integers() {
        assert_eq!(ObjectId::parse("42"), Some(ObjectId::Int(42)));
        assert_eq!(ObjectId::parse(" 7 "), Some(ObjectId::Int(7)));
        assert_eq!(ObjectId::from("13"), ObjectId::Int(13));
    }

    #[test]
    fn blank_and_zero_are_absent() {
        assert_eq!(ObjectId::parse(""), None);
        assert_eq!(ObjectId::parse("   "), None);
        assert_eq!(ObjectId::parse("0"), None);
        assert_eq!(ObjectId::Int(0).normalize(), None);
        assert_eq!(ObjectId::Str(String::new()).normalize(), None);
    }

    #[test]
    fn string_keys_are_kept() {
        assert_eq!(
            ObjectId::parse("about-us"),
            Some(ObjectId::Str("about-us".into()))
        );
    }

    #[test]
    fn from_value_accepts_scalars() {
        assert_eq!(ObjectId::from_value(&json!(5)).unwrap(), Some(ObjectId::Int(5)));
        assert_eq!(ObjectId::from_value(&json!("5")).unwrap(), Some(ObjectId::Int(5)));
        assert_eq!(ObjectId::from_value(&json!(null)).unwrap(), None);
        assert_eq!(ObjectId::from_value(&json!(0)).unwrap(), None);
    }

    #[test]
    fn from_value_rejects_non_scalars() {
        assert!(ObjectId::from_value(&json!([1, 2])).is_err());
        assert!(ObjectId::from_value(&json!({"id": 1})).is_err());
        assert!(ObjectId::from_value(&json!(true)).is_err());
        assert!(ObjectId::from_value(&json!(1.5)).is_err());
    }

    #[test]
    fn generated_ids_are_distinct_strings() {
        let a = ObjectId::generate();
        let b = ObjectId::generate();
        assert_ne!(a, b);
        assert!(a.as_int().is_none());
    }

    #[test]
    fn display_is_bare_value() {
        assert_eq!(ObjectId::Int(9).to_string(), "9");
        assert_eq!(ObjectId::Str("x".into()).to_string(), "x");
    }

    proptest::proptest! {
        #[test]
        fn integer_text_parses_to_same_integer(n in proptest::num::i64::ANY) {
            let parsed = ObjectId::parse(&n.to_string());
            if n == 0 {
                proptest::prop_assert_eq!(parsed, None);
            } else {
                proptest::prop_assert_eq!(parsed, Some(ObjectId::Int(n)));
            }
        }
    }

    #[test]
    fn serde_is_untagged() {
        assert_eq!(serde_json::to_value(ObjectId::Int(3)).unwrap(), json!(3));
        let parsed: ObjectId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(parsed, ObjectId::Str("abc".into()));
    }
}
