use serde::{Deserialize, Serialize};

use super::AttributeValue;

/// The scalar types a key attribute may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Number,
    Binary,
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "S"),
            Self::Number => write!(f, "N"),
            Self::Binary => write!(f, "B"),
        }
    }
}

/// A domain type usable as a hash or range key.
///
/// The associated `SCALAR_TYPE` lets accessors check, once at construction,
/// that the declared key attribute and the caller's key type agree.
pub trait KeyValue: Send + Sync {
    /// Store-native scalar type this domain type maps to.
    const SCALAR_TYPE: ScalarType;

    /// Converts the value into its store-native form.
    fn to_attribute_value(&self) -> AttributeValue;
}

impl KeyValue for String {
    const SCALAR_TYPE: ScalarType = ScalarType::String;

    fn to_attribute_value(&self) -> AttributeValue {
        AttributeValue::S(self.clone())
    }
}

impl KeyValue for &str {
    const SCALAR_TYPE: ScalarType = ScalarType::String;

    fn to_attribute_value(&self) -> AttributeValue {
        AttributeValue::S((*self).to_string())
    }
}

impl KeyValue for Vec<u8> {
    const SCALAR_TYPE: ScalarType = ScalarType::Binary;

    fn to_attribute_value(&self) -> AttributeValue {
        AttributeValue::B(self.clone())
    }
}

macro_rules! number_key {
    ($($ty:ty),*) => {
        $(
            impl KeyValue for $ty {
                const SCALAR_TYPE: ScalarType = ScalarType::Number;

                fn to_attribute_value(&self) -> AttributeValue {
                    AttributeValue::N(self.to_string())
                }
            }
        )*
    };
}

number_key!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_keys() {
        assert_eq!(String::SCALAR_TYPE, ScalarType::String);
        assert_eq!(
            "abc".to_attribute_value(),
            AttributeValue::S("abc".to_string())
        );
    }

    #[test]
    fn test_number_keys() {
        assert_eq!(<i64 as KeyValue>::SCALAR_TYPE, ScalarType::Number);
        assert_eq!(100_i64.to_attribute_value(), AttributeValue::N("100".into()));
    }

    #[test]
    fn test_binary_keys() {
        assert_eq!(<Vec<u8> as KeyValue>::SCALAR_TYPE, ScalarType::Binary);
        assert_eq!(
            vec![1_u8, 2].to_attribute_value(),
            AttributeValue::B(vec![1, 2])
        );
    }

    #[test]
    fn test_scalar_type_display() {
        assert_eq!(ScalarType::String.to_string(), "S");
        assert_eq!(ScalarType::Number.to_string(), "N");
        assert_eq!(ScalarType::Binary.to_string(), "B");
    }
}
