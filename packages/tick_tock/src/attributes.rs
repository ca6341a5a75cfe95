use std::borrow::Cow;
use std::fmt::{self, Display};

use foldhash::{HashMap, HashMapExt};

use crate::{Error, Result};

/// A value held by [`Attributes`].
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum AttributeValue {
    /// A signed integer.
    I64(i64),
    /// An unsigned integer.
    U64(u64),
    /// A floating point number.
    F64(f64),
    /// A flag.
    Bool(bool),
    /// A string known at compile time.
    Str(&'static str),
    /// A string built at runtime.
    String(String),
}

impl AttributeValue {
    /// Name of the Rust type the value holds, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::I64(_) => i64::TYPE_NAME,
            Self::U64(_) => u64::TYPE_NAME,
            Self::F64(_) => f64::TYPE_NAME,
            Self::Bool(_) => bool::TYPE_NAME,
            Self::Str(_) => <&'static str>::TYPE_NAME,
            Self::String(_) => String::TYPE_NAME,
        }
    }
}

impl Display for AttributeValue {
    #[cfg_attr(test, mutants::skip)] // Cosmetic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::String(v) => f.write_str(v),
        }
    }
}

trait Sealed {}

/// A type that can be stored in [`Attributes`].
///
/// Implemented for `i64`, `u64`, `f64`, `bool`, `&'static str` and `String`.
/// This trait is sealed and cannot be implemented outside this crate.
#[expect(private_bounds, reason = "sealed trait pattern")]
pub trait Attribute: Sized + Sealed {
    /// Name of the type, for error messages.
    const TYPE_NAME: &'static str;

    #[doc(hidden)]
    fn into_value(self) -> AttributeValue;

    #[doc(hidden)]
    fn from_value(value: &AttributeValue) -> Option<Self>;
}

macro_rules! impl_attribute {
    ($type:ty, $variant:ident, $type_name:literal, |$v:ident| $read:expr) => {
        impl Sealed for $type {}

        impl Attribute for $type {
            const TYPE_NAME: &'static str = $type_name;

            fn into_value(self) -> AttributeValue {
                AttributeValue::$variant(self)
            }

            fn from_value(value: &AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$variant($v) => Some($read),
                    _ => None,
                }
            }
        }
    };
}

impl_attribute!(i64, I64, "i64", |v| *v);
impl_attribute!(u64, U64, "u64", |v| *v);
impl_attribute!(f64, F64, "f64", |v| *v);
impl_attribute!(bool, Bool, "bool", |v| *v);
impl_attribute!(&'static str, Str, "&'static str", |v| *v);
impl_attribute!(String, String, "String", |v| v.clone());

/// Named values of a fixed set of types, attached to an [`Engine`][crate::Engine].
///
/// Values are read back with the type they were written with. Reading with another type is
/// an error rather than a conversion.
///
/// # Example
///
/// ```
/// use tick_tock::{Attributes, Error};
///
/// let mut attributes = Attributes::new();
/// attributes.set("iterations", 1000_u64);
/// attributes.set("label", "warm cache");
///
/// assert_eq!(attributes.get::<u64>("iterations").unwrap(), Some(1000));
/// assert_eq!(attributes.get::<u64>("missing").unwrap(), None);
/// assert!(matches!(
///     attributes.get::<i64>("iterations"),
///     Err(Error::AttributeType { .. })
/// ));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Attributes {
    values: HashMap<Cow<'static, str>, AttributeValue>,
}

impl Attributes {
    /// Creates an empty set of attributes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Sets `name` to `value`, returning the value it replaced, if any.
    ///
    /// The new value may be of a different type than the one it replaces.
    pub fn set<T>(&mut self, name: impl Into<Cow<'static, str>>, value: T) -> Option<AttributeValue>
    where
        T: Attribute,
    {
        self.values.insert(name.into(), value.into_value())
    }

    /// The value of `name`, if set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeType`] if `name` holds a value of a type other than `T`.
    pub fn get<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: Attribute,
    {
        let Some(value) = self.values.get(name) else {
            return Ok(None);
        };

        T::from_value(value)
            .map(Some)
            .ok_or_else(|| Error::AttributeType {
                name: name.to_string(),
                expected: T::TYPE_NAME,
            })
    }

    /// The value of `name` regardless of its type, if set.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Removes `name`, returning its value if it was set.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.remove(name)
    }

    /// Iterates over all attributes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(name, value)| (name.as_ref(), value))
    }

    /// Number of attributes set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Attributes: Send, Sync, Clone);

    #[test]
    fn typed_round_trip_per_type() {
        let mut attributes = Attributes::new();

        attributes.set("i", -5_i64);
        attributes.set("u", 5_u64);
        attributes.set("f", 0.5_f64);
        attributes.set("b", true);
        attributes.set("s", "static");
        attributes.set(String::from("owned_name"), String::from("owned"));

        assert_eq!(attributes.get::<i64>("i").unwrap(), Some(-5));
        assert_eq!(attributes.get::<u64>("u").unwrap(), Some(5));
        assert_eq!(attributes.get::<f64>("f").unwrap(), Some(0.5));
        assert_eq!(attributes.get::<bool>("b").unwrap(), Some(true));
        assert_eq!(attributes.get::<&str>("s").unwrap(), Some("static"));
        assert_eq!(
            attributes.get::<String>("owned_name").unwrap().as_deref(),
            Some("owned")
        );
        assert_eq!(attributes.len(), 6);
    }

    #[test]
    fn wrong_type_is_error() {
        let mut attributes = Attributes::new();
        attributes.set("count", 3_u64);

        let error = attributes.get::<bool>("count").unwrap_err();

        assert!(matches!(
            error,
            Error::AttributeType { ref name, expected: "bool" } if name == "count"
        ));
    }

    #[test]
    fn set_replaces_and_returns_previous() {
        let mut attributes = Attributes::new();

        assert_eq!(attributes.set("x", 1_i64), None);
        assert_eq!(attributes.set("x", false), Some(AttributeValue::I64(1)));
        assert_eq!(attributes.value("x"), Some(&AttributeValue::Bool(false)));
    }

    #[test]
    fn remove_and_iter() {
        let mut attributes = Attributes::new();
        attributes.set("a", 1_u64);
        attributes.set("b", 2_u64);

        assert_eq!(attributes.remove("a"), Some(AttributeValue::U64(1)));
        assert_eq!(attributes.remove("a"), None);

        let all = attributes.iter().collect::<Vec<_>>();
        assert_eq!(all, vec![("b", &AttributeValue::U64(2))]);
        assert!(!attributes.is_empty());
    }

    #[test]
    fn type_names() {
        assert_eq!(AttributeValue::Str("x").type_name(), "&'static str");
        assert_eq!(AttributeValue::F64(1.0).type_name(), "f64");
        assert_eq!(AttributeValue::U64(7).to_string(), "7");
    }
}
