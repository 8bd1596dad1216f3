//! Dynamic argument and metadata values
//!
//! Actions are looked up by name at runtime, so their arguments travel as an
//! ordered list of JSON values. [`Args::get`] decodes a position back into a
//! concrete type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Ordered argument list of a single action invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Vec<Value>);

impl Args {
    /// Empty argument list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wrap already-encoded values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Append a value, encoding it as JSON.
    pub fn push<T: Serialize>(&mut self, value: T) -> Result<(), serde_json::Error> {
        self.0.push(serde_json::to_value(value)?);
        Ok(())
    }

    /// Decode the argument at `index`.
    ///
    /// # Example
    /// ```
    /// use concise_state_core::args;
    ///
    /// let args = args!["milk", 2];
    /// assert_eq!(args.get::<String>(0).unwrap(), "milk");
    /// assert_eq!(args.get::<u32>(1).unwrap(), 2);
    /// assert!(args.get::<u32>(2).is_err());
    /// ```
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, StoreError> {
        let value = self
            .0
            .get(index)
            .ok_or(StoreError::MissingArgument(index))?;
        T::deserialize(value).map_err(|source| StoreError::InvalidArgument { index, source })
    }

    /// Raw value at `index`
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Replace the value at `index`, growing the list with nulls if needed.
    pub fn set<T: Serialize>(&mut self, index: usize, value: T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        if index >= self.0.len() {
            self.0.resize(index + 1, Value::Null);
        }
        self.0[index] = value;
        Ok(())
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Array(self.0.clone()))
    }
}

/// Build an [`Args`] list from expressions, encoding each with `serde_json::json!`.
///
/// ```
/// use concise_state_core::args;
///
/// let args = args![42, "answer", [1, 2, 3]];
/// assert_eq!(args.len(), 3);
/// assert!(args![].is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::Args::from_values(vec![$($crate::__private::serde_json::json!($arg)),+])
    };
}

/// Static, read-only metadata attached to a store at creation.
///
/// Exposed to actions through the context reference and to middleware
/// through [`MiddlewareMeta`](crate::MiddlewareMeta). Never part of state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meta(Map<String, Value>);

impl Meta {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode the entry at `key`, returning `None` if it is absent or has another shape.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|v| T::deserialize(v).ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Meta {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Meta {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decode an action result into a concrete type.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(StoreError::InvalidResult)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_args_macro_encodes_values() {
        let args = args![1, "two", true];
        assert_eq!(args.values(), &[json!(1), json!("two"), json!(true)]);
    }

    #[test]
    fn test_args_get_errors() {
        let args = args!["text"];
        assert!(matches!(
            args.get::<i32>(0),
            Err(StoreError::InvalidArgument { index: 0, .. })
        ));
        assert!(matches!(
            args.get::<i32>(3),
            Err(StoreError::MissingArgument(3))
        ));
    }

    #[test]
    fn test_args_set_grows() {
        let mut args = Args::new();
        args.set(2, "x").unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args.value(0), Some(&Value::Null));
        assert_eq!(args.get::<String>(2).unwrap(), "x");
    }

    #[test]
    fn test_meta_builder() {
        let meta = Meta::new().with("store", "todos").with("version", 2);
        assert_eq!(meta.get("store"), Some(&json!("todos")));
        assert_eq!(meta.decode::<u32>("version"), Some(2));
        assert_eq!(meta.decode::<u32>("store"), None);
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_decode_result() {
        assert_eq!(decode::<Vec<u8>>(json!([1, 2])).unwrap(), vec![1, 2]);
        assert!(matches!(
            decode::<u8>(json!("x")),
            Err(StoreError::InvalidResult(_))
        ));
    }
}
