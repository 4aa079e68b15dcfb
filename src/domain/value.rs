//! Property values carried by game tree nodes.
//!
//! Values are opaque to the tree: a JSON-like tagged variant plus an escape
//! hatch for caller-defined types that know how to copy themselves.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Property mapping of a single node, keyed by property identifier (`B`, `W`, `FF`, ...).
pub type Properties = BTreeMap<String, Value>;

/// Caller-defined property value with its own copy semantics.
///
/// A decoded move or a board coordinate can live inside a [`Value`] this way.
/// `to_value` is the plain representation used for equality, display and
/// serialization.
pub trait CustomValue: fmt::Debug {
    /// Returns an independent copy of this value.
    fn clone_custom(&self) -> Box<dyn CustomValue>;

    /// Plain representation of this value.
    fn to_value(&self) -> Value;
}

/// A single property value.
#[derive(Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Custom(Box<dyn CustomValue>),
}

impl Value {
    /// Deep copy of this value.
    ///
    /// Custom values delegate to [`CustomValue::clone_custom`], lists are
    /// copied element-wise, maps key-wise, scalars by value.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::Text(s) => Value::Text(s.clone()),
            Value::List(items) => Value::List(items.iter().map(Value::deep_clone).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            ),
            Value::Custom(custom) => Value::Custom(custom.clone_custom()),
        }
    }

    /// Custom values resolved to their plain representation, recursively.
    pub fn to_plain(&self) -> Value {
        match self {
            Value::Custom(custom) => custom.to_value().to_plain(),
            Value::List(items) => Value::List(items.iter().map(Value::to_plain).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
            other => other.deep_clone(),
        }
    }

    /// False if a NaN or infinite float occurs anywhere inside, which JSON cannot represent.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::List(items) => items.iter().all(Value::is_finite),
            Value::Map(map) => map.values().all(Value::is_finite),
            Value::Custom(custom) => custom.to_value().is_finite(),
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Deep copy of a whole property mapping.
pub fn clone_properties(properties: &Properties) -> Properties {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), v.deep_clone()))
        .collect()
}

impl Clone for Value {
    fn clone(&self) -> Self {
        self.deep_clone()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Custom(a), b) => a.to_value() == *b,
            (a, Value::Custom(b)) => *a == b.to_value(),
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Renders the value as JSON.
///
/// NaN and infinite floats have no JSON form and show as `null`; the JSON
/// stringifier rejects them instead.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Custom(custom) => custom.to_value().serialize(serializer),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON-like property value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        match i64::try_from(u) {
            Ok(i) => Ok(Value::Int(i)),
            Err(_) => Ok(Value::Float(u as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            map.insert(k, v);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl CustomValue for Point {
        fn clone_custom(&self) -> Box<dyn CustomValue> {
            Box::new(Point {
                x: self.x,
                y: self.y,
            })
        }

        fn to_value(&self) -> Value {
            Value::List(vec![Value::Int(self.x), Value::Int(self.y)])
        }
    }

    #[test]
    fn given_nested_list_when_deep_cloned_then_copy_is_independent() {
        let original = Value::from(vec![Value::from(vec!["pd", "dp"]), Value::Null]);
        let mut copy = original.deep_clone();

        if let Some(items) = copy.as_list_mut() {
            items.push(Value::Bool(true));
        }

        assert_eq!(original.as_list().map(<[Value]>::len), Some(2));
        assert_eq!(copy.as_list().map(<[Value]>::len), Some(3));
    }

    #[test]
    fn given_custom_value_when_cloned_then_delegates_and_compares_by_plain_form() {
        let value = Value::Custom(Box::new(Point { x: 3, y: 15 }));
        let copy = value.deep_clone();

        assert!(matches!(copy, Value::Custom(_)));
        assert_eq!(copy, Value::from(vec![3, 15]));
        assert_eq!(value.to_plain(), Value::from(vec![3, 15]));
    }

    #[test]
    fn given_json_when_deserialized_then_integers_stay_integers() {
        let value: Value = serde_json::from_str(r#"{"FF":4,"KM":6.5,"B":["pd"],"X":null}"#)
            .expect("valid json");

        let Value::Map(map) = &value else {
            panic!("expected map, got {:?}", value);
        };
        assert_eq!(map["FF"], Value::Int(4));
        assert_eq!(map["KM"], Value::Float(6.5));
        assert_eq!(map["B"], Value::from(vec!["pd"]));
        assert!(map["X"].is_null());
        assert_eq!(value.to_string(), r#"{"B":["pd"],"FF":4,"KM":6.5,"X":null}"#);
    }

    #[test]
    fn given_nested_nan_when_checking_finite_then_false() {
        let nested = Value::from(vec![Value::Int(1), Value::Float(f64::NAN)]);
        let custom = Value::Custom(Box::new(Point { x: 3, y: 15 }));

        assert!(!nested.is_finite());
        assert!(custom.is_finite());
        assert!(Value::Float(6.5).is_finite());
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "null");
    }
}
