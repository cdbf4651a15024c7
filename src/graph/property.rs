//! Property values and the per-element property container
//!
//! Every vertex and edge owns a [`Properties`] map. Mutations go through
//! [`Properties::set`] and [`Properties::remove`], which validate the key and
//! report the change to a [`PropertyObserver`] before returning, so automatic
//! indices are never stale to a caller that queries them right afterwards.

use super::error::{GraphError, GraphResult};
use super::types::ElementKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key reserved for the element identifier
pub const ID_KEY: &str = "id";

/// Key reserved for the edge label
pub const LABEL_KEY: &str = "label";

/// Property value type supporting multiple data types
///
/// Values are totally ordered: first by type, then by content. Floating point
/// values compare with `total_cmp`, so they can key ordered indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Explicit null; distinct from an absent key
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Bytes(Vec<u8>),
    /// Application-defined value, JSON encoded
    Serialized { type_name: String, bytes: Vec<u8> },
}

impl PropertyValue {
    /// Encode an application value
    pub fn serialized<T: Serialize>(type_name: impl Into<String>, value: &T) -> GraphResult<Self> {
        let type_name = type_name.into();
        let bytes = serde_json::to_vec(value).map_err(|e| GraphError::Serialization {
            type_name: type_name.clone(),
            reason: e.to_string(),
        })?;
        Ok(PropertyValue::Serialized { type_name, bytes })
    }

    /// Decode an application value stored with [`PropertyValue::serialized`]
    pub fn decode_serialized<T: DeserializeOwned>(&self) -> Option<T> {
        match self {
            PropertyValue::Serialized { bytes, .. } => serde_json::from_slice(bytes).ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value widened to i64, for both `Integer` and `Long`
    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as i64),
            PropertyValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Floating value widened to f64, for both `Float` and `Double`
    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f as f64),
            PropertyValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            PropertyValue::Null => "Null",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Long(_) => "Long",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Double(_) => "Double",
            PropertyValue::String(_) => "String",
            PropertyValue::List(_) => "List",
            PropertyValue::Map(_) => "Map",
            PropertyValue::Bytes(_) => "Bytes",
            PropertyValue::Serialized { type_name, .. } => type_name,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PropertyValue::Null => 0,
            PropertyValue::Boolean(_) => 1,
            PropertyValue::Integer(_) => 2,
            PropertyValue::Long(_) => 3,
            PropertyValue::Float(_) => 4,
            PropertyValue::Double(_) => 5,
            PropertyValue::String(_) => 6,
            PropertyValue::List(_) => 7,
            PropertyValue::Map(_) => 8,
            PropertyValue::Bytes(_) => 9,
            PropertyValue::Serialized { .. } => 10,
        }
    }
}

impl Ord for PropertyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use PropertyValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Long(a), Long(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Double(a), Double(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (List(a), List(b)) => a.cmp(b),
            (Map(a), Map(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            (
                Serialized { type_name: ta, bytes: ba },
                Serialized { type_name: tb, bytes: bb },
            ) => (ta, ba).cmp(&(tb, bb)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            PropertyValue::Null => {}
            PropertyValue::Boolean(b) => b.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Long(l) => l.hash(state),
            // total_cmp equality is bit equality
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::Double(d) => d.to_bits().hash(state),
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::List(items) => items.hash(state),
            PropertyValue::Map(map) => map.hash(state),
            PropertyValue::Bytes(b) => b.hash(state),
            PropertyValue::Serialized { type_name, bytes } => {
                type_name.hash(state);
                bytes.hash(state);
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Long(l) => write!(f, "{}L", l),
            PropertyValue::Float(fl) => write!(f, "{}f", fl),
            PropertyValue::Double(d) => write!(f, "{}", d),
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::List(items) => {
                write!(f, "[")?;
                for (i, val) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            PropertyValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, val)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, val)?;
                }
                write!(f, "}}")
            }
            PropertyValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            PropertyValue::Serialized { type_name, bytes } => {
                write!(f, "{}<{} bytes>", type_name, bytes.len())
            }
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i64> for PropertyValue {
    fn from(l: i64) -> Self {
        PropertyValue::Long(l)
    }
}

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Double(d)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(items: Vec<PropertyValue>) -> Self {
        PropertyValue::List(items)
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        PropertyValue::Map(map)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(bytes: Vec<u8>) -> Self {
        PropertyValue::Bytes(bytes)
    }
}

impl From<&super::types::ElementId> for PropertyValue {
    fn from(id: &super::types::ElementId) -> Self {
        match id {
            super::types::ElementId::Long(n) => PropertyValue::Long(*n),
            super::types::ElementId::Text(s) => PropertyValue::String(s.clone()),
        }
    }
}

/// Raw key/value map, as used for snapshots and comparisons
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Receives every successful property mutation
///
/// `old` is `None` when the key was absent, `new` is `None` on removal.
pub trait PropertyObserver {
    fn property_changed(&mut self, key: &str, old: Option<&PropertyValue>, new: Option<&PropertyValue>);
}

/// Observer for detached elements that belong to no store
pub struct Detached;

impl PropertyObserver for Detached {
    fn property_changed(&mut self, _: &str, _: Option<&PropertyValue>, _: Option<&PropertyValue>) {}
}

/// Property storage of a single element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    kind: ElementKind,
    values: PropertyMap,
}

impl Properties {
    pub fn new(kind: ElementKind) -> Self {
        Properties {
            kind,
            values: PropertyMap::new(),
        }
    }

    /// Reject empty and reserved keys
    pub fn validate_key(kind: ElementKind, key: &str) -> GraphResult<()> {
        if key.is_empty() {
            return Err(GraphError::EmptyPropertyKey);
        }
        if key == ID_KEY || (kind == ElementKind::Edge && key == LABEL_KEY) {
            return Err(GraphError::ReservedProperty(key.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &PropertyMap {
        &self.values
    }

    /// Set a property, returning the previous value
    pub fn set(
        &mut self,
        key: &str,
        value: PropertyValue,
        observer: &mut dyn PropertyObserver,
    ) -> GraphResult<Option<PropertyValue>> {
        Self::validate_key(self.kind, key)?;
        let old = self.values.insert(key.to_string(), value);
        observer.property_changed(key, old.as_ref(), self.values.get(key));
        Ok(old)
    }

    /// Remove a property, returning the previous value
    pub fn remove(
        &mut self,
        key: &str,
        observer: &mut dyn PropertyObserver,
    ) -> GraphResult<Option<PropertyValue>> {
        Self::validate_key(self.kind, key)?;
        let old = self.values.remove(key);
        if let Some(previous) = &old {
            observer.property_changed(key, Some(previous), None);
        }
        Ok(old)
    }
}
