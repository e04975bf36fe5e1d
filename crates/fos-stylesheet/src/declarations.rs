//! Declaration Objects
//!
//! Nested style input. Every entry is decided once, when it is built or
//! deserialized: either a property with a plain value, or a nested block
//! keyed by a selector or an at-rule.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// Reserved key that opts a declaration block out of deduplication
pub const IS_UNIQUE: &str = "__DO_NOT_DEDUPE_STYLE__";

/// Plain property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value, dropped on output
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Fallback values, one declaration each
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value survives in a fallback list
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) => true,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// One entry of a declaration object
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `name: value`
    Property { name: String, value: Value },
    /// Nested selector, or at-rule when the key starts with `@`
    Nested { key: String, body: Declarations },
}

/// Ordered declaration object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations {
    entries: Vec<Declaration>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(Declaration::Property {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a nested selector or at-rule block
    pub fn nest(mut self, key: impl Into<String>, body: Declarations) -> Self {
        self.entries.push(Declaration::Nested {
            key: key.into(),
            body,
        });
        self
    }

    /// Mark this block as never deduplicated
    pub fn unique(self) -> Self {
        self.prop(IS_UNIQUE, true)
    }

    pub fn push(&mut self, declaration: Declaration) {
        self.entries.push(declaration);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<Declaration> for Declarations {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Deserialization
// ============================================================================

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a boolean, a number, a string or a list of those")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct DeclarationsVisitor;

impl<'de> Visitor<'de> for DeclarationsVisitor {
    type Value = Declarations;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a declaration object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Declarations, A::Error> {
        let mut declarations = Declarations::new();
        while let Some(key) = map.next_key::<String>()? {
            let declaration = match map.next_value::<Entry>()? {
                Entry::Value(value) => Declaration::Property { name: key, value },
                Entry::Nested(body) => Declaration::Nested { key, body },
            };
            declarations.push(declaration);
        }
        Ok(declarations)
    }
}

/// Keys keep document order
impl<'de> Deserialize<'de> for Declarations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DeclarationsVisitor)
    }
}

/// Map value: objects nest, everything else is a property
enum Entry {
    Value(Value),
    Nested(Declarations),
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = Entry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a property value or a nested declaration object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Entry, E> {
        ValueVisitor.visit_unit().map(Entry::Value)
    }

    fn visit_none<E: de::Error>(self) -> Result<Entry, E> {
        ValueVisitor.visit_none().map(Entry::Value)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Entry, D::Error> {
        Entry::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Entry, E> {
        ValueVisitor.visit_bool(v).map(Entry::Value)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Entry, E> {
        ValueVisitor.visit_i64(v).map(Entry::Value)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Entry, E> {
        ValueVisitor.visit_u64(v).map(Entry::Value)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Entry, E> {
        ValueVisitor.visit_f64(v).map(Entry::Value)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Entry, E> {
        ValueVisitor.visit_str(v).map(Entry::Value)
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Entry, E> {
        ValueVisitor.visit_string(v).map(Entry::Value)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Entry, A::Error> {
        ValueVisitor.visit_seq(seq).map(Entry::Value)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Entry, A::Error> {
        DeclarationsVisitor.visit_map(map).map(Entry::Nested)
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntryVisitor)
    }
}
