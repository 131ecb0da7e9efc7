use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::ValueError;
use crate::target::TargetType;

/// Materialized value in the target dynamic type system.
///
/// Equality is content equality: containers compare element-wise and
/// ignore the target type they were produced for, their storage layout
/// and their frozen state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DynamicValue {
    Nil,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(ArrayValue),
    Map(MapValue),
    Record(RecordValue),
}

impl DynamicValue {
    /// Short kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DynamicValue::Nil => "nil",
            DynamicValue::Boolean(_) => "boolean",
            DynamicValue::Int(_) => "int",
            DynamicValue::Float(_) => "float",
            DynamicValue::String(_) => "string",
            DynamicValue::Bytes(_) => "bytes",
            DynamicValue::Array(_) => "array",
            DynamicValue::Map(_) => "map",
            DynamicValue::Record(_) => "record",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, DynamicValue::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            DynamicValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            DynamicValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DynamicValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            DynamicValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            DynamicValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            DynamicValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Target type of a container value, `None` for scalars.
    pub fn target(&self) -> Option<&TargetType> {
        match self {
            DynamicValue::Array(a) => Some(a.ty()),
            DynamicValue::Map(m) => Some(m.ty()),
            DynamicValue::Record(r) => Some(r.ty()),
            _ => None,
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Boolean(b)
    }
}

impl From<i64> for DynamicValue {
    fn from(i: i64) -> Self {
        DynamicValue::Int(i)
    }
}

impl From<f64> for DynamicValue {
    fn from(f: f64) -> Self {
        DynamicValue::Float(f)
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::String(s)
    }
}

impl From<Vec<u8>> for DynamicValue {
    fn from(b: Vec<u8>) -> Self {
        DynamicValue::Bytes(b)
    }
}

// ════════════════════════════════════════════════════════════════
//  Array
// ════════════════════════════════════════════════════════════════

/// Array storage. Homogeneous arrays of scalars are stored unboxed.
#[derive(Debug, Clone)]
pub enum ArrayItems {
    Strings(Vec<String>),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Booleans(Vec<bool>),
    Bytes(Vec<Vec<u8>>),
    Values(Vec<DynamicValue>),
}

impl ArrayItems {
    /// Pack boxed values into the densest storage the element type allows.
    /// Falls back to boxed storage when any value does not fit.
    pub fn pack(element: &TargetType, values: Vec<DynamicValue>) -> Self {
        use crate::target::ScalarKind;

        let kind = match element.innermost(MAX_PACK_UNWRAP) {
            Some(TargetType::Scalar { scalar }) => *scalar,
            _ => return ArrayItems::Values(values),
        };
        let packed = match kind {
            ScalarKind::String => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(ArrayItems::Strings),
            ScalarKind::Int => values
                .iter()
                .map(DynamicValue::as_int)
                .collect::<Option<Vec<_>>>()
                .map(ArrayItems::Ints),
            ScalarKind::Float => values
                .iter()
                .map(DynamicValue::as_float)
                .collect::<Option<Vec<_>>>()
                .map(ArrayItems::Floats),
            ScalarKind::Boolean => values
                .iter()
                .map(DynamicValue::as_bool)
                .collect::<Option<Vec<_>>>()
                .map(ArrayItems::Booleans),
            ScalarKind::Bytes => values
                .iter()
                .map(|v| v.as_bytes().map(<[u8]>::to_vec))
                .collect::<Option<Vec<_>>>()
                .map(ArrayItems::Bytes),
            ScalarKind::Nil | ScalarKind::Any => None,
        };
        packed.unwrap_or(ArrayItems::Values(values))
    }
}

const MAX_PACK_UNWRAP: usize = 64;

#[derive(Debug, Clone)]
pub struct ArrayValue {
    ty: TargetType,
    items: ArrayItems,
}

impl ArrayValue {
    pub fn new(ty: TargetType, items: ArrayItems) -> Self {
        Self { ty, items }
    }

    pub fn ty(&self) -> &TargetType {
        &self.ty
    }

    pub fn items(&self) -> &ArrayItems {
        &self.items
    }

    pub fn into_items(self) -> ArrayItems {
        self.items
    }

    pub fn len(&self) -> usize {
        match &self.items {
            ArrayItems::Strings(v) => v.len(),
            ArrayItems::Ints(v) => v.len(),
            ArrayItems::Floats(v) => v.len(),
            ArrayItems::Booleans(v) => v.len(),
            ArrayItems::Bytes(v) => v.len(),
            ArrayItems::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, boxed as a `DynamicValue`.
    pub fn get(&self, index: usize) -> Option<DynamicValue> {
        match &self.items {
            ArrayItems::Strings(v) => v.get(index).cloned().map(DynamicValue::String),
            ArrayItems::Ints(v) => v.get(index).copied().map(DynamicValue::Int),
            ArrayItems::Floats(v) => v.get(index).copied().map(DynamicValue::Float),
            ArrayItems::Booleans(v) => v.get(index).copied().map(DynamicValue::Boolean),
            ArrayItems::Bytes(v) => v.get(index).cloned().map(DynamicValue::Bytes),
            ArrayItems::Values(v) => v.get(index).cloned(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = DynamicValue> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    pub fn to_values(&self) -> Vec<DynamicValue> {
        self.iter().collect()
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Serialize for ArrayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.iter() {
            seq.serialize_element(&item)?;
        }
        seq.end()
    }
}

// ════════════════════════════════════════════════════════════════
//  Freezing
// ════════════════════════════════════════════════════════════════

/// How a builder finalizes its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Mutable,
    /// One-way: the container rejects every later mutation.
    Frozen,
}

// ════════════════════════════════════════════════════════════════
//  Map
// ════════════════════════════════════════════════════════════════

/// String-keyed mapping. Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct MapValue {
    ty: TargetType,
    entries: IndexMap<String, DynamicValue>,
    frozen: bool,
}

impl MapValue {
    pub fn ty(&self) -> &TargetType {
        &self.ty
    }

    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DynamicValue)> {
        self.entries.iter()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Insert or replace an entry. Fails once the map is frozen.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: DynamicValue,
    ) -> Result<Option<DynamicValue>, ValueError> {
        let key = key.into();
        if self.frozen {
            return Err(ValueError::frozen(format!("cannot insert '{key}' into frozen {}", self.ty)));
        }
        Ok(self.entries.insert(key, value))
    }

    /// Freeze in place. Already frozen maps are left as they are.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn into_entries(self) -> IndexMap<String, DynamicValue> {
        self.entries
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for MapValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub struct MapBuilder {
    ty: TargetType,
    entries: IndexMap<String, DynamicValue>,
}

impl MapBuilder {
    pub fn new(ty: TargetType) -> Self {
        Self { ty, entries: IndexMap::new() }
    }

    pub fn with_capacity(ty: TargetType, capacity: usize) -> Self {
        Self { ty, entries: IndexMap::with_capacity(capacity) }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: DynamicValue) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn finish(self, finish: Finish) -> MapValue {
        MapValue {
            ty: self.ty,
            entries: self.entries,
            frozen: finish == Finish::Frozen,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Record
// ════════════════════════════════════════════════════════════════

/// Named-field record value. Field order follows write order.
#[derive(Debug, Clone)]
pub struct RecordValue {
    ty: TargetType,
    fields: IndexMap<String, DynamicValue>,
    frozen: bool,
}

impl RecordValue {
    pub fn ty(&self) -> &TargetType {
        &self.ty
    }

    pub fn get(&self, field: &str) -> Option<&DynamicValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DynamicValue)> {
        self.fields.iter()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Set a field. Fails once the record is frozen.
    pub fn set(
        &mut self,
        field: impl Into<String>,
        value: DynamicValue,
    ) -> Result<Option<DynamicValue>, ValueError> {
        let field = field.into();
        if self.frozen {
            return Err(ValueError::frozen(format!("cannot set '{field}' on frozen {}", self.ty)));
        }
        Ok(self.fields.insert(field, value))
    }

    /// Freeze in place. Already frozen records are left as they are.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn into_fields(self) -> IndexMap<String, DynamicValue> {
        self.fields
    }
}

impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub struct RecordBuilder {
    ty: TargetType,
    fields: IndexMap<String, DynamicValue>,
}

impl RecordBuilder {
    pub fn new(ty: TargetType) -> Self {
        Self { ty, fields: IndexMap::new() }
    }

    pub fn put(&mut self, field: impl Into<String>, value: DynamicValue) -> &mut Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn finish(self, finish: Finish) -> RecordValue {
        RecordValue {
            ty: self.ty,
            fields: self.fields,
            frozen: finish == Finish::Frozen,
        }
    }
}
