//! Union disambiguation.
//!
//! The target decides which concrete shape a union occurrence takes:
//!
//! | target          | result                                                  |
//! |-----------------|---------------------------------------------------------|
//! | string          | scalar branch value rendered as a string                |
//! | float           | numeric branch value widened to f64                     |
//! | boolean         | boolean branch value                                    |
//! | int             | i32 when the union has an `int` branch, else i64        |
//! | record          | tagged record branch, else the first record branch      |
//! | array           | tagged array branch, else the first array branch        |
//! | map             | tagged map branch, else the first map branch            |
//! | any             | branch value lifted as-is                               |
//! | anything else   | raw bytes of the branch value                           |
//!
//! A null branch value is always nil. Unmatched shapes never fail.

use apache_avro::Schema;
use apache_avro::schema::{RecordSchema, UnionSchema};
use apache_avro::types::Value;
use materialize_api::{DynamicValue, RecordBuilder, ScalarKind, TargetType};

use crate::context::Cx;
use crate::error::MaterializeError;
use crate::leaf::{self, NumericSource};
use crate::lift::lift;
use crate::shape::{Node, SchemaShape};
use crate::{array, map, record};

/// Branch schema (when the value is tagged) and the branch value.
fn branch_of<'s, 'v>(union: &'s UnionSchema, value: &'v Value) -> (Option<&'s Schema>, &'v Value) {
    match value {
        Value::Union(index, inner) => (union.variants().get(*index as usize), inner),
        other => (None, other),
    }
}

pub(crate) fn convert<'s>(
    cx: &Cx<'_, 's>,
    union: &'s UnionSchema,
    target: &TargetType,
    value: &Value,
) -> Result<DynamicValue, MaterializeError> {
    let (branch, inner) = branch_of(union, value);
    if matches!(inner, Value::Null) {
        return Ok(DynamicValue::Nil);
    }

    let converted = match cx.resolver.innermost(target)? {
        TargetType::Scalar { scalar } => match scalar {
            ScalarKind::String => stringify(inner).map(DynamicValue::String),
            ScalarKind::Float => float_of(inner).map(DynamicValue::Float),
            ScalarKind::Boolean => match inner {
                Value::Boolean(b) => Some(DynamicValue::Boolean(*b)),
                _ => None,
            },
            ScalarKind::Int => int_of(cx, union, inner)?,
            ScalarKind::Any => Some(lift(inner)?),
            ScalarKind::Nil | ScalarKind::Bytes => None,
        },
        TargetType::Record(_) => match record_branch(cx, union, branch)? {
            Some(schema) => Some(record::convert(cx, schema, target, inner)?),
            None => None,
        },
        TargetType::Array { .. } => match array_branch(cx, union, branch)? {
            Some(items) => Some(array::convert(cx, items, target, inner)?),
            None => None,
        },
        TargetType::Map { .. } => match map_branch(cx, union, branch)? {
            Some(values) => Some(map::convert(cx, values, target, inner)?),
            None => None,
        },
        TargetType::Wrapped { .. } => None,
    };

    match converted {
        Some(value) => Ok(value),
        None => {
            tracing::debug!(ty = %target, found = leaf::value_kind(inner), "union falls back to raw bytes");
            raw_bytes(inner).map(DynamicValue::Bytes)
        }
    }
}

/// Union-typed record field. An array-shaped field target takes the array
/// branch element-wise; any other target goes through [`convert`].
pub(crate) fn merge_field<'s>(
    cx: &Cx<'_, 's>,
    union: &'s UnionSchema,
    name: &str,
    field_ty: &TargetType,
    value: &Value,
    builder: &mut RecordBuilder,
) -> Result<(), MaterializeError> {
    let merged = match cx.resolver.innermost(field_ty)? {
        TargetType::Array { .. } => {
            let (branch, inner) = branch_of(union, value);
            match (inner, array_branch(cx, union, branch)?) {
                (Value::Null, _) => DynamicValue::Nil,
                (_, Some(items)) => array::convert(cx, items, field_ty, inner)?,
                (_, None) => convert(cx, union, field_ty, value)?,
            }
        }
        _ => convert(cx, union, field_ty, value)?,
    };
    builder.put(name, merged);
    Ok(())
}

/// Branch whose node satisfies `pick`: the tagged one if the value is
/// tagged, otherwise the first in declaration order.
fn find_branch<'s, T>(
    cx: &Cx<'_, 's>,
    union: &'s UnionSchema,
    tagged: Option<&'s Schema>,
    pick: impl Fn(Node<'s>) -> Option<T>,
) -> Result<Option<T>, MaterializeError> {
    if let Some(schema) = tagged {
        return Ok(pick(cx.names.node(schema)?));
    }
    for variant in union.variants() {
        if let Some(found) = pick(cx.names.node(variant)?) {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn record_branch<'s>(
    cx: &Cx<'_, 's>,
    union: &'s UnionSchema,
    tagged: Option<&'s Schema>,
) -> Result<Option<&'s RecordSchema>, MaterializeError> {
    find_branch(cx, union, tagged, |node| match node {
        Node::Record(schema) => Some(schema),
        _ => None,
    })
}

fn array_branch<'s>(
    cx: &Cx<'_, 's>,
    union: &'s UnionSchema,
    tagged: Option<&'s Schema>,
) -> Result<Option<&'s Schema>, MaterializeError> {
    find_branch(cx, union, tagged, |node| match node {
        Node::Array(items) => Some(items),
        _ => None,
    })
}

fn map_branch<'s>(
    cx: &Cx<'_, 's>,
    union: &'s UnionSchema,
    tagged: Option<&'s Schema>,
) -> Result<Option<&'s Schema>, MaterializeError> {
    find_branch(cx, union, tagged, |node| match node {
        Node::Map(values) => Some(values),
        _ => None,
    })
}

/// The union's declared width wins: with an `int` branch present the value
/// must be 32-bit.
fn int_of<'s>(cx: &Cx<'_, 's>, union: &'s UnionSchema, inner: &Value) -> Result<Option<DynamicValue>, MaterializeError> {
    if !is_integral(inner) {
        return Ok(None);
    }
    let mut narrow = false;
    for variant in union.variants() {
        if cx.names.shape(variant)? == SchemaShape::Int {
            narrow = true;
            break;
        }
    }
    let source = if narrow { NumericSource::Int32 } else { NumericSource::Int64 };
    leaf::widen_int(source, inner).map(|i| Some(DynamicValue::Int(i)))
}

fn is_integral(value: &Value) -> bool {
    matches!(
        value,
        Value::Int(_)
            | Value::Long(_)
            | Value::Date(_)
            | Value::TimeMillis(_)
            | Value::TimeMicros(_)
            | Value::TimestampMillis(_)
            | Value::TimestampMicros(_)
            | Value::TimestampNanos(_)
            | Value::LocalTimestampMillis(_)
            | Value::LocalTimestampMicros(_)
            | Value::LocalTimestampNanos(_)
    )
}

fn float_of(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(f64::from(*f)),
        Value::Double(d) => Some(*d),
        Value::Int(i) => Some(f64::from(*i)),
        Value::Long(l) => Some(*l as f64),
        _ => None,
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) | Value::Enum(_, s) => Some(s.clone()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Long(l) => Some(l.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        Value::Uuid(u) => Some(u.to_string()),
        Value::BigDecimal(d) => Some(d.to_string()),
        Value::Bytes(b) | Value::Fixed(_, b) => String::from_utf8(b.clone()).ok(),
        _ => None,
    }
}

/// Byte image of a branch value. Blobs and strings are copied verbatim;
/// structured values are rendered as JSON.
fn raw_bytes(value: &Value) -> Result<Vec<u8>, MaterializeError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Bytes(b) | Value::Fixed(_, b) => Ok(b.clone()),
        Value::String(s) | Value::Enum(_, s) => Ok(s.clone().into_bytes()),
        other => Ok(serde_json::to_vec(&lift(other)?)?),
    }
}
