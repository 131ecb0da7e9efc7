//! Primitive conversions and the numeric widening table.
//!
//! | source (schema) | int target      | float target     |
//! |-----------------|-----------------|------------------|
//! | int (32-bit)    | widen to i64    | i64 → f64        |
//! | long (64-bit)   | as-is           | i64 → f64        |
//! | float (32-bit)  | not a widening  | IEEE-754 widen   |
//! | double (64-bit) | not a widening  | as-is            |

use apache_avro::types::Value;
use materialize_api::{DynamicValue, ScalarKind, TargetType};

use crate::error::MaterializeError;
use crate::resolve::Resolver;
use crate::shape::SchemaShape;

/// Kind name of a decoded value, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Boolean(_) => "boolean",
        Value::Int(_) => "int",
        Value::Long(_) => "long",
        Value::Float(_) => "float",
        Value::Double(_) => "double",
        Value::Bytes(_) => "bytes",
        Value::String(_) => "string",
        Value::Fixed(..) => "fixed",
        Value::Enum(..) => "enum",
        Value::Union(..) => "union",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Record(_) => "record",
        _ => "logical",
    }
}

pub(crate) fn shape_error(expected: SchemaShape, value: &Value) -> MaterializeError {
    MaterializeError::ValueShape { expected, found: value_kind(value) }
}

// ════════════════════════════════════════════════════════════════
//  Widening table
// ════════════════════════════════════════════════════════════════

/// Numeric width declared by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericSource {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl NumericSource {
    pub fn of(shape: SchemaShape) -> Option<Self> {
        match shape {
            SchemaShape::Int => Some(NumericSource::Int32),
            SchemaShape::Long => Some(NumericSource::Int64),
            SchemaShape::Float => Some(NumericSource::Float32),
            SchemaShape::Double => Some(NumericSource::Float64),
            _ => None,
        }
    }
}

/// Numeric category of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericTarget {
    Int,
    Float,
}

pub(crate) type IntWidening = fn(&Value) -> Result<i64, MaterializeError>;
pub(crate) type FloatWidening = fn(&Value) -> Result<f64, MaterializeError>;

#[derive(Clone, Copy)]
pub(crate) enum Widening {
    Int(IntWidening),
    Float(FloatWidening),
}

/// Conversion for a (schema width, target category) pair.
/// `None` means the pair is not a widening (float to int).
pub(crate) fn widening(source: NumericSource, target: NumericTarget) -> Option<Widening> {
    match (source, target) {
        (NumericSource::Int32, NumericTarget::Int) => Some(Widening::Int(int32_to_int)),
        (NumericSource::Int64, NumericTarget::Int) => Some(Widening::Int(int64_to_int)),
        (NumericSource::Int32 | NumericSource::Int64, NumericTarget::Float) => {
            Some(Widening::Float(int_to_float))
        }
        (NumericSource::Float32, NumericTarget::Float) => Some(Widening::Float(float32_to_float)),
        (NumericSource::Float64, NumericTarget::Float) => Some(Widening::Float(float64_to_float)),
        (NumericSource::Float32 | NumericSource::Float64, NumericTarget::Int) => None,
    }
}

fn int32_to_int(value: &Value) -> Result<i64, MaterializeError> {
    match value {
        Value::Int(i) | Value::Date(i) | Value::TimeMillis(i) => Ok(i64::from(*i)),
        other => Err(shape_error(SchemaShape::Int, other)),
    }
}

fn int64_to_int(value: &Value) -> Result<i64, MaterializeError> {
    match value {
        Value::Long(l)
        | Value::TimeMicros(l)
        | Value::TimestampMillis(l)
        | Value::TimestampMicros(l)
        | Value::TimestampNanos(l)
        | Value::LocalTimestampMillis(l)
        | Value::LocalTimestampMicros(l)
        | Value::LocalTimestampNanos(l) => Ok(*l),
        // int promotes to long
        Value::Int(i) | Value::Date(i) | Value::TimeMillis(i) => Ok(i64::from(*i)),
        other => Err(shape_error(SchemaShape::Long, other)),
    }
}

fn int_to_float(value: &Value) -> Result<f64, MaterializeError> {
    int64_to_int(value).map(|i| i as f64)
}

fn float32_to_float(value: &Value) -> Result<f64, MaterializeError> {
    match value {
        Value::Float(f) => Ok(f64::from(*f)),
        other => Err(shape_error(SchemaShape::Float, other)),
    }
}

fn float64_to_float(value: &Value) -> Result<f64, MaterializeError> {
    match value {
        Value::Double(d) => Ok(*d),
        Value::Float(f) => Ok(f64::from(*f)),
        other => Err(shape_error(SchemaShape::Double, other)),
    }
}

pub(crate) fn widen_int(source: NumericSource, value: &Value) -> Result<i64, MaterializeError> {
    match source {
        NumericSource::Int32 => int32_to_int(value),
        _ => int64_to_int(value),
    }
}

pub(crate) fn widen_float(source: NumericSource, value: &Value) -> Result<f64, MaterializeError> {
    match source {
        NumericSource::Int32 | NumericSource::Int64 => int_to_float(value),
        NumericSource::Float32 => float32_to_float(value),
        NumericSource::Float64 => float64_to_float(value),
    }
}

// ════════════════════════════════════════════════════════════════
//  Scalars
// ════════════════════════════════════════════════════════════════

pub(crate) fn bool_of(value: &Value) -> Result<bool, MaterializeError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        other => Err(shape_error(SchemaShape::Boolean, other)),
    }
}

pub(crate) fn string_of(value: &Value) -> Result<String, MaterializeError> {
    match value {
        Value::String(s) | Value::Enum(_, s) => Ok(s.clone()),
        Value::Uuid(u) => Ok(u.to_string()),
        Value::BigDecimal(d) => Ok(d.to_string()),
        other => Err(shape_error(SchemaShape::String, other)),
    }
}

/// Raw bytes of a byte buffer, fixed blob, decimal or duration. No re-validation of length.
pub(crate) fn bytes_of(value: &Value) -> Result<Vec<u8>, MaterializeError> {
    match value {
        Value::Bytes(b) | Value::Fixed(_, b) => Ok(b.clone()),
        Value::Decimal(d) => Vec::<u8>::try_from(d).map_err(|_| shape_error(SchemaShape::Bytes, value)),
        // months, days, millis as little-endian u32
        Value::Duration(d) => Ok(<[u8; 12]>::from(*d).to_vec()),
        other => Err(shape_error(SchemaShape::Bytes, other)),
    }
}

/// Leaf conversion for primitive schema shapes.
pub(crate) fn convert(shape: SchemaShape, value: &Value) -> Result<DynamicValue, MaterializeError> {
    match shape {
        SchemaShape::Null => match value {
            Value::Null => Ok(DynamicValue::Nil),
            other => Err(shape_error(SchemaShape::Null, other)),
        },
        SchemaShape::Boolean => bool_of(value).map(DynamicValue::Boolean),
        SchemaShape::Int => widen_int(NumericSource::Int32, value).map(DynamicValue::Int),
        SchemaShape::Long => widen_int(NumericSource::Int64, value).map(DynamicValue::Int),
        SchemaShape::Float => widen_float(NumericSource::Float32, value).map(DynamicValue::Float),
        SchemaShape::Double => widen_float(NumericSource::Float64, value).map(DynamicValue::Float),
        SchemaShape::String => string_of(value).map(DynamicValue::String),
        SchemaShape::Bytes => bytes_of(value).map(DynamicValue::Bytes),
        SchemaShape::Record
        | SchemaShape::Array
        | SchemaShape::Map
        | SchemaShape::Union
        | SchemaShape::Enum
        | SchemaShape::Fixed => Err(MaterializeError::UnsupportedPrimitiveShape(shape)),
    }
}

// ════════════════════════════════════════════════════════════════
//  Target-directed plan
// ════════════════════════════════════════════════════════════════

/// Per-value conversion for a primitive schema shape and a scalar target,
/// picked once and shared by single values and bulk arrays.
#[derive(Clone, Copy)]
pub(crate) enum Plan {
    Int(IntWidening),
    Float(FloatWidening),
    String,
    Boolean,
    Bytes,
    /// Null schema into a nil-admitting target, or any target.
    Verbatim,
}

impl Plan {
    /// `None` when the shape cannot land in the target kind.
    pub fn new(shape: SchemaShape, kind: ScalarKind, admits_nil: bool) -> Option<Self> {
        let numeric = match kind {
            ScalarKind::Int => NumericSource::of(shape).map(|source| (source, NumericTarget::Int)),
            ScalarKind::Float => NumericSource::of(shape).map(|source| (source, NumericTarget::Float)),
            _ => None,
        };
        if let Some((source, target)) = numeric {
            return match widening(source, target)? {
                Widening::Int(f) => Some(Plan::Int(f)),
                Widening::Float(f) => Some(Plan::Float(f)),
            };
        }
        match (shape, kind) {
            (SchemaShape::String, ScalarKind::String) => Some(Plan::String),
            (SchemaShape::Boolean, ScalarKind::Boolean) => Some(Plan::Boolean),
            (SchemaShape::Bytes, ScalarKind::Bytes) => Some(Plan::Bytes),
            (SchemaShape::Null, _) if admits_nil => Some(Plan::Verbatim),
            (_, ScalarKind::Any) => Some(Plan::Verbatim),
            _ => None,
        }
    }

    pub fn apply(self, shape: SchemaShape, value: &Value) -> Result<DynamicValue, MaterializeError> {
        match self {
            Plan::Int(f) => f(value).map(DynamicValue::Int),
            Plan::Float(f) => f(value).map(DynamicValue::Float),
            Plan::String => string_of(value).map(DynamicValue::String),
            Plan::Boolean => bool_of(value).map(DynamicValue::Boolean),
            Plan::Bytes => bytes_of(value).map(DynamicValue::Bytes),
            Plan::Verbatim => convert(shape, value),
        }
    }
}

/// Scalar kind behind `target`; a non-scalar target cannot take `shape`.
pub(crate) fn target_kind(
    resolver: &Resolver,
    target: &TargetType,
    shape: SchemaShape,
) -> Result<ScalarKind, MaterializeError> {
    match resolver.innermost(target)? {
        TargetType::Scalar { scalar } => Ok(*scalar),
        _ => Err(MaterializeError::mismatch(target, shape)),
    }
}

/// Plan for `shape` into `target`, or `TypeMismatch`.
pub(crate) fn plan(resolver: &Resolver, shape: SchemaShape, target: &TargetType) -> Result<Plan, MaterializeError> {
    let kind = target_kind(resolver, target, shape)?;
    Plan::new(shape, kind, target.admits_nil()).ok_or_else(|| MaterializeError::mismatch(target, shape))
}

/// Primitive value conformed to `target` through the widening table.
pub(crate) fn convert_to(
    resolver: &Resolver,
    shape: SchemaShape,
    target: &TargetType,
    value: &Value,
) -> Result<DynamicValue, MaterializeError> {
    plan(resolver, shape, target)?.apply(shape, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_table_is_total_over_numeric_pairs() {
        use NumericSource::*;
        for source in [Int32, Int64, Float32, Float64] {
            for target in [NumericTarget::Int, NumericTarget::Float] {
                let expect_none = matches!(source, Float32 | Float64) && target == NumericTarget::Int;
                assert_eq!(widening(source, target).is_none(), expect_none, "{source:?} -> {target:?}");
            }
        }
    }

    #[test]
    fn int_schema_widens_to_i64() {
        assert_eq!(convert(SchemaShape::Int, &Value::Int(i32::MIN)).unwrap(), DynamicValue::Int(i64::from(i32::MIN)));
        assert_eq!(convert(SchemaShape::Long, &Value::Int(7)).unwrap(), DynamicValue::Int(7));
        assert!(convert(SchemaShape::Int, &Value::Long(7)).is_err());
    }

    #[test]
    fn float_schema_widens_ieee() {
        let out = convert(SchemaShape::Float, &Value::Float(0.1)).unwrap();
        assert_eq!(out, DynamicValue::Float(f64::from(0.1f32)));
    }

    #[test]
    fn logical_values_map_to_primitives() {
        assert_eq!(convert(SchemaShape::Int, &Value::Date(19000)).unwrap(), DynamicValue::Int(19000));
        assert_eq!(
            convert(SchemaShape::Long, &Value::TimestampMillis(1_700_000_000_000)).unwrap(),
            DynamicValue::Int(1_700_000_000_000)
        );
    }

    #[test]
    fn enum_symbol_reads_as_string() {
        assert_eq!(string_of(&Value::Enum(1, "B".into())).unwrap(), "B");
    }

    #[test]
    fn container_shape_is_not_primitive() {
        let err = convert(SchemaShape::Record, &Value::Null).unwrap_err();
        assert!(matches!(err, MaterializeError::UnsupportedPrimitiveShape(SchemaShape::Record)));
    }

    #[test]
    fn value_shape_mismatch_is_reported() {
        let err = convert(SchemaShape::String, &Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "decoded value does not match string schema: found int");
    }

    #[test]
    fn duration_reads_as_twelve_bytes() {
        use apache_avro::{Days, Duration, Millis, Months};
        let d = Duration::new(Months::new(1), Days::new(2), Millis::new(3));
        assert_eq!(bytes_of(&Value::Duration(d)).unwrap(), vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn plan_follows_the_widening_table() {
        assert!(matches!(Plan::new(SchemaShape::Int, ScalarKind::Float, false), Some(Plan::Float(_))));
        assert!(matches!(Plan::new(SchemaShape::Long, ScalarKind::Int, false), Some(Plan::Int(_))));
        assert!(Plan::new(SchemaShape::Double, ScalarKind::Int, false).is_none());
        assert!(Plan::new(SchemaShape::Int, ScalarKind::String, false).is_none());
        assert!(Plan::new(SchemaShape::Null, ScalarKind::Int, false).is_none());
        assert!(matches!(Plan::new(SchemaShape::Null, ScalarKind::Int, true), Some(Plan::Verbatim)));
        assert!(matches!(Plan::new(SchemaShape::Bytes, ScalarKind::Any, true), Some(Plan::Verbatim)));
    }

    #[test]
    fn convert_to_conforms_to_target() {
        let resolver = Resolver::new(&crate::config::MaterializeConfig::default());
        let out = convert_to(&resolver, SchemaShape::Int, &TargetType::float(), &Value::Int(3)).unwrap();
        assert_eq!(out, DynamicValue::Float(3.0));
        let optional = TargetType::optional(TargetType::int());
        assert_eq!(convert_to(&resolver, SchemaShape::Long, &optional, &Value::Long(9)).unwrap(), DynamicValue::Int(9));

        let err = convert_to(&resolver, SchemaShape::Int, &TargetType::string(), &Value::Int(3)).unwrap_err();
        assert!(matches!(err, MaterializeError::TypeMismatch { .. }));
    }
}
