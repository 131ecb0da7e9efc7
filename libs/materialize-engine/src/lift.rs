use apache_avro::types::Value;
use materialize_api::{ArrayItems, ArrayValue, DynamicValue, Finish, MapBuilder, RecordBuilder, TargetType};

use crate::error::MaterializeError;
use crate::leaf;

// ═══════════════════════════════════════════════════════════════
//  Avro → DynamicValue, without a target
// ═══════════════════════════════════════════════════════════════

/// Schema-free lift of a decoded value. Containers are typed `any`.
///
/// Used where no target shape applies. Fails only for a decimal whose
/// unscaled value does not fit its declared byte length.
pub(crate) fn lift(value: &Value) -> Result<DynamicValue, MaterializeError> {
    let lifted = match value {
        Value::Null => DynamicValue::Nil,
        Value::Boolean(b) => DynamicValue::Boolean(*b),
        Value::Int(i) => DynamicValue::Int(i64::from(*i)),
        Value::Long(l) => DynamicValue::Int(*l),
        Value::Float(f) => DynamicValue::Float(f64::from(*f)),
        Value::Double(d) => DynamicValue::Float(*d),
        Value::Bytes(_) | Value::Fixed(..) | Value::Decimal(_) | Value::Duration(_) => {
            DynamicValue::Bytes(leaf::bytes_of(value)?)
        }
        Value::String(s) | Value::Enum(_, s) => DynamicValue::String(s.clone()),
        Value::Union(_, inner) => lift(inner)?,
        Value::Array(items) => DynamicValue::Array(ArrayValue::new(
            TargetType::array(TargetType::any()),
            ArrayItems::Values(items.iter().map(lift).collect::<Result<_, _>>()?),
        )),
        Value::Map(entries) => {
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            let mut builder = MapBuilder::with_capacity(TargetType::map(TargetType::any()), keys.len());
            for key in keys {
                builder.insert(key.clone(), lift(&entries[key])?);
            }
            DynamicValue::Map(builder.finish(Finish::Mutable))
        }
        Value::Record(fields) => {
            let mut builder = RecordBuilder::new(TargetType::Record(materialize_api::RecordType {
                name: None,
                fields: Vec::new(),
                rest: Some(Box::new(TargetType::any())),
            }));
            for (name, field) in fields {
                builder.put(name.clone(), lift(field)?);
            }
            DynamicValue::Record(builder.finish(Finish::Mutable))
        }
        Value::Date(d) => DynamicValue::Int(i64::from(*d)),
        Value::TimeMillis(t) => DynamicValue::Int(i64::from(*t)),
        Value::TimeMicros(t) => DynamicValue::Int(*t),
        Value::TimestampMillis(t) => DynamicValue::Int(*t),
        Value::TimestampMicros(t) => DynamicValue::Int(*t),
        Value::TimestampNanos(t) => DynamicValue::Int(*t),
        Value::BigDecimal(d) => DynamicValue::String(d.to_string()),
        Value::Uuid(u) => DynamicValue::String(u.to_string()),
        Value::LocalTimestampMillis(t) => DynamicValue::Int(*t),
        Value::LocalTimestampMicros(t) => DynamicValue::Int(*t),
        Value::LocalTimestampNanos(t) => DynamicValue::Int(*t),
    };
    Ok(lifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::{Days, Duration, Millis, Months};

    #[test]
    fn lifts_nested_values() {
        let value = Value::Record(vec![
            ("id".into(), Value::Int(1)),
            ("tags".into(), Value::Array(vec![Value::String("a".into())])),
            ("opt".into(), Value::Union(0, Box::new(Value::Null))),
        ]);
        let json = serde_json::to_value(lift(&value).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 1, "tags": ["a"], "opt": null }));
    }

    #[test]
    fn duration_lifts_to_its_byte_image() {
        let d = Duration::new(Months::new(1), Days::new(2), Millis::new(3));
        assert_eq!(lift(&Value::Duration(d)).unwrap(), DynamicValue::Bytes(vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]));
    }
}
