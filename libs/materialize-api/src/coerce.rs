use crate::error::ValueError;
use crate::target::{RecordType, ScalarKind, TargetType, Wrapper};
use crate::value::{ArrayItems, ArrayValue, DynamicValue, Finish, MapBuilder, RecordBuilder};

const MAX_WRAPPERS: usize = 64;

/// Convert an intermediate value into one strictly conforming to `target`.
///
/// Rules:
/// - `any` accepts everything; nil is accepted only where the target admits nil
/// - int widens to float; a float with no fractional part narrows to int
/// - arrays of ints in `0..=255` pack into byte sequences and back
/// - maps and records convert into each other by field name
/// - containers are coerced member-wise and frozen when the target is read-only
pub fn coerce(value: DynamicValue, target: &TargetType) -> Result<DynamicValue, ValueError> {
    coerce_at(value, target, 0)
}

fn coerce_at(value: DynamicValue, target: &TargetType, wrappers: usize) -> Result<DynamicValue, ValueError> {
    match target {
        TargetType::Wrapped { wrapper, inner } => {
            if wrappers >= MAX_WRAPPERS {
                return Err(ValueError::coercion(format!("wrapper chain of {target} exceeds {MAX_WRAPPERS}")));
            }
            if *wrapper == Wrapper::Optional && value.is_nil() {
                return Ok(DynamicValue::Nil);
            }
            let coerced = coerce_at(value, inner, wrappers + 1)?;
            Ok(if wrapper.is_read_only() { freeze(coerced) } else { coerced })
        }
        TargetType::Scalar { scalar } => coerce_scalar(value, *scalar),
        TargetType::Array { element } => coerce_array(value, target, element),
        TargetType::Map { value: value_ty } => coerce_map(value, target, value_ty),
        TargetType::Record(record) => coerce_record(value, target, record),
    }
}

fn mismatch(value: &DynamicValue, target: impl std::fmt::Display) -> ValueError {
    ValueError::coercion(format!("cannot convert {} to {target}", value.kind_name()))
}

fn coerce_scalar(value: DynamicValue, kind: ScalarKind) -> Result<DynamicValue, ValueError> {
    match (kind, value) {
        (ScalarKind::Any, v) => Ok(v),
        (ScalarKind::Nil, DynamicValue::Nil) => Ok(DynamicValue::Nil),
        (ScalarKind::Boolean, v @ DynamicValue::Boolean(_)) => Ok(v),
        (ScalarKind::Int, v @ DynamicValue::Int(_)) => Ok(v),
        (ScalarKind::Int, DynamicValue::Float(f)) => float_to_int(f).map(DynamicValue::Int),
        (ScalarKind::Float, v @ DynamicValue::Float(_)) => Ok(v),
        (ScalarKind::Float, DynamicValue::Int(i)) => Ok(DynamicValue::Float(i as f64)),
        (ScalarKind::String, v @ DynamicValue::String(_)) => Ok(v),
        (ScalarKind::Bytes, v @ DynamicValue::Bytes(_)) => Ok(v),
        (ScalarKind::Bytes, DynamicValue::Array(array)) => array
            .iter()
            .map(|item| match item {
                DynamicValue::Int(i) => u8::try_from(i)
                    .map_err(|_| ValueError::coercion(format!("{i} is not a byte"))),
                other => Err(mismatch(&other, "byte")),
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(DynamicValue::Bytes),
        (kind, v) => Err(mismatch(&v, kind)),
    }
}

fn float_to_int(f: f64) -> Result<i64, ValueError> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(f as i64)
    } else {
        Err(ValueError::coercion(format!("float {f} has no exact int representation")))
    }
}

fn coerce_array(value: DynamicValue, target: &TargetType, element: &TargetType) -> Result<DynamicValue, ValueError> {
    let items: Vec<DynamicValue> = match value {
        DynamicValue::Array(array) => array.to_values(),
        DynamicValue::Bytes(bytes) => bytes.into_iter().map(|b| DynamicValue::Int(i64::from(b))).collect(),
        other => return Err(mismatch(&other, target)),
    };
    let coerced = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| coerce(item, element).map_err(|e| e.with_context(format!("[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DynamicValue::Array(ArrayValue::new(target.clone(), ArrayItems::pack(element, coerced))))
}

fn entries_of(value: DynamicValue, target: &TargetType) -> Result<indexmap::IndexMap<String, DynamicValue>, ValueError> {
    match value {
        DynamicValue::Map(map) => Ok(map.into_entries()),
        DynamicValue::Record(rec) => Ok(rec.into_fields()),
        other => Err(mismatch(&other, target)),
    }
}

fn coerce_map(value: DynamicValue, target: &TargetType, value_ty: &TargetType) -> Result<DynamicValue, ValueError> {
    let entries = entries_of(value, target)?;
    let mut builder = MapBuilder::with_capacity(target.clone(), entries.len());
    for (key, item) in entries {
        let coerced = coerce(item, value_ty).map_err(|e| e.with_context(&key))?;
        builder.insert(key, coerced);
    }
    Ok(DynamicValue::Map(builder.finish(Finish::Mutable)))
}

fn coerce_record(value: DynamicValue, target: &TargetType, record: &RecordType) -> Result<DynamicValue, ValueError> {
    let mut entries = entries_of(value, target)?;
    let mut builder = RecordBuilder::new(target.clone());

    for field in &record.fields {
        match entries.shift_remove(&field.name) {
            Some(item) => {
                let coerced = coerce(item, &field.ty).map_err(|e| e.with_context(&field.name))?;
                builder.put(field.name.clone(), coerced);
            }
            None if field.optional => {}
            None => {
                return Err(ValueError::coercion(format!(
                    "missing required field '{}' of {}",
                    field.name,
                    record.display_name()
                )));
            }
        }
    }

    for (key, item) in entries {
        let Some(rest) = record.rest.as_deref() else {
            return Err(ValueError::coercion(format!(
                "field '{key}' is not declared by closed record {}",
                record.display_name()
            )));
        };
        let coerced = coerce(item, rest).map_err(|e| e.with_context(&key))?;
        builder.put(key, coerced);
    }

    Ok(DynamicValue::Record(builder.finish(Finish::Mutable)))
}

fn freeze(value: DynamicValue) -> DynamicValue {
    match value {
        DynamicValue::Map(mut map) => {
            map.freeze();
            DynamicValue::Map(map)
        }
        DynamicValue::Record(mut rec) => {
            rec.freeze();
            DynamicValue::Record(rec)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::target::FieldType;

    fn map_of(entries: Vec<(&str, DynamicValue)>) -> DynamicValue {
        let mut b = MapBuilder::new(TargetType::map(TargetType::any()));
        for (k, v) in entries {
            b.insert(k, v);
        }
        DynamicValue::Map(b.finish(Finish::Mutable))
    }

    #[test]
    fn widens_ints_inside_float_maps() {
        let out = coerce(
            map_of(vec![("a", DynamicValue::Int(2)), ("b", DynamicValue::Float(0.5))]),
            &TargetType::map(TargetType::float()),
        )
        .unwrap();
        let map = out.as_map().unwrap();
        assert_eq!(map.get("a"), Some(&DynamicValue::Float(2.0)));
        assert_eq!(map.get("b"), Some(&DynamicValue::Float(0.5)));
    }

    #[test]
    fn rejects_fractional_float_for_int() {
        let err = coerce(DynamicValue::Float(1.5), &TargetType::int()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Coercion);
        assert_eq!(coerce(DynamicValue::Float(3.0), &TargetType::int()).unwrap(), DynamicValue::Int(3));
    }

    #[test]
    fn nil_only_where_admitted() {
        assert!(coerce(DynamicValue::Nil, &TargetType::string()).is_err());
        assert_eq!(
            coerce(DynamicValue::Nil, &TargetType::optional(TargetType::string())).unwrap(),
            DynamicValue::Nil
        );
    }

    #[test]
    fn map_becomes_record_by_field_name() {
        let target = TargetType::record(
            "Point",
            vec![
                FieldType::new("x", TargetType::float()),
                FieldType::optional("label", TargetType::string()),
            ],
        );
        let out = coerce(map_of(vec![("x", DynamicValue::Int(1))]), &target).unwrap();
        let rec = out.as_record().unwrap();
        assert_eq!(rec.get("x"), Some(&DynamicValue::Float(1.0)));
        assert!(!rec.contains("label"));

        let err = coerce(map_of(vec![("label", "p".into())]), &target).unwrap_err();
        assert!(err.message.contains("missing required field 'x'"));
    }

    #[test]
    fn closed_record_rejects_undeclared_fields() {
        let target = TargetType::record("Empty", vec![]);
        let err = coerce(map_of(vec![("extra", DynamicValue::Int(1))]), &target).unwrap_err();
        assert!(err.message.contains("extra"));
    }

    #[test]
    fn read_only_target_freezes_result() {
        let target = TargetType::read_only(TargetType::map(TargetType::int()));
        let out = coerce(map_of(vec![("a", DynamicValue::Int(1))]), &target).unwrap();
        assert!(out.as_map().unwrap().is_frozen());
    }

    #[test]
    fn packs_int_arrays_into_bytes() {
        let array = DynamicValue::Array(ArrayValue::new(
            TargetType::array(TargetType::int()),
            ArrayItems::Ints(vec![1, 255]),
        ));
        assert_eq!(coerce(array, &TargetType::bytes()).unwrap(), DynamicValue::Bytes(vec![1, 255]));

        let too_big = DynamicValue::Array(ArrayValue::new(
            TargetType::array(TargetType::int()),
            ArrayItems::Ints(vec![256]),
        ));
        assert!(coerce(too_big, &TargetType::bytes()).is_err());
    }

    #[test]
    fn error_carries_member_path() {
        let err = coerce(
            map_of(vec![("k", "text".into())]),
            &TargetType::map(TargetType::int()),
        )
        .unwrap_err();
        assert_eq!(err.message, "k: cannot convert string to int");
    }
}
