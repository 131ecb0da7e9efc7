use apache_avro::Schema;
use apache_avro::types::Value;
use materialize_api::{ArrayItems, ArrayValue, DynamicValue, ShapeCategory, TargetType};

use crate::context::Cx;
use crate::error::MaterializeError;
use crate::leaf::{self, Plan, shape_error};
use crate::shape::{Node, SchemaShape};
use crate::{enumeration, fixed, map, record, union};

/// Apply `f` to every element, tagging failures with the element index.
pub(crate) fn indexed<T>(
    values: &[Value],
    mut f: impl FnMut(&Value) -> Result<T, MaterializeError>,
) -> Result<Vec<T>, MaterializeError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| f(value).map_err(|e| e.with_context(format!("[{i}]"))))
        .collect()
}

/// Wrap already converted items in an array value typed by `target`.
pub(crate) fn sequence(cx: &Cx<'_, '_>, target: &TargetType, items: ArrayItems) -> Result<DynamicValue, MaterializeError> {
    let array_ty = cx.resolver.unwrap(target, ShapeCategory::Array)?;
    Ok(DynamicValue::Array(ArrayValue::new(array_ty.clone(), items)))
}

/// Array converter. The element strategy is picked from the element schema.
pub(crate) fn convert<'s>(
    cx: &Cx<'_, 's>,
    items_schema: &'s Schema,
    target: &TargetType,
    value: &Value,
) -> Result<DynamicValue, MaterializeError> {
    let cx = cx.descend()?;
    let Value::Array(values) = value else {
        return Err(shape_error(SchemaShape::Array, value));
    };
    let element = cx.resolver.element(target)?;

    let items = match cx.names.node(items_schema)? {
        Node::Union(schema) => ArrayItems::Values(indexed(values, |v| union::convert(&cx, schema, element, v))?),
        Node::Array(inner) => ArrayItems::Values(indexed(values, |v| convert(&cx, inner, element, v))?),
        Node::Enum => ArrayItems::Strings(enumeration::convert_symbols(values)?),
        Node::Record(schema) => ArrayItems::Values(record::convert_items(&cx, schema, element, values)?),
        Node::Map(inner) => ArrayItems::Values(indexed(values, |v| map::convert(&cx, inner, element, v))?),
        Node::Fixed => ArrayItems::Bytes(fixed::convert_blobs(values)?),
        node @ (Node::Null
        | Node::Boolean
        | Node::Int
        | Node::Long
        | Node::Float
        | Node::Double
        | Node::Bytes
        | Node::String) => bulk(&cx, node.shape(), element, values)?,
    };
    sequence(&cx, target, items)
}

/// Homogeneous conversion for primitive elements, keyed by the target element kind.
fn bulk(
    cx: &Cx<'_, '_>,
    shape: SchemaShape,
    element: &TargetType,
    values: &[Value],
) -> Result<ArrayItems, MaterializeError> {
    let plan = leaf::plan(&cx.resolver, shape, element)?;
    match plan {
        Plan::Int(f) => indexed(values, f).map(ArrayItems::Ints),
        Plan::Float(f) => indexed(values, f).map(ArrayItems::Floats),
        Plan::String => indexed(values, leaf::string_of).map(ArrayItems::Strings),
        Plan::Boolean => indexed(values, leaf::bool_of).map(ArrayItems::Booleans),
        Plan::Bytes => indexed(values, leaf::bytes_of).map(ArrayItems::Bytes),
        Plan::Verbatim => indexed(values, |v| plan.apply(shape, v)).map(ArrayItems::Values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaterializeConfig;
    use crate::shape::SchemaNames;

    fn run(schema: &str, target: TargetType, value: Value) -> Result<DynamicValue, MaterializeError> {
        let schema = Schema::parse_str(schema).unwrap();
        let names = SchemaNames::collect(&schema);
        let cx = Cx::new(&names, &MaterializeConfig::default());
        let Schema::Array(array) = &schema else { panic!("expected array schema") };
        convert(&cx, &array.items, &target, &value)
    }

    #[test]
    fn int_elements_are_stored_unboxed() {
        let out = run(
            r#"{"type": "array", "items": "int"}"#,
            TargetType::array(TargetType::int()),
            Value::Array(vec![Value::Int(1), Value::Int(-2)]),
        )
        .unwrap();
        let array = out.as_array().unwrap();
        assert!(matches!(array.items(), ArrayItems::Ints(v) if v == &[1, -2]));
    }

    #[test]
    fn long_elements_widen_to_float_target() {
        let out = run(
            r#"{"type": "array", "items": "long"}"#,
            TargetType::array(TargetType::float()),
            Value::Array(vec![Value::Long(3)]),
        )
        .unwrap();
        assert_eq!(out.as_array().unwrap().get(0), Some(DynamicValue::Float(3.0)));
    }

    #[test]
    fn float_schema_into_int_target_is_a_mismatch() {
        let err = run(
            r#"{"type": "array", "items": "double"}"#,
            TargetType::array(TargetType::int()),
            Value::Array(vec![Value::Double(1.0)]),
        )
        .unwrap_err();
        assert!(matches!(err, MaterializeError::TypeMismatch { .. }));
    }

    #[test]
    fn bad_element_reports_its_index() {
        let err = run(
            r#"{"type": "array", "items": "string"}"#,
            TargetType::array(TargetType::string()),
            Value::Array(vec![Value::String("a".into()), Value::Int(1)]),
        )
        .unwrap_err();
        assert_eq!(err.path(), Some("[1]"));
    }

    #[test]
    fn nested_arrays_recurse() {
        let out = run(
            r#"{"type": "array", "items": {"type": "array", "items": "string"}}"#,
            TargetType::array(TargetType::array(TargetType::string())),
            Value::Array(vec![
                Value::Array(vec![Value::String("a".into())]),
                Value::Array(vec![]),
            ]),
        )
        .unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json, serde_json::json!([["a"], []]));
    }

    #[test]
    fn enum_elements_become_strings() {
        let out = run(
            r#"{"type": "array", "items": {"type": "enum", "name": "E", "symbols": ["A", "B"]}}"#,
            TargetType::array(TargetType::string()),
            Value::Array(vec![Value::Enum(1, "B".into()), Value::Enum(0, "A".into())]),
        )
        .unwrap();
        assert!(matches!(out.as_array().unwrap().items(), ArrayItems::Strings(v) if v == &["B", "A"]));
    }
}
