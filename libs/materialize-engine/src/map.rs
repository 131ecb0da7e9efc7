use apache_avro::Schema;
use apache_avro::types::Value;
use materialize_api::{DynamicValue, Finish, MapBuilder, ShapeCategory, TargetType, coerce};

use crate::context::Cx;
use crate::error::MaterializeError;
use crate::leaf::{self, NumericSource, shape_error};
use crate::lift::lift;
use crate::shape::{Node, SchemaShape};
use crate::{array, enumeration, fixed, record, union};

/// Map converter.
///
/// `target` may be the map type itself or a record holding a map-typed
/// field, see [`Resolver::map_target`](crate::Resolver::map_target). Entries
/// are converted per value schema into an intermediate map, which is then
/// coerced to the resolved map type. Keys come out sorted.
pub(crate) fn convert<'s>(
    cx: &Cx<'_, 's>,
    values_schema: &'s Schema,
    target: &TargetType,
    value: &Value,
) -> Result<DynamicValue, MaterializeError> {
    let cx = cx.descend()?;
    let Value::Map(entries) = value else {
        return Err(shape_error(SchemaShape::Map, value));
    };
    let map_ty = cx.resolver.map_target(target)?;
    let value_ty = match cx.resolver.unwrap(map_ty, ShapeCategory::Map)? {
        TargetType::Map { value } => value.as_ref(),
        other => return Err(MaterializeError::mismatch(ShapeCategory::Map, other)),
    };
    let node = cx.names.node(values_schema)?;

    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();

    let mut intermediate = MapBuilder::with_capacity(TargetType::map(TargetType::any()), keys.len());
    for key in keys {
        let converted = entry(&cx, node, value_ty, &entries[key]).map_err(|e| e.with_context(key))?;
        intermediate.insert(key.clone(), converted);
    }

    let intermediate = DynamicValue::Map(intermediate.finish(Finish::Mutable));
    Ok(coerce(intermediate, map_ty)?)
}

fn entry<'s>(
    cx: &Cx<'_, 's>,
    node: Node<'s>,
    value_ty: &TargetType,
    item: &Value,
) -> Result<DynamicValue, MaterializeError> {
    match node {
        Node::Array(items) => array::convert(cx, items, value_ty, item),
        Node::Bytes => leaf::bytes_of(item).map(DynamicValue::Bytes),
        Node::Fixed => fixed::convert_blob(item),
        Node::Enum => enumeration::convert_symbol(item),
        Node::String => leaf::string_of(item).map(DynamicValue::String),
        Node::Record(schema) => record::convert(cx, schema, value_ty, item),
        Node::Float => leaf::widen_float(NumericSource::Float32, item).map(DynamicValue::Float),
        Node::Map(inner) => convert(cx, inner, value_ty, item),
        Node::Union(schema) => union::convert(cx, schema, value_ty, item),
        // copied through; the coercion pass checks them against the value type
        Node::Null | Node::Boolean | Node::Int | Node::Long | Node::Double => lift(item),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::MaterializeConfig;
    use crate::shape::SchemaNames;
    use materialize_api::FieldType;

    fn run(schema: &str, target: TargetType, value: Value) -> Result<DynamicValue, MaterializeError> {
        let schema = Schema::parse_str(schema).unwrap();
        let names = SchemaNames::collect(&schema);
        let cx = Cx::new(&names, &MaterializeConfig::default());
        let Schema::Map(map) = &schema else { panic!("expected map schema") };
        convert(&cx, &map.types, &target, &value)
    }

    fn avro_map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<HashMap<_, _>>())
    }

    #[test]
    fn float_values_widen() {
        let out = run(
            r#"{"type": "map", "values": "float"}"#,
            TargetType::map(TargetType::float()),
            avro_map(vec![("k1", Value::Float(3.14))]),
        )
        .unwrap();
        assert_eq!(out.as_map().unwrap().get("k1"), Some(&DynamicValue::Float(f64::from(3.14f32))));
    }

    #[test]
    fn keys_come_out_sorted() {
        let out = run(
            r#"{"type": "map", "values": "long"}"#,
            TargetType::map(TargetType::int()),
            avro_map(vec![("b", Value::Long(2)), ("a", Value::Long(1)), ("c", Value::Long(3))]),
        )
        .unwrap();
        let keys: Vec<&String> = out.as_map().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn passthrough_values_are_coerced() {
        let err = run(
            r#"{"type": "map", "values": "boolean"}"#,
            TargetType::map(TargetType::int()),
            avro_map(vec![("flag", Value::Boolean(true))]),
        )
        .unwrap_err();
        let MaterializeError::Coercion(inner) = err else { panic!("expected coercion error, got {err}") };
        assert_eq!(inner.message, "flag: cannot convert boolean to int");
    }

    #[test]
    fn record_target_discovers_map_field() {
        let target = TargetType::record(
            "Holder",
            vec![
                FieldType::new("a", TargetType::map(TargetType::string())),
                FieldType::new("b", TargetType::int()),
            ],
        );
        let out = run(
            r#"{"type": "map", "values": "string"}"#,
            target,
            avro_map(vec![("x", Value::String("y".into()))]),
        )
        .unwrap();
        let map = out.as_map().unwrap();
        assert_eq!(map.ty(), &TargetType::map(TargetType::string()));
        assert_eq!(map.get("x"), Some(&DynamicValue::from("y")));
    }

    #[test]
    fn read_only_target_freezes_result() {
        let out = run(
            r#"{"type": "map", "values": "string"}"#,
            TargetType::read_only(TargetType::map(TargetType::string())),
            avro_map(vec![("x", Value::String("y".into()))]),
        )
        .unwrap();
        let DynamicValue::Map(mut map) = out else { panic!("expected map") };
        assert!(map.is_frozen());
        assert!(map.insert("z", DynamicValue::Nil).is_err());
    }
}
