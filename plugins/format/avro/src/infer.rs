use apache_avro::Schema;
use materialize_api::{FieldType, TargetType};
use materialize_engine::{MaterializeError, SchemaNames};

/// Derive a target type that mirrors an Avro schema.
///
/// - `["null", T]` unions become optional `T`; other multi-branch unions become `any`
/// - enums read as strings, fixed blobs as bytes
/// - a record referring back to an enclosing record gets `any` at the cycle
pub fn infer_target(schema: &Schema) -> Result<TargetType, MaterializeError> {
    let names = SchemaNames::collect(schema);
    infer(&names, schema, &mut Vec::new())
}

fn infer<'s>(names: &SchemaNames<'s>, schema: &'s Schema, open: &mut Vec<String>) -> Result<TargetType, MaterializeError> {
    let ty = match names.resolve(schema)? {
        Schema::Null => TargetType::nil(),
        Schema::Boolean => TargetType::boolean(),
        Schema::Int
        | Schema::Long
        | Schema::Date
        | Schema::TimeMillis
        | Schema::TimeMicros
        | Schema::TimestampMillis
        | Schema::TimestampMicros
        | Schema::TimestampNanos
        | Schema::LocalTimestampMillis
        | Schema::LocalTimestampMicros
        | Schema::LocalTimestampNanos => TargetType::int(),
        Schema::Float | Schema::Double => TargetType::float(),
        // big-decimal reads as its decimal rendering
        Schema::String | Schema::Enum(_) | Schema::Uuid | Schema::BigDecimal => TargetType::string(),
        Schema::Array(array) => TargetType::array(infer(names, &array.items, open)?),
        Schema::Map(map) => TargetType::map(infer(names, &map.types, open)?),
        Schema::Union(union) => {
            let variants = union.variants();
            let non_null: Vec<&Schema> = variants.iter().filter(|v| !matches!(v, Schema::Null)).collect();
            match non_null.as_slice() {
                [only] if non_null.len() < variants.len() => TargetType::optional(infer(names, only, open)?),
                [only] => infer(names, only, open)?,
                _ => TargetType::any(),
            }
        }
        Schema::Record(record) => {
            let fullname = record.name.fullname(None);
            if open.contains(&fullname) {
                return Ok(TargetType::alias(fullname, TargetType::any()));
            }
            open.push(fullname.clone());
            let fields = record
                .fields
                .iter()
                .map(|field| Ok(FieldType::new(field.name.clone(), infer(names, &field.schema, open)?)))
                .collect::<Result<Vec<_>, MaterializeError>>()?;
            open.pop();
            TargetType::record(fullname, fields)
        }
        // bytes, fixed, decimal, duration
        _ => TargetType::bytes(),
    };
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_union_becomes_optional() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record", "name": "User",
                "fields": [
                    { "name": "name", "type": "string" },
                    { "name": "email", "type": ["null", "string"] },
                    { "name": "tags", "type": { "type": "array", "items": "string" } },
                    { "name": "any", "type": ["int", "string"] }
                ]
            }"#,
        )
        .unwrap();
        let expected = TargetType::record(
            "User",
            vec![
                FieldType::new("name", TargetType::string()),
                FieldType::new("email", TargetType::optional(TargetType::string())),
                FieldType::new("tags", TargetType::array(TargetType::string())),
                FieldType::new("any", TargetType::any()),
            ],
        );
        assert_eq!(infer_target(&schema).unwrap(), expected);
    }

    #[test]
    fn recursive_record_terminates() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record", "name": "Node",
                "fields": [
                    { "name": "value", "type": "long" },
                    { "name": "next", "type": ["null", "Node"] }
                ]
            }"#,
        )
        .unwrap();
        let expected = TargetType::record(
            "Node",
            vec![
                FieldType::new("value", TargetType::int()),
                FieldType::new("next", TargetType::optional(TargetType::alias("Node", TargetType::any()))),
            ],
        );
        assert_eq!(infer_target(&schema).unwrap(), expected);
    }

    #[test]
    fn logical_types_follow_their_encoding() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record", "name": "Ledger",
                "fields": [
                    { "name": "at", "type": { "type": "long", "logicalType": "timestamp-millis" } },
                    { "name": "id", "type": { "type": "string", "logicalType": "uuid" } },
                    { "name": "exact", "type": { "type": "bytes", "logicalType": "big-decimal" } },
                    { "name": "amount", "type": { "type": "bytes", "logicalType": "decimal", "precision": 9, "scale": 2 } },
                    { "name": "span", "type": { "type": "fixed", "name": "Span", "size": 12, "logicalType": "duration" } }
                ]
            }"#,
        )
        .unwrap();
        let expected = TargetType::record(
            "Ledger",
            vec![
                FieldType::new("at", TargetType::int()),
                FieldType::new("id", TargetType::string()),
                FieldType::new("exact", TargetType::string()),
                FieldType::new("amount", TargetType::bytes()),
                FieldType::new("span", TargetType::bytes()),
            ],
        );
        assert_eq!(infer_target(&schema).unwrap(), expected);
    }
}
