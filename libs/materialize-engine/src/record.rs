use apache_avro::schema::{RecordField, RecordSchema};
use apache_avro::types::Value;
use materialize_api::{
    ArrayItems, DynamicValue, Finish, RecordBuilder, RecordType, ShapeCategory, TargetType, coerce,
};

use crate::context::Cx;
use crate::error::MaterializeError;
use crate::leaf::{self, NumericSource, shape_error};
use crate::lift::lift;
use crate::shape::{Node, SchemaShape};
use crate::{array, enumeration, fixed, map, union};

/// Record converter for a single named-field object.
///
/// Every schema field gets an entry (nil when the decoded record lacks it).
/// The field's target comes from the record type by name, falling back to
/// its `rest` type; a closed record that does not declare the field fails.
pub(crate) fn convert<'s>(
    cx: &Cx<'_, 's>,
    schema: &'s RecordSchema,
    target: &TargetType,
    value: &Value,
) -> Result<DynamicValue, MaterializeError> {
    let cx = cx.descend()?;
    let Value::Record(decoded) = value else {
        return Err(shape_error(SchemaShape::Record, value));
    };
    let finish = if cx.resolver.is_frozen(target) { Finish::Frozen } else { Finish::Mutable };
    let record_ty = cx.resolver.unwrap(target, ShapeCategory::Record)?;
    let TargetType::Record(record) = record_ty else {
        return Err(MaterializeError::mismatch(ShapeCategory::Record, record_ty));
    };

    let mut builder = RecordBuilder::new(record_ty.clone());
    for field in &schema.fields {
        let field_ty = field_target(record, field)?;
        match decoded.iter().find(|(name, _)| *name == field.name) {
            Some((_, item)) => write_field(&cx, field, field_ty, item, &mut builder)
                .map_err(|e| e.with_context(&field.name))?,
            None => {
                builder.put(field.name.clone(), DynamicValue::Nil);
            }
        }
    }

    tracing::trace!(record = record.display_name(), fields = schema.fields.len(), ?finish, "record built");
    Ok(DynamicValue::Record(builder.finish(finish)))
}

/// Records reached through an array context: `target` is array-shaped and
/// each element converts against its element type.
pub(crate) fn convert_sequence<'s>(
    cx: &Cx<'_, 's>,
    schema: &'s RecordSchema,
    target: &TargetType,
    items: &[Value],
) -> Result<DynamicValue, MaterializeError> {
    let element = cx.resolver.element(target)?;
    let records = convert_items(cx, schema, element, items)?;
    array::sequence(cx, target, ArrayItems::Values(records))
}

pub(crate) fn convert_items<'s>(
    cx: &Cx<'_, 's>,
    schema: &'s RecordSchema,
    element: &TargetType,
    items: &[Value],
) -> Result<Vec<DynamicValue>, MaterializeError> {
    array::indexed(items, |item| convert(cx, schema, element, item))
}

fn field_target<'t>(record: &'t RecordType, field: &RecordField) -> Result<&'t TargetType, MaterializeError> {
    record.field_type(&field.name).ok_or_else(|| MaterializeError::UndeclaredField {
        record: record.display_name().to_string(),
        field: field.name.clone(),
    })
}

fn write_field<'s>(
    cx: &Cx<'_, 's>,
    field: &'s RecordField,
    field_ty: &TargetType,
    item: &Value,
    builder: &mut RecordBuilder,
) -> Result<(), MaterializeError> {
    let converted = match cx.names.node(&field.schema)? {
        Node::Union(schema) => return union::merge_field(cx, schema, &field.name, field_ty, item, builder),
        Node::Map(values) => map::convert(cx, values, field_ty, item)?,
        Node::Array(items) => array::convert(cx, items, field_ty, item)?,
        Node::Record(nested) => convert(cx, nested, field_ty, item)?,
        Node::Null => leaf::convert(SchemaShape::Null, item)?,
        Node::Bytes => scalar(leaf::bytes_of(item).map(DynamicValue::Bytes)?, field_ty)?,
        Node::String => scalar(leaf::string_of(item).map(DynamicValue::String)?, field_ty)?,
        Node::Int => scalar(leaf::widen_int(NumericSource::Int32, item).map(DynamicValue::Int)?, field_ty)?,
        Node::Float => {
            scalar(leaf::widen_float(NumericSource::Float32, item).map(DynamicValue::Float)?, field_ty)?
        }
        Node::Enum => scalar(enumeration::convert_symbol(item)?, field_ty)?,
        Node::Fixed => scalar(fixed::convert_blob(item)?, field_ty)?,
        Node::Boolean | Node::Long | Node::Double => scalar(lift(item)?, field_ty)?,
    };
    builder.put(field.name.clone(), converted);
    Ok(())
}

fn scalar(value: DynamicValue, field_ty: &TargetType) -> Result<DynamicValue, MaterializeError> {
    Ok(coerce(value, field_ty)?)
}
