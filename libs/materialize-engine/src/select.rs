use apache_avro::Schema;
use apache_avro::types::Value;
use materialize_api::{ArrayItems, DynamicValue, ScalarKind, TargetType};

use crate::context::Cx;
use crate::error::MaterializeError;
use crate::shape::{Node, SchemaShape};
use crate::{array, enumeration, fixed, leaf, map, record, union};

/// Conversion strategy for a schema shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    Primitive,
    Array,
    Map,
    Record,
    Enum,
    Fixed,
    Union,
}

/// Converter for a schema shape. Total: every shape has exactly one kind.
pub fn select(shape: SchemaShape) -> ConverterKind {
    match shape {
        SchemaShape::Array => ConverterKind::Array,
        SchemaShape::Fixed => ConverterKind::Fixed,
        SchemaShape::Map => ConverterKind::Map,
        SchemaShape::Record => ConverterKind::Record,
        SchemaShape::Enum => ConverterKind::Enum,
        SchemaShape::Union => ConverterKind::Union,
        SchemaShape::Null
        | SchemaShape::Boolean
        | SchemaShape::Int
        | SchemaShape::Long
        | SchemaShape::Float
        | SchemaShape::Double
        | SchemaShape::Bytes
        | SchemaShape::String => ConverterKind::Primitive,
    }
}

/// A schema node paired with its target, for one descent step.
pub(crate) struct Converter<'t, 's> {
    kind: ConverterKind,
    node: Node<'s>,
    target: &'t TargetType,
}

impl<'t, 's> Converter<'t, 's> {
    pub fn new(cx: &Cx<'_, 's>, schema: &'s Schema, target: &'t TargetType) -> Result<Self, MaterializeError> {
        let node = cx.names.node(schema)?;
        Ok(Self { kind: select(node.shape()), node, target })
    }

    pub fn convert(&self, cx: &Cx<'_, 's>, value: &Value) -> Result<DynamicValue, MaterializeError> {
        tracing::trace!(
            kind = ?self.kind,
            shape = %self.node.shape(),
            ty = %self.target,
            depth = cx.depth(),
            "converter selected"
        );
        match (self.kind, self.node) {
            (ConverterKind::Array, Node::Array(items)) => array::convert(cx, items, self.target, value),
            (ConverterKind::Map, Node::Map(values)) => map::convert(cx, values, self.target, value),
            (ConverterKind::Record, Node::Record(schema)) => match value {
                // record schema reached through an array context
                Value::Array(items) => record::convert_sequence(cx, schema, self.target, items),
                _ => record::convert(cx, schema, self.target, value),
            },
            (ConverterKind::Union, Node::Union(schema)) => union::convert(cx, schema, self.target, value),
            (ConverterKind::Enum, _) => match value {
                Value::Array(items) => {
                    let symbols = enumeration::convert_symbols(items)?;
                    array::sequence(cx, self.target, ArrayItems::Strings(symbols))
                }
                _ => match leaf::target_kind(&cx.resolver, self.target, SchemaShape::Enum)? {
                    ScalarKind::String | ScalarKind::Any => enumeration::convert_symbol(value),
                    _ => Err(MaterializeError::mismatch(self.target, SchemaShape::Enum)),
                },
            },
            (ConverterKind::Fixed, _) => match value {
                Value::Array(items) => {
                    let blobs = fixed::convert_blobs(items)?;
                    array::sequence(cx, self.target, ArrayItems::Bytes(blobs))
                }
                _ => match leaf::target_kind(&cx.resolver, self.target, SchemaShape::Fixed)? {
                    ScalarKind::Bytes | ScalarKind::Any => fixed::convert_blob(value),
                    _ => Err(MaterializeError::mismatch(self.target, SchemaShape::Fixed)),
                },
            },
            (_, node) => leaf::convert_to(&cx.resolver, node.shape(), self.target, value),
        }
    }
}

/// Entry point for one schema/target/value triple.
pub(crate) fn convert<'s>(
    cx: &Cx<'_, 's>,
    schema: &'s Schema,
    target: &TargetType,
    value: &Value,
) -> Result<DynamicValue, MaterializeError> {
    Converter::new(cx, schema, target)?.convert(cx, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_share_one_converter() {
        for shape in [
            SchemaShape::Null,
            SchemaShape::Boolean,
            SchemaShape::Int,
            SchemaShape::Long,
            SchemaShape::Float,
            SchemaShape::Double,
            SchemaShape::Bytes,
            SchemaShape::String,
        ] {
            assert_eq!(select(shape), ConverterKind::Primitive);
        }
    }

    #[test]
    fn containers_select_their_own_converter() {
        assert_eq!(select(SchemaShape::Array), ConverterKind::Array);
        assert_eq!(select(SchemaShape::Map), ConverterKind::Map);
        assert_eq!(select(SchemaShape::Record), ConverterKind::Record);
        assert_eq!(select(SchemaShape::Union), ConverterKind::Union);
        assert_eq!(select(SchemaShape::Enum), ConverterKind::Enum);
        assert_eq!(select(SchemaShape::Fixed), ConverterKind::Fixed);
    }
}
