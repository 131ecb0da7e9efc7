use std::collections::HashMap;

use apache_avro::Schema;
use apache_avro::schema::{RecordSchema, UnionSchema};

use crate::error::MaterializeError;

// ════════════════════════════════════════════════════════════════
//  Schema Shape
// ════════════════════════════════════════════════════════════════

/// Closed set of schema shapes the engine dispatches on.
///
/// Logical types collapse onto the primitive they are encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaShape {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Array,
    Map,
    Union,
    Enum,
    Fixed,
}

impl std::fmt::Display for SchemaShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchemaShape::Null => "null",
            SchemaShape::Boolean => "boolean",
            SchemaShape::Int => "int",
            SchemaShape::Long => "long",
            SchemaShape::Float => "float",
            SchemaShape::Double => "double",
            SchemaShape::Bytes => "bytes",
            SchemaShape::String => "string",
            SchemaShape::Record => "record",
            SchemaShape::Array => "array",
            SchemaShape::Map => "map",
            SchemaShape::Union => "union",
            SchemaShape::Enum => "enum",
            SchemaShape::Fixed => "fixed",
        };
        f.write_str(name)
    }
}

// ════════════════════════════════════════════════════════════════
//  Node
// ════════════════════════════════════════════════════════════════

/// A schema node with references resolved, borrowing its children.
#[derive(Debug, Clone, Copy)]
pub enum Node<'s> {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record(&'s RecordSchema),
    /// Element schema.
    Array(&'s Schema),
    /// Value schema.
    Map(&'s Schema),
    Union(&'s UnionSchema),
    Enum,
    Fixed,
}

impl Node<'_> {
    pub fn shape(&self) -> SchemaShape {
        match self {
            Node::Null => SchemaShape::Null,
            Node::Boolean => SchemaShape::Boolean,
            Node::Int => SchemaShape::Int,
            Node::Long => SchemaShape::Long,
            Node::Float => SchemaShape::Float,
            Node::Double => SchemaShape::Double,
            Node::Bytes => SchemaShape::Bytes,
            Node::String => SchemaShape::String,
            Node::Record(_) => SchemaShape::Record,
            Node::Array(_) => SchemaShape::Array,
            Node::Map(_) => SchemaShape::Map,
            Node::Union(_) => SchemaShape::Union,
            Node::Enum => SchemaShape::Enum,
            Node::Fixed => SchemaShape::Fixed,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Schema Names
// ════════════════════════════════════════════════════════════════

/// Named types (records, enums, fixed) of one schema tree, by full name.
///
/// Used to resolve `Schema::Ref` nodes, which is how recursive schemas
/// refer back to an enclosing record.
#[derive(Debug, Default)]
pub struct SchemaNames<'s> {
    by_name: HashMap<String, &'s Schema>,
}

impl<'s> SchemaNames<'s> {
    pub fn collect(root: &'s Schema) -> Self {
        let mut names = Self::default();
        names.visit(root);
        names
    }

    fn visit(&mut self, schema: &'s Schema) {
        match schema {
            Schema::Record(record) => {
                if self.by_name.insert(record.name.fullname(None), schema).is_some() {
                    return;
                }
                for field in &record.fields {
                    self.visit(&field.schema);
                }
            }
            Schema::Enum(e) => {
                self.by_name.insert(e.name.fullname(None), schema);
            }
            Schema::Fixed(f) => {
                self.by_name.insert(f.name.fullname(None), schema);
            }
            Schema::Array(array) => self.visit(&array.items),
            Schema::Map(map) => self.visit(&map.types),
            Schema::Union(union) => {
                for variant in union.variants() {
                    self.visit(variant);
                }
            }
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Follow a reference to the named schema it points at.
    pub fn resolve(&self, schema: &'s Schema) -> Result<&'s Schema, MaterializeError> {
        match schema {
            Schema::Ref { name } => {
                let fullname = name.fullname(None);
                self.by_name
                    .get(&fullname)
                    .copied()
                    .ok_or(MaterializeError::UnresolvedReference(fullname))
            }
            other => Ok(other),
        }
    }

    /// Resolve and classify a schema node.
    pub fn node(&self, schema: &'s Schema) -> Result<Node<'s>, MaterializeError> {
        let node = match self.resolve(schema)? {
            Schema::Null => Node::Null,
            Schema::Boolean => Node::Boolean,
            Schema::Int | Schema::Date | Schema::TimeMillis => Node::Int,
            Schema::Long
            | Schema::TimeMicros
            | Schema::TimestampMillis
            | Schema::TimestampMicros
            | Schema::TimestampNanos
            | Schema::LocalTimestampMillis
            | Schema::LocalTimestampMicros
            | Schema::LocalTimestampNanos => Node::Long,
            Schema::Float => Node::Float,
            Schema::Double => Node::Double,
            Schema::Bytes | Schema::Decimal(_) => Node::Bytes,
            Schema::String | Schema::Uuid | Schema::BigDecimal => Node::String,
            Schema::Record(record) => Node::Record(record),
            Schema::Array(array) => Node::Array(&array.items),
            Schema::Map(map) => Node::Map(&map.types),
            Schema::Union(union) => Node::Union(union),
            Schema::Enum(_) => Node::Enum,
            Schema::Fixed(_) => Node::Fixed,
            Schema::Ref { name } => {
                return Err(MaterializeError::UnresolvedReference(name.fullname(None)));
            }
            // duration is a 12-byte fixed
            _ => Node::Fixed,
        };
        Ok(node)
    }

    pub fn shape(&self, schema: &'s Schema) -> Result<SchemaShape, MaterializeError> {
        self.node(schema).map(|n| n.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_recursive_reference() {
        let schema = Schema::parse_str(
            r#"{
                "type": "record", "name": "Node", "namespace": "list",
                "fields": [
                    { "name": "value", "type": "int" },
                    { "name": "next", "type": ["null", "Node"] }
                ]
            }"#,
        )
        .unwrap();
        let names = SchemaNames::collect(&schema);
        assert_eq!(names.len(), 1);

        let Schema::Record(record) = &schema else { panic!("expected record") };
        let Node::Union(union) = names.node(&record.fields[1].schema).unwrap() else {
            panic!("expected union")
        };
        assert_eq!(names.shape(&union.variants()[1]).unwrap(), SchemaShape::Record);
    }

    #[test]
    fn logical_types_collapse_to_primitives() {
        let names = SchemaNames::default();
        assert_eq!(names.shape(&Schema::Date).unwrap(), SchemaShape::Int);
        assert_eq!(names.shape(&Schema::TimestampMillis).unwrap(), SchemaShape::Long);
        assert_eq!(names.shape(&Schema::Uuid).unwrap(), SchemaShape::String);
    }
}
