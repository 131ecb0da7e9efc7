//! Type-directed materialization of decoded Avro values.
//!
//! [`materialize`] walks an Avro schema, the decoded value and a target
//! type descriptor side by side and produces a [`DynamicValue`] conforming
//! to the target.

mod array;
mod config;
mod context;
mod enumeration;
mod error;
mod fixed;
mod leaf;
mod lift;
mod map;
mod record;
mod resolve;
mod select;
mod shape;
mod union;

use apache_avro::Schema;
use apache_avro::types::Value;
use materialize_api::{DynamicValue, TargetType};

pub use config::{FieldDiscovery, MaterializeConfig};
pub use error::MaterializeError;
pub use leaf::{NumericSource, NumericTarget};
pub use resolve::Resolver;
pub use select::{ConverterKind, select};
pub use shape::{SchemaNames, SchemaShape};

use context::Cx;

/// Materialization engine with a fixed configuration.
///
/// Stateless between calls; one instance can serve any number of
/// schema/target/value triples, from any thread.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    config: MaterializeConfig,
}

impl Materializer {
    pub fn new(config: MaterializeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaterializeConfig {
        &self.config
    }

    pub fn materialize(
        &self,
        schema: &Schema,
        target: &TargetType,
        value: &Value,
    ) -> Result<DynamicValue, MaterializeError> {
        let names = SchemaNames::collect(schema);
        self.materialize_with(&names, schema, target, value)
    }

    /// Like [`materialize`](Self::materialize) with a prebuilt name table,
    /// for callers converting many values against one schema.
    pub fn materialize_with<'s>(
        &self,
        names: &SchemaNames<'s>,
        schema: &'s Schema,
        target: &TargetType,
        value: &Value,
    ) -> Result<DynamicValue, MaterializeError> {
        let cx = Cx::new(names, &self.config);
        select::convert(&cx, schema, target, value)
    }
}

/// Materialize `value`, decoded with `schema`, into `target` using the
/// default configuration.
pub fn materialize(schema: &Schema, target: &TargetType, value: &Value) -> Result<DynamicValue, MaterializeError> {
    Materializer::default().materialize(schema, target, value)
}
