use materialize_api::{ShapeCategory, TargetType};

use crate::config::{FieldDiscovery, MaterializeConfig};
use crate::error::MaterializeError;

/// Target-type resolver: unwraps aliases, optionals, read-only wrappers
/// and intersections to the structural shape a converter needs.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    max_unwrap_depth: usize,
    field_discovery: FieldDiscovery,
}

impl Resolver {
    pub fn new(config: &MaterializeConfig) -> Self {
        Self {
            max_unwrap_depth: config.max_unwrap_depth,
            field_discovery: config.field_discovery,
        }
    }

    /// Follow wrapper links until the type has shape `required`.
    pub fn unwrap<'t>(
        &self,
        target: &'t TargetType,
        required: ShapeCategory,
    ) -> Result<&'t TargetType, MaterializeError> {
        let inner = self.innermost(target)?;
        if inner.category() == Some(required) {
            Ok(inner)
        } else {
            Err(MaterializeError::mismatch(required, target))
        }
    }

    /// First non-wrapped type behind `target`.
    pub fn innermost<'t>(&self, target: &'t TargetType) -> Result<&'t TargetType, MaterializeError> {
        target.innermost(self.max_unwrap_depth).ok_or(MaterializeError::DepthExceeded {
            limit: self.max_unwrap_depth,
        })
    }

    /// Produced containers for this target must be frozen.
    pub fn is_frozen(&self, target: &TargetType) -> bool {
        target.is_frozen()
    }

    /// Element type of an array-shaped target.
    pub fn element<'t>(&self, target: &'t TargetType) -> Result<&'t TargetType, MaterializeError> {
        match self.unwrap(target, ShapeCategory::Array)? {
            TargetType::Array { element } => Ok(element),
            other => Err(MaterializeError::mismatch(ShapeCategory::Array, other)),
        }
    }

    /// Locate the map type to convert a map value into.
    ///
    /// A map-shaped target is used as-is. A record-shaped target is scanned
    /// one level deep for a map-typed field (looking through wrappers on each
    /// field); the returned type keeps that field's wrappers.
    pub fn map_target<'t>(&self, target: &'t TargetType) -> Result<&'t TargetType, MaterializeError> {
        match self.innermost(target)? {
            TargetType::Map { .. } => Ok(target),
            TargetType::Record(record) => {
                let mut found = None;
                for field in &record.fields {
                    if !matches!(self.innermost(&field.ty)?, TargetType::Map { .. }) {
                        continue;
                    }
                    found = Some(field);
                    if self.field_discovery == FieldDiscovery::FirstMatch {
                        break;
                    }
                }
                match found {
                    Some(field) => {
                        tracing::debug!(
                            record = record.display_name(),
                            field = %field.name,
                            "map target discovered in record field"
                        );
                        Ok(&field.ty)
                    }
                    None => Err(MaterializeError::mismatch(ShapeCategory::Map, target)),
                }
            }
            _ => Err(MaterializeError::mismatch(ShapeCategory::Map, target)),
        }
    }
}
