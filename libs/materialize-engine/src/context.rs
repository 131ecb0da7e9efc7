use crate::config::MaterializeConfig;
use crate::error::MaterializeError;
use crate::resolve::Resolver;
use crate::shape::SchemaNames;

/// Per-call conversion state: schema names, resolver and recursion depth.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cx<'a, 's> {
    pub names: &'a SchemaNames<'s>,
    pub resolver: Resolver,
    max_depth: usize,
    depth: usize,
}

impl<'a, 's> Cx<'a, 's> {
    pub fn new(names: &'a SchemaNames<'s>, config: &MaterializeConfig) -> Self {
        Self {
            names,
            resolver: Resolver::new(config),
            max_depth: config.max_depth,
            depth: 0,
        }
    }

    /// Context one container level deeper.
    pub fn descend(&self) -> Result<Self, MaterializeError> {
        if self.depth >= self.max_depth {
            return Err(MaterializeError::DepthExceeded { limit: self.max_depth });
        }
        Ok(Self { depth: self.depth + 1, ..*self })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
