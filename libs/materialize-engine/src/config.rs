use serde::Deserialize;

use crate::error::MaterializeError;

/// Engine configuration, parsed from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaterializeConfig {
    /// Maximum container nesting depth of one conversion.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum wrapper links the resolver follows per lookup.
    #[serde(default = "default_max_unwrap_depth")]
    pub max_unwrap_depth: usize,

    /// Which field wins when a record target is scanned for a map field.
    #[serde(default)]
    pub field_discovery: FieldDiscovery,
}

fn default_max_depth() -> usize {
    64
}

fn default_max_unwrap_depth() -> usize {
    32
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_unwrap_depth: default_max_unwrap_depth(),
            field_discovery: FieldDiscovery::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDiscovery {
    /// Last matching field in declaration order.
    #[default]
    LastMatch,
    FirstMatch,
}

impl MaterializeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, MaterializeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MaterializeError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, MaterializeError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| MaterializeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MaterializeError> {
        if self.max_depth == 0 {
            return Err(MaterializeError::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(MaterializeConfig::parse("").unwrap(), MaterializeConfig::default());
    }

    #[test]
    fn parses_all_keys() {
        let cfg = MaterializeConfig::parse(
            "max_depth = 8\nmax_unwrap_depth = 4\nfield_discovery = \"first_match\"\n",
        )
        .unwrap();
        assert_eq!(cfg.max_depth, 8);
        assert_eq!(cfg.max_unwrap_depth, 4);
        assert_eq!(cfg.field_discovery, FieldDiscovery::FirstMatch);
    }

    #[test]
    fn rejects_zero_depth() {
        assert!(matches!(
            MaterializeConfig::parse("max_depth = 0"),
            Err(MaterializeError::Config(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materialize.toml");
        std::fs::write(&path, "max_depth = 3").unwrap();
        let cfg = MaterializeConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.max_depth, 3);
        assert!(MaterializeConfig::load("/nonexistent/materialize.toml").is_err());
    }
}
