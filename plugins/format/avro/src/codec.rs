use std::io::Read;
use std::path::Path;

use apache_avro::Schema;
use materialize_api::{DynamicValue, TargetType};
use materialize_engine::{MaterializeConfig, MaterializeError, Materializer, SchemaNames};

use crate::infer::infer_target;

// ═══════════════════════════════════════════════════════════════
//  Config
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct AvroCodecConfig {
    /// Path to Avro schema file (.avsc).
    pub schema_path: String,
    /// Target descriptor (.json or .toml). Inferred from the schema when absent.
    pub target_path: Option<String>,
    pub engine: MaterializeConfig,
}

/// Read a target descriptor, picking the format from the file extension.
pub fn load_target(path: &str) -> Result<TargetType, MaterializeError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| MaterializeError::Config(format!("target '{path}': {e}")))?;
    let ext = Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "toml" => toml::from_str(&content).map_err(|e| MaterializeError::Config(format!("target '{path}': {e}"))),
        "json" => {
            serde_json::from_str(&content).map_err(|e| MaterializeError::Config(format!("target '{path}': {e}")))
        }
        other => Err(MaterializeError::Config(format!(
            "target '{path}': unsupported descriptor format '{other}' (expected json or toml)"
        ))),
    }
}

// ═══════════════════════════════════════════════════════════════
//  AvroCodec
// ═══════════════════════════════════════════════════════════════

pub struct AvroCodec {
    schema: Schema,
    target: TargetType,
    engine: Materializer,
}

impl AvroCodec {
    pub fn new(schema: Schema, target: TargetType, engine: MaterializeConfig) -> Self {
        Self { schema, target, engine: Materializer::new(engine) }
    }

    pub fn from_config(config: AvroCodecConfig) -> Result<Self, MaterializeError> {
        if config.schema_path.is_empty() {
            return Err(MaterializeError::Config("avro: schema_path is required".into()));
        }
        config.engine.validate()?;

        let schema_str = std::fs::read_to_string(&config.schema_path).map_err(|e| {
            MaterializeError::Config(format!("avro: failed to read schema file '{}': {e}", config.schema_path))
        })?;
        let schema = Schema::parse_str(&schema_str)?;

        let target = match &config.target_path {
            Some(path) => load_target(path)?,
            None => infer_target(&schema)?,
        };

        tracing::info!(
            schema = %config.schema_path,
            target_path = config.target_path.as_deref().unwrap_or("<inferred>"),
            "avro codec ready"
        );
        Ok(Self::new(schema, target, config.engine))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn target(&self) -> &TargetType {
        &self.target
    }

    /// Decode one binary-encoded datum written with the codec's schema.
    pub fn decode(&self, data: &[u8]) -> Result<DynamicValue, MaterializeError> {
        let mut reader = data;
        let value = apache_avro::from_avro_datum(&self.schema, &mut reader, None)?;
        self.engine.materialize(&self.schema, &self.target, &value)
    }

    /// Decode every record of an object-container file.
    ///
    /// Records are decoded and materialized with the file's writer schema.
    pub fn decode_container<R: Read>(&self, input: R) -> Result<Vec<DynamicValue>, MaterializeError> {
        let reader = apache_avro::Reader::new(input)?;
        let writer_schema = reader.writer_schema().clone();
        let names = SchemaNames::collect(&writer_schema);

        let mut out = Vec::new();
        for (i, value) in reader.enumerate() {
            let value = value?;
            let materialized = self
                .engine
                .materialize_with(&names, &writer_schema, &self.target, &value)
                .map_err(|e| e.with_context(format!("[{i}]")))?;
            out.push(materialized);
        }
        tracing::debug!(records = out.len(), "container decoded");
        Ok(out)
    }
}
