use apache_avro::types::Value;
use materialize_api::DynamicValue;

use crate::error::MaterializeError;
use crate::leaf::shape_error;
use crate::shape::SchemaShape;

fn blob_of(value: &Value) -> Result<Vec<u8>, MaterializeError> {
    match value {
        Value::Fixed(_, bytes) | Value::Bytes(bytes) => Ok(bytes.clone()),
        Value::Decimal(d) => Vec::<u8>::try_from(d).map_err(|_| shape_error(SchemaShape::Fixed, value)),
        Value::Duration(d) => Ok(<[u8; 12]>::from(*d).to_vec()),
        other => Err(shape_error(SchemaShape::Fixed, other)),
    }
}

/// Fixed-size blob → byte sequence. Length is taken as decoded.
pub(crate) fn convert_blob(value: &Value) -> Result<DynamicValue, MaterializeError> {
    blob_of(value).map(DynamicValue::Bytes)
}

/// Sequence of fixed blobs → byte sequences, order preserved.
pub(crate) fn convert_blobs(items: &[Value]) -> Result<Vec<Vec<u8>>, MaterializeError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| blob_of(item).map_err(|e| e.with_context(format!("[{i}]"))))
        .collect()
}
