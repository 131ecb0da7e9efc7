use apache_avro::types::Value;
use materialize_api::DynamicValue;

use crate::error::MaterializeError;
use crate::leaf::shape_error;
use crate::shape::SchemaShape;

fn symbol_of(value: &Value) -> Result<String, MaterializeError> {
    match value {
        Value::Enum(_, symbol) | Value::String(symbol) => Ok(symbol.clone()),
        other => Err(shape_error(SchemaShape::Enum, other)),
    }
}

/// Enum symbol → string value.
pub(crate) fn convert_symbol(value: &Value) -> Result<DynamicValue, MaterializeError> {
    symbol_of(value).map(DynamicValue::String)
}

/// Sequence of enum symbols → strings, order preserved, no deduplication.
pub(crate) fn convert_symbols(items: &[Value]) -> Result<Vec<String>, MaterializeError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| symbol_of(item).map_err(|e| e.with_context(format!("[{i}]"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_duplicates() {
        let items = vec![
            Value::Enum(1, "B".into()),
            Value::Enum(0, "A".into()),
            Value::Enum(1, "B".into()),
        ];
        assert_eq!(convert_symbols(&items).unwrap(), vec!["B", "A", "B"]);
    }

    #[test]
    fn non_symbol_reports_index() {
        let err = convert_symbols(&[Value::Enum(0, "A".into()), Value::Int(3)]).unwrap_err();
        assert_eq!(err.path(), Some("[1]"));
    }
}
