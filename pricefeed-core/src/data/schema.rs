use polars::prelude::*;

/// Column names of a price table, in their canonical order.
pub const COLUMNS: [&str; 10] = [
    "date",
    "ticker",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "currency",
    "provider",
];

/// Expected schema for price tables
pub struct PriceSchema;

impl PriceSchema {
    /// Get the canonical price table schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("date".into(), DataType::Date),
            Field::new("ticker".into(), DataType::String),
            Field::new("open".into(), DataType::Float32),
            Field::new("high".into(), DataType::Float32),
            Field::new("low".into(), DataType::Float32),
            Field::new("close".into(), DataType::Float32),
            Field::new("adj_close".into(), DataType::Float32),
            Field::new("volume".into(), DataType::Float32),
            Field::new("currency".into(), DataType::String),
            Field::new("provider".into(), DataType::String),
        ])
    }

    /// Validate DataFrame against schema: columns present, types match, order fixed.
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        if names != COLUMNS {
            return Err(SchemaError::ColumnOrder(names));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Unexpected column order: {0:?}")]
    ColumnOrder(Vec<String>),
}
