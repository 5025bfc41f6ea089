//! Advisory cost estimation from an optional per-model price table.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const TOKENS_PER_RATE_UNIT: f64 = 1_000_000.0;

/// USD rates per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
}

/// Model name → price. An empty table is a valid table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    models: HashMap<String, ModelPrice>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, model: impl Into<String>, input: f64, output: f64) -> Self {
        self.models
            .insert(model.into(), ModelPrice { input, output });
        self
    }

    /// Reads a price table, degrading to an empty table when the file is missing
    /// or unparsable. Pricing never fails a completion.
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no price table, costs will be unknown");
                return Self::default();
            }
        };
        match toml::from_str(&text) {
            Ok(table) => table,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unparsable price table");
                Self::default()
            }
        }
    }

    pub fn get(&self, model: &str) -> Option<&ModelPrice> {
        self.models.get(model)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Estimated USD cost, or `None` when the model has no price entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use llm_relay::pricing::PriceTable;
    ///
    /// let table = PriceTable::new().with_price("m", 3.0, 15.0);
    /// assert_eq!(table.estimate("m", 1_000_000, 0), Some(3.0));
    /// assert_eq!(table.estimate("unknown", 1_000_000, 0), None);
    /// ```
    pub fn estimate(&self, model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        self.get(model).map(|price| {
            (input_tokens as f64 / TOKENS_PER_RATE_UNIT) * price.input
                + (output_tokens as f64 / TOKENS_PER_RATE_UNIT) * price.output
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PriceTable {
        PriceTable::new().with_price("m", 3.00, 15.00)
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("priced model");
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn input_and_output_rates_apply_per_million_tokens() {
        assert_close(table().estimate("m", 1_000_000, 0), 3.00);
        assert_close(table().estimate("m", 0, 1_000_000), 15.00);
        assert_close(table().estimate("m", 500_000, 100_000), 3.00);
    }

    #[test]
    fn unknown_model_has_no_cost_rather_than_zero() {
        assert_eq!(table().estimate("other", 10, 10), None);
        assert_eq!(PriceTable::new().estimate("m", 0, 0), None);
        assert_eq!(table().estimate("m", 0, 0), Some(0.0));
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(PriceTable::load(&dir.path().join("pricing.toml")).is_empty());
    }

    #[test]
    fn malformed_file_yields_empty_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pricing.toml");
        fs::write(&path, "[\"gpt-4o\"\ninput = ").expect("write");
        assert!(PriceTable::load(&path).is_empty());
    }

    #[test]
    fn file_tables_are_keyed_by_model_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pricing.toml");
        fs::write(
            &path,
            "[\"gpt-4o\"]\ninput = 2.5\noutput = 10.0\n\n[\"claude-sonnet-4-5\"]\ninput = 3.0\noutput = 15.0\n",
        )
        .expect("write");

        let table = PriceTable::load(&path);
        assert_eq!(
            table.get("gpt-4o"),
            Some(&ModelPrice {
                input: 2.5,
                output: 10.0
            })
        );
        assert_close(table.estimate("claude-sonnet-4-5", 0, 2_000_000), 30.0);
    }
}
