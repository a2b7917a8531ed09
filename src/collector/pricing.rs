//! Model pricing and cost estimation
//!
//! Defaults (USD per million tokens):
//!
//! gemini_25_flash:  input=$0.075, output=$0.30
//! gemini_25_pro:    input=$1.25,  output=$5.00
//! gemini_20_flash:  input=$0.075, output=$0.30
//! openai_creative:  input=$2.50,  output=$10.00
//!
//! Unknown models cost zero. `[pricing.<model>]` config entries add or
//! override rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-model pricing in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl ModelPrice {
    pub const fn new(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }

    /// Finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.input_per_mtok, self.output_per_mtok]
            .iter()
            .all(|p| p.is_finite() && *p >= 0.0)
    }

    /// Cost in USD: sum of (tokens / 1_000_000) * price for input and output
    pub fn cost(&self, input_tokens: usize, output_tokens: usize) -> f64 {
        let input = (input_tokens as f64 / 1_000_000.0) * self.input_per_mtok;
        let output = (output_tokens as f64 / 1_000_000.0) * self.output_per_mtok;
        input + output
    }
}

const DEFAULT_PRICES: &[(&str, ModelPrice)] = &[
    ("gemini_25_flash", ModelPrice::new(0.075, 0.30)),
    ("gemini_25_pro", ModelPrice::new(1.25, 5.00)),
    ("gemini_20_flash", ModelPrice::new(0.075, 0.30)),
    ("openai_creative", ModelPrice::new(2.50, 10.00)),
];

/// Rough token estimate: one token per four characters
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Price table keyed by logical model name
#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: BTreeMap<String, ModelPrice>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            prices: DEFAULT_PRICES
                .iter()
                .map(|(model, price)| (model.to_string(), *price))
                .collect(),
        }
    }
}

impl PriceTable {
    /// A table with no rows; every model costs zero
    pub fn empty() -> Self {
        Self {
            prices: BTreeMap::new(),
        }
    }

    /// Default table with `overrides` applied on top
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a String, &'a ModelPrice)>,
    ) -> Self {
        let mut table = Self::default();
        for (model, price) in overrides {
            table.prices.insert(model.clone(), *price);
        }
        table
    }

    pub fn get(&self, model: &str) -> Option<&ModelPrice> {
        self.prices.get(model)
    }

    /// Estimated cost in USD, zero for models without a price
    pub fn estimate(&self, model: &str, input_tokens: usize, output_tokens: usize) -> f64 {
        self.get(model)
            .map(|price| price.cost(input_tokens, output_tokens))
            .unwrap_or(0.0)
    }
}
