//! Indicator configuration.
//!
//! A strategy is configured with an ordered list of named indicators and
//! their numeric parameters. Validation happens before any computation:
//! unknown names and wrong indicator counts are rejected up front.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrategyError};
use crate::features::indicators;

/// One named indicator with its parameter map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub name: String,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

impl IndicatorSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Ordered indicator selection. Order matters: the composite RL state
/// packs indicators in configuration order, and tree feature columns
/// follow it, so training and testing must share one set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    specs: Vec<IndicatorSpec>,
}

impl IndicatorSet {
    pub fn new(specs: Vec<IndicatorSpec>) -> Self {
        Self { specs }
    }

    /// The default selection used by both paradigms when the caller does
    /// not provide one: %B(10), RSI(10), MACD(12, 26).
    pub fn default_selection() -> Self {
        Self::new(vec![
            IndicatorSpec::new("bbp").with_param("lookback", 10.0),
            IndicatorSpec::new("rsi").with_param("lookback", 10.0),
            IndicatorSpec::new("macd")
                .with_param("short_period", 12.0)
                .with_param("long_period", 26.0),
        ])
    }

    pub fn specs(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Reject unknown indicator names.
    pub fn validate(&self) -> Result<()> {
        for spec in &self.specs {
            if !indicators::is_supported(&spec.name) {
                return Err(StrategyError::UnknownIndicator(spec.name.clone()));
            }
        }
        Ok(())
    }

    /// Composite-state strategies pack exactly three indicators.
    pub fn validate_for_states(&self) -> Result<()> {
        self.validate()?;
        if self.specs.len() != 3 {
            return Err(StrategyError::InvalidConfig(format!(
                "state discretization requires exactly 3 indicators, got {}",
                self.specs.len()
            )));
        }
        Ok(())
    }

    /// Feature-vector strategies accept two or more indicators.
    pub fn validate_for_features(&self) -> Result<()> {
        self.validate()?;
        if self.specs.len() < 2 {
            return Err(StrategyError::InvalidConfig(format!(
                "feature models require at least 2 indicators, got {}",
                self.specs.len()
            )));
        }
        Ok(())
    }

    /// Load a selection from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the selection to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self::default_selection()
    }
}
