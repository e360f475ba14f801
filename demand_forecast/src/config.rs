//! Pipeline configuration
//!
//! Settings are layered: built-in defaults, then an optional file (any
//! format the `config` crate understands), then environment variables
//! prefixed with `DEMAND__` (for example `DEMAND__LOCATION_ID=10`).

use crate::error::{ForecastError, Result};
use crate::models::{
    AdditiveModel, EtsModel, ForecastModel, ModelConfig, MovingAverageModel, SeasonalityOption,
};
use crate::schema::ingredients;
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DEMAND";

const DEFAULT_LOCATION_ID: i64 = 55;
const DEFAULT_EPOCH: &str = "2023-01-01";
const DEFAULT_ARTIFACT_DIR: &str = "storage/graph_images";

/// Which single-series model the pipeline fits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Additive,
    Ets,
    MovingAverage,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Location to forecast for
    pub location_id: i64,
    /// Calendar date of week 0
    pub epoch: NaiveDate,
    pub future_periods: usize,
    pub interval_width: f64,
    /// Number of meals in the popularity ranking
    pub top_n: usize,
    pub weekly_seasonality: bool,
    pub daily_seasonality: bool,
    pub yearly_seasonality: SeasonalityOption,
    pub seasonality_prior_scale: f64,
    /// Size of the forecasting worker pool, 0 for one per core
    pub worker_threads: usize,
    /// Budget for a single series fit in milliseconds, 0 for none
    pub fit_timeout_ms: u64,
    pub artifact_dir: PathBuf,
    pub render_artifacts: bool,
    pub model: ModelKind,
    pub moving_average_window: usize,
    /// Ingredient columns, in order
    pub ingredients: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let model = ModelConfig::default();
        Self {
            location_id: DEFAULT_LOCATION_ID,
            epoch: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            future_periods: model.future_periods,
            interval_width: model.interval_width,
            top_n: 5,
            weekly_seasonality: model.weekly_seasonality,
            daily_seasonality: model.daily_seasonality,
            yearly_seasonality: model.yearly_seasonality,
            seasonality_prior_scale: model.seasonality_prior_scale,
            worker_threads: 0,
            fit_timeout_ms: 0,
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            render_artifacts: true,
            model: ModelKind::Additive,
            moving_average_window: 4,
            ingredients: ingredients::default_vocabulary(),
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then `path` if given, then `DEMAND__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("location_id", DEFAULT_LOCATION_ID)?
            .set_default("epoch", DEFAULT_EPOCH)?
            .set_default("future_periods", 1)?
            .set_default("interval_width", 0.95)?
            .set_default("top_n", 5)?
            .set_default("weekly_seasonality", true)?
            .set_default("daily_seasonality", false)?
            .set_default("yearly_seasonality", "auto")?
            .set_default("seasonality_prior_scale", 10.0)?
            .set_default("worker_threads", 0)?
            .set_default("fit_timeout_ms", 0)?
            .set_default("artifact_dir", DEFAULT_ARTIFACT_DIR)?
            .set_default("render_artifacts", true)?
            .set_default("model", "additive")?
            .set_default("moving_average_window", 4)?
            .set_default("ingredients", ingredients::default_vocabulary())?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: PipelineConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ingredients")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Reject out-of-range settings
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(ForecastError::Input("top_n must be at least 1".to_string()));
        }
        if self.moving_average_window == 0 {
            return Err(ForecastError::Input(
                "moving_average_window must be at least 1".to_string(),
            ));
        }
        if self.ingredients.is_empty() {
            return Err(ForecastError::Input(
                "ingredient vocabulary must not be empty".to_string(),
            ));
        }
        let distinct: BTreeSet<&str> = self.ingredients.iter().map(String::as_str).collect();
        if distinct.len() != self.ingredients.len() {
            return Err(ForecastError::Input(
                "ingredient vocabulary contains duplicates".to_string(),
            ));
        }
        self.model_config()
            .validate()
            .map_err(|e| ForecastError::Input(e.to_string()))
    }

    /// Per-fit deadline, if any
    pub fn fit_timeout(&self) -> Option<Duration> {
        (self.fit_timeout_ms > 0).then(|| Duration::from_millis(self.fit_timeout_ms))
    }

    /// Model settings for every series fit
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            future_periods: self.future_periods,
            interval_width: self.interval_width,
            weekly_seasonality: self.weekly_seasonality,
            daily_seasonality: self.daily_seasonality,
            yearly_seasonality: self.yearly_seasonality,
            seasonality_prior_scale: self.seasonality_prior_scale,
            fit_timeout: self.fit_timeout(),
        }
    }

    /// Instantiate the configured model
    pub fn build_model(&self) -> Result<Arc<dyn ForecastModel>> {
        Ok(match self.model {
            ModelKind::Additive => Arc::new(AdditiveModel::new()),
            ModelKind::Ets => Arc::new(EtsModel::new()),
            ModelKind::MovingAverage => Arc::new(MovingAverageModel::new(self.moving_average_window)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.location_id, 55);
        assert_eq!(config.ingredients.len(), 30);
        assert_eq!(config.fit_timeout(), None);
    }

    #[test]
    fn test_invalid_interval_is_input_error() {
        let config = PipelineConfig {
            interval_width: 1.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ForecastError::Input(_))));
    }

    #[test]
    fn test_duplicate_ingredients_rejected() {
        let config = PipelineConfig {
            ingredients: vec!["salt".to_string(), "salt".to_string()],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
