//! Pipeline orchestration
//!
//! One run walks `Loading → Filtering → Forecasting → Aggregating →
//! Rendering → Done`. Any unrecoverable condition moves the run to `Failed`
//! and is returned as an error; failures of single series are collected in
//! the [`PipelineReport`] instead.

use crate::config::PipelineConfig;
use crate::data::{DataLoader, HistoricalRecord, HistoricalTable};
use crate::error::{ForecastError, Result};
use crate::forecasters::{
    rank_meals, BatchForecaster, BatchOutcome, CategoryForecaster, IngredientForecast,
    IngredientForecaster, MealForecaster, RankedMeal, SeriesFailure,
};
use crate::models::{ForecastModel, ForecastResult};
use crate::render::{self, ArtifactKind, ArtifactStore};
use crate::requirements::{aggregate_requirements, ingredient_ratios, RequirementVector};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Step of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Loading,
    Filtering,
    Forecasting,
    Aggregating,
    Rendering,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Loading => "loading",
            PipelineState::Filtering => "filtering",
            PipelineState::Forecasting => "forecasting",
            PipelineState::Aggregating => "aggregating",
            PipelineState::Rendering => "rendering",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Result payload handed to the web layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPayload {
    /// `(ingredient, quantity)`, positive only, largest first
    pub ingredient_requirements: Vec<(String, f64)>,
    /// `(meal_id, category, cuisine, forecast_value)` for the top meals
    pub top_meal_details: Vec<(String, String, String, f64)>,
}

impl ForecastPayload {
    fn new(requirements: &RequirementVector, meals: &[RankedMeal]) -> Self {
        Self {
            ingredient_requirements: requirements.surfaced(),
            top_meal_details: meals
                .iter()
                .map(|m| {
                    (
                        m.meal_id.clone(),
                        m.category.clone(),
                        m.cuisine.clone(),
                        m.forecast_value,
                    )
                })
                .collect(),
        }
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub payload: ForecastPayload,
    pub category_forecasts: BTreeMap<String, ForecastResult>,
    pub ingredient_forecasts: BTreeMap<String, ForecastResult>,
    pub meal_forecasts: BTreeMap<String, ForecastResult>,
    pub ratios: BTreeMap<String, RequirementVector>,
    pub requirements: RequirementVector,
    pub ranked_meals: Vec<RankedMeal>,
    /// Ingredients never used at the location
    pub skipped_ingredients: Vec<String>,
    /// Series that could not be forecast
    pub failures: Vec<SeriesFailure>,
    /// Paths of the artifacts written
    pub artifacts: Vec<PathBuf>,
    /// Artifacts that could not be produced, with the reason
    pub render_failures: Vec<(String, String)>,
    /// States visited, in order
    pub states: Vec<PipelineState>,
}

/// Records the visited states of one run
#[derive(Debug, Default)]
struct StateTrace {
    states: Vec<PipelineState>,
}

impl StateTrace {
    fn enter(&mut self, state: PipelineState) {
        info!(state = %state, "Pipeline state");
        self.states.push(state);
    }

    /// Move to `Failed` if `result` is an error
    fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let during = self.states.last().copied();
            self.states.push(PipelineState::Failed);
            error!(state = ?during, error = %err, "Pipeline failed");
        }
        result
    }
}

/// The forecasting pipeline for one configuration
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    model: Arc<dyn ForecastModel>,
    pool: ThreadPool,
    store: Option<ArtifactStore>,
}

impl Pipeline {
    /// Build a pipeline with the configured model, worker pool and, when
    /// rendering is on, the artifact store
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let model = config.build_model()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("demand-forecast-{}", i))
            .build()
            .map_err(|e| ForecastError::InvalidParameter(format!("Worker pool: {}", e)))?;

        let store = if config.render_artifacts {
            Some(ArtifactStore::open(&config.artifact_dir)?)
        } else {
            None
        };

        Ok(Self {
            config,
            model,
            pool,
            store,
        })
    }

    /// Replace the forecasting model
    pub fn with_model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Artifact store, when rendering is enabled
    pub fn store(&self) -> Option<&ArtifactStore> {
        self.store.as_ref()
    }

    /// Load a CSV order history and run the pipeline on it
    pub fn run_csv<P: AsRef<Path>>(&self, path: P) -> Result<PipelineReport> {
        let mut trace = StateTrace::default();
        trace.enter(PipelineState::Loading);
        let table = trace.guard(DataLoader::from_csv(
            path,
            &self.config.ingredients,
            self.config.epoch,
        ))?;
        self.run_loaded(&table, trace)
    }

    /// Run the pipeline on an already loaded table
    pub fn run(&self, table: &HistoricalTable) -> Result<PipelineReport> {
        let mut trace = StateTrace::default();
        trace.enter(PipelineState::Loading);
        self.run_loaded(table, trace)
    }

    fn run_loaded(&self, table: &HistoricalTable, mut trace: StateTrace) -> Result<PipelineReport> {
        let location = self.config.location_id;
        let vocabulary = table.vocabulary().to_vec();

        trace.enter(PipelineState::Filtering);
        let records = trace.guard(self.filter(table))?;

        trace.enter(PipelineState::Forecasting);
        let (categories, (ingredients, meals)) =
            trace.guard(self.forecast(&records, &vocabulary))?;

        if categories.is_empty() && ingredients.outcome.is_empty() && meals.is_empty() {
            return trace.guard(Err(ForecastError::Fatal(format!(
                "No category, ingredient or meal could be forecast for location {}",
                location
            ))));
        }

        trace.enter(PipelineState::Aggregating);
        let ratios = ingredient_ratios(&records, &vocabulary, Some(location));
        let requirements =
            trace.guard(aggregate_requirements(&categories.forecasts, &ratios, &vocabulary))?;
        let ranked_meals = rank_meals(&meals.forecasts, &records, self.config.top_n);
        let payload = ForecastPayload::new(&requirements, &ranked_meals);

        let mut failures = categories.failures;
        failures.extend(ingredients.outcome.failures);
        failures.extend(meals.failures);

        let mut report = PipelineReport {
            payload,
            category_forecasts: categories.forecasts,
            ingredient_forecasts: ingredients.outcome.forecasts,
            meal_forecasts: meals.forecasts,
            ratios,
            requirements,
            ranked_meals,
            skipped_ingredients: ingredients.skipped,
            failures,
            artifacts: Vec::new(),
            render_failures: Vec::new(),
            states: Vec::new(),
        };

        if let Some(store) = &self.store {
            trace.enter(PipelineState::Rendering);
            self.render(store, &mut report);
        }

        trace.enter(PipelineState::Done);
        report.states = trace.states;

        info!(
            location,
            requirements = report.payload.ingredient_requirements.len(),
            top_meals = report.payload.top_meal_details.len(),
            failures = report.failures.len(),
            skipped = report.skipped_ingredients.len(),
            artifacts = report.artifacts.len(),
            "Pipeline finished"
        );
        Ok(report)
    }

    /// Restrict to the configured location; no rows is an input error
    fn filter(&self, table: &HistoricalTable) -> Result<Vec<HistoricalRecord>> {
        let location = self.config.location_id;
        let filtered = table.filter_location(location)?;
        if filtered.is_empty() {
            return Err(ForecastError::Input(format!(
                "No records for location {}",
                location
            )));
        }
        filtered.records()
    }

    /// Run the three forecasters concurrently on the worker pool
    fn forecast(
        &self,
        records: &[HistoricalRecord],
        vocabulary: &[String],
    ) -> Result<(BatchOutcome, (IngredientForecast, BatchOutcome))> {
        let batch = BatchForecaster::new(Arc::clone(&self.model), self.config.model_config());
        let location = Some(self.config.location_id);

        let categories = CategoryForecaster::new(batch.clone());
        let ingredients = IngredientForecaster::new(batch.clone());
        let meals = MealForecaster::new(batch);

        let (categories, (ingredients, meals)) = self.pool.install(|| {
            rayon::join(
                || categories.forecast(records, location),
                || {
                    rayon::join(
                        || ingredients.forecast(records, vocabulary, location),
                        || meals.forecast(records, location),
                    )
                },
            )
        });

        Ok((categories?, (ingredients?, meals?)))
    }

    /// Write every chart; failures are recorded, never fatal
    fn render(&self, store: &ArtifactStore, report: &mut PipelineReport) {
        let mut charts: Vec<(ArtifactKind, Result<String>)> = Vec::new();
        for (key, forecast) in &report.category_forecasts {
            let kind = ArtifactKind::CategoryForecast(key.clone());
            let chart = render::forecast_chart(&kind.title(), forecast);
            charts.push((kind, chart));
        }
        for (key, forecast) in &report.ingredient_forecasts {
            let kind = ArtifactKind::IngredientForecast(key.clone());
            let chart = render::forecast_chart(&kind.title(), forecast);
            charts.push((kind, chart));
        }
        let kind = ArtifactKind::Requirements;
        let chart = render::requirements_chart(&kind.title(), &report.payload.ingredient_requirements);
        charts.push((kind, chart));

        for (kind, chart) in charts {
            match chart.and_then(|svg| store.save(&kind, &svg)) {
                Ok(path) => report.artifacts.push(path),
                Err(err) => {
                    warn!(artifact = %kind.name(), error = %err, "Artifact not written");
                    report.render_failures.push((kind.name(), err.to_string()));
                }
            }
        }
    }
}
