//! Shared fixtures for the integration tests
#![allow(dead_code)]

use demand_forecast::PipelineConfig;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

pub const ORDERS: [u64; 8] = [10, 12, 11, 13, 12, 14, 13, 15];

/// One CSV row of the order history
#[derive(Debug, Clone)]
pub struct Row {
    pub week: i64,
    pub center_id: i64,
    pub meal_id: &'static str,
    pub category: &'static str,
    pub cuisine: &'static str,
    pub num_orders: u64,
    pub onion: f64,
    pub garlic: f64,
}

impl Row {
    pub fn new(week: i64, meal_id: &'static str, category: &'static str, num_orders: u64) -> Self {
        Self {
            week,
            center_id: 55,
            meal_id,
            category,
            cuisine: "Indian",
            num_orders,
            onion: 0.0,
            garlic: 0.0,
        }
    }

    pub fn onion(mut self, onion: f64) -> Self {
        self.onion = onion;
        self
    }

    pub fn garlic(mut self, garlic: f64) -> Self {
        self.garlic = garlic;
        self
    }

    pub fn center(mut self, center_id: i64) -> Self {
        self.center_id = center_id;
        self
    }
}

/// Write rows as an order history CSV
pub fn write_csv(rows: &[Row]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "week,center_id,meal_id,category,cuisine,num_orders,onion,garlic").unwrap();
    for r in rows {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            r.week, r.center_id, r.meal_id, r.category, r.cuisine, r.num_orders, r.onion, r.garlic
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

/// Eight weeks of one soup meal; onion use proportional to orders, no garlic
pub fn soup_history() -> Vec<Row> {
    ORDERS
        .iter()
        .enumerate()
        .map(|(i, &orders)| Row::new(i as i64 + 1, "1062", "Soup", orders).onion(orders as f64 * 0.5))
        .collect()
}

pub fn vocabulary() -> Vec<String> {
    vec!["onion".to_string(), "garlic".to_string()]
}

/// Test configuration: two-ingredient vocabulary, no artifacts
pub fn config() -> PipelineConfig {
    PipelineConfig {
        location_id: 55,
        worker_threads: 2,
        render_artifacts: false,
        ingredients: vocabulary(),
        artifact_dir: PathBuf::from("unused"),
        ..PipelineConfig::default()
    }
}
