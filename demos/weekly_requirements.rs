use kitchen_demand_workspace::demand_forecast::{ModelKind, Pipeline, PipelineConfig};
use std::fmt::Write as _;
use std::fs;

/// Menu of the demo location: (meal_id, category, cuisine, base orders, onion, garlic)
const MENU: [(&str, &str, &str, f64, f64, f64); 4] = [
    ("1062", "Beverages", "Thai", 120.0, 0.0, 0.0),
    ("1207", "Rice Bowl", "Indian", 80.0, 0.2, 0.05),
    ("1754", "Rice Bowl", "Indian", 45.0, 0.25, 0.1),
    ("2139", "Soup", "Thai", 60.0, 0.1, 0.02),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Build twenty weeks of synthetic history with a mild trend
    let mut csv = String::from("week,center_id,meal_id,category,cuisine,num_orders,onion,garlic\n");
    for week in 1..=20 {
        for (i, (meal_id, category, cuisine, base, onion, garlic)) in MENU.iter().enumerate() {
            let wobble = ((week * (i + 3)) % 7) as f64 - 3.0;
            let orders = (base + week as f64 * 1.5 + wobble * 2.0).max(0.0).round();
            writeln!(
                csv,
                "{},55,{},{},{},{},{},{}",
                week, meal_id, category, cuisine, orders, onion, garlic
            )?;
        }
    }

    let dir = std::env::temp_dir().join("kitchen_demand_demo");
    fs::create_dir_all(&dir)?;
    let input = dir.join("orders.csv");
    fs::write(&input, csv)?;
    println!("Wrote demo history to: {}", input.display());

    for model in [ModelKind::Additive, ModelKind::Ets, ModelKind::MovingAverage] {
        let config = PipelineConfig {
            model,
            top_n: 3,
            ingredients: vec!["onion".to_string(), "garlic".to_string()],
            artifact_dir: dir.join("graphs"),
            ..PipelineConfig::default()
        };

        let report = Pipeline::new(config)?.run_csv(&input)?;

        println!("\n=== {:?} model ===", model);
        println!("Ingredient requirements for next week:");
        for (ingredient, quantity) in &report.payload.ingredient_requirements {
            println!("  {:<10} {:>8.2}", ingredient, quantity);
        }
        println!("Top meals:");
        for (meal_id, category, cuisine, forecast) in &report.payload.top_meal_details {
            println!("  {} ({}, {}): {:.1} orders", meal_id, category, cuisine, forecast);
        }
        for (category, forecast) in &report.category_forecasts {
            if let Some(metrics) = forecast.metrics() {
                println!("  {} fit: {}", category, metrics);
            }
        }
        println!("Artifacts written: {}", report.artifacts.len());
    }

    Ok(())
}
