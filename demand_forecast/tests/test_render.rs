use chrono::{Duration, NaiveDate};
use demand_forecast::render::{encode_key, forecast_chart, requirements_chart};
use demand_forecast::{AdditiveModel, ArtifactKind, ArtifactStore, ForecastModel, ModelConfig, Series};
use tempfile::TempDir;

fn forecast() -> demand_forecast::ForecastResult {
    let start = NaiveDate::from_ymd_opt(2023, 1, 8).unwrap();
    let points = [10.0, 12.0, 11.0, 13.0]
        .iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::weeks(i as i64), *v))
        .collect();
    let series = Series::new("Soup", points).unwrap();
    AdditiveModel::new().fit(&series, &ModelConfig::default()).unwrap()
}

#[test]
fn test_forecast_chart_draws_band_history_and_forecast() {
    let svg = forecast_chart("Demand forecast for Soup", &forecast()).unwrap();

    assert!(svg.contains("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert!(svg.contains("Demand forecast for Soup"));
    assert!(svg.contains("<polygon"));
    // Fitted and forecast lines, plus their legend marks
    assert!(svg.matches("<polyline").count() >= 2);
    // Four observed points plus the forecast point
    assert_eq!(svg.matches("<circle").count(), 5);
    // Axis ticks are labelled with calendar dates
    assert!(svg.contains(">2023-"));
}

#[test]
fn test_titles_are_escaped() {
    let svg = requirements_chart("Salt & <Pepper>", &[]).unwrap();
    assert!(svg.contains("Salt &amp; &lt;Pepper&gt;"));
    assert!(svg.contains("No ingredient requirements"));
}

#[test]
fn test_store_lists_and_resolves_by_name() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path().join("graphs")).unwrap();

    let kind = ArtifactKind::CategoryForecast("Rice/Bowl".to_string());
    let path = store.save(&kind, "<svg></svg>").unwrap();
    assert_eq!(path.file_name().unwrap(), "category_forecast_Rice%2FBowl.svg");

    store.save(&kind, "<svg>new</svg>").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg>new</svg>");

    assert_eq!(store.list().unwrap(), vec!["category_forecast_Rice%2FBowl".to_string()]);
    assert_eq!(store.path_of("category_forecast_Rice%2FBowl"), Some(path));
    assert_eq!(store.path_of("missing"), None);
    assert_eq!(store.path_of("../graphs/category_forecast_Rice%2FBowl"), None);
}

#[test]
fn test_concurrent_saves_leave_complete_files() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let contents: Vec<String> = (0..8).map(|i| format!("<svg>{}</svg>", "x".repeat(i * 1000))).collect();

    std::thread::scope(|scope| {
        for content in &contents {
            let store = &store;
            scope.spawn(move || store.save(&ArtifactKind::Requirements, content).unwrap());
        }
    });

    let written = std::fs::read_to_string(store.path_of("ingredient_requirements").unwrap()).unwrap();
    assert!(contents.contains(&written));
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_encode_key_keeps_safe_characters() {
    assert_eq!(encode_key("Biryani-2 v1.0"), "Biryani-2 v1.0");
    assert_eq!(encode_key("Soup/Stew"), "Soup%2FStew");
}

#[test]
fn test_colliding_keys_write_separate_artifacts() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();

    let amp = ArtifactKind::CategoryForecast("Soup & Salad".to_string());
    let slash = ArtifactKind::CategoryForecast("Soup / Salad".to_string());
    assert_ne!(amp.name(), slash.name());

    let amp_path = store.save(&amp, "<svg>amp</svg>").unwrap();
    let slash_path = store.save(&slash, "<svg>slash</svg>").unwrap();

    assert_eq!(store.list().unwrap().len(), 2);
    assert_eq!(std::fs::read_to_string(amp_path).unwrap(), "<svg>amp</svg>");
    assert_eq!(std::fs::read_to_string(slash_path).unwrap(), "<svg>slash</svg>");
}
