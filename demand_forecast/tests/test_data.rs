mod common;

use chrono::NaiveDate;
use common::{soup_history, vocabulary, write_csv, Row};
use demand_forecast::data::week_to_date;
use demand_forecast::{DataLoader, ForecastError};
use std::io::Write;
use tempfile::NamedTempFile;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let file = write_csv(&soup_history());

    let table = DataLoader::from_csv(file.path(), &vocabulary(), epoch()).unwrap();
    assert_eq!(table.len(), 8);
    assert!(!table.is_empty());
    assert_eq!(table.locations().unwrap(), vec![55]);

    let records = table.records().unwrap();
    assert_eq!(records[0].meal_id, "1062");
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2023, 1, 8).unwrap());
    assert_eq!(records[0].ingredients, vec![5.0, 0.0]);
}

#[test]
fn test_week_offsets_map_to_dates() {
    assert_eq!(week_to_date(epoch(), 0).unwrap(), epoch());
    assert_eq!(
        week_to_date(epoch(), 52).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
    );
}

#[test]
fn test_location_id_alias_is_accepted() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "week,location_id,meal_id,category,cuisine,num_orders,onion,garlic").unwrap();
    writeln!(file, "1,10,1,Soup,Thai,4,1.0,0.0").unwrap();
    writeln!(file, "2,10,1,Soup,Thai,5,1.0,0.0").unwrap();
    file.flush().unwrap();

    let table = DataLoader::from_csv(file.path(), &vocabulary(), epoch()).unwrap();
    assert_eq!(table.locations().unwrap(), vec![10]);
}

#[test]
fn test_filter_location() {
    let mut rows = soup_history();
    rows.push(Row::new(1, "2000", "Salad", 3).center(99));
    let file = write_csv(&rows);

    let table = DataLoader::from_csv(file.path(), &vocabulary(), epoch()).unwrap();
    assert_eq!(table.locations().unwrap(), vec![55, 99]);
    assert_eq!(table.filter_location(99).unwrap().len(), 1);
    assert!(table.filter_location(7).unwrap().is_empty());
}

#[test]
fn test_missing_ingredient_column_is_input_error() {
    let file = write_csv(&soup_history());
    let vocabulary = vec!["onion".to_string(), "saffron".to_string()];

    let err = DataLoader::from_csv(file.path(), &vocabulary, epoch()).unwrap_err();
    match err {
        ForecastError::Input(message) => assert!(message.contains("saffron")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_required_column_is_input_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "week,center_id,meal_id,category,onion,garlic").unwrap();
    writeln!(file, "1,55,1,Soup,1.0,0.0").unwrap();
    file.flush().unwrap();

    let err = DataLoader::from_csv(file.path(), &vocabulary(), epoch()).unwrap_err();
    assert!(matches!(err, ForecastError::Input(_)));
    assert!(err.to_string().contains("num_orders"));
}

#[test]
fn test_negative_orders_are_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "week,center_id,meal_id,category,cuisine,num_orders,onion,garlic").unwrap();
    writeln!(file, "1,55,1,Soup,Thai,-4,1.0,0.0").unwrap();
    file.flush().unwrap();

    let err = DataLoader::from_csv(file.path(), &vocabulary(), epoch()).unwrap_err();
    assert!(matches!(err, ForecastError::Input(_)));
}

#[test]
fn test_nonexistent_file() {
    let result = DataLoader::from_csv("nonexistent_file.csv", &vocabulary(), epoch());
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_text_in_ingredient_column_is_input_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "week,center_id,meal_id,category,cuisine,num_orders,onion,garlic").unwrap();
    writeln!(file, "1,55,1,Soup,Thai,4,lots,0.0").unwrap();
    writeln!(file, "2,55,1,Soup,Thai,5,abc,0.0").unwrap();
    file.flush().unwrap();

    let err = DataLoader::from_csv(file.path(), &vocabulary(), epoch()).unwrap_err();
    match err {
        ForecastError::Input(message) => {
            assert!(message.contains("onion"));
            assert!(message.contains("2 non-numeric"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_ingredient_cell_counts_as_zero() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "week,center_id,meal_id,category,cuisine,num_orders,onion,garlic").unwrap();
    writeln!(file, "1,55,1,Soup,Thai,4,,1.5").unwrap();
    writeln!(file, "2,55,1,Soup,Thai,5,2.0,").unwrap();
    file.flush().unwrap();

    let records = DataLoader::from_csv(file.path(), &vocabulary(), epoch())
        .unwrap()
        .records()
        .unwrap();
    assert_eq!(records[0].ingredients, vec![0.0, 1.5]);
    assert_eq!(records[1].ingredients, vec![2.0, 0.0]);
}
