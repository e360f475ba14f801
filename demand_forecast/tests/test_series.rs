mod common;

use chrono::NaiveDate;
use common::{soup_history, vocabulary, write_csv, Row};
use demand_forecast::series::{extract, extract_totals};
use demand_forecast::{DataLoader, GroupBy, HistoricalRecord, ValueColumn};
use rstest::rstest;

fn records(rows: &[Row]) -> Vec<HistoricalRecord> {
    let file = write_csv(rows);
    let epoch = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    DataLoader::from_csv(file.path(), &vocabulary(), epoch)
        .unwrap()
        .records()
        .unwrap()
}

fn mixed_rows() -> Vec<Row> {
    let mut rows = soup_history();
    rows.push(Row::new(1, "1063", "Soup", 7).onion(2.0));
    rows.push(Row::new(1, "2000", "Salad", 4).garlic(1.5));
    rows.push(Row::new(3, "2000", "Salad", 6).garlic(2.0));
    rows.push(Row::new(2, "3000", "Salad", 9).center(99).garlic(3.0));
    rows
}

#[rstest]
#[case(GroupBy::Category, "num_orders")]
#[case(GroupBy::Meal, "num_orders")]
#[case(GroupBy::All, "onion")]
#[case(GroupBy::Category, "garlic")]
fn test_extraction_conserves_totals(#[case] group_by: GroupBy, #[case] column: &str) {
    let records = records(&mixed_rows());
    let value = ValueColumn::resolve(column, &vocabulary()).unwrap();

    let series = extract(&records, group_by, &value, Some(55)).unwrap();
    let extracted: f64 = series.iter().map(|s| s.total()).sum();

    let expected: f64 = records
        .iter()
        .filter(|r| r.location_id == 55)
        .map(|r| match &value {
            ValueColumn::Orders => r.num_orders as f64,
            ValueColumn::Ingredient { index, .. } => r.ingredients[*index],
        })
        .sum();

    assert!((extracted - expected).abs() < 1e-9);
}

#[test]
fn test_series_keys_and_dates() {
    let records = records(&mixed_rows());
    let series = extract(&records, GroupBy::Category, &ValueColumn::Orders, Some(55)).unwrap();

    let keys: Vec<&str> = series.iter().map(|s| s.key()).collect();
    assert_eq!(keys, vec!["Salad", "Soup"]);

    // Two soup meals in week 1 are summed into one point
    let soup = &series[1];
    assert_eq!(soup.len(), 8);
    assert_eq!(soup.values()[0], 17.0);
    assert!(soup.dates().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_unknown_location_yields_no_series() {
    let records = records(&mixed_rows());
    let series = extract(&records, GroupBy::Meal, &ValueColumn::Orders, Some(12345)).unwrap();
    assert!(series.is_empty());
}

#[test]
fn test_totals_are_keyed_by_ingredient() {
    let records = records(&mixed_rows());
    let columns: Vec<ValueColumn> = vocabulary()
        .iter()
        .map(|name| ValueColumn::resolve(name, &vocabulary()).unwrap())
        .collect();

    let totals = extract_totals(&records, &columns, Some(55)).unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].key(), "onion");
    assert_eq!(totals[1].key(), "garlic");
    assert_eq!(totals[1].total(), 3.5);
}
