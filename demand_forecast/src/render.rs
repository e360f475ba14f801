//! Chart artifacts: SVG rendering and on-disk storage
//!
//! Forecast charts show the observed history, the fitted line, the
//! uncertainty band and the forecast points. The requirements chart is a bar
//! chart of the surfaced quantities with numeric labels. Artifacts are named
//! deterministically from their kind and key, so a rerun overwrites the
//! previous file.

use crate::error::{ForecastError, Result};
use crate::models::{ForecastPoint, ForecastResult};
use crate::schema::artifacts;
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

const CHART_SIZE: (u32, u32) = (960, 540);
const FONT: &str = "sans-serif";

const HISTORY_COLOR: RGBColor = RGBColor(28, 126, 214);
const FORECAST_COLOR: RGBColor = RGBColor(232, 89, 12);
const BAND_COLOR: RGBColor = RGBColor(165, 216, 255);
const BAR_COLOR: RGBColor = RGBColor(77, 171, 247);

type DrawResult = std::result::Result<(), DrawingAreaErrorKind<std::io::Error>>;

/// Distinguishes temp files of concurrent writers within the process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What an artifact depicts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    CategoryForecast(String),
    IngredientForecast(String),
    Requirements,
}

impl ArtifactKind {
    /// File stem of the artifact
    pub fn name(&self) -> String {
        match self {
            ArtifactKind::CategoryForecast(key) => {
                format!("{}{}", artifacts::CATEGORY_PREFIX, encode_key(key))
            }
            ArtifactKind::IngredientForecast(key) => {
                format!("{}{}", artifacts::INGREDIENT_PREFIX, encode_key(key))
            }
            ArtifactKind::Requirements => artifacts::REQUIREMENTS.to_string(),
        }
    }

    /// Chart title
    pub fn title(&self) -> String {
        match self {
            ArtifactKind::CategoryForecast(key) => format!("Demand forecast for {}", key),
            ArtifactKind::IngredientForecast(key) => format!("Usage forecast for {}", key),
            ArtifactKind::Requirements => "Ingredient requirements for next week".to_string(),
        }
    }
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b' ' | b'_' | b'.' | b'-')
}

/// Percent-encode every byte of `key` outside `[A-Za-z0-9 _.-]` as `%XX`.
///
/// `%` itself is always encoded, so distinct keys never share a name. A key
/// made only of dots has its dots encoded too and can't name a relative
/// path component.
pub fn encode_key(key: &str) -> String {
    let dots_only = key.bytes().all(|b| b == b'.');
    let mut encoded = String::with_capacity(key.len());
    for b in key.bytes() {
        if is_safe_byte(b) && !(dots_only && b == b'.') {
            encoded.push(char::from(b));
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    encoded
}

/// Whether `name` could have come from [`ArtifactKind::name`]
fn is_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && !name.bytes().all(|b| b == b'.')
        && name.bytes().all(|b| is_safe_byte(b) || b == b'%')
}

fn render_error<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::Render(format!("Failed to draw chart: {}", err))
}

/// Draw onto an in-memory SVG document
fn render_svg<F>(draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        draw(&root).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

/// Padded value range covering the band and the observations
fn value_range(points: &[ForecastPoint]) -> (f64, f64) {
    let lo = points
        .iter()
        .flat_map(|p| [p.lower, p.observed.unwrap_or(p.lower)])
        .fold(f64::INFINITY, f64::min);
    let hi = points
        .iter()
        .flat_map(|p| [p.upper, p.observed.unwrap_or(p.upper)])
        .fold(f64::NEG_INFINITY, f64::max);

    let pad = ((hi - lo) * 0.1).max(1.0);
    (lo - pad, hi + pad)
}

fn draw_forecast(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    forecast: &ForecastResult,
    first: NaiveDate,
) -> DrawResult {
    let points = forecast.points();
    let day = |d: NaiveDate| (d - first).num_days() as f64;
    let span = points.last().map(|p| day(p.date)).unwrap_or(0.0).max(1.0);
    let (lo, hi) = value_range(points);

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-3.0..span + 3.0, lo..hi)?;

    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|d: &f64| {
            Duration::try_days(d.round() as i64)
                .and_then(|offset| first.checked_add_signed(offset))
                .map(|date| date.to_string())
                .unwrap_or_default()
        })
        .y_label_formatter(&|v: &f64| format!("{:.1}", v))
        .draw()?;

    // Upper edge forward, lower edge back
    let band: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (day(p.date), p.upper))
        .chain(points.iter().rev().map(|p| (day(p.date), p.lower)))
        .collect();
    chart.draw_series(std::iter::once(Polygon::new(band, BAND_COLOR.mix(0.5).filled())))?;

    let history: Vec<(f64, f64)> = forecast
        .history()
        .iter()
        .map(|p| (day(p.date), p.estimate))
        .collect();
    chart
        .draw_series(LineSeries::new(history.iter().copied(), HISTORY_COLOR.stroke_width(2)))?
        .label("Fitted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &HISTORY_COLOR));

    // Continue from the last fitted point into the future
    let future: Vec<(f64, f64)> = history
        .last()
        .copied()
        .into_iter()
        .chain(forecast.future().iter().map(|p| (day(p.date), p.estimate)))
        .collect();
    chart
        .draw_series(LineSeries::new(future, FORECAST_COLOR.stroke_width(2)))?
        .label("Forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &FORECAST_COLOR));

    chart.draw_series(forecast.history().iter().filter_map(|p| {
        p.observed
            .map(|observed| Circle::new((day(p.date), observed), 3, BLACK.filled()))
    }))?;
    chart.draw_series(
        forecast
            .future()
            .iter()
            .map(|p| Circle::new((day(p.date), p.estimate), 5, FORECAST_COLOR.filled())),
    )?;
    chart.draw_series(forecast.future().iter().map(|p| {
        Text::new(
            format!("{:.1}", p.estimate),
            (day(p.date), p.estimate),
            (FONT, 12).into_font(),
        )
    }))?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

/// Render a forecast as an SVG line chart
pub fn forecast_chart(title: &str, forecast: &ForecastResult) -> Result<String> {
    let first = match forecast.points().first() {
        Some(point) => point.date,
        None => {
            return Err(ForecastError::Render(format!(
                "Forecast '{}' has no points to draw",
                forecast.key()
            )))
        }
    };
    render_svg(|root| draw_forecast(root, title, forecast, first))
}

fn draw_requirements(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
    entries: &[(String, f64)],
) -> DrawResult {
    root.fill(&WHITE)?;

    if entries.is_empty() {
        let area = root.titled(title, (FONT, 20))?;
        let (width, height) = area.dim_in_pixel();
        area.draw(&Text::new(
            "No ingredient requirements",
            (width as i32 / 2 - 90, height as i32 / 2),
            (FONT, 14).into_font(),
        ))?;
        return Ok(());
    }

    let max = entries.iter().map(|(_, q)| *q).fold(0.0, f64::max);
    let top = if max > 0.0 { max * 1.15 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT, 20))
        .margin(15)
        .x_label_area_size(110)
        .y_label_area_size(60)
        .build_cartesian_2d((0..entries.len() as u32).into_segmented(), 0.0..top)?;

    let ingredient = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => entries
            .get(*i as usize)
            .map(|(name, _)| name.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(entries.len())
        .x_label_formatter(&ingredient)
        .x_label_style((FONT, 11).into_font().transform(FontTransform::Rotate90))
        .y_label_formatter(&|v: &f64| format!("{:.1}", v))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(8)
            .data(entries.iter().enumerate().map(|(i, (_, q))| (i as u32, *q))),
    )?;
    chart.draw_series(entries.iter().enumerate().map(|(i, (_, q))| {
        Text::new(
            format!("{:.1}", q),
            (SegmentValue::CenterOf(i as u32), *q),
            (FONT, 11).into_font(),
        )
    }))?;
    Ok(())
}

/// Render requirement quantities as an SVG bar chart, one labelled bar per
/// entry in the given order
pub fn requirements_chart(title: &str, entries: &[(String, f64)]) -> Result<String> {
    render_svg(|root| draw_requirements(root, title, entries))
}

/// Directory of rendered artifacts, retrievable by name
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ArtifactStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(name: &str) -> String {
        format!("{}.{}", name, artifacts::EXTENSION)
    }

    /// Write an artifact, replacing any previous one of the same name.
    ///
    /// The content goes to a temp file first and is renamed into place.
    pub fn save(&self, kind: &ArtifactKind, content: &str) -> Result<PathBuf> {
        let name = kind.name();
        let target = self.dir.join(Self::file_name(&name));
        let temp = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            name,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| ForecastError::Render("Artifact write lock poisoned".to_string()))?;

        let written = fs::write(&temp, content).and_then(|_| fs::rename(&temp, &target));
        if let Err(err) = written {
            let _ = fs::remove_file(&temp);
            return Err(ForecastError::Render(format!(
                "Failed to write {}: {}",
                target.display(),
                err
            )));
        }

        debug!(artifact = %name, path = %target.display(), "Saved artifact");
        Ok(target)
    }

    /// Names of the stored artifacts, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(artifacts::EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Path of a stored artifact by the name [`ArtifactKind::name`] gave it,
    /// if it exists. Names that no artifact kind produces resolve to nothing.
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        if !is_artifact_name(name) {
            return None;
        }
        let path = self.dir.join(Self::file_name(name));
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        assert_eq!(
            ArtifactKind::CategoryForecast("Rice Bowl".to_string()).name(),
            "category_forecast_Rice Bowl"
        );
        assert_eq!(
            ArtifactKind::IngredientForecast("lime juice".to_string()).name(),
            "ingredient_forecast_lime juice"
        );
        assert_eq!(ArtifactKind::Requirements.name(), "ingredient_requirements");
    }

    #[test]
    fn test_encode_key_escapes_path_characters() {
        assert_eq!(encode_key("../etc/passwd"), "..%2Fetc%2Fpasswd");
        assert_eq!(encode_key(".."), "%2E%2E");
        assert_eq!(encode_key("Soup & Salad"), "Soup %26 Salad");
        assert_eq!(encode_key("50%"), "50%25");
    }

    #[test]
    fn test_keys_differing_in_unsafe_characters_get_distinct_names() {
        let names: Vec<String> = ["Soup & Salad", "Soup / Salad", "Soup _ Salad", "Soup %26 Salad"]
            .iter()
            .map(|key| ArtifactKind::CategoryForecast(key.to_string()).name())
            .collect();

        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_only_encoded_names_resolve() {
        assert!(is_artifact_name("category_forecast_Soup %26 Salad"));
        assert!(!is_artifact_name("../secret"));
        assert!(!is_artifact_name(".."));
        assert!(!is_artifact_name(""));
    }

    #[test]
    fn test_requirements_chart_labels_values() {
        let svg = requirements_chart("Needs", &[("onion".to_string(), 12.34)]).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(">onion<"));
        assert!(svg.contains(">12.3<"));
    }
}
