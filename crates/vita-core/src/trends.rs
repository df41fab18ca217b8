//! Trend chart rendering
//!
//! Draws every present metric and the predicted mood onto one headless
//! bitmap and encodes it as PNG. No text is rendered, so no font stack is
//! needed on the host.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::health_log::HealthLog;
use crate::models::Metric;

pub const CHART_WIDTH: u32 = 1400;
pub const CHART_HEIGHT: u32 = 800;

/// Predicted mood scores are multiplied by this to share the metric axis
pub const MOOD_SCALE: f64 = 1000.0;

const PURPLE: RGBColor = RGBColor(128, 0, 128);
const GRID: RGBColor = RGBColor(225, 225, 225);
const GRID_LINES: usize = 8;

/// Point marker drawn on top of a series line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Cross,
}

/// One plotted line, x being the day offset from the first logged date
#[derive(Debug, Clone)]
pub struct TrendSeries {
    pub name: &'static str,
    pub color: RGBColor,
    pub marker: Marker,
    pub points: Vec<(f64, f64)>,
}

/// Numeric score of a predicted mood label (sad=0, neutral=1, happy=2)
pub fn mood_score(label: &str) -> Option<f64> {
    match label {
        "sad" => Some(0.0),
        "neutral" => Some(1.0),
        "happy" => Some(2.0),
        _ => None,
    }
}

/// Build the series to plot
///
/// `predicted_moods` holds one entry per log row; rows with no prediction or
/// an unmapped label are left out of the mood series.
pub fn trend_series(log: &HealthLog, predicted_moods: &[Option<String>]) -> Vec<TrendSeries> {
    let Some((first, _)) = log.date_range() else {
        return Vec::new();
    };
    let day = |date: chrono::NaiveDate| (date - first).num_days() as f64;

    let mut series = Vec::new();
    for metric in log.metrics() {
        let (color, marker) = match metric {
            Metric::SleepHours => (BLUE, Marker::Circle),
            Metric::HydrationMl => (GREEN, Marker::Square),
            Metric::Steps => (RED, Marker::Triangle),
        };
        let points = log
            .records()
            .iter()
            .filter_map(|r| Some((day(r.date), r.value(*metric)?)))
            .collect();
        series.push(TrendSeries {
            name: metric.as_str(),
            color,
            marker,
            points,
        });
    }

    let mood_points: Vec<(f64, f64)> = log
        .records()
        .iter()
        .zip(predicted_moods)
        .filter_map(|(r, label)| {
            let score = mood_score(label.as_deref()?)?;
            Some((day(r.date), score * MOOD_SCALE))
        })
        .collect();
    if !mood_points.is_empty() {
        series.push(TrendSeries {
            name: "predicted_mood",
            color: PURPLE,
            marker: Marker::Cross,
            points: mood_points,
        });
    }

    series
}

/// Render the trend chart as PNG bytes
pub fn render_trend_chart(log: &HealthLog, predicted_moods: &[Option<String>]) -> Result<Vec<u8>> {
    let series = trend_series(log, predicted_moods);

    let mut buffer = vec![0u8; CHART_WIDTH as usize * CHART_HEIGHT as usize * 3];
    draw(&mut buffer, &series)?;

    let image = RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer)
        .ok_or_else(|| Error::Chart("Bitmap buffer has the wrong size".into()))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(chart_err)?;

    tracing::debug!(
        series = series.len(),
        bytes = png.len(),
        "Rendered trend chart"
    );
    Ok(png)
}

fn draw(buffer: &mut [u8], series: &[TrendSeries]) -> Result<()> {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let x_max = points().map(|p| p.0).fold(0.0, f64::max).max(1.0);
    let y_max = points().map(|p| p.1).fold(0.0, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };
    let (x_min, x_max) = (-0.5, x_max + 0.5);

    let root = BitMapBackend::with_buffer(buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)
        .map_err(chart_err)?;

    for i in 1..=GRID_LINES {
        let y = y_max * i as f64 / GRID_LINES as f64;
        chart
            .draw_series(LineSeries::new([(x_min, y), (x_max, y)], &GRID))
            .map_err(chart_err)?;
    }
    let day_step = ((x_max - x_min) / 30.0).ceil().max(1.0);
    let mut x = 0.0;
    while x < x_max {
        chart
            .draw_series(LineSeries::new([(x, 0.0), (x, y_max)], &GRID))
            .map_err(chart_err)?;
        x += day_step;
    }

    chart
        .draw_series(LineSeries::new([(x_min, 0.0), (x_max, 0.0)], &BLACK))
        .map_err(chart_err)?;
    chart
        .draw_series(LineSeries::new([(x_min, 0.0), (x_min, y_max)], &BLACK))
        .map_err(chart_err)?;

    for s in series {
        let points = s.points.iter().copied();
        chart
            .draw_series(LineSeries::new(points.clone(), s.color.stroke_width(2)))
            .map_err(chart_err)?;

        let style = s.color.filled();
        let drawn = match s.marker {
            Marker::Circle => chart.draw_series(PointSeries::<_, _, Circle<_, _>, _>::new(
                points, 5, style,
            )),
            Marker::Square => chart.draw_series(PointSeries::of_element(
                points,
                4,
                style,
                &|c, s, st| EmptyElement::at(c) + Rectangle::new([(-s, -s), (s, s)], st),
            )),
            Marker::Triangle => chart.draw_series(
                PointSeries::<_, _, TriangleMarker<_, _>, _>::new(points, 6, style),
            ),
            Marker::Cross => {
                chart.draw_series(PointSeries::<_, _, Cross<_, _>, _>::new(points, 6, style))
            }
        };
        drawn.map_err(chart_err)?;
    }

    root.present().map_err(chart_err)?;
    Ok(())
}

fn chart_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn log_from(csv: &str) -> HealthLog {
        HealthLog::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_mood_score() {
        assert_eq!(mood_score("sad"), Some(0.0));
        assert_eq!(mood_score("happy"), Some(2.0));
        assert_eq!(mood_score("anxious"), None);
    }

    #[test]
    fn test_series_follow_present_columns() {
        let log = log_from(
            "date,sleep_hours,steps
2024-01-01,7,8000
2024-01-03,,9000",
        );
        let series = trend_series(&log, &[]);
        let names: Vec<_> = series.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["sleep_hours", "steps"]);
        assert_eq!(series[0].points, vec![(0.0, 7.0)]);
        assert_eq!(series[1].points, vec![(0.0, 8000.0), (2.0, 9000.0)]);
    }

    #[test]
    fn test_metric_series_have_distinct_markers() {
        let log = log_from(
            "date,sleep_hours,hydration_ml,steps
2024-01-01,7,2400,8000",
        );
        let markers: Vec<_> = trend_series(&log, &[Some("happy".into())])
            .iter()
            .map(|s| s.marker)
            .collect();
        assert_eq!(
            markers,
            vec![Marker::Circle, Marker::Square, Marker::Triangle, Marker::Cross]
        );
    }

    #[test]
    fn test_mood_series_is_scaled() {
        let log = log_from("date,steps\n2024-01-01,100\n2024-01-02,200\n2024-01-03,300");
        let predicted = vec![
            Some("happy".to_string()),
            Some("grumpy".to_string()),
            Some("neutral".to_string()),
        ];
        let series = trend_series(&log, &predicted);
        let mood = series.iter().find(|s| s.name == "predicted_mood").unwrap();
        assert_eq!(mood.points, vec![(0.0, 2000.0), (2.0, 1000.0)]);
        assert_eq!(mood.color, PURPLE);
    }

    #[test]
    fn test_render_png() {
        let log = log_from(
            "date,sleep_hours,hydration_ml,steps
2024-01-01,7,2400,8000
2024-01-02,5,1900,3000",
        );
        let png = render_trend_chart(&log, &[Some("happy".into()), Some("sad".into())]).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), CHART_WIDTH);
        assert_eq!(decoded.height(), CHART_HEIGHT);
    }

    #[test]
    fn test_render_empty_log() {
        let log = log_from("date,steps\n");
        let png = render_trend_chart(&log, &[]).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
    }
}
