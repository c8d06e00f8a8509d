// ============================================================================
// Chart - Rendu des graphiques (historique et forecast)
// ============================================================================
// Deux vues :
// - Chart : cours de clôture sur toute la période chargée
// - Forecast : clôture + prédiction + bornes, restreint à la fenêtre choisie
//
// CONCEPTS RUST :
// 1. Iterator chaining : MergedPoint → points (x, y) par dataset
// 2. Fonctions pures (build_series, y_bounds) testables sans terminal
//
// CONCEPTS RATATUI :
// 1. Chart widget : plusieurs Dataset superposés
// 2. Axis : bornes et labels
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::series::{MergedPoint, TimeWindow};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Points (x, y) prêts pour ratatui
///
/// x = nombre de jours depuis le premier point affiché.
#[derive(Debug, Default, PartialEq)]
pub struct ChartSeries {
    pub close: Vec<(f64, f64)>,
    pub forecast: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
    pub upper: Vec<(f64, f64)>,
    /// Labels de l'axe X (premier, milieu, dernier)
    pub x_labels: [String; 3],
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.close.is_empty() && self.forecast.is_empty()
    }

    /// Borne max de l'axe X
    pub fn x_max(&self) -> f64 {
        self.close
            .iter()
            .chain(self.forecast.iter())
            .map(|&(x, _)| x)
            .fold(0.0, f64::max)
    }

    /// Min/max de toutes les valeurs, avec 5% de marge
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let (min, max) = self
            .close
            .iter()
            .chain(&self.forecast)
            .chain(&self.lower)
            .chain(&self.upper)
            .map(|&(_, y)| y)
            .filter(|y| y.is_finite())
            .fold((f64::MAX, f64::MIN), |(min, max), y| (min.min(y), max.max(y)));

        if min > max {
            return None;
        }

        let margin = ((max - min) * 0.05).max(0.5);
        Some(((min - margin).max(0.0), max + margin))
    }
}

/// Répartit les points fusionnés dans les datasets du graphique
pub fn build_series(points: &[MergedPoint]) -> ChartSeries {
    let Some(first) = points.first() else {
        return ChartSeries::default();
    };
    let origin = first.time_key;
    let x_of = |p: &MergedPoint| (p.time_key - origin) as f64 / MS_PER_DAY;

    let mut series = ChartSeries::default();
    for point in points {
        let x = x_of(point);
        if let Some(close) = point.actual_close() {
            series.close.push((x, close));
        }
        if let (Some(predicted), Some(lower), Some(upper)) =
            (point.predicted(), point.lower_bound(), point.upper_bound())
        {
            series.forecast.push((x, predicted));
            series.lower.push((x, lower));
            series.upper.push((x, upper));
        }
    }

    let label = |p: &MergedPoint| p.date.format("%b %y").to_string();
    series.x_labels = [
        label(first),
        label(&points[points.len() / 2]),
        points.last().map(label).unwrap_or_default(),
    ];

    series
}

/// Graphique historique (onglet Chart)
pub fn render_price_chart(frame: &mut Frame, ticker: &str, points: &[MergedPoint], area: Rect) {
    let historical: Vec<MergedPoint> = points.iter().filter(|p| !p.is_forecast()).cloned().collect();
    let series = build_series(&historical);

    if series.is_empty() {
        render_no_data(frame, area, "Pas de données à afficher");
        return;
    }

    let datasets = vec![Dataset::default()
        .name("Close")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&series.close)];

    let title = format!(" 📈 {} - Stock Price ", ticker);
    render_datasets(frame, &series, datasets, title, area);
}

/// Graphique de forecast (onglet Forecast), déjà restreint à la fenêtre
pub fn render_forecast_chart(
    frame: &mut Frame,
    ticker: &str,
    points: &[MergedPoint],
    window: TimeWindow,
    area: Rect,
) {
    let series = build_series(points);

    if series.forecast.is_empty() {
        render_no_data(frame, area, "Pas de forecast : appuyez sur [f]");
        return;
    }

    let datasets = vec![
        Dataset::default()
            .name("Close")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&series.close),
        Dataset::default()
            .name("Forecast")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&series.forecast),
        Dataset::default()
            .name("Lower")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::DarkGray))
            .data(&series.lower),
        Dataset::default()
            .name("Upper")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::DarkGray))
            .data(&series.upper),
    ];

    let title = format!(" 🔮 {} - Forecast (last {}) ", ticker, window.label());
    render_datasets(frame, &series, datasets, title, area);
}

fn render_datasets(frame: &mut Frame, series: &ChartSeries, datasets: Vec<Dataset>, title: String, area: Rect) {
    let Some((y_min, y_max)) = series.y_bounds() else {
        render_no_data(frame, area, "Pas de données à afficher");
        return;
    };

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, series.x_max().max(1.0)])
        .labels(series.x_labels.iter().map(|l| Span::raw(l.clone())).collect());

    let y_axis = Axis::default()
        .title("Prix ($)")
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("${:.0}", y_min)),
            Span::raw(format!("${:.0}", (y_min + y_max) / 2.0)),
            Span::raw(format!("${:.0}", y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Affiche un message quand il n'y a pas de données à afficher
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn test_build_series_splits_datasets() {
        let points = vec![
            MergedPoint::actual(date(1, 1), 10.0),
            MergedPoint::actual(date(1, 2), 11.0),
            MergedPoint::forecast(date(1, 4), 12.0, 11.0, 13.0),
        ];

        let series = build_series(&points);

        assert_eq!(series.close, vec![(0.0, 10.0), (1.0, 11.0)]);
        assert_eq!(series.forecast, vec![(3.0, 12.0)]);
        assert_eq!(series.lower, vec![(3.0, 11.0)]);
        assert_eq!(series.upper, vec![(3.0, 13.0)]);
        assert_eq!(series.x_max(), 3.0);
        assert_eq!(series.x_labels[0], "Jan 24");
    }

    #[test]
    fn test_y_bounds() {
        assert_eq!(ChartSeries::default().y_bounds(), None);

        let series = build_series(&[MergedPoint::actual(date(1, 1), 100.0), MergedPoint::actual(date(1, 2), 200.0)]);
        assert_eq!(series.y_bounds(), Some((95.0, 205.0)));
    }
}
