// ============================================================================
// Tables - Aperçus des données historiques et du forecast
// ============================================================================
// Les tableaux n'affichent que les premières lignes (4 historiques,
// 5 de forecast). L'export CSV, lui, travaille sur la série complète.
//
// CONCEPTS RATATUI :
// 1. Table widget : lignes + largeurs de colonnes
// 2. Row / header : une ligne de cellules (String → Cell)
// ============================================================================

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use crate::models::{ForecastPoint, HistoricalPoint};

const HISTORICAL_HEADERS: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];
const FORECAST_HEADERS: [&str; 4] = ["Date", "Forecast", "Lower Bound", "Upper Bound"];

/// Groupe les chiffres par milliers : 1234567 → "1,234,567"
///
/// Affichage écran uniquement ; le CSV garde l'entier brut.
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Date affichée : "Jan 03, 2023"
pub fn display_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

fn price(value: f64) -> String {
    format!("${:.2}", value)
}

/// Cellules d'une ligne historique
pub fn historical_cells(point: &HistoricalPoint) -> [String; 7] {
    [
        display_date(point.date),
        price(point.open),
        price(point.high),
        price(point.low),
        price(point.close),
        price(point.adj_close),
        group_digits(point.volume),
    ]
}

/// Cellules d'une ligne de forecast
pub fn forecast_cells(point: &ForecastPoint) -> [String; 4] {
    [
        display_date(point.date),
        price(point.predicted),
        price(point.lower_bound),
        price(point.upper_bound),
    ]
}

/// "Showing first 4 of 251 rows"
pub fn preview_caption(shown: usize, total: usize, what: &str) -> String {
    format!("Showing first {} of {} {}", shown, total, what)
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

/// Dessine l'aperçu historique
pub fn render_historical_table(frame: &mut Frame, rows: &[HistoricalPoint], total: usize, ticker: &str, area: Rect) {
    let body: Vec<Row> = rows.iter().map(|p| Row::new(historical_cells(p))).collect();
    let widths = [
        Constraint::Length(14),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Min(14),
    ];

    let table = Table::new(body, widths)
        .header(Row::new(HISTORICAL_HEADERS).style(header_style()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} - {} ", ticker, preview_caption(rows.len(), total, "rows"))),
        );

    frame.render_widget(table, area);
}

/// Dessine l'aperçu du forecast
pub fn render_forecast_table(frame: &mut Frame, rows: &[ForecastPoint], total: usize, ticker: &str, area: Rect) {
    let body: Vec<Row> = rows.iter().map(|p| Row::new(forecast_cells(p))).collect();
    let widths = [
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Min(12),
    ];

    let caption = preview_caption(rows.len(), total, "forecasted data points");
    let table = Table::new(body, widths)
        .header(Row::new(FORECAST_HEADERS).style(header_style()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title(format!(" {} for {} ", caption, ticker)),
        );

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1_000), "1,000");
        assert_eq!(group_digits(1_234_567), "1,234,567");
        assert_eq!(group_digits(12_345_678), "12,345,678");
    }

    #[test]
    fn test_historical_cells() {
        let point = HistoricalPoint::new(
            NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            130.28,
            130.9,
            124.17,
            125.07,
            124.2,
            112_117_500,
        );
        let cells = historical_cells(&point);

        assert_eq!(cells[0], "Jan 03, 2023");
        assert_eq!(cells[2], "$130.90");
        assert_eq!(cells[6], "112,117,500");
    }

    #[test]
    fn test_preview_caption() {
        assert_eq!(preview_caption(4, 251, "rows"), "Showing first 4 of 251 rows");
    }
}
