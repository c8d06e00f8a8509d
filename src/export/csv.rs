// ============================================================================
// CSV Exporter
// ============================================================================
// Sérialise une série COMPLÈTE (jamais l'aperçu tronqué) en texte CSV
//
// FORMAT :
// - ligne d'en-tête puis une ligne par point, champs séparés par ","
// - décimaux : exactement 2 décimales (125.07)
// - entiers : chiffres bruts, sans séparateur de milliers (112117500)
// - dates : YYYY-MM-DD
// - lignes jointes par "\n", pas de "\n" final
//
// Aucun quoting : tous les champs sont numériques ou des dates formatées.
// Un futur champ texte contenant une virgule casserait le format.
// ============================================================================

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::models::{ForecastPoint, HistoricalPoint};

/// Valeur d'une cellule, avec sa règle de formatage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CsvField {
    /// Prix : 2 décimales
    Decimal(f64),
    /// Volume : chiffres bruts
    Integer(u64),
    /// Date : YYYY-MM-DD
    Date(NaiveDate),
}

impl CsvField {
    pub fn render(&self) -> String {
        match self {
            CsvField::Decimal(value) => format!("{:.2}", value),
            CsvField::Integer(value) => value.to_string(),
            CsvField::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Une colonne : en-tête + extracteur de valeur
///
/// CONCEPT RUST : Pointeur de fonction fn(&T) -> CsvField
/// - Une closure sans capture se convertit en fn pointer
/// - La projection est une simple liste ordonnée de colonnes
pub struct Column<T> {
    pub header: &'static str,
    pub extract: fn(&T) -> CsvField,
}

/// Colonnes de l'export historique
pub fn historical_columns() -> Vec<Column<HistoricalPoint>> {
    vec![
        Column { header: "Date", extract: |p: &HistoricalPoint| CsvField::Date(p.date) },
        Column { header: "Open", extract: |p: &HistoricalPoint| CsvField::Decimal(p.open) },
        Column { header: "High", extract: |p: &HistoricalPoint| CsvField::Decimal(p.high) },
        Column { header: "Low", extract: |p: &HistoricalPoint| CsvField::Decimal(p.low) },
        Column { header: "Close", extract: |p: &HistoricalPoint| CsvField::Decimal(p.close) },
        Column { header: "Adj Close", extract: |p: &HistoricalPoint| CsvField::Decimal(p.adj_close) },
        Column { header: "Volume", extract: |p: &HistoricalPoint| CsvField::Integer(p.volume) },
    ]
}

/// Colonnes de l'export du forecast
pub fn forecast_columns() -> Vec<Column<ForecastPoint>> {
    vec![
        Column { header: "Date", extract: |p: &ForecastPoint| CsvField::Date(p.date) },
        Column { header: "Forecast", extract: |p: &ForecastPoint| CsvField::Decimal(p.predicted) },
        Column { header: "Lower Bound", extract: |p: &ForecastPoint| CsvField::Decimal(p.lower_bound) },
        Column { header: "Upper Bound", extract: |p: &ForecastPoint| CsvField::Decimal(p.upper_bound) },
    ]
}

/// Produit le texte CSV (fonction pure, testable)
pub fn to_csv<T>(rows: &[T], columns: &[Column<T>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|column| column.header))
        .context("Échec de l'écriture de l'en-tête CSV")?;

    for row in rows {
        writer
            .write_record(columns.iter().map(|column| (column.extract)(row).render()))
            .context("Échec de l'écriture d'une ligne CSV")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Échec du flush CSV : {}", e))?;
    let mut text = String::from_utf8(bytes).context("CSV non UTF-8")?;

    // Lignes jointes par "\n" : pas de terminateur après la dernière
    if text.ends_with('\n') {
        text.pop();
    }

    Ok(text)
}

/// Type d'export (détermine le nom du fichier)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    StockData,
    Forecast,
}

/// Nom du fichier exporté : `<TICKER>_stock_data_<date>.csv` ou `<TICKER>_forecast_<date>.csv`
pub fn export_filename(ticker: &str, kind: ExportKind, today: NaiveDate) -> String {
    let suffix = match kind {
        ExportKind::StockData => "stock_data",
        ExportKind::Forecast => "forecast",
    };
    format!("{}_{}_{}.csv", ticker, suffix, today.format("%Y-%m-%d"))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_historical_csv() {
        let rows = vec![
            HistoricalPoint::new(ymd(2023, 1, 3), 130.28, 130.9, 124.17, 125.07, 124.2165, 112117500),
            HistoricalPoint::new(ymd(2023, 1, 4), 126.89, 128.66, 125.08, 126.36, 125.5, 89113600),
        ];

        let csv = to_csv(&rows, &historical_columns()).unwrap();

        assert_eq!(
            csv,
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2023-01-03,130.28,130.90,124.17,125.07,124.22,112117500\n\
             2023-01-04,126.89,128.66,125.08,126.36,125.50,89113600"
        );
    }

    #[test]
    fn test_forecast_csv_keeps_values_as_given() {
        // Bornes inversées : exportées telles quelles
        let rows = vec![ForecastPoint::new(ymd(2024, 1, 2), 100.0, 101.556, 99.0)];

        let csv = to_csv(&rows, &forecast_columns()).unwrap();

        assert_eq!(
            csv,
            "Date,Forecast,Lower Bound,Upper Bound\n2024-01-02,100.00,101.56,99.00"
        );
    }

    #[test]
    fn test_empty_series_is_header_only() {
        let csv = to_csv::<ForecastPoint>(&[], &forecast_columns()).unwrap();
        assert_eq!(csv, "Date,Forecast,Lower Bound,Upper Bound");
    }

    #[test]
    fn test_export_filename() {
        let today = ymd(2024, 5, 7);
        assert_eq!(
            export_filename("AAPL", ExportKind::StockData, today),
            "AAPL_stock_data_2024-05-07.csv"
        );
        assert_eq!(
            export_filename("AAPL", ExportKind::Forecast, today),
            "AAPL_forecast_2024-05-07.csv"
        );
    }
}
