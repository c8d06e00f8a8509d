// ============================================================================
// Series Normalizer
// ============================================================================
// Convertit les lignes brutes (dates en texte) en points typés
//
// Une ligne dont la date est illisible (ou dont un prix manque) est ignorée
// et comptée : une mauvaise ligne ne doit pas faire échouer toute la série.
// ============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::MalformedDate;
use crate::models::{ForecastComponents, ForecastPoint, ForecastRow, HistoricalPoint, StockDataRow};

/// Résultat d'une normalisation : les points valides + le nombre de lignes ignorées
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub points: Vec<T>,
    pub skipped: usize,
}

impl<T> Normalized<T> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Formats datetime acceptés (sans fuseau)
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse une date au format texte en date calendaire
///
/// Essaie dans l'ordre :
/// - `YYYY-MM-DD`
/// - RFC 3339 avec offset (`2023-01-03T00:00:00Z`, `...+00:00`)
/// - datetime naïf (`2023-01-03T00:00:00`, `2023-01-03 00:00:00`)
///
/// CONCEPT RUST : Result pour l'échec
/// - Pas de timestamp NaN possible : soit une NaiveDate, soit MalformedDate
pub fn parse_date(raw: &str) -> Result<NaiveDate, MalformedDate> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|datetime| datetime.date())
        .ok_or_else(|| MalformedDate {
            raw: raw.to_string(),
        })
}

/// Prix finis uniquement (NaN/inf rejetés, comme le modèle serveur)
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Normalise les lignes historiques
///
/// L'ordre d'entrée est conservé : il n'est pas garanti par la source et
/// seul le champ date sert à trier plus tard (dans le merger).
pub fn normalize_historical(rows: &[StockDataRow]) -> Normalized<HistoricalPoint> {
    let mut points = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        let date = match parse_date(&row.date) {
            Ok(date) => date,
            Err(e) => {
                debug!(error = %e, "Skipping historical row");
                skipped += 1;
                continue;
            }
        };

        let prices = (
            finite(row.open),
            finite(row.high),
            finite(row.low),
            finite(row.close),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = prices else {
            debug!(date = %date, "Skipping historical row with missing price");
            skipped += 1;
            continue;
        };

        // Adj Close absent : on retombe sur Close
        let adj_close = finite(row.adj_close).unwrap_or(close);
        let volume = row.volume.unwrap_or(0);

        points.push(HistoricalPoint::new(date, open, high, low, close, adj_close, volume));
    }

    if skipped > 0 {
        warn!(skipped, total = rows.len(), "Skipped malformed historical rows");
    }

    Normalized { points, skipped }
}

/// Normalise les lignes de forecast
pub fn normalize_forecast(rows: &[ForecastRow]) -> Normalized<ForecastPoint> {
    let mut points = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        let date = match parse_date(&row.ds) {
            Ok(date) => date,
            Err(e) => {
                debug!(error = %e, "Skipping forecast row");
                skipped += 1;
                continue;
            }
        };

        let values = (
            finite(Some(row.yhat)),
            finite(Some(row.yhat_lower)),
            finite(Some(row.yhat_upper)),
        );
        let (Some(predicted), Some(lower), Some(upper)) = values else {
            debug!(date = %date, "Skipping forecast row with missing value");
            skipped += 1;
            continue;
        };

        points.push(
            ForecastPoint::new(date, predicted, lower, upper)
                .with_components(ForecastComponents::new(row.components.clone())),
        );
    }

    if skipped > 0 {
        warn!(skipped, total = rows.len(), "Skipped malformed forecast rows");
    }

    Normalized { points, skipped }
}

// ============================================================================
// Tests unitaires
// ============================================================================
