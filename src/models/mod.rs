// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
// - lignes wire (format JSON de l'API)
// - points normalisés (dates calendaires typées)
// ============================================================================

pub mod forecast;   // Points de forecast et bornes de confiance
pub mod historical; // Observations OHLCV
pub mod interval;   // Granularité daily/weekly/monthly
pub(crate) mod wire; // Décodage tolérant des lignes de l'API

use chrono::NaiveDate;

// Re-export des structures principales pour simplifier les imports
pub use forecast::{ForecastComponents, ForecastPoint, ForecastRow};
pub use historical::{HistoricalPoint, StockDataRow};
pub use interval::Interval;

/// Tout point rattaché à une date calendaire
///
/// CONCEPT RUST : Trait comme contrat minimal
/// - Le filtre de fenêtre ne connaît que la date
/// - Fonctionne pour les points historiques, de forecast et fusionnés
pub trait Dated {
    fn date(&self) -> NaiveDate;
}
