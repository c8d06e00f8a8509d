// ============================================================================
// Structures : StockDataRow / HistoricalPoint
// ============================================================================
// StockDataRow : une ligne telle que renvoyée par `/api/stocks` (date en texte)
// HistoricalPoint : la même observation normalisée (date calendaire typée)
//
// CONCEPTS RUST :
// 1. #[serde(rename = "...")] : les champs JSON sont en PascalCase (Date, Open...)
// 2. Option<T> + #[serde(default)] : un champ absent ne casse pas tout le tableau
// 3. NaiveDate : date sans fuseau horaire (précision jour)
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{wire, Dated};

/// Ligne OHLCV brute, format wire de l'API
///
/// Décodage tolérant : un champ mal typé ne fait pas échouer le tableau,
/// la ligne est rejetée plus tard par le normaliseur.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockDataRow {
    #[serde(rename = "Date", default, deserialize_with = "wire::lenient_text")]
    pub date: String,

    #[serde(rename = "Open", default, deserialize_with = "wire::lenient_price")]
    pub open: Option<f64>,

    #[serde(rename = "High", default, deserialize_with = "wire::lenient_price")]
    pub high: Option<f64>,

    #[serde(rename = "Low", default, deserialize_with = "wire::lenient_price")]
    pub low: Option<f64>,

    #[serde(rename = "Close", default, deserialize_with = "wire::lenient_price")]
    pub close: Option<f64>,

    #[serde(rename = "Adj_Close", default, deserialize_with = "wire::lenient_price")]
    pub adj_close: Option<f64>,

    /// Volume manquant = 0
    #[serde(rename = "Volume", default, deserialize_with = "wire::lenient_volume")]
    pub volume: Option<u64>,
}

impl StockDataRow {
    /// Ligne qui n'a pas pu être décodée du tout (pas un objet JSON)
    ///
    /// La date porte le JSON brut : le normaliseur l'ignore et la compte.
    pub fn unreadable(raw: String) -> Self {
        Self {
            date: raw,
            ..Self::default()
        }
    }
}

/// Une observation historique (Open, High, Low, Close, Adj Close, Volume)
///
/// Immuable une fois fetchée : la session remplace la collection entière
/// à chaque nouveau fetch réussi.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

impl HistoricalPoint {
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adj_close: f64,
        volume: u64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            adj_close,
            volume,
        }
    }
}

impl Dated for HistoricalPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Reconvertit un point en ligne wire (pour le corps de `/api/forecast`)
impl From<&HistoricalPoint> for StockDataRow {
    fn from(point: &HistoricalPoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            open: Some(point.open),
            high: Some(point.high),
            low: Some(point.low),
            close: Some(point.close),
            adj_close: Some(point.adj_close),
            volume: Some(point.volume),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_deserialize_pascal_case() {
        let json = r#"{"Date":"2023-01-03T00:00:00","Open":130.28,"High":130.9,
            "Low":124.17,"Close":125.07,"Adj_Close":124.2,"Volume":112117500}"#;
        let row: StockDataRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.date, "2023-01-03T00:00:00");
        assert_eq!(row.close, Some(125.07));
        assert_eq!(row.volume, Some(112117500));
    }

    #[test]
    fn test_row_missing_volume() {
        let json = r#"{"Date":"2023-01-03","Open":1.0,"High":1.0,"Low":1.0,"Close":1.0,"Adj_Close":1.0}"#;
        let row: StockDataRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.volume, None);
    }

    #[test]
    fn test_row_with_wrong_types_still_decodes() {
        let json = r#"{"Date":null,"Open":"n/a","High":1.0,"Low":1.0,"Close":1.0,"Adj_Close":1.0,"Volume":1.0e8}"#;
        let row: StockDataRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.date, "null");
        assert_eq!(row.open, None);
        assert_eq!(row.volume, Some(100_000_000));
    }

    #[test]
    fn test_point_to_wire_row() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 9).unwrap();
        let point = HistoricalPoint::new(date, 1.0, 2.0, 0.5, 1.5, 1.4, 42);
        let row = StockDataRow::from(&point);

        assert_eq!(row.date, "2023-03-09");
        assert_eq!(row.adj_close, Some(1.4));

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Adj_Close"], 1.4);
        assert_eq!(json["Volume"], 42);
    }
}
