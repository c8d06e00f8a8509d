// ============================================================================
// Series Merger
// ============================================================================
// Fusionne les points historiques et les points de forecast sur un seul axe
// temporel, pour un graphique à deux séries.
//
// ALGORITHME :
// - chaque point historique devient un MergedValue::Actual
// - chaque point de forecast devient un MergedValue::Forecast
// - concaténation (historique d'abord) puis tri stable par time_key
//
// Le tri stable garantit qu'à date égale, le point historique précède
// le point de forecast. O(n log n) sur le nombre total de points.
// ============================================================================

use chrono::NaiveDate;

use crate::models::{Dated, ForecastPoint, HistoricalPoint};

/// Valeur portée par un point fusionné
///
/// CONCEPT RUST : Enum avec données (tagged union)
/// - Un point vient SOIT de l'historique SOIT du forecast
/// - Impossible de remplir les deux par erreur
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergedValue {
    /// Cours de clôture observé
    Actual { close: f64 },

    /// Prédiction et bornes de confiance
    Forecast {
        predicted: f64,
        lower_bound: f64,
        upper_bound: f64,
    },
}

/// Un point de la série fusionnée
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPoint {
    /// Clé numérique de tri : millisecondes epoch (minuit UTC)
    pub time_key: i64,

    /// Date d'origine, pour l'affichage
    pub date: NaiveDate,

    pub value: MergedValue,
}

impl MergedPoint {
    pub fn actual(date: NaiveDate, close: f64) -> Self {
        Self {
            time_key: time_key(date),
            date,
            value: MergedValue::Actual { close },
        }
    }

    pub fn forecast(date: NaiveDate, predicted: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            time_key: time_key(date),
            date,
            value: MergedValue::Forecast {
                predicted,
                lower_bound,
                upper_bound,
            },
        }
    }

    /// Cours observé, absent pour un point de forecast
    pub fn actual_close(&self) -> Option<f64> {
        match self.value {
            MergedValue::Actual { close } => Some(close),
            MergedValue::Forecast { .. } => None,
        }
    }

    pub fn predicted(&self) -> Option<f64> {
        match self.value {
            MergedValue::Forecast { predicted, .. } => Some(predicted),
            MergedValue::Actual { .. } => None,
        }
    }

    pub fn lower_bound(&self) -> Option<f64> {
        match self.value {
            MergedValue::Forecast { lower_bound, .. } => Some(lower_bound),
            MergedValue::Actual { .. } => None,
        }
    }

    pub fn upper_bound(&self) -> Option<f64> {
        match self.value {
            MergedValue::Forecast { upper_bound, .. } => Some(upper_bound),
            MergedValue::Actual { .. } => None,
        }
    }

    pub fn is_forecast(&self) -> bool {
        matches!(self.value, MergedValue::Forecast { .. })
    }
}

impl Dated for MergedPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl From<&HistoricalPoint> for MergedPoint {
    fn from(point: &HistoricalPoint) -> Self {
        MergedPoint::actual(point.date, point.close)
    }
}

impl From<&ForecastPoint> for MergedPoint {
    fn from(point: &ForecastPoint) -> Self {
        MergedPoint::forecast(point.date, point.predicted, point.lower_bound, point.upper_bound)
    }
}

/// Clé de temps d'une date : millisecondes epoch à minuit UTC
pub fn time_key(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|datetime| datetime.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Fusionne historique + forecast en une séquence triée par time_key
///
/// CONCEPT RUST : sort_by_key est stable
/// - Les éléments égaux gardent leur ordre relatif
/// - Historique concaténé en premier → prioritaire à date égale
pub fn merge_series(historical: &[HistoricalPoint], forecast: &[ForecastPoint]) -> Vec<MergedPoint> {
    let mut merged: Vec<MergedPoint> = historical
        .iter()
        .map(MergedPoint::from)
        .chain(forecast.iter().map(MergedPoint::from))
        .collect();

    merged.sort_by_key(|point| point.time_key);
    merged
}

// ============================================================================
// Tests unitaires
// ============================================================================
