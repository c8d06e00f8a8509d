// ============================================================================
// Module : api
// ============================================================================
// Collaborateurs distants : source historique et moteur de forecast.
// Les traits permettent à la session d'être testée sans réseau.
// ============================================================================

pub mod client; // Client HTTP du backend

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FetchError;
use crate::models::{ForecastRow, Interval, StockDataRow};

pub use client::{classify_forecast_response, classify_history_response, ApiClient};

/// Requête historique déjà validée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

/// Source des données historiques (OHLCV)
///
/// CONCEPT RUST : async_trait
/// - Les méthodes async dans un trait objet (dyn) passent par async_trait
/// - Send + Sync : utilisable depuis le worker thread
#[async_trait]
pub trait HistoricalSource: Send + Sync {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Vec<StockDataRow>, FetchError>;
}

/// Moteur de forecast : historique + horizon (jours) → points prédits
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self, history: &[StockDataRow], days: u32) -> Result<Vec<ForecastRow>, FetchError>;
}
