// ============================================================================
// API Client : stocks + forecast
// ============================================================================
// Appelle le backend du dashboard :
// - GET  /api/stocks    : lignes OHLCV pour un ticker et une période
// - POST /api/forecast  : prédictions à N jours à partir de l'historique
// - GET  /api/health    : sonde de disponibilité
//
// CONCEPTS RUST :
// 1. async/await : les appels réseau ne bloquent pas le thread
// 2. Classification des erreurs : NotFound vs Transport (FetchError)
// 3. Fonctions pures pour interpréter (status, body) → testables sans réseau
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{ForecastSource, HistoricalSource, HistoryRequest};
use crate::config;
use crate::error::FetchError;
use crate::models::{wire, ForecastRow, StockDataRow};

/// Le forecast peut être long (fit du modèle côté serveur)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// La sonde de démarrage ne doit pas retarder l'affichage du TUI
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Corps de `POST /api/forecast`
#[derive(Debug, Serialize)]
struct ForecastRequest<'a> {
    stock_data: &'a [StockDataRow],
    days: u32,
}

/// Client HTTP du backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Crée un client pour une URL de base (ex: "http://localhost:8000")
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lazyforecast/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Crée un client à partir de la configuration (URL en cache)
    pub async fn from_config() -> anyhow::Result<Self> {
        Self::new(config::api_url().await)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Construit l'URL de `/api/stocks`
    ///
    /// CONCEPT : Url::parse_with_params
    /// - Encode les paramètres (tickers comme "^GSPC" ou "EURUSD=X")
    pub fn stocks_url(&self, request: &HistoryRequest) -> Result<Url, FetchError> {
        let start = request.start.format("%Y-%m-%d").to_string();
        let end = request.end.format("%Y-%m-%d").to_string();

        Url::parse_with_params(
            &format!("{}/api/stocks", self.base_url),
            &[
                ("ticker", request.ticker.as_str()),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("interval", request.interval.to_api_string()),
            ],
        )
        .map_err(|e| FetchError::transport(format!("Invalid API URL: {}", e)))
    }

    fn forecast_url(&self) -> String {
        format!("{}/api/forecast", self.base_url)
    }

    /// Vérifie que le backend répond `{ "status": "ok" }` (en HEALTH_TIMEOUT max)
    pub async fn health(&self) -> bool {
        self.health_within(HEALTH_TIMEOUT).await
    }

    /// Sonde de disponibilité bornée dans le temps
    pub async fn health_within(&self, limit: Duration) -> bool {
        match tokio::time::timeout(limit, self.check_health()).await {
            Ok(healthy) => healthy,
            Err(_) => {
                warn!(?limit, "Health check timed out");
                false
            }
        }
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let body: serde_json::Value = response.json().await.unwrap_or_default();
                body.get("status").and_then(|s| s.as_str()) == Some("ok")
            }
            Ok(response) => {
                warn!(status = %response.status(), "Health check returned error status");
                false
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl HistoricalSource for ApiClient {
    #[instrument(skip(self, request), fields(ticker = %request.ticker, interval = request.interval.label()))]
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Vec<StockDataRow>, FetchError> {
        let url = self.stocks_url(request)?;
        debug!(url = %url, "Sending stocks request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Stocks request failed");
                FetchError::transport(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "Received stocks response");

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let rows = classify_history_response(&request.ticker, status, &body)?;
        info!(rows = rows.len(), "Successfully fetched stock data");
        Ok(rows)
    }
}

#[async_trait]
impl ForecastSource for ApiClient {
    #[instrument(skip(self, history), fields(rows = history.len()))]
    async fn fetch_forecast(&self, history: &[StockDataRow], days: u32) -> Result<Vec<ForecastRow>, FetchError> {
        debug!("Sending forecast request");

        let response = self
            .http
            .post(self.forecast_url())
            .json(&ForecastRequest {
                stock_data: history,
                days,
            })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Forecast request failed");
                FetchError::transport(e.to_string())
            })?;

        let status = response.status();
        debug!(status = %status, "Received forecast response");

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(e.to_string()))?;

        let rows = classify_forecast_response(status, &body)?;
        info!(points = rows.len(), "Successfully fetched forecast");
        Ok(rows)
    }
}

/// Raison lisible d'un status HTTP ("Internal Server Error", ...)
fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

/// Interprète la réponse de `/api/stocks`
///
/// Signaux "not found" :
/// - 204 No Content (le backend répond 204 quand la série est vide)
/// - 404 Not Found
/// - corps vide ou illisible, tableau vide
///
/// Tout autre status d'erreur → Transport avec la raison HTTP.
pub fn classify_history_response(
    ticker: &str,
    status: StatusCode,
    body: &str,
) -> Result<Vec<StockDataRow>, FetchError> {
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
        warn!(ticker, status = %status, "No stock data for ticker");
        return Err(FetchError::not_found(ticker));
    }

    if !status.is_success() {
        error!(status = %status, "Stocks API returned error status");
        return Err(FetchError::transport(format!(
            "Failed to fetch stock data: {}",
            status_reason(status)
        )));
    }

    if body.trim().is_empty() {
        return Err(FetchError::not_found(ticker));
    }

    // Tableau lu élément par élément : une ligne mal typée ne fait pas
    // échouer les autres, le normaliseur la comptera
    match serde_json::from_str::<Vec<Value>>(body) {
        Ok(values) if values.is_empty() => Err(FetchError::not_found(ticker)),
        Ok(values) => Ok(wire::decode_rows(values, StockDataRow::unreadable)),
        Err(e) => {
            warn!(ticker, error = %e, "Unparseable stocks body");
            Err(FetchError::not_found(ticker))
        }
    }
}

/// Interprète la réponse de `/api/forecast`
pub fn classify_forecast_response(status: StatusCode, body: &str) -> Result<Vec<ForecastRow>, FetchError> {
    if !status.is_success() {
        error!(status = %status, "Forecast API returned error status");
        return Err(FetchError::transport(format!(
            "Failed to fetch forecast: {}",
            status_reason(status)
        )));
    }

    let values: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| FetchError::transport(format!("Failed to fetch forecast: invalid response ({})", e)))?;

    Ok(wire::decode_rows(values, ForecastRow::unreadable))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;
    use chrono::NaiveDate;

    fn request(ticker: &str) -> HistoryRequest {
        HistoryRequest {
            ticker: ticker.to_string(),
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            interval: Interval::Weekly,
        }
    }

    #[test]
    fn test_stocks_url() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        let url = client.stocks_url(&request("AAPL")).unwrap();

        assert_eq!(url.path(), "/api/stocks");
        assert!(url.as_str().starts_with("http://localhost:8000/api/stocks?"));
        assert!(url.as_str().contains("ticker=AAPL"));
        assert!(url.as_str().contains("start_date=2023-01-01"));
        assert!(url.as_str().contains("end_date=2023-12-31"));
        assert!(url.as_str().contains("interval=1wk"));
    }

    #[test]
    fn test_stocks_url_encodes_ticker() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        let url = client.stocks_url(&request("^GSPC")).unwrap();
        assert!(url.as_str().contains("ticker=%5EGSPC"));
    }

    #[test]
    fn test_history_not_found_signals() {
        for (status, body) in [
            (StatusCode::NO_CONTENT, ""),
            (StatusCode::NOT_FOUND, r#"{"detail":"Not Found"}"#),
            (StatusCode::OK, ""),
            (StatusCode::OK, "[]"),
            (StatusCode::OK, "{\"detail\":"),
        ] {
            let err = classify_history_response("ZZZZ", status, body).unwrap_err();
            assert_eq!(err, FetchError::not_found("ZZZZ"), "status {} body {:?}", status, body);
        }
    }

    #[test]
    fn test_history_transport_error() {
        let err = classify_history_response("AAPL", StatusCode::INTERNAL_SERVER_ERROR, "").unwrap_err();
        assert_eq!(
            err,
            FetchError::transport("Failed to fetch stock data: Internal Server Error")
        );
    }

    #[test]
    fn test_history_ok() {
        let body = r#"[{"Date":"2023-01-03T00:00:00","Open":1.0,"High":2.0,"Low":0.5,
            "Close":1.5,"Adj_Close":1.5,"Volume":10}]"#;
        let rows = classify_history_response("AAPL", StatusCode::OK, body).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_forecast_classification() {
        let err = classify_forecast_response(StatusCode::BAD_REQUEST, "").unwrap_err();
        assert_eq!(err, FetchError::transport("Failed to fetch forecast: Bad Request"));

        let body = r#"[{"ds":"2024-01-01T00:00:00","yhat":1.0,"yhat_lower":0.5,"yhat_upper":1.5,"trend":1.0}]"#;
        let rows = classify_forecast_response(StatusCode::OK, body).unwrap();
        assert_eq!(rows[0].yhat_upper, 1.5);
    }

    #[tokio::test]
    async fn test_health_gives_up_on_silent_backend() {
        // Connexion acceptée par le noyau, mais aucune réponse HTTP
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = ApiClient::new(format!("http://{}", listener.local_addr().unwrap())).unwrap();

        let started = std::time::Instant::now();
        assert!(!client.health_within(Duration::from_millis(200)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_history_skips_only_the_bad_row() {
        let body = r#"[
            {"Date":"2023-01-03","Open":1.0,"High":2.0,"Low":0.5,"Close":1.5,"Adj_Close":1.5,"Volume":10},
            {"Date":null,"Open":1.0,"High":2.0,"Low":0.5,"Close":1.5,"Adj_Close":1.5,"Volume":10},
            {"Date":"2023-01-05","Open":1.0,"High":2.0,"Low":0.5,"Close":1.5,"Adj_Close":1.5,"Volume":10.0},
            "garbage"
        ]"#;
        let rows = classify_history_response("AAPL", StatusCode::OK, body).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].date, "null");
        assert_eq!(rows[2].volume, Some(10));
        assert_eq!(rows[3], StockDataRow::unreadable("\"garbage\"".to_string()));
    }

    #[test]
    fn test_forecast_keeps_rows_around_a_null_yhat() {
        let body = r#"[
            {"ds":"2024-01-01","yhat":1.0,"yhat_lower":0.5,"yhat_upper":1.5},
            {"ds":"2024-01-02","yhat":null,"yhat_lower":0.5,"yhat_upper":1.5},
            {"ds":"2024-01-03","yhat":1.2,"yhat_lower":0.7,"yhat_upper":1.7}
        ]"#;
        let rows = classify_forecast_response(StatusCode::OK, body).unwrap();

        assert_eq!(rows.len(), 3);
        assert!(rows[1].yhat.is_nan());
        assert_eq!(rows[2].yhat, 1.2);
    }

    #[test]
    fn test_forecast_request_body() {
        let rows: Vec<StockDataRow> = Vec::new();
        let body = serde_json::to_value(ForecastRequest { stock_data: &rows, days: 30 }).unwrap();
        assert_eq!(body["days"], 30);
        assert!(body["stock_data"].as_array().unwrap().is_empty());
    }
}
