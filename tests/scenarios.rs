use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use lazyforecast::api::{classify_history_response, ForecastSource, HistoricalSource, HistoryRequest};
use lazyforecast::error::FetchError;
use lazyforecast::models::{ForecastRow, Interval, StockDataRow};
use lazyforecast::series::{parse_date, TimeWindow};
use lazyforecast::session::{FetchInput, Session, SessionState};
use reqwest::StatusCode;
use serde_json::{json, Map};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 15)
}

/// Collaborateur en mémoire : une séance par jour ouvré sur la période demandée
#[derive(Default)]
struct FakeMarket {
    history_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
    unknown_tickers: Vec<String>,
}

impl FakeMarket {
    fn rows(request: &HistoryRequest) -> Vec<StockDataRow> {
        let mut rows = Vec::new();
        let mut day = request.start;
        let mut price = 130.0;

        while day <= request.end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                price += 0.25;
                rows.push(StockDataRow {
                    date: format!("{}T00:00:00", day.format("%Y-%m-%d")),
                    open: Some(price - 0.5),
                    high: Some(price + 1.0),
                    low: Some(price - 1.0),
                    close: Some(price),
                    adj_close: Some(price - 0.1),
                    volume: Some(50_000_000),
                });
            }
            day = day.checked_add_days(Days::new(1)).unwrap();
        }

        rows
    }
}

#[async_trait]
impl HistoricalSource for FakeMarket {
    async fn fetch_history(&self, request: &HistoryRequest) -> Result<Vec<StockDataRow>, FetchError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.unknown_tickers.contains(&request.ticker) {
            // Le backend répond 204 quand la série est vide
            return classify_history_response(&request.ticker, StatusCode::NO_CONTENT, "");
        }
        Ok(Self::rows(request))
    }
}

#[async_trait]
impl ForecastSource for FakeMarket {
    async fn fetch_forecast(&self, history: &[StockDataRow], days: u32) -> Result<Vec<ForecastRow>, FetchError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);

        let last = history.last().map(|r| r.date.clone()).unwrap_or_default();
        let last = parse_date(&last).map_err(|e| FetchError::transport(e.to_string()))?;

        Ok((1..=days)
            .map(|i| {
                let ds = last.checked_add_days(Days::new(u64::from(i))).unwrap();
                let mut components = Map::new();
                components.insert("trend".to_string(), json!(200.0 + f64::from(i)));
                ForecastRow {
                    ds: format!("{}T00:00:00", ds.format("%Y-%m-%d")),
                    yhat: 200.0 + f64::from(i),
                    yhat_lower: 190.0 + f64::from(i),
                    yhat_upper: 210.0 + f64::from(i),
                    components,
                }
            })
            .collect())
    }
}

fn input(ticker: &str, start: NaiveDate, end: NaiveDate) -> FetchInput {
    FetchInput::new(ticker, Some(start), Some(end), Interval::Daily)
}

#[tokio::test]
async fn twelve_months_then_thirty_day_forecast() {
    let market = FakeMarket::default();
    let mut session = Session::new();

    session
        .fetch_historical(&market, &input("AAPL", date(2023, 1, 1), date(2023, 12, 31)), today())
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::DataLoaded);
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 1);

    session.fetch_forecast(&market, 30).await.unwrap();
    assert_eq!(session.state(), SessionState::ForecastLoaded);

    let merged = session.merged();
    assert_eq!(merged.len(), session.historical().len() + 30);

    let (before, last_30) = merged.split_at(merged.len() - 30);
    assert!(last_30.iter().all(|p| p.actual_close().is_none() && p.predicted().is_some()));
    assert!(before.iter().all(|p| p.actual_close().is_some()));

    assert_eq!(session.historical_preview().len(), 4);
    assert_eq!(session.forecast_preview().len(), 5);
    assert_eq!(session.forecast()[0].components.trend(), Some(201.0));
}

#[tokio::test]
async fn two_month_range_is_rejected_without_fetch() {
    let market = FakeMarket::default();
    let mut session = Session::new();

    let err = session
        .fetch_historical(&market, &input("AAPL", date(2023, 10, 1), date(2023, 12, 1)), today())
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Date range must be at least 6 months. Please select a start date that is at least 6 months before the end date."
    );
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn future_end_date_is_rejected_without_fetch() {
    let market = FakeMarket::default();
    let mut session = Session::new();

    let err = session
        .fetch_historical(&market, &input("AAPL", date(2023, 1, 1), date(2024, 7, 1)), today())
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "End date cannot be in the future");
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_ticker_message_names_the_symbol() {
    let market = FakeMarket {
        unknown_tickers: vec!["NOPE".to_string()],
        ..FakeMarket::default()
    };
    let mut session = Session::new();

    let err = session
        .fetch_historical(&market, &input("nope", date(2023, 1, 1), date(2023, 12, 31)), today())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    let message = session.error_message().unwrap();
    assert!(message.contains("NOPE"), "{}", message);
    assert_eq!(session.state(), SessionState::FetchFailed);
    assert!(session.historical().is_empty());
}

#[tokio::test]
async fn forecast_without_data_is_rejected_locally() {
    let market = FakeMarket::default();
    let mut session = Session::new();

    let err = session.fetch_forecast(&market, 30).await.unwrap_err();

    assert_eq!(err.user_message(), "Please fetch stock data first");
    assert_eq!(market.forecast_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn widening_the_window_reveals_earlier_points_without_refetch() {
    let market = FakeMarket::default();
    let mut session = Session::new();
    session
        .fetch_historical(&market, &input("AAPL", date(2023, 1, 1), date(2023, 12, 31)), today())
        .await
        .unwrap();
    session.fetch_forecast(&market, 30).await.unwrap();

    let narrow = session.chart_points(TimeWindow::Days30);
    let wide = session.chart_points(TimeWindow::Days120);

    // Tous les points de forecast sont gardés quelle que soit la fenêtre
    assert_eq!(narrow.iter().filter(|p| p.is_forecast()).count(), 30);
    assert_eq!(wide.iter().filter(|p| p.is_forecast()).count(), 30);

    // Les points historiques plus anciens réapparaissent, dans le même ordre
    assert!(wide.len() > narrow.len());
    assert_eq!(&wide[wide.len() - narrow.len()..], narrow.as_slice());
    assert!(wide.windows(2).all(|w| w[0].time_key <= w[1].time_key));

    // Retour à 30 jours : identique, sans nouvel appel
    assert_eq!(session.chart_points(TimeWindow::Days30), narrow);
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 1);
    assert_eq!(market.forecast_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn new_fetch_clears_previous_forecast() {
    let market = FakeMarket::default();
    let mut session = Session::new();
    session
        .fetch_historical(&market, &input("AAPL", date(2023, 1, 1), date(2023, 12, 31)), today())
        .await
        .unwrap();
    session.fetch_forecast(&market, 10).await.unwrap();
    assert_eq!(session.forecast().len(), 10);

    session
        .fetch_historical(&market, &input("MSFT", date(2023, 1, 1), date(2023, 12, 31)), today())
        .await
        .unwrap();

    assert_eq!(session.state(), SessionState::DataLoaded);
    assert!(session.forecast().is_empty());
    assert!(session.merged().iter().all(|p| !p.is_forecast()));
    assert_eq!(session.ticker(), Some("MSFT"));
}
