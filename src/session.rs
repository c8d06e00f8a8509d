// ============================================================================
// Session : orchestration des requêtes
// ============================================================================
// Détient les séries chargées et l'état de la session :
// - valide la saisie avant tout appel réseau
// - émet des tickets numérotés pour chaque requête (historique, forecast)
// - ignore les réponses dont le ticket n'est plus celui attendu
// - dérive les artefacts (série fusionnée, fenêtre du graphique, aperçus, CSV)
//
// CONCEPTS RUST :
// 1. State machine : transition pure (état, événement) → nouvel état
// 2. Split begin/complete : l'I/O peut tourner sur un autre thread
// 3. Ownership : les séries sont remplacées en bloc, jamais modifiées en place
// ============================================================================

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Days, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::api::{ForecastSource, HistoricalSource, HistoryRequest};
use crate::error::FetchError;
use crate::export::{export_filename, forecast_columns, historical_columns, to_csv, ExportKind, FileSink};
use crate::models::{ForecastPoint, ForecastRow, HistoricalPoint, Interval, StockDataRow};
use crate::series::{
    filter_window, merge_series, normalize_forecast, normalize_historical, preview, DateWindow, MergedPoint,
    TimeWindow, FORECAST_PREVIEW_ROWS, HISTORICAL_PREVIEW_ROWS,
};

/// Écart minimum entre la date de début et la date de fin
pub const MIN_RANGE_MONTHS: u32 = 6;

/// Horizon de forecast par défaut (jours)
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Horizon de forecast maximum (jours)
pub const MAX_HORIZON_DAYS: u32 = 365;

const MSG_EMPTY_TICKER: &str = "Please enter a ticker symbol";
const MSG_MISSING_DATES: &str = "Please select both start and end dates";
const MSG_FUTURE_END: &str = "End date cannot be in the future";
const MSG_RANGE_TOO_SHORT: &str = "Date range must be at least 6 months. Please select a start date that is at least 6 months before the end date.";
const MSG_NO_DATA: &str = "Please fetch stock data first";
const MSG_BAD_HORIZON: &str = "Forecast horizon must be between 1 and 365 days";

// ============================================================================
// Saisie et validation
// ============================================================================

/// Saisie brute du formulaire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchInput {
    pub ticker: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub interval: Interval,
}

impl FetchInput {
    pub fn new(ticker: impl Into<String>, start: Option<NaiveDate>, end: Option<NaiveDate>, interval: Interval) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
            interval,
        }
    }
}

/// Date "débordante" : le jour `day` du mois `month0` (0-based, peut sortir
/// de 0..12), les jours en trop passent sur le mois suivant (30 février → 1er/2 mars)
fn overflowing_date(year: i32, month0: i32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year + month0.div_euclid(12), month0.rem_euclid(12) as u32 + 1, 1)?;
    first.checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

/// Nombre de mois complets de `start` à `end` (0 si `end <= start`)
///
/// Écart en mois calendaires, moins un si le dernier mois n'est pas complet
/// (le jour de `end` ramené au mois de `start` tombe avant `start`).
/// Fin février (après le 27) compte comme le 30 : du 31 août au 28 février,
/// on a bien 6 mois.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }

    let calendar = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if calendar < 1 {
        return 0;
    }

    let later = if end.month() == 2 && end.day() > 27 {
        overflowing_date(end.year(), end.month0() as i32, 30).unwrap_or(end)
    } else {
        end
    };

    let mut incomplete = overflowing_date(later.year(), later.month0() as i32 - calendar, later.day())
        .map_or(false, |shifted| shifted < start);
    if calendar == 1 && is_last_day_of_month(end) {
        incomplete = false;
    }

    (calendar - i32::from(incomplete)) as u32
}

/// Valide la saisie et produit la requête historique
///
/// Règles, dans l'ordre :
/// 1. ticker non vide après trim
/// 2. dates de début et de fin renseignées
/// 3. date de fin pas dans le futur
/// 4. au moins 6 mois calendaires entre début et fin
pub fn validate(input: &FetchInput, today: NaiveDate) -> Result<HistoryRequest, FetchError> {
    let ticker = input.ticker.trim();
    if ticker.is_empty() {
        return Err(FetchError::validation(MSG_EMPTY_TICKER));
    }

    let (Some(start), Some(end)) = (input.start, input.end) else {
        return Err(FetchError::validation(MSG_MISSING_DATES));
    };

    if end > today {
        return Err(FetchError::validation(MSG_FUTURE_END));
    }

    if months_between(start, end) < MIN_RANGE_MONTHS {
        return Err(FetchError::validation(MSG_RANGE_TOO_SHORT));
    }

    Ok(HistoryRequest {
        ticker: ticker.to_uppercase(),
        start,
        end,
        interval: input.interval,
    })
}

// ============================================================================
// State machine
// ============================================================================

/// État de la session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Fetching,
    DataLoaded,
    FetchFailed,
    ForecastPending,
    ForecastLoaded,
    ForecastFailed,
}

/// Événements qui font avancer la session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    FetchStarted,
    FetchSucceeded,
    FetchFailed,
    ForecastStarted,
    ForecastSucceeded,
    ForecastFailed,
}

impl SessionState {
    /// Table de transition ; None si l'événement est illégal dans cet état
    ///
    /// Un nouveau fetch est accepté depuis n'importe quel état : il remplace
    /// tout ce qui était en cours (le ticket précédent devient périmé).
    pub fn next(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent as E;
        use SessionState as S;

        match (self, event) {
            (_, E::FetchStarted) => Some(S::Fetching),
            (S::Fetching, E::FetchSucceeded) => Some(S::DataLoaded),
            (S::Fetching, E::FetchFailed) => Some(S::FetchFailed),
            (S::DataLoaded | S::ForecastLoaded | S::ForecastFailed | S::ForecastPending, E::ForecastStarted) => {
                Some(S::ForecastPending)
            }
            (S::ForecastPending, E::ForecastSucceeded) => Some(S::ForecastLoaded),
            (S::ForecastPending, E::ForecastFailed) => Some(S::ForecastFailed),
            _ => None,
        }
    }

    /// Des données historiques sont disponibles dans cet état
    pub fn has_data(&self) -> bool {
        matches!(
            self,
            SessionState::DataLoaded
                | SessionState::ForecastPending
                | SessionState::ForecastLoaded
                | SessionState::ForecastFailed
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Fetching => "Fetching…",
            SessionState::DataLoaded => "Data loaded",
            SessionState::FetchFailed => "Fetch failed",
            SessionState::ForecastPending => "Forecasting…",
            SessionState::ForecastLoaded => "Forecast loaded",
            SessionState::ForecastFailed => "Forecast failed",
        }
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Requête historique en vol
///
/// Contient tout ce qu'il faut pour faire l'appel sur un autre thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub request: HistoryRequest,
}

/// Requête de forecast en vol
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTicket {
    pub seq: u64,
    pub history: Vec<StockDataRow>,
    pub days: u32,
}

// ============================================================================
// Session
// ============================================================================

/// Orchestrateur : séries chargées, erreurs, requêtes en vol
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,

    /// Requête qui a produit les données historiques actuelles
    loaded: Option<HistoryRequest>,

    historical: Vec<HistoricalPoint>,
    forecast: Vec<ForecastPoint>,

    /// Historique + forecast, trié par time key
    /// Recalculé uniquement quand une des deux séries est remplacée
    merged: Vec<MergedPoint>,

    /// Lignes ignorées par le normaliseur, par série affichée
    skipped_historical: usize,
    skipped_forecast: usize,

    error: Option<FetchError>,

    next_seq: u64,
    pending_fetch: Option<FetchTicket>,
    pending_forecast: Option<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Accesseurs
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn historical(&self) -> &[HistoricalPoint] {
        &self.historical
    }

    pub fn forecast(&self) -> &[ForecastPoint] {
        &self.forecast
    }

    pub fn merged(&self) -> &[MergedPoint] {
        &self.merged
    }

    pub fn loaded_request(&self) -> Option<&HistoryRequest> {
        self.loaded.as_ref()
    }

    /// Ticker des données affichées (déjà normalisé en majuscules)
    pub fn ticker(&self) -> Option<&str> {
        self.loaded.as_ref().map(|request| request.ticker.as_str())
    }

    /// Lignes ignorées dans les séries affichées (historique + forecast)
    pub fn skipped_rows(&self) -> usize {
        self.skipped_historical + self.skipped_forecast
    }

    pub fn skipped_forecast_rows(&self) -> usize {
        self.skipped_forecast
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Message d'erreur affiché (un seul à la fois)
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(FetchError::user_message)
    }

    pub fn is_fetching(&self) -> bool {
        self.pending_fetch.is_some()
    }

    pub fn is_forecasting(&self) -> bool {
        self.pending_forecast.is_some()
    }

    fn issue_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Applique un événement ; un événement illégal est ignoré et loggé
    fn apply(&mut self, event: SessionEvent) -> bool {
        match self.state.next(event) {
            Some(next) => {
                debug!(from = ?self.state, to = ?next, ?event, "Session transition");
                self.state = next;
                true
            }
            None => {
                warn!(state = ?self.state, ?event, "Rejected session event");
                false
            }
        }
    }

    fn remerge(&mut self) {
        self.merged = merge_series(&self.historical, &self.forecast);
    }

    // ------------------------------------------------------------------------
    // Fetch historique
    // ------------------------------------------------------------------------

    /// Valide la saisie et démarre un fetch historique
    ///
    /// En cas d'erreur de validation : message affiché, aucun ticket émis,
    /// l'état et les données restent inchangés.
    pub fn begin_fetch(&mut self, input: &FetchInput, today: NaiveDate) -> Result<FetchTicket, FetchError> {
        let request = match validate(input, today) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Fetch rejected by validation");
                self.error = Some(e.clone());
                return Err(e);
            }
        };

        self.apply(SessionEvent::FetchStarted);
        self.error = None;

        // Un forecast ne doit jamais être affiché face à un autre historique
        self.forecast = Vec::new();
        self.skipped_forecast = 0;
        self.pending_forecast = None;
        self.remerge();

        let ticket = FetchTicket {
            seq: self.issue_seq(),
            request,
        };
        info!(seq = ticket.seq, ticker = %ticket.request.ticker, "Fetch started");
        self.pending_fetch = Some(ticket.clone());
        Ok(ticket)
    }

    /// Termine un fetch historique
    ///
    /// Retourne false si le ticket est périmé (réponse ignorée).
    pub fn complete_fetch(&mut self, seq: u64, result: Result<Vec<StockDataRow>, FetchError>) -> bool {
        let ticket = match self.pending_fetch.take() {
            Some(ticket) if ticket.seq == seq => ticket,
            other => {
                warn!(seq, pending = ?other.as_ref().map(|t| t.seq), "Discarding stale fetch response");
                self.pending_fetch = other;
                return false;
            }
        };

        let result = result.and_then(|rows| {
            let normalized = normalize_historical(&rows);
            if normalized.is_empty() {
                Err(FetchError::not_found(&ticket.request.ticker))
            } else {
                Ok(normalized)
            }
        });

        match result {
            Ok(normalized) => {
                info!(
                    seq,
                    points = normalized.len(),
                    skipped = normalized.skipped,
                    "Historical data loaded"
                );
                self.apply(SessionEvent::FetchSucceeded);
                self.historical = normalized.points;
                self.skipped_historical = normalized.skipped;
                self.skipped_forecast = 0;
                self.forecast = Vec::new();
                self.loaded = Some(ticket.request);
                self.error = None;
            }
            Err(e) => {
                warn!(seq, error = %e, "Historical fetch failed");
                self.apply(SessionEvent::FetchFailed);
                self.historical = Vec::new();
                self.forecast = Vec::new();
                self.skipped_historical = 0;
                self.skipped_forecast = 0;
                self.loaded = None;
                self.error = Some(e);
            }
        }

        self.remerge();
        true
    }

    // ------------------------------------------------------------------------
    // Forecast
    // ------------------------------------------------------------------------

    /// Démarre un forecast sur l'historique chargé
    pub fn begin_forecast(&mut self, days: u32) -> Result<ForecastTicket, FetchError> {
        if self.historical.is_empty() || !self.state.has_data() {
            let e = FetchError::validation(MSG_NO_DATA);
            self.error = Some(e.clone());
            return Err(e);
        }

        if !(1..=MAX_HORIZON_DAYS).contains(&days) {
            let e = FetchError::validation(MSG_BAD_HORIZON);
            self.error = Some(e.clone());
            return Err(e);
        }

        self.apply(SessionEvent::ForecastStarted);
        self.error = None;

        let seq = self.issue_seq();
        self.pending_forecast = Some(seq);
        info!(seq, days, "Forecast started");

        Ok(ForecastTicket {
            seq,
            history: self.historical.iter().map(StockDataRow::from).collect(),
            days,
        })
    }

    /// Termine un forecast ; false si le ticket est périmé
    pub fn complete_forecast(&mut self, seq: u64, result: Result<Vec<ForecastRow>, FetchError>) -> bool {
        if self.pending_forecast != Some(seq) {
            warn!(seq, pending = ?self.pending_forecast, "Discarding stale forecast response");
            return false;
        }
        self.pending_forecast = None;

        match result {
            Ok(rows) => {
                let normalized = normalize_forecast(&rows);
                info!(seq, points = normalized.len(), skipped = normalized.skipped, "Forecast loaded");
                self.apply(SessionEvent::ForecastSucceeded);
                self.forecast = normalized.points;
                self.skipped_forecast = normalized.skipped;
                self.error = None;
            }
            Err(e) => {
                warn!(seq, error = %e, "Forecast failed");
                self.apply(SessionEvent::ForecastFailed);
                self.forecast = Vec::new();
                self.skipped_forecast = 0;
                self.error = Some(e);
            }
        }

        self.remerge();
        true
    }

    // ------------------------------------------------------------------------
    // Drivers async (begin + appel + complete)
    // ------------------------------------------------------------------------

    fn outcome(&self) -> Result<(), FetchError> {
        self.error.clone().map_or(Ok(()), Err)
    }

    /// Fetch complet : validation, appel au collaborateur, application du résultat
    #[instrument(skip(self, source, input), fields(ticker = %input.ticker))]
    pub async fn fetch_historical(
        &mut self,
        source: &dyn HistoricalSource,
        input: &FetchInput,
        today: NaiveDate,
    ) -> Result<(), FetchError> {
        let ticket = self.begin_fetch(input, today)?;
        let result = source.fetch_history(&ticket.request).await;
        self.complete_fetch(ticket.seq, result);
        self.outcome()
    }

    /// Forecast complet sur l'historique chargé
    #[instrument(skip(self, source))]
    pub async fn fetch_forecast(&mut self, source: &dyn ForecastSource, days: u32) -> Result<(), FetchError> {
        let ticket = self.begin_forecast(days)?;
        let result = source.fetch_forecast(&ticket.history, ticket.days).await;
        self.complete_forecast(ticket.seq, result);
        self.outcome()
    }

    // ------------------------------------------------------------------------
    // Artefacts dérivés (purs)
    // ------------------------------------------------------------------------

    /// Points du graphique pour une fenêtre donnée
    ///
    /// Projection de la série fusionnée en cache : changer de fenêtre ne
    /// refetch rien et ne renormalise rien.
    pub fn chart_points(&self, window: TimeWindow) -> Vec<MergedPoint> {
        match &self.loaded {
            Some(request) => filter_window(&self.merged, &DateWindow::from_window(request.end, window)),
            None => Vec::new(),
        }
    }

    pub fn historical_preview(&self) -> &[HistoricalPoint] {
        preview(&self.historical, HISTORICAL_PREVIEW_ROWS)
    }

    pub fn forecast_preview(&self) -> &[ForecastPoint] {
        preview(&self.forecast, FORECAST_PREVIEW_ROWS)
    }

    /// Exporte tout l'historique (non tronqué) ; None s'il n'y a rien à exporter
    pub fn export_historical(&self, sink: &dyn FileSink, today: NaiveDate) -> Result<Option<PathBuf>> {
        let Some(ticker) = self.ticker() else {
            return Ok(None);
        };
        if self.historical.is_empty() {
            return Ok(None);
        }

        let text = to_csv(&self.historical, &historical_columns())?;
        let path = sink.persist(&export_filename(ticker, ExportKind::StockData, today), &text)?;
        Ok(Some(path))
    }

    /// Exporte tout le forecast ; None s'il n'y a pas de forecast
    pub fn export_forecast(&self, sink: &dyn FileSink, today: NaiveDate) -> Result<Option<PathBuf>> {
        let Some(ticker) = self.ticker() else {
            return Ok(None);
        };
        if self.forecast.is_empty() {
            return Ok(None);
        }

        let text = to_csv(&self.forecast, &forecast_columns())?;
        let path = sink.persist(&export_filename(ticker, ExportKind::Forecast, today), &text)?;
        Ok(Some(path))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
