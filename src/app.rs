// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Composition : App possède la Session (données + requêtes)
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - La logique métier (validation, séquences, séries) vit dans Session
// ============================================================================

use chrono::{Months, NaiveDate};
use tracing::{error, info};

use crate::error::FetchError;
use crate::export::FileSink;
use crate::models::{ForecastRow, Interval, StockDataRow};
use crate::series::{MergedPoint, TimeWindow};
use crate::session::{FetchInput, FetchTicket, ForecastTicket, Session, DEFAULT_HORIZON_DAYS};

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Formulaire de saisie (ticker, dates, intervalle, horizon)
    /// Les touches sont capturées comme du texte (mode saisie)
    Form,

    /// Résultats : graphique, tableau, forecast
    Results,
}

/// Onglets de l'écran de résultats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Chart,
    Data,
    Forecast,
}

impl Tab {
    pub fn all() -> [Tab; 3] {
        [Tab::Chart, Tab::Data, Tab::Forecast]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Chart => "Chart",
            Tab::Data => "Data",
            Tab::Forecast => "Forecast",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Chart => 0,
            Tab::Data => 1,
            Tab::Forecast => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Tab> {
        Tab::all().get(index).copied()
    }
}

/// Champ du formulaire ayant le focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Ticker,
    StartDate,
    EndDate,
    Interval,
    Horizon,
}

impl FormField {
    pub fn all() -> [FormField; 5] {
        [
            FormField::Ticker,
            FormField::StartDate,
            FormField::EndDate,
            FormField::Interval,
            FormField::Horizon,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Ticker => "Ticker",
            FormField::StartDate => "Start date",
            FormField::EndDate => "End date",
            FormField::Interval => "Interval",
            FormField::Horizon => "Forecast days",
        }
    }

    /// Tab : Ticker → Start → End → Interval → Horizon → Ticker
    pub fn next(&self) -> FormField {
        match self {
            FormField::Ticker => FormField::StartDate,
            FormField::StartDate => FormField::EndDate,
            FormField::EndDate => FormField::Interval,
            FormField::Interval => FormField::Horizon,
            FormField::Horizon => FormField::Ticker,
        }
    }

    pub fn previous(&self) -> FormField {
        match self {
            FormField::Ticker => FormField::Horizon,
            FormField::StartDate => FormField::Ticker,
            FormField::EndDate => FormField::StartDate,
            FormField::Interval => FormField::EndDate,
            FormField::Horizon => FormField::Interval,
        }
    }
}

/// Parse une date saisie "YYYY-MM-DD" ; None si vide ou invalide
fn parse_input_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    pub current_screen: Screen,
    pub current_tab: Tab,
    pub focused_field: FormField,

    // Champs du formulaire (texte brut, validé par la session)
    pub ticker_input: String,
    pub start_input: String,
    pub end_input: String,
    pub interval: Interval,
    pub horizon_input: String,

    /// Fenêtre du graphique de forecast (30/60/120 jours)
    pub window: TimeWindow,

    /// Données et requêtes en cours
    pub session: Session,

    /// Two-step quit : première pression de 'q' arme, la seconde quitte
    pub confirm_quit: bool,

    /// Message d'information (export réussi, ...), distinct des erreurs
    pub status_message: Option<String>,
}

impl App {
    /// Crée une App avec une période par défaut de 12 mois se terminant aujourd'hui
    pub fn new(today: NaiveDate) -> Self {
        let start = today.checked_sub_months(Months::new(12)).unwrap_or(today);

        Self {
            running: true,
            current_screen: Screen::Form,
            current_tab: Tab::default(),
            focused_field: FormField::default(),
            ticker_input: String::new(),
            start_input: start.format("%Y-%m-%d").to_string(),
            end_input: today.format("%Y-%m-%d").to_string(),
            interval: Interval::default(),
            horizon_input: DEFAULT_HORIZON_DAYS.to_string(),
            window: TimeWindow::default(),
            session: Session::new(),
            confirm_quit: false,
            status_message: None,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn show_form(&mut self) {
        self.current_screen = Screen::Form;
    }

    pub fn show_results(&mut self) {
        self.current_screen = Screen::Results;
    }

    pub fn is_on_form(&self) -> bool {
        self.current_screen == Screen::Form
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
    }

    /// Fenêtre suivante : 30 → 60 → 120 → 30
    ///
    /// Ne déclenche aucun fetch : le graphique est recalculé depuis la
    /// série fusionnée en cache.
    pub fn next_window(&mut self) {
        self.window = self.window.next();
    }

    pub fn chart_points(&self) -> Vec<MergedPoint> {
        self.session.chart_points(self.window)
    }

    // ========================================================================
    // Formulaire
    // ========================================================================

    pub fn next_field(&mut self) {
        self.focused_field = self.focused_field.next();
    }

    pub fn previous_field(&mut self) {
        self.focused_field = self.focused_field.previous();
    }

    /// Buffer texte du champ ayant le focus (None pour le sélecteur d'intervalle)
    fn focused_buffer(&mut self) -> Option<&mut String> {
        match self.focused_field {
            FormField::Ticker => Some(&mut self.ticker_input),
            FormField::StartDate => Some(&mut self.start_input),
            FormField::EndDate => Some(&mut self.end_input),
            FormField::Horizon => Some(&mut self.horizon_input),
            FormField::Interval => None,
        }
    }

    /// Ajoute un caractère au champ ayant le focus
    ///
    /// Le champ horizon n'accepte que des chiffres.
    pub fn append_char(&mut self, c: char) {
        if self.focused_field == FormField::Horizon && !c.is_ascii_digit() {
            return;
        }
        if let Some(buffer) = self.focused_buffer() {
            buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.focused_buffer() {
            buffer.pop();
        }
    }

    pub fn next_interval(&mut self) {
        self.interval = self.interval.next();
    }

    pub fn previous_interval(&mut self) {
        self.interval = self.interval.previous();
    }

    /// Saisie courante, telle que la session la valide
    pub fn fetch_input(&self) -> FetchInput {
        FetchInput::new(
            self.ticker_input.clone(),
            parse_input_date(&self.start_input),
            parse_input_date(&self.end_input),
            self.interval,
        )
    }

    /// Horizon saisi ; 0 si vide ou invalide (rejeté par la session)
    pub fn horizon(&self) -> u32 {
        self.horizon_input.trim().parse().unwrap_or(0)
    }

    // ========================================================================
    // Requêtes
    // ========================================================================

    /// Démarre un fetch ; None si un fetch est déjà en vol ou si la saisie est invalide
    pub fn begin_fetch(&mut self, today: NaiveDate) -> Option<FetchTicket> {
        if self.session.is_fetching() {
            return None;
        }
        self.status_message = None;

        match self.session.begin_fetch(&self.fetch_input(), today) {
            Ok(ticket) => {
                self.status_message = Some(format!("Fetching {}…", ticket.request.ticker));
                Some(ticket)
            }
            Err(_) => None,
        }
    }

    /// Applique le résultat d'un fetch (ignoré si périmé)
    pub fn complete_fetch(&mut self, seq: u64, result: Result<Vec<StockDataRow>, FetchError>) {
        if !self.session.complete_fetch(seq, result) {
            return;
        }

        self.status_message = None;
        if self.session.error().is_none() {
            self.current_tab = Tab::Chart;
            self.show_results();
        }
    }

    /// Démarre un forecast ; None si un forecast est déjà en vol ou refusé
    pub fn begin_forecast(&mut self) -> Option<ForecastTicket> {
        if self.session.is_forecasting() {
            return None;
        }
        self.status_message = None;

        match self.session.begin_forecast(self.horizon()) {
            Ok(ticket) => {
                self.status_message = Some(format!("Forecasting {} days…", ticket.days));
                Some(ticket)
            }
            Err(_) => None,
        }
    }

    pub fn complete_forecast(&mut self, seq: u64, result: Result<Vec<ForecastRow>, FetchError>) {
        if !self.session.complete_forecast(seq, result) {
            return;
        }

        self.status_message = None;
        if self.session.error().is_none() {
            self.current_tab = Tab::Forecast;
            self.show_results();
        }
    }

    /// Exporte la série de l'onglet courant (Forecast → forecast, sinon historique)
    pub fn export_current(&mut self, sink: &dyn FileSink, today: NaiveDate) {
        let result = match self.current_tab {
            Tab::Forecast => self.session.export_forecast(sink, today),
            Tab::Chart | Tab::Data => self.session.export_historical(sink, today),
        };

        self.status_message = Some(match result {
            Ok(Some(path)) => {
                info!(path = %path.display(), "CSV exported");
                format!("Exported to {}", path.display())
            }
            Ok(None) => "Nothing to export".to_string(),
            Err(e) => {
                error!(error = %e, "CSV export failed");
                format!("Export failed: {:#}", e)
            }
        });
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
