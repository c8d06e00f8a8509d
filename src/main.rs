// ============================================================================
// LazyForecast - Dashboard de cours et de prévisions
// ============================================================================
// Programme TUI : saisie d'un ticker et d'une période, affichage de
// l'historique, forecast à N jours, export CSV.
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Worker thread + runtime tokio : les appels HTTP ne bloquent pas l'UI
// 4. Tickets numérotés : une réponse périmée est ignorée par la session
// ============================================================================

use std::io;
use std::sync::mpsc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use lazyforecast::api::{ApiClient, ForecastSource, HistoricalSource, HistoryRequest};
use lazyforecast::app::{App, FormField, Tab};
use lazyforecast::error::FetchError;
use lazyforecast::export::DirectorySink;
use lazyforecast::models::{ForecastRow, StockDataRow};
use lazyforecast::ui::{events, render, Event, EventHandler};

// ============================================================================
// AppCommand / AppResult : communication avec le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker exécute les appels HTTP et renvoie les résultats
// - Chaque message porte le numéro de séquence de son ticket
// ============================================================================

/// Commandes envoyées au worker thread
enum AppCommand {
    FetchHistory {
        seq: u64,
        request: HistoryRequest,
    },
    FetchForecast {
        seq: u64,
        history: Vec<StockDataRow>,
        days: u32,
    },
}

/// Résultats renvoyés par le worker thread
enum AppResult {
    History {
        seq: u64,
        result: Result<Vec<StockDataRow>, FetchError>,
    },
    Forecast {
        seq: u64,
        result: Result<Vec<ForecastRow>, FetchError>,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier (./logs/lazyforecast.log, rotation quotidienne).
//
// # Utilisation
// ```bash
// tail -f logs/lazyforecast.log
// RUST_LOG=lazyforecast=trace cargo run
// ```
// ============================================================================

fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazyforecast.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazyforecast=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("LazyForecast starting up");

    // Runtime tokio : sert au démarrage (config, health) puis au worker
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let client = runtime.block_on(ApiClient::from_config())?;
    info!(api_url = %client.base_url(), "API client ready");

    if runtime.block_on(client.health()) {
        info!("Backend is healthy");
    } else {
        warn!(api_url = %client.base_url(), "Backend health check failed, requests may fail");
    }

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(runtime, client, command_rx, result_tx);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(today());
    let events = EventHandler::default();
    let sink = DirectorySink::downloads();
    info!(dir = %sink.dir().display(), "Exports directory");

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &sink, command_tx, result_rx);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// CONCEPT RUST : Thread + async runtime
// - Chaque commande devient une tâche tokio (runtime.spawn)
// - Deux fetchs peuvent donc se terminer dans le désordre : c'est la
//   session qui décide, grâce au numéro de séquence, lequel compte
// ============================================================================

fn spawn_background_worker(
    runtime: tokio::runtime::Runtime,
    client: ApiClient,
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
) {
    std::thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            let client = client.clone();
            let result_tx = result_tx.clone();

            match command {
                AppCommand::FetchHistory { seq, request } => {
                    info!(seq, ticker = %request.ticker, "Worker received fetch command");
                    runtime.spawn(async move {
                        let result = client.fetch_history(&request).await;
                        if result_tx.send(AppResult::History { seq, result }).is_err() {
                            debug!(seq, "Result channel closed");
                        }
                    });
                }
                AppCommand::FetchForecast { seq, history, days } => {
                    info!(seq, days, rows = history.len(), "Worker received forecast command");
                    runtime.spawn(async move {
                        let result = client.fetch_forecast(&history, days).await;
                        if result_tx.send(AppResult::Forecast { seq, result }).is_err() {
                            debug!(seq, "Result channel closed");
                        }
                    });
                }
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. appliquer les résultats du worker
//   1. dessiner l'interface
//   2. traiter l'événement clavier
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    sink: &DirectorySink,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // 0. RÉSULTATS : non bloquant, on vide le channel
        loop {
            match result_rx.try_recv() {
                Ok(AppResult::History { seq, result }) => app.complete_fetch(seq, result),
                Ok(AppResult::Forecast { seq, result }) => app.complete_forecast(seq, result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        worker_alive = false;
                    }
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, &command_tx, sink),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================

fn send_command(command_tx: &mpsc::Sender<AppCommand>, command: AppCommand) {
    if command_tx.send(command).is_err() {
        error!("Failed to send command: worker is gone");
    }
}

fn start_fetch(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    match app.begin_fetch(today()) {
        Some(ticket) => {
            info!(seq = ticket.seq, ticker = %ticket.request.ticker, "User requested fetch");
            send_command(
                command_tx,
                AppCommand::FetchHistory {
                    seq: ticket.seq,
                    request: ticket.request,
                },
            );
        }
        None => debug!("Fetch not started"),
    }
}

fn start_forecast(app: &mut App, command_tx: &mpsc::Sender<AppCommand>) {
    match app.begin_forecast() {
        Some(ticket) => {
            info!(seq = ticket.seq, days = ticket.days, "User requested forecast");
            send_command(
                command_tx,
                AppCommand::FetchForecast {
                    seq: ticket.seq,
                    history: ticket.history,
                    days: ticket.days,
                },
            );
        }
        None => debug!("Forecast not started"),
    }
}

/// Traite un événement et met à jour l'état de l'application
///
/// Sur le formulaire, les caractères vont dans le champ ayant le focus ;
/// les raccourcis (q, f, w, e, 1-3) ne sont actifs que sur les résultats.
fn handle_event(app: &mut App, event: Event, command_tx: &mpsc::Sender<AppCommand>, sink: &DirectorySink) {
    if matches!(event, Event::Tick) {
        return;
    }

    // Toute touche autre que 'q' annule la confirmation de quit
    if !events::is_quit_event(&event) || app.is_on_form() {
        app.cancel_quit();
    }

    if app.is_on_form() {
        handle_form_event(app, &event, command_tx);
    } else {
        handle_results_event(app, &event, command_tx, sink);
    }
}

fn handle_form_event(app: &mut App, event: &Event, command_tx: &mpsc::Sender<AppCommand>) {
    if events::is_enter_event(event) {
        start_fetch(app, command_tx);
    } else if events::is_escape_event(event) {
        app.show_results();
    } else if events::is_next_field_event(event) {
        app.next_field();
    } else if events::is_previous_field_event(event) {
        app.previous_field();
    } else if events::is_right_event(event) && app.focused_field == FormField::Interval {
        app.next_interval();
    } else if events::is_left_event(event) && app.focused_field == FormField::Interval {
        app.previous_interval();
    } else if events::is_backspace_event(event) {
        app.backspace();
    } else if let Some(c) = events::get_form_char(event) {
        app.append_char(c);
    }
}

fn handle_results_event(
    app: &mut App,
    event: &Event,
    command_tx: &mpsc::Sender<AppCommand>,
    sink: &DirectorySink,
) {
    if events::is_quit_event(event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
    } else if events::is_escape_event(event) {
        app.show_form();
    } else if events::is_forecast_event(event) {
        start_forecast(app, command_tx);
    } else if events::is_window_event(event) {
        app.next_window();
        info!(window = app.window.label(), "User changed chart window");
    } else if events::is_export_event(event) {
        app.export_current(sink, today());
    } else if let Some(tab) = events::tab_index_from_event(event).and_then(Tab::from_index) {
        app.select_tab(tab);
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Échec de la création du terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
