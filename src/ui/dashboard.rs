// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// Deux écrans :
// - Form : saisie du ticker, des dates, de l'intervalle et de l'horizon
// - Results : onglets Chart / Data / Forecast
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Layout : découpage de l'espace en zones
// 3. Tabs : sélection d'onglet
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, FormField, Screen, Tab};
use crate::series::TimeWindow;
use crate::ui::{chart, table};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - Le compilateur garantit l'exhaustivité (tous les écrans gérés)
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    match app.current_screen {
        Screen::Form => render_form(frame, app, chunks[1]),
        Screen::Results => render_results(frame, app, chunks[1]),
    }

    render_status(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

/// Crée le layout principal (header, content, status, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status / erreur
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

fn key_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" LazyForecast ")
        .title_alignment(Alignment::Center);

    let subtitle = match app.session.loaded_request() {
        Some(request) => format!(
            "{}  {} → {}  ({})",
            request.ticker,
            request.start.format("%Y-%m-%d"),
            request.end.format("%Y-%m-%d"),
            request.interval.label()
        ),
        None => "Stock data & forecast".to_string(),
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(
        subtitle,
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Form
// ============================================================================

/// Valeur affichée d'un champ du formulaire
fn field_value(app: &App, field: FormField) -> String {
    match field {
        FormField::Ticker => app.ticker_input.clone(),
        FormField::StartDate => app.start_input.clone(),
        FormField::EndDate => app.end_input.clone(),
        FormField::Interval => format!("◀ {} ▶", app.interval.label()),
        FormField::Horizon => app.horizon_input.clone(),
    }
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" 🔎 Request ");

    let mut lines = vec![Line::from("")];
    for field in FormField::all() {
        let focused = field == app.focused_field;
        let marker = if focused { "▶ " } else { "  " };
        let value_style = if focused {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        let mut spans = vec![
            Span::styled(marker, Style::default().fg(Color::Green)),
            Span::styled(format!("{:<15}", field.label()), Style::default().fg(Color::Cyan)),
            Span::styled(field_value(app, field), value_style),
        ];
        if focused && field != FormField::Interval {
            spans.push(Span::styled(
                "█",
                Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Dates : YYYY-MM-DD, au moins 6 mois d'écart",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Results
// ============================================================================

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|tab| Line::from(format!("{} {}", tab.index() + 1, tab.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.current_tab.index())
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    let ticker = app.session.ticker().unwrap_or("-");
    let content = chunks[1];

    match app.current_tab {
        Tab::Chart => chart::render_price_chart(frame, ticker, app.session.merged(), content),
        Tab::Data => table::render_historical_table(
            frame,
            app.session.historical_preview(),
            app.session.historical().len(),
            ticker,
            content,
        ),
        Tab::Forecast => render_forecast_tab(frame, app, ticker, content),
    }
}

fn render_forecast_tab(frame: &mut Frame, app: &App, ticker: &str, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Sélecteur de fenêtre
            Constraint::Min(0),    // Graphique
            Constraint::Length(9), // Aperçu du forecast
        ])
        .split(area);

    frame.render_widget(Paragraph::new(window_selector(app.window)), chunks[0]);
    chart::render_forecast_chart(frame, ticker, &app.chart_points(), app.window, chunks[1]);
    table::render_forecast_table(
        frame,
        app.session.forecast_preview(),
        app.session.forecast().len(),
        ticker,
        chunks[2],
    );
}

/// " Window: [30d] 60d 120d "
fn window_selector(selected: TimeWindow) -> Line<'static> {
    let mut spans = vec![Span::raw(" Window: ")];
    for window in TimeWindow::all() {
        if window == selected {
            spans.push(Span::styled(format!("[{}]", window.label()), key_style()));
        } else {
            spans.push(Span::styled(format!(" {} ", window.label()), Style::default().fg(Color::Gray)));
        }
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

// ============================================================================
// Status : erreur, message d'info ou état de la session
// ============================================================================

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match (app.session.error_message(), &app.status_message) {
        (Some(error), _) => (format!("⚠ {}", error), Color::Red),
        (None, Some(message)) => (message.clone(), Color::Green),
        (None, None) => {
            let mut text = app.session.state().label().to_string();
            text.push_str(&skipped_note(app.session.skipped_rows(), app.session.skipped_forecast_rows()));
            (text, Color::Gray)
        }
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)))
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

/// " (3 malformed rows skipped, 1 in forecast)" ; vide si rien n'a été ignoré
fn skipped_note(total: usize, in_forecast: usize) -> String {
    match (total, in_forecast) {
        (0, _) => String::new(),
        (total, 0) => format!(" ({} malformed rows skipped)", total),
        (total, in_forecast) => format!(" ({} malformed rows skipped, {} in forecast)", total, in_forecast),
    }
}

// ============================================================================
// Footer : raccourcis
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", key_style()),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                key_style(),
            ),
        ])
    } else if app.is_on_form() {
        Line::from(vec![
            Span::styled("[Tab]", key_style()),
            Span::raw(" Field  "),
            Span::styled("[←→]", key_style()),
            Span::raw(" Interval  "),
            Span::styled("[Enter]", key_style()),
            Span::raw(" Fetch  "),
            Span::styled("[Esc]", key_style()),
            Span::raw(" Results"),
        ])
    } else {
        let fetch_style = if app.session.is_forecasting() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        };

        Line::from(vec![
            Span::styled("[q]", key_style()),
            Span::raw(" Quit  "),
            Span::styled("[1-3]", key_style()),
            Span::raw(" Tab  "),
            Span::styled("[f]", fetch_style),
            Span::raw(" Forecast  "),
            Span::styled("[w]", key_style()),
            Span::raw(" Window  "),
            Span::styled("[e]", key_style()),
            Span::raw(" Export CSV  "),
            Span::styled("[Esc]", key_style()),
            Span::raw(" Form"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_selector_highlights_selection() {
        let line = window_selector(TimeWindow::Days60);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("[60d]"));
        assert!(text.contains(" 30d "));
    }

    #[test]
    fn test_skipped_note() {
        assert_eq!(skipped_note(0, 0), "");
        assert_eq!(skipped_note(2, 0), " (2 malformed rows skipped)");
        assert_eq!(skipped_note(3, 1), " (3 malformed rows skipped, 1 in forecast)");
    }
}
