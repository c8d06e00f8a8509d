// ============================================================================
// Window Filter
// ============================================================================
// Restreint une série aux points dont la date >= (fin de référence - N jours)
//
// - Pas de borne haute : les points après la date de fin (le forecast)
//   sont toujours conservés
// - Projection pure : la série d'origine n'est jamais modifiée, on peut
//   passer de 30 à 120 jours et revenir sans perte
// ============================================================================

use chrono::{Days, NaiveDate};

use crate::models::Dated;

/// Fenêtres proposées par le sélecteur du graphique de forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    Days30,
    Days60,
    Days120,
}

impl TimeWindow {
    pub fn days(&self) -> u32 {
        match self {
            TimeWindow::Days30 => 30,
            TimeWindow::Days60 => 60,
            TimeWindow::Days120 => 120,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::Days30 => "30d",
            TimeWindow::Days60 => "60d",
            TimeWindow::Days120 => "120d",
        }
    }

    pub fn all() -> [TimeWindow; 3] {
        [TimeWindow::Days30, TimeWindow::Days60, TimeWindow::Days120]
    }

    /// Fenêtre suivante (cycle)
    pub fn next(&self) -> TimeWindow {
        match self {
            TimeWindow::Days30 => TimeWindow::Days60,
            TimeWindow::Days60 => TimeWindow::Days120,
            TimeWindow::Days120 => TimeWindow::Days30,
        }
    }
}

/// Fenêtre de dates : cutoff = reference_end - span_days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub reference_end: NaiveDate,
    pub span_days: u32,
    pub cutoff: NaiveDate,
}

impl DateWindow {
    /// Crée une fenêtre de `span_days` jours se terminant à `reference_end`
    ///
    /// Avant le début du calendrier chrono, le cutoff sature à NaiveDate::MIN
    /// (tous les points sont alors conservés).
    pub fn new(reference_end: NaiveDate, span_days: u32) -> Self {
        let cutoff = reference_end
            .checked_sub_days(Days::new(u64::from(span_days)))
            .unwrap_or(NaiveDate::MIN);

        Self {
            reference_end,
            span_days,
            cutoff,
        }
    }

    pub fn from_window(reference_end: NaiveDate, window: TimeWindow) -> Self {
        Self::new(reference_end, window.days())
    }

    /// Un point est conservé ssi sa date >= cutoff
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.cutoff
    }
}

/// Filtre une série selon la fenêtre (ordre d'entrée conservé)
///
/// CONCEPT RUST : Générique avec trait bound
/// - T: Dated + Clone : n'importe quel point qui a une date
/// - Retourne un nouveau Vec, l'entrée est empruntée (&[T])
pub fn filter_window<T: Dated + Clone>(series: &[T], window: &DateWindow) -> Vec<T> {
    series
        .iter()
        .filter(|point| window.contains(point.date()))
        .cloned()
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================
