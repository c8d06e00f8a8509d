// ============================================================================
// Enum : Interval
// ============================================================================
// Granularité des points historiques demandés à l'API (daily/weekly/monthly)
// ============================================================================

use serde::{Deserialize, Serialize};

/// Intervalle entre deux observations historiques
///
/// CONCEPT : Intervalle vs fenêtre
/// - Interval : granularité des lignes renvoyées par l'API (1d, 1wk, 1mo)
/// - TimeWindow : période affichée sur le graphique de forecast (30/60/120 jours)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    /// 1 jour (daily)
    Daily,
    /// 1 semaine (weekly)
    Weekly,
    /// 1 mois (monthly)
    Monthly,
}

impl Interval {
    /// Convertit l'intervalle au format attendu par `/api/stocks`
    ///
    /// CONCEPT RUST : &'static str
    /// - Retourne une string littérale (dans le binaire)
    /// - Pas d'allocation
    pub fn to_api_string(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }

    /// Retourne le label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            Interval::Daily => "Daily",
            Interval::Weekly => "Weekly",
            Interval::Monthly => "Monthly",
        }
    }

    /// Retourne l'intervalle suivant (cycle)
    pub fn next(&self) -> Interval {
        match self {
            Interval::Daily => Interval::Weekly,
            Interval::Weekly => Interval::Monthly,
            Interval::Monthly => Interval::Daily, // Boucle
        }
    }

    /// Retourne l'intervalle précédent (cycle)
    pub fn previous(&self) -> Interval {
        match self {
            Interval::Daily => Interval::Monthly, // Boucle
            Interval::Weekly => Interval::Daily,
            Interval::Monthly => Interval::Weekly,
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Daily
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_api_string() {
        assert_eq!(Interval::Daily.to_api_string(), "1d");
        assert_eq!(Interval::Weekly.to_api_string(), "1wk");
        assert_eq!(Interval::Monthly.to_api_string(), "1mo");
    }

    #[test]
    fn test_interval_cycle() {
        assert_eq!(Interval::Daily.next(), Interval::Weekly);
        assert_eq!(Interval::Monthly.next(), Interval::Daily); // Boucle
        assert_eq!(Interval::Daily.previous(), Interval::Monthly);
        for interval in [Interval::Daily, Interval::Weekly, Interval::Monthly] {
            assert_eq!(interval.next().previous(), interval);
        }
    }
}
