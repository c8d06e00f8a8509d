// ============================================================================
// Structures : ForecastRow / ForecastPoint
// ============================================================================
// ForecastRow : une ligne renvoyée par `/api/forecast` (ds, yhat, bornes...)
// ForecastPoint : la prédiction normalisée avec ses bornes de confiance
//
// Les champs de décomposition (trend, weekly, additive_terms, ...) ne sont
// pas interprétés : ils sont transportés tels quels.
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{wire, Dated};

/// Ligne de forecast brute, format wire de l'API
///
/// Une valeur illisible devient NaN (ou une date invalide) : la ligne est
/// ignorée et comptée par le normaliseur, le reste du forecast est gardé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(default, deserialize_with = "wire::lenient_text")]
    pub ds: String,

    #[serde(default = "wire::missing_price", deserialize_with = "wire::lenient_required_price")]
    pub yhat: f64,

    #[serde(default = "wire::missing_price", deserialize_with = "wire::lenient_required_price")]
    pub yhat_lower: f64,

    #[serde(default = "wire::missing_price", deserialize_with = "wire::lenient_required_price")]
    pub yhat_upper: f64,

    /// Tous les autres champs (trend, trend_lower, weekly, ...)
    ///
    /// CONCEPT RUST : #[serde(flatten)]
    /// - Collecte les clés non déclarées dans une Map
    /// - Permet un passage opaque sans lister chaque composante
    #[serde(flatten)]
    pub components: Map<String, Value>,
}

impl ForecastRow {
    /// Ligne qui n'a pas pu être décodée du tout (pas un objet JSON)
    pub fn unreadable(raw: String) -> Self {
        Self {
            ds: raw,
            yhat: f64::NAN,
            yhat_lower: f64::NAN,
            yhat_upper: f64::NAN,
            components: Map::new(),
        }
    }
}

/// Composantes de décomposition d'un point de forecast (opaques)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastComponents(Map<String, Value>);

impl ForecastComponents {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Valeur numérique d'une composante, si présente
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn trend(&self) -> Option<f64> {
        self.get("trend")
    }
}

/// Un point prédit avec ses bornes de confiance
///
/// `lower_bound <= predicted <= upper_bound` est attendu mais jamais vérifié :
/// les valeurs sont affichées et exportées telles quelles.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub components: ForecastComponents,
}

impl ForecastPoint {
    pub fn new(date: NaiveDate, predicted: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            date,
            predicted,
            lower_bound,
            upper_bound,
            components: ForecastComponents::default(),
        }
    }

    pub fn with_components(mut self, components: ForecastComponents) -> Self {
        self.components = components;
        self
    }
}

impl Dated for ForecastPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
