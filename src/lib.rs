// ============================================================================
// LazyForecast - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests d'intégration
// ============================================================================

pub mod api;     // Collaborateurs HTTP (stocks, forecast, health)
pub mod app;     // État de l'application
pub mod config;  // URL de l'API (chargée une fois)
pub mod error;   // Taxonomie des erreurs
pub mod export;  // Export CSV
pub mod models;  // Structures de données
pub mod series;  // Normalisation, fusion, fenêtre, aperçus
pub mod session; // Orchestration des requêtes
pub mod ui;      // Interface utilisateur
