// ============================================================================
// Module : error
// ============================================================================
// Taxonomie des erreurs du dashboard
//
// - FetchError : erreurs visibles par l'utilisateur (un seul message affiché)
// - MalformedDate : erreur locale au normaliseur, jamais affichée seule
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère Display et std::error::Error
// - #[error("...")] définit le message de chaque variant
// ============================================================================

use thiserror::Error;

/// Erreur d'une requête vers un collaborateur (historique ou forecast)
///
/// Aucune de ces erreurs n'est fatale : l'utilisateur corrige sa saisie
/// et relance la requête.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Saisie invalide, aucun appel réseau n'a été fait
    #[error("{0}")]
    Validation(String),

    /// Le collaborateur indique que la série n'existe pas
    #[error("Stock symbol \"{ticker}\" not found or no data available for the selected date range. Please verify the ticker symbol and try again.")]
    NotFound { ticker: String },

    /// Échec réseau/protocole sans rapport avec l'existence de la série
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    pub fn validation(message: impl Into<String>) -> Self {
        FetchError::Validation(message.into())
    }

    pub fn not_found(ticker: impl Into<String>) -> Self {
        FetchError::NotFound {
            ticker: ticker.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        FetchError::Transport(message.into())
    }

    /// Message affiché à l'utilisateur (remplace le message précédent)
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Une date qui ne peut pas être interprétée comme une date calendaire
///
/// La ligne correspondante est ignorée et comptée par le normaliseur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed date: {raw:?}")]
pub struct MalformedDate {
    pub raw: String,
}

// ============================================================================
// Tests unitaires
// ============================================================================
