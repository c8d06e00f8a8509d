// ============================================================================
// Configuration : découverte de l'URL de l'API
// ============================================================================
// Lit `{ "apiUrl": "..." }` une seule fois par session, puis le garde en cache.
// En cas d'échec (injoignable, JSON invalide, champ vide) : URL par défaut.
//
// Source de la configuration :
// 1. Variable d'environnement LAZYFORECAST_CONFIG (URL http(s) ou chemin)
// 2. Sinon <config_dir>/lazyforecast/config.json
// ============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// URL utilisée quand la configuration est absente ou invalide
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Variable d'environnement qui désigne la source de configuration
pub const CONFIG_ENV_VAR: &str = "LAZYFORECAST_CONFIG";

/// Cache process-wide de l'URL résolue
///
/// CONCEPT RUST : tokio::sync::OnceCell
/// - Initialisé une seule fois, même si plusieurs tâches demandent en même temps
/// - Les appels suivants retournent la valeur en cache sans I/O
static API_URL: OnceCell<String> = OnceCell::const_new();

/// Contenu de config.json
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default)]
    pub api_url: Option<String>,
}

/// D'où lire la configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Remote(String),
    File(PathBuf),
}

impl ConfigSource {
    /// Interprète une valeur : URL http(s) ou chemin de fichier
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            ConfigSource::Remote(value.to_string())
        } else {
            ConfigSource::File(PathBuf::from(value))
        }
    }

    /// Source par défaut : variable d'environnement, sinon fichier utilisateur
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => Self::parse(&value),
            _ => ConfigSource::File(default_config_path()),
        }
    }
}

/// ~/.config/lazyforecast/config.json (Linux), équivalents macOS/Windows
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lazyforecast")
        .join("config.json")
}

/// Extrait l'URL d'un JSON de config ; None si absent/vide/invalide
pub fn parse_api_url(body: &str) -> Option<String> {
    let config: ApiConfig = serde_json::from_str(body).ok()?;
    config
        .api_url
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
}

/// Lit le contenu brut de la configuration
async fn read_source(source: &ConfigSource) -> Result<String> {
    match source {
        ConfigSource::Remote(url) => {
            let response = reqwest::get(url)
                .await
                .with_context(|| format!("Échec de la requête vers {}", url))?;
            response
                .error_for_status()
                .context("config.json a retourné une erreur HTTP")?
                .text()
                .await
                .context("Échec de la lecture du corps de config.json")
        }
        ConfigSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Échec de la lecture de {}", path.display())),
    }
}

/// Résout l'URL de l'API depuis une source, avec repli sur DEFAULT_API_URL
///
/// Jamais d'erreur : une configuration cassée ne doit pas empêcher de lancer l'app.
pub async fn resolve_api_url(source: &ConfigSource) -> String {
    debug!(?source, "Loading API configuration");

    match read_source(source).await {
        Ok(body) => match parse_api_url(&body) {
            Some(url) => {
                info!(api_url = %url, "API URL loaded from configuration");
                url
            }
            None => {
                warn!(?source, "Malformed configuration, using default API URL");
                DEFAULT_API_URL.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "Failed to load configuration, using default API URL");
            DEFAULT_API_URL.to_string()
        }
    }
}

/// URL de l'API pour la session (chargée une fois, puis en cache)
pub async fn api_url() -> &'static str {
    API_URL
        .get_or_init(|| async { resolve_api_url(&ConfigSource::from_env()).await })
        .await
        .as_str()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url() {
        assert_eq!(
            parse_api_url(r#"{"apiUrl":"https://api.example.com/"}"#),
            Some("https://api.example.com".to_string())
        );
        assert_eq!(parse_api_url(r#"{"apiUrl":""}"#), None);
        assert_eq!(parse_api_url(r#"{"other":1}"#), None);
        assert_eq!(parse_api_url("not json"), None);
    }

    #[test]
    fn test_config_source_parse() {
        assert_eq!(
            ConfigSource::parse("https://host/config.json"),
            ConfigSource::Remote("https://host/config.json".to_string())
        );
        assert_eq!(
            ConfigSource::parse("/etc/lazyforecast.json"),
            ConfigSource::File(PathBuf::from("/etc/lazyforecast.json"))
        );
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_default() {
        let source = ConfigSource::File(PathBuf::from("/definitely/not/here/config.json"));
        assert_eq!(resolve_api_url(&source).await, DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_file_source() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"apiUrl":"http://10.0.0.5:9000"}"#).unwrap();

        let url = resolve_api_url(&ConfigSource::File(path)).await;

        assert_eq!(url, "http://10.0.0.5:9000");
    }
}
