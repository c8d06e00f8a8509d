// ============================================================================
// FileSink : persistance des exports
// ============================================================================
// "Produire le texte" (csv.rs, pur) et "l'écrire dans un fichier" (ici)
// sont séparés pour pouvoir tester l'export sans toucher au disque.
// ============================================================================

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

/// Collaborateur de plateforme : enregistre un fichier exporté
///
/// CONCEPT RUST : Trait comme point d'injection
/// - L'app utilise DirectorySink (dossier Téléchargements)
/// - Les tests peuvent fournir leur propre implémentation
pub trait FileSink {
    /// Écrit `contents` sous le nom `file_name`, retourne le chemin final
    fn persist(&self, file_name: &str, contents: &str) -> Result<PathBuf>;
}

/// Écrit les exports dans un répertoire donné
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Dossier Téléchargements de l'utilisateur, sinon le répertoire courant
    ///
    /// Les chemins :
    /// - Linux : ~/Downloads (XDG_DOWNLOAD_DIR)
    /// - macOS : ~/Downloads
    /// - Windows : C:\Users\<user>\Downloads
    pub fn downloads() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn persist(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Échec de la création du répertoire {}", self.dir.display())
        })?;

        let path = self.dir.join(file_name);
        fs::write(&path, contents)
            .with_context(|| format!("Échec de l'écriture de {}", path.display()))?;

        info!(path = %path.display(), bytes = contents.len(), "Export written");
        Ok(path)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("exports"));

        let path = sink.persist("AAPL_forecast_2024-01-01.csv", "Date\n2024-01-01").unwrap();

        assert_eq!(path.file_name().unwrap(), "AAPL_forecast_2024-01-01.csv");
        assert_eq!(fs::read_to_string(path).unwrap(), "Date\n2024-01-01");
    }
}
