// ============================================================================
// Module : export
// ============================================================================
// Export CSV des séries complètes (historique et forecast)
// ============================================================================

pub mod csv;  // Sérialisation texte (pure)
pub mod sink; // Écriture du fichier (collaborateur de plateforme)

pub use self::csv::{export_filename, forecast_columns, historical_columns, to_csv, Column, CsvField, ExportKind};
pub use sink::{DirectorySink, FileSink};
