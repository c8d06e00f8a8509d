// ============================================================================
// Module : series
// ============================================================================
// Réconciliation des séries historique/forecast : normalisation, fusion,
// fenêtre glissante et aperçus. Tout est pur et synchrone.
// ============================================================================

pub mod merge;     // Series Merger
pub mod normalize; // Series Normalizer
pub mod truncate;  // Table Truncator
pub mod window;    // Window Filter

pub use merge::{merge_series, time_key, MergedPoint, MergedValue};
pub use normalize::{normalize_forecast, normalize_historical, parse_date, Normalized};
pub use truncate::{preview, FORECAST_PREVIEW_ROWS, HISTORICAL_PREVIEW_ROWS};
pub use window::{filter_window, DateWindow, TimeWindow};
