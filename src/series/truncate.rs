// ============================================================================
// Table Truncator
// ============================================================================
// Aperçu borné (K premières lignes) d'une série, pour les tableaux.
// L'export CSV travaille toujours sur la série complète.
// ============================================================================

/// Nombre de lignes affichées dans l'aperçu historique
pub const HISTORICAL_PREVIEW_ROWS: usize = 4;

/// Nombre de lignes affichées dans l'aperçu du forecast
pub const FORECAST_PREVIEW_ROWS: usize = 5;

/// Retourne les `limit` premiers éléments, dans l'ordre d'entrée
///
/// CONCEPT RUST : Slice empruntée
/// - &series[..n] ne copie rien et ne modifie pas la série
/// - Lifetime implicite : l'aperçu vit aussi longtemps que `series`
pub fn preview<T>(series: &[T], limit: usize) -> &[T] {
    &series[..limit.min(series.len())]
}

// ============================================================================
// Tests unitaires
// ============================================================================
