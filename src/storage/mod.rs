// ============================================================================
// Module : storage
// ============================================================================
// Watchlist persistée (CSV) et recherche dans le catalogue
// ============================================================================

pub mod search;    // Filtre du catalogue par préfixe
pub mod watchlist; // WatchlistStore : liste ordonnée + fichier CSV

pub use search::search;
pub use watchlist::WatchlistStore;
