// ============================================================================
// Module : models
// ============================================================================
// Structures de données : catalogue, snapshots, watchlist, historique
// ============================================================================

pub mod coin;            // CoinSummary (catalogue) et CoinRecord (snapshot)
pub mod history;         // PricePoint et HistoricalSeries
pub mod watchlist_entry; // WatchlistEntry (ligne du CSV)

// Re-export des structures principales
pub use coin::{CoinRecord, CoinSummary, TABLE_HEADINGS};
pub use history::{HistoricalSeries, PricePoint};
pub use watchlist_entry::WatchlistEntry;
