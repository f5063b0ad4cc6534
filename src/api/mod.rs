// ============================================================================
// Module : api
// ============================================================================
// Client de l'API de marché CoinGecko : catalogue, snapshots, historique
// ============================================================================

pub mod coingecko; // Client API CoinGecko

// Re-export du client
pub use coingecko::CoinGeckoClient;
