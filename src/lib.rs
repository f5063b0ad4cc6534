// ============================================================================
// cryptotracker - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Client CoinGecko
pub mod app;     // État de l'application
pub mod config;  // Valeurs par défaut (API, fichier de watchlist)
pub mod error;   // TrackerError
pub mod models;  // Structures de données
pub mod storage; // Watchlist CSV et recherche
pub mod ui;      // Interface utilisateur

pub use error::TrackerError;
