// ============================================================================
// Configuration
// ============================================================================
// Valeurs par défaut de l'application : API CoinGecko, politique de retry,
// emplacement du fichier de watchlist.
//
// Pas de flags ni de variables d'environnement : main() utilise
// Config::default(). Les méthodes with_* d'ApiConfig servent aux tests
// (serveur mockito, timeout court, délai de retry nul).
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

/// URL de base de l'API publique CoinGecko
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Fichier CSV de la watchlist (chemin relatif au répertoire courant)
pub const DEFAULT_WATCHLIST_PATH: &str = "./selected_cryptos.csv";

/// Paramètres du client HTTP CoinGecko
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// URL de base, sans slash final
    pub base_url: String,

    /// Devise de cotation (ex: "usd")
    pub vs_currency: String,

    /// Timeout par requête
    ///
    /// 1 seconde par défaut : agressif sur un réseau lent, d'où le retry
    /// sur l'historique.
    pub timeout: Duration,

    /// Fenêtre de l'historique en jours
    pub history_days: u32,

    /// Nombre maximum de tentatives par coin pour l'historique
    pub max_attempts: u32,

    /// Délai fixe entre deux tentatives
    pub retry_delay: Duration,

    /// Taille de page pour /coins/markets
    pub per_page: u32,

    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            timeout: Duration::from_secs(1),
            history_days: 7,
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            per_page: 250,
            user_agent: concat!("cryptotracker/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Change l'URL de base (le slash final est retiré)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure la politique de retry de l'historique
    ///
    /// `max_attempts` est ramené à 1 au minimum : une tentative est toujours faite.
    pub fn with_retry(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }
}

/// Configuration complète de l'application
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    /// Fichier CSV de persistance de la watchlist
    pub watchlist_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            watchlist_path: PathBuf::from(DEFAULT_WATCHLIST_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.timeout, Duration::from_secs(1));
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.api.retry_delay, Duration::from_secs(2));
        assert_eq!(config.api.history_days, 7);
        assert_eq!(config.watchlist_path, PathBuf::from("./selected_cryptos.csv"));
    }

    #[test]
    fn test_builders() {
        let api = ApiConfig::default()
            .with_base_url("http://127.0.0.1:1234/")
            .with_retry(0, Duration::ZERO);

        assert_eq!(api.base_url, "http://127.0.0.1:1234");
        // Au moins une tentative
        assert_eq!(api.max_attempts, 1);
        assert_eq!(api.retry_delay, Duration::ZERO);
    }
}
