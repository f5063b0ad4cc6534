// ============================================================================
// Structure : WatchlistEntry
// ============================================================================
// Un coin suivi par l'utilisateur. C'est aussi une ligne du fichier CSV :
// l'ordre des champs donne l'en-tête "id,symbol,name".
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::coin::{format_label, CoinSummary};

/// Un coin de la watchlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Identifiant CoinGecko, unique dans la watchlist
    pub id: String,
    pub symbol: String,
    pub name: String,
}

impl WatchlistEntry {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Libellé affiché dans la liste : "ETH - Ethereum - ethereum"
    pub fn label(&self) -> String {
        format_label(&self.symbol, &self.name, &self.id)
    }
}

impl From<&CoinSummary> for WatchlistEntry {
    fn from(coin: &CoinSummary) -> Self {
        Self {
            id: coin.id.clone(),
            symbol: coin.symbol.clone(),
            name: coin.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_summary() {
        let coin = CoinSummary::new("ethereum", "eth", "Ethereum");
        let entry = WatchlistEntry::from(&coin);
        assert_eq!(entry, WatchlistEntry::new("ethereum", "eth", "Ethereum"));
        assert_eq!(entry.label(), "ETH - Ethereum - ethereum");
    }
}
