// ============================================================================
// Structures : CoinSummary et CoinRecord
// ============================================================================
// CoinSummary : une ligne du catalogue (/coins/list)
// CoinRecord  : un snapshot de marché (/coins/markets)
//
// Les champs numériques du snapshot sont des Option<f64> : CoinGecko
// renvoie null pour les coins sans données de marché.
// ============================================================================

use serde::{Deserialize, Serialize};

/// Une entrée du catalogue CoinGecko
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinSummary {
    /// Identifiant stable du catalogue (ex: "bitcoin")
    pub id: String,

    /// Symbole (ex: "btc")
    pub symbol: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,
}

impl CoinSummary {
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Libellé affiché dans les listes : "BTC - Bitcoin - bitcoin"
    pub fn label(&self) -> String {
        format_label(&self.symbol, &self.name, &self.id)
    }
}

/// Formate une ligne de liste "SYMBOL - Name - id"
pub(crate) fn format_label(symbol: &str, name: &str, id: &str) -> String {
    format!("{} - {} - {}", symbol.to_uppercase(), name, id)
}

/// Snapshot de marché d'un coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,

    #[serde(default)]
    pub current_price: Option<f64>,

    #[serde(default)]
    pub high_24h: Option<f64>,

    #[serde(default)]
    pub low_24h: Option<f64>,

    #[serde(default)]
    pub price_change_24h: Option<f64>,

    /// All Time High
    #[serde(default)]
    pub ath: Option<f64>,

    /// All Time Low
    #[serde(default)]
    pub atl: Option<f64>,
}

/// En-têtes du tableau de performance, dans l'ordre de `CoinRecord::table_cells`
pub const TABLE_HEADINGS: [&str; 7] = [
    "Coin",
    "Current Price",
    "High 24H",
    "Low 24H",
    "Price Change 24H",
    "All Time High",
    "All Time Low",
];

impl CoinRecord {
    /// Cellules du tableau de performance
    ///
    /// Les valeurs numériques sont préfixées par "$", les valeurs absentes
    /// affichées "N/A".
    pub fn table_cells(&self) -> [String; 7] {
        [
            self.name.clone(),
            format_usd(self.current_price),
            format_usd(self.high_24h),
            format_usd(self.low_24h),
            format_usd(self.price_change_24h),
            format_usd(self.ath),
            format_usd(self.atl),
        ]
    }

    /// Vrai si le prix a monté sur 24h
    pub fn is_positive(&self) -> bool {
        self.price_change_24h.map(|c| c >= 0.0).unwrap_or(false)
    }
}

fn format_usd(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${}", v),
        None => "N/A".to_string(),
    }
}
