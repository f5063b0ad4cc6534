// ============================================================================
// Recherche dans le catalogue
// ============================================================================

use crate::models::CoinSummary;

/// Filtre le catalogue par préfixe du nom, sans tenir compte de la casse
///
/// Retourne une nouvelle liste (le catalogue n'est pas modifié), dans
/// l'ordre du catalogue. Un terme vide retourne tout le catalogue.
pub fn search(term: &str, catalog: &[CoinSummary]) -> Vec<CoinSummary> {
    if term.is_empty() {
        return catalog.to_vec();
    }

    let term = term.to_lowercase();

    catalog
        .iter()
        .filter(|coin| coin.name.to_lowercase().starts_with(&term))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CoinSummary> {
        vec![
            CoinSummary::new("bitcoin", "btc", "Bitcoin"),
            CoinSummary::new("ethereum", "eth", "Ethereum"),
            CoinSummary::new("ethereum-classic", "etc", "Ethereum Classic"),
            CoinSummary::new("wrapped-bitcoin", "wbtc", "Wrapped Bitcoin"),
        ]
    }

    #[test]
    fn test_search_prefix() {
        let results = search("eth", &catalog()[..2]);
        assert_eq!(results, vec![CoinSummary::new("ethereum", "eth", "Ethereum")]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let results = search("ETHER", &catalog());
        let ids: Vec<&str> = results.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ethereum", "ethereum-classic"]);
    }

    #[test]
    fn test_search_prefix_only() {
        // "Wrapped Bitcoin" contient "bitcoin" mais ne commence pas par
        let results = search("bit", &catalog());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "bitcoin");
    }

    #[test]
    fn test_search_empty_term_is_identity() {
        let catalog = catalog();
        assert_eq!(search("", &catalog), catalog);
    }

    #[test]
    fn test_search_results_all_match() {
        let catalog = catalog();
        for term in ["b", "E", "eth", "wr", "zzz", "Ethereum C"] {
            let lower = term.to_lowercase();
            for coin in search(term, &catalog) {
                assert!(coin.name.to_lowercase().starts_with(&lower));
            }
        }
    }
}
