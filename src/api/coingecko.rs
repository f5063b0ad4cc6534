// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Trois endpoints en lecture seule :
// - /coins/list                 : catalogue complet (id, symbol, name)
// - /coins/markets              : snapshots de marché pour un ensemble d'ids
// - /coins/{id}/market_chart    : historique de prix sur N jours
//
// Pas de cache : chaque appel repart sur le réseau.
// ============================================================================

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ApiConfig;
use crate::error::TrackerError;
use crate::models::{CoinRecord, CoinSummary, HistoricalSeries, PricePoint};

// ============================================================================
// Structures pour parser la réponse JSON de market_chart
// ============================================================================

/// Réponse de /coins/{id}/market_chart
///
/// Seul "prices" nous intéresse (market_caps et total_volumes sont ignorés).
/// Option pour distinguer "champ absent" d'une erreur de décodage.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Option<Vec<(f64, f64)>>,
}

// ============================================================================
// Client
// ============================================================================

/// Client HTTP pour l'API CoinGecko
///
/// Le client reqwest est créé une seule fois avec le timeout configuré,
/// puis réutilisé pour toutes les requêtes.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl CoinGeckoClient {
    /// Crée le client HTTP (timeout et User-Agent de la config)
    pub fn new(config: ApiConfig) -> Result<Self, TrackerError> {
        debug!(base_url = %config.base_url, timeout = ?config.timeout, "Creating CoinGecko client");

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Récupère le catalogue complet des coins
    ///
    /// Une seule requête GET. Timeout, statut hors 2xx ou JSON invalide
    /// remontent à l'appelant.
    #[instrument(skip(self))]
    pub async fn list_coins(&self) -> Result<Vec<CoinSummary>, TrackerError> {
        let url = format!("{}/coins/list", self.config.base_url);
        debug!(url = %url, "Fetching coin catalog");

        let response = self.http.get(&url).send().await?;
        let response = check_status(response, &url)?;

        let coins: Vec<CoinSummary> = response.json().await?;

        info!(coins = coins.len(), "Coin catalog fetched");
        Ok(coins)
    }

    /// Récupère les snapshots de marché pour les ids demandés
    ///
    /// L'ordre est celui du service (market cap décroissante). Un ensemble
    /// d'ids vide renvoie une liste vide sans requête : sans filtre "ids",
    /// CoinGecko renverrait le top 250.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn fetch_snapshot(&self, ids: &[String]) -> Result<Vec<CoinRecord>, TrackerError> {
        if ids.is_empty() {
            debug!("No ids requested, skipping snapshot request");
            return Ok(Vec::new());
        }

        let url = format!("{}/coins/markets", self.config.base_url);
        let joined = ids.join(",");
        let per_page = self.config.per_page.to_string();

        debug!(url = %url, ids = %joined, "Fetching market snapshot");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("vs_currency", self.config.vs_currency.as_str()),
                ("ids", joined.as_str()),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
            ])
            .send()
            .await?;
        let response = check_status(response, &url)?;

        let records: Vec<CoinRecord> = response.json().await?;

        info!(records = records.len(), "Market snapshot fetched");
        Ok(records)
    }

    /// Récupère l'historique de prix de chaque coin
    ///
    /// Pour chaque id : jusqu'à `max_attempts` tentatives, avec un délai fixe
    /// `retry_delay` entre deux tentatives. Toute erreur (timeout, statut,
    /// JSON, "prices" absent) consomme une tentative. Un id qui épuise ses
    /// tentatives est absent du résultat : l'échec d'un coin n'interrompt
    /// jamais les autres.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn fetch_history(&self, ids: &[String], days: u32) -> BTreeMap<String, HistoricalSeries> {
        let mut all_data = BTreeMap::new();

        for coin_id in ids {
            match self.fetch_series_with_retry(coin_id, days).await {
                Some(series) => {
                    all_data.insert(coin_id.clone(), series);
                }
                None => {
                    error!(coin = %coin_id, attempts = self.config.max_attempts, "Giving up on price history");
                }
            }
        }

        info!(fetched = all_data.len(), requested = ids.len(), "Price history fetched");
        all_data
    }

    /// Tentatives successives pour un seul coin
    ///
    /// CONCEPT RUST : Boucle bornée plutôt que récursion
    /// - `for attempt in 1..=max_attempts` : le nombre d'essais est fixé d'avance
    /// - `return Some(...)` sort dès le premier succès
    /// - Après la boucle, toutes les tentatives ont échoué : None
    async fn fetch_series_with_retry(&self, coin_id: &str, days: u32) -> Option<HistoricalSeries> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.fetch_series(coin_id, days).await {
                Ok(series) => {
                    debug!(coin = %coin_id, attempt, points = series.len(), "Price history received");
                    return Some(series);
                }
                Err(e) => {
                    warn!(coin = %coin_id, attempt, max_attempts, error = %e, "Failed to fetch price history");

                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        None
    }

    /// Une tentative unique sur /coins/{id}/market_chart
    async fn fetch_series(&self, coin_id: &str, days: u32) -> Result<HistoricalSeries, TrackerError> {
        let url = format!("{}/coins/{}/market_chart", self.config.base_url, coin_id);
        let days = days.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("vs_currency", self.config.vs_currency.as_str()),
                ("days", days.as_str()),
            ])
            .send()
            .await?;
        let response = check_status(response, &url)?;

        let chart: MarketChartResponse = response.json().await?;
        parse_market_chart(coin_id, chart)
    }
}

/// Vérifie que la réponse est un succès HTTP (200-299)
fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, TrackerError> {
    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        return Err(TrackerError::Status {
            status,
            url: url.to_string(),
        });
    }

    Ok(response)
}

/// Convertit la réponse market_chart en HistoricalSeries
fn parse_market_chart(coin_id: &str, chart: MarketChartResponse) -> Result<HistoricalSeries, TrackerError> {
    let rows = chart.prices.ok_or_else(|| TrackerError::MissingPrices {
        coin_id: coin_id.to_string(),
    })?;

    let mut series = HistoricalSeries::new(coin_id);

    for (timestamp_ms, price) in rows {
        let timestamp = millis_to_datetime(timestamp_ms as i64)?;
        series.add_point(PricePoint::new(timestamp, price));
    }

    Ok(series)
}

/// Millisecondes depuis l'epoch Unix (UTC) -> DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> Result<DateTime<chrono::Utc>, TrackerError> {
    let secs = millis.div_euclid(1000);
    let nanos = (millis.rem_euclid(1000) * 1_000_000) as u32;

    DateTime::from_timestamp(secs, nanos).ok_or(TrackerError::InvalidTimestamp { millis })
}

// ============================================================================
// Tests unitaires
// ============================================================================
// CONCEPT RUST : #[tokio::test]
// - Chaque test async reçoit son propre runtime tokio
// - mockito démarre un vrai serveur HTTP local par test
// - .expect(n) + assert_async() vérifient le nombre exact de requêtes
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    use super::*;

    /// Client pointé sur le serveur mockito, sans délai de retry
    async fn create_server_and_client() -> (ServerGuard, CoinGeckoClient) {
        let server = Server::new_async().await;
        let config = ApiConfig::default()
            .with_base_url(server.url())
            .with_timeout(Duration::from_secs(5))
            .with_retry(3, Duration::ZERO);
        let client = CoinGeckoClient::new(config).unwrap();
        (server, client)
    }

    fn chart_body(base_ms: i64) -> String {
        json!({
            "prices": [[base_ms, 100.0], [base_ms + 3_600_000, 101.5]],
            "market_caps": [],
            "total_volumes": []
        })
        .to_string()
    }

    #[test]
    fn test_millis_to_datetime() {
        let dt = millis_to_datetime(1_709_251_200_500).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::milliseconds(500));

        assert!(millis_to_datetime(i64::MAX).is_err());
    }

    #[test]
    fn test_parse_missing_prices() {
        let chart = MarketChartResponse { prices: None };
        let err = parse_market_chart("bitcoin", chart).unwrap_err();
        assert!(matches!(err, TrackerError::MissingPrices { .. }));
    }

    #[tokio::test]
    async fn test_list_coins() {
        let (mut server, client) = create_server_and_client().await;

        let mock = server
            .mock("GET", "/coins/list")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
                    {"id": "ethereum", "symbol": "eth", "name": "Ethereum"}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let coins = client.list_coins().await.unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[1], CoinSummary::new("ethereum", "eth", "Ethereum"));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_coins_error_status() {
        let (mut server, client) = create_server_and_client().await;

        let _mock = server
            .mock("GET", "/coins/list")
            .with_status(429)
            .create_async()
            .await;

        let err = client.list_coins().await.unwrap_err();
        assert!(err.is_network());
        assert!(matches!(err, TrackerError::Status { status, .. } if status.as_u16() == 429));
    }

    #[tokio::test]
    async fn test_list_coins_malformed_json() {
        let (mut server, client) = create_server_and_client().await;

        let _mock = server
            .mock("GET", "/coins/list")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client.list_coins().await.unwrap_err();
        assert!(matches!(err, TrackerError::Http(_)));
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let (mut server, client) = create_server_and_client().await;

        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("vs_currency".into(), "usd".into()),
                Matcher::UrlEncoded("ids".into(), "bitcoin,ethereum".into()),
                Matcher::UrlEncoded("order".into(), "market_cap_desc".into()),
                Matcher::UrlEncoded("per_page".into(), "250".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {
                        "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
                        "current_price": 67000.0, "high_24h": 68000.0, "low_24h": 66000.0,
                        "price_change_24h": 120.0, "ath": 73738.0, "atl": 67.81
                    },
                    {
                        "id": "ethereum", "symbol": "eth", "name": "Ethereum",
                        "current_price": 3500.0, "high_24h": null, "low_24h": null,
                        "price_change_24h": -12.0, "ath": 4878.0, "atl": 0.43
                    }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
        let records = client.fetch_snapshot(&ids).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "bitcoin");
        assert_eq!(records[1].high_24h, None);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_snapshot_empty_ids_makes_no_request() {
        let (mut server, client) = create_server_and_client().await;

        let mock = server
            .mock("GET", "/coins/markets")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let records = client.fetch_snapshot(&[]).await.unwrap();
        assert!(records.is_empty());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_history_partial_result() {
        let (mut server, client) = create_server_and_client().await;
        let base_ms = 1_709_251_200_000;

        let bitcoin = server
            .mock("GET", "/coins/bitcoin/market_chart")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("vs_currency".into(), "usd".into()),
                Matcher::UrlEncoded("days".into(), "7".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chart_body(base_ms))
            .create_async()
            .await;

        // Id invalide : 404 à chaque tentative
        let invalid = server
            .mock("GET", "/coins/doge123/market_chart")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(json!({"error": "coin not found"}).to_string())
            .expect(3)
            .create_async()
            .await;

        let ethereum = server
            .mock("GET", "/coins/ethereum/market_chart")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chart_body(base_ms))
            .create_async()
            .await;

        let ids = vec![
            "bitcoin".to_string(),
            "doge123".to_string(),
            "ethereum".to_string(),
        ];
        let history = client.fetch_history(&ids, 7).await;

        assert_eq!(history.len(), 2);
        assert!(!history.contains_key("doge123"));

        let series = &history["bitcoin"];
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(series.last().unwrap().price, 101.5);
        assert_eq!(history["ethereum"].coin_id, "ethereum");

        bitcoin.assert_async().await;
        invalid.assert_async().await;
        ethereum.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_history_retries_missing_prices() {
        let (mut server, client) = create_server_and_client().await;

        let mock = server
            .mock("GET", "/coins/bitcoin/market_chart")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"status": {"error_code": 429}}).to_string())
            .expect(3)
            .create_async()
            .await;

        let history = client.fetch_history(&["bitcoin".to_string()], 7).await;
        assert!(history.is_empty());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_history_timeout_consumes_attempts() {
        // Serveur qui accepte les connexions sans jamais répondre
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&connections);
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                open.push(socket);
            }
        });

        let config = ApiConfig::default()
            .with_base_url(format!("http://{}", addr))
            .with_timeout(Duration::from_millis(200))
            .with_retry(3, Duration::ZERO);
        let client = CoinGeckoClient::new(config).unwrap();

        let history = client.fetch_history(&["slowcoin".to_string()], 7).await;

        assert!(history.is_empty());
        assert_eq!(connections.load(Ordering::SeqCst), 3);

        server.abort();
    }
}
