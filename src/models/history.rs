// ============================================================================
// Structures : PricePoint et HistoricalSeries
// ============================================================================
// Série de prix d'un coin sur la fenêtre d'historique (7 jours par défaut).
// Recalculée à chaque "track", jamais persistée.
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Un point (date, prix) de l'historique
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Historique de prix d'un coin, trié par date croissante
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub coin_id: String,
    pub points: Vec<PricePoint>,
}

impl HistoricalSeries {
    pub fn new(coin_id: impl Into<String>) -> Self {
        Self {
            coin_id: coin_id.into(),
            points: Vec::new(),
        }
    }

    /// Ajoute un point en conservant l'ordre chronologique
    ///
    /// CoinGecko renvoie déjà les points triés : le cas courant est un push.
    pub fn add_point(&mut self, point: PricePoint) {
        match self.points.last() {
            Some(last) if last.timestamp > point.timestamp => {
                let pos = self.points.partition_point(|p| p.timestamp <= point.timestamp);
                self.points.insert(pos, point);
            }
            _ => self.points.push(point),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn min_price(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::min)
    }

    pub fn max_price(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::max)
    }

    /// Variation en pourcentage entre le premier et le dernier point
    pub fn change_percent(&self) -> Option<f64> {
        let first = self.first()?.price;
        let last = self.last()?.price;

        if first == 0.0 {
            return None;
        }

        Some((last - first) / first * 100.0)
    }

    /// Bornes temporelles (premier, dernier)
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }

    /// Points (x, y) pour le graphique : x = timestamp Unix en secondes
    pub fn chart_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.timestamp.timestamp() as f64, p.price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_series_stats() {
        let mut series = HistoricalSeries::new("bitcoin");
        assert!(series.is_empty());
        assert_eq!(series.change_percent(), None);

        series.add_point(PricePoint::new(at(0), 100.0));
        series.add_point(PricePoint::new(at(1), 90.0));
        series.add_point(PricePoint::new(at(2), 110.0));

        assert_eq!(series.len(), 3);
        assert_eq!(series.min_price(), Some(90.0));
        assert_eq!(series.max_price(), Some(110.0));
        assert!((series.change_percent().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(series.time_bounds(), Some((at(0), at(2))));
    }

    #[test]
    fn test_add_point_keeps_order() {
        let mut series = HistoricalSeries::new("ethereum");
        series.add_point(PricePoint::new(at(5), 3.0));
        series.add_point(PricePoint::new(at(1), 1.0));
        series.add_point(PricePoint::new(at(3), 2.0));

        let prices: Vec<f64> = series.points.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);

        let chart = series.chart_points();
        assert_eq!(chart[0].0, at(1).timestamp() as f64);
    }
}
