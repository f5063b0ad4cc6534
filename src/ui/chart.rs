// ============================================================================
// Chart - Écran de performance
// ============================================================================
// Tableau des snapshots de marché + graphique ligne des prix sur la fenêtre
// d'historique, une série par coin suivi (x = date, y = prix USD).
// ============================================================================

use chrono::DateTime;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::models::{HistoricalSeries, TABLE_HEADINGS};

/// Couleurs des séries, réutilisées en boucle
const SERIES_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
    Color::White,
    Color::LightGreen,
];

/// Dessine l'écran de performance
pub fn render_performance(frame: &mut Frame, app: &App, area: Rect) {
    // Header + lignes du tableau (en-tête, bordures) + graphique
    let table_height = (app.snapshots.len() as u16 + 3).clamp(4, 14);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(table_height),
            Constraint::Min(0),
        ])
        .split(area);

    render_performance_header(frame, app, chunks[0]);
    render_overview_table(frame, app, chunks[1]);
    render_price_chart(frame, app, chunks[2]);
}

fn render_performance_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Crypto Performance ");

    // Coins suivis sans historique (toutes les tentatives ont échoué)
    let missing: Vec<&str> = app
        .watchlist
        .entries()
        .iter()
        .filter(|e| !app.history.contains_key(&e.id))
        .map(|e| e.id.as_str())
        .collect();

    let mut spans = vec![Span::raw(format!(
        "{}/{} coins loaded",
        app.history.len(),
        app.watchlist.len()
    ))];

    if !missing.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("No data: {}", missing.join(", ")),
            Style::default().fg(Color::Red),
        ));
    }

    spans.push(Span::raw("  "));
    spans.push(Span::styled(
        "[ESC]",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::raw(" Retour"));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tableau des snapshots
// ============================================================================

fn render_overview_table(frame: &mut Frame, app: &App, area: Rect) {
    if app.snapshots.is_empty() {
        render_no_data(frame, area, "No market data");
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Overview ");

    let header = Row::new(TABLE_HEADINGS.iter().map(|h| Cell::from(*h))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .snapshots
        .iter()
        .map(|record| {
            let color = if record.is_positive() { Color::Green } else { Color::Red };
            let cells = record.table_cells();
            Row::new(cells.into_iter().map(Cell::from)).style(Style::default().fg(color))
        })
        .collect();

    let widths = [
        Constraint::Percentage(16),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
        Constraint::Percentage(14),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

// ============================================================================
// Graphique des prix
// ============================================================================

fn render_price_chart(frame: &mut Frame, app: &App, area: Rect) {
    let series = app.performance_series();

    // Les points doivent vivre plus longtemps que les Datasets qui les empruntent
    let points: Vec<Vec<(f64, f64)>> = series.iter().map(|s| s.chart_points()).collect();

    let Some(bounds) = chart_bounds(&series) else {
        render_no_data(frame, area, "No price history to display");
        return;
    };

    let datasets: Vec<Dataset> = series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (s, data))| {
            Dataset::default()
                .name(series_label(s))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(data)
        })
        .collect();

    let x_axis = Axis::default()
        .title("Days")
        .style(Style::default().fg(Color::Gray))
        .bounds([bounds.x_min, bounds.x_max])
        .labels(
            [bounds.x_min, (bounds.x_min + bounds.x_max) / 2.0, bounds.x_max]
                .iter()
                .map(|&x| Span::raw(format_date(x)))
                .collect(),
        );

    let y_axis = Axis::default()
        .title("Price (USD)")
        .style(Style::default().fg(Color::Gray))
        .bounds([bounds.y_min, bounds.y_max])
        .labels(vec![
            Span::raw(format_price(bounds.y_min)),
            Span::raw(format_price((bounds.y_min + bounds.y_max) / 2.0)),
            Span::raw(format_price(bounds.y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " Crypto Performance Over the last {} Days ",
                    app.history_days
                )),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Bornes des axes du graphique
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Calcule les bornes communes à toutes les séries
///
/// Marge de 5% sur les prix, sans descendre sous 0. None si aucune série
/// n'a de point.
pub fn chart_bounds(series: &[&HistoricalSeries]) -> Option<ChartBounds> {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for s in series {
        let Some((first, last)) = s.time_bounds() else {
            continue;
        };
        x_min = x_min.min(first.timestamp() as f64);
        x_max = x_max.max(last.timestamp() as f64);
        y_min = y_min.min(s.min_price()?);
        y_max = y_max.max(s.max_price()?);
    }

    if x_min > x_max {
        return None;
    }

    // Série d'un seul point : on élargit pour que l'axe ne soit pas nul
    if x_min == x_max {
        x_max = x_min + 1.0;
    }

    let margin = if y_max > y_min { (y_max - y_min) * 0.05 } else { y_max.abs() * 0.05 + 1.0 };

    Some(ChartBounds {
        x_min,
        x_max,
        y_min: (y_min - margin).max(0.0),
        y_max: y_max + margin,
    })
}

/// Légende d'une série : id + variation sur la fenêtre
fn series_label(series: &HistoricalSeries) -> String {
    match series.change_percent() {
        Some(change) => format!("{} ({:+.2}%)", series.coin_id, change),
        None => series.coin_id.clone(),
    }
}

fn format_date(secs: f64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.format("%d/%m %Hh").to_string())
        .unwrap_or_default()
}

/// Prix lisible pour les petits coins comme pour BTC
fn format_price(price: f64) -> String {
    if price >= 100.0 {
        format!("${:.0}", price)
    } else if price >= 1.0 {
        format!("${:.2}", price)
    } else {
        format!("${:.6}", price)
    }
}

/// Affiche un message quand il n'y a rien à dessiner
fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" ⚠ ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use chrono::{TimeZone, Utc};

    fn series(id: &str, prices: &[(u32, f64)]) -> HistoricalSeries {
        let mut s = HistoricalSeries::new(id);
        for &(hour, price) in prices {
            let ts = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
            s.add_point(PricePoint::new(ts, price));
        }
        s
    }

    #[test]
    fn test_chart_bounds_multiple_series() {
        let btc = series("bitcoin", &[(0, 100.0), (2, 200.0)]);
        let eth = series("ethereum", &[(1, 50.0), (5, 150.0)]);

        let bounds = chart_bounds(&[&btc, &eth]).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap().timestamp() as f64;

        assert_eq!(bounds.x_min, start);
        assert_eq!(bounds.x_max, start + 5.0 * 3600.0);
        assert!((bounds.y_min - 42.5).abs() < 1e-9);
        assert!((bounds.y_max - 207.5).abs() < 1e-9);
    }

    #[test]
    fn test_chart_bounds_empty() {
        let empty = HistoricalSeries::new("bitcoin");
        assert_eq!(chart_bounds(&[]), None);
        assert_eq!(chart_bounds(&[&empty]), None);
    }

    #[test]
    fn test_chart_bounds_single_point() {
        let one = series("bitcoin", &[(0, 10.0)]);
        let bounds = chart_bounds(&[&one]).unwrap();
        assert!(bounds.x_max > bounds.x_min);
        assert!(bounds.y_max > bounds.y_min);
    }

    #[test]
    fn test_series_label_shows_change() {
        let up = series("bitcoin", &[(0, 100.0), (3, 110.0)]);
        assert_eq!(series_label(&up), "bitcoin (+10.00%)");

        let down = series("ethereum", &[(0, 200.0), (3, 150.0)]);
        assert_eq!(series_label(&down), "ethereum (-25.00%)");

        let empty = HistoricalSeries::new("dogecoin");
        assert_eq!(series_label(&empty), "dogecoin");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(67000.4), "$67000");
        assert_eq!(format_price(3.14159), "$3.14");
        assert_eq!(format_price(0.000123), "$0.000123");
    }
}
