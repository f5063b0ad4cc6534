// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Écran Browse : résultats de recherche à gauche, watchlist à droite.
// Les popups (chargement, avertissement) sont dessinées par-dessus
// n'importe quel écran.
// ============================================================================

use std::collections::HashSet;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Pane, Screen};
use crate::ui::chart;

/// Dessine l'interface complète
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Browse | Screen::Search => render_browse(frame, app),
        Screen::Performance => chart::render_performance(frame, app, frame.size()),
    }

    // Popups modales par-dessus l'écran courant
    if app.is_loading_data() {
        render_loading_popup(frame, app);
    }
    if let Some(message) = &app.warning {
        render_warning_popup(frame, message);
    }
}

/// Dessine l'écran Browse
fn render_browse(frame: &mut Frame, app: &App) {
    let footer_height = if app.is_in_search_mode() { 4 } else { 3 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Min(0),                // Panneaux
            Constraint::Length(footer_height), // Footer
        ])
        .split(frame.size());

    render_header(frame, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_catalog_pane(frame, app, panes[0]);
    render_watchlist_pane(frame, app, panes[1]);

    if app.is_in_search_mode() {
        render_search_footer(frame, app, chunks[2]);
    } else {
        render_footer(frame, app, chunks[2]);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Cryptocurrency Tracker ")
        .title_alignment(Alignment::Center);

    let text = Line::from(Span::styled(
        "Search, select and track coins from CoinGecko",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Bordure jaune pour le panneau qui a le focus
fn pane_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

// ============================================================================
// Panneaux
// ============================================================================

fn render_catalog_pane(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Pane::Catalog;

    if !app.catalog_ready {
        let block = pane_block(" Search Crypto's To Track ".to_string(), focused);
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Gray),
        )))
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let title = format!(
        " Search Crypto's To Track ({}/{}) ",
        app.search_results.len(),
        app.catalog.len()
    );
    let block = pane_block(title, focused);

    let labels: Vec<(String, String)> = app
        .search_results
        .iter()
        .map(|coin| (coin.id.clone(), coin.label()))
        .collect();

    render_marked_list(
        frame,
        area,
        block,
        &labels,
        app.catalog_index,
        &app.catalog_marked,
        focused,
        "No match",
    );
}

fn render_watchlist_pane(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Pane::Watchlist;
    let title = format!(" Selected Crypto's ({}) ", app.watchlist.len());
    let block = pane_block(title, focused);

    let labels: Vec<(String, String)> = app
        .watchlist
        .entries()
        .iter()
        .map(|entry| (entry.id.clone(), entry.label()))
        .collect();

    render_marked_list(
        frame,
        area,
        block,
        &labels,
        app.watchlist_index,
        &app.watchlist_marked,
        focused,
        "No crypto tracked yet",
    );
}

/// Dessine une liste multi-sélection avec défilement
///
/// Seule la fenêtre visible est construite : le catalogue compte plusieurs
/// milliers de lignes.
#[allow(clippy::too_many_arguments)]
fn render_marked_list(
    frame: &mut Frame,
    area: Rect,
    block: Block<'static>,
    rows: &[(String, String)],
    selected: usize,
    marked: &HashSet<String>,
    focused: bool,
    empty_message: &str,
) {
    if rows.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(empty_message.to_string(), Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let height = area.height.saturating_sub(2) as usize;
    let (start, end) = visible_window(selected, rows.len(), height);

    let items: Vec<ListItem> = rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, (id, label))| {
            let index = start + offset;
            let is_marked = marked.contains(id);

            let mut style = if is_marked {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };

            if index == selected && focused {
                style = style.add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED);
            }

            let checkbox = if is_marked { "[x]" } else { "[ ]" };
            ListItem::new(format!(" {} {}", checkbox, label)).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Fenêtre [start, end) de lignes visibles contenant `selected`
pub fn visible_window(selected: usize, len: usize, height: usize) -> (usize, usize) {
    if height == 0 || len == 0 {
        return (0, 0);
    }

    let selected = selected.min(len - 1);
    let start = if selected >= height { selected + 1 - height } else { 0 };
    let end = (start + height).min(len);

    (start, end)
}

// ============================================================================
// Footer
// ============================================================================

fn key_span(key: &str, color: Color) -> Span<'_> {
    Span::styled(key, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let warning_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let blinking = Style::default()
        .fg(Color::Red)
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::SLOW_BLINK);

    let shortcuts = if app.is_awaiting_delete_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", warning_style),
            Span::styled("[d]", blinking),
            Span::styled(
                format!(
                    " à nouveau pour supprimer {} crypto(s) ou autre touche pour annuler ⚠",
                    app.watchlist_marked.len()
                ),
                warning_style,
            ),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", warning_style),
            Span::styled("[q]", blinking),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                warning_style,
            ),
        ])
    } else {
        Line::from(vec![
            key_span("[q]", Color::Yellow),
            Span::raw(" Quit  "),
            key_span("[Tab]", Color::Yellow),
            Span::raw(" Pane  "),
            key_span("[/]", Color::Yellow),
            Span::raw(" Search  "),
            key_span("[Space]", Color::Yellow),
            Span::raw(" Mark  "),
            key_span("[s]", Color::Green),
            Span::raw(" Select  "),
            key_span("[t]", Color::Green),
            Span::raw(" Track  "),
            key_span("[d]", Color::Red),
            Span::raw(" Delete"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Footer en mode recherche : ligne de saisie + aide
fn render_search_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let input_line = Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(app.search_term.as_str(), Style::default().fg(Color::White)),
        Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let help_line = Line::from(vec![
        key_span("[Enter/ESC]", Color::Green),
        Span::raw(" Done  "),
        key_span("[↑↓]", Color::Yellow),
        Span::raw(" Navigate"),
    ]);

    let paragraph = Paragraph::new(vec![input_line, help_line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Popups
// ============================================================================

/// Rectangle centré de `percent_x`% de large et `height` lignes de haut
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn render_loading_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(40, 5, frame.size());
    let message = app.loading_message.as_deref().unwrap_or("Loading...");

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Loading... ");

    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::White))),
    ])
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_warning_popup(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 7, frame.size());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" ⚠ Warning ");

    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Press any key", Style::default().fg(Color::Gray))),
    ])
    .block(block)
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_window() {
        assert_eq!(visible_window(0, 100, 10), (0, 10));
        assert_eq!(visible_window(9, 100, 10), (0, 10));
        assert_eq!(visible_window(10, 100, 10), (1, 11));
        assert_eq!(visible_window(99, 100, 10), (90, 100));
        assert_eq!(visible_window(3, 5, 10), (0, 5));
        assert_eq!(visible_window(0, 0, 10), (0, 0));
        assert_eq!(visible_window(4, 5, 0), (0, 0));
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(40, 5, area);
        assert_eq!(popup.height, 5);
        assert!(popup.x > 0 && popup.right() < area.right());
    }
}
