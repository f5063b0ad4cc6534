// ============================================================================
// Structure : App
// ============================================================================
// État complet de l'application TUI.
//
// L'état appartient au thread de l'interface : il est passé explicitement
// au renderer (&App) et au gestionnaire d'événements (&mut App). Le worker
// thread ne le touche jamais, il renvoie des résultats par channel que la
// boucle principale applique via apply_catalog() / apply_tracking().
// ============================================================================

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::TrackerError;
use crate::models::{CoinRecord, CoinSummary, HistoricalSeries, WatchlistEntry};
use crate::storage::{search, WatchlistStore};

// ============================================================================
// Enums : Screen et Pane
// ============================================================================
// CONCEPT RUST : Enums Copy pour une machine à états
// - #[derive(Clone, Copy)] : un Screen se copie comme un entier
// - PartialEq permet `app.focus == Pane::Watchlist`
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : catalogue filtré à gauche, watchlist à droite
    Browse,

    /// Saisie du terme de recherche (filtrage à chaque touche)
    Search,

    /// Tableau des snapshots + graphique 7 jours
    Performance,
}

/// Panneau qui a le focus sur l'écran Browse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Catalog,
    Watchlist,
}

/// Message de la popup de chargement initial
pub const CATALOG_LOADING_MESSAGE: &str = "Loading Cryptocurrency Data...";

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    pub current_screen: Screen,

    pub focus: Pane,

    /// Catalogue complet (vide tant que le worker n'a pas répondu)
    pub catalog: Vec<CoinSummary>,

    /// Vrai dès que le résultat du chargement du catalogue a été appliqué
    pub catalog_ready: bool,

    pub search_term: String,

    /// Vue filtrée du catalogue (résultat de `search`)
    pub search_results: Vec<CoinSummary>,

    /// Ligne en surbrillance dans les résultats de recherche
    pub catalog_index: usize,

    /// Ids marqués (Espace) dans le catalogue
    pub catalog_marked: HashSet<String>,

    /// Watchlist persistée
    pub watchlist: WatchlistStore,

    pub watchlist_index: usize,

    /// Ids marqués (Espace) dans la watchlist
    pub watchlist_marked: HashSet<String>,

    /// Historique du dernier "track", par id
    pub history: BTreeMap<String, HistoricalSeries>,

    /// Snapshots de marché du dernier "track"
    pub snapshots: Vec<CoinRecord>,

    /// Fenêtre de l'historique en jours (titre du graphique)
    pub history_days: u32,

    /// Two-step quit : première pression de 'q' = confirmation demandée
    pub confirm_quit: bool,

    /// Two-step delete : première pression de 'd' = confirmation demandée
    pub confirm_delete: bool,

    pub is_loading: bool,

    pub loading_message: Option<String>,

    /// Avertissement modal (sélection vide, écriture échouée...)
    /// Fermé par n'importe quelle touche.
    pub warning: Option<String>,
}

impl App {
    /// Crée l'état initial avec une watchlist déjà chargée
    pub fn new(watchlist: WatchlistStore) -> Self {
        Self {
            running: true,
            current_screen: Screen::Browse,
            focus: Pane::Catalog,
            catalog: Vec::new(),
            catalog_ready: false,
            search_term: String::new(),
            search_results: Vec::new(),
            catalog_index: 0,
            catalog_marked: HashSet::new(),
            watchlist,
            watchlist_index: 0,
            watchlist_marked: HashSet::new(),
            history: BTreeMap::new(),
            snapshots: Vec::new(),
            history_days: ApiConfig::default().history_days,
            confirm_quit: false,
            confirm_delete: false,
            is_loading: false,
            loading_message: None,
            warning: None,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ========================================================================
    // Confirmations (quit / delete)
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    // ========================================================================
    // Chargement et avertissements
    // ========================================================================

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    pub fn show_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "Showing warning to user");
        self.warning = Some(message);
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }

    // ========================================================================
    // Catalogue et recherche
    // ========================================================================

    /// Applique le résultat du chargement du catalogue (handoff du worker)
    ///
    /// La popup de chargement est fermée dans tous les cas.
    pub fn apply_catalog(&mut self, result: Result<Vec<CoinSummary>, TrackerError>) {
        self.stop_loading();
        self.catalog_ready = true;

        match result {
            Ok(catalog) => {
                info!(coins = catalog.len(), "Catalog applied");
                self.catalog = catalog;
            }
            Err(e) => {
                self.show_warning(format!("Failed to load the cryptocurrency list: {}", e));
            }
        }

        self.update_search_results();
    }

    /// Recalcule la vue filtrée à partir du terme courant
    pub fn update_search_results(&mut self) {
        self.search_results = search(&self.search_term, &self.catalog);
        self.catalog_index = clamp_index(self.catalog_index, self.search_results.len());
        debug!(term = %self.search_term, results = self.search_results.len(), "Search results updated");
    }

    pub fn start_search(&mut self) {
        self.current_screen = Screen::Search;
        self.focus = Pane::Catalog;
    }

    pub fn finish_search(&mut self) {
        self.current_screen = Screen::Browse;
    }

    pub fn is_in_search_mode(&self) -> bool {
        self.current_screen == Screen::Search
    }

    pub fn append_search_char(&mut self, c: char) {
        self.search_term.push(c);
        self.refilter();
    }

    pub fn backspace_search(&mut self) {
        if self.search_term.pop().is_some() {
            self.refilter();
        }
    }

    /// Nouveau terme : les marques du catalogue sont effacées, un coin
    /// masqué par le filtre ne peut pas rester sélectionné
    fn refilter(&mut self) {
        if !self.catalog_marked.is_empty() {
            debug!(cleared = self.catalog_marked.len(), "Search term changed, clearing catalog marks");
            self.catalog_marked.clear();
        }
        self.catalog_index = 0;
        self.update_search_results();
    }

    /// Coin en surbrillance dans les résultats
    pub fn highlighted_coin(&self) -> Option<&CoinSummary> {
        self.search_results.get(self.catalog_index)
    }

    // ========================================================================
    // Navigation et marquage
    // ========================================================================

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Catalog => Pane::Watchlist,
            Pane::Watchlist => Pane::Catalog,
        };
        self.confirm_delete = false;
    }

    pub fn navigate_up(&mut self) {
        match self.focus {
            Pane::Catalog => self.catalog_index = self.catalog_index.saturating_sub(1),
            Pane::Watchlist => self.watchlist_index = self.watchlist_index.saturating_sub(1),
        }
    }

    pub fn navigate_down(&mut self) {
        match self.focus {
            Pane::Catalog => {
                let max_index = self.search_results.len().saturating_sub(1);
                self.catalog_index = (self.catalog_index + 1).min(max_index);
            }
            Pane::Watchlist => {
                let max_index = self.watchlist.len().saturating_sub(1);
                self.watchlist_index = (self.watchlist_index + 1).min(max_index);
            }
        }
    }

    /// Marque ou démarque la ligne en surbrillance du panneau actif
    pub fn toggle_mark(&mut self) {
        let (id, marked) = match self.focus {
            Pane::Catalog => (
                self.highlighted_coin().map(|c| c.id.clone()),
                &mut self.catalog_marked,
            ),
            Pane::Watchlist => (
                self.watchlist.entries().get(self.watchlist_index).map(|e| e.id.clone()),
                &mut self.watchlist_marked,
            ),
        };

        if let Some(id) = id {
            if !marked.remove(&id) {
                marked.insert(id);
            }
        }
    }

    // ========================================================================
    // Watchlist
    // ========================================================================

    /// Ajoute les coins marqués du catalogue à la watchlist
    ///
    /// Les entrées sont construites à partir du catalogue courant, dans
    /// l'ordre du catalogue. Les marques sont effacées après un ajout réussi.
    pub fn select_marked(&mut self) -> Result<usize, TrackerError> {
        if self.catalog_marked.is_empty() {
            return Err(TrackerError::NoSelection("Please select at least one crypto"));
        }

        let entries: Vec<WatchlistEntry> = self
            .catalog
            .iter()
            .filter(|coin| self.catalog_marked.contains(&coin.id))
            .map(WatchlistEntry::from)
            .collect();

        let added = self.watchlist.add(entries)?;
        self.catalog_marked.clear();
        Ok(added)
    }

    /// Supprime de la watchlist les entrées marquées
    pub fn delete_marked(&mut self) -> Result<usize, TrackerError> {
        self.confirm_delete = false;

        if self.watchlist_marked.is_empty() {
            return Err(TrackerError::NoSelection("Please select at least one crypto to delete"));
        }

        let removed = self.watchlist.remove(&self.watchlist_marked)?;
        self.watchlist_marked.clear();
        self.watchlist_index = clamp_index(self.watchlist_index, self.watchlist.len());
        Ok(removed)
    }

    /// Touche 'd' : suppression en deux temps depuis le panneau watchlist
    ///
    /// - Autre panneau : sans effet
    /// - Aucune marque : erreur NoSelection
    /// - Première pression : demande de confirmation, `Ok(None)`
    /// - Seconde pression : suppression, `Ok(Some(n))`
    pub fn press_delete(&mut self) -> Result<Option<usize>, TrackerError> {
        if self.focus != Pane::Watchlist {
            self.confirm_delete = false;
            return Ok(None);
        }

        if self.watchlist_marked.is_empty() || self.confirm_delete {
            return self.delete_marked().map(Some);
        }

        self.request_delete();
        Ok(None)
    }

    /// Ids à suivre pour le graphique (toute la watchlist)
    pub fn tracked_ids(&self) -> Result<Vec<String>, TrackerError> {
        if self.watchlist.is_empty() {
            return Err(TrackerError::NoSelection("Please select at least one crypto to track"));
        }
        Ok(self.watchlist.ids())
    }

    // ========================================================================
    // Écran de performance
    // ========================================================================

    /// Applique le résultat d'un "track" et affiche l'écran de performance
    pub fn apply_tracking(
        &mut self,
        history: BTreeMap<String, HistoricalSeries>,
        snapshots: Result<Vec<CoinRecord>, TrackerError>,
    ) {
        self.stop_loading();
        self.history = history;

        match snapshots {
            Ok(records) => self.snapshots = records,
            Err(e) => {
                self.snapshots.clear();
                self.show_warning(format!("Failed to load market overview: {}", e));
            }
        }

        info!(series = self.history.len(), snapshots = self.snapshots.len(), "Tracking data applied");
        self.current_screen = Screen::Performance;
    }

    /// Séries à tracer : ordre de la watchlist, puis les éventuels restes
    pub fn performance_series(&self) -> Vec<&HistoricalSeries> {
        let mut series: Vec<&HistoricalSeries> = self
            .watchlist
            .entries()
            .iter()
            .filter_map(|e| self.history.get(&e.id))
            .collect();

        series.extend(
            self.history
                .values()
                .filter(|s| !self.watchlist.contains(&s.coin_id)),
        );

        series
    }

    pub fn show_browse(&mut self) {
        self.current_screen = Screen::Browse;
    }

    pub fn is_on_browse(&self) -> bool {
        self.current_screen == Screen::Browse
    }

    pub fn is_on_performance(&self) -> bool {
        self.current_screen == Screen::Performance
    }
}

/// Ramène un index dans [0, len - 1] (0 si la liste est vide)
fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

// ============================================================================
// Tests unitaires
// ============================================================================
