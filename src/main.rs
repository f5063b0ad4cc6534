// ============================================================================
// cryptotracker - Point d'entrée
// ============================================================================
// TUI de suivi de cryptomonnaies :
// - recherche dans le catalogue CoinGecko
// - sélection des coins suivis, persistés dans ./selected_cryptos.csv
// - tableau des prix + graphique 7 jours des coins suivis
//
// Architecture :
// - Le thread principal possède l'état (App), dessine et gère le clavier
// - Un worker thread possède le runtime tokio et le client HTTP ; il reçoit
//   des WorkerCommand et renvoie des WorkerResult par channels mpsc
// ============================================================================

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use cryptotracker::api::CoinGeckoClient;
use cryptotracker::app::{App, CATALOG_LOADING_MESSAGE};
use cryptotracker::config::{ApiConfig, Config};
use cryptotracker::models::{CoinRecord, CoinSummary, HistoricalSeries};
use cryptotracker::storage::WatchlistStore;
use cryptotracker::ui::{events::EventHandler, render};
use cryptotracker::TrackerError;

// ============================================================================
// Commandes et résultats du worker thread
// ============================================================================
// CONCEPT RUST : Handoff par message plutôt qu'état partagé
// - App appartient au thread principal : pas d'Arc<Mutex<App>>
// - Le worker ne fait que produire des valeurs (Result, BTreeMap...)
// - Ces valeurs sont *déplacées* dans le channel : le thread principal en
//   devient propriétaire à la réception, aucune copie ni verrou
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum WorkerCommand {
    /// Charger le catalogue complet (envoyé une fois au démarrage)
    LoadCatalog,

    /// Charger l'historique puis les snapshots des coins suivis
    Track { ids: Vec<String> },
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum WorkerResult {
    /// Handoff du catalogue : rien ne lit le catalogue avant ce message
    CatalogLoaded(Result<Vec<CoinSummary>, TrackerError>),

    Tracked {
        history: BTreeMap<String, HistoricalSeries>,
        snapshots: Result<Vec<CoinRecord>, TrackerError>,
    },

    /// Le worker n'a pas pu démarrer (runtime ou client HTTP)
    WorkerFailed(String),
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne sont pas visibles une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/cryptotracker/logs
/// - macOS : ~/Library/Application Support/cryptotracker/logs
/// - Windows : C:\Users\<user>\AppData\Local\cryptotracker\logs
/// - ./logs si le répertoire de données est introuvable
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("cryptotracker").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// Niveau contrôlé par RUST_LOG (défaut : debug pour cryptotracker, info
/// pour les dépendances).
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "cryptotracker.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptotracker=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("cryptotracker starting up");

    let config = Config::default();

    // Fichier absent ou invalide : watchlist vide, pas d'erreur
    let watchlist = WatchlistStore::open(&config.watchlist_path);
    info!(path = ?watchlist.path(), entries = watchlist.len(), "Watchlist opened");

    let mut app = App::new(watchlist);
    app.history_days = config.api.history_days;

    let (command_tx, command_rx) = mpsc::channel::<WorkerCommand>();
    let (result_tx, result_rx) = mpsc::channel::<WorkerResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(config.api.clone(), command_rx, result_tx);

    // Chargement initial du catalogue, hors du thread de l'interface
    app.start_loading(Some(CATALOG_LOADING_MESSAGE.to_string()));
    if command_tx.send(WorkerCommand::LoadCatalog).is_err() {
        app.stop_loading();
        app.show_warning("Background worker is not running");
    }

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================

/// Worker thread qui exécute les appels API
///
/// Les commandes sont traitées une par une, dans l'ordre d'arrivée. Le
/// thread se termine quand le channel de commandes est fermé (fin du main)
/// ou quand plus personne n'écoute les résultats.
fn spawn_background_worker(
    config: ApiConfig,
    command_rx: mpsc::Receiver<WorkerCommand>,
    result_tx: mpsc::Sender<WorkerResult>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Failed to create tokio runtime");
                let _ = result_tx.send(WorkerResult::WorkerFailed(e.to_string()));
                return;
            }
        };

        let client = match CoinGeckoClient::new(config) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to create HTTP client");
                let _ = result_tx.send(WorkerResult::WorkerFailed(e.to_string()));
                return;
            }
        };

        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let result = match command {
                WorkerCommand::LoadCatalog => {
                    let catalog = runtime.block_on(client.list_coins());
                    if let Err(e) = &catalog {
                        error!(error = %e, "Failed to load coin catalog");
                    }
                    WorkerResult::CatalogLoaded(catalog)
                }

                WorkerCommand::Track { ids } => runtime.block_on(async {
                    let history = client.fetch_history(&ids, client.config().history_days).await;

                    // Snapshots uniquement pour les coins qui ont un historique
                    let fetched: Vec<String> = history.keys().cloned().collect();
                    let snapshots = client.fetch_snapshot(&fetched).await;
                    if let Err(e) = &snapshots {
                        error!(error = %e, "Failed to load market snapshot");
                    }

                    WorkerResult::Tracked { history, snapshots }
                }),
            };

            if result_tx.send(result).is_err() {
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    })
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. appliquer les résultats du worker
//   1. dessiner
//   2. traiter l'événement clavier
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<WorkerCommand>,
    result_rx: &mpsc::Receiver<WorkerResult>,
) -> Result<()> {
    let mut worker_alive = true;

    while app.is_running() {
        // 0. Résultats du worker (non bloquant)
        // CONCEPT RUST : try_recv
        // - Empty : rien pour l'instant, on dessine
        // - Disconnected : le worker s'est arrêté (tous les Sender droppés)
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_worker_result(app, result),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    if worker_alive {
                        error!("Worker thread disconnected!");
                        worker_alive = false;
                        if app.is_loading_data() {
                            app.stop_loading();
                            app.show_warning("Background worker stopped unexpectedly");
                        }
                    }
                    break;
                }
            }
        }

        // 1. Rendu
        terminal.draw(|frame| render(frame, app))?;

        // 2. Entrées
        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => warn!(error = %e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état de l'application
fn apply_worker_result(app: &mut App, result: WorkerResult) {
    match result {
        WorkerResult::CatalogLoaded(catalog) => app.apply_catalog(catalog),

        WorkerResult::Tracked { history, snapshots } => {
            info!(series = history.len(), "Tracking data received");
            app.apply_tracking(history, snapshots);
        }

        WorkerResult::WorkerFailed(error) => {
            app.stop_loading();
            app.catalog_ready = true;
            app.show_warning(format!("Background worker failed to start: {}", error));
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement clavier et met à jour l'état de l'application
fn handle_event(app: &mut App, event: cryptotracker::ui::Event, command_tx: &mpsc::Sender<WorkerCommand>) {
    use cryptotracker::ui::events::{
        get_char_from_event, is_backspace_event, is_delete_event, is_down_event, is_enter_event,
        is_escape_event, is_quit_event, is_search_char_event, is_search_event, is_select_event,
        is_space_event, is_tab_event, is_track_event, is_up_event, Event,
    };

    if let Event::Tick = event {
        return;
    }

    // Popup d'avertissement : n'importe quelle touche la ferme
    if app.has_warning() {
        app.dismiss_warning();
        return;
    }

    // Mode recherche : les caractères vont dans le terme, filtrage immédiat
    if app.is_in_search_mode() {
        if is_escape_event(&event) || is_enter_event(&event) {
            debug!(term = %app.search_term, "User finished search");
            app.finish_search();
        } else if is_backspace_event(&event) {
            app.backspace_search();
        } else if is_search_char_event(&event) {
            if let Some(c) = get_char_from_event(&event) {
                app.append_search_char(c);
            }
        } else if is_up_event(&event) {
            app.navigate_up();
        } else if is_down_event(&event) {
            app.navigate_down();
        }
        return;
    }

    // Toute touche autre que 'q' / 'd' annule la confirmation correspondante
    if !is_quit_event(&event) {
        app.cancel_quit();
    }
    if !is_delete_event(&event) {
        app.cancel_delete();
    }

    if is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }

    // Pendant un chargement, seul 'q' est actif
    if app.is_loading_data() {
        return;
    }

    if app.is_on_performance() {
        if is_escape_event(&event) {
            debug!("User returned to browse screen");
            app.show_browse();
        }
        return;
    }

    if is_tab_event(&event) {
        app.toggle_focus();
    } else if is_search_event(&event) {
        info!("User started search");
        app.start_search();
    } else if is_up_event(&event) {
        app.navigate_up();
    } else if is_down_event(&event) {
        app.navigate_down();
    } else if is_space_event(&event) {
        app.toggle_mark();
    } else if is_select_event(&event) {
        match app.select_marked() {
            Ok(added) => info!(added, "User selected cryptos"),
            Err(e) => app.show_warning(e.to_string()),
        }
    } else if is_delete_event(&event) {
        handle_delete(app);
    } else if is_track_event(&event) {
        handle_track(app, command_tx);
    }
}

/// 'd' : suppression en deux temps, seulement depuis le panneau watchlist
fn handle_delete(app: &mut App) {
    match app.press_delete() {
        Ok(Some(removed)) => info!(removed, "User deleted cryptos"),
        Ok(None) if app.is_awaiting_delete_confirmation() => {
            info!(marked = app.watchlist_marked.len(), "User requested delete (awaiting confirmation)");
        }
        Ok(None) => debug!("Delete ignored outside the watchlist pane"),
        Err(e) => app.show_warning(e.to_string()),
    }
}

/// 't' : lance le chargement de l'historique et des snapshots
fn handle_track(app: &mut App, command_tx: &mpsc::Sender<WorkerCommand>) {
    let ids = match app.tracked_ids() {
        Ok(ids) => ids,
        Err(e) => {
            app.show_warning(e.to_string());
            return;
        }
    };

    info!(coins = ids.len(), "User requested tracking");
    app.start_loading(Some(format!(
        "Fetching {} days of prices for {} crypto(s)...",
        app.history_days,
        ids.len()
    )));

    if command_tx.send(WorkerCommand::Track { ids }).is_err() {
        app.stop_loading();
        app.show_warning("Background worker is not running");
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    terminal.show_cursor()?;

    Ok(())
}
