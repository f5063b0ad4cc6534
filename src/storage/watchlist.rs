// ============================================================================
// Structure : WatchlistStore
// ============================================================================
// Liste ordonnée des coins suivis, miroir d'un fichier CSV.
//
// Règles :
// - L'ordre d'insertion est l'ordre d'affichage
// - Unicité par id
// - Après chaque add/remove réussi, le fichier contient exactement la liste
//   en mémoire : on réécrit tout, on ne patche jamais
// - Lecture "fail-silent" : fichier absent ou invalide = watchlist vide
// - Écriture : erreurs remontées, la mémoire est remise dans l'état du disque
// ============================================================================

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::TrackerError;
use crate::models::WatchlistEntry;

/// En-tête du fichier CSV
const HEADER: [&str; 3] = ["id", "symbol", "name"];

/// Watchlist persistée dans un fichier CSV
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
    entries: Vec<WatchlistEntry>,
}

impl WatchlistStore {
    /// Ouvre la watchlist stockée à `path` (vide si le fichier n'existe pas)
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load(&path);
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Ids dans l'ordre d'affichage
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Ajoute des coins à la fin de la watchlist puis réécrit le fichier
    ///
    /// Un id déjà présent garde sa position ; son symbole et son nom prennent
    /// la valeur la plus récente. Retourne le nombre de coins réellement
    /// ajoutés.
    pub fn add<I>(&mut self, entries: I) -> Result<usize, TrackerError>
    where
        I: IntoIterator<Item = WatchlistEntry>,
    {
        let previous = self.entries.clone();
        let mut added = 0;

        for entry in entries {
            match self.entries.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => {
                    debug!(coin = %entry.id, "Coin already in watchlist, refreshing display fields");
                    *existing = entry;
                }
                None => {
                    self.entries.push(entry);
                    added += 1;
                }
            }
        }

        self.commit(previous)?;
        info!(added, total = self.entries.len(), "Watchlist updated");
        Ok(added)
    }

    /// Retire les coins dont l'id est dans `ids` puis réécrit le fichier
    ///
    /// Retourne le nombre de coins retirés.
    pub fn remove(&mut self, ids: &HashSet<String>) -> Result<usize, TrackerError> {
        let previous = self.entries.clone();

        self.entries.retain(|e| !ids.contains(&e.id));
        let removed = previous.len() - self.entries.len();

        self.commit(previous)?;
        info!(removed, total = self.entries.len(), "Watchlist updated");
        Ok(removed)
    }

    /// Écrit la liste courante ; en cas d'échec, restaure `previous`
    fn commit(&mut self, previous: Vec<WatchlistEntry>) -> Result<(), TrackerError> {
        if let Err(e) = save(&self.path, &self.entries) {
            warn!(path = ?self.path, error = %e, "Watchlist write failed, rolling back");
            self.entries = previous;
            return Err(e);
        }
        Ok(())
    }
}

/// Lit la watchlist stockée à `path`
///
/// Ne retourne jamais d'erreur : fichier absent (premier lancement) ou
/// invalide donnent une liste vide. Les doublons d'id sont fusionnés.
pub fn load(path: &Path) -> Vec<WatchlistEntry> {
    match read_entries(path) {
        Ok(Some(entries)) => {
            info!(path = ?path, entries = entries.len(), "Watchlist loaded");
            entries
        }
        Ok(None) => {
            debug!(path = ?path, "No watchlist file, starting empty");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable watchlist file");
            Vec::new()
        }
    }
}

/// Lecture stricte : `Ok(None)` si le fichier n'existe pas
fn read_entries(path: &Path) -> Result<Option<Vec<WatchlistEntry>>, TrackerError> {
    if !path.exists() {
        return Ok(None);
    }

    let read_error = |source: csv::Error| TrackerError::PersistenceRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(read_error)?;
    let mut entries: Vec<WatchlistEntry> = Vec::new();

    for row in reader.deserialize() {
        let entry: WatchlistEntry = row.map_err(read_error)?;

        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    Ok(Some(entries))
}

/// Réécrit entièrement le fichier de watchlist
///
/// CONCEPT RUST : Combinateurs sur Result
/// - `and_then` n'exécute le renommage que si l'écriture a réussi
/// - `map_err(csv::Error::from)` aligne io::Error sur le type d'erreur du writer
///
/// On écrit dans un fichier temporaire voisin, puis on le renomme : un échec
/// en cours d'écriture laisse l'ancien fichier intact. Le writer est fermé
/// (drop) avant le renommage.
pub fn save(path: &Path, entries: &[WatchlistEntry]) -> Result<(), TrackerError> {
    let tmp = temp_path(path);

    let result = write_entries(&tmp, entries)
        .and_then(|()| fs::rename(&tmp, path).map_err(csv::Error::from));

    if let Err(source) = result {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            debug!(path = ?tmp, error = %cleanup, "Temporary watchlist file not removed");
        }
        return Err(TrackerError::write(path, source));
    }

    debug!(path = ?path, entries = entries.len(), "Watchlist written");
    Ok(())
}

fn write_entries(path: &Path, entries: &[WatchlistEntry]) -> Result<(), csv::Error> {
    // En-tête écrit à la main pour qu'une watchlist vide en ait un aussi
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;

    writer.write_record(HEADER)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "watchlist.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// ============================================================================
// Tests unitaires
// ============================================================================
// CONCEPT RUST : TempDir et Drop
// - tempdir() crée un répertoire unique par test
// - Le répertoire est supprimé quand la valeur est droppée (fin du test)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn bitcoin() -> WatchlistEntry {
        WatchlistEntry::new("bitcoin", "btc", "Bitcoin")
    }

    fn ethereum() -> WatchlistEntry {
        WatchlistEntry::new("ethereum", "eth", "Ethereum")
    }

    fn ids(entries: &[WatchlistEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let entries = load(&dir.path().join("selected_cryptos.csv"));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");
        fs::write(&path, "foo,bar\n1,2,3,4\n").unwrap();

        assert!(load(&path).is_empty());
        assert!(WatchlistStore::open(&path).is_empty());
    }

    #[test]
    fn test_load_ignores_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");
        fs::write(
            &path,
            "id,symbol,name,current_price\nbitcoin,btc,Bitcoin,67000\nethereum,eth,Ethereum,3500\n",
        )
        .unwrap();

        let entries = load(&path);
        assert_eq!(entries, vec![bitcoin(), ethereum()]);
    }

    #[test]
    fn test_add_then_load_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");

        let mut store = WatchlistStore::open(&path);
        assert_eq!(store.add([bitcoin()]).unwrap(), 1);
        assert_eq!(store.add([ethereum()]).unwrap(), 1);

        let loaded = load(&path);
        assert_eq!(ids(&loaded), vec!["bitcoin", "ethereum"]);
        assert_eq!(loaded, store.entries());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("id,symbol,name\n"));
    }

    #[test]
    fn test_add_deduplicates_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");

        let mut store = WatchlistStore::open(&path);
        store.add([bitcoin(), ethereum()]).unwrap();

        let renamed = WatchlistEntry::new("bitcoin", "btc", "Bitcoin (new)");
        assert_eq!(store.add([renamed.clone()]).unwrap(), 0);

        let loaded = load(&path);
        assert_eq!(ids(&loaded), vec!["bitcoin", "ethereum"]);
        assert_eq!(loaded[0], renamed);
    }

    #[test]
    fn test_add_unions_with_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");
        save(&path, &[bitcoin()]).unwrap();

        let mut store = WatchlistStore::open(&path);
        store.add([ethereum(), bitcoin()]).unwrap();

        let loaded: HashSet<String> = load(&path).into_iter().map(|e| e.id).collect();
        let expected: HashSet<String> = ["bitcoin", "ethereum"].iter().map(|s| s.to_string()).collect();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_remove_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");

        let mut store = WatchlistStore::open(&path);
        store
            .add([bitcoin(), ethereum(), WatchlistEntry::new("dogecoin", "doge", "Dogecoin")])
            .unwrap();

        let to_remove: HashSet<String> = ["bitcoin".to_string(), "unknown".to_string()].into();
        assert_eq!(store.remove(&to_remove).unwrap(), 1);

        assert_eq!(ids(&load(&path)), vec!["ethereum", "dogecoin"]);
        assert!(!store.contains("bitcoin"));
    }

    #[test]
    fn test_remove_all_leaves_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");

        let mut store = WatchlistStore::open(&path);
        store.add([bitcoin()]).unwrap();
        store.remove(&["bitcoin".to_string()].into()).unwrap();

        assert!(load(&path).is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,symbol,name\n");
    }

    #[test]
    fn test_write_failure_rolls_back() {
        let dir = tempdir().unwrap();
        // Répertoire parent inexistant : l'écriture échoue
        let path = dir.path().join("missing").join("selected_cryptos.csv");

        let mut store = WatchlistStore::open(&path);
        let err = store.add([bitcoin()]).unwrap_err();

        assert!(matches!(err, TrackerError::PersistenceWrite { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempdir().unwrap();
        // La cible est un répertoire : le fichier temporaire s'écrit, le renommage échoue
        let path = dir.path().join("selected_cryptos.csv");
        fs::create_dir(&path).unwrap();

        let mut store = WatchlistStore::open(&path);
        assert_eq!(store.path(), path.as_path());

        let err = store.add([bitcoin()]).unwrap_err();

        assert!(matches!(err, TrackerError::PersistenceWrite { .. }));
        assert!(store.is_empty());
        assert!(!temp_path(&path).exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_names_with_commas_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_cryptos.csv");
        let entry = WatchlistEntry::new("odd-coin", "odd", "Odd, \"Quoted\" Coin");

        save(&path, &[entry.clone()]).unwrap();
        assert_eq!(load(&path), vec![entry]);
    }
}
