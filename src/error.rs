// ============================================================================
// Erreurs de la librairie
// ============================================================================
// Trois familles :
// - Réseau : timeout, statut HTTP, JSON invalide, champ "prices" absent.
//   Toujours récupérables : on saute le coin concerné et on log.
// - Sélection vide : erreur utilisateur, affichée dans une popup.
// - Persistance : lecture (traitée comme watchlist vide) et écriture
//   (remontée à l'appelant).
//
// Le binaire utilise anyhow ; la librairie expose un enum typé pour que
// l'UI puisse distinguer les cas.
// ============================================================================

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Erreur de transport (timeout, connexion) ou de décodage JSON
    #[error("requête HTTP échouée : {0}")]
    Http(#[from] reqwest::Error),

    /// Réponse HTTP hors 2xx
    #[error("HTTP {status} pour {url}")]
    Status { status: StatusCode, url: String },

    /// La réponse market_chart ne contient pas de champ "prices"
    #[error("champ 'prices' absent de la réponse pour {coin_id}")]
    MissingPrices { coin_id: String },

    /// Timestamp hors de la plage représentable
    #[error("timestamp invalide : {millis} ms")]
    InvalidTimestamp { millis: i64 },

    /// Action demandée sans aucune ligne marquée
    #[error("{0}")]
    NoSelection(&'static str),

    #[error("lecture de la watchlist {path:?} impossible : {source}")]
    PersistenceRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("écriture de la watchlist {path:?} impossible : {source}")]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl TrackerError {
    /// Vrai pour les erreurs de la famille réseau
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TrackerError::Http(_)
                | TrackerError::Status { .. }
                | TrackerError::MissingPrices { .. }
                | TrackerError::InvalidTimestamp { .. }
        )
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<csv::Error>) -> Self {
        TrackerError::PersistenceWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}
