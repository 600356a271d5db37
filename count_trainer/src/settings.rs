//! Settings shared by both training modes, and the small key/value store the deck count is kept in.

use crate::error::{Result, TrainerError};
use blackjack_lib::ShoeSettings;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Key the persisted settings record is stored under.
pub const STORAGE_KEY: &str = "blackjack-trainer-settings";
pub const DEFAULT_NUM_DECKS: u32 = 6;
pub const SUPPORTED_DECK_COUNTS: [u32; 5] = [1, 2, 4, 6, 8];

/// Trait for a client local key/value store holding serialized settings records.
pub trait PreferenceStorage {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> FileStorage {
        FileStorage { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrainerError::Io(e)),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// Keeps records in memory only, nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The record written to storage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    num_decks: u32,
}

/// Reads the deck count out of a stored record. Anything other than one of the supported deck counts
/// yields `None`.
fn parse_num_decks(raw: &str) -> Option<u32> {
    let record: serde_json::Value = serde_json::from_str(raw).ok()?;
    let value = record.get("numDecks")?;
    let decks = match value.as_u64() {
        Some(n) => n,
        None => {
            let f = value.as_f64()?;
            if f.fract() != 0.0 || f <= 0.0 {
                return None;
            }
            f as u64
        }
    };
    u32::try_from(decks)
        .ok()
        .filter(|n| SUPPORTED_DECK_COUNTS.contains(n))
}

/// Settings shared by the single card drill and the table. Only `num_decks` is persisted, the other
/// flags last for the session. `reset_token` moves on every deck count change and tells shoes to rebuild.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    num_decks: u32,
    pub show_count: bool,
    pub show_discard_pile: bool,
    pub training_mode: bool,
    reset_token: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences::new(DEFAULT_NUM_DECKS)
    }
}

impl Preferences {
    /// Associated method for session defaults with the given deck count.
    pub fn new(num_decks: u32) -> Preferences {
        Preferences {
            num_decks,
            show_count: false,
            show_discard_pile: true,
            training_mode: false,
            reset_token: 0,
        }
    }

    /// Loads the persisted deck count from `storage`, falling back to the default for a missing,
    /// unreadable or malformed record.
    pub fn load<P: PreferenceStorage + ?Sized>(storage: &P) -> Preferences {
        let num_decks = match storage.load(STORAGE_KEY) {
            Ok(Some(raw)) => parse_num_decks(&raw).unwrap_or_else(|| {
                debug!(record = %raw, "ignoring malformed settings record");
                DEFAULT_NUM_DECKS
            }),
            Ok(None) => DEFAULT_NUM_DECKS,
            Err(e) => {
                warn!(error = %e, "could not read settings, using defaults");
                DEFAULT_NUM_DECKS
            }
        };
        Preferences::new(num_decks)
    }

    pub fn num_decks(&self) -> u32 {
        self.num_decks
    }

    pub fn reset_token(&self) -> u64 {
        self.reset_token
    }

    /// Changes the deck count, bumps the reset token and persists the new count.
    /// A failure to persist is logged and otherwise ignored, the in-memory change still applies.
    pub fn set_num_decks<P: PreferenceStorage + ?Sized>(
        &mut self,
        num_decks: u32,
        storage: &mut P,
    ) -> Result<()> {
        if !SUPPORTED_DECK_COUNTS.contains(&num_decks) {
            return Err(TrainerError::UnsupportedDeckCount(num_decks));
        }
        self.num_decks = num_decks;
        self.reset_token += 1;
        info!(num_decks, reset_token = self.reset_token, "deck count changed");

        if let Err(e) = self.persist(storage) {
            warn!(error = %e, "could not save settings");
        }
        Ok(())
    }

    fn persist<P: PreferenceStorage + ?Sized>(&self, storage: &mut P) -> Result<()> {
        let record = serde_json::to_string(&StoredSettings {
            num_decks: self.num_decks,
        })?;
        storage.save(STORAGE_KEY, &record)
    }
}

impl ShoeSettings for Preferences {
    fn num_decks(&self) -> u32 {
        self.num_decks
    }

    fn reset_token(&self) -> u64 {
        self.reset_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_lib::Shoe;

    fn storage_with(record: &str) -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        storage.save(STORAGE_KEY, record).unwrap();
        storage
    }

    #[test]
    fn defaults_when_nothing_is_stored() {
        let prefs = Preferences::load(&MemoryStorage::new());
        assert_eq!(prefs.num_decks(), 6);
        assert!(!prefs.show_count);
        assert!(prefs.show_discard_pile);
        assert!(!prefs.training_mode);
        assert_eq!(prefs.reset_token(), 0);
    }

    #[test]
    fn loads_a_stored_deck_count() {
        let prefs = Preferences::load(&storage_with(r#"{"numDecks":2}"#));
        assert_eq!(prefs.num_decks(), 2);
        let prefs = Preferences::load(&storage_with(r#"{"numDecks":8.0,"extra":true}"#));
        assert_eq!(prefs.num_decks(), 8);
    }

    #[test]
    fn falls_back_on_bad_records() {
        for record in [
            "not json",
            "{}",
            r#"{"numDecks":0}"#,
            r#"{"numDecks":-4}"#,
            r#"{"numDecks":"8"}"#,
            r#"{"numDecks":2.5}"#,
            r#"{"numDecks":null}"#,
            r#"{"numDecks":3}"#,
            r#"{"numDecks":64}"#,
            r#"{"numDecks":4294967295}"#,
            r#"{"numDecks":1e30}"#,
            "[4]",
        ] {
            let prefs = Preferences::load(&storage_with(record));
            assert_eq!(prefs.num_decks(), DEFAULT_NUM_DECKS, "record {record}");
        }
    }

    #[test]
    fn changing_decks_bumps_token_and_persists() {
        let mut storage = MemoryStorage::new();
        let mut prefs = Preferences::load(&storage);
        prefs.set_num_decks(4, &mut storage).unwrap();
        assert_eq!(prefs.num_decks(), 4);
        assert_eq!(prefs.reset_token(), 1);

        prefs.set_num_decks(4, &mut storage).unwrap();
        assert_eq!(prefs.reset_token(), 2);

        let reloaded = Preferences::load(&storage);
        assert_eq!(reloaded.num_decks(), 4);
    }

    #[test]
    fn unsupported_deck_count_is_rejected_untouched() {
        let mut storage = MemoryStorage::new();
        let mut prefs = Preferences::default();
        let err = prefs.set_num_decks(3, &mut storage).unwrap_err();
        assert!(matches!(err, TrainerError::UnsupportedDeckCount(3)));
        assert_eq!(prefs.num_decks(), 6);
        assert_eq!(prefs.reset_token(), 0);
        assert_eq!(storage.load(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.load(STORAGE_KEY).unwrap(), None);

        let mut prefs = Preferences::load(&storage);
        prefs.set_num_decks(8, &mut storage).unwrap();
        assert_eq!(Preferences::load(&storage).num_decks(), 8);
    }

    #[test]
    fn shoe_follows_preferences() {
        let mut storage = MemoryStorage::new();
        let mut prefs = Preferences::default();
        let mut shoe = Shoe::seeded(prefs.num_decks(), 1);
        shoe.sync(&prefs);
        shoe.draw_card();

        prefs.set_num_decks(1, &mut storage).unwrap();
        assert!(shoe.sync(&prefs));
        assert_eq!(shoe.total_cards(), 52);
        assert_eq!(shoe.cards_dealt(), 0);
    }
}
