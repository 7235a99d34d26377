//! Settings persistence over a pluggable key-value cache.
//!
//! The [`Cache`] trait is the boundary to the persistence mechanism — the
//! embedding application decides where settings live (browser storage, a
//! config file, a database row). [`MemoryCache`] ships in-crate for tests
//! and ephemeral sessions.
//!
//! [`SettingsStore`] layers the settings contract on top: values are opaque
//! JSON records round-tripped verbatim, loads fall back to compiled-in
//! defaults when a key is absent or fails to parse, and every save is
//! write-through and best-effort — a persistence failure is logged and never
//! surfaced to the caller.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::protocol::{CategorySelection, GameSettings};

/// Persistence keys used by the settings store.
pub mod keys {
    /// Stored [`GameSettings`](crate::protocol::GameSettings).
    pub const GAME_SETTINGS: &str = "gameSettings";
    /// Stored [`CategorySelection`](crate::protocol::CategorySelection).
    pub const CATEGORIES: &str = "categories";
    /// Cached voting artifacts from the previous game; cleared on game start.
    pub const RATINGS: &str = "ratings";
}

// ── Cache trait ─────────────────────────────────────────────────────

/// A synchronous string key-value cache.
///
/// Implementations persist values however they like; writes are expected to
/// complete (or fail) before returning so the store's write-through contract
/// holds. Per-key last-write-wins is sufficient — no cross-key
/// transactionality is required.
pub trait Cache: Send + Sync {
    /// Load the value stored at `key`, or `None` when absent.
    fn load(&self, key: &str) -> Option<String>;

    /// Store `value` at `key`, replacing any prior value.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::Cache`] (or [`Io`](LetterRushError::Io))
    /// when the backing store cannot complete the write.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored at `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`LetterRushError::Cache`] when the backing store cannot
    /// complete the removal.
    fn clear(&self, key: &str) -> Result<()>;
}

/// An in-memory [`Cache`] backed by a `HashMap`.
///
/// Useful for tests and for sessions that do not need settings to outlive
/// the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when a value is stored at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock means a writer panicked mid-insert; the map itself
        // is still a coherent HashMap, so keep serving it.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Cache for MemoryCache {
    fn load(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Shared caches work too: an `Arc<C>` delegates to the inner cache, so an
/// embedding application can keep a handle to the same cache it hands the
/// [`SettingsStore`].
impl<C: Cache + ?Sized> Cache for std::sync::Arc<C> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }

    fn clear(&self, key: &str) -> Result<()> {
        (**self).clear(key)
    }
}

// ── SettingsStore ───────────────────────────────────────────────────

/// Write-through settings persistence with default-value fallback.
///
/// Wraps a [`Cache`] and round-trips [`GameSettings`] and
/// [`CategorySelection`] as JSON. Loads never fail: an absent or malformed
/// stored value falls back to the compiled-in default (malformed values are
/// logged). Saves are best-effort: a failed write is logged and the
/// in-memory value the caller holds still wins.
pub struct SettingsStore {
    cache: Box<dyn Cache>,
}

impl SettingsStore {
    /// Create a store over the given cache implementation.
    pub fn new(cache: impl Cache + 'static) -> Self {
        Self {
            cache: Box::new(cache),
        }
    }

    /// Load persisted game settings, falling back to [`GameSettings::default`].
    pub fn load_settings(&self) -> GameSettings {
        self.load_or_default(keys::GAME_SETTINGS)
    }

    /// Load the persisted category selection, falling back to
    /// [`CategorySelection::default`].
    pub fn load_categories(&self) -> CategorySelection {
        self.load_or_default(keys::CATEGORIES)
    }

    /// Persist game settings (write-through, best-effort).
    pub fn save_settings(&self, settings: &GameSettings) {
        self.save(keys::GAME_SETTINGS, settings);
    }

    /// Persist the category selection (write-through, best-effort).
    pub fn save_categories(&self, categories: &CategorySelection) {
        self.save(keys::CATEGORIES, categories);
    }

    /// Remove cached voting artifacts from the previous game.
    ///
    /// Invoked by [`LetterRushClient::start_game`](crate::client::LetterRushClient::start_game)
    /// so a new game never displays stale ratings.
    pub fn clear_ratings(&self) {
        if let Err(e) = self.cache.clear(keys::RATINGS) {
            warn!("failed to clear '{}': {e}", keys::RATINGS);
        }
    }

    /// Restore default settings and the given freshly generated category
    /// selection, writing both through.
    ///
    /// Category generation is an external collaborator, so the replacement
    /// selection is supplied by the caller.
    pub fn reset_to_defaults(
        &self,
        fresh_categories: CategorySelection,
    ) -> (GameSettings, CategorySelection) {
        let settings = GameSettings::default();
        self.save_settings(&settings);
        self.save_categories(&fresh_categories);
        (settings, fresh_categories)
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.cache.load(key) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("stored value for '{key}' failed to parse, using defaults: {e}");
                    T::default()
                }
            },
            None => T::default(),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                // Serialization failure is a programming bug; log and move on.
                warn!("failed to serialize value for '{key}': {e}");
                return;
            }
        };
        if let Err(e) = self.cache.save(key, &raw) {
            warn!("failed to persist '{key}': {e}");
        }
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}
