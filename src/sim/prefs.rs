/// Sound preference: the only state that survives between sessions.
///
/// ## Storage
///   Key-value lines (`soundEnabled=true`) in `prefs.dat` inside the data
///   directory. Values are the literal strings `true` / `false`; anything
///   else reads as the default (`true`).
///
/// ## Broadcast
///   Every change is pushed to all live subscribers as `SoundToggled`.
///   Subscribers drain their receiver once per frame, so all listeners see
///   the new value before the next render.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::AppError;

pub const SOUND_KEY: &str = "soundEnabled";
const PREFS_FILE: &str = "prefs.dat";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Writable per-user directory for prefs and the log file.
pub fn data_dir() -> PathBuf {
    // 1. Exe directory (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_ethan_select");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ethan-select");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Storage backends
// ══════════════════════════════════════════════════════════════

pub trait PrefStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
}

/// `key=value` file; unknown keys are preserved on rewrite.
pub struct FileStorage {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStorage {
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(PREFS_FILE);
        let entries = std::fs::read_to_string(&path)
            .map(|text| parse_entries(&text))
            .unwrap_or_default();
        FileStorage { path, entries }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrefStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        std::fs::write(&self.path, serialize_entries(&self.entries)).map_err(|source| {
            AppError::Preference { path: self.path.clone(), source }
        })
    }
}

/// In-memory storage for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let mut s = Self::new();
        s.entries.insert(key.to_string(), value.to_string());
        s
    }
}

#[cfg(test)]
impl PrefStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn parse_entries(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

fn serialize_entries(entries: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = entries.keys().collect();
    keys.sort();
    let mut out = String::new();
    for k in keys {
        out.push_str(&format!("{}={}\n", k, entries[k]));
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Observable store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoundToggled {
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Subscription {
    #[cfg_attr(not(test), allow(dead_code))]
    pub id: SubscriptionId,
    rx: Receiver<SoundToggled>,
}

impl Subscription {
    /// Most recent value broadcast since the last call, if any.
    pub fn latest(&self) -> Option<bool> {
        self.rx.try_iter().last().map(|e| e.enabled)
    }

    #[cfg(test)]
    pub fn drain(&self) -> Vec<SoundToggled> {
        self.rx.try_iter().collect()
    }
}

pub struct SoundPreference {
    enabled: bool,
    storage: Box<dyn PrefStorage>,
    listeners: Vec<(SubscriptionId, Sender<SoundToggled>)>,
    next_id: u64,
}

impl SoundPreference {
    pub fn load(storage: Box<dyn PrefStorage>) -> Self {
        let enabled = match storage.get(SOUND_KEY).as_deref() {
            Some("false") => false,
            Some("true") | None => true,
            Some(other) => {
                log::warn!("ignoring stored {SOUND_KEY}={other:?}, defaulting to on");
                true
            }
        };
        SoundPreference { enabled, storage, listeners: Vec::new(), next_id: 0 }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn subscribe(&mut self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, tx));
        Subscription { id, rx }
    }

    #[cfg(test)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Flip the preference, persist it, and broadcast the new value.
    pub fn toggle(&mut self) -> bool {
        self.set(!self.enabled);
        self.enabled
    }

    pub fn set(&mut self, enabled: bool) {
        self.enabled = enabled;
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.storage.set(SOUND_KEY, value) {
            log::warn!("{e}");
        }
        log::info!("sound {}", if enabled { "on" } else { "off" });

        let event = SoundToggled { enabled };
        // Dropped receivers fail to send; prune them here.
        self.listeners.retain(|(_, tx)| tx.send(event).is_ok());
    }

    #[cfg(test)]
    pub fn stored_value(&self) -> Option<String> {
        self.storage.get(SOUND_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ethan_select_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn defaults_to_enabled_on_first_run() {
        let p = SoundPreference::load(Box::new(MemoryStorage::new()));
        assert!(p.enabled());
        assert_eq!(p.stored_value(), None);
    }

    #[test]
    fn reads_literal_false() {
        let p = SoundPreference::load(Box::new(MemoryStorage::with(SOUND_KEY, "false")));
        assert!(!p.enabled());
    }

    #[test]
    fn garbage_value_reads_as_enabled() {
        let p = SoundPreference::load(Box::new(MemoryStorage::with(SOUND_KEY, "maybe")));
        assert!(p.enabled());
    }

    #[test]
    fn toggle_round_trip_restores_stored_value_and_broadcasts_once_each() {
        let mut p = SoundPreference::load(Box::new(MemoryStorage::with(SOUND_KEY, "true")));
        let sub = p.subscribe();

        assert!(!p.toggle());
        assert_eq!(p.stored_value().as_deref(), Some("false"));
        assert!(p.toggle());
        assert_eq!(p.stored_value().as_deref(), Some("true"));

        let events = sub.drain();
        assert_eq!(events, [SoundToggled { enabled: false }, SoundToggled { enabled: true }]);
    }

    #[test]
    fn every_subscriber_sees_the_change() {
        let mut p = SoundPreference::load(Box::new(MemoryStorage::new()));
        let a = p.subscribe();
        let b = p.subscribe();
        p.toggle();
        assert_eq!(a.latest(), Some(false));
        assert_eq!(b.latest(), Some(false));
        assert_eq!(a.latest(), None);
    }

    #[test]
    fn unsubscribed_and_dropped_listeners_are_removed() {
        let mut p = SoundPreference::load(Box::new(MemoryStorage::new()));
        let a = p.subscribe();
        let b = p.subscribe();
        p.unsubscribe(a.id);
        drop(b);
        assert_eq!(p.listener_count(), 1);
        p.toggle();
        assert_eq!(p.listener_count(), 0);
        assert_eq!(a.latest(), None);
    }

    #[test]
    fn file_storage_persists_across_sessions() {
        let dir = temp_dir("prefs");
        {
            let mut p = SoundPreference::load(Box::new(FileStorage::open(&dir)));
            p.toggle();
        }
        let text = std::fs::read_to_string(dir.join(PREFS_FILE)).unwrap();
        assert_eq!(text, "soundEnabled=false\n");

        let p = SoundPreference::load(Box::new(FileStorage::open(&dir)));
        assert!(!p.enabled());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_storage_keeps_unknown_keys() {
        let dir = temp_dir("prefs_keys");
        std::fs::write(dir.join(PREFS_FILE), "theme=dark\nsoundEnabled=true\n").unwrap();
        let mut s = FileStorage::open(&dir);
        s.set(SOUND_KEY, "false").unwrap();
        let text = std::fs::read_to_string(s.path()).unwrap();
        assert_eq!(text, "soundEnabled=false\ntheme=dark\n");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
