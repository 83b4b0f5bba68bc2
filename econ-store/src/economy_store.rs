use crate::EconomySave;
use anyhow::{anyhow, Context, Result};
use econ_core::WorldState;
use itertools::Itertools;
use mockall::automock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

#[automock]
pub trait EconomyStore: Send + Sync + Debug {
    /// `Ok(None)` when nothing was saved under `slot` yet.
    fn load(&self, slot: &str) -> Result<Option<EconomySave>>;
    fn save(&self, slot: &str, save: &EconomySave) -> Result<()>;
    fn slots(&self) -> Result<Vec<String>>;
}

/// One pretty-printed `<slot>.json` per save slot inside `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileEconomyStore {
    dir: PathBuf,
}

impl JsonFileEconomyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl EconomyStore for JsonFileEconomyStore {
    fn load(&self, slot: &str) -> Result<Option<EconomySave>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            debug!("No saved economy at {}", path.display());
            return Ok(None);
        }
        let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
        let save = serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(save))
    }

    fn save(&self, slot: &str, save: &EconomySave) -> Result<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.slot_path(slot);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), save).with_context(|| format!("writing {}", path.display()))?;
        info!("Saved economy to {}", path.display());
        Ok(())
    }

    fn slots(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.dir).with_context(|| format!("listing {}", self.dir.display()))?;
        let mut slots = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    slots.push(stem.to_string());
                }
            }
        }
        Ok(slots.into_iter().sorted().collect_vec())
    }
}

/// Store implementation with interior mutability, for tests and throwaway sessions
#[derive(Debug, Default, Clone)]
pub struct InMemoryEconomyStore {
    saves: Arc<RwLock<HashMap<String, EconomySave>>>,
}

impl InMemoryEconomyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EconomyStore for InMemoryEconomyStore {
    fn load(&self, slot: &str) -> Result<Option<EconomySave>> {
        let saves = self.saves.read().map_err(|_| anyhow!("economy store lock poisoned"))?;
        Ok(saves.get(slot).cloned())
    }

    fn save(&self, slot: &str, save: &EconomySave) -> Result<()> {
        let mut saves = self.saves.write().map_err(|_| anyhow!("economy store lock poisoned"))?;
        saves.insert(slot.to_string(), save.clone());
        Ok(())
    }

    fn slots(&self) -> Result<Vec<String>> {
        let saves = self.saves.read().map_err(|_| anyhow!("economy store lock poisoned"))?;
        Ok(saves.keys().cloned().sorted().collect_vec())
    }
}

/// Captures the player's economy knowledge and writes it to `slot`.
pub fn save_world(store: &dyn EconomyStore, slot: &str, world: &WorldState) -> Result<()> {
    store.save(slot, &EconomySave::capture(world))
}

/// Restores `slot` into `world`. Returns the number of restored price records, or `None` if the
/// slot is empty, in which case `world` is left untouched.
pub fn load_world(store: &dyn EconomyStore, slot: &str, world: &mut WorldState) -> Result<Option<usize>> {
    let Some(save) = store.load(slot)? else {
        return Ok(None);
    };
    Ok(Some(save.restore(world)))
}
