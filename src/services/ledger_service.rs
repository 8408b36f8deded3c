use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    entry::{mint_id, Entry, Player},
    services::storage::{LedgerBackend, StoreError},
};

/// Outcome of a targeted delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub removed: bool,
    pub entries: Vec<Entry>,
}

/// Running score per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Totals {
    pub kaille: u64,
    pub francis: u64,
}

impl Totals {
    pub fn from_entries(entries: &[Entry]) -> Self {
        entries.iter().fold(Self::default(), |acc, e| Self {
            kaille: acc.kaille + u64::from(e.kaille),
            francis: acc.francis + u64::from(e.francis),
        })
    }

    pub fn leader(&self) -> Option<Player> {
        match self.kaille.cmp(&self.francis) {
            std::cmp::Ordering::Greater => Some(Player::Kaille),
            std::cmp::Ordering::Less => Some(Player::Francis),
            std::cmp::Ordering::Equal => None,
        }
    }
}

fn push_unique(entries: &mut Vec<Entry>, mut entry: Entry) -> Entry {
    while entry
        .id
        .as_deref()
        .is_some_and(|id| entries.iter().any(|e| e.id.as_deref() == Some(id)))
    {
        entry.id = Some(mint_id());
    }
    entries.push(entry.clone());
    entry
}

/// The score ledger. Every load-mutate-save cycle holds `lock` for its whole
/// duration, so two writers can never interleave and lose an update.
pub struct Ledger {
    backend: Box<dyn LedgerBackend>,
    lock: Mutex<()>,
}

impl Ledger {
    pub fn new<B: LedgerBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn load(&self) -> Result<Vec<Entry>, StoreError> {
        let _guard = self.guard();
        self.backend.read()
    }

    pub fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.backend.write(entries)
    }

    /// Appends `entry`, re-minting its id if it collides with a stored one.
    pub fn append(&self, entry: Entry) -> Result<Vec<Entry>, StoreError> {
        let _guard = self.guard();
        let mut entries = self.backend.read()?;
        push_unique(&mut entries, entry);
        self.backend.write(&entries)?;
        Ok(entries)
    }

    /// Records one round for `player_name` and returns the stored entry.
    pub fn add_round(&self, player_name: &str, points: u32) -> Result<Entry, StoreError> {
        let player = Player::from_name(player_name);
        if player.is_none() {
            warn!(player = player_name, "unrecognized player, recording a zero round");
        }
        let _guard = self.guard();
        let mut entries = self.backend.read()?;
        let stored = push_unique(&mut entries, Entry::record(player, points, mint_id(), Utc::now()));
        self.backend.write(&entries)?;
        info!(
            id = stored.id.as_deref().unwrap_or_default(),
            kaille = stored.kaille,
            francis = stored.francis,
            total = entries.len(),
            "round recorded"
        );
        Ok(stored)
    }

    /// Writes back only when something was actually removed.
    pub fn remove_by_id(&self, id: &str) -> Result<Removal, StoreError> {
        let _guard = self.guard();
        let mut entries = self.backend.read()?;
        let before = entries.len();
        entries.retain(|e| e.id.as_deref() != Some(id));
        let removed = entries.len() != before;
        if removed {
            self.backend.write(&entries)?;
            info!(id, remaining = entries.len(), "entry removed");
        }
        Ok(Removal { removed, entries })
    }

    pub fn wipe(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        self.backend.write(&[])?;
        info!("ledger wiped");
        Ok(())
    }

    pub fn quarantine(&self) -> Result<Option<PathBuf>, StoreError> {
        let _guard = self.guard();
        let aside = self.backend.quarantine()?;
        if let Some(path) = &aside {
            warn!(path = %path.display(), "corrupt ledger moved aside");
        }
        Ok(aside)
    }
}
