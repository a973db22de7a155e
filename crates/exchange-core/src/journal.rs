// exchange-core/src/journal.rs

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// State that can be checkpointed and later committed or rolled back
///
/// Checkpoints nest. Committing an inner checkpoint folds its changes into
/// the enclosing one, so a later rollback of the enclosing checkpoint still
/// undoes them.
pub trait Transactional {
    /// Begin transaction (checkpoint)
    fn checkpoint(&self);

    /// Commit the most recent checkpoint
    fn commit(&self);

    /// Undo everything since the most recent checkpoint
    fn rollback(&self);
}

/// Run `op` as one all-or-nothing unit over `participants`.
///
/// Every participant is checkpointed before `op` runs. On `Ok` all of them
/// commit, on `Err` all of them roll back (in reverse order) and the error is
/// returned unchanged.
pub fn atomically<T, E, F>(participants: &[&dyn Transactional], op: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    for participant in participants {
        participant.checkpoint();
    }

    match op() {
        Ok(value) => {
            for participant in participants {
                participant.commit();
            }
            Ok(value)
        }
        Err(err) => {
            for participant in participants.iter().rev() {
                participant.rollback();
            }
            tracing::warn!("Atomic unit rolled back: {}", err);
            Err(err)
        }
    }
}

/// Map modification for rollback support
#[derive(Debug, Clone)]
enum Modification<K, V> {
    Checkpoint,
    Set { key: K, previous: Option<V> },
}

/// Hash map with nested checkpoint/commit/rollback
#[derive(Debug, Clone)]
pub struct JournaledMap<K, V> {
    entries: HashMap<K, V>,
    journal: Vec<Modification<K, V>>,
    depth: usize,
}

impl<K, V> JournaledMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            journal: Vec::new(),
            depth: 0,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.record(&key);
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.record(key);
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of open checkpoints
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn checkpoint(&mut self) {
        self.depth += 1;
        self.journal.push(Modification::Checkpoint);
    }

    pub fn commit(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;

        if self.depth == 0 {
            self.journal.clear();
            return;
        }

        // Keep the recorded originals so the enclosing checkpoint can still undo them
        if let Some(pos) = self
            .journal
            .iter()
            .rposition(|m| matches!(m, Modification::Checkpoint))
        {
            self.journal.remove(pos);
        }
    }

    pub fn rollback(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;

        while let Some(modification) = self.journal.pop() {
            match modification {
                Modification::Checkpoint => break,
                Modification::Set { key, previous } => match previous {
                    Some(old) => {
                        self.entries.insert(key, old);
                    }
                    None => {
                        self.entries.remove(&key);
                    }
                },
            }
        }
    }

    /// Record the original value of `key` unless it was already recorded
    /// since the last checkpoint.
    fn record(&mut self, key: &K) {
        if self.depth == 0 {
            return;
        }

        for entry in self.journal.iter().rev() {
            match entry {
                Modification::Checkpoint => break,
                Modification::Set { key: k, .. } if k == key => return,
                _ => {}
            }
        }

        let previous = self.entries.get(key).cloned();
        self.journal.push(Modification::Set {
            key: key.clone(),
            previous,
        });
    }
}

impl<K, V> Default for JournaledMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
