//! The game store: a fixed number of game slots plus the gamecast record,
//! shared between the HTTP handlers and the render thread.
//!
//! One mutex guards everything, so a render-time snapshot never sees a
//! half-merged record.

use crate::game::{GamePatch, GameRecord, GamecastRecord, Merge};
use parking_lot::Mutex;
use thiserror::Error;

/// Default number of game slots.
pub const DEFAULT_SLOTS: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Game index {index} out of range (0..{slots})")]
    IndexOutOfRange { index: usize, slots: usize },
}

struct Slots {
    games: Vec<GameRecord>,
    gamecast: GamecastRecord,
}

/// Owned, synchronized storage for every game the scoreboard knows about.
pub struct GameStore {
    inner: Mutex<Slots>,
    slot_count: usize,
}

impl GameStore {
    /// Create `slot_count` empty, hidden slots. The count never changes.
    pub fn new(slot_count: usize) -> Self {
        Self {
            inner: Mutex::new(Slots {
                games: vec![GameRecord::default(); slot_count],
                gamecast: GamecastRecord::default(),
            }),
            slot_count,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index >= self.slot_count {
            return Err(StoreError::IndexOutOfRange {
                index,
                slots: self.slot_count,
            });
        }
        Ok(())
    }

    /// Merge a partial update into slot `index` and mark it visible.
    /// Returns the merged record.
    pub fn merge_update(&self, index: usize, patch: GamePatch) -> Result<GameRecord, StoreError> {
        self.check_index(index)?;

        let mut slots = self.inner.lock();
        let game = &mut slots.games[index];
        game.merge(patch);
        game.visible = true;
        Ok(game.clone())
    }

    /// Merge a partial update into the gamecast record and mark it visible.
    pub fn merge_gamecast_update(&self, patch: GamePatch) -> GamecastRecord {
        let mut slots = self.inner.lock();
        slots.gamecast.game.merge(patch);
        slots.gamecast.game.visible = true;
        slots.gamecast.clone()
    }

    /// Hide every slot and the gamecast. Field values are kept; the next
    /// update overwrites them anyway.
    pub fn reset_all(&self) {
        let mut slots = self.inner.lock();
        for game in &mut slots.games {
            game.visible = false;
        }
        slots.gamecast.game.visible = false;
    }

    pub fn count_visible(&self) -> usize {
        self.inner.lock().games.iter().filter(|g| g.visible).count()
    }

    /// Indices of visible slots, in index order.
    pub fn visible_slots(&self) -> Vec<usize> {
        self.inner
            .lock()
            .games
            .iter()
            .enumerate()
            .filter(|(_, g)| g.visible)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn game(&self, index: usize) -> Option<GameRecord> {
        self.inner.lock().games.get(index).cloned()
    }

    /// Copy of every slot, visible or not.
    pub fn snapshot(&self) -> Vec<GameRecord> {
        self.inner.lock().games.clone()
    }

    pub fn gamecast(&self) -> GamecastRecord {
        self.inner.lock().gamecast.clone()
    }

    /// Record which slot the gamecast mirrors.
    pub fn pin_gamecast(&self, index: usize) -> Result<(), StoreError> {
        self.check_index(index)?;
        self.inner.lock().gamecast.pinned_index = Some(index);
        Ok(())
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn patch(value: serde_json::Value) -> GamePatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn new_store_has_hidden_slots() {
        let store = GameStore::new(20);
        assert_eq!(store.slot_count(), 20);
        assert_eq!(store.count_visible(), 0);
        assert_eq!(store.snapshot().len(), 20);
        assert!(store.snapshot().iter().all(|g| !g.visible));
    }

    #[test]
    fn merge_marks_slot_visible() {
        let store = GameStore::new(4);
        let game = store.merge_update(2, patch(json!({"inning": 3}))).unwrap();
        assert!(game.visible);
        assert_eq!(game.inning, Some(3));
        assert_eq!(store.count_visible(), 1);
        assert_eq!(store.visible_slots(), vec![2]);
    }

    #[test]
    fn empty_merge_still_makes_slot_visible() {
        let store = GameStore::new(4);
        store.merge_update(0, GamePatch::default()).unwrap();
        assert_eq!(store.visible_slots(), vec![0]);
    }

    #[test]
    fn out_of_range_index_fails_without_writing() {
        let store = GameStore::new(4);
        let err = store.merge_update(4, patch(json!({"inning": 1}))).unwrap_err();
        assert_eq!(err, StoreError::IndexOutOfRange { index: 4, slots: 4 });
        assert_eq!(store.count_visible(), 0);
    }

    #[test]
    fn count_visible_counts_distinct_slots_since_reset() {
        let store = GameStore::new(10);
        for index in [0, 3, 3, 7] {
            store.merge_update(index, GamePatch::default()).unwrap();
        }
        assert_eq!(store.count_visible(), 3);

        store.reset_all();
        assert_eq!(store.count_visible(), 0);

        store.merge_update(5, GamePatch::default()).unwrap();
        assert_eq!(store.count_visible(), 1);
    }

    #[test]
    fn reset_keeps_field_values() {
        let store = GameStore::new(2);
        store.merge_update(1, patch(json!({"away": {"abv": "SEA"}}))).unwrap();
        store.merge_gamecast_update(patch(json!({"inning": 9})));

        store.reset_all();

        let game = store.game(1).unwrap();
        assert!(!game.visible);
        assert_eq!(game.away.abv.as_deref(), Some("SEA"));

        let cast = store.gamecast();
        assert!(!cast.game.visible);
        assert_eq!(cast.game.inning, Some(9));
    }

    #[test]
    fn gamecast_merge_is_independent_of_slots() {
        let store = GameStore::new(2);
        let cast = store.merge_gamecast_update(patch(json!({"home": {"runs": 4}})));
        assert!(cast.game.visible);
        assert_eq!(cast.game.home.runs, Some(4));
        assert_eq!(store.count_visible(), 0);
    }

    #[test]
    fn pin_gamecast_validates_index() {
        let store = GameStore::new(3);
        store.pin_gamecast(2).unwrap();
        assert_eq!(store.gamecast().pinned_index, Some(2));

        assert!(store.pin_gamecast(3).is_err());
        assert_eq!(store.gamecast().pinned_index, Some(2));
    }

    #[test]
    fn concurrent_merges_are_not_lost() {
        let store = Arc::new(GameStore::new(8));
        let handles: Vec<_> = (0..8)
            .map(|index| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for runs in 0..50u32 {
                        store
                            .merge_update(index, patch(json!({"away": {"runs": runs}})))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count_visible(), 8);
        assert!(store.snapshot().iter().all(|g| g.away.runs == Some(49)));
    }
}
