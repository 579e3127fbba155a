use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use crate::theme::GlobeTheme;
use crate::tile::storage::{TileFetcher, TileStorage};
use crate::tile::{
    level_columns, level_for_radius, level_rows, Tile, TileError, TileId, TilePixels,
};

const RETIRED_BUDGET: usize = 20 * 1024 * 1024;

/// Byte-bounded second-chance store for swept tiles. Eviction is oldest
/// retirement first; stale queue entries from re-retired addresses are
/// skipped by sequence number.
struct RetiredStore {
    budget: usize,
    bytes: usize,
    seq: u64,
    order: VecDeque<(TileId, u64)>,
    tiles: HashMap<TileId, (u64, Tile)>,
}

impl RetiredStore {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            bytes: 0,
            seq: 0,
            order: VecDeque::new(),
            tiles: HashMap::new(),
        }
    }

    fn insert(&mut self, tile: Tile) {
        let size = tile.byte_size();
        if size > self.budget {
            return;
        }
        let id = tile.id;
        self.seq += 1;
        if let Some((_, old)) = self.tiles.insert(id, (self.seq, tile)) {
            self.bytes -= old.byte_size();
        }
        self.bytes += size;
        self.order.push_back((id, self.seq));
        while self.bytes > self.budget {
            let Some((victim, seq)) = self.order.pop_front() else {
                break;
            };
            let current = self.tiles.get(&victim).map(|(s, _)| *s);
            if current == Some(seq) {
                if let Some((_, gone)) = self.tiles.remove(&victim) {
                    self.bytes -= gone.byte_size();
                }
            }
        }
    }

    fn take(&mut self, id: TileId) -> Option<Tile> {
        let (_, tile) = self.tiles.remove(&id)?;
        self.bytes -= tile.byte_size();
        Some(tile)
    }

    fn peek(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id).map(|(_, t)| t)
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.order.clear();
        self.bytes = 0;
    }

    fn len(&self) -> usize {
        self.tiles.len()
    }

    fn bytes(&self) -> usize {
        self.bytes
    }
}

/// Resolve a missing tile by scaling up the nearest resident or locally
/// available ancestor. Loaded ancestors go into the retired store so a
/// burst of misses at one level decodes each ancestor once.
fn build_fallback(
    storage: &dyn TileStorage,
    theme: &GlobeTheme,
    retired: &mut RetiredStore,
    storage_loads: &mut u64,
    id: TileId,
) -> Tile {
    let mut walk = id;
    while let Some(ancestor_id) = walk.parent() {
        if retired.peek(ancestor_id).is_none() && storage.tile_exists(theme, ancestor_id) {
            match storage.load(theme, ancestor_id) {
                Ok(tile) => {
                    *storage_loads += 1;
                    retired.insert(tile);
                }
                Err(err) => warn!(
                    "ancestor tile {} unreadable: {err}",
                    ancestor_id.path(&theme.prefix, &theme.extension)
                ),
            }
        }
        if let Some(ancestor) = retired.peek(ancestor_id) {
            return Tile::scaled_from_ancestor(id, ancestor);
        }
        walk = ancestor_id;
    }
    // The base level was validated when the theme was activated, so this
    // only happens when the base became unreadable afterwards.
    warn!(
        "no ancestor available for tile {}, painting it flat",
        id.path(&theme.prefix, &theme.extension)
    );
    let size = theme.tile_size.max(1);
    let mut tile = Tile::new(
        id,
        size,
        size,
        TilePixels::Color(vec![0x00202020; (size * size) as usize]),
    );
    tile.fallback = true;
    tile
}

/// Tile working set for the active (theme, level) pair.
///
/// The display hash holds exactly the tiles of the current level; frames
/// bracket their accesses with `reset_used_marks` and `evict_unused` so
/// the sweep leaves only what the frame touched. Swept tiles wait in the
/// retired store until the byte budget pushes them out.
pub struct TileCache {
    storage: Box<dyn TileStorage>,
    fetcher: Box<dyn TileFetcher>,
    theme: GlobeTheme,
    effective_max_level: u32,
    level: u32,
    tiles: HashMap<(u32, u32), Tile>,
    retired: RetiredStore,
    storage_loads: u64,
    requested_this_frame: usize,
}

impl TileCache {
    /// Build a cache for `theme`, validating that its base level is
    /// complete in storage.
    pub fn new(
        storage: Box<dyn TileStorage>,
        fetcher: Box<dyn TileFetcher>,
        theme: &GlobeTheme,
    ) -> Result<Self, TileError> {
        let mut cache = Self {
            storage,
            fetcher,
            theme: theme.clone(),
            effective_max_level: 0,
            level: 0,
            tiles: HashMap::new(),
            retired: RetiredStore::new(RETIRED_BUDGET),
            storage_loads: 0,
            requested_this_frame: 0,
        };
        cache.validate_and_adopt(theme)?;
        Ok(cache)
    }

    fn validate_and_adopt(&mut self, theme: &GlobeTheme) -> Result<(), TileError> {
        for column in 0..level_columns(0) {
            if !self.storage.tile_exists(theme, TileId::new(0, column, 0)) {
                return Err(TileError::MissingBaseTiles {
                    theme: theme.id.clone(),
                });
            }
        }
        self.theme = theme.clone();
        self.effective_max_level = theme.max_tile_level.min(self.storage.max_level(theme));
        Ok(())
    }

    /// Switch the raster source. Both cache layers are dropped so every
    /// address reloads from storage; on error the old theme stays active.
    pub fn set_theme(&mut self, theme: &GlobeTheme) -> Result<(), TileError> {
        if theme.id == self.theme.id {
            return Ok(());
        }
        self.validate_and_adopt(theme)?;
        self.tiles.clear();
        self.retired.clear();
        debug!("theme switched to '{}'", theme.id);
        Ok(())
    }

    pub fn theme(&self) -> &GlobeTheme {
        &self.theme
    }

    /// Tile level for a radius under the active theme's limits.
    pub fn select_level(&self, radius: f64) -> u32 {
        level_for_radius(radius, self.theme.tile_size, self.effective_max_level)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Activate a level. Levels never mix, so a change retires the whole
    /// display hash.
    pub fn set_level(&mut self, level: u32) {
        if level == self.level {
            return;
        }
        debug!("tile level {} -> {}", self.level, level);
        self.retire_keys(self.tiles.keys().copied().collect());
        self.level = level;
    }

    /// Begin-of-frame: clear used marks and per-frame counters.
    pub fn reset_used_marks(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.used = false;
        }
        self.requested_this_frame = 0;
    }

    /// End-of-frame sweep. Tiles not touched since the last reset move to
    /// the retired store.
    pub fn evict_unused(&mut self) {
        let unused = self
            .tiles
            .iter()
            .filter(|(_, tile)| !tile.used)
            .map(|(key, _)| *key)
            .collect();
        self.retire_keys(unused);
    }

    // Row-major retirement keeps the store's eviction order reproducible.
    fn retire_keys(&mut self, mut keys: Vec<(u32, u32)>) {
        keys.sort_by_key(|&(column, row)| (row, column));
        for key in keys {
            if let Some(tile) = self.tiles.remove(&key) {
                self.retired.insert(tile);
            }
        }
    }

    /// Fetch the tile at (column, row) in the active level, marking it
    /// used. Rows clamp at the poles; columns wrap across the
    /// antimeridian. Missing tiles are requested from the fetcher and
    /// stand in as a scaled ancestor until the real data arrives.
    pub fn load_tile(&mut self, column: i32, row: i32) -> &Tile {
        let rows = level_rows(self.level) as i32;
        let cols = level_columns(self.level) as i32;
        let row = row.clamp(0, rows - 1) as u32;
        let column = column.rem_euclid(cols) as u32;
        let key = (column, row);
        let id = TileId::new(self.level, column, row);

        // A resident fallback resolves as soon as its file shows up.
        let refresh = matches!(self.tiles.get(&key), Some(t) if t.fallback)
            && self.storage.tile_exists(&self.theme, id);
        if refresh {
            match self.storage.load(&self.theme, id) {
                Ok(tile) => {
                    self.storage_loads += 1;
                    self.tiles.insert(key, tile);
                }
                Err(err) => debug!(
                    "tile {} not refreshable yet: {err}",
                    id.path(&self.theme.prefix, &self.theme.extension)
                ),
            }
        }

        let tile = match self.tiles.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let tile = match self.retired.take(id) {
                    Some(revived) => revived,
                    None if self.storage.tile_exists(&self.theme, id) => {
                        match self.storage.load(&self.theme, id) {
                            Ok(loaded) => {
                                self.storage_loads += 1;
                                loaded
                            }
                            Err(err) => {
                                warn!(
                                    "tile {} unreadable: {err}",
                                    id.path(&self.theme.prefix, &self.theme.extension)
                                );
                                build_fallback(
                                    self.storage.as_ref(),
                                    &self.theme,
                                    &mut self.retired,
                                    &mut self.storage_loads,
                                    id,
                                )
                            }
                        }
                    }
                    None => {
                        let relative = id.path(&self.theme.prefix, &self.theme.extension);
                        debug!("requesting download of {relative}");
                        self.fetcher.request(&relative);
                        self.requested_this_frame += 1;
                        build_fallback(
                            self.storage.as_ref(),
                            &self.theme,
                            &mut self.retired,
                            &mut self.storage_loads,
                            id,
                        )
                    }
                };
                entry.insert(tile)
            }
        };
        tile.used = true;
        tile
    }

    /// Tiles resident in the display hash.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, column: u32, row: u32) -> bool {
        self.tiles.contains_key(&(column, row))
    }

    /// Total storage loads since construction.
    pub fn storage_loads(&self) -> u64 {
        self.storage_loads
    }

    /// Download requests issued since the last `reset_used_marks`.
    pub fn requests_issued(&self) -> usize {
        self.requested_this_frame
    }

    /// Resident tiles still standing in for absent data.
    pub fn pending_tiles(&self) -> usize {
        self.tiles.values().filter(|t| t.fallback).count()
    }

    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    pub fn retired_bytes(&self) -> usize {
        self.retired.bytes()
    }

    #[doc(hidden)]
    pub fn set_retired_budget(&mut self, bytes: usize) {
        self.retired.budget = bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::storage::{NullFetcher, ProceduralTiles};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn tiny_theme(id: &str) -> GlobeTheme {
        let mut theme = GlobeTheme::new(id, id);
        theme.tile_size = 8;
        theme.max_tile_level = 3;
        theme
    }

    fn procedural_cache(theme: &GlobeTheme) -> TileCache {
        TileCache::new(Box::new(ProceduralTiles), Box::new(NullFetcher), theme).unwrap()
    }

    /// Storage whose tiles only exist up to a mutable level limit.
    struct PartialStorage {
        inner: ProceduralTiles,
        available: Rc<Cell<u32>>,
    }

    impl TileStorage for PartialStorage {
        fn tile_exists(&self, theme: &GlobeTheme, id: TileId) -> bool {
            id.level <= self.available.get() && self.inner.tile_exists(theme, id)
        }

        fn load(&self, theme: &GlobeTheme, id: TileId) -> Result<Tile, TileError> {
            self.inner.load(theme, id)
        }

        fn max_level(&self, theme: &GlobeTheme) -> u32 {
            theme.max_tile_level
        }
    }

    struct SpyFetcher {
        requests: Rc<RefCell<Vec<String>>>,
    }

    impl TileFetcher for SpyFetcher {
        fn request(&self, relative_path: &str) {
            self.requests.borrow_mut().push(relative_path.to_string());
        }
    }

    #[test]
    fn test_sweep_keeps_exactly_the_touched_tiles() {
        let theme = tiny_theme("sweep");
        let mut cache = procedural_cache(&theme);
        cache.set_level(1);
        cache.reset_used_marks();
        cache.load_tile(0, 0);
        cache.load_tile(1, 0);
        cache.load_tile(2, 1);
        cache.evict_unused();
        assert_eq!(cache.len(), 3);

        cache.reset_used_marks();
        cache.load_tile(0, 0);
        cache.load_tile(1, 0);
        cache.evict_unused();
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(0, 0));
        assert!(cache.contains(1, 0));
        assert!(!cache.contains(2, 1));
    }

    #[test]
    fn test_level_change_retires_and_revives_without_reload() {
        let theme = tiny_theme("levels");
        let mut cache = procedural_cache(&theme);
        cache.set_level(1);
        cache.load_tile(0, 0);
        let loads = cache.storage_loads();

        cache.set_level(2);
        assert_eq!(cache.len(), 0);
        cache.set_level(1);
        cache.load_tile(0, 0);
        // Came back from the retired store, not from storage.
        assert_eq!(cache.storage_loads(), loads);
    }

    #[test]
    fn test_theme_switch_drops_both_layers_and_reloads() {
        let theme_a = tiny_theme("first");
        let theme_b = tiny_theme("second");
        let mut cache = procedural_cache(&theme_a);
        cache.load_tile(0, 0);
        cache.set_level(1);
        let loads = cache.storage_loads();

        cache.set_theme(&theme_b).unwrap();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.retired_len(), 0);
        cache.load_tile(0, 0);
        assert!(cache.storage_loads() > loads);
    }

    #[test]
    fn test_addressing_wraps_columns_and_clamps_rows() {
        let theme = tiny_theme("wrap");
        let mut cache = procedural_cache(&theme);
        cache.set_level(1);
        // Level 1 has 2 rows and 4 columns.
        cache.load_tile(-1, 5);
        assert!(cache.contains(3, 1));
        cache.load_tile(4, -2);
        assert!(cache.contains(0, 0));
    }

    #[test]
    fn test_missing_base_tiles_fail_construction() {
        let err = TileCache::new(
            Box::new(crate::tile::storage::FsTileStorage::new("/nonexistent")),
            Box::new(NullFetcher),
            &tiny_theme("gone"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, TileError::MissingBaseTiles { .. }));
    }

    #[test]
    fn test_missing_tile_requests_download_and_scales_ancestor() {
        let theme = tiny_theme("partial");
        let available = Rc::new(Cell::new(0));
        let requests = Rc::new(RefCell::new(Vec::new()));
        let mut cache = TileCache::new(
            Box::new(PartialStorage {
                inner: ProceduralTiles,
                available: Rc::clone(&available),
            }),
            Box::new(SpyFetcher {
                requests: Rc::clone(&requests),
            }),
            &theme,
        )
        .unwrap();

        cache.set_level(2);
        cache.reset_used_marks();
        cache.load_tile(3, 1);
        assert_eq!(
            requests.borrow().as_slice(),
            ["partial/2/0001/0001_0003.jpg"]
        );
        assert_eq!(cache.requests_issued(), 1);
        assert_eq!(cache.pending_tiles(), 1);

        // Second touch in the same frame issues nothing new.
        cache.load_tile(3, 1);
        assert_eq!(requests.borrow().len(), 1);

        // Once the level becomes available the fallback resolves.
        available.set(2);
        cache.load_tile(3, 1);
        assert_eq!(cache.pending_tiles(), 0);
    }

    #[test]
    fn test_retired_store_evicts_oldest_first_within_budget() {
        let theme = tiny_theme("budget");
        let mut cache = procedural_cache(&theme);
        // One 8x8 color tile is 256 bytes; budget fits two.
        cache.set_retired_budget(512);
        cache.set_level(1);
        cache.reset_used_marks();
        cache.load_tile(0, 0);
        cache.load_tile(1, 0);
        cache.load_tile(2, 0);
        cache.evict_unused();

        // Retire everything in one sweep: row-major order 0, 1, 2.
        cache.reset_used_marks();
        cache.evict_unused();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.retired_len(), 2);
        assert!(cache.retired_bytes() <= 512);

        // The oldest retiree (column 0) was pushed out; 1 and 2 revive
        // without new loads, 0 needs storage again.
        let loads = cache.storage_loads();
        cache.load_tile(1, 0);
        cache.load_tile(2, 0);
        assert_eq!(cache.storage_loads(), loads);
        cache.load_tile(0, 0);
        assert_eq!(cache.storage_loads(), loads + 1);
    }
}
