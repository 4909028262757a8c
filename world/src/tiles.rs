//! Spatial index resolving which tile occupies a grid cell.

use std::collections::HashMap;

use hexwalk_core::{axial_to_world, AxialCoord, Tile, WorldPoint};

/// Mapping from axial coordinate to the tile registered there.
///
/// At most one tile occupies a coordinate; registering another tile at the
/// same coordinate replaces the previous one. Registration order is tracked so
/// that queries scanning several tiles resolve ties deterministically.
#[derive(Clone, Debug, Default)]
pub struct TileIndex {
    entries: HashMap<AxialCoord, Entry>,
    next_sequence: u64,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    tile: Tile,
    sequence: u64,
}

impl TileIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the tile at its coordinate, returning the tile it replaced.
    pub fn register(&mut self, tile: Tile) -> Option<Tile> {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.entries
            .insert(tile.coord(), Entry { tile, sequence })
            .map(|previous| previous.tile)
    }

    /// Removes the tile if it is still the one registered at its coordinate.
    ///
    /// Returns `false` when another tile has since taken the coordinate, in
    /// which case that newer tile is left untouched.
    pub fn unregister(&mut self, tile: &Tile) -> bool {
        let stored = self
            .entries
            .get(&tile.coord())
            .is_some_and(|entry| entry.tile.id() == tile.id());
        if stored {
            let _ = self.entries.remove(&tile.coord());
        }
        stored
    }

    /// Tile registered at the coordinate, if any.
    #[must_use]
    pub fn get(&self, coord: AxialCoord) -> Option<&Tile> {
        self.entries.get(&coord).map(|entry| &entry.tile)
    }

    /// Active tile whose centre lies closest to `point`.
    ///
    /// Only tiles strictly closer than `max_distance` qualify. Equal distances
    /// resolve to the tile registered first. `is_active` lets the caller skip
    /// tiles that are hidden or disabled.
    #[must_use]
    pub fn nearest<F>(
        &self,
        point: WorldPoint,
        max_distance: f32,
        size: f32,
        is_active: F,
    ) -> Option<&Tile>
    where
        F: Fn(&Tile) -> bool,
    {
        let mut best: Option<(f32, &Entry)> = None;
        for entry in self.entries.values() {
            if !is_active(&entry.tile) {
                continue;
            }

            let distance = point.distance(axial_to_world(entry.tile.coord(), size));
            if distance >= max_distance {
                continue;
            }

            let closer = match best {
                None => true,
                Some((best_distance, best_entry)) => {
                    distance < best_distance
                        || (distance == best_distance && entry.sequence < best_entry.sequence)
                }
            };
            if closer {
                best = Some((distance, entry));
            }
        }

        best.map(|(_, entry)| &entry.tile)
    }

    /// Earliest registered tile flagged as the spawn location.
    #[must_use]
    pub fn start_tile(&self) -> Option<&Tile> {
        self.entries
            .values()
            .filter(|entry| entry.tile.is_start())
            .min_by_key(|entry| entry.sequence)
            .map(|entry| &entry.tile)
    }

    /// Number of registered tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no tile is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every tile.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
