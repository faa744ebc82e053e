//! Generic grid for spatial data, plus the faction ownership grid

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{CellCoord, FactionId};

const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 0), (0, -1)];

/// Generic 2D grid stored row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    /// Wrap row-major data; `None` when the length does not match
    pub fn from_cells(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Flat index of a coordinate, `None` when it falls off the board
    #[inline]
    pub fn index_of(&self, coord: CellCoord) -> Option<usize> {
        if self.contains(coord.x, coord.y) {
            Some(coord.y * self.width + coord.x)
        } else {
            None
        }
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> CellCoord {
        CellCoord::new(index % self.width, index / self.width)
    }

    #[inline]
    pub fn get(&self, coord: CellCoord) -> Option<&T> {
        self.index_of(coord).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, coord: CellCoord) -> Option<&mut T> {
        self.index_of(coord).map(move |i| &mut self.data[i])
    }

    #[inline]
    pub fn set(&mut self, coord: CellCoord, value: T) {
        if let Some(i) = self.index_of(coord) {
            self.data[i] = value;
        }
    }

    pub fn cells(&self) -> &[T] {
        &self.data
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (CellCoord::new(i % width, i / width), v))
    }

    /// In-bounds 4-neighborhood of a coordinate
    pub fn neighbors4(&self, coord: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let x = coord.x.checked_add_signed(dx)?;
            let y = coord.y.checked_add_signed(dy)?;
            self.contains(x, y).then_some(CellCoord::new(x, y))
        })
    }

    /// 4-neighborhood in shuffled order
    pub fn shuffled_neighbors4<R: Rng + ?Sized>(&self, coord: CellCoord, rng: &mut R) -> Vec<CellCoord> {
        let mut out: Vec<CellCoord> = self.neighbors4(coord).collect();
        out.shuffle(rng);
        out
    }

    pub fn random_coord<R: Rng + ?Sized>(&self, rng: &mut R) -> CellCoord {
        CellCoord::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height))
    }

    /// Copy into a grid of different dimensions, anchored top-left.
    /// New cells are default-filled; cells outside the new bounds are dropped.
    pub fn resized(&self, width: usize, height: usize) -> Self {
        let mut out = Self::new(width, height);
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                out.data[y * width + x] = self.data[y * self.width + x].clone();
            }
        }
        out
    }
}

/// One grid unit of territory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub owner: Option<FactionId>,
    /// Ticks continuously held by the current owner
    pub claim_age: u32,
    /// Ticks of capture immunity remaining
    pub overwrite_cooldown: u32,
    /// Owner before the most recent commit
    pub last_owner: Option<FactionId>,
}

impl Cell {
    pub fn owned_by(owner: FactionId) -> Self {
        Self {
            owner: Some(owner),
            last_owner: Some(owner),
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
    }

    /// Change owner outside the tick commit. Age restarts.
    #[inline]
    pub fn claim(&mut self, owner: Option<FactionId>) {
        self.owner = owner;
        self.claim_age = 0;
    }
}

/// The ownership grid every system mutates
pub type GridState = Grid<Cell>;

impl Grid<Cell> {
    #[inline]
    pub fn owner_at(&self, coord: CellCoord) -> Option<FactionId> {
        self.get(coord).and_then(|c| c.owner)
    }

    pub fn set_owner(&mut self, coord: CellCoord, owner: Option<FactionId>) {
        if let Some(cell) = self.get_mut(coord) {
            cell.claim(owner);
        }
    }

    pub fn owners(&self) -> Vec<Option<FactionId>> {
        self.data.iter().map(|c| c.owner).collect()
    }

    pub fn count_owned_by(&self, id: FactionId) -> usize {
        self.data.iter().filter(|c| c.owner == Some(id)).count()
    }

    pub fn empty_count(&self) -> usize {
        self.data.iter().filter(|c| c.is_empty()).count()
    }

    /// Step every cooldown toward zero
    pub fn decay_cooldowns(&mut self) {
        for cell in &mut self.data {
            cell.overwrite_cooldown = cell.overwrite_cooldown.saturating_sub(1);
        }
    }

    /// Install next-tick owners and update age bookkeeping.
    ///
    /// Age increments when the owner is unchanged, resets otherwise. Empty
    /// cells hold no claim and stay at zero.
    pub fn commit(&mut self, next: &[Option<FactionId>]) {
        debug_assert_eq!(next.len(), self.data.len());
        for (cell, &owner) in self.data.iter_mut().zip(next) {
            let unchanged = cell.owner == owner;
            cell.last_owner = cell.owner;
            cell.owner = owner;
            cell.claim_age = match owner {
                Some(_) if unchanged => cell.claim_age.saturating_add(1),
                _ => 0,
            };
        }
    }

    /// Clear up to `max` cells owned by `id`, sampling at most `probes`
    /// random coordinates. Returns the number cleared.
    pub fn clear_owned_by<R: Rng + ?Sized>(
        &mut self,
        id: FactionId,
        max: usize,
        probes: usize,
        rng: &mut R,
    ) -> usize {
        self.probe_replace(Some(id), None, max, probes, rng).0
    }

    /// Place `id` on up to `max` empty cells using at most `probes` samples
    pub fn place_on_empty<R: Rng + ?Sized>(
        &mut self,
        id: FactionId,
        max: usize,
        probes: usize,
        rng: &mut R,
    ) -> usize {
        self.probe_replace(None, Some(id), max, probes, rng).0
    }

    /// Random probing that swaps `from` for `to`.
    ///
    /// Returns `(replaced, probes_used)`. Exhausting the probe budget is not an
    /// error; the caller gets however many cells were found.
    pub fn probe_replace<R: Rng + ?Sized>(
        &mut self,
        from: Option<FactionId>,
        to: Option<FactionId>,
        max: usize,
        probes: usize,
        rng: &mut R,
    ) -> (usize, usize) {
        self.probe_replace_with(from, to, max, probes, rng, |_| {})
    }

    /// `probe_replace` with a hook run on every replaced cell
    pub fn probe_replace_with<R: Rng + ?Sized>(
        &mut self,
        from: Option<FactionId>,
        to: Option<FactionId>,
        max: usize,
        probes: usize,
        rng: &mut R,
        mut on_replace: impl FnMut(&mut Cell),
    ) -> (usize, usize) {
        let mut replaced = 0;
        let mut used = 0;
        if self.data.is_empty() {
            return (0, 0);
        }
        while replaced < max && used < probes {
            used += 1;
            let i = rng.gen_range(0..self.data.len());
            let cell = &mut self.data[i];
            if cell.owner == from {
                cell.claim(to);
                on_replace(cell);
                replaced += 1;
            }
        }
        (replaced, used)
    }

    /// Clear exactly `min(count, held)` cells of `id`, chosen uniformly
    /// among everything it holds
    pub fn shed_owned_by<R: Rng + ?Sized>(&mut self, id: FactionId, count: usize, rng: &mut R) -> usize {
        let held: Vec<usize> = self
            .data
            .iter()
            .enumerate()
            .filter(|(_, c)| c.owner == Some(id))
            .map(|(i, _)| i)
            .collect();
        let picked: Vec<usize> = held.choose_multiple(rng, count).copied().collect();
        for &i in &picked {
            self.data[i].claim(None);
        }
        picked.len()
    }

    /// Clear every cell owned by `id`
    pub fn clear_all_owned_by(&mut self, id: FactionId) -> usize {
        self.reassign(&[id], None)
    }

    /// Move every cell owned by one of `from` to `to`
    pub fn reassign(&mut self, from: &[FactionId], to: Option<FactionId>) -> usize {
        let mut moved = 0;
        for cell in &mut self.data {
            if let Some(owner) = cell.owner {
                if from.contains(&owner) {
                    cell.claim(to);
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Empty every cell whose owner fails `is_live`
    pub fn purge_dangling(&mut self, is_live: impl Fn(FactionId) -> bool) -> usize {
        let mut purged = 0;
        for cell in &mut self.data {
            if let Some(owner) = cell.owner {
                if !is_live(owner) {
                    cell.claim(None);
                    purged += 1;
                }
            }
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_index_roundtrip_and_bounds() {
        let grid: Grid<u8> = Grid::new(4, 3);
        let c = CellCoord::new(3, 2);
        let i = grid.index_of(c).unwrap();
        assert_eq!(i, 11);
        assert_eq!(grid.coord_of(i), c);
        assert!(grid.index_of(CellCoord::new(4, 0)).is_none());
        assert!(grid.index_of(CellCoord::new(0, 3)).is_none());
    }

    #[test]
    fn test_neighbors_at_corner() {
        let grid: Grid<u8> = Grid::new(3, 3);
        let mut n: Vec<_> = grid.neighbors4(CellCoord::new(0, 0)).collect();
        n.sort_by_key(|c| (c.x, c.y));
        assert_eq!(n, vec![CellCoord::new(0, 1), CellCoord::new(1, 0)]);
        assert_eq!(grid.neighbors4(CellCoord::new(1, 1)).count(), 4);
    }

    #[test]
    fn test_resized_pads_and_crops_top_left() {
        let mut grid: Grid<u8> = Grid::new(2, 2);
        grid.set(CellCoord::new(0, 0), 1);
        grid.set(CellCoord::new(1, 1), 2);

        let bigger = grid.resized(3, 3);
        assert_eq!(bigger.get(CellCoord::new(0, 0)), Some(&1));
        assert_eq!(bigger.get(CellCoord::new(1, 1)), Some(&2));
        assert_eq!(bigger.get(CellCoord::new(2, 2)), Some(&0));

        let smaller = grid.resized(1, 1);
        assert_eq!(smaller.cells(), &[1]);
    }

    #[test]
    fn test_commit_tracks_claim_age() {
        let a = FactionId(1);
        let b = FactionId(2);
        let mut grid = GridState::new(2, 1);

        grid.commit(&[Some(a), None]);
        assert_eq!(grid.cells()[0].claim_age, 0);

        grid.commit(&[Some(a), None]);
        grid.commit(&[Some(a), None]);
        assert_eq!(grid.cells()[0].claim_age, 2);
        assert_eq!(grid.cells()[0].last_owner, Some(a));

        grid.commit(&[Some(b), None]);
        assert_eq!(grid.cells()[0].claim_age, 0);
        assert_eq!(grid.cells()[0].last_owner, Some(a));
        assert_eq!(grid.cells()[1].claim_age, 0);
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut grid = GridState::new(1, 1);
        grid.cells_mut()[0].overwrite_cooldown = 2;
        grid.decay_cooldowns();
        assert_eq!(grid.cells()[0].overwrite_cooldown, 1);
        grid.decay_cooldowns();
        grid.decay_cooldowns();
        assert_eq!(grid.cells()[0].overwrite_cooldown, 0);
    }

    #[test]
    fn test_probe_budget_bounds_placement() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let id = FactionId(7);
        let mut grid = GridState::new(4, 4);
        for cell in grid.cells_mut() {
            cell.owner = Some(FactionId(1));
        }

        // Full board: nothing to place on, probes stop at the budget
        let (placed, used) = grid.probe_replace(None, Some(id), 30, 500, &mut rng);
        assert_eq!(placed, 0);
        assert_eq!(used, 500);
    }

    #[test]
    fn test_purge_dangling() {
        let mut grid = GridState::new(3, 1);
        grid.set_owner(CellCoord::new(0, 0), Some(FactionId(1)));
        grid.set_owner(CellCoord::new(1, 0), Some(FactionId(2)));
        let purged = grid.purge_dangling(|id| id == FactionId(1));
        assert_eq!(purged, 1);
        assert_eq!(grid.owner_at(CellCoord::new(1, 0)), None);
        assert_eq!(grid.owner_at(CellCoord::new(0, 0)), Some(FactionId(1)));
    }

    #[test]
    fn test_shed_owned_by_is_exact() {
        let a = FactionId(1);
        let b = FactionId(2);
        let mut grid = GridState::new(30, 30);
        for (i, cell) in grid.cells_mut().iter_mut().enumerate() {
            cell.owner = Some(if i % 3 == 0 { b } else { a });
        }
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        assert_eq!(grid.shed_owned_by(a, 250, &mut rng), 250);
        assert_eq!(grid.count_owned_by(a), 350);
        assert_eq!(grid.count_owned_by(b), 300);

        // Asking for more than is held clears what there is
        assert_eq!(grid.shed_owned_by(a, 10_000, &mut rng), 350);
        assert_eq!(grid.count_owned_by(a), 0);
        assert_eq!(grid.count_owned_by(b), 300);
    }
}
