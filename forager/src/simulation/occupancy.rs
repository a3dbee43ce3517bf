use glam::Vec2;
use shared::AntId;
use tracing::debug;

/// Per-bucket index of ant positions, rebuilt from pre-tick positions so
/// every ant sees the same peers regardless of processing order.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
    bucket_size: f32,
    ants_in_cell: Vec<Vec<(AntId, Vec2)>>,
    count: usize,
}

impl OccupancyGrid {
    pub fn new(width: f32, height: f32, bucket_size: f32) -> Self {
        let cols = (width / bucket_size).ceil().max(1.0) as usize;
        let rows = (height / bucket_size).ceil().max(1.0) as usize;
        Self {
            width,
            height,
            cols,
            rows,
            bucket_size,
            ants_in_cell: vec![Vec::new(); cols * rows],
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.ants_in_cell.iter_mut().for_each(|bucket| bucket.clear());
        self.count = 0;
    }

    #[inline(always)]
    fn bucket_of(&self, pos: Vec2) -> Option<(usize, usize)> {
        if !pos.is_finite() || pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        if pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        // Division may round up to the bucket count right at the far edge.
        let bx = ((pos.x / self.bucket_size) as usize).min(self.cols - 1);
        let by = ((pos.y / self.bucket_size) as usize).min(self.rows - 1);
        Some((bx, by))
    }

    /// Registers an ant at `pos`. Out-of-bounds positions are not registered.
    pub fn register(&mut self, id: AntId, pos: Vec2) -> bool {
        match self.bucket_of(pos) {
            Some((bx, by)) => {
                self.ants_in_cell[by * self.cols + bx].push((id, pos));
                self.count += 1;
                true
            }
            None => {
                debug!(ant = %id, x = pos.x, y = pos.y, "Ant outside occupancy grid, not registered");
                false
            }
        }
    }

    /// Positions of every other ant within `radius` of `pos`.
    pub fn neighbours(&self, pos: Vec2, radius: f32, exclude: AntId) -> Vec<Vec2> {
        let mut found = Vec::new();
        if !(pos.is_finite() && radius.is_finite() && radius > 0.0) {
            return found;
        }
        let reach = (radius / self.bucket_size).ceil() as isize;
        let bx = (pos.x / self.bucket_size).floor() as isize;
        let by = (pos.y / self.bucket_size).floor() as isize;
        let radius_sq = radius * radius;

        for y in (by - reach).max(0)..=(by + reach).min(self.rows as isize - 1) {
            for x in (bx - reach).max(0)..=(bx + reach).min(self.cols as isize - 1) {
                let bucket = &self.ants_in_cell[y as usize * self.cols + x as usize];
                found.extend(
                    bucket
                        .iter()
                        .filter(|(id, p)| *id != exclude && p.distance_squared(pos) <= radius_sq)
                        .map(|(_, p)| *p),
                );
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_neighbours_across_buckets() {
        let mut grid = OccupancyGrid::new(20.0, 20.0, 2.0);
        assert!(grid.register(AntId(1), Vec2::new(5.0, 5.0)));
        assert!(grid.register(AntId(2), Vec2::new(6.1, 5.0)));
        assert!(grid.register(AntId(3), Vec2::new(15.0, 15.0)));
        let peers = grid.neighbours(Vec2::new(5.0, 5.0), 1.5, AntId(1));
        assert_eq!(peers, vec![Vec2::new(6.1, 5.0)]);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn excludes_self_and_rejects_outside() {
        let mut grid = OccupancyGrid::new(10.0, 10.0, 1.0);
        grid.register(AntId(1), Vec2::new(1.0, 1.0));
        assert!(!grid.register(AntId(2), Vec2::new(-1.0, 1.0)));
        assert!(!grid.register(AntId(3), Vec2::new(10.0, 1.0)));
        assert!(grid.neighbours(Vec2::new(1.0, 1.0), 3.0, AntId(1)).is_empty());
        grid.clear();
        assert!(grid.is_empty());
    }

    #[test]
    fn far_edge_of_wide_grid_is_registered() {
        let width = 100_000.0f32;
        let mut grid = OccupancyGrid::new(width, 100.0, 100.0);
        let x = f32::from_bits(width.to_bits() - 1);
        assert!(grid.register(AntId(1), Vec2::new(x, 99.9)));
        assert_eq!(grid.neighbours(Vec2::new(x, 99.0), 5.0, AntId(2)).len(), 1);
    }

    #[test]
    fn query_near_edge_stays_in_grid() {
        let mut grid = OccupancyGrid::new(4.0, 4.0, 1.0);
        grid.register(AntId(1), Vec2::new(0.2, 0.2));
        let peers = grid.neighbours(Vec2::new(0.0, 0.0), 2.0, AntId(9));
        assert_eq!(peers.len(), 1);
    }
}
