//! Procedural environments: lattice mazes and random box courses.
//!
//! A maze is designed on an `n × n` lattice. Even/even lattice points are
//! posts, odd/odd points are rooms, the rest are wall segments carved
//! away by a randomized depth-first search. A few extra wall cells are then
//! removed to open loops. The lattice is rendered into the high-res field:
//!
//! - two adjacent occupied lattice cells → a wall slab between them
//! - an interior occupied cell with no occupied 4-neighbour → a round pillar
//! - optionally, an occupied one-pixel rim around the whole field

use log::debug;
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::core::{GridLimits, to_index, to_real};
use crate::error::{LocalizationError, Result};

use super::occupancy::OccupancyMap;

/// Kind of environment produced per episode group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// Lattice maze
    #[default]
    Maze,
    /// Random axis-aligned boxes inside a rim
    Boxes,
}

/// Maze generation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MazeConfig {
    /// Lattice size (n × n)
    pub cells: usize,
    /// Extra wall cells removed after carving
    pub removed_cells: usize,
    /// Obstacle half-thickness as a fraction of the hall width
    pub obstacle_ratio: f64,
    /// Keep the lattice boundary intact when removing cells
    pub keep_boundary: bool,
    /// Occupy the outermost pixels of the field
    pub outer_rim: bool,
    /// Generator used by [`MazeGenerator::environment`]
    pub kind: MapKind,
    /// Box count for [`MapKind::Boxes`]
    pub boxes: usize,
    /// Box side range (meters)
    pub box_sides: (f64, f64),
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            cells: 11,
            removed_cells: 11,
            obstacle_ratio: 0.25,
            keep_boundary: true,
            outer_rim: true,
            kind: MapKind::Maze,
            boxes: 6,
            box_sides: (0.3, 0.8),
        }
    }
}

/// Output field description shared by the generators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    /// High-res rows
    pub rows: usize,
    /// High-res columns
    pub cols: usize,
    /// X extent
    pub x_limits: GridLimits,
    /// Y extent
    pub y_limits: GridLimits,
    /// Low-res rows
    pub grid_rows: usize,
    /// Low-res columns
    pub grid_cols: usize,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            rows: 224,
            cols: 224,
            x_limits: GridLimits::new(-3.0, 3.0),
            y_limits: GridLimits::new(-3.0, 3.0),
            grid_rows: 11,
            grid_cols: 11,
        }
    }
}

/// Seeded maze / box map generator.
pub struct MazeGenerator {
    config: MazeConfig,
    rng: SmallRng,
}

impl MazeGenerator {
    /// Create a generator. Seed 0 draws from entropy.
    pub fn new(config: MazeConfig, seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { config, rng }
    }

    /// Generator configuration
    pub fn config(&self) -> &MazeConfig {
        &self.config
    }

    /// Design a lattice; `true` marks an occupied lattice cell.
    pub fn design(&mut self) -> Result<Vec<bool>> {
        let n = self.config.cells;
        if n < 3 {
            return Err(LocalizationError::config("maze lattice needs at least 3 cells"));
        }

        let mut lattice = vec![true; n * n];
        let is_room = |i: usize, j: usize| i % 2 == 1 && j % 2 == 1 && i < n - 1 && j < n - 1;

        // Randomized DFS over rooms
        let mut visited = vec![false; n * n];
        let mut stack = vec![(1usize, 1usize)];
        visited[n + 1] = true;
        lattice[n + 1] = false;
        while let Some(&(i, j)) = stack.last() {
            let mut next: Vec<(usize, usize)> = [(0i64, 2i64), (0, -2), (2, 0), (-2, 0)]
                .iter()
                .filter_map(|&(di, dj)| {
                    let ni = i as i64 + di;
                    let nj = j as i64 + dj;
                    if ni < 0 || nj < 0 {
                        return None;
                    }
                    let (ni, nj) = (ni as usize, nj as usize);
                    (ni < n && nj < n && is_room(ni, nj) && !visited[ni * n + nj])
                        .then_some((ni, nj))
                })
                .collect();
            if next.is_empty() {
                stack.pop();
                continue;
            }
            next.shuffle(&mut self.rng);
            let (ni, nj) = next[0];
            visited[ni * n + nj] = true;
            lattice[ni * n + nj] = false;
            lattice[(i + ni) / 2 * n + (j + nj) / 2] = false;
            stack.push((ni, nj));
        }

        // Open loops by removing extra occupied cells
        let boundary = |i: usize, j: usize| i == 0 || j == 0 || i == n - 1 || j == n - 1;
        let candidates: Vec<usize> = (0..n * n)
            .filter(|&k| lattice[k] && !(self.config.keep_boundary && boundary(k / n, k % n)))
            .collect();
        for &k in candidates.choose_multiple(&mut self.rng, self.config.removed_cells) {
            lattice[k] = false;
        }

        Ok(lattice)
    }

    /// Render a designed lattice into an occupancy map.
    pub fn render(&self, lattice: &[bool], spec: FieldSpec) -> Result<OccupancyMap> {
        let n = self.config.cells;
        if lattice.len() != n * n {
            return Err(LocalizationError::config("lattice size does not match maze config"));
        }
        let mut field = Field::new(spec);
        let hall = spec.x_limits.span() / n as f64;
        let rad = self.config.obstacle_ratio * hall;
        let occupied = |i: usize, j: usize| lattice[i * n + j];

        let mut walls = 0;
        let mut pillars = 0;
        for i in 0..n {
            for j in 0..n {
                if !occupied(i, j) {
                    continue;
                }
                if i + 1 < n && occupied(i + 1, j) {
                    field.wall((i, j), (i + 1, j), n, rad);
                    walls += 1;
                }
                if j + 1 < n && occupied(i, j + 1) {
                    field.wall((i, j), (i, j + 1), n, rad);
                    walls += 1;
                }
                let interior = i > 0 && j > 0 && i < n - 1 && j < n - 1;
                if interior
                    && !occupied(i - 1, j)
                    && !occupied(i + 1, j)
                    && !occupied(i, j - 1)
                    && !occupied(i, j + 1)
                {
                    field.pillar((i, j), n, rad);
                    pillars += 1;
                }
            }
        }
        if self.config.outer_rim {
            field.outer_rim();
        }
        debug!("[Maze] rendered {} walls, {} pillars", walls, pillars);
        field.finish()
    }

    /// Design and render a new maze.
    pub fn generate(&mut self, spec: FieldSpec) -> Result<OccupancyMap> {
        let lattice = self.design()?;
        self.render(&lattice, spec)
    }

    /// New map of the configured kind.
    pub fn environment(&mut self, spec: FieldSpec) -> Result<OccupancyMap> {
        match self.config.kind {
            MapKind::Maze => self.generate(spec),
            MapKind::Boxes => {
                let (lo, hi) = self.config.box_sides;
                self.random_boxes(spec, self.config.boxes, lo, hi)
            }
        }
    }

    /// Scatter `count` axis-aligned boxes inside an outer rim.
    ///
    /// Box sides are drawn uniformly from `[min_side, max_side]` meters.
    pub fn random_boxes(
        &mut self,
        spec: FieldSpec,
        count: usize,
        min_side: f64,
        max_side: f64,
    ) -> Result<OccupancyMap> {
        if !(min_side > 0.0 && max_side >= min_side) {
            return Err(LocalizationError::config("invalid box side range"));
        }
        let mut field = Field::new(spec);
        for _ in 0..count {
            let w = self.rng.gen_range(min_side..=max_side);
            let h = self.rng.gen_range(min_side..=max_side);
            let x = self
                .rng
                .gen_range(spec.x_limits.lo..(spec.x_limits.hi - w).max(spec.x_limits.lo + 1e-9));
            let y = self
                .rng
                .gen_range(spec.y_limits.lo..(spec.y_limits.hi - h).max(spec.y_limits.lo + 1e-9));
            field.fill_rect(x, y, x + w, y + h);
        }
        field.outer_rim();
        field.finish()
    }
}

/// Mutable high-res raster used while rendering.
struct Field {
    spec: FieldSpec,
    cells: Vec<f32>,
}

impl Field {
    fn new(spec: FieldSpec) -> Self {
        Self {
            spec,
            cells: vec![0.0; spec.rows * spec.cols],
        }
    }

    fn lattice_point(&self, (i, j): (usize, usize), n: usize) -> (f64, f64) {
        (
            to_real(i as i64, self.spec.x_limits, n),
            to_real(j as i64, self.spec.y_limits, n),
        )
    }

    fn wall(&mut self, a: (usize, usize), b: (usize, usize), n: usize, rad: f64) {
        let (ax, ay) = self.lattice_point(a, n);
        let (bx, by) = self.lattice_point(b, n);
        self.fill_rect(
            ax.min(bx) - rad,
            ay.min(by) - rad,
            ax.max(bx) + rad,
            ay.max(by) + rad,
        );
    }

    fn pillar(&mut self, a: (usize, usize), n: usize, rad: f64) {
        let (x, y) = self.lattice_point(a, n);
        let (r0, c0) = self.pixel(x - rad, y - rad);
        let (r1, c1) = self.pixel(x + rad, y + rad);
        for r in r0..=r1 {
            for c in c0..=c1 {
                let px = to_real(r as i64, self.spec.x_limits, self.spec.rows);
                let py = to_real(c as i64, self.spec.y_limits, self.spec.cols);
                if ((px - x).powi(2) + (py - y).powi(2)).sqrt() <= rad {
                    self.cells[r * self.spec.cols + c] = 1.0;
                }
            }
        }
    }

    /// Fill pixels whose index lies in `[pixel(lo), pixel(hi))`.
    fn fill_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64) {
        let (r0, c0) = self.pixel(x0, y0);
        let (r1, c1) = self.pixel(x1, y1);
        for r in r0..r1.max(r0 + 1) {
            for c in c0..c1.max(c0 + 1) {
                self.cells[r * self.spec.cols + c] = 1.0;
            }
        }
    }

    fn outer_rim(&mut self) {
        let (rows, cols) = (self.spec.rows, self.spec.cols);
        for c in 0..cols {
            self.cells[c] = 1.0;
            self.cells[(rows - 1) * cols + c] = 1.0;
        }
        for r in 0..rows {
            self.cells[r * cols] = 1.0;
            self.cells[r * cols + cols - 1] = 1.0;
        }
    }

    /// Pixel index clamped into the field
    fn pixel(&self, x: f64, y: f64) -> (usize, usize) {
        let r = to_index(x, self.spec.rows, self.spec.x_limits).clamp(0, self.spec.rows as i64 - 1);
        let c = to_index(y, self.spec.cols, self.spec.y_limits).clamp(0, self.spec.cols as i64 - 1);
        (r as usize, c as usize)
    }

    fn finish(self) -> Result<OccupancyMap> {
        let s = self.spec;
        OccupancyMap::from_cells(
            s.rows,
            s.cols,
            s.x_limits,
            s.y_limits,
            self.cells,
            s.grid_rows,
            s.grid_cols,
        )
    }
}
