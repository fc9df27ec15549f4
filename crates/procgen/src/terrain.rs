//! Arena terrain: a procedural source mesh and the heightmap rasterised from it.
//!
//! **Seed-based determinism:** noise seeds are derived only from the arena
//! seed, so the same seed always produces the same ground.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};

/// Barycentric weights down to this value still count as inside a triangle.
const INSIDE_EPSILON: f32 = 1e-5;
/// Triangles whose XZ area term is smaller than this are skipped.
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Derive a deterministic u32 noise seed from a world seed and an offset.
#[inline]
fn deterministic_noise_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Indexed triangle soup the heightmap is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMesh {
    pub positions: Vec<Vec3>,
    /// Three indices per triangle.
    pub indices: Vec<u32>,
}

impl SourceMesh {
    /// Two-triangle square of side `size` centred on the origin at height `y`.
    pub fn flat_quad(size: f32, y: f32) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![
                Vec3::new(-h, y, -h),
                Vec3::new(h, y, -h),
                Vec3::new(h, y, h),
                Vec3::new(-h, y, h),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles with every index in range.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

/// Configuration for the generated arena ground.
#[derive(Debug, Clone)]
pub struct ArenaMeshConfig {
    /// Side length in world units.
    pub size: f32,
    /// Number of vertices per side.
    pub resolution: u32,
    /// Maximum height of terrain.
    pub height_scale: f32,
    /// Noise frequency (lower = smoother).
    pub frequency: f64,
    /// Number of octaves for fractal noise.
    pub octaves: u32,
    /// Lacunarity (frequency multiplier per octave).
    pub lacunarity: f64,
    /// Persistence (amplitude multiplier per octave).
    pub persistence: f64,
    pub seed: u64,
    /// Ground inside this radius of the centre is flattened to the rim height
    /// so spawns start on level ground.
    pub flat_radius: f32,
}

impl Default for ArenaMeshConfig {
    fn default() -> Self {
        Self {
            size: 256.0,
            resolution: 65,
            height_scale: 12.0,
            frequency: 0.015,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 0,
            flat_radius: 24.0,
        }
    }
}

/// Rolling ground centred on the origin.
pub fn generate_arena_mesh(config: &ArenaMeshConfig) -> SourceMesh {
    let perlin = Perlin::new(deterministic_noise_seed(config.seed, 0));
    let res = config.resolution.max(2) as usize;
    let step = config.size / (res - 1) as f32;
    let half = config.size * 0.5;

    let mut positions = Vec::with_capacity(res * res);
    for iz in 0..res {
        for ix in 0..res {
            let x = ix as f32 * step - half;
            let z = iz as f32 * step - half;
            let mut y = fractal_noise(&perlin, x as f64, z as f64, config) as f32
                * config.height_scale;
            let r = Vec2::new(x, z).length();
            if r < config.flat_radius {
                y = 0.0;
            } else if r < config.flat_radius * 1.5 {
                // Blend out of the flat centre.
                let t = (r - config.flat_radius) / (config.flat_radius * 0.5);
                y *= t;
            }
            positions.push(Vec3::new(x, y, z));
        }
    }

    let mut indices = Vec::with_capacity((res - 1) * (res - 1) * 6);
    for iz in 0..res - 1 {
        for ix in 0..res - 1 {
            let i0 = (iz * res + ix) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + res as u32;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    log::debug!(
        "arena mesh: {} vertices, {} triangles (seed {})",
        positions.len(),
        indices.len() / 3,
        config.seed
    );
    SourceMesh { positions, indices }
}

fn fractal_noise(perlin: &Perlin, x: f64, z: f64, config: &ArenaMeshConfig) -> f64 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.frequency;
    let mut max_value = 0.0;

    for _ in 0..config.octaves.max(1) {
        value += perlin.get([x * frequency, z * frequency]) * amplitude;
        max_value += amplitude;
        amplitude *= config.persistence;
        frequency *= config.lacunarity;
    }

    // Normalize to 0-1 range
    (value / max_value + 1.0) * 0.5
}

/// World-space, axis-aligned grid of top-surface elevations.
///
/// Samples sit on grid vertices: sample `(ix, iz)` is at
/// `(min_x + ix·dx, min_z + iz·dz)`.
#[derive(Debug, Clone)]
pub struct Heightmap {
    min_x: f32,
    min_z: f32,
    dx: f32,
    dz: f32,
    cols: usize,
    rows: usize,
    heights: Vec<f32>,
}

impl Heightmap {
    /// Allocate a `cols × rows` grid spanning `size` (x, z) from `min`.
    /// Heights start at −∞ until [`Heightmap::build`] runs.
    pub fn new(min: Vec2, size: Vec2, cols: usize, rows: usize) -> Self {
        let cols = cols.max(2);
        let rows = rows.max(2);
        Self {
            min_x: min.x,
            min_z: min.y,
            dx: size.x / (cols - 1) as f32,
            dz: size.y / (rows - 1) as f32,
            cols,
            rows,
            heights: vec![f32::NEG_INFINITY; cols * rows],
        }
    }

    /// Allocate and build in one go.
    pub fn from_mesh(mesh: &SourceMesh, min: Vec2, size: Vec2, cols: usize, rows: usize) -> Self {
        let mut map = Self::new(min, size, cols, rows);
        map.build(mesh);
        map
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_z)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(
            self.dx * (self.cols - 1) as f32,
            self.dz * (self.rows - 1) as f32,
        )
    }

    pub fn cell_size(&self) -> Vec2 {
        Vec2::new(self.dx, self.dz)
    }

    /// Stored value of one sample.
    pub fn sample(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz.min(self.rows - 1) * self.cols + ix.min(self.cols - 1)]
    }

    /// World position of one sample.
    pub fn sample_position(&self, ix: usize, iz: usize) -> Vec2 {
        Vec2::new(
            self.min_x + ix as f32 * self.dx,
            self.min_z + iz as f32 * self.dz,
        )
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Rasterise every triangle, keeping the highest surface per sample, then
    /// fill samples no triangle covered from their nearest covered neighbour.
    pub fn build(&mut self, mesh: &SourceMesh) {
        self.heights.fill(f32::NEG_INFINITY);
        let mut skipped = 0usize;
        for tri in mesh.triangles() {
            if !self.raster_triangle(tri) {
                skipped += 1;
            }
        }
        let filled = self.fill_uncovered();
        log::info!(
            "heightmap {}x{} built from {} triangles ({} degenerate, {} samples filled)",
            self.cols,
            self.rows,
            mesh.triangle_count(),
            skipped,
            filled
        );
    }

    /// Returns false for degenerate triangles.
    fn raster_triangle(&mut self, [a, b, c]: [Vec3; 3]) -> bool {
        let den = (b.z - c.z) * (a.x - c.x) + (c.x - b.x) * (a.z - c.z);
        if den.abs() < DEGENERATE_EPSILON {
            return false;
        }

        let lo_x = a.x.min(b.x).min(c.x);
        let hi_x = a.x.max(b.x).max(c.x);
        let lo_z = a.z.min(b.z).min(c.z);
        let hi_z = a.z.max(b.z).max(c.z);

        let Some((ix0, ix1)) = index_span(lo_x, hi_x, self.min_x, self.dx, self.cols) else {
            return true;
        };
        let Some((iz0, iz1)) = index_span(lo_z, hi_z, self.min_z, self.dz, self.rows) else {
            return true;
        };

        for iz in iz0..=iz1 {
            for ix in ix0..=ix1 {
                let p = self.sample_position(ix, iz);
                let w0 = ((b.z - c.z) * (p.x - c.x) + (c.x - b.x) * (p.y - c.z)) / den;
                let w1 = ((c.z - a.z) * (p.x - c.x) + (a.x - c.x) * (p.y - c.z)) / den;
                let w2 = 1.0 - w0 - w1;
                if w0 < -INSIDE_EPSILON || w1 < -INSIDE_EPSILON || w2 < -INSIDE_EPSILON {
                    continue;
                }
                let y = w0 * a.y + w1 * b.y + w2 * c.y;
                let slot = &mut self.heights[iz * self.cols + ix];
                if y > *slot {
                    *slot = y;
                }
            }
        }
        true
    }

    /// Breadth-first fill from covered samples. With nothing covered the map
    /// is flat at zero. Returns the number of samples written.
    fn fill_uncovered(&mut self) -> usize {
        let mut queue: VecDeque<usize> = self
            .heights
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_finite())
            .map(|(i, _)| i)
            .collect();

        if queue.is_empty() {
            let n = self.heights.len();
            self.heights.fill(0.0);
            return n;
        }

        let mut filled = 0;
        while let Some(i) = queue.pop_front() {
            let (ix, iz) = (i % self.cols, i / self.cols);
            let value = self.heights[i];
            let neighbours = [
                (ix > 0).then(|| i - 1),
                (ix + 1 < self.cols).then(|| i + 1),
                (iz > 0).then(|| i - self.cols),
                (iz + 1 < self.rows).then(|| i + self.cols),
            ];
            for n in neighbours.into_iter().flatten() {
                if !self.heights[n].is_finite() {
                    self.heights[n] = value;
                    filled += 1;
                    queue.push_back(n);
                }
            }
        }
        filled
    }

    /// Bilinear height at a world position. Positions outside the grid clamp
    /// to the edge.
    pub fn height_at(&self, wx: f32, wz: f32) -> f32 {
        let gx = ((wx - self.min_x) / self.dx).clamp(0.0, (self.cols - 1) as f32);
        let gz = ((wz - self.min_z) / self.dz).clamp(0.0, (self.rows - 1) as f32);
        // NaN input clamps to NaN; treat it as the grid origin.
        let gx = if gx.is_nan() { 0.0 } else { gx };
        let gz = if gz.is_nan() { 0.0 } else { gz };

        let x0 = (gx.floor() as usize).min(self.cols - 2);
        let z0 = (gz.floor() as usize).min(self.rows - 2);
        let fx = gx - x0 as f32;
        let fz = gz - z0 as f32;

        let h00 = self.heights[z0 * self.cols + x0];
        let h10 = self.heights[z0 * self.cols + x0 + 1];
        let h01 = self.heights[(z0 + 1) * self.cols + x0];
        let h11 = self.heights[(z0 + 1) * self.cols + x0 + 1];

        let near = h00 + (h10 - h00) * fx;
        let far = h01 + (h11 - h01) * fx;
        near + (far - near) * fz
    }

    pub fn contains(&self, wx: f32, wz: f32) -> bool {
        let size = self.size();
        wx >= self.min_x
            && wz >= self.min_z
            && wx <= self.min_x + size.x
            && wz <= self.min_z + size.y
    }
}

/// Inclusive range of sample indices whose coordinate lies in `[lo, hi]`.
fn index_span(lo: f32, hi: f32, origin: f32, step: f32, count: usize) -> Option<(usize, usize)> {
    let first = ((lo - origin) / step).ceil().max(0.0);
    let last = ((hi - origin) / step).floor().min((count - 1) as f32);
    (first <= last).then(|| (first as usize, last as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(mesh: &SourceMesh, n: usize) -> Heightmap {
        Heightmap::from_mesh(mesh, Vec2::splat(-50.0), Vec2::splat(100.0), n, n)
    }

    #[test]
    fn flat_quad_gives_flat_map() {
        let map = arena(&SourceMesh::flat_quad(100.0, 3.0), 11);
        assert!(map.heights().iter().all(|h| (*h - 3.0).abs() < 1e-5));
        assert!((map.height_at(12.3, -40.1) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn sampling_at_a_vertex_returns_stored_value() {
        let map = arena(&generate_arena_mesh(&ArenaMeshConfig {
            size: 100.0,
            resolution: 21,
            seed: 7,
            ..Default::default()
        }), 33);
        for (ix, iz) in [(0, 0), (5, 17), (32, 32), (16, 3)] {
            let p = map.sample_position(ix, iz);
            assert!((map.height_at(p.x, p.y) - map.sample(ix, iz)).abs() < 1e-4);
        }
    }

    #[test]
    fn sampling_is_continuous_across_cells() {
        let map = arena(&generate_arena_mesh(&ArenaMeshConfig {
            size: 100.0,
            resolution: 17,
            seed: 3,
            flat_radius: 0.0,
            ..Default::default()
        }), 9);
        let edge = map.sample_position(4, 4).x;
        for z in [-30.0, 1.5, 22.0] {
            let left = map.height_at(edge - 1e-4, z);
            let right = map.height_at(edge + 1e-4, z);
            assert!((left - right).abs() < 1e-2);
        }
    }

    #[test]
    fn highest_surface_wins() {
        let mut mesh = SourceMesh::flat_quad(100.0, 0.0);
        let upper = SourceMesh::flat_quad(100.0, 5.0);
        let base = mesh.positions.len() as u32;
        mesh.positions.extend(upper.positions);
        mesh.indices.extend(upper.indices.iter().map(|i| i + base));
        let map = arena(&mesh, 5);
        assert!((map.height_at(0.0, 0.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mesh = SourceMesh {
            positions: vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 100.0, 0.0)],
            indices: vec![0, 1, 2],
        };
        let map = arena(&mesh, 5);
        assert!(map.heights().iter().all(|h| *h == 0.0));
    }

    #[test]
    fn uncovered_samples_take_nearest_covered_value() {
        // Covers only the x < 0 half.
        let mesh = SourceMesh {
            positions: vec![
                Vec3::new(-50.0, 2.0, -50.0),
                Vec3::new(0.0, 2.0, -50.0),
                Vec3::new(0.0, 2.0, 50.0),
                Vec3::new(-50.0, 2.0, 50.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        let map = arena(&mesh, 11);
        assert!(map.heights().iter().all(|h| h.is_finite()));
        assert!((map.height_at(45.0, 10.0) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn queries_outside_clamp_to_edge() {
        let map = arena(&SourceMesh::flat_quad(100.0, 1.0), 5);
        assert!((map.height_at(-1.0e4, 1.0e4) - 1.0).abs() < 1e-5);
        assert!(map.height_at(f32::NAN, 0.0).is_finite());
    }

    #[test]
    fn arena_mesh_is_deterministic() {
        let config = ArenaMeshConfig {
            resolution: 9,
            seed: 98765,
            ..Default::default()
        };
        assert_eq!(generate_arena_mesh(&config), generate_arena_mesh(&config));
        let other = generate_arena_mesh(&ArenaMeshConfig {
            seed: 11111,
            ..config.clone()
        });
        assert_ne!(generate_arena_mesh(&config).positions, other.positions);
        assert_eq!(other.triangle_count(), 8 * 8 * 2);
    }
}
