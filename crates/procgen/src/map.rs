//! `map.bin`: the chunk grid the level is laid out from.
//!
//! Layout: `i32 width`, `i32 height`, then `width × height` three-byte chunk
//! records, row by row. Integers are host-endian.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use rand::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("map has invalid dimensions {width}x{height}")]
    BadDimensions { width: i32, height: i32 },
}

/// What a chunk places in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkKind {
    Empty = 0,
    Wall = 1,
    Rock = 2,
    Destruct = 3,
    Turret = 4,
    TankSpawn = 5,
    Trigger = 6,
    Mech = 7,
}

impl ChunkKind {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => ChunkKind::Empty,
            1 => ChunkKind::Wall,
            2 => ChunkKind::Rock,
            3 => ChunkKind::Destruct,
            4 => ChunkKind::Turret,
            5 => ChunkKind::TankSpawn,
            6 => ChunkKind::Trigger,
            7 => ChunkKind::Mech,
            _ => return None,
        })
    }
}

/// One grid chunk as stored on disk.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MapChunk {
    pub kind: u8,
    /// Vertical offset in whole units.
    pub height: i8,
    /// Yaw in quarter turns.
    pub rotation: u8,
}

impl MapChunk {
    pub fn new(kind: ChunkKind, height: i8, rotation: u8) -> Self {
        Self {
            kind: kind as u8,
            height,
            rotation,
        }
    }

    /// `None` for unknown kinds, which the level builder skips.
    pub fn chunk_kind(&self) -> Option<ChunkKind> {
        ChunkKind::from_raw(self.kind)
    }

    pub fn yaw(&self) -> f32 {
        f32::from(self.rotation % 4) * std::f32::consts::FRAC_PI_2
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    width: i32,
    height: i32,
    chunks: Vec<MapChunk>,
}

impl Map {
    pub fn new(width: i32, height: i32) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::BadDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            chunks: vec![MapChunk::default(); (width * height) as usize],
        })
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn chunks(&self) -> &[MapChunk] {
        &self.chunks
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        (x >= 0 && z >= 0 && x < self.width && z < self.height)
            .then(|| (z * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, z: i32) -> Option<MapChunk> {
        self.index(x, z).map(|i| self.chunks[i])
    }

    pub fn set(&mut self, x: i32, z: i32, chunk: MapChunk) -> bool {
        match self.index(x, z) {
            Some(i) => {
                self.chunks[i] = chunk;
                true
            }
            None => false,
        }
    }

    /// Every chunk with its grid coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, MapChunk)> + '_ {
        self.chunks.iter().enumerate().map(move |(i, c)| {
            let i = i as i32;
            (i % self.width, i / self.width, *c)
        })
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), MapError> {
        out.write_all(&self.width.to_ne_bytes())?;
        out.write_all(&self.height.to_ne_bytes())?;
        out.write_all(bytemuck::cast_slice(&self.chunks))?;
        out.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut input: R) -> Result<Self, MapError> {
        let mut word = [0u8; 4];
        input.read_exact(&mut word)?;
        let width = i32::from_ne_bytes(word);
        input.read_exact(&mut word)?;
        let height = i32::from_ne_bytes(word);

        let mut map = Self::new(width, height)?;
        input.read_exact(bytemuck::cast_slice_mut(&mut map.chunks))?;
        Ok(map)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MapError> {
        let path = path.as_ref();
        self.write_to(BufWriter::new(File::create(path)?))?;
        log::info!("saved {}x{} map to {}", self.width, self.height, path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let map = Self::read_from(BufReader::new(File::open(path)?))?;
        log::info!("loaded {}x{} map from {}", map.width, map.height, path.display());
        Ok(map)
    }

    /// Seeded default arena: a walled border, scattered rocks and cover,
    /// a few turrets, patrolling mechs and tank spawn points. The centre
    /// stays clear.
    pub fn generate(width: i32, height: i32, seed: u64) -> Result<Self, MapError> {
        let mut map = Self::new(width, height)?;
        let mut rng = StdRng::seed_from_u64(seed);

        for x in 0..width {
            for z in [0, height - 1] {
                map.set(x, z, MapChunk::new(ChunkKind::Wall, 0, 0));
            }
        }
        for z in 1..height - 1 {
            for x in [0, width - 1] {
                map.set(x, z, MapChunk::new(ChunkKind::Wall, 0, 1));
            }
        }

        let (cx, cz) = (width / 2, height / 2);
        let clear = 2;
        for z in 1..height - 1 {
            for x in 1..width - 1 {
                if (x - cx).abs() <= clear && (z - cz).abs() <= clear {
                    continue;
                }
                let roll: f32 = rng.gen();
                let kind = match roll {
                    r if r < 0.06 => ChunkKind::Rock,
                    r if r < 0.09 => ChunkKind::Destruct,
                    r if r < 0.11 => ChunkKind::Turret,
                    r if r < 0.14 => ChunkKind::TankSpawn,
                    r if r < 0.15 => ChunkKind::Mech,
                    _ => continue,
                };
                let chunk = MapChunk::new(kind, rng.gen_range(0..=1), rng.gen_range(0..4));
                map.set(x, z, chunk);
            }
        }
        map.set(cx + clear + 1, cz, MapChunk::new(ChunkKind::Trigger, 0, 0));
        Ok(map)
    }
}
