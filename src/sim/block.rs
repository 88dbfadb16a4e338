//! Destructible blocks
//!
//! A block is a grid cell of the formation: a category (which fixes its hit
//! count and size), a position, and a set of dependency handles. While any
//! dependency referent is alive the block absorbs hits without damage; the
//! aliveness lookup needs the whole arena, so that check lives on
//! `Formation` and blocks only store the handles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Stable handle to a block in a formation's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Block categories, ordered by toughness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockCategory {
    S,
    M,
    L,
    /// Special: never part of grid setup, injected by encounter effects only
    Xxl,
}

/// Categories eligible for grid setup
pub const GRID_CATEGORIES: [BlockCategory; 3] =
    [BlockCategory::S, BlockCategory::M, BlockCategory::L];

impl BlockCategory {
    /// Initial hit count
    pub fn hits(&self) -> u32 {
        match self {
            BlockCategory::S => 1,
            BlockCategory::M => 2,
            BlockCategory::L => 3,
            BlockCategory::Xxl => 10,
        }
    }

    /// Relative size value, used for layout width and scoring
    pub fn size(&self) -> u32 {
        match self {
            BlockCategory::S => 1,
            BlockCategory::M => 2,
            BlockCategory::L => 3,
            BlockCategory::Xxl => 4,
        }
    }

    /// Score awarded when a block of this category is destroyed
    pub fn score(&self) -> u64 {
        self.size() as u64 * SCORE_PER_SIZE
    }

    /// Rendered width
    pub fn width(&self) -> f32 {
        BLOCK_WIDTH_BASE + self.size() as f32 * BLOCK_WIDTH_PER_SIZE
    }
}

/// Direction a row's dependency chain points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainDir {
    LeftToRight,
    RightToLeft,
}

impl ChainDir {
    pub fn opposite(&self) -> Self {
        match self {
            ChainDir::LeftToRight => ChainDir::RightToLeft,
            ChainDir::RightToLeft => ChainDir::LeftToRight,
        }
    }
}

/// A destructible block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub category: BlockCategory,
    pub hits_remaining: u32,
    /// Center position; mutated only by the formation's movement step
    pub pos: Vec2,
    /// Dependency handles (set semantics); referents shield this block
    pub deps: Vec<BlockId>,
    /// Chain direction this block committed to during dependency build
    pub chain_dir: Option<ChainDir>,
}

impl Block {
    pub fn new(id: BlockId, category: BlockCategory, pos: Vec2) -> Self {
        Self {
            id,
            category,
            hits_remaining: category.hits(),
            pos,
            deps: Vec::new(),
            chain_dir: None,
        }
    }

    /// Half extents for boundary checks
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.category.width() / 2.0
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        BLOCK_HEIGHT / 2.0
    }

    /// Horizontal edges
    #[inline]
    pub fn left_edge(&self) -> f32 {
        self.pos.x - self.half_width()
    }

    #[inline]
    pub fn right_edge(&self) -> f32 {
        self.pos.x + self.half_width()
    }

    /// Lower edge (y grows downward)
    #[inline]
    pub fn bottom_edge(&self) -> f32 {
        self.pos.y + self.half_height()
    }

    /// Add a dependency handle (idempotent)
    pub fn add_dependency(&mut self, other: BlockId) {
        if other != self.id && !self.deps.contains(&other) {
            self.deps.push(other);
        }
    }

    /// Remove a dependency handle (idempotent)
    pub fn remove_dependency(&mut self, other: BlockId) {
        self.deps.retain(|&d| d != other);
    }

    pub fn has_dependency(&self, other: BlockId) -> bool {
        self.deps.contains(&other)
    }

    /// Apply one hit. Returns true if the block is destroyed.
    ///
    /// Callers must check invulnerability first; see `Formation::hit`.
    pub fn apply_hit(&mut self) -> bool {
        self.hits_remaining = self.hits_remaining.saturating_sub(1);
        self.hits_remaining == 0
    }

    pub fn is_destroyed(&self) -> bool {
        self.hits_remaining == 0
    }
}
