//! The block formation
//!
//! Owns the live blocks (dense arena, handle-addressed), drives the
//! synchronized sweep/drop movement, builds the row dependency chains that
//! make blocks invulnerable, and reports destruction/boundary contact
//! through the event queue.
//!
//! Dependency construction invariant: every row commits to a single chain
//! direction, so all dependency edges in a row point the same way and the
//! graph can never contain a cycle.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::{Block, BlockCategory, BlockId, ChainDir, GRID_CATEGORIES};
use super::state::GameEvent;
use crate::consts::*;
use crate::settings::Settings;

/// Result of a hit on a formation block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Block was invulnerable; the hit was absorbed with no damage
    Deflected,
    /// Block took damage and survives
    Damaged,
    /// Block was destroyed and removed
    Destroyed,
}

/// The sweeping block formation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    /// Live blocks; order is a rendering concern only
    pub blocks: Vec<Block>,
    /// Horizontal sweep direction, -1.0 or +1.0
    pub direction: f32,
    /// Horizontal speed per tick
    pub speed: f32,
    /// Guards against multiple drops within one edge-contact event
    pub just_dropped: bool,
    next_id: u32,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl Default for Formation {
    fn default() -> Self {
        Self::new()
    }
}

impl Formation {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            direction: 1.0,
            speed: BASE_SPEED,
            just_dropped: false,
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Allocate a stable block handle
    pub fn next_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Lay out a fresh rows x cols grid and build its dependency chains.
    /// Grid cells draw from the non-special categories only.
    pub fn build(&mut self, rows: usize, cols: usize, settings: &Settings, rng: &mut Pcg32) {
        self.blocks.clear();
        self.direction = 1.0;
        self.just_dropped = false;

        let total_w = cols as f32 * CELL_PITCH_X;
        let x0 = (FIELD_WIDTH - total_w) / 2.0 + CELL_PITCH_X / 2.0;

        for row in 0..rows {
            for col in 0..cols {
                let category = GRID_CATEGORIES[rng.random_range(0..GRID_CATEGORIES.len())];
                let pos = Vec2::new(
                    x0 + col as f32 * CELL_PITCH_X,
                    TOP_MARGIN + row as f32 * CELL_PITCH_Y,
                );
                let id = self.next_block_id();
                self.blocks.push(Block::new(id, category, pos));
            }
        }

        self.build_dependencies(settings, rng);
        log::debug!(
            "Built formation: {} blocks, {} dependency edges",
            self.blocks.len(),
            self.blocks.iter().map(|b| b.deps.len()).sum::<usize>()
        );
    }

    /// Link row chains. For each row with more than one block: pick a
    /// row-wide direction, sort along it, and let each block past the first
    /// adopt up to `max_chain_links` adjacent predecessors as dependencies.
    fn build_dependencies(&mut self, settings: &Settings, rng: &mut Pcg32) {
        // Group by row; BTreeMap keeps iteration deterministic
        let mut rows: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, b) in self.blocks.iter().enumerate() {
            rows.entry(b.pos.y.round() as i32).or_default().push(i);
        }

        for (_, mut idxs) in rows {
            if idxs.len() < 2 {
                continue;
            }
            let dir = if rng.random_bool(0.5) {
                ChainDir::LeftToRight
            } else {
                ChainDir::RightToLeft
            };
            idxs.sort_by(|&a, &b| {
                self.blocks[a]
                    .pos
                    .x
                    .partial_cmp(&self.blocks[b].pos.x)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            if dir == ChainDir::RightToLeft {
                idxs.reverse();
            }

            for walk in 1..idxs.len() {
                if !rng.random_bool(settings.dependency_chance) {
                    continue;
                }
                let links = rng.random_range(1..=settings.max_chain_links.max(1));
                let cur = idxs[walk];
                let mut anchor_x = self.blocks[cur].pos.x;
                let mut added = 0;

                // Walk back through predecessors on the chain side
                for back in (0..walk).rev() {
                    if added >= links {
                        break;
                    }
                    let cand = idxs[back];
                    if (anchor_x - self.blocks[cand].pos.x).abs() > settings.link_gap {
                        break;
                    }
                    // A block already committed to the opposite chain
                    // direction is not a legal anchor
                    if self.blocks[cand].chain_dir == Some(dir.opposite()) {
                        continue;
                    }
                    let cand_id = self.blocks[cand].id;
                    anchor_x = self.blocks[cand].pos.x;
                    self.blocks[cur].add_dependency(cand_id);
                    self.blocks[cur].chain_dir = Some(dir);
                    added += 1;
                }
            }
        }
    }

    /// One movement step: sweep, edge handling, drop, bottom loss.
    pub fn tick(&mut self) {
        if self.blocks.is_empty() {
            return;
        }

        let dx = self.speed * self.direction;
        for b in &mut self.blocks {
            b.pos.x += dx;
        }

        // Only the edge ahead of the sweep counts as contact
        let mut contact = false;
        for b in &self.blocks {
            let at_edge = if self.direction > 0.0 {
                b.right_edge() >= RIGHT_BOUND
            } else {
                b.left_edge() <= LEFT_BOUND
            };
            if at_edge {
                contact = true;
                self.events.push(GameEvent::EdgeContact { id: b.id });
            }
        }

        if contact {
            self.direction = -self.direction;
            if !self.just_dropped {
                for b in &mut self.blocks {
                    b.pos.y += DROP_AMOUNT;
                }
                self.just_dropped = true;
            }
        } else if !self.any_block_at_edge() {
            self.just_dropped = false;
        }

        // Bottom contact: each block reports independently, no batching
        let fallen: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| b.bottom_edge() >= BOTTOM_BOUND)
            .map(|b| b.id)
            .collect();
        for id in fallen {
            self.events.push(GameEvent::BlockReachedBottom { id });
            self.remove_block(id);
        }
    }

    fn any_block_at_edge(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| b.right_edge() >= RIGHT_BOUND || b.left_edge() <= LEFT_BOUND)
    }

    /// Apply one hit to a block. Invulnerable blocks deflect; destroyed
    /// blocks are removed and purged from every dependency set.
    pub fn hit(&mut self, id: BlockId) -> Option<HitOutcome> {
        let idx = self.blocks.iter().position(|b| b.id == id)?;
        if self.is_invulnerable(id) {
            self.events.push(GameEvent::HitDeflected { id });
            return Some(HitOutcome::Deflected);
        }
        let destroyed = self.blocks[idx].apply_hit();
        if destroyed {
            let category = self.blocks[idx].category;
            self.remove_block(id);
            self.events.push(GameEvent::BlockDestroyed { id, category });
            Some(HitOutcome::Destroyed)
        } else {
            Some(HitOutcome::Damaged)
        }
    }

    /// True iff the block has at least one living dependency referent
    pub fn is_invulnerable(&self, id: BlockId) -> bool {
        let Some(block) = self.block(id) else {
            return false;
        };
        block.deps.iter().any(|&d| self.contains(d))
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    pub fn is_cleared(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Single spawn entry point for encounter effects: one block, placed
    /// just beneath the lowest live block (top margin when empty).
    pub fn spawn_block(&mut self, category: BlockCategory, rng: &mut Pcg32) -> BlockId {
        let lowest = self
            .blocks
            .iter()
            .map(|b| b.pos.y)
            .fold(f32::NEG_INFINITY, f32::max);
        let y = if lowest.is_finite() {
            (lowest + CELL_PITCH_Y).min(BOTTOM_BOUND - 2.0 * BLOCK_HEIGHT)
        } else {
            TOP_MARGIN
        };
        let half_w = category.width() / 2.0;
        let x = rng.random_range((LEFT_BOUND + half_w)..(RIGHT_BOUND - half_w));

        let id = self.next_block_id();
        self.blocks.push(Block::new(id, category, Vec2::new(x, y)));
        log::info!("Spawned {:?} block at ({x:.0}, {y:.0})", category);
        id
    }

    /// Spawn a penalty batch: a spread row just above the formation
    pub fn spawn_batch(&mut self, category: BlockCategory, count: u32, rng: &mut Pcg32) {
        if count == 0 {
            return;
        }
        let highest = self
            .blocks
            .iter()
            .map(|b| b.pos.y)
            .fold(f32::INFINITY, f32::min);
        let y = if highest.is_finite() {
            (highest - CELL_PITCH_Y).max(BLOCK_HEIGHT)
        } else {
            TOP_MARGIN
        };

        let span = RIGHT_BOUND - LEFT_BOUND;
        let pitch = span / (count + 1) as f32;
        for i in 0..count {
            let jitter = rng.random_range(-8.0..8.0);
            let x = (LEFT_BOUND + pitch * (i + 1) as f32 + jitter)
                .clamp(LEFT_BOUND + category.width(), RIGHT_BOUND - category.width());
            let id = self.next_block_id();
            self.blocks.push(Block::new(id, category, Vec2::new(x, y)));
        }
    }

    /// Remove a block and purge its handle from every dependency set
    fn remove_block(&mut self, id: BlockId) {
        self.blocks.retain(|b| b.id != id);
        for b in &mut self.blocks {
            b.remove_dependency(id);
        }
    }

    /// Take this tick's events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
