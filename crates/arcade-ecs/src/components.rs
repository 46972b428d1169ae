//! Component records attached to spawned entities

use arcade_core::{GridVec, TextureId, Tint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grid position of an entity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub position: GridVec,
}

/// Tile-to-tile movement state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Direction currently being travelled
    pub current_direction: GridVec,
    /// Direction requested by input or AI, applied at the next tile boundary
    pub desired_direction: GridVec,
    /// Movement speed in tiles per second
    pub speed: f32,
    /// Progress towards the next tile in `[0, 1)`
    pub progress: f32,
}

impl Movement {
    pub const DEFAULT_SPEED: f32 = 1.0;
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            current_direction: GridVec::ZERO,
            desired_direction: GridVec::ZERO,
            speed: Self::DEFAULT_SPEED,
            progress: 0.0,
        }
    }
}

/// A single static sprite
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub sprite: TextureId,
    pub tint: Tint,
}

/// A sprite that cycles through one of several named animation clips
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimatedSprite {
    /// Available clips keyed by name
    pub available_animations: BTreeMap<String, TextureId>,
    /// Name of the active clip, `None` when no clips are declared
    pub active_clip: Option<String>,
    /// Texture of the active clip
    pub active_animation: TextureId,
    pub tint: Tint,
    /// Seconds elapsed in the active clip
    pub animation_timer: f32,
    /// Playback rate in frames per second
    pub fps: f32,
}

impl AnimatedSprite {
    pub const DEFAULT_FPS: f32 = 24.0;

    /// Switch to another declared clip, restarting its clock.
    /// Returns false and leaves the sprite untouched if the clip is unknown.
    pub fn play(&mut self, clip: &str) -> bool {
        let Some(texture) = self.available_animations.get(clip) else {
            return false;
        };
        self.active_animation = *texture;
        self.active_clip = Some(clip.to_string());
        self.animation_timer = 0.0;
        true
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.available_animations.keys().map(|s| s.as_str())
    }
}

impl Default for AnimatedSprite {
    fn default() -> Self {
        Self {
            available_animations: BTreeMap::new(),
            active_clip: None,
            active_animation: TextureId::default(),
            tint: Tint::WHITE,
            animation_timer: 0.0,
            fps: Self::DEFAULT_FPS,
        }
    }
}

/// The player-controlled character
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub lives: i32,
    pub score: i32,
}

impl Player {
    pub const DEFAULT_LIVES: i32 = 3;
}

impl Default for Player {
    fn default() -> Self {
        Self {
            lives: Self::DEFAULT_LIVES,
            score: 0,
        }
    }
}

/// Something the player can collect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup {
    /// Score awarded on pickup
    pub score: i32,
}

impl Pickup {
    pub const DEFAULT_SCORE: i32 = 50;
}

impl Default for Pickup {
    fn default() -> Self {
        Self {
            score: Self::DEFAULT_SCORE,
        }
    }
}

/// Tag for entities that take part in collision checks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision;
