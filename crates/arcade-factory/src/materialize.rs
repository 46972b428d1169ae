//! Built-in component materializers

use crate::definition::ComponentBlock;
use crate::dispatch::{ComponentTable, FromBlock, MaterializeContext};
use arcade_core::{ArcadeError, Result, Tint};
use arcade_ecs::{
    Action, AnimatedSprite, Collision, EntityStore, Input, Movement, Pickup, Player, Position,
    Sprite,
};
use std::collections::{BTreeMap, HashMap};

/// Legacy tag accepted for `AnimatedSprite`
pub const ANIMATION_SPRITE_ALIAS: &str = "AnimationSprite";

impl FromBlock for Position {
    const KIND: &'static str = "Position";

    fn from_block(block: &ComponentBlock, _ctx: &MaterializeContext<'_>) -> Result<Self> {
        Ok(Position {
            position: block.read_grid("position")?.unwrap_or_default(),
        })
    }
}

impl FromBlock for Movement {
    const KIND: &'static str = "Movement";

    fn from_block(block: &ComponentBlock, _ctx: &MaterializeContext<'_>) -> Result<Self> {
        let current_direction = block
            .read_grid("current_direction")?
            .unwrap_or_default()
            .clamp_unit();
        let desired_direction = block
            .read_grid("desired_direction")?
            .unwrap_or_default()
            .clamp_unit();

        let speed = match block.read_f32("speed")? {
            Some(speed) if speed.is_finite() && speed >= 0.0 => speed,
            Some(speed) => {
                tracing::warn!(
                    speed,
                    default = Movement::DEFAULT_SPEED,
                    "Movement.speed must be a non-negative number, using default"
                );
                Movement::DEFAULT_SPEED
            }
            None => Movement::DEFAULT_SPEED,
        };

        Ok(Movement {
            current_direction,
            desired_direction,
            speed,
            progress: 0.0,
        })
    }
}

impl FromBlock for Sprite {
    const KIND: &'static str = "Sprite";

    fn from_block(block: &ComponentBlock, ctx: &MaterializeContext<'_>) -> Result<Self> {
        Ok(Sprite {
            sprite: ctx.read_texture(block, "sprite")?.unwrap_or_default(),
            tint: block.read_tint("tint")?.unwrap_or(Tint::WHITE),
        })
    }
}

impl FromBlock for AnimatedSprite {
    const KIND: &'static str = "AnimatedSprite";

    fn from_block(block: &ComponentBlock, ctx: &MaterializeContext<'_>) -> Result<Self> {
        let mut available_animations = BTreeMap::new();
        if let Some(clips) = block.read_table("animations")? {
            for (name, value) in clips.iter() {
                let field = format!("{}.{}", block.field_path("animations"), name);
                let texture = ctx.decode_texture(&field, value)?;
                available_animations.insert(name.to_string(), texture);
            }
        }
        if available_animations.is_empty() {
            tracing::warn!("AnimatedSprite declares no animations");
        }

        let active_clip = match block.read_string("active_animation")? {
            Some(selector) => {
                if !available_animations.contains_key(&selector) {
                    return Err(ArcadeError::UnknownClip {
                        selector,
                        available: available_animations.keys().cloned().collect(),
                    });
                }
                Some(selector)
            }
            None => available_animations.keys().next().cloned(),
        };
        let active_animation = active_clip
            .as_ref()
            .and_then(|clip| available_animations.get(clip).copied())
            .unwrap_or_default();

        let fps = match block.read_f32("fps")? {
            Some(fps) if fps.is_finite() && fps > 0.0 => fps,
            Some(fps) => {
                tracing::warn!(
                    fps,
                    default = AnimatedSprite::DEFAULT_FPS,
                    "AnimatedSprite.fps must be positive, using default"
                );
                AnimatedSprite::DEFAULT_FPS
            }
            None => AnimatedSprite::DEFAULT_FPS,
        };

        Ok(AnimatedSprite {
            available_animations,
            active_clip,
            active_animation,
            tint: block.read_tint("tint")?.unwrap_or(Tint::WHITE),
            animation_timer: 0.0,
            fps,
        })
    }
}

impl FromBlock for Player {
    const KIND: &'static str = "Player";

    fn from_block(block: &ComponentBlock, _ctx: &MaterializeContext<'_>) -> Result<Self> {
        let lives = block.read_i32("lives")?.unwrap_or(Player::DEFAULT_LIVES);
        Ok(Player {
            lives: lives.max(0),
            score: block.read_i32("score")?.unwrap_or(0),
        })
    }
}

impl FromBlock for Input {
    const KIND: &'static str = "Input";

    fn from_block(block: &ComponentBlock, ctx: &MaterializeContext<'_>) -> Result<Self> {
        let mut actions = HashMap::new();
        let Some(table) = block.read_table("actions")? else {
            return Ok(Input { actions });
        };

        for (key, value) in table.iter() {
            let action: Action = key
                .parse()
                .map_err(|_| ArcadeError::UnknownAction(key.to_string()))?;
            let field = format!("{}.{}", block.field_path("actions"), key);

            if actions.contains_key(&action) {
                return Err(ArcadeError::InvalidBehavior {
                    field,
                    reason: format!("action {} is bound more than once", action),
                });
            }
            actions.insert(action, ctx.decode_behavior(&field, value)?);
        }

        Ok(Input { actions })
    }
}

impl FromBlock for Pickup {
    const KIND: &'static str = "Pickup";

    fn from_block(block: &ComponentBlock, _ctx: &MaterializeContext<'_>) -> Result<Self> {
        Ok(Pickup {
            score: block.read_i32("score")?.unwrap_or(Pickup::DEFAULT_SCORE),
        })
    }
}

impl FromBlock for Collision {
    const KIND: &'static str = "Collision";

    fn from_block(_block: &ComponentBlock, _ctx: &MaterializeContext<'_>) -> Result<Self> {
        Ok(Collision)
    }
}

impl<S: EntityStore> ComponentTable<S> {
    /// Table with every built-in component kind registered
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register_component::<Position>();
        table.register_component::<Movement>();
        table.register_component::<Sprite>();
        table.register_component::<AnimatedSprite>();
        table.register_component::<Player>();
        table.register_component::<Input>();
        table.register_component::<Pickup>();
        table.register_component::<Collision>();
        table.alias(ANIMATION_SPRITE_ALIAS, AnimatedSprite::KIND);
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::TextureTable;
    use arcade_core::{GridVec, TextureId};
    use arcade_ecs::ArcadeWorld;
    use rhai::{Engine, Map};

    fn block(kind: &str, fields: &str) -> ComponentBlock {
        ComponentBlock::new(kind, Engine::new().eval::<Map>(fields).unwrap())
    }

    fn decode<C: FromBlock>(fields: &str) -> Result<C> {
        let mut textures = TextureTable::new();
        textures.insert("pacman_left", TextureId(3));
        textures.insert("pacman_right", TextureId(4));
        let ctx = MaterializeContext::new(&textures, None);
        C::from_block(&block(C::KIND, fields), &ctx)
    }

    #[test]
    fn test_builtin_table() {
        let table = ComponentTable::<ArcadeWorld>::with_builtins();
        assert_eq!(
            table.kinds(),
            vec![
                "AnimatedSprite",
                "Collision",
                "Input",
                "Movement",
                "Pickup",
                "Player",
                "Position",
                "Sprite"
            ]
        );
        assert_eq!(
            table.lookup(ANIMATION_SPRITE_ALIAS).unwrap().kind(),
            "AnimatedSprite"
        );
    }

    #[test]
    fn test_position() {
        let p: Position = decode("#{ position: [2, 3], extra: true }").unwrap();
        assert_eq!(p.position, GridVec::new(2, 3));
        assert_eq!(decode::<Position>("#{}").unwrap().position, GridVec::ZERO);
    }

    #[test]
    fn test_movement() {
        let m: Movement = decode("#{ speed: 2.5, progress: 0.9 }").unwrap();
        assert_eq!(m.speed, 2.5);
        assert_eq!(m.progress, 0.0);
        assert_eq!(m.current_direction, GridVec::ZERO);

        let m: Movement = decode("#{ current_direction: [5, -3], speed: -2.0 }").unwrap();
        assert_eq!(m.current_direction, GridVec::new(1, -1));
        assert_eq!(m.speed, Movement::DEFAULT_SPEED);

        assert!(decode::<Movement>(r#"#{ speed: "fast" }"#).is_err());
    }

    #[test]
    fn test_sprite() {
        let s: Sprite = decode("#{ sprite: 7 }").unwrap();
        assert_eq!(s.sprite, TextureId(7));
        assert_eq!(s.tint, Tint::WHITE);

        let s: Sprite = decode(r#"#{ sprite: "pacman_left", tint: [1.0, 1.0, 0.0] }"#).unwrap();
        assert_eq!(s.sprite, TextureId(3));
        assert_eq!(s.tint, Tint::new(1.0, 1.0, 0.0));

        assert_eq!(decode::<Sprite>("#{}").unwrap().sprite, TextureId(0));
        assert!(matches!(
            decode::<Sprite>(r#"#{ sprite: "missing" }"#),
            Err(ArcadeError::UnknownTexture(_))
        ));
    }

    #[test]
    fn test_animated_sprite() {
        let a: AnimatedSprite = decode(
            r#"#{ animations: #{ left: "pacman_left", right: 4 }, active_animation: "right", fps: 12 }"#,
        )
        .unwrap();
        assert_eq!(a.active_animation, TextureId(4));
        assert_eq!(a.active_clip.as_deref(), Some("right"));
        assert_eq!(a.fps, 12.0);
        assert_eq!(a.animation_timer, 0.0);
        assert_eq!(a.available_animations.len(), 2);

        let a: AnimatedSprite = decode(r#"#{ animations: #{ up: 9, down: 8 }, fps: 0 }"#).unwrap();
        assert_eq!(a.active_clip.as_deref(), Some("down"));
        assert_eq!(a.active_animation, TextureId(8));
        assert_eq!(a.fps, AnimatedSprite::DEFAULT_FPS);

        let empty: AnimatedSprite = decode("#{}").unwrap();
        assert!(empty.available_animations.is_empty());
        assert_eq!(empty.active_clip, None);
    }

    #[test]
    fn test_animated_sprite_unknown_selector() {
        match decode::<AnimatedSprite>(r#"#{ animations: #{ left: 3 }, active_animation: "up" }"#) {
            Err(ArcadeError::UnknownClip {
                selector,
                available,
            }) => {
                assert_eq!(selector, "up");
                assert_eq!(available, vec!["left".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_player() {
        assert_eq!(decode::<Player>("#{}").unwrap(), Player::default());
        let p: Player = decode("#{ lives: -2, score: 120 }").unwrap();
        assert_eq!(p, Player { lives: 0, score: 120 });
        assert!(decode::<Player>("#{ lives: 1.5 }").is_err());
    }

    #[test]
    fn test_input() {
        let input: Input =
            decode(r#"#{ actions: #{ MoveUp: "go_up", pause: Fn("toggle_pause") } }"#).unwrap();
        assert_eq!(input.actions.len(), 2);
        assert_eq!(input.behavior(Action::MoveUp).unwrap().name(), "go_up");
        assert_eq!(input.behavior(Action::Pause).unwrap().name(), "toggle_pause");
        assert!(!input.is_bound(Action::Confirm));

        assert!(decode::<Input>("#{}").unwrap().actions.is_empty());
    }

    #[test]
    fn test_input_errors() {
        assert!(matches!(
            decode::<Input>(r#"#{ actions: #{ Jump: "jump" } }"#),
            Err(ArcadeError::UnknownAction(name)) if name == "Jump"
        ));
        assert!(matches!(
            decode::<Input>(r#"#{ actions: #{ Pause: 3 } }"#),
            Err(ArcadeError::InvalidFieldType { .. })
        ));
        assert!(matches!(
            decode::<Input>(r#"#{ actions: #{ Pause: "a", pause: "b" } }"#),
            Err(ArcadeError::InvalidBehavior { .. })
        ));
    }

    #[test]
    fn test_pickup_and_collision() {
        assert_eq!(decode::<Pickup>("#{}").unwrap().score, 50);
        assert_eq!(decode::<Pickup>("#{ score: 200 }").unwrap().score, 200);
        assert_eq!(decode::<Collision>("#{ anything: 1 }").unwrap(), Collision);
    }
}
