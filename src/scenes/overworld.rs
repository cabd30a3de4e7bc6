//! The overworld map: tiles, a player avatar, roaming NPCs, and a quest
//! marker that opens the quiz.

use std::path::PathBuf;

use futures::future::LocalBoxFuture;
use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::draw2d::{Color, Rect};
use crate::input::InputHandle;
use crate::scene::{Fade, Navigator, Scene, SceneContext, SceneError};
use crate::stage::{LayerId, SpriteSource, StageHandle};

use super::names;

const TILE: f32 = 40.0;
const MAP_COLS: u32 = 20;
const MAP_ROWS: u32 = 13;
const PLAYER_SPEED: f32 = 180.0;
const NPC_SPEED: f32 = 45.0;
const MARKER_RADIUS: f32 = 56.0;

const GRASS_SPRITE: &str = "tile-grass";
const PATH_SPRITE: &str = "tile-path";

struct Position(Vec2);

struct Wander {
    heading: Vec2,
    timer: f32,
}

/// The walkable map screen.
///
/// Arrow keys move the avatar; standing near the quest marker and
/// pressing Enter opens the quiz. B and C jump to the battle and
/// collection screens, Escape returns to the menu.
pub struct OverworldScene {
    stage: StageHandle,
    input: InputHandle,
    navigator: Navigator,
    layer: LayerId,
    sprite_dir: Option<PathBuf>,

    world: hecs::World,
    player: Vec2,
    marker: Vec2,
}

impl OverworldScene {
    pub fn new(ctx: &SceneContext, sprite_dir: Option<PathBuf>) -> Self {
        let layer = ctx.stage.borrow_mut().create_layer("overworld");
        Self {
            stage: ctx.stage.clone(),
            input: ctx.input.clone(),
            navigator: ctx.navigator.clone(),
            layer,
            sprite_dir,
            world: hecs::World::new(),
            player: Vec2::new(TILE * 2.5, TILE * 6.5),
            marker: Vec2::new(TILE * 15.5, TILE * 4.5),
        }
    }

    /// Register a tile sprite: a user-provided image when one exists in
    /// the sprite directory, procedural pixel art otherwise.
    fn load_tile(&self, name: &str, file: &str, base: [u8; 3]) -> Result<(), SceneError> {
        let mut stage = self.stage.borrow_mut();
        if let Some(dir) = &self.sprite_dir {
            let path = dir.join(file);
            if path.exists() {
                stage.load_sprite(name, SpriteSource::File(&path))?;
                return Ok(());
            }
        }
        let size = 16u32;
        let pixels = speckled_tile(size, base, name.len() as u32);
        stage.load_sprite(
            name,
            SpriteSource::Rgba {
                width: size,
                height: size,
                pixels: &pixels,
            },
        )?;
        Ok(())
    }

    fn map_bounds(&self) -> Vec2 {
        Vec2::new(MAP_COLS as f32 * TILE, MAP_ROWS as f32 * TILE)
    }

    fn near_marker(&self) -> bool {
        self.player.distance(self.marker) < MARKER_RADIUS
    }

    fn repaint(&mut self) {
        let near_marker = self.near_marker();
        let mut npcs: Vec<Vec2> = Vec::new();
        for (_entity, position) in self.world.query_mut::<&Position>() {
            npcs.push(position.0);
        }

        let mut stage = self.stage.borrow_mut();
        let Some(canvas) = stage.canvas(self.layer) else {
            return;
        };
        canvas.clear();
        canvas.set_background(Color::rgb(0.05, 0.09, 0.05));

        for row in 0..MAP_ROWS {
            for col in 0..MAP_COLS {
                // A path band crosses the map toward the quest marker.
                let on_path = row == 5 || (col == 15 && row < 6);
                let sprite = if on_path { PATH_SPRITE } else { GRASS_SPRITE };
                canvas.sprite(
                    sprite,
                    Rect::new(col as f32 * TILE, row as f32 * TILE, TILE, TILE),
                    Color::WHITE,
                );
            }
        }

        let marker_color = if near_marker {
            Color::rgb(1.0, 0.9, 0.3)
        } else {
            Color::rgb(0.8, 0.6, 0.15)
        };
        canvas.rect(
            Rect::new(self.marker.x - 10.0, self.marker.y - 16.0, 20.0, 32.0),
            marker_color,
        );

        for npc in npcs {
            canvas.rect(
                Rect::new(npc.x - 9.0, npc.y - 9.0, 18.0, 18.0),
                Color::rgb(0.55, 0.35, 0.7),
            );
        }

        canvas.rect(
            Rect::new(self.player.x - 10.0, self.player.y - 12.0, 20.0, 24.0),
            Color::rgb(0.3, 0.7, 0.9),
        );

        let hint = if near_marker {
            "[Enter] Take the quiz"
        } else {
            "[Arrows] Move   [B] Battle   [C] Collection   [Esc] Menu"
        };
        canvas.text(12.0, 8.0, hint, Color::WHITE);
    }
}

impl Scene for OverworldScene {
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async move {
            self.load_tile(GRASS_SPRITE, "grass.png", [68, 110, 58])?;
            self.load_tile(PATH_SPRITE, "path.png", [128, 108, 70])?;

            let bounds = self.map_bounds();
            for i in 0..4 {
                let t = i as f32;
                self.world.spawn((
                    Position(Vec2::new(
                        bounds.x * (0.2 + 0.18 * t),
                        bounds.y * (0.3 + 0.12 * t),
                    )),
                    Wander {
                        heading: Vec2::new(1.0, 0.0),
                        timer: 0.8 + 0.6 * t,
                    },
                ));
            }

            self.repaint();
            Ok(())
        })
    }

    fn update(&mut self, dt: f32) {
        let mut direction = Vec2::ZERO;
        {
            let input = self.input.borrow();
            if input.key_down(KeyCode::ArrowLeft) {
                direction.x -= 1.0;
            }
            if input.key_down(KeyCode::ArrowRight) {
                direction.x += 1.0;
            }
            if input.key_down(KeyCode::ArrowUp) {
                direction.y -= 1.0;
            }
            if input.key_down(KeyCode::ArrowDown) {
                direction.y += 1.0;
            }

            if input.key_pressed(KeyCode::Enter) && self.near_marker() {
                self.navigator.go(names::QUIZ, Fade::millis(300.0));
            }
            if input.key_pressed(KeyCode::KeyB) {
                self.navigator.go(names::BATTLE, Fade::millis(300.0));
            }
            if input.key_pressed(KeyCode::KeyC) {
                self.navigator.go(names::COLLECTION, Fade::millis(300.0));
            }
            if input.key_pressed(KeyCode::Escape) {
                self.navigator.go(names::MENU, Fade::millis(300.0));
            }
        }

        let bounds = self.map_bounds();
        if direction != Vec2::ZERO {
            self.player += direction.normalize() * PLAYER_SPEED * dt;
            self.player = self.player.clamp(Vec2::splat(12.0), bounds - Vec2::splat(12.0));
        }

        for (_entity, (position, wander)) in self.world.query_mut::<(&mut Position, &mut Wander)>()
        {
            wander.timer -= dt;
            if wander.timer <= 0.0 {
                // Quarter turn on a fixed cadence keeps the walk
                // deterministic.
                wander.heading = Vec2::new(-wander.heading.y, wander.heading.x);
                wander.timer = 2.4;
            }
            position.0 += wander.heading * NPC_SPEED * dt;
            position.0 = position.0.clamp(Vec2::splat(12.0), bounds - Vec2::splat(12.0));
        }

        self.repaint();
    }

    fn unload(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async move {
            self.world.clear();
            Ok(())
        })
    }

    fn layer(&self) -> LayerId {
        self.layer
    }
}

/// Blocky per-pixel variation around a base color, in the style of a
/// hand-placed tile set.
fn speckled_tile(size: u32, base: [u8; 3], seed: u32) -> Vec<u8> {
    let mut data = vec![0u8; (size * size * 4) as usize];
    for y in 0..size {
        for x in 0..size {
            let idx = ((y * size + x) * 4) as usize;
            let variation = ((hash(x, y, seed) % 24) as i32) - 12;
            for ch in 0..3 {
                data[idx + ch] = (base[ch] as i32 + variation).clamp(0, 255) as u8;
            }
            data[idx + 3] = 255;
        }
    }
    data
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}
