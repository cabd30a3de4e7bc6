//! # Paideia
//!
//! **A scene-driven 2D client shell for educational quiz RPGs.**
//!
//! Paideia renders the student-facing side of a quiz RPG — menus, an
//! overworld, the quiz flow — as named scenes behind a lifecycle
//! director that cross-fades between them. Screens are registered as
//! factories, constructed fresh on every visit, and own a stage layer
//! they paint into with a retained 2D draw list.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paideia::*;
//! use paideia::scenes::{MenuScene, names};
//!
//! fn main() -> Result<(), AppError> {
//!     run(AppConfig::new().title("Paideia Quest"), |shell| {
//!         shell.director.register(names::MENU, |ctx| {
//!             Box::new(MenuScene::new(ctx, "Wanderer")) as Box<dyn Scene>
//!         })?;
//!         shell.start(names::MENU);
//!         Ok(())
//!     })
//! }
//! ```
//!
//! ## Design
//!
//! - **One transition at a time** — the director's phase guard rejects a
//!   second `change_scene` while one is in flight; nothing is queued.
//! - **Strict sequencing** — fade-out, unload, detach, construct, load,
//!   attach, fade-in, each step completing before the next.
//! - **Single thread, real async** — scene `load`/`unload` are futures
//!   driven by the host's executor; fades sample opacity once per
//!   rendered frame through the frame clock.
//! - **Testable without a window** — the headless stage records every
//!   attach/detach/opacity call the director makes.

mod app;
mod assets;
mod content;
mod draw2d;
mod gpu;
mod input;
mod player;
pub mod scene;
pub mod scenes;
pub mod stage;

pub use app::{AppConfig, AppError, SetupContext, run};
pub use assets::{AssetError, Assets, FontAtlas, FontId, GlyphInfo, SpriteTexture};
pub use content::{Choice, ContentError, ContentLibrary, Question, Quiz, QuizCatalog};
pub use draw2d::{Canvas, Color, Draw2d, DrawCmd, Rect};
pub use gpu::GpuContext;
pub use input::{Input, InputHandle};
pub use player::{Creature, Session, SessionHandle, starter_session};
pub use scene::{
    Director, DirectorError, Easing, Fade, FrameClock, Navigator, Scene, SceneContext, SceneError,
};
pub use stage::{CanvasStage, HeadlessStage, LayerId, SpriteSource, Stage, StageHandle};

// Re-export commonly used math and input types for convenience.
pub use glam::Vec2;
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
