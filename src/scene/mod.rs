//! Scene lifecycle: registration, transitions, update dispatch.
//!
//! This module is the spine of the client shell. A [`Director`] owns at
//! most one active [`Scene`] at a time; screens are registered by name
//! as factories and constructed fresh on every visit. A transition
//! retires the current scene and installs the next one behind a
//! cross-fade, as one strictly sequenced async control flow:
//!
//! fade-out → unload → detach → construct → load → attach → fade-in
//!
//! The whole shell is single-threaded and cooperative: transitions are
//! futures driven by the host's executor, fades sample opacity once per
//! render frame via the [`FrameClock`], and a second transition
//! requested while one is in flight is rejected, never queued.
//!
//! # Example
//!
//! ```ignore
//! use paideia::*;
//!
//! director.register("menu", {
//!     let session = session.clone();
//!     move |ctx| Box::new(MenuScene::new(ctx, session.clone())) as Box<dyn Scene>
//! })?;
//!
//! // From inside a scene, on a button press:
//! ctx.navigator.go("overworld", Fade::millis(300.0));
//! ```

mod clock;
mod director;
mod error;
mod fade;
mod scene;

pub use clock::{FrameClock, NextFrame};
pub use director::{Director, Navigator, Phase};
pub use error::{DirectorError, SceneError};
pub use fade::{Easing, Fade};
pub use scene::{Scene, SceneContext, SceneFactory};
