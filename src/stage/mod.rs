//! The render host: a root surface with attachable layers.
//!
//! A [`Stage`] owns the renderable resources of the shell — layers with
//! per-layer opacity and retained draw lists, plus named sprites. Scenes
//! paint into their own layer's [`Canvas`]; the
//! [`Director`](crate::scene::Director) decides which layers are
//! attached and drives their opacity during transitions.
//!
//! Two implementations ship with the crate: [`CanvasStage`], the
//! wgpu-backed compositor used by the windowed app, and
//! [`HeadlessStage`], an in-memory recorder for tests and windowless
//! hosts.

pub mod canvas;
pub mod headless;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::assets::AssetError;
use crate::draw2d::Canvas;

pub use canvas::CanvasStage;
pub use headless::HeadlessStage;

/// Opaque identifier for a stage layer.
///
/// Ids are unique per stage for its whole lifetime; a disposed layer's
/// id is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(pub(crate) u64);

/// Pixel source for [`Stage::load_sprite`].
pub enum SpriteSource<'a> {
    /// Decode an image file from disk.
    File(&'a Path),
    /// Decode an in-memory encoded image (PNG, JPEG).
    Bytes(&'a [u8]),
    /// Raw RGBA8 pixels, row-major.
    Rgba {
        width: u32,
        height: u32,
        pixels: &'a [u8],
    },
}

/// The root rendering surface scenes attach to.
///
/// The stage tracks an ordered list of attached layers and composites
/// them back-to-front with each layer's opacity. It enforces nothing
/// about how many layers are attached — keeping that to at most one
/// scene layer is the director's invariant.
pub trait Stage {
    /// Current surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Allocate a new detached layer with opacity 1.0 and an empty canvas.
    fn create_layer(&mut self, label: &str) -> LayerId;

    /// Release a layer and its resources. Detaches it first if needed.
    /// Unknown ids are ignored.
    fn dispose_layer(&mut self, layer: LayerId);

    /// Append the layer to the composite order. Attaching an already
    /// attached or unknown layer is ignored.
    fn attach(&mut self, layer: LayerId);

    /// Remove the layer from the composite order without releasing it.
    fn detach(&mut self, layer: LayerId);

    /// Set a layer's opacity, clamped to `[0, 1]`.
    fn set_opacity(&mut self, layer: LayerId, opacity: f32);

    /// A layer's current opacity; 1.0 for unknown ids.
    fn opacity(&self, layer: LayerId) -> f32;

    /// Mutable access to a layer's draw list, or `None` for unknown ids.
    fn canvas(&mut self, layer: LayerId) -> Option<&mut Canvas>;

    /// Register a named sprite. Replaces any sprite under the same name.
    fn load_sprite(&mut self, name: &str, source: SpriteSource<'_>) -> Result<(), AssetError>;

    /// Whether a sprite is registered under `name`.
    fn has_sprite(&self, name: &str) -> bool;
}

/// Shared handle to the stage, cloned into the director and every scene.
pub type StageHandle = Rc<RefCell<dyn Stage>>;
