//! The scene contract and construction context.

use futures::future::LocalBoxFuture;

use super::error::SceneError;
use crate::input::InputHandle;
use crate::stage::{LayerId, StageHandle};

/// A self-contained screen of the application (menu, overworld, quiz,
/// battle, collection) with its own layer and lifecycle hooks.
///
/// Scenes are constructed fresh on every transition into their name —
/// there is no caching or pooling across visits. The [`Director`]
/// exclusively owns the instance from the moment `load()` completes
/// until `unload()` completes, and it alone attaches and detaches the
/// scene's layer.
///
/// Lifecycle hooks return boxed local futures: scenes are
/// single-threaded trait objects holding `Rc` handles, and the hooks may
/// suspend on I/O or on [frame ticks](super::FrameClock).
///
/// [`Director`]: super::Director
pub trait Scene {
    /// Prepare the scene's content: read assets, populate the layer's
    /// canvas, fetch whatever state the screen presents. Runs before the
    /// layer is attached; a failure aborts the transition and the scene
    /// is discarded.
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>>;

    /// Advance one frame. `dt` is the frame's delta time in seconds.
    ///
    /// Not called while a transition is in flight.
    fn update(&mut self, dt: f32);

    /// Release the scene's content. Runs after the fade-out, while the
    /// layer is still attached; on success the director detaches and
    /// disposes the layer, on failure it leaves the layer attached.
    fn unload(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>>;

    /// The stage layer this scene renders into. Scenes create their
    /// layer at construction and keep it for their whole lifetime.
    fn layer(&self) -> LayerId;
}

/// Everything a scene factory gets to build a scene from: the stage the
/// scene will render on, the shared input tracker, and a [`Navigator`]
/// for requesting transitions from inside the scene.
///
/// App-specific state (content library, session) is captured in the
/// factory closure itself.
///
/// [`Navigator`]: super::Navigator
pub struct SceneContext {
    pub stage: StageHandle,
    pub input: InputHandle,
    pub navigator: super::Navigator,
}

/// Factory registered under a scene name; invoked once per transition
/// into that name.
pub type SceneFactory = Box<dyn Fn(&SceneContext) -> Box<dyn Scene>>;
