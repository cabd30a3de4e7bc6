//! Error types for scene registration and transitions.

use thiserror::Error;

/// Failure inside a scene's own lifecycle hooks (`load`/`unload`).
///
/// Scenes construct these from whatever went wrong while preparing or
/// releasing their content; the director wraps them with the scene name
/// and the step that failed before surfacing them to the caller.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Required content was missing or unusable.
    #[error("content error: {0}")]
    Content(String),
    /// An asset (font, sprite sheet) failed to load.
    #[error(transparent)]
    Asset(#[from] crate::assets::AssetError),
    /// Filesystem failure while reading scene resources.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Shorthand for a content failure with a formatted message.
    pub fn content(msg: impl Into<String>) -> Self {
        SceneError::Content(msg.into())
    }
}

/// Errors surfaced by [`Director`](super::Director) operations.
///
/// The director never swallows a scene-lifecycle failure: the phase guard
/// is restored to idle on every path and the error names the step that
/// failed. Recovery policy (retrying, substituting a fallback scene,
/// showing an error screen) belongs to the caller.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// `change_scene` was called with a name that was never registered.
    /// The transition was not entered and the active scene is untouched.
    #[error("no scene registered under {0:?}")]
    UnknownScene(String),

    /// A scene with this name is already registered.
    #[error("scene {0:?} is already registered")]
    DuplicateScene(String),

    /// A transition is already running. The call had no effect; it is
    /// rejected rather than queued.
    #[error("a scene transition is already in progress")]
    TransitionInProgress,

    /// The incoming scene's `load()` failed. No scene is active and
    /// nothing was attached to the stage.
    #[error("failed to load scene {scene:?}")]
    Load {
        scene: String,
        #[source]
        source: SceneError,
    },

    /// The outgoing scene's `unload()` failed. Its layer remains
    /// attached on the stage; the scene instance itself is gone and no
    /// scene is active.
    #[error("failed to unload scene {scene:?}")]
    Unload {
        scene: String,
        #[source]
        source: SceneError,
    },
}
