//! The scene director: registration, the active-scene slot, and the
//! transition sequence.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU8, Ordering};

use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt;

use super::clock::FrameClock;
use super::error::DirectorError;
use super::fade::Fade;
use super::scene::{Scene, SceneContext, SceneFactory};
use crate::input::InputHandle;
use crate::stage::{LayerId, StageHandle};

/// Transition phase of the director.
///
/// Stored as an atomic and entered by compare-and-swap so the guard is
/// self-evidently race-free even though the host model is a single
/// cooperative thread.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No transition running; a scene may or may not be active.
    Idle = 0,
    /// A transition sequence is in flight.
    Transitioning = 1,
}

/// Claims the transitioning phase on construction and restores idle on
/// drop, so every exit path out of a transition — success, lifecycle
/// error, or a dropped future — releases the guard.
struct PhaseGuard<'a> {
    phase: &'a AtomicU8,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a AtomicU8) -> Result<Self, DirectorError> {
        phase
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Transitioning as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| DirectorError::TransitionInProgress)?;
        Ok(Self { phase })
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.store(Phase::Idle as u8, Ordering::Release);
    }
}

struct ActiveScene {
    name: String,
    scene: Box<dyn Scene>,
}

/// Owns at most one active scene at a time and mediates registration,
/// transition (fade-out/fade-in), update dispatch, and teardown.
///
/// The director is long-lived and shared as an `Rc`; all methods take
/// `&self`. Transitions are async: [`change_scene`](Self::change_scene)
/// suspends at the outgoing scene's `unload()`, the incoming scene's
/// `load()`, and once per frame during fades. While it is suspended the
/// host keeps ticking — `update` calls interleave (and no-op), and a
/// second `change_scene` is rejected with
/// [`DirectorError::TransitionInProgress`] rather than queued.
///
/// There is no cancellation of an in-flight transition: if a scene's
/// `load()` never resolves, the director stays in the transitioning
/// phase until the host drops the future.
pub struct Director {
    stage: StageHandle,
    clock: FrameClock,
    input: InputHandle,
    spawner: LocalSpawner,
    registry: RefCell<HashMap<String, SceneFactory>>,
    active: RefCell<Option<ActiveScene>>,
    phase: AtomicU8,
    me: Weak<Director>,
}

impl Director {
    /// Create a director for the given stage, frame clock, and
    /// transition executor.
    pub fn new(
        stage: StageHandle,
        clock: FrameClock,
        input: InputHandle,
        spawner: LocalSpawner,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            stage,
            clock,
            input,
            spawner,
            registry: RefCell::new(HashMap::new()),
            active: RefCell::new(None),
            phase: AtomicU8::new(Phase::Idle as u8),
            me: me.clone(),
        })
    }

    /// Register a scene factory under a unique name.
    ///
    /// Pure registration — the active scene is untouched. Registering a
    /// name twice is rejected: scenes are wired once at startup, and an
    /// overwrite there is a bug worth failing loudly on.
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> Result<(), DirectorError>
    where
        F: Fn(&SceneContext) -> Box<dyn Scene> + 'static,
    {
        let name = name.into();
        let mut registry = self.registry.borrow_mut();
        if registry.contains_key(&name) {
            return Err(DirectorError::DuplicateScene(name));
        }
        registry.insert(name, Box::new(factory));
        Ok(())
    }

    /// Names of every registered scene, sorted.
    pub fn scene_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a transition sequence is currently in flight.
    pub fn is_transitioning(&self) -> bool {
        self.phase.load(Ordering::Acquire) == Phase::Transitioning as u8
    }

    /// Name of the active scene, if any. Mid-transition there is none.
    pub fn current_name(&self) -> Option<String> {
        self.active.borrow().as_ref().map(|a| a.name.clone())
    }

    /// Borrow the active scene, if any.
    ///
    /// The borrow must not be held across a call back into the director.
    pub fn current(&self) -> Option<Ref<'_, dyn Scene>> {
        Ref::filter_map(self.active.borrow(), |slot| {
            slot.as_ref().map(|active| &*active.scene)
        })
        .ok()
    }

    /// A cloneable handle scenes use to request transitions.
    pub fn navigator(&self) -> Navigator {
        Navigator {
            director: self.me.clone(),
            spawner: self.spawner.clone(),
        }
    }

    /// Forward `dt` to the active scene. No-op when no scene is active
    /// or while a transition is in flight (fades are driven by the frame
    /// clock, not by this dispatch).
    pub fn update(&self, dt: f32) {
        if self.is_transitioning() {
            return;
        }
        if let Some(active) = self.active.borrow_mut().as_mut() {
            active.scene.update(dt);
        }
    }

    /// Retire the current scene and install the one registered under
    /// `name`, cross-fading over `fade.duration` seconds.
    ///
    /// The sequence is strictly ordered; each step completes before the
    /// next starts:
    ///
    /// 1. fade the outgoing layer from its current opacity to zero,
    /// 2. `unload()` the outgoing scene, then detach and dispose its layer,
    /// 3. construct the incoming scene and `load()` it,
    /// 4. attach its layer at opacity zero (or one when not fading),
    /// 5. fade it to full opacity,
    /// 6. install it as the active scene.
    ///
    /// On any failure the phase is restored to idle, at most one of the
    /// two layers is left attached, and the error names the failing
    /// step. An unload failure leaves the outgoing layer attached (never
    /// silently detached); a load failure leaves nothing attached.
    pub async fn change_scene(&self, name: &str, fade: Fade) -> Result<(), DirectorError> {
        if !self.registry.borrow().contains_key(name) {
            return Err(DirectorError::UnknownScene(name.to_string()));
        }
        let _guard = PhaseGuard::enter(&self.phase)?;
        log::debug!("scene transition to {name:?} begins");

        let outgoing = self.active.borrow_mut().take();
        if let Some(mut outgoing) = outgoing {
            let layer = outgoing.scene.layer();
            if fade.is_active() {
                let from = self.stage.borrow().opacity(layer);
                self.ramp(layer, from, 0.0, fade).await;
            }
            if let Err(source) = outgoing.scene.unload().await {
                // The layer stays attached; recovery is host policy.
                return Err(DirectorError::Unload {
                    scene: outgoing.name,
                    source,
                });
            }
            let mut stage = self.stage.borrow_mut();
            stage.detach(layer);
            stage.dispose_layer(layer);
            log::debug!("scene {:?} retired", outgoing.name);
        }

        let ctx = SceneContext {
            stage: self.stage.clone(),
            input: self.input.clone(),
            navigator: self.navigator(),
        };
        let mut scene = {
            let registry = self.registry.borrow();
            let factory = registry
                .get(name)
                .ok_or_else(|| DirectorError::UnknownScene(name.to_string()))?;
            factory(&ctx)
        };

        if let Err(source) = scene.load().await {
            self.stage.borrow_mut().dispose_layer(scene.layer());
            return Err(DirectorError::Load {
                scene: name.to_string(),
                source,
            });
        }

        let layer = scene.layer();
        {
            let mut stage = self.stage.borrow_mut();
            stage.attach(layer);
            stage.set_opacity(layer, if fade.is_active() { 0.0 } else { 1.0 });
        }
        if fade.is_active() {
            self.ramp(layer, 0.0, 1.0, fade).await;
        }

        *self.active.borrow_mut() = Some(ActiveScene {
            name: name.to_string(),
            scene,
        });
        log::debug!("scene transition to {name:?} complete");
        Ok(())
    }

    /// Ramp a layer's opacity `from` → `to`, sampling once per frame.
    async fn ramp(&self, layer: LayerId, from: f32, to: f32, fade: Fade) {
        let mut elapsed = 0.0_f32;
        while elapsed < fade.duration {
            let dt = self.clock.next_frame().await;
            elapsed += dt;
            let t = (elapsed / fade.duration).clamp(0.0, 1.0);
            self.stage.borrow_mut().set_opacity(layer, fade.sample(from, to, t));
        }
    }
}

/// The director contract exposed to scenes: request a transition from an
/// in-scene UI action.
///
/// `go` spawns the transition onto the host's executor and returns
/// immediately; a rejection (unknown name, transition already running)
/// is logged rather than surfaced, since the requesting scene may
/// already be gone by the time the outcome is known. Hosts that need the
/// result call [`Director::change_scene`] directly.
#[derive(Clone)]
pub struct Navigator {
    director: Weak<Director>,
    spawner: LocalSpawner,
}

impl Navigator {
    /// Request a transition to the scene registered under `name`.
    pub fn go(&self, name: &str, fade: Fade) {
        let Some(director) = self.director.upgrade() else {
            log::warn!("scene change to {name:?} requested after director shutdown");
            return;
        };
        let name = name.to_string();
        let task = async move {
            if let Err(err) = director.change_scene(&name, fade).await {
                log::warn!("scene change to {name:?} rejected: {err}");
            }
        };
        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("transition executor is gone: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::stage::headless::HeadlessStage;
    use futures::executor::{LocalPool, block_on};
    use futures::future::LocalBoxFuture;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NullScene {
        layer: LayerId,
    }

    impl Scene for NullScene {
        fn load(&mut self) -> LocalBoxFuture<'_, Result<(), crate::scene::SceneError>> {
            Box::pin(async { Ok(()) })
        }
        fn update(&mut self, _dt: f32) {}
        fn unload(&mut self) -> LocalBoxFuture<'_, Result<(), crate::scene::SceneError>> {
            Box::pin(async { Ok(()) })
        }
        fn layer(&self) -> LayerId {
            self.layer
        }
    }

    fn rig() -> (Rc<Director>, LocalPool) {
        let pool = LocalPool::new();
        let stage: StageHandle = Rc::new(RefCell::new(HeadlessStage::new(640, 480)));
        let input: InputHandle = Rc::new(RefCell::new(Input::new()));
        let director = Director::new(stage, FrameClock::new(), input, pool.spawner());
        (director, pool)
    }

    fn null_factory(ctx: &SceneContext) -> Box<dyn Scene> {
        let layer = ctx.stage.borrow_mut().create_layer("null");
        Box::new(NullScene { layer })
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (director, _pool) = rig();
        director.register("menu", null_factory).unwrap();
        let err = director.register("menu", null_factory).unwrap_err();
        assert!(matches!(err, DirectorError::DuplicateScene(name) if name == "menu"));
        assert_eq!(director.scene_names(), vec!["menu".to_string()]);
    }

    #[test]
    fn unknown_scene_is_rejected_without_entering_transition() {
        let (director, _pool) = rig();
        director.register("menu", null_factory).unwrap();

        let err = block_on(director.change_scene("overworld", Fade::none())).unwrap_err();
        assert!(matches!(err, DirectorError::UnknownScene(name) if name == "overworld"));
        assert!(!director.is_transitioning());
        assert!(director.current_name().is_none());
    }

    #[test]
    fn change_scene_installs_the_named_scene() {
        let (director, _pool) = rig();
        director.register("menu", null_factory).unwrap();

        block_on(director.change_scene("menu", Fade::none())).unwrap();
        assert_eq!(director.current_name().as_deref(), Some("menu"));
        assert!(!director.is_transitioning());
        assert!(director.current().is_some());
    }

    #[test]
    fn update_without_active_scene_is_a_no_op() {
        let (director, _pool) = rig();
        director.update(0.016);
        assert!(director.current_name().is_none());
    }
}
