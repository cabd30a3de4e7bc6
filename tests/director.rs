//! Behavioral tests for the scene director, driven against the headless
//! stage with a hand-pumped executor and frame clock.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use paideia::scene::{
    Director, DirectorError, Fade, FrameClock, Scene, SceneContext, SceneError,
};
use paideia::stage::headless::{HeadlessStage, StageEvent};
use paideia::stage::{LayerId, Stage, StageHandle};
use paideia::{Input, InputHandle};

// ---------------------------------------------------------------------------
// Test scaffolding

/// A manually opened latch; `wait()` futures resolve once `open()` runs.
#[derive(Clone, Default)]
struct Gate {
    inner: Rc<RefCell<GateInner>>,
}

#[derive(Default)]
struct GateInner {
    open: bool,
    wakers: Vec<Waker>,
}

impl Gate {
    fn new() -> Self {
        Self::default()
    }

    fn open(&self) {
        let wakers = {
            let mut inner = self.inner.borrow_mut();
            inner.open = true;
            std::mem::take(&mut inner.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }

    fn wait(&self) -> GateWait {
        GateWait {
            inner: self.inner.clone(),
        }
    }
}

struct GateWait {
    inner: Rc<RefCell<GateInner>>,
}

impl Future for GateWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.open {
            Poll::Ready(())
        } else {
            inner.wakers.push(cx.waker().clone());
            Poll::Pending
        }
    }
}

#[derive(Clone, Default)]
struct SceneSpec {
    load_gate: Option<Gate>,
    fail_load: bool,
    fail_unload: bool,
}

struct TestScene {
    name: &'static str,
    layer: LayerId,
    spec: SceneSpec,
    log: Rc<RefCell<Vec<String>>>,
}

impl Scene for TestScene {
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        let spec = self.spec.clone();
        let log = self.log.clone();
        let name = self.name;
        Box::pin(async move {
            if let Some(gate) = &spec.load_gate {
                gate.wait().await;
            }
            log.borrow_mut().push(format!("{name}:load"));
            if spec.fail_load {
                return Err(SceneError::content("load refused"));
            }
            Ok(())
        })
    }

    fn update(&mut self, _dt: f32) {
        self.log.borrow_mut().push(format!("{}:update", self.name));
    }

    fn unload(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        let fail = self.spec.fail_unload;
        let log = self.log.clone();
        let name = self.name;
        Box::pin(async move {
            log.borrow_mut().push(format!("{name}:unload"));
            if fail {
                return Err(SceneError::content("unload refused"));
            }
            Ok(())
        })
    }

    fn layer(&self) -> LayerId {
        self.layer
    }
}

struct Rig {
    stage: Rc<RefCell<HeadlessStage>>,
    clock: FrameClock,
    pool: LocalPool,
    director: Rc<Director>,
    log: Rc<RefCell<Vec<String>>>,
}

impl Rig {
    fn new() -> Self {
        let pool = LocalPool::new();
        let stage = Rc::new(RefCell::new(HeadlessStage::new(640, 480)));
        let stage_handle: StageHandle = stage.clone();
        let input: InputHandle = Rc::new(RefCell::new(Input::new()));
        let clock = FrameClock::new();
        let director = Director::new(stage_handle, clock.clone(), input, pool.spawner());
        Self {
            stage,
            clock,
            pool,
            director,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn register(&self, name: &'static str, spec: SceneSpec) {
        let log = self.log.clone();
        self.director
            .register(name, move |ctx: &SceneContext| {
                let layer = ctx.stage.borrow_mut().create_layer(name);
                Box::new(TestScene {
                    name,
                    layer,
                    spec: spec.clone(),
                    log: log.clone(),
                }) as Box<dyn Scene>
            })
            .unwrap();
    }

    /// Run a transition to completion, pumping the clock as needed.
    fn change(&mut self, name: &'static str, fade: Fade) -> Result<(), DirectorError> {
        let slot = self.spawn_change(name, fade);
        self.pump(&slot);
        let result = slot.borrow_mut().take().expect("transition never finished");
        result
    }

    /// Spawn a transition onto the executor without finishing it.
    fn spawn_change(
        &mut self,
        name: &'static str,
        fade: Fade,
    ) -> Rc<RefCell<Option<Result<(), DirectorError>>>> {
        let slot = Rc::new(RefCell::new(None));
        let director = self.director.clone();
        let out = slot.clone();
        self.pool
            .spawner()
            .spawn_local(async move {
                *out.borrow_mut() = Some(director.change_scene(name, fade).await);
            })
            .unwrap();
        self.pool.run_until_stalled();
        slot
    }

    /// Tick frames until the spawned transition resolves.
    fn pump(&mut self, slot: &Rc<RefCell<Option<Result<(), DirectorError>>>>) {
        let mut frames = 0;
        while slot.borrow().is_none() {
            self.clock.tick(0.05);
            self.pool.run_until_stalled();
            frames += 1;
            assert!(frames < 1000, "transition did not settle");
        }
    }

    fn opacity_events(&self, layer: LayerId) -> Vec<f32> {
        self.stage
            .borrow()
            .events()
            .iter()
            .filter_map(|event| match event {
                StageEvent::Opacity(id, value) if *id == layer => Some(*value),
                _ => None,
            })
            .collect()
    }

    fn current_layer(&self) -> LayerId {
        self.director
            .current()
            .map(|scene| scene.layer())
            .expect("no active scene")
    }
}

// ---------------------------------------------------------------------------
// Tests

#[test]
fn change_scene_installs_a_factory_built_scene() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());
    rig.register("overworld", SceneSpec::default());

    rig.change("menu", Fade::none()).unwrap();

    assert_eq!(rig.director.current_name().as_deref(), Some("menu"));
    let layer = rig.current_layer();
    assert_eq!(rig.stage.borrow().layer_label(layer), Some("menu"));
    assert!(rig.stage.borrow().is_attached(layer));
    assert_eq!(rig.stage.borrow().opacity(layer), 1.0);
    assert_eq!(rig.log.borrow().as_slice(), ["menu:load"]);
}

#[test]
fn unknown_scene_leaves_everything_untouched() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());
    rig.change("menu", Fade::none()).unwrap();

    let err = rig.change("warehouse", Fade::none()).unwrap_err();
    assert!(matches!(err, DirectorError::UnknownScene(name) if name == "warehouse"));
    assert!(!rig.director.is_transitioning());
    assert_eq!(rig.director.current_name().as_deref(), Some("menu"));
}

#[test]
fn concurrent_transition_is_rejected_then_allowed() {
    let mut rig = Rig::new();
    let gate = Gate::new();
    rig.register(
        "slow",
        SceneSpec {
            load_gate: Some(gate.clone()),
            ..Default::default()
        },
    );
    rig.register("menu", SceneSpec::default());

    // A parks inside its load, holding the transition phase.
    let slot_a = rig.spawn_change("slow", Fade::none());
    assert!(rig.director.is_transitioning());
    assert!(slot_a.borrow().is_none());

    // B is rejected immediately, without touching A.
    let err = rig.change("menu", Fade::none()).unwrap_err();
    assert!(matches!(err, DirectorError::TransitionInProgress));
    assert!(slot_a.borrow().is_none());

    // A finishes once its load resolves.
    gate.open();
    rig.pump(&slot_a);
    assert!(slot_a.borrow_mut().take().unwrap().is_ok());
    assert_eq!(rig.director.current_name().as_deref(), Some("slow"));

    // With the phase released, a third transition goes through.
    rig.change("menu", Fade::none()).unwrap();
    assert_eq!(rig.director.current_name().as_deref(), Some("menu"));
}

#[test]
fn failed_load_leaves_no_scene_and_releases_the_phase() {
    let mut rig = Rig::new();
    rig.register(
        "broken",
        SceneSpec {
            fail_load: true,
            ..Default::default()
        },
    );
    rig.register("menu", SceneSpec::default());

    let err = rig.change("broken", Fade::none()).unwrap_err();
    assert!(matches!(err, DirectorError::Load { scene, .. } if scene == "broken"));

    // No half-installed scene, nothing attached, nothing leaked.
    assert!(rig.director.current_name().is_none());
    assert!(rig.stage.borrow().attached().is_empty());
    assert_eq!(rig.stage.borrow().layer_count(), 0);
    assert!(!rig.director.is_transitioning());

    // The director still works.
    rig.change("menu", Fade::none()).unwrap();
    assert_eq!(rig.director.current_name().as_deref(), Some("menu"));
}

#[test]
fn failed_unload_keeps_the_old_layer_attached() {
    let mut rig = Rig::new();
    rig.register(
        "sticky",
        SceneSpec {
            fail_unload: true,
            ..Default::default()
        },
    );
    rig.register("menu", SceneSpec::default());

    rig.change("sticky", Fade::none()).unwrap();
    let sticky_layer = rig.current_layer();

    let err = rig.change("menu", Fade::none()).unwrap_err();
    assert!(matches!(err, DirectorError::Unload { scene, .. } if scene == "sticky"));

    // The outgoing layer is not silently detached; the slot is empty;
    // the incoming scene was never constructed.
    assert!(rig.stage.borrow().is_attached(sticky_layer));
    assert!(rig.director.current_name().is_none());
    assert!(!rig.director.is_transitioning());
    assert!(!rig.log.borrow().iter().any(|entry| entry == "menu:load"));
}

#[test]
fn zero_fade_writes_no_intermediate_opacity() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());
    rig.register("overworld", SceneSpec::default());

    rig.change("menu", Fade::none()).unwrap();
    let menu_layer = rig.current_layer();
    rig.stage.borrow_mut().take_events();

    rig.change("overworld", Fade::none()).unwrap();
    let overworld_layer = rig.current_layer();

    // The old layer's opacity is never touched, and the new layer gets
    // exactly one write: the final 1.0.
    assert!(rig.opacity_events(menu_layer).is_empty());
    assert_eq!(rig.opacity_events(overworld_layer), vec![1.0]);
}

#[test]
fn fade_ramps_down_from_current_opacity_and_up_to_full() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());
    rig.register("overworld", SceneSpec::default());

    rig.change("menu", Fade::none()).unwrap();
    let menu_layer = rig.current_layer();
    // The menu was left half-faded by the host.
    rig.stage.borrow_mut().set_opacity(menu_layer, 0.5);
    rig.stage.borrow_mut().take_events();

    rig.change("overworld", Fade::seconds(0.3)).unwrap();
    let overworld_layer = rig.current_layer();

    let out = rig.opacity_events(menu_layer);
    assert!(!out.is_empty());
    // Ramp starts from the current value, not from 1.0.
    assert!(out.iter().all(|&v| v <= 0.5));
    assert_eq!(*out.last().unwrap(), 0.0);

    let other = rig.opacity_events(overworld_layer);
    // Attached at zero, ramped to one, with at least one sample between.
    assert_eq!(other.first(), Some(&0.0));
    assert_eq!(other.last(), Some(&1.0));
    assert!(other.len() > 2);
    assert!(other.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn current_scene_flips_only_after_the_sequence_resolves() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());
    rig.register("overworld", SceneSpec::default());

    rig.change("menu", Fade::none()).unwrap();

    let slot = rig.spawn_change("overworld", Fade::seconds(0.3));
    // Mid-fade: the transition is in flight and the overworld is not yet
    // the current scene.
    assert!(rig.director.is_transitioning());
    assert_ne!(rig.director.current_name().as_deref(), Some("overworld"));

    // A competing request during the window is rejected.
    let err = rig.change("menu", Fade::none()).unwrap_err();
    assert!(matches!(err, DirectorError::TransitionInProgress));

    rig.pump(&slot);
    assert!(slot.borrow_mut().take().unwrap().is_ok());
    assert_eq!(rig.director.current_name().as_deref(), Some("overworld"));
}

#[test]
fn old_scene_is_unloaded_detached_and_disposed_in_order() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());
    rig.register("overworld", SceneSpec::default());

    rig.change("menu", Fade::none()).unwrap();
    let menu_layer = rig.current_layer();
    rig.stage.borrow_mut().take_events();
    rig.log.borrow_mut().clear();

    rig.change("overworld", Fade::none()).unwrap();

    let events = rig.stage.borrow().events().to_vec();
    let detach_at = events
        .iter()
        .position(|e| *e == StageEvent::Detached(menu_layer))
        .expect("old layer detached");
    let dispose_at = events
        .iter()
        .position(|e| *e == StageEvent::Disposed(menu_layer))
        .expect("old layer disposed");
    let create_at = events
        .iter()
        .position(|e| matches!(e, StageEvent::Created(_)))
        .expect("new layer created");
    assert!(detach_at < dispose_at);
    assert!(dispose_at < create_at);
    assert_eq!(
        rig.log.borrow().as_slice(),
        ["menu:unload", "overworld:load"]
    );
    assert_eq!(rig.stage.borrow().layer_count(), 1);
}

#[test]
fn update_is_forwarded_only_when_idle_with_a_scene() {
    let mut rig = Rig::new();
    let gate = Gate::new();
    rig.register("menu", SceneSpec::default());
    rig.register(
        "slow",
        SceneSpec {
            load_gate: Some(gate.clone()),
            ..Default::default()
        },
    );

    // No active scene: update is a no-op.
    rig.director.update(0.016);
    assert!(rig.log.borrow().is_empty());

    rig.change("menu", Fade::none()).unwrap();
    rig.director.update(0.016);
    assert!(rig.log.borrow().iter().any(|e| e == "menu:update"));

    // Mid-transition: update dispatch pauses.
    let before = rig.log.borrow().len();
    let slot = rig.spawn_change("slow", Fade::none());
    rig.director.update(0.016);
    assert_eq!(rig.log.borrow().len(), before + 1); // only menu:unload
    assert!(rig.log.borrow().last().unwrap().ends_with(":unload"));

    gate.open();
    rig.pump(&slot);
    assert!(slot.borrow_mut().take().unwrap().is_ok());
}

#[test]
fn navigator_requests_run_through_the_executor() {
    let mut rig = Rig::new();
    rig.register("menu", SceneSpec::default());

    let navigator = rig.director.navigator();
    navigator.go("menu", Fade::none());
    rig.pool.run_until_stalled();

    assert_eq!(rig.director.current_name().as_deref(), Some("menu"));

    // A rejected request (unknown name) is logged, not surfaced, and
    // leaves the active scene alone.
    navigator.go("warehouse", Fade::none());
    rig.pool.run_until_stalled();
    assert_eq!(rig.director.current_name().as_deref(), Some("menu"));
}
