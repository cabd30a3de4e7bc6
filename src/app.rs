//! The windowed app runner.
//!
//! Wires winit, the GPU-backed stage, input, the frame clock, and the
//! transition executor into one render loop. Scene registration happens
//! in a setup closure once the window and GPU exist.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use futures::executor::LocalPool;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::draw2d::Color;
use crate::gpu::GpuContext;
use crate::input::{Input, InputHandle};
use crate::scene::{Director, DirectorError, Fade, FrameClock};
use crate::stage::{CanvasStage, StageHandle};

/// Failure starting or running the shell.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Configuration for the app window and startup assets.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    /// TTF/OTF font for UI text, loaded at startup.
    pub font_path: PathBuf,
    pub font_size: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Paideia".to_string(),
            width: 960,
            height: 600,
            background: Color::BLACK,
            font_path: PathBuf::from("assets/fonts/ui.ttf"),
            font_size: 18.0,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>, size: f32) -> Self {
        self.font_path = path.into();
        self.font_size = size;
        self
    }
}

/// Handed to the setup closure once the window and GPU are up.
pub struct SetupContext {
    /// The scene director; register scenes here.
    pub director: Rc<Director>,
    /// The windowed stage, for loading extra assets at startup.
    pub stage: Rc<RefCell<CanvasStage>>,
}

impl SetupContext {
    /// Queue the opening transition into the named scene.
    pub fn start(&self, name: &str) {
        self.director.navigator().go(name, Fade::none());
    }
}

type SetupFn = Box<dyn FnOnce(&SetupContext) -> Result<(), DirectorError>>;

/// Run the shell: open a window, build the stage and director, hand
/// them to `setup`, then drive the render loop until the window closes.
///
/// Each frame publishes a clock tick, steps the transition executor,
/// dispatches `update` to the active scene, steps the executor again so
/// transitions requested from inside the update start on the same
/// frame, and renders the stage.
pub fn run<S>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&SetupContext) -> Result<(), DirectorError> + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ShellApp::Pending {
        config,
        setup: Some(Box::new(setup)),
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}

enum ShellApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        stage: Rc<RefCell<CanvasStage>>,
        director: Rc<Director>,
        input: InputHandle,
        clock: FrameClock,
        pool: LocalPool,
        last_frame: Instant,
    },
}

impl ApplicationHandler for ShellApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let ShellApp::Pending { config, setup } = self {
            let window_attrs = WindowAttributes::default()
                .with_title(&config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

            let window = Arc::new(event_loop.create_window(window_attrs).unwrap());
            let gpu = GpuContext::new(window.clone());

            let mut canvas_stage = CanvasStage::new(gpu);
            canvas_stage.set_background(config.background);
            if let Err(err) = canvas_stage.load_font(&config.font_path, config.font_size) {
                log::error!("failed to load UI font: {err}");
                event_loop.exit();
                return;
            }

            let stage = Rc::new(RefCell::new(canvas_stage));
            let stage_handle: StageHandle = stage.clone();
            let input: InputHandle = Rc::new(RefCell::new(Input::new()));
            let clock = FrameClock::new();
            let pool = LocalPool::new();
            let director = Director::new(
                stage_handle,
                clock.clone(),
                input.clone(),
                pool.spawner(),
            );

            let setup_fn = setup.take().unwrap();
            let ctx = SetupContext {
                director: director.clone(),
                stage: stage.clone(),
            };
            if let Err(err) = setup_fn(&ctx) {
                log::error!("scene setup failed: {err}");
                event_loop.exit();
                return;
            }

            *self = ShellApp::Running {
                window,
                stage,
                director,
                input,
                clock,
                pool,
                last_frame: Instant::now(),
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let ShellApp::Running {
            window,
            stage,
            director,
            input,
            clock,
            pool,
            last_frame,
        } = self
        else {
            return;
        };

        input.borrow_mut().handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                stage.borrow_mut().resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                // Wake fades and pending scene loads with this frame's dt.
                clock.tick(dt);
                pool.run_until_stalled();

                director.update(dt);
                // Start any transition the update just requested.
                pool.run_until_stalled();

                stage.borrow_mut().render();

                input.borrow_mut().begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
