//! Title screen.

use futures::future::LocalBoxFuture;

use crate::draw2d::{Color, Rect};
use crate::input::InputHandle;
use crate::scene::{Fade, Navigator, Scene, SceneContext, SceneError};
use crate::stage::{LayerId, StageHandle};

use super::names;

const BUTTON_WIDTH: f32 = 280.0;
const BUTTON_HEIGHT: f32 = 44.0;
const BUTTON_GAP: f32 = 14.0;

struct Button {
    label: &'static str,
    destination: &'static str,
}

const BUTTONS: &[Button] = &[
    Button {
        label: "Adventure",
        destination: names::OVERWORLD,
    },
    Button {
        label: "Quiz",
        destination: names::QUIZ,
    },
    Button {
        label: "Collection",
        destination: names::COLLECTION,
    },
];

/// The title screen: a column of buttons, each opening another scene.
pub struct MenuScene {
    stage: StageHandle,
    input: InputHandle,
    navigator: Navigator,
    layer: LayerId,
    player_name: String,
}

impl MenuScene {
    pub fn new(ctx: &SceneContext, player_name: impl Into<String>) -> Self {
        let layer = ctx.stage.borrow_mut().create_layer("menu");
        Self {
            stage: ctx.stage.clone(),
            input: ctx.input.clone(),
            navigator: ctx.navigator.clone(),
            layer,
            player_name: player_name.into(),
        }
    }

    fn button_rect(&self, index: usize) -> Rect {
        let (width, height) = self.stage.borrow().size();
        let x = (width as f32 - BUTTON_WIDTH) / 2.0;
        let top = height as f32 * 0.45;
        Rect::new(
            x,
            top + index as f32 * (BUTTON_HEIGHT + BUTTON_GAP),
            BUTTON_WIDTH,
            BUTTON_HEIGHT,
        )
    }

    fn repaint(&mut self, hover: Option<usize>) {
        let (width, _) = self.stage.borrow().size();
        let rects: Vec<Rect> = (0..BUTTONS.len()).map(|i| self.button_rect(i)).collect();

        let mut stage = self.stage.borrow_mut();
        let Some(canvas) = stage.canvas(self.layer) else {
            return;
        };
        canvas.clear();
        canvas.set_background(Color::rgb(0.07, 0.08, 0.12));

        canvas.text(
            width as f32 / 2.0 - 110.0,
            90.0,
            "PAIDEIA QUEST",
            Color::rgb(0.95, 0.88, 0.55),
        );
        canvas.text(
            width as f32 / 2.0 - 110.0,
            130.0,
            format!("Welcome back, {}", self.player_name),
            Color::rgba(0.8, 0.8, 0.85, 1.0),
        );

        for (i, (button, rect)) in BUTTONS.iter().zip(&rects).enumerate() {
            let bg = if hover == Some(i) {
                Color::rgba(0.2, 0.22, 0.3, 0.95)
            } else {
                Color::PANEL_BG
            };
            canvas.panel(*rect, bg, Color::PANEL_BORDER);
            canvas.text(
                rect.x + 18.0,
                rect.y + 10.0,
                button.label,
                Color::WHITE,
            );
        }
    }
}

impl Scene for MenuScene {
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async move {
            self.repaint(None);
            Ok(())
        })
    }

    fn update(&mut self, _dt: f32) {
        let (mouse, clicked) = {
            let input = self.input.borrow();
            (input.mouse_position(), input.clicked())
        };

        let hover = (0..BUTTONS.len()).find(|&i| self.button_rect(i).contains(mouse));
        if clicked
            && let Some(i) = hover
        {
            self.navigator.go(BUTTONS[i].destination, Fade::millis(300.0));
        }

        self.repaint(hover);
    }

    fn unload(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async { Ok(()) })
    }

    fn layer(&self) -> LayerId {
        self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::scene::{Director, FrameClock};
    use crate::stage::headless::HeadlessStage;
    use futures::executor::{LocalPool, block_on};
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context() -> (SceneContext, StageHandle) {
        let pool = LocalPool::new();
        let stage: StageHandle = Rc::new(RefCell::new(HeadlessStage::new(800, 600)));
        let input: InputHandle = Rc::new(RefCell::new(Input::new()));
        let director = Director::new(
            stage.clone(),
            FrameClock::new(),
            input.clone(),
            pool.spawner(),
        );
        (
            SceneContext {
                stage: stage.clone(),
                input,
                navigator: director.navigator(),
            },
            stage,
        )
    }

    #[test]
    fn load_paints_title_and_buttons() {
        let (ctx, stage) = context();
        let mut scene = MenuScene::new(&ctx, "ada");
        block_on(scene.load()).unwrap();

        let mut stage = stage.borrow_mut();
        let canvas = stage.canvas(scene.layer()).unwrap();
        // Two title lines plus five commands per button panel + label.
        assert_eq!(canvas.cmds().len(), 2 + BUTTONS.len() * 6);
    }

    #[test]
    fn hover_tracks_button_rects() {
        let (ctx, _stage) = context();
        let scene = MenuScene::new(&ctx, "ada");
        let rect = scene.button_rect(0);
        assert!(rect.contains(Vec2::new(rect.x + 1.0, rect.y + 1.0)));
        assert!(!scene.button_rect(1).contains(Vec2::new(rect.x, rect.y)));
    }
}
