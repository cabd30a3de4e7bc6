//! The collection screen: the player's creature roster.

use futures::future::LocalBoxFuture;
use winit::keyboard::KeyCode;

use crate::draw2d::{Color, Rect};
use crate::input::InputHandle;
use crate::player::SessionHandle;
use crate::scene::{Fade, Navigator, Scene, SceneContext, SceneError};
use crate::stage::{LayerId, StageHandle};

use super::names;

const ROW_HEIGHT: f32 = 52.0;

pub struct CollectionScene {
    stage: StageHandle,
    input: InputHandle,
    navigator: Navigator,
    layer: LayerId,
    session: SessionHandle,
}

impl CollectionScene {
    pub fn new(ctx: &SceneContext, session: SessionHandle) -> Self {
        let layer = ctx.stage.borrow_mut().create_layer("collection");
        Self {
            stage: ctx.stage.clone(),
            input: ctx.input.clone(),
            navigator: ctx.navigator.clone(),
            layer,
            session,
        }
    }

    fn repaint(&mut self) {
        let (width, _) = self.stage.borrow().size();
        let roster: Vec<_> = self.session.borrow().roster().to_vec();

        let mut stage = self.stage.borrow_mut();
        let Some(canvas) = stage.canvas(self.layer) else {
            return;
        };
        canvas.clear();
        canvas.set_background(Color::rgb(0.07, 0.08, 0.1));

        canvas.text(40.0, 24.0, "Collection", Color::rgb(0.95, 0.88, 0.55));

        if roster.is_empty() {
            canvas.text(40.0, 80.0, "No creatures yet.", Color::WHITE);
        }

        for (i, creature) in roster.iter().enumerate() {
            let rect = Rect::new(
                40.0,
                70.0 + i as f32 * (ROW_HEIGHT + 8.0),
                width as f32 - 80.0,
                ROW_HEIGHT,
            );
            canvas.panel(rect, Color::PANEL_BG, Color::PANEL_BORDER);
            canvas.text(
                rect.x + 14.0,
                rect.y + 6.0,
                format!("{} (Lv {})", creature.name, creature.level),
                Color::WHITE,
            );
            canvas.text(
                rect.x + 14.0,
                rect.y + 28.0,
                &creature.species,
                Color::rgba(0.7, 0.7, 0.75, 1.0),
            );
        }

        canvas.text(
            40.0,
            70.0 + roster.len().max(1) as f32 * (ROW_HEIGHT + 8.0) + 12.0,
            "[Esc] Back to the menu",
            Color::WHITE,
        );
    }
}

impl Scene for CollectionScene {
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async move {
            self.repaint();
            Ok(())
        })
    }

    fn update(&mut self, _dt: f32) {
        if self.input.borrow().key_pressed(KeyCode::Escape) {
            self.navigator.go(names::MENU, Fade::millis(300.0));
        }
        self.repaint();
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
    use crate::draw2d::DrawCmd;
    use crate::input::Input;
    use crate::player::starter_session;
    use crate::scene::{Director, FrameClock};
    use crate::stage::headless::HeadlessStage;
    use futures::executor::{LocalPool, block_on};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn load_paints_one_row_per_creature() {
        let pool = LocalPool::new();
        let stage: StageHandle = Rc::new(RefCell::new(HeadlessStage::new(800, 600)));
        let input: InputHandle = Rc::new(RefCell::new(Input::new()));
        let director = Director::new(
            stage.clone(),
            FrameClock::new(),
            input.clone(),
            pool.spawner(),
        );
        let ctx = SceneContext {
            stage: stage.clone(),
            input,
            navigator: director.navigator(),
        };

        let mut scene = CollectionScene::new(&ctx, starter_session("ada"));
        block_on(scene.load()).unwrap();

        let mut stage = stage.borrow_mut();
        let canvas = stage.canvas(scene.layer()).unwrap();
        let texts = canvas
            .cmds()
            .iter()
            .filter(|cmd| matches!(cmd, DrawCmd::Text { .. }))
            .count();
        // Title + 2 rows x 2 lines + footer hint.
        assert_eq!(texts, 1 + 2 * 2 + 1);
    }
}
