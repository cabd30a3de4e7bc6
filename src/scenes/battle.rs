//! The battle screen: a presentational view of two combatants.
//!
//! Battle resolution is authoritative on the backend; this screen only
//! renders the matchup the shell knows about and lets the player flee.

use futures::future::LocalBoxFuture;
use winit::keyboard::KeyCode;

use crate::draw2d::{Canvas, Color, Rect};
use crate::input::InputHandle;
use crate::player::{Creature, SessionHandle};
use crate::scene::{Fade, Navigator, Scene, SceneContext, SceneError};
use crate::stage::{LayerId, StageHandle};

use super::names;

pub struct BattleScene {
    stage: StageHandle,
    input: InputHandle,
    navigator: Navigator,
    layer: LayerId,
    session: SessionHandle,

    fighter: Option<Creature>,
    opponent: Creature,
    /// Idle bob for the combatant panels.
    sway: f32,
}

impl BattleScene {
    pub fn new(ctx: &SceneContext, session: SessionHandle) -> Self {
        let layer = ctx.stage.borrow_mut().create_layer("battle");
        Self {
            stage: ctx.stage.clone(),
            input: ctx.input.clone(),
            navigator: ctx.navigator.clone(),
            layer,
            session,
            fighter: None,
            opponent: Creature {
                name: "Thornback".into(),
                species: "Briarling".into(),
                level: 3,
                hp: (20, 20),
            },
            sway: 0.0,
        }
    }

    fn combatant_panel(&self, canvas_rect: Rect, creature: &Creature, canvas: &mut Canvas) {
        canvas.panel(canvas_rect, Color::PANEL_BG, Color::PANEL_BORDER);
        canvas.text(
            canvas_rect.x + 14.0,
            canvas_rect.y + 10.0,
            format!("{} (Lv {})", creature.name, creature.level),
            Color::WHITE,
        );
        canvas.text(
            canvas_rect.x + 14.0,
            canvas_rect.y + 36.0,
            &creature.species,
            Color::rgba(0.7, 0.7, 0.75, 1.0),
        );

        let (hp, max) = creature.hp;
        let bar = Rect::new(canvas_rect.x + 14.0, canvas_rect.y + 66.0, canvas_rect.width - 28.0, 10.0);
        canvas.rect(bar, Color::rgba(0.2, 0.2, 0.22, 1.0));
        let fill = bar.width * hp as f32 / max as f32;
        canvas.rect(
            Rect::new(bar.x, bar.y, fill, bar.height),
            Color::rgb(0.35, 0.8, 0.4),
        );
        canvas.text(
            bar.x,
            bar.y + 14.0,
            format!("{hp}/{max}"),
            Color::rgba(0.7, 0.7, 0.75, 1.0),
        );
    }

    fn repaint(&mut self) {
        let (width, height) = self.stage.borrow().size();
        let Some(fighter) = self.fighter.clone() else {
            return;
        };
        let opponent = self.opponent.clone();
        let bob = (self.sway.sin() * 4.0).round();

        let mut stage = self.stage.borrow_mut();
        let Some(canvas) = stage.canvas(self.layer) else {
            return;
        };
        canvas.clear();
        canvas.set_background(Color::rgb(0.1, 0.07, 0.08));

        let panel_w = 260.0;
        let panel_h = 110.0;
        self.combatant_panel(
            Rect::new(40.0, height as f32 - panel_h - 50.0 + bob, panel_w, panel_h),
            &fighter,
            canvas,
        );
        self.combatant_panel(
            Rect::new(width as f32 - panel_w - 40.0, 50.0 - bob, panel_w, panel_h),
            &opponent,
            canvas,
        );

        canvas.text(
            40.0,
            height as f32 - 28.0,
            "[Esc] Flee to the overworld",
            Color::WHITE,
        );
    }
}

impl Scene for BattleScene {
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async move {
            let fighter = self
                .session
                .borrow()
                .roster()
                .first()
                .cloned()
                .ok_or_else(|| SceneError::content("no creature in the roster to battle with"))?;
            self.fighter = Some(fighter);
            self.repaint();
            Ok(())
        })
    }

    fn update(&mut self, dt: f32) {
        self.sway += dt * 2.0;
        if self.input.borrow().key_pressed(KeyCode::Escape) {
            self.navigator.go(names::OVERWORLD, Fade::millis(300.0));
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
    use crate::input::Input;
    use crate::player::{Session, starter_session};
    use crate::scene::{Director, FrameClock};
    use crate::stage::headless::HeadlessStage;
    use futures::executor::{LocalPool, block_on};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context() -> SceneContext {
        let pool = LocalPool::new();
        let stage: StageHandle = Rc::new(RefCell::new(HeadlessStage::new(800, 600)));
        let input: InputHandle = Rc::new(RefCell::new(Input::new()));
        let director = Director::new(
            stage.clone(),
            FrameClock::new(),
            input.clone(),
            pool.spawner(),
        );
        SceneContext {
            stage,
            input,
            navigator: director.navigator(),
        }
    }

    #[test]
    fn load_takes_the_first_roster_creature() {
        let ctx = context();
        let mut scene = BattleScene::new(&ctx, starter_session("ada"));
        block_on(scene.load()).unwrap();
        assert_eq!(scene.fighter.as_ref().unwrap().name, "Pebble");
    }

    #[test]
    fn load_fails_with_an_empty_roster() {
        let ctx = context();
        let session = Rc::new(RefCell::new(Session::new("ada")));
        let mut scene = BattleScene::new(&ctx, session);
        let err = block_on(scene.load()).unwrap_err();
        assert!(matches!(err, SceneError::Content(_)));
    }
}
