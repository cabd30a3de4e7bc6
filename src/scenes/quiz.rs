//! The quiz screen: one question at a time, selected answers recorded
//! in the session.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use winit::keyboard::KeyCode;

use crate::content::{ContentLibrary, Quiz};
use crate::draw2d::{Color, Rect};
use crate::input::InputHandle;
use crate::player::SessionHandle;
use crate::scene::{Fade, Navigator, Scene, SceneContext, SceneError};
use crate::stage::{LayerId, StageHandle};

use super::names;

const CHOICE_HEIGHT: f32 = 40.0;
const CHOICE_GAP: f32 = 10.0;

/// Presents a quiz question by question.
///
/// Clicking a choice records it (question id → choice id) in the session
/// and advances; after the last question a summary is shown. The shell
/// records intent only — grading belongs to the backend.
pub struct QuizScene {
    stage: StageHandle,
    input: InputHandle,
    navigator: Navigator,
    layer: LayerId,
    content: Rc<ContentLibrary>,
    session: SessionHandle,
    quiz_id: Option<String>,

    quiz: Option<Quiz>,
    current: usize,
    finished: bool,
}

impl QuizScene {
    pub fn new(
        ctx: &SceneContext,
        content: Rc<ContentLibrary>,
        session: SessionHandle,
        quiz_id: Option<String>,
    ) -> Self {
        let layer = ctx.stage.borrow_mut().create_layer("quiz");
        Self {
            stage: ctx.stage.clone(),
            input: ctx.input.clone(),
            navigator: ctx.navigator.clone(),
            layer,
            content,
            session,
            quiz_id,
            quiz: None,
            current: 0,
            finished: false,
        }
    }

    fn panel_rect(&self) -> Rect {
        let (width, height) = self.stage.borrow().size();
        let w = (width as f32 - 120.0).max(320.0);
        let h = (height as f32 - 120.0).max(240.0);
        Rect::new(
            (width as f32 - w) / 2.0,
            (height as f32 - h) / 2.0,
            w,
            h,
        )
    }

    fn choice_rect(&self, panel: Rect, index: usize) -> Rect {
        Rect::new(
            panel.x + 24.0,
            panel.y + 110.0 + index as f32 * (CHOICE_HEIGHT + CHOICE_GAP),
            panel.width - 48.0,
            CHOICE_HEIGHT,
        )
    }

    fn repaint(&mut self) {
        let panel = self.panel_rect();
        let Some(quiz) = self.quiz.clone() else {
            return;
        };
        let answered = self.session.borrow().answered_count();
        let current = self.current;
        let finished = self.finished;

        let mut stage = self.stage.borrow_mut();
        let Some(canvas) = stage.canvas(self.layer) else {
            return;
        };
        canvas.clear();
        canvas.set_background(Color::rgb(0.06, 0.06, 0.1));
        canvas.panel(panel, Color::PANEL_BG, Color::PANEL_BORDER);
        canvas.text(panel.x + 24.0, panel.y + 16.0, &quiz.title, Color::rgb(0.95, 0.88, 0.55));

        if finished {
            canvas.text(
                panel.x + 24.0,
                panel.y + 70.0,
                format!("Answers recorded: {answered} of {}", quiz.questions.len()),
                Color::WHITE,
            );
            canvas.text(
                panel.x + 24.0,
                panel.y + 110.0,
                "[Enter] Back to the overworld",
                Color::rgba(0.8, 0.8, 0.85, 1.0),
            );
            return;
        }

        let question = &quiz.questions[current];
        canvas.text(
            panel.x + 24.0,
            panel.y + 46.0,
            format!(
                "Question {} of {}",
                current + 1,
                quiz.questions.len()
            ),
            Color::rgba(0.7, 0.7, 0.75, 1.0),
        );
        canvas.text(panel.x + 24.0, panel.y + 72.0, &question.prompt, Color::WHITE);

        for (i, choice) in question.choices.iter().enumerate() {
            let rect = self.choice_rect(panel, i);
            canvas.panel(rect, Color::rgba(0.14, 0.15, 0.2, 0.95), Color::PANEL_BORDER);
            canvas.text(rect.x + 14.0, rect.y + 8.0, &choice.text, Color::WHITE);
        }
    }
}

impl Scene for QuizScene {
    fn load(&mut self) -> LocalBoxFuture<'_, Result<(), SceneError>> {
        Box::pin(async move {
            let quiz = match &self.quiz_id {
                Some(id) => self
                    .content
                    .quiz(id)
                    .cloned()
                    .ok_or_else(|| SceneError::content(format!("unknown quiz {id:?}")))?,
                None => self.content.first_quiz().clone(),
            };
            self.session.borrow_mut().clear_answers();
            self.quiz = Some(quiz);
            self.repaint();
            Ok(())
        })
    }

    fn update(&mut self, _dt: f32) {
        let (mouse, clicked, enter) = {
            let input = self.input.borrow();
            (
                input.mouse_position(),
                input.clicked(),
                input.key_pressed(KeyCode::Enter) || input.key_pressed(KeyCode::Escape),
            )
        };

        if self.finished {
            if enter || clicked {
                self.navigator.go(names::OVERWORLD, Fade::millis(300.0));
            }
            self.repaint();
            return;
        }

        if clicked && let Some(quiz) = &self.quiz {
            let panel = self.panel_rect();
            let question = &quiz.questions[self.current];
            if let Some(choice) = question
                .choices
                .iter()
                .enumerate()
                .find(|(i, _)| self.choice_rect(panel, *i).contains(mouse))
                .map(|(_, choice)| choice)
            {
                self.session
                    .borrow_mut()
                    .select_answer(&question.id, &choice.id);
                if self.current + 1 < quiz.questions.len() {
                    self.current += 1;
                } else {
                    self.finished = true;
                }
            }
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
