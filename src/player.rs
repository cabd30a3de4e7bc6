//! Player session state shared across scenes.
//!
//! Everything here is UI-side bookkeeping: which choices the player
//! picked, what their roster looks like. Grading, rewards, and
//! persistence are the backend's business; this state lives only for
//! the process.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to the session, cloned into scene factories.
pub type SessionHandle = Rc<RefCell<Session>>;

/// One creature in the player's collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Creature {
    pub name: String,
    pub species: String,
    pub level: u32,
    /// Current and maximum hit points, for the battle display.
    pub hp: (u32, u32),
}

/// Per-run player state.
#[derive(Default)]
pub struct Session {
    pub player_name: String,
    /// Selected answers: question id → choice id. Re-answering a
    /// question replaces the earlier selection.
    answers: HashMap<String, String>,
    roster: Vec<Creature>,
}

impl Session {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Default::default()
        }
    }

    /// Record the player's selected choice for a question.
    pub fn select_answer(&mut self, question_id: impl Into<String>, choice_id: impl Into<String>) {
        self.answers.insert(question_id.into(), choice_id.into());
    }

    /// The selected choice for a question, if any.
    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    /// Number of questions answered so far.
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Drop all recorded answers (on entering a fresh quiz run).
    pub fn clear_answers(&mut self) {
        self.answers.clear();
    }

    pub fn add_creature(&mut self, creature: Creature) {
        self.roster.push(creature);
    }

    pub fn roster(&self) -> &[Creature] {
        &self.roster
    }
}

/// A starter roster so the battle and collection screens have something
/// to show before the backend is wired up.
pub fn starter_session(player_name: &str) -> SessionHandle {
    let mut session = Session::new(player_name);
    session.add_creature(Creature {
        name: "Pebble".into(),
        species: "Stonewing".into(),
        level: 3,
        hp: (18, 22),
    });
    session.add_creature(Creature {
        name: "Ember".into(),
        species: "Cindertail".into(),
        level: 2,
        hp: (15, 15),
    });
    Rc::new(RefCell::new(session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_map_question_to_choice() {
        let mut session = Session::new("ada");
        session.select_answer("q1", "a");
        session.select_answer("q2", "c");
        assert_eq!(session.answer("q1"), Some("a"));
        assert_eq!(session.answered_count(), 2);
        assert_eq!(session.answer("q3"), None);
    }

    #[test]
    fn reanswering_replaces_the_selection() {
        let mut session = Session::new("ada");
        session.select_answer("q1", "a");
        session.select_answer("q1", "b");
        assert_eq!(session.answer("q1"), Some("b"));
        assert_eq!(session.answered_count(), 1);
    }

    #[test]
    fn clear_answers_resets_the_run() {
        let mut session = Session::new("ada");
        session.select_answer("q1", "a");
        session.clear_answers();
        assert_eq!(session.answered_count(), 0);
    }

    #[test]
    fn starter_roster_is_populated() {
        let session = starter_session("ada");
        assert_eq!(session.borrow().roster().len(), 2);
    }
}
