//! The shell's screens: menu, overworld, quiz, battle, collection.
//!
//! Each screen implements [`Scene`](crate::scene::Scene), paints into
//! its own stage layer, and requests transitions through the
//! [`Navigator`](crate::scene::Navigator) it was constructed with.
//! These scenes render state and record player intent; the authoritative
//! game logic they would feed (grading, rewards, battle resolution)
//! lives behind the backend and is not modeled here.

mod battle;
mod collection;
mod menu;
mod overworld;
mod quiz;

pub use battle::BattleScene;
pub use collection::CollectionScene;
pub use menu::MenuScene;
pub use overworld::OverworldScene;
pub use quiz::QuizScene;

/// Canonical scene names used at registration and in transitions.
pub mod names {
    pub const MENU: &str = "menu";
    pub const OVERWORLD: &str = "overworld";
    pub const QUIZ: &str = "quiz";
    pub const BATTLE: &str = "battle";
    pub const COLLECTION: &str = "collection";
}
