use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;

use paideia::scene::Scene;
use paideia::scenes::{
    BattleScene, CollectionScene, MenuScene, OverworldScene, QuizScene, names,
};
use paideia::{AppConfig, ContentLibrary, run, starter_session};

/// The Paideia Quest client shell.
#[derive(Parser)]
#[command(name = "paideia", version, about)]
struct Cli {
    /// Path to the quiz content catalog (JSON).
    #[arg(long, default_value = "assets/content.json")]
    content: PathBuf,

    /// Path to a TTF/OTF font for UI text.
    #[arg(long, default_value = "assets/fonts/ui.ttf")]
    font: PathBuf,

    /// UI font size in pixels.
    #[arg(long, default_value_t = 18.0)]
    font_size: f32,

    /// Directory with optional tile art (grass.png, path.png); the
    /// overworld falls back to procedural tiles without it.
    #[arg(long)]
    sprites: Option<PathBuf>,

    /// Window width in pixels.
    #[arg(long, default_value_t = 960)]
    width: u32,

    /// Window height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Player display name.
    #[arg(long, default_value = "Wanderer")]
    player: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let content = Rc::new(ContentLibrary::from_path(&cli.content)?);
    let session = starter_session(&cli.player);

    let config = AppConfig::new()
        .title("Paideia Quest")
        .size(cli.width, cli.height)
        .font(&cli.font, cli.font_size);

    let player = cli.player;
    let sprites = cli.sprites;

    run(config, move |shell| {
        let director = &shell.director;

        director.register(names::MENU, {
            let player = player.clone();
            move |ctx| Box::new(MenuScene::new(ctx, player.clone())) as Box<dyn Scene>
        })?;

        director.register(names::OVERWORLD, {
            let sprites = sprites.clone();
            move |ctx| Box::new(OverworldScene::new(ctx, sprites.clone())) as Box<dyn Scene>
        })?;

        director.register(names::QUIZ, {
            let content = content.clone();
            let session = session.clone();
            move |ctx| {
                Box::new(QuizScene::new(ctx, content.clone(), session.clone(), None))
                    as Box<dyn Scene>
            }
        })?;

        director.register(names::BATTLE, {
            let session = session.clone();
            move |ctx| Box::new(BattleScene::new(ctx, session.clone())) as Box<dyn Scene>
        })?;

        director.register(names::COLLECTION, {
            let session = session.clone();
            move |ctx| Box::new(CollectionScene::new(ctx, session.clone())) as Box<dyn Scene>
        })?;

        shell.start(names::MENU);
        Ok(())
    })?;

    Ok(())
}
