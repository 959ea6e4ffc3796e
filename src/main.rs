/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use config::AppConfig;
use domain::content::Content;
use error::AppError;
use sim::event::{AppEvent, Intent};
use sim::gallery::{self, Route};
use sim::music::{AudioBackend, FadeSettings, MusicController};
use sim::prefs::{self, FileStorage, SoundPreference};
use sim::world::AppState;
use ui::gamepad::GamepadState;
use ui::input::{self, InputState, Pointer};
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "ethan-select.log";

#[derive(Parser, Debug)]
#[command(name = "ethan-select", version, about = "Select your Ethan: a character-select portfolio")]
struct Cli {
    /// Asset directory holding music/, projects/ and an optional content.toml
    #[arg(long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Run without music or sound effects
    #[arg(long)]
    no_audio: bool,

    /// Log file (default: ethan-select.log in the data directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print every project route and exit
    #[arg(long)]
    routes: bool,

    /// Print one project page and exit
    #[arg(long, value_name = "PERSONA/PROJECT")]
    page: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let data_dir = prefs::data_dir();
    init_logger(cli.log_file.as_deref().unwrap_or(&data_dir.join(LOG_FILE)));

    let mut config = AppConfig::load();
    log::set_max_level(config.log_level);
    if let Some(dir) = &cli.assets {
        config.assets_dir = dir.clone();
    }
    if cli.no_audio {
        config.audio_enabled = false;
    }

    let content = Content::load(&config.assets_dir);
    if content.is_empty() {
        eprintln!("{}", AppError::EmptyContent);
        return ExitCode::FAILURE;
    }

    if cli.routes {
        for route in gallery::routes(&content) {
            println!("{}", route.path());
        }
        return ExitCode::SUCCESS;
    }
    if let Some(route) = &cli.page {
        return match print_page(&content, &config.assets_dir, route) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let prefs = SoundPreference::load(Box::new(FileStorage::open(&data_dir)));
    let mut app = AppState::new(content, prefs, &config);

    let backend = sound::music_backend(config.audio_enabled);
    let mut music = MusicController::new(
        backend,
        &config.assets_dir,
        FadeSettings::from(&config.timing),
        app.sound_on(),
    );
    music.listen(app.prefs.subscribe());
    let sfx = if config.audio_enabled { SoundEngine::new() } else { None };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(&mut app, &mut renderer, &mut music, sfx.as_ref(), &config);
    music.shutdown();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Install the logger first, at Warn, so config loading can already log.
/// Raw mode owns the terminal, so records go to a file.
fn init_logger(path: &Path) {
    let mut builder = env_logger::builder();
    builder.filter_level(log::LevelFilter::Trace);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match File::create(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("could not open log file {}: {e}", path.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
    log::set_max_level(log::LevelFilter::Warn);
}

fn print_page(content: &Content, assets_dir: &Path, path: &str) -> Result<(), AppError> {
    let route = Route::parse(path)?;
    let page = gallery::open_page(content, assets_dir, &route)?;
    let Some(persona) = content.get(page.persona) else {
        return Err(AppError::EmptyContent);
    };
    let Some(project) = persona.projects.get(page.project) else {
        return Err(AppError::EmptyContent);
    };

    println!("{}", route.path());
    println!("{} ({})", project.title, persona.display_name());
    println!("{}", project.subtitle);
    if !project.description.is_empty() {
        println!();
        println!("{}", project.description);
    }
    if !project.content.is_empty() {
        println!();
        println!("{}", project.content);
    }
    if let Some(url) = &project.demo_url {
        println!();
        println!("Demo: {url}");
    }
    println!();
    println!("Images ({}):", page.images.len());
    for image in &page.images {
        println!("  {image}");
    }
    Ok(())
}

fn run(
    app: &mut AppState,
    renderer: &mut Renderer,
    music: &mut MusicController<Box<dyn AudioBackend>>,
    sfx: Option<&SoundEngine>,
    config: &AppConfig,
) -> Result<(), AppError> {
    let mut kb = InputState::new(&config.input);
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let start = Instant::now();

    loop {
        let now = start.elapsed().as_millis() as u64;

        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if kb.interacted() || gp.interacted() {
            music.on_user_interaction();
        }

        let mut events = Vec::new();
        for intent in collect_intents(&kb, &gp, renderer) {
            events.extend(app.apply(intent, now));
        }
        events.extend(app.update(now));
        play_cues(sfx, &events);

        if app.quit {
            break;
        }

        music.update(app.screen, app.persona(), now);
        renderer.render(app, now)?;

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn collect_intents(kb: &InputState, gp: &GamepadState, renderer: &Renderer) -> Vec<Intent> {
    let mut out: Vec<Intent> = kb.presses().iter().filter_map(|&c| input::key_intent(c)).collect();

    for p in &kb.pointer {
        match *p {
            Pointer::Click { col, row } => {
                if let Some(target) = renderer.hit_test(col, row) {
                    out.push(Intent::Click(target));
                }
            }
            Pointer::Swipe(s) => out.push(Intent::Swipe(s)),
            Pointer::WheelX(d) => out.push(Intent::WheelX(d)),
            Pointer::WheelY(d) => out.push(Intent::WheelY(d)),
        }
    }

    out.extend(gp.intents());
    out
}

fn play_cues(sfx: Option<&SoundEngine>, events: &[AppEvent]) {
    let Some(sfx) = sfx else { return };
    for event in events {
        if let AppEvent::Cue(cue) = event {
            sfx.play(*cue);
        }
    }
}
