/// External configuration loader.
///
/// Reads `config.toml` from the first directory that has one (see `candidate_dirs`).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub assets_dir: PathBuf,
    pub log_level: log::LevelFilter,
    pub gallery: GalleryKind,
    pub timing: TimingConfig,
    pub input: InputConfig,
    pub audio_enabled: bool,
    pub gamepad: GamepadConfig,
}

/// Which project gallery the title screen opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryKind {
    /// One project per page, paged vertically.
    Slideshow,
    /// All projects as cards in a grid.
    Showcase,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub carousel_ms: u64,
    pub title_ms: u64,
    pub slideshow_ms: u64,
    pub fade_out_ms: u64,
    pub fade_out_steps: u32,
    pub fade_in_ms: u64,
    pub fade_in_steps: u32,
    pub target_volume: f32,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub wheel_threshold: f32,
    pub slideshow_wheel_threshold: f32,
    pub swipe_threshold_px: f32,
    pub wheel_step: f32,    // delta reported per wheel notch
    pub cell_width_px: f32,
    pub cell_height_px: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub mute: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_assets_dir")]
    assets_dir: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_gallery")]
    gallery: String,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_carousel_ms")]
    carousel_ms: u64,
    #[serde(default = "default_title_ms")]
    title_ms: u64,
    #[serde(default = "default_slideshow_ms")]
    slideshow_ms: u64,
    #[serde(default = "default_fade_out_ms")]
    fade_out_ms: u64,
    #[serde(default = "default_fade_out_steps")]
    fade_out_steps: u32,
    #[serde(default = "default_fade_in_ms")]
    fade_in_ms: u64,
    #[serde(default = "default_fade_in_steps")]
    fade_in_steps: u32,
    #[serde(default = "default_target_volume")]
    target_volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_wheel_threshold")]
    wheel_threshold: f32,
    #[serde(default = "default_slideshow_wheel_threshold")]
    slideshow_wheel_threshold: f32,
    #[serde(default = "default_swipe_threshold")]
    swipe_threshold_px: f32,
    #[serde(default = "default_wheel_step")]
    wheel_step: f32,
    #[serde(default = "default_cell_width")]
    cell_width_px: f32,
    #[serde(default = "default_cell_height")]
    cell_height_px: f32,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_true")]
    enabled: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_mute")]
    mute: Vec<String>,
}

// ── Defaults ──

fn default_assets_dir() -> String { "public".into() }
fn default_log_level() -> String { "info".into() }
fn default_gallery() -> String { "slideshow".into() }

fn default_carousel_ms() -> u64 { 800 }
fn default_title_ms() -> u64 { 800 }
fn default_slideshow_ms() -> u64 { 700 }
fn default_fade_out_ms() -> u64 { 800 }
fn default_fade_out_steps() -> u32 { 40 }
fn default_fade_in_ms() -> u64 { 2_000 }
fn default_fade_in_steps() -> u32 { 50 }
fn default_target_volume() -> f32 { 0.5 }

fn default_wheel_threshold() -> f32 { 50.0 }
fn default_slideshow_wheel_threshold() -> f32 { 30.0 }
fn default_swipe_threshold() -> f32 { 50.0 }
fn default_wheel_step() -> f32 { 100.0 }   // one notch clears both thresholds
fn default_cell_width() -> f32 { 10.0 }
fn default_cell_height() -> f32 { 20.0 }

fn default_true() -> bool { true }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_mute() -> Vec<String> { vec!["Y".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            assets_dir: default_assets_dir(),
            log_level: default_log_level(),
            gallery: default_gallery(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            carousel_ms: default_carousel_ms(),
            title_ms: default_title_ms(),
            slideshow_ms: default_slideshow_ms(),
            fade_out_ms: default_fade_out_ms(),
            fade_out_steps: default_fade_out_steps(),
            fade_in_ms: default_fade_in_ms(),
            fade_in_steps: default_fade_in_steps(),
            target_volume: default_target_volume(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput {
            wheel_threshold: default_wheel_threshold(),
            slideshow_wheel_threshold: default_slideshow_wheel_threshold(),
            swipe_threshold_px: default_swipe_threshold(),
            wheel_step: default_wheel_step(),
            cell_width_px: default_cell_width(),
            cell_height_px: default_cell_height(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { enabled: default_true() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            mute: default_mute(),
        }
    }
}

// ── Loading ──

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, XDG data home, system data dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        AppConfig::from_toml(toml_cfg, &search_dirs)
    }

    #[cfg(test)]
    /// Parse a config document; errors fall back to defaults.
    pub fn parse(text: &str) -> Self {
        let toml_cfg = toml::from_str::<TomlConfig>(text).unwrap_or_else(|e| {
            log::warn!("config.toml parse error: {e}; using default settings");
            TomlConfig::default()
        });
        AppConfig::from_toml(toml_cfg, &[])
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Relative asset paths resolve against the first candidate dir that has them.
        let assets_str = &cfg.general.assets_dir;
        let assets_dir = if PathBuf::from(assets_str).is_absolute() {
            PathBuf::from(assets_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(assets_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(assets_str))
        };

        let log_level = cfg.general.log_level.parse().unwrap_or_else(|_| {
            log::warn!("unknown log_level {:?}, using info", cfg.general.log_level);
            log::LevelFilter::Info
        });

        let gallery = match cfg.general.gallery.to_lowercase().as_str() {
            "showcase" => GalleryKind::Showcase,
            "slideshow" => GalleryKind::Slideshow,
            other => {
                log::warn!("unknown gallery {other:?}, using slideshow");
                GalleryKind::Slideshow
            }
        };

        AppConfig {
            assets_dir,
            log_level,
            gallery,
            timing: TimingConfig {
                carousel_ms: cfg.timing.carousel_ms,
                title_ms: cfg.timing.title_ms,
                slideshow_ms: cfg.timing.slideshow_ms,
                fade_out_ms: cfg.timing.fade_out_ms,
                fade_out_steps: cfg.timing.fade_out_steps.max(1),
                fade_in_ms: cfg.timing.fade_in_ms,
                fade_in_steps: cfg.timing.fade_in_steps.max(1),
                target_volume: cfg.timing.target_volume.clamp(0.0, 1.0),
            },
            input: InputConfig {
                wheel_threshold: cfg.input.wheel_threshold,
                slideshow_wheel_threshold: cfg.input.slideshow_wheel_threshold,
                swipe_threshold_px: cfg.input.swipe_threshold_px,
                wheel_step: cfg.input.wheel_step,
                cell_width_px: cfg.input.cell_width_px,
                cell_height_px: cfg.input.cell_height_px,
            },
            audio_enabled: cfg.audio.enabled,
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                mute: cfg.gamepad.mute,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/ethan-select)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ethan-select");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/ethan-select");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("{}: parse error: {e}; using default settings", path.display());
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
