/// Persona and project content.
///
/// ## Sources (priority order):
///   1. `<assets>/content.toml` (`[[personas]]` with nested `[[personas.projects]]`)
///   2. Built-in embedded table
///
/// Content is read once at startup and never mutated afterwards.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

pub const SELECT_HEADING: &str = "Select your Ethan";
pub const CLICK_TO_ENTER: &str = "[Click to enter]";

/// 24-bit colour parsed from `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn parse_hex(s: &str) -> Option<Rgb> {
        let hex = s.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb { r: byte(0)?, g: byte(2)?, b: byte(4)? })
    }

    /// Perceived brightness, used to pick readable text over a fill.
    pub fn is_light(&self) -> bool {
        let l = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        l > 150.0
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse_hex(&value).ok_or_else(|| format!("invalid colour {value:?}, expected #RRGGBB"))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// Fields mirror the content table; not every one is drawn in a terminal.
#[derive(Clone, Debug, Deserialize)]
#[allow(dead_code)]
pub struct Project {
    pub image: String,
    pub title: String,
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub slug: String,
    #[serde(default)]
    pub demo_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[allow(dead_code)]
pub struct Persona {
    pub id: u32,
    pub name: String,
    pub slug: String,
    pub projects_folder: String,
    pub image: String,
    pub banner: String,
    pub title_image: String,
    pub color: Rgb,
    pub secondary_color: Rgb,
    pub third_color: Rgb,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Persona {
    /// "The Adventurer", "The Misc Dude"
    pub fn display_name(&self) -> String {
        let words: Vec<String> = self.name.split_whitespace().map(capitalize).collect();
        format!("The {}", words.join(" "))
    }

    #[cfg(test)]
    pub fn project(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Clone, Debug)]
pub struct Content {
    pub personas: Vec<Persona>,
}

#[derive(Deserialize)]
struct ContentFile {
    #[serde(default)]
    personas: Vec<Persona>,
}

impl Content {
    /// Load `content.toml` from the assets directory, falling back to the
    /// embedded table when the file is missing, malformed, or empty.
    pub fn load(assets_dir: &Path) -> Content {
        let path = assets_dir.join("content.toml");
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(_) => {
                log::debug!("no {} found, using built-in content", path.display());
                return Content::embedded();
            }
        };
        match Content::parse(&text) {
            Some(content) => {
                log::info!("loaded {} personas from {}", content.personas.len(), path.display());
                content
            }
            None => {
                log::warn!("{} is unusable, using built-in content", path.display());
                Content::embedded()
            }
        }
    }

    fn parse(text: &str) -> Option<Content> {
        match toml::from_str::<ContentFile>(text) {
            Ok(file) if !file.personas.is_empty() => Some(Content { personas: file.personas }),
            Ok(_) => None,
            Err(e) => {
                log::warn!("content.toml parse error: {e}");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Persona> {
        self.personas.get(index)
    }

    #[cfg(test)]
    pub fn find(&self, slug: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.slug == slug)
    }

    pub fn embedded() -> Content {
        Content {
            personas: vec![
                persona(1, "adventurer", "adventurer", "adventure",
                    ("#CBBEFF", "#FFE8BE", "#FE4A01"),
                    vec![
                        project("mount-kilimanjaro", "adventure", "thumbnail.JPG",
                            "Mount Kilimanjaro",
                            "Summiting the tallest peak in Africa",
                            "A seven-day summit of Uhuru Peak, the highest point in Africa at 5,895 meters. The climb traversed five climate zones from rainforest to arctic summit.",
                            "", None),
                        project("japan", "adventure", "thumbnail.jpeg",
                            "Japan",
                            "Best trip of my life",
                            "A journey across Japan exploring ancient temples, regional ramen, and the open road. From Tokyo to Kyoto and beyond.",
                            "CONTENT HERE", None),
                        project("china", "adventure", "thumbnail.jpeg",
                            "China",
                            "2 week solo trip",
                            "Exploring the Great Wall and the diverse landscapes and cultures of China.",
                            "", None),
                        project("free-diving", "adventure", "thumbnail.webp",
                            "Free Diving",
                            "Exploring the depths on a single breath",
                            "Exploring underwater worlds on a single breath. Training and diving in various locations.",
                            "", None),
                    ]),
                persona(2, "artist", "artist", "artist",
                    ("#EFFFBE", "#800001", "#800001"),
                    vec![
                        project("tiny-dorm", "artist", "thumbnail.png",
                            "Tiny Dorm",
                            "Bringing musicians closer together at Berkeley",
                            "A collaborative music space and community at Berkeley, bringing musicians together for jam sessions and creative exchange.",
                            "", Some("https://www.instagram.com/c.u.bclub/")),
                        project("seamonkeys", "artist", "thumbnail.jpeg",
                            "Seamonkeys",
                            "The best band of our lifetime",
                            "The best band of our lifetime. A musical project with friends.",
                            "", Some("https://www.instagram.com/the.seamonkeys/")),
                    ]),
                persona(3, "engineer", "engineer", "engineer",
                    ("#4300DE", "#FFE8BE", "#FFE8BE"),
                    vec![
                        project("enable", "engineer", "thumbnail.png",
                            "Enable",
                            "Prosthetic development in the comfort of your own home",
                            "Enabling prosthetic development in the comfort of your own home. Making accessible medical device technology for amputees.",
                            "", Some("https://enable.vercel.app/")),
                        project("science-of-everything", "engineer", "thumbnail.png",
                            "Science of Everything",
                            "Full production site for a paid contract",
                            "Full production website for a paid contract. A comprehensive platform.",
                            "", Some("https://thescienceofeverything.vercel.app/")),
                        project("scribble-ai", "engineer", "thumbnail.jpg",
                            "Scribble AI",
                            "The simplest way to generate text using AI",
                            "The simplest way to generate text using AI. A streamlined interface for AI-powered writing.",
                            "", Some("https://apps.apple.com/us/app/scribble-ai/id1662081018")),
                        project("show-and-tell", "engineer", "thumbnail.jpg",
                            "Show and Tell",
                            "Enabling emotion and expression for the hard of hearing",
                            "Enabling emotion and expression for the hard of hearing. A project that bridges communication gaps.",
                            "", Some("https://devpost.com/software/show-and-tell-capturing-emotion-in-sign-language")),
                        project("spotter", "engineer", "thumbnail.jpeg",
                            "Spotter",
                            "Machine learning powered tool for first responders",
                            "Machine learning powered tool for first responders. Helping emergency personnel with AI-assisted situational awareness.",
                            "", Some("https://devpost.com/software/spotter-revolutionizing-disaster-relief")),
                    ]),
                persona(4, "misc dude", "misc-dude", "misc",
                    ("#FF5100", "#FFE8BE", "#FFE8BE"),
                    vec![
                        project("freeppekc", "misc", "thumbnail.jpeg",
                            "Freeppekc",
                            "Medical non-profit supplying 3D-printed equipment to healthcare workers",
                            "Medical non-profit supplying 3D-printed equipment to healthcare workers. Supporting frontline workers with accessible medical equipment.",
                            "", Some("https://freeppekc.wixsite.com/freeppekc")),
                    ]),
            ],
        }
    }
}

fn persona(
    id: u32,
    name: &str,
    slug: &str,
    folder: &str,
    colors: (&str, &str, &str),
    projects: Vec<Project>,
) -> Persona {
    let color = |hex: &str| Rgb::parse_hex(hex).unwrap_or(Rgb::new(255, 255, 255));
    Persona {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        projects_folder: folder.to_string(),
        image: format!("/{slug}.png"),
        banner: format!("/{slug}-banner.png"),
        title_image: format!("/{slug}-title.png"),
        color: color(colors.0),
        secondary_color: color(colors.1),
        third_color: color(colors.2),
        projects,
    }
}

#[allow(clippy::too_many_arguments)]
fn project(
    slug: &str,
    folder: &str,
    thumbnail: &str,
    title: &str,
    subtitle: &str,
    description: &str,
    content: &str,
    demo_url: Option<&str>,
) -> Project {
    Project {
        image: format!("/projects/{folder}/{slug}/{thumbnail}"),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        description: description.to_string(),
        content: content.to_string(),
        slug: slug.to_string(),
        demo_url: demo_url.map(str::to_string),
    }
}
