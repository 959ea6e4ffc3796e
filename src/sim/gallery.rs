/// Project pages and their image galleries.
///
/// Every (persona, project) pair in the content table has exactly one page,
/// addressed as `/project/<persona-slug>/<project-slug>`. A page lists every
/// image found in `<assets>/projects/<projects_folder>/<project-slug>/`.
///
/// ## Image ordering
///   1. Files whose name starts with "thumbnail" (any case)
///   2. Everything else, lexicographically ignoring case

use std::cmp::Ordering;
use std::path::Path;

use crate::domain::content::{Content, Persona, Project};
use crate::error::RouteError;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub persona: String,
    pub project: String,
}

impl Route {
    pub fn path(&self) -> String {
        format!("/project/{}/{}", self.persona, self.project)
    }

    /// Parse `persona/project`, tolerating a leading `/project/` prefix.
    pub fn parse(s: &str) -> Result<Route, RouteError> {
        let trimmed = s.trim().trim_matches('/');
        let trimmed = trimmed.strip_prefix("project/").unwrap_or(trimmed);
        match trimmed.split_once('/') {
            Some((persona, project))
                if !persona.is_empty() && !project.is_empty() && !project.contains('/') =>
            {
                Ok(Route { persona: persona.to_string(), project: project.to_string() })
            }
            _ => Err(RouteError::Malformed(s.to_string())),
        }
    }
}

/// A resolved detail page.
#[derive(Clone, Debug)]
pub struct ProjectPage {
    pub persona: usize,
    pub project: usize,
    pub images: Vec<String>,
}

/// Every statically known route, in content order.
pub fn routes(content: &Content) -> Vec<Route> {
    content
        .personas
        .iter()
        .flat_map(|persona| {
            persona.projects.iter().map(move |project| Route {
                persona: persona.slug.clone(),
                project: project.slug.clone(),
            })
        })
        .collect()
}

/// Look up a route; unknown slugs are a not-found.
pub fn resolve(content: &Content, route: &Route) -> Result<(usize, usize), RouteError> {
    let not_found = || RouteError::NotFound {
        persona: route.persona.clone(),
        project: route.project.clone(),
    };
    let persona_idx = content
        .personas
        .iter()
        .position(|p| p.slug == route.persona)
        .ok_or_else(not_found)?;
    let project_idx = content.personas[persona_idx]
        .projects
        .iter()
        .position(|p| p.slug == route.project)
        .ok_or_else(not_found)?;
    Ok((persona_idx, project_idx))
}

pub fn open_page(content: &Content, assets_dir: &Path, route: &Route) -> Result<ProjectPage, RouteError> {
    let (persona, project) = resolve(content, route)?;
    Ok(page_for(content, assets_dir, persona, project))
}

/// Build the page for indices already known to be valid.
pub fn page_for(content: &Content, assets_dir: &Path, persona: usize, project: usize) -> ProjectPage {
    let images = match content.get(persona).and_then(|p| p.projects.get(project).map(|pr| (p, pr))) {
        Some((p, pr)) => project_images(assets_dir, p, pr),
        None => Vec::new(),
    };
    ProjectPage { persona, project, images }
}

/// Web-style paths of every image in the project's folder, gallery-ordered.
pub fn project_images(assets_dir: &Path, persona: &Persona, project: &Project) -> Vec<String> {
    let dir = assets_dir
        .join("projects")
        .join(&persona.projects_folder)
        .join(&project.slug);

    let entries = match std::fs::read_dir(&dir) {
        Ok(e) => e,
        Err(_) => {
            log::debug!("no image folder at {}", dir.display());
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| is_image(name))
        .collect();
    sort_gallery(&mut names);

    names
        .into_iter()
        .map(|f| format!("/projects/{}/{}/{}", persona.projects_folder, project.slug, f))
        .collect()
}

pub fn is_image(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| {
        lower.len() > ext.len() + 1 && lower.ends_with(ext) && lower[..lower.len() - ext.len()].ends_with('.')
    })
}

pub fn sort_gallery(names: &mut [String]) {
    names.sort_by(|a, b| gallery_order(a, b));
}

fn gallery_order(a: &str, b: &str) -> Ordering {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let a_thumb = a_lower.starts_with("thumbnail");
    let b_thumb = b_lower.starts_with("thumbnail");
    b_thumb
        .cmp(&a_thumb)
        .then_with(|| a_lower.cmp(&b_lower))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_assets(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ethan_select_gallery_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        sort_gallery(&mut v);
        v
    }

    #[test]
    fn thumbnail_sorts_first_then_alphabetical() {
        assert_eq!(sorted(&["thumbnail.png", "b.jpg", "a.png"]), ["thumbnail.png", "a.png", "b.jpg"]);
        assert_eq!(sorted(&["b.jpg", "a.png", "thumbnail.png"]), ["thumbnail.png", "a.png", "b.jpg"]);
    }

    #[test]
    fn thumbnail_prefix_is_case_insensitive() {
        assert_eq!(sorted(&["c.png", "Thumbnail.JPG", "B.png"]), ["Thumbnail.JPG", "B.png", "c.png"]);
    }

    #[test]
    fn image_filter_matches_known_extensions_only() {
        assert!(is_image("photo.JPG"));
        assert!(is_image("x.webp"));
        assert!(is_image("x.jpeg"));
        assert!(!is_image("notes.txt"));
        assert!(!is_image("png"));
        assert!(!is_image("archive.xpng"));
    }

    #[test]
    fn lists_images_from_project_folder() {
        let assets = temp_assets("list");
        let content = Content::embedded();
        let persona = content.find("artist").unwrap();
        let project = persona.project("tiny-dorm").unwrap();
        let dir = assets.join("projects/artist/tiny-dorm");
        std::fs::create_dir_all(&dir).unwrap();
        for f in ["thumbnail.png", "b.jpg", "a.png", "readme.md"] {
            std::fs::write(dir.join(f), b"").unwrap();
        }

        let images = project_images(&assets, persona, project);
        assert_eq!(images, [
            "/projects/artist/tiny-dorm/thumbnail.png",
            "/projects/artist/tiny-dorm/a.png",
            "/projects/artist/tiny-dorm/b.jpg",
        ]);
        let _ = std::fs::remove_dir_all(&assets);
    }

    #[test]
    fn missing_folder_yields_no_images() {
        let assets = temp_assets("missing");
        let content = Content::embedded();
        let page = open_page(&content, &assets, &Route::parse("engineer/spotter").unwrap()).unwrap();
        assert!(page.images.is_empty());
        assert_eq!((page.persona, page.project), (2, 4));
        let _ = std::fs::remove_dir_all(&assets);
    }

    #[test]
    fn one_route_per_project() {
        let content = Content::embedded();
        let all = routes(&content);
        assert_eq!(all.len(), 12);
        assert_eq!(all[0].path(), "/project/adventurer/mount-kilimanjaro");
        assert!(all.iter().all(|r| resolve(&content, r).is_ok()));
    }

    #[test]
    fn unknown_slugs_are_not_found() {
        let content = Content::embedded();
        let bad_persona = Route { persona: "wizard".into(), project: "japan".into() };
        let bad_project = Route { persona: "adventurer".into(), project: "mars".into() };
        assert!(matches!(resolve(&content, &bad_persona), Err(RouteError::NotFound { .. })));
        assert!(matches!(resolve(&content, &bad_project), Err(RouteError::NotFound { .. })));
    }

    #[test]
    fn route_parsing_accepts_full_paths() {
        let r = Route::parse("/project/artist/seamonkeys").unwrap();
        assert_eq!(r, Route { persona: "artist".into(), project: "seamonkeys".into() });
        assert!(Route::parse("artist").is_err());
        assert!(Route::parse("a/b/c").is_err());
    }
}
