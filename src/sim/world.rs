/// AppState: everything the frame loop mutates.
///
/// ## Screens
///   - `Selection`: persona carousel
///   - `Title`: selected persona's title card (slides in and out)
///   - `Projects`: the persona's project gallery (slideshow or showcase)
///   - `Detail`: one project's page with its image listing
///
/// Intents are routed by the visible screen. Every handler reads the live
/// state through `&mut self`, so there is no stale snapshot to go wrong.

use std::path::PathBuf;

use crate::config::{AppConfig, GalleryKind, InputConfig};
use crate::domain::carousel::Carousel;
use crate::domain::content::{Content, Persona, Project};
use crate::domain::gesture;
use crate::sim::event::{AppEvent, ClickTarget, Intent, SoundCue};
use crate::sim::gallery::{self, ProjectPage};
use crate::sim::prefs::SoundPreference;
use crate::sim::slideshow::ProjectSlideshow;
use crate::sim::title::{TitleScreen, TitleSignal};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Selection,
    Title,
    Projects,
    Detail,
}

pub struct AppState {
    pub content: Content,
    pub assets_dir: PathBuf,
    pub gallery: GalleryKind,
    pub screen: Screen,
    pub selected: Option<usize>,
    pub carousel: Carousel,
    pub title: TitleScreen,
    pub slideshow: ProjectSlideshow,
    pub page: Option<ProjectPage>,
    pub prefs: SoundPreference,
    pub quit: bool,
    input: InputConfig,
    slideshow_ms: u64,
}

impl AppState {
    pub fn new(content: Content, prefs: SoundPreference, cfg: &AppConfig) -> Self {
        let carousel = Carousel::new(content.len(), cfg.timing.carousel_ms);
        AppState {
            content,
            assets_dir: cfg.assets_dir.clone(),
            gallery: cfg.gallery,
            screen: Screen::Selection,
            selected: None,
            carousel,
            title: TitleScreen::new(cfg.timing.title_ms),
            slideshow: ProjectSlideshow::new(0, cfg.timing.slideshow_ms),
            page: None,
            prefs,
            quit: false,
            input: cfg.input.clone(),
            slideshow_ms: cfg.timing.slideshow_ms,
        }
    }

    /// The committed persona, if any.
    pub fn persona(&self) -> Option<&Persona> {
        self.selected.and_then(|i| self.content.get(i))
    }

    /// The persona under the carousel cursor.
    pub fn highlighted(&self) -> Option<&Persona> {
        self.content.get(self.carousel.current())
    }

    pub fn open_project(&self) -> Option<&Project> {
        let page = self.page.as_ref()?;
        self.content.get(page.persona)?.projects.get(page.project)
    }

    pub fn sound_on(&self) -> bool {
        self.prefs.enabled()
    }

    /// Route one intent to the visible screen.
    pub fn apply(&mut self, intent: Intent, now_ms: u64) -> Vec<AppEvent> {
        let mut events = Vec::new();

        match intent {
            Intent::Quit => {
                self.quit = true;
                events.push(AppEvent::Quit);
                return events;
            }
            Intent::ToggleSound | Intent::Click(ClickTarget::SoundToggle) => {
                let enabled = self.prefs.toggle();
                events.push(AppEvent::SoundChanged(enabled));
                return events;
            }
            _ => {}
        }

        match self.screen {
            Screen::Selection => self.apply_selection(intent, now_ms, &mut events),
            Screen::Title => self.apply_title(intent, now_ms, &mut events),
            Screen::Projects => match self.gallery {
                GalleryKind::Slideshow => self.apply_slideshow(intent, now_ms, &mut events),
                GalleryKind::Showcase => self.apply_showcase(intent, now_ms, &mut events),
            },
            Screen::Detail => self.apply_detail(intent, &mut events),
        }
        events
    }

    /// Advance every timer. Returns whatever the elapsed deadlines caused.
    pub fn update(&mut self, now_ms: u64) -> Vec<AppEvent> {
        let mut events = Vec::new();
        self.carousel.update(now_ms);
        self.slideshow.update(now_ms);
        if let Some(TitleSignal::ReturnToSelection) = self.title.update(now_ms) {
            self.selected = None;
            self.set_screen(Screen::Selection, &mut events);
        }
        events
    }

    // ── Selection ──

    fn apply_selection(&mut self, intent: Intent, now_ms: u64, events: &mut Vec<AppEvent>) {
        let threshold = self.input.wheel_threshold;
        let swipe_threshold = self.input.swipe_threshold_px;
        let step = match intent {
            Intent::Left | Intent::Click(ClickTarget::ArrowLeft) => Some(-1),
            Intent::Right | Intent::Click(ClickTarget::ArrowRight) => Some(1),
            Intent::WheelX(delta) => gesture::wheel_step(delta, threshold),
            Intent::Swipe(s) => gesture::swipe_step_x(&s, swipe_threshold),
            Intent::Click(ClickTarget::Dot(i)) => {
                self.navigate(i as isize, now_ms, events);
                None
            }
            Intent::Confirm => {
                if self.carousel.is_idle() {
                    self.select(self.carousel.current(), now_ms, events);
                }
                None
            }
            // The figure is clickable even mid-slide.
            Intent::Click(ClickTarget::Persona) => {
                self.select(self.carousel.current(), now_ms, events);
                None
            }
            _ => None,
        };
        if let Some(delta) = step {
            let target = self.carousel.current() as isize + delta;
            self.navigate(target, now_ms, events);
        }
    }

    fn navigate(&mut self, requested: isize, now_ms: u64, events: &mut Vec<AppEvent>) {
        if let Some(t) = self.carousel.navigate_to(requested, now_ms) {
            log::debug!("carousel {} -> {} ({:?})", t.from, t.to, t.direction);
            self.cue(SoundCue::Navigate, events);
            events.push(AppEvent::Navigated(t));
        }
    }

    fn select(&mut self, index: usize, now_ms: u64, events: &mut Vec<AppEvent>) {
        if self.content.get(index).is_none() {
            return;
        }
        self.selected = Some(index);
        self.title.show(now_ms);
        self.slideshow = ProjectSlideshow::new(
            self.content.get(index).map_or(0, |p| p.projects.len()),
            self.slideshow_ms,
        );
        self.cue(SoundCue::Select, events);
        events.push(AppEvent::PersonaSelected(index));
        self.set_screen(Screen::Title, events);
    }

    // ── Title ──

    fn apply_title(&mut self, intent: Intent, now_ms: u64, events: &mut Vec<AppEvent>) {
        match intent {
            Intent::Back | Intent::Up | Intent::Click(ClickTarget::TitleBack) => {
                if self.title.back(now_ms) {
                    self.cue(SoundCue::Close, events);
                    events.push(AppEvent::TitleClosing);
                }
            }
            Intent::Confirm | Intent::Down | Intent::Click(ClickTarget::TitleEnter) => {
                if self.title.enter() {
                    self.set_screen(Screen::Projects, events);
                }
            }
            _ => {}
        }
    }

    // ── Gallery ──

    fn apply_slideshow(&mut self, intent: Intent, now_ms: u64, events: &mut Vec<AppEvent>) {
        let threshold = self.input.slideshow_wheel_threshold;
        let swipe_threshold = self.input.swipe_threshold_px;
        let step = match intent {
            Intent::Up => Some(-1),
            Intent::Down => Some(1),
            Intent::WheelY(delta) => gesture::wheel_step(delta, threshold),
            Intent::Swipe(s) => gesture::swipe_step_y(&s, swipe_threshold),
            Intent::Back => {
                self.back_to_title(events);
                None
            }
            Intent::Confirm | Intent::Click(ClickTarget::Card(_)) => {
                let project = match intent {
                    Intent::Click(ClickTarget::Card(i)) => i,
                    _ => self.slideshow.current(),
                };
                self.open_detail(project, events);
                None
            }
            _ => None,
        };
        if let Some(delta) = step {
            if let Some(index) = self.slideshow.step(delta, now_ms) {
                self.cue(SoundCue::Navigate, events);
                events.push(AppEvent::SlideChanged(index));
            }
        }
    }

    fn apply_showcase(&mut self, intent: Intent, _now_ms: u64, events: &mut Vec<AppEvent>) {
        match intent {
            Intent::Back => self.back_to_title(events),
            Intent::Click(ClickTarget::Card(i)) | Intent::Digit(i) => self.open_detail(i, events),
            _ => {}
        }
    }

    fn back_to_title(&mut self, events: &mut Vec<AppEvent>) {
        self.title.resume();
        self.set_screen(Screen::Title, events);
    }

    fn open_detail(&mut self, project: usize, events: &mut Vec<AppEvent>) {
        let Some(persona) = self.selected else { return };
        let exists = self.content.get(persona).is_some_and(|p| project < p.projects.len());
        if !exists {
            return;
        }
        let page = gallery::page_for(&self.content, &self.assets_dir, persona, project);
        log::info!("opened project page with {} images", page.images.len());
        self.page = Some(page);
        self.cue(SoundCue::Select, events);
        events.push(AppEvent::ProjectOpened { persona, project });
        self.set_screen(Screen::Detail, events);
    }

    // ── Detail ──

    fn apply_detail(&mut self, intent: Intent, events: &mut Vec<AppEvent>) {
        if matches!(intent, Intent::Back | Intent::Left | Intent::Click(ClickTarget::DetailBack)) {
            self.page = None;
            self.set_screen(Screen::Projects, events);
        }
    }

    // ── Helpers ──

    fn set_screen(&mut self, screen: Screen, events: &mut Vec<AppEvent>) {
        if self.screen != screen {
            log::info!("screen {:?} -> {:?}", self.screen, screen);
            self.screen = screen;
            events.push(AppEvent::ScreenChanged(screen));
        }
    }

    fn cue(&self, cue: SoundCue, events: &mut Vec<AppEvent>) {
        if self.sound_on() {
            events.push(AppEvent::Cue(cue));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::carousel::Direction;
    use crate::domain::gesture::Swipe;
    use crate::sim::prefs::{MemoryStorage, SOUND_KEY};

    fn state_with(cfg: AppConfig, sound: &str) -> AppState {
        let prefs = SoundPreference::load(Box::new(MemoryStorage::with(SOUND_KEY, sound)));
        AppState::new(Content::embedded(), prefs, &cfg)
    }

    fn state() -> AppState {
        state_with(AppConfig::default(), "true")
    }

    fn showcase() -> AppState {
        let mut cfg = AppConfig::default();
        cfg.gallery = GalleryKind::Showcase;
        state_with(cfg, "true")
    }

    fn has(events: &[AppEvent], e: &AppEvent) -> bool {
        events.iter().any(|x| x == e)
    }

    #[test]
    fn four_right_presses_after_settling_cycle_back() {
        let mut s = state();
        let mut now = 0;
        for _ in 0..4 {
            let events = s.apply(Intent::Right, now);
            let t = events.iter().find_map(|e| match e {
                AppEvent::Navigated(t) => Some(*t),
                _ => None,
            });
            assert_eq!(t.map(|t| t.direction), Some(Direction::Right));
            now += 800;
            s.update(now);
        }
        assert_eq!(s.carousel.current(), 0);
    }

    #[test]
    fn rapid_presses_make_one_change() {
        let mut s = state();
        s.apply(Intent::Right, 0);
        assert!(s.apply(Intent::Right, 100).is_empty());
        assert_eq!(s.carousel.current(), 1);
    }

    #[test]
    fn wheel_and_swipe_respect_thresholds() {
        let mut s = state();
        assert!(s.apply(Intent::WheelX(50.0), 0).is_empty());
        assert!(!s.apply(Intent::WheelX(-51.0), 0).is_empty());
        assert_eq!(s.carousel.current(), 3);
        s.update(800);
        let swipe = Swipe { start_x: 300.0, start_y: 0.0, end_x: 200.0, end_y: 0.0 };
        s.apply(Intent::Swipe(swipe), 800);
        assert_eq!(s.carousel.current(), 0);
    }

    #[test]
    fn enter_selects_only_when_idle_but_click_always_does() {
        let mut s = state();
        s.apply(Intent::Right, 0);
        s.apply(Intent::Confirm, 100);
        assert_eq!(s.screen, Screen::Selection);

        let events = s.apply(Intent::Click(ClickTarget::Persona), 200);
        assert_eq!(s.screen, Screen::Title);
        assert_eq!(s.selected, Some(1));
        assert!(has(&events, &AppEvent::Cue(SoundCue::Select)));
    }

    #[test]
    fn cues_are_silent_with_sound_off() {
        let mut s = state_with(AppConfig::default(), "false");
        let events = s.apply(Intent::Right, 0);
        assert!(!events.iter().any(|e| matches!(e, AppEvent::Cue(_))));
        assert!(events.iter().any(|e| matches!(e, AppEvent::Navigated(_))));
    }

    #[test]
    fn title_back_returns_only_after_the_slide() {
        let mut s = state();
        s.apply(Intent::Confirm, 0);
        let events = s.apply(Intent::Back, 1_000);
        assert!(has(&events, &AppEvent::Cue(SoundCue::Close)));
        assert!(s.apply(Intent::Back, 1_100).is_empty());
        // Entering is refused mid-exit.
        s.apply(Intent::Confirm, 1_200);
        assert_eq!(s.screen, Screen::Title);

        assert!(s.update(1_799).is_empty());
        let events = s.update(1_800);
        assert!(has(&events, &AppEvent::ScreenChanged(Screen::Selection)));
        assert_eq!(s.selected, None);
    }

    #[test]
    fn slideshow_pages_then_opens_detail_and_comes_back() {
        let mut s = state();
        s.apply(Intent::Confirm, 0);
        s.apply(Intent::Down, 900);
        assert_eq!(s.screen, Screen::Projects);

        s.apply(Intent::WheelY(31.0), 1_000);
        assert_eq!(s.slideshow.current(), 1);
        assert!(s.apply(Intent::WheelY(31.0), 1_100).is_empty());
        s.update(1_700);
        s.apply(Intent::Confirm, 1_700);
        assert_eq!(s.screen, Screen::Detail);
        assert_eq!(s.open_project().map(|p| p.slug.as_str()), Some("japan"));

        s.apply(Intent::Back, 1_800);
        assert_eq!(s.screen, Screen::Projects);
        s.apply(Intent::Back, 1_900);
        assert_eq!(s.screen, Screen::Title);
        assert_eq!(s.title.offset(1_900), 0.0);
    }

    #[test]
    fn slideshow_clamps_at_the_top() {
        let mut s = state();
        s.apply(Intent::Confirm, 0);
        s.apply(Intent::Confirm, 900);
        assert!(s.apply(Intent::Up, 1_000).is_empty());
        assert_eq!(s.slideshow.current(), 0);
    }

    #[test]
    fn showcase_opens_cards_by_number() {
        let mut s = showcase();
        s.apply(Intent::Right, 0);
        s.update(800);
        s.apply(Intent::Confirm, 800);
        s.apply(Intent::Confirm, 1_700);
        assert_eq!(s.screen, Screen::Projects);

        s.apply(Intent::Digit(9), 1_800);
        assert_eq!(s.screen, Screen::Projects);
        s.apply(Intent::Digit(1), 1_800);
        assert_eq!(s.screen, Screen::Detail);
        let page = s.page.as_ref().unwrap();
        assert_eq!((page.persona, page.project), (1, 1));
    }

    #[test]
    fn sound_toggle_works_on_every_screen() {
        let mut s = state();
        let sub = s.prefs.subscribe();
        let events = s.apply(Intent::Click(ClickTarget::SoundToggle), 0);
        assert_eq!(events, [AppEvent::SoundChanged(false)]);
        s.apply(Intent::Confirm, 0);
        s.apply(Intent::ToggleSound, 10);
        assert!(s.sound_on());
        assert_eq!(sub.drain().len(), 2);
    }

    #[test]
    fn quit_sets_the_flag() {
        let mut s = state();
        assert_eq!(s.apply(Intent::Quit, 0), [AppEvent::Quit]);
        assert!(s.quit);
    }
}
