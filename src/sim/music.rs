/// Background music controller.
///
/// Picks one looping track per screen and crossfades between them:
///
///   1. The outgoing track fades to silence, then is stopped and released.
///   2. The incoming track is loaded muted and starts only once the outgoing
///      fade has finished, then fades in to the target volume.
///
/// At most one fade runs at a time, so at most one track is ever audible.
/// The sound preference arrives over a `Subscription`; a toggle that lands
/// during a fade is applied when the fade ends.

use std::path::{Path, PathBuf};

use crate::config::TimingConfig;
use crate::domain::content::Persona;
use crate::domain::ramp::Ramp;
use crate::error::AudioError;
use crate::sim::prefs::Subscription;
use crate::sim::world::Screen;

pub const SELECT_TRACK: &str = "music/characterSelectSong.mp3";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackId(pub u64);

/// A player that can hold several looping tracks at once.
pub trait AudioBackend {
    /// Open and decode `path` as a looping track, muted and paused.
    fn load(&mut self, path: &Path) -> Result<TrackId, AudioError>;
    /// Whether the track has buffered enough to play through.
    fn is_ready(&self, id: TrackId) -> bool;
    fn play(&mut self, id: TrackId) -> Result<(), AudioError>;
    /// Pause, rewind and release the track.
    fn stop(&mut self, id: TrackId);
    fn set_volume(&mut self, id: TrackId, volume: f32);
    fn volume(&self, id: TrackId) -> f32;
    fn is_paused(&self, id: TrackId) -> bool;
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn load(&mut self, path: &Path) -> Result<TrackId, AudioError> { (**self).load(path) }
    fn is_ready(&self, id: TrackId) -> bool { (**self).is_ready(id) }
    fn play(&mut self, id: TrackId) -> Result<(), AudioError> { (**self).play(id) }
    fn stop(&mut self, id: TrackId) { (**self).stop(id) }
    fn set_volume(&mut self, id: TrackId, volume: f32) { (**self).set_volume(id, volume) }
    fn volume(&self, id: TrackId) -> f32 { (**self).volume(id) }
    fn is_paused(&self, id: TrackId) -> bool { (**self).is_paused(id) }
}

/// Asset-relative path of the track for a screen.
pub fn track_for(screen: Screen, persona: Option<&Persona>) -> String {
    match (screen, persona) {
        (Screen::Selection, _) | (_, None) => SELECT_TRACK.to_string(),
        (_, Some(p)) if p.name == "adventurer" => "music/adventure.mp3".to_string(),
        (_, Some(p)) => {
            let file = p.name.split_whitespace().collect::<Vec<_>>().join("-");
            format!("music/{file}.mp3")
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeSettings {
    pub out_ms: u64,
    pub out_steps: u32,
    pub in_ms: u64,
    pub in_steps: u32,
    pub target_volume: f32,
}

impl Default for FadeSettings {
    fn default() -> Self {
        FadeSettings { out_ms: 800, out_steps: 40, in_ms: 2_000, in_steps: 50, target_volume: 0.5 }
    }
}

impl From<&TimingConfig> for FadeSettings {
    fn from(t: &TimingConfig) -> Self {
        FadeSettings {
            out_ms: t.fade_out_ms,
            out_steps: t.fade_out_steps,
            in_ms: t.fade_in_ms,
            in_steps: t.fade_in_steps,
            target_volume: t.target_volume.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug)]
enum Fade {
    Out { track: TrackId, ramp: Ramp },
    In { track: TrackId, ramp: Ramp },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Playback {
    /// Loaded, waiting for readiness and for the outgoing fade to finish.
    Pending,
    /// Ready but never started because sound was off.
    Idle,
    Started,
}

#[derive(Debug)]
struct Track {
    id: TrackId,
    playback: Playback,
}

pub struct MusicController<B: AudioBackend> {
    backend: B,
    assets_dir: PathBuf,
    fades: FadeSettings,
    current_path: Option<String>,
    current: Option<Track>,
    fade: Option<Fade>,
    sound_on: bool,
    sound: Option<Subscription>,
    toggle_deferred: bool,
    awaiting_interaction: bool,
}

impl<B: AudioBackend> MusicController<B> {
    pub fn new(backend: B, assets_dir: &Path, fades: FadeSettings, sound_on: bool) -> Self {
        MusicController {
            backend,
            assets_dir: assets_dir.to_path_buf(),
            fades,
            current_path: None,
            current: None,
            fade: None,
            sound_on,
            sound: None,
            toggle_deferred: false,
            awaiting_interaction: true,
        }
    }

    /// Follow preference changes broadcast on `sub`.
    pub fn listen(&mut self, sub: Subscription) {
        self.sound = Some(sub);
    }

    #[cfg(test)]
    pub fn current_track(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    #[cfg(test)]
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Switch to `track` (asset-relative). Same track is a no-op.
    pub fn set_target(&mut self, track: &str, now_ms: u64) {
        if self.current_path.as_deref() == Some(track) {
            return;
        }

        // An interrupted fade-out drops its track at once; an interrupted
        // fade-in leaves the current track at whatever level it reached.
        if let Some(Fade::Out { track: old, .. }) = self.fade.take() {
            self.backend.stop(old);
        }
        self.toggle_deferred = false;

        if let Some(prev) = self.current.take() {
            let level = self.backend.volume(prev.id);
            if prev.playback == Playback::Started && level > 0.0 && !self.backend.is_paused(prev.id) {
                log::debug!("fading out {:?} from {level:.2}", self.current_path);
                let ramp = Ramp::new(level, 0.0, self.fades.out_ms, self.fades.out_steps, now_ms);
                self.fade = Some(Fade::Out { track: prev.id, ramp });
            } else {
                self.backend.stop(prev.id);
            }
        }

        log::info!("music -> {track}");
        self.current_path = Some(track.to_string());
        let path = self.assets_dir.join(track);
        match self.backend.load(&path) {
            Ok(id) => {
                self.backend.set_volume(id, 0.0);
                self.current = Some(Track { id, playback: Playback::Pending });
            }
            Err(e) => log::error!("{e}"),
        }
    }

    /// Follow the screen, advance the fade, and start pending playback.
    pub fn update(&mut self, screen: Screen, persona: Option<&Persona>, now_ms: u64) {
        if let Some(enabled) = self.sound.as_ref().and_then(|s| s.latest()) {
            self.set_sound(enabled);
        }

        let target = track_for(screen, persona);
        self.set_target(&target, now_ms);

        self.advance_fade(now_ms);
        self.start_pending(now_ms);
    }

    fn advance_fade(&mut self, now_ms: u64) {
        let finished = match &mut self.fade {
            Some(Fade::Out { track, ramp }) | Some(Fade::In { track, ramp }) => {
                if let Some(level) = ramp.advance(now_ms) {
                    self.backend.set_volume(*track, level);
                }
                ramp.is_done()
            }
            None => false,
        };
        if !finished {
            return;
        }

        if let Some(Fade::Out { track, .. }) = self.fade.take() {
            log::debug!("fade-out finished");
            self.backend.stop(track);
        }
        if self.toggle_deferred {
            self.toggle_deferred = false;
            self.apply_sound();
        }
    }

    fn start_pending(&mut self, now_ms: u64) {
        if self.fade.is_some() {
            return;
        }
        let track = match &mut self.current {
            Some(t) if t.playback == Playback::Pending && self.backend.is_ready(t.id) => t,
            _ => return,
        };
        if !self.sound_on {
            track.playback = Playback::Idle;
            return;
        }

        track.playback = Playback::Started;
        let id = track.id;
        self.play(id);
        let ramp = Ramp::new(0.0, self.fades.target_volume, self.fades.in_ms, self.fades.in_steps, now_ms);
        self.fade = Some(Fade::In { track: id, ramp });
    }

    fn play(&mut self, id: TrackId) {
        match self.backend.play(id) {
            Ok(()) => {}
            Err(AudioError::Blocked) => log::debug!("autoplay blocked, waiting for interaction"),
            Err(e) => log::error!("{e}"),
        }
    }

    /// Apply a preference change, or defer it until the running fade ends.
    /// Every change re-arms the interaction retry.
    pub fn set_sound(&mut self, enabled: bool) {
        self.sound_on = enabled;
        self.awaiting_interaction = true;
        if self.fade.is_some() {
            self.toggle_deferred = true;
            return;
        }
        self.apply_sound();
    }

    fn apply_sound(&mut self) {
        let level = if self.sound_on { self.fades.target_volume } else { 0.0 };
        let Some(track) = &mut self.current else { return };
        let id = track.id;
        let playback = track.playback;
        match playback {
            Playback::Started => self.backend.set_volume(id, level),
            Playback::Idle if self.sound_on => {
                track.playback = Playback::Started;
                self.backend.set_volume(id, level);
                self.play(id);
            }
            _ => {}
        }
    }

    /// First key press or click after startup or a sound change: retry a
    /// blocked start, then stop listening.
    pub fn on_user_interaction(&mut self) {
        if !self.awaiting_interaction {
            return;
        }
        self.awaiting_interaction = false;
        let stalled = self
            .current
            .as_ref()
            .filter(|t| t.playback == Playback::Started && self.sound_on && self.backend.is_paused(t.id))
            .map(|t| t.id);
        if let Some(id) = stalled {
            log::debug!("retrying playback after interaction");
            self.play(id);
        }
    }

    /// Stop every track and cancel the fade.
    pub fn shutdown(&mut self) {
        if let Some(fade) = self.fade.take() {
            let (Fade::Out { track, .. } | Fade::In { track, .. }) = fade;
            self.backend.stop(track);
        }
        if let Some(track) = self.current.take() {
            self.backend.stop(track.id);
        }
        self.toggle_deferred = false;
    }
}

impl<B: AudioBackend> Drop for MusicController<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::Content;
    use crate::sim::prefs::{MemoryStorage, SoundPreference};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    #[derive(Clone, Debug, Default)]
    struct FakeTrack {
        path: PathBuf,
        volume: f32,
        playing: bool,
        released: bool,
    }

    #[derive(Default)]
    struct FakeState {
        tracks: HashMap<u64, FakeTrack>,
        next: u64,
        block_play: bool,
        fail_play: bool,
        play_calls: usize,
        not_ready: bool,
        fail_load: bool,
        max_audible: usize,
    }

    impl FakeState {
        fn audible(&self) -> usize {
            self.tracks.values().filter(|t| t.playing && t.volume > 0.0).count()
        }

        fn track(&self, file: &str) -> Option<&FakeTrack> {
            self.tracks
                .iter()
                .filter(|(_, t)| t.path.ends_with(file))
                .max_by_key(|(id, _)| **id)
                .map(|(_, t)| t)
        }
    }

    /// Shares its state so tests can inspect it after handing it over.
    #[derive(Clone, Default)]
    struct FakeAudio(Rc<RefCell<FakeState>>);

    impl FakeAudio {
        fn note(&self) {
            let mut s = self.0.borrow_mut();
            let n = s.audible();
            s.max_audible = s.max_audible.max(n);
        }
    }

    impl AudioBackend for FakeAudio {
        fn load(&mut self, path: &Path) -> Result<TrackId, AudioError> {
            let mut s = self.0.borrow_mut();
            if s.fail_load {
                return Err(AudioError::Decode { path: path.to_path_buf(), reason: "bad".into() });
            }
            s.next += 1;
            let id = s.next;
            s.tracks.insert(id, FakeTrack { path: path.to_path_buf(), ..Default::default() });
            Ok(TrackId(id))
        }

        fn is_ready(&self, _id: TrackId) -> bool {
            !self.0.borrow().not_ready
        }

        fn play(&mut self, id: TrackId) -> Result<(), AudioError> {
            let (blocked, failed) = {
                let mut s = self.0.borrow_mut();
                s.play_calls += 1;
                (s.block_play, s.fail_play)
            };
            if blocked {
                return Err(AudioError::Blocked);
            }
            if failed {
                return Err(AudioError::Output("device lost".into()));
            }
            if let Some(t) = self.0.borrow_mut().tracks.get_mut(&id.0) {
                t.playing = true;
            }
            self.note();
            Ok(())
        }

        fn stop(&mut self, id: TrackId) {
            if let Some(t) = self.0.borrow_mut().tracks.get_mut(&id.0) {
                t.playing = false;
                t.released = true;
            }
        }

        fn set_volume(&mut self, id: TrackId, volume: f32) {
            if let Some(t) = self.0.borrow_mut().tracks.get_mut(&id.0) {
                t.volume = volume;
            }
            self.note();
        }

        fn volume(&self, id: TrackId) -> f32 {
            self.0.borrow().tracks.get(&id.0).map(|t| t.volume).unwrap_or(0.0)
        }

        fn is_paused(&self, id: TrackId) -> bool {
            self.0.borrow().tracks.get(&id.0).map(|t| !t.playing).unwrap_or(true)
        }
    }

    fn controller(sound_on: bool) -> (MusicController<FakeAudio>, FakeAudio) {
        let fake = FakeAudio::default();
        let c = MusicController::new(fake.clone(), Path::new("public"), FadeSettings::default(), sound_on);
        (c, fake)
    }

    fn run(c: &mut MusicController<FakeAudio>, screen: Screen, persona: Option<&Persona>, from: u64, to: u64) {
        let mut t = from;
        while t <= to {
            c.update(screen, persona, t);
            t += 10;
        }
    }

    #[test]
    fn track_names_follow_persona_names() {
        let content = Content::embedded();
        let misc = content.find("misc-dude").unwrap();
        let adv = content.find("adventurer").unwrap();
        assert_eq!(track_for(Screen::Title, Some(misc)), "music/misc-dude.mp3");
        assert_eq!(track_for(Screen::Projects, Some(adv)), "music/adventure.mp3");
        assert_eq!(track_for(Screen::Selection, Some(adv)), SELECT_TRACK);
        assert_eq!(track_for(Screen::Title, None), SELECT_TRACK);
    }

    #[test]
    fn first_track_fades_in_to_target() {
        let (mut c, fake) = controller(true);
        c.update(Screen::Selection, None, 0);
        assert!(c.is_fading());
        run(&mut c, Screen::Selection, None, 10, 2_000);
        let s = fake.0.borrow();
        let t = s.track("characterSelectSong.mp3").unwrap();
        assert!(t.playing);
        assert_eq!(t.volume, 0.5);
        drop(s);
        assert!(!c.is_fading());
    }

    #[test]
    fn same_target_is_a_no_op() {
        let (mut c, fake) = controller(true);
        c.set_target(SELECT_TRACK, 0);
        c.set_target(SELECT_TRACK, 5);
        assert_eq!(fake.0.borrow().tracks.len(), 1);
    }

    #[test]
    fn never_two_audible_tracks() {
        let content = Content::embedded();
        let artist = content.find("artist").unwrap();
        let (mut c, fake) = controller(true);

        run(&mut c, Screen::Selection, None, 0, 2_500);
        run(&mut c, Screen::Title, Some(artist), 2_510, 3_000);
        // Switch back mid fade.
        run(&mut c, Screen::Selection, None, 3_010, 3_500);
        run(&mut c, Screen::Title, Some(artist), 3_510, 8_000);

        let s = fake.0.borrow();
        assert_eq!(s.max_audible, 1);
        assert_eq!(s.audible(), 1);
        assert!(s.track("artist.mp3").unwrap().playing);
    }

    #[test]
    fn new_track_waits_for_fade_out() {
        let content = Content::embedded();
        let eng = content.find("engineer").unwrap();
        let (mut c, fake) = controller(true);
        run(&mut c, Screen::Selection, None, 0, 2_000);

        c.update(Screen::Title, Some(eng), 3_000);
        assert!(!fake.0.borrow().track("engineer.mp3").unwrap().playing);
        run(&mut c, Screen::Title, Some(eng), 3_010, 3_790);
        assert!(!fake.0.borrow().track("engineer.mp3").unwrap().playing);
        c.update(Screen::Title, Some(eng), 3_800);
        let s = fake.0.borrow();
        assert!(s.track("characterSelectSong.mp3").unwrap().released);
        assert!(s.track("engineer.mp3").unwrap().playing);
    }

    #[test]
    fn sound_off_swaps_identity_without_playing() {
        let content = Content::embedded();
        let artist = content.find("artist").unwrap();
        let (mut c, fake) = controller(false);
        run(&mut c, Screen::Title, Some(artist), 0, 3_000);
        assert_eq!(c.current_track(), Some("music/artist.mp3"));
        let s = fake.0.borrow();
        assert!(!s.track("artist.mp3").unwrap().playing);
        assert_eq!(s.audible(), 0);
    }

    #[test]
    fn turning_sound_on_starts_an_idle_track_at_target() {
        let (mut c, fake) = controller(false);
        run(&mut c, Screen::Selection, None, 0, 100);
        c.set_sound(true);
        let s = fake.0.borrow();
        let t = s.track("characterSelectSong.mp3").unwrap();
        assert!(t.playing);
        assert_eq!(t.volume, 0.5);
    }

    #[test]
    fn toggle_during_fade_is_deferred() {
        let mut prefs = SoundPreference::load(Box::new(MemoryStorage::new()));
        let (mut c, fake) = controller(true);
        c.listen(prefs.subscribe());

        c.update(Screen::Selection, None, 0);
        run(&mut c, Screen::Selection, None, 10, 500);
        prefs.toggle();
        c.update(Screen::Selection, None, 510);
        assert!(fake.0.borrow().track("characterSelectSong.mp3").unwrap().volume > 0.0);

        run(&mut c, Screen::Selection, None, 520, 2_100);
        assert_eq!(fake.0.borrow().track("characterSelectSong.mp3").unwrap().volume, 0.0);

        prefs.toggle();
        c.update(Screen::Selection, None, 2_200);
        assert_eq!(fake.0.borrow().track("characterSelectSong.mp3").unwrap().volume, 0.5);
    }

    #[test]
    fn blocked_autoplay_retries_once_on_interaction() {
        let (mut c, fake) = controller(true);
        fake.0.borrow_mut().block_play = true;
        run(&mut c, Screen::Selection, None, 0, 100);
        assert!(!fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);

        fake.0.borrow_mut().block_play = false;
        c.on_user_interaction();
        assert!(fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);

        // The gate only opens once.
        fake.0.borrow_mut().tracks.values_mut().for_each(|t| t.playing = false);
        c.on_user_interaction();
        assert!(!fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);
    }

    #[test]
    fn sound_change_rearms_the_interaction_retry() {
        let (mut c, fake) = controller(false);
        fake.0.borrow_mut().block_play = true;
        run(&mut c, Screen::Selection, None, 0, 100);

        // The key that turns sound on is itself the first interaction.
        c.on_user_interaction();
        c.set_sound(true);
        assert!(!fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);

        fake.0.borrow_mut().block_play = false;
        c.on_user_interaction();
        let s = fake.0.borrow();
        let t = s.track("characterSelectSong.mp3").unwrap();
        assert!(t.playing);
        assert_eq!(t.volume, 0.5);
    }

    #[test]
    fn retry_with_a_failing_output_is_attempted_once() {
        let (mut c, fake) = controller(true);
        fake.0.borrow_mut().block_play = true;
        run(&mut c, Screen::Selection, None, 0, 100);
        let before = fake.0.borrow().play_calls;

        {
            let mut s = fake.0.borrow_mut();
            s.block_play = false;
            s.fail_play = true;
        }
        c.on_user_interaction();
        assert_eq!(fake.0.borrow().play_calls, before + 1);
        assert!(!fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);

        // Still no second retry without a sound change.
        c.on_user_interaction();
        assert_eq!(fake.0.borrow().play_calls, before + 1);
    }

    #[test]
    fn waits_until_the_track_is_ready() {
        let (mut c, fake) = controller(true);
        fake.0.borrow_mut().not_ready = true;
        run(&mut c, Screen::Selection, None, 0, 500);
        assert!(!fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);
        fake.0.borrow_mut().not_ready = false;
        c.update(Screen::Selection, None, 510);
        assert!(fake.0.borrow().track("characterSelectSong.mp3").unwrap().playing);
    }

    #[test]
    fn load_failure_is_not_retried() {
        let (mut c, fake) = controller(true);
        fake.0.borrow_mut().fail_load = true;
        run(&mut c, Screen::Selection, None, 0, 100);
        fake.0.borrow_mut().fail_load = false;
        run(&mut c, Screen::Selection, None, 110, 200);
        assert!(fake.0.borrow().tracks.is_empty());
        assert_eq!(c.current_track(), Some(SELECT_TRACK));
    }

    #[test]
    fn drop_stops_everything() {
        let content = Content::embedded();
        let artist = content.find("artist").unwrap();
        let (mut c, fake) = controller(true);
        run(&mut c, Screen::Selection, None, 0, 2_000);
        c.update(Screen::Title, Some(artist), 2_100);
        drop(c);
        let s = fake.0.borrow();
        assert!(s.tracks.values().all(|t| t.released && !t.playing));
    }
}
