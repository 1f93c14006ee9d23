//! Headless platform backends
//!
//! Recording implementations of the platform traits, used by the native
//! binary's smoke run and by tests. The renderer records every call so
//! tests can assert on draw order and resource lifetimes; the mixer counts
//! playbacks; the clock is driven manually or by a fixed per-frame step.

use std::cell::Cell;
use std::collections::{HashSet, VecDeque};

use glam::Vec2;

use super::{Clock, Event, EventSource, Image, Mixer, MusicId, Renderer, SampleId};

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub image: u32,
    pub position: Vec2,
    pub size: Vec2,
}

/// Renderer that rasterizes nothing and remembers everything.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_id: u32,
    live: HashSet<u32>,
    /// Set to make every load fail, exercising the soft-fail paths.
    pub fail_loads: bool,
    pub loads: Vec<String>,
    pub texts: Vec<String>,
    pub unloads: u32,
    pub draws: Vec<DrawCall>,
    pub splashes: Vec<u32>,
    pub presents: u32,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, width: f32, height: f32) -> Image {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        Image { id, width, height }
    }

    /// Number of images currently loaded and not yet unloaded.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Forget recorded draw/splash calls, keeping loaded images live.
    pub fn clear_recording(&mut self) {
        self.draws.clear();
        self.splashes.clear();
    }
}

impl Renderer for HeadlessRenderer {
    fn load_image(&mut self, path: &str) -> Option<Image> {
        if self.fail_loads {
            log::warn!(target: "renderer", "failed to load image {path:?}");
            return None;
        }
        self.loads.push(path.to_owned());
        Some(self.alloc(128.0, 32.0))
    }

    fn unload_image(&mut self, image: Option<Image>) {
        if let Some(image) = image {
            self.live.remove(&image.id);
            self.unloads += 1;
        }
    }

    fn text_image(&mut self, text: &str) -> Option<Image> {
        if self.fail_loads {
            log::warn!(target: "renderer", "failed to rasterize text {text:?}");
            return None;
        }
        self.texts.push(text.to_owned());
        let width = 12.0 * text.len() as f32;
        Some(self.alloc(width, 24.0))
    }

    fn draw(&mut self, image: Option<Image>, position: Vec2, size: Vec2) {
        if let Some(image) = image {
            self.draws.push(DrawCall {
                image: image.id,
                position,
                size,
            });
        }
    }

    fn splash(&mut self, image: Image) {
        self.splashes.push(image.id);
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}

/// Mixer that records playback instead of producing audio.
#[derive(Debug, Default)]
pub struct HeadlessMixer {
    next_id: u32,
    pub fail_loads: bool,
    pub sample_plays: Vec<SampleId>,
    pub music_playing: Option<MusicId>,
    pub unloads: u32,
}

impl HeadlessMixer {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Mixer for HeadlessMixer {
    fn load_sample(&mut self, path: &str) -> Option<SampleId> {
        if self.fail_loads {
            log::warn!(target: "mixer", "failed to load sample {path:?}");
            return None;
        }
        Some(SampleId(self.alloc()))
    }

    fn load_music(&mut self, path: &str) -> Option<MusicId> {
        if self.fail_loads {
            log::warn!(target: "mixer", "failed to load music {path:?}");
            return None;
        }
        Some(MusicId(self.alloc()))
    }

    fn play_sample(&mut self, sample: Option<SampleId>) {
        if let Some(sample) = sample {
            self.sample_plays.push(sample);
        }
    }

    fn play_music(&mut self, music: Option<MusicId>) {
        if music.is_some() {
            self.music_playing = music;
        }
    }

    fn stop_music(&mut self) {
        self.music_playing = None;
    }

    fn unload_sample(&mut self, sample: Option<SampleId>) {
        if sample.is_some() {
            self.unloads += 1;
        }
    }

    fn unload_music(&mut self, music: Option<MusicId>) {
        if music.is_some() {
            self.unloads += 1;
        }
    }
}

/// Clock driven by the test (or advanced a fixed step per read).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    step: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that advances by `step` milliseconds on every read.
    pub fn with_step(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Pre-scripted event frames: each inner list is one frame's events, and
/// the `None` between frames is the frame boundary the engine polls up to.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    frames: VecDeque<VecDeque<Event>>,
}

impl ScriptedEvents {
    pub fn new(frames: Vec<Vec<Event>>) -> Self {
        Self {
            frames: frames.into_iter().map(VecDeque::from).collect(),
        }
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self) -> Option<Event> {
        let frame = self.frames.front_mut()?;
        match frame.pop_front() {
            Some(event) => Some(event),
            None => {
                self.frames.pop_front();
                None
            }
        }
    }
}
