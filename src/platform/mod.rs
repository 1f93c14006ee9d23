//! Platform abstraction layer
//!
//! The narrow seams the simulation core calls instead of owning a graphics
//! or audio backend: image/text rendering, sample and music playback, a
//! millisecond tick source, and the translation from raw key codes to the
//! closed game key set. Every fallible operation returns an `Option`; a
//! `None` handle is a safe no-op everywhere downstream.

pub mod headless;

use glam::Vec2;

/// Handle to a loaded (or rasterized) image.
///
/// The backend owns the pixel data; the handle carries the dimensions the
/// simulation needs for placement and collision sizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Image {
    pub id: u32,
    pub width: f32,
    pub height: f32,
}

/// Handle to a loaded sound sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleId(pub u32);

/// Handle to a loaded music track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicId(pub u32);

/// Rendering backend contract.
///
/// Load failures are logged by the implementation and surface as `None`;
/// drawing a `None` image is a no-op. Presentation is driven once per frame
/// by the engine loop, never by a state.
pub trait Renderer {
    fn load_image(&mut self, path: &str) -> Option<Image>;
    fn unload_image(&mut self, image: Option<Image>);
    /// Rasterize text with the backend's default font.
    fn text_image(&mut self, text: &str) -> Option<Image>;
    fn draw(&mut self, image: Option<Image>, position: Vec2, size: Vec2);
    /// Paint an image across the full viewport (layer backgrounds).
    fn splash(&mut self, image: Image);
    fn present(&mut self);
}

/// Audio backend contract. Samples are fire-and-forget and may overlap;
/// music loops until stopped. All operations are `None`-safe.
pub trait Mixer {
    fn load_sample(&mut self, path: &str) -> Option<SampleId>;
    fn load_music(&mut self, path: &str) -> Option<MusicId>;
    fn play_sample(&mut self, sample: Option<SampleId>);
    fn play_music(&mut self, music: Option<MusicId>);
    fn stop_music(&mut self);
    fn unload_sample(&mut self, sample: Option<SampleId>);
    fn unload_music(&mut self, music: Option<MusicId>);
}

/// Monotonic millisecond tick source used for spawn and shot scheduling.
pub trait Clock {
    fn ticks(&self) -> u64;
}

/// The closed set of keys the game reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Spacebar,
    A,
    S,
    D,
    F,
    Up,
    Down,
    Left,
    Right,
}

/// A host-loop event after key translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Quit,
    KeyDown(Key),
    KeyUp(Key),
}

/// Source of translated events, polled to exhaustion once per frame.
pub trait EventSource {
    fn poll(&mut self) -> Option<Event>;
}

/// Translate an SDL-style raw keycode into a game key.
///
/// Unmapped keys yield `None` and never reach a state.
pub fn map_keycode(raw: u32) -> Option<Key> {
    match raw {
        0x1B => Some(Key::Escape),
        0x0D => Some(Key::Enter),
        0x20 => Some(Key::Spacebar),
        0x61 => Some(Key::A),
        0x73 => Some(Key::S),
        0x64 => Some(Key::D),
        0x66 => Some(Key::F),
        0x4000_0052 => Some(Key::Up),
        0x4000_0051 => Some(Key::Down),
        0x4000_0050 => Some(Key::Left),
        0x4000_004F => Some(Key::Right),
        _ => None,
    }
}
