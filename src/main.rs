//! Sky Invaders entry point
//!
//! Wires the simulation to the headless backends and drives a short scripted
//! session: splash, a few in-game frames with some input, back to the splash,
//! quit. A graphical build swaps the backends for real ones; the simulation
//! side is identical.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sky_invaders::GameInfo;
use sky_invaders::engine::Engine;
use sky_invaders::game::{Body, InGame, Splash};
use sky_invaders::platform::headless::{
    HeadlessMixer, HeadlessRenderer, ManualClock, ScriptedEvents,
};
use sky_invaders::platform::{Event, Key};

fn main() {
    env_logger::init();

    let game = match std::env::args().nth(1) {
        Some(path) => GameInfo::load(Path::new(&path)),
        None => GameInfo::default(),
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0x5EED);
    log::info!(target: "main", "seed {seed}");

    let frame_ms = 1000 / game.target_fps.max(1) as u64;
    let mut engine: Engine<Body> = Engine::new(
        game,
        Box::new(HeadlessRenderer::new()),
        Box::new(HeadlessMixer::new()),
        Box::new(ManualClock::with_step(frame_ms)),
        seed,
    );
    engine.register_state(Splash::NAME, Box::new(Splash::new()));
    engine.register_state(InGame::NAME, Box::new(InGame::new()));

    let mut events = ScriptedEvents::new(vec![
        vec![Event::KeyUp(Key::Enter)], // leave the splash screen
        vec![Event::KeyDown(Key::Left)],
        vec![Event::KeyUp(Key::Left)],
        vec![Event::KeyDown(Key::Spacebar)],
        vec![],
        vec![Event::KeyDown(Key::S), Event::KeyDown(Key::Spacebar)],
        vec![],
        vec![Event::KeyUp(Key::Escape)], // back to the splash screen
        vec![Event::KeyUp(Key::Escape)], // and out
    ]);
    engine.run(Splash::NAME, &mut events);
}
