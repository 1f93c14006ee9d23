//! Game-state machine and frame loop
//!
//! A registry of named states with exactly one active at a time. The engine
//! owns the world and the platform services and hands them to the active
//! state as an explicit [`Context`] on every dispatch, so states never touch
//! global mutable state and tests can run independent engines in parallel.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::GameInfo;
use crate::platform::{Clock, Event, EventSource, Key, Mixer, Renderer};
use crate::world::World;

/// The capability set every state implements.
pub trait State<B> {
    fn activate(&mut self, ctx: &mut Context<'_, B>);
    fn deactivate(&mut self, ctx: &mut Context<'_, B>);
    fn step(&mut self, speed_multiplier: f32, ctx: &mut Context<'_, B>);
    fn on_press(&mut self, key: Key, ctx: &mut Context<'_, B>);
    fn on_release(&mut self, key: Key, ctx: &mut Context<'_, B>);
}

/// Control request a state raises during a dispatch. The engine applies it
/// as soon as the handler returns, before any further frame work, so no
/// request ever survives across a frame boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChangeState(String),
    Stop,
}

/// The services a state works against for the duration of one dispatch.
pub struct Context<'a, B> {
    pub game: &'a GameInfo,
    pub world: &'a mut World<B>,
    pub renderer: &'a mut dyn Renderer,
    pub mixer: &'a mut dyn Mixer,
    pub clock: &'a dyn Clock,
    pub rng: &'a mut Pcg32,
    command: &'a mut Option<Command>,
}

impl<'a, B> Context<'a, B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        game: &'a GameInfo,
        world: &'a mut World<B>,
        renderer: &'a mut dyn Renderer,
        mixer: &'a mut dyn Mixer,
        clock: &'a dyn Clock,
        rng: &'a mut Pcg32,
        command: &'a mut Option<Command>,
    ) -> Self {
        Self {
            game,
            world,
            renderer,
            mixer,
            clock,
            rng,
            command,
        }
    }

    /// Request a transition to the named state. The last request raised
    /// during a dispatch wins.
    pub fn change_state(&mut self, name: &str) {
        *self.command = Some(Command::ChangeState(name.to_owned()));
    }

    /// Request the run loop to stop.
    pub fn stop(&mut self) {
        *self.command = Some(Command::Stop);
    }
}

enum Call {
    Activate,
    Deactivate,
    Step(f32),
    Press(Key),
    Release(Key),
}

/// Engine: state registry, frame pacing, and service ownership.
pub struct Engine<B> {
    game: GameInfo,
    world: World<B>,
    renderer: Box<dyn Renderer>,
    mixer: Box<dyn Mixer>,
    clock: Box<dyn Clock>,
    rng: Pcg32,
    states: HashMap<String, Box<dyn State<B>>>,
    current: Option<String>,
    running: bool,
    command: Option<Command>,
}

impl<B> Engine<B> {
    pub fn new(
        game: GameInfo,
        renderer: Box<dyn Renderer>,
        mixer: Box<dyn Mixer>,
        clock: Box<dyn Clock>,
        seed: u64,
    ) -> Self {
        log::info!(target: "engine", "{} ({}x{} @ {} fps)", game.name, game.target_width, game.target_height, game.target_fps);
        let world = World::new(game.max_world_layers);
        Self {
            game,
            world,
            renderer,
            mixer,
            clock,
            rng: Pcg32::seed_from_u64(seed),
            states: HashMap::new(),
            current: None,
            running: false,
            command: None,
        }
    }

    pub fn world(&self) -> &World<B> {
        &self.world
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Register a state under a name. A duplicate name is rejected with a
    /// warning and the original registration is kept.
    pub fn register_state(&mut self, name: &str, state: Box<dyn State<B>>) {
        if self.states.contains_key(name) {
            log::warn!(target: "engine", "there is already a state named {name:?} registered");
            return;
        }
        self.states.insert(name.to_owned(), state);
        log::debug!(target: "engine", "state {name:?} registered");
    }

    /// Switch the current state.
    ///
    /// While running this deactivates the outgoing state and activates the
    /// incoming one before moving the pointer. Before `run` it only moves
    /// the pointer: activation of the initial state is the run loop's job.
    /// An unknown name is reported and leaves the current state unchanged.
    pub fn change_state(&mut self, name: &str) {
        if !self.states.contains_key(name) {
            log::error!(target: "engine", "state {name:?} not found");
            return;
        }
        if self.running {
            if let Some(current) = self.current.clone() {
                self.dispatch(&current, Call::Deactivate);
            }
            self.dispatch(name, Call::Activate);
        }
        self.current = Some(name.to_owned());
        log::debug!(target: "engine", "current state changed to {name:?}");
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Drive the frame loop until stopped: step the active state by the
    /// elapsed-time multiplier, forward key events, render, repeat.
    pub fn run(&mut self, initial_state: &str, events: &mut dyn EventSource) {
        if self.running {
            return;
        }
        log::info!(target: "engine", "running");

        self.running = true;
        self.change_state(initial_state);
        self.apply_commands();

        let frame_time = self.game.target_fps as f32 / 1000.0;
        let mut last_tick = self.clock.ticks();

        while self.running {
            let current_tick = self.clock.ticks();
            let elapsed = current_tick.saturating_sub(last_tick);
            last_tick = current_tick;

            if let Some(name) = self.current.clone() {
                self.dispatch(&name, Call::Step(elapsed as f32 * frame_time));
                self.apply_commands();
            }

            while self.running {
                let Some(event) = events.poll() else { break };
                match event {
                    Event::Quit => self.stop(),
                    Event::KeyDown(key) => {
                        if let Some(name) = self.current.clone() {
                            self.dispatch(&name, Call::Press(key));
                            self.apply_commands();
                        }
                    }
                    Event::KeyUp(key) => {
                        if let Some(name) = self.current.clone() {
                            self.dispatch(&name, Call::Release(key));
                            self.apply_commands();
                        }
                    }
                }
            }

            self.world.render(self.renderer.as_mut());
            self.renderer.present();
        }

        log::info!(target: "engine", "stopping");
        if let Some(name) = self.current.clone() {
            self.dispatch(&name, Call::Deactivate);
        }
        log::info!(target: "engine", "stopped");
    }

    fn dispatch(&mut self, name: &str, call: Call) {
        let Some(state) = self.states.get_mut(name) else {
            return;
        };
        let mut ctx = Context {
            game: &self.game,
            world: &mut self.world,
            renderer: self.renderer.as_mut(),
            mixer: self.mixer.as_mut(),
            clock: self.clock.as_ref(),
            rng: &mut self.rng,
            command: &mut self.command,
        };
        match call {
            Call::Activate => state.activate(&mut ctx),
            Call::Deactivate => state.deactivate(&mut ctx),
            Call::Step(multiplier) => state.step(multiplier, &mut ctx),
            Call::Press(key) => state.on_press(key, &mut ctx),
            Call::Release(key) => state.on_release(key, &mut ctx),
        }
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.command.take() {
            match command {
                Command::Stop => self.running = false,
                Command::ChangeState(name) => self.change_state(&name),
            }
        }
    }
}
