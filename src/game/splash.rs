//! Splash screen state
//!
//! Shows a single full-screen image until the player either starts a run
//! (Enter) or quits (Escape).

use crate::engine::{Context, State};
use crate::game::{Body, InGame};
use crate::platform::{Image, Key};

#[derive(Debug, Default)]
pub struct Splash {
    image: Option<Image>,
}

impl Splash {
    pub const NAME: &'static str = "SPLASH";

    pub fn new() -> Self {
        Self::default()
    }
}

impl State<Body> for Splash {
    fn activate(&mut self, ctx: &mut Context<'_, Body>) {
        self.image = ctx.renderer.load_image("assets/images/splash.jpg");
        ctx.world.clear();
    }

    fn deactivate(&mut self, ctx: &mut Context<'_, Body>) {
        ctx.world.clear();
        ctx.renderer.unload_image(self.image.take());
    }

    fn step(&mut self, _speed_multiplier: f32, ctx: &mut Context<'_, Body>) {
        ctx.world.set_layer_background(0, self.image);
    }

    fn on_press(&mut self, _key: Key, _ctx: &mut Context<'_, Body>) {}

    fn on_release(&mut self, key: Key, ctx: &mut Context<'_, Body>) {
        match key {
            Key::Escape => ctx.stop(),
            Key::Enter => ctx.change_state(InGame::NAME),
            _ => {}
        }
    }
}
