//! The in-game simulation state
//!
//! Spawns and steps enemies, projectiles and parallax clouds, resolves
//! collisions, tracks health and score, and ramps difficulty. The world
//! owns every object; this state tracks ids so expiry and restarts are a
//! single world erase per object.

use glam::Vec2;
use rand::Rng;

use crate::consts::*;
use crate::engine::{Context, State};
use crate::game::{Body, Color, Origin, Splash, layers};
use crate::platform::{Image, Key, MusicId, SampleId};
use crate::world::{Object, ObjectId, World, aabb_overlap};

#[derive(Debug)]
pub struct InGame {
    player: Option<ObjectId>,
    lifebar: Option<ObjectId>,
    banner: Option<ObjectId>,
    /// Last rasterized score text, freed before each regeneration.
    banner_image: Option<Image>,

    enemies: Vec<ObjectId>,
    projectiles: Vec<ObjectId>,
    clouds: Vec<ObjectId>,

    game_over: bool,
    /// Current enemy spawn interval in ms; shrinks as the run progresses.
    spawn_interval: f32,
    next_spawn: u64,
    spawn_counter: u32,
    current_tick: u64,
    current_speed: f32,

    background: Option<Image>,
    overlay: Option<Image>,
    lifebar_image: Option<Image>,
    cloud_images: [Option<Image>; 4],
    player_images: [Option<Image>; 4],
    enemy_images: [Option<Image>; 4],
    projectile_images: [Option<Image>; 4],

    shot_sound: Option<SampleId>,
    hit_sound: Option<SampleId>,
    click_sound: Option<SampleId>,
    music: Option<MusicId>,
}

impl Default for InGame {
    fn default() -> Self {
        Self::new()
    }
}

impl InGame {
    pub const NAME: &'static str = "INGAME";

    pub fn new() -> Self {
        Self {
            player: None,
            lifebar: None,
            banner: None,
            banner_image: None,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            clouds: Vec::new(),
            game_over: false,
            spawn_interval: ENEMY_SPAWN_INTERVAL_MS as f32,
            next_spawn: 0,
            spawn_counter: 0,
            current_tick: 0,
            current_speed: 0.0,
            background: None,
            overlay: None,
            lifebar_image: None,
            cloud_images: [None; 4],
            player_images: [None; 4],
            enemy_images: [None; 4],
            projectile_images: [None; 4],
            shot_sound: None,
            hit_sound: None,
            click_sound: None,
            music: None,
        }
    }

    fn load_images(&mut self, ctx: &mut Context<'_, Body>) {
        self.background = ctx.renderer.load_image("assets/images/background.jpg");
        self.overlay = ctx.renderer.load_image("assets/images/overlay.png");
        self.lifebar_image = ctx.renderer.load_image("assets/images/lifebar.png");
        for (index, slot) in self.cloud_images.iter_mut().enumerate() {
            *slot = ctx
                .renderer
                .load_image(&format!("assets/images/cloud{}.png", index + 1));
        }
        for color in Color::ALL {
            let name = color.name();
            self.player_images[color.index()] = ctx
                .renderer
                .load_image(&format!("assets/images/player_{name}.png"));
            self.enemy_images[color.index()] = ctx
                .renderer
                .load_image(&format!("assets/images/enemy_{name}.png"));
            self.projectile_images[color.index()] = ctx
                .renderer
                .load_image(&format!("assets/images/projectile_{name}.png"));
        }
    }

    fn unload_images(&mut self, ctx: &mut Context<'_, Body>) {
        ctx.renderer.unload_image(self.banner_image.take());
        ctx.renderer.unload_image(self.background.take());
        ctx.renderer.unload_image(self.overlay.take());
        ctx.renderer.unload_image(self.lifebar_image.take());
        for slot in self
            .cloud_images
            .iter_mut()
            .chain(self.player_images.iter_mut())
            .chain(self.enemy_images.iter_mut())
            .chain(self.projectile_images.iter_mut())
        {
            ctx.renderer.unload_image(slot.take());
        }
    }

    fn load_sounds(&mut self, ctx: &mut Context<'_, Body>) {
        self.shot_sound = ctx.mixer.load_sample("assets/sounds/shot.flac");
        self.hit_sound = ctx.mixer.load_sample("assets/sounds/hit.flac");
        self.click_sound = ctx.mixer.load_sample("assets/sounds/click.flac");
        self.music = ctx.mixer.load_music("assets/sounds/background.flac");
        ctx.mixer.play_music(self.music);
    }

    fn unload_sounds(&mut self, ctx: &mut Context<'_, Body>) {
        ctx.mixer.stop_music();
        ctx.mixer.unload_sample(self.shot_sound.take());
        ctx.mixer.unload_sample(self.hit_sound.take());
        ctx.mixer.unload_sample(self.click_sound.take());
        ctx.mixer.unload_music(self.music.take());
    }

    /// Place backgrounds, player, HUD and the initial cloud cover, and
    /// reset the run's pacing counters. Used on activation and on restart.
    fn initialize_scene(&mut self, ctx: &mut Context<'_, Body>) {
        let width = ctx.game.target_width as f32;
        let height = ctx.game.target_height as f32;

        ctx.world.set_layer_background(layers::BACKGROUND, self.background);
        ctx.world.set_layer_background(layers::OVERLAY, self.overlay);

        let mut player = Object::new(Body::Player {
            color: Color::Red,
            health: MAX_HEALTH,
            score: 0,
        });
        player.image = self.player_images[Color::Red.index()];
        player.size = Vec2::new(SHIP_WIDTH, SHIP_HEIGHT);
        player.position = Vec2::new(
            (width - SHIP_WIDTH) / 2.0,
            height - (SHIP_HEIGHT + VERTICAL_PADDING),
        );
        self.player = ctx.world.insert(layers::SHIPS, player);

        self.lifebar = None;
        if let Some(image) = self.lifebar_image {
            let mut lifebar = Object::new(Body::Decoration);
            lifebar.image = Some(image);
            lifebar.position = Vec2::new(0.0, height - image.height);
            lifebar.size = Vec2::new(width, LIFEBAR_HEIGHT);
            self.lifebar = ctx.world.insert(layers::HUD, lifebar);
        }

        self.banner = ctx.world.insert(layers::HUD, Object::new(Body::Decoration));

        self.clouds.clear();
        for _ in 0..CLOUD_COUNT {
            let distance = ctx.rng.random_range(5..=20) as f32 / 10.0;
            let mut cloud = Object::new(Body::Cloud { distance });
            cloud.image = self.cloud_images[ctx.rng.random_range(0..=3)];
            cloud.position = Vec2::new(
                random_cloud_x(ctx),
                -(ctx.rng.random_range(CLOUD_HEIGHT as i32..=CLOUD_HEIGHT as i32 * 2) as f32),
            );
            cloud.size = Vec2::new(CLOUD_WIDTH / distance, CLOUD_HEIGHT / distance);
            cloud.velocity = Vec2::new(0.0, CLOUD_SPEED / distance);
            let layer = if distance > 1.0 {
                layers::LOW_CLOUDS
            } else {
                layers::HIGH_CLOUDS
            };
            if let Some(id) = ctx.world.insert(layer, cloud) {
                self.clouds.push(id);
            }
        }

        self.spawn_interval = ENEMY_SPAWN_INTERVAL_MS as f32;
        self.spawn_counter = 0;
        self.game_over = false;
        self.next_spawn = ctx.clock.ticks() + self.spawn_interval as u64;
    }

    fn drop_tracked(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.clouds.clear();
        self.player = None;
        self.lifebar = None;
        self.banner = None;
    }

    fn with_player<R>(
        &self,
        world: &mut World<Body>,
        f: impl FnOnce(&mut Object<Body>) -> R,
    ) -> Option<R> {
        let id = self.player?;
        world.get_mut(id).map(f)
    }

    fn player_score(&self, world: &World<Body>) -> u32 {
        self.player
            .and_then(|id| world.get(id))
            .and_then(|player| match player.body {
                Body::Player { score, .. } => Some(score),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Clouds past the bottom edge wrap to a fresh random spot above the
    /// top; depth and image are kept.
    fn step_clouds(&mut self, ctx: &mut Context<'_, Body>) {
        let height = ctx.game.target_height as f32;
        for &id in &self.clouds {
            let wrapped = ctx
                .world
                .get(id)
                .is_some_and(|cloud| cloud.position.y > height);
            if wrapped {
                let x = random_cloud_x(ctx);
                let y =
                    -(ctx.rng.random_range(CLOUD_HEIGHT as i32..=CLOUD_HEIGHT as i32 * 2) as f32);
                if let Some(cloud) = ctx.world.get_mut(id) {
                    cloud.position = Vec2::new(x, y);
                }
            }
        }
    }

    /// Resolve every live projectile. Returns true when a hit ended the
    /// run, in which case the caller must not run any later step stage.
    fn step_projectiles(&mut self, ctx: &mut Context<'_, Body>) -> bool {
        let width = ctx.game.target_width as f32;
        let height = ctx.game.target_height as f32;

        let mut index = 0;
        while index < self.projectiles.len() {
            let id = self.projectiles[index];
            let Some(object) = ctx.world.get(id) else {
                self.projectiles.remove(index);
                continue;
            };
            let position = object.position;
            let size = object.size;
            let Body::Projectile { color, origin } = object.body else {
                index += 1;
                continue;
            };

            let mut hit = false;

            match origin {
                Origin::Enemy => {
                    let overlaps_player = self.player.and_then(|pid| ctx.world.get(pid)).is_some_and(
                        |player| aabb_overlap(player.position, player.size, position, size),
                    );
                    if overlaps_player {
                        hit = true;
                        let mut remaining = 0;
                        self.with_player(ctx.world, |player| {
                            if let Body::Player { health, .. } = &mut player.body {
                                *health -= color.hit_value() as i32;
                                remaining = *health;
                            }
                        });
                        if let Some(lifebar) = self.lifebar.and_then(|lid| ctx.world.get_mut(lid)) {
                            lifebar.size.x = remaining.max(0) as f32 * width / 100.0;
                        }
                        if remaining <= 0 {
                            ctx.world.remove(id);
                            self.projectiles.remove(index);
                            self.game_over = true;
                            ctx.mixer.play_sample(self.hit_sound);
                            self.update_banner(ctx);
                            ctx.world.update(self.current_speed);
                            return true;
                        }
                    }
                }
                Origin::Player => {
                    let target = self.enemies.iter().position(|&enemy_id| {
                        ctx.world.get(enemy_id).is_some_and(|enemy| {
                            enemy.body.color() == Some(color)
                                && aabb_overlap(enemy.position, enemy.size, position, size)
                        })
                    });
                    if let Some(slot) = target {
                        hit = true;
                        let enemy_id = self.enemies.remove(slot);
                        ctx.world.remove(enemy_id);
                        self.with_player(ctx.world, |player| {
                            if let Body::Player { score, .. } = &mut player.body {
                                *score += color.hit_value();
                            }
                        });
                        self.update_banner(ctx);
                    }
                }
            }

            if hit {
                ctx.mixer.play_sample(self.hit_sound);
            }

            if hit || position.y <= -PROJECTILE_HEIGHT || position.y >= height {
                ctx.world.remove(id);
                self.projectiles.remove(index);
                continue;
            }
            index += 1;
        }
        false
    }

    fn step_enemies(&mut self, ctx: &mut Context<'_, Body>) {
        if self.current_tick >= self.next_spawn {
            self.next_spawn = self.current_tick + self.spawn_interval as u64;
            self.spawn_enemy(ctx);
        }

        let width = ctx.game.target_width as f32;
        for index in 0..self.enemies.len() {
            let id = self.enemies[index];
            let Some(enemy) = ctx.world.get(id) else {
                continue;
            };
            let position = enemy.position;
            let Body::Enemy {
                stop_y,
                next_shot,
                shot_interval,
                ..
            } = enemy.body
            else {
                continue;
            };

            // Descent ends at the assigned altitude; patrol starts in a
            // random direction.
            if position.y > stop_y {
                let patrol = if ctx.rng.random_range(0..=1) == 1 {
                    ENEMY_SPEED
                } else {
                    -ENEMY_SPEED
                };
                if let Some(enemy) = ctx.world.get_mut(id) {
                    enemy.position.y = stop_y;
                    enemy.velocity.y = 0.0;
                    enemy.velocity.x = patrol;
                }
            }

            if position.x >= width - (SHIP_WIDTH + HORIZONTAL_PADDING) {
                if let Some(enemy) = ctx.world.get_mut(id) {
                    enemy.velocity.x = -ENEMY_SPEED;
                }
            }
            if position.x <= HORIZONTAL_PADDING {
                if let Some(enemy) = ctx.world.get_mut(id) {
                    enemy.velocity.x = ENEMY_SPEED;
                }
            }

            if self.current_tick > next_shot {
                if let Some(enemy) = ctx.world.get_mut(id) {
                    if let Body::Enemy { next_shot, .. } = &mut enemy.body {
                        *next_shot = self.current_tick + shot_interval;
                    }
                }
                self.shoot(ctx, id, 1.0);
            }
        }
    }

    /// Positional clamp inside the padded play area; velocity is untouched.
    fn step_player(&mut self, ctx: &mut Context<'_, Body>) {
        let width = ctx.game.target_width as f32;
        let height = ctx.game.target_height as f32;
        self.with_player(ctx.world, |player| {
            player.position.x = player
                .position
                .x
                .clamp(HORIZONTAL_PADDING, width - (SHIP_WIDTH + HORIZONTAL_PADDING));
            player.position.y = player
                .position
                .y
                .clamp(VERTICAL_PADDING, height - (SHIP_HEIGHT + VERTICAL_PADDING));
        });
    }

    /// Fire a projectile from `source`, inheriting its color and side.
    /// `direction` is -1 upward (player) or +1 downward (enemies).
    fn shoot(&mut self, ctx: &mut Context<'_, Body>, source: ObjectId, direction: f32) {
        if self.game_over {
            return;
        }
        let Some(shooter) = ctx.world.get(source) else {
            return;
        };
        let (color, origin) = match shooter.body {
            Body::Player { color, .. } => (color, Origin::Player),
            Body::Enemy { color, .. } => (color, Origin::Enemy),
            _ => return,
        };

        let mut projectile = Object::new(Body::Projectile { color, origin });
        projectile.position = shooter.position
            + Vec2::new(
                (SHIP_WIDTH - PROJECTILE_WIDTH) / 2.0,
                (SHIP_HEIGHT - PROJECTILE_HEIGHT) / 2.0,
            );
        projectile.size = Vec2::new(PROJECTILE_WIDTH, PROJECTILE_HEIGHT);
        projectile.velocity = Vec2::new(0.0, PROJECTILE_SPEED * direction);
        projectile.image = self.projectile_images[color.index()];

        if let Some(id) = ctx.world.insert(layers::PROJECTILES, projectile) {
            self.projectiles.push(id);
        }
        ctx.mixer.play_sample(self.shot_sound);
    }

    fn spawn_enemy(&mut self, ctx: &mut Context<'_, Body>) {
        let width = ctx.game.target_width as f32;

        let color = Color::from_index(ctx.rng.random_range(0..=3));
        let shot_interval = ctx.rng.random_range(
            (ENEMY_SHOT_INTERVAL_MS as f32 * 0.9) as u64
                ..=(ENEMY_SHOT_INTERVAL_MS as f32 * 1.5) as u64,
        );
        let mut enemy = Object::new(Body::Enemy {
            color,
            shot_interval,
            next_shot: self.current_tick + shot_interval,
            stop_y: VERTICAL_PADDING * ctx.rng.random_range(10..=20) as f32 / 10.0,
        });
        enemy.velocity = Vec2::new(0.0, ENEMY_SPEED);
        enemy.size = Vec2::new(SHIP_WIDTH, SHIP_HEIGHT);
        enemy.position = Vec2::new(
            ctx.rng.random_range(
                HORIZONTAL_PADDING as i32..=(width - SHIP_WIDTH - HORIZONTAL_PADDING) as i32,
            ) as f32,
            -SHIP_HEIGHT,
        );
        enemy.speed_multiplier = 1.0 + ctx.rng.random_range(0..=100) as f32 / 100.0;
        enemy.image = self.enemy_images[color.index()];

        self.spawn_counter += 1;
        if self.spawn_counter > ENEMY_SPAWN_THRESHOLD {
            self.spawn_counter = 0;
            self.spawn_interval *= 0.9;
        }

        if let Some(id) = ctx.world.insert(layers::SHIPS, enemy) {
            self.enemies.push(id);
        }
    }

    /// Rasterize the score banner, freeing the previous text image. The
    /// live banner sits at the top; the game-over banner is centered and
    /// carries the final score and the restart prompt.
    fn update_banner(&mut self, ctx: &mut Context<'_, Body>) {
        ctx.renderer.unload_image(self.banner_image.take());

        let width = ctx.game.target_width as f32;
        let height = ctx.game.target_height as f32;
        let score = self.player_score(ctx.world);

        self.banner_image = if self.game_over {
            ctx.renderer.text_image(&format!(
                "GAME OVER | YOU SCORED {score} | PRESS <ENTER> TO RESTART"
            ))
        } else {
            ctx.renderer.text_image(&format!("SCORE: {score}"))
        };

        let game_over = self.game_over;
        if let Some(banner) = self.banner.and_then(|id| ctx.world.get_mut(id)) {
            banner.image = self.banner_image;
            if let Some(image) = self.banner_image {
                banner.position.y = if game_over {
                    (height - image.height) / 2.0
                } else {
                    SCORE_PADDING
                };
                banner.position.x = (width - image.width) / 2.0;
                banner.size = Vec2::new(image.width, image.height);
            }
        }
    }
}

impl State<Body> for InGame {
    fn activate(&mut self, ctx: &mut Context<'_, Body>) {
        ctx.world.clear();
        self.load_images(ctx);
        self.load_sounds(ctx);
        self.initialize_scene(ctx);
        self.update_banner(ctx);
    }

    fn deactivate(&mut self, ctx: &mut Context<'_, Body>) {
        ctx.world.clear();
        self.drop_tracked();
        self.unload_images(ctx);
        self.unload_sounds(ctx);
    }

    fn step(&mut self, speed_multiplier: f32, ctx: &mut Context<'_, Body>) {
        if self.game_over {
            return;
        }

        self.current_speed = speed_multiplier;
        self.current_tick = ctx.clock.ticks();

        self.step_clouds(ctx);
        if self.step_projectiles(ctx) {
            return;
        }
        self.step_enemies(ctx);
        self.step_player(ctx);

        ctx.world.update(speed_multiplier);
    }

    fn on_press(&mut self, key: Key, ctx: &mut Context<'_, Body>) {
        if self.game_over {
            if key == Key::Enter {
                ctx.world.clear();
                self.drop_tracked();
                self.initialize_scene(ctx);
                self.update_banner(ctx);
            }
            return;
        }

        match key {
            Key::Left => {
                self.with_player(ctx.world, |player| player.velocity.x = -PLAYER_SPEED);
            }
            Key::Right => {
                self.with_player(ctx.world, |player| player.velocity.x = PLAYER_SPEED);
            }
            Key::Up => {
                self.with_player(ctx.world, |player| player.velocity.y = -PLAYER_SPEED);
            }
            Key::Down => {
                self.with_player(ctx.world, |player| player.velocity.y = PLAYER_SPEED);
            }
            Key::Spacebar => {
                if let Some(player) = self.player {
                    self.shoot(ctx, player, -1.0);
                }
            }
            Key::A | Key::S | Key::D | Key::F => {
                let color = match key {
                    Key::A => Color::Red,
                    Key::S => Color::Green,
                    Key::D => Color::Blue,
                    _ => Color::Black,
                };
                let image = self.player_images[color.index()];
                self.with_player(ctx.world, |player| {
                    if let Body::Player { color: current, .. } = &mut player.body {
                        *current = color;
                    }
                    player.image = image;
                });
                ctx.mixer.play_sample(self.click_sound);
            }
            _ => {}
        }
    }

    fn on_release(&mut self, key: Key, ctx: &mut Context<'_, Body>) {
        match key {
            Key::Escape => ctx.change_state(Splash::NAME),
            // A release only zeroes its axis while the velocity still
            // matches the value that key set (last-writer-wins).
            Key::Up => {
                self.with_player(ctx.world, |player| {
                    if player.velocity.y == -PLAYER_SPEED {
                        player.velocity.y = 0.0;
                    }
                });
            }
            Key::Down => {
                self.with_player(ctx.world, |player| {
                    if player.velocity.y == PLAYER_SPEED {
                        player.velocity.y = 0.0;
                    }
                });
            }
            Key::Left => {
                self.with_player(ctx.world, |player| {
                    if player.velocity.x == -PLAYER_SPEED {
                        player.velocity.x = 0.0;
                    }
                });
            }
            Key::Right => {
                self.with_player(ctx.world, |player| {
                    if player.velocity.x == PLAYER_SPEED {
                        player.velocity.x = 0.0;
                    }
                });
            }
            _ => {}
        }
    }
}

fn random_cloud_x(ctx: &mut Context<'_, Body>) -> f32 {
    let width = ctx.game.target_width as f32;
    ctx.rng.random_range(
        -(HORIZONTAL_PADDING as i32)..=(width - CLOUD_WIDTH + HORIZONTAL_PADDING) as i32,
    ) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameInfo;
    use crate::engine::Command;
    use crate::platform::headless::{HeadlessMixer, HeadlessRenderer, ManualClock};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        game: GameInfo,
        world: World<Body>,
        renderer: HeadlessRenderer,
        mixer: HeadlessMixer,
        clock: ManualClock,
        rng: Pcg32,
        command: Option<Command>,
    }

    impl Fixture {
        fn new(seed: u64) -> Self {
            let game = GameInfo::default();
            let world = World::new(game.max_world_layers);
            Self {
                game,
                world,
                renderer: HeadlessRenderer::new(),
                mixer: HeadlessMixer::new(),
                clock: ManualClock::new(),
                rng: Pcg32::seed_from_u64(seed),
                command: None,
            }
        }

        fn ctx(&mut self) -> Context<'_, Body> {
            Context::new(
                &self.game,
                &mut self.world,
                &mut self.renderer,
                &mut self.mixer,
                &self.clock,
                &mut self.rng,
                &mut self.command,
            )
        }

        fn health(&self, game: &InGame) -> i32 {
            game.player
                .and_then(|id| self.world.get(id))
                .and_then(|player| match player.body {
                    Body::Player { health, .. } => Some(health),
                    _ => None,
                })
                .unwrap_or(0)
        }

        fn score(&self, game: &InGame) -> u32 {
            game.player_score(&self.world)
        }

        fn player_velocity(&self, game: &InGame) -> Vec2 {
            game.player
                .and_then(|id| self.world.get(id))
                .map(|player| player.velocity)
                .unwrap_or(Vec2::ZERO)
        }

        /// Drop an enemy shot of the given color right on the player.
        fn inject_enemy_shot(&mut self, game: &mut InGame, color: Color) {
            let player = game
                .player
                .and_then(|id| self.world.get(id))
                .expect("player exists");
            let mut shot = Object::new(Body::Projectile {
                color,
                origin: Origin::Enemy,
            });
            shot.position = player.position;
            shot.size = Vec2::new(PROJECTILE_WIDTH, PROJECTILE_HEIGHT);
            let id = self.world.insert(layers::PROJECTILES, shot).unwrap();
            game.projectiles.push(id);
        }

        /// Place a stationary enemy and a player shot overlapping it.
        fn inject_duel(&mut self, game: &mut InGame, enemy_color: Color, shot_color: Color) {
            let mut enemy = Object::new(Body::Enemy {
                color: enemy_color,
                shot_interval: 100_000,
                next_shot: u64::MAX,
                stop_y: 100.0,
            });
            enemy.position = Vec2::new(300.0, 100.0);
            enemy.size = Vec2::new(SHIP_WIDTH, SHIP_HEIGHT);
            let enemy_id = self.world.insert(layers::SHIPS, enemy).unwrap();
            game.enemies.push(enemy_id);

            let mut shot = Object::new(Body::Projectile {
                color: shot_color,
                origin: Origin::Player,
            });
            shot.position = Vec2::new(310.0, 110.0);
            shot.size = Vec2::new(PROJECTILE_WIDTH, PROJECTILE_HEIGHT);
            let shot_id = self.world.insert(layers::PROJECTILES, shot).unwrap();
            game.projectiles.push(shot_id);
        }
    }

    fn activated(seed: u64) -> (Fixture, InGame) {
        let mut fx = Fixture::new(seed);
        let mut game = InGame::new();
        game.activate(&mut fx.ctx());
        (fx, game)
    }

    #[test]
    fn activation_builds_the_scene() {
        let (fx, game) = activated(1);
        assert_eq!(game.clouds.len(), CLOUD_COUNT);
        assert!(game.enemies.is_empty());
        assert!(game.projectiles.is_empty());
        assert_eq!(fx.health(&game), MAX_HEALTH);
        assert_eq!(fx.score(&game), 0);
        assert!(!game.game_over);
        assert!(fx.mixer.music_playing.is_some());
        assert_eq!(fx.renderer.texts.last().map(String::as_str), Some("SCORE: 0"));
        // Player + lifebar + banner + clouds.
        assert_eq!(fx.world.len(), 3 + CLOUD_COUNT);
    }

    #[test]
    fn cloud_depths_stay_in_range() {
        let (fx, game) = activated(2);
        for &id in &game.clouds {
            let cloud = fx.world.get(id).unwrap();
            let Body::Cloud { distance } = cloud.body else {
                panic!("not a cloud");
            };
            assert!((0.5..=2.0).contains(&distance));
            assert!(cloud.position.y < 0.0);
        }
    }

    #[test]
    fn clouds_wrap_to_the_top() {
        let (mut fx, mut game) = activated(3);
        let id = game.clouds[0];
        fx.world.get_mut(id).unwrap().position.y = fx.game.target_height as f32 + 1.0;

        game.step_clouds(&mut fx.ctx());
        let cloud = fx.world.get(id).unwrap();
        assert!(cloud.position.y <= -CLOUD_HEIGHT);
    }

    #[test]
    fn spawn_interval_shrinks_every_third_spawn() {
        let (mut fx, mut game) = activated(4);
        let base = game.spawn_interval;

        let mut expected = base;
        for spawn in 1..=9u32 {
            game.spawn_enemy(&mut fx.ctx());
            if spawn % 3 == 0 {
                expected *= 0.9;
            }
            assert!(
                (game.spawn_interval - expected).abs() < 1e-3,
                "after spawn {spawn}: {} != {expected}",
                game.spawn_interval
            );
        }
        assert_eq!(game.enemies.len(), 9);
    }

    #[test]
    fn five_black_hits_end_the_run() {
        let (mut fx, mut game) = activated(5);

        for hit in 1..=5 {
            fx.inject_enemy_shot(&mut game, Color::Black);
            game.step_projectiles(&mut fx.ctx());
            if hit < 5 {
                assert_eq!(fx.health(&game), MAX_HEALTH - 20 * hit);
                assert!(!game.game_over);
            }
        }
        assert_eq!(fx.health(&game), 0);
        assert!(game.game_over);
        assert!(
            fx.renderer
                .texts
                .last()
                .is_some_and(|text| text.starts_with("GAME OVER"))
        );
    }

    #[test]
    fn enemy_hits_rescale_the_lifebar() {
        let (mut fx, mut game) = activated(6);
        fx.inject_enemy_shot(&mut game, Color::Green);
        game.step_projectiles(&mut fx.ctx());

        assert_eq!(fx.health(&game), 90);
        let lifebar = fx.world.get(game.lifebar.unwrap()).unwrap();
        let expected = 90.0 * fx.game.target_width as f32 / 100.0;
        assert!((lifebar.size.x - expected).abs() < f32::EPSILON);
    }

    #[test]
    fn score_awards_match_color_values() {
        let (mut fx, mut game) = activated(7);

        fx.inject_duel(&mut game, Color::Red, Color::Red);
        game.step_projectiles(&mut fx.ctx());
        assert_eq!(fx.score(&game), 5);
        assert!(game.enemies.is_empty());
        assert!(game.projectiles.is_empty());

        fx.inject_duel(&mut game, Color::Black, Color::Black);
        game.step_projectiles(&mut fx.ctx());
        assert_eq!(fx.score(&game), 25);
        assert!(!fx.mixer.sample_plays.is_empty());
    }

    #[test]
    fn projectiles_only_hit_matching_color() {
        let (mut fx, mut game) = activated(8);

        fx.inject_duel(&mut game, Color::Green, Color::Red);
        game.step_projectiles(&mut fx.ctx());

        assert_eq!(fx.score(&game), 0);
        assert_eq!(game.enemies.len(), 1);
        assert_eq!(game.projectiles.len(), 1);
    }

    #[test]
    fn out_of_bounds_projectiles_are_reclaimed() {
        let (mut fx, mut game) = activated(9);

        let mut shot = Object::new(Body::Projectile {
            color: Color::Red,
            origin: Origin::Player,
        });
        shot.position = Vec2::new(100.0, -PROJECTILE_HEIGHT);
        shot.size = Vec2::new(PROJECTILE_WIDTH, PROJECTILE_HEIGHT);
        let id = fx.world.insert(layers::PROJECTILES, shot).unwrap();
        game.projectiles.push(id);

        game.step_projectiles(&mut fx.ctx());
        assert!(game.projectiles.is_empty());
        assert!(fx.world.get(id).is_none());
    }

    #[test]
    fn directional_release_is_last_writer_wins() {
        let (mut fx, mut game) = activated(10);

        game.on_press(Key::Left, &mut fx.ctx());
        assert_eq!(fx.player_velocity(&game).x, -PLAYER_SPEED);

        game.on_press(Key::Right, &mut fx.ctx());
        assert_eq!(fx.player_velocity(&game).x, PLAYER_SPEED);

        game.on_release(Key::Left, &mut fx.ctx());
        assert_eq!(fx.player_velocity(&game).x, PLAYER_SPEED);

        game.on_release(Key::Right, &mut fx.ctx());
        assert_eq!(fx.player_velocity(&game).x, 0.0);
    }

    #[test]
    fn repressing_a_direction_is_idempotent() {
        let (mut fx, mut game) = activated(11);
        game.on_press(Key::Up, &mut fx.ctx());
        game.on_press(Key::Up, &mut fx.ctx());
        assert_eq!(fx.player_velocity(&game).y, -PLAYER_SPEED);
    }

    #[test]
    fn color_keys_swap_skin_and_click() {
        let (mut fx, mut game) = activated(12);
        game.on_press(Key::S, &mut fx.ctx());

        let player = fx.world.get(game.player.unwrap()).unwrap();
        assert_eq!(player.body.color(), Some(Color::Green));
        assert_eq!(player.image, game.player_images[Color::Green.index()]);
        assert_eq!(fx.mixer.sample_plays.last(), game.click_sound.as_ref());
    }

    #[test]
    fn space_fires_upward() {
        let (mut fx, mut game) = activated(13);
        game.on_press(Key::Spacebar, &mut fx.ctx());

        assert_eq!(game.projectiles.len(), 1);
        let shot = fx.world.get(game.projectiles[0]).unwrap();
        assert_eq!(shot.velocity.y, -PROJECTILE_SPEED);
        assert_eq!(
            shot.body,
            Body::Projectile {
                color: Color::Red,
                origin: Origin::Player,
            }
        );
        assert_eq!(fx.mixer.sample_plays.last(), game.shot_sound.as_ref());
    }

    #[test]
    fn game_over_suspends_stepping_and_shooting() {
        let (mut fx, mut game) = activated(14);
        for _ in 0..5 {
            fx.inject_enemy_shot(&mut game, Color::Black);
            game.step_projectiles(&mut fx.ctx());
        }
        assert!(game.game_over);

        let before = fx
            .world
            .get(game.player.unwrap())
            .map(|player| player.position)
            .unwrap();
        fx.clock.set(1_000_000);
        game.step(1.0, &mut fx.ctx());
        game.on_press(Key::Spacebar, &mut fx.ctx());

        let after = fx
            .world
            .get(game.player.unwrap())
            .map(|player| player.position)
            .unwrap();
        assert_eq!(before, after);
        assert!(game.projectiles.is_empty());
        assert!(game.enemies.is_empty());
    }

    #[test]
    fn restart_resets_the_run() {
        let (mut fx, mut game) = activated(15);

        fx.inject_duel(&mut game, Color::Blue, Color::Blue);
        game.step_projectiles(&mut fx.ctx());
        assert_eq!(fx.score(&game), 15);

        for _ in 0..5 {
            fx.inject_enemy_shot(&mut game, Color::Black);
            game.step_projectiles(&mut fx.ctx());
        }
        assert!(game.game_over);

        game.on_press(Key::Enter, &mut fx.ctx());
        assert!(!game.game_over);
        assert_eq!(fx.health(&game), MAX_HEALTH);
        assert_eq!(fx.score(&game), 0);
        assert_eq!(game.clouds.len(), CLOUD_COUNT);
        assert!(game.enemies.is_empty());
        assert!(game.projectiles.is_empty());
        assert_eq!(game.spawn_counter, 0);
        assert_eq!(game.spawn_interval, ENEMY_SPAWN_INTERVAL_MS as f32);
    }

    #[test]
    fn only_enter_restarts_after_game_over() {
        let (mut fx, mut game) = activated(16);
        for _ in 0..5 {
            fx.inject_enemy_shot(&mut game, Color::Black);
            game.step_projectiles(&mut fx.ctx());
        }
        game.on_press(Key::Left, &mut fx.ctx());
        game.on_press(Key::A, &mut fx.ctx());
        assert!(game.game_over);
    }

    #[test]
    fn escape_requests_the_splash_screen() {
        let (mut fx, mut game) = activated(17);
        game.on_release(Key::Escape, &mut fx.ctx());
        assert_eq!(
            fx.command,
            Some(Command::ChangeState(Splash::NAME.to_owned()))
        );
    }

    #[test]
    fn banner_regeneration_frees_the_previous_text() {
        let (mut fx, mut game) = activated(18);
        let live_after_activation = fx.renderer.live_count();

        fx.inject_duel(&mut game, Color::Red, Color::Red);
        game.step_projectiles(&mut fx.ctx());

        assert_eq!(fx.renderer.texts.last().map(String::as_str), Some("SCORE: 5"));
        assert_eq!(fx.renderer.live_count(), live_after_activation);
    }

    #[test]
    fn deactivation_releases_every_resource() {
        let (mut fx, mut game) = activated(19);
        game.deactivate(&mut fx.ctx());

        assert!(fx.world.is_empty());
        assert_eq!(fx.renderer.live_count(), 0);
        assert!(fx.mixer.music_playing.is_none());
        assert_eq!(fx.mixer.unloads, 4);
    }

    #[test]
    fn failed_asset_loads_degrade_gracefully() {
        let mut fx = Fixture::new(20);
        fx.renderer.fail_loads = true;
        fx.mixer.fail_loads = true;

        let mut game = InGame::new();
        game.activate(&mut fx.ctx());
        // No lifebar object without its image; everything else still runs.
        assert!(game.lifebar.is_none());
        game.step(1.0, &mut fx.ctx());
        game.on_press(Key::Spacebar, &mut fx.ctx());
        assert_eq!(game.projectiles.len(), 1);

        fx.world.render(&mut fx.renderer);
        assert!(fx.renderer.draws.is_empty());
        assert!(fx.renderer.splashes.is_empty());
    }

    #[test]
    fn enemy_fires_after_its_deadline() {
        let (mut fx, mut game) = activated(42);
        assert_eq!(game.next_spawn, ENEMY_SPAWN_INTERVAL_MS);

        fx.clock.set(ENEMY_SPAWN_INTERVAL_MS + 20);
        game.step(1.0, &mut fx.ctx());
        assert_eq!(game.enemies.len(), 1);
        assert!(game.projectiles.is_empty());

        let enemy = fx.world.get(game.enemies[0]).unwrap();
        let Body::Enemy { next_shot, .. } = enemy.body else {
            panic!("not an enemy");
        };

        fx.clock.set(next_shot + 1);
        game.step(1.0, &mut fx.ctx());

        assert_eq!(game.enemies.len(), 1);
        assert_eq!(game.projectiles.len(), 1);
        assert_eq!(fx.world.layer_objects(layers::PROJECTILES).count(), 1);
        let (_, shot) = fx.world.layer_objects(layers::PROJECTILES).next().unwrap();
        assert_eq!(shot.velocity.y, PROJECTILE_SPEED);
        assert!(matches!(
            shot.body,
            Body::Projectile {
                origin: Origin::Enemy,
                ..
            }
        ));
    }

    #[test]
    fn player_is_clamped_to_the_padded_area() {
        let (mut fx, mut game) = activated(21);
        let width = fx.game.target_width as f32;

        if let Some(player) = fx.world.get_mut(game.player.unwrap()) {
            player.position = Vec2::new(-500.0, 10_000.0);
        }
        game.step_player(&mut fx.ctx());

        let player = fx.world.get(game.player.unwrap()).unwrap();
        assert_eq!(player.position.x, HORIZONTAL_PADDING);
        assert_eq!(
            player.position.y,
            fx.game.target_height as f32 - (SHIP_HEIGHT + VERTICAL_PADDING)
        );
        assert!(player.position.x <= width);
    }
}
