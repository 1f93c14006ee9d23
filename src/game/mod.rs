//! Gameplay types shared by the splash and in-game states

pub mod ingame;
pub mod splash;

pub use ingame::InGame;
pub use splash::Splash;

/// Painter's-order layer assignments. Lower index draws further back.
pub mod layers {
    pub const BACKGROUND: usize = 0;
    pub const LOW_CLOUDS: usize = 1;
    pub const PROJECTILES: usize = 2;
    pub const SHIPS: usize = 3;
    pub const HIGH_CLOUDS: usize = 4;
    pub const HUD: usize = 5;
    pub const OVERLAY: usize = 6;
    pub const COUNT: usize = 7;
}

/// Object color, doubling as sprite skin selector and friendly-fire key:
/// a projectile only hits enemies of its own color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    Black,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Black];

    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Blue => 2,
            Color::Black => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Lowercase name used in sprite asset paths.
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Black => "black",
        }
    }

    /// Damage dealt by a projectile of this color, and points awarded for
    /// destroying an enemy of it: Red 5, Green 10, Blue 15, Black 20.
    pub fn hit_value(self) -> u32 {
        (self.index() as u32 + 1) * 5
    }
}

/// Who fired a projectile; enemy shots hurt the player, player shots hurt
/// same-colored enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Player,
    Enemy,
}

/// Gameplay payload carried by every world object.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// HUD and other inert scenery (lifebar, score banner).
    Decoration,
    /// Parallax cloud; `distance` drives apparent size and scroll speed.
    Cloud { distance: f32 },
    Player {
        color: Color,
        health: i32,
        score: u32,
    },
    Enemy {
        color: Color,
        /// Milliseconds between shots.
        shot_interval: u64,
        /// Tick at which the next shot fires.
        next_shot: u64,
        /// Altitude where descent halts and horizontal patrol begins.
        stop_y: f32,
    },
    Projectile { color: Color, origin: Origin },
}

impl Body {
    pub fn color(&self) -> Option<Color> {
        match self {
            Body::Player { color, .. }
            | Body::Enemy { color, .. }
            | Body::Projectile { color, .. } => Some(*color),
            _ => None,
        }
    }
}
