//! AI-controlled enemy tanks and their per-type behaviour table.

use super::tank::Tank;
use glam::Vec2;
use tank_protocol::packets::EnemyView;
use tank_protocol::{Direction, EnemyKind};

/// Fixed parameters of an enemy type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    /// Movement step per tick, in tiles.
    pub speed: f32,
    /// Hits needed at power 1.
    pub health: u8,
    /// Per-tick chance of reconsidering direction.
    pub direction_change_chance: f64,
    /// Chance that a reconsidered direction heads for the nearest player.
    pub target_chance: f64,
    /// Per-tick chance of firing once the cooldown is over.
    pub shoot_chance: f64,
    pub shoot_cooldown_ms: u64,
    /// Points awarded for the kill.
    pub score: u32,
    pub bullet_power: u8,
}

const BASIC: EnemyProfile = EnemyProfile {
    speed: 0.04,
    health: 1,
    direction_change_chance: 0.02,
    target_chance: 0.4,
    shoot_chance: 0.008,
    shoot_cooldown_ms: 1500,
    score: 100,
    bullet_power: 1,
};

const FAST: EnemyProfile = EnemyProfile {
    speed: 0.07,
    health: 1,
    direction_change_chance: 0.04,
    target_chance: 0.3,
    shoot_chance: 0.006,
    shoot_cooldown_ms: 1500,
    score: 200,
    bullet_power: 1,
};

const POWER: EnemyProfile = EnemyProfile {
    speed: 0.04,
    health: 1,
    direction_change_chance: 0.01,
    target_chance: 0.6,
    shoot_chance: 0.012,
    shoot_cooldown_ms: 1000,
    score: 300,
    bullet_power: 2,
};

const ARMOR: EnemyProfile = EnemyProfile {
    speed: 0.03,
    health: 4,
    direction_change_chance: 0.005,
    target_chance: 0.7,
    shoot_chance: 0.01,
    shoot_cooldown_ms: 1500,
    score: 400,
    bullet_power: 1,
};

impl EnemyProfile {
    /// Behaviour table lookup.
    pub const fn of(kind: EnemyKind) -> &'static EnemyProfile {
        match kind {
            EnemyKind::Basic => &BASIC,
            EnemyKind::Fast => &FAST,
            EnemyKind::Power => &POWER,
            EnemyKind::Armor => &ARMOR,
        }
    }
}

/// Enemy bullet speed, in tiles per tick.
pub const ENEMY_BULLET_SPEED: f32 = 0.25;

/// An enemy tank.
#[derive(Debug, Clone)]
pub struct EnemyTank {
    pub id: u32,
    pub kind: EnemyKind,
    pub position: Vec2,
    pub direction: Direction,
    pub health: u8,
    /// Killing this tank forces a power-up spawn.
    pub carry_power_up: bool,
    pub frozen_until: Option<u64>,
    pub last_shot: Option<u64>,
}

impl EnemyTank {
    pub fn new(id: u32, kind: EnemyKind, position: Vec2, carry_power_up: bool) -> Self {
        Self {
            id,
            kind,
            position,
            direction: Direction::Down,
            health: EnemyProfile::of(kind).health,
            carry_power_up,
            frozen_until: None,
            last_shot: None,
        }
    }

    #[inline]
    pub fn profile(&self) -> &'static EnemyProfile {
        EnemyProfile::of(self.kind)
    }

    #[inline]
    pub fn is_frozen(&self, now: u64) -> bool {
        self.frozen_until.is_some_and(|until| now < until)
    }

    /// Apply `power` damage. Returns true if the tank is destroyed.
    pub fn take_hit(&mut self, power: u8) -> bool {
        self.health = self.health.saturating_sub(power);
        self.health == 0
    }

    pub fn cooldown_ready(&self, now: u64) -> bool {
        self.last_shot
            .is_none_or(|t| now.saturating_sub(t) > self.profile().shoot_cooldown_ms)
    }

    pub fn view(&self, now: u64) -> EnemyView {
        EnemyView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            direction: self.direction,
            speed: self.speed(),
            kind: self.kind,
            health: self.health,
            carry_power_up: self.carry_power_up,
            frozen: self.is_frozen(now),
            frozen_until: self.frozen_until,
        }
    }
}

impl Tank for EnemyTank {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn speed(&self) -> f32 {
        self.profile().speed
    }
}
