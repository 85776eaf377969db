//! Player-controlled tank.

use super::tank::Tank;
use glam::Vec2;
use tank_protocol::packets::TankView;
use tank_protocol::{Direction, PlayerId};

/// Base movement step per input, in tiles.
pub const PLAYER_BASE_SPEED: f32 = 0.05;
/// Highest attainable star level.
pub const MAX_STARS: u8 = 3;
/// Invincibility granted on spawn, respawn and level start.
pub const SPAWN_INVINCIBILITY_MS: u64 = 3000;
/// Cooldown between shots at cadence 1.0.
pub const BASE_SHOT_COOLDOWN_MS: f32 = 500.0;

const BULLET_SPEED: f32 = 0.3;
const BULLET_SPEED_POWERED: f32 = 0.4;

/// Spawn point of the player in membership slot `slot`.
pub fn spawn_point(slot: usize) -> Vec2 {
    if slot == 0 {
        Vec2::new(8.0, 24.0)
    } else {
        Vec2::new(16.0, 24.0)
    }
}

/// Movement step for a star level.
#[inline]
pub fn speed_for_stars(stars: u8) -> f32 {
    PLAYER_BASE_SPEED * (1.0 + 0.2 * f32::from(stars))
}

/// Shoot cadence multiplier for a star level.
#[inline]
pub fn cadence_for_stars(stars: u8) -> f32 {
    1.0 + 0.2 * f32::from(stars)
}

/// A tank controlled by a connected player.
///
/// Speed, cadence and multi-shot are derived from `stars` on every read, so
/// they can never drift from the star level.
#[derive(Debug, Clone)]
pub struct PlayerTank {
    pub id: PlayerId,
    pub position: Vec2,
    pub direction: Direction,
    /// Level-start position; the tank returns here after being hit.
    pub spawn: Vec2,
    stars: u8,
    /// Absolute end of the current invincibility window.
    pub invincible_until: Option<u64>,
    /// Helmet bubble; cleared together with invincibility.
    pub shielded: bool,
    pub last_shot: Option<u64>,
}

impl PlayerTank {
    /// Create a tank at `spawn` with spawn invincibility starting at `now`.
    pub fn new(id: PlayerId, spawn: Vec2, stars: u8, now: u64) -> Self {
        let mut tank = Self {
            id,
            position: spawn,
            direction: Direction::Up,
            spawn,
            stars: stars.min(MAX_STARS),
            invincible_until: None,
            shielded: false,
            last_shot: None,
        };
        tank.grant_invincibility(now, SPAWN_INVINCIBILITY_MS);
        tank
    }

    #[inline]
    pub fn stars(&self) -> u8 {
        self.stars
    }

    pub fn set_stars(&mut self, stars: u8) {
        self.stars = stars.min(MAX_STARS);
    }

    #[inline]
    pub fn shoot_cadence(&self) -> f32 {
        cadence_for_stars(self.stars)
    }

    #[inline]
    pub fn can_shoot_multiple(&self) -> bool {
        self.stars >= 2
    }

    /// Bullets this tank may have in flight at once.
    #[inline]
    pub fn bullet_limit(&self) -> usize {
        if self.can_shoot_multiple() { 2 } else { 1 }
    }

    #[inline]
    pub fn shot_cooldown_ms(&self) -> u64 {
        (BASE_SHOT_COOLDOWN_MS / self.shoot_cadence()) as u64
    }

    #[inline]
    pub fn bullet_speed(&self) -> f32 {
        if self.stars >= 1 {
            BULLET_SPEED_POWERED
        } else {
            BULLET_SPEED
        }
    }

    /// Whether the shot cooldown has elapsed at `now`.
    pub fn cooldown_ready(&self, now: u64) -> bool {
        self.last_shot
            .is_none_or(|t| now.saturating_sub(t) >= self.shot_cooldown_ms())
    }

    #[inline]
    pub fn is_invincible(&self, now: u64) -> bool {
        self.invincible_until.is_some_and(|until| now < until)
    }

    /// Extend invincibility to at least `now + duration_ms`.
    pub fn grant_invincibility(&mut self, now: u64, duration_ms: u64) {
        let until = now + duration_ms;
        self.invincible_until = Some(self.invincible_until.map_or(until, |u| u.max(until)));
    }

    /// Back to the spawn point after losing a life.
    pub fn respawn(&mut self, now: u64) {
        self.position = self.spawn;
        self.direction = Direction::Up;
        self.shielded = false;
        self.invincible_until = None;
        self.set_stars(0);
        self.grant_invincibility(now, SPAWN_INVINCIBILITY_MS);
    }

    pub fn view(&self, now: u64) -> TankView {
        TankView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            direction: self.direction,
            speed: self.speed(),
            shoot_speed: self.shoot_cadence(),
            invincible: self.is_invincible(now),
            invincible_until: self.invincible_until,
            can_shoot_multiple: self.can_shoot_multiple(),
            is_shielded: self.shielded,
        }
    }
}

impl Tank for PlayerTank {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn speed(&self) -> f32 {
        speed_for_stars(self.stars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_follow_star_level() {
        let mut tank = PlayerTank::new(1, spawn_point(0), 0, 0);
        for stars in 0..=5u8 {
            tank.set_stars(stars);
            let s = stars.min(MAX_STARS);
            assert_eq!(tank.stars(), s);
            assert_eq!(tank.speed(), speed_for_stars(s));
            assert_eq!(tank.shoot_cadence(), cadence_for_stars(s));
            assert_eq!(tank.can_shoot_multiple(), s >= 2);
        }
    }

    #[test]
    fn test_invincibility_window_is_half_open() {
        let tank = PlayerTank::new(1, spawn_point(1), 0, 1000);
        assert_eq!(tank.invincible_until, Some(4000));
        assert!(tank.is_invincible(1000));
        assert!(tank.is_invincible(3999));
        assert!(!tank.is_invincible(4000));
    }

    #[test]
    fn test_grant_never_shortens() {
        let mut tank = PlayerTank::new(1, spawn_point(0), 0, 0);
        tank.grant_invincibility(0, 15000);
        tank.grant_invincibility(100, 3000);
        assert_eq!(tank.invincible_until, Some(15000));
    }

    #[test]
    fn test_cooldown_scales_with_cadence() {
        let mut tank = PlayerTank::new(1, spawn_point(0), 0, 0);
        tank.last_shot = Some(1000);
        assert!(!tank.cooldown_ready(1499));
        assert!(tank.cooldown_ready(1500));
        tank.set_stars(3);
        assert_eq!(tank.shot_cooldown_ms(), 312);
        assert!(tank.cooldown_ready(1312));
    }

    #[test]
    fn test_respawn_resets_position_and_stars() {
        let mut tank = PlayerTank::new(1, spawn_point(0), 2, 0);
        tank.position = Vec2::new(3.0, 3.0);
        tank.respawn(10_000);
        assert_eq!(tank.position, spawn_point(0));
        assert_eq!(tank.stars(), 0);
        assert!(tank.is_invincible(12_999));
        assert!(!tank.is_invincible(13_000));
    }
}
