//! Game state and the per-tick simulation.

use crate::ai;
use crate::collision::{Mover, PLAYER_TOLERANCE, is_blocked, overlaps};
use crate::config::GameConfig;
use crate::entity::{Bullet, Faction, Player, PlayerTank, PowerUp, Tank, spawn_point};
use crate::map::Map;
use crate::world::World;
use rand::Rng;
use tank_protocol::packets::{GameSnapshot, InputState, MapView, PlayerStats, ServerPacket};
use tank_protocol::{ExplosionSize, MAP_SIZE, PlayerId, PowerUpKind, Sound};
use tracing::debug;

use super::spawner;

/// Helmet invincibility.
const HELMET_MS: u64 = 15_000;
/// Clock freeze.
const FREEZE_MS: u64 = 10_000;
/// Points for collecting any power-up.
const POWER_UP_POINTS: u32 = 500;
/// Points per enemy destroyed by a grenade.
const GRENADE_POINTS: u32 = 100;
/// Half-extent of the box a bullet must enter to hit a tank.
const BULLET_HIT_REACH: f32 = 0.5;

const MAP_MAX: f32 = (MAP_SIZE - 1) as f32;

/// Pending broadcasts to send after releasing the room lock.
#[derive(Debug, Default)]
pub struct PendingBroadcasts {
    pub events: Vec<ServerPacket>,
    /// A shovel was collected; the revert timer must be (re)armed.
    pub shovel_armed: bool,
}

impl PendingBroadcasts {
    #[inline]
    pub fn push(&mut self, packet: ServerPacket) {
        self.events.push(packet);
    }

    #[inline]
    pub fn sound(&mut self, sound: Sound) {
        self.events.push(ServerPacket::PlaySound { sound });
    }
}

/// What the end-of-tick evaluation decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    GameOver(&'static str),
    LevelComplete,
}

/// Everything simulated inside one room.
#[derive(Debug, Clone)]
pub struct GameState {
    pub world: World,
    /// 1-based level index.
    pub level: u32,
    /// Enemies not yet spawned this level.
    pub remaining_enemies: u32,
    pub base_destroyed: bool,
    pub game_over: bool,
    pub level_completed: bool,
    pub is_paused: bool,
    pub tick_count: u64,
    pub rules: GameConfig,
}

impl GameState {
    pub fn new(map: Map, rules: GameConfig) -> Self {
        Self {
            world: World::new(map),
            level: 1,
            remaining_enemies: rules.enemies_per_level,
            base_destroyed: false,
            game_over: false,
            level_completed: false,
            is_paused: false,
            tick_count: 0,
            rules,
        }
    }

    /// Enemies spawned so far this level.
    #[inline]
    pub fn spawned_this_level(&self) -> u32 {
        self.rules.enemies_per_level - self.remaining_enemies
    }

    /// Put a fresh tank on the field for every player.
    pub fn start(&mut self, players: &[Player], now: u64) {
        self.world.tanks.clear();
        for (slot, player) in players.iter().enumerate() {
            self.world
                .tanks
                .push(PlayerTank::new(player.id, spawn_point(slot), player.stars, now));
        }
    }

    /// Advance one tick. All expiry checks use `now`.
    pub fn tick<R: Rng>(&mut self, players: &mut [Player], now: u64, rng: &mut R) -> PendingBroadcasts {
        let mut pending = PendingBroadcasts::default();
        self.tick_count += 1;

        self.expire_invincibility(now, &mut pending);

        let shots = ai::update_enemies(&mut self.world, now, rng);
        for _ in 0..shots {
            pending.sound(Sound::Shoot);
        }

        self.update_bullets(players, now, rng, &mut pending);
        self.world.explosions.retain_mut(|e| e.age_one_tick());
        self.update_power_ups(players, now, &mut pending);

        if self.tick_count % 100 == 0 {
            debug!(
                "Tick #{}: level {}, {} enemies live, {} remaining, {} bullets",
                self.tick_count,
                self.level,
                self.world.enemy_tanks.len(),
                self.remaining_enemies,
                self.world.bullets.len()
            );
        }

        pending
    }

    fn expire_invincibility(&mut self, now: u64, pending: &mut PendingBroadcasts) {
        for tank in &mut self.world.tanks {
            if tank.invincible_until.is_some_and(|until| now >= until) {
                tank.invincible_until = None;
                tank.shielded = false;
                pending.push(ServerPacket::PlayerPowerUpExpired {
                    player_id: tank.id,
                    power_up: "invincible".to_string(),
                });
            }
        }
    }

    fn update_bullets<R: Rng>(
        &mut self,
        players: &mut [Player],
        now: u64,
        rng: &mut R,
        pending: &mut PendingBroadcasts,
    ) {
        let mut i = 0;
        while i < self.world.bullets.len() {
            self.world.bullets[i].advance();
            let mut bullet = self.world.bullets[i].clone();
            let end = bullet.position;
            // Test every point passed this tick, not just where it landed.
            let consumed = bullet.path_samples().any(|point| {
                bullet.position = point;
                self.resolve_bullet(&bullet, players, now, rng, pending)
            });
            if consumed {
                self.world.bullets.remove(i);
            } else {
                self.world.bullets[i].swept_from = end;
                i += 1;
            }
        }
    }

    /// Returns true if the bullet was consumed.
    fn resolve_bullet<R: Rng>(
        &mut self,
        bullet: &Bullet,
        players: &mut [Player],
        now: u64,
        rng: &mut R,
        pending: &mut PendingBroadcasts,
    ) -> bool {
        let pos = bullet.position;
        if pos.x < 0.0 || pos.x > MAP_MAX || pos.y < 0.0 || pos.y > MAP_MAX {
            return true;
        }

        let tile = bullet.tile();
        if self.world.map.remove_brick(tile) {
            self.world.spawn_explosion(tile.as_vec2(), ExplosionSize::Small);
            pending.sound(Sound::WallHit);
            return true;
        }
        if self.world.map.is_steel(tile) {
            pending.sound(Sound::WallHit);
            return true;
        }
        if self.world.map.is_base(tile) {
            self.base_destroyed = true;
            self.world.spawn_explosion(tile.as_vec2(), ExplosionSize::Large);
            pending.sound(Sound::Explosion);
            return true;
        }

        match bullet.faction {
            Faction::Player => {
                let target = self
                    .world
                    .enemy_tanks
                    .iter()
                    .position(|e| overlaps(pos, e.position, BULLET_HIT_REACH));
                if let Some(idx) = target {
                    self.hit_enemy(idx, bullet, players, now, rng, pending);
                    return true;
                }
                // Friendly fire is absorbed.
                self.world
                    .tanks
                    .iter()
                    .any(|t| t.id != bullet.owner && overlaps(pos, t.position, BULLET_HIT_REACH))
            }
            Faction::Enemy => {
                let target = self
                    .world
                    .tanks
                    .iter()
                    .position(|t| overlaps(pos, t.position, BULLET_HIT_REACH));
                match target {
                    Some(idx) => {
                        self.hit_player(idx, players, now, pending);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn hit_enemy<R: Rng>(
        &mut self,
        idx: usize,
        bullet: &Bullet,
        players: &mut [Player],
        now: u64,
        rng: &mut R,
        pending: &mut PendingBroadcasts,
    ) {
        if !self.world.enemy_tanks[idx].take_hit(bullet.power) {
            return;
        }

        let enemy = self.world.enemy_tanks.remove(idx);
        self.world.spawn_explosion(enemy.position, ExplosionSize::Large);
        pending.sound(Sound::Explosion);

        if let Some(player) = players.iter_mut().find(|p| p.id == bullet.owner) {
            player.score += enemy.profile().score;
            pending.push(ServerPacket::ScoreUpdate {
                player_id: player.id,
                score: player.score,
            });
        }

        if enemy.carry_power_up && self.world.power_ups.is_empty() {
            let lifetime = self.rules.power_up_lifetime_ms;
            if let Some(power_up) = spawner::place_power_up(&mut self.world, now, lifetime, rng) {
                pending.push(ServerPacket::PowerUpSpawned { power_up });
            }
        }
    }

    fn hit_player(&mut self, idx: usize, players: &mut [Player], now: u64, pending: &mut PendingBroadcasts) {
        let tank = &self.world.tanks[idx];
        if tank.is_invincible(now) || tank.shielded {
            return;
        }

        let (id, position) = (tank.id, tank.position);
        self.world.spawn_explosion(position, ExplosionSize::Large);
        pending.sound(Sound::PlayerDeath);

        let Some(player) = players.iter_mut().find(|p| p.id == id) else {
            // Tank without a member; it cannot respawn.
            self.world.tanks.remove(idx);
            return;
        };

        player.lives -= 1;
        pending.push(ServerPacket::PlayerHit {
            player_id: id,
            lives: player.lives,
        });

        if player.is_alive() {
            player.stars = 0;
            self.world.tanks[idx].respawn(now);
        } else {
            debug!("Player {} is out of lives", id);
            self.world.tanks.remove(idx);
        }
    }

    fn update_power_ups(&mut self, players: &mut [Player], now: u64, pending: &mut PendingBroadcasts) {
        let expired: Vec<u32> = self
            .world
            .power_ups
            .iter()
            .filter(|p| p.is_expired(now))
            .map(|p| p.id)
            .collect();
        if !expired.is_empty() {
            self.world.power_ups.retain(|p| !p.is_expired(now));
            pending.push(ServerPacket::PowerUpsExpired {
                power_up_ids: expired,
            });
        }

        for idx in 0..self.world.tanks.len() {
            let (tank_id, pos) = (self.world.tanks[idx].id, self.world.tanks[idx].position);
            let Some(found) = self.world.power_ups.iter().position(|p| {
                let d = p.tile.as_vec2() - pos;
                d.x.abs() < 1.0 && d.y.abs() < 1.0
            }) else {
                continue;
            };

            let power_up = self.world.power_ups.remove(found);
            self.apply_power_up(tank_id, &power_up, players, now, pending);
            pending.push(ServerPacket::PowerUpCollected {
                player_id: tank_id,
                power_up_id: power_up.id,
                power_up_type: power_up.kind,
            });
        }
    }

    fn apply_power_up(
        &mut self,
        tank_id: PlayerId,
        power_up: &PowerUp,
        players: &mut [Player],
        now: u64,
        pending: &mut PendingBroadcasts,
    ) {
        let Some(player) = players.iter_mut().find(|p| p.id == tank_id) else {
            return;
        };
        player.score += POWER_UP_POINTS;

        match power_up.kind {
            PowerUpKind::Helmet => {
                if let Some(tank) = self.world.tank_mut(tank_id) {
                    tank.grant_invincibility(now, HELMET_MS);
                    tank.shielded = true;
                }
            }
            PowerUpKind::Clock => {
                for enemy in &mut self.world.enemy_tanks {
                    enemy.frozen_until = Some(now + FREEZE_MS);
                }
            }
            PowerUpKind::Shovel => {
                // A second shovel only pushes the revert deadline back.
                self.world.map.fortify_base();
                pending.shovel_armed = true;
            }
            PowerUpKind::Star => {
                let stars = player.add_star();
                if let Some(tank) = self.world.tank_mut(tank_id) {
                    tank.set_stars(stars);
                }
                pending.sound(Sound::Improvement);
            }
            PowerUpKind::Grenade => {
                let destroyed: Vec<_> = self.world.enemy_tanks.drain(..).collect();
                for enemy in &destroyed {
                    self.world.spawn_explosion(enemy.position, ExplosionSize::Large);
                }
                let count = destroyed.len() as u32;
                player.score += GRENADE_POINTS * count;
                pending.sound(Sound::Explosion);
                pending.push(ServerPacket::AllEnemiesDestroyed {
                    player_id: tank_id,
                    count,
                });
            }
            PowerUpKind::Tank => {
                player.lives += 1;
                pending.sound(Sound::LifeUp);
                pending.push(ServerPacket::PlayerGotExtraLife {
                    player_id: tank_id,
                    lives: player.lives,
                });
            }
        }

        pending.push(ServerPacket::ScoreUpdate {
            player_id: tank_id,
            score: player.score,
        });
    }

    /// Undo a shovel. Returns false if the base was not fortified.
    pub fn revert_fortification(&mut self) -> bool {
        self.world.map.revert_fortification()
    }

    /// Apply one client input: turn and move, then maybe fire.
    pub fn apply_input(&mut self, player_id: PlayerId, input: &InputState, now: u64) -> PendingBroadcasts {
        let mut pending = PendingBroadcasts::default();
        let Some(idx) = self.world.tanks.iter().position(|t| t.id == player_id) else {
            return pending;
        };

        if let Some(direction) = input.direction {
            let tank = &mut self.world.tanks[idx];
            tank.direction = direction;
            let from = tank.position;
            let to = tank.step_towards(direction);
            if !is_blocked(&self.world, Mover::Player(player_id), from, to, &PLAYER_TOLERANCE) {
                self.world.tanks[idx].position = to;
            }
        }

        if input.shoot {
            let tank = &self.world.tanks[idx];
            let in_flight = self.world.live_bullets(Faction::Player, player_id);
            if tank.cooldown_ready(now) && in_flight < tank.bullet_limit() {
                let bullet = Bullet {
                    id: 0,
                    owner: player_id,
                    faction: Faction::Player,
                    position: tank.muzzle(),
                    direction: tank.direction,
                    speed: tank.bullet_speed(),
                    power: 1,
                    swept_from: tank.position,
                };
                let id = self.world.next_id();
                self.world.bullets.push(Bullet { id, ..bullet });
                self.world.tanks[idx].last_shot = Some(now);
                pending.sound(Sound::Shoot);
            }
        }

        pending
    }

    /// Victory / defeat / level-complete check, run once after every tick.
    pub fn evaluate_outcome(&mut self, players: &[Player]) -> Outcome {
        if self.game_over {
            return Outcome::Continue;
        }
        if self.base_destroyed {
            self.game_over = true;
            return Outcome::GameOver("Base destroyed");
        }
        if !players.is_empty() && players.iter().all(|p| !p.is_alive()) {
            self.game_over = true;
            return Outcome::GameOver("All players eliminated");
        }
        if self.remaining_enemies == 0 && self.world.enemy_tanks.is_empty() && !self.level_completed {
            self.level_completed = true;
            return Outcome::LevelComplete;
        }
        Outcome::Continue
    }

    /// Move to the next level: new map, living tanks back at their spawns.
    pub fn advance_level(&mut self, players: &[Player], now: u64) -> MapView {
        self.level += 1;
        self.level_completed = false;
        self.remaining_enemies = self.rules.enemies_per_level;
        self.world.reset_for_level(Map::generate(self.level));

        self.world.tanks.clear();
        for (slot, player) in players.iter().enumerate() {
            if player.is_alive() {
                self.world
                    .tanks
                    .push(PlayerTank::new(player.id, spawn_point(slot), player.stars, now));
            }
        }

        self.world.map.view()
    }

    pub fn player_stats(players: &[Player]) -> Vec<PlayerStats> {
        players.iter().map(Player::stats).collect()
    }

    /// Full snapshot for `gameStart` / `gameStateUpdate`.
    pub fn snapshot(&self, players: &[Player], now: u64) -> GameSnapshot {
        GameSnapshot {
            tanks: self.world.tank_views(now),
            enemy_tanks: self.world.enemy_views(now),
            bullets: self.world.bullet_views(),
            power_ups: self.world.power_up_views(),
            explosions: self.world.explosion_views(),
            map: self.world.map.view(),
            remaining_enemies: self.remaining_enemies,
            level: self.level,
            base_destroyed: self.base_destroyed,
            game_over: self.game_over,
            level_completed: self.level_completed,
            is_paused: self.is_paused,
            players: players
                .iter()
                .enumerate()
                .map(|(slot, p)| p.view(slot))
                .collect(),
        }
    }
}
