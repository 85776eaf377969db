//! Per-room timers and the tasks behind them.
//!
//! Every timer is a spawned tokio task whose [`AbortHandle`] is owned by the
//! room. Tasks only touch the room under its lock, and each task releases its
//! own handle before it finishes, so a cancelled room holds no live handles.

use super::room::{Room, SharedRoom};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, warn};

/// An owned, cancellable timer slot.
#[derive(Debug, Default)]
pub struct TimerHandle(Option<AbortHandle>);

impl TimerHandle {
    /// Install a new timer, cancelling whatever was there.
    pub fn set(&mut self, handle: AbortHandle) {
        self.cancel();
        self.0 = Some(handle);
    }

    /// Abort the timer. Cancelling an empty slot is a no-op.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }

    /// Forget the handle without aborting; used by a task that is finishing
    /// on its own.
    pub fn release(&mut self) {
        self.0 = None;
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Every timer a room can own.
#[derive(Debug, Default)]
pub struct RoomTimers {
    pub tick: TimerHandle,
    pub enemy_spawn: TimerHandle,
    pub power_up_spawn: TimerHandle,
    pub level_advance: TimerHandle,
    pub shovel_revert: TimerHandle,
}

impl RoomTimers {
    pub fn cancel_all(&mut self) {
        self.tick.cancel();
        self.enemy_spawn.cancel();
        self.power_up_spawn.cancel();
        self.level_advance.cancel();
        self.shovel_revert.cancel();
    }

    pub fn any_armed(&self) -> bool {
        self.tick.is_armed()
            || self.enemy_spawn.is_armed()
            || self.power_up_spawn.is_armed()
            || self.level_advance.is_armed()
            || self.shovel_revert.is_armed()
    }
}

/// Start all timers of a room that just entered `playing`.
pub fn start(shared: &SharedRoom, room: &mut Room) {
    let task = tokio::spawn(tick_loop(shared.clone(), room.tick_interval));
    room.timers.tick.set(task.abort_handle());
    start_enemy_spawner(shared, room, Duration::ZERO);
    let task = tokio::spawn(power_up_loop(shared.clone()));
    room.timers.power_up_spawn.set(task.abort_handle());
}

fn start_enemy_spawner(shared: &SharedRoom, room: &mut Room, first_delay: Duration) {
    let task = tokio::spawn(enemy_spawn_loop(shared.clone(), first_delay));
    room.timers.enemy_spawn.set(task.abort_handle());
}

fn schedule_level_advance(shared: &SharedRoom, room: &mut Room) {
    let delay = Duration::from_millis(room.game.rules.level_transition_ms);
    let task = tokio::spawn(level_advance(shared.clone(), delay));
    room.timers.level_advance.set(task.abort_handle());
}

/// Arming again while armed pushes the deadline back.
fn schedule_shovel_revert(shared: &SharedRoom, room: &mut Room) {
    let task = tokio::spawn(shovel_revert(shared.clone(), SHOVEL_DURATION));
    room.timers.shovel_revert.set(task.abort_handle());
}

/// How long a shovel keeps the base fortified.
pub const SHOVEL_DURATION: Duration = Duration::from_secs(20);

async fn tick_loop(shared: SharedRoom, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let mut room = shared.lock().await;
        let tick_start = std::time::Instant::now();
        let flow = room.run_tick();

        if !flow.running {
            debug!("Tick loop for room {} stopping", room.id);
            room.timers.tick.release();
            break;
        }
        if flow.level_complete {
            schedule_level_advance(&shared, &mut room);
        }
        if flow.shovel_armed {
            schedule_shovel_revert(&shared, &mut room);
        }

        let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
        let tick_budget = period.as_secs_f64() * 1000.0 * 0.9;
        if tick_ms > tick_budget {
            warn!(
                "Slow tick #{} in room {}: {:.3}ms (budget: {:.1}ms)",
                room.game.tick_count, room.id, tick_ms, tick_budget
            );
        }
    }
}

async fn enemy_spawn_loop(shared: SharedRoom, first_delay: Duration) {
    let mut delay = first_delay;
    loop {
        sleep(delay).await;
        let mut room = shared.lock().await;
        match room.spawn_enemy() {
            Some(next) => delay = next,
            None => {
                room.timers.enemy_spawn.release();
                break;
            }
        }
    }
}

async fn power_up_loop(shared: SharedRoom) {
    let mut delay = Duration::ZERO;
    loop {
        sleep(delay).await;
        let mut room = shared.lock().await;
        match room.spawn_power_up() {
            Some(next) => delay = next,
            None => {
                room.timers.power_up_spawn.release();
                break;
            }
        }
    }
}

async fn level_advance(shared: SharedRoom, delay: Duration) {
    sleep(delay).await;
    let mut room = shared.lock().await;
    room.timers.level_advance.release();
    if room.advance_level() {
        start_enemy_spawner(&shared, &mut room, Duration::ZERO);
    }
}

async fn shovel_revert(shared: SharedRoom, delay: Duration) {
    sleep(delay).await;
    let mut room = shared.lock().await;
    room.timers.shovel_revert.release();
    room.revert_base_walls();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::server::room::RoomStatus;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use tank_protocol::packets::ServerPacket;
    use tokio::sync::{Mutex, broadcast};

    fn shared_room() -> SharedRoom {
        Arc::new(Mutex::new(Room::with_rng(
            "SCHED1".to_string(),
            GameConfig::default(),
            Duration::from_millis(50),
            StdRng::seed_from_u64(7),
        )))
    }

    fn drain(rx: &mut broadcast::Receiver<Arc<ServerPacket>>) -> Vec<ServerPacket> {
        let mut out = Vec::new();
        while let Ok(packet) = rx.try_recv() {
            out.push((*packet).clone());
        }
        out
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let task = tokio::spawn(std::future::pending::<()>());
        let mut timer = TimerHandle::default();
        timer.set(task.abort_handle());
        assert!(timer.is_armed());
        timer.cancel();
        assert!(!timer.is_armed());
        timer.cancel();
        assert!(!timer.is_armed());
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_previous_timer() {
        let first = tokio::spawn(std::future::pending::<()>());
        let second = tokio::spawn(std::future::pending::<()>());
        let mut timer = TimerHandle::default();
        timer.set(first.abort_handle());
        timer.set(second.abort_handle());
        assert!(first.await.unwrap_err().is_cancelled());
        assert!(timer.is_armed());
        timer.cancel();
        assert!(second.await.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_broadcast_state_and_skip_while_paused() {
        let shared = shared_room();
        let mut rx = {
            let mut room = shared.lock().await;
            let rx = room.subscribe();
            room.add_player(1).unwrap();
            assert!(room.mark_ready(1));
            start(&shared, &mut room);
            rx
        };
        drain(&mut rx);

        sleep(Duration::from_millis(510)).await;
        let updates = drain(&mut rx)
            .into_iter()
            .filter(ServerPacket::is_state_update)
            .count();
        assert_eq!(updates, 10);

        shared.lock().await.toggle_pause(1);
        drain(&mut rx);
        sleep(Duration::from_millis(500)).await;
        let events = drain(&mut rx);
        assert!(!events.iter().any(ServerPacket::is_state_update));
        assert!(!events.iter().any(|e| matches!(e, ServerPacket::EnemySpawned { .. })));
        assert!(shared.lock().await.timers.tick.is_armed());

        shared.lock().await.timers.cancel_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_enemies_never_exceed_cap() {
        let shared = shared_room();
        {
            let mut room = shared.lock().await;
            room.add_player(1).unwrap();
            room.mark_ready(1);
            start(&shared, &mut room);
        }
        for _ in 0..60 {
            sleep(Duration::from_secs(1)).await;
            let room = shared.lock().await;
            assert!(room.game.world.enemy_tanks.len() <= 4);
            assert_eq!(room.game.remaining_enemies + room.game.spawned_this_level(), 20);
            assert!(room.game.world.power_ups.len() <= 1);
        }
        shared.lock().await.timers.cancel_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_level_transition_timing() {
        let shared = shared_room();
        let mut rx = {
            let mut room = shared.lock().await;
            let rx = room.subscribe();
            room.add_player(1).unwrap();
            room.game.remaining_enemies = 0;
            room.mark_ready(1);
            start(&shared, &mut room);
            rx
        };

        // First tick at 50ms completes the level.
        sleep(Duration::from_millis(60)).await;
        let completes = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, ServerPacket::LevelComplete { .. }))
            .count();
        assert_eq!(completes, 1);
        assert!(shared.lock().await.timers.level_advance.is_armed());

        sleep(Duration::from_millis(4_900)).await;
        let events = drain(&mut rx);
        assert!(!events.iter().any(|e| matches!(e, ServerPacket::LevelChanged { .. })));
        assert!(!events.iter().any(|e| matches!(e, ServerPacket::LevelComplete { .. })));

        sleep(Duration::from_millis(200)).await;
        let changed: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                ServerPacket::LevelChanged { level, .. } => Some(level),
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec![2]);

        let room = shared.lock().await;
        assert_eq!(room.game.level, 2);
        assert!(!room.timers.level_advance.is_armed());
        assert!(room.timers.enemy_spawn.is_armed());
        drop(room);
        shared.lock().await.timers.cancel_all();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shovel_reverts_after_deadline() {
        let shared = shared_room();
        let mut rx = {
            let mut room = shared.lock().await;
            let rx = room.subscribe();
            room.add_player(1).unwrap();
            room.mark_ready(1);
            room.game.world.map.fortify_base();
            schedule_shovel_revert(&shared, &mut room);
            rx
        };

        sleep(Duration::from_secs(10)).await;
        {
            // A second shovel pushes the deadline to t = 30s.
            let mut room = shared.lock().await;
            schedule_shovel_revert(&shared, &mut room);
        }
        sleep(Duration::from_secs(15)).await;
        assert!(shared.lock().await.game.world.map.is_fortified());
        assert!(!drain(&mut rx).contains(&ServerPacket::BaseWallsReverted));

        sleep(Duration::from_secs(6)).await;
        assert!(!shared.lock().await.game.world.map.is_fortified());
        assert!(drain(&mut rx).contains(&ServerPacket::BaseWallsReverted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_task_keeps_room_alive_after_teardown() {
        let shared = shared_room();
        {
            let mut room = shared.lock().await;
            room.add_player(1).unwrap();
            room.mark_ready(1);
            start(&shared, &mut room);
            room.game.world.map.fortify_base();
            schedule_shovel_revert(&shared, &mut room);
        }
        sleep(Duration::from_secs(3)).await;
        assert!(Arc::strong_count(&shared) > 1);

        {
            let mut room = shared.lock().await;
            assert!(room.remove_member(1));
            assert!(!room.timers.any_armed());
        }
        settle().await;
        sleep(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mid_game_departure_releases_room() {
        let shared = shared_room();
        {
            let mut room = shared.lock().await;
            room.add_player(1).unwrap();
            room.add_player(2).unwrap();
            assert!(!room.mark_ready(1));
            assert!(room.mark_ready(2));
            start(&shared, &mut room);
            room.game.world.map.fortify_base();
            schedule_shovel_revert(&shared, &mut room);
        }
        sleep(Duration::from_secs(3)).await;
        assert!(Arc::strong_count(&shared) > 1);

        {
            let mut room = shared.lock().await;
            assert!(!room.remove_member(2));
            assert_eq!(room.status, RoomStatus::Ended);
            assert!(!room.timers.any_armed());
        }
        settle().await;
        sleep(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_over_releases_room() {
        let shared = shared_room();
        {
            let mut room = shared.lock().await;
            room.add_player(1).unwrap();
            room.mark_ready(1);
            start(&shared, &mut room);
            room.game.world.map.fortify_base();
            schedule_shovel_revert(&shared, &mut room);
        }
        sleep(Duration::from_secs(3)).await;
        shared.lock().await.game.base_destroyed = true;

        sleep(Duration::from_millis(100)).await;
        {
            let room = shared.lock().await;
            assert_eq!(room.status, RoomStatus::GameOver);
            assert!(!room.timers.any_armed());
        }
        settle().await;
        sleep(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
