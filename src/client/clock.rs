//! Client-side simulation clock. Between server snapshots the renderer
//! needs a continuously advancing tick; this reconciles local wall-clock
//! extrapolation with the authoritative tick carried by the latest
//! snapshot, without visible jumps.

use std::time::Instant;

use crate::models::game::Game;

/// Wall-clock milliseconds per simulation tick.
const MS_PER_TICK: f64 = 100.0;
/// Past this many ticks of disagreement the clock snaps instead of gliding.
const SNAP_THRESHOLD_TICKS: f64 = 10.0;
/// Error divisor for the exponential speed controller: ten ticks of error
/// changes playback speed by a factor of e.
const SPEED_DAMPING_TICKS: f64 = 10.0;

/// Smoothly reconciled game clock.
///
/// Two signals disagree about the current tick: the last snapshot (server
/// tick plus the server's own in-tick elapsed time plus the time since the
/// snapshot arrived) and the locally extrapolated value from the previous
/// call. Trusting the snapshot alone jitters with the network; trusting the
/// local value alone drifts. The clock runs the local value at a speed of
/// `exp(error / 10)`, which chases the server estimate asymptotically and
/// slows its correction as the error shrinks, and gives up on smoothing
/// entirely when the two disagree by more than ten ticks (tab suspension,
/// connection stall), snapping once instead.
pub struct GameClock {
    last_tick: f64,
    last_time: Option<Instant>,
    stopped: bool,
}

impl GameClock {
    pub fn new() -> GameClock {
        GameClock {
            last_tick: 0.0,
            last_time: None,
            stopped: false,
        }
    }

    /// Stop producing ticks; every later call returns the last value.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Current simulation tick, fractional for sub-tick rendering.
    /// `received_at` is the local arrival time of the game snapshot.
    pub fn current_tick(&mut self, game: &Game, received_at: Instant) -> f64 {
        self.current_tick_at(game, received_at, Instant::now())
    }

    pub(crate) fn current_tick_at(
        &mut self,
        game: &Game,
        received_at: Instant,
        now: Instant,
    ) -> f64 {
        // a finished game's clock is frozen at the final server tick
        if game.finished != 0 {
            return game.current_tick as f64;
        }
        if self.stopped {
            return self.last_tick;
        }

        // the tick according to the snapshot, extrapolated to this instant
        let since_receipt = ms_between(received_at, now);
        let new_tick =
            game.current_tick as f64 + (since_receipt + 1000.0 * game.time_since_last_tick) / MS_PER_TICK;

        // first call: nothing local to reconcile against
        let last_time = match self.last_time {
            Some(last_time) => last_time,
            None => {
                self.last_tick = new_tick;
                self.last_time = Some(now);
                return new_tick;
            }
        };

        // the tick according to the previous call plus elapsed wall time
        let elapsed_ticks = ms_between(last_time, now) / MS_PER_TICK;
        let expected_tick = self.last_tick + elapsed_ticks;

        // they differ by too much, jump to the server estimate
        if (new_tick - expected_tick).abs() > SNAP_THRESHOLD_TICKS {
            self.last_tick = new_tick;
            self.last_time = Some(now);
            return new_tick;
        }

        // run local time faster when behind the server, slower when ahead
        let speed = ((new_tick - expected_tick) / SPEED_DAMPING_TICKS).exp();
        let current_tick = self.last_tick + speed * elapsed_ticks;

        self.last_tick = current_tick;
        self.last_time = Some(now);
        current_tick
    }
}

impl Default for GameClock {
    fn default() -> GameClock {
        GameClock::new()
    }
}

fn ms_between(earlier: Instant, later: Instant) -> f64 {
    later.saturating_duration_since(earlier).as_secs_f64() * 1000.0
}

/// Render a tick count as game time, M:SS.
pub fn format_game_time(ticks: f64) -> String {
    let ticks = ticks.max(0.0);
    let minutes = (ticks / 600.0).floor() as u64;
    let seconds = ((ticks % 600.0) / 10.0).floor() as u64;
    format!("{}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::models::game::Speed;

    fn game_at_tick(tick: u64) -> Game {
        let players: HashMap<u8, String> = [(1, "o".to_string()), (2, "o".to_string())].into();
        let mut game = Game::new(Speed::Standard, players);
        game.started = true;
        game.current_tick = tick;
        game.time_since_last_tick = 0.0;
        game
    }

    #[test]
    fn first_call_trusts_the_snapshot() {
        let t0 = Instant::now();
        let mut clock = GameClock::new();
        let game = game_at_tick(1000);
        let tick = clock.current_tick_at(&game, t0, t0);
        assert!((tick - 1000.0).abs() < 1e-9);

        // the snapshot's own in-tick elapsed time counts too
        let mut clock = GameClock::new();
        let mut game = game_at_tick(1000);
        game.time_since_last_tick = 0.5;
        let tick = clock.current_tick_at(&game, t0, t0);
        assert!((tick - 1005.0).abs() < 1e-9);
    }

    #[test]
    fn converges_monotonically_toward_server_estimate() {
        let t0 = Instant::now();
        let mut clock = GameClock::new();
        clock.current_tick_at(&game_at_tick(1000), t0, t0);

        // server says we are three ticks behind
        let game = game_at_tick(1003);
        let mut prev_tick = 1000.0;
        let mut prev_error = f64::INFINITY;
        for frame in 1..=100u64 {
            let now = t0 + Duration::from_millis(100 * frame);
            let tick = clock.current_tick_at(&game, t0, now);
            let target = 1003.0 + frame as f64;
            let error = (target - tick).abs();

            assert!(tick > prev_tick, "clock went backwards");
            assert!(error <= prev_error, "error grew between frames");

            prev_tick = tick;
            prev_error = error;
        }
        assert!(prev_error < 0.1);
    }

    #[test]
    fn large_discrepancy_snaps_instead_of_gliding() {
        let t0 = Instant::now();
        let mut clock = GameClock::new();
        clock.current_tick_at(&game_at_tick(1000), t0, t0);

        // a stalled tab wakes up to a server far ahead
        let game = game_at_tick(1100);
        let now = t0 + Duration::from_millis(100);
        let tick = clock.current_tick_at(&game, t0, now);
        assert!((tick - 1101.0).abs() < 1e-9);
    }

    #[test]
    fn finished_game_freezes_the_clock() {
        let t0 = Instant::now();
        let mut clock = GameClock::new();
        let mut game = game_at_tick(1234);
        game.finished = 1;

        for frame in 0..5u64 {
            let now = t0 + Duration::from_secs(frame);
            let tick = clock.current_tick_at(&game, t0, now);
            assert!((tick - 1234.0).abs() < 1e-9);
        }
    }

    #[test]
    fn stopped_clock_repeats_its_last_value() {
        let t0 = Instant::now();
        let mut clock = GameClock::new();
        let game = game_at_tick(50);
        let tick = clock.current_tick_at(&game, t0, t0);
        clock.stop();

        let later = t0 + Duration::from_secs(30);
        assert_eq!(clock.current_tick_at(&game, t0, later), tick);
    }

    #[test]
    fn game_time_formatting() {
        assert_eq!(format_game_time(0.0), "0:00");
        assert_eq!(format_game_time(599.0), "0:59");
        assert_eq!(format_game_time(600.0), "1:00");
        assert_eq!(format_game_time(1234.0), "2:03");
    }
}
