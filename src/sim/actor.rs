//! Cooperative actor clock.
//!
//! Philosophers, producers and consumers are cooperative tasks. Each reports
//! when it next wants to run (`Some(tick)`) or that it is parked on a
//! semaphore (`None`). The clock picks one runnable actor per step, jumping
//! simulated time forward when nobody is runnable yet.

use crate::common::Tick;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// How ties between simultaneously runnable actors are broken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Interleaving {
    /// Cycle through actors in index order.
    RoundRobin,
    /// Pick uniformly at random from a seeded generator.
    Seeded(u64),
}

impl Default for Interleaving {
    fn default() -> Self {
        Interleaving::RoundRobin
    }
}

pub struct ActorClock {
    now: Tick,
    interleaving: Interleaving,
    rng: Option<StdRng>,
    cursor: usize,
}

impl ActorClock {
    pub fn new(interleaving: Interleaving) -> Self {
        let mut clock = Self {
            now: 0,
            interleaving,
            rng: None,
            cursor: 0,
        };
        clock.reset();
        clock
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn interleaving(&self) -> Interleaving {
        self.interleaving
    }

    /// Chooses the next actor to run.
    ///
    /// `ready_at[i]` is the earliest tick actor `i` can run, or `None` while it
    /// is blocked. Returns `None` when every actor is blocked.
    pub fn pick(&mut self, ready_at: &[Option<Tick>]) -> Option<usize> {
        let earliest = ready_at.iter().flatten().min().copied()?;
        if earliest > self.now {
            self.now = earliest;
        }
        let now = self.now;
        let runnable: Vec<usize> = ready_at
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t, Some(t) if *t <= now))
            .map(|(i, _)| i)
            .collect();

        let chosen = match self.rng.as_mut() {
            Some(rng) => runnable[rng.gen_range(0..runnable.len())],
            None => runnable
                .iter()
                .copied()
                .find(|&i| i >= self.cursor)
                .unwrap_or(runnable[0]),
        };
        self.cursor = chosen + 1;
        Some(chosen)
    }

    /// Rewinds time and reseeds the generator.
    pub fn reset(&mut self) {
        self.now = 0;
        self.cursor = 0;
        self.rng = match self.interleaving {
            Interleaving::RoundRobin => None,
            Interleaving::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_rotates_between_ready_actors() {
        let mut clock = ActorClock::new(Interleaving::RoundRobin);
        let ready = [Some(0), Some(0), Some(0)];
        let picks: Vec<usize> = (0..4).filter_map(|_| clock.pick(&ready)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn clock_jumps_to_next_wakeup() {
        let mut clock = ActorClock::new(Interleaving::RoundRobin);
        assert_eq!(clock.pick(&[None, Some(7)]), Some(1));
        assert_eq!(clock.now(), 7);
        assert_eq!(clock.pick(&[None, None]), None);
    }
}
