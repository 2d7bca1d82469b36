//! Resource-allocation graph.
//!
//! Actors point at the single resource they wait for; resources point at the
//! single actor holding them. With one outgoing edge per node a cycle is found
//! by walking from each waiting actor.

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct ResourceGraph {
    waits: BTreeMap<usize, usize>,
    holds: BTreeMap<usize, usize>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// `actor` waits for `resource`.
    pub fn add_wait(&mut self, actor: usize, resource: usize) {
        self.waits.insert(actor, resource);
    }

    /// `resource` is held by `actor`.
    pub fn add_hold(&mut self, resource: usize, actor: usize) {
        self.holds.insert(resource, actor);
    }

    /// Returns the actors of a wait cycle, sorted, if one exists.
    pub fn find_cycle(&self) -> Option<Vec<usize>> {
        for &start in self.waits.keys() {
            let mut path = vec![start];
            let mut actor = start;
            while let Some(holder) = self.waits.get(&actor).and_then(|r| self.holds.get(r)) {
                if let Some(pos) = path.iter().position(|&a| a == *holder) {
                    let mut cycle = path.split_off(pos);
                    cycle.sort_unstable();
                    return Some(cycle);
                }
                path.push(*holder);
                actor = *holder;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_two_party_cycle_only() {
        let mut g = ResourceGraph::new();
        g.add_hold(0, 0);
        g.add_wait(0, 1);
        g.add_hold(1, 1);
        assert_eq!(g.find_cycle(), None);
        g.add_wait(1, 0);
        assert_eq!(g.find_cycle(), Some(vec![0, 1]));
    }
}
