use glam::Vec3;
use rand::Rng;

use crate::config::{SwarmConfig, Turbine, World, JELLYFISH_DIAMETER};
use crate::error::SwarmError;
use crate::forces::Neighborhood;
use crate::jellyfish::Jellyfish;
use crate::math::EPSILON;

pub const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;
/// Spawn points closer than this many pile radii to the axis are resampled.
pub const SPAWN_CLEARANCE: f32 = 1.5;

/// Per-frame readout of the swarm.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwarmStats {
    pub agents: usize,
    pub connections: usize,
    pub mean_connections: f32,
    /// Agents whose connection count exceeds `max_connections`.
    pub over_connected: usize,
    pub mean_speed: f32,
}

/// Owns one generation of jellyfish. Reinitializing builds a new `Swarm`; the
/// old one is simply dropped.
#[derive(Clone, Debug)]
pub struct Swarm {
    agents: Vec<Jellyfish>,
    world: World,
    turbine: Turbine,
    connection_range: f32,
    max_connections: u32,
    positions: Vec<Vec3>,
}

impl Swarm {
    pub fn initialize<R: Rng + ?Sized>(
        count: usize,
        world: World,
        turbine: Turbine,
        rng: &mut R,
    ) -> Result<Self, SwarmError> {
        let mut agents = Vec::with_capacity(count);
        for index in 0..count {
            let position = sample_spawn_point(index, &world, &turbine, rng)?;
            agents.push(Jellyfish::spawn(position, rng));
        }

        tracing::debug!(count, "swarm initialized");
        Ok(Self::from_agents(agents, world, turbine))
    }

    /// Wraps explicitly placed agents.
    pub fn from_agents(agents: Vec<Jellyfish>, world: World, turbine: Turbine) -> Self {
        let positions = agents.iter().map(Jellyfish::position).collect();
        Self {
            agents,
            world,
            turbine,
            connection_range: SwarmConfig::default().connection_range,
            max_connections: SwarmConfig::default().max_connections,
            positions,
        }
    }

    pub fn agents(&self) -> &[Jellyfish] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn turbine(&self) -> &Turbine {
        &self.turbine
    }

    /// Resizes the horizontal containment box without touching the agents.
    pub fn set_world(&mut self, world: World) {
        self.world = world;
    }

    /// Advances every agent by one frame.
    ///
    /// Agents see each other's positions as they were when the step began, so
    /// the result does not depend on update order.
    pub fn step(&mut self, config: &SwarmConfig) {
        let config = &config.sanitized();
        self.connection_range = config.connection_range;
        self.max_connections = config.max_connections;
        self.positions.clear();
        self.positions.extend(self.agents.iter().map(Jellyfish::position));

        for (index, agent) in self.agents.iter_mut().enumerate() {
            let neighborhood = Neighborhood::new(index, &self.positions);
            agent.step(&neighborhood, &self.turbine, &self.world, config);
        }
    }

    /// Pairs `(i, j)`, `i < j`, of agents connected in the current frame, using
    /// the connection range of the most recent step.
    pub fn connectivity_graph(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.agents.iter().enumerate() {
            for (j, b) in self.agents.iter().enumerate().skip(i + 1) {
                if self.connected(a.position(), b.position()) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        match (self.agents.get(i), self.agents.get(j)) {
            (Some(a), Some(b)) if i != j => self.connected(a.position(), b.position()),
            _ => false,
        }
    }

    fn connected(&self, a: Vec3, b: Vec3) -> bool {
        a.distance(b) < self.connection_range && !self.turbine.blocks_segment(a, b)
    }

    /// Readout of the current frame against the limits of the most recent step.
    pub fn stats(&self) -> SwarmStats {
        if self.agents.is_empty() {
            return SwarmStats::default();
        }

        let n = self.agents.len() as f32;
        let total_connections: u32 = self.agents.iter().map(Jellyfish::active_connections).sum();
        let total_speed: f32 = self.agents.iter().map(|a| a.velocity().length()).sum();

        SwarmStats {
            agents: self.agents.len(),
            connections: self.connectivity_graph().len(),
            mean_connections: total_connections as f32 / n,
            over_connected: self
                .agents
                .iter()
                .filter(|a| a.active_connections() > self.max_connections)
                .count(),
            mean_speed: total_speed / n,
        }
    }
}

fn sample_spawn_point<R: Rng + ?Sized>(
    index: usize,
    world: &World,
    turbine: &Turbine,
    rng: &mut R,
) -> Result<Vec3, SwarmError> {
    let extent = world.spawn_half_extent;
    let y_lo = world.top + JELLYFISH_DIAMETER;
    let y_hi = world.floor();
    let clearance = turbine.radius * SPAWN_CLEARANCE;

    if extent <= EPSILON || y_hi <= y_lo {
        tracing::warn!(index, extent, y_lo, y_hi, "spawn volume is empty");
        return Err(SwarmError::PlacementExhausted { index, attempts: 0 });
    }

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = Vec3::new(
            rng.random_range(-extent..extent),
            rng.random_range(y_lo..y_hi),
            rng.random_range(-extent..extent),
        );
        if turbine.horizontal_distance(candidate) >= clearance {
            return Ok(candidate);
        }
    }

    tracing::warn!(
        index,
        attempts = MAX_PLACEMENT_ATTEMPTS,
        "giving up on jellyfish placement"
    );
    Err(SwarmError::PlacementExhausted {
        index,
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}
