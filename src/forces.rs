//! Velocity contributions acting on a single jellyfish.
//!
//! Every function here is pure: it reads the agent's position, the turbine or a
//! snapshot of the swarm, and returns an increment to be added to the agent's
//! velocity. Nothing in this module replaces a velocity outright.

use glam::Vec3;

use crate::config::{SwarmConfig, Turbine};
use crate::math::{normalize_or_default, remap_clamped, EPSILON};

const TURBINE_REPULSION_NEAR: f32 = 0.1;
const TURBINE_REPULSION_FAR: f32 = 0.005;
const TURBINE_ATTRACTION_DEAD_ZONE: f32 = 10.0;
const TURBINE_ATTRACTION_REACH: f32 = 6.0;
const TURBINE_ATTRACTION_NEAR: f32 = 0.02 / 5.0;
const TURBINE_ATTRACTION_FAR: f32 = 0.05 / 5.0;

const PERSONAL_SPACE: f32 = 3.0;
const PEER_REPULSION_PEAK: f32 = 0.02 / 5.0;
const PEER_REPULSION_AXIS_WEIGHT: Vec3 = Vec3::new(12.0, 30.0, 12.0);

const PEER_ATTRACTION_RANGE: f32 = 0.8;
const PEER_ATTRACTION_DIVISOR: f32 = 5_000.0;

const SPREADING_RAMP: f32 = 3.0;
const SPREADING_LOW: f32 = 0.01 / 5.0;
const SPREADING_HIGH: f32 = 0.05 / 5.0;
const SPREADING_AXIS_WEIGHT: Vec3 = Vec3::new(0.2, 1.0, 0.2);

/// Result of pushing an agent out of the monopile's exclusion ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleRepulsion {
    pub velocity: Vec3,
    /// Positional shift that puts the agent exactly on the ring.
    pub correction: Vec3,
}

/// Radius around the turbine axis inside which an agent of `size` is repelled.
pub fn turbine_repulsion_threshold(size: f32, turbine: &Turbine) -> f32 {
    turbine.radius + size * PERSONAL_SPACE
}

pub fn turbine_repulsion(
    position: Vec3,
    size: f32,
    turbine: &Turbine,
) -> Option<ObstacleRepulsion> {
    let d = turbine.horizontal_distance(position);
    let threshold = turbine_repulsion_threshold(size, turbine);
    if d >= threshold {
        return None;
    }

    let away = Vec3::new(position.x - turbine.center.x, 0.0, position.z - turbine.center.z);
    let direction = normalize_or_default(away, Vec3::X);
    let force = remap_clamped(d, 0.0, threshold, TURBINE_REPULSION_NEAR, TURBINE_REPULSION_FAR);

    Some(ObstacleRepulsion {
        velocity: direction * force,
        correction: direction * (threshold - d),
    })
}

pub fn turbine_attraction(position: Vec3, size: f32, turbine: &Turbine, strength: f32) -> Vec3 {
    let d = turbine.horizontal_distance(position);
    let min_distance = turbine.radius + size + TURBINE_ATTRACTION_DEAD_ZONE;
    if d <= min_distance {
        return Vec3::ZERO;
    }

    let max_distance = turbine.radius * TURBINE_ATTRACTION_REACH;
    let toward = Vec3::new(turbine.center.x - position.x, 0.0, turbine.center.z - position.z) / d;
    let force = strength
        * remap_clamped(
            d,
            min_distance,
            max_distance,
            TURBINE_ATTRACTION_NEAR,
            TURBINE_ATTRACTION_FAR,
        );
    toward * force
}

/// One agent's view of the swarm: everyone's positions plus which slot is its own.
#[derive(Clone, Copy, Debug)]
pub struct Neighborhood<'a> {
    pub index: usize,
    pub positions: &'a [Vec3],
}

impl<'a> Neighborhood<'a> {
    pub fn new(index: usize, positions: &'a [Vec3]) -> Self {
        Self { index, positions }
    }

    /// Every other agent's position, in collection order.
    pub fn others(&self) -> impl Iterator<Item = Vec3> + 'a {
        let index = self.index;
        self.positions
            .iter()
            .enumerate()
            .filter(move |(j, _)| *j != index)
            .map(|(_, p)| *p)
    }
}

pub fn count_connections(position: Vec3, neighborhood: &Neighborhood<'_>, range: f32) -> u32 {
    neighborhood
        .others()
        .filter(|other| position.distance(*other) < range)
        .count() as u32
}

pub fn peer_repulsion(
    position: Vec3,
    size: f32,
    neighborhood: &Neighborhood<'_>,
    strength: f32,
) -> Vec3 {
    let range = size * PERSONAL_SPACE;
    let mut delta = Vec3::ZERO;

    for other in neighborhood.others() {
        let offset = position - other;
        let d = offset.length();
        if d <= EPSILON || d >= range {
            continue;
        }

        let force = strength * remap_clamped(d, 0.0, range, PEER_REPULSION_PEAK, 0.0);
        delta += (offset / d) * force * PEER_REPULSION_AXIS_WEIGHT;
    }

    delta
}

/// Pulls an isolated agent toward peers it can see.
///
/// The scan runs in collection order. Once any peer has been found within the
/// attraction range, no later peer attracts; before that, every peer outside
/// personal space pulls with the same constant strength.
pub fn peer_attraction(
    position: Vec3,
    size: f32,
    neighborhood: &Neighborhood<'_>,
    connection_range: f32,
    strength: f32,
) -> Vec3 {
    let attraction_range = connection_range * PEER_ATTRACTION_RANGE;
    let personal_space = size * PERSONAL_SPACE;
    let pull = strength / PEER_ATTRACTION_DIVISOR;
    let mut neighbors_in_range = 0u32;
    let mut delta = Vec3::ZERO;

    for other in neighborhood.others() {
        let offset = other - position;
        let d = offset.length();
        if d < attraction_range {
            neighbors_in_range += 1;
        }
        if neighbors_in_range < 1 && d >= personal_space && d > EPSILON {
            delta += (offset / d) * pull;
        }
    }

    delta
}

/// Extra repulsion from every connected peer once `connections` exceeds the limit.
pub fn spreading(
    position: Vec3,
    neighborhood: &Neighborhood<'_>,
    connections: u32,
    config: &SwarmConfig,
) -> Vec3 {
    if connections <= config.max_connections {
        return Vec3::ZERO;
    }

    let max = config.max_connections as f32;
    let force = config.spreading_force
        * remap_clamped(
            connections as f32,
            max,
            max + SPREADING_RAMP,
            SPREADING_LOW,
            SPREADING_HIGH,
        );
    let mut delta = Vec3::ZERO;

    for other in neighborhood.others() {
        let offset = position - other;
        let d = offset.length();
        if d <= EPSILON || d >= config.connection_range {
            continue;
        }
        delta += (offset / d) * force * SPREADING_AXIS_WEIGHT;
    }

    delta
}
