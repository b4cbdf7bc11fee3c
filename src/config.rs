use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::math::{self, EPSILON};

/// World units per metre.
pub const SCALE_FACTOR: f32 = 30.0;
pub const WATER_DEPTH: f32 = 30.0 * SCALE_FACTOR;
pub const MONOPILE_RADIUS: f32 = 9.0 * SCALE_FACTOR / 2.0;
pub const JELLYFISH_DIAMETER: f32 = 0.36 * SCALE_FACTOR;
pub const TURBINE_HEIGHT: f32 = WATER_DEPTH * 4.0;
pub const WORLD_TOP: f32 = -WATER_DEPTH / 2.0;
pub const WORLD_BOTTOM: f32 = WATER_DEPTH / 2.0;
pub const SEABED_MARGIN: f32 = 100.0;
pub const DEFAULT_VIEW_WIDTH: f32 = 1920.0;

pub const MIN_AGENT_COUNT: usize = 0;
pub const MAX_AGENT_COUNT: usize = 2_000;
pub const MIN_CONNECTION_RANGE: f32 = 1.0;
pub const MAX_CONNECTION_RANGE: f32 = 2_000.0;
pub const MIN_MAX_SPEED: f32 = 0.01;
pub const MAX_MAX_SPEED: f32 = 10.0;
pub const MIN_MAX_CONNECTIONS: u32 = 1;
pub const MAX_MAX_CONNECTIONS: u32 = 64;
pub const MAX_STRENGTH: f32 = 10.0;

const DEFAULT_AGENT_COUNT: usize = 60;
const DEFAULT_CONNECTION_RANGE: f32 = 6.0 * SCALE_FACTOR;
const DEFAULT_MAX_SPEED: f32 = 1.5;
const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_STRENGTH: f32 = 5.0;

/// Tunable swarm parameters, read once per step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Only consulted when the swarm is (re)initialized.
    pub agent_count: usize,
    pub connection_range: f32,
    pub max_speed: f32,
    pub max_connections: u32,
    pub turbine_attraction: f32,
    pub spreading_force: f32,
    pub attraction_strength: f32,
    pub repulsion_strength: f32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            agent_count: DEFAULT_AGENT_COUNT,
            connection_range: DEFAULT_CONNECTION_RANGE,
            max_speed: DEFAULT_MAX_SPEED,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            turbine_attraction: DEFAULT_STRENGTH,
            spreading_force: DEFAULT_STRENGTH,
            attraction_strength: DEFAULT_STRENGTH,
            repulsion_strength: DEFAULT_STRENGTH,
        }
    }
}

impl SwarmConfig {
    pub fn sanitize(&mut self) {
        let before = *self;

        self.agent_count = self.agent_count.clamp(MIN_AGENT_COUNT, MAX_AGENT_COUNT);
        self.connection_range = clamp_finite(
            self.connection_range,
            MIN_CONNECTION_RANGE,
            MAX_CONNECTION_RANGE,
            DEFAULT_CONNECTION_RANGE,
        );
        self.max_speed = clamp_finite(
            self.max_speed,
            MIN_MAX_SPEED,
            MAX_MAX_SPEED,
            DEFAULT_MAX_SPEED,
        );
        self.max_connections = self
            .max_connections
            .clamp(MIN_MAX_CONNECTIONS, MAX_MAX_CONNECTIONS);
        self.turbine_attraction =
            clamp_finite(self.turbine_attraction, 0.0, MAX_STRENGTH, DEFAULT_STRENGTH);
        self.spreading_force =
            clamp_finite(self.spreading_force, 0.0, MAX_STRENGTH, DEFAULT_STRENGTH);
        self.attraction_strength =
            clamp_finite(self.attraction_strength, 0.0, MAX_STRENGTH, DEFAULT_STRENGTH);
        self.repulsion_strength =
            clamp_finite(self.repulsion_strength, 0.0, MAX_STRENGTH, DEFAULT_STRENGTH);

        if *self != before {
            tracing::debug!(requested = ?before, applied = ?self, "swarm config clamped");
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    /// Applies a (possibly partial) JSON document on top of the current values.
    pub fn merge_json(&self, json: &str) -> Result<Self, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        let patch: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(base), serde_json::Value::Object(fields)) = (value.as_object_mut(), patch) {
            for (key, field) in fields {
                base.insert(key, field);
            }
        }
        let merged: Self = serde_json::from_value(value)?;
        Ok(merged.sanitized())
    }
}

/// The swimming volume agents are contained in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct World {
    /// Water surface; smallest allowed `y`.
    pub top: f32,
    /// Seabed; agents stay `seabed_margin` above it.
    pub bottom: f32,
    pub seabed_margin: f32,
    /// Horizontal velocity reflects once `|x|` or `|z|` exceeds this.
    pub half_extent: f32,
    /// Initial placement samples `x` and `z` from `[-spawn_half_extent, spawn_half_extent]`.
    pub spawn_half_extent: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::for_view_width(DEFAULT_VIEW_WIDTH)
    }
}

impl World {
    pub fn for_view_width(width: f32) -> Self {
        let width = clamp_finite(width, 1.0, f32::MAX, DEFAULT_VIEW_WIDTH);
        Self {
            top: WORLD_TOP,
            bottom: WORLD_BOTTOM,
            seabed_margin: SEABED_MARGIN,
            half_extent: width,
            spawn_half_extent: width / 4.0,
        }
    }

    /// Lowest point an agent may occupy (largest `y`).
    pub fn floor(&self) -> f32 {
        self.bottom - self.seabed_margin
    }
}

/// The monopile: a vertical cylinder centred at `center`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Turbine {
    pub center: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl Default for Turbine {
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, WORLD_TOP, 0.0),
            radius: MONOPILE_RADIUS,
            height: TURBINE_HEIGHT,
        }
    }
}

impl Turbine {
    pub fn horizontal_distance(&self, point: Vec3) -> f32 {
        math::horizontal_distance(point, self.center)
    }

    /// Whether the segment `a`–`b` passes through the cylinder.
    ///
    /// Exact only while the segment stays within the cylinder's height: once the
    /// y-spans overlap, the whole segment is tested against the radius.
    pub fn blocks_segment(&self, a: Vec3, b: Vec3) -> bool {
        let half_height = self.height * 0.5;
        let (lo, hi) = (self.center.y - half_height, self.center.y + half_height);
        if a.y.max(b.y) < lo || a.y.min(b.y) > hi {
            return false;
        }

        let ax = a.x - self.center.x;
        let az = a.z - self.center.z;
        let dx = b.x - a.x;
        let dz = b.z - a.z;
        let len_sq = dx * dx + dz * dz;
        let t = if len_sq <= EPSILON {
            0.0
        } else {
            (-(ax * dx + az * dz) / len_sq).clamp(0.0, 1.0)
        };
        let cx = ax + dx * t;
        let cz = az + dz * t;
        cx * cx + cz * cz < self.radius * self.radius
    }
}

pub fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_world_scale() {
        let config = SwarmConfig::default();
        assert_eq!(config.connection_range, 180.0);
        assert_eq!(config.sanitized(), config);

        assert_eq!(MONOPILE_RADIUS, 135.0);
        assert_eq!(WORLD_TOP, -450.0);
        assert_eq!(World::default().floor(), 350.0);
    }

    #[test]
    fn sanitize_clamps_and_replaces_non_finite() {
        let mut config = SwarmConfig {
            agent_count: 1_000_000,
            connection_range: -20.0,
            max_speed: f32::NAN,
            max_connections: 0,
            turbine_attraction: f32::INFINITY,
            spreading_force: -1.0,
            attraction_strength: 42.0,
            repulsion_strength: 0.5,
        };
        config.sanitize();

        assert_eq!(config.agent_count, MAX_AGENT_COUNT);
        assert_eq!(config.connection_range, MIN_CONNECTION_RANGE);
        assert_eq!(config.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(config.max_connections, MIN_MAX_CONNECTIONS);
        assert_eq!(config.turbine_attraction, DEFAULT_STRENGTH);
        assert_eq!(config.spreading_force, 0.0);
        assert_eq!(config.attraction_strength, MAX_STRENGTH);
        assert_eq!(config.repulsion_strength, 0.5);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = SwarmConfig::default()
            .merge_json(r#"{ "max_speed": 3.0, "connection_range": 99999 }"#)
            .unwrap();

        assert_eq!(config.max_speed, 3.0);
        assert_eq!(config.connection_range, MAX_CONNECTION_RANGE);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(SwarmConfig::default().merge_json("{ max_speed").is_err());
        assert!(SwarmConfig::default()
            .merge_json(r#"{ "max_connections": "many" }"#)
            .is_err());
    }

    #[test]
    fn segment_through_the_pile_is_blocked() {
        let turbine = Turbine::default();

        assert!(turbine.blocks_segment(Vec3::new(-300.0, 0.0, 0.0), Vec3::new(300.0, 0.0, 0.0)));
        assert!(turbine.blocks_segment(Vec3::new(300.0, 0.0, 0.0), Vec3::new(-300.0, 0.0, 0.0)));
        assert!(!turbine.blocks_segment(
            Vec3::new(-300.0, 0.0, 200.0),
            Vec3::new(300.0, 0.0, 200.0)
        ));
        assert!(!turbine.blocks_segment(Vec3::new(200.0, 0.0, 0.0), Vec3::new(400.0, 0.0, 0.0)));
    }

    #[test]
    fn segment_outside_pile_height_is_not_blocked() {
        let turbine = Turbine {
            center: Vec3::ZERO,
            radius: 10.0,
            height: 20.0,
        };

        assert!(!turbine.blocks_segment(Vec3::new(-30.0, 50.0, 0.0), Vec3::new(30.0, 60.0, 0.0)));
        assert!(turbine.blocks_segment(Vec3::new(-30.0, 5.0, 0.0), Vec3::new(30.0, 5.0, 0.0)));
    }
}
