use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::config::{SwarmConfig, Turbine, World, JELLYFISH_DIAMETER, SCALE_FACTOR};
use crate::forces::{self, Neighborhood};
use crate::math::{limit_magnitude, normalize_or_default, remap_clamped};

/// Speed at which pulsation reaches its fastest, widest beat (0.05 m per frame).
pub const NOMINAL_SPEED: f32 = 0.05 * SCALE_FACTOR;
pub const JELLYFISH_SIZE: f32 = JELLYFISH_DIAMETER * 1.5;

const INITIAL_SPEED_SPREAD: f32 = 0.5;
const PULSE_AMPLITUDE_IDLE: f32 = 1.0;
const PULSE_AMPLITUDE_FULL: f32 = 3.0;
const PULSE_FREQUENCY_IDLE: f32 = 0.1;
const PULSE_FREQUENCY_FULL: f32 = 0.15;

#[derive(Clone, Debug, PartialEq)]
pub struct Jellyfish {
    position: Vec3,
    velocity: Vec3,
    size: f32,
    active_connections: u32,
    pulsation_phase: f32,
    pulsation_frequency: f32,
    pulsation_amplitude: f32,
}

impl Jellyfish {
    /// A jellyfish with a fixed starting state and a resting pulse.
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            size: JELLYFISH_SIZE,
            active_connections: 0,
            pulsation_phase: 0.0,
            pulsation_frequency: 0.02,
            pulsation_amplitude: PULSE_AMPLITUDE_IDLE,
        }
    }

    /// A jellyfish at `position` with randomized drift and pulse.
    pub fn spawn<R: Rng + ?Sized>(position: Vec3, rng: &mut R) -> Self {
        let velocity = Vec3::new(
            rng.random_range(-INITIAL_SPEED_SPREAD..INITIAL_SPEED_SPREAD),
            rng.random_range(-INITIAL_SPEED_SPREAD..INITIAL_SPEED_SPREAD),
            rng.random_range(-INITIAL_SPEED_SPREAD..INITIAL_SPEED_SPREAD),
        );

        Self {
            pulsation_phase: rng.random_range(0.0..TAU),
            pulsation_frequency: rng.random_range(0.01..0.03),
            pulsation_amplitude: rng.random_range(1.0..1.5),
            ..Self::new(position, velocity)
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Peers within connection range as of the last step.
    pub fn active_connections(&self) -> u32 {
        self.active_connections
    }

    pub fn pulsation_phase(&self) -> f32 {
        self.pulsation_phase
    }

    /// Radial bell deformation for the current frame.
    pub fn pulsation_offset(&self) -> f32 {
        self.pulsation_amplitude * self.pulsation_phase.sin()
    }

    /// Advances this jellyfish by one frame.
    ///
    /// `neighborhood` is the swarm as it stood at the start of the frame; this
    /// agent's own slot in it is ignored in favour of its live state.
    pub fn step(
        &mut self,
        neighborhood: &Neighborhood<'_>,
        turbine: &Turbine,
        world: &World,
        config: &SwarmConfig,
    ) {
        self.contain(world);
        let pinned = self.interact_with_turbine(turbine, config);
        self.interact_with_peers(neighborhood, config);
        self.update_pulsation();
        self.velocity = limit_magnitude(self.velocity, config.max_speed);
        self.position += self.velocity;
        self.settle(world, turbine, pinned);
    }

    fn contain(&mut self, world: &World) {
        if self.position.x.abs() > world.half_extent {
            self.velocity.x = -self.velocity.x;
        }
        if self.position.z.abs() > world.half_extent {
            self.velocity.z = -self.velocity.z;
        }
        self.clamp_vertical(world);
    }

    fn clamp_vertical(&mut self, world: &World) {
        if self.position.y < world.top {
            self.position.y = world.top;
            self.velocity.y = -self.velocity.y;
        }
        if self.position.y > world.floor() {
            self.position.y = world.floor();
            self.velocity.y = -self.velocity.y;
        }
    }

    /// Returns the exclusion radius the agent was pushed back onto, if any.
    fn interact_with_turbine(&mut self, turbine: &Turbine, config: &SwarmConfig) -> Option<f32> {
        let pinned = forces::turbine_repulsion(self.position, self.size, turbine).map(|push| {
            self.velocity += push.velocity;
            self.position += push.correction;
            forces::turbine_repulsion_threshold(self.size, turbine)
        });

        self.velocity += forces::turbine_attraction(
            self.position,
            self.size,
            turbine,
            config.turbine_attraction,
        );
        pinned
    }

    fn interact_with_peers(&mut self, neighborhood: &Neighborhood<'_>, config: &SwarmConfig) {
        self.active_connections =
            forces::count_connections(self.position, neighborhood, config.connection_range);

        self.velocity += forces::peer_repulsion(
            self.position,
            self.size,
            neighborhood,
            config.repulsion_strength,
        );
        self.velocity += forces::peer_attraction(
            self.position,
            self.size,
            neighborhood,
            config.connection_range,
            config.attraction_strength,
        );
        self.velocity += forces::spreading(
            self.position,
            neighborhood,
            self.active_connections,
            config,
        );
    }

    fn update_pulsation(&mut self) {
        let speed = self.velocity.length();
        self.pulsation_amplitude = remap_clamped(
            speed,
            0.0,
            NOMINAL_SPEED,
            PULSE_AMPLITUDE_IDLE,
            PULSE_AMPLITUDE_FULL,
        );
        self.pulsation_frequency = remap_clamped(
            speed,
            0.0,
            NOMINAL_SPEED,
            PULSE_FREQUENCY_IDLE,
            PULSE_FREQUENCY_FULL,
        );
        self.pulsation_phase = (self.pulsation_phase + self.pulsation_frequency) % TAU;
    }

    /// Post-integration fix-ups that keep the step's invariants: the vertical band,
    /// and no drifting back into the turbine ring the agent was just pushed onto.
    fn settle(&mut self, world: &World, turbine: &Turbine, pinned: Option<f32>) {
        self.clamp_vertical(world);

        let Some(radius) = pinned else {
            return;
        };
        let d = turbine.horizontal_distance(self.position);
        if d >= radius {
            return;
        }
        let away = Vec3::new(
            self.position.x - turbine.center.x,
            0.0,
            self.position.z - turbine.center.z,
        );
        self.position += normalize_or_default(away, Vec3::X) * (radius - d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn far_turbine() -> Turbine {
        Turbine {
            center: Vec3::new(50_000.0, 0.0, 0.0),
            ..Turbine::default()
        }
    }

    fn step_alone(jelly: &mut Jellyfish, turbine: &Turbine, config: &SwarmConfig) {
        let positions = [jelly.position()];
        jelly.step(
            &Neighborhood::new(0, &positions),
            turbine,
            &World::default(),
            config,
        );
    }

    #[test]
    fn spawn_randomizes_drift_within_limits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let jelly = Jellyfish::spawn(Vec3::ZERO, &mut rng);
            let v = jelly.velocity();
            assert!(v.x.abs() <= 0.5 && v.y.abs() <= 0.5 && v.z.abs() <= 0.5);
            assert!((0.0..TAU).contains(&jelly.pulsation_phase()));
            assert_eq!(jelly.size(), JELLYFISH_SIZE);
        }
    }

    #[test]
    fn speed_is_capped_after_a_step() {
        let config = SwarmConfig {
            max_speed: 0.8,
            ..SwarmConfig::default()
        };
        let mut jelly = Jellyfish::new(Vec3::ZERO, Vec3::new(4.0, 3.0, 0.0));
        step_alone(&mut jelly, &far_turbine(), &config);

        assert!(jelly.velocity().length() <= 0.8 + 1.0e-5);
        assert!(jelly.velocity().x > 0.0);
    }

    #[test]
    fn surface_violation_clamps_and_reflects() {
        let world = World::default();
        let start = Vec3::new(0.0, world.top - 20.0, 0.0);
        let mut jelly = Jellyfish::new(start, Vec3::new(0.0, -1.0, 0.0));
        step_alone(&mut jelly, &far_turbine(), &SwarmConfig::default());

        assert!(jelly.velocity().y > 0.0);
        assert!(jelly.position().y >= world.top);
    }

    #[test]
    fn seabed_band_holds_after_integration() {
        let world = World::default();
        let start = Vec3::new(0.0, world.floor() - 0.5, 0.0);
        let mut jelly = Jellyfish::new(start, Vec3::new(0.0, 1.4, 0.0));
        step_alone(&mut jelly, &far_turbine(), &SwarmConfig::default());

        assert!(jelly.position().y <= world.floor());
        assert!(jelly.velocity().y < 0.0);
    }

    #[test]
    fn horizontal_box_reflects_without_clamping() {
        let world = World::default();
        let start = Vec3::new(world.half_extent + 10.0, 0.0, 0.0);
        let mut jelly = Jellyfish::new(start, Vec3::new(1.0, 0.0, 0.0));
        step_alone(&mut jelly, &far_turbine(), &SwarmConfig::default());

        assert!(jelly.velocity().x < 0.0);
        assert!(jelly.position().x > world.half_extent);
    }

    #[test]
    fn agent_inside_pile_ring_does_not_move_inward() {
        let turbine = Turbine::default();
        let config = SwarmConfig::default();
        let threshold = forces::turbine_repulsion_threshold(JELLYFISH_SIZE, &turbine);

        for start_d in [0.0, 40.0, 150.0, threshold - 0.5] {
            let mut jelly = Jellyfish::new(Vec3::new(start_d, 0.0, 0.0), Vec3::new(-1.5, 0.0, 0.0));
            step_alone(&mut jelly, &turbine, &config);

            let d = turbine.horizontal_distance(jelly.position());
            assert!(d >= start_d.max(threshold) - 1.0e-3, "start {start_d} ended {d}");
        }
    }

    #[test]
    fn pulsation_speeds_up_with_swimming_speed() {
        let turbine = far_turbine();
        let config = SwarmConfig::default();

        let mut idle = Jellyfish::new(Vec3::ZERO, Vec3::ZERO);
        let mut busy = Jellyfish::new(Vec3::ZERO, Vec3::new(1.5, 0.0, 0.0));
        step_alone(&mut idle, &turbine, &config);
        step_alone(&mut busy, &turbine, &config);

        assert!(busy.pulsation_phase() > idle.pulsation_phase());
        assert!(busy.pulsation_offset().abs() <= PULSE_AMPLITUDE_FULL);
    }

    #[test]
    fn connection_count_is_refreshed_each_step() {
        let turbine = far_turbine();
        let world = World::default();
        let config = SwarmConfig::default();
        let mut jelly = Jellyfish::new(Vec3::ZERO, Vec3::ZERO);

        let crowd = [Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 120.0)];
        jelly.step(&Neighborhood::new(0, &crowd), &turbine, &world, &config);
        assert_eq!(jelly.active_connections(), 2);

        let alone = [jelly.position()];
        jelly.step(&Neighborhood::new(0, &alone), &turbine, &world, &config);
        assert_eq!(jelly.active_connections(), 0);
    }
}
