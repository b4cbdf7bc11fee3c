pub mod config;
pub mod error;
pub mod forces;
pub mod jellyfish;
pub mod math;
pub mod swarm;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

pub use crate::config::{SwarmConfig, Turbine, World};
pub use crate::error::SwarmError;
pub use crate::jellyfish::Jellyfish;
pub use crate::swarm::{Swarm, SwarmStats};

const FALLBACK_SEED: u64 = 0x6a65_6c6c_7966_6973;

#[wasm_bindgen]
pub struct Sim {
    config: SwarmConfig,
    world: World,
    turbine: Turbine,
    rng: StdRng,
    swarm: Swarm,
}

#[wasm_bindgen]
impl Sim {
    /// `seed == 0` draws a fresh seed from the platform.
    #[wasm_bindgen(constructor)]
    pub fn new(count: usize, seed: u32, width: f32) -> Result<Sim, JsError> {
        Ok(Sim::try_new(count, seed, width)?)
    }

    pub fn step(&mut self) {
        self.swarm.step(&self.config);
    }

    /// Replaces the whole swarm with `agent_count` freshly placed jellyfish.
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.respawn()?;
        Ok(())
    }

    pub fn set_count(&mut self, count: usize) -> Result<(), JsError> {
        self.config.agent_count = count;
        self.config.sanitize();
        self.respawn()?;
        Ok(())
    }

    pub fn set_connection_range(&mut self, value: f32) {
        self.config.connection_range = value;
        self.config.sanitize();
    }

    pub fn set_max_speed(&mut self, value: f32) {
        self.config.max_speed = value;
        self.config.sanitize();
    }

    pub fn set_max_connections(&mut self, value: u32) {
        self.config.max_connections = value;
        self.config.sanitize();
    }

    pub fn set_turbine_attraction(&mut self, value: f32) {
        self.config.turbine_attraction = value;
        self.config.sanitize();
    }

    pub fn set_spreading_force(&mut self, value: f32) {
        self.config.spreading_force = value;
        self.config.sanitize();
    }

    pub fn set_attraction_strength(&mut self, value: f32) {
        self.config.attraction_strength = value;
        self.config.sanitize();
    }

    pub fn set_repulsion_strength(&mut self, value: f32) {
        self.config.repulsion_strength = value;
        self.config.sanitize();
    }

    /// Overrides any subset of the tunables from a JSON object. The agent count
    /// takes effect on the next reset.
    pub fn apply_config_json(&mut self, json: &str) -> Result<(), JsError> {
        self.config = self
            .config
            .merge_json(json)
            .map_err(SwarmError::InvalidConfig)?;
        Ok(())
    }

    pub fn config_json(&self) -> Result<String, JsError> {
        let json = serde_json::to_string(&self.config).map_err(SwarmError::InvalidConfig)?;
        Ok(json)
    }

    pub fn set_bounds(&mut self, width: f32) {
        self.world = World::for_view_width(width);
        self.swarm.set_world(self.world);
    }

    pub fn count(&self) -> usize {
        self.swarm.len()
    }

    /// Agent positions as a flat `[x0, y0, z0, x1, ...]` buffer.
    pub fn positions(&self) -> Vec<f32> {
        self.swarm
            .agents()
            .iter()
            .flat_map(|agent| agent.position().to_array())
            .collect()
    }

    pub fn pulsation_offsets(&self) -> Vec<f32> {
        self.swarm
            .agents()
            .iter()
            .map(Jellyfish::pulsation_offset)
            .collect()
    }

    /// Connected agent index pairs as a flat `[i0, j0, i1, j1, ...]` buffer.
    pub fn connections(&self) -> Vec<u32> {
        self.swarm
            .connectivity_graph()
            .into_iter()
            .flat_map(|(i, j)| [i as u32, j as u32])
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.swarm.connectivity_graph().len()
    }

    pub fn mean_speed(&self) -> f32 {
        self.swarm.stats().mean_speed
    }

    pub fn turbine_x(&self) -> f32 {
        self.turbine.center.x
    }

    pub fn turbine_y(&self) -> f32 {
        self.turbine.center.y
    }

    pub fn turbine_z(&self) -> f32 {
        self.turbine.center.z
    }

    pub fn monopile_radius(&self) -> f32 {
        self.turbine.radius
    }

    pub fn turbine_height(&self) -> f32 {
        self.turbine.height
    }

    pub fn world_top(&self) -> f32 {
        self.world.top
    }

    pub fn world_bottom(&self) -> f32 {
        self.world.bottom
    }
}

impl Sim {
    /// Builds the simulation, failing when the swarm cannot be placed.
    pub fn try_new(count: usize, seed: u32, width: f32) -> Result<Sim, SwarmError> {
        let config = SwarmConfig {
            agent_count: count,
            ..SwarmConfig::default()
        }
        .sanitized();
        let world = World::for_view_width(width);
        let turbine = Turbine::default();
        let mut rng = StdRng::seed_from_u64(resolve_seed(seed));
        let swarm = Swarm::initialize(config.agent_count, world, turbine, &mut rng)?;

        Ok(Sim {
            config,
            world,
            turbine,
            rng,
            swarm,
        })
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    fn respawn(&mut self) -> Result<(), SwarmError> {
        self.swarm = Swarm::initialize(
            self.config.agent_count,
            self.world,
            self.turbine,
            &mut self.rng,
        )?;
        tracing::info!(count = self.swarm.len(), "swarm respawned");
        Ok(())
    }
}

fn resolve_seed(seed: u32) -> u64 {
    if seed != 0 {
        return u64::from(seed);
    }
    getrandom::u64().unwrap_or_else(|err| {
        tracing::warn!(%err, "platform entropy unavailable, using fixed seed");
        FALLBACK_SEED
    })
}
