//! Bevy plugin for fluid simulation.

use bevy::log::error;
use bevy::prelude::*;

use super::params::SphParams;
use super::particle::ScenarioParams;
use super::simulation::FluidSimulation;

/// Plugin that adds 2D SPH fluid simulation to a Bevy app.
///
/// The simulation starts empty; request a scenario through [`FluidState`].
///
/// # Example
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use sph2d::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(MinimalPlugins)
///         .add_plugins(FluidPlugin::default())
///         .run();
/// }
/// ```
#[derive(Default)]
pub struct FluidPlugin {
    /// Seed for reproducible runs. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Scenario laid out on the first update.
    pub initial_scenario: Option<ScenarioParams>,
}

impl FluidPlugin {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_scenario(mut self, scenario: ScenarioParams) -> Self {
        self.initial_scenario = Some(scenario);
        self
    }
}

impl Plugin for FluidPlugin {
    fn build(&self, app: &mut App) {
        // Register types for reflection
        app.register_type::<SphParams>();

        let simulation = match self.seed {
            Some(seed) => FluidSimulation::with_seed(seed),
            None => FluidSimulation::default(),
        };

        // Initialize resources
        app.init_resource::<SphParams>()
            .insert_resource(simulation)
            .insert_resource(FluidState {
                pending_reset: self.initial_scenario.clone(),
                ..default()
            });

        // Add simulation systems
        app.add_systems(
            Update,
            (apply_pending_reset, run_simulation)
                .chain()
                .in_set(FluidSystems),
        );
    }
}

/// System set containing the reset and step systems, for ordering readers after them.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FluidSystems;

/// Control and status of the running simulation, shared with UI code.
#[derive(Resource, Clone, Debug, Default)]
pub struct FluidState {
    pub paused: bool,
    /// Advance exactly one step while paused.
    pub step_requested: bool,
    /// Scenario to lay out before the next step.
    pub pending_reset: Option<ScenarioParams>,
    pub particle_count: usize,
    pub frame: u64,
    pub time: f32,
    pub avg_density_error: f32,
}

impl FluidState {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn request_step(&mut self) {
        self.step_requested = true;
    }

    pub fn request_reset(&mut self, scenario: ScenarioParams) {
        self.pending_reset = Some(scenario);
    }
}

/// System to lay out a requested scenario.
fn apply_pending_reset(
    params: Res<SphParams>,
    mut state: ResMut<FluidState>,
    mut simulation: ResMut<FluidSimulation>,
) {
    let Some(scenario) = state.pending_reset.take() else {
        return;
    };

    match simulation.reset(&scenario, &params) {
        Ok(()) => {
            state.particle_count = simulation.particle_count();
            state.frame = 0;
            state.time = 0.0;
            state.avg_density_error = 0.0;
        }
        Err(err) => error!("Failed to reset fluid: {err}"),
    }
}

/// System to run the fluid simulation.
fn run_simulation(
    time: Res<Time>,
    params: Res<SphParams>,
    mut state: ResMut<FluidState>,
    mut simulation: ResMut<FluidSimulation>,
) {
    if state.paused && !state.step_requested {
        return;
    }
    state.step_requested = false;

    let dt = params.fixed_timestep.unwrap_or(time.delta_secs());

    // Clamp dt to prevent instability
    let dt = dt.min(params.max_timestep);

    if dt > 0.0 {
        simulation.step(dt, &params);
    }

    state.particle_count = simulation.particle_count();
    state.frame = simulation.frame();
    state.time = simulation.elapsed();
    state.avg_density_error = simulation.diagnostics().average_density_error;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app(plugin: FluidPlugin) -> App {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.add_plugins(plugin.with_seed(17));
        app
    }

    #[test]
    fn test_initial_scenario_is_spawned() {
        let mut app = test_app(FluidPlugin::default().with_scenario(ScenarioParams::dam()));

        app.update();

        let state = app.world().resource::<FluidState>();
        assert!(state.particle_count > 0);
        assert_eq!(state.frame, 1);
        assert!(state.pending_reset.is_none());
        assert_eq!(
            app.world().resource::<FluidSimulation>().particle_count(),
            state.particle_count
        );
    }

    #[test]
    fn test_pause_and_single_step() {
        let mut app = test_app(FluidPlugin::default().with_scenario(ScenarioParams::dam()));
        app.update();

        app.world_mut().resource_mut::<FluidState>().toggle_pause();
        app.update();
        assert_eq!(app.world().resource::<FluidState>().frame, 1);

        app.world_mut().resource_mut::<FluidState>().request_step();
        app.update();
        app.update();
        let state = app.world().resource::<FluidState>();
        assert_eq!(state.frame, 2);
        assert!(!state.step_requested);
    }

    #[test]
    fn test_bad_reset_keeps_running_population() {
        let mut app = test_app(FluidPlugin::default().with_scenario(ScenarioParams::dam()));
        app.update();
        let count = app.world().resource::<FluidState>().particle_count;

        app.world_mut()
            .resource_mut::<FluidState>()
            .request_reset(ScenarioParams::default().with_spacing(0.0));
        app.update();

        let state = app.world().resource::<FluidState>();
        assert_eq!(state.particle_count, count);
        assert_eq!(state.frame, 2);
    }

    #[test]
    fn test_frame_delta_used_without_fixed_timestep() {
        let mut app = test_app(FluidPlugin::default().with_scenario(ScenarioParams::dam()));
        app.insert_resource(SphParams::default().with_fixed_timestep(None));

        app.update();

        // Time never advances here, so no step is taken
        let state = app.world().resource::<FluidState>();
        assert!(state.particle_count > 0);
        assert_eq!(state.frame, 0);
    }
}
