//! sph2d - headless SPH demo
//!
//! Runs a dam break scenario for a number of frames (first argument, default
//! 500) and logs density statistics along the way.

use bevy::log::{info, warn, LogPlugin};
use bevy::prelude::*;
use sph2d::prelude::*;

const DEFAULT_FRAMES: u64 = 500;
const REPORT_EVERY: u64 = 50;

fn main() {
    let mut app = App::new();
    app.add_plugins(LogPlugin::default())
        .init_resource::<Time>()
        .add_plugins(FluidPlugin::default().with_scenario(ScenarioParams::dam()))
        .add_systems(Update, report_progress.after(FluidSystems));

    app.finish();
    app.cleanup();

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg.parse().unwrap_or_else(|_| {
            warn!("Ignoring frame count {arg:?}, using {DEFAULT_FRAMES}");
            DEFAULT_FRAMES
        }),
        None => DEFAULT_FRAMES,
    };
    info!("Running {frames} frames");

    for _ in 0..frames {
        app.update();
    }

    let simulation = app.world().resource::<FluidSimulation>();
    let diagnostics = simulation.diagnostics();
    info!(
        "Done after {} steps ({:.3}s): density min {:.3} mean {:.3} max {:.3}",
        simulation.frame(),
        simulation.elapsed(),
        diagnostics.min_density,
        diagnostics.mean_density,
        diagnostics.max_density
    );
}

/// Log the simulation state every few frames.
fn report_progress(state: Res<FluidState>) {
    if state.frame == 0 || state.frame % REPORT_EVERY != 0 {
        return;
    }
    info!(
        "Frame {} ({:.3}s): {} particles, density error {:.2}%",
        state.frame,
        state.time,
        state.particle_count,
        state.avg_density_error * 100.0
    );
}
