use anyhow::Result;
use codecity_engine::catalog::Catalog;
use codecity_engine::cli::CliArgs;
use codecity_engine::config::{EngineConfig, SimMode};
use codecity_engine::model::PrimitiveLoader;
use codecity_engine::Simulation;
use glam::Vec3;

const DEFAULT_FRAMES: u32 = 600;
const FIXED_DT: f32 = 1.0 / 60.0;

fn main() {
    if let Err(err) = run() {
        eprintln!("[codecity] {err:#}");
        std::process::exit(1);
    }
}

/// Headless scripted run: build the demo city, drive the vehicle around,
/// cycle the camera, click a building, and report everything the event bus
/// saw. Doubles as a smoke test for the whole simulation stack.
fn run() -> Result<()> {
    let args = CliArgs::parse_from_env()?;
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::demo(),
    };
    let frames = args.frames.unwrap_or(DEFAULT_FRAMES);

    let mut loader = PrimitiveLoader;
    let mut sim = Simulation::new(&config, catalog, &mut loader)?;
    println!(
        "[codecity] built {} nodes in {} mode, {} physics bodies",
        sim.scene().node_count(),
        sim.mode().label(),
        sim.physics().body_count()
    );
    report_events(&mut sim);

    for frame in 0..frames {
        script_frame(&mut sim, frame, frames);
        sim.advance(FIXED_DT);
        report_events(&mut sim);
    }

    if let Some(vehicle) = sim.vehicle() {
        if let Some((position, _)) = vehicle.chassis_pose(sim.physics()) {
            println!(
                "[codecity] final chassis position ({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            );
        }
    }
    println!("[codecity] camera mode {}", sim.camera_mode().label());
    sim.request_teardown();
    Ok(())
}

fn script_frame(sim: &mut Simulation, frame: u32, total: u32) {
    match frame {
        // Let everything settle, then drive forward.
        60 => sim.input_mut().press("w"),
        // Add steering for a while.
        180 => sim.input_mut().press("a"),
        240 => sim.input_mut().release("a"),
        300 => {
            sim.input_mut().release("w");
            sim.input_mut().press("c");
        }
        301 => sim.input_mut().release("c"),
        _ => {}
    }
    // Near the end, click the core module if it projects on screen.
    if frame + 30 == total {
        let target = Vec3::new(0.0, 2.0, -8.0);
        let viewport = sim.viewport();
        if let Some(screen) = sim.camera().project_point(target, viewport) {
            sim.input_mut().set_cursor(screen.x, screen.y);
            sim.input_mut().click();
        }
    }
}

fn report_events(sim: &mut Simulation) {
    for event in sim.drain_events() {
        println!("[event] {event}");
    }
}
