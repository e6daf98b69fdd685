use std::time::{Duration, Instant};

use slate_core::{DrawableObject, Scene};
use slate_host::{init_logging, HostConfig, LoggingConfig, RenderHost};
use slate_perf::{ListenerError, PerformanceWarning, WarningLevel};
use slate_renderer::Viewport;

const FRAMES: u64 = 600;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Lay out `groups` compound objects on a grid, each with a handful of children.
fn build_scene(groups: usize) -> Scene {
    let mut scene = Scene::new();
    let columns = (groups as f64).sqrt().ceil() as usize;
    for i in 0..groups {
        let x = (i % columns) as f64 * 120.0;
        let y = (i / columns) as f64 * 120.0;
        let group = scene.add_object(
            DrawableObject::from_corners(x, y, x + 100.0, y + 100.0)
                .z_index(i as i32)
                .selected(i == 0),
        );
        for c in 0..4 {
            let cx = x + 10.0 + (c % 2) as f64 * 45.0;
            let cy = y + 10.0 + (c / 2) as f64 * 45.0;
            scene.add_child(&group, DrawableObject::from_corners(cx, cy, cx + 35.0, cy + 35.0));
        }
    }
    scene
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default());

    let config = match std::env::args().nth(1) {
        Some(path) => HostConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => HostConfig::default(),
    };
    let mut host = RenderHost::new(config)?;
    host.add_warning_listener(Box::new(
        |warning: &PerformanceWarning| -> Result<(), ListenerError> {
            if warning.level == WarningLevel::Critical {
                log::error!("{}", warning.message);
            }
            Ok(())
        },
    ));

    let scene = build_scene(800);
    log::info!("Simulating {} frames over {} objects", FRAMES, scene.len());

    // Simulated clock so the monitor tick fires at its configured rate
    // regardless of how fast frames are actually produced.
    let start = Instant::now();
    for frame in 0..FRAMES {
        let t = frame as f64 / FRAMES as f64;
        let scale = 1.0 - 0.9 * (t * std::f64::consts::PI).sin();
        let viewport = Viewport::from_screen(t * 3000.0, t * 1500.0, 1280.0, 800.0, scale);

        if let Some(rendered) = host.render_scene_tick(&scene, &viewport) {
            log::debug!(
                "frame {}: {} drawn, {} culled",
                frame,
                rendered.len(),
                rendered.culled.len()
            );
        }
        host.poll(start + FRAME_INTERVAL * frame as u32);
    }
    host.monitor_tick();

    let report = host.export_report();
    log::info!(
        "Finished in {:?} mode, score {}",
        host.mode(),
        report.score
    );
    println!("{}", report.to_json()?);
    Ok(())
}
