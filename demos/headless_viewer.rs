//! Headless walkthrough: loads a samurai, walks, dies, and saves a screenshot.
//!
//! ```text
//! cargo run --example headless_viewer -- [asset-root] [model-id]
//! ```
//!
//! The asset root must contain the Bushido layout (`models/character.glb`,
//! `models/animations/walk.glb`, ...). Defaults to `demos/assets`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bushido_viewer::{AssetCatalog, FileAssetReader, RigState, Timer, Viewer, ViewerConfig, ViewerEvent};

const MAX_WAIT_FRAMES: usize = 600;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let root = args.next().unwrap_or_else(|| "demos/assets".to_string());
    let model_id = args.next().unwrap_or_else(|| "default-samurai".to_string());

    // 1. Viewer over the on-disk collection
    let reader = FileAssetReader::new(&root).with_context(|| format!("opening asset root {root}"))?;
    let catalog = Arc::new(AssetCatalog::bushido());
    let mut viewer = Viewer::headless(ViewerConfig::default(), catalog, Arc::new(reader))?;
    let mut timer = Timer::fixed(60);

    // 2. Model
    viewer.select_model(&model_id)?;
    wait_until(&mut viewer, &mut timer, |v| v.rig_state() == Some(RigState::Ready))?;
    println!("Loaded '{model_id}'");

    // 3. Walk for two seconds, then cross-fade into the death clip
    viewer.select_animation("walk")?;
    wait_until(&mut viewer, &mut timer, |v| v.controller().current_animation() == Some("walk"))?;
    run_for(&mut viewer, &mut timer, 2.0)?;

    viewer.select_animation("death")?;
    wait_until(&mut viewer, &mut timer, |v| v.controller().current_animation() == Some("death"))?;
    run_for(&mut viewer, &mut timer, 2.0)?;

    // 4. A slow orbit before the final frame
    for _ in 0..60 {
        viewer.rotate_camera(0.01);
        viewer.update(timer.tick())?;
    }

    let shot = viewer.capture_screenshot()?;
    std::fs::write(&shot.file_name, &shot.png).with_context(|| format!("writing {}", shot.file_name))?;

    let stats = viewer.stats();
    println!(
        "Saved {} after {} frames ({} loads applied, {} live resources)",
        shot.file_name,
        stats.frames_rendered,
        stats.loads_applied,
        stats.live_resources.total()
    );

    viewer.shutdown();
    Ok(())
}

/// Ticks until `done` holds. File reads finish on a background runtime, so
/// each frame yields briefly to let them land.
fn wait_until(viewer: &mut Viewer, timer: &mut Timer, done: impl Fn(&Viewer) -> bool) -> anyhow::Result<()> {
    for _ in 0..MAX_WAIT_FRAMES {
        viewer.update(timer.tick())?;
        for event in viewer.drain_events() {
            match event {
                ViewerEvent::LoadFailed { message, .. } => anyhow::bail!(message),
                other => log::info!("{other:?}"),
            }
        }
        if done(viewer) {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    anyhow::bail!("timed out waiting for assets")
}

fn run_for(viewer: &mut Viewer, timer: &mut Timer, seconds: f32) -> anyhow::Result<()> {
    let frames = (seconds * 60.0).round() as usize;
    for _ in 0..frames {
        viewer.update(timer.tick())?;
    }
    Ok(())
}
