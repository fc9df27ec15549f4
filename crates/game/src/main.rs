//! Headless arena host: builds the arena and drives a scripted attract-mode
//! player at a fixed tick rate.
//!
//! Usage: `mech-arena [frames]`

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use engine_core::FrameClock;
use game::{Engine, EngineConfig, SimEvent};
use input::{ElementState, InputState, KeyCode, MouseButton};
use procgen::Map;

const MAP_PATH: &str = "map.bin";
const MAP_SIZE: i32 = 32;
const DEFAULT_FRAMES: u64 = 3600;

/// Display rate the host pretends to present at; the clock turns it into
/// fixed simulation steps.
const HOST_FRAME: Duration = Duration::from_micros(22_222);

fn load_or_generate_map(seed: u64) -> Result<Map> {
    let path = Path::new(MAP_PATH);
    if path.exists() {
        return Map::load(path).with_context(|| format!("reading {}", MAP_PATH));
    }
    let map = Map::generate(MAP_SIZE, MAP_SIZE, seed)?;
    match map.save(path) {
        Ok(()) => log::info!("wrote generated map to {}", MAP_PATH),
        Err(e) => log::warn!("could not save generated map: {}", e),
    }
    Ok(map)
}

/// Scripted input for one simulation step: walk forward, sweep the view,
/// hold fire, hop now and then and switch weapons occasionally.
fn attract_input(input: &mut InputState, step: u64) {
    input.begin_frame();
    if step == 0 {
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
    }
    let sweep = if (step / 240) % 2 == 0 { 6.0 } else { -6.0 };
    input.process_mouse_motion((sweep, 0.0));
    if step % 150 == 75 {
        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        input.process_keyboard(KeyCode::Space, ElementState::Released);
    }
    if step % 600 == 599 {
        input.process_wheel(1.0);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be a number, got {:?}", arg))?,
        None => DEFAULT_FRAMES,
    };

    let config = EngineConfig::load().context("invalid configuration")?;
    let sensitivity = config.mouse_sensitivity;
    let mut clock = FrameClock::new(config.tick_rate);
    let dt = clock.step_seconds();

    let map = load_or_generate_map(config.seed)?;
    let mut engine = Engine::new(config)?;
    engine.build_level(&map)?;
    engine.start()?;

    log::info!("running {} steps at {:.0} Hz", frames, 1.0 / dt);

    let mut input = InputState::new();
    let mut step = 0u64;
    let mut sounds = 0u64;
    let mut kills = 0usize;
    'outer: while step < frames {
        for _ in 0..clock.advance(HOST_FRAME) {
            attract_input(&mut input, step);
            engine.set_command(input.command(sensitivity));
            engine.update(dt)?;

            sounds += engine.sounds.drain().count() as u64;
            kills += engine
                .events
                .count(|e| matches!(e, SimEvent::Killed { .. }));
            step += 1;

            if engine.flow.menu_active {
                log::info!(
                    "{}",
                    engine.flow.banner.as_deref().unwrap_or("player destroyed")
                );
                break 'outer;
            }
            if step >= frames {
                break;
            }
        }
    }

    log::info!(
        "{} steps, wave {}, {} kills, {} sounds, {} projectile drops, {} particle drops",
        step,
        engine.flow.wave,
        kills,
        sounds,
        engine.stats.projectile_drops,
        engine.stats.particle_drops
    );
    if clock.dropped_frames() > 0 {
        log::warn!("{} host frames hit the substep limit", clock.dropped_frames());
    }
    engine.shutdown();
    Ok(())
}
