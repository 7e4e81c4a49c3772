//! Minigolf physics entry point
//!
//! On the web this only installs logging; the page drives `MinigolfWorld`.
//! Natively it steps a demo course headless and prints where the ball ends up.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Minigolf physics ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Minigolf physics (native) starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

/// `minigolf-physics [obstacles|test] [settings.json]`
#[cfg(not(target_arch = "wasm32"))]
fn run() -> minigolf_physics::Result<()> {
    use minigolf_physics::Settings;
    use minigolf_physics::consts::FRAME_DT;
    use minigolf_physics::math::Vector;
    use minigolf_physics::sim::{
        LaunchInput, SceneSnapshot, TickInput, World, obstacle_course, test_course, tick,
    };

    let mut args = std::env::args().skip(1);
    let course_name = args.next().unwrap_or_else(|| "obstacles".to_string());
    let settings = match args.next() {
        Some(path) => Settings::load_from(std::path::Path::new(&path)),
        None => Settings::load(),
    };
    settings.validate()?;

    let mut world = World::new(settings);
    let course = match course_name.as_str() {
        "test" => test_course(&mut world)?,
        _ => obstacle_course(&mut world)?,
    };

    let mut input = TickInput::default();
    if let Some(&ball) = course.balls.first() {
        input.launch = Some(LaunchInput {
            ball,
            target: Vector::new_2d(300.0, 120.0),
            magnitude: 1200.0,
        });
    }

    // Ten simulated seconds
    let frames = (10_000.0 / FRAME_DT) as usize;
    for frame in 0..frames {
        tick(&mut world, &input, FRAME_DT)?;
        input.launch = None;

        if frame % 60 == 0 {
            for (id, ball) in world.balls() {
                log::debug!("frame {frame}: ball {id:?} at {} moving {}", ball.position, ball.momentum);
            }
        }
    }

    let mut scene = SceneSnapshot::default();
    world.publish(&mut scene)?;
    for (id, ball) in world.balls() {
        println!(
            "ball {id:?} at {} after {:.0} ms ({:?})",
            ball.position,
            world.time_ms(),
            ball.state()
        );
    }
    println!("{} entities published", scene.transforms.len());
    Ok(())
}
