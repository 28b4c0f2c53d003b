use std::time::Duration;

use glow::HasContext;

use crate::abs::{App, ShaderProgram};
use crate::camera::Camera;
use crate::scene::Scene;
use crate::timing::FramePacer;

mod abs;
mod camera;
mod scene;
mod timing;

const WINDOW_WIDTH: u32 = 512;
const WINDOW_HEIGHT: u32 = 512;
const FPS: u32 = 60;

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

/// Drains pending events into the camera. Returns `false` as soon as a
/// quit event is seen, so the loop ends on that iteration without issuing
/// another draw call.
fn process_events(
    events: impl Iterator<Item = sdl2::event::Event>,
    camera: &mut Camera,
) -> bool {
    for event in events {
        if matches!(event, sdl2::event::Event::Quit { .. }) {
            return false;
        }
        camera.handle_event(&event);
    }
    true
}

fn main() {
    setup_logger().expect("Failed to initialize logger");

    let mut app = App::new("Triangle Scene", WINDOW_WIDTH, WINDOW_HEIGHT);
    // frame pacing is done by sleeping, not by the swap interval
    app.video_subsystem
        .gl_set_swap_interval(sdl2::video::SwapInterval::Immediate)
        .unwrap();

    unsafe {
        app.gl.enable(glow::DEPTH_TEST);
        app.gl.clear_color(0.5, 0.5, 0.5, 1.0);
    }

    let scene_text = std::fs::read_to_string("data.json").expect("Failed to read data.json");
    let scene = Scene::new(&scene_text).expect("Failed to parse data.json");
    let meshes: Vec<_> = scene.triangles.iter().map(|t| t.mesh(&app.gl)).collect();

    // uploaded at startup and kept for the window's lifetime; intentionally never drawn
    let _quad = scene::unit_quad(&app.gl);

    let shader =
        ShaderProgram::from_file(&app.gl, "Basic.shader").expect("Failed to load Basic.shader");

    let mut camera = Camera::new();
    let aspect = WINDOW_WIDTH as f32 / WINDOW_HEIGHT as f32;
    let mut pacer = FramePacer::new(Duration::from_secs(1) / FPS);

    'running: loop {
        if !process_events(app.event_pump.poll_iter(), &mut camera) {
            break 'running;
        }

        unsafe {
            app.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }

        shader.use_program();
        shader.set_uniform("u_projection", camera.projection(aspect));
        shader.set_uniform("u_view", camera.view());
        for mesh in &meshes {
            mesh.draw();
        }
        ShaderProgram::clear_program(&app.gl);

        app.window.gl_swap_window();
        pacer.pace();
    }
}

#[cfg(test)]
mod tests {
    use sdl2::event::Event;
    use sdl2::mouse::MouseButton;

    use super::*;

    #[test]
    fn test_quit_event_stops_the_loop() {
        let mut camera = Camera::new();
        camera.begin_drag(0, 0);
        let events = vec![
            Event::Quit { timestamp: 0 },
            Event::MouseMotion {
                timestamp: 0,
                window_id: 0,
                which: 0,
                mousestate: sdl2::mouse::MouseState::from_sdl_state(0),
                x: 40,
                y: 0,
                xrel: 40,
                yrel: 0,
            },
        ];

        assert!(!process_events(events.into_iter(), &mut camera));
        // nothing past the quit event is applied
        assert_eq!(camera.yaw, 0.0);
    }

    #[test]
    fn test_non_quit_events_keep_the_loop_running() {
        let mut camera = Camera::new();
        let events = vec![
            Event::MouseButtonDown {
                timestamp: 0,
                window_id: 0,
                which: 0,
                mouse_btn: MouseButton::Left,
                clicks: 1,
                x: 0,
                y: 0,
            },
            Event::MouseMotion {
                timestamp: 0,
                window_id: 0,
                which: 0,
                mousestate: sdl2::mouse::MouseState::from_sdl_state(0),
                x: 10,
                y: 0,
                xrel: 10,
                yrel: 0,
            },
        ];

        assert!(process_events(events.into_iter(), &mut camera));
        assert_eq!(camera.yaw, 5.0);
    }
}
