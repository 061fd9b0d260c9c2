mod ad_texture;
mod camera;
mod canvas;
mod color;
mod font;
mod hud;
mod input;
mod lighting;
mod profiler;
mod renderer;
mod scene;
mod texture;
mod tiles;
mod tube;

use std::time::Instant;

use anyhow::Context;
use camera::{CameraController, CameraDefaults, OrbitCamera, Projection};
use input::{on_off, InputAction, InputController, ToggleState};
use profiler::FrameCtx;
use renderer::Renderer;
use scene::SceneComposer;
use tiles::TubeShape;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{Window, WindowBuilder},
};

const WINDOW_TITLE: &str = "Cybercity AR-Ad Tube";
const WINDOW_WIDTH: u32 = 600;
const WINDOW_HEIGHT: u32 = 600;

struct State<'window> {
    window: &'window Window,
    renderer: Renderer<'window>,
    scene: SceneComposer,
    camera: OrbitCamera,
    camera_defaults: CameraDefaults,
    projection: Projection,
    controller: CameraController,
    input: InputController,
    start: Instant,
    frame: Option<FrameCtx>,
}

impl<'window> State<'window> {
    fn new(window: &'window Window) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let camera_defaults = CameraDefaults::for_viewport(WINDOW_HEIGHT);
        let projection = Projection::new(size.width, size.height, &camera_defaults);
        let camera = OrbitCamera::new(&camera_defaults);
        let controller = CameraController::new(&camera_defaults, size.height);

        let scene = SceneComposer::new(TubeShape::default(), logical_viewport(window));
        let layout = scene.layout();
        let textures = scene.textures();
        println!(
            "[Scene] {} rings x {} segments = {} panels, {} ad textures at {}px",
            layout.rings(),
            layout.segments(),
            layout.len(),
            textures.len(),
            textures.size()
        );
        let renderer = Renderer::new(window, textures.len() as u32, textures.size())
            .context("failed to create renderer")?;

        let mut state = Self {
            window,
            renderer,
            scene,
            camera,
            camera_defaults,
            projection,
            controller,
            input: InputController::default(),
            start: Instant::now(),
            frame: None,
        };
        state
            .renderer
            .update_camera(&state.camera, &state.projection);
        Ok(state)
    }

    fn window(&self) -> &Window {
        self.window
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.renderer.resize(new_size, &mut self.projection);
        let size = self.renderer.size();
        self.controller
            .set_viewport(&self.camera_defaults, size.height);
        self.scene.set_viewport(logical_viewport(self.window));
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if let Some(action) = self.input.process_key(key, event.repeat) {
                        self.on_action(action);
                        return true;
                    }
                }
            }
        }
        self.controller.process_events(event)
    }

    fn on_action(&mut self, action: InputAction) {
        let toggles = self.input.toggles();
        match action {
            InputAction::ToggleAutoRotate => {
                println!("[Toggle] auto-rotate {}", on_off(toggles.auto_rotate))
            }
            InputAction::ToggleGrid => println!("[Toggle] grid {}", on_off(toggles.show_grid)),
            InputAction::ToggleFlicker => {
                println!("[Toggle] flicker {}", on_off(toggles.enable_flicker))
            }
            InputAction::ToggleGlow => println!("[Toggle] glow {}", on_off(toggles.enable_glow)),
            InputAction::ResetView => {
                self.camera.reset(&self.camera_defaults);
                self.controller.reset_motion();
                println!(
                    "[Camera] view reset (distance {:.1}), auto-rotate OFF",
                    self.camera_defaults.distance
                );
            }
        }
    }

    fn update(&mut self) {
        let frame = profiler::begin_frame();
        let time = self.start.elapsed().as_secs_f32();
        let toggles: ToggleState = self.input.toggles();

        self.controller.update_camera(&mut self.camera);
        self.renderer
            .update_camera(&self.camera, &self.projection);

        let composed = self.scene.compose(time, toggles, &frame);
        self.renderer.prepare(&composed, self.scene.textures());
        self.frame = frame;
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.frame.take();
        let renderer = &mut self.renderer;
        profiler::scope(&frame, "render", || renderer.render())
    }
}

fn logical_viewport(window: &Window) -> (f32, f32) {
    let logical: LogicalSize<f32> = window.inner_size().to_logical(window.scale_factor());
    (logical.width, logical.height)
}

fn main() -> anyhow::Result<()> {
    println!("╔════════════════════════════════════════╗");
    println!("║         CYBERCITY AR-AD TUBE           ║");
    println!("╚════════════════════════════════════════╝");
    println!();
    println!("CONTROLS:");
    println!("  Left Drag       - Orbit");
    println!("  Right/Ctrl Drag - Pan");
    println!("  Mouse Wheel     - Zoom");
    println!("  R               - Toggle auto-rotate");
    println!("  G               - Toggle grid");
    println!("  F               - Toggle flicker");
    println!("  B               - Toggle glow");
    println!("  0               - Reset camera");
    println!();

    profiler::init_session();

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH as f64, WINDOW_HEIGHT as f64))
        .with_resizable(false)
        .build(&event_loop)
        .context("failed to create window")?;

    let mut state = State::new(&window)?;

    event_loop.run(move |event, target| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == state.window().id() => {
            if !state.input(event) {
                match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(physical_size) => state.resize(*physical_size),
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let new_size = state.window().inner_size();
                        state.resize(new_size)
                    }
                    WindowEvent::RedrawRequested => match state.render() {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            let size = state.window().inner_size();
                            state.resize(size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => target.exit(),
                        Err(e) => eprintln!("render error: {e:?}"),
                    },
                    _ => {}
                }
            }
        }
        Event::AboutToWait => {
            state.update();
            state.window().request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}
