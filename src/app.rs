//! Demo application: window, frame loop and live tuning.

use std::sync::Arc;

use glam::Vec3;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::DemoError;
use crate::gpu::{Camera, GpuState, RenderContext};
use crate::input::{Input, KeyCode, MouseButton};
use crate::mesh::StaticMesh;
use crate::particle::NeighborPolicy;
use crate::scene::{Scene, SceneNode};
use crate::shader;
use crate::spawner::ParticleSpawner;
use crate::system::ParticleSystem;
use crate::time::Time;

/// Builder for the goo demo application.
///
/// Configure, then call [`run`](Self::run) — it blocks until the window
/// closes.
///
/// # Controls
///
/// | Key | Effect |
/// |-----|--------|
/// | `E` / `Q` | raise / lower spawn rate |
/// | `Shift+E` / `Shift+Q` | raise / lower emission speed |
/// | `X` / `Y` | widen / narrow direction jitter |
/// | `Space` | pause / resume the clock |
/// | mouse drag | orbit camera |
/// | scroll | zoom |
///
/// # Example
///
/// ```ignore
/// GooDemo::new()
///     .with_spawn_position(Vec3::new(-6.0, 7.5, 0.0))
///     .with_spawner(|s| s.spawn_rate = 12.0)
///     .run()?;
/// ```
pub struct GooDemo {
    title: String,
    width: u32,
    height: u32,
    spawn_position: Vec3,
    neighbor_policy: NeighborPolicy,
    configure: Option<Box<dyn FnOnce(&mut ParticleSpawner)>>,
}

impl GooDemo {
    pub fn new() -> Self {
        Self {
            title: "goofx".to_string(),
            width: 1280,
            height: 720,
            spawn_position: Vec3::new(-6.0, 7.5, 0.0),
            neighbor_policy: NeighborPolicy::default(),
            configure: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Where the goo stream emits from.
    pub fn with_spawn_position(mut self, position: Vec3) -> Self {
        self.spawn_position = position;
        self
    }

    /// Switch the neighbor scan between the reference self-including
    /// behavior and the corrected one.
    pub fn with_neighbor_policy(mut self, policy: NeighborPolicy) -> Self {
        self.neighbor_policy = policy;
        self
    }

    /// Adjust the spawner after the default demo tuning is applied.
    pub fn with_spawner<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut ParticleSpawner) + 'static,
    {
        self.configure = Some(Box::new(configure));
        self
    }

    /// Run the demo. Blocks until the window is closed.
    pub fn run(self) -> Result<(), DemoError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.init_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for GooDemo {
    fn default() -> Self {
        Self::new()
    }
}

struct DemoState {
    gpu: GpuState,
    scene: Scene,
    camera: Camera,
    time: Time,
    input: Input,
}

struct App {
    settings: GooDemo,
    window: Option<Arc<Window>>,
    state: Option<DemoState>,
    init_error: Option<DemoError>,
}

impl App {
    fn new(settings: GooDemo) -> Self {
        Self {
            settings,
            window: None,
            state: None,
            init_error: None,
        }
    }

    fn init(&mut self, window: Arc<Window>) -> Result<DemoState, DemoError> {
        let gpu = pollster::block_on(GpuState::new(window))?;
        let format = gpu.config.format;

        let mut scene = Scene::new();

        let mut floor = StaticMesh::new(&gpu.device, &StaticMesh::plane(20.0));
        floor.color = Vec3::new(0.2, 0.2, 0.2);
        floor.set_shader(&gpu.device, format, shader::MESH_SHADER)?;
        scene.push(SceneNode::Mesh(floor));

        // Stand-in for the pipe the goo pours out of.
        let mut pipe = StaticMesh::new(&gpu.device, &StaticMesh::cuboid(Vec3::new(1.2, 0.4, 0.4)));
        pipe.color = Vec3::new(0.8, 0.4, 0.2);
        pipe.position = self.settings.spawn_position - Vec3::new(1.0, 0.0, 0.0);
        pipe.set_shader(&gpu.device, format, shader::MESH_SHADER)?;
        scene.push(SceneNode::Mesh(pipe));

        let mut system = ParticleSystem::new(self.settings.spawn_position);
        system.set_neighbor_policy(self.settings.neighbor_policy);
        {
            let spawner = system.spawner_mut();
            spawner.lifetime = 1.5;
            spawner.spawn_rate = 6.0;
            spawner.spawn_rate_jitter = 0.5;
            spawner.direction = Vec3::new(1.0, 0.25, 0.0);
            spawner.direction_jitter = 0.1;
            spawner.speed = 7.0;
            spawner.speed_jitter = 0.3;
        }
        if let Some(configure) = self.settings.configure.take() {
            configure(system.spawner_mut());
        }
        system.set_shader(&gpu.device, format, shader::GOO_SHADER)?;
        scene.push(SceneNode::Goo(system));

        let mut camera = Camera::new();
        camera.yaw = std::f32::consts::PI;
        camera.pitch = 0.3;
        camera.distance = 16.0;
        camera.target = Vec3::new(0.0, 3.0, 0.0);

        Ok(DemoState {
            gpu,
            scene,
            camera,
            time: Time::new(),
            input: Input::new(),
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let DemoState {
            gpu,
            scene,
            camera,
            time,
            input,
        } = state;

        if input.mouse_held(MouseButton::Left) {
            let delta = input.mouse_delta();
            camera.yaw -= delta.x * 0.005;
            camera.pitch = (camera.pitch + delta.y * 0.005).clamp(-1.5, 1.5);
        }
        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            camera.distance = (camera.distance - scroll * 0.8).clamp(2.0, 60.0);
        }

        if input.key_pressed(KeyCode::Space) {
            time.toggle_pause();
        }
        for system in scene.goo_systems_mut() {
            tune_spawner(input, system.spawner_mut());
        }

        let (_, delta_time) = time.update();
        scene.update(delta_time);

        let view = camera.view_matrix();
        let proj = camera.projection_matrix(gpu.aspect());

        match gpu.begin_frame() {
            Ok(mut frame) => {
                {
                    let mut ctx = RenderContext {
                        device: &gpu.device,
                        queue: &gpu.queue,
                        pass: &mut frame.pass,
                        view,
                        proj,
                        camera_position: camera.position(),
                        light: scene.light,
                    };
                    if let Err(error) = scene.render(&mut ctx) {
                        tracing::warn!("frame aborted: {}", error);
                    }
                }
                gpu.end_frame(frame);
            }
            Err(wgpu::SurfaceError::Lost) => {
                let size = winit::dpi::PhysicalSize {
                    width: gpu.config.width,
                    height: gpu.config.height,
                };
                gpu.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
            Err(error) => tracing::warn!("surface error: {:?}", error),
        }

        input.begin_frame();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.width,
                self.settings.height,
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                self.init_error = Some(error.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match self.init(window) {
            Ok(state) => self.state = Some(state),
            Err(error) => {
                tracing::warn!("demo initialization failed: {}", error);
                self.init_error = Some(error);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            state.input.handle_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(state) = &mut self.state {
                    state.gpu.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

fn tune_spawner(input: &Input, spawner: &mut ParticleSpawner) {
    if input.shift_held() && input.key_pressed(KeyCode::KeyE) && spawner.speed < 20.0 {
        spawner.speed += 1.0;
    } else if input.key_pressed(KeyCode::KeyE) && spawner.spawn_rate < 40.0 {
        spawner.spawn_rate += 1.0;
    }

    if input.shift_held() && input.key_pressed(KeyCode::KeyQ) && spawner.speed > 2.0 {
        spawner.speed -= 1.0;
    } else if input.key_pressed(KeyCode::KeyQ) && spawner.spawn_rate > 2.0 {
        spawner.spawn_rate -= 1.0;
    }

    if input.key_pressed(KeyCode::KeyX) && spawner.direction_jitter < 2.0 {
        spawner.direction_jitter += 0.1;
    }
    if input.key_pressed(KeyCode::KeyY) && spawner.direction_jitter > 0.0 {
        spawner.direction_jitter -= 0.1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let demo = GooDemo::new();
        assert_eq!(demo.spawn_position, Vec3::new(-6.0, 7.5, 0.0));
        assert_eq!(demo.neighbor_policy, NeighborPolicy::IncludeSelf);
        assert!(demo.configure.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let demo = GooDemo::new()
            .with_title("demo")
            .with_window_size(640, 480)
            .with_spawn_position(Vec3::ZERO)
            .with_neighbor_policy(NeighborPolicy::ExcludeSelf)
            .with_spawner(|s| s.spawn_rate = 3.0);

        assert_eq!(demo.title, "demo");
        assert_eq!(demo.width, 640);
        assert_eq!(demo.spawn_position, Vec3::ZERO);
        assert_eq!(demo.neighbor_policy, NeighborPolicy::ExcludeSelf);
        assert!(demo.configure.is_some());
    }
}
