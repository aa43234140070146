//! Error types for goofx.
//!
//! Fallible operations return explicit results; nothing in here is fatal
//! to the hosting process. A failed shader swap leaves the affected
//! renderable without a bound pipeline, and a failed frame simply stays
//! incomplete until the next one.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while building a render pipeline from WGSL.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader module or pipeline failed device validation.
    Compile(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile(msg) => write!(f, "Shader compilation failed: {}", msg),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Errors that can occur while drawing a frame.
///
/// Render failures are per-frame: the remaining draws of the frame are
/// abandoned, simulation state is untouched, and the next update runs
/// normally.
#[derive(Debug)]
pub enum RenderError {
    /// No shader is bound; a previous pipeline build failed or was never
    /// attempted.
    ShaderNotReady,
    /// The per-draw uniform buffer cannot grow to hold this many draws.
    DrawCapacity {
        /// Draws requested this frame.
        requested: usize,
        /// Device limit on the backing buffer, in bytes.
        max_buffer_size: u64,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ShaderNotReady => {
                write!(f, "No shader bound. Call set_shader() with valid WGSL first.")
            }
            RenderError::DrawCapacity {
                requested,
                max_buffer_size,
            } => write!(
                f,
                "Cannot allocate per-draw uniforms for {} draws (device buffer limit {} bytes)",
                requested, max_buffer_size
            ),
        }
    }
}

impl std::error::Error for RenderError {}

/// Errors that can occur when running the demo application.
#[derive(Debug)]
pub enum DemoError {
    /// Failed to create the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create the window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Building a built-in shader failed.
    Shader(ShaderError),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            DemoError::Window(e) => write!(f, "Failed to create window: {}", e),
            DemoError::Gpu(e) => write!(f, "GPU error: {}", e),
            DemoError::Shader(e) => write!(f, "Shader error: {}", e),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::EventLoop(e) => Some(e),
            DemoError::Window(e) => Some(e),
            DemoError::Gpu(e) => Some(e),
            DemoError::Shader(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for DemoError {
    fn from(e: winit::error::EventLoopError) -> Self {
        DemoError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for DemoError {
    fn from(e: winit::error::OsError) -> Self {
        DemoError::Window(e)
    }
}

impl From<GpuError> for DemoError {
    fn from(e: GpuError) -> Self {
        DemoError::Gpu(e)
    }
}

impl From<ShaderError> for DemoError {
    fn from(e: ShaderError) -> Self {
        DemoError::Shader(e)
    }
}
