//! Per-particle draw path for the goo effect.
//!
//! Every particle draw binds two uniform slots: its transform matrices
//! and its neighbor positions. Both live in a pair of dynamic-offset
//! uniform buffers with one 512-byte slot per draw, grown on demand;
//! each particle binds its slot and draws a camera-facing quad.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::{RenderError, ShaderError};
use crate::particle::NeighborData;

/// Byte size of one per-draw slot. `DrawUniforms` and [`NeighborData`]
/// are both exactly this large, and it is a multiple of the 256-byte
/// uniform offset alignment.
pub const DRAW_SLOT_SIZE: u64 = 512;

const INITIAL_DRAW_CAPACITY: usize = 256;

/// Per-draw transform matrices, uploaded once per particle per frame.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct DrawUniforms {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub world_view: [[f32; 4]; 4],
    pub world_view_proj: [[f32; 4]; 4],
    pub inverse_world: [[f32; 4]; 4],
    pub inverse_view: [[f32; 4]; 4],
    pub inverse_proj: [[f32; 4]; 4],
}

impl DrawUniforms {
    pub fn new(world: Mat4, view: Mat4, proj: Mat4) -> Self {
        let world_view = view * world;
        let world_view_proj = proj * world_view;
        Self {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            world_view: world_view.to_cols_array_2d(),
            world_view_proj: world_view_proj.to_cols_array_2d(),
            inverse_world: world.inverse().to_cols_array_2d(),
            inverse_view: view.inverse().to_cols_array_2d(),
            inverse_proj: proj.inverse().to_cols_array_2d(),
        }
    }
}

/// Pipeline and per-draw buffers for one goo particle system.
pub struct GooRenderer {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    transform_buffer: wgpu::Buffer,
    neighbor_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl GooRenderer {
    /// Build the pipeline from WGSL source.
    ///
    /// Validation errors from the shader module or pipeline surface as
    /// [`ShaderError::Compile`]; nothing is kept on failure.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<Self, ShaderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Goo Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Goo Draw Bind Group Layout"),
            entries: &[
                draw_uniform_entry(0),
                draw_uniform_entry(1),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Goo Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Goo Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: super::DEPTH_FORMAT,
                // Goo is translucent; it tests depth against the meshes
                // but never occludes itself.
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Compile(error.to_string()));
        }

        let (transform_buffer, neighbor_buffer, bind_group) =
            create_draw_buffers(device, &layout, INITIAL_DRAW_CAPACITY);

        Ok(Self {
            pipeline,
            layout,
            transform_buffer,
            neighbor_buffer,
            bind_group,
            capacity: INITIAL_DRAW_CAPACITY,
        })
    }

    /// Number of per-draw slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow the per-draw buffers to hold at least `draws` slots.
    ///
    /// Fails without touching the existing buffers when the requested
    /// size exceeds the device's buffer limit; the frame is then aborted
    /// before any draw is recorded.
    pub fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        draws: usize,
    ) -> Result<(), RenderError> {
        if draws <= self.capacity {
            return Ok(());
        }

        let max_buffer_size = device.limits().max_buffer_size;
        if draws as u64 * DRAW_SLOT_SIZE > max_buffer_size {
            return Err(RenderError::DrawCapacity {
                requested: draws,
                max_buffer_size,
            });
        }

        let mut capacity = self.capacity.max(1);
        while capacity < draws {
            capacity *= 2;
        }
        if capacity as u64 * DRAW_SLOT_SIZE > max_buffer_size {
            capacity = draws;
        }

        let (transform_buffer, neighbor_buffer, bind_group) =
            create_draw_buffers(device, &self.layout, capacity);
        self.transform_buffer = transform_buffer;
        self.neighbor_buffer = neighbor_buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;

        tracing::debug!(capacity, "grew goo per-draw buffers");
        Ok(())
    }

    /// Bind the goo pipeline. Call once before the per-particle draws.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'static>) {
        pass.set_pipeline(&self.pipeline);
    }

    /// Upload one particle's draw data into its slot and record its draw.
    ///
    /// `index` must be below the ensured capacity.
    pub fn draw(
        &self,
        queue: &wgpu::Queue,
        pass: &mut wgpu::RenderPass<'static>,
        index: usize,
        uniforms: &DrawUniforms,
        neighbors: &NeighborData,
    ) {
        let offset = index as u64 * DRAW_SLOT_SIZE;
        queue.write_buffer(&self.transform_buffer, offset, bytemuck::bytes_of(uniforms));
        queue.write_buffer(&self.neighbor_buffer, offset, bytemuck::bytes_of(neighbors));

        pass.set_bind_group(0, &self.bind_group, &[offset as u32, offset as u32]);
        pass.draw(0..6, 0..1);
    }
}

fn draw_uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: NonZeroU64::new(DRAW_SLOT_SIZE),
        },
        count: None,
    }
}

fn create_draw_buffers(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::Buffer, wgpu::BindGroup) {
    let size = capacity as u64 * DRAW_SLOT_SIZE;

    let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Goo Transform Buffer"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let neighbor_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Goo Neighbor Buffer"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Goo Draw Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &transform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_SLOT_SIZE),
                }),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &neighbor_buffer,
                    offset: 0,
                    size: NonZeroU64::new(DRAW_SLOT_SIZE),
                }),
            },
        ],
    });

    (transform_buffer, neighbor_buffer, bind_group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::NEIGHBOR_CAPACITY;

    #[test]
    fn test_slot_layout_matches_buffer_stride() {
        assert_eq!(std::mem::size_of::<DrawUniforms>() as u64, DRAW_SLOT_SIZE);
        assert_eq!(std::mem::size_of::<NeighborData>() as u64, DRAW_SLOT_SIZE);
        assert_eq!(NEIGHBOR_CAPACITY * 16, DRAW_SLOT_SIZE as usize);
        // Dynamic offsets must stay aligned to 256 bytes.
        assert_eq!(DRAW_SLOT_SIZE % 256, 0);
    }

    #[test]
    fn test_draw_uniforms_composition() {
        use glam::{Mat4, Vec3, Vec4};

        let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let proj = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let u = DrawUniforms::new(world, view, proj);

        let wv = Mat4::from_cols_array_2d(&u.world_view);
        let origin = wv * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin - Vec4::new(1.0, 2.0, -7.0, 1.0)).length() < 1e-5);

        let wvp = Mat4::from_cols_array_2d(&u.world_view_proj);
        let expected = proj * view * world;
        assert!((wvp.col(3) - expected.col(3)).length() < 1e-5);
    }
}
