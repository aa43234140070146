//! Static lit meshes for the demo scene.
//!
//! Geometry is generated in code (a floor plane, a box); there is no
//! model loading here. Each mesh owns its vertex buffer, a single uniform
//! slot and optionally a pipeline built from WGSL via
//! [`set_shader`](StaticMesh::set_shader).

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use wgpu::util::DeviceExt;

use crate::error::{RenderError, ShaderError};
use crate::gpu::{RenderContext, DEPTH_FORMAT};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshUniforms {
    world: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    /// xyz = light position, w = intensity.
    light_position: [f32; 4],
    light_color: [f32; 4],
    base_color: [f32; 4],
    camera_position: [f32; 4],
}

/// A renderable mesh with a world transform and a flat base color.
pub struct StaticMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    layout: wgpu::BindGroupLayout,
    pipeline: Option<wgpu::RenderPipeline>,

    /// World position.
    pub position: Vec3,
    /// Euler rotation in degrees (yaw, pitch, roll applied Y-X-Z).
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Multiplied with the per-vertex color in the shader.
    pub color: Vec3,
}

impl StaticMesh {
    pub fn new(device: &wgpu::Device, vertices: &[MeshVertex]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Uniform Buffer"),
            size: std::mem::size_of::<MeshUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            uniform_buffer,
            bind_group,
            layout,
            pipeline: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color: Vec3::ONE,
        }
    }

    /// A horizontal floor quad of the given half-size, normals up.
    pub fn plane(half_size: f32) -> Vec<MeshVertex> {
        let h = half_size;
        let corners = [
            [-h, 0.0, -h],
            [-h, 0.0, h],
            [h, 0.0, h],
            [-h, 0.0, -h],
            [h, 0.0, h],
            [h, 0.0, -h],
        ];
        corners
            .iter()
            .map(|&position| MeshVertex {
                position,
                normal: [0.0, 1.0, 0.0],
                color: [1.0, 1.0, 1.0],
            })
            .collect()
    }

    /// An axis-aligned box with the given half extents, centered at the
    /// origin, flat normals per face.
    pub fn cuboid(half: Vec3) -> Vec<MeshVertex> {
        let (x, y, z) = (half.x, half.y, half.z);
        // (normal, four corners in fan order)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            (
                [0.0, 0.0, 1.0],
                [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]],
            ),
            (
                [0.0, 0.0, -1.0],
                [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]],
            ),
            (
                [1.0, 0.0, 0.0],
                [[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]],
            ),
            (
                [-1.0, 0.0, 0.0],
                [[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]],
            ),
            (
                [0.0, 1.0, 0.0],
                [[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]],
            ),
            (
                [0.0, -1.0, 0.0],
                [[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]],
            ),
        ];

        let mut vertices = Vec::with_capacity(36);
        for (normal, c) in faces {
            for position in [c[0], c[1], c[2], c[0], c[2], c[3]] {
                vertices.push(MeshVertex {
                    position,
                    normal,
                    color: [1.0, 1.0, 1.0],
                });
            }
        }
        vertices
    }

    pub fn world_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            self.rotation.y.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.z.to_radians(),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }

    /// Whether a shader is currently bound.
    pub fn has_shader(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Replace the mesh shader, releasing the previous pipeline first.
    pub fn set_shader(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<(), ShaderError> {
        self.pipeline = None;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&self.layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
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

        self.pipeline = Some(pipeline);
        Ok(())
    }

    /// Upload this mesh's uniforms and record its draw.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        let pipeline = self.pipeline.as_ref().ok_or(RenderError::ShaderNotReady)?;

        let uniforms = MeshUniforms {
            world: self.world_matrix().to_cols_array_2d(),
            view: ctx.view.to_cols_array_2d(),
            proj: ctx.proj.to_cols_array_2d(),
            light_position: ctx.light.position.extend(ctx.light.intensity).to_array(),
            light_color: ctx.light.color.extend(1.0).to_array(),
            base_color: self.color.extend(1.0).to_array(),
            camera_position: ctx.camera_position.extend(1.0).to_array(),
        };
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        ctx.pass.set_pipeline(pipeline);
        ctx.pass.set_bind_group(0, &self.bind_group, &[]);
        ctx.pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        ctx.pass.draw(0..self.vertex_count, 0..1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_lies_flat_with_up_normals() {
        let vertices = StaticMesh::plane(10.0);
        assert_eq!(vertices.len(), 6);
        for v in &vertices {
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_cuboid_has_six_faces() {
        let vertices = StaticMesh::cuboid(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(vertices.len(), 36);
        for v in &vertices {
            assert!(v.position[0].abs() <= 1.0);
            assert!(v.position[1].abs() <= 2.0);
            assert!(v.position[2].abs() <= 3.0);
            // Every vertex lies on the face its normal names.
            let n = v.normal;
            let along = v.position[0] * n[0] + v.position[1] * n[1] + v.position[2] * n[2];
            assert!(along > 0.0);
        }
    }

    #[test]
    fn test_vertex_stride_matches_attributes() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 36);
    }
}
