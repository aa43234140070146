//! Scene graph: the renderables drawn each frame.
//!
//! A renderable is either a goo particle system or a static mesh — a
//! closed set, so a tagged variant rather than a trait object.

use glam::Vec3;

use crate::error::{RenderError, ShaderError};
use crate::gpu::RenderContext;
use crate::mesh::StaticMesh;
use crate::system::ParticleSystem;

/// A point light shared by every lit mesh in the scene.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(7.0, 2.0, -5.0),
            color: Vec3::new(1.0, 1.0, 0.7),
            intensity: 10.0,
        }
    }
}

/// One renderable in the scene.
pub enum SceneNode {
    Goo(ParticleSystem),
    Mesh(StaticMesh),
}

impl SceneNode {
    /// Advance per-frame state. Meshes are static; only goo simulates.
    pub fn update(&mut self, delta_time: f32) {
        match self {
            SceneNode::Goo(system) => system.update(delta_time),
            SceneNode::Mesh(_) => {}
        }
    }

    /// Record this node's draws into the frame.
    pub fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        match self {
            SceneNode::Goo(system) => system.render(ctx),
            SceneNode::Mesh(mesh) => mesh.render(ctx),
        }
    }

    /// Swap this node's shader, whatever kind it is.
    pub fn set_shader(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<(), ShaderError> {
        match self {
            SceneNode::Goo(system) => system.set_shader(device, format, source),
            SceneNode::Mesh(mesh) => mesh.set_shader(device, format, source),
        }
    }
}

/// Render order follows insertion order; put translucent goo after the
/// opaque meshes.
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub light: PointLight,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            light: PointLight::default(),
        }
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    /// Every goo system in the scene, for live tuning.
    pub fn goo_systems_mut(&mut self) -> impl Iterator<Item = &mut ParticleSystem> {
        self.nodes.iter_mut().filter_map(|node| match node {
            SceneNode::Goo(system) => Some(system),
            SceneNode::Mesh(_) => None,
        })
    }

    pub fn update(&mut self, delta_time: f32) {
        for node in &mut self.nodes {
            node.update(delta_time);
        }
    }

    /// Render all nodes, stopping at the first failure. The frame stays
    /// incomplete; the next update proceeds normally.
    pub fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        for node in &mut self.nodes {
            node.render(ctx)?;
        }
        Ok(())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    #[test]
    fn test_scene_update_reaches_goo_nodes() {
        let mut scene = Scene::new();
        let mut system =
            ParticleSystem::with_random(Vec3::ZERO, Box::new(SequenceRandom::midpoint()));
        system.spawner_mut().lifetime = 10.0;
        scene.push(SceneNode::Goo(system));

        scene.update(0.1);

        let count: usize = scene
            .goo_systems_mut()
            .map(|s| s.particles().len())
            .sum();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_default_light_matches_demo_scene() {
        let light = PointLight::default();
        assert_eq!(light.position, Vec3::new(7.0, 2.0, -5.0));
        assert!(light.intensity > 0.0);
    }
}
