//! The live particle collection and its per-frame update/render cycle.

use glam::{Mat4, Vec3};

use crate::error::{RenderError, ShaderError};
use crate::gpu::{DrawUniforms, GooRenderer, RenderContext};
use crate::particle::{NeighborPolicy, Particle};
use crate::random::RandomSource;
use crate::spawner::ParticleSpawner;

/// Owns every live particle and the spawner feeding them.
///
/// The frame driver calls [`update`](Self::update) then
/// [`render`](Self::render) once per frame. Update order within a frame:
/// the spawner may append one particle, then every particle integrates
/// and expired ones are removed in the same pass — a particle whose
/// lifetime crossed zero never survives into the next frame.
///
/// Rendering requires a bound shader; see [`set_shader`](Self::set_shader).
/// Until one compiles successfully the system simulates normally but
/// every render attempt fails with [`RenderError::ShaderNotReady`].
pub struct ParticleSystem {
    particles: Vec<Particle>,
    spawner: ParticleSpawner,
    neighbor_policy: NeighborPolicy,
    renderer: Option<GooRenderer>,
}

impl ParticleSystem {
    /// Create a system spawning from `position` with entropy-seeded jitter.
    pub fn new(position: Vec3) -> Self {
        Self {
            particles: Vec::new(),
            spawner: ParticleSpawner::new(position),
            neighbor_policy: NeighborPolicy::default(),
            renderer: None,
        }
    }

    /// Create a system with an injected random source, for deterministic
    /// spawning in tests.
    pub fn with_random(position: Vec3, rng: Box<dyn RandomSource>) -> Self {
        Self {
            particles: Vec::new(),
            spawner: ParticleSpawner::with_random(position, rng),
            neighbor_policy: NeighborPolicy::default(),
            renderer: None,
        }
    }

    /// Emission configuration, readable between frames.
    pub fn spawner(&self) -> &ParticleSpawner {
        &self.spawner
    }

    /// Emission configuration, tunable between frames.
    pub fn spawner_mut(&mut self) -> &mut ParticleSpawner {
        &mut self.spawner
    }

    /// The live particles, in spawn order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn neighbor_policy(&self) -> NeighborPolicy {
        self.neighbor_policy
    }

    pub fn set_neighbor_policy(&mut self, policy: NeighborPolicy) {
        self.neighbor_policy = policy;
    }

    /// Whether a shader is currently bound.
    pub fn has_shader(&self) -> bool {
        self.renderer.is_some()
    }

    /// Advance the simulation by `delta_time` seconds.
    ///
    /// `delta_time` is used as given — zero and very large values are
    /// legal, and a large value still spawns at most one particle.
    pub fn update(&mut self, delta_time: f32) {
        if let Some(particle) = self.spawner.update(delta_time) {
            self.particles.push(particle);
        }

        self.particles.retain_mut(|particle| {
            particle.integrate(delta_time);
            particle.time_to_live() > 0.0
        });
    }

    /// Replace the goo shader, releasing the previous pipeline first.
    ///
    /// On failure the system is left with no bound shader: simulation
    /// continues, rendering fails cleanly until a later call succeeds.
    pub fn set_shader(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        source: &str,
    ) -> Result<(), ShaderError> {
        self.renderer = None;
        self.renderer = Some(GooRenderer::new(device, format, source)?);
        Ok(())
    }

    /// Recompute every particle's neighbor set against a position
    /// snapshot of the current collection, leaving the stored positions
    /// in view space.
    ///
    /// O(n²·k) — the dominant cost of the effect, acceptable for the
    /// modest particle counts the goo stream produces. Runs as part of
    /// [`render`](Self::render); exposed separately so the scan is
    /// testable without a GPU.
    pub fn refresh_neighbors(&mut self, view: Mat4) {
        let positions: Vec<Vec3> = self.particles.iter().map(Particle::position).collect();
        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle.recompute_neighbors(&positions, index, view, self.neighbor_policy);
        }
    }

    /// Draw every live particle with a freshly recomputed neighbor set.
    ///
    /// A failure aborts the remaining draws for this frame only;
    /// simulation state is untouched.
    pub fn render(&mut self, ctx: &mut RenderContext<'_>) -> Result<(), RenderError> {
        if self.renderer.is_none() {
            return Err(RenderError::ShaderNotReady);
        }

        self.refresh_neighbors(ctx.view);

        let renderer = self.renderer.as_mut().ok_or(RenderError::ShaderNotReady)?;
        renderer.ensure_capacity(ctx.device, self.particles.len())?;
        renderer.bind(ctx.pass);

        for (index, particle) in self.particles.iter().enumerate() {
            let world = Mat4::from_translation(particle.position());
            let uniforms = DrawUniforms::new(world, ctx.view, ctx.proj);
            renderer.draw(ctx.queue, ctx.pass, index, &uniforms, particle.neighbors());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    fn deterministic_system() -> ParticleSystem {
        ParticleSystem::with_random(Vec3::ZERO, Box::new(SequenceRandom::midpoint()))
    }

    #[test]
    fn test_update_spawns_then_integrates_new_particle() {
        let mut system = deterministic_system();
        system.spawner_mut().lifetime = 10.0;
        system.update(0.1);

        // The particle spawned this frame was integrated this frame.
        assert_eq!(system.particles().len(), 1);
        let p = &system.particles()[0];
        assert!((p.time_to_live() - 9.9).abs() < 1e-5);
        assert!(p.velocity().y < 10.0);
    }

    #[test]
    fn test_expired_particles_removed_same_update() {
        let mut system = deterministic_system();
        system.spawner_mut().lifetime = 0.5;
        // Push the spawn period far out so only the first update spawns.
        system.spawner_mut().spawn_rate = 0.01;
        system.update(0.1);
        assert_eq!(system.particles().len(), 1);

        system.update(0.5);
        assert!(system.particles().is_empty());
    }

    #[test]
    fn test_no_particle_survives_with_expired_lifetime() {
        let mut system = deterministic_system();
        system.spawner_mut().lifetime = 1.0;
        system.spawner_mut().spawn_rate = 5.0;

        for _ in 0..100 {
            system.update(0.05);
            for p in system.particles() {
                assert!(p.time_to_live() > 0.0);
            }
        }
    }

    #[test]
    fn test_one_update_one_spawn_even_for_huge_delta() {
        let mut system = deterministic_system();
        system.spawner_mut().spawn_rate = 1.0;
        system.spawner_mut().lifetime = 1e6;
        system.update(1000.0);
        assert_eq!(system.particles().len(), 1);
    }

    #[test]
    fn test_no_shader_bound_by_default() {
        let system = deterministic_system();
        assert!(!system.has_shader());
    }

    #[test]
    fn test_neighbor_policy_roundtrip() {
        let mut system = deterministic_system();
        assert_eq!(system.neighbor_policy(), NeighborPolicy::IncludeSelf);
        system.set_neighbor_policy(NeighborPolicy::ExcludeSelf);
        assert_eq!(system.neighbor_policy(), NeighborPolicy::ExcludeSelf);
    }
}
