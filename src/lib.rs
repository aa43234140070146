//! # goofx - screen-space goo particles
//!
//! A real-time particle demo that renders a fluid-like "goo" stream by
//! feeding each particle's nearest neighbors to the fragment shader.
//!
//! Every frame, each particle finds the closest other particles by a
//! brute-force scan, uploads their view-space positions as a fixed-size
//! uniform buffer, and draws a camera-facing quad whose fragment shader
//! accumulates a metaball field from those neighbors. The result reads as
//! one connected blob instead of individual points.
//!
//! ## Quick Start
//!
//! ```ignore
//! use goofx::prelude::*;
//!
//! fn main() -> Result<(), goofx::DemoError> {
//!     GooDemo::new()
//!         .with_spawn_position(Vec3::new(-6.0, 7.5, 0.0))
//!         .with_spawner(|s| {
//!             s.spawn_rate = 6.0;
//!             s.direction = Vec3::new(1.0, 0.25, 0.0);
//!             s.speed = 7.0;
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! A [`Particle`] is a point with position, velocity and a remaining
//! lifetime. Integration applies gravity and a velocity-proportional drag
//! each tick; particles are removed the moment their lifetime runs out.
//!
//! ### Spawner
//!
//! The [`ParticleSpawner`] converts a spawn rate into discrete particle
//! creation events. Every emission parameter (position, direction, speed,
//! lifetime, the spawn rate itself) carries a jitter amount so the stream
//! never looks mechanical. All fields are public and can be tuned between
//! frames:
//!
//! ```ignore
//! system.spawner_mut().spawn_rate = 12.0;
//! system.spawner_mut().direction_jitter = 0.3;
//! ```
//!
//! ### Neighbor sets
//!
//! [`ParticleSystem::render`] recomputes each particle's
//! [`NEIGHBOR_CAPACITY`]-slot neighbor set against the full live
//! collection, O(n·k) per particle. The set is a render-time cache only:
//! it is rebuilt from scratch every frame and never feeds back into the
//! physics. The scan uses farthest-slot replacement and, by default,
//! lets a particle count itself as a neighbor — see [`NeighborPolicy`]
//! for the switch.
//!
//! | Type | Role |
//! |------|------|
//! | [`Particle`] | integration + per-frame neighbor set |
//! | [`ParticleSpawner`] | timed, jittered emission |
//! | [`ParticleSystem`] | owns the collection, drives update/render |
//! | [`scene::SceneNode`] | goo system or static mesh, one draw path each |
//! | [`GooDemo`] | window + camera + frame loop builder |
//!
//! ## Determinism
//!
//! Spawn jitter comes from a [`RandomSource`] owned by the spawner.
//! The default draws from a process-entropy-seeded generator; tests can
//! inject a [`SequenceRandom`] to replay exact spawn sequences.

mod app;
mod error;
pub mod gpu;
pub mod input;
pub mod mesh;
mod particle;
mod random;
pub mod scene;
pub mod shader;
mod spawner;
mod system;
pub mod time;

pub use app::GooDemo;
pub use bytemuck;
pub use error::{DemoError, GpuError, RenderError, ShaderError};
pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use particle::{
    NeighborData, NeighborPolicy, Particle, DRAG_COEFFICIENT, GRAVITY, NEIGHBOR_CAPACITY,
};
pub use random::{EntropyRandom, RandomSource, SequenceRandom};
pub use spawner::ParticleSpawner;
pub use system::ParticleSystem;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use goofx::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::GooDemo;
    pub use crate::gpu::Camera;
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::mesh::StaticMesh;
    pub use crate::particle::{NeighborPolicy, Particle, NEIGHBOR_CAPACITY};
    pub use crate::random::{EntropyRandom, RandomSource, SequenceRandom};
    pub use crate::scene::{PointLight, Scene, SceneNode};
    pub use crate::spawner::ParticleSpawner;
    pub use crate::system::ParticleSystem;
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3, Vec4};
}
