//! A single goo particle: physics state plus its per-frame neighbor set.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Number of neighbor slots uploaded to the fragment shader per particle.
pub const NEIGHBOR_CAPACITY: usize = 32;

/// Proportionality constant converting velocity into a decelerating force.
pub const DRAG_COEFFICIENT: f32 = 0.1;

/// World-space gravity applied to every particle.
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Shader-visible neighbor buffer: one `vec4` per slot.
///
/// Filled slots hold a position with `w = 1`; empty slots stay zeroed, so
/// the shader can use `w` as a mask. After [`Particle::recompute_neighbors`]
/// the stored positions are in view space.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct NeighborData {
    pub positions: [[f32; 4]; NEIGHBOR_CAPACITY],
}

impl NeighborData {
    fn slot_distance_sq(&self, slot: usize, from: Vec3) -> f32 {
        let p = self.positions[slot];
        from.distance_squared(Vec3::new(p[0], p[1], p[2]))
    }
}

impl Default for NeighborData {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Whether a particle's own position may occupy one of its neighbor slots.
///
/// The default scan does not skip the particle itself, so every
/// particle's nearest "neighbor" is its own position. That quirk is part
/// of the shipped look; [`NeighborPolicy::ExcludeSelf`] is the corrected
/// scan for anyone who wants true neighbors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeighborPolicy {
    /// The particle itself is a valid neighbor.
    #[default]
    IncludeSelf,
    /// Skip the particle's own entry during the scan.
    ExcludeSelf,
}

/// One simulated goo droplet.
///
/// Owned exclusively by a [`crate::ParticleSystem`]; created by its
/// spawner and dropped the moment its lifetime reaches zero.
#[derive(Clone)]
pub struct Particle {
    position: Vec3,
    velocity: Vec3,
    time_to_live: f32,
    neighbors: NeighborData,
    neighbor_count: usize,
}

impl Particle {
    pub fn new(position: Vec3, velocity: Vec3, time_to_live: f32) -> Self {
        Self {
            position,
            velocity,
            time_to_live,
            neighbors: NeighborData::zeroed(),
            neighbor_count: 0,
        }
    }

    /// Current world-space position.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current world-space velocity.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Remaining lifetime in seconds.
    #[inline]
    pub fn time_to_live(&self) -> f32 {
        self.time_to_live
    }

    /// Number of filled neighbor slots after the last recompute.
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbor_count
    }

    /// The neighbor buffer as uploaded to the shader.
    #[inline]
    pub fn neighbors(&self) -> &NeighborData {
        &self.neighbors
    }

    /// Advance physics by one tick.
    ///
    /// Drag is computed from the velocity at tick entry, so a particle at
    /// rest feels gravity only.
    pub fn integrate(&mut self, delta_time: f32) {
        let drag = self.velocity * DRAG_COEFFICIENT;
        self.velocity += GRAVITY * delta_time;
        self.velocity -= drag * delta_time;
        self.position += self.velocity * delta_time;
        self.time_to_live -= delta_time;
    }

    /// Rebuild the neighbor set from a position snapshot of the whole
    /// collection, then transform the stored positions into view space.
    ///
    /// The first [`NEIGHBOR_CAPACITY`] scanned positions seed the slots in
    /// iteration order. Every later candidate replaces the farthest slot
    /// (lowest index on ties) if it is strictly closer. O(n·k) per call.
    ///
    /// `self_index` is this particle's index into `positions`; whether it
    /// participates in the scan is decided by `policy`.
    pub fn recompute_neighbors(
        &mut self,
        positions: &[Vec3],
        self_index: usize,
        view: Mat4,
        policy: NeighborPolicy,
    ) {
        self.neighbors = NeighborData::zeroed();
        let own = self.position;
        let mut filled = 0;

        for (i, &pos) in positions.iter().enumerate() {
            if policy == NeighborPolicy::ExcludeSelf && i == self_index {
                continue;
            }

            if filled < NEIGHBOR_CAPACITY {
                self.neighbors.positions[filled] = [pos.x, pos.y, pos.z, 1.0];
                filled += 1;
                continue;
            }

            let mut farthest = 0;
            let mut farthest_dist_sq = self.neighbors.slot_distance_sq(0, own);
            for k in 1..NEIGHBOR_CAPACITY {
                let dist_sq = self.neighbors.slot_distance_sq(k, own);
                if dist_sq > farthest_dist_sq {
                    farthest = k;
                    farthest_dist_sq = dist_sq;
                }
            }

            if own.distance_squared(pos) < farthest_dist_sq {
                self.neighbors.positions[farthest] = [pos.x, pos.y, pos.z, 1.0];
            }
        }

        self.neighbor_count = filled;

        // World space -> view space. Empty slots are all-zero and stay so.
        for slot in &mut self.neighbors.positions[..filled] {
            *slot = (view * Vec4::from_array(*slot)).to_array();
        }
    }
}
