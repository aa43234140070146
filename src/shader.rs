//! Built-in WGSL shader sources.
//!
//! Both renderable kinds ship a default shader; either can be swapped at
//! runtime through `set_shader` with any WGSL using the same bind group
//! layout.

/// Goo particle shader.
///
/// The vertex stage expands each draw into a camera-facing quad around
/// the particle's view-space position. The fragment stage accumulates a
/// metaball field from the 32 view-space neighbor slots (`w` masks empty
/// slots) and shades by field strength, which is what fuses the particle
/// quads into one connected goo surface on screen.
pub const GOO_SHADER: &str = r#"
const NEIGHBOR_CAPACITY: u32 = 32u;
const PARTICLE_RADIUS: f32 = 0.45;

struct DrawUniforms {
    world: mat4x4<f32>,
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    world_view: mat4x4<f32>,
    world_view_proj: mat4x4<f32>,
    inverse_world: mat4x4<f32>,
    inverse_view: mat4x4<f32>,
    inverse_proj: mat4x4<f32>,
};

struct NeighborData {
    positions: array<vec4<f32>, 32>,
};

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(0) @binding(1)
var<uniform> nearby: NeighborData;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) view_pos: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var quad = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad[vertex_index];

    let center = (draw.world_view * vec4<f32>(0.0, 0.0, 0.0, 1.0)).xyz;
    let view_pos = center + vec3<f32>(corner * PARTICLE_RADIUS, 0.0);

    var out: VertexOutput;
    out.clip_position = draw.proj * vec4<f32>(view_pos, 1.0);
    out.view_pos = view_pos;
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var field = 0.0;
    for (var i = 0u; i < NEIGHBOR_CAPACITY; i = i + 1u) {
        let neighbor = nearby.positions[i];
        let offset = in.view_pos - neighbor.xyz;
        // w is 1 for filled slots, 0 for empty ones.
        field = field + neighbor.w * 0.02 / (dot(offset, offset) + 1e-4);
    }

    let strength = smoothstep(0.35, 1.6, field);
    if strength < 0.05 {
        discard;
    }

    let deep = vec3<f32>(0.0, 0.3, 1.0);
    let bright = vec3<f32>(0.55, 0.85, 1.0);
    let color = mix(deep, bright, strength);
    let rim = 1.0 - smoothstep(0.6, 1.0, length(in.uv));
    return vec4<f32>(color, strength * rim);
}
"#;

/// Flat-color point-light shader for static meshes.
pub const MESH_SHADER: &str = r#"
struct MeshUniforms {
    world: mat4x4<f32>,
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    base_color: vec4<f32>,
    camera_position: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: MeshUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world_pos = u.world * vec4<f32>(in.position, 1.0);

    var out: VertexOutput;
    out.clip_position = u.proj * u.view * world_pos;
    out.world_pos = world_pos.xyz;
    out.normal = (u.world * vec4<f32>(in.normal, 0.0)).xyz;
    out.color = in.color * u.base_color.rgb;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let to_light = u.light_position.xyz - in.world_pos;
    let dist = length(to_light);
    let l = to_light / max(dist, 1e-3);
    let attenuation = u.light_position.w / (1.0 + 0.05 * dist * dist);

    let ambient = 0.15;
    let diffuse = max(dot(n, l), 0.0);

    let v = normalize(u.camera_position.xyz - in.world_pos);
    let h = normalize(l + v);
    let specular = pow(max(dot(n, h), 0.0), 32.0) * 0.4;

    let lit = ambient + (diffuse + specular) * attenuation;
    return vec4<f32>(in.color * u.light_color.rgb * lit, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(source: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_goo_shader_validates() {
        validate_wgsl(GOO_SHADER).expect("goo shader should be valid WGSL");
    }

    #[test]
    fn test_mesh_shader_validates() {
        validate_wgsl(MESH_SHADER).expect("mesh shader should be valid WGSL");
    }
}
