/// WGSL shader for instanced boxes lit by one directional light plus ambient.
pub const BOX_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    // xyz: unit vector pointing toward the light
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    // Non-uniform scale: transform the normal by the rotation only.
    let rot = mat3x3<f32>(
        normalize(instance.model_0.xyz),
        normalize(instance.model_1.xyz),
        normalize(instance.model_2.xyz),
    );

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.world_normal = normalize(rot * vertex.normal);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = max(dot(in.world_normal, uniforms.light_dir.xyz), 0.0);
    let lighting = uniforms.ambient.rgb + uniforms.light_color.rgb * diffuse;
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;
