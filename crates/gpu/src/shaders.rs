//! WGSL sources for the two pipelines.
//!
//! `PANE_SHADER` re-implements `foundation::curve` and `crate::eval` in `f32`. Attribute
//! locations follow `crate::packing`.

/// Line-list paths. Group 0 is the camera, group 1 the dash material.
pub const PATH_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct PathUniforms {
    dash_size: f32,
    gap_size: f32,
    dashed: f32,
    opacity: f32,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> material: PathUniforms;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) arc: f32,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) arc: f32,
) -> VsOut {
    return VsOut(camera.view_proj * vec4<f32>(position, 1.0), color, arc);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    if (material.dashed > 0.5) {
        let cycle = material.dash_size + material.gap_size;
        if (in.arc - cycle * floor(in.arc / cycle) > material.dash_size) {
            discard;
        }
    }
    return vec4<f32>(in.color, material.opacity);
}
"#;

/// Instanced panes. Group 0 is the camera, group 1 the frame uniforms and the atlas.
pub const PANE_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

struct PaneUniforms {
    global_time: f32,
    return_enabled: f32,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> pane_frame: PaneUniforms;

@group(1) @binding(1)
var atlas_texture: texture_2d<f32>;

@group(1) @binding(2)
var atlas_sampler: sampler;

const MIN_KNOT_INTERVAL: f32 = 1e-4;
const DEGENERATE: f32 = 1e-8;

struct PaneIn {
    @location(0) corner: vec2<f32>,
    @location(1) control_a: vec4<f32>,
    @location(2) control_b: vec4<f32>,
    @location(3) control_c: vec4<f32>,
    @location(4) color: vec3<f32>,
    @location(5) scale: f32,
    @location(6) elevation: f32,
    @location(7) uv_rect: vec4<f32>,
    // phase, speed, tilt, visible
    @location(8) animation: vec4<f32>,
};

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
};

struct Segment {
    c0: vec3<f32>,
    c1: vec3<f32>,
    c2: vec3<f32>,
    c3: vec3<f32>,
};

fn knot(a: vec3<f32>, b: vec3<f32>) -> f32 {
    let d = b - a;
    return sqrt(sqrt(dot(d, d)));
}

fn centripetal(p0: vec3<f32>, p1: vec3<f32>, p2: vec3<f32>, p3: vec3<f32>) -> Segment {
    var dt0 = knot(p0, p1);
    var dt1 = knot(p1, p2);
    var dt2 = knot(p2, p3);
    if (dt1 < MIN_KNOT_INTERVAL) {
        dt1 = 1.0;
    }
    if (dt0 < MIN_KNOT_INTERVAL) {
        dt0 = dt1;
    }
    if (dt2 < MIN_KNOT_INTERVAL) {
        dt2 = dt1;
    }
    let m1 = ((p1 - p0) * (1.0 / dt0) - (p2 - p0) * (1.0 / (dt0 + dt1)) + (p2 - p1) * (1.0 / dt1)) * dt1;
    let m2 = ((p2 - p1) * (1.0 / dt1) - (p3 - p1) * (1.0 / (dt1 + dt2)) + (p3 - p2) * (1.0 / dt2)) * dt1;
    return Segment(
        p1,
        m1,
        p1 * -3.0 + p2 * 3.0 - m1 * 2.0 - m2,
        p1 * 2.0 - p2 * 2.0 + m1 + m2,
    );
}

struct CurvePoint {
    point: vec3<f32>,
    tangent: vec3<f32>,
};

fn eval_curve(p: array<vec3<f32>, 4>, t: f32) -> CurvePoint {
    // Dynamic indexing needs a var.
    var pts = p;
    let s = 3.0 * clamp(t, 0.0, 1.0);
    var i = i32(floor(s));
    var w = s - f32(i);
    if (i >= 3) {
        i = 2;
        w = 1.0;
    }
    let p1 = pts[i];
    let p2 = pts[i + 1];
    var p0 = p1 * 2.0 - p2;
    if (i > 0) {
        p0 = pts[i - 1];
    }
    var p3 = p2 * 2.0 - p1;
    if (i < 2) {
        p3 = pts[i + 2];
    }
    let seg = centripetal(p0, p1, p2, p3);
    let point = seg.c0 + seg.c1 * w + seg.c2 * (w * w) + seg.c3 * (w * w * w);
    let d = seg.c1 + seg.c2 * (2.0 * w) + seg.c3 * (3.0 * w * w);
    return CurvePoint(point, d * 3.0);
}

fn try_normalize(v: vec3<f32>, fallback: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if (len <= DEGENERATE) {
        return fallback;
    }
    return v / len;
}

fn any_perpendicular(v: vec3<f32>) -> vec3<f32> {
    let a = cross(v, vec3<f32>(0.0, 1.0, 0.0));
    if (length(a) > DEGENERATE) {
        return normalize(a);
    }
    return try_normalize(cross(v, vec3<f32>(1.0, 0.0, 0.0)), vec3<f32>(0.0, 0.0, 1.0));
}

fn orthogonal_to(v: vec3<f32>, axis: vec3<f32>) -> vec3<f32> {
    let r = v - axis * dot(v, axis);
    if (length(r) <= DEGENERATE) {
        return any_perpendicular(axis);
    }
    return normalize(r);
}

fn wrap(x: f32, period: f32) -> f32 {
    return x - period * floor(x / period);
}

@vertex
fn vs_main(in: PaneIn) -> VsOut {
    var result: VsOut;
    result.uv = vec2<f32>(0.0);
    result.color = in.color;
    if (in.animation.w < 0.5) {
        // Outside the clip volume.
        result.pos = vec4<f32>(0.0, 0.0, 2.0, 1.0);
        return result;
    }

    let round_trip = pane_frame.return_enabled > 0.5;
    let period = select(1.0, 2.0, round_trip);
    let cycle = wrap(pane_frame.global_time * in.animation.y + in.animation.x, period);
    var t = clamp(cycle, 0.0, 1.0);
    let returning = round_trip && cycle > 1.0;
    if (returning) {
        t = clamp(2.0 - cycle, 0.0, 1.0);
    }

    let a = in.control_a;
    let b = in.control_b;
    let c = in.control_c;
    let points = array<vec3<f32>, 4>(a.xyz, vec3<f32>(a.w, b.x, b.y), vec3<f32>(b.z, b.w, c.x), c.yzw);
    let curve = eval_curve(points, t);

    let radial = try_normalize(curve.point, vec3<f32>(0.0, 1.0, 0.0));
    let position = curve.point + radial * in.elevation;
    var forward = curve.tangent;
    if (length(forward) <= DEGENERATE) {
        forward = any_perpendicular(radial);
    } else {
        forward = normalize(forward);
    }
    if (returning) {
        forward = -forward;
    }

    var normal = forward;
    var tangent = orthogonal_to(radial, forward);
    if (in.animation.z > 0.5) {
        normal = radial;
        tangent = orthogonal_to(forward, radial);
    }
    let bitangent = cross(normal, tangent);

    let world = position + (bitangent * in.corner.x + tangent * in.corner.y) * in.scale;
    result.pos = camera.view_proj * vec4<f32>(world, 1.0);

    // Rect is bottom-left origin; texture space is top-left.
    let corner_uv = in.corner + vec2<f32>(0.5);
    let uv = in.uv_rect.xy + corner_uv * in.uv_rect.zw;
    result.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return result;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let texel = textureSample(atlas_texture, atlas_sampler, in.uv);
    if (texel.a < 0.01) {
        discard;
    }
    return vec4<f32>(texel.rgb * in.color, texel.a);
}
"#;
