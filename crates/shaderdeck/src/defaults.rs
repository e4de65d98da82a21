//! Shaders used for a new project when the execution module does not ship
//! its own default scene.

pub const DEFAULT_FRAGMENT: &str = r#"#version 300 es
precision highp float;

uniform float u_time;
uniform vec2 u_resolution;

in vec3 v_normal;
in vec2 v_texcoord;

out vec4 fragColor;

void main() {
    vec2 st = gl_FragCoord.xy / u_resolution;
    vec3 color = vec3(st.x, st.y, abs(sin(u_time)));
    color *= 0.5 + 0.5 * dot(normalize(v_normal), vec3(0.0, 0.0, 1.0));
    fragColor = vec4(color, 1.0);
}
"#;

pub const DEFAULT_VERTEX: &str = r#"#version 300 es
precision highp float;

uniform mat4 u_modelViewProjectionMatrix;

in vec4 a_position;
in vec3 a_normal;
in vec2 a_texcoord;

out vec3 v_normal;
out vec2 v_texcoord;

void main() {
    v_normal = a_normal;
    v_texcoord = a_texcoord;
    gl_Position = u_modelViewProjectionMatrix * a_position;
}
"#;
