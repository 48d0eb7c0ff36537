//! GLSL sources for the text pipeline.

/// Vertex stage: `vec4(x, y, u, v)` at attribute 0, `projection` uniform.
pub const TEXT_VERTEX: &str = include_str!("text.vert");

/// Fragment stage: `text` coverage sampler tinted by `textColor`.
pub const TEXT_FRAGMENT: &str = include_str!("text.frag");

pub const UNIFORM_PROJECTION: &str = "projection";
pub const UNIFORM_SAMPLER: &str = "text";
pub const UNIFORM_COLOR: &str = "textColor";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_declare_their_uniforms() {
        assert!(TEXT_VERTEX.starts_with("#version 330"));
        assert!(TEXT_VERTEX.contains(&format!("uniform mat4 {};", UNIFORM_PROJECTION)));
        assert!(TEXT_FRAGMENT.contains(&format!("uniform sampler2D {};", UNIFORM_SAMPLER)));
        assert!(TEXT_FRAGMENT.contains(&format!("uniform vec3 {};", UNIFORM_COLOR)));
    }
}
