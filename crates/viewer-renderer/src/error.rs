//! Error types for the viewer renderer.

use thiserror::Error;

/// Errors surfaced by the render engine and its components.
///
/// Configuration errors (unknown uniforms, attribute mismatches,
/// exceeded light capacity) fail synchronously at the call that
/// introduced them. Allocation errors from `attach`/`resize` are fatal
/// and propagate to the caller. Asynchronous texture failures are
/// reported through the event bus instead and never appear here.
#[derive(Debug, Error)]
pub enum RendererError {
    /// The engine has been disposed; no further calls are valid.
    #[error("engine has been disposed")]
    Disposed,

    /// A GPU-dependent call was made before `attach`.
    #[error("engine is not attached to a surface")]
    NotAttached,

    /// GPU resource allocation failed during attach or resize.
    #[error("gpu resource allocation failed: {0}")]
    Allocation(String),

    /// A uniform name was set that the uniform set never declared.
    #[error("unknown uniform `{0}`")]
    UnknownUniform(String),

    /// A uniform was set with a value of the wrong semantic type.
    #[error("uniform `{name}` expects {expected}, got {actual}")]
    UniformTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A shader program does not declare exactly the attributes its
    /// geometry buffers provide.
    #[error("shader `{shader}` attribute set does not match mesh attributes: {detail}")]
    AttributeMismatch { shader: String, detail: String },

    /// The requested primitive shape has no implementation yet.
    #[error("shape `{0}` is not implemented")]
    UnimplementedShape(&'static str),

    /// The scene's point light capacity was exceeded.
    #[error("point light capacity of {0} exceeded")]
    LightCapacity(usize),

    /// A drawable referenced a mesh handle that was never uploaded.
    #[error("unknown mesh handle {0}")]
    UnknownMesh(u64),

    /// A drawable referenced a material handle the cache does not know.
    #[error("unknown material handle {0}")]
    UnknownMaterial(u64),

    /// A drawable referenced a shader program handle that was never
    /// registered.
    #[error("unknown shader program handle {0}")]
    UnknownProgram(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_offender() {
        let err = RendererError::UnknownUniform("u_wobble".into());
        assert_eq!(err.to_string(), "unknown uniform `u_wobble`");

        let err = RendererError::UniformTypeMismatch {
            name: "u_time".into(),
            expected: "scalar",
            actual: "vec2",
        };
        assert!(err.to_string().contains("u_time"));
        assert!(err.to_string().contains("scalar"));
    }
}
