//! Typed uniform sets.
//!
//! A [`UniformSet`] is the CPU-side source of truth for a shader
//! program's uniforms: a name → typed value map declared once at
//! program construction and mutated every frame. Setting an undeclared
//! name, or a declared name with the wrong semantic type, is a
//! configuration error surfaced at the call site.

use crate::error::RendererError;
use crate::materials::TextureHandle;

/// Reserved uniform name: elapsed seconds on every time-driven shader.
pub const U_TIME: &str = "u_time";

/// Reserved uniform name: viewport resolution, post-process shader only.
pub const U_RESOLUTION: &str = "u_resolution";

/// A uniform value with its semantic type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Scalar(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    Texture(TextureHandle),
}

impl UniformValue {
    /// Semantic type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Scalar(_) => "scalar",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat4(_) => "mat4",
            UniformValue::Texture(_) => "texture",
        }
    }
}

/// Ordered name → value map for one shader program.
#[derive(Debug, Clone, Default)]
pub struct UniformSet {
    values: Vec<(String, UniformValue)>,
}

impl UniformSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Declares a uniform at construction time.
    ///
    /// Uniform names are unique within a program; factories declare
    /// each name exactly once.
    pub fn declare(mut self, name: &str, value: UniformValue) -> Self {
        debug_assert!(
            !self.contains(name),
            "uniform `{name}` declared twice in one program"
        );
        self.values.push((name.to_string(), value));
        self
    }

    /// Updates a declared uniform.
    ///
    /// Fails with [`RendererError::UnknownUniform`] for undeclared names
    /// and [`RendererError::UniformTypeMismatch`] when the value's
    /// semantic type differs from the declared one.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), RendererError> {
        let Some(slot) = self.values.iter_mut().find(|(n, _)| n == name) else {
            return Err(RendererError::UnknownUniform(name.to_string()));
        };
        if slot.1.type_name() != value.type_name() {
            return Err(RendererError::UniformTypeMismatch {
                name: name.to_string(),
                expected: slot.1.type_name(),
                actual: value.type_name(),
            });
        }
        slot.1 = value;
        Ok(())
    }

    /// Current value of a declared uniform.
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns whether `name` was declared.
    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(n, _)| n == name)
    }

    /// Scalar accessor, `None` if absent or not a scalar.
    pub fn scalar(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    /// Texture accessor, `None` if absent or not a texture.
    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        match self.get(name) {
            Some(UniformValue::Texture(h)) => Some(*h),
            _ => None,
        }
    }

    /// Pushes elapsed seconds into the reserved [`U_TIME`] uniform.
    pub fn set_time(&mut self, seconds: f32) -> Result<(), RendererError> {
        self.set(U_TIME, UniformValue::Scalar(seconds))
    }

    /// Pushes the viewport size into the reserved [`U_RESOLUTION`] uniform.
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.set(
            U_RESOLUTION,
            UniformValue::Vec2([width as f32, height as f32]),
        )
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_driven_set() -> UniformSet {
        UniformSet::new()
            .declare(U_TIME, UniformValue::Scalar(0.0))
            .declare("u_color", UniformValue::Vec3([0.0, 1.0, 0.0]))
    }

    #[test]
    fn setting_unknown_name_is_an_error() {
        let mut set = time_driven_set();
        let err = set.set("u_wobble", UniformValue::Scalar(1.0)).unwrap_err();
        assert!(matches!(err, RendererError::UnknownUniform(name) if name == "u_wobble"));
    }

    #[test]
    fn setting_wrong_type_is_an_error() {
        let mut set = time_driven_set();
        let err = set
            .set(U_TIME, UniformValue::Vec2([1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            RendererError::UniformTypeMismatch { expected: "scalar", actual: "vec2", .. }
        ));
    }

    #[test]
    fn set_time_updates_the_reserved_uniform() {
        let mut set = time_driven_set();
        set.set_time(3.25).unwrap();
        assert_eq!(set.scalar(U_TIME), Some(3.25));
    }

    #[test]
    fn set_resolution_requires_declaration() {
        let mut set = time_driven_set();
        assert!(set.set_resolution(800, 600).is_err());

        let mut post = UniformSet::new()
            .declare(U_TIME, UniformValue::Scalar(0.0))
            .declare(U_RESOLUTION, UniformValue::Vec2([0.0, 0.0]));
        post.set_resolution(800, 600).unwrap();
        assert_eq!(
            post.get(U_RESOLUTION),
            Some(&UniformValue::Vec2([800.0, 600.0]))
        );
    }

    #[test]
    fn declaration_order_is_preserved() {
        let set = time_driven_set();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec![U_TIME, "u_color"]);
    }
}
