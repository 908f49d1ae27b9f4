//! Scene management for renderable objects and lights.

mod drawable;

pub use drawable::*;

use uuid::Uuid;

use crate::lights::Light;

/// An ordered collection of drawables plus lights.
///
/// The scene is exclusively owned by the render engine and mutated
/// only through explicit add/remove calls; it is destroyed when the
/// engine is disposed.
pub struct Scene {
    drawables: Vec<Drawable>,
    lights: Vec<Light>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self {
            drawables: Vec::new(),
            lights: Vec::new(),
        }
    }

    /// Adds a drawable, returning its id.
    pub fn add_drawable(&mut self, drawable: Drawable) -> Uuid {
        let id = drawable.id;
        self.drawables.push(drawable);
        id
    }

    /// Removes a drawable by id.
    pub fn remove_drawable(&mut self, id: Uuid) -> Option<Drawable> {
        let pos = self.drawables.iter().position(|d| d.id == id)?;
        Some(self.drawables.remove(pos))
    }

    /// Gets a drawable by id.
    pub fn get_drawable(&self, id: Uuid) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id == id)
    }

    /// Gets a mutable drawable by id.
    pub fn get_drawable_mut(&mut self, id: Uuid) -> Option<&mut Drawable> {
        self.drawables.iter_mut().find(|d| d.id == id)
    }

    /// Drawables in insertion order.
    pub fn drawables(&self) -> impl Iterator<Item = &Drawable> {
        self.drawables.iter()
    }

    /// Mutable drawables in insertion order.
    pub fn drawables_mut(&mut self) -> impl Iterator<Item = &mut Drawable> {
        self.drawables.iter_mut()
    }

    /// Number of drawables in the scene.
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Adds a light to the scene's light collection.
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Lights in insertion order.
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Number of lights in the scene.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Number of point lights in the scene.
    pub fn point_light_count(&self) -> usize {
        self.lights
            .iter()
            .filter(|l| matches!(l, Light::Point { .. }))
            .count()
    }

    /// Pushes elapsed seconds into every time-driven drawable's
    /// reserved time uniform. Drawables whose program declares no time
    /// uniform are left untouched.
    pub fn push_time(&mut self, seconds: f32) {
        for drawable in &mut self.drawables {
            if drawable.uniforms.contains(crate::uniform::U_TIME) {
                // The name was just checked, so set_time cannot fail.
                let _ = drawable.uniforms.set_time(seconds);
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshHandle;
    use crate::pipeline::ProgramHandle;
    use crate::uniform::{U_TIME, UniformSet, UniformValue};
    use glam::Vec3;

    fn drawable(name: &str) -> Drawable {
        let uniforms = UniformSet::new().declare(U_TIME, UniformValue::Scalar(0.0));
        Drawable::new(name, MeshHandle::default(), ProgramHandle::default(), uniforms)
    }

    #[test]
    fn add_and_remove_preserve_order() {
        let mut scene = Scene::new();
        let a = scene.add_drawable(drawable("a"));
        let _b = scene.add_drawable(drawable("b"));
        let _c = scene.add_drawable(drawable("c"));

        scene.remove_drawable(a);
        let names: Vec<&str> = scene.drawables().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn remove_unknown_id_is_none() {
        let mut scene = Scene::new();
        scene.add_drawable(drawable("a"));
        assert!(scene.remove_drawable(Uuid::new_v4()).is_none());
        assert_eq!(scene.drawable_count(), 1);
    }

    #[test]
    fn push_time_reaches_every_time_driven_drawable() {
        let mut scene = Scene::new();
        scene.add_drawable(drawable("a"));
        scene.add_drawable(drawable("b"));

        scene.push_time(1.5);
        for d in scene.drawables() {
            assert_eq!(d.uniforms.scalar(U_TIME), Some(1.5));
        }
    }

    #[test]
    fn light_counts_distinguish_kinds() {
        let mut scene = Scene::new();
        scene.add_light(Light::Ambient {
            color: Vec3::splat(0.25),
        });
        scene.add_light(Light::Point {
            position: Vec3::new(0.0, 5.0, 0.0),
            color: Vec3::X,
            intensity: 2.0,
            range: 100.0,
        });

        assert_eq!(scene.light_count(), 2);
        assert_eq!(scene.point_light_count(), 1);
    }
}
