//! Scene lighting: point and ambient lights plus their GPU packing.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::RendererError;
use crate::scene::Scene;

/// Maximum number of point lights packed into the light uniform block.
pub const MAX_POINT_LIGHTS: usize = 4;

/// A light source owned by the scene.
///
/// Lights are added once at scene-build time; no removal API exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Point {
        position: Vec3,
        color: Vec3,
        intensity: f32,
        /// World-unit radius at which the contribution attenuates to
        /// zero; `0.0` means infinite range.
        range: f32,
    },
    Ambient {
        color: Vec3,
    },
}

/// One point light as laid out in the uniform block (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct PointLightGpu {
    /// World position (xyz, w unused).
    pub position: [f32; 4],
    /// Color (RGB) and intensity (A).
    pub color_intensity: [f32; 4],
    /// x = attenuation range, yzw unused.
    pub params: [f32; 4],
}

/// Light uniform block for the geometry shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    /// Summed ambient color (RGB, A unused).
    pub ambient: [f32; 4],
    pub points: [PointLightGpu; MAX_POINT_LIGHTS],
    /// x = active point light count, yzw padding.
    pub count: [u32; 4],
}

impl Default for LightsUniform {
    fn default() -> Self {
        Self {
            ambient: [0.0; 4],
            points: [PointLightGpu::default(); MAX_POINT_LIGHTS],
            count: [0; 4],
        }
    }
}

/// Packs the scene's light list into the uniform block.
///
/// Ambient contributions are summed; point lights are taken in
/// insertion order up to [`MAX_POINT_LIGHTS`].
pub fn pack_lights(lights: &[Light]) -> LightsUniform {
    let mut uniform = LightsUniform::default();
    let mut point_count = 0usize;

    for light in lights {
        match light {
            Light::Ambient { color } => {
                uniform.ambient[0] += color.x;
                uniform.ambient[1] += color.y;
                uniform.ambient[2] += color.z;
            }
            Light::Point {
                position,
                color,
                intensity,
                range,
            } => {
                if point_count >= MAX_POINT_LIGHTS {
                    continue;
                }
                uniform.points[point_count] = PointLightGpu {
                    position: [position.x, position.y, position.z, 1.0],
                    color_intensity: [color.x, color.y, color.z, *intensity],
                    params: [*range, 0.0, 0.0, 0.0],
                };
                point_count += 1;
            }
        }
    }

    uniform.count[0] = point_count as u32;
    uniform
}

/// Adds lights to a scene's light collection.
///
/// Both operations are pure additions; the rig holds no state of its
/// own.
pub struct LightRig;

impl LightRig {
    /// Adds a point light to the scene.
    ///
    /// Fails with [`RendererError::LightCapacity`] once the uniform
    /// block's point light slots are exhausted.
    pub fn add_point_light(
        scene: &mut Scene,
        position: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
    ) -> Result<(), RendererError> {
        if scene.point_light_count() >= MAX_POINT_LIGHTS {
            return Err(RendererError::LightCapacity(MAX_POINT_LIGHTS));
        }
        scene.add_light(Light::Point {
            position,
            color,
            intensity,
            range,
        });
        Ok(())
    }

    /// Adds a flat ambient fill light to the scene.
    pub fn add_ambient_light(scene: &mut Scene, color: Vec3) {
        scene.add_light(Light::Ambient { color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pack_sums_ambient_and_orders_points() {
        let lights = vec![
            Light::Ambient {
                color: Vec3::splat(0.25),
            },
            Light::Point {
                position: Vec3::new(0.0, 5.0, 0.0),
                color: Vec3::new(1.0, 0.0, 0.0),
                intensity: 2.0,
                range: 100.0,
            },
            Light::Ambient {
                color: Vec3::splat(0.1),
            },
        ];

        let uniform = pack_lights(&lights);
        assert_eq!(uniform.count[0], 1);
        assert_relative_eq!(uniform.ambient[0], 0.35);
        assert_eq!(uniform.points[0].position, [0.0, 5.0, 0.0, 1.0]);
        assert_eq!(uniform.points[0].color_intensity, [1.0, 0.0, 0.0, 2.0]);
        assert_eq!(uniform.points[0].params[0], 100.0);
    }

    #[test]
    fn pack_drops_points_beyond_capacity() {
        let lights: Vec<Light> = (0..MAX_POINT_LIGHTS + 2)
            .map(|i| Light::Point {
                position: Vec3::new(i as f32, 0.0, 0.0),
                color: Vec3::ONE,
                intensity: 1.0,
                range: 10.0,
            })
            .collect();

        let uniform = pack_lights(&lights);
        assert_eq!(uniform.count[0], MAX_POINT_LIGHTS as u32);
    }

    #[test]
    fn rig_rejects_lights_beyond_capacity() {
        let mut scene = Scene::new();
        for _ in 0..MAX_POINT_LIGHTS {
            LightRig::add_point_light(&mut scene, Vec3::ZERO, Vec3::ONE, 1.0, 10.0).unwrap();
        }
        let err = LightRig::add_point_light(&mut scene, Vec3::ZERO, Vec3::ONE, 1.0, 10.0)
            .unwrap_err();
        assert!(matches!(err, RendererError::LightCapacity(_)));
    }

    #[test]
    fn rig_adds_ambient_without_limit() {
        let mut scene = Scene::new();
        LightRig::add_ambient_light(&mut scene, Vec3::splat(0.25));
        LightRig::add_ambient_light(&mut scene, Vec3::splat(0.25));
        assert_eq!(scene.light_count(), 2);
    }

    #[test]
    fn uniform_block_size_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
    }
}
