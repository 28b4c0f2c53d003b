//! Scene data loaded from the JSON document.
//!
//! The document is an object whose keys each name one triangle. Two entry
//! shapes are accepted: a corner form with a 9-number `position` array and
//! a 4-number `color` array, and a centered form with a 3-number `center`,
//! a 4-number `color` and a scalar `size`.

use std::sync::Arc;

use glam::{Vec3, Vec4, vec3};
use glow::HasContext;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::abs::{Mesh, Vertex};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTriangle {
    Corners {
        position: [f32; 9],
        color: [f32; 4],
    },
    Centered {
        center: [f32; 3],
        color: [f32; 4],
        size: f32,
    },
}

/// One triangle of the scene: three corners and a flat RGBA color.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub color: Vec4,
}

impl From<RawTriangle> for Triangle {
    fn from(raw: RawTriangle) -> Self {
        match raw {
            RawTriangle::Corners { position: p, color } => Triangle {
                vertices: [
                    vec3(p[0], p[1], p[2]),
                    vec3(p[3], p[4], p[5]),
                    vec3(p[6], p[7], p[8]),
                ],
                color: Vec4::from(color),
            },
            RawTriangle::Centered { center, color, size } => {
                let center = Vec3::from(center);
                Triangle {
                    vertices: [
                        center + vec3(0.0, size, 0.0),
                        center + vec3(-size, -size, 0.0),
                        center + vec3(size, -size, 0.0),
                    ],
                    color: Vec4::from(color),
                }
            }
        }
    }
}

impl Triangle {
    /// Uploads the triangle as one interleaved mesh.
    pub fn mesh(&self, gl: &Arc<glow::Context>) -> Mesh {
        let vertices: Vec<SceneVertex> = self
            .vertices
            .iter()
            .map(|&position| SceneVertex {
                position: position.to_array(),
                color: self.color.to_array(),
            })
            .collect();
        Mesh::new(gl, &vertices, &[0, 1, 2])
    }
}

/// The triangles of the scene, in document order.
#[derive(Debug)]
pub struct Scene {
    pub triangles: Vec<Triangle>,
}

impl Scene {
    pub fn new(s: &str) -> Result<Self, String> {
        let raw: IndexMap<String, RawTriangle> =
            serde_json::from_str(s).map_err(|e| e.to_string())?;
        Ok(Scene {
            triangles: raw.into_values().map(Triangle::from).collect(),
        })
    }
}

/// Interleaved per-vertex attributes: position at byte offset 0, color at
/// byte offset 12, stride of 7 floats.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex for SceneVertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            let stride = std::mem::size_of::<SceneVertex>() as i32;

            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);

            gl.vertex_attrib_pointer_f32(
                1,
                4,
                glow::FLOAT,
                false,
                stride,
                3 * std::mem::size_of::<f32>() as i32,
            );
            gl.enable_vertex_attrib_array(1);
        }
    }
}

/// Position-only vertex used by the plain quad path.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            let stride = std::mem::size_of::<PositionVertex>() as i32;

            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);
        }
    }
}

/// A unit quad around the origin: 4 position-only vertices and 6 indices.
pub fn unit_quad(gl: &Arc<glow::Context>) -> Mesh {
    let vertices = [
        PositionVertex {
            position: [-0.5, -0.5, 0.0],
        },
        PositionVertex {
            position: [0.5, -0.5, 0.0],
        },
        PositionVertex {
            position: [0.5, 0.5, 0.0],
        },
        PositionVertex {
            position: [-0.5, 0.5, 0.0],
        },
    ];
    Mesh::new(gl, &vertices, &[0, 1, 2, 2, 3, 0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_triangle_extraction() {
        let scene = Scene::new(
            r#"{"triangle": {"position": [0, 0, 0, 1, 0, 0, 1, 1, 0], "color": [1, 0, 0, 1]}}"#,
        )
        .unwrap();
        assert_eq!(scene.triangles.len(), 1);
        let triangle = &scene.triangles[0];
        assert_eq!(triangle.vertices[0], vec3(0.0, 0.0, 0.0));
        assert_eq!(triangle.vertices[1], vec3(1.0, 0.0, 0.0));
        assert_eq!(triangle.vertices[2], vec3(1.0, 1.0, 0.0));
        assert_eq!(triangle.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_centered_triangle_extraction() {
        let scene = Scene::new(
            r#"{"small": {"center": [2, 1, -1], "color": [0, 0.5, 1, 1], "size": 0.5}}"#,
        )
        .unwrap();
        let triangle = &scene.triangles[0];
        assert_eq!(triangle.vertices[0], vec3(2.0, 1.5, -1.0));
        assert_eq!(triangle.vertices[1], vec3(1.5, 0.5, -1.0));
        assert_eq!(triangle.vertices[2], vec3(2.5, 0.5, -1.0));
        assert_eq!(triangle.color, Vec4::new(0.0, 0.5, 1.0, 1.0));
    }

    #[test]
    fn test_scene_preserves_document_order() {
        let scene = Scene::new(
            r#"{
                "b": {"center": [0, 0, 0], "color": [0, 1, 0, 1], "size": 1.0},
                "a": {"position": [0, 0, 0, 1, 0, 0, 1, 1, 0], "color": [1, 0, 0, 1]}
            }"#,
        )
        .unwrap();
        assert_eq!(scene.triangles[0].color, Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(scene.triangles[1].color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_malformed_scene_is_an_error() {
        // short position array
        assert!(Scene::new(r#"{"triangle": {"position": [0, 0], "color": [1, 0, 0, 1]}}"#).is_err());
        assert!(Scene::new("not json").is_err());
    }

    #[test]
    fn test_scene_vertex_layout() {
        assert_eq!(std::mem::size_of::<SceneVertex>(), 7 * 4);
        assert_eq!(std::mem::size_of::<PositionVertex>(), 3 * 4);
        assert_eq!(std::mem::offset_of!(SceneVertex, color), 12);
    }
}
