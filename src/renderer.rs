// Renderer module for trs-inspect
//
// There is no GPU here. A renderable is anything that accepts named matrix
// parameters; `Renderer` keeps them in a material block and stages the model
// matrix in the uniform layout a shader would read.

use std::collections::HashMap;
use std::fmt::Debug;

use glam::Mat4;
use log::trace;

/// Material parameter holding the rebuilt model matrix.
pub const MODEL_MATRIX_PARAM: &str = "MY_MATRIX_M";

/// Something that can receive matrix parameters for rendering.
pub trait MaterialSink: Debug {
    fn set_matrix(&mut self, name: &str, value: Mat4);

    /// Last value written under `name`, if any.
    fn matrix(&self, name: &str) -> Option<Mat4>;
}

/// Named matrix parameters of a material.
#[derive(Debug, Default, Clone)]
pub struct Material {
    matrices: HashMap<String, Mat4>,
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_matrix(&mut self, name: &str, value: Mat4) {
        self.matrices.insert(name.to_string(), value);
    }

    pub fn matrix(&self, name: &str) -> Option<Mat4> {
        self.matrices.get(name).copied()
    }
}

// Uniform buffer structure for the model matrix
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    model: [[f32; 4]; 4],
}

impl Uniforms {
    pub fn new() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }

    pub fn update_model(&mut self, model: Mat4) {
        self.model = model.to_cols_array_2d();
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        Self::new()
    }
}

/// A renderable with a material and staged uniforms.
#[derive(Debug, Default)]
pub struct Renderer {
    material: Material,
    uniforms: Uniforms,
    writes: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    /// Bytes that would be copied into the uniform buffer.
    pub fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    /// Number of parameter writes received so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl MaterialSink for Renderer {
    fn set_matrix(&mut self, name: &str, value: Mat4) {
        self.material.set_matrix(name, value);
        if name == MODEL_MATRIX_PARAM {
            self.uniforms.update_model(value);
            trace!("staged {} uniform bytes for {name}", self.uniform_bytes().len());
        }
        self.writes += 1;
    }

    fn matrix(&self, name: &str) -> Option<Mat4> {
        self.material.matrix(name)
    }
}
