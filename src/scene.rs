// Scene module for trs-inspect

use glam::Mat4;

use crate::math::Transform;
use crate::renderer::MaterialSink;

/// Represents an object within the 3D scene.
#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    /// Optional renderable; objects without one are still decomposed.
    pub renderer: Option<Box<dyn MaterialSink>>,
}

impl SceneObject {
    /// Creates a new scene object with a given name and transform.
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            renderer: None,
        }
    }

    /// Attaches a renderable sink to this object.
    pub fn with_renderer(mut self, renderer: impl MaterialSink + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// The object's world matrix. There is no hierarchy, so this is the
    /// local transform.
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }
}

/// Represents the entire 3D scene.
#[derive(Debug, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Creates a new, empty scene.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Adds an object to the scene.
    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Gets an immutable reference to an object by name.
    pub fn get_object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|obj| obj.name == name)
    }
}
