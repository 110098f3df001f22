// trs-inspect: per-frame decomposition demo

use std::error::Error;
use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use trs_inspect::config::Config;
use trs_inspect::frame;
use trs_inspect::renderer::{Renderer, MODEL_MATRIX_PARAM};
use trs_inspect::scene::{Scene, SceneObject};
use trs_inspect::Transform;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    log::info!("Starting with {config:?}");

    // Translate(1, 2, 3) * RotateY(90°) * Scale(2, 1, 1), plus a renderer-less mirror image
    let transform = Transform::new(
        Vec3::new(1.0, 2.0, 3.0),
        Quat::from_rotation_y(FRAC_PI_2),
        Vec3::new(2.0, 1.0, 1.0),
    );

    let mut scene = Scene::new();
    scene.add_object(SceneObject::new("cube", transform).with_renderer(Renderer::new()));
    let mirrored = Transform {
        scale: Vec3::new(-2.0, 1.0, 1.0),
        ..transform
    };
    scene.add_object(SceneObject::new("mirror", mirrored));

    let summary = frame::run(&mut scene, &config).await;

    let model = scene
        .get_object("cube")
        .and_then(|obj| obj.renderer.as_ref())
        .and_then(|renderer| renderer.matrix(MODEL_MATRIX_PARAM));
    if let Some(model) = model {
        let recovered = Transform::from_matrix(&model)?;
        log::info!("Final {MODEL_MATRIX_PARAM} decomposes to {recovered:?}");
    }

    if summary.failures > 0 {
        log::warn!("{} updates failed", summary.failures);
    }

    Ok(())
}
