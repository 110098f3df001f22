// Per-frame driver for trs-inspect

use glam::{Mat4, Quat};
use log::{debug, error, info};
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::error::DecomposeResult;
use crate::math::{
    extract_translation_with, rotation_from_orientation, Decomposition, TranslationMethod, Transform,
};
use crate::renderer::MODEL_MATRIX_PARAM;
use crate::scene::{Scene, SceneObject};

/// What one object's update produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub object: String,
    pub decomposition: Decomposition,
    /// `T * R * S` rebuilt from the decomposition
    pub rebuilt: Mat4,
    /// Largest element-wise difference between `rebuilt` and the world matrix
    pub round_trip_error: f32,
    /// Largest element-wise difference between the two rotation methods
    pub rotation_methods_error: f32,
    pub sink_written: bool,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u32,
    pub updates: usize,
    pub failures: usize,
    pub max_round_trip_error: f32,
}

impl RunSummary {
    fn record(&mut self, attempted: usize, reports: &[FrameReport]) {
        self.frames += 1;
        self.updates += reports.len();
        self.failures += attempted - reports.len();
        for report in reports {
            self.max_round_trip_error = self.max_round_trip_error.max(report.round_trip_error);
        }
    }
}

/// Largest absolute difference between matching elements.
pub fn round_trip_error(a: &Mat4, b: &Mat4) -> f32 {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// Decomposes an object's world matrix, rebuilds it, and hands the result to
/// the object's renderer if it has one.
pub fn update(object: &mut SceneObject) -> DecomposeResult<FrameReport> {
    let world = object.world_matrix();
    let decomposition = Decomposition::from_matrix(&world)?;

    for method in TranslationMethod::ALL {
        debug!(
            "{}: translation via {method:?} = {}",
            object.name,
            extract_translation_with(&world, method)
        );
    }

    info!("{}: position = {}", object.name, decomposition.translation);
    info!("{}: lossy scale = {}", object.name, decomposition.scale);

    let via_orientation = rotation_from_orientation(&world, decomposition.scale)?;
    let rotation_methods_error = round_trip_error(&via_orientation, &decomposition.rotation);

    let rebuilt = decomposition.recompose();
    let round_trip = round_trip_error(&rebuilt, &world);
    debug!(
        "{}: round trip error {round_trip:e}, rotation methods differ by {rotation_methods_error:e}",
        object.name
    );

    let sink_written = match object.renderer.as_mut() {
        Some(renderer) => {
            renderer.set_matrix(MODEL_MATRIX_PARAM, rebuilt);
            true
        }
        None => {
            debug!("{}: no renderer, skipping {MODEL_MATRIX_PARAM}", object.name);
            false
        }
    };

    Ok(FrameReport {
        object: object.name.clone(),
        decomposition,
        rebuilt,
        round_trip_error: round_trip,
        rotation_methods_error,
        sink_written,
    })
}

/// Updates every object in the scene. Objects that fail to decompose are
/// logged and left out of the result.
pub fn update_scene(scene: &mut Scene) -> Vec<FrameReport> {
    scene
        .objects
        .iter_mut()
        .filter_map(|object| match update(object) {
            Ok(report) => Some(report),
            Err(err) => {
                error!("{}: {err}", object.name);
                None
            }
        })
        .collect()
}

/// Spins transforms around Y at a fixed angular speed.
#[derive(Debug, Clone)]
pub struct FrameClock {
    angular_speed: f32,
    frame: u64,
}

impl FrameClock {
    pub fn new(angular_speed: f32) -> Self {
        Self {
            angular_speed,
            frame: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances one tick of `dt` seconds.
    pub fn advance(&mut self, transform: &mut Transform, dt: f32) {
        let step = Quat::from_rotation_y(self.angular_speed * dt);
        transform.rotation = (step * transform.rotation).normalize();
    }

    fn tick(&mut self) {
        self.frame += 1;
    }
}

/// Drives the scene for `config.frames` ticks.
pub async fn run(scene: &mut Scene, config: &Config) -> RunSummary {
    let mut ticker = interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let dt = config.tick.as_secs_f32();
    let mut clock = FrameClock::new(config.angular_speed);
    let mut summary = RunSummary::default();

    for _ in 0..config.frames {
        ticker.tick().await;
        debug!("frame {}", clock.frame());

        for object in scene.objects.iter_mut() {
            clock.advance(&mut object.transform, dt);
        }
        clock.tick();

        let reports = update_scene(scene);
        summary.record(scene.objects.len(), &reports);
    }

    info!(
        "Ran {} frames: {} updates, {} failures, max round trip error {:e}",
        summary.frames, summary.updates, summary.failures, summary.max_round_trip_error
    );
    summary
}
