//! Headless driver: streams procedural terrain under a scripted camera and
//! reports what the LOD selector would draw each frame.

mod camera;
mod renderer;
mod source;

use std::path::PathBuf;

use clap::Parser;
use orbis_collision::ViewFrustum;
use orbis_config::{CliArgs, Config, ConfigError};
use orbis_lod::{LodSelector, LodSettings, RenderBatch};
use tracing::{error, info, warn};

use crate::camera::ScriptedCamera;
use crate::renderer::StatsRenderer;
use crate::source::ProceduralSource;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(Config::default_dir);

    let file_config = match &config_dir {
        Some(dir) => Config::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            Config::default()
        }),
        None => Config::default(),
    };
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    orbis_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(file_config, config, config_dir, &args) {
        error!("{e}");
        std::process::exit(1);
    }
}

/// `file_config` is what the config file holds; `config` adds the CLI
/// overrides. Reloads compare against the former.
fn run(
    mut file_config: Config,
    mut config: Config,
    config_dir: Option<PathBuf>,
    args: &CliArgs,
) -> Result<(), ConfigError> {
    config.validate()?;
    let settings = LodSettings::from_config(&config.terrain)?;
    info!(
        face_size = settings.face_size(),
        max_level = settings.max_level(),
        sphere_radius = settings.mapper().sphere_radius(),
        "Starting terrain LOD run"
    );

    let mut camera = ScriptedCamera::new(config.camera.clone(), config.terrain.sphere_radius);
    let mut source = ProceduralSource::new(&config.streaming, settings.clone());
    let mut selector = LodSelector::new(settings);
    let mut batch = RenderBatch::with_capacity(1024);
    let mut renderer = StatsRenderer::default();

    for frame in 0..config.camera.frames {
        if config.debug.reload_interval > 0
            && frame > 0
            && frame % config.debug.reload_interval == 0
            && let Some(dir) = &config_dir
        {
            match file_config.reload(dir) {
                Ok(Some(from_file)) => {
                    let mut reloaded = from_file.clone();
                    // Command-line values keep priority over the file.
                    reloaded.apply_cli_overrides(args);
                    match LodSettings::from_config(&reloaded.terrain) {
                        Ok(new_settings) => {
                            apply_reload(
                                &config,
                                &reloaded,
                                new_settings,
                                &mut selector,
                                &mut source,
                            );
                            camera = ScriptedCamera::new(
                                reloaded.camera.clone(),
                                reloaded.terrain.sphere_radius,
                            );
                            config = reloaded;
                        }
                        Err(e) => warn!("Ignoring reloaded config: {e}"),
                    }
                    file_config = from_file;
                }
                Ok(None) => {}
                Err(e) => warn!("Config reload failed: {e}"),
            }
        }

        let eye = camera.position(frame);
        let frustum = ViewFrustum::from_view_projection(&camera.view_projection(frame));
        let stats = selector.select_nodes(eye, &frustum, &mut source, &mut batch);
        batch.submit(&mut renderer);
        let uploaded = source.pump();

        if config.debug.stats_interval > 0 && frame % config.debug.stats_interval == 0 {
            info!(
                frame,
                altitude = camera.altitude(frame),
                selected = stats.selected,
                culled = stats.culled,
                released = stats.released,
                uploaded,
                queued = source.queued(),
                resident = source.resident(),
                nodes = selector.node_count(),
                textures = selector.resident_textures(),
                "frame"
            );
        }
    }

    let released = selector.release_all(&mut source);
    info!(
        frames = renderer.frames,
        instances = renderer.instances,
        peak_instances = renderer.peak_instances,
        untextured = renderer.untextured,
        instance_bytes = renderer.bytes,
        released,
        "Run finished"
    );
    Ok(())
}

/// Push a reloaded config into the selector and the patch source.
///
/// Geometry changes rebuild the trees. Streaming changes invalidate every
/// generated patch, so the trees drop their textures and the source starts
/// over. Returns whether the source was reconfigured.
fn apply_reload(
    current: &Config,
    reloaded: &Config,
    settings: LodSettings,
    selector: &mut LodSelector,
    source: &mut ProceduralSource,
) -> bool {
    let rebuilt = selector.apply_settings(settings.clone(), source);
    let streaming_changed = reloaded.streaming != current.streaming;
    if !(rebuilt || streaming_changed) {
        return false;
    }
    if !rebuilt {
        let released = selector.release_all(source);
        info!(released, "Streaming settings changed, regenerating patches");
    }
    source.reconfigure(&reloaded.streaming, settings);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::DVec3;
    use orbis_collision::{Interval, NoCulling};
    use orbis_cubesphere::CubeFace;
    use orbis_lod::{PatchKey, PatchSource, PatchStatus};

    const EYE: DVec3 = DVec3::new(0.0, 1010.0, 0.0);

    fn small_config() -> Config {
        let mut config = Config::default();
        config.terrain.node_dimension = 16;
        config.terrain.max_lod_level = 2;
        config.terrain.sphere_radius = 1000.0;
        config.streaming.uploads_per_frame = 64;
        config
    }

    /// Run enough frames from a low camera for patches to become resident.
    fn warm_up(config: &Config) -> (LodSelector, ProceduralSource) {
        let settings = LodSettings::from_config(&config.terrain).unwrap();
        let mut source = ProceduralSource::new(&config.streaming, settings.clone());
        let mut selector = LodSelector::new(settings);
        let mut batch = RenderBatch::new();
        for _ in 0..4 {
            selector.select_nodes(EYE, &NoCulling, &mut source, &mut batch);
            source.pump();
        }
        assert!(selector.resident_textures() > 0);
        (selector, source)
    }

    /// Height range the source reports for `key`, uploading it if needed.
    fn patch_heights(source: &mut ProceduralSource, key: PatchKey) -> Interval {
        if let PatchStatus::Ready(data) = source.request(key, 1.0) {
            return data.heights;
        }
        source.pump();
        match source.request(key, 1.0) {
            PatchStatus::Ready(data) => data.heights,
            other => panic!("patch {key} not uploaded: {other:?}"),
        }
    }

    #[test]
    fn test_seed_only_reload_regenerates_patches() {
        let config = small_config();
        let (mut selector, mut source) = warm_up(&config);
        let key = PatchKey::root(CubeFace::PosY, config.terrain.max_lod_level);
        let before = patch_heights(&mut source, key);

        let mut reloaded = config.clone();
        reloaded.streaming.seed = 7;
        let settings = LodSettings::from_config(&reloaded.terrain).unwrap();
        assert!(apply_reload(&config, &reloaded, settings, &mut selector, &mut source));

        assert_eq!(selector.resident_textures(), 0);
        assert_eq!(source.resident(), 0);
        assert_eq!(source.queued(), 0);
        assert_ne!(patch_heights(&mut source, key), before);
    }

    #[test]
    fn test_upload_budget_reload_reaches_source() {
        let config = small_config();
        let (mut selector, mut source) = warm_up(&config);

        let mut reloaded = config.clone();
        reloaded.streaming.uploads_per_frame = 1;
        let settings = LodSettings::from_config(&reloaded.terrain).unwrap();
        assert!(apply_reload(&config, &reloaded, settings, &mut selector, &mut source));

        let mut batch = RenderBatch::new();
        selector.select_nodes(EYE, &NoCulling, &mut source, &mut batch);
        assert!(source.queued() > 1);
        assert_eq!(source.pump(), 1);
    }

    #[test]
    fn test_unrelated_reload_keeps_patches() {
        let config = small_config();
        let (mut selector, mut source) = warm_up(&config);
        let resident = selector.resident_textures();

        let mut reloaded = config.clone();
        reloaded.camera.frames = 10;
        reloaded.terrain.lod_distance_multiplier = 3.0;
        let settings = LodSettings::from_config(&reloaded.terrain).unwrap();
        assert!(!apply_reload(&config, &reloaded, settings, &mut selector, &mut source));
        assert_eq!(selector.resident_textures(), resident);
    }
}
