//! Headless playback: frames and recorded detections through a recording
//! renderer.

use orrery_core::CameraParameters;
use orrery_scene::{RecordingRenderer, TextureLoader};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    ArSession, FrameReport, FrameSource, ImageSequence, MarkerDetector, ReplayDetector,
    SessionConfig, SessionError, SessionReport,
};

/// Run the session described by `config` and collect what was drawn.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_replay(config: &SessionConfig) -> Result<SessionReport, SessionError> {
    let camera = CameraParameters::load_json(&config.camera_path)?;
    let session = ArSession::new(camera, config.scene_config(), config.planet_table()?);
    let mut frames = ImageSequence::new(config.frames.iter().cloned());
    let mut detector = match &config.detections_path {
        Some(path) => ReplayDetector::from_json(path)?,
        None => ReplayDetector::default(),
    };
    log::info!(
        "replaying {} frames ({} recorded detections)",
        frames.len(),
        detector.remaining()
    );
    replay_with(session, config, &mut frames, &mut detector)
}

/// Drive an existing session with any frame source and detector.
pub fn replay_with<L, S, D>(
    mut session: ArSession<L>,
    config: &SessionConfig,
    frames: &mut S,
    detector: &mut D,
) -> Result<SessionReport, SessionError>
where
    L: TextureLoader,
    S: FrameSource + ?Sized,
    D: MarkerDetector + ?Sized,
{
    if let Some(size) = config.window_size() {
        session.resize(size.width, size.height)?;
    }

    let mut renderer = RecordingRenderer::new();
    let mut reports = Vec::new();
    while let Some(frame) = frames.next_frame()? {
        let index = reports.len();
        let found = session.idle(&frame, detector);
        log::debug!("frame {index}: {found} markers");

        let Some(summary) = session.draw_scene(&mut renderer) else {
            continue;
        };
        if let Some(marker) = config.debug_axis {
            session.draw_marker_axis(marker, &mut renderer);
        }
        reports.push(FrameReport {
            index,
            summary,
            commands: renderer.take_commands(),
        });
    }

    session.shutdown(&mut renderer);
    Ok(SessionReport {
        window: session.window(),
        frames: reports,
        final_state: *session.scene().state(),
        teardown: renderer.take_commands(),
    })
}
