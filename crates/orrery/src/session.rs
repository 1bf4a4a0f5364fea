//! Frame-driven AR session: acquire a frame, fit it to the window, detect
//! markers, draw the solar system.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use orrery_core::{
    estimate_marker_pose, CameraError, CameraParameters, ImageSize, Marker, RgbImageView,
};
use orrery_scene::{
    FrameSummary, ImageTextureLoader, PlanetTable, Renderer, Scene, SceneConfig, TableError,
    TextureLoader,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::io::RecordedMarker;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to decode frame {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Supplier of camera frames. `Ok(None)` ends the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SessionError>;
}

/// Frames decoded one by one from a list of image files.
#[derive(Clone, Debug)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageSequence {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, SessionError> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let img = image::open(path).map_err(|source| SessionError::Image {
            path: path.clone(),
            source,
        })?;
        Ok(Some(img.to_rgb8()))
    }
}

/// Marker detector seam.
///
/// `camera` describes `frame`; implementations report poses for squares of
/// side `marker_size`. A detector that fails returns no markers.
pub trait MarkerDetector {
    fn detect(&mut self, frame: &RgbImage, camera: &CameraParameters, marker_size: f32)
        -> Vec<Marker>;
}

/// Replays detections recorded per frame.
///
/// Each call consumes one recorded frame; once the recording is exhausted
/// every frame has no markers. Entries without a pose get one estimated
/// from their corners.
#[derive(Clone, Debug, Default)]
pub struct ReplayDetector {
    frames: Vec<Vec<RecordedMarker>>,
    next: usize,
}

impl ReplayDetector {
    pub fn new(frames: Vec<Vec<RecordedMarker>>) -> Self {
        Self { frames, next: 0 }
    }

    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let recording = crate::io::RecordedDetections::load_json(path)?;
        Ok(Self::new(recording.frames))
    }

    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.next)
    }
}

impl MarkerDetector for ReplayDetector {
    fn detect(
        &mut self,
        _frame: &RgbImage,
        camera: &CameraParameters,
        marker_size: f32,
    ) -> Vec<Marker> {
        let Some(recorded) = self.frames.get(self.next) else {
            return Vec::new();
        };
        self.next += 1;

        recorded
            .iter()
            .filter_map(|m| {
                let corners = m.corners();
                let pose = match m.pose() {
                    Some(pose) => pose,
                    None => match estimate_marker_pose(&corners, camera, marker_size as f64) {
                        Ok(pose) => pose,
                        Err(err) => {
                            log::warn!("dropping marker {}: {err}", m.id);
                            return None;
                        }
                    },
                };
                Some(Marker::new(m.id, corners, pose))
            })
            .collect()
    }
}

/// One AR viewing session.
///
/// Owns the calibration (kept in step with the window size), the last
/// camera frame both as captured and fitted to the window, its markers, and
/// the scene state.
pub struct ArSession<L = ImageTextureLoader> {
    camera: CameraParameters,
    window: ImageSize,
    captured: Option<RgbImage>,
    frame: Option<RgbImage>,
    markers: Vec<Marker>,
    scene: Scene<L>,
}

impl ArSession<ImageTextureLoader> {
    pub fn new(camera: CameraParameters, config: SceneConfig, table: PlanetTable) -> Self {
        Self::with_loader(camera, config, table, ImageTextureLoader)
    }
}

impl<L: TextureLoader> ArSession<L> {
    pub fn with_loader(
        camera: CameraParameters,
        config: SceneConfig,
        table: PlanetTable,
        loader: L,
    ) -> Self {
        Self {
            window: camera.image_size,
            camera,
            captured: None,
            frame: None,
            markers: Vec::new(),
            scene: Scene::with_loader(config, table, loader),
        }
    }

    pub fn camera(&self) -> &CameraParameters {
        &self.camera
    }

    pub fn window(&self) -> ImageSize {
        self.window
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn frame(&self) -> Option<&RgbImage> {
        self.frame.as_ref()
    }

    pub fn scene(&self) -> &Scene<L> {
        &self.scene
    }

    /// Adopt a new window size and return the size actually used.
    ///
    /// The width is widened until RGB rows are 4-byte aligned; the
    /// calibration is rescaled to the result and the last captured frame is
    /// refitted to the new window.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<ImageSize, SessionError> {
        let size = ImageSize::new(width, height)
            .aligned_for_rgb_rows()
            .ok_or(CameraError::InvalidImageSize { width, height })?;
        self.camera.resize(size)?;
        if size.width != width {
            log::debug!("window width {width} widened to {}", size.width);
        }
        self.window = size;
        if let Some(captured) = &self.captured {
            self.frame = Some(fit_to_window(captured, size));
        }
        Ok(size)
    }

    /// Take a new camera frame: fit it to the window and run detection.
    ///
    /// Returns the number of markers found. Empty frames are ignored and
    /// leave the previous frame in place.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = frame.width(), height = frame.height()))
    )]
    pub fn idle<D: MarkerDetector + ?Sized>(&mut self, frame: &RgbImage, detector: &mut D) -> usize {
        if frame.width() == 0 || frame.height() == 0 {
            log::debug!("skipping empty frame");
            return 0;
        }

        let fitted = fit_to_window(frame, self.window);
        self.markers = detector.detect(&fitted, &self.camera, self.scene.config().marker_size);
        self.captured = Some(frame.clone());
        self.frame = Some(fitted);
        self.markers.len()
    }

    /// Draw the current frame and its planets. `None` until a frame arrived.
    pub fn draw_scene<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> Option<FrameSummary> {
        let frame = self.frame.as_ref()?;
        let view = RgbImageView {
            width: frame.width() as usize,
            height: frame.height() as usize,
            data: frame.as_raw(),
        };
        self.scene
            .draw_frame(view, &self.markers, &self.camera, self.window, renderer)
    }

    pub fn draw_marker_axis<R: Renderer + ?Sized>(&self, index: usize, renderer: &mut R) {
        self.scene.draw_marker_axis(&self.markers, index, renderer);
    }

    pub fn draw_marker_cube<R: Renderer + ?Sized>(&self, index: usize, renderer: &mut R) {
        self.scene.draw_marker_cube(&self.markers, index, renderer);
    }

    /// Release renderer resources held by the scene.
    pub fn shutdown<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        self.scene.shutdown(renderer);
    }
}

fn fit_to_window(frame: &RgbImage, window: ImageSize) -> RgbImage {
    if frame.dimensions() == (window.width, window.height) {
        frame.clone()
    } else {
        imageops::resize(frame, window.width, window.height, FilterType::Triangle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Vector3};
    use orrery_core::{CameraIntrinsics, MarkerPose};
    use orrery_scene::{DrawCommand, RecordingRenderer, TextureImage};

    struct NoTextures;

    impl TextureLoader for NoTextures {
        fn load(&self, _path: &Path) -> Option<TextureImage> {
            None
        }
    }

    struct FixedDetector(Vec<Marker>);

    impl MarkerDetector for FixedDetector {
        fn detect(&mut self, _: &RgbImage, _: &CameraParameters, _: f32) -> Vec<Marker> {
            self.0.clone()
        }
    }

    fn camera() -> CameraParameters {
        CameraParameters::new(
            ImageSize::new(640, 480),
            CameraIntrinsics {
                fx: 600.0,
                fy: 600.0,
                cx: 320.0,
                cy: 240.0,
            },
        )
        .expect("camera")
    }

    fn session() -> ArSession<NoTextures> {
        ArSession::with_loader(camera(), SceneConfig::default(), PlanetTable::builtin(), NoTextures)
    }

    #[test]
    fn resize_aligns_width_and_rescales_camera() {
        let mut s = session();
        let size = s.resize(321, 240).expect("resize");
        assert_eq!(size, ImageSize::new(324, 240));
        assert_eq!(s.window(), size);
        assert_eq!(s.camera().image_size, size);
        assert_relative_eq!(s.camera().intrinsics.fx, 600.0 * 324.0 / 640.0);
        assert_relative_eq!(s.camera().intrinsics.cy, 120.0);

        assert!(s.resize(0, 10).is_err());
        assert!(matches!(
            s.resize(u32::MAX, 10),
            Err(SessionError::Camera(CameraError::InvalidImageSize { .. }))
        ));
        assert_eq!(s.window(), size);
    }

    #[test]
    fn resize_refits_the_held_frame() {
        let mut s = session();
        s.idle(&RgbImage::new(640, 480), &mut FixedDetector(vec![]));
        let window = s.resize(800, 600).expect("resize");

        let mut renderer = RecordingRenderer::new();
        s.draw_scene(&mut renderer).expect("drawn");
        let background = renderer
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Background { width, height } => Some((*width, *height)),
                _ => None,
            })
            .expect("background");
        assert_eq!(background, (window.width as usize, window.height as usize));
        assert_eq!(s.frame().map(|f| f.dimensions()), Some((800, 600)));
    }

    #[test]
    fn idle_fits_frame_to_window_before_detection() {
        let mut s = session();
        s.resize(320, 240).expect("resize");
        let frame = RgbImage::new(640, 480);
        let marker = Marker::new(141, [Point2::origin(); 4], MarkerPose::default());
        let found = s.idle(&frame, &mut FixedDetector(vec![marker]));
        assert_eq!(found, 1);
        assert_eq!(s.frame().map(|f| f.dimensions()), Some((320, 240)));

        assert_eq!(s.idle(&RgbImage::new(0, 0), &mut FixedDetector(vec![])), 0);
        assert_eq!(s.markers().len(), 1);
    }

    #[test]
    fn draw_scene_waits_for_first_frame() {
        let mut s = session();
        let mut renderer = RecordingRenderer::new();
        assert!(s.draw_scene(&mut renderer).is_none());
        assert!(renderer.commands().is_empty());

        s.idle(&RgbImage::new(640, 480), &mut FixedDetector(vec![]));
        let summary = s.draw_scene(&mut renderer).expect("drawn");
        assert_eq!(summary.marker_count, 0);
        assert_eq!(renderer.commands().len(), 2);
    }

    #[test]
    fn replay_estimates_missing_poses_and_then_runs_dry() {
        let cam = camera();
        let size = 0.05_f64;
        // Marker facing the camera 0.5 away, centred on the principal point.
        let px = (600.0 * size / 2.0 / 0.5) as f32;
        let recorded = RecordedMarker {
            id: 217,
            corners: [
                [320.0 - px, 240.0 - px],
                [320.0 + px, 240.0 - px],
                [320.0 + px, 240.0 + px],
                [320.0 - px, 240.0 + px],
            ],
            rvec: None,
            tvec: None,
        };
        let mut detector = ReplayDetector::new(vec![vec![recorded]]);
        let frame = RgbImage::new(1, 1);

        let markers = detector.detect(&frame, &cam, size as f32);
        assert_eq!(markers.len(), 1);
        let t = markers[0].pose.tvec;
        assert_relative_eq!(t, Vector3::new(0.0, 0.0, 0.5), epsilon = 1e-3);
        assert_eq!(detector.remaining(), 0);
        assert!(detector.detect(&frame, &cam, size as f32).is_empty());
    }

    #[test]
    fn replay_drops_markers_whose_pose_cannot_be_estimated() {
        let collapsed = RecordedMarker {
            id: 141,
            corners: [[5.0, 5.0]; 4],
            rvec: None,
            tvec: None,
        };
        let mut detector = ReplayDetector::new(vec![vec![collapsed]]);
        assert!(detector.detect(&RgbImage::new(1, 1), &camera(), 0.05).is_empty());
    }

    #[test]
    fn image_sequence_reports_decode_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("a.png");
        RgbImage::new(4, 3).save(&good).expect("save");
        let bad = dir.path().join("b.png");
        std::fs::write(&bad, b"not an image").expect("write");

        let mut seq = ImageSequence::new([good, bad]);
        assert_eq!(seq.len(), 2);
        let first = seq.next_frame().expect("decoded").expect("frame");
        assert_eq!(first.dimensions(), (4, 3));
        assert!(matches!(seq.next_frame(), Err(SessionError::Image { .. })));
        assert!(seq.next_frame().expect("end").is_none());
    }

    #[test]
    fn shutdown_releases_uploaded_textures() {
        let mut s = ArSession::with_loader(
            camera(),
            SceneConfig::default(),
            PlanetTable::builtin(),
            |_: &Path| {
                Some(TextureImage {
                    width: 1,
                    height: 1,
                    data: vec![0, 0, 0],
                })
            },
        );
        let mut renderer = RecordingRenderer::new();
        let marker = Marker::new(
            141,
            [Point2::origin(); 4],
            MarkerPose::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0)),
        );
        s.idle(&RgbImage::new(640, 480), &mut FixedDetector(vec![marker]));
        s.draw_scene(&mut renderer);
        assert_eq!(renderer.live_texture_count(), 1);
        s.shutdown(&mut renderer);
        assert_eq!(renderer.live_texture_count(), 0);
    }
}
