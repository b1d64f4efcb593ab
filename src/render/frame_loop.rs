//! Frame loop: session update, tap handling and draw submission.

use tracing::{debug, info, warn};

use crate::attachment::AttachmentList;
use crate::config::AppConfig;
use crate::geometry::DisplayGeometry;
use crate::input::TapConsumer;
use crate::session::{ArSession, Frame, closest_plane_hit};
use crate::tracking::{Plane, PlaneType};

use super::outcome::{FrameOutcome, FrameReport, SkipReason, TapOutcome};
use super::sink::{RenderSink, ViewContext};

/// Whether the user still needs to be told to look for surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSearch {
    Searching,
    Found,
}

/// Counters over the lifetime of the loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameLoopStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub taps_handled: u64,
    pub objects_attached: u64,
}

/// Drives one AR session frame by frame.
pub struct FrameLoop<S: ArSession> {
    session: S,
    taps: TapConsumer,
    attachments: AttachmentList<S::Plane, S::Anchor>,
    near_clip: f64,
    far_clip: f64,
    object_scale: f32,
    surface_search: SurfaceSearch,
    stats: FrameLoopStats,
}

impl<S: ArSession> FrameLoop<S> {
    pub fn new(session: S, taps: TapConsumer, config: &AppConfig) -> Self {
        Self {
            session,
            taps,
            attachments: AttachmentList::new(config.max_attachments),
            near_clip: config.near_clip,
            far_clip: config.far_clip,
            object_scale: config.object_scale,
            surface_search: SurfaceSearch::Searching,
            stats: FrameLoopStats::default(),
        }
    }

    /// Rendering resumed (app back in the foreground); look for surfaces again.
    pub fn on_resume(&mut self) {
        self.surface_search = SurfaceSearch::Searching;
        info!("Searching for surfaces...");
    }

    /// The rendering surface was resized.
    ///
    /// Degenerate sizes (zero, negative, NaN) are ignored and the session keeps
    /// its previous geometry, since no projection can be built from them.
    pub fn on_surface_changed(&mut self, width: f64, height: f64) {
        if !DisplayGeometry::new(width, height).is_valid() {
            warn!(width, height, "Ignoring degenerate surface size");
            return;
        }
        self.session.set_display_geometry(width, height);
    }

    /// Run one display frame.
    pub fn on_draw_frame<R: RenderSink>(&mut self, sink: &mut R) -> FrameOutcome {
        let frame = match self.session.update() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping frame: {:#}", e);
                self.stats.frames_skipped += 1;
                return FrameOutcome::Skipped(SkipReason::UpdateFailed(e));
            }
        };

        let tap = self.handle_tap(&frame);

        sink.draw_background(&frame);

        if !frame.is_tracking() {
            debug!(state = %frame.tracking_state, "Camera not tracking, skipping 3D content");
            self.stats.frames_skipped += 1;
            return FrameOutcome::Skipped(SkipReason::NotTracking);
        }

        let ctx = ViewContext {
            view: frame.view_matrix(),
            projection: self.session.projection_matrix(self.near_clip, self.far_clip),
            light_intensity: frame.light_intensity,
        };

        sink.draw_point_cloud(&frame.point_cloud, &ctx);

        let planes = self.session.all_planes();
        let surface_found = self.update_surface_search(&planes);
        sink.draw_planes(planes.as_slice(), &ctx);

        let active = self.attachments.active_poses();
        for (attachment, pose) in &active {
            sink.draw_object(attachment.id(), &pose.to_model_matrix(self.object_scale), &ctx);
        }
        let objects_drawn = active.len();
        let stale_objects = self.attachments.len() - objects_drawn;

        self.stats.frames_rendered += 1;
        FrameOutcome::Rendered(FrameReport {
            timestamp_ns: frame.timestamp_ns,
            tap,
            objects_drawn,
            stale_objects,
            surface_found,
        })
    }

    /// Handle at most one queued tap, oldest first.
    fn handle_tap(&mut self, frame: &Frame) -> TapOutcome {
        let Some(tap) = self.taps.poll() else {
            return TapOutcome::None;
        };
        self.stats.taps_handled += 1;

        if !frame.is_tracking() {
            debug!(x = tap.x, y = tap.y, "Discarding tap, camera not tracking");
            return TapOutcome::Discarded;
        }

        let hits = self.session.hit_test(frame, &tap);
        let Some(hit) = closest_plane_hit(hits) else {
            debug!(x = tap.x, y = tap.y, "Tap hit no plane");
            return TapOutcome::Missed;
        };

        match self
            .attachments
            .try_attach(&mut self.session, hit.plane, &hit.hit_pose)
        {
            Ok(outcome) => {
                self.stats.objects_attached += 1;
                info!(
                    object = %outcome.id,
                    distance = hit.distance,
                    evicted = outcome.evicted.is_some(),
                    "Placed object"
                );
                TapOutcome::Attached(outcome)
            }
            Err(e) => {
                warn!("Could not place object: {:#}", e);
                TapOutcome::Rejected(format!("{:#}", e))
            }
        }
    }

    /// Returns true on the frame the first upward-facing tracked plane shows up.
    fn update_surface_search(&mut self, planes: &[S::Plane]) -> bool {
        if self.surface_search == SurfaceSearch::Found {
            return false;
        }
        let found = planes.iter().any(|p| {
            p.plane_type() == PlaneType::HorizontalUpwardFacing && p.tracking_state().is_tracking()
        });
        if found {
            self.surface_search = SurfaceSearch::Found;
            info!("Surface found");
        }
        found
    }

    /// Release every placed object. The session itself stays usable.
    pub fn shutdown(&mut self) {
        self.attachments.clear(&mut self.session);
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn attachments(&self) -> &AttachmentList<S::Plane, S::Anchor> {
        &self.attachments
    }

    pub fn surface_search(&self) -> SurfaceSearch {
        self.surface_search
    }

    pub fn stats(&self) -> &FrameLoopStats {
        &self.stats
    }
}

impl<S: ArSession> Drop for FrameLoop<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, UnitQuaternion, Vector3};

    use crate::attachment::AttachmentId;
    use crate::geometry::{DisplayGeometry, SE3};
    use crate::input::{Tap, TapProducer, tap_queue};
    use crate::session::SimSession;
    use crate::tracking::{Anchor, TrackingState};

    const WIDTH: f64 = 800.0;
    const HEIGHT: f64 = 600.0;

    #[derive(Default)]
    struct RecordingSink {
        backgrounds: usize,
        planes_drawn: usize,
        objects: Vec<(AttachmentId, Matrix4<f32>)>,
    }

    impl RenderSink for RecordingSink {
        fn draw_background(&mut self, _frame: &Frame) {
            self.backgrounds += 1;
        }

        fn draw_point_cloud(&mut self, _points: &[Vector3<f64>], _ctx: &ViewContext) {}

        fn draw_planes<P: Plane>(&mut self, planes: &[P], _ctx: &ViewContext) {
            self.planes_drawn += planes.len();
        }

        fn draw_object(&mut self, id: AttachmentId, model: &Matrix4<f32>, _ctx: &ViewContext) {
            self.objects.push((id, *model));
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            display: DisplayGeometry::new(WIDTH, HEIGHT),
            ..AppConfig::default()
        }
    }

    /// Frame loop over a session whose camera is 1.5 m above the origin,
    /// looking straight down, with a 4 m floor at height 0.
    fn setup() -> (FrameLoop<SimSession>, TapProducer) {
        setup_with(config())
    }

    fn setup_with(config: AppConfig) -> (FrameLoop<SimSession>, TapProducer) {
        let mut session = SimSession::new(config.display, config.vertical_fov_deg);
        session.set_camera_pose(SE3::from_rt(
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -std::f64::consts::FRAC_PI_2),
            Vector3::new(0.0, 1.5, 0.0),
        ));
        session.add_plane(PlaneType::HorizontalUpwardFacing, SE3::identity(), 4.0, 4.0);

        let (producer, consumer) = tap_queue(config.tap_queue_capacity);
        (FrameLoop::new(session, consumer, &config), producer)
    }

    fn center_tap() -> Tap {
        Tap::new(WIDTH / 2.0, HEIGHT / 2.0)
    }

    fn report(outcome: FrameOutcome) -> FrameReport {
        match outcome {
            FrameOutcome::Rendered(report) => report,
            FrameOutcome::Skipped(reason) => panic!("frame skipped: {:?}", reason),
        }
    }

    #[test]
    fn test_tap_places_object_on_plane() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        assert!(taps.offer(center_tap()));

        let report = report(frame_loop.on_draw_frame(&mut sink));

        assert!(matches!(report.tap, TapOutcome::Attached(_)));
        assert_eq!(report.objects_drawn, 1);
        assert_eq!(report.stale_objects, 0);
        assert_eq!(sink.objects.len(), 1);
        let model = sink.objects[0].1;
        assert_relative_eq!(model[(0, 3)], 0.0f32, epsilon = 1e-5);
        assert_relative_eq!(model[(1, 3)], 0.0f32, epsilon = 1e-5);
        assert_relative_eq!(model[(2, 3)], 0.0f32, epsilon = 1e-5);
    }

    #[test]
    fn test_one_tap_per_frame() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());
        taps.offer(Tap::new(100.0, 100.0));

        frame_loop.on_draw_frame(&mut sink);
        assert_eq!(frame_loop.attachments().len(), 1);
        frame_loop.on_draw_frame(&mut sink);
        assert_eq!(frame_loop.attachments().len(), 2);
        let third = report(frame_loop.on_draw_frame(&mut sink));
        assert_eq!(third.tap, TapOutcome::None);
        assert_eq!(frame_loop.stats().taps_handled, 2);
    }

    #[test]
    fn test_overlapping_planes_only_nearest_attaches() {
        let (mut frame_loop, taps) = setup();
        let table = frame_loop.session_mut().add_plane(
            PlaneType::HorizontalUpwardFacing,
            SE3::from_translation(Vector3::new(0.0, 0.7, 0.0)),
            1.0,
            1.0,
        );
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());

        let report = report(frame_loop.on_draw_frame(&mut sink));

        assert!(matches!(report.tap, TapOutcome::Attached(_)));
        assert_eq!(frame_loop.attachments().len(), 1);
        let attachment = frame_loop.attachments().iter().next().unwrap();
        assert_eq!(attachment.plane().id(), table.id());
        assert_relative_eq!(sink.objects[0].1[(1, 3)], 0.7f32, epsilon = 1e-5);
    }

    #[test]
    fn test_tap_outside_polygon_creates_nothing() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        // Far corner of the view lands well outside the 4 m floor.
        taps.offer(Tap::new(0.0, 0.0));
        frame_loop.session_mut().set_camera_pose(SE3::from_rt(
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -std::f64::consts::FRAC_PI_2),
            Vector3::new(0.0, 10.0, 0.0),
        ));

        let report = report(frame_loop.on_draw_frame(&mut sink));

        assert_eq!(report.tap, TapOutcome::Missed);
        assert!(frame_loop.attachments().is_empty());
        assert!(frame_loop.session().anchors().is_empty());
    }

    #[test]
    fn test_failed_update_skips_without_consuming_tap() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());
        frame_loop.session_mut().fail_next_update("sensor glitch");

        let outcome = frame_loop.on_draw_frame(&mut sink);
        assert!(matches!(outcome, FrameOutcome::Skipped(SkipReason::UpdateFailed(_))));
        assert_eq!(sink.backgrounds, 0);
        assert!(frame_loop.attachments().is_empty());

        let report = report(frame_loop.on_draw_frame(&mut sink));
        assert!(matches!(report.tap, TapOutcome::Attached(_)));
        assert_eq!(frame_loop.stats().frames_skipped, 1);
        assert_eq!(frame_loop.stats().frames_rendered, 1);
    }

    #[test]
    fn test_not_tracking_discards_tap_but_draws_background() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());
        frame_loop.session_mut().set_camera_tracking(TrackingState::Paused);

        let outcome = frame_loop.on_draw_frame(&mut sink);
        assert!(matches!(outcome, FrameOutcome::Skipped(SkipReason::NotTracking)));
        assert_eq!(sink.backgrounds, 1);
        assert_eq!(sink.planes_drawn, 0);

        frame_loop.session_mut().set_camera_tracking(TrackingState::Tracking);
        let report = report(frame_loop.on_draw_frame(&mut sink));
        assert_eq!(report.tap, TapOutcome::None);
        assert!(frame_loop.attachments().is_empty());
    }

    #[test]
    fn test_rejected_anchor_is_reported_not_skipped() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());
        frame_loop.session_mut().fail_next_anchor("out of resources");

        let report = report(frame_loop.on_draw_frame(&mut sink));
        match report.tap {
            TapOutcome::Rejected(msg) => assert!(msg.contains("out of resources")),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(frame_loop.attachments().is_empty());
    }

    #[test]
    fn test_surface_found_reported_once_per_search() {
        let (mut frame_loop, _taps) = setup();
        let mut sink = RecordingSink::default();

        assert!(report(frame_loop.on_draw_frame(&mut sink)).surface_found);
        assert!(!report(frame_loop.on_draw_frame(&mut sink)).surface_found);
        assert_eq!(frame_loop.surface_search(), SurfaceSearch::Found);

        frame_loop.on_resume();
        assert_eq!(frame_loop.surface_search(), SurfaceSearch::Searching);
        assert!(report(frame_loop.on_draw_frame(&mut sink)).surface_found);
    }

    #[test]
    fn test_vertical_plane_does_not_end_search() {
        let config = config();
        let mut session = SimSession::new(config.display, config.vertical_fov_deg);
        session.add_plane(PlaneType::Vertical, SE3::identity(), 1.0, 1.0);
        let (_taps, consumer) = tap_queue(config.tap_queue_capacity);
        let mut frame_loop = FrameLoop::new(session, consumer, &config);

        let report = report(frame_loop.on_draw_frame(&mut RecordingSink::default()));
        assert!(!report.surface_found);
        assert_eq!(frame_loop.surface_search(), SurfaceSearch::Searching);
    }

    #[test]
    fn test_stale_objects_are_counted_not_drawn() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());
        frame_loop.on_draw_frame(&mut sink);

        let anchor_id = frame_loop.session().anchors()[0].id();
        frame_loop
            .session_mut()
            .set_anchor_tracking(anchor_id, TrackingState::Paused)
            .unwrap();
        sink.objects.clear();

        let report = report(frame_loop.on_draw_frame(&mut sink));
        assert_eq!(report.objects_drawn, 0);
        assert_eq!(report.stale_objects, 1);
        assert!(sink.objects.is_empty());
    }

    #[test]
    fn test_seventeenth_tap_evicts_first_object() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        let mut first = None;

        for i in 0..17 {
            taps.offer(center_tap());
            let report = report(frame_loop.on_draw_frame(&mut sink));
            let TapOutcome::Attached(outcome) = report.tap else {
                panic!("tap {} not attached", i);
            };
            if i == 0 {
                first = Some(outcome.id);
            }
            if i == 16 {
                assert_eq!(outcome.evicted, first);
            }
        }

        assert_eq!(frame_loop.attachments().len(), 16);
        assert_eq!(frame_loop.session().released_anchors().len(), 1);
    }

    #[test]
    fn test_object_scale_reaches_model_matrix() {
        let (mut frame_loop, taps) = setup_with(AppConfig {
            object_scale: 0.5,
            ..config()
        });
        let mut sink = RecordingSink::default();
        taps.offer(center_tap());

        frame_loop.on_draw_frame(&mut sink);
        let model = sink.objects[0].1;
        assert_relative_eq!(model[(0, 0)], 0.5f32, epsilon = 1e-5);
        assert_relative_eq!(model[(3, 3)], 1.0f32, epsilon = 1e-5);
    }

    #[test]
    fn test_shutdown_releases_all_anchors() {
        let (mut frame_loop, taps) = setup();
        let mut sink = RecordingSink::default();
        for _ in 0..3 {
            taps.offer(center_tap());
            frame_loop.on_draw_frame(&mut sink);
        }

        frame_loop.shutdown();
        assert!(frame_loop.attachments().is_empty());
        assert_eq!(frame_loop.session().released_anchors().len(), 3);
        assert!(frame_loop.session().anchors().is_empty());
    }

    #[test]
    fn test_surface_change_reaches_session() {
        let (mut frame_loop, _taps) = setup();
        frame_loop.on_surface_changed(1920.0, 1080.0);
        assert_eq!(frame_loop.session().display(), DisplayGeometry::new(1920.0, 1080.0));
    }

    #[test]
    fn test_degenerate_surface_keeps_previous_geometry() {
        let (mut frame_loop, taps) = setup();
        frame_loop.on_surface_changed(0.0, 1920.0);
        frame_loop.on_surface_changed(1080.0, -1.0);
        frame_loop.on_surface_changed(f64::NAN, 1920.0);
        assert_eq!(frame_loop.session().display(), DisplayGeometry::new(WIDTH, HEIGHT));

        assert!(taps.offer(center_tap()));
        let mut sink = RecordingSink::default();
        let report = report(frame_loop.on_draw_frame(&mut sink));
        assert!(matches!(report.tap, TapOutcome::Attached(_)));
        assert_eq!(sink.backgrounds, 1);
        assert_eq!(sink.objects.len(), 1);
    }
}
