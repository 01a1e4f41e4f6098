//! The per-tick placement pipeline
//!
//! Owns the session and every piece of render-thread state. Each call to
//! [`PlacementPipeline::on_draw_frame`] runs one tick:
//!
//! 1. clear, push display geometry and camera texture, `update()` the session
//! 2. classify tracking and consume at most one tap
//! 3. attach the accepted hit, refresh attachments
//! 4. draw background, then point cloud, planes and objects while tracking
//!
//! Nothing here is fatal. A failed tick is reported in its [`TickOutcome`]
//! and the next tick starts from fresh session state.

use crate::ar::anchor_manager::AnchorManager;
use crate::ar::display_geometry::DisplayGeometry;
use crate::ar::gesture_recognition::TapDetector;
use crate::ar::hit_resolver::HitResolver;
use crate::ar::object_slot::ObjectSlot;
use crate::ar::tap_queue::{TapQueue, TapSender};
use crate::ar::tracking_monitor::{DisplayHost, TrackingMonitor, TrackingStatus};
use crate::config::{ArConfig, GestureConfig};
use crate::error::{PipelineError, RenderError, Result, SessionError};
use crate::session::{DisplayRotation, SessionFactory, TrackingFrame, TrackingSession};
use crate::three_d::{FrameCompositor, RenderBackend, SceneRenderer};
use crate::trackable::TrackingState;

/// What a rendered tick drew
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Session frame timestamp
    pub timestamp: i64,
    /// Slot attached by this tick's tap, if any
    pub placed: Option<ObjectSlot>,
    /// Planes passed to the backend
    pub planes_drawn: usize,
    /// Slots drawn, in draw order
    pub objects_drawn: Vec<ObjectSlot>,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No session yet, only the clear ran
    NoSession,
    /// `update()` failed; nothing beyond the clear was drawn
    NoFrame(PipelineError),
    /// Camera not tracking; background only
    Paused,
    /// Full pipeline ran
    Rendered(FrameReport),
    /// Tick gave up part way; whatever was drawn before the failure stays
    Abandoned(PipelineError),
}

impl TickOutcome {
    /// Whether the full 3-D pass ran
    pub fn is_rendered(&self) -> bool {
        matches!(self, TickOutcome::Rendered(_))
    }

    /// Report of a rendered tick
    pub fn report(&self) -> Option<&FrameReport> {
        match self {
            TickOutcome::Rendered(report) => Some(report),
            _ => None,
        }
    }
}

/// User-facing text for a session that could not be brought up
pub fn session_error_message(err: &SessionError) -> String {
    match err {
        SessionError::InstallRequested => "Please install the AR tracking service".to_string(),
        SessionError::PermissionDenied => "Camera permission is needed to run this application".to_string(),
        SessionError::CameraNotAvailable => "Camera not available. Try restarting the app.".to_string(),
        other => format!("Failed to create AR session: {other}"),
    }
}

/// Tap-to-place pipeline over a tracking session `S`
pub struct PlacementPipeline<S: TrackingSession> {
    session: Option<S>,
    taps: TapQueue,
    gestures: GestureConfig,
    resolver: HitResolver,
    anchors: AnchorManager,
    monitor: TrackingMonitor,
    display: DisplayGeometry,
    compositor: FrameCompositor,
    renderer: SceneRenderer,
}

impl<S: TrackingSession> PlacementPipeline<S> {
    /// Build a pipeline; the session is created on the first resume
    pub fn new(config: &ArConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            session: None,
            taps: TapQueue::new(),
            gestures: config.gestures.clone(),
            resolver: HitResolver::new(config.placement.default_slot),
            anchors: AnchorManager::new(),
            monitor: TrackingMonitor::new(),
            display: DisplayGeometry::new(),
            compositor: FrameCompositor::from_config(&config.render),
            renderer: SceneRenderer::new(config),
        })
    }

    /// Create the session if needed, then resume it.
    ///
    /// Failures are shown to the user and returned; the pipeline keeps
    /// ticking without a session until a later resume succeeds.
    pub fn on_resume<F, H>(&mut self, factory: &mut F, host: &mut H) -> Result<()>
    where
        F: SessionFactory<Session = S>,
        H: DisplayHost + ?Sized,
    {
        if self.session.is_none() {
            match factory.create() {
                Ok(session) => {
                    log::info!("Tracking session created");
                    self.session = Some(session);
                    self.display.invalidate();
                }
                Err(err) => {
                    log::warn!("Session creation failed: {}", err);
                    host.notify(&session_error_message(&err));
                    return Err(err.into());
                }
            }
        }

        if let Some(session) = self.session.as_mut() {
            if let Err(err) = session.resume() {
                log::warn!("Session resume failed: {}", err);
                host.notify(&session_error_message(&err));
                session.close();
                self.session = None;
                self.anchors.clear();
                return Err(err.into());
            }
            log::info!("Tracking session resumed");
        }
        self.monitor.reset();
        Ok(())
    }

    /// Pause the session, keeping anchors
    pub fn on_pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.pause();
            log::info!("Tracking session paused");
        }
    }

    /// Close and drop the session along with every anchor it owned
    pub fn on_destroy(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            log::info!("Tracking session closed");
        }
        self.anchors.clear();
        self.monitor.reset();
    }

    /// Create GPU resources for a new surface
    pub fn on_surface_created<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        self.renderer.on_surface_created(backend)?;
        Ok(())
    }

    /// Surface resized
    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.display.on_surface_changed(width, height);
    }

    /// Display rotated
    pub fn set_display_rotation(&mut self, rotation: DisplayRotation) {
        self.display.set_rotation(rotation);
    }

    /// Producer handle for the input thread
    pub fn tap_sender(&self) -> TapSender {
        self.taps.sender()
    }

    /// A tap detector using the configured thresholds
    pub fn tap_detector(&self) -> TapDetector {
        TapDetector::new(&self.gestures)
    }

    /// Per-slot attachments
    pub fn anchors(&self) -> &AnchorManager {
        &self.anchors
    }

    /// The session, if one is up
    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    /// The session, mutably
    pub fn session_mut(&mut self) -> Option<&mut S> {
        self.session.as_mut()
    }

    /// Scene renderer state
    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    /// Run one tick
    pub fn on_draw_frame<B, H>(&mut self, backend: &mut B, host: &mut H) -> TickOutcome
    where
        B: RenderBackend + ?Sized,
        H: DisplayHost + ?Sized,
    {
        self.renderer.clear(backend);

        let Some(session) = self.session.as_mut() else {
            return TickOutcome::NoSession;
        };
        self.display.update_session_if_needed(session);
        if let Some(texture) = self.renderer.camera_texture() {
            session.set_camera_texture(texture);
        }

        let frame = match session.update() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("No frame this tick: {}", err);
                return TickOutcome::NoFrame(err.into());
            }
        };

        match self.process_frame(&frame, backend, host) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("Abandoning frame {}: {}", frame.timestamp(), err);
                TickOutcome::Abandoned(err)
            }
        }
    }

    fn process_frame<B, H>(&mut self, frame: &S::Frame, backend: &mut B, host: &mut H) -> Result<TickOutcome>
    where
        B: RenderBackend + ?Sized,
        H: DisplayHost + ?Sized,
    {
        let Some(session) = self.session.as_mut() else {
            return Ok(TickOutcome::NoSession);
        };
        let camera = frame.camera();
        let status = self.monitor.observe(camera, host);

        let mut placed = None;
        if let Some(request) = self.resolver.resolve(frame, self.taps.poll()) {
            if let Err(err) = self.anchors.attach(session, request.slot, &request.hit) {
                self.renderer.draw_background(backend, frame.timestamp())?;
                return Err(err);
            }
            placed = Some(request.slot);
        }
        self.anchors.sync(session);

        self.renderer.draw_background(backend, frame.timestamp())?;
        if status == TrackingStatus::Paused {
            return Ok(TickOutcome::Paused);
        }

        let planes = session.all_planes();
        let has_tracking_plane = planes.iter().any(|p| p.tracking_state == TrackingState::Tracking);
        self.monitor.observe_planes(has_tracking_plane, host);

        let matrices = self.compositor.compose(frame);
        {
            let cloud = frame.acquire_point_cloud()?;
            self.renderer.draw_point_cloud(backend, &cloud, &matrices)?;
        }
        let planes_drawn = self
            .renderer
            .draw_planes(backend, planes, &camera.display_oriented_pose, &matrices)?;

        let mut objects_drawn = Vec::new();
        for slot in ObjectSlot::ALL {
            let Some(attachment) = self.anchors.attachment(slot) else {
                continue;
            };
            if !attachment.is_tracking() {
                continue;
            }
            match self.renderer.draw_object(backend, slot, &attachment.pose(), &matrices) {
                Ok(()) => objects_drawn.push(slot),
                Err(RenderError::ModelNotLoaded(_)) => log::debug!("Skipping {}: model not loaded", slot),
                Err(err) => return Err(PipelineError::from(err)),
            }
        }
        log::debug!(
            "Frame {}: {} planes, objects {:?}",
            frame.timestamp(),
            planes_drawn,
            objects_drawn
        );

        Ok(TickOutcome::Rendered(FrameReport {
            timestamp: frame.timestamp(),
            placed,
            planes_drawn,
            objects_drawn,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{HostEvent, RecordingBackend, RecordingHost, SimSession, SimSessionFactory, SimWorld};

    fn pipeline() -> PlacementPipeline<SimSession> {
        PlacementPipeline::new(&ArConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ArConfig::default();
        config.render.near_clip = 0.0;
        let err = PlacementPipeline::<SimSession>::new(&config).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_tick_without_session_only_clears() {
        let mut pipeline = pipeline();
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();

        assert_eq!(pipeline.on_draw_frame(&mut backend, &mut host), TickOutcome::NoSession);
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn test_creation_failure_notifies_and_retries() {
        let mut pipeline = pipeline();
        let mut factory = SimSessionFactory::new(SimWorld::floor_scene());
        factory.fail_next(SessionError::PermissionDenied);
        let mut host = RecordingHost::default();

        let err = pipeline.on_resume(&mut factory, &mut host).unwrap_err();
        assert_eq!(err, PipelineError::SessionUnavailable(SessionError::PermissionDenied));
        assert!(pipeline.session().is_none());
        assert_eq!(
            host.events(),
            &[HostEvent::Notify("Camera permission is needed to run this application".to_string())]
        );

        pipeline.on_resume(&mut factory, &mut host).unwrap();
        assert!(pipeline.session().is_some());
    }

    #[test]
    fn test_update_failure_is_no_frame() {
        let mut pipeline = pipeline();
        let mut factory = SimSessionFactory::new(SimWorld::floor_scene());
        let mut backend = RecordingBackend::default();
        let mut host = RecordingHost::default();
        pipeline.on_surface_created(&mut backend).unwrap();
        pipeline.on_resume(&mut factory, &mut host).unwrap();

        pipeline
            .session_mut()
            .unwrap()
            .fail_next_update(SessionError::CameraNotAvailable);
        let outcome = pipeline.on_draw_frame(&mut backend, &mut host);
        assert_eq!(
            outcome,
            TickOutcome::NoFrame(PipelineError::SessionUnavailable(SessionError::CameraNotAvailable))
        );
        assert!(pipeline.on_draw_frame(&mut backend, &mut host).is_rendered());
    }
}
