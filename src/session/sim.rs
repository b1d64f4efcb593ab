//! In-memory AR session with scriptable planes, anchors and camera.
//!
//! The world state lives behind `Arc<RwLock<_>>` so that plane and anchor
//! handles given out earlier observe later changes, the same way handles
//! into a real tracker do. Nothing here estimates anything: poses and
//! tracking states change only through the control methods.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Result, bail};
use nalgebra::{Matrix4, Vector3};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::geometry::frames::perspective;
use crate::geometry::{DisplayGeometry, Ray, SE3};
use crate::input::Tap;
use crate::tracking::{Anchor, AnchorId, Plane, PlaneId, PlaneType, TrackingState};

use super::{ArSession, Frame, HitResult, PlaneHit};

/// Nominal 30 fps camera.
const FRAME_INTERVAL_NS: u64 = 33_333_333;

/// Feature points closer than this to a tap ray are reported as hits (m).
const POINT_HIT_RADIUS: f64 = 0.02;

#[derive(Debug, Clone)]
struct PlaneState {
    plane_type: PlaneType,
    tracking_state: TrackingState,
    center_pose: SE3,
    /// Full size of the boundary rectangle along local X and Z (m).
    extent_x: f64,
    extent_z: f64,
}

impl PlaneState {
    fn contains(&self, point: &Vector3<f64>) -> bool {
        let local = self.center_pose.inverse().transform_point(point);
        local.x.abs() <= self.extent_x * 0.5 && local.z.abs() <= self.extent_z * 0.5
    }
}

#[derive(Debug, Clone)]
struct AnchorState {
    pose: SE3,
    tracking_state: TrackingState,
}

#[derive(Debug)]
struct SimWorld {
    planes: BTreeMap<PlaneId, PlaneState>,
    anchors: BTreeMap<AnchorId, AnchorState>,
    camera_pose: SE3,
    camera_tracking: TrackingState,
    light_intensity: f32,
    point_cloud: Vec<Vector3<f64>>,
    next_plane_id: u64,
    next_anchor_id: u64,
}

impl SimWorld {
    fn new() -> Self {
        Self {
            planes: BTreeMap::new(),
            anchors: BTreeMap::new(),
            camera_pose: SE3::identity(),
            camera_tracking: TrackingState::Tracking,
            light_intensity: 1.0,
            point_cloud: Vec::new(),
            next_plane_id: 0,
            next_anchor_id: 0,
        }
    }
}

/// Handle to a simulated plane.
#[derive(Clone)]
pub struct SimPlane {
    id: PlaneId,
    world: Arc<RwLock<SimWorld>>,
}

impl fmt::Debug for SimPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimPlane").field("id", &self.id).finish()
    }
}

impl Plane for SimPlane {
    fn id(&self) -> PlaneId {
        self.id
    }

    fn plane_type(&self) -> PlaneType {
        self.world
            .read()
            .planes
            .get(&self.id)
            .map_or(PlaneType::HorizontalUpwardFacing, |p| p.plane_type)
    }

    fn tracking_state(&self) -> TrackingState {
        self.world
            .read()
            .planes
            .get(&self.id)
            .map_or(TrackingState::Stopped, |p| p.tracking_state)
    }

    fn center_pose(&self) -> SE3 {
        self.world
            .read()
            .planes
            .get(&self.id)
            .map_or_else(SE3::identity, |p| p.center_pose)
    }

    fn is_pose_in_polygon(&self, pose: &SE3) -> bool {
        self.world
            .read()
            .planes
            .get(&self.id)
            .is_some_and(|p| p.contains(&pose.translation))
    }
}

/// Handle to a simulated anchor.
#[derive(Clone)]
pub struct SimAnchor {
    id: AnchorId,
    world: Arc<RwLock<SimWorld>>,
}

impl fmt::Debug for SimAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimAnchor").field("id", &self.id).finish()
    }
}

impl Anchor for SimAnchor {
    fn id(&self) -> AnchorId {
        self.id
    }

    fn tracking_state(&self) -> TrackingState {
        self.world
            .read()
            .anchors
            .get(&self.id)
            .map_or(TrackingState::Stopped, |a| a.tracking_state)
    }

    fn pose(&self) -> SE3 {
        self.world
            .read()
            .anchors
            .get(&self.id)
            .map_or_else(SE3::identity, |a| a.pose)
    }
}

/// Deterministic stand-in for a device AR session.
pub struct SimSession {
    world: Arc<RwLock<SimWorld>>,
    display: DisplayGeometry,
    fov_y_rad: f64,
    timestamp_ns: u64,
    paused: bool,
    pending_failure: Option<String>,
    pending_anchor_failure: Option<String>,
    /// Every anchor id passed to `remove_anchors`, in call order.
    released: Vec<AnchorId>,
}

impl SimSession {
    pub fn new(display: DisplayGeometry, fov_y_deg: f64) -> Self {
        Self {
            world: Arc::new(RwLock::new(SimWorld::new())),
            display,
            fov_y_rad: fov_y_deg.to_radians(),
            timestamp_ns: 0,
            paused: false,
            pending_failure: None,
            pending_anchor_failure: None,
            released: Vec::new(),
        }
    }

    /// Start tracking a rectangular plane of `extent_x` × `extent_z` meters.
    pub fn add_plane(
        &mut self,
        plane_type: PlaneType,
        center_pose: SE3,
        extent_x: f64,
        extent_z: f64,
    ) -> SimPlane {
        let mut world = self.world.write();
        let id = PlaneId::new(world.next_plane_id);
        world.next_plane_id += 1;
        world.planes.insert(
            id,
            PlaneState {
                plane_type,
                tracking_state: TrackingState::Tracking,
                center_pose,
                extent_x,
                extent_z,
            },
        );
        debug!(plane = %id, ?plane_type, height = center_pose.height(), "Plane detected");

        SimPlane {
            id,
            world: Arc::clone(&self.world),
        }
    }

    pub fn plane(&self, id: PlaneId) -> Option<SimPlane> {
        self.world.read().planes.contains_key(&id).then(|| SimPlane {
            id,
            world: Arc::clone(&self.world),
        })
    }

    pub fn set_plane_tracking(&mut self, id: PlaneId, state: TrackingState) -> Result<()> {
        match self.world.write().planes.get_mut(&id) {
            Some(plane) => {
                plane.tracking_state = state;
                Ok(())
            }
            None => bail!("unknown plane {}", id),
        }
    }

    pub fn move_plane(&mut self, id: PlaneId, center_pose: SE3) -> Result<()> {
        match self.world.write().planes.get_mut(&id) {
            Some(plane) => {
                plane.center_pose = center_pose;
                Ok(())
            }
            None => bail!("unknown plane {}", id),
        }
    }

    pub fn set_anchor_tracking(&mut self, id: AnchorId, state: TrackingState) -> Result<()> {
        match self.world.write().anchors.get_mut(&id) {
            Some(anchor) => {
                anchor.tracking_state = state;
                Ok(())
            }
            None => bail!("unknown anchor {}", id),
        }
    }

    pub fn set_anchor_pose(&mut self, id: AnchorId, pose: SE3) -> Result<()> {
        match self.world.write().anchors.get_mut(&id) {
            Some(anchor) => {
                anchor.pose = pose;
                Ok(())
            }
            None => bail!("unknown anchor {}", id),
        }
    }

    /// Shift every live anchor's estimate by `delta`.
    pub fn drift_anchors(&mut self, delta: Vector3<f64>) {
        let shift = SE3::from_translation(delta);
        let mut world = self.world.write();
        for anchor in world
            .anchors
            .values_mut()
            .filter(|a| a.tracking_state != TrackingState::Stopped)
        {
            anchor.pose = shift.compose(&anchor.pose);
        }
    }

    pub fn set_camera_pose(&mut self, pose: SE3) {
        self.world.write().camera_pose = pose;
    }

    pub fn set_camera_tracking(&mut self, state: TrackingState) {
        self.world.write().camera_tracking = state;
    }

    pub fn set_light_intensity(&mut self, intensity: f32) {
        self.world.write().light_intensity = intensity.clamp(0.0, 1.0);
    }

    pub fn add_feature_point(&mut self, point: Vector3<f64>) {
        self.world.write().point_cloud.push(point);
    }

    /// Make the next `update()` fail once.
    pub fn fail_next_update(&mut self, reason: impl Into<String>) {
        self.pending_failure = Some(reason.into());
    }

    /// Make the next `add_anchor()` fail once.
    pub fn fail_next_anchor(&mut self, reason: impl Into<String>) {
        self.pending_anchor_failure = Some(reason.into());
    }

    pub fn pause(&mut self) {
        info!("Session paused");
        self.paused = true;
    }

    pub fn resume(&mut self) {
        info!("Session resumed");
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Anchors that have not been removed.
    pub fn anchors(&self) -> Vec<SimAnchor> {
        self.world
            .read()
            .anchors
            .iter()
            .filter(|(_, a)| a.tracking_state != TrackingState::Stopped)
            .map(|(id, _)| SimAnchor {
                id: *id,
                world: Arc::clone(&self.world),
            })
            .collect()
    }

    /// Every anchor id ever passed to `remove_anchors`, in call order.
    pub fn released_anchors(&self) -> &[AnchorId] {
        &self.released
    }

    pub fn display(&self) -> DisplayGeometry {
        self.display
    }

    pub fn fov_y_rad(&self) -> f64 {
        self.fov_y_rad
    }
}

impl ArSession for SimSession {
    type Anchor = SimAnchor;
    type Plane = SimPlane;

    fn update(&mut self) -> Result<Frame> {
        if self.paused {
            bail!("session is paused");
        }
        if let Some(reason) = self.pending_failure.take() {
            bail!("tracker update failed: {}", reason);
        }
        self.timestamp_ns += FRAME_INTERVAL_NS;

        let world = self.world.read();
        Ok(Frame {
            timestamp_ns: self.timestamp_ns,
            tracking_state: world.camera_tracking,
            camera_pose: world.camera_pose,
            light_intensity: world.light_intensity,
            point_cloud: world.point_cloud.clone(),
        })
    }

    fn hit_test(&self, frame: &Frame, tap: &Tap) -> Vec<HitResult<SimPlane>> {
        let ray = Ray::through_pixel(&frame.camera_pose, &self.display, self.fov_y_rad, tap.x, tap.y);
        let world = self.world.read();
        let mut hits = Vec::new();

        for (id, state) in world
            .planes
            .iter()
            .filter(|(_, p)| p.tracking_state.is_tracking())
        {
            let Some(t) = ray.intersect_plane(&state.center_pose) else {
                continue;
            };
            let point = ray.point_at(t);
            hits.push(HitResult::Plane(PlaneHit {
                plane: SimPlane {
                    id: *id,
                    world: Arc::clone(&self.world),
                },
                hit_pose: SE3::from_rt(state.center_pose.rotation, point),
                distance: t,
            }));
        }

        for point in &frame.point_cloud {
            if let Some((t, offset)) = ray.closest_approach(point) {
                if offset <= POINT_HIT_RADIUS {
                    hits.push(HitResult::Point { distance: t });
                }
            }
        }

        hits.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
        hits
    }

    fn add_anchor(&mut self, pose: &SE3) -> Result<SimAnchor> {
        if self.paused {
            bail!("cannot create anchor: session is paused");
        }
        if let Some(reason) = self.pending_anchor_failure.take() {
            bail!("cannot create anchor: {}", reason);
        }
        let mut world = self.world.write();
        if !world.camera_tracking.is_tracking() {
            bail!("cannot create anchor: camera is {}", world.camera_tracking);
        }
        let id = AnchorId::new(world.next_anchor_id);
        world.next_anchor_id += 1;
        world.anchors.insert(
            id,
            AnchorState {
                pose: *pose,
                tracking_state: TrackingState::Tracking,
            },
        );
        debug!(anchor = %id, "Anchor created");

        Ok(SimAnchor {
            id,
            world: Arc::clone(&self.world),
        })
    }

    fn remove_anchors(&mut self, anchors: &[SimAnchor]) {
        let mut world = self.world.write();
        for anchor in anchors {
            self.released.push(anchor.id);
            if let Some(state) = world.anchors.get_mut(&anchor.id) {
                state.tracking_state = TrackingState::Stopped;
            }
            debug!(anchor = %anchor.id, "Anchor released");
        }
    }

    fn all_planes(&self) -> Vec<SimPlane> {
        self.world
            .read()
            .planes
            .keys()
            .map(|id| SimPlane {
                id: *id,
                world: Arc::clone(&self.world),
            })
            .collect()
    }

    fn projection_matrix(&self, near: f64, far: f64) -> Matrix4<f64> {
        perspective(&self.display, self.fov_y_rad, near, far)
    }

    fn set_display_geometry(&mut self, width: f64, height: f64) {
        debug!(width, height, "Display geometry changed");
        self.display = DisplayGeometry::new(width, height);
    }
}
