//! Scripted sessions for the simulated tracker.
//!
//! A scenario is a CSV file without header; `#` starts a comment line.
//! Every row is `frame,command,args...`, and rows may have different lengths:
//!
//! ```text
//! # frame,command,args...
//! 0,camera,0,1.5,0,0.7071068,-0.7071068,0,0
//! 0,plane,floor,0,0,0,4,4,up
//! 10,tap,540,960
//! 20,drift,0,0.05,0
//! 30,plane_state,floor,paused
//! 40,camera_state,tracking
//! 50,point,0.1,0.2,-1
//! 60,fail,camera frame dropped
//! 65,move_plane,floor,0,0.1,0
//! 70,light,0.4
//! 80,pause
//! 82,resume
//! 90,anchor_fail,out of resources
//! ```
//!
//! Camera quaternions are w-first. Plane types are `up`, `down` or `vertical`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, Trim};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;

use crate::geometry::SE3;
use crate::input::{Tap, TapProducer};
use crate::session::SimSession;
use crate::tracking::{Plane, PlaneId, PlaneType, TrackingState};

/// One scripted change to the simulated world.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioAction {
    AddPlane {
        label: String,
        center: Vector3<f64>,
        extent_x: f64,
        extent_z: f64,
        plane_type: PlaneType,
    },
    PlaneTracking {
        label: String,
        state: TrackingState,
    },
    CameraPose(SE3),
    CameraTracking(TrackingState),
    Tap(Tap),
    /// Re-center a plane, keeping its orientation.
    MovePlane {
        label: String,
        center: Vector3<f64>,
    },
    DriftAnchors(Vector3<f64>),
    FeaturePoint(Vector3<f64>),
    LightIntensity(f32),
    Pause,
    Resume,
    FailUpdate(String),
    FailAnchor(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioEvent {
    /// Frame index before which the action is applied.
    pub frame: u64,
    pub action: ScenarioAction,
}

#[derive(Debug, Clone, Default)]
pub struct Scenario {
    /// Sorted by frame; rows of the same frame keep file order.
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut events = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            if rec.iter().all(str::is_empty) {
                continue;
            }
            let line = rec.position().map_or(0, |p| p.line());
            let event = parse_event(&rec).with_context(|| format!("line {}", line))?;
            events.push(event);
        }
        events.sort_by_key(|e| e.frame);

        Ok(Self { events })
    }

    pub fn last_frame(&self) -> u64 {
        self.events.last().map_or(0, |e| e.frame)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn field<T>(rec: &StringRecord, idx: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    let raw = rec
        .get(idx)
        .with_context(|| format!("missing field '{}' (column {})", name, idx + 1))?;
    let parsed: Result<T, anyhow::Error> = raw.parse::<T>().map_err(Into::into);
    parsed.with_context(|| format!("invalid {} '{}'", name, raw))
}

fn vector_at(rec: &StringRecord, idx: usize, name: &str) -> Result<Vector3<f64>> {
    Ok(Vector3::new(
        field(rec, idx, &format!("{}.x", name))?,
        field(rec, idx + 1, &format!("{}.y", name))?,
        field(rec, idx + 2, &format!("{}.z", name))?,
    ))
}

/// Remaining columns from `idx` on, re-joined with commas.
fn reason_from(rec: &StringRecord, idx: usize) -> String {
    let parts: Vec<&str> = rec.iter().skip(idx).collect();
    if parts.is_empty() {
        "scripted failure".to_string()
    } else {
        parts.join(",")
    }
}

fn parse_event(rec: &StringRecord) -> Result<ScenarioEvent> {
    let frame: u64 = field(rec, 0, "frame")?;
    let command: String = field(rec, 1, "command")?;

    let action = match command.to_ascii_lowercase().as_str() {
        "plane" => ScenarioAction::AddPlane {
            label: field(rec, 2, "label")?,
            center: vector_at(rec, 3, "center")?,
            extent_x: field(rec, 6, "extent_x")?,
            extent_z: field(rec, 7, "extent_z")?,
            plane_type: match rec.get(8) {
                Some(raw) if !raw.is_empty() => raw.parse()?,
                _ => PlaneType::HorizontalUpwardFacing,
            },
        },
        "plane_state" => ScenarioAction::PlaneTracking {
            label: field(rec, 2, "label")?,
            state: field(rec, 3, "state")?,
        },
        "camera" => {
            let position = vector_at(rec, 2, "position")?;
            ScenarioAction::CameraPose(SE3::from_quaternion(
                field(rec, 5, "qw")?,
                field(rec, 6, "qx")?,
                field(rec, 7, "qy")?,
                field(rec, 8, "qz")?,
                position,
            ))
        }
        "camera_state" => ScenarioAction::CameraTracking(field(rec, 2, "state")?),
        "tap" => ScenarioAction::Tap(Tap::new(field(rec, 2, "x")?, field(rec, 3, "y")?)),
        "move_plane" => ScenarioAction::MovePlane {
            label: field(rec, 2, "label")?,
            center: vector_at(rec, 3, "center")?,
        },
        "drift" => ScenarioAction::DriftAnchors(vector_at(rec, 2, "delta")?),
        "point" => ScenarioAction::FeaturePoint(vector_at(rec, 2, "point")?),
        "light" => ScenarioAction::LightIntensity(field(rec, 2, "intensity")?),
        "pause" => ScenarioAction::Pause,
        "resume" => ScenarioAction::Resume,
        "fail" => ScenarioAction::FailUpdate(reason_from(rec, 2)),
        "anchor_fail" => ScenarioAction::FailAnchor(reason_from(rec, 2)),
        other => bail!("unknown command '{}'", other),
    };

    Ok(ScenarioEvent { frame, action })
}

/// Orientation giving a plane of `plane_type` the right surface normal.
fn plane_orientation(plane_type: PlaneType) -> UnitQuaternion<f64> {
    match plane_type {
        PlaneType::HorizontalUpwardFacing => UnitQuaternion::identity(),
        PlaneType::HorizontalDownwardFacing => {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
        }
        // Normal along world +Z.
        PlaneType::Vertical => {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2)
        }
    }
}

/// Feeds a scenario into a `SimSession` and a tap queue, frame by frame.
pub struct ScenarioPlayer {
    scenario: Scenario,
    cursor: usize,
    planes: HashMap<String, PlaneId>,
}

impl ScenarioPlayer {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            cursor: 0,
            planes: HashMap::new(),
        }
    }

    pub fn last_frame(&self) -> u64 {
        self.scenario.last_frame()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.scenario.events.len()
    }

    /// Apply every not-yet-applied event scheduled at or before `frame`.
    pub fn apply_frame(&mut self, frame: u64, session: &mut SimSession, taps: &TapProducer) -> Result<()> {
        while let Some(event) = self.scenario.events.get(self.cursor) {
            if event.frame > frame {
                break;
            }
            self.cursor += 1;
            apply_action(&mut self.planes, &event.action, session, taps)
                .with_context(|| format!("frame {}", event.frame))?;
        }
        Ok(())
    }
}

fn apply_action(
    planes: &mut HashMap<String, PlaneId>,
    action: &ScenarioAction,
    session: &mut SimSession,
    taps: &TapProducer,
) -> Result<()> {
    match action {
        ScenarioAction::AddPlane {
            label,
            center,
            extent_x,
            extent_z,
            plane_type,
        } => {
            if planes.contains_key(label) {
                bail!("plane '{}' already exists", label);
            }
            let pose = SE3::from_rt(plane_orientation(*plane_type), *center);
            let plane = session.add_plane(*plane_type, pose, *extent_x, *extent_z);
            planes.insert(label.clone(), plane.id());
        }
        ScenarioAction::PlaneTracking { label, state } => {
            session.set_plane_tracking(plane_id(planes, label)?, *state)?;
        }
        ScenarioAction::MovePlane { label, center } => {
            let id = plane_id(planes, label)?;
            let rotation = session
                .plane(id)
                .map(|plane| plane.center_pose().rotation)
                .with_context(|| format!("plane '{}' is gone", label))?;
            session.move_plane(id, SE3::from_rt(rotation, *center))?;
        }
        ScenarioAction::CameraPose(pose) => session.set_camera_pose(*pose),
        ScenarioAction::CameraTracking(state) => session.set_camera_tracking(*state),
        ScenarioAction::Tap(tap) => {
            if !taps.offer(*tap) {
                debug!(x = tap.x, y = tap.y, "Scripted tap dropped");
            }
        }
        ScenarioAction::DriftAnchors(delta) => session.drift_anchors(*delta),
        ScenarioAction::FeaturePoint(point) => session.add_feature_point(*point),
        ScenarioAction::LightIntensity(intensity) => session.set_light_intensity(*intensity),
        ScenarioAction::Pause => session.pause(),
        ScenarioAction::Resume => session.resume(),
        ScenarioAction::FailUpdate(reason) => session.fail_next_update(reason.clone()),
        ScenarioAction::FailAnchor(reason) => session.fail_next_anchor(reason.clone()),
    }
    Ok(())
}

fn plane_id(planes: &HashMap<String, PlaneId>, label: &str) -> Result<PlaneId> {
    planes
        .get(label)
        .copied()
        .with_context(|| format!("unknown plane '{}'", label))
}
