use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plane_anchors::config::AppConfig;
use plane_anchors::input::tap_queue;
use plane_anchors::io::{Scenario, ScenarioPlayer};
use plane_anchors::render::{FrameLoop, FrameOutcome, SkipReason, TapOutcome};
use plane_anchors::session::SimSession;
use plane_anchors::viz::LogSink;

/// Frames rendered after the last scripted event, so late taps settle.
const TRAILING_FRAMES: u64 = 30;

fn main() -> Result<()> {
    let scenario_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/demo_scenario.csv".to_string());
    let config = match std::env::args().nth(2) {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let scenario = Scenario::load(&scenario_path)?;
    info!(path = %scenario_path, events = scenario.len(), "Loaded scenario");

    let session = SimSession::new(config.display, config.vertical_fov_deg);
    let (taps, tap_consumer) = tap_queue(config.tap_queue_capacity);
    let mut frame_loop = FrameLoop::new(session, tap_consumer, &config);
    let mut player = ScenarioPlayer::new(scenario);
    let mut sink = LogSink::new();

    frame_loop.on_surface_changed(config.display.width, config.display.height);
    frame_loop.on_resume();

    let last_frame = player.last_frame() + TRAILING_FRAMES;
    for frame_idx in 0..=last_frame {
        player.apply_frame(frame_idx, frame_loop.session_mut(), &taps)?;

        match frame_loop.on_draw_frame(&mut sink) {
            FrameOutcome::Rendered(report) => {
                if report.surface_found {
                    info!(frame = frame_idx, "Surface found, tap to place objects");
                }
                match &report.tap {
                    TapOutcome::Attached(outcome) => info!(
                        frame = frame_idx,
                        object = %outcome.id,
                        evicted = ?outcome.evicted,
                        objects = report.objects_drawn,
                        "Tap placed object"
                    ),
                    TapOutcome::Missed => info!(frame = frame_idx, "Tap missed every surface"),
                    TapOutcome::Rejected(reason) => warn!(frame = frame_idx, %reason, "Tap rejected"),
                    TapOutcome::Discarded | TapOutcome::None => {}
                }
                if report.stale_objects > 0 {
                    info!(
                        frame = frame_idx,
                        stale = report.stale_objects,
                        drawn = report.objects_drawn,
                        "Some objects lost tracking"
                    );
                }
            }
            FrameOutcome::Skipped(SkipReason::NotTracking) => {}
            FrameOutcome::Skipped(SkipReason::UpdateFailed(_)) => {}
        }
    }

    let stats = frame_loop.stats().clone();
    let placed = frame_loop.attachments().len();
    frame_loop.shutdown();
    let released = frame_loop.session().released_anchors().len();

    info!(
        rendered = stats.frames_rendered,
        skipped = stats.frames_skipped,
        taps = stats.taps_handled,
        attached = stats.objects_attached,
        placed_at_exit = placed,
        anchors_released = released,
        object_draws = sink.totals().object_draws,
        "Session finished"
    );

    Ok(())
}
