//! Focus Puller - depth-camera autofocus for a stepper follow focus
//!
//! This is the CLI entry point. It runs the control loop against the
//! simulated rig with a dry-run motor.
//! Run with: cargo run --bin focus-puller -- [--yes] [--save]

use focus_puller::config::{get_messages, is_affirmative, Messages, SetupChecklist};
use focus_puller::fusion::ProfileLayout;
use focus_puller::selection::PressOutcome;
use focus_puller::sim::{IouTracker, SceneConfig, SimDetector, SyntheticScene};
use focus_puller::vision::Point;
use focus_puller::{
    AppSettings, DryRunActuator, FocusController, FpsCounter, LightingCondition, MotorConfig,
    MotorController, MotorLink, MotorLut, TargetSelection, TickReport, VisionStack,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

/// Tick on which the CLI picks a subject on the operator's behalf.
const AUTO_SELECT_TICK: u64 = 10;
/// Ticks between status lines.
const STATUS_EVERY: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing, RUST_LOG wins over the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let assume_yes = args.iter().any(|arg| arg == "--yes" || arg == "-y");
    let save_settings = args.iter().any(|arg| arg == "--save");

    let mut settings = AppSettings::load();
    settings.apply_env();
    let msgs = get_messages(&settings.lang);

    println!("🎯 Focus Puller");
    println!("================================================");
    println!("Lighting: {}", settings.lighting().label());
    println!("{}: {:.2} s", msgs.focus_time, settings.focus_time_s);
    println!("Camera offset: {:.3} m", settings.camera_offset_m);
    println!("Tick interval: {} ms", settings.tick_interval().as_millis());
    println!("Depth profile: {}", settings.profile_png_path().display());
    match settings.motor_lut_path() {
        Some(path) => println!("Motor LUT: {}", path.display()),
        None => println!("Motor LUT: built-in"),
    }
    println!("================================================\n");

    let lighting = run_setup(msgs, settings.lighting(), assume_yes)?;
    settings.lighting = lighting.key().to_string();
    if save_settings {
        settings.save()?;
        println!("Settings saved");
    }

    let lut = match settings.motor_lut_path() {
        Some(path) => Arc::new(MotorLut::from_json_file(path)?),
        None => MotorLut::builtin(),
    };

    let motor = MotorController::spawn(DryRunActuator::new(), MotorConfig::default())?;
    let vision = VisionStack {
        source: Box::new(SyntheticScene::new(SceneConfig::default()).with_drop_every(97)),
        detector: Box::new(SimDetector::new()),
        tracker: Box::new(IouTracker::new()),
    };
    let mut controller =
        FocusController::new(settings.control_config(), lighting.curve(), lut, vision, motor);

    run_loop(&mut controller, &settings, msgs).await;

    println!("\n{}", msgs.homing);
    controller.shutdown(settings.shutdown_timeout())?;
    println!("{} 👋", msgs.goodbye);

    Ok(())
}

/// Walk the operator through the rig setup. `--yes` confirms every step.
fn run_setup(
    msgs: &Messages,
    lighting: LightingCondition,
    assume_yes: bool,
) -> anyhow::Result<LightingCondition> {
    println!("{}", msgs.setup_title);
    let mut checklist = SetupChecklist::new();
    checklist.confirm_min_focus(confirm(msgs.setup_min_focus, msgs, assume_yes)?);
    checklist.confirm_motor_mounted(confirm(msgs.setup_mount_motor, msgs, assume_yes)?);
    println!("  - {} {}", msgs.setup_lighting, lighting.label());
    checklist.select_lighting(lighting);
    println!();

    checklist
        .finish()
        .map_err(|e| anyhow::anyhow!("{} ({})", msgs.setup_incomplete, e))
}

fn confirm(step: &str, msgs: &Messages, assume_yes: bool) -> io::Result<bool> {
    println!("  - {}", step);
    if assume_yes {
        return Ok(true);
    }
    print!("    {} ", msgs.confirm_prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(is_affirmative(&line))
}

/// Tick the controller at the configured rate until Ctrl-C or the tick limit.
async fn run_loop<M: MotorLink>(
    controller: &mut FocusController<M>,
    settings: &AppSettings,
    msgs: &Messages,
) {
    let mut ticker = interval(settings.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut fps = FpsCounter::default();
    let mut count: u64 = 0;
    let mut last_selection = TargetSelection::None;
    let mut select_at = AUTO_SELECT_TICK;
    let profile_path = settings.profile_png_path();
    let layout = ProfileLayout::default();
    println!("{}", msgs.select_subject);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, stopping control loop");
                break;
            }
            _ = ticker.tick() => {
                count += 1;
                match controller.tick() {
                    Ok(Some(report)) => {
                        let rate = fps.tick();
                        if focus_point_lost(last_selection, report.selection) {
                            println!("{}", msgs.tracking_lost);
                            controller.reset();
                            println!("{}", msgs.reset_tracking);
                            select_at = count + AUTO_SELECT_TICK;
                        }
                        last_selection = report.selection;
                        if count % STATUS_EVERY == 0 {
                            print_status(&report, rate, msgs);
                            if let Err(e) = report.profile.save_png(&layout, &profile_path) {
                                tracing::warn!("Failed to write depth profile: {}", e);
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Tick abandoned: {}", e),
                }

                if count == select_at {
                    auto_select(controller, msgs);
                    last_selection = controller.selection();
                }
                if settings.ticks > 0 && count >= settings.ticks {
                    tracing::info!("Tick limit {} reached", settings.ticks);
                    break;
                }
            }
        }
    }
}

/// A flow point that was being followed dropped out this tick.
fn focus_point_lost(previous: TargetSelection, current: TargetSelection) -> bool {
    matches!(previous, TargetSelection::FlowPoint(_)) && current == TargetSelection::None
}

/// Stand-in for the operator's tap: lock the person nearest the ROI centre,
/// or follow the centre point with optical flow when nobody is in view.
fn auto_select<M: MotorLink>(controller: &mut FocusController<M>, msgs: &Messages) {
    let Some(roi) = controller.roi() else {
        return;
    };
    let centre = Point::new(
        (roi.start.x + roi.end.x) / 2,
        (roi.start.y + roi.end.y) / 2,
    );
    let distance = |p: Point| {
        let d = p - centre;
        d.x * d.x + d.y * d.y
    };
    let target = controller
        .tracks()
        .iter()
        .map(|t| {
            Point::new(
                ((t.bbox.x1 + t.bbox.x2) / 2.0) as i32,
                ((t.bbox.y1 + t.bbox.y2) / 2.0) as i32,
            )
        })
        .min_by_key(|p| distance(*p))
        .unwrap_or(centre);

    match controller.press(target) {
        PressOutcome::TrackLocked(id) => {
            println!("{}: {} {}", msgs.focus_subject, msgs.person, id)
        }
        PressOutcome::FlowPointSet(p) => println!("{}: ({}, {})", msgs.focus_subject, p.x, p.y),
        other => tracing::debug!("Auto-select press ignored: {:?}", other),
    }
    controller.release();
}

fn print_status(report: &TickReport, fps: f64, msgs: &Messages) {
    let source = report.source.map_or("-", |s| s.name());
    println!(
        "{:5.1} fps | {}: {:.2} m ({}) | steps {} -> {}{}",
        fps,
        msgs.focus_distance,
        report.focus_distance_m,
        source,
        report.current_steps,
        report.target_steps,
        if report.locked { " 🔒" } else { "" }
    );
}
