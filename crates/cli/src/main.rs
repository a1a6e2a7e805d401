mod dashboard;
mod frame_source;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use face_insight_core::analysis::domain::analysis_result::AnalysisResult;
use face_insight_core::analysis::domain::detector_backend::DetectorBackend;
use face_insight_core::analysis::domain::warmup_observer::WarmupObserver;
use face_insight_core::analysis::infrastructure::replay_face_analyzer::ReplayFaceAnalyzer;
use face_insight_core::pipeline::analysis_scheduler::{AnalysisScheduler, SchedulerStats};
use face_insight_core::pipeline::scheduler_config::SchedulerConfig;
use face_insight_core::shared::constants::{DEFAULT_ANALYSIS_INTERVAL, DEFAULT_RESULT_TTL};

use dashboard::DashboardState;

const FRAME_CHANNEL_CAPACITY: usize = 8;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Replays image frames through the face analysis scheduler and prints a
/// live text dashboard of the detected faces.
#[derive(Parser)]
#[command(name = "face-insight")]
struct Cli {
    /// Image file or directory of images used as video frames.
    input: PathBuf,

    /// JSON script of analysis results to play back.
    #[arg(long)]
    replay: PathBuf,

    /// Frames between analysis opportunities.
    #[arg(long, default_value_t = DEFAULT_ANALYSIS_INTERVAL)]
    interval: usize,

    /// Seconds a result stays on the dashboard.
    #[arg(long, default_value_t = DEFAULT_RESULT_TTL.as_secs_f64())]
    ttl: f64,

    /// Frames per second to feed the scheduler.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Times to repeat the frame sequence.
    #[arg(long, default_value = "1")]
    loops: usize,

    /// Simulated inference latency per call, in milliseconds.
    #[arg(long, default_value = "0")]
    latency_ms: u64,

    /// Simulated one-time model load latency, in milliseconds.
    #[arg(long, default_value = "0")]
    warmup_ms: u64,

    /// Preferred face detector backend.
    #[arg(long, default_value = "retinaface")]
    detector: DetectorBackend,

    /// Detector retried when the preferred one fails ("none" disables).
    #[arg(long, default_value = "opencv")]
    fallback_detector: String,

    /// Make this detector backend fail (repeatable).
    #[arg(long)]
    fail_backend: Vec<DetectorBackend>,

    /// Print dashboard updates as JSON lines.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let scheduler = build_scheduler(&cli)?;
    let paths = frame_source::collect_image_paths(&cli.input)?;
    log::info!(
        "Replaying {} frame(s) x{} at {} fps, analyzing every {} frame(s)",
        paths.len(),
        cli.loops,
        cli.fps,
        scheduler.analysis_interval()
    );

    let (frame_rx, reader_handle) =
        frame_source::spawn_reader(paths, cli.loops, FRAME_CHANNEL_CAPACITY);
    let ticker = crossbeam_channel::tick(frame_period(cli.fps)?);

    let mut shown: Option<Vec<AnalysisResult>> = None;
    let mut last_index = 0;
    for frame_result in frame_rx {
        ticker.recv()?;
        let frame = frame_result
            .map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() })?;
        last_index = frame.index();

        scheduler.submit_frame(&frame);
        show_if_changed(&mut shown, last_index, scheduler.read_all(), cli.json)?;
    }

    if reader_handle.join().is_err() {
        return Err("Reader thread panicked".into());
    }

    if !scheduler.wait_idle(SHUTDOWN_TIMEOUT) {
        log::warn!("Analysis still running after {SHUTDOWN_TIMEOUT:?}, exiting anyway");
    }
    show_if_changed(&mut shown, last_index, scheduler.read_all(), cli.json)?;

    log::info!("{}", summary(&scheduler.stats()));
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    frame_period(cli.fps)?;
    seconds(cli.ttl, "--ttl")?;
    if cli.loops == 0 {
        return Err("--loops must be >= 1".into());
    }
    Ok(())
}

fn seconds(value: f64, flag: &str) -> Result<Duration, String> {
    if !(value.is_finite() && value > 0.0) {
        return Err(format!("{flag} must be greater than 0"));
    }
    Duration::try_from_secs_f64(value).map_err(|e| format!("{flag} out of range: {e}"))
}

fn frame_period(fps: f64) -> Result<Duration, String> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err("--fps must be greater than 0".into());
    }
    seconds(1.0 / fps, "--fps").map_err(|_| format!("--fps out of range: {fps}"))
}

fn build_scheduler(cli: &Cli) -> Result<AnalysisScheduler, Box<dyn std::error::Error>> {
    let mut analyzer = ReplayFaceAnalyzer::from_path(&cli.replay)?
        .with_latency(Duration::from_millis(cli.latency_ms))
        .with_warmup_latency(Duration::from_millis(cli.warmup_ms));
    for backend in &cli.fail_backend {
        analyzer = analyzer.with_failing_backend(*backend);
    }

    let config = SchedulerConfig {
        analysis_interval: cli.interval,
        result_ttl: seconds(cli.ttl, "--ttl")?,
        detector: cli.detector,
        fallback_detector: parse_fallback(&cli.fallback_detector)?,
        ..SchedulerConfig::default()
    };

    let observer: Arc<dyn WarmupObserver> = Arc::new(|message: Option<&str>| match message {
        Some(text) => eprintln!("{text}"),
        None => eprintln!("Model ready"),
    });

    Ok(AnalysisScheduler::new(Box::new(analyzer), observer, config)?)
}

fn parse_fallback(value: &str) -> Result<Option<DetectorBackend>, String> {
    if value.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

fn show_if_changed(
    shown: &mut Option<Vec<AnalysisResult>>,
    frame_index: usize,
    faces: Vec<AnalysisResult>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if shown.as_ref() == Some(&faces) {
        return Ok(());
    }

    let state = DashboardState::new(frame_index, &faces);
    if json {
        println!("{}", serde_json::to_string(&state)?);
    } else {
        println!("{}", state.render());
    }
    *shown = Some(faces);
    Ok(())
}

fn summary(stats: &SchedulerStats) -> String {
    format!(
        "Analysis summary: {} frames, {} dispatched, {} published, {} empty, {} failed, {} fallbacks",
        stats.frames_submitted,
        stats.dispatched,
        stats.published,
        stats.empty,
        stats.failed,
        stats.fallbacks
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["face-insight", "frames/", "--replay", "r.json"]).unwrap();

        assert_eq!(cli.interval, 15);
        assert_eq!(cli.ttl, 2.0);
        assert_eq!(cli.detector, DetectorBackend::RetinaFace);
        assert_eq!(cli.fallback_detector, "opencv");
        assert!(cli.fail_backend.is_empty());
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_repeatable_fail_backend() {
        let cli = Cli::try_parse_from([
            "face-insight",
            "frames/",
            "--replay",
            "r.json",
            "--fail-backend",
            "retinaface",
            "--fail-backend",
            "mtcnn",
        ])
        .unwrap();

        assert_eq!(
            cli.fail_backend,
            vec![DetectorBackend::RetinaFace, DetectorBackend::Mtcnn]
        );
    }

    #[test]
    fn test_cli_requires_replay() {
        assert!(Cli::try_parse_from(["face-insight", "frames/"]).is_err());
    }

    #[rstest]
    #[case("none", None)]
    #[case("NONE", None)]
    #[case("opencv", Some(DetectorBackend::OpenCv))]
    #[case("ssd", Some(DetectorBackend::Ssd))]
    fn test_parse_fallback(#[case] value: &str, #[case] expected: Option<DetectorBackend>) {
        assert_eq!(parse_fallback(value).unwrap(), expected);
    }

    #[rstest]
    #[case("--ttl", "1e20")]
    #[case("--ttl", "0")]
    #[case("--ttl", "-2")]
    #[case("--ttl", "inf")]
    #[case("--fps", "1e-320")]
    #[case("--fps", "0")]
    #[case("--fps", "-30")]
    #[case("--loops", "0")]
    fn test_validate_rejects_out_of_range(#[case] flag: &str, #[case] value: &str) {
        let arg = format!("{flag}={value}");
        let cli = Cli::try_parse_from(["face-insight", ".", "--replay", "r.json", &arg]).unwrap();
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let cli = Cli::try_parse_from(["face-insight", ".", "--replay", "r.json"]).unwrap();
        assert!(validate(&cli).is_ok());
    }

    #[rstest]
    #[case(30.0, Duration::from_secs_f64(1.0 / 30.0))]
    #[case(0.5, Duration::from_secs(2))]
    fn test_frame_period(#[case] fps: f64, #[case] expected: Duration) {
        assert_eq!(frame_period(fps).unwrap(), expected);
    }

    #[test]
    fn test_parse_fallback_rejects_unknown() {
        assert!(parse_fallback("haar").is_err());
    }

    #[test]
    fn test_summary_lists_counters() {
        let stats = SchedulerStats {
            frames_submitted: 30,
            dispatched: 2,
            published: 1,
            empty: 1,
            failed: 0,
            fallbacks: 0,
        };
        assert_eq!(
            summary(&stats),
            "Analysis summary: 30 frames, 2 dispatched, 1 published, 1 empty, 0 failed, 0 fallbacks"
        );
    }

    #[test]
    fn test_show_if_changed_only_prints_changes() {
        let mut shown = None;
        show_if_changed(&mut shown, 0, vec![], false).unwrap();
        assert_eq!(shown, Some(vec![]));

        show_if_changed(&mut shown, 1, vec![], false).unwrap();
        assert_eq!(shown, Some(vec![]));
    }
}
