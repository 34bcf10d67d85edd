//! `drive-agent` – replay recorded detections through the driving agent.
//!
//! Reads one JSON object per line, from a file or stdin:
//!
//! ```text
//! {"width":640,"height":480,"detections":[
//!     {"class_id":9,"confidence":0.7,"bbox":[100,50,140,110],"color":"Red"},
//!     [2,0.9,280,380,360,460]
//! ]}
//! ```
//!
//! Detections are either objects, the flat `[class, conf, x1, y1, x2, y2]`
//! layout, or the same with a trailing colour (`"Red"`, `"Green"`,
//! `"Yellow"`, `"Unknown"` or `null`). For every frame one
//! `ACTION<TAB>reason` line is printed. Bad lines are logged and skipped.
//!
//! Usage: `drive-agent [--config drive-agent.toml] [FILE]`
//!
//! Recorded traffic lights carry their own colour, so only the `[agent]` and
//! `[pipeline]` tables of the settings file apply here; `[color]` is read by
//! `DrivePipeline::from_settings` when frames are available.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process::ExitCode;

use serde::Deserialize;
use tracing::{error, info, warn};

use drive_agent::{
    Decision, Detection, DetectionBuilder, DrivingAgent, LightColor, Settings, telemetry,
};

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    width: u32,
    height: u32,
    #[serde(default)]
    detections: Vec<RecordedDetection>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordedDetection {
    Object {
        class_id: u32,
        #[serde(default = "full_confidence")]
        confidence: f32,
        bbox: [f32; 4],
        #[serde(default)]
        color: Option<LightColor>,
    },
    Flat(Vec<f32>),
    FlatWithColor(f32, f32, f32, f32, f32, f32, Option<LightColor>),
}

fn full_confidence() -> f32 {
    1.0
}

impl RecordedDetection {
    fn into_detection(self) -> Result<Detection, drive_agent::AgentError> {
        match self {
            RecordedDetection::Object {
                class_id,
                confidence,
                bbox: [x1, y1, x2, y2],
                color,
            } => DetectionBuilder::new()
                .class(class_id)
                .score(confidence)
                .tlbr(x1, y1, x2, y2)
                .color(color)
                .build(),
            RecordedDetection::Flat(fields) => DetectionBuilder::from_fields(&fields)?.build(),
            RecordedDetection::FlatWithColor(class, conf, x1, y1, x2, y2, color) => {
                DetectionBuilder::from_fields(&[class, conf, x1, y1, x2, y2])?
                    .color(color)
                    .build()
            }
        }
    }
}

struct Args {
    config: Option<String>,
    input: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        input: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                args.config = Some(iter.next().ok_or("--config needs a path")?);
            }
            "--help" | "-h" => {
                return Err("usage: drive-agent [--config drive-agent.toml] [FILE]".to_string());
            }
            _ if args.input.is_none() => args.input = Some(arg),
            _ => return Err(format!("unexpected argument `{arg}`")),
        }
    }
    Ok(args)
}

fn decide_line(
    agent: &DrivingAgent,
    confidence_threshold: f32,
    line: &str,
) -> Result<Decision, String> {
    let frame: RecordedFrame = serde_json::from_str(line).map_err(|e| e.to_string())?;
    let detections = frame
        .detections
        .into_iter()
        .map(RecordedDetection::into_detection)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?
        .into_iter()
        .filter(|det| det.score >= confidence_threshold)
        .collect::<Vec<_>>();
    agent
        .decide(&detections, frame.width, frame.height)
        .map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    telemetry::init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };

    let settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "failed to load settings");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut settings = Settings::default();
            settings.apply_env_overrides();
            if let Err(e) = settings.validate() {
                error!(error = %e, "invalid settings from environment");
                return ExitCode::FAILURE;
            }
            settings
        }
    };

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                error!(path = %path, error = %e, "failed to open input");
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let agent = match DrivingAgent::try_new(settings.agent) {
        Ok(agent) => agent,
        Err(e) => {
            error!(error = %e, "invalid agent settings");
            return ExitCode::FAILURE;
        }
    };
    let threshold = settings.pipeline.confidence_threshold;
    let mut out = io::stdout().lock();
    let (mut decided, mut skipped) = (0u64, 0u64);

    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to read input");
                return ExitCode::FAILURE;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match decide_line(&agent, threshold, &line) {
            Ok(decision) => {
                decided += 1;
                if writeln!(out, "{}\t{}", decision.action, decision.reason).is_err() {
                    // stdout closed (e.g. piped into `head`)
                    break;
                }
            }
            Err(e) => {
                skipped += 1;
                warn!(line = index + 1, error = %e, "skipping frame");
            }
        }
    }

    info!(decided, skipped, "replay finished");
    ExitCode::SUCCESS
}
