use anyhow::{bail, Context, Result};
use crabface::platform::list_cameras;
use crabface::{
    CaptureController, CrabFaceConfig, HttpBackend, JobKind, LogReporter, NativeCamera,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

const USAGE: &str = "Usage: crabface-cli <list-devices|enroll <name>|train|recognize|detect> [--config <path>] [--json]";

struct Options {
    command: String,
    name: Option<String>,
    config_path: PathBuf,
    json: bool,
}

fn main() -> Result<()> {
    crabface::init_logging();

    let options = parse_args(env::args().skip(1).collect())?;
    if options.command == "list-devices" {
        return cmd_list_devices(options.json);
    }

    let config = CrabFaceConfig::load_layered(&options.config_path)
        .with_context(|| format!("loading {}", options.config_path.display()))?;
    let controller = Arc::new(build_controller(config)?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let kind = match options.command.as_str() {
        "enroll" => Some(JobKind::EnrollStream),
        "recognize" => Some(JobKind::RecognizeBurst),
        "detect" => Some(JobKind::DetectSingle),
        _ => None,
    };
    if let Some(kind) = kind {
        let handler_controller = controller.clone();
        ctrlc::set_handler(move || {
            log::info!("Interrupted, cancelling {}", kind);
            handler_controller.cancel(kind);
        })
        .context("installing Ctrl-C handler")?;
    }

    runtime.block_on(async move {
        match options.command.as_str() {
            "enroll" => {
                let name = options.name.unwrap_or_default();
                let handle = controller.start_enrollment(&name).await?;
                let summary = handle.wait().await?;
                print_json_or(options.json, &summary, || {
                    format!(
                        "{} frames accepted ({} submitted), ready to train: {}",
                        summary.accepted, summary.submitted, summary.ready_to_finalize
                    )
                })
            }
            "train" => {
                let users = controller.finalize_training().await?;
                print_json_or(options.json, &users, || users.join("\n"))
            }
            "recognize" => {
                let outcome = controller.run_recognition().await?;
                print_json_or(options.json, &outcome, || format!("{:?}", outcome))
            }
            "detect" => {
                let outcome = controller.run_detection().await?;
                print_json_or(options.json, &outcome, || format!("{:?}", outcome))
            }
            other => bail!("Unknown command: {}\n{}", other, USAGE),
        }
    })
}

fn parse_args(args: Vec<String>) -> Result<Options> {
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        bail!(USAGE);
    };

    let mut options = Options {
        command,
        name: None,
        config_path: CrabFaceConfig::default_path(),
        json: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                options.config_path = PathBuf::from(path);
            }
            "--json" => options.json = true,
            _ if options.name.is_none() && options.command == "enroll" => {
                options.name = Some(arg);
            }
            _ => bail!("Unexpected argument: {}\n{}", arg, USAGE),
        }
    }

    Ok(options)
}

fn build_controller(config: CrabFaceConfig) -> Result<CaptureController> {
    let camera = Arc::new(NativeCamera::new(config.camera.device_index));
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    Ok(CaptureController::new(
        camera,
        backend,
        Arc::new(LogReporter),
        config,
    ))
}

fn cmd_list_devices(json: bool) -> Result<()> {
    let devices = list_cameras()?;
    print_json_or(json, &devices, || {
        devices
            .iter()
            .map(|d| format!("{}: {}", d.index, d.name))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn print_json_or<T: serde::Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
