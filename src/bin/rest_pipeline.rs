//! Command-line entry point.
//!
//! Reads an invocation document from a file argument or stdin, executes it and
//! prints the classified response as JSON on stdout. Logs go to stderr and are
//! controlled by `RUST_LOG`.
//!
//! ```text
//! rest-pipeline [--data-dir <dir>] [invocation.json]
//! ```
//!
//! The invocation document has the shape
//! `{"request": {...}, "environment": {...}?, "collection": {"id", "authentication"}?}`.
//! With `--data-dir`, persisted settings are loaded from `<dir>/settings.json`.

use rest_pipeline::config::{get_config, load_persisted};
use rest_pipeline::environment::Environment;
use rest_pipeline::models::{AuthConfig, RequestDefinition};
use rest_pipeline::store::{FsBlobStore, VersionedStore};
use rest_pipeline::transport::ReqwestTransport;
use rest_pipeline::{CollectionContext, ExecutionContext, RequestPipeline};
use serde::Deserialize;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Invocation {
    request: RequestDefinition,
    #[serde(default)]
    environment: Option<Environment>,
    #[serde(default)]
    collection: Option<CollectionInput>,
}

#[derive(Debug, Deserialize)]
struct CollectionInput {
    id: String,
    #[serde(default)]
    authentication: AuthConfig,
}

struct Args {
    data_dir: Option<String>,
    input: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        data_dir: None,
        input: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data-dir" => {
                args.data_dir = Some(iter.next().ok_or("--data-dir requires a value")?);
            }
            "-h" | "--help" => {
                return Err("usage: rest-pipeline [--data-dir <dir>] [invocation.json]".to_string())
            }
            _ if args.input.is_none() => args.input = Some(arg),
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }
    Ok(args)
}

fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

async fn run() -> Result<(), String> {
    let args = parse_args()?;

    if let Some(dir) = &args.data_dir {
        let backend = Arc::new(FsBlobStore::new(dir));
        let store = if get_config().read_only_store {
            VersionedStore::read_only(backend)
        } else {
            VersionedStore::new(backend)
        };
        let config = load_persisted(&store).await.map_err(|e| e.to_string())?;
        log::debug!("Loaded settings from {}: timeout {}s", dir, config.timeout_secs);
    }

    let input = read_input(args.input.as_deref())?;
    let invocation: Invocation =
        serde_json::from_str(&input).map_err(|e| format!("invalid invocation: {}", e))?;

    let correlation_id = uuid::Uuid::new_v4().to_string();
    let context = ExecutionContext {
        environment: invocation.environment,
        collection: invocation.collection.map(|c| CollectionContext {
            id: c.id,
            authentication: c.authentication,
        }),
        correlation_id: Some(correlation_id.clone()),
    };

    let pipeline = RequestPipeline::with_transport(Arc::new(ReqwestTransport::new()));

    let response = tokio::select! {
        result = pipeline.execute(&invocation.request, &context) => result.map_err(|e| e.to_string())?,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, cancelling {}", correlation_id);
            let _ = pipeline.cancel(&correlation_id).await;
            return Err("cancelled".to_string());
        }
    };

    let output = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
    println!("{}", output);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::debug!("rest-pipeline {}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
