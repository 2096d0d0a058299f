//! Burnout risk entrypoint: reads newline-delimited JSON requests from stdin
//! (or the file given as first argument) and writes one JSON response per line.
//! `health` and `info` print the service status instead.

use burnout_risk::{
    config::AppConfig,
    features::{FeatureEngineer, Thresholds},
    logging::{ErrorLine, StructuredLogger},
    model::ModelBundle,
    risk::PredictionPipeline,
    service::{BurnoutService, PredictionRequest},
    storage::RequestStore,
};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_SECRET: &[u8] = b"burnout-store-secret-placeholder";

fn build_service(config: &AppConfig) -> BurnoutService {
    let thresholds = Thresholds::shared(&config.thresholds);
    let engineer = FeatureEngineer::new(*thresholds);
    let pipeline = PredictionPipeline::from(ModelBundle::load(&config.model));
    let service = BurnoutService::new(engineer, pipeline);

    if !config.storage.enabled {
        return service;
    }
    let secret = match config.storage.secret.as_deref() {
        Some(s) => s.as_bytes(),
        None => {
            warn!("no store secret configured; names are encrypted with the placeholder key");
            DEFAULT_SECRET
        }
    };
    let db_path = config.storage.database_path();
    match RequestStore::open(&db_path, secret) {
        Ok(store) => {
            info!(path = %db_path.display(), "request store ready");
            service.with_sink(Arc::new(store))
        }
        Err(e) => {
            warn!(path = %db_path.display(), error = %e, "request store unavailable; requests will not be stored");
            service
        }
    }
}

fn serve(
    service: &BurnoutService,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    for (idx, bytes) in input.split(b'\n').enumerate() {
        let bytes = bytes?;
        let line_no = idx + 1;
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line,
            Err(e) => {
                let msg = format!("line is not valid UTF-8: {e}");
                StructuredLogger::emit_json(&ErrorLine { line: line_no, code: 400, error: &msg }, out)?;
                out.flush()?;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let request: PredictionRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                let msg = e.to_string();
                StructuredLogger::emit_json(&ErrorLine { line: line_no, code: 400, error: &msg }, out)?;
                out.flush()?;
                continue;
            }
        };
        match service.predict(&request) {
            Ok(response) => StructuredLogger::emit_json(&response, out)?,
            Err(e) => {
                warn!(line = line_no, error = %e, "request rejected");
                let msg = e.to_string();
                StructuredLogger::emit_json(
                    &ErrorLine { line: line_no, code: e.status_code(), error: &msg },
                    out,
                )?;
            }
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("BURNOUT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = AppConfig::from_env(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), "burnout risk service starting");

    let service = build_service(&config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match std::env::args().nth(1).as_deref() {
        Some("health") => StructuredLogger::emit_json(&service.health(), &mut out)?,
        Some("info") => StructuredLogger::emit_json(&service.info(), &mut out)?,
        Some(path) => {
            let file = std::fs::File::open(path)?;
            serve(&service, BufReader::new(file), &mut out)?;
        }
        None => serve(&service, std::io::stdin().lock(), &mut out)?,
    }

    info!("burnout risk service stopping");
    Ok(())
}
