use crate::config::{
    self, GeneratorSettings, Layout, ENDPOINT_AUTH_CONFIG_FILE, KRAKEND_CONFIG_FILE,
};
use crate::endpoint::{normalize, EndpointSet, MergeOutcome, NormalizeContext};
use crate::mapping::{self, RawEndpointRecord};
use crate::{output, policy};
use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI arguments forwarded from `main()`.
pub struct GenerateArgs {
    pub root: PathBuf,
    pub env: String,
    pub settings_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

/// Counters for one pass over the raw endpoint records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    pub read: usize,
    pub rejected: usize,
    pub created: usize,
    pub merged: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub env: String,
    pub output_path: PathBuf,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub records: RecordStats,
    pub elapsed: Duration,
}

/// Full run: init logging, resolve settings, generate.
///
/// The returned guard must outlive every log call; `main` holds it until
/// exit.
pub fn run(args: GenerateArgs) -> Result<(GenerationReport, WorkerGuard)> {
    let guard = init_tracing(args.log_format);

    let layout = Layout::new(args.root, args.env);
    let settings_path = args
        .settings_path
        .or_else(|| layout.default_settings_file());
    let settings = GeneratorSettings::load(settings_path.as_deref())?;

    let report = generate(&layout, &settings)?;
    Ok((report, guard))
}

fn init_tracing(format: LogFormat) -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(false);

    // try_init: a subscriber may already be installed when embedded in tests.
    let result = match format {
        LogFormat::Text => tracing_subscriber::registry().with(filter).with(fmt).try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt.with_ansi(false).json())
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("logging: subscriber already installed: {e}");
    }

    guard
}

/// Load every input under `layout`, build the gateway document and write it
/// to `result/<env>/krakend.json`.
pub fn generate(layout: &Layout, settings: &GeneratorSettings) -> Result<GenerationReport> {
    let start = Instant::now();
    tracing::info!(
        "generator: starting, env={}, root={}",
        layout.env(),
        layout.root().display()
    );

    // Phase 1: required configs, any failure aborts the run.
    let (base, env) = layout.config_pair(KRAKEND_CONFIG_FILE);
    let (_, gateway) = config::load_json_object(&base, &env)?;
    let extra_config = config::load_extra_config(layout)?;
    let (base, env) = layout.config_pair(ENDPOINT_AUTH_CONFIG_FILE);
    let (_, auth_config) = config::load_json_config(&base, &env)?;

    // Phase 2: optional origin allow-list, host mapping, endpoint rows.
    let allow_origins = policy::load_allow_origins(&layout.origin_allow_list())?;
    let hosts = mapping::load_service_host_mapping(&layout.service_host_mapping())?;
    let batch = mapping::load_endpoint_records(&layout.api_mapping_dir())?;

    // Phase 3: normalize + merge, accumulating the CORS sets per record.
    let ctx = NormalizeContext {
        hosts: &hosts,
        auth_config: &auth_config,
        settings,
    };
    let mut endpoints = EndpointSet::new();
    let mut cors = policy::CorsAccumulator::new();
    let records = process_records(&batch.records, &ctx, &mut endpoints, &mut cors);

    // Phase 4: assemble + write.
    let cors_policy = cors.finish(allow_origins);
    tracing::info!(
        "policy: cors resolved, origins={}, methods={}, headers={}",
        cors_policy.allow_origins.len(),
        cors_policy.allow_methods.len(),
        cors_policy.allow_headers.len()
    );
    let document = output::assemble(gateway, endpoints.into_endpoints(), extra_config, &cors_policy)?;
    let output_path = layout.result_file();
    output::write_document(&output_path, &document)?;

    let report = GenerationReport {
        env: layout.env().to_string(),
        output_path,
        files_loaded: batch.files_loaded,
        files_skipped: batch.files_skipped,
        records,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        files_loaded = report.files_loaded,
        files_skipped = report.files_skipped,
        records_read = report.records.read,
        records_rejected = report.records.rejected,
        endpoints_created = report.records.created,
        records_merged = report.records.merged,
        elapsed = %humantime::format_duration(report.elapsed),
        "generator: completed"
    );
    Ok(report)
}

/// Normalize every row and fold it into `endpoints`.
///
/// Invalid rows are logged and skipped before they can touch either
/// accumulator. Accepted rows feed `cors` before merging, so the CORS sets
/// reflect every accepted row rather than only the surviving endpoints.
pub fn process_records(
    records: &[Value],
    ctx: &NormalizeContext<'_>,
    endpoints: &mut EndpointSet,
    cors: &mut policy::CorsAccumulator,
) -> RecordStats {
    let mut stats = RecordStats {
        read: records.len(),
        ..RecordStats::default()
    };

    for (index, value) in records.iter().enumerate() {
        let record = match RawEndpointRecord::from_value(value) {
            Ok(record) => record,
            Err(reason) => {
                tracing::warn!(
                    "endpoint: skipped record, index={}, reason={}, record={}",
                    index,
                    reason,
                    value
                );
                stats.rejected += 1;
                continue;
            }
        };

        tracing::debug!(
            "endpoint: processing record, service={}, method={}, path={}",
            record.service,
            record.method,
            record.path
        );

        let candidate = normalize(&record, ctx);
        cors.observe(&candidate);
        match endpoints.merge(candidate) {
            MergeOutcome::Created => stats.created += 1,
            MergeOutcome::Merged => stats.merged += 1,
        }
    }

    stats
}
