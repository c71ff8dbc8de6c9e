//! `catsync sync|apply|run|status|mapping|clear`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::info;

use catsync_config::Settings;
use catsync_fetch::{BlockingHttp, CacheStore, Fetcher, SourceSync, TargetSync};
use catsync_recon::catalog::source::{WikiItem, WikiVehicle, WikiVehicleSummary};
use catsync_recon::catalog::target::{UexItem, UexVehicle};
use catsync_recon::{
    apply_updates, index_by_name, prepare_updates, ApplyOptions, ApplySummary, Mapping,
    MappingConfig, MappingError, MatchSummary, QueueStore, ResourceType, SourceRecord,
    StoreError, TargetRecord, UpdateQueue,
};

use crate::exit_codes::{EXIT_APPLY_FAILURES, EXIT_CONFIG, EXIT_ERROR, EXIT_STORE};
use crate::outbox::OutboxApplier;
use crate::CliError;

/// Resolved settings and directories for one invocation.
pub struct Context {
    pub settings: Settings,
    pub cache: CacheStore,
    pub outbox_dir: PathBuf,
}

impl Context {
    pub fn new(settings: Settings, cache_dir_override: Option<PathBuf>) -> Self {
        let cache_dir = cache_dir_override.unwrap_or_else(|| settings.effective_cache_dir());
        let outbox_dir = settings.effective_outbox_dir(&cache_dir);
        Self {
            settings,
            cache: CacheStore::new(cache_dir),
            outbox_dir,
        }
    }

    fn fetcher(&self, use_cache: bool) -> Result<Fetcher, CliError> {
        let http = BlockingHttp::new(Duration::from_secs(self.settings.http_timeout_secs))
            .map_err(|e| CliError { code: EXIT_ERROR, message: e.to_string(), hint: None })?;
        let cache = use_cache.then(|| self.cache.clone());
        Ok(Fetcher::new(Box::new(http), cache))
    }

    fn load_queue(&self, resource: ResourceType) -> Result<UpdateQueue, CliError> {
        self.cache.load_queue(resource).map_err(store_err)
    }
}

pub struct SyncOptions {
    pub mapping: Option<PathBuf>,
    pub no_cache: bool,
    pub dry_run: bool,
}

pub struct ApplyArgs {
    pub outbox: Option<PathBuf>,
    pub dry_run: bool,
    pub strict: bool,
}

fn store_err(e: StoreError) -> CliError {
    CliError {
        code: EXIT_STORE,
        message: e.to_string(),
        hint: Some("check that the cache directory is writable (--cache-dir or cache.dir)".into()),
    }
}

fn mapping_err(e: MappingError) -> CliError {
    CliError {
        code: EXIT_CONFIG,
        message: e.to_string(),
        hint: Some("run `catsync mapping <resource>` to list the effective mapping".into()),
    }
}

// ── Mapping ─────────────────────────────────────────────────────────

fn load_mapping_config(path: Option<&Path>) -> Result<MappingConfig, CliError> {
    let Some(path) = path else {
        return Ok(MappingConfig::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_CONFIG,
        message: format!("cannot read mapping file {}: {e}", path.display()),
        hint: None,
    })?;
    MappingConfig::from_toml(&contents).map_err(mapping_err)
}

/// Check `mapping` against the catalog types behind `resource`.
fn validate_for(resource: ResourceType, mapping: Mapping) -> Result<Mapping, MappingError> {
    match resource {
        ResourceType::Vehicles => {
            mapping.clone().validate::<WikiVehicle, UexVehicle>()?;
        }
        ResourceType::Items => {
            mapping.clone().validate::<WikiItem, UexItem>()?;
        }
    }
    Ok(mapping)
}

pub fn cmd_mapping(resource: ResourceType, mapping_file: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_mapping_config(mapping_file.as_deref())?;
    let mapping = validate_for(resource, config.mapping_for(resource)).map_err(mapping_err)?;

    let origin = if config.has_override(resource) { "override" } else { "default" };
    println!("{resource} mapping ({origin}, {} fields):", mapping.entries.len());
    for entry in &mapping.entries {
        match entry.transform {
            Some(t) => println!("  {:<16} <- {} [{t}]", entry.target, entry.source_path()),
            None => println!("  {:<16} <- {}", entry.target, entry.source_path()),
        }
    }
    Ok(())
}

// ── Sync ────────────────────────────────────────────────────────────

/// Returns the merged queue, written to the cache unless `opts.dry_run`.
pub fn cmd_sync(
    ctx: &Context,
    resource: ResourceType,
    opts: &SyncOptions,
) -> Result<(MatchSummary, UpdateQueue), CliError> {
    let config = load_mapping_config(opts.mapping.as_deref())?;
    let mapping = config.mapping_for(resource);

    let (summary, queue) = match resource {
        ResourceType::Vehicles => sync_resource::<WikiVehicle, UexVehicle>(
            ctx,
            resource,
            mapping,
            opts,
            |source| source.list_detailed::<WikiVehicleSummary, WikiVehicle>(resource.source_endpoint()),
        )?,
        ResourceType::Items => sync_resource::<WikiItem, UexItem>(ctx, resource, mapping, opts, |source| {
            source.list(resource.source_endpoint())
        })?,
    };

    eprintln!(
        "{resource}: {} targets: {} queued, {} up to date, {} without wiki match, {} already finalized",
        summary.targets,
        summary.matched,
        summary.up_to_date,
        summary.no_source_match,
        summary.skipped_finalized,
    );
    if opts.dry_run {
        eprintln!("dry run: update queue not written");
    }
    Ok((summary, queue))
}

fn sync_resource<S, T>(
    ctx: &Context,
    resource: ResourceType,
    mapping: Mapping,
    opts: &SyncOptions,
    fetch_sources: impl FnOnce(&SourceSync<'_>) -> Vec<S>,
) -> Result<(MatchSummary, UpdateQueue), CliError>
where
    S: SourceRecord,
    T: TargetRecord + DeserializeOwned,
{
    // Fail fast: nothing is fetched with an invalid mapping.
    let mapping = mapping.validate::<S, T>().map_err(mapping_err)?;
    let fetcher = ctx.fetcher(!opts.no_cache)?;
    let settings = &ctx.settings;

    let source = SourceSync::new(
        &fetcher,
        &settings.source_base_url,
        settings.source_page_limit,
        settings.locale().map(str::to_string),
    );
    let sources = fetch_sources(&source);
    let index = index_by_name(&sources);

    let targets: Vec<T> =
        TargetSync::new(&fetcher, &settings.target_base_url).list(resource.target_endpoint());

    let mut queue = ctx.load_queue(resource)?;
    let summary = prepare_updates(&mut queue, &index, &targets, &mapping);

    if !opts.dry_run {
        ctx.cache.save_queue(resource, &queue).map_err(store_err)?;
        info!(%resource, records = queue.len(), "update queue saved");
    }
    Ok((summary, queue))
}

// ── Apply ───────────────────────────────────────────────────────────

pub fn cmd_apply(ctx: &Context, resource: ResourceType, args: &ApplyArgs) -> Result<ApplySummary, CliError> {
    let mut queue = ctx.load_queue(resource)?;
    cmd_apply_queue(ctx, resource, &mut queue, args)
}

/// Replay `queue`, which may not match the persisted document in a dry run.
pub fn cmd_apply_queue(
    ctx: &Context,
    resource: ResourceType,
    queue: &mut UpdateQueue,
    args: &ApplyArgs,
) -> Result<ApplySummary, CliError> {
    let outbox_dir = args.outbox.clone().unwrap_or_else(|| ctx.outbox_dir.clone());
    let mut applier = OutboxApplier::new(&outbox_dir, &ctx.settings.target_edit_url);

    let summary = apply_updates(
        resource,
        queue,
        &mut applier,
        &ctx.cache,
        ApplyOptions { dry_run: args.dry_run },
    )
    .map_err(store_err)?;

    eprintln!(
        "{resource}: {} attempted: {} submitted, {} failed, {} skipped",
        summary.attempted, summary.submitted, summary.failed, summary.skipped,
    );
    if summary.submitted > 0 && !args.dry_run {
        eprintln!("outbox: {}", outbox_dir.join(resource.as_str()).display());
    }

    if args.strict && summary.failed > 0 {
        return Err(CliError {
            code: EXIT_APPLY_FAILURES,
            message: format!("{} update(s) failed", summary.failed),
            hint: Some(format!("failed records stay failed; inspect them with `catsync status {resource}`")),
        });
    }
    Ok(summary)
}

pub fn cmd_run(
    ctx: &Context,
    resource: ResourceType,
    sync: &SyncOptions,
    apply: &ApplyArgs,
) -> Result<(), CliError> {
    // The in-memory queue carries the planned changes even when `--dry-run`
    // kept them off disk.
    let (_, mut queue) = cmd_sync(ctx, resource, sync)?;
    cmd_apply_queue(ctx, resource, &mut queue, apply)?;
    Ok(())
}

// ── Status / clear ──────────────────────────────────────────────────

pub fn cmd_status(ctx: &Context, resource: ResourceType, json: bool) -> Result<(), CliError> {
    let queue = ctx.load_queue(resource)?;
    let stats = queue.stats();

    if json {
        let pending: Vec<_> = queue.pending().collect();
        let out = serde_json::json!({
            "resource": resource,
            "stats": stats,
            "pending": pending,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError { code: EXIT_ERROR, message: format!("JSON serialization error: {e}"), hint: None })?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "{resource}: {} records: {} pending, {} submitted, {} failed",
        stats.total, stats.pending, stats.submitted, stats.failed,
    );
    for record in queue.pending() {
        println!("  {:>6}  {:<32} {}", record.id, record.name, record.changed_fields().join(", "));
    }
    Ok(())
}

pub fn cmd_clear(ctx: &Context, resource: ResourceType) -> Result<(), CliError> {
    let removed = ctx.cache.clear_queue(resource).map_err(|e| store_err(e.into()))?;
    if removed {
        eprintln!("{resource}: update queue removed");
    } else {
        eprintln!("{resource}: no update queue to remove");
    }
    Ok(())
}
