//! Structured JSON-lines logging for the transition engine.
//!
//! Every record carries a run id, a monotonic sequence number and an
//! RFC3339 timestamp so a session can be replayed from its event log.
//! Records go to `<LOG_DIR>/<RUN_ID>/events.jsonl` (trace/debug go to
//! `trace.jsonl`) and are echoed to stdout.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::catalog::RegimeId;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            Ok("fatal") => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Catalog,    // Catalog validation, lookups
    Autoplay,   // Ticks, pause/resume, reversals
    Navigation, // Manual jumps, preview paths, animator steps
    Strategy,   // Strategy resolution
    System,     // Startup, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Catalog => "catalog",
            Domain::Autoplay => "autoplay",
            Domain::Navigation => "navigation",
            Domain::Strategy => "strategy",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self, filter: Option<&[String]>) -> bool {
        filter.map_or(true, |domains| domains.iter().any(|d| d == self.as_str()))
    }
}

/// LOG_DOMAINS: comma-separated list or "all"
fn domain_filter_from_env() -> Option<Vec<String>> {
    match std::env::var("LOG_DOMAINS").as_deref() {
        Ok("all") | Err(_) => None,
        Ok(domains) => Some(domains.split(',').map(|d| d.trim().to_string()).collect()),
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    min_level: Level,
    domains: Option<Vec<String>>,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_log(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(file) => Some(Mutex::new(BufWriter::new(file))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn default_log_dir() -> PathBuf {
    match std::env::var("LOG_DIR") {
        Ok(dir) => PathBuf::from(dir),
        // Unit tests never write into the crate tree
        Err(_) if cfg!(test) => std::env::temp_dir().join("regimefx-runs"),
        Err(_) => PathBuf::from("out/runs"),
    }
}

/// Pin the run directory base before anything logs. Returns false when a
/// run context already exists, in which case `base` is ignored.
pub fn init_run_dir(base: impl Into<PathBuf>) -> bool {
    let mut fresh = false;
    RUN_CONTEXT.get_or_init(|| {
        fresh = true;
        open_run(base.into())
    });
    fresh
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| open_run(default_log_dir()))
}

fn open_run(base: PathBuf) -> RunContext {
    let run_id = std::env::var("RUN_ID")
        .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
    let mut run_dir = base;
    run_dir.push(&run_id);
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
    }

    let _ = std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    );

    RunContext {
        min_level: Level::from_env(),
        domains: domain_filter_from_env(),
        events: open_log(run_dir.join("events.jsonl")),
        trace: open_log(run_dir.join("trace.jsonl")),
        run_id,
    }
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["regime", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    if level < ctx.min_level || !domain.is_enabled(ctx.domains.as_deref()) {
        return;
    }
    emit_record(ctx, level, domain.as_str(), event, fields);
}

fn emit_record(
    ctx: &RunContext,
    level: Level,
    component: &str,
    event: &str,
    fields: Map<String, Value>,
) {
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    println!("{}", line);
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_tick(from: RegimeId, to: RegimeId, direction: &str, flipped: bool) {
    log(
        Level::Debug,
        Domain::Autoplay,
        "tick",
        obj(&[
            ("regime", v_str(to.key())),
            ("from", v_str(from.key())),
            ("direction", v_str(direction)),
            ("flipped", Value::Bool(flipped)),
        ]),
    );
}

pub fn log_jump(from: RegimeId, to: RegimeId, via_path: bool) {
    log(
        Level::Info,
        Domain::Navigation,
        "manual_jump",
        obj(&[
            ("regime", v_str(to.key())),
            ("from", v_str(from.key())),
            ("via_path", Value::Bool(via_path)),
        ]),
    );
}

pub fn log_path(path: &[RegimeId], description: &str) {
    log(
        Level::Info,
        Domain::Navigation,
        "preview_path",
        obj(&[
            ("path", Value::Array(path.iter().map(|id| v_str(id.key())).collect())),
            ("msg", v_str(description)),
        ]),
    );
}

pub fn log_step(regime: RegimeId, index: usize, of: usize) {
    log(
        Level::Debug,
        Domain::Navigation,
        "step",
        obj(&[
            ("regime", v_str(regime.key())),
            ("index", json!(index)),
            ("len", json!(of)),
        ]),
    );
}

pub fn log_strategy(regime: RegimeId, title: &str, label: Option<&str>) {
    log(
        Level::Debug,
        Domain::Strategy,
        "resolved",
        obj(&[
            ("regime", v_str(regime.key())),
            ("title", v_str(title)),
            ("direction_label", label.map(v_str).unwrap_or(Value::Null)),
        ]),
    );
}

/// Session summary on shutdown
pub fn log_session_summary(ticks: u64, jumps: u64, navigations: u64, rejected: u64) {
    log(
        Level::Info,
        Domain::System,
        "session_summary",
        obj(&[
            ("ticks", json!(ticks)),
            ("jumps", json!(jumps)),
            ("navigations", json!(navigations)),
            ("rejected", json!(rejected)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}
