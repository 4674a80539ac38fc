use crate::config::{LoggingConfig, Section};
use std::collections::HashMap;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, util::SubscriberInitExt, Layer};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

// Keep a guard for non-blocking console to avoid being dropped.
static CONSOLE_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

// ================= level helpers =================

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

fn level_filter(s: &str) -> LevelFilter {
    parse_tracing_level(s)
        .map(LevelFilter::from_level)
        .unwrap_or(LevelFilter::OFF)
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_target_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// ================= rotating writer for files =================

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotWriterHandle(SharedRotate);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file writer poisoned"))?
            .write(buf)
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file writer poisoned"))?
            .flush()
    }
}

// A writer handle that may be None (drops writes)
struct RoutedWriterHandle(Option<RotWriterHandle>);

impl Write for RoutedWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Route log records to different files by target prefix, e.g. "svckit::registrar".
#[derive(Clone, Default)]
struct MultiFileRouter {
    default: Option<SharedRotate>,
    by_prefix: Vec<(String, SharedRotate)>,
}

impl MultiFileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriterHandle> {
        // Longest prefix first, so "svckit::host" beats "svckit".
        self.by_prefix
            .iter()
            .filter(|(prefix, _)| matches_target_prefix(target, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, w)| RotWriterHandle(w.clone()))
            .or_else(|| self.default.clone().map(RotWriterHandle))
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for MultiFileRouter {
    type Writer = RoutedWriterHandle;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriterHandle(self.default.clone().map(RotWriterHandle))
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriterHandle(self.resolve_for(meta.target()))
    }
}

// ================= config extraction =================

struct ConfigData<'a> {
    default_section: Option<&'a Section>,
    target_sections: Vec<(String, &'a Section)>,
}

fn extract_config_data(cfg: &LoggingConfig) -> ConfigData<'_> {
    let mut target_sections = cfg
        .iter()
        .filter(|(k, _)| k.as_str() != "default")
        .map(|(k, v)| (k.clone(), v))
        .collect::<Vec<_>>();
    target_sections.sort_by(|a, b| a.0.cmp(&b.0));

    ConfigData {
        default_section: cfg.get("default"),
        target_sections,
    }
}

fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer(section: &Section, base_dir: &Path) -> Option<SharedRotate> {
    if section.file.trim().is_empty() {
        return None;
    }
    let log_path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = log_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!(
                "Failed to create log directory '{}': {e}",
                parent.to_string_lossy()
            );
            return None;
        }
    }

    let max_bytes = section.max_size_mb.unwrap_or(100) as usize * 1024 * 1024;
    // Prefer MaxFiles if provided, else Age
    let limit = match section.max_backups {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(
            section.max_age_days.unwrap_or(1) as i64,
        )),
    };

    let rot = FileRotate::new(
        &log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        None,
    );
    Some(Arc::new(Mutex::new(rot)))
}

fn build_file_router(config: &ConfigData, base_dir: &Path) -> MultiFileRouter {
    let mut router = MultiFileRouter {
        default: config
            .default_section
            .and_then(|s| create_rotating_writer(s, base_dir)),
        ..MultiFileRouter::default()
    };

    let mut by_file: HashMap<PathBuf, SharedRotate> = HashMap::new();
    for (prefix, section) in &config.target_sections {
        if section.file.trim().is_empty() {
            continue;
        }
        // Sections sharing a file share one writer.
        let path = resolve_log_path(&section.file, base_dir);
        let writer = match by_file.get(&path) {
            Some(w) => Some(w.clone()),
            None => create_rotating_writer(section, base_dir),
        };
        if let Some(w) = writer {
            by_file.insert(path, w.clone());
            router.by_prefix.push((prefix.clone(), w));
        }
    }

    router
}

// ================= targets =================

fn console_targets(config: &ConfigData) -> Targets {
    let default_level = config
        .default_section
        .map(|s| level_filter(&s.console_level))
        .unwrap_or(LevelFilter::INFO);

    config
        .target_sections
        .iter()
        .fold(Targets::new().with_default(default_level), |t, (prefix, s)| {
            t.with_target(prefix.clone(), level_filter(&s.console_level))
        })
}

fn file_targets(config: &ConfigData, has_default_file: bool) -> Targets {
    let default_level = config
        .default_section
        .filter(|_| has_default_file)
        .map(|s| level_filter(&s.file_level))
        .unwrap_or(LevelFilter::OFF);

    config
        .target_sections
        .iter()
        .filter(|(_, s)| !s.file.trim().is_empty())
        .fold(Targets::new().with_default(default_level), |t, (prefix, s)| {
            t.with_target(prefix.clone(), level_filter(&s.file_level))
        })
}

// ================= public init =================

/// Install the global subscriber: console (non-blocking stderr) plus
/// optional JSON files, with per-target levels from `cfg`.
///
/// `RUST_LOG`, when set, caps both sinks. Relative log file paths resolve
/// against `base_dir`.
pub fn init_logging(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer init skipped: {e}");
    }

    let data = extract_config_data(cfg);
    if data.target_sections.is_empty() && data.default_section.is_none() {
        init_minimal();
        return;
    }

    let file_router = build_file_router(&data, base_dir);
    let console = console_targets(&data);
    let files = file_targets(&data, file_router.default.is_some());

    install_subscriber(console, files, file_router);
}

fn install_subscriber(console_targets: Targets, file_targets: Targets, file_router: MultiFileRouter) {
    use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

    let env: Option<EnvFilter> = EnvFilter::try_from_default_env().ok();

    let (nb_stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    let _ = CONSOLE_GUARD.set(guard);

    let console_layer = fmt::layer()
        .with_writer(nb_stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets);

    let file_layer = (!file_router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(file_router)
            .with_filter(file_targets)
    });

    let subscriber = Registry::default()
        .with(env)
        .with(console_layer)
        .with(file_layer);

    let _ = subscriber.try_init();
}

fn init_minimal() {
    use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

    let env = EnvFilter::try_from_default_env().ok();
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let _ = Registry::default().with(env).with(fmt_layer).try_init();
}
