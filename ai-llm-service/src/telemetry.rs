use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Workspace crate targets whose events this layer renders.
pub const TARGET_PREFIXES: &[&str] = &[
    "ai_llm_service",
    "review_generator",
    "quality_scorer",
    "review_store",
    "api",
    "smart_review_backend",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Build a **workspace-scoped** formatting layer that renders only events
/// emitted by this workspace's crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - Span close events (durations of instrumented functions)
/// - ANSI colors only when stdout is a terminal
///
/// Uses a per-layer filter, so logs from other crates are left to whatever
/// else is composed in the binary.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_workspace)
}

/// Builds `target=level` directives for every workspace crate.
pub fn level_directives(level: Level) -> Vec<Directive> {
    TARGET_PREFIXES
        .iter()
        .filter_map(|target| {
            format!("{target}={}", level.as_str().to_lowercase())
                .parse::<Directive>()
                .ok()
        })
        .collect()
}

/// Creates an `EnvFilter` from `RUST_LOG` (or `default`), then applies
/// `level` to the workspace crates.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    level_directives(level)
        .into_iter()
        .fold(base, |filter, d| filter.add_directive(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_workspace_targets_only() {
        assert!(is_workspace_target("review_generator::pipeline"));
        assert!(is_workspace_target("quality_scorer"));
        assert!(!is_workspace_target("hyper::proto"));
    }
}
