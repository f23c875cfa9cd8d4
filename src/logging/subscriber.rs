//! Tracing subscriber for `ptools`.
//!
//! Three layers share one registry:
//!
//! - [`ScopeLayer`] remembers the name of every [`scope`] span, so output
//!   produced while one project (or bootstrap phase) is being handled can be
//!   told apart from the next one;
//! - the console layer prints coloured, indented lines;
//! - [`FileLayer`] appends every event, `debug` included, to
//!   `$XDG_CACHE_HOME/ptools/<command>.log`.
//!
//! Lines emitted inside a scope carry a `[name]` prefix on both outputs.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::span;
use tracing_subscriber::layer::Context as LayerContext;
use tracing_subscriber::registry::{LookupSpan, Scope};

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Tracing target used for stage headers.
pub(super) const STAGE_TARGET: &str = "ptools::stage";

/// Span name marking a log scope.
const SCOPE_SPAN: &str = "scope";

/// Tag every line logged until the returned guard drops with `[name]`.
///
/// Scopes nest; the innermost one wins.
pub fn scope(name: &str) -> span::EnteredSpan {
    tracing::info_span!("scope", name = %name).entered()
}

/// Reads one named field from an event or span.
struct FieldExtractor {
    field: &'static str,
    value: String,
}

impl FieldExtractor {
    const fn new(field: &'static str) -> Self {
        Self {
            field,
            value: String::new(),
        }
    }
}

impl tracing::field::Visit for FieldExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == self.field {
            self.value = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == self.field {
            self.value = value.to_string();
        }
    }
}

fn event_message(event: &tracing::Event<'_>) -> String {
    let mut extractor = FieldExtractor::new("message");
    event.record(&mut extractor);
    extractor.value
}

/// Name of a [`scope`] span, stored in the span's extensions.
struct ScopeName(String);

/// Stores a [`ScopeName`] on every [`scope`] span when it is created.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct ScopeLayer;

impl<S> tracing_subscriber::Layer<S> for ScopeLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: LayerContext<'_, S>) {
        if attrs.metadata().name() != SCOPE_SPAN {
            return;
        }
        let mut extractor = FieldExtractor::new("name");
        attrs.record(&mut extractor);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(ScopeName(extractor.value));
        }
    }
}

/// `"[name] "` for the innermost scope around an event, or `""`.
fn scope_prefix<'a, R: LookupSpan<'a>>(scope: Option<Scope<'a, R>>) -> String {
    scope
        .and_then(|mut spans| {
            spans.find_map(|span| span.extensions().get::<ScopeName>().map(|n| n.0.clone()))
        })
        .map_or_else(String::new, |name| format!("[{name}] "))
}

/// Appends every event to the command's log file, timestamped and with ANSI
/// codes stripped.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log file for `command`, write the run header and open it
    /// for appending.
    ///
    /// Returns `None` if the cache directory or the file is unavailable;
    /// the run then logs to the console only.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("PTOOLS_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let cwd = std::env::current_dir()
            .map_or_else(|_| "?".to_string(), |d| d.display().to_string());
        let header = format!(
            "# ptools {command} {version}\n# started {} UTC in {cwd}\n",
            format_utc_datetime(),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S> tracing_subscriber::Layer<S> for FileLayer
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: LayerContext<'_, S>) {
        let metadata = event.metadata();
        let msg = strip_ansi(&event_message(event));
        let ts = format_utc_time();

        let line = if metadata.target() == STAGE_TARGET {
            format!("[{ts}] ==> {msg}")
        } else {
            let tag = match *metadata.level() {
                tracing::Level::ERROR => "error ",
                tracing::Level::WARN => "warn  ",
                tracing::Level::INFO => "      ",
                _ => "debug ",
            };
            format!("[{ts}] {tag}{}{msg}", scope_prefix(ctx.event_scope(event)))
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Console output: bold stage headers, coloured warnings and errors, dimmed
/// debug lines, everything else indented under the current stage.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let msg = event_message(event);
        if metadata.target() == STAGE_TARGET {
            return writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m");
        }

        let prefix = scope_prefix(ctx.event_scope());
        match *metadata.level() {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {prefix}{msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {prefix}{msg}"),
            tracing::Level::INFO => writeln!(writer, "  {prefix}{msg}"),
            _ => writeln!(writer, "  \x1b[2m{prefix}{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber for `command`.
///
/// Warnings and errors go to stderr and everything else to stdout; `debug`
/// reaches the console only with `verbose` but always reaches the log file.
/// Call once, before anything is logged.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(ScopeLayer)
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt as _;

    /// In-memory console sink.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            strip_ansi(&String::from_utf8_lossy(&self.0.lock().unwrap()))
        }
    }

    fn console(out: Captured) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::registry().with(ScopeLayer).with(
            tracing_subscriber::fmt::layer()
                .event_format(ConsoleFormatter)
                .with_writer(move || out.clone()),
        )
    }

    #[test]
    fn console_lines_carry_innermost_scope() {
        let out = Captured::default();
        tracing::subscriber::with_default(console(out.clone()), || {
            tracing::info!(target: STAGE_TARGET, "Processing unit_tests");
            let _project = scope("unit_tests");
            tracing::info!("copying artifacts");
            {
                let _inner = scope("gcovr");
                tracing::warn!("report failed");
            }
            tracing::error!("giving up");
        });

        assert_eq!(
            out.text(),
            "==> Processing unit_tests\n\
             \x20 [unit_tests] copying artifacts\n\
             WARN  [gcovr] report failed\n\
             ERROR [unit_tests] giving up\n"
        );
    }

    #[test]
    fn console_lines_outside_scope_have_no_prefix() {
        let out = Captured::default();
        tracing::subscriber::with_default(console(out.clone()), || {
            {
                let _project = scope("app");
            }
            tracing::info!("copied 2 file(s)");
        });

        assert_eq!(out.text(), "  copied 2 file(s)\n");
    }

    #[test]
    fn stage_headers_ignore_scope() {
        let out = Captured::default();
        tracing::subscriber::with_default(console(out.clone()), || {
            let _phase = scope("Check tools");
            tracing::info!(target: STAGE_TARGET, "Summary");
        });

        assert_eq!(out.text(), "==> Summary\n");
    }
}
