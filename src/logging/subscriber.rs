//! Tracing subscriber wiring.
//!
//! Two layers share one message-extraction path: a console layer that
//! renders stage banners and level badges through [`ColorSupport`], and a
//! file layer that appends every event (debug included) to the per-command
//! log with timestamps, ANSI-stripped, so a run can be reconstructed after
//! the fact.

use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};
use crate::color::ColorSupport;

/// Collect an event's `message` field into a string.
fn event_message(event: &Event<'_>) -> String {
    struct Collector(String);

    impl tracing::field::Visit for Collector {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                use std::fmt::Write as _;
                let _ = write!(self.0, "{value:?}");
            }
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                self.0.push_str(value);
            }
        }
    }

    let mut collector = Collector(String::new());
    event.record(&mut collector);
    collector.0
}

/// Whether the event is a stage header (emitted by [`Logger::stage`]).
///
/// [`Logger::stage`]: super::Logger::stage
fn is_stage(event: &Event<'_>) -> bool {
    event.metadata().target() == "confsync::stage"
}

/// Console output.
///
/// Stages get a `::` banner; warnings and errors carry a badge and go to
/// stderr; everything else is indented under the current stage. Debug
/// events only appear with `--verbose`. Colors follow the same
/// FORCE_COLOR/NO_COLOR decision as the diff output.
pub(super) struct ConsoleLayer {
    pub(super) verbose: bool,
    pub(super) colors: ColorSupport,
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::TRACE || (level == Level::DEBUG && !self.verbose) {
            return;
        }

        let msg = event_message(event);
        if level == Level::ERROR {
            eprintln!("{} {msg}", self.colors.red("error:"));
        } else if level == Level::WARN {
            eprintln!("{} {msg}", self.colors.yellow("warning:"));
        } else if is_stage(event) {
            println!("{} {}", self.colors.blue("::"), self.colors.bold(&msg));
        } else {
            println!("  {msg}");
        }
    }
}

/// Persistent log file under `$XDG_CACHE_HOME/confsync/<command>.log`.
///
/// Records everything from debug up, one line per event:
/// `HH:MM:SS <tag>  <message>`, with any ANSI escapes stripped.
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command`, write the run header, and return a
    /// layer appending to it. `None` when the cache directory is
    /// unavailable (logging then stays console-only).
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version = option_env!("CONFSYNC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        let header = format!(
            "# confsync {version} ({command}) started {}\n",
            format_utc_datetime()
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: Subscriber> Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::TRACE {
            return;
        }

        let tag = if is_stage(event) {
            "stage"
        } else if level == Level::ERROR {
            "error"
        } else if level == Level::WARN {
            "warn"
        } else if level == Level::DEBUG {
            "debug"
        } else {
            "info"
        };

        let msg = strip_ansi(&event_message(event));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{} {tag:<5} {msg}", format_utc_time()).ok();
        }
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Must be called once at program startup, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let console = ConsoleLayer {
        verbose,
        colors: ColorSupport::new(),
    };
    let file = FileLayer::new(command);

    tracing_subscriber::registry().with(console).with(file).init();
}
