use std::fmt;
use std::fmt::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::format::{DefaultFields, FmtSpan, Format, Full};
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, registry::Registry, EnvFilter};

use super::app_config::config;
use super::error::Result;

pub mod prelude {
    pub use tracing::{debug, error, info, trace, warn};
    pub use tracing::{debug_span, error_span, info_span, trace_span, warn_span};
    pub use tracing::{event, field::Empty, instrument, span};
}

/// Install the global subscriber from the `logging` section of the config.
///
/// `produces_output` tells auto-switching terminal outputs that stdout carries program output,
/// so logs go to stderr instead.
pub fn setup(produces_output: bool) -> Result<LoggingGuard> {
    let cfg: LoggingConfig = config().get("logging")?;
    LoggingGuard::install(cfg, produces_output)
}

/// This needs to be hold in main, dropping it flushes the non-blocking writers
pub struct LoggingGuard {
    _worker_guards: Vec<WorkerGuard>,
}

impl LoggingGuard {
    fn install(cfg: LoggingConfig, produces_output: bool) -> Result<Self> {
        let mut worker_guards = vec![];
        let mut term = None;
        let mut file = None;

        for output in cfg.outputs.iter().filter(|o| o.enabled) {
            let (writer, guard) = output.target.to_writer(produces_output);
            worker_guards.push(guard);
            // a later output of the same kind wins
            match output.target {
                LoggingTarget::Term(_) => term = Some(fmt_layer(output, writer)),
                LoggingTarget::File(_) => file = Some(fmt_layer(output, writer)),
            }
        }

        Registry::default()
            .with(cfg.filter.to_env_filter())
            .with(term)
            .with(file)
            .try_init()?;

        Ok(Self {
            _worker_guards: worker_guards,
        })
    }
}

type OutputLayer<S> = FmtLayer<S, DefaultFields, Format<Full, ISOTimeFormat>, NonBlocking>;

fn fmt_layer<S>(output: &LoggingOutput, writer: NonBlocking) -> OutputLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let span_events = output
        .span_events
        .iter()
        .fold(FmtSpan::NONE, |f, e| f | (*e).into());

    FmtLayer::default()
        .with_ansi(output.target.supports_color())
        .with_target(false)
        .with_span_events(span_events)
        .with_timer(ISOTimeFormat)
        .with_writer(writer)
}

struct ISOTimeFormat;

impl FormatTime for ISOTimeFormat {
    fn format_time(&self, w: &mut dyn Write) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ====== Config to Layer ======

impl FilterConfig {
    pub fn to_env_filter(&self) -> EnvFilter {
        let filter = match &self.from_env {
            Some(env) => EnvFilter::from_env(env),
            None => EnvFilter::default(),
        };

        if let Some(dirs) = &self.directives {
            dirs.split(',')
                .filter_map(|s| match s.parse() {
                    Ok(d) => Some(d),
                    Err(err) => {
                        eprintln!("ignoring `{}`: {}", s, err);
                        None
                    }
                })
                .fold(filter, |f, dir| f.add_directive(dir))
        } else {
            filter
        }
    }
}

impl LoggingTarget {
    pub fn supports_color(&self) -> bool {
        match self {
            LoggingTarget::Term(_) => true,
            LoggingTarget::File(_) => false,
        }
    }

    pub fn to_writer(&self, produces_output: bool) -> (NonBlocking, WorkerGuard) {
        match self {
            LoggingTarget::Term(term) => match term.name {
                TermTarget::Stdout if !term.auto_switch || !produces_output => {
                    NonBlockingBuilder::default()
                        .lossy(false)
                        .finish(std::io::stdout())
                }
                _ => NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(std::io::stderr()),
            },
            LoggingTarget::File(file) => NonBlockingBuilder::default()
                .lossy(false)
                .finish(tracing_appender::rolling::never(&file.directory, &file.name)),
        }
    }
}

impl From<SpanEvent> for FmtSpan {
    fn from(e: SpanEvent) -> Self {
        match e {
            SpanEvent::New => FmtSpan::NEW,
            SpanEvent::Enter => FmtSpan::ENTER,
            SpanEvent::Exit => FmtSpan::EXIT,
            SpanEvent::Close => FmtSpan::CLOSE,
            SpanEvent::Active => FmtSpan::ACTIVE,
            SpanEvent::Full => FmtSpan::FULL,
        }
    }
}

// ====== Logging Config ======

#[derive(Debug, serde::Deserialize)]
struct LoggingConfig {
    #[serde(default)]
    filter: FilterConfig,
    #[serde(default)]
    outputs: Vec<LoggingOutput>,
}

#[derive(Debug, serde::Deserialize)]
struct FilterConfig {
    #[serde(default)]
    directives: Option<String>,
    #[serde(default, deserialize_with = "deserialize_filter_from_env")]
    from_env: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct LoggingOutput {
    enabled: bool,
    #[serde(default)]
    span_events: Vec<SpanEvent>,
    target: LoggingTarget,
}

#[derive(Copy, Clone, Debug, serde::Deserialize)]
enum SpanEvent {
    New,
    Enter,
    Exit,
    Close,
    Active,
    Full,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
enum LoggingTarget {
    Term(TermOutput),
    File(FileOutput),
}

#[derive(Debug, serde::Deserialize)]
struct TermOutput {
    name: TermTarget,
    #[serde(default)]
    auto_switch: bool,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum TermTarget {
    Stdout,
    Stderr,
}

#[derive(Debug, serde::Deserialize)]
struct FileOutput {
    directory: PathBuf,
    name: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            directives: Some("warn".into()),
            from_env: Some("CPUSIM_LOG".into()),
        }
    }
}

// ====== serde helpers ======

/// Deserialize `false` to `None`, `true` to `Some("CPUSIM_LOG")`, and string to `Some(xxx)`
fn deserialize_filter_from_env<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct VisitFromEnv;

    impl<'de> serde::de::Visitor<'de> for VisitFromEnv {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("bool or string")
        }

        fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value {
                Ok(Some("CPUSIM_LOG".into()))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_owned()))
        }
    }

    deserializer.deserialize_any(VisitFromEnv)
}
