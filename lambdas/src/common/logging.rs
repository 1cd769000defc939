use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Tag attached to every invocation span so log lines can be told apart in
/// shared log groups.
pub const SOURCE_TAG: &str = "datasync-poller";

const DEFAULT_FILTER: &str = "info";

/// One JSON object per line: timestamp, level, message, plus the fields of
/// the current invocation span.
pub fn subscriber<W>(make_writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_target(false)
        .with_writer(make_writer)
        .finish()
}

pub fn init() {
    subscriber(std::io::stdout).init();
}
