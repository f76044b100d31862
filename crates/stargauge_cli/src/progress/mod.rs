mod interactive;
mod logging;

pub(crate) use interactive::InteractiveReporter;
pub(crate) use logging::LoggingReporter;

use std::sync::Arc;

use stargauge::ProgressCallback;

/// Build the progress callback appropriate for the output mode.
pub(crate) fn reporter_callback(is_tty: bool) -> ProgressCallback {
    if is_tty {
        let reporter = Arc::new(InteractiveReporter::new());
        Box::new(move |event| reporter.handle(event))
    } else {
        let reporter = Arc::new(LoggingReporter::new());
        Box::new(move |event| reporter.handle(event))
    }
}
