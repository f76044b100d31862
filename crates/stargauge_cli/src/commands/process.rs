use chrono::Utc;
use console::Term;
use stargauge::transform::{TransformOptions, transform};
use stargauge::store;

use crate::ProcessArgs;
use crate::config::Config;

/// Run the transform stage: read raw, normalize, write processed.
pub(crate) fn handle_process(
    args: &ProcessArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.data.raw_path.clone());
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.data.processed_path.clone());
    // The transform itself is pure; the reference instant is fixed here once.
    let as_of = args.as_of.unwrap_or_else(Utc::now);

    let raw = store::read_raw(&input)?;
    let total_rows = raw.rows.len() + raw.malformed;

    let outcome = transform(
        &raw.rows,
        &TransformOptions::new(config.fetch.min_stars, as_of),
    );
    store::write_processed(&output, &outcome.records)?;

    let summary = outcome.summary;
    let excluded = summary.excluded() + raw.malformed;

    let is_tty = Term::stdout().is_term();
    if is_tty {
        println!(
            "Processed {} of {} rows to {} ({} excluded)",
            summary.written,
            total_rows,
            output.display(),
            excluded
        );
        if excluded > 0 {
            println!(
                "  undecodable: {}, missing fields: {}, bad timestamps: {}, below threshold: {}",
                raw.malformed,
                summary.missing_fields,
                summary.bad_timestamp,
                summary.below_threshold
            );
        }
    } else {
        tracing::info!(
            written = summary.written,
            input = total_rows,
            excluded,
            undecodable = raw.malformed,
            missing_fields = summary.missing_fields,
            bad_timestamp = summary.bad_timestamp,
            below_threshold = summary.below_threshold,
            path = %output.display(),
            "processed data written"
        );
    }

    Ok(())
}
