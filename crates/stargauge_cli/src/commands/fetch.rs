use std::path::PathBuf;

use console::Term;
use stargauge::{CollectOptions, RequestPacer, SearchClient, collect, store};

use crate::FetchArgs;
use crate::config::Config;

/// Run the collection stage.
///
/// Returns the raw file path on a successful write, or `None` when the sweep
/// produced no records (the previous raw file, if any, is left untouched).
pub(crate) async fn handle_fetch(
    args: &FetchArgs,
    config: &Config,
) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    // The credential check happens before any request is issued.
    let Some(token) = config.github_token() else {
        return Err(
            "No GitHub token configured. Set GITHUB_TOKEN (or STARGAUGE_GITHUB_TOKEN, \
             or [github] token in stargauge.toml) and retry."
                .into(),
        );
    };

    // Merge CLI args with config defaults
    let options = CollectOptions {
        min_stars: args.min_stars.unwrap_or(config.fetch.min_stars),
        page_size: args.page_size.unwrap_or(config.fetch.page_size),
        max_pages: args.max_pages.unwrap_or(config.fetch.max_pages),
        retry: config.retry.to_policy(),
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.data.raw_path.clone());

    let client = SearchClient::new(&token)
        .with_pacer(Some(RequestPacer::new(config.fetch.requests_per_second)));

    let is_tty = Term::stdout().is_term();
    let callback = crate::progress::reporter_callback(is_tty);

    let records = collect(&client, &options, Some(&callback)).await?;

    if records.is_empty() {
        if is_tty {
            eprintln!(
                "No repositories fetched; leaving {} untouched",
                output.display()
            );
        } else {
            tracing::warn!(path = %output.display(), "no repositories fetched");
        }
        return Ok(None);
    }

    store::write_raw(&output, &records)?;

    if is_tty {
        println!(
            "Fetched {} repositories to {}",
            records.len(),
            output.display()
        );
    } else {
        tracing::info!(
            total = records.len(),
            path = %output.display(),
            "raw data written"
        );
    }

    Ok(Some(output))
}
