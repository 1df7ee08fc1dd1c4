//! Query command - one-shot search.

use crate::app::App;
use crate::OutputFormat;
use dorkfind_core::Config;
use std::time::Instant;

/// Run the query command.
pub fn run(
    config: Config,
    text: &str,
    endpoint: Option<String>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::new(config);
    let transport = app.transport(endpoint.as_deref())?;

    let start = Instant::now();
    let results = transport.search(text)?;
    let elapsed = start.elapsed();

    match output {
        OutputFormat::Text => {
            if results.is_empty() {
                println!("No results found.");
            }
            for record in &results {
                println!("{}", record.query);
                if !record.description.is_empty() {
                    println!("    {}", record.description);
                }
            }

            eprintln!();
            eprintln!(
                "Found {} results in {:.3}ms",
                results.len(),
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
