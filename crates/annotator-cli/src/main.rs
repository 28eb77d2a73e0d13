mod commands;

use annotator_core::{AnnotatorConfig, Workbench};
use anyhow::Context;
use commands::{cli, execute, message_to_stdout, Invocation};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("annotator_core=info,annotator=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn write_output(path: &Path, text: &str) -> anyhow::Result<()> {
    if path == Path::new("-") {
        println!("{text}");
        return Ok(());
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let invocation = Invocation::from_matches(&matches)?;
    init_tracing(invocation.log_json);

    let mut config = AnnotatorConfig::load(invocation.config.as_deref())?;
    if let Some(key) = &invocation.result_column {
        config.result_label.clone_from(key);
        config = config.with_result_column(key.as_str());
    }
    let mut bench = Workbench::from_config(&config)?;

    let source = std::fs::read_to_string(&invocation.input)
        .with_context(|| format!("failed to read {}", invocation.input.display()))?;
    let count = bench
        .load_json(&source)
        .with_context(|| format!("failed to load {}", invocation.input.display()))?;
    tracing::debug!("Loaded {} records from {}", count, invocation.input.display());

    let message = execute(&mut bench, &invocation.action).await?;

    if invocation.action.mutates() && bench.has_changes() {
        let text = bench.export_json()?;
        write_output(&invocation.output, &text)?;
    }
    if message_to_stdout(&invocation.action, &invocation.output) {
        println!("{message}");
    } else {
        eprintln!("{message}");
    }
    Ok(())
}
