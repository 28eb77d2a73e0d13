//! Command definitions and handlers
//!
//! Each invocation loads one JSON document into a [`Workbench`], runs a
//! single action against it, and optionally writes the collection back out.

use annotator_core::{display_value, Workbench, DEFAULT_EXPORT_FILE};
use anyhow::{anyhow, bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Widest `a-b` span accepted by `--rows`
pub(crate) const MAX_ROW_RANGE: usize = 1_000_000;

/// Rows a batch is dispatched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    All,
    Rows(Vec<usize>),
}

/// Action requested on the command line
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Columns,
    Render { row: usize, template: String },
    AddColumn { name: String },
    CopyColumn { source: String, target: String },
    SetCell { row: usize, column: String, value: Value },
    Process { template: String, selection: Selection },
}

impl Action {
    /// Check if the action changes the collection
    pub(crate) fn mutates(&self) -> bool {
        !matches!(self, Self::Columns | Self::Render { .. })
    }
}

/// Check if the command's message belongs on stdout
///
/// A mutating command writing the collection to stdout reports on stderr so
/// stdout stays a single JSON document.
pub(crate) fn message_to_stdout(action: &Action, output: &Path) -> bool {
    !(action.mutates() && output == Path::new("-"))
}

/// Parsed command line
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub(crate) input: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) config: Option<PathBuf>,
    pub(crate) log_json: bool,
    pub(crate) result_column: Option<String>,
    pub(crate) action: Action,
}

pub(crate) fn cli() -> Command {
    Command::new("annotator")
        .version(annotator_core::VERSION)
        .about("Batch-annotate JSON records through a text-generation service")
        .subcommand_required(true)
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON document to load (array of objects, or one object)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .default_value(DEFAULT_EXPORT_FILE)
                .value_parser(value_parser!(PathBuf))
                .help("Where to write the modified collection, '-' for stdout"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("columns").about("List columns and row count"))
        .subcommand(
            with_template(Command::new("render").about("Preview the prompt for one row")).arg(
                Arg::new("row")
                    .long("row")
                    .required(true)
                    .value_parser(value_parser!(usize))
                    .help("Row index"),
            ),
        )
        .subcommand(
            Command::new("add-column")
                .about("Append an empty column to every row")
                .arg(Arg::new("name").required(true).help("Column key")),
        )
        .subcommand(
            Command::new("copy-column")
                .about("Copy one column's values into another")
                .arg(Arg::new("source").required(true).help("Source column"))
                .arg(Arg::new("target").required(true).help("Target column")),
        )
        .subcommand(
            Command::new("set-cell")
                .about("Write one cell")
                .arg(
                    Arg::new("row")
                        .long("row")
                        .required(true)
                        .value_parser(value_parser!(usize))
                        .help("Row index"),
                )
                .arg(
                    Arg::new("column")
                        .long("column")
                        .required(true)
                        .help("Column key"),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .required(true)
                        .help("New cell value, stored as text"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Parse --value as JSON instead of text"),
                ),
        )
        .subcommand(
            with_template(Command::new("process").about("Send rows through the service"))
                .arg(
                    Arg::new("rows")
                        .long("rows")
                        .conflicts_with("all")
                        .help("Row indices, e.g. 0,2,4-6"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Process every row"),
                )
                .arg(
                    Arg::new("result-column")
                        .long("result-column")
                        .help("Column receiving the results"),
                ),
        )
}

fn with_template(command: Command) -> Command {
    command
        .arg(
            Arg::new("template")
                .short('t')
                .long("template")
                .help("Prompt template with {column} placeholders"),
        )
        .arg(
            Arg::new("template-file")
                .long("template-file")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("template")
                .help("Read the prompt template from a file"),
        )
}

impl Invocation {
    pub(crate) fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let input = matches
            .get_one::<PathBuf>("input")
            .cloned()
            .ok_or_else(|| anyhow!("--input is required"))?;
        let output = matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));

        let result_column = match matches.subcommand() {
            Some(("process", args)) => args.get_one::<String>("result-column").cloned(),
            _ => None,
        };

        let action = match matches.subcommand() {
            Some(("columns", _)) => Action::Columns,
            Some(("render", args)) => Action::Render {
                row: required::<usize>(args, "row")?,
                template: template(args)?,
            },
            Some(("add-column", args)) => Action::AddColumn {
                name: required::<String>(args, "name")?,
            },
            Some(("copy-column", args)) => Action::CopyColumn {
                source: required::<String>(args, "source")?,
                target: required::<String>(args, "target")?,
            },
            Some(("set-cell", args)) => {
                let raw = required::<String>(args, "value")?;
                let value = if args.get_flag("json") {
                    serde_json::from_str(&raw).context("--value is not valid JSON")?
                } else {
                    Value::String(raw)
                };
                Action::SetCell {
                    row: required::<usize>(args, "row")?,
                    column: required::<String>(args, "column")?,
                    value,
                }
            }
            Some(("process", args)) => {
                let selection = if args.get_flag("all") {
                    Selection::All
                } else {
                    match args.get_one::<String>("rows") {
                        Some(spec) => Selection::Rows(parse_rows(spec)?),
                        None => bail!("process needs --rows or --all"),
                    }
                };
                Action::Process {
                    template: template(args)?,
                    selection,
                }
            }
            Some((other, _)) => bail!("unknown command: {other}"),
            None => bail!("no command given"),
        };

        Ok(Self {
            input,
            output,
            config: matches.get_one::<PathBuf>("config").cloned(),
            log_json: matches.get_flag("log-json"),
            result_column,
            action,
        })
    }
}

fn required<T: Clone + Send + Sync + 'static>(args: &ArgMatches, name: &str) -> anyhow::Result<T> {
    args.get_one::<T>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing --{name}"))
}

fn template(args: &ArgMatches) -> anyhow::Result<String> {
    if let Some(text) = args.get_one::<String>("template") {
        return Ok(text.clone());
    }
    match args.get_one::<PathBuf>("template-file") {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display())),
        None => bail!("--template or --template-file is required"),
    }
}

/// Parse `0,2,4-6` into row indices, keeping the given order
pub(crate) fn parse_rows(spec: &str) -> anyhow::Result<Vec<usize>> {
    let mut rows: Vec<usize> = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let bounds = (start.trim().parse::<usize>(), end.trim().parse::<usize>());
                match bounds {
                    (Ok(start), Ok(end)) if start <= end => {
                        if end - start >= MAX_ROW_RANGE {
                            bail!("row range {part} spans more than {MAX_ROW_RANGE} rows");
                        }
                        rows.extend(start..=end);
                    }
                    _ => bail!("bad row range {part}"),
                }
            }
            None => {
                let row = part
                    .parse::<usize>()
                    .with_context(|| format!("bad row index {part}"))?;
                rows.push(row);
            }
        }
    }
    if rows.is_empty() {
        bail!("no rows selected");
    }
    Ok(rows)
}

/// Run `action` against a loaded workbench, returning the text to print
pub(crate) async fn execute(bench: &mut Workbench, action: &Action) -> anyhow::Result<String> {
    match action {
        Action::Columns => {
            let store = bench.store();
            let mut lines: Vec<String> = store
                .schema()
                .iter()
                .map(|col| format!("{}\t{}", col.key, col.label))
                .collect();
            lines.push(format!("{} rows", store.len()));
            Ok(lines.join("\n"))
        }
        Action::Render { row, template } => Ok(bench.preview(*row, template)?),
        Action::AddColumn { name } => {
            let col = bench.add_column(name)?;
            Ok(format!("added column {}", col.key))
        }
        Action::CopyColumn { source, target } => {
            bench.copy_column_values(source, target)?;
            Ok(format!("copied {source} into {target}"))
        }
        Action::SetCell { row, column, value } => {
            bench.set_cell(*row, column, value.clone())?;
            Ok(format!("row {row} {column} = {}", display_value(value)))
        }
        Action::Process {
            template,
            selection,
        } => {
            let summary = match selection {
                Selection::All => bench.process_all(template).await?,
                Selection::Rows(rows) => bench.process_selection(rows, template).await?,
            };
            Ok(format!(
                "batch {}: {} succeeded, {} failed, {} merged into {}",
                summary.batch,
                summary.succeeded,
                summary.failed,
                summary.merge.matched,
                bench.result_column()
            ))
        }
    }
}
