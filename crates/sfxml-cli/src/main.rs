use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use sfxml::{Element, RoundTrip};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "sfxml",
    version,
    about = "Parse and write Salesforce SOAP/Metadata XML"
)]
struct Args {
    /// Log more detail (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse an XML document and print its value tree as JSON
    Parse {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Read an element as JSON and print it as an XML document
    Stringify {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Check that metadata files survive a parse and serialize round trip
    Check {
        /// Files or directories to scan
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Parse {
            input,
            output,
            pretty,
        } => {
            let text = read_input(&input)?;
            let root = sfxml::parse(&text).with_context(|| describe(&input))?;
            let mut json = if pretty {
                serde_json::to_string_pretty(&root)?
            } else {
                serde_json::to_string(&root)?
            };
            json.push('\n');
            write_output(&output, json.as_bytes())
        }
        Command::Stringify { input, output } => {
            let text = read_input(&input)?;
            let root: Element = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON element", describe(&input)))?;
            let mut xml = sfxml::stringify(&root);
            xml.push('\n');
            write_output(&output, xml.as_bytes())
        }
        Command::Check { paths } => check(&paths),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

#[derive(Debug, Default)]
struct Report {
    passed: usize,
    skipped: usize,
    failed: usize,
}

fn check(paths: &[PathBuf]) -> Result<()> {
    let mut report = Report::default();
    for path in paths {
        walk(path, &mut report)?;
    }

    println!(
        "{} passed, {} failed, {} skipped",
        report.passed, report.failed, report.skipped
    );
    if report.failed > 0 {
        bail!("{} file(s) failed the round trip check", report.failed);
    }
    Ok(())
}

fn walk(path: &Path, report: &mut Report) -> Result<()> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to read {}", path.display()))?;

    if metadata.is_dir() {
        let mut entries = fs::read_dir(path)
            .with_context(|| format!("failed to list {}", path.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        for entry in entries {
            walk(&entry, report)?;
        }
        return Ok(());
    }

    if is_skipped(path) {
        info!("skipping {}", path.display());
        report.skipped += 1;
        return Ok(());
    }

    info!("parsing {}", path.display());
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    match sfxml::parse_observed(&text, &mut RoundTrip) {
        Ok(root) => {
            debug!("{} ok, root <{}>", path.display(), root.name);
            report.passed += 1;
        }
        Err(err) => {
            error!("{}: {err}", path.display());
            report.failed += 1;
        }
    }
    Ok(())
}

/// Scripts, stylesheets and files described by a `-meta.xml` sibling are
/// not metadata documents.
fn is_skipped(path: &Path) -> bool {
    if matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("js" | "css")
    ) {
        return true;
    }
    let mut sibling = path.as_os_str().to_owned();
    sibling.push("-meta.xml");
    Path::new(&sibling).exists()
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "stdin".to_string(),
    }
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
