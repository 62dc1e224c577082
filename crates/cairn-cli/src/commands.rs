use std::io::Write;
use std::path::{Component, Path};

use anyhow::{bail, Context};
use cairn_crypto::ContentHasher;
use cairn_diff::{delta, render, stat, summary, DeltaInput, DiffError, FileSpec, RenderMode};
use cairn_store::{FlushOutcome, ObjectStore, StoreError, StoreReader};
use cairn_types::Author;
use cairn_walk::{walk_files, WalkError};
use colored::Colorize;
use tracing::info;

use crate::cli::*;
use crate::config::CairnConfig;

pub fn run_command(cli: Cli, config: &CairnConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Delta(args) => cmd_delta(args, config, format, out),
        Command::Store(args) => cmd_store(args, config, format, out),
        Command::LsIndex(args) => cmd_ls_index(args, config, format, out),
        Command::Cat(args) => cmd_cat(args, config, out),
        Command::Verify(args) => cmd_verify(args, config, format, out),
    }
}

/// Whether any error in the chain is a broken internal invariant.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<StoreError>().is_some_and(StoreError::is_fatal)
            || cause.downcast_ref::<DiffError>().is_some_and(DiffError::is_fatal)
            || cause.downcast_ref::<WalkError>().is_some_and(WalkError::is_fatal)
    })
}

fn author(config: &CairnConfig) -> Author {
    Author::now(config.author.name.clone(), config.author.email.clone())
}

fn paint(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else {
        line.to_string()
    }
}

fn cmd_delta(
    args: DeltaArgs,
    config: &CairnConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let input = DeltaInput::new(FileSpec::new(args.a.clone()), FileSpec::new(args.b.clone()))?;
    let result = delta(&input)?;

    let mode = if args.minimal {
        RenderMode::Minimal
    } else if args.enhanced {
        RenderMode::Enhanced
    } else {
        config.delta.mode
    };
    let context = args.context.unwrap_or(config.delta.context_lines);
    let rendered = render(&result, mode, context);
    let (label_a, label_b) = (&input.spec_a().label, &input.spec_b().label);

    if let Some(dir) = &args.store {
        let mut store = ObjectStore::init(dir, &config.store, author(config))?;
        let name = format!("delta/{}..{}", index_path(&args.a), index_path(&args.b));
        let entry = store.put(name, rendered.as_bytes())?;
        info!(path = %entry.path, hash = %entry.hash.short_hex(), "stored delta");
        store.write()?;
    }

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "a": label_a,
                "b": label_b,
                "id": ContentHasher::DELTA.hash(rendered.as_bytes()).to_hex(),
                "counts": result.counts(),
                "lines": result.diff_lines,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Text => {
            for line in rendered.lines() {
                writeln!(out, "{}", paint(line))?;
            }
            if args.stat {
                writeln!(out, "{}", stat(&result))?;
            }
            writeln!(out, "{}", summary(&result).bold())?;
        }
    }
    Ok(())
}

/// `/`-joined form of a relative path, as recorded in the index.
fn index_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn cmd_store(
    args: StoreArgs,
    config: &CairnConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let files = walk_files(&args.root)?;
    let mut store = ObjectStore::init(&args.into, &config.store, author(config))?;
    for rel in &files {
        let file = args.root.join(rel);
        let path = index_path(rel);
        let entry = if args.compress {
            store.put_compressed_file(path, &file)?
        } else {
            store.put_file(path, &file)?
        };
        info!(path = %entry.path, start = entry.start, len = entry.len, "stored");
    }

    let (blobs, log_bytes) = match store.write()? {
        FlushOutcome::Written { blobs, log_bytes } => (blobs, log_bytes),
        FlushOutcome::AlreadyFlushed => bail!("store session was already flushed"),
    };
    match format {
        OutputFormat::Json => writeln!(
            out,
            "{}",
            serde_json::json!({ "blobs": blobs, "log_bytes": log_bytes })
        )?,
        OutputFormat::Text => writeln!(
            out,
            "{} Stored {} file(s), {} bytes into {}",
            "✓".green().bold(),
            blobs,
            log_bytes,
            args.into.display().to_string().bold()
        )?,
    }
    Ok(())
}

fn open_reader(dir: &Path, config: &CairnConfig) -> anyhow::Result<StoreReader> {
    StoreReader::open(dir, &config.store)
        .with_context(|| format!("cannot read store {}", dir.display()))
}

fn cmd_ls_index(
    args: LsIndexArgs,
    config: &CairnConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let reader = open_reader(&args.dir, config)?;
    if format == OutputFormat::Json {
        writeln!(out, "{}", serde_json::to_string_pretty(reader.generations())?)?;
        return Ok(());
    }

    for (n, generation) in reader.generations().iter().enumerate() {
        writeln!(out, "{} {}  {}", "generation".yellow(), n, generation.author)?;
        for entry in &generation.entries {
            writeln!(
                out,
                "  {} {:>10} {:>8} {:<4} {}",
                entry.hash.short_hex().dimmed(),
                entry.start,
                entry.len,
                format!("{:?}", entry.encoding).to_lowercase(),
                entry.path
            )?;
        }
    }
    Ok(())
}

fn cmd_cat(args: CatArgs, config: &CairnConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let reader = open_reader(&args.dir, config)?;
    let Some(entry) = reader.get(&args.path) else {
        bail!("{}: not in store {}", args.path, args.dir.display());
    };
    out.write_all(&reader.read_content(entry)?)?;
    Ok(())
}

fn cmd_verify(
    args: VerifyArgs,
    config: &CairnConfig,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let reader = open_reader(&args.dir, config)?;
    let report = reader.verify()?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
        OutputFormat::Text => {
            for issue in &report.issues {
                writeln!(out, "  {} {}", "✗".red().bold(), issue.problem)?;
            }
            let mark = if report.is_clean() {
                "✓".green().bold()
            } else {
                "✗".red().bold()
            };
            writeln!(
                out,
                "{} Checked {} blob(s), {} bytes",
                mark, report.blobs_checked, report.bytes_checked
            )?;
        }
    }
    if !report.is_clean() {
        bail!("{} blob(s) failed verification", report.issues.len());
    }
    Ok(())
}
