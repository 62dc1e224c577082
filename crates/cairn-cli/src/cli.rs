use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cairn",
    about = "Line deltas and an append-only content store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (default: ./cairn.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the line delta between two files
    Delta(DeltaArgs),
    /// Store every regular file under a directory
    Store(StoreArgs),
    /// List the entries of a store's index
    LsIndex(LsIndexArgs),
    /// Print the latest stored content for a path
    Cat(CatArgs),
    /// Re-hash every blob in a store
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct DeltaArgs {
    pub a: PathBuf,
    pub b: PathBuf,
    /// Changed lines only
    #[arg(long, conflicts_with = "enhanced")]
    pub minimal: bool,
    /// Unified hunks with context
    #[arg(long)]
    pub enhanced: bool,
    /// Add a change-count graph line
    #[arg(long)]
    pub stat: bool,
    /// Lines of context around each change
    #[arg(short = 'U', long = "unified")]
    pub context: Option<usize>,
    /// Also save the rendered delta into this store
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct StoreArgs {
    pub root: PathBuf,
    #[arg(long)]
    pub into: PathBuf,
    /// zstd-compress each blob
    #[arg(long)]
    pub compress: bool,
}

#[derive(Args)]
pub struct LsIndexArgs {
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct CatArgs {
    pub dir: PathBuf,
    pub path: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delta() {
        let cli = Cli::try_parse_from(["cairn", "delta", "old.txt", "new.txt"]).unwrap();
        if let Command::Delta(args) = cli.command {
            assert_eq!(args.a, PathBuf::from("old.txt"));
            assert_eq!(args.b, PathBuf::from("new.txt"));
            assert!(!args.minimal && !args.enhanced && !args.stat);
            assert_eq!(args.context, None);
            assert_eq!(args.store, None);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_delta_flags() {
        let cli = Cli::try_parse_from([
            "cairn", "delta", "a", "b", "--minimal", "--stat", "-U", "1", "--store", "/tmp/s",
        ])
        .unwrap();
        if let Command::Delta(args) = cli.command {
            assert!(args.minimal);
            assert!(args.stat);
            assert_eq!(args.context, Some(1));
            assert_eq!(args.store, Some(PathBuf::from("/tmp/s")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn minimal_conflicts_with_enhanced() {
        assert!(Cli::try_parse_from(["cairn", "delta", "a", "b", "--minimal", "--enhanced"]).is_err());
    }

    #[test]
    fn delta_needs_two_files() {
        assert!(Cli::try_parse_from(["cairn", "delta", "a"]).is_err());
    }

    #[test]
    fn parse_store() {
        let cli = Cli::try_parse_from(["cairn", "store", "src", "--into", "objs", "--compress"]).unwrap();
        if let Command::Store(args) = cli.command {
            assert_eq!(args.root, PathBuf::from("src"));
            assert_eq!(args.into, PathBuf::from("objs"));
            assert!(args.compress);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn store_requires_into() {
        assert!(Cli::try_parse_from(["cairn", "store", "src"]).is_err());
    }

    #[test]
    fn parse_ls_index() {
        let cli = Cli::try_parse_from(["cairn", "ls-index", "objs"]).unwrap();
        assert!(matches!(cli.command, Command::LsIndex(_)));
    }

    #[test]
    fn parse_cat() {
        let cli = Cli::try_parse_from(["cairn", "cat", "objs", "dir/file.txt"]).unwrap();
        if let Command::Cat(args) = cli.command {
            assert_eq!(args.dir, PathBuf::from("objs"));
            assert_eq!(args.path, "dir/file.txt");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["cairn", "verify", "objs"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "cairn", "--verbose", "--no-color", "--config", "c.toml", "verify", "objs",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["cairn", "--format", "json", "ls-index", "objs"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
