use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "dirpatch",
    about = "Compare directory trees as unified diffs and apply them back",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with `[diff]` and `[apply]` defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a unified diff turning LEFT into RIGHT
    Diff(DiffArgs),
    /// Apply a unified diff to a directory
    Apply(ApplyArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    /// Ignore all whitespace when comparing lines
    #[arg(short = 'w', long)]
    pub ignore_whitespace: bool,
    /// Only compare the files directly inside LEFT
    #[arg(long)]
    pub flat: bool,
    /// Lines of context around each change
    #[arg(short = 'U', long)]
    pub unified: Option<usize>,
    /// Write the patch to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    pub target: PathBuf,
    /// Patch file; `-` or absent reads stdin
    pub patch: Option<PathBuf>,
    /// Keep the previous content of modified files
    #[arg(long)]
    pub backup: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_diff_flags() {
        let cli = Cli::try_parse_from(["dirpatch", "diff", "old", "new", "-w", "-U", "5", "-o", "out.patch"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Text);
        match cli.command {
            Command::Diff(args) => {
                assert_eq!(args.left, PathBuf::from("old"));
                assert_eq!(args.right, PathBuf::from("new"));
                assert!(args.ignore_whitespace);
                assert!(!args.flat);
                assert_eq!(args.unified, Some(5));
                assert_eq!(args.output, Some(PathBuf::from("out.patch")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dirpatch", "diff", "a", "b", "--flat", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Command::Diff(DiffArgs { flat: true, .. })));
    }

    #[test]
    fn apply_patch_is_optional() {
        let cli = Cli::try_parse_from(["dirpatch", "apply", "tree"]).unwrap();
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.target, PathBuf::from("tree"));
                assert!(args.patch.is_none());
                assert!(!args.backup);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["dirpatch", "--config", "d.toml", "apply", "tree", "fix.patch", "--backup"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("d.toml")));
        assert!(matches!(cli.command, Command::Apply(ApplyArgs { backup: true, .. })));
    }

    #[test]
    fn rejects_missing_operands() {
        assert!(Cli::try_parse_from(["dirpatch", "diff", "only-left"]).is_err());
        assert!(Cli::try_parse_from(["dirpatch", "--format", "yaml", "config"]).is_err());
    }
}
