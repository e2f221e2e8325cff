use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use dirpatch_tree::{
    apply_patch_with, list_diffs, ApplyReport, DirpatchConfig, FileAction, FileDiff, FsPatchEngine,
    LineDiffEngine, PatchTreeBuilder,
};
use serde::Serialize;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, config, cli.format),
        Command::Apply(args) => cmd_apply(args, config, cli.format),
        Command::Config(_) => cmd_config(&config, cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DirpatchConfig> {
    match path {
        Some(path) => DirpatchConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(DirpatchConfig::default()),
    }
}

/// Flags win over the config file.
fn merge_diff_flags(config: &mut DirpatchConfig, args: &DiffArgs) {
    if args.ignore_whitespace {
        config.diff.whitespace_insensitive = true;
    }
    if let Some(context) = args.unified {
        config.diff.context_lines = context;
    }
}

fn cmd_diff(args: DiffArgs, mut config: DirpatchConfig, format: OutputFormat) -> anyhow::Result<()> {
    merge_diff_flags(&mut config, &args);
    let engine = LineDiffEngine::new();

    if args.flat {
        let diffs = list_diffs(&engine, &args.left, &args.right, &config.diff)
            .with_context(|| format!("comparing {} with {}", args.left.display(), args.right.display()))?;
        return print_flat(&diffs, format);
    }

    let patch = PatchTreeBuilder::new(&engine, config.diff)
        .build(&args.left, &args.right)
        .with_context(|| format!("comparing {} with {}", args.left.display(), args.right.display()))?;

    match &args.output {
        Some(path) => {
            fs::write(path, &patch).with_context(|| format!("writing {}", path.display()))?;
            if format == OutputFormat::Text {
                let files = patch.lines().filter(|l| l.starts_with("+++ ")).count();
                println!("{} Wrote {} file patch(es) to {}", "✓".green().bold(), files, path.display().to_string().bold());
            }
        }
        None => print!("{patch}"),
    }
    Ok(())
}

#[derive(Serialize)]
struct FlatEntry<'a> {
    left: &'a str,
    right: &'a str,
    changed: bool,
    additions: usize,
    deletions: usize,
}

fn print_flat(diffs: &[FileDiff], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<FlatEntry<'_>> = diffs
                .iter()
                .map(|d| FlatEntry {
                    left: &d.old_label,
                    right: &d.new_label,
                    changed: !d.is_empty(),
                    additions: d.additions(),
                    deletions: d.deletions(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            for d in diffs {
                if d.is_empty() {
                    println!("  {} {}", "=".dimmed(), d.old_label);
                } else {
                    println!(
                        "  {} {} {} {}",
                        "M".yellow().bold(),
                        d.old_label,
                        format!("+{}", d.additions()).green(),
                        format!("-{}", d.deletions()).red(),
                    );
                }
            }
        }
    }
    Ok(())
}

fn read_patch(source: Option<&Path>) -> anyhow::Result<String> {
    match source {
        Some(path) if path != Path::new("-") => {
            fs::read_to_string(path).with_context(|| format!("reading patch {}", path.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("reading patch from stdin")?;
            Ok(text)
        }
    }
}

fn cmd_apply(args: ApplyArgs, mut config: DirpatchConfig, format: OutputFormat) -> anyhow::Result<()> {
    if args.backup {
        config.apply.create_backups = true;
    }
    let text = read_patch(args.patch.as_deref())?;
    let report = apply_patch_with(&FsPatchEngine::new(), &args.target, &text, &config.apply)
        .with_context(|| format!("applying patch to {}", args.target.display()))?;
    print_report(&report, format)
}

fn print_report(report: &ApplyReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.is_empty() {
        println!("Nothing to apply.");
        return Ok(());
    }
    for file in &report.files {
        let marker = match file.action {
            FileAction::Created => "created:".green(),
            FileAction::Modified => "modified:".yellow(),
            FileAction::Deleted => "deleted:".red(),
        };
        let reversed = if file.reversed { " (reversed)".dimmed().to_string() } else { String::new() };
        println!("  {} {}{}", marker, file.path.display(), reversed);
    }
    println!(
        "{} Applied {} file patch(es): {} created, {} modified, {} deleted",
        "✓".green().bold(),
        report.len(),
        report.count(FileAction::Created),
        report.count(FileAction::Modified),
        report.count(FileAction::Deleted),
    );
    Ok(())
}

fn cmd_config(config: &DirpatchConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(args: &[&str]) -> anyhow::Result<()> {
        run_command(Cli::try_parse_from(args)?)
    }

    #[test]
    fn diff_then_apply_through_files() {
        let tmp = tempfile::tempdir().unwrap();
        let left = tmp.path().join("left");
        let right = tmp.path().join("right");
        fs::create_dir_all(&left).unwrap();
        fs::create_dir_all(right.join("sub")).unwrap();
        fs::write(left.join("f.txt"), "one\ntwo\n").unwrap();
        fs::write(right.join("f.txt"), "one\n2\n").unwrap();
        fs::write(right.join("sub/new.txt"), "fresh\n").unwrap();

        let patch = tmp.path().join("out.patch");
        run(&["dirpatch", "diff", left.to_str().unwrap(), right.to_str().unwrap(), "-o", patch.to_str().unwrap()]).unwrap();
        assert!(fs::read_to_string(&patch).unwrap().starts_with("--- a/f.txt\n+++ b/f.txt\n"));

        run(&["dirpatch", "apply", left.to_str().unwrap(), patch.to_str().unwrap(), "--backup"]).unwrap();
        assert_eq!(fs::read_to_string(left.join("f.txt")).unwrap(), "one\n2\n");
        assert_eq!(fs::read_to_string(left.join("sub/new.txt")).unwrap(), "fresh\n");
        assert_eq!(fs::read_to_string(left.join("f.txt.orig")).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn config_file_and_flags_merge() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dirpatch.toml");
        fs::write(&path, "[diff]\ncontext_lines = 1\n").unwrap();

        let mut config = load_config(Some(&path)).unwrap();
        let cli = Cli::try_parse_from(["dirpatch", "diff", "a", "b", "-w"]).unwrap();
        let Command::Diff(args) = cli.command else { panic!("expected diff") };
        merge_diff_flags(&mut config, &args);
        assert!(config.diff.whitespace_insensitive);
        assert_eq!(config.diff.context_lines, 1);

        let cli = Cli::try_parse_from(["dirpatch", "diff", "a", "b", "-U", "7"]).unwrap();
        let Command::Diff(args) = cli.command else { panic!("expected diff") };
        merge_diff_flags(&mut config, &args);
        assert_eq!(config.diff.context_lines, 7);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("loading config"));
    }

    #[test]
    fn apply_mismatch_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("x"), "unrelated\n").unwrap();
        let patch = tmp.path().join("p.patch");
        fs::write(&patch, "--- a/x\n+++ b/x\n@@ -1,1 +1,1 @@\n-a\n+b\n").unwrap();

        let result = run(&["dirpatch", "apply", tmp.path().to_str().unwrap(), patch.to_str().unwrap()]);
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(tmp.path().join("x")).unwrap(), "unrelated\n");
    }
}
