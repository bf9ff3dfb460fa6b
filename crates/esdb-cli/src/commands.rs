use std::io;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use esdb_io::{load_segment_map, write_segment_map, WriteOptions};
use esdb_merge::{ConflictResolver, Decision, MergeEngine, MergeReport, PolicyResolver, PromptResolver};
use esdb_types::SegmentMap;

use crate::cli::Cli;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let options = if cli.decimal {
        WriteOptions::decimal()
    } else {
        WriteOptions::default()
    };
    let output = (!cli.dry_run).then_some(cli.output.as_path());

    let report = match cli.on_conflict.policy() {
        Some(policy) => merge_files(&cli.old, &cli.new, output, PolicyResolver::new(policy), &options)?,
        None => {
            let resolver = PromptResolver::new(io::stdin().lock(), io::stdout());
            merge_files(&cli.old, &cli.new, output, resolver, &options)?
        }
    };

    print_summary(&report, output);
    Ok(())
}

/// Load both databases, merge them and, if `output` is given, write the result.
///
/// Nothing is written unless loading and merging both succeed.
pub fn merge_files<R: ConflictResolver>(
    old: &Path,
    new: &Path,
    output: Option<&Path>,
    resolver: R,
    options: &WriteOptions,
) -> anyhow::Result<MergeReport> {
    let old_map = load(old, "old")?;
    let new_map = load(new, "new")?;

    let outcome = MergeEngine::new(resolver)
        .merge(&old_map, &new_map)
        .context("merge aborted")?;

    if let Some(path) = output {
        write_segment_map(path, &outcome.map, options)
            .with_context(|| format!("failed to write merged database {}", path.display()))?;
    }
    Ok(outcome.report)
}

fn load(path: &Path, role: &str) -> anyhow::Result<SegmentMap> {
    let map = load_segment_map(path)
        .with_context(|| format!("failed to load {role} database {}", path.display()))?;
    if map.is_empty() {
        tracing::warn!(path = %path.display(), "{role} database is empty; nothing to merge from it");
    }
    Ok(map)
}

fn print_summary(report: &MergeReport, output: Option<&Path>) {
    println!(
        "{} Merged {} segment(s), added {} segment(s)",
        "✓".green().bold(),
        report.segments_merged.len().to_string().bold(),
        report.segments_added.len().to_string().bold(),
    );
    println!(
        "  Symbols: {} added, {} unchanged, {} rebound",
        report.symbols_added.to_string().green(),
        report.symbols_unchanged,
        report.symbols_rebound.to_string().yellow(),
    );
    if report.is_clean() {
        println!("  Conflicts: {}", "none".green());
    } else {
        println!(
            "  Conflicts: {} (old {}, new {}, renamed {})",
            report.conflict_count().to_string().yellow().bold(),
            report.count_decisions(|d| *d == Decision::KeepOld),
            report.count_decisions(|d| *d == Decision::KeepNew),
            report.count_decisions(|d| matches!(d, Decision::Rename(_))),
        );
        for resolved in &report.conflicts {
            println!(
                "    {} {} -> {}",
                resolved.conflict.address.to_string().cyan(),
                resolved.conflict,
                resolved.surviving_name().bold(),
            );
        }
    }
    match output {
        Some(path) => println!("  Output: {}", path.display().to_string().bold()),
        None => println!("  Output: {}", "dry run, nothing written".dimmed()),
    }
}
