//! Subcommand execution

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::Path;

use super::repository::{
    collect_histories, default_output_path, ensure_distinct, resolve_clones_dir,
};
use crate::cleaning;
use crate::cli::{Args, Command, FilterArgs, ReportArgs};
use crate::config::ConfigManager;
use crate::git::CommitRecord;
use crate::output;
use crate::sampling::{self, AcceptanceFilter, BatchOutcome, RepositoryCandidate};
use crate::snapshot::ProjectList;
use crate::stats::{self, Contents, Distribution, DistributionKind, PeriodGrid, TimezoneTally};

/// Run the parsed subcommand
pub fn run_command(args: &Args, config: &ConfigManager) -> Result<()> {
    match &args.command {
        Command::Sample { repos, clones, clean_commits, filter, report } => {
            let clean_commits = *clean_commits || config.get_bool("sampling", "clean-commits")?.unwrap_or(false);
            run_sample(repos, clones.as_deref(), clean_commits, filter, report, config)
        }
        Command::Evaluate { input, filter, report } => run_evaluate(input, filter, report, config),
        Command::Duplicates { repos, output } => run_duplicates(repos, output.as_deref()),
        Command::Inactive { results, min_year, output, removed } => {
            run_inactive(results, *min_year, output.as_deref(), removed, config)
        }
        Command::Distribution {
            kind,
            start_year,
            end_year,
            interval,
            contents,
            repos,
            clones,
            output_dir,
        } => {
            let grid = PeriodGrid::new(*start_year, *end_year, *interval)?;
            run_distribution(*kind, grid, *contents, repos, clones.as_deref(), output_dir, config)
        }
        Command::Timezones { start_year, end_year, repos, clones, output_dir } => {
            run_timezones(*start_year, *end_year, repos, clones.as_deref(), output_dir, config)
        }
        Command::UtcShare { year, repos, clones } => {
            run_utc_share(*year, repos, clones.as_deref(), config)
        }
    }
}

/// Filter built from config then flags, and the cutoff (flag, config, then now)
fn build_filter(flags: &FilterArgs, config: &ConfigManager) -> Result<(AcceptanceFilter, DateTime<Utc>)> {
    let filter_config = flags.apply(config.get_filter_config()?)?;
    let cutoff = match flags.cutoff()? {
        Some(cutoff) => cutoff,
        None => config.get_cutoff()?.unwrap_or_else(Utc::now),
    };

    info!(
        "Filter: span >= {} years, {}-month buckets, threshold = average / {}, partial bucket {}, cutoff {}",
        filter_config.min_span_years,
        filter_config.bucket_months,
        filter_config.threshold_divisor,
        filter_config.partial_bucket,
        cutoff.format("%Y-%m-%d %H:%M:%S")
    );
    Ok((AcceptanceFilter::new(filter_config)?, cutoff))
}

/// Write the accepted list next to the input and print the report
fn report_outcome(outcome: &BatchOutcome, input: &Path, suffix: &str, report: &ReportArgs) -> Result<()> {
    let output_path = report
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, suffix));
    ensure_distinct(input, &output_path)?;

    let accepted = outcome.accepted(suffix.trim_end_matches(".txt"));
    accepted.write(&output_path)?;

    if report.report.eq_ignore_ascii_case("json") {
        println!("{}", output::decisions_json(outcome)?);
    } else {
        print!("{}", output::display_batch_summary(outcome, report.details));
        println!("Accepted list written to: {}", output_path.display());
    }
    Ok(())
}

fn run_sample(
    repos: &Path,
    clones: Option<&Path>,
    clean_commits: bool,
    flags: &FilterArgs,
    report: &ReportArgs,
    config: &ConfigManager,
) -> Result<()> {
    let list = ProjectList::read(repos)?;
    let clones_dir = resolve_clones_dir(clones, config)?;
    let (filter, cutoff) = build_filter(flags, config)?;

    let collection = collect_histories(&list, &clones_dir);
    let candidates: Vec<RepositoryCandidate> = collection
        .collected
        .iter()
        .map(|c| {
            let timestamps = if clean_commits {
                let cleaned = stats::cleaned_timestamps(&c.history.records);
                debug!(
                    "{}: {} of {} commits kept after timezone cleaning",
                    c.identifier,
                    cleaned.len(),
                    c.history.len()
                );
                cleaned
            } else {
                c.history.timestamps()
            };
            RepositoryCandidate::new(c.identifier.as_str(), timestamps)
        })
        .collect();

    let outcome = sampling::evaluate_batch(&filter, &candidates, cutoff)
        .with_context(|| format!("Failed to evaluate repositories from {}", repos.display()))?;
    if !collection.missing.is_empty() {
        warn!("{} listed repositories had no readable clone", collection.missing.len());
    }
    let suffix = if clean_commits { "qualifying.txt" } else { "accepted.txt" };
    report_outcome(&outcome, repos, suffix, report)
}

fn run_evaluate(
    input: &Path,
    flags: &FilterArgs,
    report: &ReportArgs,
    config: &ConfigManager,
) -> Result<()> {
    let candidates = sampling::input::load_candidates(input)?;
    let (filter, cutoff) = build_filter(flags, config)?;

    let outcome = sampling::evaluate_batch(&filter, &candidates, cutoff)
        .with_context(|| format!("Failed to evaluate candidates from {}", input.display()))?;
    report_outcome(&outcome, input, "accepted.txt", report)
}

fn run_duplicates(repos: &Path, output: Option<&Path>) -> Result<()> {
    let list = ProjectList::read(repos)?;
    let duplicates = cleaning::find_duplicates(&list);

    if duplicates.is_empty() {
        println!("No duplicate repository names found in {} entries", list.len());
    } else {
        println!("Duplicate repository names ({}):", duplicates.len());
        print!(
            "{}",
            output::format_compact_table(&["#", "Repository"], &output::duplicate_rows(&duplicates))
        );
    }

    if let Some(output) = output {
        ensure_distinct(repos, output)?;
        ProjectList::new("duplicates", duplicates.iter().map(|d| d.identifier.as_str()))
            .write(output)?;
    }
    Ok(())
}

fn run_inactive(
    results_path: &Path,
    min_year: Option<i32>,
    output: Option<&Path>,
    removed_path: &Path,
    config: &ConfigManager,
) -> Result<()> {
    let min_year = match min_year {
        Some(year) => year,
        None => config.get_min_last_commit_year()?,
    };
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(results_path, "active.json"));
    ensure_distinct(results_path, &output_path)?;
    ensure_distinct(results_path, removed_path)?;

    let results = cleaning::load_results(results_path)?;
    let split = cleaning::split_inactive(&results, min_year)
        .with_context(|| format!("Failed to filter {}", results_path.display()))?;

    cleaning::write_results(&split.kept, &output_path)?;
    split.removed.write(removed_path)?;

    println!("Repositories before filtering: {}", results.items.len());
    println!("Repositories removed (last commit before {}): {}", min_year, split.removed.len());
    println!("Active repositories remaining: {}", split.kept.items.len());
    println!("Cleaned results written to: {}", output_path.display());
    Ok(())
}

fn run_distribution(
    kind: DistributionKind,
    grid: PeriodGrid,
    contents: Contents,
    repos: &Path,
    clones: Option<&Path>,
    output_dir: &Path,
    config: &ConfigManager,
) -> Result<()> {
    let list = ProjectList::read(repos)?;
    let clones_dir = resolve_clones_dir(clones, config)?;
    let collection = collect_histories(&list, &clones_dir);

    let individual: Vec<(&str, Distribution)> = collection
        .collected
        .par_iter()
        .map(|c| {
            (
                c.identifier.as_str(),
                Distribution::from_records(kind, grid, &c.history.records),
            )
        })
        .collect();

    let combined = individual
        .iter()
        .fold(Distribution::new(kind, grid), |combined, (_, d)| combined.merged(d));

    let combined_path = output::write_distribution(output_dir, None, &combined, contents)?;
    let file_names = output::unique_file_names(individual.iter().map(|(identifier, _)| *identifier));
    for ((identifier, distribution), file_name) in individual.iter().zip(&file_names) {
        let path = output::write_distribution(output_dir, Some(file_name.as_str()), distribution, contents)?;
        debug!("{}: {} commits counted, written to {}", identifier, distribution.total(), path.display());
    }

    println!(
        "Commit {} written to {} ({} commits from {} repositories)",
        contents,
        combined_path.display(),
        combined.total(),
        individual.len()
    );
    println!(
        "Individual repository files written to {}",
        output_dir.join(output::distributions::INDIVIDUAL_DIR).display()
    );
    Ok(())
}

fn run_timezones(
    start_year: i32,
    end_year: i32,
    repos: &Path,
    clones: Option<&Path>,
    output_dir: &Path,
    config: &ConfigManager,
) -> Result<()> {
    let list = ProjectList::read(repos)?;
    let clones_dir = resolve_clones_dir(clones, config)?;
    let collection = collect_histories(&list, &clones_dir);

    let tallies: Vec<TimezoneTally> = collection
        .collected
        .par_iter()
        .map(|c| TimezoneTally::from_records(&c.history.records, start_year, end_year))
        .collect();
    let file_names = output::unique_file_names(collection.collected.iter().map(|c| c.identifier.as_str()));

    let mut summary = TimezoneTally::default();
    let mut rows = Vec::with_capacity(tallies.len());
    for ((collected, tally), file_name) in collection.collected.iter().zip(&tallies).zip(&file_names) {
        let Some((label, count)) = tally.most_common() else {
            debug!("{}: no commits between {} and {}", collected.identifier, start_year, end_year);
            continue;
        };
        summary.record(label);
        rows.push(vec![collected.identifier.clone(), label.to_string(), count.to_string()]);

        let path = output::write_repository_tally(output_dir, file_name, tally)?;
        debug!("{}: {} timezones written to {}", collected.identifier, tally.iter().count(), path.display());
    }
    let summary_path = output::write_timezone_summary(output_dir, &summary)?;

    print!(
        "{}",
        output::format_compact_table(&["Repository", "Most common timezone", "Commits"], &rows)
    );
    println!("Most common timezones written to: {}", summary_path.display());
    Ok(())
}

fn run_utc_share(
    year: i32,
    repos: &Path,
    clones: Option<&Path>,
    config: &ConfigManager,
) -> Result<()> {
    let list = ProjectList::read(repos)?;
    let clones_dir = resolve_clones_dir(clones, config)?;
    let collection = collect_histories(&list, &clones_dir);

    let rows: Vec<Vec<String>> = collection
        .collected
        .iter()
        .map(|c| {
            vec![
                c.identifier.clone(),
                format!("{:.2}", stats::utc_share(&c.history.records, year)),
            ]
        })
        .collect();

    let all_records: Vec<CommitRecord> = collection
        .collected
        .iter()
        .flat_map(|c| c.history.records.iter().cloned())
        .collect();

    print!("{}", output::format_compact_table(&["Repository", "UTC+0 %"], &rows));
    println!(
        "Commits in {} recorded at +0000: {:.2}%",
        year,
        stats::utc_share(&all_records, year)
    );
    Ok(())
}
