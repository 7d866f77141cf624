//! End-to-End Integration Tests
//!
//! Builds clones with backdated commits in a temporary clones directory and
//! runs the full pipeline: history collection, batch evaluation, accepted
//! list, cleaning and distribution output.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use clap::Parser;
use git2::{Repository, Signature, Time};
use tempfile::TempDir;

use msr_sampler::app;
use msr_sampler::cli::Args;
use msr_sampler::config::ConfigManager;
use msr_sampler::sampling::{evaluate_batch, AcceptanceFilter, DecisionReason, RepositoryCandidate};
use msr_sampler::snapshot::ProjectList;
use msr_sampler::stats;

/// Create `<clones>/<identifier>` with one empty-tree commit per author time
fn create_clone(clones: &Path, identifier: &str, email: &str, times: &[DateTime<FixedOffset>]) {
    let commits: Vec<(&str, DateTime<FixedOffset>)> = times.iter().map(|time| (email, *time)).collect();
    create_shared_clone(clones, identifier, &commits);
}

/// Like `create_clone`, with an author per commit
fn create_shared_clone(clones: &Path, identifier: &str, commits: &[(&str, DateTime<FixedOffset>)]) {
    let path = clones.join(identifier);
    fs::create_dir_all(&path).expect("Failed to create clone dir");
    let repo = Repository::init(&path).expect("Failed to init repository");

    let tree_id = repo.index().unwrap().write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).unwrap();

    let mut parent: Option<git2::Oid> = None;
    for (email, time) in commits {
        let when = Time::new(time.timestamp(), time.offset().local_minus_utc() / 60);
        let signature = Signature::new("Contributor", email, &when).unwrap();
        let parents: Vec<git2::Commit> = parent
            .map(|oid| vec![repo.find_commit(oid).unwrap()])
            .unwrap_or_default();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, "work", &tree, &parent_refs)
            .expect("Failed to commit");
        parent = Some(oid);
    }
}

/// Commits on the 15th of every other month in `[first_year, last_year]`, skipping `gap_year`
fn bimonthly(first_year: i32, last_year: i32, gap_year: Option<i32>) -> Vec<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(3600).unwrap();
    (first_year..=last_year)
        .filter(|year| Some(*year) != gap_year)
        .flat_map(|year| (1..=12).step_by(2).map(move |month| (year, month)))
        .map(|(year, month)| offset.with_ymd_and_hms(year, month, 15, 10, 0, 0).unwrap())
        .collect()
}

fn cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Three clones: one steady, one too young, one with a silent year
fn create_workspace() -> TempDir {
    let workspace = TempDir::new().expect("Failed to create temp dir");
    let clones = workspace.path().join("clones");

    create_clone(&clones, "apache/steady", "dev@apache.org", &bimonthly(2000, 2023, None));
    create_clone(&clones, "young/project", "dev@young.org", &bimonthly(2015, 2023, None));
    create_clone(&clones, "gnu/gappy", "dev@gnu.org", &bimonthly(2000, 2023, Some(2013)));

    fs::write(
        workspace.path().join("projects.txt"),
        "apache/steady\nyoung/project\ngnu/gappy\nmissing/clone\n",
    )
    .unwrap();
    workspace
}

#[test]
fn test_collect_and_evaluate_pipeline() {
    let workspace = create_workspace();
    let list = ProjectList::read(workspace.path().join("projects.txt")).unwrap();

    let collection = app::collect_histories(&list, &workspace.path().join("clones"));
    assert_eq!(collection.collected.len(), 3);
    assert_eq!(collection.missing, vec!["missing/clone".to_string()]);

    let candidates: Vec<RepositoryCandidate> = collection
        .collected
        .iter()
        .map(|c| RepositoryCandidate::new(c.identifier.as_str(), c.history.timestamps()))
        .collect();
    let outcome = evaluate_batch(&AcceptanceFilter::default(), &candidates, cutoff()).unwrap();

    let reasons: Vec<(&str, DecisionReason)> = outcome
        .decisions
        .iter()
        .map(|d| (d.repository.as_str(), d.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("apache/steady", DecisionReason::Accepted),
            ("gnu/gappy", DecisionReason::LowActivityInterval),
            ("young/project", DecisionReason::InsufficientSpan),
        ]
    );

    let gappy = &outcome.decisions[1];
    let failing = gappy.failing_bucket.as_ref().unwrap();
    assert_eq!(failing.start, Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(failing.count, 0);

    let accepted = outcome.accepted("accepted");
    assert_eq!(accepted.entries(), ["apache/steady".to_string()]);
}

#[test]
fn test_sample_command_writes_accepted_list() {
    let workspace = create_workspace();
    let repos = workspace.path().join("projects.txt");
    let clones = workspace.path().join("clones");
    let repos_arg = repos.to_string_lossy().to_string();
    let clones_arg = clones.to_string_lossy().to_string();

    let args = Args::try_parse_from([
        "msr-sampler", "sample",
        "--repos", repos_arg.as_str(),
        "--clones", clones_arg.as_str(),
        "--cutoff", "2024-01-01",
    ])
    .unwrap();
    app::run_command(&args, &ConfigManager::default()).unwrap();

    let accepted = ProjectList::read(workspace.path().join("projects.accepted.txt")).unwrap();
    assert_eq!(accepted.entries(), ["apache/steady".to_string()]);

    // The input list is left untouched
    let original = ProjectList::read(&repos).unwrap();
    assert_eq!(original.len(), 4);
}

#[test]
fn test_sample_command_refuses_to_overwrite_input() {
    let workspace = create_workspace();
    let repos = workspace.path().join("projects.txt");
    let repos_arg = repos.to_string_lossy().to_string();
    let clones_arg = workspace.path().join("clones").to_string_lossy().to_string();

    let args = Args::try_parse_from([
        "msr-sampler", "sample",
        "--repos", repos_arg.as_str(),
        "--clones", clones_arg.as_str(),
        "--output", repos_arg.as_str(),
    ])
    .unwrap();
    let err = app::run_command(&args, &ConfigManager::default()).unwrap_err();
    assert!(err.to_string().contains("would overwrite its input"));
    assert_eq!(ProjectList::read(&repos).unwrap().len(), 4);
}

#[test]
fn test_distribution_command_writes_combined_and_individual_files() {
    let workspace = create_workspace();
    let repos_arg = workspace.path().join("projects.txt").to_string_lossy().to_string();
    let clones_arg = workspace.path().join("clones").to_string_lossy().to_string();
    let out = workspace.path().join("out");
    let out_arg = out.to_string_lossy().to_string();

    let args = Args::try_parse_from([
        "msr-sampler", "distribution", "days",
        "--start-year", "2000",
        "--end-year", "2023",
        "--interval", "8",
        "--repos", repos_arg.as_str(),
        "--clones", clones_arg.as_str(),
        "--output-dir", out_arg.as_str(),
    ])
    .unwrap();
    app::run_command(&args, &ConfigManager::default()).unwrap();

    let combined = fs::read_to_string(out.join("CommitCountsPerDay.csv")).unwrap();
    let mut lines = combined.lines();
    assert_eq!(lines.next(), Some("Day,2000-2007,2008-2015,2016-2023"));
    assert_eq!(combined.lines().count(), 8);

    // Every commit lands in exactly one cell
    let total: u64 = combined
        .lines()
        .skip(1)
        .flat_map(|line| line.split(',').skip(1).map(|cell| cell.parse::<u64>().unwrap()))
        .sum();
    let expected = bimonthly(2000, 2023, None).len()
        + bimonthly(2015, 2023, None).len()
        + bimonthly(2000, 2023, Some(2013)).len();
    assert_eq!(total as usize, expected);

    let individual = out.join("individual_repos").join("apachesteady_CommitCountsPerDay.csv");
    assert!(individual.exists());
}

#[test]
fn test_weekday_matches_commit_local_date() {
    let workspace = create_workspace();
    let list = ProjectList::new("one", ["apache/steady"]);
    let collection = app::collect_histories(&list, &workspace.path().join("clones"));
    let records = &collection.collected[0].history.records;

    // Newest first; 2023-11-15 10:00 +01:00 was a Wednesday
    assert_eq!(records[0].authored.day(), 15);
    assert_eq!(records[0].authored.weekday(), chrono::Weekday::Wed);
}

#[test]
fn test_inactive_command_round_trip() {
    let workspace = TempDir::new().unwrap();
    let results = workspace.path().join("results.json");
    fs::write(
        &results,
        r#"{"items": [
            {"name": "old/one", "lastCommit": "2010-05-05T00:00:00"},
            {"name": "new/one", "lastCommit": "2020-05-05T00:00:00"}
        ]}"#,
    )
    .unwrap();
    let removed = workspace.path().join("removed.txt");
    let results_arg = results.to_string_lossy().to_string();
    let removed_arg = removed.to_string_lossy().to_string();

    let args = Args::try_parse_from([
        "msr-sampler", "inactive",
        "--results", results_arg.as_str(),
        "--removed", removed_arg.as_str(),
    ])
    .unwrap();
    app::run_command(&args, &ConfigManager::default()).unwrap();

    let kept = msr_sampler::cleaning::load_results(workspace.path().join("results.active.json")).unwrap();
    assert_eq!(kept.items.len(), 1);
    assert_eq!(kept.items[0].name, "new/one");
    assert_eq!(fs::read_to_string(&removed).unwrap(), "old/one\n");
}

#[test]
fn test_empty_clone_is_collected_with_insufficient_span() {
    let workspace = TempDir::new().unwrap();
    let clones = workspace.path().join("clones");
    fs::create_dir_all(clones.join("owner/empty")).unwrap();
    Repository::init(clones.join("owner/empty")).unwrap();
    create_clone(&clones, "apache/steady", "dev@apache.org", &bimonthly(2000, 2023, None));
    let repos = workspace.path().join("projects.txt");
    fs::write(&repos, "owner/empty\napache/steady\n").unwrap();

    let list = ProjectList::read(&repos).unwrap();
    let collection = app::collect_histories(&list, &clones);
    assert!(collection.missing.is_empty());
    assert_eq!(collection.collected.len(), 2);

    let candidates: Vec<RepositoryCandidate> = collection
        .collected
        .iter()
        .map(|c| RepositoryCandidate::new(c.identifier.as_str(), c.history.timestamps()))
        .collect();
    let outcome = evaluate_batch(&AcceptanceFilter::default(), &candidates, cutoff()).unwrap();
    let empty = outcome
        .decisions
        .iter()
        .find(|d| d.repository == "owner/empty")
        .unwrap();
    assert_eq!(empty.reason, DecisionReason::InsufficientSpan);

    let repos_arg = repos.to_string_lossy().to_string();
    let clones_arg = clones.to_string_lossy().to_string();
    let args = Args::try_parse_from([
        "msr-sampler", "sample",
        "--repos", repos_arg.as_str(),
        "--clones", clones_arg.as_str(),
        "--cutoff", "2024-01-01",
    ])
    .unwrap();
    app::run_command(&args, &ConfigManager::default()).unwrap();

    let accepted = ProjectList::read(workspace.path().join("projects.accepted.txt")).unwrap();
    assert_eq!(accepted.entries(), ["apache/steady".to_string()]);
}

/// A +01:00 developer silent in 2013 and a UTC-only bot covering that year
fn create_bot_filled_workspace() -> TempDir {
    let workspace = TempDir::new().unwrap();
    let clones = workspace.path().join("clones");

    let utc = FixedOffset::east_opt(0).unwrap();
    let bot_times: Vec<DateTime<FixedOffset>> = (1..=12)
        .step_by(2)
        .map(|month| utc.with_ymd_and_hms(2013, month, 15, 10, 0, 0).unwrap())
        .collect();
    let mut commits: Vec<(&str, DateTime<FixedOffset>)> = bimonthly(2000, 2023, Some(2013))
        .into_iter()
        .map(|time| ("dev@gnu.org", time))
        .chain(bot_times.into_iter().map(|time| ("bot@gnu.org", time)))
        .collect();
    commits.sort_by_key(|(_, time)| *time);
    create_shared_clone(&clones, "gnu/botfilled", &commits);

    fs::write(workspace.path().join("projects.txt"), "gnu/botfilled\n").unwrap();
    workspace
}

fn sample_args(workspace: &TempDir, extra: &[&str]) -> Args {
    let repos_arg = workspace.path().join("projects.txt").to_string_lossy().to_string();
    let clones_arg = workspace.path().join("clones").to_string_lossy().to_string();
    let mut argv = vec![
        "msr-sampler".to_string(),
        "sample".to_string(),
        "--repos".to_string(),
        repos_arg,
        "--clones".to_string(),
        clones_arg,
        "--cutoff".to_string(),
        "2024-01-01".to_string(),
    ];
    argv.extend(extra.iter().map(|arg| arg.to_string()));
    Args::try_parse_from(argv).unwrap()
}

#[test]
fn test_clean_commits_drops_utc_only_contributor() {
    let workspace = create_bot_filled_workspace();

    app::run_command(&sample_args(&workspace, &[]), &ConfigManager::default()).unwrap();
    let accepted = ProjectList::read(workspace.path().join("projects.accepted.txt")).unwrap();
    assert_eq!(accepted.entries(), ["gnu/botfilled".to_string()]);

    app::run_command(&sample_args(&workspace, &["--clean-commits"]), &ConfigManager::default()).unwrap();
    let qualifying = ProjectList::read(workspace.path().join("projects.qualifying.txt")).unwrap();
    assert!(qualifying.is_empty());

    let list = ProjectList::read(workspace.path().join("projects.txt")).unwrap();
    let collection = app::collect_histories(&list, &workspace.path().join("clones"));
    let history = &collection.collected[0].history;
    let candidates = vec![RepositoryCandidate::new(
        "gnu/botfilled",
        stats::cleaned_timestamps(&history.records),
    )];
    let outcome = evaluate_batch(&AcceptanceFilter::default(), &candidates, cutoff()).unwrap();
    assert_eq!(outcome.decisions[0].reason, DecisionReason::LowActivityInterval);
}

#[test]
fn test_timezones_command_writes_tallies_and_summary() {
    let workspace = create_workspace();
    let repos_arg = workspace.path().join("projects.txt").to_string_lossy().to_string();
    let clones_arg = workspace.path().join("clones").to_string_lossy().to_string();
    let output = workspace.path().join("out");
    let output_arg = output.to_string_lossy().to_string();

    let args = Args::try_parse_from([
        "msr-sampler", "timezones",
        "--repos", repos_arg.as_str(),
        "--clones", clones_arg.as_str(),
        "--output-dir", output_arg.as_str(),
    ])
    .unwrap();
    app::run_command(&args, &ConfigManager::default()).unwrap();

    let steady = fs::read_to_string(
        output.join("commits_per_timezone").join("apachesteady_commits_per_timezone.txt"),
    )
    .unwrap();
    assert_eq!(steady, "Timezone,Commits\n+0100,120\n");

    let summary = fs::read_to_string(output.join("most_common_timezone.txt")).unwrap();
    assert_eq!(summary, "Timezone,Repositories\n+0100,3\n");
}
