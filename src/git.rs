use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use git2::{ErrorCode, Repository, Sort};
use log::{debug, error, warn};
use std::path::{Path, PathBuf};

/// Location of a cloned repository under the clones directory (`<clones>/<owner>/<name>`)
pub fn clone_path<P: AsRef<Path>>(clones_dir: P, identifier: &str) -> PathBuf {
    identifier
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(clones_dir.as_ref().to_path_buf(), |path, part| path.join(part))
}

/// A single commit's author identity and authored time in its recorded offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub author_email: String,
    pub authored: DateTime<FixedOffset>,
}

impl CommitRecord {
    /// Build a record from git's seconds-since-epoch and offset in minutes.
    /// Returns None when either cannot be represented.
    pub fn from_git_time(author_email: String, seconds: i64, offset_minutes: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(offset_minutes.checked_mul(60)?)?;
        let utc = DateTime::from_timestamp(seconds, 0)?;
        Some(Self {
            author_email,
            authored: utc.with_timezone(&offset),
        })
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.authored.with_timezone(&Utc)
    }

    /// True when the commit was recorded with a +0000 offset
    pub fn is_utc_zero(&self) -> bool {
        self.authored.offset().local_minus_utc() == 0
    }
}

/// Commits read from one repository
#[derive(Debug, Clone, Default)]
pub struct CommitHistory {
    /// Newest first, in revwalk order
    pub records: Vec<CommitRecord>,
    /// Commits whose author time could not be represented
    pub skipped: usize,
}

impl CommitHistory {
    /// UTC timestamps for the acceptance filter
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.records.iter().map(CommitRecord::utc).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A cloned repository opened for history mining
pub struct RepositoryHandle {
    repository: Repository,
    path: PathBuf,
}

impl RepositoryHandle {
    /// Open a repository from a path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            error!("Path does not exist: {}", path.display());
            anyhow::bail!("Path does not exist: {}", path.display());
        }

        let repository = Repository::open(path)
            .with_context(|| format!("Failed to open repository at: {}", path.display()))?;

        Ok(Self {
            repository,
            path: path.to_path_buf(),
        })
    }

    /// Walk every commit reachable from HEAD, newest first.
    ///
    /// An unborn HEAD yields an empty history. Author times git cannot
    /// represent as a timestamp are counted in `skipped` and left out.
    pub fn collect_history(&self) -> Result<CommitHistory> {
        if self.has_unborn_head()? {
            debug!("Repository has no commits: {}", self.path.display());
            return Ok(CommitHistory::default());
        }

        let mut revwalk = self.repository.revwalk()
            .with_context(|| format!("Failed to create revision walker for: {}", self.path.display()))?;
        revwalk.push_head()
            .with_context(|| format!("Failed to resolve HEAD for: {}", self.path.display()))?;
        revwalk.set_sorting(Sort::TIME)
            .context("Failed to set revision walk order")?;

        let mut history = CommitHistory::default();
        for oid in revwalk {
            let oid = oid.with_context(|| format!("Failed to walk history of: {}", self.path.display()))?;
            let commit = self.repository.find_commit(oid)
                .with_context(|| format!("Failed to read commit {} in {}", oid, self.path.display()))?;

            let author = commit.author();
            let email = String::from_utf8_lossy(author.email_bytes()).to_string();
            let when = author.when();

            match CommitRecord::from_git_time(email, when.seconds(), when.offset_minutes()) {
                Some(record) => history.records.push(record),
                None => {
                    debug!("Skipping commit {} with unrepresentable author time", oid);
                    history.skipped += 1;
                }
            }
        }

        if history.skipped > 0 {
            warn!(
                "{}: skipped {} commits with malformed author dates",
                self.path.display(),
                history.skipped
            );
        }
        debug!("Collected {} commits from {}", history.len(), self.path.display());
        Ok(history)
    }

    /// HEAD names a branch that has no commit yet (a fresh or empty clone)
    fn has_unborn_head(&self) -> Result<bool> {
        let empty = self.repository.is_empty()
            .with_context(|| format!("Failed to inspect repository: {}", self.path.display()))?;
        if empty {
            return Ok(true);
        }
        match self.repository.head() {
            Ok(_) => Ok(false),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => Ok(true),
            Err(e) => Err(e).with_context(|| format!("Failed to read HEAD of: {}", self.path.display())),
        }
    }
}

/// Open a cloned repository and collect its history in one step
pub fn collect_history<P: AsRef<Path>>(path: P) -> Result<CommitHistory> {
    RepositoryHandle::open(path)?.collect_history()
}
