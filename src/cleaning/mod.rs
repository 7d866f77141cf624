//! Data cleaning stages applied to project lists and search results

pub mod duplicates;
pub mod inactive;

pub use duplicates::{find_duplicates, name_part, DuplicateEntry};
pub use inactive::{
    load_results, split_inactive, write_results, InactiveSplit, SearchResultItem, SearchResults,
    DEFAULT_MIN_LAST_COMMIT_YEAR,
};
