// src/cli.rs

use clap::Parser;
use git_timeline::Selector;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path inside the git repository to analyze
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Walk every local and remote-tracking branch
    #[arg(long, conflicts_with = "branch")]
    pub all: bool,

    /// Walk a single branch (local first, then remote-tracking)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Number of most recent commits to load
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(10..=1000))]
    pub limit: Option<u64>,

    /// Code files sampled per commit for the project estimate
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub sample_size: Option<u64>,

    /// Settings file to use instead of git-timeline.toml in the repository
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the timeline as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write the timeline as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Show the file-level details of the commit with this SHA prefix
    #[arg(long, value_name = "SHA")]
    pub details: Option<String>,

    /// Print the branch swimlanes
    #[arg(long)]
    pub lanes: bool,

    /// Print local branches and exit
    #[arg(long)]
    pub list_branches: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    pub fn selector(&self) -> Selector {
        match (&self.branch, self.all) {
            (_, true) => Selector::AllBranches,
            (Some(name), false) => Selector::NamedBranch(name.clone()),
            (None, false) => Selector::CurrentBranch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_from_flags() {
        let args = Args::parse_from(["git-timeline"]);
        assert_eq!(args.selector(), Selector::CurrentBranch);

        let args = Args::parse_from(["git-timeline", "--all"]);
        assert_eq!(args.selector(), Selector::AllBranches);

        let args = Args::parse_from(["git-timeline", "--branch", "dev"]);
        assert_eq!(args.selector(), Selector::NamedBranch("dev".into()));
    }

    #[test]
    fn limit_range_and_conflicts() {
        assert!(Args::try_parse_from(["git-timeline", "--limit", "5"]).is_err());
        assert!(Args::try_parse_from(["git-timeline", "--limit", "1001"]).is_err());
        assert_eq!(Args::parse_from(["git-timeline", "--limit", "200"]).limit, Some(200));
        assert!(Args::try_parse_from(["git-timeline", "--all", "--branch", "dev"]).is_err());
    }
}
