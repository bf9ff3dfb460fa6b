use std::path::PathBuf;

use clap::Parser;
use esdb_merge::ConflictPolicy;

#[derive(Parser)]
#[command(
    name = "esdb-merge",
    about = "Merge two ESDB symbol databases into one",
    version,
)]
pub struct Cli {
    /// The existing (usually hand-annotated) database
    #[arg(long)]
    pub old: PathBuf,

    /// The incoming database to merge into it
    #[arg(long)]
    pub new: PathBuf,

    /// Where to write the merged database
    #[arg(long)]
    pub output: PathBuf,

    /// How to settle symbols that share an address but not a name
    #[arg(long, value_enum, default_value = "ask")]
    pub on_conflict: OnConflict,

    /// Write addresses and IDs in decimal instead of hexadecimal
    #[arg(long)]
    pub decimal: bool,

    /// Merge and report, but do not write the output
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OnConflict {
    /// Prompt on the terminal for every conflict
    Ask,
    /// Always keep the name from --old
    KeepOld,
    /// Always take the name from --new
    KeepNew,
}

impl OnConflict {
    /// The unattended policy, or `None` when a human decides.
    pub fn policy(self) -> Option<ConflictPolicy> {
        match self {
            Self::Ask => None,
            Self::KeepOld => Some(ConflictPolicy::KeepOld),
            Self::KeepNew => Some(ConflictPolicy::KeepNew),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_required_paths() {
        let cli = Cli::try_parse_from([
            "esdb-merge", "--old", "a.yml", "--new", "b.yml", "--output", "c.yml",
        ])
        .unwrap();
        assert_eq!(cli.old, PathBuf::from("a.yml"));
        assert_eq!(cli.new, PathBuf::from("b.yml"));
        assert_eq!(cli.output, PathBuf::from("c.yml"));
        assert_eq!(cli.on_conflict, OnConflict::Ask);
        assert!(!cli.decimal);
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
    }

    #[test]
    fn missing_output_is_rejected() {
        assert!(Cli::try_parse_from(["esdb-merge", "--old", "a", "--new", "b"]).is_err());
    }

    #[test]
    fn missing_old_is_rejected() {
        assert!(Cli::try_parse_from(["esdb-merge", "--new", "b", "--output", "c"]).is_err());
    }

    #[test]
    fn parse_conflict_policy() {
        let cli = Cli::try_parse_from([
            "esdb-merge", "--old", "a", "--new", "b", "--output", "c", "--on-conflict", "keep-new",
        ])
        .unwrap();
        assert_eq!(cli.on_conflict, OnConflict::KeepNew);
        assert_eq!(cli.on_conflict.policy(), Some(ConflictPolicy::KeepNew));
        assert_eq!(OnConflict::Ask.policy(), None);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(Cli::try_parse_from([
            "esdb-merge", "--old", "a", "--new", "b", "--output", "c", "--on-conflict", "newest",
        ])
        .is_err());
    }

    #[test]
    fn parse_flags() {
        let cli = Cli::try_parse_from([
            "esdb-merge", "--old", "a", "--new", "b", "--output", "c", "--decimal", "--dry-run", "-v",
        ])
        .unwrap();
        assert!(cli.decimal);
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }
}
