use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "converge")]
#[command(version)]
#[command(about = "Converge OS services to the state declared in a manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Service manifest (TOML or JSON)
    #[arg(short, long, global = true, env = "CONVERGE_MANIFEST", value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge every declared service to its action
    Apply(ApplyArgs),

    /// Preview what apply would change
    Diff(TargetArgs),

    /// Show the current OS state of declared services
    Status(StatusArgs),

    /// Check the manifest without touching any service
    Validate,

    /// List declarations, including inert ones
    List,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct TargetArgs {
    /// Limit to `service`, `service.<name>`, or a declaration name (`kafka-*` matches a prefix)
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Limit to `service`, `service.<name>`, or a declaration name (`kafka-*` matches a prefix)
    pub target: Option<String>,

    /// Show what would change without calling the service manager
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Parallel jobs for unprivileged actions
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Limit to `service`, `service.<name>`, or a declaration name (`kafka-*` matches a prefix)
    pub target: Option<String>,

    /// Print status as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "converge",
            "-vv",
            "--manifest",
            "/etc/converge/services.toml",
            "apply",
            "service.kafka-manager",
            "--dry-run",
            "--jobs",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.manifest.as_deref(),
            Some(std::path::Path::new("/etc/converge/services.toml"))
        );
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.target.as_deref(), Some("service.kafka-manager"));
                assert!(args.dry_run);
                assert!(!args.yes);
                assert_eq!(args.jobs, 2);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_zero_jobs_rejected() {
        assert!(Cli::try_parse_from(["converge", "apply", "--jobs", "0"]).is_err());
    }
}
