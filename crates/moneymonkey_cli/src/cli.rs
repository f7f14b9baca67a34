//! Command-line surface of the `moneymonkey` admin binary.
//!
//! Every command runs the migration gate before touching data.

use clap::{Args, Parser, Subcommand};

/// MoneyMonkey reference-data administration.
#[derive(Debug, Parser)]
#[command(name = "moneymonkey", version, about = "MoneyMonkey reference-data administration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring the schema to the expected migration version and report the outcome.
    Migrate,
    /// Manage sectors.
    Sectors(SectorArgs),
    /// Browse industries.
    Industries(IndustryArgs),
    /// Browse metric names.
    Metrics(MetricArgs),
}

#[derive(Debug, Args)]
pub struct SectorArgs {
    #[command(subcommand)]
    pub action: SectorAction,
}

#[derive(Debug, Subcommand)]
pub enum SectorAction {
    /// List sectors in insertion order.
    List,
    /// Add a sector.
    Add { name: String },
    /// Rename a sector.
    Rename { old_name: String, new_name: String },
    /// Delete a sector that no industry references.
    Delete {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Debug, Args)]
pub struct IndustryArgs {
    #[command(subcommand)]
    pub action: IndustryAction,
}

#[derive(Debug, Subcommand)]
pub enum IndustryAction {
    /// List the industries of one sector.
    List { sector: String },
}

#[derive(Debug, Args)]
pub struct MetricArgs {
    #[command(subcommand)]
    pub action: MetricAction,
}

#[derive(Debug, Subcommand)]
pub enum MetricAction {
    /// List metric names.
    List,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, SectorAction};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rename_takes_old_and_new_name() {
        let cli = Cli::try_parse_from(["moneymonkey", "sectors", "rename", "Energy", "Power"])
            .unwrap();
        match cli.command {
            Command::Sectors(args) => match args.action {
                SectorAction::Rename { old_name, new_name } => {
                    assert_eq!(old_name, "Energy");
                    assert_eq!(new_name, "Power");
                }
                other => panic!("unexpected action: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn delete_asks_for_confirmation_unless_told_otherwise() {
        let prompt = Cli::try_parse_from(["moneymonkey", "sectors", "delete", "Energy"]).unwrap();
        let forced =
            Cli::try_parse_from(["moneymonkey", "sectors", "delete", "Energy", "--yes"]).unwrap();

        let yes_flag = |cli: Cli| match cli.command {
            Command::Sectors(args) => match args.action {
                SectorAction::Delete { yes, .. } => yes,
                other => panic!("unexpected action: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        };
        assert!(!yes_flag(prompt));
        assert!(yes_flag(forced));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["moneymonkey", "sectors"]).is_err());
    }
}
