use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::{fs, path::PathBuf};
use xlreplace::{
    config::Config,
    engine::{ReplaceRequest, RunOptions, SaveMode},
    error::XlReplaceError,
    logging::LogOptions,
};
#[derive(Debug, Parser)]
#[command(name = "xlreplace", version)]
#[command(about = "Apply an ordered find/replace list to a cell range of one sheet in an .xlsx workbook")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(long, global = true, value_name = "PATH", help = "Also append the event log to this file")]
    pub log_file: Option<PathBuf>,
    #[arg(long, short, global = true, help = "Log debug details")]
    pub verbose: bool,
    #[arg(long, short, global = true, conflicts_with = "verbose", help = "Only log warnings and errors")]
    pub quiet: bool,
}
#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "List the sheet names of a workbook")]
    Sheets {
        #[arg(help = "Path to the .xlsx workbook")]
        path: PathBuf,
    },
    #[command(about = "Replace text in a range of one sheet and save the workbook in place")]
    Replace(ReplaceArgs),
}
#[derive(Debug, Args)]
pub struct ReplaceArgs {
    #[arg(help = "Path to the .xlsx workbook (overwritten on success)")]
    pub path: PathBuf,
    #[arg(long, short, help = "Sheet to edit")]
    pub sheet: Option<String>,
    #[arg(long, short, help = "Cell range, e.g. E2:F26 (single column letters only)")]
    pub range: Option<String>,
    #[arg(long, conflicts_with = "rules_file", help = "find1,replace1,find2,replace2,...")]
    pub rules: Option<String>,
    #[arg(long, value_name = "PATH", help = "Read the rules string from a file")]
    pub rules_file: Option<PathBuf>,
    #[arg(long, help = "Report what would change without writing the file")]
    pub dry_run: bool,
    #[arg(long, conflicts_with = "dry_run", help = "Skip re-reading the saved file")]
    pub fast_save: bool,
    #[arg(long, conflicts_with = "dry_run", help = "Copy the original to <name>_backup.<ext> first")]
    pub backup: bool,
}
impl Cli {
    pub fn log_options(&self, config: &Config) -> LogOptions {
        let level = if self.verbose {
            Some(LevelFilter::Debug)
        } else if self.quiet {
            Some(LevelFilter::Warn)
        } else {
            None
        };
        LogOptions {
            level,
            filter: config.log_filter.clone(),
            file: self.log_file.clone(),
        }
    }
}
impl ReplaceArgs {
    pub fn request(&self) -> Result<ReplaceRequest, XlReplaceError> {
        let rules = match (&self.rules, &self.rules_file) {
            (Some(rules), _) => rules.clone(),
            (None, Some(path)) => fs::read_to_string(path).map_err(|e| {
                XlReplaceError::Other(format!("cannot read rules file {}: {e}", path.display()))
            })?,
            (None, None) => String::new(),
        };
        Ok(ReplaceRequest {
            path: self.path.clone(),
            sheet: self.sheet.clone().unwrap_or_default(),
            range: self.range.clone().unwrap_or_default(),
            rules,
        })
    }
    pub const fn run_options(&self, config: &Config) -> RunOptions {
        let save_mode = if self.dry_run {
            SaveMode::DryRun
        } else if self.fast_save {
            SaveMode::Fast
        } else {
            SaveMode::Verify
        };
        RunOptions {
            save_mode,
            backup: self.backup,
            durability_strict: config.durability_strict,
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use std::iter;
    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(iter::once("xlreplace").chain(args.iter().copied()))
    }
    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
    #[test]
    fn replace_arguments_map_to_a_request() {
        let cli = parse(&[
            "replace", "book.xlsx", "--sheet", "Data", "--range", "A1:C3", "--rules", "a,b",
            "--fast-save",
        ])
        .unwrap();
        let Command::Replace(args) = cli.command else {
            panic!("expected replace");
        };
        let request = args.request().unwrap();
        assert_eq!(request.sheet, "Data", "sheet");
        assert_eq!(request.range, "A1:C3", "range");
        assert_eq!(request.rules, "a,b", "rules");
        assert_eq!(
            args.run_options(&Config::default()).save_mode,
            SaveMode::Fast,
            "--fast-save skips verification"
        );
    }
    #[test]
    fn omitted_fields_become_empty_for_validation() {
        let cli = parse(&["replace", "book.xlsx"]).unwrap();
        let Command::Replace(args) = cli.command else {
            panic!("expected replace");
        };
        let request = args.request().unwrap();
        assert!(
            request.sheet.is_empty() && request.range.is_empty() && request.rules.is_empty(),
            "{request:?}"
        );
        assert_eq!(
            args.run_options(&Config::default()).save_mode,
            SaveMode::Verify,
            "verification is the default"
        );
    }
    #[test]
    fn rules_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("rules.txt");
        fs::write(&rules_path, "old,new\n").unwrap();
        let cli = parse(&[
            "replace",
            "book.xlsx",
            "--rules-file",
            rules_path.to_str().unwrap(),
        ])
        .unwrap();
        let Command::Replace(args) = cli.command else {
            panic!("expected replace");
        };
        assert_eq!(args.request().unwrap().rules, "old,new\n", "trailing newline kept");
    }
    #[test]
    fn conflicting_flags_are_usage_errors() {
        assert!(parse(&["replace", "b.xlsx", "--dry-run", "--fast-save"]).is_err(), "dry run and fast save");
        assert!(parse(&["replace", "b.xlsx", "--dry-run", "--backup"]).is_err(), "dry run and backup");
        assert!(
            parse(&["replace", "b.xlsx", "--rules", "a,b", "--rules-file", "r.txt"]).is_err(),
            "two rule sources"
        );
        assert!(parse(&["-v", "-q", "sheets", "b.xlsx"]).is_err(), "verbose and quiet");
    }
    #[test]
    fn verbosity_flags_pick_the_level() {
        let cli = parse(&["sheets", "b.xlsx", "--verbose"]).unwrap();
        assert_eq!(
            cli.log_options(&Config::default()).level,
            Some(LevelFilter::Debug),
            "--verbose"
        );
    }
}
