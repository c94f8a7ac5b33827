mod cli;
mod summary;
use clap::Parser;
use cli::{Cli, Command, ReplaceArgs};
use std::{path::Path, process::ExitCode};
use xlreplace::{
    config::Config, engine, error::XlReplaceError, excel::workbook::Workbook, logging,
};
fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();
    if let Err(e) = logging::init(&cli.log_options(&config)) {
        eprintln!("Error: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }
    let result = match &cli.command {
        Command::Sheets { path } => list_sheets(path),
        Command::Replace(args) => replace(args, &config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
fn list_sheets(path: &Path) -> Result<(), XlReplaceError> {
    let book = Workbook::open(path)?;
    for name in book.sheet_names() {
        println!("{name}");
    }
    Ok(())
}
fn replace(args: &ReplaceArgs, config: &Config) -> Result<(), XlReplaceError> {
    let request = args.request()?;
    let options = args.run_options(config);
    let report = engine::run(&request, &options)?;
    match &report.saved_to {
        Some(path) => println!("Replacements completed and saved to {}", path.display()),
        None => println!(
            "Dry run: {} substitutions in {} cells; {} was not modified",
            report.substitutions.len(),
            report.cells_changed,
            request.path.display()
        ),
    }
    summary::print_summary(&report, options.save_mode);
    Ok(())
}
