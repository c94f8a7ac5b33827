use crate::{
    error::{Result, ValidationError, XlReplaceError},
    excel::{container::SaveOptions, workbook::Workbook, worksheet::cell_ref},
    path_policy,
    range::CellRange,
    rules::Ruleset,
    substitute::{CellOutcome, Substitution, substitute_cell},
};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    Verify,
    Fast,
    DryRun,
}
impl SaveMode {
    pub const fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
    pub const fn verify_saved_file(self) -> bool {
        matches!(self, Self::Verify)
    }
}
#[derive(Debug, Clone, Default)]
pub struct ReplaceRequest {
    pub path: PathBuf,
    pub sheet: String,
    pub range: String,
    pub rules: String,
}
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub save_mode: SaveMode,
    pub backup: bool,
    pub durability_strict: bool,
}
impl Default for RunOptions {
    fn default() -> Self {
        Self {
            save_mode: SaveMode::Verify,
            backup: false,
            durability_strict: false,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionRecord {
    pub cell: String,
    pub substitution: Substitution,
}
#[derive(Debug, Clone)]
pub struct RunReport {
    pub sheet: String,
    pub range: CellRange,
    pub cells_scanned: u64,
    pub cells_changed: u64,
    pub cells_failed: u64,
    pub substitutions: Vec<SubstitutionRecord>,
    pub backup: Option<PathBuf>,
    pub saved_to: Option<PathBuf>,
}
/// Validate, parse, load, substitute within the range, then persist.
pub fn run(request: &ReplaceRequest, options: &RunOptions) -> Result<RunReport> {
    let result = run_inner(request, options);
    match &result {
        Ok(report) if report.saved_to.is_some() => {
            info!("Replacements completed and saved to the original file");
        }
        Ok(_) => info!("Dry run finished; nothing was written"),
        Err(XlReplaceError::Persist(e)) => error!("{e}"),
        Err(e) => error!("An error occurred: {e}"),
    }
    result
}
fn run_inner(request: &ReplaceRequest, options: &RunOptions) -> Result<RunReport> {
    validate(request)?;
    let ruleset = Ruleset::parse(&request.rules).inspect_err(|_| {
        error!("Invalid replacement rules format");
    })?;
    info!("Replacement rules: {ruleset}");
    let mut book = Workbook::open(&request.path)?;
    let Some(sheet) = book.sheet(&request.sheet) else {
        return Err(ValidationError::UnknownSheet {
            name: request.sheet.clone(),
            available: book.sheet_names().iter().map(|s| (*s).to_owned()).collect(),
        }
        .into());
    };
    let (max_row, max_col) = sheet.dimensions();
    let range = CellRange::parse(&request.range, max_row, max_col)?;
    info!(
        "Sheet '{}' holds {max_row} rows x {max_col} cols; processing {range}",
        request.sheet
    );
    let mut report = RunReport {
        sheet: request.sheet.clone(),
        range,
        cells_scanned: 0,
        cells_changed: 0,
        cells_failed: 0,
        substitutions: Vec::new(),
        backup: None,
        saved_to: None,
    };
    book.with_sheet_mut(&request.sheet, |ws, shared_strings| {
        for row in range.rows() {
            for col in range.cols() {
                if row >= max_row || col >= max_col {
                    continue;
                }
                report.cells_scanned += 1;
                let (col1, row1) = (col + 1, row + 1);
                let reference = cell_ref(col1, row1);
                match substitute_cell(ws.cell(col1, row1), shared_strings, &ruleset) {
                    CellOutcome::Skipped | CellOutcome::Unchanged => {}
                    CellOutcome::Failed(e) => {
                        warn!("Error replacing value in {reference}: {e}");
                        report.cells_failed += 1;
                    }
                    CellOutcome::Replaced {
                        text,
                        substitutions,
                    } => {
                        for substitution in substitutions {
                            info!(
                                "Replacing '{}' with '{}' in '{}' ({reference})",
                                substitution.find, substitution.replace, substitution.before
                            );
                            report.substitutions.push(SubstitutionRecord {
                                cell: reference.clone(),
                                substitution,
                            });
                        }
                        if ws.set_string_at(col1, row1, &text) {
                            report.cells_changed += 1;
                        }
                    }
                }
            }
        }
    })
    .ok_or_else(|| XlReplaceError::Other(format!("sheet '{}' disappeared", request.sheet)))?;
    info!(
        "{} cells scanned, {} changed, {} substitutions",
        report.cells_scanned,
        report.cells_changed,
        report.substitutions.len()
    );
    if options.save_mode.is_dry_run() {
        return Ok(report);
    }
    if options.backup {
        report.backup = Some(make_backup(&request.path)?);
    }
    info!("Attempting to save back to the file: {}", request.path.display());
    let save_options = SaveOptions {
        verify: options.save_mode.verify_saved_file(),
        durability_strict: options.durability_strict,
    };
    book.save_as(&request.path, save_options)?;
    report.saved_to = Some(request.path.clone());
    Ok(report)
}
fn validate(request: &ReplaceRequest) -> Result<(), ValidationError> {
    let missing = if request.path.as_os_str().is_empty() {
        Some("file path")
    } else if request.sheet.trim().is_empty() {
        Some("sheet")
    } else if request.range.trim().is_empty() {
        Some("range")
    } else if request.rules.trim().is_empty() {
        Some("replacement rules")
    } else {
        None
    };
    if let Some(field) = missing {
        error!("Missing input fields: {field}");
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}
fn make_backup(original: &Path) -> Result<PathBuf> {
    let backup = path_policy::create_backup(original)?;
    info!("Backup written: {}", backup.display());
    Ok(backup)
}
