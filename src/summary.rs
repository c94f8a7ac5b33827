use xlreplace::engine::{RunReport, SaveMode};
const LISTED_SUBSTITUTIONS: usize = 20;
pub fn print_summary(report: &RunReport, save_mode: SaveMode) {
    println!("\n==== Replacement summary ====");
    println!("- Sheet: {}", report.sheet);
    println!("- Range: {}", report.range);
    println!("- Cells scanned: {}", report.cells_scanned);
    println!("- Cells changed: {}", report.cells_changed);
    println!("- Substitutions: {}", report.substitutions.len());
    if report.cells_failed > 0 {
        println!("- Cells left as loaded after errors: {}", report.cells_failed);
    }
    if let Some(backup) = &report.backup {
        println!("- Backup: {}", backup.display());
    }
    match &report.saved_to {
        None => println!("- Output: (dry-run) file not written"),
        Some(path) => {
            println!("- Output: {}", path.display());
            if save_mode.verify_saved_file() {
                println!("- Save verification: on (default)");
            } else {
                println!("- Save verification: skipped (--fast-save)");
            }
        }
    }
    if !report.substitutions.is_empty() {
        println!("\n[Substitutions (first {LISTED_SUBSTITUTIONS})]");
        for (i, record) in report
            .substitutions
            .iter()
            .take(LISTED_SUBSTITUTIONS)
            .enumerate()
        {
            let s = &record.substitution;
            println!(
                "  {}. {} | '{}' -> '{}' in '{}'",
                i + 1,
                record.cell,
                s.find,
                s.replace,
                s.before
            );
        }
        if report.substitutions.len() > LISTED_SUBSTITUTIONS {
            println!(
                "  ... (showing {LISTED_SUBSTITUTIONS} of {})",
                report.substitutions.len()
            );
        }
    }
}
