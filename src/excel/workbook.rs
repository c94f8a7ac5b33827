use super::{
    container::{SaveOptions, XlsxPackage},
    ooxml::{SheetRef, drop_calc_chain, load_shared_strings, load_sheet_catalog},
    worksheet::Worksheet,
};
use crate::error::{LoadError, PersistError, XlReplaceError};
use log::{debug, info};
use std::path::Path;
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
    worksheet: Worksheet,
}
#[derive(Debug, Clone)]
pub struct Workbook {
    package: XlsxPackage,
    shared_strings: Vec<String>,
    sheets: Vec<SheetEntry>,
}
impl Workbook {
    pub fn open(path: &Path) -> Result<Self, XlReplaceError> {
        info!("Reading Excel file: {}", path.display());
        let book = Self::load(path).map_err(|e| XlReplaceError::load(path, e))?;
        info!("Available sheets: {}", book.sheet_names().join(", "));
        Ok(book)
    }
    fn load(path: &Path) -> Result<Self, LoadError> {
        let package = XlsxPackage::open(path)?;
        Self::from_package(package)
    }
    pub fn from_package(package: XlsxPackage) -> Result<Self, LoadError> {
        let catalog = load_sheet_catalog(&package)?;
        let shared_strings = load_shared_strings(&package)?;
        let mut sheets = Vec::with_capacity(catalog.len());
        for SheetRef { name, part } in catalog {
            let xml = package.read_text(&part)?;
            let worksheet = Worksheet::parse(&xml).map_err(|reason| LoadError::MalformedXml {
                part: part.clone(),
                reason,
            })?;
            debug!("loaded sheet '{name}' from {part}");
            sheets.push(SheetEntry {
                name,
                part,
                worksheet,
            });
        }
        Ok(Self {
            package,
            shared_strings,
            sheets,
        })
    }
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.worksheet)
    }
    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }
    pub fn with_sheet_mut<R, F>(&mut self, name: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Worksheet, &[String]) -> R,
    {
        let (shared_strings, sheets) = (&self.shared_strings, &mut self.sheets);
        let entry = sheets.iter_mut().find(|s| s.name == name)?;
        Some(f(&mut entry.worksheet, shared_strings))
    }
    /// Only edited worksheets are re-serialised; every other part keeps its
    /// original bytes. A stale calculation chain is dropped once a formula
    /// has been overwritten.
    pub fn save_as(&mut self, out_path: &Path, options: SaveOptions) -> Result<(), PersistError> {
        for entry in &self.sheets {
            if entry.worksheet.is_modified() {
                debug!("serialising modified sheet '{}' to {}", entry.name, entry.part);
                self.package.write_text(&entry.part, entry.worksheet.to_xml());
            }
        }
        if self.sheets.iter().any(|s| s.worksheet.formulas_dropped()) {
            drop_calc_chain(&mut self.package).map_err(|e| PersistError::Other {
                path: out_path.to_path_buf(),
                reason: format!("update calculation chain ({e})"),
            })?;
        }
        self.package.save_atomic(out_path, options, verify_saved_workbook)
    }
}
fn verify_saved_workbook(path: &Path) -> Result<(), String> {
    let book = Workbook::load(path).map_err(|e| e.to_string())?;
    debug!("verified saved file: {} sheets", book.sheets.len());
    Ok(())
}
