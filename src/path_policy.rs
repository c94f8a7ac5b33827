use crate::error::PersistError;
use log::warn;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
const MAX_CONFLICT_ATTEMPTS: u32 = 10_000;
/// Copies `original` to the first free `<stem>_backup[_N].<ext>` beside it.
pub fn create_backup(original: &Path) -> Result<PathBuf, PersistError> {
    let requested = backup_base_path(original);
    let reserved = reserve_nonconflicting_path(&requested)?;
    if let Err(e) = fs::copy(original, &reserved) {
        if let Err(cleanup) = fs::remove_file(&reserved) {
            warn!(
                "could not remove unused backup placeholder {}: {cleanup}",
                reserved.display()
            );
        }
        return Err(PersistError::from_io(&reserved, "copy backup", e));
    }
    Ok(reserved)
}
fn backup_base_path(original: &Path) -> PathBuf {
    let parent = original.parent().unwrap_or_else(|| Path::new(""));
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workbook");
    let file_name = original.extension().and_then(|s| s.to_str()).map_or_else(
        || format!("{stem}_backup"),
        |ext| format!("{stem}_backup.{ext}"),
    );
    parent.join(file_name)
}
fn reserve_nonconflicting_path(path: &Path) -> Result<PathBuf, PersistError> {
    for seq in 0..=MAX_CONFLICT_ATTEMPTS {
        let candidate = candidate_with_suffix(path, seq);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(PersistError::from_io(&candidate, "reserve backup path", e)),
        }
    }
    Err(PersistError::Other {
        path: path.to_path_buf(),
        reason: format!("more than {MAX_CONFLICT_ATTEMPTS} backups already exist"),
    })
}
fn candidate_with_suffix(path: &Path, seq: u32) -> PathBuf {
    if seq == 0 {
        return path.to_path_buf();
    }
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("backup");
    let ext = path.extension().and_then(|s| s.to_str());
    let file_name = ext.map_or_else(
        || format!("{stem}_{seq}"),
        |ext| format!("{stem}_{seq}.{ext}"),
    );
    parent.join(file_name)
}
