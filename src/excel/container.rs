use crate::error::{LoadError, PersistError};
use log::{debug, warn};
use std::{
    fs,
    io::{self, Cursor, Read as _, Seek, Write},
    path::Path,
};
use tempfile::NamedTempFile;
use zip::{CompressionMethod, ZipArchive, ZipWriter, result::ZipResult, write::SimpleFileOptions};
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    stored: bool,
    is_dir: bool,
}
#[derive(Debug, Clone, Default)]
pub struct XlsxPackage {
    entries: Vec<PackageEntry>,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub verify: bool,
    pub durability_strict: bool,
}
impl XlsxPackage {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(LoadError::NotFound),
            Err(e) => return Err(LoadError::Io(e)),
        };
        Self::from_bytes(bytes)
    }
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, LoadError> {
        if bytes.get(..CFB_SIGNATURE.len()) == Some(CFB_SIGNATURE.as_slice()) {
            return Err(LoadError::LegacyXls);
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_owned(),
                stored: file.compression() == CompressionMethod::Stored,
                is_dir: file.is_dir(),
                data,
            });
        }
        Ok(Self { entries })
    }
    pub fn contains(&self, part: &str) -> bool {
        self.entry(part).is_some()
    }
    pub fn read_text(&self, part: &str) -> Result<String, LoadError> {
        let entry = self
            .entry(part)
            .ok_or_else(|| LoadError::MissingPart(part.to_owned()))?;
        String::from_utf8(entry.data.clone()).map_err(|_utf8| LoadError::NotUtf8(part.to_owned()))
    }
    pub fn write_text(&mut self, part: &str, content: String) {
        let data = content.into_bytes();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == part) {
            entry.data = data;
            return;
        }
        self.entries.push(PackageEntry {
            name: part.to_owned(),
            data,
            stored: false,
            is_dir: false,
        });
    }
    pub fn remove_part(&mut self, part: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != part);
        self.entries.len() != before
    }
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
    fn entry(&self, part: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.name == part)
    }
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> ZipResult<W> {
        let mut writer = ZipWriter::new(sink);
        for entry in &self.entries {
            let method = if entry.stored {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);
            if entry.is_dir {
                writer.add_directory(entry.name.clone(), options)?;
                continue;
            }
            writer.start_file(entry.name.clone(), options)?;
            writer.write_all(&entry.data)?;
        }
        writer.finish()
    }
    /// `verify` runs on the finished temp file; an error there leaves `dest` untouched.
    pub fn save_atomic<V>(
        &self,
        dest: &Path,
        options: SaveOptions,
        verify: V,
    ) -> Result<(), PersistError>
    where
        V: FnOnce(&Path) -> Result<(), String>,
    {
        let existing = match fs::metadata(dest) {
            Ok(meta) => Some(meta),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(PersistError::from_io(dest, "stat destination", e)),
        };
        if let Some(meta) = &existing
            && meta.permissions().readonly()
        {
            return Err(PersistError::PermissionDenied {
                path: dest.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "file is read-only"),
            });
        }
        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| PersistError::from_io(dest, "create temp file", e))?;
        debug!("writing workbook to temp file {}", temp.path().display());
        self.write_to(temp.as_file_mut())
            .map_err(|e| PersistError::Other {
                path: dest.to_path_buf(),
                reason: format!("write xlsx archive ({e})"),
            })?;
        temp.as_file()
            .sync_all()
            .map_err(|e| PersistError::from_io(dest, "flush temp file", e))?;
        if options.verify {
            verify(temp.path()).map_err(|reason| PersistError::Other {
                path: dest.to_path_buf(),
                reason: format!("saved file failed verification: {reason}"),
            })?;
        }
        if let Some(meta) = &existing {
            fs::set_permissions(temp.path(), meta.permissions())
                .map_err(|e| PersistError::from_io(dest, "copy file permissions", e))?;
        }
        temp.persist(dest)
            .map_err(|e| PersistError::from_io(dest, "replace original file", e.error))?;
        sync_after_rename(dest, parent, options.durability_strict)
    }
}
fn sync_after_rename(dest: &Path, parent: &Path, strict: bool) -> Result<(), PersistError> {
    if let Err(e) = fs::File::open(dest).and_then(|file| file.sync_all()) {
        if strict {
            return Err(PersistError::from_io(dest, "fsync saved file", e));
        }
        warn!("fsync of saved file failed: {} ({e})", dest.display());
    }
    #[cfg(not(windows))]
    {
        if let Err(e) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            if strict {
                return Err(PersistError::from_io(dest, "fsync parent directory", e));
            }
            warn!("fsync of parent directory failed: {} ({e})", parent.display());
        }
    }
    #[cfg(windows)]
    {
        debug!("skipping directory fsync for {}", parent.display());
    }
    Ok(())
}
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    fn sample_package() -> XlsxPackage {
        let mut package = XlsxPackage::default();
        package.write_text("[Content_Types].xml", "<Types/>".to_owned());
        package.write_text("xl/workbook.xml", "<workbook/>".to_owned());
        package
    }
    #[test]
    fn legacy_xls_signature_is_rejected() {
        let mut bytes = CFB_SIGNATURE.to_vec();
        bytes.resize(512, 0);
        assert!(
            matches!(XlsxPackage::from_bytes(bytes), Err(LoadError::LegacyXls)),
            "OLE compound file header"
        );
    }
    #[test]
    fn garbage_is_a_zip_error() {
        assert!(
            matches!(
                XlsxPackage::from_bytes(b"not a zip".to_vec()),
                Err(LoadError::Zip(_))
            ),
            "no central directory"
        );
    }
    #[test]
    fn package_survives_a_write_and_reopen() {
        let package = sample_package();
        let bytes = package.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let reopened = XlsxPackage::from_bytes(bytes).unwrap();
        assert_eq!(
            reopened.part_names().collect::<Vec<_>>(),
            vec!["[Content_Types].xml", "xl/workbook.xml"],
            "archive order is kept"
        );
        assert_eq!(
            reopened.read_text("xl/workbook.xml").unwrap(),
            "<workbook/>",
            "part bytes are kept"
        );
        assert!(
            matches!(
                reopened.read_text("xl/missing.xml"),
                Err(LoadError::MissingPart(_))
            ),
            "absent part"
        );
    }
    #[test]
    fn removed_parts_are_not_written() {
        let mut package = sample_package();
        assert!(package.remove_part("xl/workbook.xml"), "part existed");
        assert!(!package.remove_part("xl/workbook.xml"), "already removed");
        let bytes = package.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let reopened = XlsxPackage::from_bytes(bytes).unwrap();
        assert_eq!(
            reopened.part_names().collect::<Vec<_>>(),
            vec!["[Content_Types].xml"],
            "only the remaining part is archived"
        );
    }
    #[test]
    fn failed_verification_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("book.xlsx");
        fs::write(&dest, b"original").unwrap();
        let options = SaveOptions {
            verify: true,
            durability_strict: false,
        };
        let result = sample_package().save_atomic(&dest, options, |_| Err("boom".to_owned()));
        assert!(matches!(result, Err(PersistError::Other { .. })), "{result:?}");
        assert_eq!(fs::read(&dest).unwrap(), b"original", "destination unchanged");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "temp file cleaned up");
    }
    #[test]
    fn read_only_destination_is_permission_denied() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("book.xlsx");
        fs::write(&dest, b"original").unwrap();
        let mut perms = fs::metadata(&dest).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&dest, perms).unwrap();
        let options = SaveOptions {
            verify: false,
            durability_strict: false,
        };
        let result = sample_package().save_atomic(&dest, options, |_| Ok(()));
        assert!(
            matches!(result, Err(PersistError::PermissionDenied { .. })),
            "{result:?}"
        );
        assert_eq!(fs::read(&dest).unwrap(), b"original", "destination unchanged");
    }
}
