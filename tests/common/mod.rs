use std::{
    fs::{self, File},
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
    process::{Command, Output},
};
use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};
const WORKSHEET_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const SHARED_STRINGS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const CALC_CHAIN_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";
pub fn xlreplace(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xlreplace"))
        .args(args)
        .env_remove("XLREPLACE_LOG")
        .env_remove("XLREPLACE_DURABILITY_STRICT")
        .output()
        .expect("run xlreplace")
}
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
/// Sheet XML with the given `(ref, inner cell xml)` pairs, one row per
/// distinct row number. Pairs must be ordered by row.
pub fn sheet_xml(cells: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let mut open_row: Option<String> = None;
    for (reference, cell) in cells {
        let row: String = reference.chars().filter(char::is_ascii_digit).collect();
        if open_row.as_deref() != Some(row.as_str()) {
            if open_row.is_some() {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{row}">"#));
            open_row = Some(row);
        }
        xml.push_str(cell);
    }
    if open_row.is_some() {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}
pub fn inline(reference: &str, text: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)
}
pub fn shared(reference: &str, index: usize) -> String {
    format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
}
pub fn write_workbook(
    path: &Path,
    sheets: &[(&str, String)],
    shared_strings: &[&str],
) -> PathBuf {
    write_workbook_parts(path, sheets, shared_strings, None)
}
/// Writes a minimal but well-formed workbook, with `xl/calcChain.xml` when
/// `calc_chain` is given.
pub fn write_workbook_parts(
    path: &Path,
    sheets: &[(&str, String)],
    shared_strings: &[&str],
    calc_chain: Option<&str>,
) -> PathBuf {
    let file = File::create(path).expect("create workbook");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
        workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{WORKSHEET_REL}" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    if !shared_strings.is_empty() {
        content_types.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{SHARED_STRINGS_REL}" Target="sharedStrings.xml"/>"#,
            sheets.len() + 1
        ));
    }
    if calc_chain.is_some() {
        content_types.push_str(r#"<Override PartName="/xl/calcChain.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.calcChain+xml"/>"#);
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{CALC_CHAIN_REL}" Target="calcChain.xml"/>"#,
            sheets.len() + 2
        ));
    }
    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");
    let mut put = |name: &str, body: &str| {
        zip.start_file(name, options).expect("start entry");
        zip.write_all(body.as_bytes()).expect("write entry");
    };
    put("[Content_Types].xml", &content_types);
    put(
        "_rels/.rels",
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
    );
    put("xl/workbook.xml", &workbook);
    put("xl/_rels/workbook.xml.rels", &rels);
    for (i, (_, xml)) in sheets.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), xml);
    }
    if !shared_strings.is_empty() {
        let mut sst = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
            shared_strings.len()
        );
        for s in shared_strings {
            sst.push_str(&format!("<si><t>{s}</t></si>"));
        }
        sst.push_str("</sst>");
        put("xl/sharedStrings.xml", &sst);
    }
    if let Some(chain) = calc_chain {
        put("xl/calcChain.xml", chain);
    }
    zip.finish().expect("finish workbook");
    path.to_path_buf()
}
pub fn part_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).expect("open workbook")).expect("zip");
    archive.file_names().map(str::to_owned).collect()
}
pub fn read_part(path: &Path, part: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).expect("open workbook")).expect("zip");
    let mut entry = archive.by_name(part).expect("part present");
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).expect("read part");
    buf
}
pub fn read_part_text(path: &Path, part: &str) -> String {
    String::from_utf8(read_part(path, part)).expect("utf-8 part")
}
pub fn set_readonly(path: &Path, readonly: bool) {
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_readonly(readonly);
    fs::set_permissions(path, perms).expect("set permissions");
}
