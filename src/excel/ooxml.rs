use super::{
    container::XlsxPackage,
    xml::{attrs_of, element_text, get_attr, reader, remove_elements, span_text},
};
use crate::error::LoadError;
use log::debug;
use quick_xml::events::Event;
use std::collections::HashMap;
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
pub const CALC_CHAIN_PART: &str = "xl/calcChain.xml";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub name: String,
    pub part: String,
}
/// Worksheets in workbook order. Chartsheets and dialog sheets are not listed.
pub fn load_sheet_catalog(package: &XlsxPackage) -> Result<Vec<SheetRef>, LoadError> {
    let workbook_xml = package.read_text(WORKBOOK_PART)?;
    let rels_xml = package.read_text(WORKBOOK_RELS_PART)?;
    let rid_to_target =
        parse_worksheet_relationships(&rels_xml).map_err(|e| malformed(WORKBOOK_RELS_PART, &e))?;
    let mut sheets = Vec::new();
    let mut reader = reader(&workbook_xml);
    loop {
        match reader.read_event().map_err(|e| malformed(WORKBOOK_PART, &e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let attrs = attrs_of(&e).map_err(|err| malformed(WORKBOOK_PART, &err))?;
                let rid = attrs
                    .iter()
                    .find(|attr| attr.0.ends_with(":id"))
                    .map(|attr| attr.1.as_str());
                let (Some(name), Some(rid)) = (get_attr(&attrs, "name"), rid) else {
                    continue;
                };
                let Some(target) = rid_to_target.get(rid) else {
                    continue;
                };
                sheets.push(SheetRef {
                    name: name.to_owned(),
                    part: resolve_ooxml_target(WORKBOOK_PART, target),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if sheets.is_empty() {
        return Err(LoadError::NoSheets);
    }
    Ok(sheets)
}
pub fn load_shared_strings(package: &XlsxPackage) -> Result<Vec<String>, LoadError> {
    if !package.contains(SHARED_STRINGS_PART) {
        return Ok(vec![]);
    }
    let xml = package.read_text(SHARED_STRINGS_PART)?;
    parse_shared_strings_xml(&xml).map_err(|e| malformed(SHARED_STRINGS_PART, &e))
}
/// Removes the calculation chain together with its relationship and content
/// type override. Returns whether the package had one.
pub fn drop_calc_chain(package: &mut XlsxPackage) -> Result<bool, LoadError> {
    if !package.remove_part(CALC_CHAIN_PART) {
        return Ok(false);
    }
    debug!("removing {CALC_CHAIN_PART}");
    let rels = package.read_text(WORKBOOK_RELS_PART)?;
    let rels = remove_elements(&rels, b"Relationship", |attrs| {
        get_attr(attrs, "Type").is_some_and(|t| t.ends_with("/calcChain"))
    })
    .map_err(|e| malformed(WORKBOOK_RELS_PART, &e))?;
    package.write_text(WORKBOOK_RELS_PART, rels);
    if package.contains(CONTENT_TYPES_PART) {
        let types = package.read_text(CONTENT_TYPES_PART)?;
        let part_name = format!("/{CALC_CHAIN_PART}");
        let types = remove_elements(&types, b"Override", |attrs| {
            get_attr(attrs, "PartName") == Some(part_name.as_str())
        })
        .map_err(|e| malformed(CONTENT_TYPES_PART, &e))?;
        package.write_text(CONTENT_TYPES_PART, types);
    }
    Ok(true)
}
fn malformed(part: &str, e: &quick_xml::Error) -> LoadError {
    LoadError::MalformedXml {
        part: part.to_owned(),
        reason: e.to_string(),
    }
}
fn parse_worksheet_relationships(
    rels_xml: &str,
) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut map = HashMap::new();
    let mut reader = reader(rels_xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let attrs = attrs_of(&e)?;
                let is_worksheet =
                    get_attr(&attrs, "Type").is_some_and(|t| t.ends_with("/worksheet"));
                if !is_worksheet {
                    continue;
                }
                if let (Some(id), Some(target)) = (get_attr(&attrs, "Id"), get_attr(&attrs, "Target")) {
                    map.insert(id.to_owned(), target.to_owned());
                }
            }
            Event::Eof => return Ok(map),
            _ => {}
        }
    }
}
fn parse_shared_strings_xml(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut out = vec![];
    let mut reader = reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                let span = reader.read_to_end(e.name())?;
                let text = element_text(span_text(xml, span), b"t", b"rPh")?;
                out.push(text.unwrap_or_default());
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => out.push(String::new()),
            Event::Eof => return Ok(out),
            _ => {}
        }
    }
}
fn resolve_ooxml_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_owned();
    }
    let mut segments: Vec<&str> = base_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
