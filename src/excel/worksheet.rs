use super::xml::{
    Attrs, attrs_of, attrs_to_xml, escape_text, get_attr, offset, prefix_of, prefixed,
    reader, remove_attr, set_attr, span_text,
};
use crate::error::SubstitutionError;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    head: String,
    tail: String,
    ns_prefix: Option<String>,
    rows: BTreeMap<u32, Row>,
    modified: bool,
    formulas_dropped: bool,
}
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub attrs: Attrs,
    pub cells: BTreeMap<u32, Cell>,
}
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub attrs: Attrs,
    pub inner_xml: Option<String>,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Text(String),
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaRole {
    Plain,
    SharedAnchor,
}
#[derive(Debug, Default)]
struct CellParts {
    formula: Option<FormulaRole>,
    value: Option<String>,
    inline_text: Option<String>,
}
#[derive(Debug, Clone, Copy)]
enum TextTarget {
    Value,
    Inline,
}
impl Cell {
    pub fn value(&self, shared_strings: &[String]) -> Result<CellValue, SubstitutionError> {
        let Some(inner) = self.inner_xml.as_deref() else {
            return Ok(CellValue::Empty);
        };
        let parts =
            scan_cell(inner).map_err(|e| SubstitutionError::MalformedCell(e.to_string()))?;
        let raw = parts.value.unwrap_or_default();
        let text = match get_attr(&self.attrs, "t") {
            Some("inlineStr") => parts.inline_text.unwrap_or_default(),
            Some("e") => String::new(),
            Some("s") => shared_string(&raw, shared_strings)?,
            Some("b") => (if raw.trim() == "1" { "True" } else { "False" }).to_owned(),
            Some(_) | None => raw,
        };
        Ok(if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text)
        })
    }
    pub fn formula_role(&self) -> Option<FormulaRole> {
        let inner = self.inner_xml.as_deref()?;
        scan_cell(inner).ok()?.formula
    }
}
fn scan_cell(inner: &str) -> Result<CellParts, quick_xml::Error> {
    let mut reader = reader(inner);
    let mut parts = CellParts::default();
    let mut target = None;
    let mut phonetic_depth = 0_usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"f" => parts.formula = Some(formula_kind(&e)?),
                b"rPh" => phonetic_depth += 1,
                b"v" => {
                    parts.value.get_or_insert_with(String::new);
                    target = Some(TextTarget::Value);
                }
                b"t" if phonetic_depth == 0 => {
                    parts.inline_text.get_or_insert_with(String::new);
                    target = Some(TextTarget::Inline);
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"f" => parts.formula = Some(formula_kind(&e)?),
                b"v" => {
                    parts.value.get_or_insert_with(String::new);
                }
                b"t" if phonetic_depth == 0 => {
                    parts.inline_text.get_or_insert_with(String::new);
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"v" | b"t" => target = None,
                _ => {}
            },
            Event::Text(text) => parts.push(target, &text.unescape()?),
            Event::CData(data) => parts.push(target, &String::from_utf8_lossy(&data)),
            Event::Eof => return Ok(parts),
            _ => {}
        }
    }
}
impl CellParts {
    fn push(&mut self, target: Option<TextTarget>, text: &str) {
        let slot = match target {
            Some(TextTarget::Value) => &mut self.value,
            Some(TextTarget::Inline) => &mut self.inline_text,
            None => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }
}
fn formula_kind(start: &BytesStart<'_>) -> Result<FormulaRole, quick_xml::Error> {
    let attrs = attrs_of(start)?;
    let shared = get_attr(&attrs, "t") == Some("shared") && get_attr(&attrs, "ref").is_some();
    Ok(if shared {
        FormulaRole::SharedAnchor
    } else {
        FormulaRole::Plain
    })
}
fn shared_string(raw: &str, shared_strings: &[String]) -> Result<String, SubstitutionError> {
    let index = raw
        .trim()
        .parse::<usize>()
        .map_err(|_parse| SubstitutionError::BadSharedStringIndex(raw.to_owned()))?;
    shared_strings
        .get(index)
        .cloned()
        .ok_or(SubstitutionError::SharedStringOutOfRange {
            index,
            len: shared_strings.len(),
        })
}
impl Worksheet {
    pub fn parse(xml: &str) -> Result<Self, String> {
        let mut reader = reader(xml);
        loop {
            let before = offset(reader.buffer_position());
            let event = reader.read_event().map_err(|err| err.to_string())?;
            match event {
                Event::Start(e) if e.local_name().as_ref() == b"sheetData" => {
                    let body = reader.read_to_end(e.name()).map_err(|err| err.to_string())?;
                    let body_start = offset(body.start);
                    let body_end = offset(body.end);
                    let ns_prefix = prefix_of(e.name());
                    return Ok(Self {
                        head: xml.get(..body_start).unwrap_or_default().to_owned(),
                        tail: xml.get(body_end..).unwrap_or_default().to_owned(),
                        rows: parse_rows(span_text(xml, body)).map_err(|err| err.to_string())?,
                        ns_prefix,
                        modified: false,
                        formulas_dropped: false,
                    });
                }
                Event::Empty(e) if e.local_name().as_ref() == b"sheetData" => {
                    let after = offset(reader.buffer_position());
                    let tag = String::from_utf8_lossy(&e).into_owned();
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Ok(Self {
                        head: format!("{}<{tag}>", xml.get(..before).unwrap_or_default()),
                        tail: format!("</{name}>{}", xml.get(after..).unwrap_or_default()),
                        ns_prefix: prefix_of(e.name()),
                        ..Self::default()
                    });
                }
                Event::Eof => return Err("worksheet has no <sheetData>".to_owned()),
                _ => {}
            }
        }
    }
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len());
        out.push_str(&self.head);
        for row in self.rows.values() {
            out.push_str(&row_to_xml(row, self.ns_prefix.as_deref()));
        }
        out.push_str(&self.tail);
        out
    }
    pub fn dimensions(&self) -> (u32, u32) {
        let mut max_row = 0;
        let mut max_col = 0;
        for (row_num, row) in &self.rows {
            for (col, cell) in &row.cells {
                if cell.inner_xml.as_deref().is_some_and(|inner| !inner.is_empty()) {
                    max_row = max_row.max(*row_num);
                    max_col = max_col.max(*col);
                }
            }
        }
        (max_row, max_col)
    }
    pub fn cell(&self, col: u32, row: u32) -> Option<&Cell> {
        self.rows.get(&row)?.cells.get(&col)
    }
    pub fn set_string_at(&mut self, col: u32, row: u32, value: &str) -> bool {
        let ns = self.ns_prefix.as_deref();
        let Some(cell) = self
            .rows
            .get_mut(&row)
            .and_then(|r| r.cells.get_mut(&col))
        else {
            return false;
        };
        if cell.formula_role().is_some() {
            self.formulas_dropped = true;
        }
        set_attr(&mut cell.attrs, "t", "inlineStr".to_owned());
        remove_attr(&mut cell.attrs, "cm");
        remove_attr(&mut cell.attrs, "vm");
        let (is_tag, t_tag) = (prefixed(ns, "is"), prefixed(ns, "t"));
        let space = if needs_xml_space_preserve(value) {
            " xml:space=\"preserve\""
        } else {
            ""
        };
        cell.inner_xml = Some(format!(
            "<{is_tag}><{t_tag}{space}>{}</{t_tag}></{is_tag}>",
            escape_text(value)
        ));
        self.modified = true;
        true
    }
    pub const fn is_modified(&self) -> bool {
        self.modified
    }
    pub const fn formulas_dropped(&self) -> bool {
        self.formulas_dropped
    }
}
pub fn col_to_name(col: u32) -> String {
    let mut rev = Vec::new();
    let mut rest = col;
    while rest > 0 {
        let rem = (rest - 1) % 26;
        rev.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        rest = (rest - 1) / 26;
    }
    rev.iter().rev().collect()
}
pub fn name_to_col(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    let mut col = 0_u32;
    for ch in name.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(ch.to_ascii_uppercase()) - u32::from('A') + 1;
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    Some(col)
}
pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{row}", col_to_name(col))
}
fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let trimmed = reference.replace('$', "");
    let split = trimmed.find(|ch: char| ch.is_ascii_digit())?;
    let (col_s, row_s) = trimmed.split_at(split);
    Some((name_to_col(col_s)?, row_s.parse::<u32>().ok()?))
}
fn parse_rows(body: &str) -> Result<BTreeMap<u32, Row>, quick_xml::Error> {
    let mut reader = reader(body);
    let mut rows = BTreeMap::new();
    let mut open_row: Option<(u32, Row)> = None;
    let mut next_col = 1_u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"row" => {
                open_row = Some(start_row(&e, &rows)?);
                next_col = 1;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let (row_num, row) = start_row(&e, &rows)?;
                rows.insert(row_num, row);
            }
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                if let Some((row_num, row)) = open_row.take() {
                    rows.insert(row_num, row);
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"c" => {
                let span = reader.read_to_end(e.name())?;
                if let Some((row_num, row)) = open_row.as_mut() {
                    let (col, attrs) = cell_attrs(&e, *row_num, next_col)?;
                    next_col = col.saturating_add(1);
                    let inner_xml = Some(span_text(body, span).to_owned());
                    row.cells.insert(col, Cell { attrs, inner_xml });
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                if let Some((row_num, row)) = open_row.as_mut() {
                    let (col, attrs) = cell_attrs(&e, *row_num, next_col)?;
                    next_col = col.saturating_add(1);
                    row.cells.insert(
                        col,
                        Cell {
                            attrs,
                            inner_xml: None,
                        },
                    );
                }
            }
            Event::Eof => return Ok(rows),
            _ => {}
        }
    }
}
fn start_row(
    start: &BytesStart<'_>,
    rows: &BTreeMap<u32, Row>,
) -> Result<(u32, Row), quick_xml::Error> {
    let mut attrs = attrs_of(start)?;
    let row_num = get_attr(&attrs, "r")
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or_else(|| rows.keys().next_back().copied().unwrap_or(0) + 1);
    set_attr(&mut attrs, "r", row_num.to_string());
    Ok((
        row_num,
        Row {
            attrs,
            cells: BTreeMap::new(),
        },
    ))
}
fn cell_attrs(
    start: &BytesStart<'_>,
    row_num: u32,
    next_col: u32,
) -> Result<(u32, Attrs), quick_xml::Error> {
    let mut attrs = attrs_of(start)?;
    let col = get_attr(&attrs, "r")
        .and_then(|v| parse_cell_ref(v).map(|(c, _)| c))
        .unwrap_or(next_col);
    set_attr(&mut attrs, "r", cell_ref(col, row_num));
    Ok((col, attrs))
}
fn row_to_xml(row: &Row, ns: Option<&str>) -> String {
    let row_tag = prefixed(ns, "row");
    let cell_tag = prefixed(ns, "c");
    let mut out = format!("<{row_tag}{}", attrs_to_xml(&sorted_attrs(&row.attrs)));
    if row.cells.is_empty() {
        out.push_str("/>");
        return out;
    }
    out.push('>');
    for cell in row.cells.values() {
        out.push('<');
        out.push_str(&cell_tag);
        out.push_str(&attrs_to_xml(&sorted_attrs(&cell.attrs)));
        if let Some(inner) = cell.inner_xml.as_deref() {
            out.push('>');
            out.push_str(inner);
            out.push_str("</");
            out.push_str(&cell_tag);
            out.push('>');
        } else {
            out.push_str("/>");
        }
    }
    out.push_str("</");
    out.push_str(&row_tag);
    out.push('>');
    out
}
fn sorted_attrs(attrs: &[(String, String)]) -> Attrs {
    let mut sorted = attrs.to_vec();
    sorted.sort_by_key(|attr| match attr.0.as_str() {
        "r" => 0_u8,
        "s" => 1,
        "t" => 2,
        _ => 3,
    });
    sorted
}
fn needs_xml_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains("  ")
}
