use quick_xml::{
    Reader, Writer,
    escape::{escape, partial_escape},
    events::{BytesStart, Event},
    name::QName,
};
use std::ops::Range;
pub(super) type Attrs = Vec<(String, String)>;
pub(super) fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader
}
pub(super) fn offset(position: u64) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}
pub(super) fn span_text(xml: &str, span: Range<u64>) -> &str {
    xml.get(offset(span.start)..offset(span.end))
        .unwrap_or_default()
}
pub(super) fn prefix_of(name: QName<'_>) -> Option<String> {
    name.prefix()
        .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned())
}
pub(super) fn prefixed(prefix: Option<&str>, local: &str) -> String {
    prefix.map_or_else(|| local.to_owned(), |p| format!("{p}:{local}"))
}
pub(super) fn attrs_of(start: &BytesStart<'_>) -> Result<Attrs, quick_xml::Error> {
    let mut attrs = Attrs::new();
    for item in start.attributes() {
        let attr = item?;
        attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            attr.unescape_value()?.into_owned(),
        ));
    }
    Ok(attrs)
}
pub(super) fn get_attr<'attrs>(attrs: &'attrs [(String, String)], name: &str) -> Option<&'attrs str> {
    attrs
        .iter()
        .find(|attr| attr.0 == name)
        .map(|attr| attr.1.as_str())
}
pub(super) fn set_attr(attrs: &mut Attrs, name: &str, value: String) {
    if let Some(attr) = attrs.iter_mut().find(|attr| attr.0 == name) {
        attr.1 = value;
        return;
    }
    attrs.push((name.to_owned(), value));
}
pub(super) fn remove_attr(attrs: &mut Attrs, name: &str) {
    attrs.retain(|attr| attr.0 != name);
}
pub(super) fn attrs_to_xml(attrs: &[(String, String)]) -> String {
    let mut out = String::new();
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.0);
        out.push_str("=\"");
        out.push_str(&escape(attr.1.as_str()));
        out.push('"');
    }
    out
}
pub(super) fn escape_text(text: &str) -> String {
    partial_escape(text).into_owned()
}
/// Text of every `local` element in `xml`, joined, ignoring anything nested
/// in a `skip` element. `None` when no `local` element occurs.
pub(super) fn element_text(
    xml: &str,
    local: &[u8],
    skip: &[u8],
) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = reader(xml);
    let mut found: Option<String> = None;
    let mut inside = 0_usize;
    let mut skipped = 0_usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                name if name == skip => skipped += 1,
                name if name == local && skipped == 0 => {
                    inside += 1;
                    found.get_or_insert_with(String::new);
                }
                _ => {}
            },
            Event::Empty(e) => {
                if skipped == 0 && e.local_name().as_ref() == local {
                    found.get_or_insert_with(String::new);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                name if name == skip => skipped = skipped.saturating_sub(1),
                name if name == local && skipped == 0 => inside = inside.saturating_sub(1),
                _ => {}
            },
            Event::Text(text) => {
                if inside > 0 && skipped == 0 {
                    found.get_or_insert_with(String::new).push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if inside > 0 && skipped == 0 {
                    found
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => return Ok(found),
            _ => {}
        }
    }
}
/// Copies `xml` event by event, leaving out each `local` element whose
/// attributes satisfy `drop`.
pub(super) fn remove_elements<F>(xml: &str, local: &[u8], drop: F) -> Result<String, quick_xml::Error>
where
    F: Fn(&Attrs) -> bool,
{
    let mut reader = reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut skip_depth = 0_usize;
    loop {
        let event = reader.read_event()?;
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }
        let dropped = match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                e.local_name().as_ref() == local && drop(&attrs_of(e)?)
            }
            _ => false,
        };
        if dropped {
            if matches!(event, Event::Start(_)) {
                skip_depth = 1;
            }
            continue;
        }
        if matches!(event, Event::Eof) {
            break;
        }
        writer.write_event(event)?;
    }
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
