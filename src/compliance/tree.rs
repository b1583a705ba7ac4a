use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core::ZatcaError;

/// Nesting limit for parsed documents.
const MAX_DEPTH: usize = 256;

/// One element of a parsed document, keyed by its qualified name
/// (`cbc:ID`, `cac:Party`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a `/`-separated path of child names, taking the first match
    /// at each step.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .try_fold(self, |el, step| el.child(step))
    }

    /// Trimmed text of the element at `path`.
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.find(path).map(|el| el.text.trim())
    }

    /// Trimmed, non-empty text of the element at `path`.
    pub fn non_empty_text(&self, path: &str) -> Option<&str> {
        self.text_at(path).filter(|t| !t.is_empty())
    }

    /// All descendants with the given name, in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        let mut pending: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(el) = pending.pop() {
            if el.name == name {
                found.push(el);
            }
            pending.extend(el.children.iter().rev());
        }
        found
    }
}

fn open_element(e: &BytesStart<'_>) -> Result<XmlElement, ZatcaError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| ZatcaError::Xml(format!("element name is not UTF-8: {err}")))?
        .to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ZatcaError::Xml(format!("bad attribute on <{name}>: {err}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| ZatcaError::Xml(format!("attribute name is not UTF-8: {err}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| ZatcaError::Xml(format!("bad attribute value on <{name}>: {err}")))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn close_element(
    el: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), ZatcaError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None if root.is_none() => *root = Some(el),
        None => {
            return Err(ZatcaError::Xml(format!(
                "document has more than one root element (<{}>)",
                el.name
            )));
        }
    }
    Ok(())
}

/// Parse a document into an element tree.
pub fn parse_xml(xml: &str) -> Result<XmlElement, ZatcaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let el = open_element(e)?;
                if stack.is_empty() && root.is_some() {
                    return Err(ZatcaError::Xml(format!(
                        "document has more than one root element (<{}>)",
                        el.name
                    )));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(ZatcaError::Xml(format!(
                        "elements nested deeper than {MAX_DEPTH} levels"
                    )));
                }
                stack.push(el);
            }
            Ok(Event::Empty(ref e)) => {
                let el = open_element(e)?;
                close_element(el, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| ZatcaError::Xml("unexpected closing tag".into()))?;
                close_element(el, &mut stack, &mut root)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ZatcaError::Xml(format!("bad text content: {err}")))?;
                match stack.last_mut() {
                    Some(el) => el.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(ZatcaError::Xml("text outside the root element".into()));
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(el) = stack.last_mut() {
                    el.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ZatcaError::Xml(format!(
                    "XML parse error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ZatcaError::Xml(format!(
            "unexpected end of document: <{}> is not closed",
            open.name
        )));
    }
    root.ok_or_else(|| ZatcaError::Xml("document has no root element".into()))
}
