//! Parser de texto XML a `XmlDocument` sobre el reader de eventos de quick-xml.
//!
//! Devuelve el error como `String`; cada caller lo envuelve en
//! `XFormsError::MalformedInput` con el nombre de su input.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::document::{NodeId, XmlDocument};
use crate::constants::MAX_XML_DEPTH;

impl XmlDocument {
    pub fn parse(text: &str) -> Result<XmlDocument, String> {
        let mut reader = Reader::from_str(text);
        let mut doc = XmlDocument::empty();
        let mut stack: Vec<NodeId> = vec![doc.root()];

        loop {
            let current = *stack.last().ok_or("unbalanced end tag")?;
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    // La raíz del documento ocupa el primer slot de la pila.
                    if stack.len() > MAX_XML_DEPTH {
                        return Err(format!("elements nested deeper than {MAX_XML_DEPTH} levels"));
                    }
                    let id = open_element(&mut doc, current, &e)?;
                    stack.push(id);
                }
                Ok(Event::Empty(e)) => {
                    open_element(&mut doc, current, &e)?;
                }
                Ok(Event::End(_)) => {
                    if stack.len() < 2 {
                        return Err("unbalanced end tag".into());
                    }
                    if let Some(closed) = stack.pop() {
                        doc.strip_ignorable_whitespace(closed);
                    }
                }
                Ok(Event::Text(t)) => {
                    let s = t.unescape().map_err(|e| e.to_string())?;
                    append_text(&mut doc, current, &s)?;
                }
                Ok(Event::CData(c)) => {
                    let s = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    append_text(&mut doc, current, &s)?;
                }
                Ok(Event::Comment(c)) => {
                    let s = String::from_utf8_lossy(&c).into_owned();
                    doc.append_comment(current, &s);
                }
                Ok(Event::Eof) => break,
                // Declaración, doctype e instrucciones de proceso no forman parte
                // de la instancia.
                Ok(_) => {}
                Err(e) => return Err(format!("at byte {}: {e}", reader.buffer_position())),
            }
        }

        if stack.len() != 1 {
            return Err("unclosed element at end of input".into());
        }
        if doc.document_element().is_none() {
            return Err("document has no root element".into());
        }
        Ok(doc)
    }
}

fn open_element(doc: &mut XmlDocument, parent: NodeId, e: &BytesStart) -> Result<NodeId, String> {
    if parent == doc.root() && doc.document_element().is_some() {
        return Err("more than one root element".into());
    }
    let name = std::str::from_utf8(e.name().as_ref()).map_err(|e| e.to_string())?.to_string();
    let id = doc.append_element(parent, &name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| e.to_string())?.to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        if key == "xmlns" {
            doc.declare_namespace(id, "", &value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            doc.declare_namespace(id, prefix, &value);
        } else {
            doc.set_attribute(id, &key, &value);
        }
    }
    Ok(id)
}

fn append_text(doc: &mut XmlDocument, parent: NodeId, text: &str) -> Result<(), String> {
    if parent == doc.root() {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err("text outside of the root element".into());
    }
    doc.append_text(parent, text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::NodeKind;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = XmlDocument::parse(r#"<?xml version="1.0"?>
            <form a="1">
                <x>hello &amp; bye</x>
                <y/>
            </form>"#).expect("parse");
        let form = doc.document_element().unwrap();
        assert_eq!(doc.child_elements(form).len(), 2);
        assert_eq!(doc.attribute_value(form, "a").as_deref(), Some("1"));
        assert_eq!(doc.string_value(form), "hello & bye");
    }

    #[test]
    fn namespace_declarations_are_not_attributes() {
        let doc = XmlDocument::parse(r#"<f:form xmlns:f="urn:f" xmlns="urn:d" k="v"/>"#).unwrap();
        let form = doc.document_element().unwrap();
        assert_eq!(doc.attributes(form).len(), 1);
        match doc.kind(form) {
            NodeKind::Element { namespaces, .. } => assert_eq!(namespaces.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn keeps_whitespace_in_leaf_text() {
        let doc = XmlDocument::parse("<form><x> a </x></form>").unwrap();
        assert_eq!(doc.string_value(doc.document_element().unwrap()), " a ");
    }

    #[test]
    fn rejects_garbage() {
        assert!(XmlDocument::parse("<form><x></form>").is_err());
        assert!(XmlDocument::parse("just text").is_err());
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("<a/><b/>").is_err());
    }

    #[test]
    fn mixed_content_keeps_whitespace_between_elements() {
        let doc = XmlDocument::parse("<p>hello <b>x</b> <i>y</i></p>").unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), "<p>hello <b>x</b> <i>y</i></p>");
        let doc = XmlDocument::parse("<form>\n  <x/>\n  <y/>\n</form>").unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), "<form><x/><y/></form>");
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let nested = |n: usize| format!("{}{}", "<a>".repeat(n), "</a>".repeat(n));
        assert!(XmlDocument::parse(&nested(MAX_XML_DEPTH)).is_ok());
        let err = XmlDocument::parse(&nested(MAX_XML_DEPTH + 1)).unwrap_err();
        assert!(err.contains("nested deeper"), "{err}");
        assert!(XmlDocument::parse(&nested(5000)).is_err());
    }
}
