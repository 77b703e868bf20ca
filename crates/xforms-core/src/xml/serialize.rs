//! Serialización determinista de `XmlDocument` con el writer de quick-xml.
//!
//! Sin declaración XML ni indentación; elementos sin hijos se emiten como
//! `<x/>`. Namespaces primero (en orden de declaración), luego atributos.

use std::io::Write;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::document::{NodeId, NodeKind, XmlDocument};

impl XmlDocument {
    /// Escribe el documento completo en `sink`.
    pub fn write_to<W: Write>(&self, sink: W) -> Result<(), String> {
        let mut writer = Writer::new(sink);
        for c in self.children(self.root()) {
            write_node(self, *c, &mut writer)?;
        }
        Ok(())
    }

    /// Escribe sólo el subárbol de `id`.
    pub fn write_node_to<W: Write>(&self, id: NodeId, sink: W) -> Result<(), String> {
        let mut writer = Writer::new(sink);
        write_node(self, id, &mut writer)
    }

    pub fn to_xml_string(&self) -> Result<String, String> {
        let mut buf: Vec<u8> = Vec::new();
        self.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}

enum Step {
    Open(NodeId),
    Close(NodeId),
}

fn write_node<W: Write>(doc: &XmlDocument, id: NodeId, writer: &mut Writer<W>) -> Result<(), String> {
    let mut stack = vec![Step::Open(id)];
    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Open(id) => id,
            Step::Close(id) => {
                let name = doc.name(id).unwrap_or_default();
                writer.write_event(Event::End(BytesEnd::new(name))).map_err(|e| e.to_string())?;
                continue;
            }
        };
        match doc.kind(id) {
            NodeKind::Document => {
                stack.extend(doc.children(id).iter().rev().map(|c| Step::Open(*c)));
            }
            NodeKind::Element { name, namespaces } => {
                let mut start = BytesStart::new(name.as_str());
                for (prefix, uri) in namespaces {
                    let key = if prefix.is_empty() { "xmlns".to_string() } else { format!("xmlns:{prefix}") };
                    start.push_attribute((key.as_str(), uri.as_str()));
                }
                for a in doc.attributes(id) {
                    if let NodeKind::Attribute { name, value } = doc.kind(*a) {
                        start.push_attribute((name.as_str(), value.as_str()));
                    }
                }
                let children = doc.children(id);
                if children.is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(|e| e.to_string())?;
                } else {
                    writer.write_event(Event::Start(start)).map_err(|e| e.to_string())?;
                    stack.push(Step::Close(id));
                    stack.extend(children.iter().rev().map(|c| Step::Open(*c)));
                }
            }
            NodeKind::Text(t) => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(t.as_str()))))
                      .map_err(|e| e.to_string())?;
            }
            NodeKind::Comment(c) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                      .map_err(|e| e.to_string())?;
            }
            // Un atributo suelto se serializa como su valor.
            NodeKind::Attribute { value, .. } => {
                writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(value.as_str()))))
                      .map_err(|e| e.to_string())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_elements_are_self_closed() {
        let doc = XmlDocument::parse("<form><x>hello</x><y></y></form>").unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), "<form><x>hello</x><y/></form>");
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut doc = XmlDocument::with_root("form");
        let form = doc.document_element().unwrap();
        doc.set_attribute(form, "q", "a\"b<");
        doc.append_text(form, "1 < 2 & 3");
        let xml = doc.to_xml_string().unwrap();
        assert_eq!(xml, r#"<form q="a&quot;b&lt;">1 &lt; 2 &amp; 3</form>"#);
    }

    #[test]
    fn parse_serialize_is_stable() {
        let src = r#"<f:form xmlns:f="urn:f" a="1"><f:x>v</f:x><!--c--></f:form>"#;
        let doc = XmlDocument::parse(src).unwrap();
        assert_eq!(doc.to_xml_string().unwrap(), src);
    }
}
