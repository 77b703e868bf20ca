//! Valores XPath 1.0 y sus conversiones.

use crate::xml::{NodeId, XmlDocument};

#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue {
    Nodes(Vec<NodeId>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl XPathValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::Nodes(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            XPathValue::Nodes(n) => !n.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    pub fn to_number(&self, doc: &XmlDocument) -> f64 {
        match self {
            XPathValue::Nodes(_) => parse_xpath_number(&self.to_string_value(doc)),
            XPathValue::String(s) => parse_xpath_number(s),
            XPathValue::Number(n) => *n,
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Valor de cadena; un node-set vale lo que su primer nodo en orden de
    /// documento.
    pub fn to_string_value(&self, doc: &XmlDocument) -> String {
        match self {
            XPathValue::Nodes(n) => n.first().map(|id| doc.string_value(*id)).unwrap_or_default(),
            XPathValue::String(s) => s.clone(),
            XPathValue::Number(n) => format_number(*n),
            XPathValue::Boolean(b) => b.to_string(),
        }
    }
}

/// `number()` de XPath 1.0: dígitos con punto opcional y signo menos; sin
/// exponentes ni `Infinity`.
pub fn parse_xpath_number(s: &str) -> f64 {
    let t = s.trim();
    let body = t.strip_prefix('-').unwrap_or(t);
    let valid = !body.is_empty()
                && body.chars().all(|c| c.is_ascii_digit() || c == '.')
                && body.chars().filter(|c| *c == '.').count() <= 1
                && body != ".";
    if !valid {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == n.trunc() && n.abs() < 1e15 {
        // -0 se imprime como 0.
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_parsing_follows_xpath() {
        assert_eq!(parse_xpath_number(" 42 "), 42.0);
        assert_eq!(parse_xpath_number("-1.5"), -1.5);
        assert!(parse_xpath_number("1e3").is_nan());
        assert!(parse_xpath_number("inf").is_nan());
        assert!(parse_xpath_number("").is_nan());
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }
}
