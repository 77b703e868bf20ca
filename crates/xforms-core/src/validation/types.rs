//! Comprobación léxica de los tipos de schema soportados.

use chrono::NaiveDate;

use crate::xml::split_qname;

/// `Err` con el motivo si `value` no es un literal válido de `type_name`.
/// Tipos desconocidos se aceptan sin comprobar.
pub fn check_type(type_name: &str, value: &str) -> Result<(), String> {
    let local = split_qname(type_name).1;
    let v = value.trim();
    let ok = match local {
        "string" | "normalizedString" | "token" => true,
        "anyURI" => !v.chars().any(char::is_whitespace),
        "integer" => is_integer(v),
        "int" => is_integer(v) && v.parse::<i32>().is_ok(),
        "decimal" => is_decimal(v),
        "double" | "float" => matches!(v, "INF" | "-INF" | "NaN") || (is_decimal_or_exponent(v) && v.parse::<f64>().is_ok()),
        "boolean" => matches!(v, "true" | "false" | "1" | "0"),
        "date" => NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(format!("'{value}' is not a valid {type_name}"))
    }
}

fn unsigned(v: &str) -> &str {
    v.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(v)
}

fn is_integer(v: &str) -> bool {
    let digits = unsigned(v);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal(v: &str) -> bool {
    let body = unsigned(v);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    !(int.is_empty() && frac.is_empty())
    && int.chars().all(|c| c.is_ascii_digit())
    && frac.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal_or_exponent(v: &str) -> bool {
    match v.split_once(|c: char| c == 'e' || c == 'E') {
        Some((mantissa, exp)) => is_decimal(mantissa) && is_integer(exp),
        None => is_decimal(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_types() {
        assert!(check_type("xs:integer", "-42").is_ok());
        assert!(check_type("xs:integer", "4.2").is_err());
        assert!(check_type("xs:int", "99999999999").is_err());
        assert!(check_type("xs:decimal", ".5").is_ok());
        assert!(check_type("xs:decimal", ".").is_err());
        assert!(check_type("xs:double", "1.5e3").is_ok());
        assert!(check_type("xs:double", "INF").is_ok());
        assert!(check_type("xs:double", "abc").is_err());
    }

    #[test]
    fn other_types() {
        assert!(check_type("xs:boolean", "true").is_ok());
        assert!(check_type("xs:boolean", "yes").is_err());
        assert!(check_type("xs:date", "2024-02-29").is_ok());
        assert!(check_type("xs:date", "2023-02-29").is_err());
        assert!(check_type("xs:anyURI", "http://x/y").is_ok());
        assert!(check_type("xs:string", "anything").is_ok());
        assert!(check_type("my:custom", "anything").is_ok());
        assert_eq!(check_type("xs:integer", "x").unwrap_err(), "'x' is not a valid xs:integer");
    }
}
