//! Lexer + parser descendente recursivo para el subconjunto XPath.
//!
//! Precedencia (de menor a mayor): `or`, `and`, `= !=`, `< <= > >=`, `+ -`,
//! `* div mod`, `-` unario, `|`, paths.

use super::ast::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};
use crate::constants::MAX_XPATH_COMPLEXITY;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    DoubleColon,
    Pipe,
    Plus,
    Minus,
    /// `*` como test de nombre.
    Star,
    /// `*` como operador de multiplicación.
    Multiply,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `and`, `or`, `div`, `mod` en posición de operador.
    OperatorName(String),
    Name(String),
    Variable(String),
    Literal(String),
    Number(f64),
}

impl Token {
    /// Tokens tras los cuales `*` y `and/or/div/mod` son operadores.
    fn ends_operand(&self) -> bool {
        matches!(self,
                 Token::RParen
                 | Token::RBracket
                 | Token::Dot
                 | Token::DotDot
                 | Token::Star
                 | Token::Name(_)
                 | Token::Variable(_)
                 | Token::Literal(_)
                 | Token::Number(_))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn single_char_token(c: char) -> Token {
    match c {
        '[' => Token::LBracket,
        ']' => Token::RBracket,
        '(' => Token::LParen,
        ')' => Token::RParen,
        '@' => Token::At,
        ',' => Token::Comma,
        '|' => Token::Pipe,
        '+' => Token::Plus,
        '-' => Token::Minus,
        _ => Token::Eq,
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    let read_ncname = |start: usize| -> usize {
        let mut j = start;
        while j < chars.len() && is_name_char(chars[j]) {
            j += 1;
        }
        j
    };

    while i < chars.len() {
        let c = chars[i];
        let operand_before = tokens.last().map(|t| t.ends_operand()).unwrap_or(false);
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '[' | ']' | '(' | ')' | '@' | ',' | '|' | '+' | '-' | '=' => {
                tokens.push(single_char_token(c));
                i += 1;
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    return Err(format!("unexpected '!' at {i}"));
                }
            }
            '<' | '>' => {
                let eq = chars.get(i + 1) == Some(&'=');
                tokens.push(match (c, eq) {
                                ('<', true) => Token::Le,
                                ('<', false) => Token::Lt,
                                (_, true) => Token::Ge,
                                _ => Token::Gt,
                            });
                i += if eq { 2 } else { 1 };
            }
            ':' => {
                if chars.get(i + 1) == Some(&':') {
                    tokens.push(Token::DoubleColon);
                    i += 2;
                } else {
                    return Err(format!("unexpected ':' at {i}"));
                }
            }
            '*' => {
                tokens.push(if operand_before { Token::Multiply } else { Token::Star });
                i += 1;
            }
            '.' => {
                if chars.get(i + 1) == Some(&'.') {
                    tokens.push(Token::DotDot);
                    i += 2;
                } else if chars.get(i + 1).map(|d| d.is_ascii_digit()).unwrap_or(false) {
                    let (n, next) = read_number(&chars, i)?;
                    tokens.push(Token::Number(n));
                    i = next;
                } else {
                    tokens.push(Token::Dot);
                    i += 1;
                }
            }
            '"' | '\'' => {
                let close = chars[i + 1..].iter()
                                          .position(|d| *d == c)
                                          .ok_or_else(|| format!("unterminated literal at {i}"))?;
                let lit: String = chars[i + 1..i + 1 + close].iter().collect();
                tokens.push(Token::Literal(lit));
                i += close + 2;
            }
            '$' => {
                let end = read_ncname(i + 1);
                if end == i + 1 {
                    return Err(format!("empty variable name at {i}"));
                }
                tokens.push(Token::Variable(chars[i + 1..end].iter().collect()));
                i = end;
            }
            d if d.is_ascii_digit() => {
                let (n, next) = read_number(&chars, i)?;
                tokens.push(Token::Number(n));
                i = next;
            }
            s if is_name_start(s) => {
                let mut end = read_ncname(i);
                let mut name: String = chars[i..end].iter().collect();
                // prefix:local o prefix:*
                if chars.get(end) == Some(&':') && chars.get(end + 1) != Some(&':') {
                    match chars.get(end + 1) {
                        Some('*') => {
                            name.push_str(":*");
                            end += 2;
                        }
                        Some(n) if is_name_start(*n) => {
                            let local_end = read_ncname(end + 1);
                            name.push(':');
                            name.extend(chars[end + 1..local_end].iter());
                            end = local_end;
                        }
                        _ => return Err(format!("bad qualified name at {i}")),
                    }
                }
                let is_operator = operand_before && matches!(name.as_str(), "and" | "or" | "div" | "mod");
                tokens.push(if is_operator { Token::OperatorName(name) } else { Token::Name(name) });
                i = end;
            }
            other => return Err(format!("unexpected character '{other}' at {i}")),
        }
    }
    Ok(tokens)
}

fn read_number(chars: &[char], start: usize) -> Result<(f64, usize), String> {
    let mut j = start;
    while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
        j += 1;
    }
    let text: String = chars[start..j].iter().collect();
    text.parse::<f64>().map(|n| (n, j)).map_err(|_| format!("bad number '{text}'"))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Nodos compuestos creados hasta ahora; acota la profundidad del AST.
    weight: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat(&mut self, t: &Token) -> bool {
        if self.peek() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, t: &Token) -> Result<(), String> {
        if self.eat(t) {
            Ok(())
        } else {
            Err(format!("expected {t:?}, found {:?}", self.peek()))
        }
    }

    fn eat_operator_name(&mut self, name: &str) -> bool {
        if matches!(self.peek(), Some(Token::OperatorName(n)) if n == name) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn charge(&mut self) -> Result<(), String> {
        self.weight += 1;
        if self.weight > MAX_XPATH_COMPLEXITY {
            return Err(format!("expression exceeds {MAX_XPATH_COMPLEXITY} operators"));
        }
        Ok(())
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Result<Expr, String> {
        self.charge()?;
        Ok(Expr::Binary { op,
                          left: Box::new(left),
                          right: Box::new(right) })
    }

    /// Subexpresión entre paréntesis, en un predicado o como argumento.
    fn parse_nested(&mut self) -> Result<Expr, String> {
        self.charge()?;
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.eat_operator_name("or") {
            let right = self.parse_and()?;
            left = self.binary(BinaryOp::Or, left, right)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality()?;
        while self.eat_operator_name("and") {
            let right = self.parse_equality()?;
            left = self.binary(BinaryOp::And, left, right)?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Multiply) => BinaryOp::Mul,
                Some(Token::OperatorName(n)) if n == "div" => BinaryOp::Div,
                Some(Token::OperatorName(n)) if n == "mod" => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        let mut negations = 0;
        while self.eat(&Token::Minus) {
            self.charge()?;
            negations += 1;
        }
        let mut expr = self.parse_union()?;
        for _ in 0..negations {
            expr = Expr::Negate(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_union(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_path()?;
            left = self.binary(BinaryOp::Union, left, right)?;
        }
        Ok(left)
    }

    fn starts_step(&self) -> bool {
        match self.peek() {
            Some(Token::At) | Some(Token::Dot) | Some(Token::DotDot) | Some(Token::Star) => true,
            Some(Token::Name(n)) => match self.peek_at(1) {
                Some(Token::LParen) => n == "node" || n == "text",
                _ => true,
            },
            _ => false,
        }
    }

    fn parse_path(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                let steps = if self.starts_step() { self.parse_relative_steps()? } else { Vec::new() };
                Ok(Expr::Path(LocationPath { absolute: true, steps }))
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                let mut steps = vec![descendant_or_self()];
                steps.extend(self.parse_relative_steps()?);
                Ok(Expr::Path(LocationPath { absolute: true, steps }))
            }
            _ if self.starts_step() => {
                let steps = self.parse_relative_steps()?;
                Ok(Expr::Path(LocationPath { absolute: false, steps }))
            }
            _ => {
                let base = self.parse_primary()?;
                let mut steps = Vec::new();
                if matches!(self.peek(), Some(Token::Slash) | Some(Token::DoubleSlash)) {
                    if self.next() == Some(Token::DoubleSlash) {
                        steps.push(descendant_or_self());
                    }
                    steps.extend(self.parse_relative_steps()?);
                }
                if steps.is_empty() {
                    Ok(base)
                } else {
                    Ok(Expr::PathFrom { base: Box::new(base),
                                        path: LocationPath { absolute: false, steps } })
                }
            }
        }
    }

    fn parse_relative_steps(&mut self) -> Result<Vec<Step>, String> {
        let mut steps = vec![self.parse_step()?];
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                    steps.push(self.parse_step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(descendant_or_self());
                    steps.push(self.parse_step()?);
                }
                _ => return Ok(steps),
            }
        }
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        if self.eat(&Token::Dot) {
            return Ok(Step { axis: Axis::SelfAxis, test: NodeTest::Node, predicates: vec![] });
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step { axis: Axis::Parent, test: NodeTest::Node, predicates: vec![] });
        }
        let mut axis = Axis::Child;
        if self.eat(&Token::At) {
            axis = Axis::Attribute;
        } else if let (Some(Token::Name(n)), Some(Token::DoubleColon)) = (self.peek(), self.peek_at(1)) {
            axis = match n.as_str() {
                "child" => Axis::Child,
                "attribute" => Axis::Attribute,
                "self" => Axis::SelfAxis,
                "parent" => Axis::Parent,
                "descendant-or-self" => Axis::DescendantOrSelf,
                other => return Err(format!("unsupported axis '{other}'")),
            };
            self.pos += 2;
        }
        let test = match self.next() {
            Some(Token::Star) => NodeTest::Any,
            Some(Token::Name(n)) => {
                if (n == "node" || n == "text") && self.peek() == Some(&Token::LParen) {
                    self.expect(&Token::LParen)?;
                    self.expect(&Token::RParen)?;
                    if n == "node" { NodeTest::Node } else { NodeTest::Text }
                } else if let Some(prefix) = n.strip_suffix(":*") {
                    NodeTest::AnyInNamespace(prefix.to_string())
                } else {
                    match n.split_once(':') {
                        Some((p, l)) => NodeTest::Name { prefix: p.to_string(), local: l.to_string() },
                        None => NodeTest::Name { prefix: String::new(), local: n },
                    }
                }
            }
            other => return Err(format!("expected node test, found {other:?}")),
        };
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_nested()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(Step { axis, test, predicates })
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Variable(v)) => Ok(Expr::Variable(v)),
            Some(Token::LParen) => {
                let e = self.parse_nested()?;
                self.expect(&Token::RParen)?;
                Ok(e)
            }
            Some(Token::Name(name)) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_nested()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(&Token::RParen)?;
                        break;
                    }
                }
                Ok(Expr::Function { name, args })
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

fn descendant_or_self() -> Step {
    Step { axis: Axis::DescendantOrSelf,
           test: NodeTest::Node,
           predicates: vec![] }
}

/// Parsea una expresión completa.
pub fn parse_expr(src: &str) -> Result<Expr, String> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err("empty expression".into());
    }
    let mut parser = Parser { tokens,
                             pos: 0,
                             weight: 0 };
    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!("unexpected trailing token {:?}", parser.peek()));
    }
    Ok(expr)
}
