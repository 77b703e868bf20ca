//! Evaluador del subconjunto XPath sobre `XmlDocument`.

use std::cmp::Ordering;

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::{FunctionContext, XPathValue};
use crate::xml::{NamespaceContext, NodeId, XmlDocument};

pub(crate) struct EvalContext<'a> {
    pub doc: &'a XmlDocument,
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
    pub namespaces: &'a NamespaceContext,
    pub functions: &'a dyn FunctionContext,
}

impl<'a> EvalContext<'a> {
    fn at(&self, node: NodeId, position: usize, size: usize) -> EvalContext<'a> {
        EvalContext { doc: self.doc,
                      node,
                      position,
                      size,
                      namespaces: self.namespaces,
                      functions: self.functions }
    }
}

/// Clave de orden de documento: posiciones desde la raíz. Los atributos se
/// ordenan tras su elemento y antes de sus hijos.
fn order_key(doc: &XmlDocument, node: NodeId) -> Vec<usize> {
    let mut key = Vec::new();
    let mut cursor = node;
    while let Some(parent) = doc.parent(cursor) {
        let attrs = doc.attributes(parent);
        let slot = match attrs.iter().position(|a| *a == cursor) {
            Some(i) => i,
            None => attrs.len() + doc.children(parent).iter().position(|c| *c == cursor).unwrap_or(0),
        };
        key.push(slot);
        cursor = parent;
    }
    key.reverse();
    key
}

pub(crate) fn sort_document_order(doc: &XmlDocument, nodes: &mut Vec<NodeId>) {
    let mut keyed: Vec<(Vec<usize>, NodeId)> = nodes.iter().map(|n| (order_key(doc, *n), *n)).collect();
    keyed.sort();
    keyed.dedup_by(|a, b| a.1 == b.1);
    *nodes = keyed.into_iter().map(|(_, n)| n).collect();
}

pub(crate) fn evaluate(expr: &Expr, ctx: &EvalContext) -> Result<XPathValue, String> {
    match expr {
        Expr::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expr::Number(n) => Ok(XPathValue::Number(*n)),
        Expr::Variable(name) => ctx.functions
                                   .variable(name)
                                   .ok_or_else(|| format!("unbound variable ${name}")),
        Expr::Path(path) => {
            let start = if path.absolute { ctx.doc.root() } else { ctx.node };
            Ok(XPathValue::Nodes(apply_steps(vec![start], &path.steps, ctx)?))
        }
        Expr::PathFrom { base, path } => match evaluate(base, ctx)? {
            XPathValue::Nodes(nodes) => Ok(XPathValue::Nodes(apply_steps(nodes, &path.steps, ctx)?)),
            other => Err(format!("cannot apply a path to {}", other.type_name())),
        },
        Expr::Function { name, args } => call_function(name, args, ctx),
        Expr::Negate(inner) => Ok(XPathValue::Number(-evaluate(inner, ctx)?.to_number(ctx.doc))),
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, ctx),
    }
}

fn apply_steps(mut current: Vec<NodeId>, steps: &[Step], ctx: &EvalContext) -> Result<Vec<NodeId>, String> {
    for step in steps {
        let mut next = Vec::new();
        for node in &current {
            let candidates: Vec<NodeId> = axis_nodes(ctx.doc, *node, step.axis).into_iter()
                                                                                 .filter(|n| matches_test(ctx, *n, step.axis, &step.test))
                                                                                 .collect();
            next.extend(filter_predicates(candidates, &step.predicates, ctx)?);
        }
        sort_document_order(ctx.doc, &mut next);
        current = next;
    }
    Ok(current)
}

fn axis_nodes(doc: &XmlDocument, node: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children(node).to_vec(),
        Axis::Attribute => doc.attributes(node).to_vec(),
        Axis::SelfAxis => vec![node],
        Axis::Parent => doc.parent(node).into_iter().collect(),
        Axis::DescendantOrSelf => doc.descendants_or_self(node),
    }
}

fn matches_test(ctx: &EvalContext, node: NodeId, axis: Axis, test: &NodeTest) -> bool {
    let doc = ctx.doc;
    let principal = match axis {
        Axis::Attribute => doc.is_attribute(node),
        _ => doc.is_element(node),
    };
    match test {
        NodeTest::Node => true,
        NodeTest::Text => doc.is_text(node),
        NodeTest::Any => principal,
        NodeTest::AnyInNamespace(prefix) => {
            principal && ctx.namespaces.resolve(prefix).map(str::to_string) == doc.namespace_uri(node)
        }
        NodeTest::Name { prefix, local } => {
            if !principal || doc.local_name(node) != Some(local.as_str()) {
                return false;
            }
            let expected = if prefix.is_empty() { None } else { ctx.namespaces.resolve(prefix).map(str::to_string) };
            expected == doc.namespace_uri(node)
        }
    }
}

fn filter_predicates(mut nodes: Vec<NodeId>, predicates: &[Expr], ctx: &EvalContext) -> Result<Vec<NodeId>, String> {
    for predicate in predicates {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, n) in nodes.iter().enumerate() {
            let inner = ctx.at(*n, i + 1, size);
            let keep = match evaluate(predicate, &inner)? {
                XPathValue::Number(p) => p == (i + 1) as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(*n);
            }
        }
        nodes = kept;
    }
    Ok(nodes)
}

fn evaluate_binary(op: BinaryOp, left: &Expr, right: &Expr, ctx: &EvalContext) -> Result<XPathValue, String> {
    match op {
        BinaryOp::Or => {
            let l = evaluate(left, ctx)?.to_boolean();
            Ok(XPathValue::Boolean(l || evaluate(right, ctx)?.to_boolean()))
        }
        BinaryOp::And => {
            let l = evaluate(left, ctx)?.to_boolean();
            Ok(XPathValue::Boolean(l && evaluate(right, ctx)?.to_boolean()))
        }
        BinaryOp::Union => match (evaluate(left, ctx)?, evaluate(right, ctx)?) {
            (XPathValue::Nodes(mut a), XPathValue::Nodes(b)) => {
                a.extend(b);
                sort_document_order(ctx.doc, &mut a);
                Ok(XPathValue::Nodes(a))
            }
            _ => Err("union operands must be node-sets".into()),
        },
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let l = evaluate(left, ctx)?;
            let r = evaluate(right, ctx)?;
            Ok(XPathValue::Boolean(compare(op, &l, &r, ctx.doc)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let l = evaluate(left, ctx)?.to_number(ctx.doc);
            let r = evaluate(right, ctx)?.to_number(ctx.doc);
            Ok(XPathValue::Number(match op {
                                      BinaryOp::Add => l + r,
                                      BinaryOp::Sub => l - r,
                                      BinaryOp::Mul => l * r,
                                      BinaryOp::Div => l / r,
                                      _ => l % r,
                                  }))
        }
    }
}

/// Comparación XPath 1.0: con node-sets la comparación es existencial.
fn compare(op: BinaryOp, l: &XPathValue, r: &XPathValue, doc: &XmlDocument) -> bool {
    match (l, r) {
        (XPathValue::Nodes(a), XPathValue::Nodes(b)) => a.iter().any(|x| {
            let sx = XPathValue::String(doc.string_value(*x));
            b.iter().any(|y| compare_atomic(op, &sx, &XPathValue::String(doc.string_value(*y)), doc))
        }),
        (XPathValue::Nodes(_), XPathValue::Boolean(_)) | (XPathValue::Boolean(_), XPathValue::Nodes(_)) => {
            compare_atomic(op, &XPathValue::Boolean(l.to_boolean()), &XPathValue::Boolean(r.to_boolean()), doc)
        }
        (XPathValue::Nodes(a), other) => {
            a.iter().any(|x| compare_atomic(op, &XPathValue::String(doc.string_value(*x)), other, doc))
        }
        (other, XPathValue::Nodes(b)) => {
            b.iter().any(|y| compare_atomic(op, other, &XPathValue::String(doc.string_value(*y)), doc))
        }
        _ => compare_atomic(op, l, r, doc),
    }
}

fn compare_atomic(op: BinaryOp, l: &XPathValue, r: &XPathValue, doc: &XmlDocument) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (l, r) {
                (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => l.to_boolean() == r.to_boolean(),
                (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => l.to_number(doc) == r.to_number(doc),
                _ => l.to_string_value(doc) == r.to_string_value(doc),
            };
            if op == BinaryOp::Eq { equal } else { !equal }
        }
        _ => {
            let ordering = l.to_number(doc).partial_cmp(&r.to_number(doc));
            match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
                (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
                (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            }
        }
    }
}

fn arity(name: &str, args: &[Expr], min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        return Err(format!("{name}() expects {min}..{max} arguments, got {}", args.len()));
    }
    Ok(())
}

fn call_function(name: &str, args: &[Expr], ctx: &EvalContext) -> Result<XPathValue, String> {
    let doc = ctx.doc;
    let arg = |i: usize| evaluate(&args[i], ctx);
    let string_arg = |i: usize| -> Result<String, String> {
        if args.len() > i {
            Ok(evaluate(&args[i], ctx)?.to_string_value(doc))
        } else {
            Ok(doc.string_value(ctx.node))
        }
    };
    match name {
        "true" => Ok(XPathValue::Boolean(true)),
        "false" => Ok(XPathValue::Boolean(false)),
        "position" => Ok(XPathValue::Number(ctx.position as f64)),
        "last" => Ok(XPathValue::Number(ctx.size as f64)),
        "not" => {
            arity(name, args, 1, 1)?;
            Ok(XPathValue::Boolean(!arg(0)?.to_boolean()))
        }
        "boolean" => {
            arity(name, args, 1, 1)?;
            Ok(XPathValue::Boolean(arg(0)?.to_boolean()))
        }
        "boolean-from-string" => {
            arity(name, args, 1, 1)?;
            let s = string_arg(0)?;
            Ok(XPathValue::Boolean(s == "true" || s == "1"))
        }
        "string" => {
            arity(name, args, 0, 1)?;
            Ok(XPathValue::String(string_arg(0)?))
        }
        "number" => {
            arity(name, args, 0, 1)?;
            let n = if args.is_empty() { XPathValue::String(doc.string_value(ctx.node)).to_number(doc) } else { arg(0)?.to_number(doc) };
            Ok(XPathValue::Number(n))
        }
        "concat" => {
            if args.len() < 2 {
                return Err("concat() expects at least 2 arguments".into());
            }
            let mut out = String::new();
            for i in 0..args.len() {
                out.push_str(&string_arg(i)?);
            }
            Ok(XPathValue::String(out))
        }
        "string-length" => {
            arity(name, args, 0, 1)?;
            Ok(XPathValue::Number(string_arg(0)?.chars().count() as f64))
        }
        "normalize-space" => {
            arity(name, args, 0, 1)?;
            Ok(XPathValue::String(string_arg(0)?.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "contains" => {
            arity(name, args, 2, 2)?;
            Ok(XPathValue::Boolean(string_arg(0)?.contains(&string_arg(1)?)))
        }
        "starts-with" => {
            arity(name, args, 2, 2)?;
            Ok(XPathValue::Boolean(string_arg(0)?.starts_with(&string_arg(1)?)))
        }
        "substring-before" | "substring-after" => {
            arity(name, args, 2, 2)?;
            let s = string_arg(0)?;
            let pat = string_arg(1)?;
            let out = match s.find(&pat) {
                Some(i) if name == "substring-before" => s[..i].to_string(),
                Some(i) => s[i + pat.len()..].to_string(),
                None => String::new(),
            };
            Ok(XPathValue::String(out))
        }
        "substring" => {
            arity(name, args, 2, 3)?;
            let s: Vec<char> = string_arg(0)?.chars().collect();
            let start = arg(1)?.to_number(doc).round();
            let end = if args.len() == 3 { start + arg(2)?.to_number(doc).round() } else { f64::INFINITY };
            let out: String = s.iter()
                               .enumerate()
                               .filter(|(i, _)| {
                                   let p = (*i + 1) as f64;
                                   p >= start && p < end
                               })
                               .map(|(_, c)| *c)
                               .collect();
            Ok(XPathValue::String(out))
        }
        "count" => {
            arity(name, args, 1, 1)?;
            match arg(0)? {
                XPathValue::Nodes(n) => Ok(XPathValue::Number(n.len() as f64)),
                other => Err(format!("count() expects a node-set, got {}", other.type_name())),
            }
        }
        "sum" => {
            arity(name, args, 1, 1)?;
            match arg(0)? {
                XPathValue::Nodes(n) => Ok(XPathValue::Number(n.iter()
                                                              .map(|x| XPathValue::String(doc.string_value(*x)).to_number(doc))
                                                              .sum())),
                other => Err(format!("sum() expects a node-set, got {}", other.type_name())),
            }
        }
        "round" | "floor" | "ceiling" => {
            arity(name, args, 1, 1)?;
            let n = arg(0)?.to_number(doc);
            Ok(XPathValue::Number(match name {
                                      "round" => (n + 0.5).floor(),
                                      "floor" => n.floor(),
                                      _ => n.ceil(),
                                  }))
        }
        "name" | "local-name" => {
            arity(name, args, 0, 1)?;
            let target = if args.is_empty() {
                Some(ctx.node)
            } else {
                match arg(0)? {
                    XPathValue::Nodes(n) => n.first().copied(),
                    other => return Err(format!("{name}() expects a node-set, got {}", other.type_name())),
                }
            };
            let value = target.and_then(|t| if name == "name" { doc.name(t) } else { doc.local_name(t) })
                              .unwrap_or_default()
                              .to_string();
            Ok(XPathValue::String(value))
        }
        "if" => {
            arity(name, args, 3, 3)?;
            if arg(0)?.to_boolean() { arg(1) } else { arg(2) }
        }
        // Una sola instancia por documento: instance('id') devuelve su raíz.
        "instance" => {
            arity(name, args, 0, 1)?;
            Ok(XPathValue::Nodes(doc.document_element().into_iter().collect()))
        }
        other => Err(format!("unknown function {other}()")),
    }
}
