//! AST del subconjunto XPath soportado.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Union,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Attribute,
    SelfAxis,
    Parent,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `prefix:local` o `local` (prefijo vacío = sin namespace).
    Name { prefix: String, local: String },
    /// `*`
    Any,
    /// `prefix:*`
    AnyInNamespace(String),
    /// `text()`
    Text,
    /// `node()`
    Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(String),
    Number(f64),
    Variable(String),
    Path(LocationPath),
    /// Expresión primaria seguida de pasos relativos (`instance('i')/x`).
    PathFrom { base: Box<Expr>, path: LocationPath },
    Function { name: String, args: Vec<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Negate(Box<Expr>),
}

impl Expr {
    /// Prefijos usados en tests de nombre, para validarlos contra el contexto
    /// de namespaces antes de evaluar.
    pub fn prefixes(&self, out: &mut Vec<String>) {
        match self {
            Expr::Literal(_) | Expr::Number(_) | Expr::Variable(_) => {}
            Expr::Path(p) => p.prefixes(out),
            Expr::PathFrom { base, path } => {
                base.prefixes(out);
                path.prefixes(out);
            }
            Expr::Function { args, .. } => args.iter().for_each(|a| a.prefixes(out)),
            Expr::Binary { left, right, .. } => {
                left.prefixes(out);
                right.prefixes(out);
            }
            Expr::Negate(e) => e.prefixes(out),
        }
    }
}

impl LocationPath {
    fn prefixes(&self, out: &mut Vec<String>) {
        for step in &self.steps {
            match &step.test {
                NodeTest::Name { prefix, .. } if !prefix.is_empty() => out.push(prefix.clone()),
                NodeTest::AnyInNamespace(prefix) => out.push(prefix.clone()),
                _ => {}
            }
            step.predicates.iter().for_each(|p| p.prefixes(out));
        }
    }
}
