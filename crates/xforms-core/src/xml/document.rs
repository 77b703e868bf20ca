//! Árbol XML mutable respaldado por un arena (`Vec<Node>`).
//!
//! Los nodos se identifican por `NodeId` (índice en el arena). Eliminar un
//! nodo sólo lo desengancha de su padre: el slot queda inalcanzable pero los
//! ids existentes nunca se reutilizan, de modo que las anotaciones de la
//! instancia (que guardan `NodeId`) siguen siendo válidas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::namespace::{split_qname, NamespaceContext};
use crate::constants::XML_NAMESPACE_URI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        /// Nombre calificado tal como aparece en el documento.
        name: String,
        /// Declaraciones `xmlns` propias del elemento.
        namespaces: IndexMap<String, String>,
    },
    Attribute { name: String, value: String },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self { kind,
               parent: None,
               children: Vec::new(),
               attributes: Vec::new() }
    }
}

/// Nodo de un subárbol a copiar: (índice del padre en el plan, nodo, atributos).
type PlanEntry = (Option<usize>, NodeKind, Vec<NodeKind>);

#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<Node>,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl XmlDocument {
    /// Documento sin elemento raíz (sólo el nodo documento).
    pub fn empty() -> Self {
        Self { nodes: vec![Node::new(NodeKind::Document)] }
    }

    /// Documento con un único elemento raíz vacío.
    pub fn with_root(name: &str) -> Self {
        let mut doc = Self::empty();
        let root = doc.root();
        doc.append_element(root, name);
        doc
    }

    /// Nodo documento.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Primer elemento hijo del nodo documento.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root()).iter().copied().find(|c| self.is_element(*c))
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].attributes
    }

    /// Elementos hijos (ignora texto y comentarios).
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|c| self.is_element(*c)).collect()
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    pub fn is_attribute(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Attribute { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    /// Nombre calificado de un elemento o atributo.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(|n| split_qname(n).1)
    }

    /// URI del namespace de un elemento o atributo. Los atributos sin prefijo
    /// no tienen namespace.
    pub fn namespace_uri(&self, id: NodeId) -> Option<String> {
        let name = self.name(id)?;
        let (prefix, _) = split_qname(name);
        match self.kind(id) {
            NodeKind::Attribute { .. } if prefix.is_empty() => None,
            NodeKind::Attribute { .. } => self.parent(id).and_then(|p| self.lookup_namespace(p, prefix)),
            _ => self.lookup_namespace(id, prefix),
        }
    }

    /// Busca la declaración de `prefix` en `id` y sus ancestros.
    pub fn lookup_namespace(&self, id: NodeId, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE_URI.to_string());
        }
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            if let NodeKind::Element { namespaces, .. } = self.kind(c) {
                if let Some(uri) = namespaces.get(prefix) {
                    // xmlns="" anula el namespace por defecto heredado.
                    return if uri.is_empty() { None } else { Some(uri.clone()) };
                }
            }
            cursor = self.parent(c);
        }
        None
    }

    /// Declaraciones en ámbito para `id`; las internas reemplazan a las externas.
    pub fn in_scope_namespaces(&self, id: NodeId) -> NamespaceContext {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            chain.push(c);
            cursor = self.parent(c);
        }
        let mut ctx = NamespaceContext::new();
        for c in chain.into_iter().rev() {
            if let NodeKind::Element { namespaces, .. } = self.kind(c) {
                for (p, u) in namespaces {
                    ctx.declare(p.clone(), u.clone());
                }
            }
        }
        ctx
    }

    pub fn declare_namespace(&mut self, element: NodeId, prefix: &str, uri: &str) {
        if let NodeKind::Element { namespaces, .. } = &mut self.nodes[element.0].kind {
            namespaces.insert(prefix.to_string(), uri.to_string());
        }
    }

    /// Valor de texto XPath: texto de descendientes para elementos y documento.
    pub fn string_value(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Text(t) | NodeKind::Comment(t) => t.clone(),
            NodeKind::Element { .. } | NodeKind::Document => {
                let mut out = String::new();
                self.collect_text(id, &mut out);
                out
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for n in self.descendants_or_self(id) {
            if let NodeKind::Text(t) = self.kind(n) {
                out.push_str(t);
            }
        }
    }

    /// Fija el valor de texto. En elementos reemplaza todos los hijos por un
    /// único nodo de texto (ninguno si `value` es vacío).
    pub fn set_string_value(&mut self, id: NodeId, value: &str) {
        if self.is_element(id) {
            let old = std::mem::take(&mut self.nodes[id.0].children);
            for c in old {
                self.nodes[c.0].parent = None;
            }
            if !value.is_empty() {
                self.append_text(id, value);
            }
            return;
        }
        match &mut self.nodes[id.0].kind {
            NodeKind::Attribute { value: v, .. } => *v = value.to_string(),
            NodeKind::Text(t) | NodeKind::Comment(t) => *t = value.to_string(),
            NodeKind::Element { .. } | NodeKind::Document => {}
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.push(NodeKind::Element { name: name.to_string(),
                                               namespaces: IndexMap::new() });
        self.attach(parent, id);
        id
    }

    /// Añade texto; si el último hijo ya es texto lo concatena.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        if let Some(last) = self.nodes[parent.0].children.last().copied() {
            if let NodeKind::Text(t) = &mut self.nodes[last.0].kind {
                t.push_str(text);
                return last;
            }
        }
        let id = self.push(NodeKind::Text(text.to_string()));
        self.attach(parent, id);
        id
    }

    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.push(NodeKind::Comment(text.to_string()));
        self.attach(parent, id);
        id
    }

    /// Fija un atributo (lo crea si no existe) y devuelve su nodo.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> NodeId {
        if let Some(existing) = self.attribute(element, name) {
            self.set_string_value(existing, value);
            return existing;
        }
        let id = self.push(NodeKind::Attribute { name: name.to_string(),
                                                 value: value.to_string() });
        self.nodes[id.0].parent = Some(element);
        self.nodes[element.0].attributes.push(id);
        id
    }

    /// Atributo por nombre calificado exacto.
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(element).iter().copied().find(|a| self.name(*a) == Some(name))
    }

    pub fn attribute_value(&self, element: NodeId, name: &str) -> Option<String> {
        self.attribute(element, name).map(|a| self.string_value(a))
    }

    /// Posición de `id` dentro de los hijos de su padre.
    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Desengancha el nodo de su padre. El nodo sigue existiendo en el arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            let p = &mut self.nodes[parent.0];
            p.children.retain(|c| *c != id);
            p.attributes.retain(|a| *a != id);
        }
    }

    /// Inserta un nodo desenganchado como hijo `index` de `parent`.
    pub fn insert_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    /// `true` si el nodo es alcanzable desde el nodo documento.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if cursor == self.root() {
                return true;
            }
            match self.parent(cursor) {
                Some(p) => cursor = p,
                None => return false,
            }
        }
    }

    /// Copia profunda de `src` (de `from`) dentro de este documento. El
    /// resultado queda desenganchado.
    pub fn import_node(&mut self, from: &XmlDocument, src: NodeId) -> NodeId {
        let plan = from.subtree_plan(src);
        self.materialize(plan)
    }

    /// Copia profunda dentro del mismo documento; el resultado queda
    /// desenganchado.
    pub fn deep_copy(&mut self, src: NodeId) -> NodeId {
        let plan = self.subtree_plan(src);
        self.materialize(plan)
    }

    /// Subárbol de `src` en preorden.
    fn subtree_plan(&self, src: NodeId) -> Vec<PlanEntry> {
        let mut plan = Vec::new();
        let mut stack = vec![(src, None)];
        while let Some((n, parent)) = stack.pop() {
            let attributes = self.attributes(n).iter().map(|a| self.kind(*a).clone()).collect();
            plan.push((parent, self.kind(n).clone(), attributes));
            let slot = plan.len() - 1;
            for c in self.children(n).iter().rev() {
                stack.push((*c, Some(slot)));
            }
        }
        plan
    }

    fn materialize(&mut self, plan: Vec<PlanEntry>) -> NodeId {
        let mut created: Vec<NodeId> = Vec::with_capacity(plan.len());
        for (parent, kind, attributes) in plan {
            let id = self.push(kind);
            for a in attributes {
                let copy = self.push(a);
                self.nodes[copy.0].parent = Some(id);
                self.nodes[id.0].attributes.push(copy);
            }
            if let Some(p) = parent {
                self.attach(created[p], id);
            }
            created.push(id);
        }
        created[0]
    }

    /// Nuevo documento cuya raíz es una copia de `element`. Las declaraciones
    /// en ámbito cuyos prefijos usa el subárbol se copian a la nueva raíz para
    /// que sigan resolviéndose; el resto se descarta.
    pub fn from_subtree(from: &XmlDocument, element: NodeId) -> XmlDocument {
        let mut doc = XmlDocument::empty();
        let root = doc.root();
        let copy = doc.import_node(from, element);
        doc.attach(root, copy);
        if from.is_element(element) {
            let used = from.used_prefixes(element);
            let inherited = from.in_scope_namespaces(element);
            for (p, u) in inherited.iter() {
                let already = matches!(doc.kind(copy), NodeKind::Element { namespaces, .. } if namespaces.contains_key(p));
                if !already && used.iter().any(|x| x == p) {
                    doc.declare_namespace(copy, p, u);
                }
            }
        }
        doc
    }

    fn used_prefixes(&self, element: NodeId) -> Vec<String> {
        let mut used: Vec<String> = Vec::new();
        let mut note = |prefix: &str| {
            if !used.iter().any(|u| u == prefix) {
                used.push(prefix.to_string());
            }
        };
        for n in self.descendants_or_self(element) {
            if !self.is_element(n) {
                continue;
            }
            if let Some(name) = self.name(n) {
                note(split_qname(name).0);
            }
            for a in self.attributes(n) {
                let (prefix, _) = split_qname(self.name(*a).unwrap_or_default());
                if !prefix.is_empty() {
                    note(prefix);
                }
            }
        }
        used
    }

    /// Recorrido en preorden de `id` y sus descendientes (sin atributos).
    pub fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            for c in self.children(n).iter().rev() {
                stack.push(*c);
            }
        }
        out
    }

    /// Elimina textos sólo-espacio de elementos con contenido sólo elemento.
    /// El contenido mixto se conserva tal cual.
    pub(crate) fn strip_ignorable_whitespace(&mut self, element: NodeId) {
        let mut has_elements = false;
        for c in self.children(element) {
            match self.kind(*c) {
                NodeKind::Element { .. } => has_elements = true,
                NodeKind::Text(t) if !t.trim().is_empty() => return,
                _ => {}
            }
        }
        if !has_elements {
            return;
        }
        let blanks: Vec<NodeId> = self.children(element).iter().copied().filter(|c| self.is_text(*c)).collect();
        for b in blanks {
            self.detach(b);
        }
    }
}
