//! Constantes del core.
//!
//! Nombres de espacios de nombres y prefijos de parámetros del request. La
//! versión del motor entra en los fingerprints de etapa: cambiarla invalida
//! de forma determinista cualquier fingerprint almacenado.

/// Versión lógica del algoritmo de reconstrucción.
pub const ENGINE_VERSION: &str = "XF1.0";

pub const XFORMS_NAMESPACE_URI: &str = "http://www.w3.org/2002/xforms";
pub const XXFORMS_NAMESPACE_URI: &str = "http://orbeon.org/oxf/xml/xforms";
pub const XXFORMS_PREFIX: &str = "xxforms";
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefijo de los parámetros que asignan un valor a un nodo decorado.
pub const NODE_PARAM_PREFIX: &str = "$node^";
/// Parámetro que transporta una instancia completa serializada.
pub const INSTANCE_PARAM: &str = "$instance";
/// Parámetro que transporta un elemento de acción serializado.
pub const ACTION_PARAM: &str = "$action";

/// Tipo asumido cuando el request no anota uno.
pub const DEFAULT_TYPE: &str = "xs:string";

/// Profundidad máxima de anidamiento de elementos aceptada al parsear XML.
pub const MAX_XML_DEPTH: usize = 256;
/// Máximo de operadores, negaciones y subexpresiones en una expresión XPath.
pub const MAX_XPATH_COMPLEXITY: usize = 256;
