//! The closed set of type values used throughout the engine.
//!
//! String-encoded tags (`struct:<id>`, `generic:<T>`, `list:struct:<id>`) only
//! exist at the system boundary: they are parsed into [`TypeRef`] on the way in
//! and formatted back into display labels on the way out. Internal logic never
//! re-parses strings.

use crate::structures::StructureIndex;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The primitive scalar types a variable can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Object => "object",
            ScalarType::Array => "array",
        }
    }

    /// Parses a scalar name, folding the numeric aliases the backend emits
    /// (`integer`, `float`, `double`) into `number` and `list` into `array`.
    pub fn parse(name: &str) -> Option<ScalarType> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Some(ScalarType::String),
            "number" | "integer" | "float" | "double" => Some(ScalarType::Number),
            "boolean" => Some(ScalarType::Boolean),
            "object" => Some(ScalarType::Object),
            "array" | "list" => Some(ScalarType::Array),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The collection wrappers a type can be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    List,
    Set,
    Map,
}

/// A structural type. This is the central value of the engine: every variable
/// in a catalog carries exactly one of these.
///
/// A `Collection` wraps any other variant through `element`; nesting is always
/// explicit, never implied by the wrapper itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(ScalarType),
    /// An unresolved type parameter inherited from a generic structure.
    Generic(String),
    /// A reference to a named structure definition, by id.
    Struct(String),
    Collection {
        kind: CollectionKind,
        element: Box<TypeRef>,
        /// Only present for maps.
        key: Option<Box<TypeRef>>,
    },
    /// A type that cannot be known until runtime.
    Dynamic,
}

/// Strips every leading `struct:` prefix from a reference string. Upstream
/// data has been observed to stack the prefix more than once.
pub fn normalize_struct_ref(reference: &str) -> &str {
    let mut rest = reference.trim();
    while let Some(stripped) = rest.strip_prefix("struct:") {
        rest = stripped;
    }
    rest
}

/// Display normalization: the legacy type name `array` is always shown to the
/// user as `List`.
pub fn display_type(type_name: &str) -> &str {
    if type_name.eq_ignore_ascii_case("array") || type_name.eq_ignore_ascii_case("list") {
        "List"
    } else {
        type_name
    }
}

lazy_static! {
    static ref GENERIC_WRAPPER_RE: Regex =
        Regex::new(r"(?i)^(?:List|ArrayList|Set|HashSet|LinkedList|Array|Collection)<(.+)>$")
            .expect("generic wrapper pattern");
    static ref ARRAY_SUFFIX_RE: Regex = Regex::new(r"^(.+)\[\]$").expect("array suffix pattern");
}

/// Best-effort extraction of the element type name from a flattened type
/// string (`List<ContentVO>`, `ContentVO[]`, `array<number>`). Returns `None`
/// when the string matches no known wrapper pattern.
pub fn extract_element_type(full_type: &str) -> Option<String> {
    let full_type = full_type.trim();
    if full_type.is_empty() {
        return None;
    }
    if let Some(captures) = GENERIC_WRAPPER_RE.captures(full_type) {
        return Some(captures[1].trim().to_string());
    }
    if let Some(captures) = ARRAY_SUFFIX_RE.captures(full_type) {
        return Some(captures[1].trim().to_string());
    }
    None
}

/// Resolves a string-encoded type tag to a display name.
///
/// `struct:<id>` becomes the structure's name (`None` when the id is unknown),
/// `generic:<name>` is erased to the literal `object` (generic parameters lose
/// their meaning outside their defining structure), and anything else passes
/// through unchanged.
pub fn resolve_type_ref(type_ref: &str, index: &StructureIndex) -> Option<String> {
    if type_ref.is_empty() {
        return None;
    }
    if type_ref.starts_with("struct:") {
        let id = normalize_struct_ref(type_ref);
        return index
            .resolve(id)
            .map(|s| s.display_name().to_string());
    }
    if type_ref.starts_with("generic:") {
        return Some("object".to_string());
    }
    Some(type_ref.to_string())
}

impl TypeRef {
    /// Parses a boundary tag (`struct:<id>`, `generic:<T>`, `list:struct:<id>`,
    /// a primitive name, or a bare structure name) into a `TypeRef`.
    pub fn from_tag(tag: &str, index: &StructureIndex) -> TypeRef {
        let tag = tag.trim();
        if tag.is_empty() {
            return TypeRef::Dynamic;
        }
        if let Some(rest) = tag.strip_prefix("list:") {
            return TypeRef::Collection {
                kind: CollectionKind::List,
                element: Box::new(TypeRef::from_tag(rest, index)),
                key: None,
            };
        }
        if let Some(rest) = tag.strip_prefix("set:") {
            return TypeRef::Collection {
                kind: CollectionKind::Set,
                element: Box::new(TypeRef::from_tag(rest, index)),
                key: None,
            };
        }
        if tag.starts_with("struct:") {
            return TypeRef::Struct(normalize_struct_ref(tag).to_string());
        }
        if let Some(name) = tag.strip_prefix("generic:") {
            return TypeRef::Generic(name.trim().to_string());
        }
        if let Some(scalar) = ScalarType::parse(tag) {
            return TypeRef::Primitive(scalar);
        }
        if tag.eq_ignore_ascii_case("dynamic") || tag.eq_ignore_ascii_case("unknown") {
            return TypeRef::Dynamic;
        }
        match index.resolve(tag) {
            Some(structure) => TypeRef::Struct(structure.id.clone()),
            None => TypeRef::Generic(tag.to_string()),
        }
    }

    /// Combines a coarse base type with optional `typeRef`/`itemTypeRef` tags,
    /// the triplet that node configurations persist for a typed output.
    pub fn from_parts(
        base: Option<&str>,
        type_ref: Option<&str>,
        item_type_ref: Option<&str>,
        index: &StructureIndex,
    ) -> TypeRef {
        let base = base.map(str::trim).filter(|s| !s.is_empty());
        let is_array = matches!(base, Some(b) if b.eq_ignore_ascii_case("array") || b.eq_ignore_ascii_case("list"));
        if is_array {
            let element = item_type_ref
                .or(type_ref)
                .map(|tag| TypeRef::from_tag(tag, index))
                .unwrap_or(TypeRef::Dynamic);
            return TypeRef::Collection {
                kind: CollectionKind::List,
                element: Box::new(element),
                key: None,
            };
        }
        if let Some(tag) = type_ref.map(str::trim).filter(|s| !s.is_empty()) {
            return TypeRef::from_tag(tag, index);
        }
        match base.and_then(ScalarType::parse) {
            Some(scalar) => TypeRef::Primitive(scalar),
            None => TypeRef::Dynamic,
        }
    }

    /// Parses a display label back into a `TypeRef`. This is the inverse of
    /// [`TypeRef::label`]; unknown bare names resolve through the structure
    /// index first and fall back to generic parameters.
    pub fn parse_label(label: &str, index: &StructureIndex) -> TypeRef {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("dynamic") || label.eq_ignore_ascii_case("unknown") {
            return TypeRef::Dynamic;
        }
        if let Some(inner) = strip_wrapper(label, "List") {
            return TypeRef::Collection {
                kind: CollectionKind::List,
                element: Box::new(TypeRef::parse_label(inner, index)),
                key: None,
            };
        }
        if let Some(inner) = strip_wrapper(label, "Set") {
            return TypeRef::Collection {
                kind: CollectionKind::Set,
                element: Box::new(TypeRef::parse_label(inner, index)),
                key: None,
            };
        }
        if let Some(inner) = strip_wrapper(label, "Map") {
            let (key, value) = split_top_level(inner);
            return TypeRef::Collection {
                kind: CollectionKind::Map,
                element: Box::new(TypeRef::parse_label(value, index)),
                key: Some(Box::new(TypeRef::parse_label(key, index))),
            };
        }
        if let Some(scalar) = ScalarType::parse(label) {
            return TypeRef::Primitive(scalar);
        }
        match index.resolve(label) {
            Some(structure) => TypeRef::Struct(structure.id.clone()),
            None => TypeRef::Generic(label.to_string()),
        }
    }

    /// Formats a user-facing label. `Primitive(Array)` and list collections
    /// render as `List`, struct references render as the structure's name
    /// (raw id when the structure is unknown), generics render as-is.
    pub fn label(&self, index: &StructureIndex) -> String {
        match self {
            TypeRef::Primitive(ScalarType::Array) => "List".to_string(),
            TypeRef::Primitive(scalar) => scalar.as_str().to_string(),
            TypeRef::Generic(name) => name.clone(),
            TypeRef::Struct(id) => index
                .resolve(id)
                .map(|s| s.display_name().to_string())
                .unwrap_or_else(|| id.clone()),
            TypeRef::Collection { kind, element, key } => match kind {
                CollectionKind::List => format!("List<{}>", element.label(index)),
                CollectionKind::Set => format!("Set<{}>", element.label(index)),
                CollectionKind::Map => {
                    let key_label = key
                        .as_ref()
                        .map(|k| k.label(index))
                        .unwrap_or_else(|| "string".to_string());
                    format!("Map<{}, {}>", key_label, element.label(index))
                }
            },
            TypeRef::Dynamic => "dynamic".to_string(),
        }
    }

    /// The coarse base type of this value, as node configuration stores it.
    pub fn base_type(&self) -> &'static str {
        match self {
            TypeRef::Primitive(scalar) => scalar.as_str(),
            // Generics are erased to object outside their defining structure.
            TypeRef::Generic(_) | TypeRef::Struct(_) => "object",
            TypeRef::Collection { kind, .. } => match kind {
                CollectionKind::List | CollectionKind::Set => "array",
                CollectionKind::Map => "object",
            },
            TypeRef::Dynamic => "dynamic",
        }
    }

    /// The element type when this is a list or set.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Collection {
                kind: CollectionKind::List | CollectionKind::Set,
                element,
                ..
            } => Some(element),
            _ => None,
        }
    }

    /// The structure id this type (or its element, for collections) points at.
    pub fn struct_ref(&self) -> Option<&str> {
        match self {
            TypeRef::Struct(id) => Some(id),
            TypeRef::Collection { element, .. } => element.struct_ref(),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            TypeRef::Primitive(ScalarType::Array)
                | TypeRef::Collection {
                    kind: CollectionKind::List | CollectionKind::Set,
                    ..
                }
        )
    }

    /// Replaces every generic parameter with its binding, recursively.
    /// Unbound parameters are left in place.
    pub fn substitute(&self, bindings: &ahash::AHashMap<String, TypeRef>) -> TypeRef {
        match self {
            TypeRef::Generic(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeRef::Collection { kind, element, key } => TypeRef::Collection {
                kind: *kind,
                element: Box::new(element.substitute(bindings)),
                key: key.as_ref().map(|k| Box::new(k.substitute(bindings))),
            },
            other => other.clone(),
        }
    }
}

fn strip_wrapper<'a>(label: &'a str, wrapper: &str) -> Option<&'a str> {
    let rest = label.strip_prefix(wrapper)?;
    let rest = rest.strip_prefix('<')?;
    rest.strip_suffix('>')
}

/// Splits `K, V` at the first comma not nested inside angle brackets.
fn split_top_level(inner: &str) -> (&str, &str) {
    let mut depth = 0usize;
    for (position, character) in inner.char_indices() {
        match character {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                return (inner[..position].trim(), inner[position + 1..].trim());
            }
            _ => {}
        }
    }
    (inner.trim(), "")
}
