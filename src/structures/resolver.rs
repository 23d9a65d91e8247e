//! Recursive expansion of structure fields into flat, dotted-path schema
//! fields.
//!
//! Expansion carries an explicit path of visited structure ids; a field whose
//! resolved structure is already on the path is exposed as its bare type
//! label and not expanded further. That bounds self-referential structures to
//! one level instead of recursing forever.

use super::{FieldDefinition, GenericTypeArgs, StructureIndex};
use crate::types::{CollectionKind, ScalarType, TypeRef};
use ahash::AHashSet;

/// One flattened field of an expanded structure.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Dotted path from the structure root, e.g. `user.address.city`.
    pub path: String,
    pub ty: TypeRef,
    pub description: Option<String>,
}

/// State threaded through one expansion.
pub struct ResolveContext<'a> {
    pub index: &'a StructureIndex<'a>,
    pub generic_args: Option<&'a GenericTypeArgs>,
    pub generic_param_names: AHashSet<String>,
    /// Structure ids on the current expansion path.
    pub visited: Vec<String>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(index: &'a StructureIndex<'a>) -> Self {
        ResolveContext {
            index,
            generic_args: None,
            generic_param_names: AHashSet::new(),
            visited: Vec::new(),
        }
    }

    fn on_path(&self, structure_id: &str) -> bool {
        self.visited.iter().any(|id| id == structure_id)
    }
}

/// Intermediate shape of a resolved field type, before flattening.
enum Resolved<'a> {
    Scalar(TypeRef),
    Object {
        ty: TypeRef,
        fields: &'a [FieldDefinition],
    },
    Array {
        item: Box<Resolved<'a>>,
    },
}

impl<'a> Resolved<'a> {
    fn type_ref(&self) -> TypeRef {
        match self {
            Resolved::Scalar(ty) => ty.clone(),
            Resolved::Object { ty, .. } => ty.clone(),
            Resolved::Array { item } => TypeRef::Collection {
                kind: CollectionKind::List,
                element: Box::new(item.type_ref()),
                key: None,
            },
        }
    }
}

const EMPTY_FIELDS: &[FieldDefinition] = &[];

fn resolve_type_name<'a>(type_name: Option<&str>, context: &ResolveContext<'a>) -> Resolved<'a> {
    let Some(type_name) = type_name.map(str::trim).filter(|name| !name.is_empty()) else {
        return Resolved::Scalar(TypeRef::Dynamic);
    };

    if let Some(parameter) = type_name.strip_prefix("generic:") {
        return Resolved::Object {
            ty: TypeRef::Generic(parameter.to_string()),
            fields: EMPTY_FIELDS,
        };
    }

    if let Some(scalar) = ScalarType::parse(type_name) {
        return match scalar {
            ScalarType::Object => Resolved::Object {
                ty: TypeRef::Primitive(ScalarType::Object),
                fields: EMPTY_FIELDS,
            },
            ScalarType::Array => Resolved::Array {
                item: Box::new(Resolved::Scalar(TypeRef::Dynamic)),
            },
            other => Resolved::Scalar(TypeRef::Primitive(other)),
        };
    }

    if let Some(structure) = context.index.resolve(type_name) {
        if context.on_path(&structure.id) {
            // Cycle: stop at a bare object.
            return Resolved::Scalar(TypeRef::Primitive(ScalarType::Object));
        }
        return Resolved::Object {
            ty: TypeRef::Struct(structure.id.clone()),
            fields: &structure.fields,
        };
    }

    Resolved::Scalar(TypeRef::Dynamic)
}

fn resolve_generic_param<'a>(parameter: &str, context: &ResolveContext<'a>) -> Resolved<'a> {
    let Some(argument) = context
        .generic_args
        .and_then(|args| args.get(parameter))
    else {
        return Resolved::Scalar(TypeRef::Dynamic);
    };

    let collection = argument.collection_type.as_deref().unwrap_or("");
    if collection == "map" {
        return Resolved::Object {
            ty: TypeRef::Primitive(ScalarType::Object),
            fields: EMPTY_FIELDS,
        };
    }
    if collection == "list" || collection == "set" || argument.is_array {
        return Resolved::Array {
            item: Box::new(resolve_type_name(argument.element_type.as_deref(), context)),
        };
    }
    if argument.value_type.is_some() {
        return resolve_type_name(argument.value_type.as_deref(), context);
    }
    resolve_type_name(argument.element_type.as_deref(), context)
}

fn resolve_field<'a>(field: &'a FieldDefinition, context: &ResolveContext<'a>) -> Resolved<'a> {
    if let Some(structure) = field
        .ref_structure
        .as_deref()
        .and_then(|reference| context.index.resolve(reference))
    {
        if context.on_path(&structure.id) {
            return Resolved::Scalar(TypeRef::Primitive(ScalarType::Object));
        }
        return Resolved::Object {
            ty: TypeRef::Struct(structure.id.clone()),
            fields: &structure.fields,
        };
    }

    if context.generic_param_names.contains(field.field_type.as_str()) {
        return resolve_generic_param(&field.field_type, context);
    }

    if field.field_type == "object" {
        return Resolved::Object {
            ty: TypeRef::Primitive(ScalarType::Object),
            fields: &field.children,
        };
    }

    if field.field_type == "array" || field.field_type == "list" {
        let item = match field.item_type.as_deref() {
            Some(item_type) if context.generic_param_names.contains(item_type) => {
                resolve_generic_param(item_type, context)
            }
            Some("object") => Resolved::Object {
                ty: TypeRef::Primitive(ScalarType::Object),
                fields: &field.children,
            },
            Some(item_type) => resolve_type_name(Some(item_type), context),
            None => Resolved::Scalar(TypeRef::Dynamic),
        };
        return Resolved::Array {
            item: Box::new(item),
        };
    }

    resolve_type_name(Some(field.field_type.as_str()), context)
}

/// Recursively flattens `fields` into dotted-path schema fields, expanding
/// referenced structures and array element structures.
pub fn flatten_structure_fields(
    fields: &[FieldDefinition],
    context: &mut ResolveContext<'_>,
) -> Vec<SchemaField> {
    let mut output = Vec::new();
    flatten_into(fields, context, "", &mut output);
    output
}

fn flatten_into(
    fields: &[FieldDefinition],
    context: &mut ResolveContext<'_>,
    parent_path: &str,
    output: &mut Vec<SchemaField>,
) {
    for field in fields {
        let name = field.name.trim();
        if name.is_empty() {
            continue;
        }
        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{parent_path}.{name}")
        };

        let resolved = resolve_field(field, context);
        output.push(SchemaField {
            path: path.clone(),
            ty: resolved.type_ref(),
            description: field.description.clone(),
        });

        match resolved {
            Resolved::Object { ty, fields } if !fields.is_empty() => {
                let pushed = push_struct(context, &ty);
                flatten_into(fields, context, &path, output);
                pop_struct(context, pushed);
            }
            Resolved::Array { item } => {
                if let Resolved::Object { ty, fields } = *item {
                    if !fields.is_empty() {
                        let pushed = push_struct(context, &ty);
                        flatten_into(fields, context, &path, output);
                        pop_struct(context, pushed);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_struct(context: &mut ResolveContext<'_>, ty: &TypeRef) -> bool {
    if let TypeRef::Struct(id) = ty {
        context.visited.push(id.clone());
        true
    } else {
        false
    }
}

fn pop_struct(context: &mut ResolveContext<'_>, pushed: bool) {
    if pushed {
        context.visited.pop();
    }
}

/// Flattens the fields of the structure behind `reference`. Unknown or
/// `generic:` references yield an empty list rather than an error.
pub fn structure_fields_by_ref(
    reference: &str,
    index: &StructureIndex<'_>,
    generic_args: Option<&GenericTypeArgs>,
) -> Vec<SchemaField> {
    if reference.trim().is_empty() || reference.starts_with("generic:") {
        return Vec::new();
    }
    let Some(structure) = index.resolve(reference) else {
        tracing::debug!(reference, "structure reference did not resolve");
        return Vec::new();
    };

    let mut context = ResolveContext {
        index,
        generic_args,
        generic_param_names: structure
            .type_parameter_names()
            .map(str::to_string)
            .collect(),
        visited: vec![structure.id.clone()],
    };
    flatten_structure_fields(&structure.fields, &mut context)
}
