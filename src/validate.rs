use crate::models::{Fields, ShapedElement};
use crate::schema::{FieldSpec, FieldType, TAG_SCHEMA, WAY_NODE_SCHEMA};
use thiserror::Error;

/// A single schema violation on one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("required field")]
    Required,

    #[error("must be of {0} type")]
    Type(FieldType),
}

/// A shaped element that does not match its schema. Fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Element of type '{element}' has invalid field '{field}': {}", join_errors(.errors))]
pub struct ValidationError {
    pub element: &'static str,
    pub field: String,
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checks the primary record, then every tag, then every way node.
///
/// Stops at the first field that fails and reports all of its errors.
pub fn validate_element(shaped: &ShapedElement) -> Result<(), ValidationError> {
    let element = shaped.kind.name();

    if let Some((field, errors)) = check_fields(shaped.kind.schema(), &shaped.primary) {
        return Err(ValidationError {
            element,
            field: field.to_string(),
            errors,
        });
    }

    for (i, tag) in shaped.tags.iter().enumerate() {
        if let Some((field, errors)) = check_fields(TAG_SCHEMA, tag) {
            return Err(ValidationError {
                element,
                field: format!("{}[{}].{}", shaped.kind.tags_section(), i, field),
                errors,
            });
        }
    }

    for (i, way_node) in shaped.way_nodes.iter().enumerate() {
        if let Some((field, errors)) = check_fields(WAY_NODE_SCHEMA, way_node) {
            return Err(ValidationError {
                element,
                field: format!("way_nodes[{}].{}", i, field),
                errors,
            });
        }
    }

    Ok(())
}

fn check_fields<R: Fields>(
    schema: &[FieldSpec],
    row: &R,
) -> Option<(&'static str, Vec<FieldError>)> {
    schema.iter().find_map(|spec| {
        let errors = check_field(spec, row);
        (!errors.is_empty()).then_some((spec.name, errors))
    })
}

fn check_field<R: Fields>(spec: &FieldSpec, row: &R) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match row.field(spec.name) {
        None => errors.push(FieldError::Required),
        Some(value) => {
            if !spec.field_type.matches(value) {
                errors.push(FieldError::Type(spec.field_type));
            }
        }
    }
    errors
}
