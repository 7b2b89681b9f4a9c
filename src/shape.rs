use crate::classify::classify_key;
use crate::models::{ElementKind, PrimaryRecord, ShapedElement, Tag, Value, WayNode};
use crate::parser::XmlElement;
use crate::schema::FieldSpec;

/// Turns a `node` or `way` element into its table rows; `None` for anything else.
///
/// Tags with a rejected key and `nd` refs that are not integers are dropped
/// and only counted. Way-node positions advance on accepted refs alone.
pub fn shape_element(element: &XmlElement) -> Option<ShapedElement> {
    let kind = ElementKind::from_name(&element.name)?;
    let primary = gather_attributes(element, kind);
    let parent_id = primary.id().cloned();

    let (tags, skipped_tags) = gather_tags(element, parent_id.as_ref());
    let (way_nodes, skipped_refs) = match kind {
        ElementKind::Way => gather_way_nodes(element, parent_id.as_ref()),
        ElementKind::Node => (Vec::new(), 0),
    };

    Some(ShapedElement {
        kind,
        primary,
        tags,
        way_nodes,
        skipped_tags,
        skipped_refs,
    })
}

fn gather_attributes(element: &XmlElement, kind: ElementKind) -> PrimaryRecord {
    let fields = kind
        .schema()
        .iter()
        .filter_map(|spec: &FieldSpec| {
            element
                .attribute(spec.name)
                .map(|raw| (spec.name, spec.coerce(raw)))
        })
        .collect();
    PrimaryRecord { kind, fields }
}

fn gather_tags(element: &XmlElement, parent_id: Option<&Value>) -> (Vec<Tag>, u32) {
    let mut tags = Vec::new();
    let mut skipped = 0;

    for child in element.children_named("tag") {
        let (Some(k), Some(v)) = (child.attribute("k"), child.attribute("v")) else {
            continue;
        };
        match classify_key(k) {
            Some(classified) => tags.push(Tag {
                parent_id: parent_id.cloned(),
                key: classified.key.to_string(),
                value: v.to_string(),
                namespace: classified.namespace.to_string(),
            }),
            None => skipped += 1,
        }
    }

    (tags, skipped)
}

fn gather_way_nodes(element: &XmlElement, way_id: Option<&Value>) -> (Vec<WayNode>, u32) {
    let mut way_nodes = Vec::new();
    let mut skipped = 0;
    let mut position = 0;

    for child in element.children_named("nd") {
        let Some(raw) = child.attribute("ref") else {
            continue;
        };
        match raw.trim().parse::<i64>() {
            Ok(node_id) => {
                way_nodes.push(WayNode {
                    way_id: way_id.cloned(),
                    node_id,
                    position,
                });
                position += 1;
            }
            Err(_) => skipped += 1,
        }
    }

    (way_nodes, skipped)
}
