//! Field Extractor: one record subtree to one flat record

use crate::document::Element;
use crate::schema::{FieldRule, ProjectionSchema, Scope};

/// Flat projection of one record: `(field name, value)` pairs in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FlatRecord {
    fields: Vec<(&'static str, String)>,
}

impl FlatRecord {
    /// Value of `name`, `None` when the schema has no such field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// `(name, value)` pairs in column order
    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Concatenation of `names`, the way composite keys and fields are built
    #[must_use]
    pub fn concat(&self, names: &[&str]) -> String {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }
}

/// Resolve a scope anchor by first match, one path step at a time
fn resolve_anchor<'a>(record: &'a Element, scope: Scope) -> Option<&'a Element> {
    scope
        .anchor_path()
        .iter()
        .try_fold(record, |node, step| node.find_descendant(step))
}

/// Project `record` onto `schema`
///
/// Never fails: a missing anchor, a missing element or an element without
/// text all yield `""`. The result always has `schema.len()` fields.
#[must_use]
pub fn extract(record: &Element, schema: &ProjectionSchema) -> FlatRecord {
    let anchors: Vec<Option<&Element>> = Scope::ALL
        .iter()
        .map(|scope| resolve_anchor(record, *scope))
        .collect();

    let mut flat = FlatRecord {
        fields: schema
            .fields
            .iter()
            .map(|field| {
                let value = match field.rule {
                    FieldRule::Lookup { scope, tag } => anchors[scope.index()]
                        .and_then(|anchor| anchor.find_descendant(tag))
                        .map(|node| node.trimmed_text().to_string())
                        .unwrap_or_default(),
                    FieldRule::Concat(_) => String::new(),
                };
                (field.name, value)
            })
            .collect(),
    };

    // Composites read the already-resolved lookups
    for (index, field) in schema.fields.iter().enumerate() {
        if let FieldRule::Concat(parts) = field.rule {
            flat.fields[index].1 = flat.concat(parts);
        }
    }
    flat
}

/// Every record element of `root` in document order
pub fn records<'a>(
    root: &'a Element,
    schema: &'a ProjectionSchema,
) -> impl Iterator<Item = &'a Element> + 'a {
    root.descendants_named(schema.record_tag)
}
