//! Transitive `$ref` resolution over component schemas.

use serde_json::{Map, Value};
use std::collections::HashSet;

/// Prefix of a local component-schema reference.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Names of all local schema references found anywhere inside `node`, in
/// document order, duplicates included.
pub fn schema_refs(node: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    collect_refs(node, &mut out);
    out
}

fn collect_refs<'a>(node: &'a Value, out: &mut Vec<&'a str>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                if key == "$ref" {
                    if let Some(name) = value.as_str().and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX)) {
                        out.push(name);
                    }
                } else {
                    collect_refs(value, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

/// Schemas reachable from `root` that are not yet in `known`.
///
/// Follows references found inside each newly copied schema as well.  A name
/// already in `known` or already collected is never visited again, which
/// also terminates reference cycles.  Each name is looked up in `catalogs`
/// in order and the first catalog holding it supplies the body; names found
/// in none are left out.  No input is modified; the result holds deep
/// copies.
pub fn schema_closure(
    root: &Value,
    catalogs: &[&Map<String, Value>],
    known: &Map<String, Value>,
) -> Map<String, Value> {
    let mut resolved = Map::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut pending: Vec<&str> = schema_refs(root);
    pending.reverse();

    while let Some(name) = pending.pop() {
        if known.contains_key(name) || !visited.insert(name) {
            continue;
        }
        let Some(schema) = catalogs.iter().find_map(|catalog| catalog.get(name)) else {
            tracing::debug!(schema = %name, "referenced schema not found in any upstream document");
            continue;
        };
        let mut nested = schema_refs(schema);
        nested.reverse();
        pending.extend(nested);
        resolved.insert(name.to_string(), schema.clone());
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn finds_refs_at_any_depth() {
        let op = json!({
            "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Order"}}}},
            "responses": {
                "200": {"content": {"application/json": {"schema": {
                    "type": "array",
                    "items": {"$ref": "#/components/schemas/Order"}
                }}}},
                "default": {"$ref": "#/components/responses/Problem"}
            }
        });
        assert_eq!(schema_refs(&op), vec!["Order", "Order"]);
    }

    #[test]
    fn closure_follows_nested_refs() {
        let catalog = catalog(json!({
            "Order": {"properties": {"lines": {"items": {"$ref": "#/components/schemas/Line"}}}},
            "Line": {"properties": {"sku": {"$ref": "#/components/schemas/Sku"}}},
            "Sku": {"type": "string"},
            "Unused": {"type": "integer"}
        }));
        let root = json!({"$ref": "#/components/schemas/Order"});

        let out = schema_closure(&root, &[&catalog], &Map::new());
        let names: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(names.len(), 3);
        assert!(out.contains_key("Order") && out.contains_key("Line") && out.contains_key("Sku"));
        assert!(!out.contains_key("Unused"));
    }

    #[test]
    fn cycles_terminate() {
        let catalog = catalog(json!({
            "Node": {"properties": {"next": {"$ref": "#/components/schemas/Node"}, "tree": {"$ref": "#/components/schemas/Tree"}}},
            "Tree": {"properties": {"root": {"$ref": "#/components/schemas/Node"}}}
        }));
        let out = schema_closure(&json!({"$ref": "#/components/schemas/Node"}), &[&catalog], &Map::new());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn known_schemas_are_not_reprocessed() {
        let catalog = catalog(json!({
            "Error": {"properties": {"detail": {"$ref": "#/components/schemas/Detail"}}},
            "Detail": {"type": "string"}
        }));
        let mut known = Map::new();
        known.insert("Error".into(), json!({"type": "object"}));

        let out = schema_closure(&json!({"$ref": "#/components/schemas/Error"}), &[&catalog], &known);
        assert!(out.is_empty());
    }

    #[test]
    fn dangling_refs_are_skipped() {
        let out = schema_closure(
            &json!({"$ref": "#/components/schemas/Ghost"}),
            &[&Map::new()],
            &Map::new(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn earlier_catalog_supplies_the_body() {
        let own = catalog(json!({
            "Page": {"properties": {"error": {"$ref": "#/components/schemas/Error"}}},
            "Error": {"title": "own"}
        }));
        let shared = catalog(json!({
            "Error": {"title": "shared"},
            "Extra": {"type": "string"}
        }));
        let root = json!({"$ref": "#/components/schemas/Page", "x": {"$ref": "#/components/schemas/Extra"}});

        let out = schema_closure(&root, &[&own, &shared], &Map::new());
        assert_eq!(out["Error"], json!({"title": "own"}));
        assert_eq!(out["Extra"], json!({"type": "string"}));
    }
}
