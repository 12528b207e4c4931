//! Case-insensitive substring search across every field of a record.

use serde::Serialize;
use serde_json::Value;

/// Records whose serialized form contains `query`, in their original order.
///
/// A blank query returns everything. Nested objects (such as a follow-up's
/// inspection snapshot) are searched too. Null and empty values never match.
pub fn search<'a, T: Serialize>(records: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|r| {
            serde_json::to_value(r)
                .map(|v| contains(&v, &needle))
                .unwrap_or(false)
        })
        .collect()
}

fn contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty() && s.to_lowercase().contains(needle),
        Value::Bool(b) => b.to_string().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|v| contains(v, needle)),
        Value::Object(map) => map.values().any(|v| contains(v, needle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RecordId;
    use crate::inspection::Inspection;
    use crate::record::Stored;
    use serde_json::json;

    fn inspections() -> Vec<Stored<Inspection>> {
        ["INS001", "INS002", "ABC003"]
            .into_iter()
            .enumerate()
            .map(|(i, no)| {
                Stored::new(
                    RecordId::from(i as u64 + 1),
                    Inspection {
                        no: no.into(),
                        factory_name: format!("Factory {i}"),
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn blank_query_returns_all_in_order() {
        let all = inspections();
        let hits = search(&all, "   ");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[2].record.no, "ABC003");
    }

    #[test]
    fn match_ignores_case() {
        let all = inspections();
        let upper = search(&all, "INS001");
        let lower = search(&all, "ins001");
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 1);
        assert_eq!(search(&all, "ins").len(), 2);
    }

    #[test]
    fn id_is_searchable() {
        let all = inspections();
        let hits = search(&all, "3");
        assert!(hits.iter().any(|s| s.id == RecordId::from(3)));
    }

    #[test]
    fn nested_values_and_nulls() {
        let rows = vec![
            json!({"no": null, "snapshot": {"factory_name": "Golden Nest"}}),
            json!({"no": "", "snapshot": null}),
        ];
        assert_eq!(search(&rows, "golden").len(), 1);
        assert!(search(&rows, "null").is_empty());
    }
}
