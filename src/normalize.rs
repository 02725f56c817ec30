//! Reshapes multi-valued key/value input (form bodies, query strings) into
//! documents usable as filters or inserts. Routes decode the input with
//! `axum::Form<Vec<(String, String)>>` / `axum::Query<Vec<(String, String)>>`,
//! which keep pair order and repeated keys.
//!
//! Keys are taken verbatim. Nothing here guards against keys that the store
//! interprets as operators.

use crate::models::{Document, FieldValue, Primitive};

/// Maps every distinct key to the ordered list of its values.
pub fn normalize<I, K, V>(pairs: I) -> Document
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut document = Document::new();
    for (key, value) in pairs {
        let key: String = key.into();
        let value = Primitive::String(value.into());
        match document.get_mut(&key) {
            Some(FieldValue::List(values)) => values.push(value),
            _ => {
                document.insert(key, vec![value]);
            }
        }
    }
    document
}

/// Maps every distinct key to its first value as a single string.
pub fn normalize_first<I, K, V>(pairs: I) -> Document
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut document = Document::new();
    for (key, value) in pairs {
        let key: String = key.into();
        if !document.contains_key(&key) {
            let value: String = value.into();
            document.insert(key, value);
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> FieldValue {
        FieldValue::List(values.iter().map(|v| Primitive::from(*v)).collect())
    }

    #[test]
    fn groups_repeated_keys_in_input_order() {
        let doc = normalize(vec![
            ("middle-name", "Augusta"),
            ("name", "Ada"),
            ("middle-name", "King"),
        ]);

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["middle-name", "name"]);
        assert_eq!(doc.get("middle-name"), Some(&strings(&["Augusta", "King"])));
        assert_eq!(doc.get("name"), Some(&strings(&["Ada"])));
    }

    #[test]
    fn empty_input_yields_empty_document() {
        let doc = normalize(Vec::<(String, String)>::new());
        assert!(doc.is_empty());
    }

    #[test]
    fn entry_count_equals_distinct_keys() {
        let pairs: Vec<(String, String)> = (0..20)
            .map(|i| (format!("k{}", i % 7), format!("v{}", i)))
            .collect();
        let doc = normalize(pairs);

        assert_eq!(doc.len(), 7);
        assert_eq!(doc.get("k0"), Some(&strings(&["v0", "v7", "v14"])));
    }

    #[test]
    fn first_value_wins_for_scalar_filters() {
        let doc = normalize_first(vec![("name", "Ada"), ("name", "Grace"), ("age", "30")]);

        assert_eq!(doc.get("name"), Some(&FieldValue::from("Ada")));
        assert_eq!(doc.get("age"), Some(&FieldValue::from("30")));
    }

    #[test]
    fn operator_keys_pass_through_verbatim() {
        let doc = normalize(vec![("$where", "1"), ("a.b", "2")]);
        assert!(doc.contains_key("$where"));
        assert!(doc.contains_key("a.b"));
    }

    #[test]
    fn handles_many_distinct_keys() {
        let pairs: Vec<(String, String)> = (0..200_000)
            .map(|i| (format!("k{}", i), String::new()))
            .chain(std::iter::once(("k0".to_string(), "again".to_string())))
            .collect();

        let doc = normalize(pairs.clone());
        assert_eq!(doc.len(), 200_000);
        assert_eq!(doc.keys().last(), Some("k199999"));
        assert_eq!(doc.get("k0"), Some(&strings(&["", "again"])));

        let first = normalize_first(pairs);
        assert_eq!(first.len(), 200_000);
        assert_eq!(first.get("k0"), Some(&FieldValue::from("")));
    }
}
