//! Query evaluation for the in-process store. Follows document-store
//! semantics for the subset of operators that fit the typed document model:
//! a scalar condition matches a list field holding that element, and
//! comparisons across unrelated types never match.

use std::cmp::Ordering;

use regex::Regex;

use crate::errors::StoreError;
use crate::models::{Document, FieldValue, Primitive, SortDirection};

/// Returns whether `document` satisfies every condition in `filter`.
pub fn matches(document: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (field, condition) in filter.iter() {
        if field.starts_with('$') {
            return Err(StoreError::rejected(format!("unsupported top-level operator '{}'", field)));
        }
        let value = document.get_path(field);
        let satisfied = match condition {
            FieldValue::Document(ops) if is_operator_document(ops) => evaluate_operators(value, ops)?,
            other => equals(value, other),
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_operator_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|k| k.starts_with('$'))
}

fn evaluate_operators(value: Option<&FieldValue>, ops: &Document) -> Result<bool, StoreError> {
    for (op, operand) in ops.iter() {
        let satisfied = match op {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$lt" => compare_with(value, operand, |o| o == Ordering::Less)?,
            "$lte" => compare_with(value, operand, |o| o != Ordering::Greater)?,
            "$gt" => compare_with(value, operand, |o| o == Ordering::Greater)?,
            "$gte" => compare_with(value, operand, |o| o != Ordering::Less)?,
            "$in" => match operand {
                FieldValue::List(candidates) => candidates
                    .iter()
                    .any(|c| equals(value, &FieldValue::Primitive(c.clone()))),
                _ => return Err(StoreError::rejected("$in needs a list")),
            },
            "$exists" => match operand {
                FieldValue::Primitive(p) => value.is_some() == truthy(p),
                _ => return Err(StoreError::rejected("$exists needs a scalar")),
            },
            "$regex" => match operand {
                FieldValue::Primitive(Primitive::String(pattern)) => {
                    let regex = Regex::new(pattern)
                        .map_err(|e| StoreError::rejected(format!("invalid $regex: {}", e)))?;
                    elements(value).any(|p| matches!(p, Primitive::String(s) if regex.is_match(s)))
                }
                _ => return Err(StoreError::rejected("$regex needs a string pattern")),
            },
            other => return Err(StoreError::rejected(format!("unsupported operator '{}'", other))),
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Scalars stored at a field: the value itself, or each element of a list.
fn elements<'a>(value: Option<&'a FieldValue>) -> Box<dyn Iterator<Item = &'a Primitive> + 'a> {
    match value {
        Some(FieldValue::Primitive(p)) => Box::new(std::iter::once(p)),
        Some(FieldValue::List(items)) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

fn equals(value: Option<&FieldValue>, condition: &FieldValue) -> bool {
    match (value, condition) {
        (None, FieldValue::Primitive(Primitive::Null)) => true,
        (None, _) => false,
        (Some(FieldValue::List(items)), FieldValue::Primitive(p)) => {
            items.iter().any(|item| primitive_eq(item, p))
        }
        (Some(FieldValue::Primitive(v)), FieldValue::Primitive(p)) => primitive_eq(v, p),
        (Some(FieldValue::List(items)), FieldValue::List(expected)) => {
            items.len() == expected.len()
                && items.iter().zip(expected).all(|(a, b)| primitive_eq(a, b))
        }
        (Some(FieldValue::Document(d)), FieldValue::Document(expected)) => d == expected,
        _ => false,
    }
}

fn compare_with(
    value: Option<&FieldValue>,
    operand: &FieldValue,
    accept: impl Fn(Ordering) -> bool,
) -> Result<bool, StoreError> {
    let FieldValue::Primitive(bound) = operand else {
        return Err(StoreError::rejected("comparison operators need a scalar"));
    };
    Ok(elements(value).any(|p| compare(p, bound).map(&accept).unwrap_or(false)))
}

fn primitive_eq(a: &Primitive, b: &Primitive) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

/// Orders two scalars of the same kind. Ints and doubles compare numerically.
pub fn compare(a: &Primitive, b: &Primitive) -> Option<Ordering> {
    match (a, b) {
        (Primitive::Int(x), Primitive::Int(y)) => Some(x.cmp(y)),
        (Primitive::Int(x), Primitive::Double(y)) => (*x as f64).partial_cmp(y),
        (Primitive::Double(x), Primitive::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Primitive::Double(x), Primitive::Double(y)) => x.partial_cmp(y),
        (Primitive::String(x), Primitive::String(y)) => Some(x.cmp(y)),
        (Primitive::Bool(x), Primitive::Bool(y)) => Some(x.cmp(y)),
        (Primitive::ObjectId(x), Primitive::ObjectId(y)) => Some(x.cmp(y)),
        (Primitive::Null, Primitive::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn truthy(p: &Primitive) -> bool {
    match p {
        Primitive::Null => false,
        Primitive::Bool(b) => *b,
        Primitive::Int(i) => *i != 0,
        Primitive::Double(d) => *d != 0.0,
        Primitive::String(_) | Primitive::ObjectId(_) => true,
    }
}

/// Applies an inclusion or exclusion projection. `_id` is kept unless it is
/// explicitly excluded.
pub fn project(document: Document, projection: &Document) -> Result<Document, StoreError> {
    if projection.is_empty() {
        return Ok(document);
    }

    let mut include_id = true;
    let mut included = Vec::new();
    let mut excluded = Vec::new();
    for (field, flag) in projection.iter() {
        let keep = match flag {
            FieldValue::Primitive(p) => truthy(p),
            _ => return Err(StoreError::rejected(format!("projection for '{}' must be a scalar", field))),
        };
        if field == "_id" {
            include_id = keep;
        } else if keep {
            included.push(field);
        } else {
            excluded.push(field);
        }
    }

    if !included.is_empty() && !excluded.is_empty() {
        return Err(StoreError::rejected("cannot mix inclusion and exclusion in a projection"));
    }

    let inclusive = !included.is_empty();
    Ok(document
        .into_iter()
        .filter(|(field, _)| {
            if field == "_id" {
                include_id
            } else if inclusive {
                included.contains(&field.as_str())
            } else {
                !excluded.contains(&field.as_str())
            }
        })
        .collect())
}

/// Sorts in place on the given keys; missing fields sort first.
pub fn sort(documents: &mut [Document], keys: &[(String, SortDirection)]) {
    if keys.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for (field, direction) in keys {
            let ordering = sort_key_cmp(a.get_path(field), b.get_path(field));
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn sort_key_cmp(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    let a = sort_key(a);
    let b = sort_key(b);
    match (a, b) {
        (Some(x), Some(y)) => compare(x, y).unwrap_or_else(|| type_rank(x).cmp(&type_rank(y))),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

fn sort_key(value: Option<&FieldValue>) -> Option<&Primitive> {
    match value {
        Some(FieldValue::Primitive(Primitive::Null)) => None,
        Some(FieldValue::Primitive(p)) => Some(p),
        Some(FieldValue::List(items)) => items.first(),
        _ => None,
    }
}

fn type_rank(p: &Primitive) -> u8 {
    match p {
        Primitive::Null => 0,
        Primitive::Int(_) | Primitive::Double(_) => 1,
        Primitive::String(_) => 2,
        Primitive::ObjectId(_) => 3,
        Primitive::Bool(_) => 4,
    }
}
