use serde_json::Value;

/// A server-side filter predicate on one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Exact match (`field=eq.value` on the wire).
    Eq { field: String, value: String },
    /// Case-insensitive pattern match (`field=ilike.pattern` on the wire).
    /// `%` acts as a wildcard, matching the remote row store's semantics.
    Ilike { field: String, pattern: String },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Ilike {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Eq { field, .. } | Filter::Ilike { field, .. } => field,
        }
    }

    /// Evaluate the predicate against a JSON row, as the remote store would.
    pub fn matches(&self, row: &Value) -> bool {
        let Some(cell) = row.get(self.field()) else {
            return false;
        };
        match self {
            Filter::Eq { value, .. } => match cell {
                Value::String(s) => s == value,
                Value::Bool(b) => value == if *b { "true" } else { "false" },
                Value::Number(n) => n.to_string() == *value,
                Value::Null => false,
                other => other.to_string() == *value,
            },
            Filter::Ilike { pattern, .. } => {
                let Some(s) = cell.as_str() else {
                    return false;
                };
                ilike_matches(s, pattern)
            }
        }
    }
}

/// Simplified ILIKE: `%` wildcards at either end, case-insensitive.
///
/// Covers the patterns this codebase generates (`%needle%`); interior
/// wildcards are not supported.
fn ilike_matches(haystack: &str, pattern: &str) -> bool {
    let hay = haystack.to_lowercase();
    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%');
    let needle = pattern.trim_matches('%').to_lowercase();
    match (leading, trailing) {
        (true, true) => hay.contains(&needle),
        (true, false) => hay.ends_with(&needle),
        (false, true) => hay.starts_with(&needle),
        (false, false) => hay == needle,
    }
}

/// Sort order for a selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

impl Order {
    pub fn desc(field: impl Into<String>) -> Self {
        Order {
            field: field.into(),
            ascending: false,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Order {
            field: field.into(),
            ascending: true,
        }
    }
}

/// Inclusive row offsets for a range fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: usize,
    pub to: usize,
}

impl RowRange {
    /// The range covering page `index` at a fixed page size.
    pub fn page(index: usize, size: usize) -> Self {
        let from = index * size;
        RowRange {
            from,
            to: from + size.saturating_sub(1),
        }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn eq_matches_strings_and_bools() {
        let row = json!({ "category": "Tarih", "is_published": true });
        assert!(Filter::eq("category", "Tarih").matches(&row));
        assert!(!Filter::eq("category", "Edebiyat").matches(&row));
        assert!(Filter::eq("is_published", "true").matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }

    #[test]
    fn ilike_is_case_insensitive_contains() {
        let row = json!({ "title": "Kahvehane Kültürü" });
        assert!(Filter::ilike("title", "%kültür%").matches(&row));
        assert!(Filter::ilike("title", "kahvehane%").matches(&row));
        assert!(!Filter::ilike("title", "%siyaset%").matches(&row));
    }

    #[test]
    fn page_ranges_are_inclusive() {
        let r = RowRange::page(0, 12);
        assert_eq!((r.from, r.to), (0, 11));
        assert_eq!(r.len(), 12);

        let r = RowRange::page(2, 12);
        assert_eq!((r.from, r.to), (24, 35));
    }
}
