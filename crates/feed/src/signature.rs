use crate::error::{FeedError, Result};
use kalem_model::Collection;
use kalem_store::{Filter, Order};

/// The (collection, filters, sort order) tuple identifying one logical
/// paginated result stream. Used as the feed cache key.
///
/// Filters are kept sorted so that logically equal signatures hash equally
/// no matter the order they were built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    collection: Collection,
    filters: Vec<Filter>,
    order: Order,
}

impl QuerySignature {
    /// Signature for a collection's default public listing: no filters,
    /// newest first by the collection's sort field.
    pub fn new(collection: Collection) -> Self {
        QuerySignature {
            collection,
            filters: Vec::new(),
            order: Order::desc(collection.default_sort_field()),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self.filters.sort_by(|a, b| filter_key(a).cmp(&filter_key(b)));
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Convenience: restrict to one category.
    pub fn category(self, value: impl Into<String>) -> Self {
        self.with_filter(Filter::eq("category", value))
    }

    /// Convenience: case-insensitive title search.
    pub fn search(self, text: impl Into<String>) -> Self {
        self.with_filter(Filter::ilike("title", format!("%{}%", text.into())))
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Fail fast on malformed predicates so an empty result is never
    /// mistaken for "no matches".
    pub fn validate(&self) -> Result<()> {
        if self.order.field.trim().is_empty() {
            return Err(FeedError::InvalidSignature(
                "sort field must not be blank".to_string(),
            ));
        }
        for filter in &self.filters {
            if filter.field().trim().is_empty() {
                return Err(FeedError::InvalidSignature(
                    "filter field must not be blank".to_string(),
                ));
            }
            match filter {
                Filter::Eq { field, value } => {
                    if value.trim().is_empty() {
                        return Err(FeedError::InvalidSignature(format!(
                            "blank value for '{field}' filter"
                        )));
                    }
                }
                Filter::Ilike { field, pattern } => {
                    if pattern.trim_matches('%').trim().is_empty() {
                        return Err(FeedError::InvalidSignature(format!(
                            "blank pattern for '{field}' filter"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn filter_key(filter: &Filter) -> (String, u8, String) {
    match filter {
        Filter::Eq { field, value } => (field.clone(), 0, value.clone()),
        Filter::Ilike { field, pattern } => (field.clone(), 1, pattern.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_insertion_order_does_not_matter() {
        let a = QuerySignature::new(Collection::Articles)
            .category("Tarih")
            .search("kahve");
        let b = QuerySignature::new(Collection::Articles)
            .search("kahve")
            .category("Tarih");
        assert_eq!(a, b);
    }

    #[test]
    fn different_filters_are_different_signatures() {
        let a = QuerySignature::new(Collection::Articles).category("Tarih");
        let b = QuerySignature::new(Collection::Articles).category("Edebiyat");
        assert_ne!(a, b);
    }

    #[test]
    fn default_order_follows_collection() {
        let sig = QuerySignature::new(Collection::Articles);
        assert_eq!(sig.order().field, "published_at");
        assert!(!sig.order().ascending);

        let sig = QuerySignature::new(Collection::Videos);
        assert_eq!(sig.order().field, "created_at");
    }

    #[test]
    fn blank_category_fails_validation() {
        let sig = QuerySignature::new(Collection::Articles).category("   ");
        assert!(matches!(
            sig.validate(),
            Err(FeedError::InvalidSignature(_))
        ));
    }

    #[test]
    fn blank_search_fails_validation() {
        let sig = QuerySignature::new(Collection::Articles).search("");
        assert!(matches!(
            sig.validate(),
            Err(FeedError::InvalidSignature(_))
        ));
    }

    #[test]
    fn plain_signature_is_valid() {
        let sig = QuerySignature::new(Collection::Questions)
            .with_filter(Filter::eq("is_published", "true"));
        assert!(sig.validate().is_ok());
    }
}
