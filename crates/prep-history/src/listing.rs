//! Filtering and ordering of preparation listings.

use std::cmp::Ordering;

use prep_model::{Identifiable, Preparation};

/// Field preparations are ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    Name,
    /// Creation time.
    Date,
    /// Last modification time.
    #[default]
    Modified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// How a listing matches preparation names. Both forms ignore case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact(String),
    Containing(String),
}

impl NameMatch {
    pub fn new(name: impl Into<String>, exact: bool) -> Self {
        if exact {
            Self::Exact(name.into())
        } else {
            Self::Containing(name.into())
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self {
            Self::Exact(wanted) => name == wanted.to_lowercase(),
            Self::Containing(part) => name.contains(&part.to_lowercase()),
        }
    }
}

/// Which preparations to list and in what order.
///
/// The default lists everything, most recently modified first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub data_set_id: Option<String>,
    pub name: Option<NameMatch>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl ListQuery {
    pub fn data_set(mut self, data_set_id: impl Into<String>) -> Self {
        self.data_set_id = Some(data_set_id.into());
        self
    }

    pub fn named(mut self, name: NameMatch) -> Self {
        self.name = Some(name);
        self
    }

    pub fn sorted(mut self, sort: SortKey, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn matches(&self, preparation: &Preparation) -> bool {
        self.data_set_id
            .as_deref()
            .is_none_or(|data_set_id| preparation.data_set_id == data_set_id)
            && self
                .name
                .as_ref()
                .is_none_or(|name| name.matches(&preparation.name))
    }

    /// Keep the matching preparations, in query order.
    pub fn apply(&self, mut preparations: Vec<Preparation>) -> Vec<Preparation> {
        preparations.retain(|preparation| self.matches(preparation));
        preparations.sort_by(|a, b| self.compare(a, b));
        preparations
    }

    fn compare(&self, a: &Preparation, b: &Preparation) -> Ordering {
        let ordering = match self.sort {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Modified => a.last_modified_at.cmp(&b.last_modified_at),
        }
        .then_with(|| a.id().cmp(b.id()));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_ignoring_case() {
        assert!(NameMatch::new("Orders", true).matches("orders"));
        assert!(!NameMatch::new("Orders", true).matches("orders 2024"));
        assert!(NameMatch::new("DER", false).matches("orders 2024"));
        assert!(!NameMatch::new("customers", false).matches("orders"));
    }

    #[test]
    fn default_query_is_newest_modification_first() {
        let query = ListQuery::default();
        assert_eq!(query.sort, SortKey::Modified);
        assert_eq!(query.order, SortOrder::Desc);
        assert!(query.data_set_id.is_none() && query.name.is_none());
    }
}
