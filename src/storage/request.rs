use crate::core::Value;
use crate::storage::ManagedRecord;
use std::cmp::Ordering;

/// A single-field equality filter.
///
/// Identifier lookups are the only filtered reads the persistence layer
/// performs, so equality on one field is the only predicate form.
#[derive(Debug, Clone)]
pub enum Predicate {
    Equals { field: String, value: Value },
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &ManagedRecord) -> bool {
        match self {
            Self::Equals { field, value } => record.get(field) == Some(value),
        }
    }
}

/// One component of a fetch request's sort order.
#[derive(Debug, Clone)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// A read request against one collection: optional predicate, sort order,
/// and result limit.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    collection: String,
    predicate: Option<Predicate>,
    sort: Vec<SortKey>,
    limit: Option<usize>,
}

impl FetchRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            predicate: None,
            sort: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn sorted_by(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn matches(&self, record: &ManagedRecord) -> bool {
        match &self.predicate {
            Some(predicate) => predicate.matches(record),
            None => true,
        }
    }

    pub(crate) fn apply_order_and_limit(&self, records: &mut Vec<ManagedRecord>) {
        if !self.sort.is_empty() {
            records.sort_by(|a, b| self.compare_records(a, b));
        }
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
    }

    fn compare_records(&self, a: &ManagedRecord, b: &ManagedRecord) -> Ordering {
        for key in &self.sort {
            let left = a.get(&key.field).unwrap_or(&Value::Null);
            let right = b.get(&key.field).unwrap_or(&Value::Null);
            let ordering = if key.ascending {
                left.compare(right)
            } else {
                right.compare(left)
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
