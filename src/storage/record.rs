use crate::core::Value;
use std::collections::HashMap;

pub type RecordId = u64;

/// A mutable record owned by the backing store.
///
/// Records are never constructed by callers; the store allocates them and
/// hands out copies from fetch requests or mutable access through the
/// pending overlay. Field access is untyped key/value, the entity mapping
/// lives in the persistence layer.
#[derive(Debug, Clone)]
pub struct ManagedRecord {
    id: RecordId,
    collection: String,
    fields: HashMap<String, Value>,
}

impl ManagedRecord {
    pub(crate) fn new(id: RecordId, collection: impl Into<String>) -> Self {
        Self {
            id,
            collection: collection.into(),
            fields: HashMap::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn float(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let mut record = ManagedRecord::new(1, "items");
        record.set("name", "widget");
        record.set("count", 3i64);
        record.set("price", 9.5);
        record.set("active", true);

        assert_eq!(record.text("name"), Some("widget"));
        assert_eq!(record.integer("count"), Some(3));
        assert_eq!(record.float("price"), Some(9.5));
        assert_eq!(record.boolean("active"), Some(true));
        assert_eq!(record.field_count(), 4);

        // Typed reads against a differently typed field come back empty.
        assert_eq!(record.integer("name"), None);
        assert_eq!(record.text("missing"), None);
    }
}
