// Typed CRUD over one JsonStore, keyed by the collection's identifier field.
use std::path::Path;

use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;
use crate::core::store::JsonStore;

/// Static description of one entity collection: the document key, the
/// identifier field, and the label used in error messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CollectionSpec {
    pub key: &'static str,
    pub id_field: &'static str,
    pub label: &'static str,
}

pub const AUTHORS: CollectionSpec = CollectionSpec {
    key: "authors",
    id_field: "authorId",
    label: "author",
};

pub const BOOKS: CollectionSpec = CollectionSpec {
    key: "books",
    id_field: "bookId",
    label: "book",
};

pub const PUBLISHERS: CollectionSpec = CollectionSpec {
    key: "publishers",
    id_field: "publisherId",
    label: "publisher",
};

#[derive(Clone, Debug)]
pub struct Collection {
    spec: CollectionSpec,
    store: JsonStore,
}

impl Collection {
    pub fn new(data_dir: &Path, spec: CollectionSpec) -> Self {
        let store = JsonStore::new(data_dir.join(format!("{}.json", spec.key)), spec.key);
        Self { spec, store }
    }

    pub fn spec(&self) -> CollectionSpec {
        self.spec
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn ensure(&self) -> Result<(), Error> {
        self.store.ensure()
    }

    pub fn list(&self) -> Result<Vec<Record>, Error> {
        self.store.load()
    }

    pub fn get(&self, id: &str) -> Result<Record, Error> {
        let records = self.store.load()?;
        records
            .into_iter()
            .find(|record| record.id(self.spec.id_field) == Some(id))
            .ok_or_else(|| self.not_found(id))
    }

    /// Appends and persists. The identifier field must be present and a
    /// string; duplicate identifiers are not rejected here, and callers
    /// perform any cross-collection checks before invoking this.
    pub fn create(&self, record: Record) -> Result<Record, Error> {
        record.require_id(self.spec.id_field)?;

        let _guard = self.store.lock()?;
        let mut records = self.store.load()?;
        records.push(record.clone());
        self.store.save(&records)?;
        Ok(record)
    }

    /// Shallow-merges `partial` over the record with `id` and persists.
    pub fn update(&self, id: &str, partial: Record) -> Result<Record, Error> {
        let _guard = self.store.lock()?;
        let mut records = self.store.load()?;
        let index = self
            .position(&records, id)
            .ok_or_else(|| self.not_found(id))?;
        records[index].merge(partial);
        let merged = records[index].clone();
        self.store.save(&records)?;
        Ok(merged)
    }

    pub fn delete(&self, id: &str) -> Result<(), Error> {
        let _guard = self.store.lock()?;
        let mut records = self.store.load()?;
        let index = self
            .position(&records, id)
            .ok_or_else(|| self.not_found(id))?;
        records.remove(index);
        self.store.save(&records)
    }

    /// True if any record's `field` equals `id`. Used for foreign-key
    /// existence checks and reverse-reference scans.
    pub fn references(&self, field: &str, id: &str) -> Result<bool, Error> {
        let records = self.store.load()?;
        Ok(records.iter().any(|record| record.id(field) == Some(id)))
    }

    fn position(&self, records: &[Record], id: &str) -> Option<usize> {
        records
            .iter()
            .position(|record| record.id(self.spec.id_field) == Some(id))
    }

    fn not_found(&self, id: &str) -> Error {
        Error::new(ErrorKind::NotFound)
            .with_message(format!("{} not found", self.spec.label))
            .with_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{AUTHORS, BOOKS, Collection};
    use crate::core::error::ErrorKind;
    use crate::core::record::Record;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).expect("record")
    }

    fn authors(dir: &tempfile::TempDir) -> Collection {
        Collection::new(dir.path(), AUTHORS)
    }

    #[test]
    fn create_get_list_flow() {
        let dir = tempfile::tempdir().expect("tempdir");
        let collection = authors(&dir);

        let created = collection
            .create(record(json!({"authorId": "a1", "name": "X"})))
            .expect("create");
        assert_eq!(created.get("name").unwrap(), "X");

        let fetched = collection.get("a1").expect("get");
        assert_eq!(fetched, created);

        collection
            .create(record(json!({"authorId": "a2"})))
            .expect("create");
        let ids: Vec<_> = collection
            .list()
            .expect("list")
            .iter()
            .map(|rec| rec.id("authorId").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn create_requires_identifier_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = authors(&dir)
            .create(record(json!({"name": "no id"})))
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(authors(&dir).list().expect("list").is_empty());
    }

    #[test]
    fn create_accepts_duplicate_identifiers() {
        // Documented quirk: uniqueness is not enforced on create.
        let dir = tempfile::tempdir().expect("tempdir");
        let collection = authors(&dir);
        collection
            .create(record(json!({"authorId": "a1", "name": "first"})))
            .expect("create");
        collection
            .create(record(json!({"authorId": "a1", "name": "second"})))
            .expect("create");
        assert_eq!(collection.list().expect("list").len(), 2);
        // get resolves to the first match in load order
        assert_eq!(collection.get("a1").expect("get").get("name").unwrap(), "first");
    }

    #[test]
    fn update_merges_shallowly_and_reports_missing_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let books = Collection::new(dir.path(), BOOKS);
        books
            .create(record(json!({"bookId": "b1", "title": "Old", "year": 2001})))
            .expect("create");

        let updated = books
            .update("b1", record(json!({"title": "New"})))
            .expect("update");
        assert_eq!(updated.get("title").unwrap(), "New");
        assert_eq!(updated.get("year").unwrap(), 2001);

        let err = books
            .update("missing", record(json!({"title": "New"})))
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let collection = authors(&dir);
        collection
            .create(record(json!({"authorId": "a1"})))
            .expect("create");

        collection.delete("a1").expect("delete");
        assert_eq!(collection.get("a1").expect_err("err").kind(), ErrorKind::NotFound);
        assert_eq!(
            collection.delete("a1").expect_err("err").kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn references_scans_an_arbitrary_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let books = Collection::new(dir.path(), BOOKS);
        books
            .create(record(json!({"bookId": "b1", "authorId": "a1"})))
            .expect("create");

        assert!(books.references("authorId", "a1").expect("scan"));
        assert!(!books.references("authorId", "a2").expect("scan"));
        assert!(!books.references("publisherId", "a1").expect("scan"));
    }
}
