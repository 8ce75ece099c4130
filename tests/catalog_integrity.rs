// End-to-end integrity coverage over the public client surface.
use folio::api::{ErrorKind, LocalClient, Record};
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    Record::from_value(value).expect("record")
}

#[test]
fn create_author_publisher_then_book() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = LocalClient::new()
        .with_data_dir(temp.path())
        .init()
        .expect("init");

    let author = catalog
        .create_author(record(json!({"authorId": "a1", "name": "X"})))
        .expect("author");
    assert_eq!(author.get("name").unwrap(), "X");

    catalog
        .create_publisher(record(json!({"publisherId": "p1"})))
        .expect("publisher");

    let book = record(json!({"bookId": "b1", "authorId": "a1", "publisherId": "p1"}));
    let created = catalog.create_book(book.clone()).expect("book");
    assert_eq!(created, book);
}

#[test]
fn missing_reference_leaves_books_unchanged() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = LocalClient::new()
        .with_data_dir(temp.path())
        .init()
        .expect("init");
    catalog
        .create_author(record(json!({"authorId": "a1"})))
        .expect("author");
    catalog
        .create_publisher(record(json!({"publisherId": "p1"})))
        .expect("publisher");
    catalog
        .create_book(record(
            json!({"bookId": "b1", "authorId": "a1", "publisherId": "p1"}),
        ))
        .expect("book");

    let err = catalog
        .create_book(record(
            json!({"bookId": "b2", "authorId": "missing", "publisherId": "p1"}),
        ))
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Reference);

    let ids: Vec<_> = catalog
        .list_books()
        .expect("list")
        .iter()
        .map(|book| book.id("bookId").unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["b1"]);
}

#[test]
fn delete_author_blocked_then_allowed() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = LocalClient::new()
        .with_data_dir(temp.path())
        .init()
        .expect("init");
    catalog
        .create_author(record(json!({"authorId": "a1"})))
        .expect("author");
    catalog
        .create_publisher(record(json!({"publisherId": "p1"})))
        .expect("publisher");
    catalog
        .create_book(record(
            json!({"bookId": "b1", "authorId": "a1", "publisherId": "p1"}),
        ))
        .expect("book");

    let err = catalog.delete_author("a1").expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(catalog.list_authors().expect("list").len(), 1);

    catalog.delete_book("b1").expect("delete book");
    catalog.delete_author("a1").expect("delete author");
    assert_eq!(
        catalog.get_author("a1").expect_err("err").kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn update_of_missing_book_is_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = LocalClient::new()
        .with_data_dir(temp.path())
        .init()
        .expect("init");

    let err = catalog
        .update_book("b1", record(json!({"title": "New"})))
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_with_current_values_is_idempotent() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = LocalClient::new()
        .with_data_dir(temp.path())
        .init()
        .expect("init");
    catalog
        .create_author(record(json!({"authorId": "a1", "name": "X", "country": "PE"})))
        .expect("author");

    let partial = record(json!({"name": "X"}));
    let once = catalog.update_author("a1", partial.clone()).expect("update");
    let twice = catalog.update_author("a1", partial).expect("update");
    assert_eq!(once, twice);
    assert_eq!(twice.get("country").unwrap(), "PE");
}

#[test]
fn collections_are_independent_documents() {
    let temp = tempfile::tempdir().expect("tempdir");
    let catalog = LocalClient::new()
        .with_data_dir(temp.path())
        .init()
        .expect("init");
    catalog
        .create_author(record(json!({"authorId": "a1"})))
        .expect("author");

    let authors_doc = std::fs::read_to_string(temp.path().join("authors.json")).expect("read");
    let books_doc = std::fs::read_to_string(temp.path().join("books.json")).expect("read");
    assert!(authors_doc.contains("a1"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&books_doc).expect("json"),
        json!({ "books": [] })
    );
}
