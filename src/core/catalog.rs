// Cross-collection coordinator: the one place referential integrity lives.
use std::path::{Path, PathBuf};

use crate::core::collection::{AUTHORS, BOOKS, Collection, PUBLISHERS};
use crate::core::error::{Error, ErrorKind};
use crate::core::record::Record;

/// Owns the three entity collections and exposes one operation per
/// (entity, verb) pair. Book creation and author/publisher deletion are the
/// only operations with cross-collection rules; everything else delegates
/// straight to the collection.
#[derive(Clone, Debug)]
pub struct Catalog {
    data_dir: PathBuf,
    authors: Collection,
    books: Collection,
    publishers: Collection,
}

impl Catalog {
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let authors = Collection::new(&data_dir, AUTHORS);
        let books = Collection::new(&data_dir, BOOKS);
        let publishers = Collection::new(&data_dir, PUBLISHERS);
        Self {
            data_dir,
            authors,
            books,
            publishers,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Creates all three collection documents if absent.
    pub fn init(&self) -> Result<(), Error> {
        self.authors.ensure()?;
        self.books.ensure()?;
        self.publishers.ensure()
    }

    // Authors

    pub fn list_authors(&self) -> Result<Vec<Record>, Error> {
        self.authors.list()
    }

    pub fn get_author(&self, id: &str) -> Result<Record, Error> {
        self.authors.get(id)
    }

    pub fn create_author(&self, author: Record) -> Result<Record, Error> {
        self.authors.create(author)
    }

    pub fn update_author(&self, id: &str, partial: Record) -> Result<Record, Error> {
        self.authors.update(id, partial)
    }

    /// Existence is checked before the reference scan so a missing author
    /// reports NotFound rather than Conflict.
    pub fn delete_author(&self, id: &str) -> Result<(), Error> {
        self.authors.get(id)?;
        if self.books.references("authorId", id)? {
            return Err(Error::new(ErrorKind::Conflict)
                .with_message("author referenced by books")
                .with_id(id)
                .with_hint("Delete or reassign the referencing books first."));
        }
        self.authors.delete(id)
    }

    // Publishers

    pub fn list_publishers(&self) -> Result<Vec<Record>, Error> {
        self.publishers.list()
    }

    pub fn get_publisher(&self, id: &str) -> Result<Record, Error> {
        self.publishers.get(id)
    }

    pub fn create_publisher(&self, publisher: Record) -> Result<Record, Error> {
        self.publishers.create(publisher)
    }

    pub fn update_publisher(&self, id: &str, partial: Record) -> Result<Record, Error> {
        self.publishers.update(id, partial)
    }

    pub fn delete_publisher(&self, id: &str) -> Result<(), Error> {
        self.publishers.get(id)?;
        if self.books.references("publisherId", id)? {
            return Err(Error::new(ErrorKind::Conflict)
                .with_message("publisher referenced by books")
                .with_id(id)
                .with_hint("Delete or reassign the referencing books first."));
        }
        self.publishers.delete(id)
    }

    // Books

    pub fn list_books(&self) -> Result<Vec<Record>, Error> {
        self.books.list()
    }

    pub fn get_book(&self, id: &str) -> Result<Record, Error> {
        self.books.get(id)
    }

    /// Both foreign keys must resolve before anything is appended; a book
    /// payload without them fails the same way, since an absent key cannot
    /// reference an existing record.
    pub fn create_book(&self, book: Record) -> Result<Record, Error> {
        let author_exists = match book.id("authorId") {
            Some(author_id) => self.authors.references("authorId", author_id)?,
            None => false,
        };
        let publisher_exists = match book.id("publisherId") {
            Some(publisher_id) => self.publishers.references("publisherId", publisher_id)?,
            None => false,
        };
        if !author_exists || !publisher_exists {
            return Err(Error::new(ErrorKind::Reference)
                .with_message("author or publisher does not exist")
                .with_hint("Create the author and publisher before the book."));
        }
        self.books.create(book)
    }

    pub fn update_book(&self, id: &str, partial: Record) -> Result<Record, Error> {
        self.books.update(id, partial)
    }

    pub fn delete_book(&self, id: &str) -> Result<(), Error> {
        self.books.delete(id)
    }
}
