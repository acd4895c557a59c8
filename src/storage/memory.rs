use std::{cell::RefCell, collections::HashMap};

use crate::storage::{Storage, StorageError};

/// Storage that lives and dies with the process
#[derive(Default)]
pub struct MemoryStorage {
    documents: RefCell<HashMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.documents.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        self.documents
            .borrow_mut()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}
