//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult, TemplateKey};
use crate::template::Template;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory storage for testing and ephemeral use.
///
/// Templates live in a key-ordered map, so [`Storage::list`] comes back
/// sorted without extra work.
#[derive(Default)]
pub struct MemoryStorage {
    templates: RwLock<BTreeMap<TemplateKey, Template>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored templates across all products.
    pub fn len(&self) -> usize {
        self.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, BTreeMap<TemplateKey, Template>>> {
        self.templates
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, BTreeMap<TemplateKey, Template>>> {
        self.templates
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &TemplateKey, template: &Template) -> BoxFuture<'_, StorageResult<()>> {
        let (key, template) = (key.clone(), template.clone());
        Box::pin(async move {
            self.write()?.insert(key, template);
            Ok(())
        })
    }

    fn load(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<Template>> {
        let key = key.clone();
        Box::pin(async move {
            self.read()?
                .get(&key)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(key.to_string()))
        })
    }

    fn delete(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.clone();
        Box::pin(async move {
            self.write()?.remove(&key);
            Ok(())
        })
    }

    fn list(&self, product_id: &str) -> BoxFuture<'_, StorageResult<Vec<TemplateKey>>> {
        let product_id = product_id.to_string();
        Box::pin(async move {
            // BTreeMap iteration is already key-ordered.
            Ok(self
                .read()?
                .keys()
                .filter(|k| k.product_id == product_id)
                .cloned()
                .collect())
        })
    }

    fn exists(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<bool>> {
        let key = key.clone();
        Box::pin(async move { Ok(self.read()?.contains_key(&key)) })
    }
}
