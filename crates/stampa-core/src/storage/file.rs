//! File-based storage implementation for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult, TemplateKey};
use crate::template::Template;
use std::fs;
use std::path::PathBuf;

/// File-based storage for native platforms.
///
/// Stores each template as a JSON file under
/// `<base>/<product_id>/<template_name>.json`.
pub struct FileStorage {
    /// Base directory for template storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/stampa/templates/`
    /// On Windows: `%LOCALAPPDATA%\stampa\templates\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        let path = base.join("stampa").join("templates");
        Self::new(path)
    }

    // Sanitize one path segment to be safe for filenames.
    fn sanitize(segment: &str) -> String {
        segment
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    /// Get the file path for a template key.
    fn template_path(&self, key: &TemplateKey) -> PathBuf {
        self.base_path
            .join(Self::sanitize(&key.product_id))
            .join(format!("{}.json", Self::sanitize(&key.template_name)))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &TemplateKey, template: &Template) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.template_path(key);
        let json = match template.save() {
            Ok(j) => j,
            Err(e) => {
                return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) })
            }
        };

        Box::pin(async move {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Io(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<Template>> {
        let path = self.template_path(key);
        let key = key.clone();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key.to_string()));
            }

            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;

            Template::load(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.template_path(key);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self, product_id: &str) -> BoxFuture<'_, StorageResult<Vec<TemplateKey>>> {
        let product_dir = self.base_path.join(Self::sanitize(product_id));
        let product_id = product_id.to_string();

        Box::pin(async move {
            if !product_dir.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&product_dir)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut keys = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                        keys.push(TemplateKey::new(product_id.clone(), name));
                    }
                }
            }
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.template_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}
