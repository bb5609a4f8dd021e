//! Storage abstraction for persisted templates.
//!
//! The engine treats saved templates as opaque JSON documents keyed by
//! product and template name; backends decide where those documents live.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::template::Template;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Template not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Identifies one saved template: the product it belongs to plus its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateKey {
    pub product_id: String,
    pub template_name: String,
}

impl TemplateKey {
    pub fn new(product_id: impl Into<String>, template_name: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            template_name: template_name.into(),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product_id, self.template_name)
    }
}

/// Trait for template storage backends.
///
/// Implementations can keep templates in memory, on the filesystem, or
/// behind a remote service.
pub trait Storage: Send + Sync {
    /// Save a template under a key.
    fn save(&self, key: &TemplateKey, template: &Template) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a template.
    fn load(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<Template>>;

    /// Delete a template.
    fn delete(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<()>>;

    /// List all keys for a product.
    fn list(&self, product_id: &str) -> BoxFuture<'_, StorageResult<Vec<TemplateKey>>>;

    /// Check if a template exists.
    fn exists(&self, key: &TemplateKey) -> BoxFuture<'_, StorageResult<bool>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
