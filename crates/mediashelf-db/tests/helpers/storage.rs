use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mediashelf_storage::{Storage, StorageBackend, StorageError, StorageResult};

/// In-memory `Storage` that records every call and can be told to fail.
pub struct MemoryStorage {
    base_url: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStorage {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            objects: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Keys passed to `delete`, in call order, including failed calls.
    pub fn delete_calls(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(&self, storage_key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("simulated outage".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.deleted.lock().unwrap().push(storage_key.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("simulated outage".to_string()));
        }
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    fn resolve(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
