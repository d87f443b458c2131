//! In-memory object store

use anyhow::{Result, anyhow};
use dbx_provision::aws::ObjectStore;
use dbx_provision_common::ObjectRef;
use std::collections::HashMap;
use std::sync::Mutex;

/// Objects keyed by `s3://bucket/key`; missing objects fail like `NoSuchKey`
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, String>>,
    reads: Mutex<Vec<String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, url: &str, content: &str) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(url.to_string(), content.to_string());
        self
    }

    /// Every object read so far, as `s3://` URLs
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl ObjectStore for InMemoryObjectStore {
    async fn get_object_text(&self, object: &ObjectRef) -> Result<String> {
        let url = object.to_string();
        self.reads.lock().unwrap().push(url.clone());
        self.objects
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .ok_or_else(|| anyhow!("NoSuchKey: {url}"))
    }
}
