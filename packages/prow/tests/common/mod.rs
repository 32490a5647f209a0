#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read};
use std::rc::Rc;

use bytes::Bytes;
use prow::{BlobStore, StorageError};
use prow::prow_core::{Job, JobType, ProwConfig};

pub const BUCKET: &str = "knative-prow";

/// In-memory blob store that tracks reader lifetimes and can inject failures.
#[derive(Default)]
pub struct FakeStore {
    objects: RefCell<BTreeMap<String, Vec<u8>>>,
    /// Paths whose reader fails after yielding this many bytes.
    read_failures: RefCell<BTreeMap<String, usize>>,
    failing_exists: RefCell<BTreeSet<String>>,
    fail_listing: Cell<bool>,
    pub opened: Rc<Cell<usize>>,
    pub released: Rc<Cell<usize>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, contents: impl AsRef<[u8]>) -> &Self {
        self.objects
            .borrow_mut()
            .insert(path.to_string(), contents.as_ref().to_vec());
        self
    }

    pub fn fail_read_after(&self, path: &str, bytes: usize) {
        self.read_failures.borrow_mut().insert(path.to_string(), bytes);
    }

    pub fn fail_exists(&self, path: &str) {
        self.failing_exists.borrow_mut().insert(path.to_string());
    }

    pub fn fail_listing(&self) {
        self.fail_listing.set(true);
    }

    fn key(bucket: &str, path: &str) -> String {
        // Buckets other than BUCKET are empty.
        if bucket == BUCKET {
            path.to_string()
        } else {
            format!("\0{bucket}/{path}")
        }
    }

    fn not_found(bucket: &str, path: &str) -> StorageError {
        StorageError::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    }
}

pub struct FakeReader {
    data: io::Cursor<Vec<u8>>,
    fail_at: Option<usize>,
    released: Rc<Cell<usize>>,
}

impl Read for FakeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.data.position() as usize;
        if let Some(fail_at) = self.fail_at {
            if pos >= fail_at {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream reset"));
            }
            let limit = (fail_at - pos).min(buf.len());
            return self.data.read(&mut buf[..limit]);
        }
        self.data.read(buf)
    }
}

impl Drop for FakeReader {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

impl BlobStore for FakeStore {
    type Reader = FakeReader;

    fn exists(&self, bucket: &str, path: &str) -> Result<bool, StorageError> {
        if self.failing_exists.borrow().contains(path) {
            return Err(StorageError::Io(io::Error::other("exists failed")));
        }
        Ok(self.objects.borrow().contains_key(&Self::key(bucket, path)))
    }

    fn read_bytes(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        self.objects
            .borrow()
            .get(&Self::key(bucket, path))
            .map(|data| Bytes::from(data.clone()))
            .ok_or_else(|| Self::not_found(bucket, path))
    }

    fn list_direct_children(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        if self.fail_listing.get() {
            return Err(StorageError::Io(io::Error::other("listing failed")));
        }
        let scope = format!("{}/", Self::key(bucket, prefix));
        let children: BTreeSet<String> = self
            .objects
            .borrow()
            .keys()
            .filter_map(|key| key.strip_prefix(&scope))
            .map(|rest| {
                let child = rest.split('/').next().unwrap_or(rest);
                if rest.contains('/') {
                    format!("{prefix}/{child}/")
                } else {
                    format!("{prefix}/{child}")
                }
            })
            .collect();
        // Listing order is not guaranteed; hand children back reversed.
        Ok(children.into_iter().rev().collect())
    }

    fn open_reader(&self, bucket: &str, path: &str) -> Result<FakeReader, StorageError> {
        let data = self
            .objects
            .borrow()
            .get(&Self::key(bucket, path))
            .cloned()
            .ok_or_else(|| Self::not_found(bucket, path))?;
        self.opened.set(self.opened.get() + 1);
        Ok(FakeReader {
            data: io::Cursor::new(data),
            fail_at: self.read_failures.borrow().get(path).copied(),
            released: self.released.clone(),
        })
    }
}

pub fn periodic_job(name: &str) -> Job {
    Job::new(&ProwConfig::default(), name, JobType::Periodic, None, 0).unwrap()
}

pub fn started_json(timestamp: i64) -> String {
    format!(r#"{{"timestamp": {timestamp}, "node": "node-{timestamp}", "repos": {{"knative/serving": "master"}}}}"#)
}

pub fn finished_json(timestamp: i64, passed: bool) -> String {
    format!(r#"{{"timestamp": {timestamp}, "passed": {passed}, "job-version": "v1", "metadata": {{}}}}"#)
}

/// Seed a finished build; `started` of `None` leaves `started.json` out.
pub fn add_finished_build(store: &FakeStore, job: &Job, id: u64, started: Option<i64>) {
    let build = job.new_build(id);
    if let Some(ts) = started {
        store.put(&build.started_path(), started_json(ts));
    }
    store.put(&build.finished_path(), finished_json(started.unwrap_or(0) + 60, true));
}
