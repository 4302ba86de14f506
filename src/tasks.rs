//! Task records and the store that backs the bubbles
//!
//! The scene treats the store as best-effort: it seeds bubbles from `list()`
//! on mount, and `create()`/`remove()` failures are only logged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned by the task store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub color: String,
    #[serde(default)]
    pub completed: bool,
}

/// A task about to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub label: String,
    pub x: i32,
    pub y: i32,
    pub color: String,
}

impl TaskDraft {
    pub fn into_record(self, id: TaskId) -> TaskRecord {
        TaskRecord {
            id,
            label: self.label,
            x: self.x,
            y: self.y,
            color: self.color,
            completed: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("task storage unavailable: {0}")]
    Storage(String),
    #[error("task data could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("task {0} not found")]
    NotFound(TaskId),
}

/// Task data source
pub trait TaskService {
    fn list(&mut self) -> Result<Vec<TaskRecord>, TaskServiceError>;
    fn create(&mut self, draft: &TaskDraft) -> Result<TaskId, TaskServiceError>;
    fn remove(&mut self, id: TaskId) -> Result<(), TaskServiceError>;
}

impl<T: TaskService> TaskService for std::rc::Rc<std::cell::RefCell<T>> {
    fn list(&mut self) -> Result<Vec<TaskRecord>, TaskServiceError> {
        self.borrow_mut().list()
    }

    fn create(&mut self, draft: &TaskDraft) -> Result<TaskId, TaskServiceError> {
        self.borrow_mut().create(draft)
    }

    fn remove(&mut self, id: TaskId) -> Result<(), TaskServiceError> {
        self.borrow_mut().remove(id)
    }
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    records: Vec<TaskRecord>,
    next_id: u64,
    /// Make `create`/`remove` fail, to exercise best-effort handling
    pub fail_writes: bool,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
            fail_writes: false,
        }
    }

    pub fn with_records(records: Vec<TaskRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        Self {
            records,
            next_id,
            fail_writes: false,
        }
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    /// Rebuild a store from its JSON list; an unreadable list starts empty
    /// so the next write replaces it
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(records) => Self::with_records(records),
            Err(e) => {
                log::warn!("Discarding unreadable task list: {}", e);
                Self::new()
            }
        }
    }

    fn check_writable(&self) -> Result<(), TaskServiceError> {
        if self.fail_writes {
            Err(TaskServiceError::Storage("writes disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TaskService for MemoryTaskStore {
    fn list(&mut self) -> Result<Vec<TaskRecord>, TaskServiceError> {
        Ok(self.records.clone())
    }

    fn create(&mut self, draft: &TaskDraft) -> Result<TaskId, TaskServiceError> {
        self.check_writable()?;
        let id = TaskId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.records.push(draft.clone().into_record(id));
        Ok(id)
    }

    fn remove(&mut self, id: TaskId) -> Result<(), TaskServiceError> {
        self.check_writable()?;
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(TaskServiceError::NotFound(id))?;
        self.records.remove(index);
        Ok(())
    }
}

/// LocalStorage-backed store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalTaskStore;

#[cfg(target_arch = "wasm32")]
impl LocalTaskStore {
    const STORAGE_KEY: &'static str = "bubble_galaxy_tasks";

    fn storage() -> Result<web_sys::Storage, TaskServiceError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| TaskServiceError::Storage("LocalStorage unavailable".to_string()))
    }

    fn read() -> Result<MemoryTaskStore, TaskServiceError> {
        let storage = Self::storage()?;
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => Ok(MemoryTaskStore::from_json(&json)),
            Ok(None) => Ok(MemoryTaskStore::new()),
            Err(e) => Err(TaskServiceError::Storage(format!("{:?}", e))),
        }
    }

    fn write(store: &MemoryTaskStore) -> Result<(), TaskServiceError> {
        let json = serde_json::to_string(store.records())?;
        Self::storage()?
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|e| TaskServiceError::Storage(format!("{:?}", e)))
    }
}

#[cfg(target_arch = "wasm32")]
impl TaskService for LocalTaskStore {
    fn list(&mut self) -> Result<Vec<TaskRecord>, TaskServiceError> {
        Ok(Self::read()?.records().to_vec())
    }

    fn create(&mut self, draft: &TaskDraft) -> Result<TaskId, TaskServiceError> {
        let mut store = Self::read()?;
        let id = store.create(draft)?;
        Self::write(&store)?;
        Ok(id)
    }

    fn remove(&mut self, id: TaskId) -> Result<(), TaskServiceError> {
        let mut store = Self::read()?;
        store.remove(id)?;
        Self::write(&store)
    }
}
