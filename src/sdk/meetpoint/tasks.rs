use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use super::pipeline::MeetpointService;
use super::result::{MeetpointRequest, MeetpointResult};
use crate::sdk::routing::error::MeetpointError;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    Pending,
    Running,
    Done(MeetpointResult),
    Failed(String),
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Done(_) | TaskStatus::Failed(_))
    }
}

/// Runs meet-point searches in the background, keyed by request id.
#[derive(Clone)]
pub struct MeetpointTasks {
    service: Arc<MeetpointService>,
    statuses: Arc<Mutex<HashMap<String, TaskStatus>>>,
}

impl MeetpointTasks {
    pub fn new(service: Arc<MeetpointService>) -> Self {
        Self {
            service,
            statuses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts a search unless one with the same id is still queued or
    /// running. A finished id may be resubmitted.
    pub fn submit(
        &self,
        id: impl Into<String>,
        request: MeetpointRequest,
    ) -> Result<JoinHandle<()>, MeetpointError> {
        let id = id.into();
        {
            let mut statuses = self.lock();
            if statuses.get(&id).is_some_and(|s| !s.is_finished()) {
                return Err(MeetpointError::InvalidInput(format!(
                    "task '{}' is already in progress",
                    id
                )));
            }
            statuses.insert(id.clone(), TaskStatus::Pending);
        }

        let service = Arc::clone(&self.service);
        let statuses = Arc::clone(&self.statuses);
        let handle = thread::spawn(move || {
            set_status(&statuses, &id, TaskStatus::Running);
            let status = match service.compute_best_meetpoint(&request) {
                Ok(result) => TaskStatus::Done(result),
                Err(e) => {
                    log::error!("Meet point task '{}' failed: {}", id, e);
                    TaskStatus::Failed(e.to_string())
                }
            };
            set_status(&statuses, &id, status);
        });
        Ok(handle)
    }

    pub fn status(&self, id: &str) -> Option<TaskStatus> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TaskStatus>> {
        self.statuses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn set_status(statuses: &Mutex<HashMap<String, TaskStatus>>, id: &str, status: TaskStatus) {
    statuses
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(id.to_string(), status);
}
