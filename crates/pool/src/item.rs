//! Units of work and their results

use futures::future::BoxFuture;
use porygo_core::Result;
use std::fmt;
use std::future::Future;

type Job<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T>> + Send>;

/// One submittable unit of work, tagged with the resource it belongs to
pub struct WorkItem<T> {
    label: String,
    job: Job<T>,
}

impl<T> WorkItem<T> {
    pub fn new<F, Fut>(label: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            label: label.into(),
            job: Box::new(move || Box::pin(job())),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_parts(self) -> (String, Job<T>) {
        (self.label, self.job)
    }
}

impl<T> fmt::Debug for WorkItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// The result of running one [`WorkItem`]
#[derive(Debug)]
pub struct WorkOutput<T> {
    pub label: String,
    pub result: Result<T>,
}
