//! LazyGlobal - 一度だけ初期化されるグローバル値
//!
//! One entry of the store. Eager values are born resolved; lazy ones hold an
//! initializer until the first successful run.
//!
//! # 実行モデル
//! The initializer runs on its own tokio task. Callers only wait on a shared
//! handle to that task, so a caller that is cancelled or times out neither
//! aborts the run nor causes a second one. On success the task itself
//! records the value, even if every caller has gone away.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::domain::{FunctionError, Value};

/// Zero-argument computation producing a global's value.
pub type Initializer =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Value, FunctionError>> + Send + Sync>;

type Outcome = Result<Value, Arc<FunctionError>>;
type Run = Shared<BoxFuture<'static, Outcome>>;

tokio::task_local! {
    /// Keys whose initializers are running on this task or the tasks that
    /// started it.
    static RESOLVING: Arc<[String]>;
}

enum State {
    Resolved(Value),
    Pending {
        initializer: Initializer,
        running: Option<Run>,
    },
}

enum Step {
    Ready(Value),
    Wait(Run),
}

pub(crate) struct LazyGlobal {
    state: Mutex<State>,
}

impl LazyGlobal {
    pub(crate) fn resolved(value: Value) -> Self {
        Self {
            state: Mutex::new(State::Resolved(value)),
        }
    }

    pub(crate) fn pending(initializer: Initializer) -> Self {
        Self {
            state: Mutex::new(State::Pending {
                initializer,
                running: None,
            }),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        matches!(*self.lock(), State::Resolved(_))
    }

    /// Resolve the value, running the initializer at most once per success.
    ///
    /// Concurrent callers share one run. A failed run leaves the entry
    /// pending with its initializer, so the next caller retries. Must be
    /// called inside a tokio runtime.
    pub(crate) async fn resolve(this: &Arc<Self>, key: &str) -> Result<Value, FunctionError> {
        let run = match Self::step(this, key)? {
            Step::Ready(value) => return Ok(value),
            Step::Wait(run) => run,
        };
        run.await.map_err(|source| FunctionError::GlobalResolution {
            key: key.to_string(),
            source,
        })
    }

    fn step(this: &Arc<Self>, key: &str) -> Result<Step, FunctionError> {
        let mut state = this.lock();
        let (initializer, running) = match &mut *state {
            State::Resolved(value) => return Ok(Step::Ready(value.clone())),
            State::Pending {
                initializer,
                running,
            } => (initializer, running),
        };

        if resolving_here(key) {
            return Err(FunctionError::GlobalResolution {
                key: key.to_string(),
                source: Arc::new(FunctionError::configuration(format!(
                    "recursive initialization of `{key}`"
                ))),
            });
        }
        if let Some(run) = running.as_ref() {
            return Ok(Step::Wait(run.clone()));
        }

        let run = Self::start(this, key, Arc::clone(initializer));
        *running = Some(run.clone());
        Ok(Step::Wait(run))
    }

    fn start(this: &Arc<Self>, key: &str, initializer: Initializer) -> Run {
        let stack: Arc<[String]> = RESOLVING
            .try_with(|keys| keys.iter().cloned().chain([key.to_string()]).collect())
            .unwrap_or_else(|_| Arc::from(vec![key.to_string()]));

        tracing::debug!(global = key, "running lazy global initializer");
        let owner = Arc::clone(this);
        let task = tokio::spawn(RESOLVING.scope(stack, async move {
            let outcome: Outcome = initializer().await.map_err(Arc::new);
            owner.settle(&outcome);
            outcome
        }));

        // パニックした task は settle できないので、待っている側で片付ける
        let owner = Arc::clone(this);
        task.map(move |joined| {
            joined.unwrap_or_else(|err| {
                let outcome: Outcome = Err(Arc::new(FunctionError::invocation(err)));
                owner.settle(&outcome);
                outcome
            })
        })
        .boxed()
        .shared()
    }

    fn settle(&self, outcome: &Outcome) {
        let mut state = self.lock();
        match outcome {
            Ok(value) => *state = State::Resolved(value.clone()),
            Err(_) => {
                if let State::Pending { running, .. } = &mut *state {
                    *running = None;
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolving_here(key: &str) -> bool {
    RESOLVING
        .try_with(|keys| keys.iter().any(|k| k == key))
        .unwrap_or(false)
}
