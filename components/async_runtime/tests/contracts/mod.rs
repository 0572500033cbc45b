//! Contract tests for async_runtime
//!
//! The interpreter drives these types through the `JobHost` hook.

use async_runtime::{
    drain_all, Handler, Job, JobHost, JobQueue, ModuleLoader, ModuleRegistry, PromiseReaction,
    PromiseRecord, ReactionKind, RecordingTracker, RejectionOperation, RejectionTracker,
};
use core_types::{ObjectId, Value};

struct Host {
    jobs: JobQueue,
    promise: PromiseRecord,
    log: Vec<String>,
}

impl JobHost for Host {
    type Error = String;

    fn job_queue(&mut self) -> &mut JobQueue {
        &mut self.jobs
    }

    fn run_job(&mut self, job: Job) -> Result<(), String> {
        match job {
            Job::Reaction { reaction, argument } => {
                self.log.push(format!("{:?}:{}", reaction.kind, argument));
                Ok(())
            }
            Job::ResolveThenable { .. } => Err("unexpected thenable".to_string()),
            Job::DynamicImport { specifier, promise } => {
                self.log.push(format!("import:{}:{}", specifier, promise.0));
                Ok(())
            }
        }
    }
}

#[test]
fn then_on_settled_promise_is_deferred_to_the_queue() {
    let mut host = Host {
        jobs: JobQueue::new(),
        promise: PromiseRecord::new(),
        log: Vec::new(),
    };
    host.promise.fulfill(Value::Smi(7));
    let due = host.promise.add_reactions(
        PromiseReaction::new(ReactionKind::Fulfill, Handler::PassThrough, None),
        PromiseReaction::new(ReactionKind::Reject, Handler::PassThrough, None),
    );
    assert!(host.log.is_empty());
    if let Some((reaction, argument)) = due {
        host.jobs.enqueue(Job::Reaction { reaction, argument });
    }
    assert!(host.log.is_empty());
    assert_eq!(drain_all(&mut host), Ok(1));
    assert_eq!(host.log, vec!["Fulfill:7".to_string()]);
}

#[test]
fn drain_stops_at_first_error() {
    let mut host = Host {
        jobs: JobQueue::new(),
        promise: PromiseRecord::new(),
        log: Vec::new(),
    };
    host.jobs.enqueue(Job::ResolveThenable {
        promise: ObjectId(0),
        thenable: Value::Undefined,
        then: Value::Undefined,
    });
    host.jobs.enqueue(Job::Reaction {
        reaction: PromiseReaction::new(ReactionKind::Reject, Handler::PassThrough, None),
        argument: Value::Null,
    });
    assert!(drain_all(&mut host).is_err());
    assert_eq!(host.jobs.len(), 1);
}

#[test]
fn tracker_is_object_safe() {
    let mut tracker: Box<dyn RejectionTracker> = Box::new(RecordingTracker::new());
    tracker.track(ObjectId(3), RejectionOperation::Reject, &Value::string("e"));
}

#[test]
fn dynamic_import_jobs_share_the_fifo_with_reactions() {
    let mut host = Host {
        jobs: JobQueue::new(),
        promise: PromiseRecord::new(),
        log: Vec::new(),
    };
    host.jobs.enqueue(Job::DynamicImport {
        specifier: "./a.js".to_string(),
        promise: ObjectId(4),
    });
    host.jobs.enqueue(Job::Reaction {
        reaction: PromiseReaction::new(ReactionKind::Fulfill, Handler::PassThrough, None),
        argument: Value::Smi(1),
    });
    assert_eq!(drain_all(&mut host), Ok(2));
    assert_eq!(host.log, vec!["import:./a.js:4".to_string(), "Fulfill:1".to_string()]);
}

#[test]
fn loader_is_object_safe() {
    let mut registry = ModuleRegistry::new();
    registry.register("m", Value::Smi(1));
    let mut loader: Box<dyn ModuleLoader> = Box::new(registry);
    assert_eq!(loader.load("m"), Ok(Value::Smi(1)));
    assert!(loader.load("n").is_err());
}
