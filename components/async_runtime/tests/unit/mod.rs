//! Unit tests for async_runtime

use async_runtime::{
    AsyncGeneratorQueue, AsyncGeneratorRequest, AsyncGeneratorState, CompletionKind, Handler,
    Job, JobQueue, PromiseReaction, PromiseRecord, PromiseState, ReactionKind,
};
use core_types::{ObjectId, Value};

fn pair(capability: u32) -> (PromiseReaction, PromiseReaction) {
    (
        PromiseReaction::new(
            ReactionKind::Fulfill,
            Handler::Callable(Value::Object(ObjectId(100))),
            Some(ObjectId(capability)),
        ),
        PromiseReaction::new(ReactionKind::Reject, Handler::PassThrough, Some(ObjectId(capability))),
    )
}

#[test]
fn test_second_settlement_is_noop() {
    let mut promise = PromiseRecord::new();
    let (f, r) = pair(1);
    promise.add_reactions(f, r);
    let first = promise.fulfill(Value::Smi(1));
    let second = promise.fulfill(Value::Smi(2));
    let third = promise.reject(Value::Smi(3));
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert!(third.is_empty());
    assert_eq!(promise.result(), &Value::Smi(1));
    assert_eq!(promise.state(), PromiseState::Fulfilled);
}

#[test]
fn test_reactions_keep_registration_order() {
    let mut promise = PromiseRecord::new();
    for capability in 1..=3 {
        let (f, r) = pair(capability);
        promise.add_reactions(f, r);
    }
    let due: Vec<u32> = promise
        .reject(Value::Null)
        .into_iter()
        .filter_map(|r| r.capability.map(|c| c.0))
        .collect();
    assert_eq!(due, vec![1, 2, 3]);
}

#[test]
fn test_job_queue_is_fifo() {
    let mut queue = JobQueue::new();
    queue.enqueue(Job::ResolveThenable {
        promise: ObjectId(1),
        thenable: Value::Object(ObjectId(2)),
        then: Value::Object(ObjectId(3)),
    });
    let (f, _) = pair(4);
    queue.enqueue(Job::Reaction {
        reaction: f,
        argument: Value::Undefined,
    });
    assert!(matches!(queue.dequeue(), Some(Job::ResolveThenable { .. })));
    assert!(matches!(queue.dequeue(), Some(Job::Reaction { .. })));
    assert!(queue.dequeue().is_none());
}

#[test]
fn test_async_generator_queue_head_stays_until_completed() {
    let mut queue = AsyncGeneratorQueue::new();
    queue.enqueue(AsyncGeneratorRequest {
        kind: CompletionKind::Next,
        value: Value::Undefined,
        promise: ObjectId(1),
    });
    queue.set_state(AsyncGeneratorState::Executing);
    assert_eq!(queue.head().map(|r| r.promise), Some(ObjectId(1)));
    assert_eq!(queue.head().map(|r| r.promise), Some(ObjectId(1)));
    queue.complete_head();
    assert!(queue.head().is_none());
}
