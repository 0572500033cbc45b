//! Realm: heap, shapes, intrinsics and the global scope.

use std::rc::Rc;
use std::sync::Arc;

use async_runtime::{
    JobQueue, ModuleLoader, ModuleRegistry, RecordingTracker, RejectionOperation, RejectionTracker,
};
use core_types::{ErrorKind, ObjectId, Value};
use object_model::{Heap, ObjectClass, ShapeTable};
use rustc_hash::FxHashMap;

use crate::scope::{Scope, ScopeRef};

/// Payload of error objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ErrorData {
    pub kind: ErrorKind,
}

/// Prototype objects every realm starts with.
#[derive(Debug)]
pub(crate) struct Intrinsics {
    pub object_prototype: ObjectId,
    pub function_prototype: ObjectId,
    pub array_prototype: ObjectId,
    pub iterator_prototype: ObjectId,
    pub array_iterator_prototype: ObjectId,
    pub generator_prototype: ObjectId,
    pub async_generator_prototype: ObjectId,
    pub promise_prototype: ObjectId,
    pub string_prototype: ObjectId,
    pub number_prototype: ObjectId,
    pub boolean_prototype: ObjectId,
    pub symbol_prototype: ObjectId,
    pub error_prototypes: FxHashMap<ErrorKind, ObjectId>,
}

const ERROR_KINDS: [ErrorKind; 7] = [
    ErrorKind::Error,
    ErrorKind::SyntaxError,
    ErrorKind::TypeError,
    ErrorKind::ReferenceError,
    ErrorKind::RangeError,
    ErrorKind::EvalError,
    ErrorKind::URIError,
];

impl Intrinsics {
    fn new(heap: &mut Heap, shapes: &ShapeTable) -> Self {
        let object_prototype = heap.create_object_with_shape(shapes.root(None), ObjectClass::Ordinary);
        let mut derive = |parent: ObjectId| {
            heap.create_object_with_shape(shapes.root(Some(parent)), ObjectClass::Ordinary)
        };
        let function_prototype = derive(object_prototype);
        let array_prototype = derive(object_prototype);
        let iterator_prototype = derive(object_prototype);
        let array_iterator_prototype = derive(iterator_prototype);
        let generator_prototype = derive(iterator_prototype);
        let async_generator_prototype = derive(object_prototype);
        let promise_prototype = derive(object_prototype);
        let string_prototype = derive(object_prototype);
        let number_prototype = derive(object_prototype);
        let boolean_prototype = derive(object_prototype);
        let symbol_prototype = derive(object_prototype);
        let error_prototype = derive(object_prototype);
        let mut error_prototypes = FxHashMap::default();
        error_prototypes.insert(ErrorKind::Error, error_prototype);
        for kind in ERROR_KINDS.into_iter().skip(1) {
            error_prototypes.insert(kind, derive(error_prototype));
        }
        Self {
            object_prototype,
            function_prototype,
            array_prototype,
            iterator_prototype,
            array_iterator_prototype,
            generator_prototype,
            async_generator_prototype,
            promise_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            symbol_prototype,
            error_prototypes,
        }
    }

    /// Prototype of errors of `kind`.
    pub(crate) fn error_prototype(&self, kind: ErrorKind) -> ObjectId {
        self.error_prototypes
            .get(&kind)
            .copied()
            .unwrap_or(self.object_prototype)
    }

    /// All error kinds with their prototypes, `Error` first.
    pub(crate) fn error_kinds(&self) -> impl Iterator<Item = (ErrorKind, ObjectId)> + '_ {
        ERROR_KINDS
            .into_iter()
            .map(move |kind| (kind, self.error_prototype(kind)))
    }
}

/// Where rejection reports go.
pub(crate) enum Tracker {
    /// Built-in recorder
    Recording(RecordingTracker),
    /// Installed by the host
    Custom(Box<dyn RejectionTracker>),
}

impl Tracker {
    pub(crate) fn track(&mut self, promise: ObjectId, operation: RejectionOperation, reason: &Value) {
        match self {
            Tracker::Recording(tracker) => tracker.track(promise, operation, reason),
            Tracker::Custom(tracker) => tracker.track(promise, operation, reason),
        }
    }

    pub(crate) fn unhandled(&self) -> Vec<ObjectId> {
        match self {
            Tracker::Recording(tracker) => tracker.unhandled(),
            Tracker::Custom(_) => Vec::new(),
        }
    }
}

/// Everything one isolated global environment owns.
pub(crate) struct Realm {
    pub heap: Heap,
    pub shapes: Arc<ShapeTable>,
    pub intrinsics: Intrinsics,
    pub global: ScopeRef,
    pub jobs: JobQueue,
    pub tracker: Tracker,
    /// Resolves `import()` specifiers
    pub modules: Box<dyn ModuleLoader>,
    /// Liveness token cloned into every scope
    pub live: Rc<()>,
}

impl Realm {
    pub(crate) fn new(shapes: Arc<ShapeTable>) -> Self {
        let mut heap = Heap::new();
        let intrinsics = Intrinsics::new(&mut heap, &shapes);
        let live = Rc::new(());
        let global = Scope::new(None, &live);
        Self {
            heap,
            shapes,
            intrinsics,
            global,
            jobs: JobQueue::new(),
            tracker: Tracker::Recording(RecordingTracker::new()),
            modules: Box::new(ModuleRegistry::new()),
            live,
        }
    }

    /// Intrinsic prototype used for property lookups on a primitive.
    pub(crate) fn primitive_prototype(&self, value: &Value) -> Option<ObjectId> {
        let intrinsics = &self.intrinsics;
        match value {
            Value::String(_) => Some(intrinsics.string_prototype),
            Value::Smi(_) | Value::Double(_) => Some(intrinsics.number_prototype),
            Value::Boolean(_) => Some(intrinsics.boolean_prototype),
            Value::Symbol(_) => Some(intrinsics.symbol_prototype),
            _ => None,
        }
    }

    /// Number of scopes currently alive.
    pub(crate) fn live_scopes(&self) -> usize {
        Rc::strong_count(&self.live) - 1
    }
}
