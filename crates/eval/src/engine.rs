//! Seams between the serializer and the UI toolkit

use std::rc::Rc;

use crate::error::EngineError;
use crate::value::JsValue;

/// Completion callback handed to [`ScriptEngine::evaluate`]
pub type EvalCallback = Box<dyn FnOnce(Result<JsValue, EngineError>) + 'static>;

/// A web engine that evaluates scripts asynchronously.
///
/// Engines are single-threaded: `evaluate` is only called on the UI thread
/// and the callback must fire exactly once, on the same thread.
pub trait ScriptEngine {
    fn evaluate(&self, script: &str, on_complete: EvalCallback);
}

impl<E: ScriptEngine + ?Sized> ScriptEngine for Rc<E> {
    fn evaluate(&self, script: &str, on_complete: EvalCallback) {
        (**self).evaluate(script, on_complete)
    }
}

/// Runs tasks later on the UI thread.
pub trait Scheduler {
    fn defer(&self, task: Box<dyn FnOnce() + 'static>);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn defer(&self, task: Box<dyn FnOnce() + 'static>) {
        (**self).defer(task)
    }
}
