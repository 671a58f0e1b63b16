//! JavaScript evaluation for desktop-webview windows
//!
//! Scripts submitted to a window are evaluated one at a time, in submission
//! order, against an engine that only tolerates access from the UI thread.
//! Every request gets exactly one reply:
//! - the engine result encoded as a string (see [`JsValue::encode`]),
//! - `eval_failed` when the engine reports an error or exception,
//! - `window_closed` when the window goes away while the request is queued,
//! - `window_destroyed` when it goes away while the request is in flight.
//!
//! The toolkit is kept behind the [`ScriptEngine`] and [`Scheduler`] traits so
//! the queue can be driven by GTK in production and by a manual loop in tests.

mod engine;
mod error;
mod queue;
mod reply;
mod serializer;
mod value;

pub use engine::{EvalCallback, Scheduler, ScriptEngine};
pub use error::{EngineError, EvalError, EvalOutcome};
pub use queue::{EvalQueue, PendingEval, QueueState, Submission};
pub use reply::ReplyHandle;
pub use serializer::{EvalSender, EvalSerializer};
pub use value::{JsValue, format_number};
