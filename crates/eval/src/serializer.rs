//! UI-thread driver that runs queued scripts one at a time
//!
//! `EvalSerializer` lives on the UI thread and owns the engine. Each
//! completion delivers exactly one reply, then hops back onto the UI thread
//! through the [`Scheduler`] before the next script is dispatched.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::engine::{ScriptEngine, Scheduler};
use crate::error::{EvalError, EvalOutcome};
use crate::queue::{EvalQueue, PendingEval, Submission};
use crate::reply::ReplyHandle;

/// Serializes evaluation requests against a single-threaded engine
pub struct EvalSerializer<E, S, H: ReplyHandle> {
    queue: Arc<EvalQueue<H>>,
    engine: E,
    scheduler: S,
    kick_tx: mpsc::UnboundedSender<()>,
    kick_rx: RefCell<Option<mpsc::UnboundedReceiver<()>>>,
}

impl<E, S, H> EvalSerializer<E, S, H>
where
    E: ScriptEngine + 'static,
    S: Scheduler + 'static,
    H: ReplyHandle,
{
    pub fn new(engine: E, scheduler: S) -> Rc<Self> {
        let (kick_tx, kick_rx) = mpsc::unbounded_channel();
        Rc::new(Self {
            queue: Arc::new(EvalQueue::new()),
            engine,
            scheduler,
            kick_tx,
            kick_rx: RefCell::new(Some(kick_rx)),
        })
    }

    /// Submit from the UI thread.
    pub fn submit(self: &Rc<Self>, script: impl Into<String>, handle: H) -> Submission {
        let submission = self.queue.submit(script, handle);
        if submission == Submission::Start {
            self.schedule_next();
        }
        submission
    }

    /// Submit from the UI thread and receive the outcome on a channel.
    pub fn evaluate(self: &Rc<Self>, script: impl Into<String>) -> oneshot::Receiver<EvalOutcome>
    where
        H: From<oneshot::Sender<EvalOutcome>>,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(script, H::from(tx));
        rx
    }

    /// Handle for submitting from other threads.
    ///
    /// Submissions through it are only processed while the future returned
    /// by [`kick_listener`](Self::kick_listener) runs on the UI thread.
    pub fn sender(&self) -> EvalSender<H> {
        EvalSender {
            queue: Arc::clone(&self.queue),
            kick: self.kick_tx.clone(),
        }
    }

    /// Future that starts processing whenever another thread submits to an
    /// idle queue. Available once; spawn it on the UI thread's executor.
    pub fn kick_listener(self: &Rc<Self>) -> Option<impl Future<Output = ()> + use<E, S, H>> {
        let mut kicks = self.kick_rx.borrow_mut().take()?;
        let serializer = Rc::downgrade(self);
        Some(async move {
            while kicks.recv().await.is_some() {
                let Some(serializer) = serializer.upgrade() else {
                    break;
                };
                serializer.process_next();
            }
            tracing::trace!("Evaluation kick listener finished");
        })
    }

    fn schedule_next(self: &Rc<Self>) {
        let serializer = Rc::downgrade(self);
        self.scheduler.defer(Box::new(move || {
            if let Some(serializer) = serializer.upgrade() {
                serializer.process_next();
            }
        }));
    }

    /// Dispatch the head of the queue to the engine, or go idle if empty.
    pub fn process_next(self: &Rc<Self>) {
        let Some(PendingEval { script, handle }) = self.queue.take_next() else {
            tracing::trace!("Evaluation queue drained");
            return;
        };

        let liveness = self.queue.liveness();
        let serializer = Rc::downgrade(self);
        tracing::debug!(script_len = script.len(), "Dispatching script to engine");

        self.engine.evaluate(
            &script,
            Box::new(move |result| {
                if liveness.is_cancelled() {
                    tracing::warn!("Evaluation completed after window was destroyed");
                    handle.reply(Err(EvalError::WindowDestroyed));
                    return;
                }

                let outcome = result
                    .map(|value| value.encode())
                    .map_err(EvalError::from);
                if let Err(err) = &outcome {
                    tracing::warn!("JavaScript evaluation failed: {}", err);
                }
                handle.reply(outcome);

                if let Some(serializer) = serializer.upgrade() {
                    serializer.schedule_next();
                }
            }),
        );
    }

    pub fn queue(&self) -> &Arc<EvalQueue<H>> {
        &self.queue
    }
}

impl<E, S, H: ReplyHandle> EvalSerializer<E, S, H> {
    /// Invalidate and fail everything still queued. Returns the number of
    /// requests failed with `WindowClosed`.
    pub fn close(&self) -> usize {
        self.queue.close()
    }
}

impl<E, S, H: ReplyHandle> Drop for EvalSerializer<E, S, H> {
    fn drop(&mut self) {
        let drained = self.queue.close();
        if drained > 0 {
            tracing::debug!(drained, "Failed queued evaluations on teardown");
        }
    }
}

/// Cross-thread submission handle for an [`EvalSerializer`]
pub struct EvalSender<H> {
    queue: Arc<EvalQueue<H>>,
    kick: mpsc::UnboundedSender<()>,
}

impl<H> Clone for EvalSender<H> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            kick: self.kick.clone(),
        }
    }
}

impl<H: ReplyHandle> EvalSender<H> {
    pub fn submit(&self, script: impl Into<String>, handle: H) -> Submission {
        let submission = self.queue.submit(script, handle);
        if submission == Submission::Start && self.kick.send(()).is_err() {
            // Nobody is left on the UI thread to run the queue.
            tracing::warn!("Evaluation kick listener is gone, closing queue");
            self.queue.close();
        }
        submission
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EvalCallback;
    use crate::error::{EngineError, EvalOutcome};
    use crate::queue::QueueState;
    use crate::value::JsValue;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    /// Engine that records scripts and completes them on demand
    #[derive(Default)]
    struct FakeEngine {
        scripts: RefCell<Vec<String>>,
        pending: RefCell<VecDeque<EvalCallback>>,
    }

    impl ScriptEngine for FakeEngine {
        fn evaluate(&self, script: &str, on_complete: EvalCallback) {
            self.scripts.borrow_mut().push(script.to_string());
            self.pending.borrow_mut().push_back(on_complete);
        }
    }

    impl FakeEngine {
        fn complete(&self, result: Result<JsValue, EngineError>) {
            let callback = self
                .pending
                .borrow_mut()
                .pop_front()
                .expect("no evaluation in flight");
            callback(result);
        }

        fn in_flight(&self) -> usize {
            self.pending.borrow().len()
        }

        fn scripts(&self) -> Vec<String> {
            self.scripts.borrow().clone()
        }
    }

    /// Stand-in for the GTK main loop
    #[derive(Clone, Default)]
    struct ManualLoop {
        tasks: Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>,
    }

    impl Scheduler for ManualLoop {
        fn defer(&self, task: Box<dyn FnOnce() + 'static>) {
            self.tasks.borrow_mut().push_back(task);
        }
    }

    impl ManualLoop {
        fn run(&self) -> usize {
            let mut ran = 0;
            loop {
                let task = self.tasks.borrow_mut().pop_front();
                let Some(task) = task else {
                    break;
                };
                task();
                ran += 1;
            }
            ran
        }
    }

    type Serializer = EvalSerializer<Rc<FakeEngine>, ManualLoop, oneshot::Sender<EvalOutcome>>;

    fn setup() -> (Rc<Serializer>, Rc<FakeEngine>, ManualLoop) {
        let engine = Rc::new(FakeEngine::default());
        let ui_loop = ManualLoop::default();
        let serializer = Serializer::new(engine.clone(), ui_loop.clone());
        (serializer, engine, ui_loop)
    }

    fn submit(serializer: &Rc<Serializer>, script: &str) -> oneshot::Receiver<EvalOutcome> {
        let (tx, rx) = oneshot::channel();
        serializer.submit(script, tx);
        rx
    }

    #[test]
    fn test_responses_follow_submission_order() {
        let (serializer, engine, ui_loop) = setup();
        let mut receivers: Vec<_> = (0..5)
            .map(|i| submit(&serializer, &format!("script {i}")))
            .collect();

        // Nothing runs until the UI loop turns
        assert_eq!(engine.in_flight(), 0);
        ui_loop.run();

        for i in 0..5 {
            assert_eq!(engine.in_flight(), 1);
            assert_eq!(engine.scripts().last().unwrap(), &format!("script {i}"));
            engine.complete(Ok(JsValue::Number(i as f64)));

            assert_eq!(receivers[i].try_recv().unwrap(), Ok(i.to_string()));
            for later in receivers.iter_mut().skip(i + 1) {
                assert!(later.try_recv().is_err());
            }
            ui_loop.run();
        }

        assert_eq!(engine.in_flight(), 0);
        assert_eq!(serializer.queue().state(), QueueState::Idle);
    }

    #[test]
    fn test_single_evaluation_in_flight() {
        let (serializer, engine, ui_loop) = setup();
        let _first = submit(&serializer, "first");
        ui_loop.run();

        let _second = submit(&serializer, "second");
        let _third = submit(&serializer, "third");
        ui_loop.run();

        assert_eq!(engine.scripts(), vec!["first"]);
        assert_eq!(serializer.queue().len(), 2);
    }

    #[test]
    fn test_evaluate_returns_outcome_channel() {
        let (serializer, engine, ui_loop) = setup();
        let mut first = serializer.evaluate("document.title");
        let mut second = serializer.evaluate("missing()");
        ui_loop.run();

        engine.complete(Ok(JsValue::String("Home".into())));
        assert_eq!(first.try_recv().unwrap(), Ok("\"Home\"".to_string()));
        assert!(second.try_recv().is_err());

        ui_loop.run();
        engine.complete(Err(EngineError::Exception(String::new())));
        assert_eq!(
            second.try_recv().unwrap(),
            Err(EvalError::failed("JavaScript exception"))
        );
        assert_eq!(engine.scripts(), vec!["document.title", "missing()"]);
    }

    #[test]
    fn test_submissions_while_executing_are_picked_up() {
        let (serializer, engine, ui_loop) = setup();
        let mut first = submit(&serializer, "a");
        ui_loop.run();
        let mut second = submit(&serializer, "b");

        engine.complete(Ok(JsValue::String("x".into())));
        ui_loop.run();
        engine.complete(Ok(JsValue::Boolean(true)));
        ui_loop.run();

        assert_eq!(first.try_recv().unwrap(), Ok("\"x\"".to_string()));
        assert_eq!(second.try_recv().unwrap(), Ok("true".to_string()));
        assert_eq!(serializer.queue().state(), QueueState::Idle);

        // An idle queue starts again on the next submission
        let _third = submit(&serializer, "c");
        ui_loop.run();
        assert_eq!(engine.scripts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_engine_failure_does_not_block_queue() {
        let (serializer, engine, ui_loop) = setup();
        let mut failing = submit(&serializer, "missing()");
        let mut ok = submit(&serializer, "1 + 1");
        ui_loop.run();

        engine.complete(Err(EngineError::Exception(
            "ReferenceError: Can't find variable: missing".into(),
        )));
        let err = failing.try_recv().unwrap().unwrap_err();
        assert_eq!(err.code(), "eval_failed");
        assert_eq!(err.to_string(), "ReferenceError: Can't find variable: missing");

        ui_loop.run();
        engine.complete(Ok(JsValue::Number(2.0)));
        assert_eq!(ok.try_recv().unwrap(), Ok("2".to_string()));
    }

    #[test]
    fn test_close_fails_queued_requests_without_engine_calls() {
        let (serializer, engine, ui_loop) = setup();
        let mut in_flight = submit(&serializer, "slow()");
        ui_loop.run();
        let mut queued: Vec<_> = (0..3).map(|i| submit(&serializer, &format!("q{i}"))).collect();

        assert_eq!(serializer.close(), 3);
        for rx in queued.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), Err(EvalError::WindowClosed));
        }

        // The in-flight completion arrives late: answered once, no advance
        engine.complete(Ok(JsValue::Null));
        assert_eq!(in_flight.try_recv().unwrap(), Err(EvalError::WindowDestroyed));
        assert_eq!(ui_loop.run(), 0);
        assert_eq!(engine.scripts(), vec!["slow()"]);
        assert_eq!(serializer.queue().state(), QueueState::Closed);
    }

    #[test]
    fn test_close_before_processing_makes_no_engine_calls() {
        let (serializer, engine, ui_loop) = setup();
        let mut receivers: Vec<_> = (0..4).map(|i| submit(&serializer, &format!("{i}"))).collect();

        assert_eq!(serializer.close(), 4);
        ui_loop.run();

        assert!(engine.scripts().is_empty());
        for rx in receivers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), Err(EvalError::WindowClosed));
        }
    }

    #[test]
    fn test_submit_after_close_is_rejected() {
        let (serializer, engine, ui_loop) = setup();
        serializer.close();

        let (tx, mut rx) = oneshot::channel();
        assert_eq!(serializer.submit("late", tx), Submission::Rejected);
        assert_eq!(rx.try_recv().unwrap(), Err(EvalError::WindowClosed));
        assert_eq!(ui_loop.run(), 0);
        assert!(engine.scripts().is_empty());
    }

    #[test]
    fn test_dropping_serializer_closes_queue() {
        let (serializer, engine, ui_loop) = setup();
        let mut in_flight = submit(&serializer, "a");
        ui_loop.run();
        let mut queued = submit(&serializer, "b");

        let queue = Arc::clone(serializer.queue());
        drop(serializer);

        assert!(queue.is_closed());
        assert_eq!(queued.try_recv().unwrap(), Err(EvalError::WindowClosed));
        engine.complete(Ok(JsValue::Undefined));
        assert_eq!(in_flight.try_recv().unwrap(), Err(EvalError::WindowDestroyed));
        assert_eq!(ui_loop.run(), 0);
    }

    #[test]
    fn test_sender_submit_after_listener_gone_closes_queue() {
        let (serializer, _engine, _ui_loop) = setup();
        let sender = serializer.sender();
        // Take and drop the listener so its receiver goes away
        drop(serializer.kick_listener());

        let (tx, mut rx) = oneshot::channel();
        assert_eq!(sender.submit("orphan", tx), Submission::Start);
        assert_eq!(rx.try_recv().unwrap(), Err(EvalError::WindowClosed));
        assert!(sender.is_closed());
    }

    #[tokio::test]
    async fn test_cross_thread_submissions_are_driven_by_kick_listener() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let (serializer, engine, ui_loop) = setup();
                let listener = serializer.kick_listener().expect("listener is available once");
                assert!(serializer.kick_listener().is_none());
                tokio::task::spawn_local(listener);

                let sender = serializer.sender();
                let receivers = std::thread::spawn(move || {
                    (0..3)
                        .map(|i| {
                            let (tx, rx) = oneshot::channel();
                            sender.submit(format!("thread {i}"), tx);
                            rx
                        })
                        .collect::<Vec<_>>()
                })
                .join()
                .unwrap();

                while engine.in_flight() == 0 {
                    tokio::task::yield_now().await;
                }

                for (i, rx) in receivers.into_iter().enumerate() {
                    assert_eq!(engine.in_flight(), 1);
                    engine.complete(Ok(JsValue::Number(i as f64 + 0.5)));
                    ui_loop.run();
                    assert_eq!(rx.await.unwrap(), Ok(format!("{}.5", i)));
                }
                assert_eq!(engine.scripts(), vec!["thread 0", "thread 1", "thread 2"]);
            })
            .await;
    }
}
