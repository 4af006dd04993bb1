//! Async-friendly composer facade backed by a worker thread
//!
//! The worker thread owns a synchronous [`WatermarkComposer`] and executes
//! commands sent from async tasks, so callers get an async interface without
//! the composer needing to be `Send` across await points.

use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::composer::{ComposeOutcome, ComposerState, WatermarkComposer};
use crate::{ArtifactEvent, ComposerConfig, CompositeRequest, Error, Result};

enum Command {
    SetRequest(CompositeRequest, oneshot::Sender<()>),
    Compose(oneshot::Sender<Result<ComposeOutcome>>),
    State(oneshot::Sender<ComposerState>),
    Close(oneshot::Sender<()>),
}

/// A clone-able async handle to a composer running on its own thread.
#[derive(Clone)]
pub struct ComposerHandle {
    cmd_tx: Sender<Command>,
}

impl ComposerHandle {
    /// Create the handle, spawning the worker thread that owns the composer.
    ///
    /// `on_artifact` receives the same event sequence a synchronous caller
    /// would observe through [`WatermarkComposer::on_artifact`].
    pub async fn new<F>(config: ComposerConfig, on_artifact: F) -> Result<Self>
    where
        F: Fn(&ArtifactEvent) + Send + Sync + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            let mut composer = match WatermarkComposer::new(config) {
                Ok(c) => c,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            composer.on_artifact(on_artifact);

            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::SetRequest(request, resp) => {
                        composer.set_request(request);
                        let _ = resp.send(());
                    }
                    Command::Compose(resp) => {
                        let _ = resp.send(composer.compose());
                    }
                    Command::State(resp) => {
                        let _ = resp.send(composer.state());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        match init_rx.await {
            Ok(Ok(())) => Ok(Self { cmd_tx }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(Error::Other("composer worker exited during init".into())),
        }
    }

    /// Replace the current request (bumps the generation on the worker).
    pub async fn set_request(&self, request: CompositeRequest) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SetRequest(request, tx))?;
        rx.await
            .map_err(|_| Error::Other("composer worker dropped reply".into()))
    }

    /// Run a full compose pass on the worker.
    pub async fn compose(&self) -> Result<ComposeOutcome> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Compose(tx))?;
        rx.await
            .map_err(|_| Error::Other("composer worker dropped reply".into()))?
    }

    /// Current state of the worker's state machine.
    pub async fn state(&self) -> Result<ComposerState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::State(tx))?;
        rx.await
            .map_err(|_| Error::Other("composer worker dropped reply".into()))
    }

    /// Shut the worker down. Subsequent calls on any clone will error.
    pub async fn close(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|_| Error::Other("composer worker dropped reply".into()))
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("composer worker is gone".into()))
    }
}
