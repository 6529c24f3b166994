//! Host multicore simulation.
//!
//! [`HostCores`] runs one worker thread per configured core. Each worker
//! owns a mailbox and executes control requests with its own core as the
//! local core. Requests enter on the primary core; when the graph answers
//! [`Dispatch::Forwarded`] the worker re-queues the same request on the
//! owning core's mailbox, and the completion reaches the submitter from
//! wherever the request finally ran.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use ostinato_core::{ControlRequest, CoreId, Dispatch};

use crate::context::PlatformContext;
use crate::error::PlatformError;

/// Final outcome of a submitted request.
#[derive(Debug)]
pub struct Completion {
    /// Core the request last ran on.
    pub core: CoreId,
    /// Request name.
    pub op: &'static str,
    /// Number of times the request was forwarded.
    pub hops: u32,
    /// Result on that core.
    pub result: Result<(), PlatformError>,
}

impl Completion {
    /// Reply code returned to the host.
    pub fn reply_code(&self) -> i32 {
        match &self.result {
            Ok(()) => 0,
            Err(e) => e.errno(),
        }
    }

    /// Whether the request completed.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

struct Job {
    request: ControlRequest,
    hops: u32,
    reply: Sender<Completion>,
}

enum Mail {
    Run(Job),
    Shutdown,
}

struct Worker {
    core: CoreId,
    context: Arc<PlatformContext>,
    inbox: Receiver<Mail>,
    mailboxes: Arc<[Sender<Mail>]>,
}

impl Worker {
    fn run(self) {
        tracing::debug!(core = %self.core, "worker started");
        while let Ok(mail) = self.inbox.recv() {
            match mail {
                Mail::Run(job) => self.handle(job),
                Mail::Shutdown => break,
            }
        }
        tracing::debug!(core = %self.core, "worker stopped");
    }

    fn handle(&self, job: Job) {
        let Job {
            request,
            hops,
            reply,
        } = job;
        let op = request.name();
        let result = match self.context.dispatch(self.core, &request) {
            Ok(Dispatch::Completed) => Ok(()),
            Ok(Dispatch::Forwarded(owner)) if hops == 0 => {
                let forwarded = Mail::Run(Job {
                    request,
                    hops: hops + 1,
                    reply: reply.clone(),
                });
                let sent = self
                    .mailboxes
                    .get(owner.index())
                    .is_some_and(|mailbox| mailbox.send(forwarded).is_ok());
                if sent {
                    tracing::trace!(from = %self.core, to = %owner, op, "request forwarded");
                    return;
                }
                Err(PlatformError::MailboxClosed(owner))
            }
            Ok(Dispatch::Forwarded(owner)) => Err(PlatformError::Unroutable(owner)),
            Err(e) => Err(e.into()),
        };
        // The submitter may have given up waiting.
        let _ = reply.send(Completion {
            core: self.core,
            op,
            hops,
            result,
        });
    }
}

/// One worker thread per core sharing a [`PlatformContext`].
pub struct HostCores {
    context: Arc<PlatformContext>,
    mailboxes: Arc<[Sender<Mail>]>,
    workers: Vec<JoinHandle<()>>,
}

impl HostCores {
    /// Starts a worker for every core of `context`.
    pub fn start(context: Arc<PlatformContext>) -> Result<Self, PlatformError> {
        let count = context.core_count();
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..count).map(|_| crossbeam_channel::unbounded()).unzip();
        let mut cores = Self {
            context,
            mailboxes: senders.into(),
            workers: Vec::with_capacity(count),
        };

        for (core, inbox) in CoreId::all().zip(receivers) {
            let worker = Worker {
                core,
                context: cores.context.clone(),
                inbox,
                mailboxes: cores.mailboxes.clone(),
            };
            let handle = std::thread::Builder::new()
                .name(format!("ostinato-{core}"))
                .spawn(move || worker.run())
                .map_err(PlatformError::Spawn)?;
            cores.workers.push(handle);
        }
        tracing::info!(cores = count, "host cores started");
        Ok(cores)
    }

    /// Submits `request` on the primary core and waits for its completion.
    pub fn submit(&self, request: ControlRequest) -> Result<Completion, PlatformError> {
        let primary = CoreId::PRIMARY;
        let (reply, completion) = crossbeam_channel::bounded(1);
        self.mailboxes[primary.index()]
            .send(Mail::Run(Job {
                request,
                hops: 0,
                reply,
            }))
            .map_err(|_| PlatformError::MailboxClosed(primary))?;
        completion
            .recv()
            .map_err(|_| PlatformError::MailboxClosed(primary))
    }

    /// Submits `requests` in order. Stops after the first rejected request,
    /// which is then the last completion returned.
    pub fn submit_all(
        &self,
        requests: impl IntoIterator<Item = ControlRequest>,
    ) -> Result<Vec<Completion>, PlatformError> {
        let mut completions = Vec::new();
        for request in requests {
            let completion = self.submit(request)?;
            let failed = !completion.is_ok();
            completions.push(completion);
            if failed {
                break;
            }
        }
        Ok(completions)
    }

    /// Number of worker threads.
    pub fn core_count(&self) -> usize {
        self.workers.len()
    }

    /// Shared platform context.
    pub fn context(&self) -> &Arc<PlatformContext> {
        &self.context
    }
}

impl Drop for HostCores {
    fn drop(&mut self) {
        for mailbox in self.mailboxes.iter() {
            let _ = mailbox.send(Mail::Shutdown);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for HostCores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCores")
            .field("cores", &self.workers.len())
            .finish_non_exhaustive()
    }
}
