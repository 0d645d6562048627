#[cfg(test)]
mod agent_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;

use crate::error::*;
use crate::message::*;

/// Handler is a one-shot transaction outcome sink. Sending on an
/// unbounded channel never blocks, so dispatch is safe outside any
/// lock; None means the outcome is discarded.
pub type Handler = Option<Arc<mpsc::UnboundedSender<Event>>>;

/// noop_handler returns a Handler that discards events.
pub fn noop_handler() -> Handler {
    None
}

/// Event is passed to the transaction handler: the matched response on
/// success, or the terminal error (timeout, stop, agent close).
#[derive(Debug)]
pub struct Event {
    pub id: TransactionId,
    pub result: Result<Message>,
}

impl Default for Event {
    fn default() -> Self {
        Event {
            id: TransactionId([0u8; TRANSACTION_ID_SIZE]),
            result: Ok(Message::default()),
        }
    }
}

/// AgentTransaction represents a transaction in progress. Concurrent
/// access is invalid: the registry removes an entry before its handler
/// is dispatched, so an entry is only ever owned by one path.
struct AgentTransaction {
    id: TransactionId,
    deadline: Instant,
    handler: Handler,
}

/// AGENT_COLLECT_CAP is the initial capacity for the collect scratch
/// list, sufficient to make collection allocation-free in most cases.
const AGENT_COLLECT_CAP: usize = 100;

/// ClientAgent is the capability set the Client needs from an agent;
/// Agent is the canonical implementation, tests substitute doubles.
pub trait ClientAgent: Send + Sync {
    fn start(
        &self,
        id: TransactionId,
        deadline: Instant,
        handler: Handler,
    ) -> Result<()>;
    fn stop(&self, id: TransactionId) -> Result<()>;
    fn process(&self, message: Message) -> Result<()>;
    fn collect(&self, now: Instant) -> Result<()>;
    fn close(&self) -> Result<()>;
}

struct AgentInner {
    /// transactions that are currently in progress. An entry is
    /// unregistered before its handler fires, minimizing the time under
    /// the mutex and guaranteeing single-fire delivery.
    transactions: HashMap<TransactionId, AgentTransaction>,
    /// all calls except process return ErrAgentClosed if true.
    closed: bool,
    /// scratch list of ids to remove, retained across collect calls.
    to_remove: Vec<TransactionId>,
    /// invoked for messages whose id has no registration.
    default_handler: Handler,
}

/// Agent is a low-level abstraction over a transaction list that
/// handles concurrency and timeouts (via collect).
pub struct Agent {
    inner: Mutex<AgentInner>,
}

impl Default for Agent {
    fn default() -> Self {
        Agent::new(noop_handler())
    }
}

impl Agent {
    /// new initializes and returns a new Agent with the provided
    /// default handler for unmatched messages.
    pub fn new(default_handler: Handler) -> Self {
        Agent {
            inner: Mutex::new(AgentInner {
                transactions: HashMap::new(),
                closed: false,
                to_remove: Vec::with_capacity(AGENT_COLLECT_CAP),
                default_handler,
            }),
        }
    }
}

fn dispatch(handler: Handler, event: Event) {
    if let Some(h) = handler {
        // The receiver may already be gone; a transaction outcome is
        // never an error for the agent itself.
        let _ = h.send(event);
    }
}

impl ClientAgent for Agent {
    /// start registers a transaction with the provided id, deadline and
    /// handler. Could return ErrAgentClosed, ErrTransactionExists.
    ///
    /// The handler is guaranteed to be eventually called exactly once.
    fn start(
        &self,
        id: TransactionId,
        deadline: Instant,
        handler: Handler,
    ) -> Result<()> {
        let mut inner = self.inner.lock()?;
        if inner.closed {
            return Err(Error::ErrAgentClosed);
        }
        if inner.transactions.contains_key(&id) {
            return Err(Error::ErrTransactionExists);
        }
        inner.transactions.insert(
            id,
            AgentTransaction {
                id,
                deadline,
                handler,
            },
        );
        Ok(())
    }

    /// stop removes the transaction and fires its handler with
    /// ErrTransactionStopped. Returns ErrTransactionNotExists if there
    /// is no such transaction, ErrAgentClosed if the agent is closed.
    fn stop(&self, id: TransactionId) -> Result<()> {
        let handler;
        {
            let mut inner = self.inner.lock()?;
            if inner.closed {
                return Err(Error::ErrAgentClosed);
            }
            match inner.transactions.remove(&id) {
                Some(t) => handler = t.handler,
                None => return Err(Error::ErrTransactionNotExists),
            }
        }
        dispatch(
            handler,
            Event {
                id,
                result: Err(Error::ErrTransactionStopped),
            },
        );
        Ok(())
    }

    /// process matches an incoming message against the registry and
    /// fires the transaction handler with it; an unmatched message goes
    /// to the default handler. Returns ErrAgentClosed after close.
    fn process(&self, message: Message) -> Result<()> {
        let handler;
        {
            let mut inner = self.inner.lock()?;
            if inner.closed {
                return Err(Error::ErrAgentClosed);
            }
            handler = match inner.transactions.remove(&message.transaction_id) {
                Some(t) => t.handler,
                None => inner.default_handler.clone(),
            };
        }
        let id = message.transaction_id;
        dispatch(
            handler,
            Event {
                id,
                result: Ok(message),
            },
        );
        Ok(())
    }

    /// collect terminates all transactions whose deadline is not after
    /// now, firing ErrTransactionTimeOut to each. Safe to call
    /// concurrently with the other operations.
    fn collect(&self, now: Instant) -> Result<()> {
        let mut to_call: Vec<(TransactionId, Handler)>;
        {
            let mut guard = self.inner.lock()?;
            if guard.closed {
                // All transactions were already drained during close.
                return Err(Error::ErrAgentClosed);
            }
            let AgentInner {
                transactions,
                to_remove,
                ..
            } = &mut *guard;
            to_remove.clear();
            for (id, t) in transactions.iter() {
                if t.deadline <= now {
                    to_remove.push(*id);
                }
            }
            to_call = Vec::with_capacity(to_remove.len());
            for id in to_remove.iter() {
                if let Some(t) = transactions.remove(id) {
                    to_call.push((t.id, t.handler));
                }
            }
        }
        for (id, handler) in to_call {
            dispatch(
                handler,
                Event {
                    id,
                    result: Err(Error::ErrTransactionTimeOut),
                },
            );
        }
        Ok(())
    }

    /// close terminates every pending transaction with ErrAgentClosed
    /// and renders the agent unusable; a second close is an error.
    fn close(&self) -> Result<()> {
        let to_call: Vec<(TransactionId, Handler)>;
        {
            let mut inner = self.inner.lock()?;
            if inner.closed {
                return Err(Error::ErrAgentClosed);
            }
            inner.closed = true;
            to_call = inner
                .transactions
                .drain()
                .map(|(id, t)| (id, t.handler))
                .collect();
        }
        for (id, handler) in to_call {
            dispatch(
                handler,
                Event {
                    id,
                    result: Err(Error::ErrAgentClosed),
                },
            );
        }
        Ok(())
    }
}
