//! Admission queue - 受付バッファ
//!
//! A bounded `mpsc` channel between `send_task` callers and the dispatch loop.
//!
//! Callers first *reserve* a slot (bounded by the send timeout), then persist
//! the Init record, then hand the record over through the reserved slot. The
//! Init write therefore always lands before the dispatch loop can see the
//! record, and a send that times out never touches storage.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::TaskRecord;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("admission buffer stayed full for {0:?}")]
    TimedOut(Duration),

    #[error("admission buffer is closed")]
    Closed,
}

/// Sending half, held by the executor.
pub struct AdmissionQueue<Req, Resp> {
    tx: mpsc::Sender<TaskRecord<Req, Resp>>,
    capacity: usize,
}

/// Receiving half, owned by the dispatch loop.
pub struct AdmissionReceiver<Req, Resp> {
    rx: mpsc::Receiver<TaskRecord<Req, Resp>>,
}

/// A reserved buffer slot. Dropping it without `admit` gives the slot back.
pub struct AdmissionSlot<'a, Req, Resp> {
    permit: mpsc::Permit<'a, TaskRecord<Req, Resp>>,
}

/// Create a queue with room for `capacity` records (must be > 0).
pub fn channel<Req, Resp>(capacity: usize) -> (AdmissionQueue<Req, Resp>, AdmissionReceiver<Req, Resp>) {
    let (tx, rx) = mpsc::channel(capacity);
    (AdmissionQueue { tx, capacity }, AdmissionReceiver { rx })
}

impl<Req, Resp> AdmissionQueue<Req, Resp> {
    /// Wait up to `wait` for a free slot.
    pub async fn reserve(&self, wait: Duration) -> Result<AdmissionSlot<'_, Req, Resp>, AdmissionError> {
        match tokio::time::timeout(wait, self.tx.reserve()).await {
            Ok(Ok(permit)) => Ok(AdmissionSlot { permit }),
            Ok(Err(_)) => Err(AdmissionError::Closed),
            Err(_) => Err(AdmissionError::TimedOut(wait)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots in use: admitted records not yet taken by the receiver, plus
    /// reserved slots not yet admitted or dropped.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<Req, Resp> AdmissionSlot<'_, Req, Resp> {
    pub fn admit(self, record: TaskRecord<Req, Resp>) {
        self.permit.send(record);
    }
}

impl<Req, Resp> AdmissionReceiver<Req, Resp> {
    /// Next record in admission order; `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<TaskRecord<Req, Resp>> {
        self.rx.recv().await
    }
}
