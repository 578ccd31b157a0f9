/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::{Direction, HallCall};

/***************************************/
/*       Public data structures        */
/***************************************/

/// Counters kept by the call queue and the dispatcher.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub assigned: u64,
    pub requeued: u64,
    pub dropped: u64,
}

#[derive(Default)]
pub(crate) struct DispatchCounters {
    pub assigned: AtomicU64,
    pub requeued: AtomicU64,
    pub dropped: AtomicU64,
}

impl DispatchCounters {
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            assigned: self.assigned.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/**
 * Producer side of the hall call queue.
 *
 * Any number of hall panels may hold a clone and submit concurrently; the
 * dispatcher is the single consumer of the matching receiver. Calls for floors
 * outside the building are dropped without telling the caller.
 */
#[derive(Clone)]
pub struct HallCallQueue {
    n_floors: u8,
    calls_tx: cbc::Sender<HallCall>,
    counters: Arc<DispatchCounters>,
}

impl HallCallQueue {
    pub(crate) fn new(
        n_floors: u8,
        counters: Arc<DispatchCounters>,
    ) -> (HallCallQueue, cbc::Receiver<HallCall>) {
        let (calls_tx, calls_rx) = cbc::unbounded::<HallCall>();
        (
            HallCallQueue {
                n_floors,
                calls_tx,
                counters,
            },
            calls_rx,
        )
    }

    pub fn submit(&self, floor: u8, direction: Direction) {
        if floor >= self.n_floors {
            warn!("Dropping hall call for floor {} ({:?}): outside the building", floor, direction);
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        if self.calls_tx.send(HallCall::new(floor, direction)).is_ok() {
            info!("Received hall call at floor {} ({:?})", floor, direction);
        }
    }

    /// Puts a call that could not be assigned at the back of the queue.
    pub(crate) fn requeue(&self, call: HallCall) {
        if self.calls_tx.send(call).is_ok() {
            self.counters.requeued.fetch_add(1, Ordering::Relaxed);
            debug!("Re-queued hall call at floor {} ({:?})", call.floor, call.direction);
        }
    }

    /// Calls waiting in the queue, not counting one held by the dispatcher.
    pub fn len(&self) -> usize {
        self.calls_tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls_tx.is_empty()
    }
}
