use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, instrument, warn};

use crate::Result;

/// Lifecycle events sent to the reaper thread
enum Event {
    /// a unit was spawned, here is its handle
    Started(u64, JoinHandle<()>),
    /// a unit has run to completion or unwound from a panic
    Finished(u64),
    /// a unit could not be spawned at all
    Abandoned(u64),
}

/// Starts one thread per unit of work and reclaims the threads once they finish.
///
/// Joining happens on a dedicated reaper thread, so [`Supervisor::spawn`] never waits on a
/// previous unit. Units share nothing with each other or with the supervisor beyond a
/// completion notice, which is sent from a drop guard and so also arrives when a unit panics.
pub struct Supervisor {
    tx: Sender<Event>,
    next_id: u64,
    active: Arc<AtomicUsize>,
    reaper: JoinHandle<()>,
}

impl Supervisor {
    /// starts the reaper thread
    pub fn start() -> Result<Supervisor> {
        let (tx, rx) = channel::unbounded::<Event>();
        let reaper = thread::Builder::new()
            .name("reaper".into())
            .spawn(move || reap(rx))?;
        Ok(Supervisor {
            tx,
            next_id: 0,
            active: Arc::new(AtomicUsize::new(0)),
            reaper,
        })
    }

    /// runs `job` on a new thread called `name`
    ///
    /// # Errors
    /// returns an IO error if the OS refused to create the thread; `job` is dropped in that case
    pub fn spawn<F>(&mut self, name: String, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = Completion {
            id,
            tx: self.tx.clone(),
            active: Arc::clone(&self.active),
        };

        let spawned = thread::Builder::new().name(name).spawn(move || {
            let _guard = guard;
            job();
        });
        match spawned {
            Ok(handle) => {
                // the reaper only goes away with the supervisor itself
                let _ = self.tx.send(Event::Started(id, handle));
                Ok(())
            }
            Err(e) => {
                let _ = self.tx.send(Event::Abandoned(id));
                Err(e.into())
            }
        }
    }

    /// number of units that have been spawned and not yet finished
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// waits for every unit to finish and for the reaper to join them
    pub fn shutdown(self) {
        let Supervisor { tx, reaper, .. } = self;
        drop(tx);
        if reaper.join().is_err() {
            warn!("reaper thread panicked");
        }
    }
}

/// Reports the end of a unit to the reaper when dropped
struct Completion {
    id: u64,
    tx: Sender<Event>,
    active: Arc<AtomicUsize>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("unit {} panicked", self.id);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        let _ = self.tx.send(Event::Finished(self.id));
    }
}

/// joins units as their completion notices arrive. A notice may overtake the `Started`
/// event of its own unit, those ids are parked in `finished` until the handle shows up.
#[instrument(skip(rx))]
fn reap(rx: Receiver<Event>) {
    let mut running: HashMap<u64, JoinHandle<()>> = HashMap::new();
    let mut finished: HashSet<u64> = HashSet::new();

    for event in rx.iter() {
        match event {
            Event::Started(id, handle) => {
                if finished.remove(&id) {
                    join(id, handle);
                } else {
                    running.insert(id, handle);
                }
            }
            Event::Finished(id) => match running.remove(&id) {
                Some(handle) => join(id, handle),
                None => {
                    finished.insert(id);
                }
            },
            Event::Abandoned(id) => {
                finished.remove(&id);
            }
        }
    }
    debug!("reaper exiting");
}

fn join(id: u64, handle: JoinHandle<()>) {
    match handle.join() {
        Ok(()) => debug!("reaped unit {}", id),
        Err(_) => debug!("reaped unit {} after a panic", id),
    }
}
