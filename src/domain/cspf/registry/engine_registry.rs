use std::collections::HashMap;
use std::sync::{Arc, RwLock, mpsc};
use std::thread::{self, JoinHandle};

use crate::domain::cspf::registry::engine_message::EngineMessage;
use crate::domain::cspf::registry::engine_proxy::CspfEngineProxy;
use crate::domain::cspf::traffic_engineering::TrafficEngineering;
use crate::error::{Error, Result};

/// A running engine actor.
#[derive(Debug)]
struct EngineEntry {
    tx: mpsc::Sender<EngineMessage>,
    /// Actor thread, joined by [`EngineRegistry::shutdown`].
    thread: JoinHandle<()>,
}

/// Thread-safe handle mapping an engine name to the channel of its actor thread.
///
/// Each spawned engine runs alone on its own thread and handles one message at a time,
/// which serialises every route and link-event call against it.
#[derive(Clone, Debug, Default)]
pub struct EngineRegistry {
    directory: Arc<RwLock<HashMap<String, EngineEntry>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `engine` onto a new thread named `Engine-<name>`.
    ///
    /// The thread ends on [`EngineMessage::Shutdown`] or once every sender for it is dropped.
    /// A name that is already registered is replaced; the old engine is detached and keeps
    /// serving its proxies until they are all dropped.
    pub fn spawn_engine(&self, name: &str, engine: Box<dyn TrafficEngineering + Send + 'static>) -> Result<CspfEngineProxy> {
        let (tx, rx) = mpsc::channel::<EngineMessage>();

        let engine_name = name.to_string();
        let handle = thread::Builder::new().name(format!("Engine-{}", name)).spawn(move || {
            log::info!("Engine actor {} started.", engine_name);
            Self::run_actor_loop(engine, rx);
            log::info!("Engine actor {} stopped.", engine_name);
        })?;

        {
            let mut directory = self.directory.write().map_err(|_| Error::EngineUnavailable("engine directory is poisoned".to_string()))?;
            if directory.insert(name.to_string(), EngineEntry { tx: tx.clone(), thread: handle }).is_some() {
                log::warn!("Engine {} replaced; the previous actor is detached.", name);
            }
        }

        Ok(CspfEngineProxy { name: name.to_string(), tx })
    }

    /// A new proxy for an engine spawned earlier.
    pub fn lookup(&self, name: &str) -> Option<CspfEngineProxy> {
        let directory = self.directory.read().ok()?;
        directory.get(name).map(|entry| CspfEngineProxy { name: name.to_string(), tx: entry.tx.clone() })
    }

    /// Stops the named engine, waits for its thread to finish and forgets it.
    ///
    /// Messages queued before the call are still answered.
    pub fn shutdown(&self, name: &str) -> Result<()> {
        let entry = {
            let mut directory = self.directory.write().map_err(|_| Error::EngineUnavailable("engine directory is poisoned".to_string()))?;
            directory.remove(name)
        };
        let Some(EngineEntry { tx, thread: handle }) = entry else {
            return Err(Error::EngineUnavailable(format!("no engine named {}", name)));
        };

        let sent = tx.send(EngineMessage::Shutdown);
        handle.join().map_err(|_| Error::EngineUnavailable(format!("engine {} panicked", name)))?;
        sent.map_err(|_| Error::EngineUnavailable(format!("engine {} already stopped", name)))
    }

    fn run_actor_loop(mut engine: Box<dyn TrafficEngineering + Send + 'static>, rx: mpsc::Receiver<EngineMessage>) {
        while let Ok(msg) = rx.recv() {
            match msg {
                EngineMessage::LinkEvent { event, reply_to } => {
                    let _ = reply_to.send(engine.handle_link_event(event));
                }
                EngineMessage::GetRoute { id, tid, bandwidth, priority, reply_to } => {
                    let _ = reply_to.send(engine.get_route(id, tid, bandwidth, priority));
                }
                EngineMessage::CheckRoute { route, inport, outport, reply_to } => {
                    let _ = reply_to.send(engine.check_route(&route, inport, outport));
                }
                EngineMessage::ClearRoute { route, tid, reply_to } => {
                    let _ = reply_to.send(engine.clear_route(&route, tid));
                }
                EngineMessage::ReleaseTunnels { tids, reply_to } => {
                    let _ = reply_to.send(engine.release_tunnels(&tids));
                }
                EngineMessage::CheckExplicitRoute { src, hops, bandwidth, priority, reply_to } => {
                    let _ = reply_to.send(engine.check_explicit_route(src, &hops, bandwidth, priority));
                }
                EngineMessage::CheckExistingRoute { route, current_bandwidth, priority, tid, new_bandwidth, reply_to } => {
                    let _ = reply_to.send(engine.check_existing_route(&route, current_bandwidth, priority, tid, new_bandwidth));
                }
                EngineMessage::SetExistingRoute { tid, priority, current_bandwidth, new_bandwidth, route, check, reply_to } => {
                    let _ = reply_to.send(engine.set_existing_route(tid, priority, current_bandwidth, new_bandwidth, &route, &check));
                }
                EngineMessage::ResizeTunnel { route, tid, priority, current_bandwidth, new_bandwidth, reply_to } => {
                    let _ = reply_to.send(engine.resize_tunnel(&route, tid, priority, current_bandwidth, new_bandwidth));
                }
                EngineMessage::CachedRoute { id, reply_to } => {
                    let _ = reply_to.send(engine.cached_route(id));
                }
                EngineMessage::LinkReport(reply) => {
                    let _ = reply.send(engine.link_report());
                }
                EngineMessage::Shutdown => break,
            }
        }
    }
}
