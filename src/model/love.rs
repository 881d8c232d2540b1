//! Loved flag shared between a track record and the love/unlove requests in flight for it.

// Use 3rd party
use log::debug;
use tokio::sync::broadcast;

// Use built-in library
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ws::lfm::Lfm;
use crate::ws::WsResult;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct LoveState {
    loved: AtomicBool,
    toggled: broadcast::Sender<bool>,
}

impl LoveState {
    pub fn new(loved: bool) -> Self {
        let (toggled, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            loved: AtomicBool::new(loved),
            toggled,
        }
    }

    pub fn get(&self) -> bool {
        self.loved.load(Ordering::SeqCst)
    }

    pub fn set(&self, loved: bool) {
        self.loved.store(loved, Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.toggled.subscribe()
    }

    /// Completion of a love (`target == true`) or unlove request.
    ///
    /// The flag only moves when the service answered `status="ok"`, but observers hear about
    /// every completion, carrying whatever the flag is afterwards.
    pub fn on_finished(&self, reply: &WsResult<String>, target: bool) {
        let ok = match reply {
            Ok(body) => Lfm::parse(body).map(|lfm| lfm.is_ok()).unwrap_or(false),
            Err(_) => false,
        };
        if ok {
            self.set(target);
        }
        let loved = self.get();
        debug!("love toggle finished, ok: {}, loved: {}", ok, loved);
        // No receivers is fine
        let _ = self.toggled.send(loved);
    }
}
