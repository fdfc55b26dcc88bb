use dashmap::DashMap;
use rendezvous_core::PeerId;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::SessionError;

struct StreamEntry<M> {
    stream: Option<M>,
    waiters: VecDeque<oneshot::Sender<M>>,
}

impl<M> Default for StreamEntry<M> {
    fn default() -> Self {
        Self {
            stream: None,
            waiters: VecDeque::new(),
        }
    }
}

/// Media handles keyed by peer, with waiters for streams that have not arrived yet.
///
/// Entries are created lazily and live as long as the registry.
pub struct StreamRegistry<M> {
    entries: DashMap<PeerId, StreamEntry<M>>,
}

impl<M: Clone + Send + 'static> StreamRegistry<M> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Record `stream` for `peer_id` and hand it to every queued waiter, oldest first.
    pub fn store(&self, peer_id: PeerId, stream: M) {
        let mut entry = self.entries.entry(peer_id.clone()).or_default();

        let mut delivered = 0;
        while let Some(waiter) = entry.waiters.pop_front() {
            if waiter.send(stream.clone()).is_ok() {
                delivered += 1;
            }
        }
        if delivered > 0 {
            debug!("Delivered pending media for {} to {} waiter(s)", peer_id, delivered);
        }

        entry.stream = Some(stream);
    }

    /// Stream for `peer_id`, now if stored, otherwise on the next `store`.
    ///
    /// The waiter is registered before this returns, so a `store` racing
    /// with the first poll is not missed.
    pub fn request(&self, peer_id: &PeerId) -> MediaRequest<M> {
        let (tx, rx) = oneshot::channel();
        let mut entry = self.entries.entry(peer_id.clone()).or_default();

        match entry.stream.clone() {
            Some(stream) => {
                debug!("Already had media for {}", peer_id);
                let _ = tx.send(stream);
            }
            None => {
                debug!("Waiting on media for {}", peer_id);
                entry.waiters.retain(|w| !w.is_closed());
                entry.waiters.push_back(tx);
            }
        }

        MediaRequest {
            peer_id: peer_id.clone(),
            rx,
        }
    }

    /// Forget the stored stream. Pending waiters keep waiting for the next `store`.
    pub fn remove(&self, peer_id: &PeerId) -> Option<M> {
        self.entries.get_mut(peer_id)?.stream.take()
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<M> {
        self.entries.get(peer_id)?.stream.clone()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.entries
            .get(peer_id)
            .is_some_and(|entry| entry.stream.is_some())
    }

    /// Waiters for `peer_id` whose requests are still alive.
    pub fn pending(&self, peer_id: &PeerId) -> usize {
        self.entries.get(peer_id).map_or(0, |entry| {
            entry.waiters.iter().filter(|w| !w.is_closed()).count()
        })
    }
}

impl<M: Clone + Send + 'static> Default for StreamRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deferred media handle returned by [`StreamRegistry::request`].
///
/// Fails with [`SessionError::MediaUnavailable`] if the registry is dropped first.
pub struct MediaRequest<M> {
    peer_id: PeerId,
    rx: oneshot::Receiver<M>,
}

impl<M> MediaRequest<M> {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }
}

impl<M> Future for MediaRequest<M> {
    type Output = Result<M, SessionError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map_err(|_| SessionError::MediaUnavailable(this.peer_id.clone()))
    }
}
