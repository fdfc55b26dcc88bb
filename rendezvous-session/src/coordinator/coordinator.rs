use crate::clock::ClockOffsetEstimator;
use crate::coordinator::{SessionConfig, SessionEvent, SessionPhase};
use crate::error::{Result, SessionError};
use crate::media::{MediaRequest, StreamRegistry};
use crate::transport::{CallOutcome, SignalingTransport, TransportEvent};
use bytes::Bytes;
use dashmap::DashMap;
use rendezvous_core::{ConnectStatus, JoinTime, PeerId, PeerRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Whether the side that joined at `local` dials the side that joined at `remote`.
///
/// The earlier joiner dials. Equal join times resolve to "dial", so two
/// peers stamped with the same time would both dial; distinct times always
/// yield exactly one caller.
pub fn should_initiate(local: JoinTime, remote: JoinTime) -> bool {
    local <= remote
}

struct CoordinatorInner<T: SignalingTransport> {
    config: SessionConfig,
    room: RwLock<String>,
    transport: Arc<T>,
    estimator: Arc<ClockOffsetEstimator>,
    phase: Mutex<SessionPhase>,
    client_id: OnceLock<PeerId>,
    local_join_time: OnceLock<JoinTime>,
    peers: DashMap<PeerId, PeerRecord>,
    streams: StreamRegistry<T::Media>,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: SignalingTransport> Drop for CoordinatorInner<T> {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

/// Per-session bootstrap coordinator.
///
/// Joins the room while warming up the clock estimate, pins the local join
/// time, then decides for every remote peer whether this side dials it.
/// Cloning yields another handle to the same session.
pub struct Coordinator<T: SignalingTransport> {
    inner: Arc<CoordinatorInner<T>>,
}

impl<T: SignalingTransport> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Puts the phase back to `Idle` if `connect` is abandoned before `Ready`.
struct JoiningGuard<'a> {
    phase: &'a Mutex<SessionPhase>,
    armed: bool,
}

impl Drop for JoiningGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase == SessionPhase::Joining {
            *phase = SessionPhase::Idle;
        }
    }
}

impl<T: SignalingTransport> Coordinator<T> {
    pub fn new(
        config: SessionConfig,
        transport: Arc<T>,
        estimator: Arc<ClockOffsetEstimator>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (session_tx, session_rx) = mpsc::unbounded_channel();

        let inner = CoordinatorInner {
            room: RwLock::new(config.room.clone()),
            config,
            transport,
            estimator,
            phase: Mutex::new(SessionPhase::Idle),
            client_id: OnceLock::new(),
            local_join_time: OnceLock::new(),
            peers: DashMap::new(),
            streams: StreamRegistry::new(),
            session_tx,
            tasks: Mutex::new(Vec::new()),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            session_rx,
        )
    }

    /// Consume transport notifications on a background task.
    ///
    /// The loop runs until the transport drops its sender, the session is
    /// disconnected, or the last coordinator handle is dropped. It only
    /// holds a weak reference so it never keeps the session alive.
    pub fn spawn_event_loop(&self, events: mpsc::Receiver<TransportEvent<T::Media>>) {
        let handle = tokio::spawn(Self::run_events(Arc::downgrade(&self.inner), events));
        self.tasks().push(handle);
    }

    async fn run_events(
        inner: Weak<CoordinatorInner<T>>,
        mut events: mpsc::Receiver<TransportEvent<T::Media>>,
    ) {
        info!("Session event loop started");

        while let Some(event) = events.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            Self { inner }.handle_transport_event(event);
        }

        info!("Session event loop stopped");
    }

    /// Join the configured room and fix the local join time.
    ///
    /// Clock warm-up and the transport join run concurrently; the first
    /// failure of either is returned and the session goes back to `Idle`.
    pub async fn connect(&self) -> Result<PeerId> {
        {
            let mut phase = self.phase_lock();
            if *phase != SessionPhase::Idle {
                return Err(SessionError::State(format!(
                    "connect called while {:?}",
                    *phase
                )));
            }
            *phase = SessionPhase::Joining;
        }
        let mut guard = JoiningGuard {
            phase: &self.inner.phase,
            armed: true,
        };

        info!(
            "Connecting to app '{}', room '{}'",
            self.inner.config.app,
            self.room()
        );

        let warm_up = async {
            self.inner
                .estimator
                .warm_up()
                .await
                .map_err(SessionError::from)
        };

        let joined = AtomicBool::new(false);
        let join = async {
            let session = self.join_session().await?;
            joined.store(true, Ordering::Release);
            Ok::<_, SessionError>(session)
        };

        let result = match tokio::try_join!(warm_up, join) {
            Ok(((), (client_id, local_media))) => self.finish_connect(client_id, local_media).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => guard.armed = false,
            Err(e) => {
                warn!("Connect failed: {}", e);
                if joined.load(Ordering::Acquire) {
                    self.inner.transport.disconnect().await;
                }
            }
        }
        result
    }

    async fn join_session(&self) -> Result<(PeerId, Option<T::Media>)> {
        let transport = &self.inner.transport;
        let room = self.room();

        transport.join_room(&room).await.map_err(SessionError::Join)?;

        let local_media = if self.inner.config.media.audio {
            let media = transport
                .init_media_source()
                .await
                .map_err(SessionError::Join)?;
            Some(media)
        } else {
            None
        };

        let client_id = transport
            .connect(&self.inner.config.app)
            .await
            .map_err(SessionError::Join)?;

        Ok((client_id, local_media))
    }

    async fn finish_connect(
        &self,
        client_id: PeerId,
        local_media: Option<T::Media>,
    ) -> Result<PeerId> {
        let room = self.room();
        let join_time = self
            .inner
            .transport
            .room_join_time(&room, &client_id)
            .await
            .ok_or_else(|| {
                SessionError::Join(format!("no join time for {} in room '{}'", client_id, room))
            })?;

        if let Some(media) = local_media {
            self.inner.streams.store(client_id.clone(), media);
        }

        if self.inner.local_join_time.set(join_time).is_err()
            || self.inner.client_id.set(client_id.clone()).is_err()
        {
            return Err(SessionError::State("session already joined".to_owned()));
        }

        let known: Vec<PeerId> = {
            let mut phase = self.phase_lock();
            if *phase != SessionPhase::Joining {
                return Err(SessionError::State(format!(
                    "session became {:?} while joining",
                    *phase
                )));
            }
            *phase = SessionPhase::Ready;
            self.inner.peers.iter().map(|e| e.key().clone()).collect()
        };

        let estimator = Arc::clone(&self.inner.estimator);
        self.tasks()
            .push(tokio::spawn(async move { estimator.run_periodic().await }));

        info!("Connected as {} (joined room at {})", client_id, join_time);

        for peer_id in known {
            self.decide(&peer_id);
        }

        Ok(client_id)
    }

    /// Whether this side dials `peer_id`.
    ///
    /// Fails with `State` until `connect` has completed.
    pub fn should_initiate_to(&self, peer_id: &PeerId) -> Result<bool> {
        let local = self.local_join_time().ok_or_else(|| {
            SessionError::State("local join time is not known before connect".to_owned())
        })?;
        let record = self
            .inner
            .peers
            .get(peer_id)
            .ok_or_else(|| SessionError::UnknownPeer(peer_id.clone()))?;

        Ok(should_initiate(local, record.room_join_time))
    }

    /// Dial `peer_id` through the transport.
    pub async fn start_connection(&self, peer_id: &PeerId) -> Result<()> {
        if self.phase() != SessionPhase::Ready {
            return Err(SessionError::State(format!(
                "cannot call {} while {:?}",
                peer_id,
                self.phase()
            )));
        }

        self.set_peer_state(peer_id, ConnectStatus::Connecting)
            .ok_or_else(|| SessionError::UnknownPeer(peer_id.clone()))?;
        self.emit(SessionEvent::PeerOpened(peer_id.clone()));

        let (state, result) = match self.inner.transport.initiate_call(peer_id).await {
            Ok(CallOutcome::Accepted) => (ConnectStatus::Connected, Ok(())),
            Ok(CallOutcome::Rejected) => (
                ConnectStatus::NotConnected,
                Err(SessionError::CallInitiation {
                    peer_id: peer_id.clone(),
                    reason: "call rejected".to_owned(),
                }),
            ),
            Err(reason) => (
                ConnectStatus::NotConnected,
                Err(SessionError::CallInitiation {
                    peer_id: peer_id.clone(),
                    reason,
                }),
            ),
        };

        if self.phase() == SessionPhase::Closed {
            debug!("Session closed while calling {}", peer_id);
            return Err(SessionError::State(format!(
                "session closed while calling {}",
                peer_id
            )));
        }

        self.set_peer_state(peer_id, state);
        if result.is_ok() {
            info!("Successfully started connection to {}", peer_id);
        }
        result
    }

    fn decide(&self, peer_id: &PeerId) {
        match self.should_initiate_to(peer_id) {
            Ok(true) => {
                debug!("Initiating connection to {}", peer_id);
                let coordinator = self.clone();
                let peer_id = peer_id.clone();
                let handle = tokio::spawn(async move {
                    if let Err(e) = coordinator.start_connection(&peer_id).await {
                        error!("{}", e);
                        coordinator.emit(SessionEvent::CallFailed {
                            peer_id,
                            reason: e.to_string(),
                        });
                    }
                });

                let mut tasks = self.tasks();
                tasks.retain(|task| !task.is_finished());
                tasks.push(handle);
            }
            Ok(false) => debug!("Waiting for {} to initiate", peer_id),
            Err(e) => warn!("Skipping initiation decision for {}: {}", peer_id, e),
        }
    }

    fn handle_transport_event(&self, event: TransportEvent<T::Media>) {
        match event {
            TransportEvent::PeerJoined(record) => {
                let peer_id = record.peer_id.clone();
                if self.inner.client_id.get() == Some(&peer_id) {
                    return;
                }

                let (is_new, ready) = {
                    let phase = self.phase_lock();
                    let is_new = match self.inner.peers.get_mut(&peer_id) {
                        Some(mut existing) => {
                            existing.room_join_time = record.room_join_time;
                            false
                        }
                        None => {
                            self.inner.peers.insert(
                                peer_id.clone(),
                                PeerRecord {
                                    state: ConnectStatus::NotConnected,
                                    ..record
                                },
                            );
                            true
                        }
                    };
                    (is_new, *phase == SessionPhase::Ready)
                };

                if !is_new {
                    return;
                }
                info!("Peer {} joined", peer_id);
                self.emit_occupants();
                if ready {
                    self.decide(&peer_id);
                }
            }

            TransportEvent::PeerLeft(peer_id) => {
                if self.inner.peers.remove(&peer_id).is_some() {
                    info!("Peer {} left", peer_id);
                    self.emit(SessionEvent::PeerClosed(peer_id));
                    self.emit_occupants();
                }
            }

            TransportEvent::StateChanged(peer_id, state) => {
                if self.set_peer_state(&peer_id, state).is_none() {
                    debug!("State change for unknown peer {}", peer_id);
                }
            }

            TransportEvent::StreamAvailable(peer_id, media) => {
                debug!("Media available for {}", peer_id);
                self.inner.streams.store(peer_id, media);
            }

            TransportEvent::StreamClosed(peer_id) => {
                debug!("Media closed for {}", peer_id);
                self.inner.streams.remove(&peer_id);
            }

            TransportEvent::Message {
                from,
                data_type,
                payload,
            } => {
                self.emit(SessionEvent::Message {
                    from,
                    data_type,
                    payload,
                });
            }
        }
    }

    /// Media stream for `peer_id`, now or once it arrives.
    pub fn request_media(&self, peer_id: &PeerId) -> MediaRequest<T::Media> {
        self.inner.streams.request(peer_id)
    }

    pub fn streams(&self) -> &StreamRegistry<T::Media> {
        &self.inner.streams
    }

    /// Local time corrected onto the reference clock, in Unix milliseconds.
    pub fn estimated_time(&self) -> i64 {
        self.inner.estimator.estimated_time()
    }

    pub fn estimator(&self) -> &ClockOffsetEstimator {
        &self.inner.estimator
    }

    pub async fn connect_status(&self, peer_id: &PeerId) -> ConnectStatus {
        self.inner.transport.connect_status(peer_id).await
    }

    pub fn peer(&self, peer_id: &PeerId) -> Option<PeerRecord> {
        self.inner.peers.get(peer_id).map(|r| r.value().clone())
    }

    pub fn peers(&self) -> Vec<PeerRecord> {
        self.inner.peers.iter().map(|r| r.value().clone()).collect()
    }

    pub fn client_id(&self) -> Option<&PeerId> {
        self.inner.client_id.get()
    }

    pub fn local_join_time(&self) -> Option<JoinTime> {
        self.inner.local_join_time.get().copied()
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase_lock()
    }

    pub fn room(&self) -> String {
        self.inner
            .room
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch rooms. Before connect this only records the name.
    pub async fn set_room(&self, room: impl Into<String>) -> Result<()> {
        let room = room.into();
        *self
            .inner
            .room
            .write()
            .unwrap_or_else(PoisonError::into_inner) = room.clone();

        if self.phase() == SessionPhase::Ready {
            self.inner
                .transport
                .join_room(&room)
                .await
                .map_err(SessionError::Transport)?;
        }
        Ok(())
    }

    /// Data always travels over the signaling socket.
    pub async fn send_data(&self, peer_id: &PeerId, data_type: &str, payload: Bytes) -> Result<()> {
        self.send_data_guaranteed(peer_id, data_type, payload).await
    }

    pub async fn send_data_guaranteed(
        &self,
        peer_id: &PeerId,
        data_type: &str,
        payload: Bytes,
    ) -> Result<()> {
        self.inner
            .transport
            .send_data(peer_id, data_type, payload)
            .await
            .map_err(SessionError::Transport)
    }

    pub async fn broadcast_data(&self, data_type: &str, payload: Bytes) -> Result<()> {
        self.broadcast_data_guaranteed(data_type, payload).await
    }

    pub async fn broadcast_data_guaranteed(&self, data_type: &str, payload: Bytes) -> Result<()> {
        let room = self.room();
        self.inner
            .transport
            .broadcast_data(&room, data_type, payload)
            .await
            .map_err(SessionError::Transport)
    }

    /// Stop background work and leave the session. The coordinator cannot reconnect.
    pub async fn disconnect(&self) {
        *self.phase_lock() = SessionPhase::Closed;

        let tasks: Vec<JoinHandle<()>> = self.tasks().drain(..).collect();
        for task in tasks {
            task.abort();
        }

        self.inner.transport.disconnect().await;
        info!("Session disconnected");
    }

    fn set_peer_state(&self, peer_id: &PeerId, state: ConnectStatus) -> Option<()> {
        let mut record = self.inner.peers.get_mut(peer_id)?;
        record.state = state;
        Some(())
    }

    fn emit_occupants(&self) {
        let mut occupants: Vec<PeerId> =
            self.inner.peers.iter().map(|e| e.key().clone()).collect();
        occupants.sort();
        self.emit(SessionEvent::Occupants(occupants));
    }

    fn emit(&self, event: SessionEvent) {
        if self.inner.session_tx.send(event).is_err() {
            debug!("Session event dropped, receiver is gone");
        }
    }

    fn phase_lock(&self) -> MutexGuard<'_, SessionPhase> {
        self.inner
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
