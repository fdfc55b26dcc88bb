/// Lifecycle of a coordinator.
///
/// `Joining` falls back to `Idle` when connect fails; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Joining,
    Ready,
    Closed,
}
