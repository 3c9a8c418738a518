/// Progress of a single dial.
///
/// One value per dial call; steps only move forward and `Ready`/`Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialState {
    /// Nothing has happened yet.
    #[default]
    Init,

    /// Looking up the host (local resolver, then the fallback name server).
    Resolving,

    /// Picking an address from the resolved set.
    Selecting,

    /// TCP handshake, including the single retry.
    Connecting,

    /// Applying keep-alive tunables or the deadline fallback.
    ConfiguringKeepAlive,

    /// The connection was handed to the caller.
    Ready,

    /// The dial ended with an error.
    Failed,
}

impl DialState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DialState::Ready | DialState::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: DialState) -> bool {
        use DialState::*;
        matches!(
            (self, next),
            (Init, Resolving)
                | (Resolving, Selecting)
                | (Selecting, Connecting)
                | (Connecting, ConfiguringKeepAlive)
                | (ConfiguringKeepAlive, Ready)
                | (Resolving, Failed)
                | (Connecting, Failed)
                | (ConfiguringKeepAlive, Failed)
        )
    }
}
