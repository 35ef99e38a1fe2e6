//! Hub tunables.

/// Hub configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Maximum number of archived messages replayed to a joining connection
    pub history_limit: usize,
    /// Buffer size of the command channel (join, leave and broadcast)
    pub command_capacity: usize,
    /// Buffer size of the typing-signal channel
    pub typing_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            command_capacity: 1024,
            typing_capacity: 256,
        }
    }
}
