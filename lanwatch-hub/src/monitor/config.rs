use time::Duration;

/// Tunables for the connectivity engine.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Journal cap per device. Oldest entries are dropped past this.
    pub max_events: usize,

    /// Disconnects within `disconnect_window` (including the one being
    /// processed) at which a frequency alert fires.
    pub disconnect_threshold: usize,

    /// Rolling lookback for the disconnect frequency check.
    pub disconnect_window: Duration,

    /// Offline gaps strictly longer than this alert on reconnect. Anything
    /// at or below it is treated as a blip (DHCP renewal, brief AP roam).
    pub long_offline_threshold: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_events: 100,
            disconnect_threshold: 3,
            disconnect_window: Duration::hours(1),
            long_offline_threshold: Duration::minutes(3),
        }
    }
}
