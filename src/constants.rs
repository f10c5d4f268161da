/// 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const DEFAULT_STATS_INTERVAL_MINUTES: u32 = 30;

pub mod email {

    /// Characters of an issue description quoted in notification emails.
    pub const DESCRIPTION_EXCERPT_CHARS: usize = 200;
}

pub mod live {
    use std::time::Duration;

    /// Upper bound on a single client send during broadcast.
    pub const SEND_TIMEOUT: Duration = Duration::from_secs(2);

    /// Frames buffered per connected client.
    pub const CLIENT_BUFFER: usize = 32;
}

pub mod limits {

    pub const DEFAULT_DAILY_STATS_DAYS: u64 = 30;

    pub const MAX_DAILY_STATS_DAYS: u64 = 365;

    pub const MIN_PASSWORD_LENGTH: usize = 8;

    /// Multipart framing allowance on top of the attachment size limit.
    pub const MULTIPART_OVERHEAD: usize = 64 * 1024;
}
