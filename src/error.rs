use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("ring buffer is empty")]
    Empty,

    #[error("ring buffer capacity must be at least 1")]
    ZeroCapacity,

    #[error("capacity {capacity} overflows the address space")]
    CapacityOverflow { capacity: usize },

    #[error("couldn't allocate storage for {capacity} slots")]
    Alloc { capacity: usize },
}

/// Errors surfaced by the `ringtail` binary.
#[derive(Error, Debug)]
pub enum RingtailError {
    #[error(transparent)]
    Buffer(#[from] RingBufferError),

    #[error("couldn't read input")]
    Io(#[from] std::io::Error),

    #[error("couldn't serialize config")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("no config directory for this platform")]
    NoConfigDir,

    #[error("couldn't start logger")]
    Logger(#[from] log::SetLoggerError),

    #[error("invalid log level {0}")]
    InvalidLogLevel(String),
}
