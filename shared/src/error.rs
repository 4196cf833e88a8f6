use thiserror::Error;

/// Error taxonomy shared by the fabric crates.
///
/// Daemon binaries wrap these in `anyhow` at the edges; the library
/// surface stays typed so callers can tell a dead dial from a dead
/// connection.
#[derive(Debug, Error)]
pub enum FabricError {
    /// An address string with no `:` separator to split on.
    #[error("address `{0}` has no `:` separator")]
    MalformedAddress(String),

    /// A listener could not acquire its endpoint. Fatal to the process.
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an already-established connection.
    #[error("connection i/o failed")]
    Transport(#[from] std::io::Error),

    /// A bounded dial retry policy ran out of attempts or time.
    #[error("gave up dialing {addr} after {attempts} attempts")]
    DialRetryExhausted { addr: String, attempts: u32 },

    /// The caller cancelled a dial retry loop.
    #[error("dial to {addr} cancelled")]
    DialCancelled { addr: String },

    /// A frame exceeded the wire cap without a terminator.
    #[error("frame exceeds {max} bytes")]
    FrameTooLarge { max: usize },

    /// The peer answered something the protocol does not allow here.
    #[error("unexpected reply `{got}`")]
    UnexpectedReply { got: String },

    /// I/O failure on the local log file.
    #[error("log file i/o failed")]
    LogFile(#[source] std::io::Error),

    /// The log sink's writer task has gone away.
    #[error("log sink is closed")]
    SinkClosed,
}
