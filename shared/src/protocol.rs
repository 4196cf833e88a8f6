//! Directory wire protocol: plain text over TCP, one request/response
//! exchange per connection.
//!
//! A frame is the bytes up to the first `\n` (or EOF), capped at
//! [`MAX_FRAME_BYTES`]. Requests are `<command>=<service-name>`; anything
//! without a recognized command answers [`REPLY_BAD_REQUEST`].

/// Well-known port every fabric service listens on.
pub const UNIVERSAL_PORT: u16 = 6060;

/// Hard cap on a single request or reply frame.
pub const MAX_FRAME_BYTES: usize = 1024;

/// Registration command: records the observed peer address under a name.
pub const CMD_RECORD: &str = "recordAddress";

/// Lookup command: resolves a name to its recorded address.
pub const CMD_LOOKUP: &str = "getAddress";

/// The only explicit error signal in the protocol.
pub const REPLY_BAD_REQUEST: &str = "400 Bad Request";

/// One parsed request. Lives only for the duration of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Record { service: String },
    Lookup { service: String },
    Unknown { raw: String },
}

/// Split a trimmed frame into a request.
///
/// The text is split on the first `=`; a missing `=`, an unrecognized
/// command tag, or an empty service name all come back as `Unknown`
/// (service names are non-empty by the data-model invariant).
pub fn parse_request(text: &str) -> Request {
    let (command, argument) = match text.split_once('=') {
        Some((command, argument)) => (command, argument),
        None => (text, ""),
    };

    match command {
        CMD_RECORD if !argument.is_empty() => Request::Record {
            service: argument.to_string(),
        },
        CMD_LOOKUP if !argument.is_empty() => Request::Lookup {
            service: argument.to_string(),
        },
        _ => Request::Unknown {
            raw: text.to_string(),
        },
    }
}

pub fn encode_record(service: &str) -> String {
    format!("{CMD_RECORD}={service}")
}

pub fn encode_lookup(service: &str) -> String {
    format!("{CMD_LOOKUP}={service}")
}

/// Split a `getAddress` reply into `(name, address)`.
///
/// An empty address component is the wire's "not registered" signal and
/// comes back as `None`. Replies without `=` are not lookup replies at all.
pub fn parse_lookup_reply(text: &str) -> Option<(&str, Option<&str>)> {
    let (name, address) = text.split_once('=')?;
    let address = if address.is_empty() {
        None
    } else {
        Some(address)
    };
    Some((name, address))
}

/// Trim NUL padding and the frame terminator from a received frame.
///
/// Fixed-buffer writers pad the tail of a frame with `\0`; framed writers
/// terminate with `\n`.
pub fn trim_padding(text: &str) -> &str {
    text.trim_matches('\0').trim_end_matches(['\r', '\n'])
}
