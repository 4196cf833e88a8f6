//! Client-side helpers for the fabric: self-address discovery, directory
//! registration/lookup, log shipping, and the dated-file sink both daemons
//! persist through.

pub mod directory;
pub mod frame;
pub mod resolve;
pub mod retry;
pub mod shipper;
pub mod sink;

pub use directory::DirectoryClient;
pub use retry::RetryPolicy;
pub use shipper::LogShipper;
pub use sink::LogSink;
