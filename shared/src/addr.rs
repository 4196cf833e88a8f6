use crate::error::FabricError;

/// Strip the port suffix from an endpoint's string form.
///
/// Splits on the first `:`, so IPv6 host forms are not understood — the
/// fabric records IPv4 peer addresses only.
pub fn strip_port(address: &str) -> Result<&str, FabricError> {
    match address.split_once(':') {
        Some((host, _)) => Ok(host),
        None => Err(FabricError::MalformedAddress(address.to_string())),
    }
}
