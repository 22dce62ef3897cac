//! Reply addressing.

/// Name of the mail gateway identity.
pub const GATEWAY: &str = "gateway";

/// Directory name a reply to `sender` is sealed for.
///
/// Requests relayed by the gateway are answered through the gateway; any
/// other sender is answered directly.
pub fn reply_recipient(sender: &str) -> String {
    let mut receiver = GATEWAY;
    if sender != GATEWAY {
        receiver = sender;
    }
    receiver.to_string()
}
