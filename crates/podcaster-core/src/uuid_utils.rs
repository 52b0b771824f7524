//! UUID helpers.
//!
//! Every record id, association ids included, is a UUIDv7 generated by the
//! application. UUIDv7 embeds a millisecond Unix timestamp in its first 48
//! bits, so ids sort by creation time.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use podcaster_core::uuid_utils::new_v7;
///
/// let id = new_v7();
/// assert_eq!(id.get_version_num(), 7);
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check if a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}

/// Parse an identifier, treating the empty string as absent.
///
/// Request payloads carry ids as strings; an empty string means "not
/// supplied", never the nil UUID.
pub fn parse_optional(value: &str) -> Result<Option<Uuid>, uuid::Error> {
    let value = value.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        Uuid::parse_str(value).map(Some)
    }
}
