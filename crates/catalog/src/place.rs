use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::Date;
use time::macros::format_description;

/// Partition key for a day's registrations: `YYYYMMDD`.
///
/// ```
/// use photoferry_catalog::partition_key;
/// use time::macros::date;
///
/// assert_eq!(partition_key(date!(2024 - 03 - 07)).unwrap(), "20240307");
/// ```
pub fn partition_key(date: Date) -> Result<String> {
    date.format(format_description!("[year][month][day]")).or_raise(|| ErrorKind::Timestamp)
}

/// Decode a stored `place` back into an object key.
///
/// Places are form-encoded: `+` stands for a space and everything else is
/// percent-encoded.
pub fn decode_place(place: &str) -> Result<String> {
    let spaced = place.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).or_raise(|| ErrorKind::InvalidPlace(place.to_string()))?;
    Ok(decoded.into_owned())
}
