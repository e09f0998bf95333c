// Route handlers, one module per API resource.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

pub mod centroids;
pub mod countries;
pub mod items;
pub mod settings;

/// Query-string number where a blank value (`?min_size=`) means "use the
/// default", the same as leaving the parameter out.
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}
