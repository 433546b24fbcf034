use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A `timestamptz` column.
///
/// `OffsetDateTime`'s own `Serialize` produces an array of integers, which is fine for binary
/// formats but useless to an API client, so this wrapper serializes as an RFC 3339 string.
#[derive(sqlx::Type, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(transparent)]
pub struct Timestamptz(pub OffsetDateTime);

impl Timestamptz {
    pub fn now() -> Self {
        Timestamptz(OffsetDateTime::now_utc())
    }
}

impl Serialize for Timestamptz {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}
