use std::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use x509_cert::name::RdnSequence;

use super::extensions::ToAndFromX509Extension;
use crate::error::{CertgenError, Result};

/// Organization used when the caller does not name one.
pub const DEFAULT_ORGANIZATION: &str = "Certgen Development";

/// Default certificate lifetime.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// Layout of `--start-date`, e.g. `Jan 1 15:04:05 2011`.
const START_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short case_sensitive:false] [day padding:none] [hour padding:none]:[minute]:[second] [year]"
);

/// Distinguished name parameters for the certificate subject.
///
/// # Fields
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU); left out when empty.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct DistinguishedName {
    #[builder(into, default = DEFAULT_ORGANIZATION.to_string())]
    pub organization: String,
    #[builder(into, default)]
    pub organization_unit: String,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// The RDNs are encoded O first, then OU.
    pub fn as_x509_name(&self) -> Result<x509_cert::name::DistinguishedName> {
        let mut rfc4514_name = String::new();
        if !self.organization_unit.is_empty() {
            rfc4514_name.push_str(&format!("OU={},", escape_rfc4514(&self.organization_unit)));
        }
        rfc4514_name.push_str(&format!("O={}", escape_rfc4514(&self.organization)));

        RdnSequence::from_str(&rfc4514_name)
            .map_err(|e| CertgenError::InvalidInput(format!("subject {rfc4514_name:?}: {e}")))
    }
}

/// Escapes an attribute value for an RFC 4514 string.
fn escape_rfc4514(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);

    for (i, c) in value.chars().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && (c == '#' || c == ' '))
            || (i == last && c == ' ');
        if needs_escape {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Certificate validity period.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }

    /// Creates a validity period of `duration` starting at `not_before`.
    pub fn starting_at(not_before: OffsetDateTime, duration: Duration) -> Result<Self> {
        let not_after = not_before.checked_add(duration).ok_or_else(|| {
            CertgenError::InvalidInput(format!("validity of {duration} overflows the calendar"))
        })?;
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Creates a validity period from an optional `--start-date` string.
    ///
    /// Without a start date the period begins now.
    ///
    /// # Example
    /// ```
    /// use certgen::cert::params::Validity;
    /// use time::Duration;
    ///
    /// let validity = Validity::from_start_date(Some("Jan 1 15:04:05 2011"), Duration::days(30)).unwrap();
    /// assert_eq!(validity.not_before.year(), 2011);
    /// assert_eq!(validity.duration(), Duration::days(30));
    /// ```
    pub fn from_start_date(start_date: Option<&str>, duration: Duration) -> Result<Self> {
        let not_before = match start_date {
            Some(date) if !date.is_empty() => parse_start_date(date)?,
            _ => OffsetDateTime::now_utc(),
        };
        Self::starting_at(not_before, duration)
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

/// Parses a start date in the `Jan 2 15:04:05 2006` layout as UTC.
pub fn parse_start_date(date: &str) -> Result<OffsetDateTime> {
    PrimitiveDateTime::parse(date, START_DATE_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| CertgenError::DateFormatError(format!("{date:?}: {e}")))
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn to_x509_extension(&self) -> Result<x509_cert::ext::Extension> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }
}
