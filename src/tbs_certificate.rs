use std::time::SystemTime;

use der::asn1::{GeneralizedTime, UtcTime};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Time;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::Result;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - Big-endian serial number bytes.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key_info` - The encoded public key of the subject.
/// * `extensions` - X.509 extensions, encoded in this order.
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: DistinguishedName,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub subject: DistinguishedName,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: x509_time(self.not_before)?,
            not_after: x509_time(self.not_after)?,
        };

        let serial_number = SerialNumber::new(&self.serial_number)?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.as_x509_name()?,
            validity,
            subject: self.subject.as_x509_name()?,
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }
}

/// Encodes a timestamp the way RFC 5280 requires: UTCTime through 2049,
/// GeneralizedTime from 2050 on.
fn x509_time(at: OffsetDateTime) -> Result<Time> {
    let system_time = SystemTime::from(at);
    let time = if at.year() < 2050 {
        Time::UtcTime(UtcTime::from_system_time(system_time)?)
    } else {
        Time::GeneralTime(GeneralizedTime::from_system_time(system_time)?)
    };
    Ok(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn times_switch_encoding_at_2050() {
        assert!(matches!(
            x509_time(datetime!(2049-12-31 23:59:59 UTC)).unwrap(),
            Time::UtcTime(_)
        ));
        assert!(matches!(
            x509_time(datetime!(2050-01-01 00:00:00 UTC)).unwrap(),
            Time::GeneralTime(_)
        ));
    }

    #[test]
    fn subsecond_precision_is_dropped() {
        let Time::UtcTime(encoded) = x509_time(datetime!(2024-06-01 12:00:00.75 UTC)).unwrap() else {
            panic!("expected UTCTime");
        };
        let decoded = OffsetDateTime::from(encoded.to_system_time());
        assert_eq!(decoded, datetime!(2024-06-01 12:00:00 UTC));
    }
}
