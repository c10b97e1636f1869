// Certificate inspection: CT extension detection and embedded SCT extraction

use super::der;
use super::{POISON_EXTENSION_OID, PRECERTIFICATE_SIGNING_OID, SCT_CERTIFICATE_OID};
use crate::error::CtError;
use crate::model::SignedCertificateTimestamp;
use crate::serialization::parse_sct_list;
use crate::Result;
use x509_parser::prelude::*;

pub(crate) fn parse_certificate(der_bytes: &[u8]) -> Result<X509Certificate<'_>> {
    let (_rem, cert) = X509Certificate::from_der(der_bytes)
        .map_err(|e| CtError::internal(format!("Failed to parse certificate: {}", e)))?;
    Ok(cert)
}

/// True iff the certificate's extended-key-usage contains the
/// precertificate-signing OID, marking a dedicated precert signing CA
pub fn is_pre_certificate_signing_cert(cert_der: &[u8]) -> Result<bool> {
    let cert = parse_certificate(cert_der)?;
    let eku = cert
        .extended_key_usage()
        .map_err(|e| CtError::internal(format!("Error parsing signer cert: {}", e)))?;
    match eku {
        Some(eku) => Ok(eku
            .value
            .other
            .iter()
            .any(|oid| oid.to_id_string() == PRECERTIFICATE_SIGNING_OID)),
        None => Ok(false),
    }
}

/// True iff the certificate carries the critical poison extension
pub fn is_pre_certificate(cert_der: &[u8]) -> Result<bool> {
    let cert = parse_certificate(cert_der)?;
    Ok(cert
        .extensions()
        .iter()
        .any(|ext| ext.critical && ext.oid.to_id_string() == POISON_EXTENSION_OID))
}

/// True iff the certificate carries the non-critical embedded SCT list
pub fn has_embedded_sct(cert_der: &[u8]) -> Result<bool> {
    let cert = parse_certificate(cert_der)?;
    Ok(cert
        .extensions()
        .iter()
        .any(|ext| !ext.critical && ext.oid.to_id_string() == SCT_CERTIFICATE_OID))
}

/// Extract and decode the embedded SCT list, if present
///
/// The extension value is a DER OCTET STRING wrapping the TLS-encoded
/// SignedCertificateTimestampList.
pub fn extract_embedded_scts(cert_der: &[u8]) -> Result<Vec<SignedCertificateTimestamp>> {
    let cert = parse_certificate(cert_der)?;
    let Some(ext) = cert
        .extensions()
        .iter()
        .find(|ext| ext.oid.to_id_string() == SCT_CERTIFICATE_OID)
    else {
        return Ok(Vec::new());
    };

    let sct_list_bytes = der::parse_octet_string(ext.value)?;
    parse_sct_list(sct_list_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
    use openssl::bn::{BigNum, MsbOption};
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};
    use openssl::x509::extension::ExtendedKeyUsage;
    use openssl::x509::{X509Builder, X509Extension, X509NameBuilder, X509};

    fn test_key() -> PKey<Private> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
    }

    fn build_cert(key: &PKey<Private>, extensions: Vec<X509Extension>) -> X509 {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "ct test").unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let mut serial = BigNum::new().unwrap();
        serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
        builder
            .set_serial_number(&serial.to_asn1_integer().unwrap())
            .unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(30).unwrap())
            .unwrap();
        for ext in extensions {
            builder.append_extension(ext).unwrap();
        }
        builder.sign(key, MessageDigest::sha256()).unwrap();
        builder.build()
    }

    fn raw_extension(oid: &str, critical: bool, contents: &[u8]) -> X509Extension {
        let oid = Asn1Object::from_str(oid).unwrap();
        let value = Asn1OctetString::new_from_bytes(contents).unwrap();
        X509Extension::new_from_der(&oid, critical, &value).unwrap()
    }

    #[test]
    fn test_plain_cert_has_no_ct_markers() {
        let key = test_key();
        let der = build_cert(&key, vec![]).to_der().unwrap();
        assert!(!is_pre_certificate(&der).unwrap());
        assert!(!has_embedded_sct(&der).unwrap());
        assert!(!is_pre_certificate_signing_cert(&der).unwrap());
        assert!(extract_embedded_scts(&der).unwrap().is_empty());
    }

    #[test]
    fn test_poison_extension_detected() {
        let key = test_key();
        // poison extension value is ASN.1 NULL
        let poison = raw_extension(POISON_EXTENSION_OID, true, &[0x05, 0x00]);
        let der = build_cert(&key, vec![poison]).to_der().unwrap();
        assert!(is_pre_certificate(&der).unwrap());
        assert!(!has_embedded_sct(&der).unwrap());
    }

    #[test]
    fn test_precert_signing_eku_detected() {
        let key = test_key();
        let eku = ExtendedKeyUsage::new()
            .other(PRECERTIFICATE_SIGNING_OID)
            .build()
            .unwrap();
        let der = build_cert(&key, vec![eku]).to_der().unwrap();
        assert!(is_pre_certificate_signing_cert(&der).unwrap());
    }

    #[test]
    fn test_embedded_sct_list_extracted() {
        use crate::model::{
            DigitallySigned, HashAlgorithm, LogId, SignatureAlgorithm, Version,
        };
        use crate::serialization::encode_sct;

        let sct = SignedCertificateTimestamp {
            version: Version::V1,
            id: LogId([5u8; 32]),
            timestamp: 1234,
            extensions: vec![],
            signature: DigitallySigned {
                hash_algorithm: HashAlgorithm::Sha256,
                signature_algorithm: SignatureAlgorithm::Ecdsa,
                signature: vec![9, 9, 9],
            },
        };
        let encoded = encode_sct(&sct).unwrap();
        let mut inner = Vec::new();
        inner.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
        inner.extend_from_slice(&encoded);
        let mut list = Vec::new();
        list.extend_from_slice(&(inner.len() as u16).to_be_bytes());
        list.extend_from_slice(&inner);
        // extension contents: OCTET STRING wrapping the TLS list
        let ext_value = der::wrap(der::TAG_OCTET_STRING, &list);

        let key = test_key();
        let ext = raw_extension(SCT_CERTIFICATE_OID, false, &ext_value);
        let cert_der = build_cert(&key, vec![ext]).to_der().unwrap();

        assert!(has_embedded_sct(&cert_der).unwrap());
        let scts = extract_embedded_scts(&cert_der).unwrap();
        assert_eq!(scts.len(), 1);
        assert_eq!(scts[0], sct);
    }
}
