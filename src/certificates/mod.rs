// Certificate extension inspection for Certificate Transparency
//
// Pure inspection over DER-encoded certificates: detects the CT-specific
// extension OIDs, extracts embedded SCT lists, and reconstructs the
// precertificate TBS that an embedded SCT was actually signed over.

pub mod der;
pub mod info;
pub mod precert;

pub use info::{
    extract_embedded_scts, has_embedded_sct, is_pre_certificate, is_pre_certificate_signing_cert,
};
pub use precert::{issuer_key_hash, reconstruct_precert_entry, PrecertEntry};

/// Extended-key-usage OID marking a dedicated precertificate signing CA
pub const PRECERTIFICATE_SIGNING_OID: &str = "1.3.6.1.4.1.11129.2.4.4";
/// Critical poison extension OID carried by precertificates
pub const POISON_EXTENSION_OID: &str = "1.3.6.1.4.1.11129.2.4.3";
/// Non-critical extension OID carrying an embedded SCT list
pub const SCT_CERTIFICATE_OID: &str = "1.3.6.1.4.1.11129.2.4.2";
/// OCSP singleExtensions OID carrying a stapled SCT list
pub const OCSP_SCT_OID: &str = "1.3.6.1.4.1.11129.2.4.5";
