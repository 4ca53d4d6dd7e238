use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::Serialize;

use crate::ClientError;
use crate::Document;

pub const DOCUMENT_FORMAT: &str = "MANUAL";
pub const DOCUMENT_TYPE: &str = "LP_INTRODUCE_GOODS";

/// The request body: a base64 JSON document plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub document_format: String,
    pub product_document: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub signature: String,
}

impl Envelope {
    /// Serializes `document` and wraps it for sending.
    pub fn wrap(document: &Document, signature: &str) -> Result<Self, ClientError> {
        let json = serde_json::to_vec(document)?;
        Ok(Self {
            document_format: DOCUMENT_FORMAT.to_string(),
            product_document: STANDARD.encode(json),
            document_type: DOCUMENT_TYPE.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Decodes the wrapped document.
    pub fn document(&self) -> Result<Document, ClientError> {
        let json = STANDARD.decode(&self.product_document)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample;

    #[test]
    fn it_wraps_with_api_metadata() {
        let envelope = Envelope::wrap(&sample(), "c2lnbmF0dXJl").unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["document_format"], "MANUAL");
        assert_eq!(json["type"], "LP_INTRODUCE_GOODS");
        assert_eq!(json["signature"], "c2lnbmF0dXJl");
        assert_eq!(envelope.document().unwrap(), sample());
    }

    #[test]
    fn it_reports_a_corrupt_payload() {
        let mut envelope = Envelope::wrap(&sample(), "sig").unwrap();
        envelope.product_document = "not base64!".into();
        assert!(matches!(envelope.document(), Err(ClientError::Decode(_))));
    }
}
