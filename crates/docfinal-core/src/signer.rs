//! Signer-supplied values and caller context

use crate::data_uri::{DataUri, PNG_MEDIA_TYPE};
use crate::error::FinalizeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which of the two fixed boxes receives the signer's details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    Sender,
    Recipient,
}

impl SignerRole {
    pub fn label(&self) -> &'static str {
        match self {
            SignerRole::Sender => "Sender",
            SignerRole::Recipient => "Recipient",
        }
    }
}

/// Signer fields as received from the caller; any of them may be missing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerInput {
    pub role: Option<SignerRole>,
    pub full_name: Option<String>,
    pub signing_date: Option<NaiveDate>,
    /// PNG data URI
    pub signature_image: Option<String>,
}

/// Validated signer details, immutable for the run
#[derive(Debug, Clone, PartialEq)]
pub struct SignerDetails {
    pub role: SignerRole,
    pub full_name: String,
    pub signing_date: NaiveDate,
    /// The data URI exactly as supplied
    pub signature_image: String,
}

impl TryFrom<&SignerInput> for SignerDetails {
    type Error = FinalizeError;

    fn try_from(input: &SignerInput) -> Result<Self, Self::Error> {
        let role = input
            .role
            .ok_or_else(|| FinalizeError::InvalidSigner("role is required".into()))?;

        let full_name = input
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| FinalizeError::InvalidSigner("full name is required".into()))?
            .to_string();

        let signing_date = input
            .signing_date
            .ok_or_else(|| FinalizeError::InvalidSigner("signing date is required".into()))?;

        let signature_image = input
            .signature_image
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| FinalizeError::InvalidSigner("signature image is required".into()))?
            .to_string();

        Ok(Self {
            role,
            full_name,
            signing_date,
            signature_image,
        })
    }
}

impl SignerDetails {
    /// Decode the signature data URI into raw PNG bytes
    pub fn signature_png(&self) -> Result<Vec<u8>, FinalizeError> {
        let uri = DataUri::parse(&self.signature_image).map_err(FinalizeError::ImageDecode)?;
        if !uri.is(PNG_MEDIA_TYPE) {
            return Err(FinalizeError::ImageDecode(format!(
                "expected {}, got '{}'",
                PNG_MEDIA_TYPE, uri.media_type
            )));
        }
        Ok(uri.data)
    }
}

/// Ambient facts about the calling environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    pub email: Option<String>,
    /// Raw user-agent string used for the device descriptor
    pub user_agent: Option<String>,
}

impl CallerContext {
    /// Email with blank values treated as absent
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
