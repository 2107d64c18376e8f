//! Japanese postal-code → address lookup.
//!
//! Queries a postal-code REST API (by default <https://postcode.teraren.com/>)
//! and turns the result into the values an address form is patched with.
//! An unknown code or an unreachable service is not an error: the lookup
//! simply finds nothing and the user types the address by hand.

mod form;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use contactdesk_shared::{AddressConfig, ContactDeskError, Result};

pub use form::{AddressForm, AddressFormInput, validate_address_form};

/// User-Agent string for lookup requests.
const USER_AGENT: &str = concat!("ContactDesk/", env!("CARGO_PKG_VERSION"));

/// Longest postal code accepted, in digits. Japanese codes are seven; the
/// headroom lets the same client front other digit-only postal APIs.
const MAX_POSTAL_CODE_LEN: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An address record as returned by the postal-code API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub prefecture: String,
    pub city: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub street_address: Option<String>,
}

/// Form values derived from an [`Address`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPatch {
    pub prefecture: String,
    pub city: String,
    pub street: String,
}

impl Address {
    /// Values to write into the prefecture / city / street fields.
    pub fn to_patch(&self) -> AddressPatch {
        AddressPatch {
            prefecture: self.prefecture.clone(),
            city: format!("{}{}", self.city, self.suburb),
            street: self.street_address.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup client
// ---------------------------------------------------------------------------

/// Client for the postal-code REST API.
#[derive(Debug, Clone)]
pub struct AddressLookup {
    client: Client,
    base_url: Url,
}

impl AddressLookup {
    pub fn new(config: &AddressConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ContactDeskError::config(format!("invalid address.base_url '{}': {e}", config.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContactDeskError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Look up the address for `postal_code`.
    ///
    /// Hyphens and spaces are ignored; anything else that is not a digit is a
    /// `Validation` error. Returns `Ok(None)` when the service does not know
    /// the code or cannot be reached.
    #[instrument(skip(self))]
    pub async fn lookup(&self, postal_code: &str) -> Result<Option<Address>> {
        let code = normalize_postal_code(postal_code)?;
        let url = self.endpoint(&code)?;

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "postal-code service unreachable");
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "postal code not found");
            return Ok(None);
        }

        let address: Address = response
            .json()
            .await
            .map_err(|e| ContactDeskError::parse(format!("postal-code response: {e}")))?;

        info!(%code, prefecture = %address.prefecture, "postal code resolved");
        Ok(Some(address))
    }

    /// `{base_url}/postcodes/{code}.json`
    fn endpoint(&self, code: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ContactDeskError::config("address.base_url cannot be a base URL"))?
            .pop_if_empty()
            .push("postcodes")
            .push(&format!("{code}.json"));
        Ok(url)
    }
}

/// Strip separators and check the code is ASCII digits, at most
/// [`MAX_POSTAL_CODE_LEN`] of them.
fn normalize_postal_code(raw: &str) -> Result<String> {
    let code: String = raw.chars().filter(|c| !matches!(c, '-' | ' ')).collect();

    if code.is_empty() {
        return Err(ContactDeskError::validation("postal code is empty"));
    }
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ContactDeskError::validation(format!(
            "postal code must be digits only, got '{raw}'"
        )));
    }
    if code.len() > MAX_POSTAL_CODE_LEN {
        return Err(ContactDeskError::validation(format!(
            "postal code has {} digits, at most {MAX_POSTAL_CODE_LEN} allowed",
            code.len()
        )));
    }
    Ok(code)
}
