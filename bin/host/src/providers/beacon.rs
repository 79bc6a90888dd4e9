//! Contains an HTTP client over the subset of the beacon node API the host
//! consumes.

use super::SourceResult;
use alloy_rpc_types_beacon::sidecar::BeaconBlobBundle;
use reqwest::Client;

/// The beacon genesis engine api method.
const GENESIS_METHOD: &str = "eth/v1/beacon/genesis";

/// The config spec engine api method.
const SPEC_METHOD: &str = "eth/v1/config/spec";

/// The blob sidecars engine api method prefix.
const SIDECARS_METHOD_PREFIX: &str = "eth/v1/beacon/blob_sidecars";

/// A reduced genesis data payload.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenesisData {
    /// The genesis time.
    #[serde(rename = "genesis_time")]
    #[serde(with = "alloy_serde::quantity")]
    pub genesis_time: u64,
}

/// The response to a beacon genesis request.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BeaconGenesisResponse {
    /// The data.
    pub data: GenesisData,
}

/// A reduced config spec payload.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SpecData {
    /// The seconds per slot.
    #[serde(rename = "SECONDS_PER_SLOT")]
    #[serde(with = "alloy_serde::quantity")]
    pub seconds_per_slot: u64,
}

/// The response to a config spec request.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BeaconSpecResponse {
    /// The data.
    pub data: SpecData,
}

/// An HTTP client for the beacon node API.
#[derive(Debug, Clone)]
pub struct OnlineBeaconClient {
    /// The base url.
    base: String,
    /// The inner reqwest client.
    inner: Client,
}

impl OnlineBeaconClient {
    /// Creates a new [OnlineBeaconClient] from the given base url.
    pub fn new_http(mut base: String) -> Self {
        // Remove trailing slashes to avoid double-slash paths.
        while base.ends_with('/') {
            base.pop();
        }
        Self { base, inner: Client::new() }
    }

    /// Fetches the beacon chain genesis information.
    pub async fn beacon_genesis(&self) -> SourceResult<BeaconGenesisResponse> {
        let response = self
            .inner
            .get(format!("{}/{}", self.base, GENESIS_METHOD))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches the beacon chain config spec.
    pub async fn config_spec(&self) -> SourceResult<BeaconSpecResponse> {
        let response = self
            .inner
            .get(format!("{}/{}", self.base, SPEC_METHOD))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches all blob sidecars confirmed in the given slot.
    pub async fn beacon_blob_sidecars(&self, slot: u64) -> SourceResult<BeaconBlobBundle> {
        let response = self
            .inner
            .get(format!("{}/{}/{}", self.base, SIDECARS_METHOD_PREFIX, slot))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
