//! DTOs for decoding provider JSON responses.
//!
//! Provider builds disagree on the power flag's field name, so both spellings
//! are accepted.

use serde::Deserialize;

use crate::domain::ports::CatalogDevice;
use crate::domain::{DeviceId, Hostname};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProviderDeviceDto {
    pub(super) id: i32,
    pub(super) hostname: String,
    #[serde(default, alias = "isTurnedOn")]
    pub(super) is_turn_on: bool,
}

impl ProviderDeviceDto {
    pub(super) fn into_catalog_device(self) -> Result<CatalogDevice, String> {
        let id = DeviceId::new(self.id).map_err(|err| format!("device {}: {err}", self.id))?;
        let hostname = Hostname::new(self.hostname.trim())
            .map_err(|err| format!("device {}: {err}", self.id))?;
        Ok(CatalogDevice {
            id,
            hostname,
            is_turn_on: self.is_turn_on,
        })
    }
}
