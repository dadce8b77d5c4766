//! Reqwest-backed power-control adapter.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP status mapping, and JSON decoding into catalog devices.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::ProviderDeviceDto;
use crate::domain::DeviceId;
use crate::domain::ports::{CatalogDevice, PowerControl, PowerControlError};

/// Provider client issuing one HTTP request per port operation.
pub struct HttpPowerControl {
    client: Client,
    base: Url,
}

impl HttpPowerControl {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: normalise_base(base),
        })
    }

    async fn switch(&self, port: DeviceId, state: &str) -> Result<(), PowerControlError> {
        let url = endpoint(&self.base, &format!("device/{port}/{state}"))?;
        debug!(%url, "switching device power");
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response.status(), port)
    }
}

#[async_trait]
impl PowerControl for HttpPowerControl {
    async fn list_devices(&self) -> Result<Vec<CatalogDevice>, PowerControlError> {
        let url = endpoint(&self.base, "device")?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PowerControlError::status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        parse_catalog(body.as_ref())
    }

    async fn device(&self, port: DeviceId) -> Result<CatalogDevice, PowerControlError> {
        let url = endpoint(&self.base, &format!("device/{port}"))?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response.status(), port)?;
        let body = response.bytes().await.map_err(map_transport_error)?;
        parse_device(body.as_ref())
    }

    async fn power_on(&self, port: DeviceId) -> Result<(), PowerControlError> {
        self.switch(port, "on").await
    }

    async fn power_off(&self, port: DeviceId) -> Result<(), PowerControlError> {
        self.switch(port, "off").await
    }
}

/// Relative joins drop the last path segment unless the base ends in `/`.
fn normalise_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

fn endpoint(base: &Url, path: &str) -> Result<Url, PowerControlError> {
    base.join(path)
        .map_err(|err| PowerControlError::transport(format!("invalid provider url: {err}")))
}

fn check_status(status: StatusCode, port: DeviceId) -> Result<(), PowerControlError> {
    match status {
        StatusCode::NOT_FOUND => Err(PowerControlError::not_found(port.port())),
        s if s.is_success() => Ok(()),
        s => Err(PowerControlError::status(s.as_u16())),
    }
}

fn map_transport_error(error: reqwest::Error) -> PowerControlError {
    PowerControlError::transport(error.to_string())
}

fn parse_device(body: &[u8]) -> Result<CatalogDevice, PowerControlError> {
    let decoded: ProviderDeviceDto = serde_json::from_slice(body).map_err(|error| {
        PowerControlError::decode(format!("invalid provider device payload: {error}"))
    })?;
    decoded
        .into_catalog_device()
        .map_err(PowerControlError::decode)
}

fn parse_catalog(body: &[u8]) -> Result<Vec<CatalogDevice>, PowerControlError> {
    let decoded: Vec<ProviderDeviceDto> = serde_json::from_slice(body).map_err(|error| {
        PowerControlError::decode(format!("invalid provider catalog payload: {error}"))
    })?;
    decoded
        .into_iter()
        .map(ProviderDeviceDto::into_catalog_device)
        .collect::<Result<Vec<_>, _>>()
        .map_err(PowerControlError::decode)
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network helpers.

    use super::*;
    use rstest::rstest;

    fn port(n: i32) -> DeviceId {
        DeviceId::new(n).expect("valid port")
    }

    #[rstest]
    #[case("http://rubus_provider:1080", "http://rubus_provider:1080/device/5/on")]
    #[case("http://rubus_provider:1080/", "http://rubus_provider:1080/device/5/on")]
    #[case("http://gateway/poe", "http://gateway/poe/device/5/on")]
    fn joins_paths_onto_base(#[case] base: &str, #[case] expected: &str) {
        let base = normalise_base(Url::parse(base).expect("base url"));
        let url = endpoint(&base, "device/5/on").expect("joined");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case(StatusCode::OK, None)]
    #[case(StatusCode::NO_CONTENT, None)]
    #[case(StatusCode::NOT_FOUND, Some(PowerControlError::not_found(3)))]
    #[case(StatusCode::BAD_GATEWAY, Some(PowerControlError::status(502_u16)))]
    fn maps_statuses(#[case] status: StatusCode, #[case] expected: Option<PowerControlError>) {
        assert_eq!(check_status(status, port(3)), expected.map_or(Ok(()), Err));
    }

    #[test]
    fn accepts_both_power_flag_spellings() {
        let body = br#"[
            {"id": 1, "isTurnedOn": true, "hostname": "pi01\n"},
            {"id": 2, "isTurnOn": false, "hostname": "pi02"},
            {"id": 3, "hostname": "pi03"}
        ]"#;
        let catalog = parse_catalog(body).expect("catalog decodes");

        assert_eq!(catalog.len(), 3);
        assert!(catalog[0].is_turn_on);
        assert_eq!(catalog[0].hostname.as_ref(), "pi01");
        assert!(!catalog[1].is_turn_on);
        assert!(!catalog[2].is_turn_on);
    }

    #[rstest]
    #[case::not_json(b"<html>oops</html>".as_slice())]
    #[case::bad_port(br#"{"id": 0, "hostname": "pi00"}"#.as_slice())]
    #[case::bad_hostname(br#"{"id": 4, "hostname": "pi 04"}"#.as_slice())]
    fn rejects_invalid_device_payloads(#[case] body: &[u8]) {
        let err = parse_device(body).expect_err("decode should fail");
        assert!(
            matches!(err, PowerControlError::Decode { .. }),
            "expected decode error, got {err:?}"
        );
    }
}
