//! Blocking HTTP client for the asset registry

use super::RegistryClient;
use crate::core::config::KapConfig;
use crate::core::error::{KapError, KapResult, RegistryError, ValidationError};
use crate::model::reference::split_full_name;
use crate::model::{AssetDefinition, AssetReference, AssetVersion, ReferenceMap, Reservation, ReservationRequest};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for one registry instance
pub struct HttpRegistry {
  client: Client,
  base_url: String,
  auth_token: Option<String>,
}

#[derive(Serialize)]
struct UpdateDependenciesRequest<'a> {
  asset: &'a AssetDefinition,
  references: &'a [ReferenceMap],
}

impl HttpRegistry {
  /// Create a client from configuration
  pub fn new(config: &KapConfig) -> KapResult<Self> {
    let client = Client::builder()
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .user_agent(concat!("kapctl/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| RegistryError::Transport { message: e.to_string() })?;

    Ok(Self {
      client,
      base_url: config.registry_base().to_string(),
      auth_token: config.auth_token.clone(),
    })
  }

  /// Registry base URL
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}/v1/registry{}", self.base_url, path)
  }

  fn version_path(full_name: &str, version: &str) -> KapResult<String> {
    let (handle, name) = split_full_name(full_name).ok_or_else(|| ValidationError::InvalidReference {
      reference: full_name.to_string(),
    })?;
    Ok(format!("/{}/{}/{}", handle, name, version))
  }

  fn send(&self, request: RequestBuilder) -> KapResult<Response> {
    let request = match &self.auth_token {
      Some(token) => request.bearer_auth(token),
      None => request,
    };
    request.send().map_err(|e| self.transport_error(e))
  }

  fn transport_error(&self, err: reqwest::Error) -> KapError {
    if err.is_connect() {
      KapError::Registry(RegistryError::Unavailable {
        url: self.base_url.clone(),
      })
    } else {
      KapError::Registry(RegistryError::Transport { message: err.to_string() })
    }
  }

  /// Fail on non-success status, surfacing the server's message verbatim
  fn check(response: Response) -> KapResult<Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(KapError::Registry(RegistryError::Response {
      status: status.as_u16(),
      message: error_message(status, &body),
    }))
  }

  fn decode<T: DeserializeOwned>(response: Response) -> KapResult<T> {
    let response = Self::check(response)?;
    response.json::<T>().map_err(|e| {
      KapError::Registry(RegistryError::Decode {
        message: e.to_string(),
      })
    })
  }

  fn decode_optional<T: DeserializeOwned>(response: Response) -> KapResult<Option<T>> {
    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Self::decode(response).map(Some)
  }

  fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> KapResult<Response> {
    let url = self.url(path);
    tracing::debug!(%url, "POST");
    self.send(self.client.post(url).json(body))
  }

  fn get(&self, path: &str) -> KapResult<Response> {
    let url = self.url(path);
    tracing::debug!(%url, "GET");
    self.send(self.client.get(url))
  }
}

/// Extract `message` / `error` from a JSON error body, else use the raw body
fn error_message(status: StatusCode, body: &str) -> String {
  let from_json = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|value| {
    ["message", "error"]
      .iter()
      .find_map(|key| value.get(key).and_then(|m| m.as_str()).map(str::to_string))
  });

  match from_json {
    Some(message) => message,
    None if !body.trim().is_empty() => body.trim().to_string(),
    None => format!("Registry responded with {}", status),
  }
}

impl RegistryClient for HttpRegistry {
  fn resolve_dependencies(&self, asset: &AssetDefinition) -> KapResult<Vec<AssetReference>> {
    Self::decode(self.post("/dependencies/resolve", asset)?)
  }

  fn update_dependencies(&self, asset: &AssetDefinition, mappings: &[ReferenceMap]) -> KapResult<AssetDefinition> {
    let body = UpdateDependenciesRequest {
      asset,
      references: mappings,
    };
    Self::decode(self.post("/dependencies/update", &body)?)
  }

  fn reserve_versions(&self, request: &ReservationRequest) -> KapResult<Reservation> {
    let response = Self::check(self.post("/reserve", request)?)?;
    let body = response.text().map_err(|e| self.transport_error(e))?;
    if body.trim().is_empty() || body.trim() == "null" {
      return Err(KapError::Reservation {
        message: "registry returned no reservation".to_string(),
      });
    }
    serde_json::from_str(&body).map_err(|e| {
      KapError::Registry(RegistryError::Decode {
        message: e.to_string(),
      })
    })
  }

  fn commit_reservation(&self, reservation_id: &str, versions: &[AssetVersion]) -> KapResult<()> {
    let url = self.url("/commit");
    tracing::debug!(%url, reservation_id, "POST");
    let request = self
      .client
      .post(url)
      .header("X-Reservation-Id", reservation_id)
      .json(versions);
    Self::check(self.send(request)?)?;
    Ok(())
  }

  fn abort_reservation(&self, reservation: &Reservation) -> KapResult<()> {
    let url = self.url(&format!("/reservations/{}", reservation.id));
    tracing::debug!(%url, "DELETE");
    Self::check(self.send(self.client.delete(url))?)?;
    Ok(())
  }

  fn get_version(&self, full_name: &str, version: &str) -> KapResult<Option<AssetVersion>> {
    Self::decode_optional(self.get(&Self::version_path(full_name, version)?)?)
  }

  fn get_latest_version(&self, full_name: &str) -> KapResult<Option<AssetVersion>> {
    Self::decode_optional(self.get(&Self::version_path(full_name, "latest")?)?)
  }
}
