use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use super::ConfigError;

/// Methods allowed when the policy does not list any.
const DEFAULT_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::PATCH,
];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOrigin {
    One(String),
    Many(Vec<String>),
}

/// The `CORS` variable as written by an operator, e.g.
/// `{"origin": ["https://dash.example"], "credentials": true}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawCorsPolicy {
    origin: Option<RawOrigin>,
    allow_methods: Option<Vec<String>>,
    allow_headers: Option<Vec<String>>,
    expose_headers: Option<Vec<String>>,
    max_age: Option<u64>,
    credentials: Option<bool>,
}

/// Validated CORS policy. `None` origins means any origin.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    origins: Option<Vec<HeaderValue>>,
    methods: Option<Vec<Method>>,
    allow_headers: Option<Vec<HeaderName>>,
    expose_headers: Vec<HeaderName>,
    max_age: Option<Duration>,
    credentials: bool,
}

impl CorsPolicy {
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        let raw: RawCorsPolicy =
            serde_json::from_str(json).map_err(|e| ConfigError::Cors(e.to_string()))?;

        let origins = match raw.origin {
            None => None,
            Some(RawOrigin::One(origin)) if origin == "*" => None,
            Some(RawOrigin::One(origin)) => Some(vec![header_value(&origin)?]),
            Some(RawOrigin::Many(list)) if list.iter().any(|o| o == "*") => None,
            Some(RawOrigin::Many(list)) => Some(
                list.iter()
                    .map(|origin| header_value(origin))
                    .collect::<Result<_, _>>()?,
            ),
        };

        let methods = raw
            .allow_methods
            .map(|list| {
                list.iter()
                    .map(|m| {
                        Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                            .map_err(|_| ConfigError::Cors(format!("invalid method {:?}", m)))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let allow_headers = raw
            .allow_headers
            .map(|list| header_names(&list))
            .transpose()?;
        let expose_headers = header_names(&raw.expose_headers.unwrap_or_default())?;

        Ok(Self {
            origins,
            methods,
            allow_headers,
            expose_headers,
            max_age: raw.max_age.map(Duration::from_secs),
            credentials: raw.credentials.unwrap_or(false),
        })
    }

    pub fn layer(&self) -> CorsLayer {
        let origin = match (&self.origins, self.credentials) {
            (Some(list), _) => AllowOrigin::list(list.iter().cloned()),
            // A wildcard cannot be combined with credentials; echo the caller instead.
            (None, true) => AllowOrigin::mirror_request(),
            (None, false) => AllowOrigin::any(),
        };

        let headers = match &self.allow_headers {
            Some(list) => AllowHeaders::list(list.iter().cloned()),
            None => AllowHeaders::mirror_request(),
        };

        let methods = self
            .methods
            .clone()
            .unwrap_or_else(|| DEFAULT_METHODS.to_vec());

        let mut layer = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .expose_headers(self.expose_headers.clone())
            .allow_credentials(self.credentials);

        if let Some(max_age) = self.max_age {
            layer = layer.max_age(max_age);
        }
        layer
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::Cors(format!("invalid origin {:?}", value)))
}

fn header_names(list: &[String]) -> Result<Vec<HeaderName>, ConfigError> {
    list.iter()
        .map(|name| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::Cors(format!("invalid header name {:?}", name)))
        })
        .collect()
}
