//! REST query executor and HTTP JSON-RPC call, backed by `reqwest`.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use web3data_core::{is_truthy, Chain, ClientConfig, Error, JsonRpcRequest, JsonRpcResponse, Result, RpcId};

use crate::params::QueryParams;

const API_KEY_HEADER: &str = "x-api-key";
const BLOCKCHAIN_ID_HEADER: &str = "x-amberdata-blockchain-id";

/// A decoded REST response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Json(Value),
    /// Raw body of a `format=csv` request.
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(t) => Some(t),
        }
    }

    /// The JSON body, or [`Error::Api`] for a text response.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Self::Json(v) => Ok(v),
            Self::Text(_) => Err(Error::Api("expected a JSON response, got text".into())),
        }
    }
}

/// Resolve `route` against `base` (RFC 3986 relative resolution).
///
/// `base` should end with `/`; otherwise its last segment is replaced.
pub fn join_url(base: &str, route: &str) -> Result<Url> {
    Url::parse(base)
        .and_then(|b| b.join(route))
        .map_err(|e| Error::InvalidUrl(format!("{base} + {route}: {e}")))
}

/// Interpret a response body.
///
/// An empty body, or JSON that is `null`, `false`, `0`, `""`, `[]` or `{}`,
/// is [`Error::EmptyResponse`]. CSV requests are returned as text without
/// parsing.
pub fn classify_body(body: &[u8], params: &QueryParams) -> Result<ApiResponse> {
    if body.is_empty() {
        return Err(Error::EmptyResponse);
    }
    if params.is_csv() {
        return Ok(ApiResponse::Text(String::from_utf8_lossy(body).into_owned()));
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| {
        Error::Api(format!(
            "Unable to parse API response to JSON: {}",
            String::from_utf8_lossy(body)
        ))
    })?;
    if !is_truthy(&value) {
        return Err(Error::EmptyResponse);
    }
    Ok(ApiResponse::Json(value))
}

/// HTTP client bound to one chain.
///
/// Every REST request carries the API key, the chain's blockchain id and the
/// configured `User-Agent`.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    chain: Chain,
    api_key: String,
    rest_base_url: String,
    rpc_url: String,
    headers: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ClientConfig, chain: Chain) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, header_value(API_KEY_HEADER, &config.api_key)?);
        headers.insert(BLOCKCHAIN_ID_HEADER, HeaderValue::from_static(chain.blockchain_id()));
        headers.insert(USER_AGENT, header_value("User-Agent", &config.user_agent)?);

        let mut rest_base_url = config.rest_base_url.clone();
        if !rest_base_url.ends_with('/') {
            rest_base_url.push('/');
        }

        Ok(Self {
            http,
            chain,
            api_key: config.api_key.clone(),
            rest_base_url,
            rpc_url: config.rpc_url.clone(),
            headers,
        })
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// REST base URL, always ending with `/`.
    pub fn base_url(&self) -> &str {
        &self.rest_base_url
    }

    /// Base URL of a resource, e.g. `resource("blocks/123/")`.
    pub fn resource(&self, path: &str) -> String {
        format!("{}{}", self.rest_base_url, path)
    }

    /// Fail with [`Error::UnsupportedChain`] when `operation` is gated on this chain.
    pub fn ensure_supported(&self, operation: &'static str) -> Result<()> {
        self.chain.ensure_supported(operation)
    }

    /// GET `route` resolved against `base`, with `params` as the query string.
    pub async fn query(&self, base: &str, route: &str, params: &QueryParams) -> Result<ApiResponse> {
        let url = join_url(base, route)?;
        tracing::debug!(url = %url, route, chain = %self.chain, "REST query");

        let resp = self
            .http
            .get(url)
            .headers(self.headers.clone())
            .query(params.pairs())
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "REST query returned an error status");
        }
        classify_body(&body, params)
    }

    /// POST a JSON-RPC 2.0 call to the RPC endpoint.
    ///
    /// Only chains with RPC support accept this; others fail before any
    /// request is made. The API key travels as the `x-api-key` query
    /// parameter.
    pub async fn rpc(
        &self,
        method: &str,
        params: Vec<Value>,
        id: impl Into<RpcId>,
    ) -> Result<JsonRpcResponse> {
        self.chain.ensure_rpc()?;

        let req = JsonRpcRequest::new(id, method, params);
        tracing::debug!(method, chain = %self.chain, "RPC call");

        let resp = self
            .http
            .post(&self.rpc_url)
            .header(BLOCKCHAIN_ID_HEADER, self.chain.blockchain_id())
            .query(&[(API_KEY_HEADER, self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let body = resp.bytes().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(serde_json::from_slice::<JsonRpcResponse>(&body)?)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Http(format!("invalid {name} header: {e}")))
}
