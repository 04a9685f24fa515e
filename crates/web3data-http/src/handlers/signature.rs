//! Function/event signature lookup (`signatures/...`).

use web3data_core::Result;

use crate::client::{ApiResponse, RestClient};
use crate::params::QueryParams;

#[derive(Debug, Clone, Copy)]
pub struct SignatureHandler<'a> {
    client: &'a RestClient,
}

impl<'a> SignatureHandler<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Text signatures matching a 4-byte selector or event topic hash.
    pub async fn details(&self, signature: &str) -> Result<ApiResponse> {
        self.client.ensure_supported("signature.details")?;
        let base = self.client.resource("signatures/");
        self.client.query(&base, signature, &QueryParams::new()).await
    }
}
