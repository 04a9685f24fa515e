//! Per-resource endpoint handlers.
//!
//! Each handler borrows a [`RestClient`](crate::RestClient) and maps its
//! methods to routes under one resource base URL. Methods that are gated on
//! limited chains fail with `UnsupportedChain` before any request is made.

pub mod address;
pub mod block;
pub mod contract;
pub mod market;
pub mod signature;
pub mod token;
pub mod transaction;

pub use address::AddressHandler;
pub use block::BlockHandler;
pub use contract::ContractHandler;
pub use market::MarketHandler;
pub use signature::SignatureHandler;
pub use token::TokenHandler;
pub use transaction::TransactionHandler;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{QueryParams, RestClient};
    use web3data_core::{Chain, ClientConfig, Error};

    fn client(chain: Chain) -> RestClient {
        // Nothing listens here; gated calls must fail before connecting.
        let mut config = ClientConfig::new("key");
        config.rest_base_url = "http://127.0.0.1:9/api/v2/".into();
        RestClient::new(&config, chain).unwrap()
    }

    fn assert_gated(result: web3data_core::Result<crate::ApiResponse>, operation: &str) {
        match result {
            Err(Error::UnsupportedChain { operation: op, .. }) => assert_eq!(op, operation),
            other => panic!("{operation}: expected UnsupportedChain, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn limited_chains_gate_before_any_request() {
        let p = QueryParams::new();
        for chain in Chain::ALL.into_iter().filter(|c| c.is_limited()) {
            let client = client(chain);

            let address = AddressHandler::new(&client);
            assert_gated(address.internal_messages("0x1", &p).await, "address.internal_messages");
            assert_gated(address.logs("0x1", &p).await, "address.logs");
            assert_gated(
                address.token_balances_historical("0x1", &p).await,
                "address.token_balances_historical",
            );
            assert_gated(address.token_balances_latest("0x1", &p).await, "address.token_balances_latest");
            assert_gated(address.token_transfers("0x1", &p).await, "address.token_transfers");

            let block = BlockHandler::new(&client);
            assert_gated(block.functions("1", &p).await, "block.functions");
            assert_gated(block.logs("1", &p).await, "block.logs");
            assert_gated(block.token_transfers("1", &p).await, "block.token_transfers");

            let contract = ContractHandler::new(&client);
            assert_gated(contract.audit("0x1", &p).await, "contract.audit");
            assert_gated(contract.details("0x1", &p).await, "contract.details");
            assert_gated(contract.functions("0x1", &p).await, "contract.functions");

            let market = MarketHandler::new(&client);
            assert_gated(market.token_rankings_historical(&p).await, "market.token_rankings_historical");
            assert_gated(market.token_rankings_latest(&p).await, "market.token_rankings_latest");

            assert_gated(SignatureHandler::new(&client).details("0xa9059cbb").await, "signature.details");

            let token = TokenHandler::new(&client);
            assert_gated(token.holders_historical("0x1", &p).await, "token.holders_historical");
            assert_gated(token.holders_latest("0x1", &p).await, "token.holders_latest");
            assert_gated(token.supply_historical("0x1", &p).await, "token.supply_historical");
            assert_gated(token.supply_latest("0x1").await, "token.supply_latest");
            assert_gated(token.transfers("0x1", &p).await, "token.transfers");
            assert_gated(token.velocity("0x1", &p).await, "token.velocity");
            assert_gated(token.volume("0x1", &p).await, "token.volume");

            let tx = TransactionHandler::new(&client);
            assert_gated(tx.token_transfers("0x1").await, "transaction.token_transfers");
            assert_gated(tx.gas_percentiles(&p).await, "transaction.gas_percentiles");
            assert_gated(tx.gas_predictions().await, "transaction.gas_predictions");
        }
    }

    #[tokio::test]
    async fn ungated_calls_reach_the_network_on_limited_chains() {
        let client = client(Chain::Btc);
        let err = BlockHandler::new(&client)
            .single("1", &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "{err:?}");
    }
}
