//! Chains served by the API and the per-chain capability table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A blockchain supported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Btc,
    Bch,
    Bsv,
    Eth,
    EthRinkeby,
    Ltc,
    Zec,
}

impl Chain {
    /// Every chain, in the order the top-level client exposes them.
    pub const ALL: [Chain; 7] = [
        Self::Btc,
        Self::Bch,
        Self::Bsv,
        Self::Eth,
        Self::EthRinkeby,
        Self::Ltc,
        Self::Zec,
    ];

    /// Value of the `x-amberdata-blockchain-id` header for this chain.
    pub fn blockchain_id(self) -> &'static str {
        match self {
            Self::Btc => "408fa195a34b533de9ad9889f076045e",
            Self::Bch => "43b45e71cc0615b491cb699e7071fc06",
            Self::Bsv => "a818635d36dbe125e26167c4438e2217",
            Self::Eth => "1c9c969065fcd1cf",
            Self::EthRinkeby => "1b3f7a72b3e99c13",
            Self::Ltc => "f94be61fd9f4fa684f992ddfd4e92272",
            Self::Zec => "b7d4f994f33c709be4ce6cbae31d7b8e",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Btc => "btc",
            Self::Bch => "bch",
            Self::Bsv => "bsv",
            Self::Eth => "eth",
            Self::EthRinkeby => "eth-rinkeby",
            Self::Ltc => "ltc",
            Self::Zec => "zec",
        }
    }

    /// UTXO chains only serve the common endpoints (blocks, transactions,
    /// balances, market data). Account-model features such as logs, token
    /// transfers and contracts are gated.
    pub fn is_limited(self) -> bool {
        matches!(
            self,
            Self::Btc | Self::Bch | Self::Bsv | Self::Ltc | Self::Zec
        )
    }

    /// Chains reachable through the JSON-RPC endpoint.
    pub fn supports_rpc(self) -> bool {
        matches!(self, Self::Eth | Self::EthRinkeby | Self::Btc)
    }

    /// Fail with [`Error::UnsupportedChain`] if `operation` is gated on this chain.
    pub fn ensure_supported(self, operation: &'static str) -> Result<(), Error> {
        if self.is_limited() {
            return Err(Error::UnsupportedChain {
                chain: self,
                operation,
            });
        }
        Ok(())
    }

    /// Fail with [`Error::UnsupportedChain`] if RPC calls are not available.
    pub fn ensure_rpc(self) -> Result<(), Error> {
        if !self.supports_rpc() {
            return Err(Error::UnsupportedChain {
                chain: self,
                operation: "rpc",
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Chain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|chain| chain.slug() == normalized)
            .ok_or_else(|| Error::UnknownChain(s.to_string()))
    }
}
