//! Network parameters for the supported UTXO chains.
//!
//! Only the address version bytes differ between networks as far as the
//! bridge is concerned; regtest shares testnet's encodings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named UTXO network the bridge can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
	Mainnet,
	Testnet,
	#[default]
	Regtest,
}

impl Network {
	/// Returns the address parameters for this network.
	pub fn params(&self) -> ChainParams {
		match self {
			Network::Mainnet => ChainParams::QTUM_MAINNET,
			Network::Testnet | Network::Regtest => ChainParams::QTUM_TESTNET,
		}
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Network::Mainnet => "mainnet",
			Network::Testnet => "testnet",
			Network::Regtest => "regtest",
		};
		f.write_str(name)
	}
}

impl FromStr for Network {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mainnet" => Ok(Network::Mainnet),
			"testnet" => Ok(Network::Testnet),
			"regtest" => Ok(Network::Regtest),
			other => Err(format!(
				"Unknown network '{}', expected mainnet, testnet or regtest",
				other
			)),
		}
	}
}

/// Address encoding parameters for a UTXO network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
	/// Human readable network name.
	pub name: &'static str,
	/// Version byte prepended to pay-to-pubkey-hash addresses.
	pub pubkey_hash_addr_id: u8,
	/// Version byte prepended to pay-to-script-hash addresses.
	pub script_hash_addr_id: u8,
}

impl ChainParams {
	/// Qtum mainnet: P2PKH addresses start with `Q`.
	pub const QTUM_MAINNET: ChainParams = ChainParams {
		name: "mainnet",
		pubkey_hash_addr_id: 0x3a,
		script_hash_addr_id: 0x32,
	};

	/// Qtum testnet and regtest: P2PKH addresses start with `q`.
	pub const QTUM_TESTNET: ChainParams = ChainParams {
		name: "testnet",
		pubkey_hash_addr_id: 0x78,
		script_hash_addr_id: 0x6e,
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_network_parsing() {
		assert_eq!("regtest".parse::<Network>().unwrap(), Network::Regtest);
		assert_eq!("MAINNET".parse::<Network>().unwrap(), Network::Mainnet);
		assert!("signet".parse::<Network>().is_err());
	}

	#[test]
	fn test_regtest_uses_testnet_params() {
		assert_eq!(Network::Regtest.params(), ChainParams::QTUM_TESTNET);
		assert_eq!(Network::Mainnet.params().pubkey_hash_addr_id, 0x3a);
	}

	#[test]
	fn test_network_serde_lowercase() {
		#[derive(Deserialize)]
		struct Wrapper {
			network: Network,
		}
		let parsed: Wrapper = toml::from_str("network = \"testnet\"").unwrap();
		assert_eq!(parsed.network, Network::Testnet);
	}
}
