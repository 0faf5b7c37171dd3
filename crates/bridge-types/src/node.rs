//! Payloads returned by the UTXO-chain node's RPC interface.
//!
//! Field names follow the node's JSON. Amounts are reported by the node as
//! decimal QTUM numbers and are parsed straight into [`Decimal`] so that no
//! binary floating point is involved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of `listunspent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnspentOutput {
	pub txid: String,
	pub vout: u32,
	pub address: String,
	/// Locking script, hex encoded.
	#[serde(rename = "scriptPubKey")]
	pub script_pub_key: String,
	/// Amount in QTUM with at most 8 fractional digits.
	#[serde(with = "amount_serde")]
	pub amount: Decimal,
	pub confirmations: i64,
	#[serde(default)]
	pub spendable: bool,
}

/// Result of `getaddressinfo`, trimmed to the flags the bridge needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub ismine: bool,
	#[serde(default)]
	pub iswatchonly: bool,
}

/// Result of `getwalletinfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletInfo {
	#[serde(default)]
	pub walletname: String,
	#[serde(default)]
	pub txcount: u64,
}

/// Locking-script description embedded in verbose outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPubKeyInfo {
	#[serde(default)]
	pub hex: String,
	#[serde(default, rename = "type")]
	pub script_type: String,
	#[serde(default)]
	pub addresses: Vec<String>,
}

/// Result of `gettxout`. Spent outputs come back as `null`, which callers see
/// as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TxOutInfo {
	#[serde(default)]
	pub bestblock: String,
	#[serde(default)]
	pub confirmations: i64,
	#[serde(default, rename = "scriptPubKey")]
	pub script_pub_key: ScriptPubKeyInfo,
	#[serde(default)]
	pub coinbase: bool,
	#[serde(default)]
	pub coinstake: bool,
}

/// Input of a verbose raw transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vin {
	#[serde(default)]
	pub txid: Option<String>,
	#[serde(default)]
	pub vout: Option<u32>,
	/// Address of the spent output, present on nodes with address indexing.
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default, rename = "valueSat")]
	pub amount_satoshi: Option<i64>,
}

/// Output of a verbose raw transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vout {
	#[serde(default)]
	pub n: u32,
	#[serde(default, rename = "valueSat")]
	pub amount_satoshi: i64,
	#[serde(default, rename = "scriptPubKey")]
	pub script_pub_key: ScriptPubKeyInfo,
}

/// Result of `getrawtransaction <txid> true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionVerbose {
	pub txid: String,
	#[serde(default)]
	pub hash: String,
	#[serde(default)]
	pub vin: Vec<Vin>,
	#[serde(default)]
	pub vout: Vec<Vout>,
}

/// Result of `getblock <hash> 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockVerbose {
	pub hash: String,
	#[serde(default)]
	pub height: u64,
	#[serde(default)]
	pub tx: Vec<String>,
}

/// (De)serializes QTUM amounts without going through `f64`.
///
/// Accepts JSON numbers and strings. Numbers are taken from their textual form
/// (serde_json is built with `arbitrary_precision`), including exponent
/// notation such as `1e-8`, and rounded to 8 places.
pub mod amount_serde {
	use rust_decimal::Decimal;
	use serde::{de::Error, Deserialize, Deserializer, Serializer};
	use std::str::FromStr;

	pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.normalize().to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = match serde_json::Value::deserialize(deserializer)? {
			serde_json::Value::Number(n) => n.to_string(),
			serde_json::Value::String(s) => s,
			other => {
				return Err(D::Error::custom(format!(
					"expected amount as number or string, got {}",
					other
				)))
			},
		};
		parse(&text).map_err(D::Error::custom)
	}

	pub(crate) fn parse(text: &str) -> Result<Decimal, String> {
		let parsed = if text.contains(['e', 'E']) {
			Decimal::from_scientific(text)
		} else {
			Decimal::from_str(text)
		};
		parsed
			.map(|d| d.round_dp(8))
			.map_err(|e| format!("invalid amount '{}': {}", text, e))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::str::FromStr;

	#[test]
	fn test_unspent_output_from_node_json() {
		let utxo: UnspentOutput = serde_json::from_value(json!({
			"txid": "06d48766c315b30b08cdcc2c34dc062ee4b3885dfc2414d5940c25225e058c2b",
			"vout": 1,
			"address": "qeVQ5JF6idPcrg1u9M3pCryXeebpj3Tbpk",
			"scriptPubKey": "76a914e599be870c63d68a00a5019906d258a4ba5d1bac88ac",
			"amount": 0.01,
			"confirmations": 9,
			"spendable": true,
			"solvable": true
		}))
		.unwrap();
		assert_eq!(utxo.amount, Decimal::from_str("0.01").unwrap());
		assert_eq!(utxo.vout, 1);
		assert!(utxo.spendable);
	}

	#[test]
	fn test_amount_parsing_variants() {
		assert_eq!(
			amount_serde::parse("1e-8").unwrap(),
			Decimal::from_str("0.00000001").unwrap()
		);
		assert_eq!(
			amount_serde::parse("20000.0").unwrap(),
			Decimal::from(20000)
		);
		assert!(amount_serde::parse("abc").is_err());

		let utxo: Result<UnspentOutput, _> = serde_json::from_value(json!({
			"txid": "00", "vout": 0, "address": "q", "scriptPubKey": "",
			"amount": true, "confirmations": 1
		}));
		assert!(utxo.is_err());
	}

	#[test]
	fn test_amount_keeps_every_significant_digit() {
		// 17 significant digits, more than an f64 carries.
		let utxo: UnspentOutput = serde_json::from_str(
			r#"{"txid":"00","vout":0,"address":"q","scriptPubKey":"","amount":90071992.54740993,"confirmations":1}"#,
		)
		.unwrap();
		assert_eq!(utxo.amount, Decimal::from_str("90071992.54740993").unwrap());

		let amount: Wrapped = serde_json::from_str(r#"{"amount":21000000.00000001}"#).unwrap();
		assert_eq!(amount.amount.to_string(), "21000000.00000001");
	}

	#[derive(Deserialize)]
	struct Wrapped {
		#[serde(with = "amount_serde")]
		amount: Decimal,
	}

	#[test]
	fn test_txout_tolerates_empty_object() {
		let out: TxOutInfo = serde_json::from_str("{}").unwrap();
		assert!(!out.coinstake);

		let none: Option<TxOutInfo> = serde_json::from_str("null").unwrap();
		assert!(none.is_none());
	}

	#[test]
	fn test_raw_transaction_verbose() {
		let tx: RawTransactionVerbose = serde_json::from_value(json!({
			"txid": "ebcb",
			"vin": [{"txid": "2485", "vout": 2, "address": "Qc6iYCZWn4BauKXGYirRG8pMtgdHMk2dzn", "valueSat": 10042384175i64}],
			"vout": [
				{"n": 0, "valueSat": 0, "scriptPubKey": {"hex": "", "type": "nonstandard"}},
				{"n": 2, "valueSat": 8801920, "scriptPubKey": {
					"hex": "76a91493594441cb5de8b497ad8467d55412c2a0ef365988ac",
					"type": "pubkeyhash",
					"addresses": ["Qa36NrNdFgr4XeMxKdZeSZ1FGCdSNLmqXh"]
				}}
			]
		}))
		.unwrap();
		assert_eq!(
			tx.vin[0].address.as_deref(),
			Some("Qc6iYCZWn4BauKXGYirRG8pMtgdHMk2dzn")
		);
		assert_eq!(tx.vout[1].amount_satoshi, 8801920);
		assert_eq!(tx.vout[1].script_pub_key.script_type, "pubkeyhash");
	}
}
