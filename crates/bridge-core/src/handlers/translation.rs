//! Translation handler for inbound Ethereum transactions.
//!
//! Recovers the sender of a signed Ethereum transaction, resolves the wallet
//! registered for it, and pays the transaction's value to the UTXO-chain
//! address derived from its `to` field. Every step is recorded on a
//! [`TranslationState`].

use crate::state::{TranslationState, TranslationStateError, TranslationStatus};
use bridge_account::{AccountError, WalletRegistry};
use bridge_ethereum::{recover_sender, EthereumError, RawTransaction};
use bridge_node::{NodeError, NodeService, RequestContext};
use bridge_types::{
	truncate_id, wei_to_qtum, with_0x_prefix, AmountConversionError, ChainParams, QtumAddress,
};
use bridge_utxo::{
	BuildError, MultiSchemeSigner, SelectionError, SignError, Transaction, TransactionBuilder,
	TransactionExt, UtxoSelector,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors that can stop a translation.
#[derive(Debug, Error)]
pub enum TranslationError {
	#[error("Decode error: {0}")]
	Decode(#[source] EthereumError),
	#[error("Signature recovery failed: {0}")]
	Recovery(#[source] EthereumError),
	#[error("Wallet error: {0}")]
	Wallet(#[from] AccountError),
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
	#[error("Amount conversion failed: {0}")]
	AmountConversion(#[from] AmountConversionError),
	#[error("UTXO selection failed: {0}")]
	Selection(#[source] SelectionError),
	#[error("Transaction build failed: {0}")]
	Build(#[from] BuildError),
	#[error("Signing failed: {0}")]
	Sign(#[from] SignError),
	#[error("Node error during {operation}: {source}")]
	Node {
		operation: &'static str,
		#[source]
		source: NodeError,
	},
	#[error("Translation cancelled: {0}")]
	Cancelled(String),
	#[error("State error: {0}")]
	State(#[from] TranslationStateError),
}

impl TranslationError {
	fn node(operation: &'static str, err: NodeError) -> Self {
		match err {
			NodeError::Cancelled(reason) => TranslationError::Cancelled(reason),
			source => TranslationError::Node { operation, source },
		}
	}

	fn selection(err: SelectionError) -> Self {
		match err {
			SelectionError::Node {
				source: NodeError::Cancelled(reason),
				..
			} => TranslationError::Cancelled(reason),
			other => TranslationError::Selection(other),
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, TranslationError::Cancelled(_))
	}
}

/// Drives one inbound transaction from decoding to broadcast.
pub struct TranslationHandler {
	wallets: WalletRegistry,
	node: Arc<NodeService>,
	selector: UtxoSelector,
	builder: TransactionBuilder,
	signer: MultiSchemeSigner,
	params: ChainParams,
}

impl TranslationHandler {
	pub fn new(
		wallets: WalletRegistry,
		node: Arc<NodeService>,
		params: ChainParams,
		min_confirmations: u32,
		fee_satoshis: i64,
	) -> Self {
		Self {
			wallets,
			node,
			selector: UtxoSelector::new(min_confirmations),
			builder: TransactionBuilder::new(params, fee_satoshis),
			signer: MultiSchemeSigner::new(),
			params,
		}
	}

	/// Translates a hex-encoded signed Ethereum transaction and returns the
	/// txid the node assigned to the broadcast payment.
	///
	/// Nothing is broadcast unless every earlier step succeeded.
	#[instrument(skip_all, fields(eth_hash = tracing::field::Empty))]
	pub async fn translate(
		&self,
		ctx: &RequestContext,
		raw_tx: &str,
	) -> Result<String, TranslationError> {
		let tx = RawTransaction::from_hex(raw_tx).map_err(TranslationError::Decode)?;
		let eth_hash = with_0x_prefix(&hex::encode(tx.hash()));
		tracing::Span::current().record("eth_hash", truncate_id(&eth_hash).as_str());

		let mut state = TranslationState::decoded(eth_hash);
		match self.run(ctx, &tx, &mut state).await {
			Ok(txid) => {
				tracing::info!(txid = %txid, "Submitted transaction");
				Ok(txid)
			},
			Err(e) => {
				let stage = state.status().to_string();
				state.fail(&e);
				tracing::warn!(stage = %stage, error = %e, "Translation failed");
				Err(e)
			},
		}
	}

	async fn run(
		&self,
		ctx: &RequestContext,
		tx: &RawTransaction,
		state: &mut TranslationState,
	) -> Result<String, TranslationError> {
		let sender = recover_sender(tx).map_err(TranslationError::Recovery)?;
		state.advance(TranslationStatus::IdentityRecovered)?;

		let receiver = self.receiver_address(tx)?;
		let amount = wei_to_qtum(tx.value())?;
		if amount.is_zero() {
			return Err(TranslationError::InvalidAmount(
				"transaction value is zero".to_string(),
			));
		}

		let wallet = self.wallets.lookup(&sender.address).await?;
		state.advance(TranslationStatus::WalletResolved)?;
		let address = wallet.chain_address().to_string();
		tracing::debug!(
			sender = %sender.address,
			address = %address,
			receiver = %receiver,
			amount = %amount,
			"Resolved wallet"
		);

		self.node
			.verify_address(ctx, &address)
			.await
			.map_err(|e| TranslationError::node("verify address", e))?;
		state.advance(TranslationStatus::AddressVerified)?;

		let utxos = self
			.selector
			.select(&self.node, ctx, &address, amount + self.builder.fee())
			.await
			.map_err(TranslationError::selection)?;
		state.advance(TranslationStatus::UtxosSelected)?;

		let mut utx = self.builder.build(&utxos, &address, &receiver, amount)?;
		state.advance(TranslationStatus::Built)?;
		self.log_decoded(ctx, "unsigned", &utx).await;

		self.signer.sign(&mut utx, &utxos, wallet.as_ref())?;
		state.advance(TranslationStatus::Signed)?;
		self.log_decoded(ctx, "signed", &utx).await;

		let txid = self
			.node
			.send_raw_transaction(ctx, &utx.to_hex(), true)
			.await
			.map_err(|e| TranslationError::node("send raw transaction", e))?;
		state.advance(TranslationStatus::Submitted(txid.clone()))?;
		Ok(txid)
	}

	/// The base58 address whose hash is the transaction's `to` field.
	fn receiver_address(&self, tx: &RawTransaction) -> Result<String, TranslationError> {
		let to = tx.to().ok_or_else(|| {
			TranslationError::InvalidAddress("contract creation has no receiver".to_string())
		})?;
		let mut hash = [0u8; 20];
		hash.copy_from_slice(to.as_slice());
		Ok(QtumAddress::PubKeyHash(hash).encode(&self.params))
	}

	/// Best-effort pretty print through `decoderawtransaction`.
	async fn log_decoded(&self, ctx: &RequestContext, stage: &'static str, tx: &Transaction) {
		if !tracing::enabled!(tracing::Level::DEBUG) {
			return;
		}
		match self.node.decode_raw_transaction(ctx, &tx.to_hex()).await {
			Ok(decoded) => tracing::debug!(stage, decoded = %decoded, "Decoded transaction"),
			Err(e) => tracing::debug!(stage, error = %e, "Could not decode transaction"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bridge_node::implementations::mock::{MockNode, MockNodeConfig};
	use bridge_types::{double_sha256, reverse_hex, SecretString, UnspentOutput};
	use bridge_utxo::ScriptClass;
	use rust_decimal::Decimal;
	use std::time::Duration;

	// Sender 0x96216849..., chain id 4, pays 1 ETH to 0x4592d8f8...
	const EIP155_TX: &str = "f86d8202b28477359400825208944592d8f8d7b001e72cb26a73e4fa1806a51ac79d880de0b6b3a7640000802ca05924bde7ef10aa88db9c66dd4f5fb16b46dff2319b9968be983118b57bb50562a001b24b31010004f13d9a26b320845257a6cfc2bf819a3d55e3fc86263c5f0772";
	// Sender 0x6fd56e72..., pays 0.5 ETH to 0x96216849...
	const LEGACY_TX: &str = "f86780018252089496216849c49358b10257cb55b28ea603c874b05e8806f05b59d3b20000801ba0bb50e2d89a4ed70663d080659fe0ad4b9bc3e06c17a227433966cb59ceee020da00c984807b341412d350294dd821dfcaac10074b670884822612b9082acde4117";
	// Sender 0x6fd56e72..., zero value.
	const ZERO_VALUE_TX: &str = "f85f01018252089496216849c49358b10257cb55b28ea603c874b05e80801ba0575c80d7756f9545f2aa68418d07953e9d3744876aee90852b98916e5488ecb1a054a4c9f61b8ec018bf9078773e029a6e04919cd8bdf8a90a84f77c54c106cb57";
	// Sender 0x6fd56e72..., empty `to`.
	const CONTRACT_CREATION_TX: &str = "f853020182520880880de0b6b3a7640000801ca0f9313679f31ecb1d5e646e39c75fd696a072cd1e2913337e922a05f649f36944a0563af95f61dec6f959a47b864d3c57fe3cd6374acfc2b1b5b4dd339e3e1c2e18";

	const KEY_9621: &str = "fad9c8855b740a0b7ed4c221dbad0f33a83a49cad6b3fe8d5817ac83d38b6a19";
	const ADDRESS_9621: &str = "qeVQ5JF6idPcrg1u9M3pCryXeebpj3Tbpk";
	const SCRIPT_9621: &str = "76a914e599be870c63d68a00a5019906d258a4ba5d1bac88ac";
	const RECEIVER_SCRIPT: &str = "76a9144592d8f8d7b001e72cb26a73e4fa1806a51ac79d88ac";
	const KEY_6FD5: &str = "00821d8c8a3627adc68aa4034fea953b2f5da553fab312db3fa274240bd49f35";
	const ADDRESS_6FD5: &str = "qUbxboqjBRp96j3La8D1RYkyqx5uQbJPoW";
	const SCRIPT_6FD5: &str = "76a9147926223070547d2d15b2ef5e7383e541c338ffe988ac";

	fn utxo(txid_byte: u8, address: &str, script: &str, amount: Decimal) -> UnspentOutput {
		UnspentOutput {
			txid: format!("{:02x}", txid_byte).repeat(32),
			vout: 0,
			address: address.to_string(),
			script_pub_key: script.to_string(),
			amount,
			confirmations: 10,
			spendable: true,
		}
	}

	async fn handler(mock: &MockNode, keys: &[&str]) -> TranslationHandler {
		let wallets = WalletRegistry::new(ChainParams::QTUM_TESTNET);
		for key in keys {
			wallets.import(&SecretString::from(*key)).await.unwrap();
		}
		let node = Arc::new(NodeService::new(
			Box::new(mock.clone()),
			Duration::from_secs(5),
		));
		TranslationHandler::new(wallets, node, ChainParams::QTUM_TESTNET, 6, 100_000)
	}

	#[tokio::test]
	async fn test_translates_and_broadcasts() {
		let mock = MockNode::new(MockNodeConfig {
			unspent: vec![utxo(1, ADDRESS_9621, SCRIPT_9621, Decimal::new(15, 1))],
			..Default::default()
		});
		let handler = handler(&mock, &[KEY_9621]).await;

		let txid = handler
			.translate(&RequestContext::background(), EIP155_TX)
			.await
			.unwrap();

		let sent = mock.sent_transactions();
		assert_eq!(sent.len(), 1);
		assert_eq!(txid, reverse_hex(&double_sha256(&hex::decode(&sent[0]).unwrap())));
		// Pays 1 QTUM (0x05f5e100 satoshis) to the hash of `to`.
		assert!(sent[0].contains(&format!("00e1f5050000000019{}", RECEIVER_SCRIPT)));
		// Change of 0.499 QTUM back to the sender.
		assert!(sent[0].contains(&format!("e069f9020000000019{}", SCRIPT_9621)));
		assert_eq!(mock.imported_addresses(), vec![ADDRESS_9621.to_string()]);
		// Broadcast skips the node's max fee rate check.
		assert_eq!(mock.sent_allow_high_fees(), vec![true]);
	}

	#[tokio::test]
	async fn test_legacy_transaction_from_second_wallet() {
		let mock = MockNode::new(MockNodeConfig {
			unspent: vec![
				utxo(1, ADDRESS_6FD5, SCRIPT_6FD5, Decimal::new(3, 1)),
				utxo(2, ADDRESS_6FD5, SCRIPT_6FD5, Decimal::new(3, 1)),
			],
			owned: vec![ADDRESS_6FD5.to_string()],
			..Default::default()
		});
		let handler = handler(&mock, &[KEY_9621, KEY_6FD5]).await;

		handler
			.translate(&RequestContext::background(), LEGACY_TX)
			.await
			.unwrap();

		assert_eq!(mock.sent_transactions().len(), 1);
		// Owned addresses are not re-imported.
		assert!(mock.imported_addresses().is_empty());
		assert_eq!(mock.calls("listunspent"), 1);
	}

	#[tokio::test]
	async fn test_unknown_sender_never_reaches_node() {
		let mock = MockNode::new(MockNodeConfig::default());
		let handler = handler(&mock, &[KEY_6FD5]).await;

		let err = handler
			.translate(&RequestContext::background(), EIP155_TX)
			.await
			.unwrap_err();
		assert!(matches!(err, TranslationError::Wallet(AccountError::NotFound(_))));
		assert_eq!(mock.calls("getaddressinfo"), 0);
		assert!(mock.sent_transactions().is_empty());
	}

	#[tokio::test]
	async fn test_insufficient_funds_broadcasts_nothing() {
		let mock = MockNode::new(MockNodeConfig {
			// 1 QTUM plus the 0.001 fee is needed.
			unspent: vec![utxo(1, ADDRESS_9621, SCRIPT_9621, Decimal::ONE)],
			..Default::default()
		});
		let handler = handler(&mock, &[KEY_9621]).await;

		let err = handler
			.translate(&RequestContext::background(), EIP155_TX)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			TranslationError::Selection(SelectionError::InsufficientFunds { .. })
		));
		assert!(mock.sent_transactions().is_empty());
	}

	#[tokio::test]
	async fn test_unsupported_script_broadcasts_nothing() {
		let p2sh = "a914e599be870c63d68a00a5019906d258a4ba5d1bac87";
		let mock = MockNode::new(MockNodeConfig {
			unspent: vec![utxo(1, ADDRESS_9621, p2sh, Decimal::new(2, 0))],
			..Default::default()
		});
		let handler = handler(&mock, &[KEY_9621]).await;

		let err = handler
			.translate(&RequestContext::background(), EIP155_TX)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			TranslationError::Sign(SignError::UnsupportedScriptType {
				index: 0,
				class: ScriptClass::ScriptHash
			})
		));
		assert!(mock.sent_transactions().is_empty());
	}

	#[tokio::test]
	async fn test_rejects_zero_value_and_contract_creation() {
		let mock = MockNode::new(MockNodeConfig::default());
		let handler = handler(&mock, &[KEY_6FD5]).await;
		let ctx = RequestContext::background();

		assert!(matches!(
			handler.translate(&ctx, ZERO_VALUE_TX).await,
			Err(TranslationError::InvalidAmount(_))
		));
		assert!(matches!(
			handler.translate(&ctx, CONTRACT_CREATION_TX).await,
			Err(TranslationError::InvalidAddress(_))
		));
		assert!(matches!(
			handler.translate(&ctx, "0xzz").await,
			Err(TranslationError::Decode(_))
		));
		assert_eq!(mock.calls("listunspent"), 0);
	}

	#[tokio::test]
	async fn test_cancelled_context_aborts() {
		let mock = MockNode::new(MockNodeConfig {
			unspent: vec![utxo(1, ADDRESS_9621, SCRIPT_9621, Decimal::new(2, 0))],
			..Default::default()
		});
		let handler = handler(&mock, &[KEY_9621]).await;
		let (ctx, cancel) = RequestContext::background().cancellable();
		cancel.cancel();

		let err = handler.translate(&ctx, EIP155_TX).await.unwrap_err();
		assert!(err.is_cancelled());
		assert!(mock.sent_transactions().is_empty());
	}
}
