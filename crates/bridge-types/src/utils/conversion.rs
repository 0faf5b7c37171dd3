//! Unit conversions between the Ethereum and UTXO sides of the bridge.
//!
//! Ethereum values are integers in wei (10^-18). The UTXO chain counts in
//! satoshis (10^-8 QTUM) and its node reports amounts as decimal QTUM. All
//! conversions are exact: anything that would lose precision is an error.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Number of fractional digits carried by QTUM amounts.
pub const QTUM_DECIMALS: u32 = 8;

/// Satoshis in one QTUM.
pub const SATOSHIS_PER_QTUM: i64 = 100_000_000;

/// Wei in one satoshi (10^18 / 10^8).
pub const WEI_PER_SATOSHI: u64 = 10_000_000_000;

/// Errors raised when an amount cannot be represented exactly in the target unit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountConversionError {
	#[error("Amount {0} is negative")]
	Negative(String),
	#[error("Amount {0} has more than 8 fractional digits")]
	ExcessPrecision(String),
	#[error("Amount of {0} wei is not a whole number of satoshis")]
	SubSatoshi(String),
	#[error("Amount {0} overflows the satoshi range")]
	Overflow(String),
}

/// Converts a wei value into QTUM at 8 decimal places.
///
/// Values that are not a multiple of 10^10 wei would need a fractional satoshi
/// and are rejected.
pub fn wei_to_qtum(wei: U256) -> Result<Decimal, AmountConversionError> {
	let (satoshis, remainder) = wei.div_rem(U256::from(WEI_PER_SATOSHI));
	if !remainder.is_zero() {
		return Err(AmountConversionError::SubSatoshi(wei.to_string()));
	}
	if satoshis > U256::from(i64::MAX as u64) {
		return Err(AmountConversionError::Overflow(wei.to_string()));
	}
	Ok(satoshis_to_qtum(satoshis.as_limbs()[0] as i64))
}

/// Converts a QTUM amount into integer satoshis.
pub fn qtum_to_satoshis(amount: Decimal) -> Result<i64, AmountConversionError> {
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(AmountConversionError::Negative(amount.to_string()));
	}
	let scaled = amount
		.checked_mul(Decimal::from(SATOSHIS_PER_QTUM))
		.ok_or_else(|| AmountConversionError::Overflow(amount.to_string()))?;
	if !scaled.fract().is_zero() {
		return Err(AmountConversionError::ExcessPrecision(amount.to_string()));
	}
	scaled
		.to_i64()
		.ok_or_else(|| AmountConversionError::Overflow(amount.to_string()))
}

/// Converts integer satoshis into a QTUM amount with scale 8.
pub fn satoshis_to_qtum(satoshis: i64) -> Decimal {
	Decimal::new(satoshis, QTUM_DECIMALS)
}

/// Converts satoshis into wei, as reported by `eth_getBalance`.
pub fn satoshis_to_wei(satoshis: u64) -> U256 {
	U256::from(satoshis) * U256::from(WEI_PER_SATOSHI)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn test_wei_to_qtum_one_ether() {
		let wei = U256::from(1_000_000_000_000_000_000u128);
		assert_eq!(wei_to_qtum(wei).unwrap(), Decimal::from(1));
	}

	#[test]
	fn test_wei_to_qtum_fraction() {
		// 10000.1 * 10^18
		let wei = U256::from(10_000_100_000_000_000_000_000u128);
		assert_eq!(
			wei_to_qtum(wei).unwrap(),
			Decimal::from_str("10000.1").unwrap()
		);
	}

	#[test]
	fn test_wei_to_qtum_rejects_sub_satoshi() {
		let wei = U256::from(10_000_000_001u64);
		assert!(matches!(
			wei_to_qtum(wei),
			Err(AmountConversionError::SubSatoshi(_))
		));
	}

	#[test]
	fn test_wei_to_qtum_rejects_overflow() {
		assert!(matches!(
			wei_to_qtum(U256::MAX - (U256::MAX % U256::from(WEI_PER_SATOSHI))),
			Err(AmountConversionError::Overflow(_))
		));
	}

	#[test]
	fn test_qtum_to_satoshis() {
		assert_eq!(
			qtum_to_satoshis(Decimal::from_str("9999.899").unwrap()).unwrap(),
			999_989_900_000
		);
		assert_eq!(
			qtum_to_satoshis(Decimal::from_str("0.00000001").unwrap()).unwrap(),
			1
		);
		assert_eq!(qtum_to_satoshis(Decimal::ZERO).unwrap(), 0);
	}

	#[test]
	fn test_qtum_to_satoshis_rejects_precision_and_sign() {
		assert!(matches!(
			qtum_to_satoshis(Decimal::from_str("0.000000001").unwrap()),
			Err(AmountConversionError::ExcessPrecision(_))
		));
		assert!(matches!(
			qtum_to_satoshis(Decimal::from_str("-1").unwrap()),
			Err(AmountConversionError::Negative(_))
		));
	}

	#[test]
	fn test_satoshis_round_trip_through_qtum() {
		let qtum = satoshis_to_qtum(100_000);
		assert_eq!(qtum, Decimal::from_str("0.001").unwrap());
		assert_eq!(qtum_to_satoshis(qtum).unwrap(), 100_000);
	}

	#[test]
	fn test_satoshis_to_wei() {
		assert_eq!(
			satoshis_to_wei(SATOSHIS_PER_QTUM as u64),
			U256::from(1_000_000_000_000_000_000u128)
		);
		assert_eq!(format!("{:x}", satoshis_to_wei(0)), "0");
	}
}
