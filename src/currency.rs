//! Currency conversion helpers
//!
//! GOV.UK Pay expects amounts in the smallest currency unit (pence for GBP). The host
//! stores prices as decimal amounts in the major unit, so every amount crossing the
//! gateway boundary goes through [`to_small_currency`] or [`to_large_currency`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Currencies whose major to minor unit ratio is not a power of ten
pub const NON_DECIMAL_CURRENCY: [&str; 2] = ["MRU", "MGA"];

/// Errors raised before any amount is sent to the gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Unsupported currency '{0}' for GOV.UK Pay. Please contact the organizers")]
    Unsupported(String),
    #[error("Unknown currency '{0}' for GOV.UK Pay. Please contact the organizers")]
    Unknown(String),
    #[error("Amount {amount} {currency} cannot be expressed in minor units")]
    AmountOutOfRange { amount: String, currency: String },
}

/// ISO 4217 active currencies with their minor unit exponent.
///
/// Codes without defined minor units (precious metals, testing and "no currency"
/// codes such as `XXX`) are intentionally absent.
static ISO_4217: &[(&str, u32)] = &[
    ("AED", 2), ("AFN", 2), ("ALL", 2), ("AMD", 2), ("ANG", 2), ("AOA", 2),
    ("ARS", 2), ("AUD", 2), ("AWG", 2), ("AZN", 2), ("BAM", 2), ("BBD", 2),
    ("BDT", 2), ("BGN", 2), ("BHD", 3), ("BIF", 0), ("BMD", 2), ("BND", 2),
    ("BOB", 2), ("BOV", 2), ("BRL", 2), ("BSD", 2), ("BTN", 2), ("BWP", 2),
    ("BYN", 2), ("BZD", 2), ("CAD", 2), ("CDF", 2), ("CHE", 2), ("CHF", 2),
    ("CHW", 2), ("CLF", 4), ("CLP", 0), ("CNY", 2), ("COP", 2), ("COU", 2),
    ("CRC", 2), ("CUC", 2), ("CUP", 2), ("CVE", 2), ("CZK", 2), ("DJF", 0),
    ("DKK", 2), ("DOP", 2), ("DZD", 2), ("EGP", 2), ("ERN", 2), ("ETB", 2),
    ("EUR", 2), ("FJD", 2), ("FKP", 2), ("GBP", 2), ("GEL", 2), ("GHS", 2),
    ("GIP", 2), ("GMD", 2), ("GNF", 0), ("GTQ", 2), ("GYD", 2), ("HKD", 2),
    ("HNL", 2), ("HTG", 2), ("HUF", 2), ("IDR", 2), ("ILS", 2), ("INR", 2),
    ("IQD", 3), ("IRR", 2), ("ISK", 0), ("JMD", 2), ("JOD", 3), ("JPY", 0),
    ("KES", 2), ("KGS", 2), ("KHR", 2), ("KMF", 0), ("KPW", 2), ("KRW", 0),
    ("KWD", 3), ("KYD", 2), ("KZT", 2), ("LAK", 2), ("LBP", 2), ("LKR", 2),
    ("LRD", 2), ("LSL", 2), ("LYD", 3), ("MAD", 2), ("MDL", 2), ("MGA", 2),
    ("MKD", 2), ("MMK", 2), ("MNT", 2), ("MOP", 2), ("MRU", 2), ("MUR", 2),
    ("MVR", 2), ("MWK", 2), ("MXN", 2), ("MXV", 2), ("MYR", 2), ("MZN", 2),
    ("NAD", 2), ("NGN", 2), ("NIO", 2), ("NOK", 2), ("NPR", 2), ("NZD", 2),
    ("OMR", 3), ("PAB", 2), ("PEN", 2), ("PGK", 2), ("PHP", 2), ("PKR", 2),
    ("PLN", 2), ("PYG", 0), ("QAR", 2), ("RON", 2), ("RSD", 2), ("RUB", 2),
    ("RWF", 0), ("SAR", 2), ("SBD", 2), ("SCR", 2), ("SDG", 2), ("SEK", 2),
    ("SGD", 2), ("SHP", 2), ("SLE", 2), ("SLL", 2), ("SOS", 2), ("SRD", 2),
    ("SSP", 2), ("STN", 2), ("SVC", 2), ("SYP", 2), ("SZL", 2), ("THB", 2),
    ("TJS", 2), ("TMT", 2), ("TND", 3), ("TOP", 2), ("TRY", 2), ("TTD", 2),
    ("TWD", 2), ("TZS", 2), ("UAH", 2), ("UGX", 0), ("USD", 2), ("USN", 2),
    ("UYI", 0), ("UYU", 2), ("UYW", 4), ("UZS", 2), ("VED", 2), ("VES", 2),
    ("VND", 0), ("VUV", 0), ("WST", 2), ("XAF", 0), ("XCD", 2), ("XOF", 0),
    ("XPF", 0), ("YER", 2), ("ZAR", 2), ("ZMW", 2), ("ZWL", 2),
];

/// Minor unit exponent of an ISO 4217 currency, e.g. `2` for `"EUR"`
pub fn currency_exponent(iso_code: &str) -> Option<u32> {
    ISO_4217
        .iter()
        .find(|(code, _)| *code == iso_code)
        .map(|(_, exponent)| *exponent)
}

/// Check whether the currency can be properly handled by this plugin
pub fn validate_currency(iso_code: &str) -> Result<(), CurrencyError> {
    if NON_DECIMAL_CURRENCY.contains(&iso_code) {
        return Err(CurrencyError::Unsupported(iso_code.to_string()));
    }
    if currency_exponent(iso_code).is_none() {
        return Err(CurrencyError::Unknown(iso_code.to_string()));
    }
    Ok(())
}

fn validated_exponent(iso_code: &str) -> Result<u32, CurrencyError> {
    validate_currency(iso_code)?;
    currency_exponent(iso_code).ok_or_else(|| CurrencyError::Unknown(iso_code.to_string()))
}

/// Convert an amount from large currency to small currency.
///
/// `23.00 EUR` becomes `2300`. Precision beyond the currency's minor unit is rounded
/// half away from zero.
pub fn to_small_currency(large_currency_amount: Decimal, iso_code: &str) -> Result<i64, CurrencyError> {
    let exponent = validated_exponent(iso_code)?;
    let out_of_range = || CurrencyError::AmountOutOfRange {
        amount: large_currency_amount.to_string(),
        currency: iso_code.to_string(),
    };

    let scaled = if exponent == 0 {
        large_currency_amount
    } else {
        large_currency_amount
            .checked_mul(Decimal::from(10_i64.pow(exponent)))
            .ok_or_else(out_of_range)?
    };

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(out_of_range)
}

/// Inverse of [`to_small_currency`]
pub fn to_large_currency(small_currency_amount: i64, iso_code: &str) -> Result<Decimal, CurrencyError> {
    let exponent = validated_exponent(iso_code)?;
    if exponent == 0 {
        return Ok(Decimal::from(small_currency_amount));
    }
    Ok(Decimal::new(small_currency_amount, exponent))
}
