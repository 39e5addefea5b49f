//! Rate records, the `{currency}:{date}` key scheme and day-over-day change

use super::error::{Error, Result};
use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub const CHANGE_NOT_AVAILABLE: &str = "Rate for yesterday not available";

/// A single (currency, rate) pair as read from a rate source.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub currency: String,
    pub rate: String,
}

/// One observation of a currency's rate against EUR on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub key: String,
    pub currency: String,
    pub date: String,
    pub rate: String,
}

impl RateRecord {
    /// Builds the record for `quote` observed on `date`.
    ///
    /// Rejects rates that do not parse as a non-negative number, so every
    /// stored record holds a usable rate.
    pub fn from_quote(quote: &Quote, date: NaiveDate) -> Result<Self> {
        let rate = validate_rate(&quote.rate).map_err(|_| {
            Error::Parse(format!(
                "rate '{}' for currency {}",
                quote.rate, quote.currency
            ))
        })?;

        let date = format_date(date);
        Ok(Self {
            key: record_key(&quote.currency, &date),
            currency: quote.currency.clone(),
            date,
            rate: rate.to_string(),
        })
    }
}

/// A rate record as served to callers, with its change against the prior day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateView {
    pub currency: String,
    pub date: String,
    pub rate: String,
    pub change: String,
}

impl RateView {
    pub fn new(today: RateRecord, yesterday: Option<&RateRecord>) -> Result<Self> {
        let change = match yesterday {
            Some(prev) => rate_change(&today.rate, &prev.rate)?,
            None => CHANGE_NOT_AVAILABLE.to_string(),
        };
        Ok(Self {
            currency: today.currency,
            date: today.date,
            rate: today.rate,
            change,
        })
    }
}

/// Trims `rate` and checks that it is a non-negative decimal.
///
/// Uses the same parser as [`rate_change`], so any accepted rate can later
/// be diffed against another.
pub fn validate_rate(rate: &str) -> Result<&str> {
    let rate = rate.trim();
    match parse_rate(rate) {
        Ok(value) if !value.is_sign_negative() || value.is_zero() => Ok(rate),
        _ => Err(Error::Parse(format!("rate '{rate}'"))),
    }
}

pub fn record_key(currency: &str, date: &str) -> String {
    format!("{currency}:{date}")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("date '{date}': {e}")))
}

pub fn previous_day(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(1))
        .ok_or_else(|| Error::Parse(format!("no day before {date}")))
}

/// `today - yesterday` rounded half away from zero to four decimal places.
pub fn rate_change(today: &str, yesterday: &str) -> Result<String> {
    let today = parse_rate(today)?;
    let yesterday = parse_rate(yesterday)?;
    let change = today
        .checked_sub(yesterday)
        .map(|diff| diff.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| Error::Parse("rate difference out of range".to_string()))?;
    Ok(format!("{change:.4}"))
}

fn parse_rate(rate: &str) -> Result<Decimal> {
    let rate = rate.trim();
    Decimal::from_str(rate)
        .or_else(|_| Decimal::from_scientific(rate))
        .map_err(|e| Error::Parse(format!("stored rate '{rate}': {e}")))
}
