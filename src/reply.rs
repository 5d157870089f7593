//! Text of the bot replies. Kept free of any Telegram types so it can be tested.

use crate::CrossRate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const UNAVAILABLE: &str = "Could not get data from any source. Please try again later.";
pub const CONVERT_USAGE: &str = "Please specify an amount of TON, e.g. /convert 5.5";
pub const CONVERT_INVALID: &str = "Please specify a valid positive number, e.g. /convert 5.5";

pub fn greeting(user: &str) -> String {
    format!(
        "Hi {}!\n\n\
         I track the TON price in RUB through the Binance P2P market.\n\
         Available commands:\n\
         /price - current TON price in RUB\n\
         /convert <amount> - convert TON to RUB, e.g. /convert 5.5",
        user
    )
}

pub fn price_message(rate: Option<&CrossRate>) -> String {
    match rate {
        Some(rate) => format!(
            "TON / RUB\n\n\
             1 TON ≈ {} ₽\n\
             1 USDT = {} ₽ ({})\n\
             1 TON = {} $\n\n\
             Updated from: {}",
            group_thousands(rate.asset_in_fiat, 2),
            rate.fiat_per_stable,
            rate.source,
            group_thousands(rate.asset_per_stable, 4),
            rate.source
        ),
        None => UNAVAILABLE.to_owned(),
    }
}

/// Parses the first word of the `/convert` arguments. Only positive amounts
/// are accepted.
pub fn parse_amount(args: &str) -> Result<Decimal, &'static str> {
    let arg = match args.split_whitespace().next() {
        Some(arg) => arg,
        None => return Err(CONVERT_USAGE),
    };
    match Decimal::from_str(&arg.replace(',', ".")) {
        Ok(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(CONVERT_INVALID),
    }
}

pub fn convert_message(amount: Decimal, rate: Option<&CrossRate>) -> String {
    let rate = match rate {
        Some(rate) => rate,
        None => return UNAVAILABLE.to_owned(),
    };
    match rate.convert(amount) {
        Some(converted) => format!(
            "Conversion\n\n\
             {} TON ≈ {} ₽\n\
             Source: {}\n\
             Rate: 1 TON = {} $\n\
             Rate: 1 USDT = {} ₽",
            amount.normalize(),
            group_thousands(converted, 2),
            rate.source,
            group_thousands(rate.asset_per_stable, 4),
            rate.fiat_per_stable
        ),
        None => CONVERT_INVALID.to_owned(),
    }
}

/// Formats with a fixed number of decimals and `,` between thousands.
pub fn group_thousands(value: Decimal, dp: u32) -> String {
    let fixed = format!("{:.*}", dp as usize, value.round_dp(dp));
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
