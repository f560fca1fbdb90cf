// Conversion between smallest units and decimal token strings

use crate::ledger::config::Amount;
use crate::ledger::engine::LedgerError;

fn unit_scale(decimals: u8) -> Result<Amount, LedgerError> {
    (10 as Amount)
        .checked_pow(decimals as u32)
        .ok_or_else(|| LedgerError::InvalidArgument(format!("unsupported decimals: {}", decimals)))
}

/// Render `amount` smallest units as a decimal string, trimming trailing zeros
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let scale = match unit_scale(decimals) {
        Ok(scale) => scale,
        Err(_) => return amount.to_string(),
    };
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a decimal token string into smallest units
pub fn parse_units(text: &str, decimals: u8) -> Result<Amount, LedgerError> {
    let text = text.trim();
    let invalid = || LedgerError::InvalidArgument(format!("invalid amount: {:?}", text));

    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > decimals as usize {
        return Err(LedgerError::InvalidArgument(format!(
            "amount {:?} has more than {} decimal places",
            text, decimals
        )));
    }

    let scale = unit_scale(decimals)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<Amount>().map_err(|_| invalid())?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse::<Amount>().map_err(|_| invalid())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or_else(invalid)
}
