use crate::constants::{
    DISPLAY_DECIMALS,
    NATIVE_DECIMALS,
};
use alloy_primitives::{
    U256,
    utils::{
        UnitsError,
        parse_ether,
    },
};

/// Formats a wei amount as native units with four fractional digits,
/// rounding half up.
pub fn format_native(wei: U256) -> String {
    let dropped = NATIVE_DECIMALS - DISPLAY_DECIMALS;
    let scale = U256::from(10u64).pow(U256::from(dropped));
    let rounded = wei.saturating_add(scale / U256::from(2u64)) / scale;
    let unit = U256::from(10u64.pow(DISPLAY_DECIMALS));
    let whole = rounded / unit;
    let fractional = (rounded % unit).to::<u64>();
    format!(
        "{}.{:0width$}",
        whole,
        fractional,
        width = DISPLAY_DECIMALS as usize
    )
}

pub fn parse_native(amount: &str) -> Result<U256, UnitsError> {
    parse_ether(amount.trim())
}
