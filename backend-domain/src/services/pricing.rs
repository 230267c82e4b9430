// Price arithmetic

use crate::errors::{EconomyError, EconomyResult};

/// `price * count`, refusing overflow.
pub fn line_total(price: i64, count: i64) -> EconomyResult<i64> {
    price
        .checked_mul(count)
        .ok_or(EconomyError::AmountOverflow)
}

/// Applies a level discount. 100 means no discount; integer division truncates.
pub fn discounted_price(original: i64, discount_percent: i32) -> EconomyResult<i64> {
    if !(0..=100).contains(&discount_percent) {
        return Err(EconomyError::InvalidInput(format!(
            "discount percent {} outside 0..=100",
            discount_percent
        )));
    }
    original
        .checked_mul(i64::from(discount_percent))
        .map(|scaled| scaled / 100)
        .ok_or(EconomyError::AmountOverflow)
}
