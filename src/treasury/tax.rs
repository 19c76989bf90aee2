// src/treasury/tax.rs
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_TAX: f64 = 1.0;
pub const DEFAULT_PROPERTY_RENT_TAX: f64 = 0.1;
pub const DEFAULT_PROPERTY_BUY_TAX: f64 = 0.1;
pub const DEFAULT_PROPERTY_CREATE_TAX: f64 = 0.5;

/// Tax schedule of a territory.
///
/// `base_tax` and `property_create_tax` are flat amounts. Rent and buy
/// taxes are rates and always sit in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    base_tax: f64,
    property_rent_tax: f64,
    property_buy_tax: f64,
    property_create_tax: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self::new(
            DEFAULT_BASE_TAX,
            DEFAULT_PROPERTY_RENT_TAX,
            DEFAULT_PROPERTY_BUY_TAX,
            DEFAULT_PROPERTY_CREATE_TAX,
        )
    }
}

impl TaxRates {
    pub fn new(base_tax: f64, property_rent_tax: f64, property_buy_tax: f64, property_create_tax: f64) -> Self {
        Self {
            base_tax,
            property_rent_tax: normalize_rate(property_rent_tax),
            property_buy_tax: normalize_rate(property_buy_tax),
            property_create_tax,
        }
    }

    pub fn base_tax(&self) -> f64 {
        self.base_tax
    }

    pub fn property_rent_tax(&self) -> f64 {
        self.property_rent_tax
    }

    pub fn property_buy_tax(&self) -> f64 {
        self.property_buy_tax
    }

    pub fn property_create_tax(&self) -> f64 {
        self.property_create_tax
    }

    pub fn with_base_tax(&self, base_tax: f64) -> Self {
        Self { base_tax, ..*self }
    }

    pub fn add_to_base_tax(&self, delta: f64) -> Self {
        self.with_base_tax(self.base_tax + delta)
    }

    pub fn with_property_rent_tax(&self, rate: f64) -> Self {
        Self { property_rent_tax: normalize_rate(rate), ..*self }
    }

    pub fn with_property_buy_tax(&self, rate: f64) -> Self {
        Self { property_buy_tax: normalize_rate(rate), ..*self }
    }

    pub fn with_property_create_tax(&self, amount: f64) -> Self {
        Self { property_create_tax: amount, ..*self }
    }

    /// Tax owed on `amount` at `rate`, with the rate clamped to `[0, 1]`
    pub fn calculate_tax(amount: f64, rate: f64) -> f64 {
        amount * normalize_rate(rate)
    }
}

fn normalize_rate(rate: f64) -> f64 {
    rate.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let taxes = TaxRates::default();
        assert_eq!(taxes.base_tax(), 1.0);
        assert_eq!(taxes.property_rent_tax(), 0.1);
        assert_eq!(taxes.property_buy_tax(), 0.1);
        assert_eq!(taxes.property_create_tax(), 0.5);
    }

    #[test]
    fn test_rates_are_clamped() {
        let taxes = TaxRates::new(5.0, 1.5, -0.2, 3.0);
        assert_eq!(taxes.property_rent_tax(), 1.0);
        assert_eq!(taxes.property_buy_tax(), 0.0);

        assert_eq!(taxes.with_property_rent_tax(2.0).property_rent_tax(), 1.0);
        assert_eq!(taxes.with_property_buy_tax(0.25).property_buy_tax(), 0.25);
    }

    #[test]
    fn test_flat_taxes_not_clamped() {
        let taxes = TaxRates::default()
            .with_base_tax(25.0)
            .with_property_create_tax(12.0);
        assert_eq!(taxes.base_tax(), 25.0);
        assert_eq!(taxes.property_create_tax(), 12.0);
        assert_eq!(taxes.add_to_base_tax(-30.0).base_tax(), -5.0);
    }

    #[test]
    fn test_updates_leave_original_untouched() {
        let original = TaxRates::default();
        let _ = original.add_to_base_tax(4.0);
        assert_eq!(original, TaxRates::default());
    }

    #[test]
    fn test_calculate_tax() {
        assert_eq!(TaxRates::calculate_tax(200.0, 0.5), 100.0);
        assert_eq!(TaxRates::calculate_tax(200.0, 3.0), 200.0);
        assert_eq!(TaxRates::calculate_tax(200.0, -1.0), 0.0);
    }
}
