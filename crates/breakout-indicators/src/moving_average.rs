//! Moving average indicators.

use rust_decimal::Decimal;
use breakout_core::error::IndicatorError;
use breakout_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Positions with fewer
/// than N values up to and including them are `None`; a partial window is
/// never averaged.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "Period must be greater than 0".into(),
            ));
        }
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    type Output = Option<Decimal>;

    fn calculate(&self, data: &[Decimal]) -> Vec<Option<Decimal>> {
        let mut result = vec![None; data.len()];
        if data.len() < self.period {
            return result;
        }

        let period = Decimal::from(self.period);

        // Initial sum
        let mut sum: Decimal = data[..self.period].iter().sum();
        result[self.period - 1] = Some(sum / period);

        // Sliding window; decimal addition is exact so the running sum never drifts
        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result[i] = Some(sum / period);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> String {
        format!("MA{}", self.period)
    }
}
