//! Indicator trait definitions.

use rust_decimal::Decimal;

use crate::error::IndicatorError;

/// Trait for technical indicators over a price series.
///
/// Output is aligned with the input: element `i` of the result belongs to
/// element `i` of `data`.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    ///
    /// # Arguments
    /// * `data` - Input data (typically closing prices, oldest first)
    ///
    /// # Returns
    /// One output per input point
    fn calculate(&self, data: &[Decimal]) -> Vec<Self::Output>;

    /// Get the minimum data points required.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> String;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[Decimal]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}
