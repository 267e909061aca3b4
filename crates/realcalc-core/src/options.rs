//! Context options and configuration.

use serde::{Deserialize, Serialize};

use realcalc_kernel::constants::DIGITS_PER_WORD;
use realcalc_kernel::{
    DEFAULT_CONVOLUTION_THRESHOLD, DEFAULT_EVALUATION_DEPTH, MIN_WORKING_PRECISION,
};

use crate::RealError;

/// Options for a [`crate::Context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Mantissa length in 32-bit words.
    pub working_precision: usize,
    /// Operand length (in words) at which multiplication uses convolution.
    pub convolution_threshold: usize,
    /// Recursion cap for the outer lazy evaluator. Not used by this crate.
    pub evaluation_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            working_precision: MIN_WORKING_PRECISION,
            convolution_threshold: DEFAULT_CONVOLUTION_THRESHOLD,
            evaluation_depth: DEFAULT_EVALUATION_DEPTH,
        }
    }
}

impl Options {
    /// Normalize options, applying defaults where values are zero and
    /// raising the precision to the supported minimum.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.working_precision < MIN_WORKING_PRECISION {
            self.working_precision = MIN_WORKING_PRECISION;
        }
        if self.convolution_threshold == 0 {
            self.convolution_threshold = DEFAULT_CONVOLUTION_THRESHOLD;
        }
        if self.evaluation_depth == 0 {
            self.evaluation_depth = DEFAULT_EVALUATION_DEPTH;
        }
        self
    }

    /// Default options with a precision of at least `digits` decimal digits.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn with_decimal_digits(digits: usize) -> Self {
        let words = (digits as f64 / DIGITS_PER_WORD) as usize + 1;
        Self {
            working_precision: words,
            ..Self::default()
        }
        .normalize()
    }

    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RealError> {
        serde_json::from_str::<Self>(json)
            .map(Self::normalize)
            .map_err(|e| RealError::Config(e.to_string()))
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, RealError> {
        serde_json::to_string(self).map_err(|e| RealError::Config(e.to_string()))
    }
}
