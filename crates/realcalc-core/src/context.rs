//! Evaluation context: working precision, kernel and memoized constants.

use tracing::debug;

use realcalc_kernel::Kernel;

use crate::estimate::Estimate;
use crate::{Options, RealError};

/// Everything an arithmetic operation needs besides its operands.
///
/// A context is not reentrant: operations borrow it mutably. Share one
/// between threads behind a lock, or give each thread its own.
#[derive(Debug, Clone)]
pub struct Context {
    options: Options,
    kernel: Kernel,
    pi: Option<Estimate>,
    ln2: Option<Estimate>,
}

impl Context {
    pub fn new(options: Options) -> Result<Self, RealError> {
        let options = options.normalize();
        let kernel = Kernel::with_threshold(options.working_precision, options.convolution_threshold)?;
        debug!(
            precision = options.working_precision,
            threshold = options.convolution_threshold,
            "context created"
        );
        Ok(Self {
            options,
            kernel,
            pi: None,
            ln2: None,
        })
    }

    /// Context with default options at `words` words of precision.
    pub fn with_precision(words: usize) -> Result<Self, RealError> {
        Self::new(Options {
            working_precision: words,
            ..Options::default()
        })
    }

    /// Switch to a new working precision. Cached constants are dropped and
    /// values built under the old precision must not be used with this
    /// context afterwards.
    pub fn initialize(&mut self, words: usize) -> Result<(), RealError> {
        self.kernel.initialize(words)?;
        self.options.working_precision = words;
        self.clear_cached_estimates();
        debug!(precision = words, "context initialized");
        Ok(())
    }

    /// Release the kernel buffers and cached constants.
    pub fn finalize(&mut self) {
        self.kernel.finalize();
        self.clear_cached_estimates();
    }

    /// Working precision in words.
    #[must_use]
    pub fn precision(&self) -> usize {
        self.kernel.precision()
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel {
        &mut self.kernel
    }

    pub fn clear_cached_estimates(&mut self) {
        if self.pi.is_some() || self.ln2.is_some() {
            debug!("cached constants cleared");
        }
        self.pi = None;
        self.ln2 = None;
    }

    /// Cached π, if it was computed with at least `precision` words.
    pub(crate) fn cached_pi(&self, precision: usize) -> Option<Estimate> {
        self.pi.as_ref().filter(|e| e.precision() >= precision).cloned()
    }

    pub(crate) fn store_pi(&mut self, pi: &Estimate) {
        self.pi = Some(pi.clone());
    }

    /// Cached ln 2, if it was computed with at least `precision` words.
    pub(crate) fn cached_ln2(&self, precision: usize) -> Option<Estimate> {
        self.ln2.as_ref().filter(|e| e.precision() >= precision).cloned()
    }

    pub(crate) fn store_ln2(&mut self, ln2: &Estimate) {
        self.ln2 = Some(ln2.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_options() {
        let ctx = Context::new(Options {
            working_precision: 1,
            convolution_threshold: 0,
            evaluation_depth: 0,
        })
        .unwrap();
        assert_eq!(ctx.precision(), 3);
        assert_eq!(ctx.options(), &Options::default());
        assert_eq!(ctx.kernel().threshold(), 60);
    }

    #[test]
    fn initialize_resizes_and_clears() {
        let mut ctx = Context::with_precision(4).unwrap();
        let pi = Estimate::pi(&mut ctx).unwrap();
        assert!(ctx.cached_pi(4).is_some());
        assert!(ctx.cached_pi(5).is_none());
        assert_eq!(pi.precision(), 4);

        ctx.initialize(8).unwrap();
        assert_eq!(ctx.precision(), 8);
        assert_eq!(ctx.options().working_precision, 8);
        assert!(ctx.cached_pi(1).is_none());
    }

    #[test]
    fn initialize_rejects_small_precision() {
        let mut ctx = Context::with_precision(4).unwrap();
        let err = ctx.initialize(2).unwrap_err();
        assert!(matches!(err, RealError::Kernel(_)));
        assert_eq!(ctx.precision(), 4);
    }

    #[test]
    fn finalize_releases_kernel() {
        let mut ctx = Context::with_precision(4).unwrap();
        ctx.finalize();
        assert_eq!(ctx.precision(), 0);
        assert!(!ctx.kernel().is_initialized());
        ctx.initialize(3).unwrap();
        assert!(ctx.kernel_mut().is_initialized());
    }
}
