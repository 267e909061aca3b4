//! Real-input FFT convolution over `f64`.
//!
//! Two real signals of length `N` are convolved through one complex FFT of
//! length `N/2` each: even/odd samples are packed as real/imaginary parts,
//! the half-length spectrum is split into the real spectrum (DC and Nyquist
//! share slot 0), multiplied pointwise, recombined and inverted.
//!
//! The forward transform is decimation-in-frequency (natural order in,
//! bit-reversed order out) and the inverse is decimation-in-time
//! (bit-reversed in, natural out), so no permutation pass is needed; the
//! split and recombine steps address bins through the bit-reversal table.

use std::sync::Arc;

use crate::table_cache::{self, ConvolutionTables};
use crate::KernelError;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn load(data: &[f64], idx: usize) -> Self {
        Self::new(data[2 * idx], data[2 * idx + 1])
    }

    fn store(self, data: &mut [f64], idx: usize) {
        data[2 * idx] = self.re;
        data[2 * idx + 1] = self.im;
    }

    fn add(self, o: Self) -> Self {
        Self::new(self.re + o.re, self.im + o.im)
    }

    fn sub(self, o: Self) -> Self {
        Self::new(self.re - o.re, self.im - o.im)
    }

    fn mul(self, o: Self) -> Self {
        Self::new(
            self.re * o.re - self.im * o.im,
            self.re * o.im + self.im * o.re,
        )
    }

    fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }

    fn scale(self, s: f64) -> Self {
        Self::new(self.re * s, self.im * s)
    }

    /// Multiply by `-i`.
    fn mul_neg_i(self) -> Self {
        Self::new(self.im, -self.re)
    }

    /// Multiply by `i`.
    fn mul_i(self) -> Self {
        Self::new(-self.im, self.re)
    }
}

/// Convolution engine for transforms up to a fixed power-of-two size.
#[derive(Debug, Clone)]
pub struct Convolution {
    tables: Arc<ConvolutionTables>,
}

impl Convolution {
    /// Create an engine supporting transforms of length up to `size`.
    pub fn new(size: usize) -> Result<Self, KernelError> {
        check_size(size)?;
        Ok(Self {
            tables: table_cache::shared().get_or_build(size),
        })
    }

    /// Largest supported transform length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tables.size
    }

    /// Cyclic convolution of `a[..size]` and `b[..size]`, written to `a`.
    ///
    /// `b` is consumed as scratch. Callers wanting a linear convolution
    /// zero-pad both inputs to at least `len_a + len_b`.
    pub fn convolve(&self, a: &mut [f64], b: &mut [f64], size: usize) -> Result<(), KernelError> {
        check_size(size)?;
        if size > self.size() {
            return Err(KernelError::TransformTooLarge {
                size,
                capacity: self.size(),
            });
        }
        self.convolve_sized(a, b, size);
        Ok(())
    }

    /// [`Self::convolve`] for a size already known to be a supported power of two.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn convolve_sized(&self, a: &mut [f64], b: &mut [f64], size: usize) {
        debug_assert!(size.is_power_of_two() && size >= 4 && size <= self.size());
        let stride = self.size() / size;
        let a = &mut a[..size];
        let b = &mut b[..size];

        self.forward(a, stride);
        self.split(a, stride);
        self.forward(b, stride);
        self.split(b, stride);

        let half = size / 2;
        let scale = 1.0 / half as f64;
        // DC and Nyquist share slot 0 and multiply componentwise.
        a[0] *= b[0] * scale;
        a[1] *= b[1] * scale;
        for k in 1..half {
            Complex::load(a, k)
                .mul(Complex::load(b, k))
                .scale(scale)
                .store(a, k);
        }

        self.recombine(a, stride);
        self.inverse(a, stride);
    }

    fn twiddle(&self, k: usize) -> Complex {
        Complex::load(&self.tables.twiddles, k)
    }

    fn bit_reverse(&self, k: usize, stride: usize) -> usize {
        self.tables.bit_reverse[k] / stride
    }

    /// Decimation-in-frequency complex FFT over `data.len() / 2` points.
    fn forward(&self, data: &mut [f64], stride: usize) {
        let m = data.len() / 2;
        let mut half = m / 2;
        let mut step = 2 * stride;
        while half >= 1 {
            for start in (0..m).step_by(2 * half) {
                for j in 0..half {
                    let w = self.twiddle(j * step);
                    let x = Complex::load(data, start + j);
                    let y = Complex::load(data, start + j + half);
                    x.add(y).store(data, start + j);
                    x.sub(y).mul(w).store(data, start + j + half);
                }
            }
            half /= 2;
            step *= 2;
        }
    }

    /// Decimation-in-time inverse complex FFT (unscaled).
    fn inverse(&self, data: &mut [f64], stride: usize) {
        let m = data.len() / 2;
        let mut half = 1;
        let mut step = m * stride;
        while half < m {
            for start in (0..m).step_by(2 * half) {
                for j in 0..half {
                    let w = self.twiddle(j * step).conj();
                    let x = Complex::load(data, start + j);
                    let y = Complex::load(data, start + j + half).mul(w);
                    x.add(y).store(data, start + j);
                    x.sub(y).store(data, start + j + half);
                }
            }
            half *= 2;
            step /= 2;
        }
    }

    /// Turn the half-length complex spectrum into the real spectrum, in place.
    fn split(&self, data: &mut [f64], stride: usize) {
        let m = data.len() / 2;
        let z0 = Complex::load(data, 0);
        Complex::new(z0.re + z0.im, z0.re - z0.im).store(data, 0);
        let mid = self.bit_reverse(m / 2, stride);
        Complex::load(data, mid).conj().store(data, mid);
        for k in 1..m / 2 {
            let pk = self.bit_reverse(k, stride);
            let pm = self.bit_reverse(m - k, stride);
            let zk = Complex::load(data, pk);
            let zm = Complex::load(data, pm);
            let wk = self.twiddle(k * stride);
            let wm = self.twiddle((m - k) * stride);
            let (ek, ok) = (zk.add(zm.conj()).scale(0.5), zk.sub(zm.conj()).scale(0.5));
            let (em, om) = (zm.add(zk.conj()).scale(0.5), zm.sub(zk.conj()).scale(0.5));
            // X[k] = E[k] + W^k * O[k] / i
            ek.add(wk.mul(ok.mul_neg_i())).store(data, pk);
            em.add(wm.mul(om.mul_neg_i())).store(data, pm);
        }
    }

    /// Inverse of [`Self::split`], in place.
    fn recombine(&self, data: &mut [f64], stride: usize) {
        let m = data.len() / 2;
        let y0 = Complex::load(data, 0);
        Complex::new((y0.re + y0.im) * 0.5, (y0.re - y0.im) * 0.5).store(data, 0);
        let mid = self.bit_reverse(m / 2, stride);
        Complex::load(data, mid).conj().store(data, mid);
        for k in 1..m / 2 {
            let pk = self.bit_reverse(k, stride);
            let pm = self.bit_reverse(m - k, stride);
            let yk = Complex::load(data, pk);
            let ym = Complex::load(data, pm);
            let wk = self.twiddle(k * stride);
            let wm = self.twiddle((m - k) * stride);
            let ek = yk.add(ym.conj()).scale(0.5);
            let ok = yk.sub(ym.conj()).scale(0.5).mul(wk.conj());
            let em = ym.add(yk.conj()).scale(0.5);
            let om = ym.sub(yk.conj()).scale(0.5).mul(wm.conj());
            // Z[k] = E[k] + i * O[k]
            ek.add(ok.mul_i()).store(data, pk);
            em.add(om.mul_i()).store(data, pm);
        }
    }
}

fn check_size(size: usize) -> Result<(), KernelError> {
    if size < 4 {
        return Err(KernelError::TransformTooSmall(size));
    }
    if !size.is_power_of_two() {
        return Err(KernelError::NotPowerOfTwo(size));
    }
    Ok(())
}
