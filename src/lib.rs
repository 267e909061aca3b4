//! Golden reference data for the integration tests.
//!
//! `tests/testdata/constants_golden.json` lists functions applied to
//! decimal arguments together with their values to 40 or more significant
//! digits. Each entry can be evaluated against a [`Context`] and checked
//! against its reference.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

use realcalc_core::{Context, Estimate};

/// Location of the golden file, relative to the package root.
pub const GOLDEN_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/testdata/constants_golden.json"
);

/// Function applied by a golden entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    Pi,
    Ln2,
    Sqrt,
    Rsqrt,
    Exp,
    Log,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    /// `atan2(arg, arg2)`.
    Atan2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoldenEntry {
    pub name: String,
    pub function: Function,
    #[serde(default)]
    pub arg: Option<String>,
    #[serde(default)]
    pub arg2: Option<String>,
    /// Reference value, correctly rounded.
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoldenData {
    pub description: String,
    /// Working precision, in words, at which the entries are checked.
    pub precision: usize,
    /// Largest error bound an entry may report at that precision.
    pub max_error: f64,
    /// Allowance for the rounding of the reference strings.
    pub reference_slack: String,
    pub entries: Vec<GoldenEntry>,
}

impl GoldenData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read golden file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse golden file {}", path.display()))
    }

    /// The golden file shipped with the repository.
    pub fn load_default() -> Result<Self> {
        Self::load(GOLDEN_PATH)
    }
}

impl GoldenEntry {
    fn parse_arg(&self, ctx: &mut Context, arg: Option<&String>) -> Result<Estimate> {
        let Some(arg) = arg else {
            bail!("{}: {:?} needs an argument", self.name, self.function);
        };
        Estimate::from_str(ctx, arg).with_context(|| format!("{}: bad argument", self.name))
    }

    fn unary(&self, ctx: &mut Context) -> Result<Estimate> {
        self.parse_arg(ctx, self.arg.as_ref())
    }

    /// Apply the entry's function at the context's precision.
    pub fn evaluate(&self, ctx: &mut Context) -> Result<Estimate> {
        let result = match self.function {
            Function::Pi => Estimate::pi(ctx),
            Function::Ln2 => Estimate::ln2(ctx),
            Function::Sqrt => self.unary(ctx)?.sqrt(ctx),
            Function::Rsqrt => self.unary(ctx)?.rsqrt(ctx),
            Function::Exp => self.unary(ctx)?.exp(ctx),
            Function::Log => self.unary(ctx)?.log(ctx),
            Function::Sin => self.unary(ctx)?.sin(ctx),
            Function::Cos => self.unary(ctx)?.cos(ctx),
            Function::Tan => self.unary(ctx)?.tan(ctx),
            Function::Asin => self.unary(ctx)?.asin(ctx),
            Function::Acos => self.unary(ctx)?.acos(ctx),
            Function::Atan => self.unary(ctx)?.atan(ctx),
            Function::Atan2 => {
                let y = self.unary(ctx)?;
                let x = self.parse_arg(ctx, self.arg2.as_ref())?;
                y.atan2(&x, ctx)
            }
        };
        result.with_context(|| format!("{}: evaluation failed", self.name))
    }

    /// The reference value as an estimate carrying its conversion error.
    pub fn reference(&self, ctx: &mut Context) -> Result<Estimate> {
        Estimate::from_str(ctx, &self.value).with_context(|| format!("{}: bad reference", self.name))
    }
}
