//! Corruption Policy: one probability-gated defect dimension.
//!
//! Applying a policy consumes exactly one `unit()` draw before either branch
//! runs; the branch then makes whatever draws it needs. Policies on different
//! fields of a record are evaluated independently, in the generator's
//! published field order.

use crate::errors::GenerationError;
use crate::generators::GenerationContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorruptionPolicy {
    name: &'static str,
    probability: f64,
}

impl CorruptionPolicy {
    /// `probability` must lie in `[0, 1]`.
    pub fn new(name: &'static str, probability: f64) -> Result<Self, GenerationError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(GenerationError::config(format!(
                "policy '{name}' probability must be in [0, 1], got {probability}"
            )));
        }
        Ok(Self { name, probability })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draw once and report whether the dirty branch is taken. Fired
    /// policies are tallied on the context under the policy name.
    pub fn fires(&self, ctx: &mut GenerationContext<'_>) -> bool {
        let fired = ctx.stream.unit() < self.probability;
        if fired {
            ctx.record_defect(self.name);
        }
        fired
    }

    pub fn apply<'a, T>(
        &self,
        ctx: &mut GenerationContext<'a>,
        clean: impl FnOnce(&mut GenerationContext<'a>) -> T,
        dirty: impl FnOnce(&mut GenerationContext<'a>) -> T,
    ) -> T {
        self.apply_or_clean(ctx, false, clean, dirty)
    }

    /// Like [`apply`](Self::apply), but `force_clean` takes the clean branch
    /// whatever the draw says. The draw is still consumed and a forced row
    /// is not tallied as fired.
    pub fn apply_or_clean<'a, T>(
        &self,
        ctx: &mut GenerationContext<'a>,
        force_clean: bool,
        clean: impl FnOnce(&mut GenerationContext<'a>) -> T,
        dirty: impl FnOnce(&mut GenerationContext<'a>) -> T,
    ) -> T {
        let fired = ctx.stream.unit() < self.probability && !force_clean;
        if fired {
            ctx.record_defect(self.name);
            dirty(ctx)
        } else {
            clean(ctx)
        }
    }
}
