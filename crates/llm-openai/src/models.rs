//! Model tiers and context-window selection.
//!
//! Each supported model family comes in a base variant and an extended
//! variant with a larger context window. Requests stay on the base tier
//! until the estimated input size crosses three quarters of the base
//! window, at which point the extended tier takes over (when enabled).

/// A model identifier paired with the context window it supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTier {
    pub model_id: String,
    pub max_context_tokens: i64,
}

impl ModelTier {
    fn new(model_id: &str, max_context_tokens: i64) -> Self {
        Self {
            model_id: model_id.to_string(),
            max_context_tokens,
        }
    }
}

/// Base/extended tier pair for one model family.
#[derive(Debug, Clone)]
pub struct TierTable {
    pub base: ModelTier,
    pub extended: ModelTier,
    /// Whether [`TierTable::select`] may ever return the extended tier.
    pub extended_enabled: bool,
}

impl TierTable {
    /// The GPT-3.5 family: `gpt-3.5-turbo` with a 16k fallback.
    pub fn gpt_35(extended_enabled: bool) -> Self {
        Self {
            base: ModelTier::new("gpt-3.5-turbo", 4096),
            extended: ModelTier::new("gpt-3.5-turbo-16k", 16384),
            extended_enabled,
        }
    }

    /// The GPT-4 family. The 32k tier stays behind the flag because API
    /// access to it is granted per account.
    pub fn gpt_4(extended_enabled: bool) -> Self {
        Self {
            base: ModelTier::new("gpt-4", 8191),
            extended: ModelTier::new("gpt-4-32k-0613", 32767),
            extended_enabled,
        }
    }

    /// Input-size threshold above which the extended tier is selected:
    /// three quarters of the base context window.
    pub fn crossover(&self) -> f64 {
        self.base.max_context_tokens as f64 * 0.75
    }

    /// Pick the tier for an input of `input_tokens` estimated tokens.
    ///
    /// The comparison is strict: an estimate exactly at the crossover stays
    /// on the base tier. While `extended_enabled` is false the base tier is
    /// returned regardless of size.
    pub fn select(&self, input_tokens: i64) -> &ModelTier {
        if self.extended_enabled && (input_tokens as f64) > self.crossover() {
            &self.extended
        } else {
            &self.base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt_35_crossover_is_three_quarters_of_base() {
        let table = TierTable::gpt_35(true);
        assert_eq!(table.crossover(), 3072.0);
    }

    #[test]
    fn gpt_4_crossover_is_three_quarters_of_base() {
        let table = TierTable::gpt_4(true);
        assert_eq!(table.crossover(), 6143.25);
    }

    #[test]
    fn small_input_selects_base() {
        let table = TierTable::gpt_4(true);
        assert_eq!(table.select(100).model_id, "gpt-4");
    }

    #[test]
    fn input_at_crossover_stays_on_base() {
        let table = TierTable::gpt_35(true);
        assert_eq!(table.select(3072).model_id, "gpt-3.5-turbo");
    }

    #[test]
    fn input_above_crossover_selects_extended() {
        let table = TierTable::gpt_35(true);
        assert_eq!(table.select(3073).model_id, "gpt-3.5-turbo-16k");
        assert_eq!(table.select(3073).max_context_tokens, 16384);
    }

    #[test]
    fn disabled_flag_pins_base_even_for_large_input() {
        let table = TierTable::gpt_4(false);
        assert_eq!(table.select(7000).model_id, "gpt-4");
        assert_eq!(table.select(1_000_000).model_id, "gpt-4");
    }

    #[test]
    fn gpt_4_extended_tier_when_enabled() {
        let table = TierTable::gpt_4(true);
        assert_eq!(table.select(6144).model_id, "gpt-4-32k-0613");
        assert_eq!(table.select(6144).max_context_tokens, 32767);
    }
}
