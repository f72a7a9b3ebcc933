//! Effect Chain management
//!
//! Effects are processed in ascending `order`, which always equals the
//! effect's index in the chain. Structural edits reindex the chain.
//!
//! A failing effect never aborts the chain: it is bypassed, logged, and the
//! next effect sees the unmodified input.

use log::warn;

use super::effect::{AudioEffect, ProcessContext};
use crate::engine::AudioBuffer;

/// What happened to one effect during a chain run
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutcome {
    Applied,
    /// Effect is disabled
    Skipped,
    /// Effect failed or produced non-finite samples; input passed through
    Bypassed(String),
}

/// Ordered list of effects attached to one bus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectChain {
    effects: Vec<AudioEffect>,
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from effects sorted by their stored `order`
    pub fn from_effects(mut effects: Vec<AudioEffect>) -> Self {
        effects.sort_by_key(|e| e.order());
        let mut chain = Self { effects };
        chain.reindex();
        chain
    }

    /// Append an effect; returns its index
    pub fn push(&mut self, mut effect: AudioEffect) -> usize {
        let index = self.effects.len();
        effect.set_order(index);
        self.effects.push(effect);
        index
    }

    /// Remove the effect at `index` and reindex the rest
    pub fn remove(&mut self, index: usize) -> Option<AudioEffect> {
        if index >= self.effects.len() {
            return None;
        }
        let removed = self.effects.remove(index);
        self.reindex();
        Some(removed)
    }

    pub fn get(&self, index: usize) -> Option<&AudioEffect> {
        self.effects.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut AudioEffect> {
        self.effects.get_mut(index)
    }

    /// Get the number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate over effects in chain order
    pub fn iter(&self) -> impl Iterator<Item = &AudioEffect> {
        self.effects.iter()
    }

    /// Run `buffer` through every enabled effect in order
    pub fn process(&self, buffer: &mut AudioBuffer, ctx: &ProcessContext) -> Vec<EffectOutcome> {
        let mut outcomes = Vec::with_capacity(self.effects.len());
        for effect in &self.effects {
            if !effect.enabled {
                outcomes.push(EffectOutcome::Skipped);
                continue;
            }

            let processor = effect.build(ctx);
            let mut scratch = buffer.clone();
            let outcome = match processor.process(&mut scratch) {
                Ok(()) if scratch.is_valid() => {
                    *buffer = scratch;
                    EffectOutcome::Applied
                }
                Ok(()) => EffectOutcome::Bypassed("produced non-finite samples".to_string()),
                Err(e) => EffectOutcome::Bypassed(e.to_string()),
            };
            if let EffectOutcome::Bypassed(reason) = &outcome {
                warn!(
                    "Bypassing {} effect #{}: {}",
                    processor.effect_type(),
                    effect.order(),
                    reason
                );
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    fn reindex(&mut self) {
        for (i, effect) in self.effects.iter_mut().enumerate() {
            effect.set_order(i);
        }
    }
}
