//! Sample spaces: draw-order buffers over a domain of indices.
//!
//! A space holds one ordering of its domain plus a cursor. Scan methods step
//! the cursor and wrap; without-replacement reshuffles the whole ordering on
//! exhaustion; with-replacement draws a fresh uniform position every call.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SampleMethod {
    #[default]
    Ascending,
    Descending,
    UniformWithReplacement,
    UniformWithoutReplacement,
    Manual,
}

/// Ordering and exhaustion state for one sampling domain.
#[derive(Debug, Clone)]
pub struct SampleSpace {
    method: SampleMethod,
    order: Vec<usize>,
    cursor: Option<usize>,
}

impl SampleSpace {
    /// Build the initial ordering for `domain` under `method`.
    ///
    /// Ascending and descending sort the domain; without-replacement starts
    /// from a uniform-random permutation; with-replacement and manual keep
    /// ascending order, their cursor logic never scans it sequentially.
    pub fn generate(mut domain: Vec<usize>, method: SampleMethod, rng: &mut impl Rng) -> Self {
        match method {
            SampleMethod::Descending => domain.sort_unstable_by(|a, b| b.cmp(a)),
            SampleMethod::UniformWithoutReplacement => {
                domain.sort_unstable();
                domain.shuffle(rng);
            }
            _ => domain.sort_unstable(),
        }
        Self {
            method,
            order: domain,
            cursor: None,
        }
    }

    /// Space over the empty domain; every draw reports no selection.
    pub fn empty() -> Self {
        Self {
            method: SampleMethod::Ascending,
            order: Vec::new(),
            cursor: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current ordering of the domain.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Cursor position within the current ordering.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Rewind to the pre-first position without regenerating the ordering.
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// Position of a domain element in the current ordering.
    pub fn position_of(&self, element: usize) -> Option<usize> {
        self.order.iter().position(|&e| e == element)
    }

    /// Park the cursor at `pos` and return the element there.
    pub fn select_at(&mut self, pos: usize) -> Option<usize> {
        let element = *self.order.get(pos)?;
        self.cursor = Some(pos);
        Some(element)
    }

    /// Advance the cursor per the space's method and return the selected
    /// element, or `None` for an empty domain.
    ///
    /// `step` applies to the scan methods only. A without-replacement space
    /// reshuffles its whole ordering when the cursor runs off the end; the
    /// last element of one permutation may therefore repeat as the first of
    /// the next.
    pub fn advance(&mut self, step: usize, rng: &mut impl Rng) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let pos = match self.method {
            SampleMethod::Ascending | SampleMethod::Descending => {
                let mut pos = match self.cursor {
                    None => step.saturating_sub(1),
                    Some(c) => c + step,
                };
                if pos >= self.order.len() {
                    pos = 0;
                }
                pos
            }
            SampleMethod::UniformWithReplacement => rng.random_range(0..self.order.len()),
            SampleMethod::UniformWithoutReplacement => match self.cursor {
                Some(c) if c + 1 < self.order.len() => c + 1,
                Some(_) => {
                    self.order.shuffle(rng);
                    0
                }
                None => 0,
            },
            SampleMethod::Manual => {
                debug!("manual sample space advanced without an index; no selection");
                return None;
            }
        };
        self.cursor = Some(pos);
        Some(self.order[pos])
    }
}
