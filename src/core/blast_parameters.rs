//! Word-finding and ungapped extension parameters.
//!
//! Cutoffs are held per query context and looked up through
//! `bsearch_context_info` at extension time, so multi-query searches can
//! carry different statistics per context.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_parameters.c

use crate::core::blast_stat::{build_nucl_score_table, BlastScoreBlk};

/// Per-context cutoffs for ungapped extension.
///
/// NCBI reference: blast_parameters.h:120-127
/// ```c
/// typedef struct BlastUngappedCutoffs {
///     Int4 x_dropoff_init; /**< Raw X-dropoff value specified by the bit score */
///     Int4 x_dropoff;      /**< Raw X-dropoff value used in the ungapped extension */
///     Int4 cutoff_score;   /**< Cutoff score for saving ungapped hits */
///     Int4 reduced_nucl_cutoff_score; /**< Only for blastn: a reduced cutoff */
/// } BlastUngappedCutoffs;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BlastUngappedCutoffs {
    /// X-dropoff magnitude; always positive, negated inside the extenders.
    pub x_dropoff: i32,
    /// Minimum score for appending an extension to the hit list.
    pub cutoff_score: i32,
    /// Threshold above which an approximate extension is recomputed exactly.
    pub reduced_nucl_cutoff_score: i32,
}

/// Parameters steering the word finder for one search.
///
/// NCBI reference: blast_parameters.h:130-147 (BlastInitialWordParameters)
#[derive(Clone, Debug)]
pub struct BlastInitialWordParameters {
    /// Two-hit window in bases; 0 selects single-hit mode.
    pub window_size: i32,
    /// Largest x_dropoff over all contexts.
    pub x_dropoff_max: i32,
    /// Smallest cutoff_score over all contexts.
    pub cutoff_score_min: i32,
    /// One entry per query context.
    pub cutoffs: Vec<BlastUngappedCutoffs>,
    /// False skips scoring entirely; linked hits are saved raw.
    pub ungapped_extension: bool,
    /// 4-bases-at-once score table; present selects the approximate extender.
    pub nucl_score_table: Option<Box<[i32; 256]>>,
}

impl BlastInitialWordParameters {
    /// Uniform cutoffs across `num_contexts` contexts, with the approximate
    /// extender enabled.
    pub fn new(
        num_contexts: usize,
        window_size: i32,
        x_dropoff: i32,
        cutoff_score: i32,
        reduced_nucl_cutoff_score: i32,
        sbp: &BlastScoreBlk,
    ) -> Self {
        assert!(x_dropoff > 0, "x_dropoff must be a positive magnitude");
        let cutoffs = vec![
            BlastUngappedCutoffs {
                x_dropoff,
                cutoff_score,
                reduced_nucl_cutoff_score,
            };
            num_contexts
        ];
        Self {
            window_size,
            x_dropoff_max: x_dropoff,
            cutoff_score_min: cutoff_score,
            cutoffs,
            ungapped_extension: true,
            nucl_score_table: Some(Box::new(build_nucl_score_table(sbp))),
        }
    }

    /// Uniform cutoffs with the exact 1-base extender only.
    pub fn new_exact_only(
        num_contexts: usize,
        window_size: i32,
        x_dropoff: i32,
        cutoff_score: i32,
    ) -> Self {
        let mut params = Self::new(
            num_contexts,
            window_size,
            x_dropoff,
            cutoff_score,
            cutoff_score,
            &BlastScoreBlk::default(),
        );
        params.nucl_score_table = None;
        params
    }

    /// Explicit per-context cutoffs.
    pub fn from_cutoffs(
        window_size: i32,
        cutoffs: Vec<BlastUngappedCutoffs>,
        ungapped_extension: bool,
        nucl_score_table: Option<Box<[i32; 256]>>,
    ) -> Self {
        assert!(!cutoffs.is_empty(), "at least one context required");
        let x_dropoff_max = cutoffs.iter().map(|c| c.x_dropoff).max().unwrap_or(0);
        let cutoff_score_min = cutoffs.iter().map(|c| c.cutoff_score).min().unwrap_or(0);
        Self {
            window_size,
            x_dropoff_max,
            cutoff_score_min,
            cutoffs,
            ungapped_extension,
            nucl_score_table,
        }
    }

    /// Cutoffs for a context index, as found by `bsearch_context_info`.
    #[inline]
    pub fn cutoffs(&self, context: usize) -> &BlastUngappedCutoffs {
        &self.cutoffs[context]
    }
}
