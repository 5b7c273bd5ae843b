//! Nucleotide scoring primitives.
//!
//! A match/mismatch scoring model: reward for identical bases, penalty
//! otherwise. The per-base 4x4 matrix serves the exact extender; the
//! 256-entry table scores four packed bases at once for the approximate
//! extender.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c
//!            ncbi-blast/c++/src/algo/blast/core/na_ungapped.c

/// Scoring block for a simple reward/penalty nucleotide model.
///
/// NCBI convention: `penalty` is stored as a negative value (e.g. -3 for
/// the blastn default -penalty 3), `reward` as a positive one.
///
/// NCBI reference: blast_stat.h (BlastScoreBlk), blast_stat.c:BlastScoreBlkNuclMatrixCreate
#[derive(Clone, Debug)]
pub struct BlastScoreBlk {
    pub reward: i32,
    pub penalty: i32,
    matrix: [[i32; 4]; 4],
}

impl BlastScoreBlk {
    /// `reward` must be positive, `penalty` non-positive.
    pub fn new(reward: i32, penalty: i32) -> Self {
        assert!(reward > 0, "reward must be positive");
        assert!(penalty <= 0, "penalty must be non-positive");
        let mut matrix = [[penalty; 4]; 4];
        for i in 0..4 {
            matrix[i][i] = reward;
        }
        Self {
            reward,
            penalty,
            matrix,
        }
    }

    /// Substitution score for a (query base, subject base) pair of 2-bit codes.
    #[inline(always)]
    pub fn score(&self, q_base: u8, s_base: u8) -> i32 {
        self.matrix[q_base as usize][s_base as usize]
    }
}

impl Default for BlastScoreBlk {
    /// blastn defaults: reward 1, penalty -2.
    fn default() -> Self {
        Self::new(1, -2)
    }
}

/// Build the 256-entry score table for 4-bases-at-once extension.
///
/// The table is indexed by the XOR of a packed query byte and a packed
/// subject byte; each zero 2-bit group in the XOR contributes `reward`,
/// each nonzero group `penalty`, so one lookup scores four base pairs.
///
/// NCBI reference: na_ungapped.c:1084-1120 (s_NuclUngappedExtend setup via
/// the precomputed score table passed through BlastInitialWordParameters)
pub fn build_nucl_score_table(sbp: &BlastScoreBlk) -> [i32; 256] {
    let mut table = [0i32; 256];
    for xor_byte in 0..256usize {
        let mut score = 0;
        for group in 0..4 {
            let pair = (xor_byte >> (2 * group)) & 0x03;
            score += if pair == 0 { sbp.reward } else { sbp.penalty };
        }
        table[xor_byte] = score;
    }
    table
}
