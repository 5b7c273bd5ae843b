//! Nucleotide ungapped extension and the word-finder driver.
//!
//! Raw offset pairs produced by a lookup-table scan go through three
//! stages here:
//!
//! 1. exact-match verification, widening a lookup word of `lut_word_length`
//!    bases into the full `word_length`-base alignment word (four variants,
//!    chosen once per lookup configuration);
//! 2. diagonal linking, a per-diagonal state machine that drops redundant
//!    hits and, in two-hit mode, waits for a second nearby hit before
//!    extending;
//! 3. ungapped X-drop extension with per-context cutoffs, appending
//!    survivors to the initial hit list.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/na_ungapped.c

use std::cmp::{max, min};

use anyhow::{bail, Context, Result};
use rustc_hash::FxHashMap;

use crate::core::blast_diagnostics::{diagnostics_enabled, BlastUngappedStats};
use crate::core::blast_encoding::{PackedSequence, SequenceBlk, COMPRESSION_RATIO};
use crate::core::blast_extend::{BlastInitHitList, BlastUngappedData, ExtendWord};
use crate::core::blast_parameters::BlastInitialWordParameters;
use crate::core::blast_query_info::{bsearch_context_info, QueryInfo};
use crate::core::blast_stat::BlastScoreBlk;

/// One lookup-table hit.
///
/// NCBI reference: blast_extend.h:51-54
/// ```c
/// typedef union BlastOffsetPair {
///     struct { Uint4 q_off; Uint4 s_off; } qs_offsets;
///     ...
/// } BlastOffsetPair;
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlastOffsetPair {
    pub q_off: i32,
    pub s_off: i32,
}

/// A closed interval of allowed (unmasked) positions.
///
/// NCBI reference: blast_def.h (SSeqRange)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SSeqRange {
    pub left: i32,
    pub right: i32,
}

/// Lookup-table family, as far as extension cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NaLookupKind {
    /// Standard contiguous-word table.
    Standard,
    /// Small direct-address table with a short residual word.
    Small,
}

/// Lookup-table facts the word finder needs; the table itself stays behind
/// the scanning callback.
#[derive(Clone, Debug)]
pub struct NaLookupInfo {
    pub kind: NaLookupKind,
    /// Full alignment word that must match exactly.
    pub word_length: i32,
    /// Word width indexed by the lookup table.
    pub lut_word_length: i32,
    /// Stride of the scanning callback over the subject.
    pub scan_step: i32,
    /// Soft-masked query intervals recorded when the table was built;
    /// only consulted by the small-table extender.
    pub masked_locations: Vec<SSeqRange>,
}

/// Scanning callback contract: fill `out` with hits for lookup words
/// starting in `[start_offset, last_offset]`, return the count and the
/// next subject offset to resume from. Never writes past `out.len()`.
///
/// When the batch fills mid-position the callback may return the current
/// offset unchanged and deliver the rest of that position's hits on the
/// next call; a callback that returns no hits must advance the offset.
pub type NaScanSubject<'a> = dyn FnMut(&SequenceBlk, i32, i32, &mut [BlastOffsetPair]) -> (usize, i32)
    + 'a;

/// Source of precomputed word hits for the indexed entry point.
pub trait IndexedSeedSource {
    /// Pull the next candidate batch into `out`; returns the count,
    /// 0 once exhausted.
    fn next_batch(&mut self, out: &mut [BlastOffsetPair]) -> usize;
}

/// Count of matching 2-bit groups in an XOR byte, from the low-order end.
/// Serves left extension, where the nearest base pairs sit in the low bits.
///
/// NCBI reference: na_ungapped.c:46-80 (s_ExactMatchExtendLeft)
const EXACT_MATCH_EXTEND_LEFT: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut x = 0usize;
    while x < 256 {
        let mut count = 0u8;
        while count < 4 && (x >> (2 * count)) & 0x03 == 0 {
            count += 1;
        }
        table[x] = count;
        x += 1;
    }
    table
};

/// Count of matching 2-bit groups in an XOR byte, from the high-order end.
///
/// NCBI reference: na_ungapped.c:82-116 (s_ExactMatchExtendRight)
const EXACT_MATCH_EXTEND_RIGHT: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut x = 0usize;
    while x < 256 {
        let mut count = 0u8;
        while count < 4 && (x >> (6 - 2 * count)) & 0x03 == 0 {
            count += 1;
        }
        table[x] = count;
        x += 1;
    }
    table
};

/// Exact-match extender variant, fixed once per lookup configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NaExtendVariant {
    /// Lookup word equals the alignment word; nothing to verify.
    Direct,
    /// One base at a time, any alignment.
    Arbitrary,
    /// Subject hits always start on a byte boundary; compare whole bytes.
    ByteAligned,
    /// Residual of at most 4 bases per side, resolved by table lookup.
    SmallTable,
}

/// NCBI reference: na_ungapped.c:BlastChooseNaExtend
fn choose_na_extend(lookup: &NaLookupInfo) -> NaExtendVariant {
    assert!(
        lookup.word_length >= lookup.lut_word_length,
        "alignment word shorter than lookup word"
    );
    if lookup.word_length == lookup.lut_word_length {
        return NaExtendVariant::Direct;
    }
    if lookup.kind == NaLookupKind::Small
        && lookup.word_length - lookup.lut_word_length <= COMPRESSION_RATIO as i32
    {
        return NaExtendVariant::SmallTable;
    }
    if lookup.lut_word_length % COMPRESSION_RATIO as i32 == 0
        && lookup.scan_step % COMPRESSION_RATIO as i32 == 0
    {
        return NaExtendVariant::ByteAligned;
    }
    NaExtendVariant::Arbitrary
}

/// Four consecutive bases packed MSB-first into one byte, zero-filled
/// outside the sequence. Out-of-range fill never affects callers because
/// match counts are clamped to in-bounds limits first.
#[inline(always)]
fn packed_window(seq: &PackedSequence, start: i32) -> u8 {
    let mut byte = 0u8;
    for i in 0..COMPRESSION_RATIO as i32 {
        let pos = start + i;
        let code = if pos >= 0 && (pos as usize) < seq.len() {
            seq.get_base(pos as usize)
        } else {
            0
        };
        byte = (byte << 2) | code;
    }
    byte
}

/// True if `[q_start, q_end)` lies strictly inside a masked interval.
/// The boundary test is open on both ends, matching the reference
/// semantics; intervals must be sorted ascending by `left`.
fn seed_inside_masked(intervals: &[SSeqRange], q_start: i32, q_end: i32) -> bool {
    let idx = intervals.partition_point(|iv| iv.right <= q_start);
    idx < intervals.len() && q_start > intervals[idx].left && q_end < intervals[idx].right
}

/// Scan-range walker over the allowed subject intervals.
///
/// Within an interval `[left, right]`, lookup words may start no earlier
/// than `left + word_length - lut_word_length` (room for the left part of
/// the alignment word) and no later than `right + 1 - lut_word_length`.
/// Intervals too short for a full alignment word are skipped.
///
/// NCBI reference: na_ungapped.c:s_DetermineNaScanningOffsets
pub struct ScanCursor {
    ranges: Vec<SSeqRange>,
    range_index: usize,
    /// Next subject offset to hand to the scanning callback; valid only
    /// while inside the current range.
    pub next_offset: i32,
    entered: bool,
}

impl ScanCursor {
    /// `ranges` empty means the whole subject is allowed.
    pub fn new(ranges: &[SSeqRange], subject_length: i32) -> Self {
        let ranges = if ranges.is_empty() {
            vec![SSeqRange {
                left: 0,
                right: subject_length - 1,
            }]
        } else {
            ranges.to_vec()
        };
        Self {
            ranges,
            range_index: 0,
            next_offset: 0,
            entered: false,
        }
    }

    /// Position the cursor on the next valid scanning sub-range and return
    /// its inclusive last scanning offset; `None` once all ranges are
    /// exhausted, a normal termination.
    pub fn next_scan_range(&mut self, word_length: i32, lut_word_length: i32) -> Option<i32> {
        loop {
            if self.range_index >= self.ranges.len() {
                return None;
            }
            let range = self.ranges[self.range_index];
            let first = range.left + word_length - lut_word_length;
            let last = range.right + 1 - lut_word_length;
            if !self.entered {
                self.next_offset = first;
                self.entered = true;
            }
            if range.right - range.left + 1 >= word_length && self.next_offset <= last {
                return Some(last);
            }
            self.range_index += 1;
            self.entered = false;
        }
    }
}

/// Per-base exact X-drop extension.
///
/// The running sum resets to zero whenever it goes positive, folding into
/// the total score and moving the corresponding boundary; a direction
/// terminates once the sum drops below `x` (`x` is negative). A sum of
/// exactly zero neither resets nor terminates. The seed base at
/// `(q_off, s_off)` is scored by the right-hand loop.
///
/// NCBI reference: na_ungapped.c:s_NuclUngappedExtendExact
fn nucl_ungapped_extend_exact(
    query: &SequenceBlk,
    subject: &SequenceBlk,
    sbp: &BlastScoreBlk,
    q_off: i32,
    s_off: i32,
    x: i32,
    q_context_start: i32,
    q_context_end: i32,
) -> BlastUngappedData {
    debug_assert!(x < 0, "x_dropoff must arrive negated");
    let q = query.codes();
    let s = subject.compressed();

    let mut score = 0i32;
    let mut sum = 0i32;

    let max_left = min(q_off - q_context_start, s_off);
    let mut left = 0i32;
    let mut i = 1i32;
    while i <= max_left {
        let qb = q[(q_off - i) as usize];
        let sb = s.get_base((s_off - i) as usize);
        sum += sbp.score(qb, sb);
        if sum > 0 {
            score += sum;
            sum = 0;
            left = i;
        } else if sum < x {
            break;
        }
        i += 1;
    }

    let max_right = min(q_context_end - q_off, subject.length() - s_off);
    let mut right = 0i32;
    sum = 0;
    let mut i = 0i32;
    while i < max_right {
        let qb = q[(q_off + i) as usize];
        let sb = s.get_base((s_off + i) as usize);
        sum += sbp.score(qb, sb);
        if sum > 0 {
            score += sum;
            sum = 0;
            right = i + 1;
        } else if sum < x {
            break;
        }
        i += 1;
    }

    BlastUngappedData {
        q_start: q_off - left,
        s_start: s_off - left,
        length: left + right,
        score,
    }
}

/// Four query codes packed MSB-first, for XOR against a subject byte.
#[inline(always)]
fn query_byte(q: &[u8], pos: usize) -> u8 {
    (q[pos] << 6) | (q[pos + 1] << 4) | (q[pos + 2] << 2) | q[pos + 3]
}

/// Approximate 4-bases-at-a-time X-drop extension.
///
/// Extension proceeds in whole packed bytes from the first byte-aligned
/// subject position at or after the seed, scoring each group through the
/// 256-entry table. The reported length is floored so it always reaches
/// `s_match_end`, the subject end of the verified exact match. When the
/// approximate score reaches `reduced_cutoff` the whole extension is
/// recomputed per base, so any hit that may be reported downstream
/// carries an exact score.
///
/// NCBI reference: na_ungapped.c:s_NuclUngappedExtend
#[allow(clippy::too_many_arguments)]
fn nucl_ungapped_extend_approx(
    query: &SequenceBlk,
    subject: &SequenceBlk,
    sbp: &BlastScoreBlk,
    score_table: &[i32; 256],
    q_off: i32,
    s_match_end: i32,
    s_off: i32,
    x: i32,
    reduced_cutoff: i32,
    q_context_start: i32,
    q_context_end: i32,
) -> BlastUngappedData {
    debug_assert!(x < 0, "x_dropoff must arrive negated");
    let q = query.codes();
    let s_data = subject.compressed().data();

    // round the anchor up to the next subject byte boundary
    let ratio = COMPRESSION_RATIO as i32;
    let adjust = (ratio - s_off % ratio) % ratio;
    let q_anchor = q_off + adjust;
    let s_anchor = s_off + adjust;
    debug_assert!(s_anchor % ratio == 0);

    let mut score = 0i32;
    let mut sum = 0i32;

    let left_bytes = min(q_anchor - q_context_start, s_anchor) / ratio;
    let mut left = 0i32;
    let mut i = 1i32;
    while i <= left_bytes {
        let qb = query_byte(q, (q_anchor - ratio * i) as usize);
        let sb = s_data[(s_anchor / ratio - i) as usize];
        sum += score_table[(qb ^ sb) as usize];
        if sum > 0 {
            score += sum;
            sum = 0;
            left = i;
        }
        if sum < x {
            break;
        }
        i += 1;
    }

    let right_bytes = min(q_context_end - q_anchor, subject.length() - s_anchor) / ratio;
    let mut right = 0i32;
    sum = 0;
    let mut i = 0i32;
    while i < right_bytes {
        let qb = query_byte(q, (q_anchor + ratio * i) as usize);
        let sb = s_data[(s_anchor / ratio + i) as usize];
        sum += score_table[(qb ^ sb) as usize];
        if sum > 0 {
            score += sum;
            sum = 0;
            right = i + 1;
        }
        if sum < x {
            break;
        }
        i += 1;
    }

    let q_start = q_anchor - ratio * left;
    let s_start = s_anchor - ratio * left;
    let mut length = ratio * (left + right);
    // never report less than the already-verified exact match
    length = max(length, s_match_end - s_start);

    if score >= reduced_cutoff {
        return nucl_ungapped_extend_exact(
            query,
            subject,
            sbp,
            q_off,
            s_off,
            x,
            q_context_start,
            q_context_end,
        );
    }

    BlastUngappedData {
        q_start,
        s_start,
        length,
        score,
    }
}

/// What the diagonal state machine decided for one verified hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HitDisposition {
    /// Inside an already-explored region, or too soon after the last
    /// linked extension; no state change.
    Discard,
    /// First hit in two-hit mode, or a stale predecessor replaced;
    /// remember the position only.
    Record,
    /// Linking condition met; extend and possibly save.
    Link,
}

/// Linking decision shared by both diagonal containers.
///
/// `step` is the biased distance from the last recorded end to this hit's
/// end. Single-hit mode and already-saved diagonals link on any forward
/// step past `min_step`; an unsaved diagonal in two-hit mode links only
/// when the second hit lands at least `template_length` but less than
/// `window_size` past the first, and otherwise replaces it.
///
/// NCBI reference: na_ungapped.c:s_BlastnDiagTableExtendInitialHit /
/// s_BlastnDiagHashExtendInitialHit (shared hit-gating logic)
fn classify_hit(
    step: i32,
    min_step: i32,
    window_size: i32,
    template_length: i32,
    two_hits: bool,
    hit_saved: bool,
) -> HitDisposition {
    if step <= 0 {
        return HitDisposition::Discard;
    }
    if !two_hits || hit_saved {
        if step > min_step {
            HitDisposition::Link
        } else {
            HitDisposition::Discard
        }
    } else if step >= template_length && step < window_size {
        HitDisposition::Link
    } else {
        HitDisposition::Record
    }
}

struct FinderContext<'a> {
    query: &'a SequenceBlk,
    subject: &'a SequenceBlk,
    query_info: &'a QueryInfo,
    sbp: &'a BlastScoreBlk,
    word_params: &'a BlastInitialWordParameters,
    word_length: i32,
    /// Lower bound for a second linking hit; the lookup word length for
    /// contiguous lookups.
    template_length: i32,
    min_step: i32,
}

impl<'a> FinderContext<'a> {
    /// Run the ungapped extender for a linked hit and decide whether it
    /// reaches the hit list. Returns the new biased end level and the
    /// saved flag.
    fn extend_and_save(
        &self,
        q_off: i32,
        s_off: i32,
        bias: i32,
        init_hitlist: &mut BlastInitHitList,
    ) -> (i32, bool) {
        if !self.word_params.ungapped_extension {
            init_hitlist.save_hit(q_off, s_off, None);
            return (s_off + self.word_length + bias, true);
        }

        let context = bsearch_context_info(q_off, self.query_info);
        let ctx = &self.query_info.contexts[context];
        let cutoffs = self.word_params.cutoffs(context);
        let x = -cutoffs.x_dropoff;
        let s_match_end = s_off + self.word_length;

        let data = match &self.word_params.nucl_score_table {
            Some(table) => nucl_ungapped_extend_approx(
                self.query,
                self.subject,
                self.sbp,
                table,
                q_off,
                s_match_end,
                s_off,
                x,
                cutoffs.reduced_nucl_cutoff_score,
                ctx.query_offset,
                ctx.query_end(),
            ),
            None => nucl_ungapped_extend_exact(
                self.query,
                self.subject,
                self.sbp,
                q_off,
                s_off,
                x,
                ctx.query_offset,
                ctx.query_end(),
            ),
        };

        let level = data.s_start + data.length + bias;
        if data.score >= cutoffs.cutoff_score {
            init_hitlist.save_hit(q_off, s_off, Some(Box::new(data)));
            (level, true)
        } else {
            (level, false)
        }
    }

    /// Feed one verified hit through the diagonal state machine.
    /// Returns true if an extension was performed.
    fn extend_initial_hit(
        &self,
        q_off: i32,
        s_off: i32,
        ewp: &mut ExtendWord,
        init_hitlist: &mut BlastInitHitList,
    ) -> Result<bool> {
        let window_size = self.word_params.window_size;
        let two_hits = window_size > 0;
        let s_end = s_off + self.word_length;

        match ewp {
            ExtendWord::DiagTable(table) => {
                let bias = table.offset();
                let coord = table.diag_coord(q_off, s_off);
                let cell = table.cell(coord);
                let s_end_pos = s_end + bias;
                let step = s_end_pos - cell.last_hit;
                match classify_hit(
                    step,
                    self.min_step,
                    window_size,
                    self.template_length,
                    two_hits,
                    cell.flag,
                ) {
                    HitDisposition::Discard => Ok(false),
                    HitDisposition::Record => {
                        table.set_cell(coord, s_end_pos, false);
                        Ok(false)
                    }
                    HitDisposition::Link => {
                        let (level, saved) =
                            self.extend_and_save(q_off, s_off, bias, init_hitlist);
                        table.set_cell(coord, level, saved);
                        Ok(true)
                    }
                }
            }
            ExtendWord::DiagHash(hash) => {
                let bias = hash.offset();
                let diag = s_off - q_off;
                let (last_hit, hit_saved) = hash.retrieve(diag).unwrap_or((0, false));
                let s_end_pos = s_end + bias;
                let step = s_end_pos - last_hit;
                let stale_step = if two_hits {
                    max(self.min_step, window_size)
                } else {
                    self.min_step
                };
                match classify_hit(
                    step,
                    self.min_step,
                    window_size,
                    self.template_length,
                    two_hits,
                    hit_saved,
                ) {
                    HitDisposition::Discard => Ok(false),
                    HitDisposition::Record => {
                        hash.insert(diag, s_end_pos, false, s_end_pos, stale_step)
                            .context("diagonal hash growth failed")?;
                        Ok(false)
                    }
                    HitDisposition::Link => {
                        let (level, saved) =
                            self.extend_and_save(q_off, s_off, bias, init_hitlist);
                        hash.insert(diag, level, saved, s_end_pos, stale_step)
                            .context("diagonal hash growth failed")?;
                        Ok(true)
                    }
                }
            }
        }
    }
}

/// Direct dispatch: the lookup word already is the alignment word.
///
/// NCBI reference: na_ungapped.c:s_BlastNaExtendDirect
fn na_extend_direct(
    ctx: &FinderContext<'_>,
    offset_pairs: &[BlastOffsetPair],
    ewp: &mut ExtendWord,
    init_hitlist: &mut BlastInitHitList,
) -> Result<usize> {
    let mut hits_extended = 0;
    for pair in offset_pairs {
        if ctx.extend_initial_hit(pair.q_off, pair.s_off, ewp, init_hitlist)? {
            hits_extended += 1;
        }
    }
    Ok(hits_extended)
}

/// Arbitrary-offset verification, one base at a time on each side.
///
/// NCBI reference: na_ungapped.c:s_BlastNaExtend
fn na_extend_arbitrary(
    ctx: &FinderContext<'_>,
    lookup: &NaLookupInfo,
    offset_pairs: &[BlastOffsetPair],
    ewp: &mut ExtendWord,
    init_hitlist: &mut BlastInitHitList,
) -> Result<usize> {
    let q = ctx.query.codes();
    let s = ctx.subject.compressed();
    let needed = lookup.word_length - lookup.lut_word_length;
    let lut = lookup.lut_word_length;
    let mut hits_extended = 0;

    for pair in offset_pairs {
        let q_off = pair.q_off;
        let s_off = pair.s_off;
        let context = bsearch_context_info(q_off, ctx.query_info);
        let info = &ctx.query_info.contexts[context];

        let max_left = min(needed, min(s_off, q_off - info.query_offset));
        let mut ext_left = 0;
        while ext_left < max_left {
            let qb = q[(q_off - ext_left - 1) as usize];
            let sb = s.get_base((s_off - ext_left - 1) as usize);
            if qb != sb {
                break;
            }
            ext_left += 1;
        }

        if ext_left < needed {
            let ext_max = needed - ext_left;
            if s_off + lut + ext_max > ctx.subject.length()
                || q_off + lut + ext_max > info.query_end()
            {
                continue;
            }
            let mut ext_right = 0;
            while ext_right < ext_max {
                let qb = q[(q_off + lut + ext_right) as usize];
                let sb = s.get_base((s_off + lut + ext_right) as usize);
                if qb != sb {
                    break;
                }
                ext_right += 1;
            }
            if ext_right < ext_max {
                continue;
            }
        }

        if ctx.extend_initial_hit(q_off - ext_left, s_off - ext_left, ewp, init_hitlist)? {
            hits_extended += 1;
        }
    }
    Ok(hits_extended)
}

/// Byte-aligned verification: subject hits start on byte boundaries, so
/// whole subject bytes are walked, short-circuiting inside a byte on the
/// first mismatching base.
///
/// NCBI reference: na_ungapped.c:s_BlastNaExtendAligned
fn na_extend_aligned(
    ctx: &FinderContext<'_>,
    lookup: &NaLookupInfo,
    offset_pairs: &[BlastOffsetPair],
    ewp: &mut ExtendWord,
    init_hitlist: &mut BlastInitHitList,
) -> Result<usize> {
    let ratio = COMPRESSION_RATIO as i32;
    let q = ctx.query.codes();
    let s_data = ctx.subject.compressed().data();
    let needed = lookup.word_length - lookup.lut_word_length;
    let lut = lookup.lut_word_length;
    let mut hits_extended = 0;

    for pair in offset_pairs {
        let q_off = pair.q_off;
        let s_off = pair.s_off;
        debug_assert!(s_off % ratio == 0, "hit not byte aligned");
        let context = bsearch_context_info(q_off, ctx.query_info);
        let info = &ctx.query_info.contexts[context];

        let max_left = min(needed, min(s_off, q_off - info.query_offset));
        let mut ext_left = 0;
        'left: while ext_left < max_left {
            let byte = s_data[((s_off - ext_left - 1) / ratio) as usize];
            // low bit-pair first: nearest base to the boundary
            for k in 0..ratio {
                if ext_left >= max_left {
                    break 'left;
                }
                let sb = (byte >> (2 * k)) & 0x03;
                if sb != q[(q_off - ext_left - 1) as usize] {
                    break 'left;
                }
                ext_left += 1;
            }
        }

        if ext_left < needed {
            let ext_max = needed - ext_left;
            if s_off + lut + ext_max > ctx.subject.length()
                || q_off + lut + ext_max > info.query_end()
            {
                continue;
            }
            let mut ext_right = 0;
            'right: while ext_right < ext_max {
                let byte = s_data[((s_off + lut + ext_right) / ratio) as usize];
                for k in 0..ratio {
                    if ext_right >= ext_max {
                        break 'right;
                    }
                    let sb = (byte >> (2 * (3 - k))) & 0x03;
                    if sb != q[(q_off + lut + ext_right) as usize] {
                        break 'right;
                    }
                    ext_right += 1;
                }
            }
            if ext_right < ext_max {
                continue;
            }
        }

        if ctx.extend_initial_hit(q_off - ext_left, s_off - ext_left, ewp, init_hitlist)? {
            hits_extended += 1;
        }
    }
    Ok(hits_extended)
}

/// Small-table verification: the residual is at most 4 bases per side, so
/// one XOR plus a match-count table resolves each side. The confirmed
/// window is additionally screened against soft-masked query intervals.
///
/// NCBI reference: na_ungapped.c:s_BlastSmallNaExtend
fn na_extend_small(
    ctx: &FinderContext<'_>,
    lookup: &NaLookupInfo,
    offset_pairs: &[BlastOffsetPair],
    ewp: &mut ExtendWord,
    init_hitlist: &mut BlastInitHitList,
) -> Result<usize> {
    let q_packed = ctx.query.compressed();
    let s_packed = ctx.subject.compressed();
    let needed = lookup.word_length - lookup.lut_word_length;
    let lut = lookup.lut_word_length;
    let ratio = COMPRESSION_RATIO as i32;
    let mut hits_extended = 0;

    for pair in offset_pairs {
        let q_off = pair.q_off;
        let s_off = pair.s_off;
        let context = bsearch_context_info(q_off, ctx.query_info);
        let info = &ctx.query_info.contexts[context];

        let max_left = min(needed, min(s_off, q_off - info.query_offset));
        let mut ext_left = 0;
        if max_left > 0 {
            let qb = packed_window(q_packed, q_off - ratio);
            let sb = packed_window(s_packed, s_off - ratio);
            ext_left = min(
                max_left,
                EXACT_MATCH_EXTEND_LEFT[(qb ^ sb) as usize] as i32,
            );
        }

        if ext_left < needed {
            let ext_max = needed - ext_left;
            if s_off + lut + ext_max > ctx.subject.length()
                || q_off + lut + ext_max > info.query_end()
            {
                continue;
            }
            let qb = packed_window(q_packed, q_off + lut);
            let sb = packed_window(s_packed, s_off + lut);
            let ext_right = EXACT_MATCH_EXTEND_RIGHT[(qb ^ sb) as usize] as i32;
            if ext_right < ext_max {
                continue;
            }
        }

        let q_start = q_off - ext_left;
        if needed > 0
            && !lookup.masked_locations.is_empty()
            && seed_inside_masked(
                &lookup.masked_locations,
                q_start,
                q_start + lookup.word_length,
            )
        {
            continue;
        }

        if ctx.extend_initial_hit(q_start, s_off - ext_left, ewp, init_hitlist)? {
            hits_extended += 1;
        }
    }
    Ok(hits_extended)
}

/// Scan a subject chunk and feed every lookup hit through verification,
/// diagonal linking, and ungapped extension.
///
/// `subject_ranges` lists the allowed (unmasked) subject intervals in
/// ascending order; empty means the whole subject. `max_hits` sizes the
/// batch buffer handed to the scanning callback.
///
/// NCBI reference: na_ungapped.c:BlastNaWordFinder
#[allow(clippy::too_many_arguments)]
pub fn blast_na_word_finder(
    query: &SequenceBlk,
    subject: &SequenceBlk,
    query_info: &QueryInfo,
    sbp: &BlastScoreBlk,
    lookup: &NaLookupInfo,
    word_params: &BlastInitialWordParameters,
    scan: &mut NaScanSubject<'_>,
    subject_ranges: &[SSeqRange],
    max_hits: usize,
    ewp: &mut ExtendWord,
    init_hitlist: &mut BlastInitHitList,
    stats: &BlastUngappedStats,
) -> Result<()> {
    assert!(max_hits > 0, "batch buffer must hold at least one hit");
    assert!(
        lookup.lut_word_length > 0 && lookup.scan_step > 0,
        "malformed lookup configuration"
    );
    let variant = choose_na_extend(lookup);

    let min_step = if word_params.ungapped_extension {
        0
    } else {
        lookup.scan_step
    };
    let ctx = FinderContext {
        query,
        subject,
        query_info,
        sbp,
        word_params,
        word_length: lookup.word_length,
        template_length: lookup.lut_word_length,
        min_step,
    };

    let mut offset_pairs = vec![BlastOffsetPair::default(); max_hits];
    let mut cursor = ScanCursor::new(subject_ranges, subject.length());
    let mut total_hits = 0usize;
    let mut hits_extended = 0usize;

    while let Some(last_offset) =
        cursor.next_scan_range(lookup.word_length, lookup.lut_word_length)
    {
        let (hits, next_start) = scan(
            subject,
            cursor.next_offset,
            last_offset,
            &mut offset_pairs,
        );
        if hits > offset_pairs.len() {
            bail!("scanning callback overflowed the batch buffer");
        }
        // a full batch may resume from the same offset, but an empty
        // return without an advance would loop forever
        if next_start < cursor.next_offset || (next_start == cursor.next_offset && hits == 0) {
            bail!("scanning callback failed to advance");
        }
        cursor.next_offset = next_start;
        if hits == 0 {
            continue;
        }
        total_hits += hits;

        let batch = &offset_pairs[..hits];
        hits_extended += match variant {
            NaExtendVariant::Direct => na_extend_direct(&ctx, batch, ewp, init_hitlist)?,
            NaExtendVariant::Arbitrary => {
                na_extend_arbitrary(&ctx, lookup, batch, ewp, init_hitlist)?
            }
            NaExtendVariant::ByteAligned => {
                na_extend_aligned(&ctx, lookup, batch, ewp, init_hitlist)?
            }
            NaExtendVariant::SmallTable => {
                na_extend_small(&ctx, lookup, batch, ewp, init_hitlist)?
            }
        };
    }

    ewp.advance_chunk(subject.length());

    if word_params.ungapped_extension {
        init_hitlist.sort_by_score();
    }

    stats.update(total_hits, hits_extended, init_hitlist.total());
    if diagnostics_enabled() {
        stats.print_summary();
    }
    Ok(())
}

/// Combined key for the redundancy hash of the indexed entry point:
/// query context in the high half, diagonal in the low half.
#[inline(always)]
fn pack_diag_key(context: usize, diag: i32) -> u64 {
    ((context as u64) << 32) | (diag as u32 as u64)
}

/// Alternate entry point for preprocessed-database searches.
///
/// Candidates arrive in bulk from an indexed source instead of a scan.
/// Each batch is first compacted in place, dropping candidates whose word
/// falls inside a previously extended region on the same (context,
/// diagonal); survivors are extended and saved against the per-context
/// cutoffs, and the hash is advanced to each new extension end.
///
/// NCBI reference: na_ungapped.c:MB_IndexedWordFinder
#[allow(clippy::too_many_arguments)]
pub fn blast_na_indexed_word_finder(
    query: &SequenceBlk,
    subject: &SequenceBlk,
    query_info: &QueryInfo,
    sbp: &BlastScoreBlk,
    word_length: i32,
    word_params: &BlastInitialWordParameters,
    source: &mut dyn IndexedSeedSource,
    max_hits: usize,
    init_hitlist: &mut BlastInitHitList,
    stats: &BlastUngappedStats,
) -> Result<()> {
    assert!(max_hits > 0, "batch buffer must hold at least one hit");
    let mut last_diag_end: FxHashMap<u64, i32> = FxHashMap::default();
    let mut batch = vec![BlastOffsetPair::default(); max_hits];
    let mut total_hits = 0usize;
    let mut hits_extended = 0usize;

    loop {
        let count = source.next_batch(&mut batch);
        if count == 0 {
            break;
        }
        if count > batch.len() {
            bail!("indexed source overflowed the batch buffer");
        }
        total_hits += count;

        // drop candidates already covered by an earlier extension
        let mut kept = 0usize;
        for i in 0..count {
            let pair = batch[i];
            let context = bsearch_context_info(pair.q_off, query_info);
            let key = pack_diag_key(context, pair.s_off - pair.q_off);
            if let Some(&end) = last_diag_end.get(&key) {
                if pair.s_off + word_length <= end {
                    continue;
                }
            }
            batch[kept] = pair;
            kept += 1;
        }
        batch.truncate(kept);

        for pair in &batch {
            let context = bsearch_context_info(pair.q_off, query_info);
            let info = &query_info.contexts[context];
            let cutoffs = word_params.cutoffs(context);
            let x = -cutoffs.x_dropoff;
            let s_match_end = pair.s_off + word_length;

            let data = match &word_params.nucl_score_table {
                Some(table) => nucl_ungapped_extend_approx(
                    query,
                    subject,
                    sbp,
                    table,
                    pair.q_off,
                    s_match_end,
                    pair.s_off,
                    x,
                    cutoffs.reduced_nucl_cutoff_score,
                    info.query_offset,
                    info.query_end(),
                ),
                None => nucl_ungapped_extend_exact(
                    query,
                    subject,
                    sbp,
                    pair.q_off,
                    pair.s_off,
                    x,
                    info.query_offset,
                    info.query_end(),
                ),
            };
            hits_extended += 1;

            let key = pack_diag_key(context, pair.s_off - pair.q_off);
            last_diag_end.insert(key, data.s_start + data.length);
            if data.score >= cutoffs.cutoff_score {
                init_hitlist.save_hit(pair.q_off, pair.s_off, Some(Box::new(data)));
            }
        }
        batch.resize(max_hits, BlastOffsetPair::default());
    }

    if word_params.ungapped_extension {
        init_hitlist.sort_by_score();
    }
    stats.update(total_hits, hits_extended, init_hitlist.total());
    if diagnostics_enabled() {
        stats.print_summary();
    }
    Ok(())
}
