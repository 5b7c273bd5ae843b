//! Exact-match verification variants: arbitrary-offset, byte-aligned and
//! small-table, including the masked-window screen.

use std::sync::atomic::Ordering as AtomicOrdering;

use naseed::{
    BlastInitialWordParameters, BlastScoreBlk, DiagTable, ExtendWord, NaLookupInfo, NaLookupKind,
    QueryInfo, SSeqRange,
};

use crate::helpers::{run_finder, seq};

fn table_ewp(query_info: &QueryInfo, subject_length: i32, window: i32) -> ExtendWord {
    ExtendWord::DiagTable(DiagTable::new(
        query_info.concat_length(),
        subject_length,
        window,
    ))
}

fn lookup(kind: NaLookupKind, word_length: i32, lut_word_length: i32, scan_step: i32) -> NaLookupInfo {
    NaLookupInfo {
        kind,
        word_length,
        lut_word_length,
        scan_step,
        masked_locations: Vec::new(),
    }
}

const W16: &[u8] = b"ACGGTTCACAGTCGAT";

#[test]
fn test_arbitrary_extend_confirms_planted_word() {
    // 16-base window shared by query and subject, verified from an
    // 11-base lookup word one base at a time
    let query = seq(&[W16, b"TTTTTTTTTTTTTTTTTTTT"].concat());
    let subject = seq(&[b"CCCCCCCCCC", W16, b"GGGGGGGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 14, 10, &sbp);
    let lk = lookup(NaLookupKind::Standard, 16, 11, 1);

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert_eq!(hitlist.total(), 1);
    let hsp = &hitlist.hsps()[0];
    assert_eq!((hsp.q_off, hsp.s_off), (0, 10));
    let data = hsp.ungapped_data.as_ref().unwrap();
    assert_eq!(data.q_start, 0);
    assert_eq!(data.s_start, 10);
    assert_eq!(data.length, 16);
    assert_eq!(data.score, 16);
    assert!(stats.init_extends.load(AtomicOrdering::Relaxed) >= 1);
}

#[test]
fn test_arbitrary_extend_drops_on_inner_mismatch() {
    // one substitution inside the region the verification must cover
    // leaves every lookup hit short of the full alignment word
    let mut damaged = W16.to_vec();
    assert_eq!(damaged[2], b'G');
    damaged[2] = b'T';
    let query = seq(&[W16, b"TTTTTTTTTTTTTTTTTTTT"].concat());
    let subject = seq(&[b"CCCCCCCCCC", &damaged[..], b"GGGGGGGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 14, 10, &sbp);
    let lk = lookup(NaLookupKind::Standard, 16, 11, 1);

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert!(stats.lookup_hits.load(AtomicOrdering::Relaxed) > 0);
    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
}

const W12: &[u8] = b"ACGGTCATGCAA";

#[test]
fn test_byte_aligned_extend_partial_byte_left() {
    // lookup word and scan step both multiples of 4; the left extension
    // walks packed subject bytes and stops mid-byte on the mismatch
    let query = seq(&[b"TTTT", W12, b"AAAAAAAA"].concat());
    let subject = seq(&[b"CCCCGGTT", W12, b"GGGGGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 10, 8, &sbp);
    let lk = lookup(NaLookupKind::Standard, 12, 8, 4);

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, _stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    // word at (4, 8) verifies with 2 bases confirmed left, 2 right;
    // the X-drop extension then picks up the 2 extra matching Ts
    assert_eq!(hitlist.total(), 1);
    let hsp = &hitlist.hsps()[0];
    assert_eq!((hsp.q_off, hsp.s_off), (2, 6));
    let data = hsp.ungapped_data.as_ref().unwrap();
    assert_eq!(data.q_start, 2);
    assert_eq!(data.s_start, 6);
    assert_eq!(data.length, 14);
    assert_eq!(data.score, 14);
}

#[test]
fn test_byte_aligned_extend_drops_on_inner_mismatch() {
    let mut damaged = W12.to_vec();
    assert_eq!(damaged[9], b'C');
    damaged[9] = b'T';
    let query = seq(&[W12, b"TTTTTTTT"].concat());
    let subject = seq(&[b"CCCCCCCC", &damaged[..], b"GGGGGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 10, 8, &sbp);
    let lk = lookup(NaLookupKind::Standard, 12, 8, 4);

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert!(stats.lookup_hits.load(AtomicOrdering::Relaxed) > 0);
    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
}

const W11: &[u8] = b"ACGGTCATGCA";

#[test]
fn test_small_table_extend_confirms_planted_word() {
    let query = seq(&[W11, b"TTTTT"].concat());
    let subject = seq(&[b"CCCCC", W11, b"GGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 10, 8, &sbp);
    let lk = lookup(NaLookupKind::Small, 11, 8, 1);

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, _stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert_eq!(hitlist.total(), 1);
    let data = hitlist.hsps()[0].ungapped_data.as_ref().unwrap();
    assert_eq!(data.q_start, 0);
    assert_eq!(data.s_start, 5);
    assert_eq!(data.length, 11);
    assert_eq!(data.score, 11);
}

#[test]
fn test_small_table_extend_drops_on_inner_mismatch() {
    let mut damaged = W11.to_vec();
    assert_eq!(damaged[9], b'C');
    damaged[9] = b'G';
    let query = seq(&[W11, b"TTTTT"].concat());
    let subject = seq(&[b"CCCCC", &damaged[..], b"GGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 10, 8, &sbp);
    let lk = lookup(NaLookupKind::Small, 11, 8, 1);

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert!(stats.lookup_hits.load(AtomicOrdering::Relaxed) > 0);
    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
}

#[test]
fn test_small_table_masked_window_dropped() {
    // an exact word whose confirmed window falls strictly inside a
    // soft-masked query interval never reaches extension
    let query = seq(&[W11, b"TTTTT"].concat());
    let subject = seq(&[b"CCCCC", W11, b"GGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 10, 8, &sbp);
    let mut lk = lookup(NaLookupKind::Small, 11, 8, 1);
    lk.masked_locations = vec![SSeqRange { left: -1, right: 12 }];

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert!(stats.lookup_hits.load(AtomicOrdering::Relaxed) > 0);
    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
}

#[test]
fn test_small_table_masked_boundary_is_open() {
    // a window touching the interval boundary is not considered inside;
    // the boundary test is strict on both ends
    let query = seq(&[W11, b"TTTTT"].concat());
    let subject = seq(&[b"CCCCC", W11, b"GGGGG"].concat());
    let query_info = QueryInfo::single(query.length());
    let sbp = BlastScoreBlk::new(1, -3);
    let params =
        BlastInitialWordParameters::new(query_info.contexts.len(), 0, 10, 10, 8, &sbp);
    let mut lk = lookup(NaLookupKind::Small, 11, 8, 1);
    lk.masked_locations = vec![SSeqRange { left: 0, right: 11 }];

    let mut ewp = table_ewp(&query_info, subject.length(), 0);
    let (hitlist, _stats) =
        run_finder(&query, &subject, &query_info, &sbp, &lk, &params, &[], &mut ewp);

    assert_eq!(hitlist.total(), 1);
}
