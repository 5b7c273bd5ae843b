//! Diagonal linking behavior driven through the word finder: two-hit
//! window gating and repeated-hit idempotence.

use std::sync::atomic::Ordering as AtomicOrdering;

use naseed::{
    blast_na_word_finder, BlastInitHitList, BlastInitialWordParameters, BlastOffsetPair,
    BlastScoreBlk, BlastUngappedStats, DiagHash, DiagTable, ExtendWord, NaLookupInfo,
    NaLookupKind, QueryInfo, SequenceBlk,
};

use crate::helpers::seq;

/// A 60-base sequence with no long self-repeats; hits are injected by a
/// fixed scan script, so only extension reads it.
const SEQ60: &[u8] = b"ACGGTCATGCAATTCGGATCCGTAGCATTGCAAGTCCGGATAACGTTGCCATGGATCGTA";

fn direct_lookup(word_length: i32) -> NaLookupInfo {
    NaLookupInfo {
        kind: NaLookupKind::Standard,
        word_length,
        lut_word_length: word_length,
        scan_step: 1,
        masked_locations: Vec::new(),
    }
}

/// Run the finder with a scripted hit sequence delivered in one batch.
fn run_scripted(
    query: &SequenceBlk,
    subject: &SequenceBlk,
    query_info: &QueryInfo,
    params: &BlastInitialWordParameters,
    lookup: &NaLookupInfo,
    hits: &[BlastOffsetPair],
    ewp: &mut ExtendWord,
) -> (BlastInitHitList, BlastUngappedStats) {
    let sbp = BlastScoreBlk::new(1, -3);
    let mut delivered = false;
    let mut scan =
        |_subject: &SequenceBlk, _start: i32, last: i32, out: &mut [BlastOffsetPair]| {
            if delivered {
                return (0, last + 1);
            }
            delivered = true;
            out[..hits.len()].copy_from_slice(hits);
            (hits.len(), last + 1)
        };
    let mut hitlist = BlastInitHitList::new();
    let stats = BlastUngappedStats::new();
    blast_na_word_finder(
        query,
        subject,
        query_info,
        &sbp,
        lookup,
        params,
        &mut scan,
        &[],
        64,
        ewp,
        &mut hitlist,
        &stats,
    )
    .expect("word finder failed");
    (hitlist, stats)
}

fn two_hit_params(query_info: &QueryInfo, window_size: i32) -> BlastInitialWordParameters {
    let sbp = BlastScoreBlk::new(1, -3);
    BlastInitialWordParameters::new(query_info.contexts.len(), window_size, 10, 20, 15, &sbp)
}

// p0 too close to link with p1, p1 -> p2 inside the window: exactly one
// promoted hit, anchored at the linking pair.
#[test]
fn test_two_hit_window_gating_diag_table() {
    let query = seq(SEQ60);
    let subject = seq(SEQ60);
    let query_info = QueryInfo::single(query.length());
    let params = two_hit_params(&query_info, 40);
    let lookup = direct_lookup(11);
    let hits = [
        BlastOffsetPair { q_off: 0, s_off: 0 },
        BlastOffsetPair { q_off: 8, s_off: 8 },
        BlastOffsetPair { q_off: 28, s_off: 28 },
    ];

    let mut ewp = ExtendWord::DiagTable(DiagTable::new(
        query_info.concat_length(),
        subject.length(),
        40,
    ));
    let (hitlist, stats) =
        run_scripted(&query, &subject, &query_info, &params, &lookup, &hits, &mut ewp);

    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 1);
    assert_eq!(hitlist.total(), 1);
    let hsp = &hitlist.hsps()[0];
    assert_eq!((hsp.q_off, hsp.s_off), (28, 28));
    let data = hsp.ungapped_data.as_ref().unwrap();
    assert_eq!(data.q_start, 0);
    assert_eq!(data.length, 60);
    assert_eq!(data.score, 60);
}

#[test]
fn test_two_hit_window_gating_diag_hash() {
    let query = seq(SEQ60);
    let subject = seq(SEQ60);
    let query_info = QueryInfo::single(query.length());
    let params = two_hit_params(&query_info, 40);
    let lookup = direct_lookup(11);
    let hits = [
        BlastOffsetPair { q_off: 0, s_off: 0 },
        BlastOffsetPair { q_off: 8, s_off: 8 },
        BlastOffsetPair { q_off: 28, s_off: 28 },
    ];

    let mut ewp = ExtendWord::DiagHash(DiagHash::new(40));
    let (hitlist, stats) =
        run_scripted(&query, &subject, &query_info, &params, &lookup, &hits, &mut ewp);

    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 1);
    assert_eq!(hitlist.total(), 1);
    assert_eq!(hitlist.hsps()[0].s_off, 28);
}

// a second hit exactly window_size past the first replaces it instead of
// linking; nothing is promoted
#[test]
fn test_second_hit_at_window_boundary_not_linked() {
    let query = seq(SEQ60);
    let subject = seq(SEQ60);
    let query_info = QueryInfo::single(query.length());
    let params = two_hit_params(&query_info, 40);
    let lookup = direct_lookup(11);
    let hits = [
        BlastOffsetPair { q_off: 0, s_off: 0 },
        BlastOffsetPair { q_off: 8, s_off: 8 },
        BlastOffsetPair { q_off: 48, s_off: 48 },
    ];

    let mut ewp = ExtendWord::DiagHash(DiagHash::new(40));
    let (hitlist, stats) =
        run_scripted(&query, &subject, &query_info, &params, &lookup, &hits, &mut ewp);

    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
}

// feeding the same offset pair twice must not extend either time nor
// grow the hash
#[test]
fn test_repeated_hit_idempotent_diag_hash() {
    let query = seq(SEQ60);
    let subject = seq(SEQ60);
    let query_info = QueryInfo::single(query.length());
    let params = two_hit_params(&query_info, 40);
    let lookup = direct_lookup(11);
    let pair = BlastOffsetPair { q_off: 5, s_off: 9 };
    let hits = [pair, pair];

    let mut ewp = ExtendWord::DiagHash(DiagHash::new(40));
    let (hitlist, stats) =
        run_scripted(&query, &subject, &query_info, &params, &lookup, &hits, &mut ewp);

    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
    match &ewp {
        ExtendWord::DiagHash(hash) => assert_eq!(hash.occupancy(), 1),
        ExtendWord::DiagTable(_) => unreachable!(),
    }
}

#[test]
fn test_repeated_hit_idempotent_diag_table() {
    let query = seq(SEQ60);
    let subject = seq(SEQ60);
    let query_info = QueryInfo::single(query.length());
    let params = two_hit_params(&query_info, 40);
    let lookup = direct_lookup(11);
    let pair = BlastOffsetPair { q_off: 5, s_off: 9 };
    let hits = [pair, pair];

    let mut ewp = ExtendWord::DiagTable(DiagTable::new(
        query_info.concat_length(),
        subject.length(),
        40,
    ));
    let (hitlist, stats) =
        run_scripted(&query, &subject, &query_info, &params, &lookup, &hits, &mut ewp);

    assert_eq!(stats.init_extends.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(hitlist.total(), 0);
}
