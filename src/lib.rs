//! Ungapped seed-extension engine for nucleotide sequence search.
//!
//! This crate implements the nucleotide word-hit extension stage of a
//! BLASTN-style search: lookup-table word hits between a query and a subject
//! sequence are verified against the full alignment word, deduplicated and
//! chained per diagonal (with an optional two-hit requirement), scored by
//! X-drop ungapped extension, and collected into an initial hit list for a
//! downstream gapped stage.
//!
//! Lookup-table construction and scanning are external: the word finder is
//! driven through the [`core::na_ungapped::NaScanSubject`] callback, which a
//! caller implements over whatever lookup structure it owns.

pub mod core;

pub use crate::core::blast_diagnostics::BlastUngappedStats;
pub use crate::core::blast_encoding::{PackedSequence, SequenceBlk, COMPRESSION_RATIO};
pub use crate::core::blast_extend::{
    BlastInitHitList, BlastInitHsp, BlastUngappedData, DiagHash, DiagTable, ExtendWord,
};
pub use crate::core::blast_parameters::{BlastInitialWordParameters, BlastUngappedCutoffs};
pub use crate::core::blast_query_info::{bsearch_context_info, ContextInfo, QueryInfo};
pub use crate::core::blast_stat::{build_nucl_score_table, BlastScoreBlk};
pub use crate::core::na_ungapped::{
    blast_na_indexed_word_finder, blast_na_word_finder, BlastOffsetPair, IndexedSeedSource,
    NaLookupInfo, NaLookupKind, NaScanSubject, SSeqRange, ScanCursor,
};
