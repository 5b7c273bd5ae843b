//! Core extension algorithms.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/
//!
//! The module layout matches the NCBI BLAST core/ translation units this
//! engine reimplements:
//!
//! - **Encoding** (`blast_encoding`)
//!   - 2-bit packed nucleotide representation (ncbi2na), 4 bases per byte
//!   - Sequence blocks holding both packed and unpacked forms
//!
//! - **Query layout** (`blast_query_info`)
//!   - Concatenated multi-context query bookkeeping
//!   - Offset-to-context binary search (BSearchContextInfo)
//!
//! - **Scoring** (`blast_stat`, `blast_parameters`)
//!   - Match/mismatch substitution matrix
//!   - Per-context cutoffs and the packed 4-base score table
//!
//! - **Extension infrastructure** (`blast_extend`)
//!   - Diagonal tracking (array and hash variants)
//!   - Initial hit list sink
//!
//! - **Word-hit extension** (`na_ungapped`)
//!   - Exact-match word verification, X-drop ungapped extension,
//!     two-hit linking, word-finder drivers
//!
//! - **Diagnostics** (`blast_diagnostics`)
//!   - Per-pass hit counters

pub mod blast_encoding;
pub mod blast_query_info;

pub mod blast_stat;
pub mod blast_parameters;

pub mod blast_extend;
pub mod na_ungapped;

pub mod blast_diagnostics;
