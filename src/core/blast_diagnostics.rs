//! Diagnostic counters for the ungapped word-finding stage.
//!
//! Counters are updated once per scan pass and can be dumped to stderr;
//! the dump is gated by the NASEED_DIAGNOSTICS environment variable so
//! normal runs stay silent.
//!
//! Reference: ncbi-blast/c++/include/algo/blast/core/blast_diagnostics.h

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Check if diagnostics output is enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    std::env::var("NASEED_DIAGNOSTICS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Hit counts for one or more scan passes.
///
/// NCBI reference: blast_diagnostics.h:47-56
/// ```c
/// typedef struct BlastUngappedStats {
///    Int8 lookup_hits; /**< Number of successful lookup table hits */
///    Int4 num_seqs_lookup_hits; /**< Number of sequences which had at least one
///                                  lookup table hit. */
///    Int4 init_extends; /**< Number of initial words found and extended */
///    Int4 good_init_extends; /**< Number of successful initial extensions */
///    ...
/// } BlastUngappedStats;
/// ```
#[derive(Default)]
pub struct BlastUngappedStats {
    /// Raw offset pairs delivered by the scanning callback.
    pub lookup_hits: AtomicUsize,
    /// Hits that survived exact-match verification and diagonal linking.
    pub init_extends: AtomicUsize,
    /// Hits that passed the cutoff and reached the hit list.
    pub good_init_extends: AtomicUsize,
}

impl BlastUngappedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one scan pass into the totals.
    pub fn update(&self, lookup_hits: usize, init_extends: usize, good_init_extends: usize) {
        self.lookup_hits
            .fetch_add(lookup_hits, AtomicOrdering::Relaxed);
        self.init_extends
            .fetch_add(init_extends, AtomicOrdering::Relaxed);
        self.good_init_extends
            .fetch_add(good_init_extends, AtomicOrdering::Relaxed);
    }

    /// Print a summary of the counters to stderr.
    pub fn print_summary(&self) {
        eprintln!("\n=== Ungapped Word-Finder Diagnostics ===");
        eprintln!(
            "  Lookup hits scanned:        {}",
            self.lookup_hits.load(AtomicOrdering::Relaxed)
        );
        eprintln!(
            "  Words extended:             {}",
            self.init_extends.load(AtomicOrdering::Relaxed)
        );
        eprintln!(
            "  Extensions above cutoff:    {}",
            self.good_init_extends.load(AtomicOrdering::Relaxed)
        );
        eprintln!("========================================\n");
    }
}
