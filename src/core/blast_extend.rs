//! Diagonal tracking containers and the initial hit list.
//!
//! Two interchangeable structures record, per diagonal, how far down the
//! subject the last hit (or extension) on that diagonal reached and whether
//! it was already saved. The array variant masks the diagonal into a fixed
//! power-of-two table and accepts aliasing between distinct diagonals; the
//! hash variant keys chained buckets by the true diagonal and resolves
//! aliasing exactly.
//!
//! Positions stored in either container carry a running `offset` bias that
//! advances between subject chunks, so the containers are logically reset
//! without touching their cells.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_extend.c
//!            ncbi-blast/c++/include/algo/blast/core/blast_extend.h

use std::collections::TryReserveError;

/// Bucket count of the diagonal hash backbone.
const DIAG_HASH_NUM_BUCKETS: u32 = 512;

/// Initial chain capacity of the diagonal hash.
const DIAG_HASH_CHAIN_LENGTH: usize = 256;

/// Knuth multiplicative hash constant for bucket selection.
const DIAG_HASH_FCN: u32 = 0x9E37_79B1;

/// Biased positions are rebased physically once the offset passes this.
const DIAG_OFFSET_LIMIT: i32 = i32::MAX / 4;

/// One tracked diagonal.
///
/// NCBI reference: blast_extend.h:57-60
/// ```c
/// typedef struct DiagStruct {
///    signed int last_hit   : 31; /**< Offset of the last hit */
///    unsigned int flag      : 1; /**< Reset the next extension? */
/// } DiagStruct;
/// ```
#[derive(Clone, Copy, Default, Debug)]
pub struct DiagStruct {
    /// End position of the last hit on this diagonal, offset-biased.
    pub last_hit: i32,
    /// True once an extension on this diagonal was saved to the hit list.
    pub flag: bool,
}

/// Array-backed diagonal table.
///
/// Diagonals are masked into a power-of-two array; two true diagonals that
/// collide under the mask share a cell. That aliasing is accepted, matching
/// the reference structure, which likewise resolves nothing here.
///
/// NCBI reference: blast_extend.h:63-74 (BLAST_DiagTable),
/// blast_extend.c:BlastDiagTableNew
#[derive(Debug)]
pub struct DiagTable {
    hit_level_array: Vec<DiagStruct>,
    diag_array_length: i32,
    diag_mask: i32,
    offset: i32,
    window: i32,
}

impl DiagTable {
    /// Size the table as the smallest power of two covering a sliding
    /// window of `query_length + subject_length` diagonals.
    pub fn new(query_length: i32, subject_length: i32, window: i32) -> Self {
        assert!(query_length > 0, "query_length must be positive");
        assert!(subject_length >= 0, "subject_length must be non-negative");
        let span = query_length + subject_length;
        let mut diag_array_length = 1i32;
        while diag_array_length < span {
            diag_array_length <<= 1;
        }
        Self {
            hit_level_array: vec![DiagStruct::default(); diag_array_length as usize],
            diag_array_length,
            diag_mask: diag_array_length - 1,
            offset: window,
            window,
        }
    }

    /// Masked array index for an offset pair.
    ///
    /// NCBI reference: na_ungapped.c:560-563
    /// ```c
    /// diag = s_off + diag_table->diag_array_length - q_off;
    /// real_diag = diag & diag_table->diag_mask;
    /// ```
    #[inline(always)]
    pub fn diag_coord(&self, q_off: i32, s_off: i32) -> usize {
        ((s_off + self.diag_array_length - q_off) & self.diag_mask) as usize
    }

    /// Current position bias for this subject chunk.
    #[inline(always)]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    #[inline(always)]
    pub fn cell(&self, coord: usize) -> DiagStruct {
        self.hit_level_array[coord]
    }

    #[inline(always)]
    pub fn set_cell(&mut self, coord: usize, last_hit: i32, flag: bool) {
        self.hit_level_array[coord] = DiagStruct { last_hit, flag };
    }

    /// Logically reset the table for the next subject chunk by advancing
    /// the bias; cells are only rewritten once the bias nears overflow.
    ///
    /// NCBI reference: blast_extend.c:Blast_DiagTableUpdate
    pub fn advance_chunk(&mut self, subject_length: i32) {
        self.offset += subject_length + self.window;
        if self.offset >= DIAG_OFFSET_LIMIT {
            for cell in &mut self.hit_level_array {
                *cell = DiagStruct::default();
            }
            self.offset = self.window;
        }
    }

    /// Number of addressable cells.
    pub fn len(&self) -> usize {
        self.hit_level_array.len()
    }
}

/// One chained cell of the diagonal hash.
///
/// NCBI reference: blast_extend.h:87-93
/// ```c
/// typedef struct DiagHashCell {
///    Int4 diag;
///    signed int level : 31;
///    unsigned int hit_saved : 1;
///    Uint4 next;
/// } DiagHashCell;
/// ```
#[derive(Clone, Copy, Default, Debug)]
struct DiagHashCell {
    diag: i32,
    level: i32,
    hit_saved: bool,
    next: u32,
}

/// Chained-bucket diagonal hash.
///
/// A fixed backbone of bucket heads indexes into a growable cell arena.
/// Head value 0 means an empty bucket; arena index 0 is a reserved
/// sentinel, so live cells start at index 1.
///
/// NCBI reference: blast_extend.h:96-106 (BLAST_DiagHash),
/// blast_extend.c:s_BlastDiagHashInsert / s_BlastDiagHashRetrieve
#[derive(Debug)]
pub struct DiagHash {
    backbone: Vec<u32>,
    chain: Vec<DiagHashCell>,
    occupancy: u32,
    offset: i32,
    window: i32,
}

impl DiagHash {
    pub fn new(window: i32) -> Self {
        let mut chain = Vec::new();
        chain.resize(DIAG_HASH_CHAIN_LENGTH, DiagHashCell::default());
        Self {
            backbone: vec![0u32; DIAG_HASH_NUM_BUCKETS as usize],
            chain,
            occupancy: 1,
            offset: window,
            window,
        }
    }

    #[inline(always)]
    fn bucket(diag: i32) -> usize {
        ((diag as u32).wrapping_mul(DIAG_HASH_FCN) % DIAG_HASH_NUM_BUCKETS) as usize
    }

    /// Current position bias for this subject chunk.
    #[inline(always)]
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Live cell count, sentinel excluded.
    pub fn occupancy(&self) -> usize {
        (self.occupancy - 1) as usize
    }

    /// Look up a diagonal; returns its biased level and saved flag.
    pub fn retrieve(&self, diag: i32) -> Option<(i32, bool)> {
        let mut index = self.backbone[Self::bucket(diag)];
        while index != 0 {
            let cell = &self.chain[index as usize];
            if cell.diag == diag {
                return Some((cell.level, cell.hit_saved));
            }
            index = cell.next;
        }
        None
    }

    /// Record `level`/`hit_saved` for a diagonal.
    ///
    /// Walks the bucket chain for the diagonal; failing that, reuses the
    /// first stale cell, one whose recorded level trails `s_end` by more
    /// than `stale_step`. Only when neither exists is a fresh cell taken
    /// from the arena, doubling its capacity if exhausted. Growth failure
    /// leaves all prior state untouched.
    pub fn insert(
        &mut self,
        diag: i32,
        level: i32,
        hit_saved: bool,
        s_end: i32,
        stale_step: i32,
    ) -> Result<(), TryReserveError> {
        let bucket = Self::bucket(diag);
        let mut index = self.backbone[bucket];

        while index != 0 {
            let cell = &self.chain[index as usize];
            if cell.diag == diag {
                break;
            }
            let step = s_end - cell.level;
            if step > stale_step {
                break;
            }
            index = cell.next;
        }

        if index == 0 {
            if self.occupancy as usize == self.chain.len() {
                let grow = self.chain.len();
                self.chain.try_reserve(grow)?;
                self.chain.resize(grow * 2, DiagHashCell::default());
            }
            index = self.occupancy;
            self.occupancy += 1;
            self.chain[index as usize].next = self.backbone[bucket];
            self.backbone[bucket] = index;
        }

        let cell = &mut self.chain[index as usize];
        cell.diag = diag;
        cell.level = level;
        cell.hit_saved = hit_saved;
        Ok(())
    }

    /// Logically reset for the next subject chunk; a physical rebuild only
    /// happens once the bias nears overflow.
    pub fn advance_chunk(&mut self, subject_length: i32) {
        self.offset += subject_length + self.window;
        if self.offset >= DIAG_OFFSET_LIMIT {
            self.backbone.iter_mut().for_each(|head| *head = 0);
            self.occupancy = 1;
            self.offset = self.window;
        }
    }
}

/// Container selection for diagonal tracking, fixed per search.
///
/// NCBI reference: blast_extend.h:109-114 (Blast_ExtendWord)
#[derive(Debug)]
pub enum ExtendWord {
    DiagTable(DiagTable),
    DiagHash(DiagHash),
}

impl ExtendWord {
    /// Position bias shared by all stored levels in the active container.
    #[inline]
    pub fn offset(&self) -> i32 {
        match self {
            ExtendWord::DiagTable(table) => table.offset(),
            ExtendWord::DiagHash(hash) => hash.offset(),
        }
    }

    /// End-of-chunk bookkeeping for either container.
    pub fn advance_chunk(&mut self, subject_length: i32) {
        match self {
            ExtendWord::DiagTable(table) => table.advance_chunk(subject_length),
            ExtendWord::DiagHash(hash) => hash.advance_chunk(subject_length),
        }
    }
}

/// Coordinates and score of one ungapped extension.
///
/// NCBI reference: blast_extend.h:42-48
/// ```c
/// typedef struct BlastUngappedData {
///    Int4 q_start; /**< Start of the ungapped extension in query */
///    Int4 s_start; /**< Start of the ungapped extension in subject */
///    Int4 length;  /**< Length of the ungapped extension */
///    Int4 score;   /**< Score of the ungapped extension */
/// } BlastUngappedData;
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlastUngappedData {
    pub q_start: i32,
    pub s_start: i32,
    pub length: i32,
    pub score: i32,
}

/// One saved initial hit; extension data is absent when scoring is off.
#[derive(Clone, Debug)]
pub struct BlastInitHsp {
    pub q_off: i32,
    pub s_off: i32,
    pub ungapped_data: Option<Box<BlastUngappedData>>,
}

/// Append-only sink of initial hits, sorted by score after a scan pass.
///
/// NCBI reference: blast_extend.c:BLAST_InitHitListNew / BlastSaveInitHsp /
/// Blast_InitHitListSortByScore
#[derive(Debug, Default)]
pub struct BlastInitHitList {
    hsps: Vec<BlastInitHsp>,
}

impl BlastInitHitList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one hit; takes ownership of the extension data.
    pub fn save_hit(
        &mut self,
        q_off: i32,
        s_off: i32,
        ungapped_data: Option<Box<BlastUngappedData>>,
    ) {
        self.hsps.push(BlastInitHsp {
            q_off,
            s_off,
            ungapped_data,
        });
    }

    /// Stable sort descending by score. Hits without extension data sort
    /// as score 0.
    pub fn sort_by_score(&mut self) {
        self.hsps.sort_by_key(|hsp| {
            std::cmp::Reverse(hsp.ungapped_data.as_ref().map_or(0, |data| data.score))
        });
    }

    pub fn total(&self) -> usize {
        self.hsps.len()
    }

    pub fn hsps(&self) -> &[BlastInitHsp] {
        &self.hsps
    }
}
