//! 2-bit packed nucleotide encoding.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_encoding.c
//!            ncbi-blast/c++/src/algo/blast/core/blast_util.c
//!
//! Implements NCBI BLAST's ncbi2na format: 4 bases per byte, most
//! significant bit-pair first, so base `i` sits at bit position
//! `(3 - i % 4) * 2` of byte `i / 4`.
//!
//! # Encoding
//! - A = 0b00 (0)
//! - C = 0b01 (1)
//! - G = 0b10 (2)
//! - T/U = 0b11 (3)
//!
//! Ambiguous bases are outside this engine's contract; constructors reject
//! them rather than tracking their positions.

/// Compression ratio: 4 nucleotides per byte.
pub const COMPRESSION_RATIO: usize = 4;

/// Bit mask for one 2-bit base.
const BASE_MASK: u8 = 0x03;

/// ASCII nucleotide to 2-bit code; 0xFF marks invalid/ambiguous input.
const ENCODE_TABLE: [u8; 256] = {
    let mut table = [0xFFu8; 256];
    table[b'A' as usize] = 0;
    table[b'a' as usize] = 0;
    table[b'C' as usize] = 1;
    table[b'c' as usize] = 1;
    table[b'G' as usize] = 2;
    table[b'g' as usize] = 2;
    table[b'T' as usize] = 3;
    table[b't' as usize] = 3;
    table[b'U' as usize] = 3;
    table[b'u' as usize] = 3;
    table
};

/// 2-bit code back to ASCII.
const DECODE_TABLE: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// A 2-bit packed nucleotide sequence (4 bases per byte).
///
/// Unused low bit-pairs of a trailing partial byte are zero.
#[derive(Debug, Clone)]
pub struct PackedSequence {
    data: Vec<u8>,
    len: usize,
}

impl PackedSequence {
    /// Pack an ASCII sequence. Returns `None` if any base is not A/C/G/T/U.
    pub fn new(seq: &[u8]) -> Option<Self> {
        let mut codes = Vec::with_capacity(seq.len());
        for &base in seq {
            let code = ENCODE_TABLE[base as usize];
            if code == 0xFF {
                return None;
            }
            codes.push(code);
        }
        Some(Self::from_codes(&codes))
    }

    /// Pack a buffer of 2-bit base codes (one code per byte, values 0..=3).
    pub fn from_codes(codes: &[u8]) -> Self {
        let len = codes.len();
        let packed_len = (len + COMPRESSION_RATIO - 1) / COMPRESSION_RATIO;
        let mut data = vec![0u8; packed_len];
        for (i, &code) in codes.iter().enumerate() {
            debug_assert!(code <= 3, "not a 2-bit base code");
            // NCBI reference: ncbi-blast/c++/include/algo/blast/core/blast_util.h:51-55
            // ```c
            // #define NCBI2NA_UNPACK_BASE(x, N) (((x)>>(2*(N))) & NCBI2NA_MASK)
            // ```
            let bit_offset = 6 - 2 * (i % COMPRESSION_RATIO);
            data[i / COMPRESSION_RATIO] |= code << bit_offset;
        }
        Self { data, len }
    }

    /// Sequence length in bases.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The packed bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 2-bit base code at `pos`. Callers keep `pos` within `0..len`.
    #[inline]
    pub fn get_base(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.len, "base index out of range");
        let byte = self.data[pos / COMPRESSION_RATIO];
        let bit_offset = 6 - 2 * (pos % COMPRESSION_RATIO);
        (byte >> bit_offset) & BASE_MASK
    }

    /// ASCII base at `pos`.
    #[inline]
    pub fn get_base_ascii(&self, pos: usize) -> u8 {
        DECODE_TABLE[self.get_base(pos) as usize]
    }

    /// Extract a k-mer as a 2-bit-per-base integer, high bits first.
    ///
    /// Returns `None` if the k-mer runs past the end of the sequence.
    #[inline]
    pub fn extract_kmer(&self, pos: usize, k: usize) -> Option<u64> {
        if pos + k > self.len {
            return None;
        }
        let mut kmer: u64 = 0;
        for i in 0..k {
            kmer = (kmer << 2) | (self.get_base(pos + i) as u64);
        }
        Some(kmer)
    }

    /// Unpack back to ASCII.
    pub fn unpack(&self) -> Vec<u8> {
        (0..self.len).map(|i| self.get_base_ascii(i)).collect()
    }
}

/// One search sequence: the unpacked 2-bit code buffer plus a packed copy.
///
/// Queries are concatenated multi-context buffers (one sentinel position
/// between contexts, see `blast_query_info`); subjects are single chunks.
/// The extension code reads subjects through the packed form and queries
/// through the code buffer, except for the small-word extender which uses
/// the packed copy of both.
///
/// NCBI reference: ncbi-blast/c++/include/algo/blast/core/blast_def.h
/// ```c
/// typedef struct BLAST_SequenceBlk {
///    Uint1* sequence;         /**< Sequence used for search */
///    ...
///    Uint1* compressed_nuc_seq; /**< 4-to-1 compressed version of sequence */
/// } BLAST_SequenceBlk;
/// ```
#[derive(Debug, Clone)]
pub struct SequenceBlk {
    sequence: Vec<u8>,
    compressed: PackedSequence,
    length: i32,
}

impl SequenceBlk {
    /// Build from an ASCII sequence. Returns `None` on ambiguous input.
    pub fn from_ascii(seq: &[u8]) -> Option<Self> {
        let mut codes = Vec::with_capacity(seq.len());
        for &base in seq {
            let code = ENCODE_TABLE[base as usize];
            if code == 0xFF {
                return None;
            }
            codes.push(code);
        }
        Some(Self::from_codes(codes))
    }

    /// Build from a buffer of 2-bit base codes (sentinel positions between
    /// query contexts may hold any code; extension never reads them).
    pub fn from_codes(codes: Vec<u8>) -> Self {
        let compressed = PackedSequence::from_codes(&codes);
        let length = codes.len() as i32;
        Self {
            sequence: codes,
            compressed,
            length,
        }
    }

    /// Length in bases.
    #[inline]
    pub fn length(&self) -> i32 {
        self.length
    }

    /// Unpacked 2-bit code buffer, one base per byte.
    #[inline]
    pub fn codes(&self) -> &[u8] {
        &self.sequence
    }

    /// Packed 4-bases-per-byte copy.
    #[inline]
    pub fn compressed(&self) -> &PackedSequence {
        &self.compressed
    }
}

/// Encode a single ASCII nucleotide to its 2-bit code.
#[inline]
pub fn encode_base(base: u8) -> Option<u8> {
    let code = ENCODE_TABLE[base as usize];
    if code == 0xFF {
        None
    } else {
        Some(code)
    }
}

/// Decode a 2-bit code to ASCII.
#[inline]
pub fn decode_base(code: u8) -> u8 {
    DECODE_TABLE[(code & BASE_MASK) as usize]
}
