//! Query context bookkeeping for the concatenated multi-query buffer.
//!
//! Queries (and their strands) are laid out back to back in one buffer with
//! a single sentinel position between consecutive contexts. Every query
//! offset the extension code sees is a position in this concatenated
//! coordinate space; mapping it back to a context is a narrowed binary
//! search over the context table.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_query_info.c

/// Bounds and identity of one query context.
///
/// NCBI reference: blast_query_info.h:60-73
/// ```c
/// typedef struct BlastContextInfo {
///     Int4 query_offset;      /**< Offset of this query, strand or frame */
///     Int4 query_length;      /**< Length of this query, strand or frame */
///     ...
///     Int4 query_index;       /**< Index of query (same for all frames) */
///     Int1 frame;             /**< Frame number (-1, -2, -3, 0, 1, 2, or 3) */
///     Boolean is_valid;       /**< Determine if this context is valid */
/// } BlastContextInfo;
/// ```
#[derive(Clone, Debug)]
pub struct ContextInfo {
    /// Start of this context in the concatenated buffer.
    pub query_offset: i32,
    /// Length of this context in bases.
    pub query_length: i32,
    /// Index of the originating query (shared by both strands).
    pub query_index: i32,
    /// 0 = forward strand, 1 = reverse strand.
    pub frame: i8,
    /// False for empty or otherwise skipped contexts.
    pub is_valid: bool,
}

impl ContextInfo {
    /// Exclusive end of this context in the concatenated buffer.
    #[inline]
    pub fn query_end(&self) -> i32 {
        self.query_offset + self.query_length
    }
}

/// Context table for a set of concatenated queries.
///
/// NCBI reference: blast_query_info.h:80-91
#[derive(Clone, Debug)]
pub struct QueryInfo {
    pub first_context: i32,
    pub last_context: i32,
    pub num_queries: usize,
    pub contexts: Vec<ContextInfo>,
    /// Longest context length, used to narrow the offset search.
    pub max_length: u32,
    /// Shortest context length, used to narrow the offset search.
    pub min_length: u32,
}

impl QueryInfo {
    /// Build a context table from per-context lengths, one context per
    /// entry, strands alternating (even = forward, odd = reverse).
    ///
    /// Consecutive contexts are separated by one sentinel position, so
    /// context `i + 1` starts at `offset(i) + length(i) + 1`.
    pub fn from_lengths(lengths: &[i32]) -> Self {
        let mut contexts = Vec::with_capacity(lengths.len());
        let mut offset = 0i32;
        let mut max_length = 0u32;
        let mut min_length = u32::MAX;

        for (ctx, &len) in lengths.iter().enumerate() {
            max_length = max_length.max(len as u32);
            min_length = min_length.min(len as u32);
            contexts.push(ContextInfo {
                query_offset: offset,
                query_length: len,
                query_index: (ctx / 2) as i32,
                frame: (ctx % 2) as i8,
                is_valid: len > 0,
            });
            offset += len + 1;
        }

        let last_context = contexts.len().saturating_sub(1) as i32;
        Self {
            first_context: 0,
            last_context,
            num_queries: (lengths.len() + 1) / 2,
            contexts,
            max_length,
            min_length: if min_length == u32::MAX { 0 } else { min_length },
        }
    }

    /// Context table for one single-stranded query.
    pub fn single(length: i32) -> Self {
        let mut info = Self::from_lengths(&[length]);
        info.num_queries = 1;
        info
    }

    /// Total length of the concatenated buffer, sentinels included.
    pub fn concat_length(&self) -> i32 {
        match self.contexts.last() {
            Some(last) => last.query_end(),
            None => 0,
        }
    }
}

/// Find the context containing concatenated offset `n`.
///
/// The search interval is pre-narrowed from the extreme context lengths
/// before the binary search proper.
///
/// NCBI reference: blast_query_info.c:219-243
/// ```c
/// Int4 BSearchContextInfo(Int4 n, const BlastQueryInfo * A)
/// {
///     Int4 m=0, b=0, e=0, size=0;
///     size = A->last_context+1;
///     if (A->min_length > 0 && A->max_length > 0 && A->first_context == 0) {
///         b = MIN(n / (A->max_length + 1), size - 1);
///         e = MIN(n / (A->min_length + 1) + 1, size);
///     }
///     else {
///         b = 0;
///         e = size;
///     }
///     while (b < e - 1) {
///         m = (b + e) / 2;
///         if (A->contexts[m].query_offset > n)
///             e = m;
///         else
///             b = m;
///     }
///     return b;
/// }
/// ```
pub fn bsearch_context_info(n: i32, query_info: &QueryInfo) -> usize {
    let size = (query_info.last_context + 1) as usize;

    let (mut b, mut e) = if query_info.min_length > 0
        && query_info.max_length > 0
        && query_info.first_context == 0
    {
        let b_val = (n / (query_info.max_length as i32 + 1)).min(size as i32 - 1);
        let e_val = (n / (query_info.min_length as i32 + 1) + 1).min(size as i32);
        (b_val.max(0) as usize, e_val.max(0) as usize)
    } else {
        (0, size)
    };

    while b < e.saturating_sub(1) {
        let m = (b + e) / 2;
        if query_info.contexts[m].query_offset > n {
            e = m;
        } else {
            b = m;
        }
    }

    b
}
