//! Encoding and decoding whole byte buffers
//!
//! Buffers are sequences of little-endian words of `word_size` bytes. Word
//! `w` of every fragment lives at byte offset `w * word_size`, which is also
//! the offset recorded in the side channel. Buffers are cut into chunks of
//! words that are processed in parallel, each with its own scratch space and
//! its own decode context, built once and reused for every word of the chunk.

use super::{FecCode, FecType, Properties};
use crate::arith::Element;
use crate::config::ParallelConfig;
use crate::error::{FecError, FecResult};
use log::debug;
use rayon::prelude::*;

/// Words per parallel work item
const CHUNK_WORDS: usize = 4096;

/// Fragments produced by [`encode_blocks`], indexed by fragment id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlocks {
    pub fragments: Vec<Vec<u8>>,
    /// One entry per fragment
    pub props: Vec<Properties>,
}

#[inline]
fn read_word<T: Element>(bytes: &[u8]) -> T {
    bytes
        .iter()
        .rev()
        .fold(T::ZERO, |acc, &b| (acc << 8) | T::from_u64(b as u64))
}

#[inline]
fn write_word<T: Element>(value: T, out: &mut [u8]) {
    for (i, b) in out.iter_mut().enumerate() {
        *b = (value >> (8 * i as u32)).as_u64() as u8;
    }
}

/// Length shared by every buffer, which must be a whole number of words
fn common_len<'a>(
    mut buffers: impl Iterator<Item = &'a [u8]>,
    word_size: usize,
) -> FecResult<usize> {
    let first = buffers
        .next()
        .map(<[u8]>::len)
        .ok_or_else(|| FecError::invalid("no buffers"))?;
    if buffers.any(|b| b.len() != first) {
        return Err(FecError::invalid("buffers differ in length"));
    }
    if first % word_size != 0 {
        return Err(FecError::invalid(format!(
            "buffer length {} is not a multiple of the {}-byte word size",
            first, word_size
        )));
    }
    Ok(first)
}

/// Run `work` over `0..n_chunks`, on a thread pool unless configured sequential
fn run_chunks<R, W>(config: &ParallelConfig, n_chunks: usize, work: W) -> FecResult<Vec<R>>
where
    R: Send,
    W: Fn(usize) -> FecResult<R> + Sync + Send,
{
    let threads = config.effective_threads();
    if threads <= 1 || n_chunks <= 1 {
        return (0..n_chunks).map(work).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| FecError::invalid(format!("cannot build thread pool: {}", e)))?;
    pool.install(|| (0..n_chunks).into_par_iter().map(&work).collect())
}

/// Output bytes and side channel of one chunk, per output fragment
struct Chunk {
    outputs: Vec<Vec<u8>>,
    props: Vec<Properties>,
}

/// Encode `n_data` equally sized data blocks
///
/// Systematic codecs return the data blocks followed by the parities;
/// non-systematic codecs return every transformed fragment.
pub fn encode_blocks<C, B>(
    codec: &C,
    data_blocks: &[B],
    config: &ParallelConfig,
) -> FecResult<EncodedBlocks>
where
    C: FecCode,
    B: AsRef<[u8]> + Sync,
{
    let n_data = codec.n_data();
    if data_blocks.len() != n_data {
        return Err(FecError::invalid(format!(
            "expected {} data blocks, got {}",
            n_data,
            data_blocks.len()
        )));
    }
    let ws = codec.word_size();
    let len = common_len(data_blocks.iter().map(|b| b.as_ref()), ws)?;
    let n_words = len / ws;
    let n_outputs = codec.get_n_outputs();
    let n_chunks = n_words.div_ceil(CHUNK_WORDS);
    debug!(
        "{}: encoding {} words in {} chunks",
        codec.name(),
        n_words,
        n_chunks
    );

    let chunks = run_chunks(config, n_chunks, |c| {
        let start = c * CHUNK_WORDS;
        let end = (start + CHUNK_WORDS).min(n_words);
        let mut chunk = Chunk {
            outputs: vec![Vec::with_capacity((end - start) * ws); n_outputs],
            props: vec![Properties::new(); n_outputs],
        };
        let mut words = vec![C::Elem::ZERO; n_data];
        let mut output = vec![C::Elem::ZERO; n_outputs];
        let mut bytes = vec![0u8; ws];

        for w in start..end {
            let at = w * ws;
            for (word, block) in words.iter_mut().zip(data_blocks) {
                *word = read_word(&block.as_ref()[at..at + ws]);
            }
            codec.encode(&mut output, &mut chunk.props, at as u64, &words)?;
            for (value, out) in output.iter().zip(chunk.outputs.iter_mut()) {
                write_word(*value, &mut bytes);
                out.extend_from_slice(&bytes);
            }
        }
        Ok(chunk)
    })?;

    let mut outputs = vec![Vec::with_capacity(len); n_outputs];
    let mut output_props = vec![Properties::new(); n_outputs];
    for chunk in chunks {
        for (dest, part) in outputs.iter_mut().zip(chunk.outputs) {
            dest.extend_from_slice(&part);
        }
        for (dest, part) in output_props.iter_mut().zip(chunk.props) {
            dest.merge(part);
        }
    }

    Ok(match codec.fec_type() {
        FecType::Systematic => {
            let mut fragments: Vec<Vec<u8>> =
                data_blocks.iter().map(|b| b.as_ref().to_vec()).collect();
            fragments.extend(outputs);
            let mut props = vec![Properties::new(); n_data];
            props.extend(output_props);
            EncodedBlocks { fragments, props }
        }
        FecType::NonSystematic => EncodedBlocks {
            fragments: outputs,
            props: output_props,
        },
    })
}

/// Rebuild the `n_data` data blocks from the surviving fragments
///
/// `fragments[id]` is `None` for a lost fragment. `props` is the side
/// channel returned by [`encode_blocks`].
pub fn decode_blocks<C: FecCode>(
    codec: &mut C,
    fragments: &[Option<&[u8]>],
    props: &[Properties],
    config: &ParallelConfig,
) -> FecResult<Vec<Vec<u8>>> {
    let n_data = codec.n_data();
    if fragments.len() != codec.code_len() {
        return Err(FecError::invalid(format!(
            "expected {} fragment slots, got {}",
            codec.code_len(),
            fragments.len()
        )));
    }

    let available: Vec<usize> = (0..fragments.len())
        .filter(|&i| fragments[i].is_some())
        .collect();
    if available.len() < n_data {
        return Err(FecError::NotEnoughFragments {
            needed: n_data,
            available: available.len(),
        });
    }

    let ws = codec.word_size();
    let len = common_len(fragments.iter().flatten().copied(), ws)?;

    let all_data_present = available[..n_data].iter().enumerate().all(|(i, &id)| i == id);
    if codec.fec_type() == FecType::Systematic && all_data_present {
        debug!("{}: all data fragments present", codec.name());
        return Ok(fragments[..n_data]
            .iter()
            .flatten()
            .map(|f| f.to_vec())
            .collect());
    }

    let ids = &available[..n_data];
    codec.decode_setup(ids)?;
    let codec = &*codec;

    let n_words = len / ws;
    let n_chunks = n_words.div_ceil(CHUNK_WORDS);
    debug!(
        "{}: decoding {} words from fragments {:?}",
        codec.name(),
        n_words,
        ids
    );

    let received: Vec<&[u8]> = ids.iter().filter_map(|&id| fragments[id]).collect();
    let chunks = run_chunks(config, n_chunks, |c| {
        let start = c * CHUNK_WORDS;
        let end = (start + CHUNK_WORDS).min(n_words);
        let mut outputs = vec![Vec::with_capacity((end - start) * ws); n_data];
        let mut words = vec![C::Elem::ZERO; n_data];
        let mut output = vec![C::Elem::ZERO; n_data];
        let mut bytes = vec![0u8; ws];
        let context = codec.decode_init(ids)?;

        for w in start..end {
            let at = w * ws;
            for (word, fragment) in words.iter_mut().zip(&received) {
                *word = read_word(&fragment[at..at + ws]);
            }
            codec.decode_prepare(&context, props, at as u64, &mut words)?;
            codec.decode_apply(&context, &mut output, &words)?;
            for (value, out) in output.iter().zip(outputs.iter_mut()) {
                write_word(*value, &mut bytes);
                out.extend_from_slice(&bytes);
            }
        }
        Ok(outputs)
    })?;

    let mut blocks = vec![Vec::with_capacity(len); n_data];
    for chunk in chunks {
        for (dest, part) in blocks.iter_mut().zip(chunk) {
            dest.extend_from_slice(&part);
        }
    }
    Ok(blocks)
}
