//! Erasure codes
//!
//! A codec is built once for fixed `(word_size, n_data, n_parities)` and then
//! encodes and decodes one word position at a time: `encode` takes the
//! `n_data` words found at one offset of the data fragments and produces the
//! words at that offset of the output fragments; `decode` reverses it from
//! any `n_data` surviving fragments.
//!
//! Decoding follows a four-phase protocol:
//!
//! 1. `decode_add_data` / `decode_add_parities` for each surviving fragment
//! 2. `decode_build` once the set is complete
//! 3. `decode` per word position, which builds a [`DecodeContext`], applies
//!    the side channel and reconstructs the data
//!
//! [`FecCode::decode_setup`] runs phases 1 and 2 for a list of fragment ids.

pub mod blocks;
pub mod context;
pub mod props;
pub mod rs_gf2n;
pub mod rs_nf4;

pub use blocks::{decode_blocks, encode_blocks, EncodedBlocks};
pub use context::DecodeContext;
pub use props::{Properties, ValueLocation};
pub use rs_gf2n::{RsGf2n, RsMatrixType};
pub use rs_nf4::RsNf4;

use crate::arith::Element;
use crate::error::{FecError, FecResult};
use crate::gf::Field;
use log::trace;
use rustc_hash::FxHashSet as HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecType {
    /// Data fragments are emitted unchanged; only parities are computed
    Systematic,
    /// Every output fragment is a transform of the data
    NonSystematic,
}

impl fmt::Display for FecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FecType::Systematic => write!(f, "systematic"),
            FecType::NonSystematic => write!(f, "non-systematic"),
        }
    }
}

pub trait FecCode: Send + Sync {
    type Elem: Element;
    type Field: Field<Elem = Self::Elem>;

    /// Codec name used in diagnostics
    fn name(&self) -> &'static str;

    fn fec_type(&self) -> FecType;

    fn field(&self) -> &Self::Field;

    /// Bytes per word
    fn word_size(&self) -> usize;

    fn n_data(&self) -> usize;

    fn n_parities(&self) -> usize;

    /// Number of distinct fragment ids
    fn code_len(&self) -> usize;

    /// Number of words `encode` writes
    fn get_n_outputs(&self) -> usize;

    /// Encode the `n_data` words at `offset`
    ///
    /// `output` receives [`FecCode::get_n_outputs`] words. `props` holds one
    /// entry per output fragment.
    fn encode(
        &self,
        output: &mut [Self::Elem],
        props: &mut [Properties],
        offset: u64,
        words: &[Self::Elem],
    ) -> FecResult<()>;

    /// Surviving data fragment `row` is decode input number `fragment_index`
    fn decode_add_data(&mut self, fragment_index: usize, row: usize) -> FecResult<()>;

    /// Surviving parity fragment `row` is decode input number `fragment_index`
    fn decode_add_parities(&mut self, fragment_index: usize, row: usize) -> FecResult<()>;

    fn decode_build(&mut self) -> FecResult<()>;

    /// Fresh context for the given surviving fragment ids
    fn decode_init(&self, fragment_ids: &[usize]) -> FecResult<DecodeContext<Self::Field>>;

    /// Apply the side channel to the received words
    fn decode_prepare(
        &self,
        _context: &DecodeContext<Self::Field>,
        _props: &[Properties],
        _offset: u64,
        _words: &mut [Self::Elem],
    ) -> FecResult<()> {
        Ok(())
    }

    /// Reconstruct the `n_data` original words
    fn decode_apply(
        &self,
        context: &DecodeContext<Self::Field>,
        output: &mut [Self::Elem],
        words: &[Self::Elem],
    ) -> FecResult<()>;

    /// Decode the words received from `fragment_ids` at `offset`
    fn decode(
        &self,
        output: &mut [Self::Elem],
        props: &[Properties],
        offset: u64,
        fragment_ids: &[usize],
        words: &[Self::Elem],
    ) -> FecResult<()> {
        check_fragment_ids(fragment_ids, self.n_data(), self.code_len())?;
        if words.len() != self.n_data() || output.len() < self.n_data() {
            return Err(FecError::invalid(format!(
                "decode needs {} words and room for {} outputs, got {} and {}",
                self.n_data(),
                self.n_data(),
                words.len(),
                output.len()
            )));
        }
        trace!("{}: decode at offset {} from {:?}", self.name(), offset, fragment_ids);

        let context = self.decode_init(fragment_ids)?;
        let mut words = words.to_vec();
        self.decode_prepare(&context, props, offset, &mut words)?;
        self.decode_apply(&context, output, &words)
    }

    /// Run the add and build phases for the surviving `fragment_ids`
    ///
    /// Systematic codecs number fragments `0..n_data` for data and
    /// `n_data..` for parities; non-systematic fragments are all parities.
    fn decode_setup(&mut self, fragment_ids: &[usize]) -> FecResult<()> {
        check_fragment_ids(fragment_ids, self.n_data(), self.code_len())?;
        let n_data = self.n_data();
        for (i, &id) in fragment_ids.iter().enumerate() {
            match self.fec_type() {
                FecType::Systematic if id < n_data => self.decode_add_data(i, id)?,
                FecType::Systematic => self.decode_add_parities(i, id - n_data)?,
                FecType::NonSystematic => self.decode_add_parities(i, id)?,
            }
        }
        self.decode_build()
    }
}

/// `n_data` distinct ids, each below `code_len`
pub(crate) fn check_fragment_ids(ids: &[usize], n_data: usize, code_len: usize) -> FecResult<()> {
    if ids.len() != n_data {
        return Err(FecError::invalid(format!(
            "expected {} fragment ids, got {}",
            n_data,
            ids.len()
        )));
    }
    let mut seen = HashSet::default();
    for &id in ids {
        if id >= code_len {
            return Err(FecError::invalid(format!(
                "fragment id {} out of range for code length {}",
                id, code_len
            )));
        }
        if !seen.insert(id) {
            return Err(FecError::invalid(format!("duplicate fragment id {}", id)));
        }
    }
    Ok(())
}
