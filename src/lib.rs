//! Reed-Solomon erasure coding over binary extension fields and NF4
//!
//! `k` data fragments are expanded to `n` fragments such that any `k` of
//! them reconstruct the data.
//!
//! - [`fec::RsGf2n`]: systematic matrix code over GF(2^8) / GF(2^16)
//! - [`fec::RsNf4`]: non-systematic transform code over packed GF(65537) lanes
//!
//! [`fec::encode_blocks`] and [`fec::decode_blocks`] work on whole byte
//! buffers; [`fragment`] stores fragments on disk.

pub mod arith;
pub mod config;
pub mod error;
pub mod fec;
pub mod fft;
pub mod fragment;
pub mod gf;
pub mod matrix;
pub mod poly;
pub mod simd;

pub use config::{CodecConfig, CodecKind, ParallelConfig};
pub use error::{FecError, FecResult};
pub use fec::{
    decode_blocks, encode_blocks, DecodeContext, EncodedBlocks, FecCode, FecType, Properties,
    RsGf2n, RsMatrixType, RsNf4, ValueLocation,
};
pub use gf::{BinExtension, Field, Nf4, Prime};
pub use matrix::Matrix;
pub use poly::Poly;
