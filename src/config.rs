//! Codec and parallelism configuration

use crate::error::{FecError, FecResult};
use crate::fec::RsMatrixType;
use std::fmt;
use std::str::FromStr;

/// Which codec to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    /// Systematic matrix code over GF(2^8) / GF(2^16)
    #[default]
    RsGf2n,
    /// Non-systematic transform code over NF4
    RsNf4,
}

impl CodecKind {
    /// Identifier stored in fragment headers
    pub fn id(self) -> u8 {
        match self {
            CodecKind::RsGf2n => 0,
            CodecKind::RsNf4 => 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(CodecKind::RsGf2n),
            1 => Some(CodecKind::RsNf4),
            _ => None,
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::RsGf2n => write!(f, "gf2n"),
            CodecKind::RsNf4 => write!(f, "nf4"),
        }
    }
}

impl FromStr for CodecKind {
    type Err = FecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gf2n" | "rs-gf2n" => Ok(CodecKind::RsGf2n),
            "nf4" | "rs-nf4" => Ok(CodecKind::RsNf4),
            other => Err(FecError::invalid(format!("unknown codec {:?}", other))),
        }
    }
}

/// Construction parameters for a codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub kind: CodecKind,
    /// Bytes per word
    pub word_size: usize,
    pub n_data: usize,
    pub n_parities: usize,
    /// Generator construction, matrix codec only
    pub matrix: RsMatrixType,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            kind: CodecKind::RsGf2n,
            word_size: 1,
            n_data: 4,
            n_parities: 2,
            matrix: RsMatrixType::Vandermonde,
        }
    }
}

impl CodecConfig {
    pub fn new(kind: CodecKind, word_size: usize, n_data: usize, n_parities: usize) -> Self {
        Self {
            kind,
            word_size,
            n_data,
            n_parities,
            matrix: RsMatrixType::default(),
        }
    }

    pub fn with_matrix(mut self, matrix: RsMatrixType) -> Self {
        self.matrix = matrix;
        self
    }

    /// Check the parameters without building a codec
    pub fn validate(&self) -> FecResult<()> {
        if self.n_data == 0 || self.n_parities == 0 {
            return Err(FecError::invalid(
                "data and parity counts must both be at least 1",
            ));
        }
        let total = self.n_data + self.n_parities;
        match self.kind {
            CodecKind::RsGf2n => {
                if !(1..=2).contains(&self.word_size) {
                    return Err(FecError::invalid(format!(
                        "gf2n word size must be 1 or 2, got {}",
                        self.word_size
                    )));
                }
                let card = 1usize << (8 * self.word_size);
                if total > card {
                    return Err(FecError::invalid(format!(
                        "{} fragments exceed the {} points of GF(2^{})",
                        total,
                        card,
                        8 * self.word_size
                    )));
                }
            }
            CodecKind::RsNf4 => {
                if !matches!(self.word_size, 2 | 4 | 6 | 8) {
                    return Err(FecError::invalid(format!(
                        "nf4 word size must be 2, 4, 6 or 8, got {}",
                        self.word_size
                    )));
                }
                if total > 65536 || 2 * self.n_data > 65536 {
                    return Err(FecError::invalid(format!(
                        "{} data and {} parity fragments exceed the NF4 code length",
                        self.n_data, self.n_parities
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn from_args(matches: &clap::ArgMatches) -> FecResult<Self> {
        fn number(matches: &clap::ArgMatches, name: &str, default: usize) -> FecResult<usize> {
            match matches.get_one::<String>(name) {
                Some(s) => s
                    .parse()
                    .map_err(|_| FecError::invalid(format!("--{}: {:?} is not a number", name, s))),
                None => Ok(default),
            }
        }

        let defaults = Self::default();
        let kind = match matches.get_one::<String>("codec") {
            Some(s) => s.parse()?,
            None => defaults.kind,
        };
        let default_word_size = match kind {
            CodecKind::RsGf2n => 1,
            CodecKind::RsNf4 => 2,
        };
        let matrix = match matches.get_one::<String>("matrix") {
            Some(s) => s.parse()?,
            None => defaults.matrix,
        };

        let config = Self {
            kind,
            word_size: number(matches, "word-size", default_word_size)?,
            n_data: number(matches, "data", defaults.n_data)?,
            n_parities: number(matches, "parity", defaults.n_parities)?,
            matrix,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Thread configuration for the block layer
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads (0 = auto-detect)
    pub threads: usize,
    /// Whether to process chunks in parallel at all
    pub parallel: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            parallel: true,
        }
    }
}

impl ParallelConfig {
    pub fn new(threads: usize, parallel: bool) -> Self {
        Self { threads, parallel }
    }

    /// Single-threaded processing
    pub fn sequential() -> Self {
        Self::new(1, false)
    }

    pub fn from_args(matches: &clap::ArgMatches) -> Self {
        let threads = matches
            .get_one::<String>("threads")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let parallel = !matches.get_flag("no-parallel");

        Self::new(threads, parallel)
    }

    /// Get effective thread count (auto-detect if 0)
    pub fn effective_threads(&self) -> usize {
        match (self.parallel, self.threads) {
            (false, _) => 1,
            (true, 0) => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            (true, n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command};

    fn command() -> Command {
        Command::new("test")
            .arg(Arg::new("codec").long("codec"))
            .arg(Arg::new("word-size").long("word-size"))
            .arg(Arg::new("data").long("data"))
            .arg(Arg::new("parity").long("parity"))
            .arg(Arg::new("matrix").long("matrix"))
            .arg(Arg::new("threads").long("threads"))
            .arg(
                Arg::new("no-parallel")
                    .long("no-parallel")
                    .action(ArgAction::SetTrue),
            )
    }

    #[test]
    fn default_config_is_valid() {
        assert!(CodecConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let bad = [
            CodecConfig::new(CodecKind::RsGf2n, 3, 4, 2),
            CodecConfig::new(CodecKind::RsGf2n, 1, 200, 57),
            CodecConfig::new(CodecKind::RsGf2n, 1, 0, 2),
            CodecConfig::new(CodecKind::RsNf4, 5, 4, 2),
            CodecConfig::new(CodecKind::RsNf4, 2, 40000, 1),
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
        assert!(CodecConfig::new(CodecKind::RsGf2n, 2, 1000, 500).validate().is_ok());
        assert!(CodecConfig::new(CodecKind::RsNf4, 8, 10, 6).validate().is_ok());
    }

    #[test]
    fn config_from_args() {
        let matches = command()
            .try_get_matches_from([
                "test", "--codec", "nf4", "--data", "6", "--parity", "3", "--word-size", "4",
            ])
            .unwrap();
        let config = CodecConfig::from_args(&matches).unwrap();
        assert_eq!(config.kind, CodecKind::RsNf4);
        assert_eq!(config.word_size, 4);
        assert_eq!(config.n_data, 6);
        assert_eq!(config.n_parities, 3);

        let matches = command()
            .try_get_matches_from(["test", "--matrix", "cauchy"])
            .unwrap();
        let config = CodecConfig::from_args(&matches).unwrap();
        assert_eq!(config.kind, CodecKind::RsGf2n);
        assert_eq!(config.matrix, RsMatrixType::Cauchy);

        let matches = command()
            .try_get_matches_from(["test", "--data", "many"])
            .unwrap();
        assert!(CodecConfig::from_args(&matches).is_err());
    }

    #[test]
    fn parallel_config_threads() {
        let matches = command()
            .try_get_matches_from(["test", "--threads", "3"])
            .unwrap();
        assert_eq!(ParallelConfig::from_args(&matches).effective_threads(), 3);

        let matches = command()
            .try_get_matches_from(["test", "--threads", "3", "--no-parallel"])
            .unwrap();
        assert_eq!(ParallelConfig::from_args(&matches).effective_threads(), 1);

        assert!(ParallelConfig::default().effective_threads() >= 1);
        assert_eq!(ParallelConfig::sequential().effective_threads(), 1);
    }

    #[test]
    fn codec_kind_ids_round_trip() {
        for kind in [CodecKind::RsGf2n, CodecKind::RsNf4] {
            assert_eq!(CodecKind::from_id(kind.id()), Some(kind));
            assert_eq!(kind.to_string().parse::<CodecKind>().unwrap(), kind);
        }
        assert_eq!(CodecKind::from_id(9), None);
    }
}
