//! nttec - split a file into erasure-coded fragments and repair it
//!
//! `nttec encode FILE` writes one fragment file per fragment;
//! `nttec repair FRAGMENT... -o FILE` rebuilds the file from any `n_data`
//! intact fragments.

use anyhow::{bail, ensure, Context, Result};
use clap::{Arg, ArgAction, Command};
use nttec::fragment::Fragment;
use nttec::{
    decode_blocks, encode_blocks, CodecConfig, CodecKind, EncodedBlocks, FecCode,
    ParallelConfig, Properties, RsGf2n, RsNf4,
};
use std::fs;
use std::path::{Path, PathBuf};

fn parallel_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("threads")
            .short('t')
            .long("threads")
            .help("Number of CPU threads for computation (0 = auto-detect)")
            .value_name("N")
            .default_value("0"),
    )
    .arg(
        Arg::new("no-parallel")
            .long("no-parallel")
            .help("Disable all parallel processing")
            .action(ArgAction::SetTrue),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("Quiet mode - minimal output")
            .action(ArgAction::SetTrue),
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = Command::new("nttec")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reed-Solomon erasure coding of files")
        .arg_required_else_help(true)
        .subcommand(parallel_args(
            Command::new("encode")
                .visible_alias("e")
                .about("Split a file into erasure-coded fragment files")
                .arg(
                    Arg::new("input")
                        .help("File to protect")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output-dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory for fragment files (default: next to the input)")
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("codec")
                        .short('c')
                        .long("codec")
                        .help("Codec: gf2n (systematic) or nf4 (non-systematic)")
                        .value_name("CODEC")
                        .default_value("gf2n"),
                )
                .arg(
                    Arg::new("word-size")
                        .short('w')
                        .long("word-size")
                        .help("Bytes per word (gf2n: 1-2, nf4: 2, 4, 6 or 8)")
                        .value_name("BYTES"),
                )
                .arg(
                    Arg::new("data")
                        .short('k')
                        .long("data")
                        .help("Number of data fragments (default: 4)")
                        .value_name("COUNT"),
                )
                .arg(
                    Arg::new("parity")
                        .short('m')
                        .long("parity")
                        .help("Number of parity fragments (default: 2)")
                        .value_name("COUNT"),
                )
                .arg(
                    Arg::new("matrix")
                        .long("matrix")
                        .help("Generator for gf2n: vandermonde or cauchy")
                        .value_name("TYPE"),
                ),
        ))
        .subcommand(parallel_args(
            Command::new("repair")
                .visible_alias("r")
                .about("Rebuild a file from its surviving fragment files")
                .arg(
                    Arg::new("fragments")
                        .help("Fragment files")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Path of the rebuilt file")
                        .value_name("FILE")
                        .required(true),
                ),
        ))
        .get_matches();

    match matches.subcommand() {
        Some(("encode", sub_matches)) => handle_encode(sub_matches),
        Some(("repair", sub_matches)) => handle_repair(sub_matches),
        Some((cmd, _)) => bail!("Unknown command: {}", cmd),
        None => bail!("No command specified"),
    }
}

/// `<dir>/<file name>.<index>.ntec`
fn fragment_path(dir: &Path, file_name: &str, index: usize) -> PathBuf {
    dir.join(format!("{}.{:03}.ntec", file_name, index))
}

/// Cut `data` into `n_data` zero-padded blocks of whole words
fn split_blocks(data: &[u8], n_data: usize, word_size: usize) -> Vec<Vec<u8>> {
    let stripe = n_data * word_size;
    let block_len = data.len().div_ceil(stripe) * word_size;
    (0..n_data)
        .map(|i| {
            let start = (i * block_len).min(data.len());
            let end = ((i + 1) * block_len).min(data.len());
            let mut block = data[start..end].to_vec();
            block.resize(block_len, 0);
            block
        })
        .collect()
}

fn encode_file(
    config: &CodecConfig,
    blocks: &[Vec<u8>],
    parallel: &ParallelConfig,
) -> Result<EncodedBlocks> {
    let encoded = match config.kind {
        CodecKind::RsGf2n => {
            let codec =
                RsGf2n::<u32>::new(config.word_size, config.n_data, config.n_parities, config.matrix)?;
            encode_blocks(&codec, blocks, parallel)?
        }
        CodecKind::RsNf4 => {
            let codec = RsNf4::<u128>::new(config.word_size, config.n_data, config.n_parities)?;
            encode_blocks(&codec, blocks, parallel)?
        }
    };
    Ok(encoded)
}

fn handle_encode(matches: &clap::ArgMatches) -> Result<()> {
    let input = matches
        .get_one::<String>("input")
        .context("input file is required")?;
    let quiet = matches.get_flag("quiet");
    let config = CodecConfig::from_args(matches)?;
    let parallel = ParallelConfig::from_args(matches);

    let input_path = PathBuf::from(input);
    let data =
        fs::read(&input_path).with_context(|| format!("Failed to read {}", input_path.display()))?;
    let file_name = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("input path has no file name")?;
    let output_dir = match matches.get_one::<String>("output-dir") {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let blocks = split_blocks(&data, config.n_data, config.word_size);
    let encoded = encode_file(&config, &blocks, &parallel)?;

    for (index, (payload, props)) in encoded
        .fragments
        .into_iter()
        .zip(encoded.props)
        .enumerate()
    {
        let fragment = Fragment::new(&config, index, data.len() as u64, payload, props);
        let path = fragment_path(&output_dir, file_name, index);
        fragment
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !quiet {
            println!("Wrote {}", path.display());
        }
    }

    if !quiet {
        println!(
            "Encoded {} bytes with {} ({} data, {} parity, {}-byte words)",
            data.len(),
            config.kind,
            config.n_data,
            config.n_parities,
            config.word_size
        );
    }
    Ok(())
}

fn decode_file<C: FecCode>(
    codec: &mut C,
    fragments: &[Fragment],
    parallel: &ParallelConfig,
) -> Result<Vec<Vec<u8>>> {
    let code_len = codec.code_len();
    let mut slots: Vec<Option<&[u8]>> = vec![None; code_len];
    let mut props = vec![Properties::new(); code_len];
    for fragment in fragments {
        let index = fragment.index();
        ensure!(
            index < code_len,
            "fragment index {} out of range for code length {}",
            index,
            code_len
        );
        slots[index] = Some(fragment.payload.as_slice());
        props[index] = fragment.props.clone();
    }
    Ok(decode_blocks(codec, &slots, &props, parallel)?)
}

/// Codec parameters and file length shared by the most fragments
///
/// Ties go to the set seen first.
fn majority_set(fragments: &[Fragment]) -> Option<(CodecConfig, u64)> {
    let mut sets: Vec<((CodecConfig, u64), usize)> = Vec::new();
    for fragment in fragments {
        let Ok(config) = fragment.header.codec_config() else {
            continue;
        };
        let key = (config, fragment.header.original_len);
        match sets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => sets.push((key, 1)),
        }
    }
    sets.into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(key, _)| key)
}

fn handle_repair(matches: &clap::ArgMatches) -> Result<()> {
    let quiet = matches.get_flag("quiet");
    let parallel = ParallelConfig::from_args(matches);
    let output = matches
        .get_one::<String>("output")
        .context("output file is required")?;

    let mut fragments: Vec<Fragment> = Vec::new();
    for path in matches
        .get_many::<String>("fragments")
        .context("no fragment files given")?
    {
        match Fragment::load(Path::new(path)) {
            Ok(fragment) => fragments.push(fragment),
            Err(e) => eprintln!("Skipping {}: {}", path, e),
        }
    }

    let (config, original_len) =
        majority_set(&fragments).context("no readable fragment files")?;
    config.validate()?;
    fragments.retain(|f| {
        let same_set = f.header.codec_config().ok().as_ref() == Some(&config)
            && f.header.original_len == original_len;
        if !same_set {
            eprintln!("Skipping fragment {}: belongs to a different set", f.index());
        }
        same_set
    });
    fragments.sort_by_key(Fragment::index);
    fragments.dedup_by_key(|f| f.index());

    if !quiet {
        println!(
            "Loaded {} fragments ({}, {} data, {} parity)",
            fragments.len(),
            config.kind,
            config.n_data,
            config.n_parities
        );
    }

    let blocks = match config.kind {
        CodecKind::RsGf2n => {
            let mut codec =
                RsGf2n::<u32>::new(config.word_size, config.n_data, config.n_parities, config.matrix)?;
            decode_file(&mut codec, &fragments, &parallel)?
        }
        CodecKind::RsNf4 => {
            let mut codec = RsNf4::<u128>::new(config.word_size, config.n_data, config.n_parities)?;
            decode_file(&mut codec, &fragments, &parallel)?
        }
    };

    let mut data: Vec<u8> = blocks.concat();
    data.truncate(original_len as usize);
    fs::write(output, &data).with_context(|| format!("Failed to write {}", output))?;

    if !quiet {
        println!("Repaired {} bytes into {}", data.len(), output);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pads_to_whole_words() {
        let blocks = split_blocks(&[1, 2, 3, 4, 5], 2, 2);
        assert_eq!(blocks, vec![vec![1, 2, 3, 4], vec![5, 0, 0, 0]]);

        let blocks = split_blocks(&[], 3, 1);
        assert_eq!(blocks, vec![Vec::<u8>::new(); 3]);
    }

    fn fragment(config: &CodecConfig, index: usize, original_len: u64) -> Fragment {
        Fragment::new(config, index, original_len, vec![0; 4], Properties::new())
    }

    #[test]
    fn majority_set_outvotes_a_stray_first_fragment() {
        let ours = CodecConfig::new(CodecKind::RsGf2n, 2, 3, 2);
        let stray = CodecConfig::new(CodecKind::RsNf4, 4, 3, 2);
        let fragments = vec![
            fragment(&stray, 0, 100),
            fragment(&ours, 1, 500),
            fragment(&ours, 3, 500),
            fragment(&ours, 4, 500),
        ];
        assert_eq!(majority_set(&fragments), Some((ours.clone(), 500)));

        // same codec, different file length
        let fragments = vec![
            fragment(&ours, 0, 7),
            fragment(&ours, 1, 500),
            fragment(&ours, 2, 500),
        ];
        assert_eq!(majority_set(&fragments), Some((ours, 500)));
    }

    #[test]
    fn majority_set_ties_go_to_the_first_set() {
        let a = CodecConfig::new(CodecKind::RsGf2n, 1, 2, 1);
        let b = CodecConfig::new(CodecKind::RsGf2n, 2, 2, 1);
        let fragments = vec![fragment(&a, 0, 10), fragment(&b, 0, 10)];
        assert_eq!(majority_set(&fragments), Some((a, 10)));
        assert_eq!(majority_set(&[]), None);
    }

    #[test]
    fn fragment_names_are_numbered() {
        let path = fragment_path(Path::new("/tmp"), "data.bin", 7);
        assert_eq!(path, PathBuf::from("/tmp/data.bin.007.ntec"));
    }
}
