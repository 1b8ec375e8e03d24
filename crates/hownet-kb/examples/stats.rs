use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use hownet_kb::{HowNet, LoadMode};

fn main() -> Result<()> {
    let dict_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p hownet-kb --example stats -- <path-to-dataset-dir>")?;

    let base = HowNet::load_with_mode(&dict_dir, LoadMode::Mmap)
        .with_context(|| format!("loading dataset from {}", dict_dir.display()))?;

    let mut edge_count = 0usize;
    let mut top: Option<(&str, u32)> = None;
    for sememe in base.all_sememes() {
        edge_count += sememe.forward.len();
        if top.map(|(_, f)| sememe.freq > f).unwrap_or(true) {
            top = Some((&sememe.label, sememe.freq));
        }
    }

    let mut def_chars = 0usize;
    for sense in base.iter_senses() {
        def_chars += sense.def.chars().count();
    }

    println!("Dataset: {}", dict_dir.display());
    println!("Sememes       : {}", base.sememe_count());
    println!("Senses        : {}", base.sense_count());
    println!("English forms : {}", base.en_words().len());
    println!("Chinese forms : {}", base.zh_words().len());
    println!("Taxonomy edges: {edge_count}");
    println!("Definition characters: {def_chars}");
    if let Some((label, freq)) = top {
        println!("Most frequent sememe: {label} ({freq})");
    }

    Ok(())
}
