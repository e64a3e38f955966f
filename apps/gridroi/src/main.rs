//! GridView 电极导出文件 -> 球掩膜 / 掩膜匹配 + 标签体数据, 以及标签体数据的 ROI 统计.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{error, info};
use seeg_berry::pipeline;
use seeg_berry::sink::NiftiDirSink;
use seeg_berry::{gridview, ExternalMask, LabelVolume, ReferenceVolume, SeegResult};

use crate::cli::{check_inputs, check_outputs, find_masks, Cli, Command, CommonArgs};

mod cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = simple_logger::init_with_level(cli.verbose.into()) {
        eprintln!("Error: cannot install logger: {e}");
    }

    let mask_files = match &cli.command {
        Command::Labels { masks_dir, .. } => find_masks(masks_dir),
        _ => Ok(vec![]),
    };
    let checked = check_inputs(&cli.command.inputs())
        .and_then(|_| check_outputs(&cli.command.outputs(), cli.overwrite))
        .and(mask_files);
    let mask_files = match checked {
        Ok(found) => found,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(2);
        }
    };

    if let Err(e) = run(&cli.command, &mask_files) {
        error!("{e}");
        process::exit(1);
    }
}

fn load_masks<P: AsRef<Path>>(paths: &[P]) -> SeegResult<Vec<ExternalMask>> {
    info!("Loading {} masks...", paths.len());
    paths.iter().map(ExternalMask::open).collect()
}

/// 读取参考体数据与电极文件.
fn load_inputs(common: &CommonArgs) -> SeegResult<(ReferenceVolume, gridview::GridParse)> {
    info!("Loading ref image...");
    let reference = ReferenceVolume::open(&common.reference)?;

    info!("Parsing electrode coordinates...");
    let parsed = gridview::parse(&fs::read_to_string(&common.txt_file)?);
    Ok((reference, parsed))
}

fn run(command: &Command, mask_files: &[PathBuf]) -> SeegResult<()> {
    match command {
        Command::Create(common) => {
            let (reference, parsed) = load_inputs(common)?;
            let mut sink = NiftiDirSink::create(&common.output_dir, &reference)?;
            pipeline::create_rois(&parsed, &reference, common.radius, &mut sink)?;
        }
        Command::Match { common, masks } => {
            let (reference, parsed) = load_inputs(common)?;
            let masks = load_masks(masks)?;
            let mut sink = NiftiDirSink::create(&common.output_dir, &reference)?;
            pipeline::match_rois(&parsed, &reference, &masks, common.radius, &mut sink)?;
        }
        Command::Labels {
            labels, output_dir, ..
        } => {
            info!("Loading labels...");
            let reference = ReferenceVolume::open(labels)?;
            let labels = LabelVolume::open(labels)?;
            let masks = load_masks(mask_files)?;
            let mut sink = NiftiDirSink::create(output_dir, &reference)?;
            pipeline::summarize_rois(&labels, &masks, &mut sink)?;
        }
    }
    Ok(())
}
