//! 命令行参数与输入 / 输出检查.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use seeg_berry::consts::{files, DEFAULT_RADIUS};

/// Convert a GridView electrode export into labelled NIfTI volumes.
#[derive(Parser, Debug)]
#[command(name = "gridroi")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level: debug, info or warning (default). A bare `-v` means info.
    /// Put a bare `-v` after the positional arguments, otherwise the next
    /// word is read as the level.
    #[arg(
        short = 'v',
        value_enum,
        global = true,
        num_args = 0..=1,
        default_value = "warning",
        default_missing_value = "info",
        ignore_case = true
    )]
    pub verbose: Verbosity,

    /// Force overwriting of the output files.
    #[arg(short = 'f', global = true)]
    pub overwrite: bool,
}

/// 子命令.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create one sphere mask per contact plus a merged label volume.
    Create(CommonArgs),

    /// Match anatomical masks to the contact whose sphere overlaps them first.
    Match {
        #[command(flatten)]
        common: CommonArgs,

        /// Mask NIfTI files, matched in the given order.
        #[arg(long, value_name = "MASK", num_args = 1.., required = true)]
        masks: Vec<PathBuf>,
    },

    /// Report which labels each anatomical mask covers, as a CSV table.
    Labels {
        /// Label volume written by `create` or `match`.
        #[arg(value_name = "LABELS")]
        labels: PathBuf,

        /// Directory searched for `*mask.nii*` files.
        #[arg(value_name = "MASK_DIR")]
        masks_dir: PathBuf,

        /// Output directory.
        #[arg(value_name = "OUT_DIR")]
        output_dir: PathBuf,
    },
}

/// `create` 与 `match` 共用的参数.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// GridView txt export.
    #[arg(value_name = "TXT")]
    pub txt_file: PathBuf,

    /// Reference NIfTI volume.
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,

    /// Output directory.
    #[arg(value_name = "OUT_DIR")]
    pub output_dir: PathBuf,

    /// Sphere radius in voxels.
    #[arg(short, long, default_value_t = DEFAULT_RADIUS)]
    pub radius: usize,
}

/// 日志级别.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    /// Everything, including one line per contact.
    Debug,
    /// Progress of each stage.
    Info,
    /// Dropped lines, duplicate ids and unmatched masks only.
    Warning,
}

impl From<Verbosity> for log::Level {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Debug => log::Level::Debug,
            Verbosity::Info => log::Level::Info,
            Verbosity::Warning => log::Level::Warn,
        }
    }
}

impl Command {
    /// 所有必须存在的输入文件. `labels` 的掩膜目录由 [`find_masks`] 检查.
    pub fn inputs(&self) -> Vec<&Path> {
        match self {
            Command::Create(c) => vec![c.txt_file.as_path(), c.reference.as_path()],
            Command::Match { common, masks } => {
                let mut ans = vec![common.txt_file.as_path(), common.reference.as_path()];
                ans.extend(masks.iter().map(PathBuf::as_path));
                ans
            }
            Command::Labels { labels, .. } => vec![labels.as_path()],
        }
    }

    /// 输出目录.
    pub fn output_dir(&self) -> &Path {
        match self {
            Command::Create(c) | Command::Match { common: c, .. } => &c.output_dir,
            Command::Labels { output_dir, .. } => output_dir,
        }
    }

    /// 运行结束后一定会写出的文件 (不含以触点命名的掩膜).
    pub fn outputs(&self) -> Vec<PathBuf> {
        let dir = self.output_dir();
        let log_name = match self {
            Command::Create(_) => files::CONVERSION_LOG,
            Command::Match { .. } => files::MATCH_LOG,
            Command::Labels { .. } => return vec![dir.join(files::ROI_ANALYSIS)],
        };
        vec![
            dir.join(format!("{}.{}", files::LABELS, files::NIFTI_EXT)),
            dir.join(files::LUT),
            dir.join(log_name),
        ]
    }
}

/// `dir` 中文件名含 `mask.nii` 的所有文件, 按路径排序.
///
/// `dir` 不可读或没有任何匹配文件时返回错误.
pub fn find_masks(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let listed = || -> io::Result<Vec<PathBuf>> {
        let mut ans = vec![];
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let hit = path
                .file_name()
                .is_some_and(|f| f.to_string_lossy().contains("mask.nii"));
            if hit && path.is_file() {
                ans.push(path);
            }
        }
        ans.sort();
        Ok(ans)
    };
    match listed() {
        Ok(v) if v.is_empty() => Err(format!("No mask files found in {}", dir.display())),
        Ok(v) => Ok(v),
        Err(e) => Err(format!("Masks folder {} is not readable: {e}", dir.display())),
    }
}

/// 所有输入必须是已存在的文件.
pub fn check_inputs(inputs: &[&Path]) -> Result<(), String> {
    match inputs.iter().find(|p| !p.is_file()) {
        Some(p) => Err(format!("Input file {} does not exist", p.display())),
        None => Ok(()),
    }
}

/// 输出文件已存在时必须指定 `-f`.
pub fn check_outputs(outputs: &[PathBuf], overwrite: bool) -> Result<(), String> {
    if overwrite {
        return Ok(());
    }
    match outputs.iter().find(|p| p.is_file()) {
        Some(p) => Err(format!(
            "Output file {} exists. Use -f to force overwriting",
            p.display()
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{check_inputs, check_outputs, find_masks, Cli, Command, Verbosity};
    use clap::Parser;

    #[test]
    fn test_parse_create_defaults() {
        let cli = Cli::try_parse_from(["gridroi", "create", "a.txt", "ref.nii.gz", "out"]).unwrap();
        assert_eq!(cli.verbose, Verbosity::Warning);
        assert!(!cli.overwrite);
        let Command::Create(c) = &cli.command else {
            panic!("expected create");
        };
        assert_eq!(c.radius, 2);
        assert_eq!(cli.command.inputs().len(), 2);
    }

    #[test]
    fn test_parse_verbosity() {
        let bare = Cli::try_parse_from(["gridroi", "create", "a", "b", "c", "-v"]).unwrap();
        assert_eq!(bare.verbose, Verbosity::Info);
        let debug = Cli::try_parse_from(["gridroi", "-v", "DEBUG", "create", "a", "b", "c"]).unwrap();
        assert_eq!(debug.verbose, Verbosity::Debug);
        // 位于子命令之前的裸 `-v` 会把子命令名当作级别.
        assert!(Cli::try_parse_from(["gridroi", "-v", "create", "a", "b", "c"]).is_err());
        assert!(Cli::try_parse_from(["gridroi", "-v", "trace", "create", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_parse_match() {
        let cli = Cli::try_parse_from([
            "gridroi", "match", "a.txt", "ref.nii", "out", "--masks", "m1.nii", "m2.nii", "-r",
            "3", "-f",
        ])
        .unwrap();
        assert!(cli.overwrite);
        let Command::Match { common, masks } = &cli.command else {
            panic!("expected match");
        };
        assert_eq!(common.radius, 3);
        assert_eq!(masks.len(), 2);
        assert_eq!(cli.command.inputs().len(), 4);
        assert!(cli.command.outputs()[2].ends_with("coordinate_match.txt"));

        assert!(Cli::try_parse_from(["gridroi", "match", "a", "b", "c"]).is_err());
    }

    #[test]
    fn test_input_and_output_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("grid.txt");
        std::fs::write(&present, "Group: A\n").unwrap();
        let missing = tmp.path().join("missing.nii");

        assert!(check_inputs(&[present.as_path()]).is_ok());
        let err = check_inputs(&[present.as_path(), missing.as_path()]).unwrap_err();
        assert!(err.contains("missing.nii"));

        let outputs = vec![present.clone(), missing.clone()];
        assert!(check_outputs(&outputs, false).unwrap_err().contains("-f"));
        assert!(check_outputs(&outputs, true).is_ok());
        assert!(check_outputs(&[missing], false).is_ok());
    }

    #[test]
    fn test_parse_labels() {
        let cli = Cli::try_parse_from(["gridroi", "labels", "labels.nii.gz", "rois", "out", "-v"])
            .unwrap();
        assert_eq!(cli.verbose, Verbosity::Info);
        let Command::Labels { masks_dir, .. } = &cli.command else {
            panic!("expected labels");
        };
        assert!(masks_dir.ends_with("rois"));
        assert_eq!(cli.command.inputs().len(), 1);
        let outputs = cli.command.outputs();
        assert_eq!(outputs.len(), 1);
        assert!(outputs[0].ends_with("out/roi_analysis.csv"));
    }

    #[test]
    fn test_find_masks() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b_mask.nii.gz", "a_mask.nii", "labels.nii.gz", "mask.txt"] {
            std::fs::write(tmp.path().join(name), "").unwrap();
        }
        std::fs::create_dir(tmp.path().join("dir_mask.nii")).unwrap();

        let found = find_masks(tmp.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a_mask.nii", "b_mask.nii.gz"]);

        let empty = tempfile::tempdir().unwrap();
        assert!(find_masks(empty.path()).unwrap_err().contains("No mask files"));
        assert!(find_masks(&tmp.path().join("missing")).is_err());
    }
}
