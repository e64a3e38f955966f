//! 运行结果的持久化.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use nifti::NiftiHeader;

use crate::consts::files::NIFTI_EXT;
use crate::data::{NiftiWrite, ReferenceVolume};
use crate::SeegResult;

/// 输出目标. 流程只通过该接口写出体数据与文本.
pub trait OutputSink {
    /// 保存名为 `name` (不含扩展名) 的体数据.
    fn save_volume(&mut self, name: &str, volume: &dyn NiftiWrite) -> SeegResult<()>;

    /// 保存文本文件. 每个元素一行.
    fn save_text(&mut self, file_name: &str, lines: &[String]) -> SeegResult<()>;

    /// 人类可读的输出位置, 仅用于日志.
    fn location(&self) -> String;
}

/// 将结果写入一个目录: 体数据为 `<name>.nii.gz`, 空间变换取自参考体数据.
#[derive(Debug)]
pub struct NiftiDirSink {
    dir: PathBuf,
    header: Box<NiftiHeader>,
}

impl NiftiDirSink {
    /// 创建 `dir` (含父目录, 已存在时不报错).
    ///
    /// 参考体数据由 [`ReferenceVolume::fake`] 创建时记录警告: 输出的空间变换没有意义.
    pub fn create<P: AsRef<Path>>(dir: P, reference: &ReferenceVolume) -> SeegResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        log::info!("Created output directory: {}", dir.display());
        if reference.is_faked() {
            log::warn!(
                "Reference header is synthetic; outputs in {} carry no real affine",
                dir.display()
            );
        }
        Ok(Self {
            dir,
            header: Box::new(reference.output_header()),
        })
    }

    /// 输出目录.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 名为 `name` 的体数据的完整路径.
    pub fn volume_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{NIFTI_EXT}"))
    }
}

impl OutputSink for NiftiDirSink {
    fn save_volume(&mut self, name: &str, volume: &dyn NiftiWrite) -> SeegResult<()> {
        let path = self.volume_path(name);
        volume.write_nifti(&path, &self.header)?;
        log::debug!("Saved {}", path.display());
        Ok(())
    }

    fn save_text(&mut self, file_name: &str, lines: &[String]) -> SeegResult<()> {
        let mut w = BufWriter::new(fs::File::create(self.dir.join(file_name))?);
        for line in lines {
            writeln!(w, "{line}")?;
        }
        w.flush()?;
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// 只记录写出内容的输出目标. 体数据只记录名字.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// 按写出顺序排列的体数据名.
    pub volumes: Vec<String>,
    /// 文本文件内容.
    pub texts: BTreeMap<String, Vec<String>>,
}

impl MemorySink {
    /// 空.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for MemorySink {
    fn save_volume(&mut self, name: &str, _volume: &dyn NiftiWrite) -> SeegResult<()> {
        self.volumes.push(name.to_owned());
        Ok(())
    }

    fn save_text(&mut self, file_name: &str, lines: &[String]) -> SeegResult<()> {
        self.texts.insert(file_name.to_owned(), lines.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySink, NiftiDirSink, OutputSink};
    use crate::data::{ReferenceVolume, VolumeGeometry};
    use ndarray::Array3;

    #[test]
    fn test_dir_sink_writes_volume_and_text() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested").join("out");
        let reference = ReferenceVolume::fake((4, 4, 4), (1.0, 1.0, 1.0));
        let mut sink = NiftiDirSink::create(&out, &reference).unwrap();

        let mask = Array3::<u8>::ones((4, 4, 4));
        sink.save_volume("A1", &mask).unwrap();
        sink.save_text("lut.txt", &["A1 651".to_owned(), "A2 652".to_owned()])
            .unwrap();

        let path = sink.volume_path("A1");
        assert!(path.ends_with("A1.nii.gz"));
        assert_eq!(ReferenceVolume::open(&path).unwrap().dims(), (4, 4, 4));
        let text = std::fs::read_to_string(out.join("lut.txt")).unwrap();
        assert_eq!(text, "A1 651\nA2 652\n");
        assert_eq!(sink.location(), out.display().to_string());
    }

    #[test]
    fn test_dir_sink_accepts_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let reference = ReferenceVolume::fake((2, 2, 2), (1.0, 1.0, 1.0));
        assert!(NiftiDirSink::create(tmp.path(), &reference).is_ok());
        assert!(NiftiDirSink::create(tmp.path(), &reference).is_ok());
    }

    #[test]
    fn test_memory_sink_records() {
        let mut sink = MemorySink::new();
        sink.save_volume("labels", &Array3::<i32>::zeros((1, 1, 1)))
            .unwrap();
        sink.save_text("a.txt", &["x".to_owned()]).unwrap();
        sink.save_text("a.txt", &["y".to_owned()]).unwrap();
        assert_eq!(sink.volumes, ["labels"]);
        assert_eq!(sink.texts["a.txt"], ["y"]);
    }
}
