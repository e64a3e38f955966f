//! 体数据的持久化存储.

use std::path::Path;

use ndarray::Array3;
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;

use super::ExternalMask;
use crate::SeegResult;

/// 表明一个可以按原样存储为 nifti 文件的三维体数据.
///
/// 输出沿用 `reference` 的空间变换 (affine), 数据类型与形状则由体数据本身决定.
/// 以 `.gz` 结尾的路径会被压缩.
pub trait NiftiWrite {
    /// 将体数据保存到 `path` 路径.
    fn write_nifti(&self, path: &Path, reference: &NiftiHeader) -> SeegResult<()>;
}

macro_rules! impl_nifti_write {
    ($($elem: ty),+) => {
        $(
            /// 按原样存储.
            impl NiftiWrite for Array3<$elem> {
                fn write_nifti(&self, path: &Path, reference: &NiftiHeader) -> SeegResult<()> {
                    WriterOptions::new(path)
                        .reference_header(reference)
                        .write_nifti(self)?;
                    Ok(())
                }
            }
        )+
    };
}

// 球掩膜, 标签体数据, 外部掩膜.
impl_nifti_write!(u8, i32, f32);

/// 按加载时的值原样存储.
impl NiftiWrite for ExternalMask {
    #[inline]
    fn write_nifti(&self, path: &Path, reference: &NiftiHeader) -> SeegResult<()> {
        self.data.write_nifti(path, reference)
    }
}
