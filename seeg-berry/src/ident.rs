//! 电极 ID 编码.
//!
//! ID 由组名首字符的 Unicode 码位 (十进制) 与触点名去掉首字符后的部分拼接而成,
//! 再解析为整数: `("A", "A1") -> "65" + "1" -> 651`.
//!
//! # 注意
//!
//! 该编码不是单射: 组 `"A"` 下的触点 `"A11"` 与 `"X11"` 都得到 `6511`,
//! 组 `"A"` 与组 `"Ab"` 也无法区分. 冲突不会被拒绝, 由 [`crate::label`]
//! 记录警告后以后写入者为准.

use std::fmt;

use crate::{SeegError, SeegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 写入标签体数据的整数电极 ID. 恒为正数.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElectrodeId(i32);

impl ElectrodeId {
    /// 由组名与触点名编码电极 ID.
    ///
    /// # 返回值
    ///
    /// 以下情况返回 `Err(SeegError::InvalidElectrodeName)`:
    ///
    /// - 组名为空;
    /// - 触点名去掉首字符后为空, 或含有非 ASCII 数字的字符;
    /// - 拼接结果超出 `i32` 范围.
    pub fn encode(group: &str, contact: &str) -> SeegResult<Self> {
        let invalid = || SeegError::InvalidElectrodeName {
            group: group.to_owned(),
            contact: contact.to_owned(),
        };

        let head = group.chars().next().ok_or_else(invalid)?;
        let suffix = contact
            .char_indices()
            .nth(1)
            .map(|(i, _)| &contact[i..])
            .unwrap_or("");
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        format!("{}{suffix}", head as u32)
            .parse::<i32>()
            .ok()
            .filter(|v| *v > 0)
            .map(Self)
            .ok_or_else(invalid)
    }

    /// 原始整数值.
    #[inline]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ElectrodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ElectrodeId> for i32 {
    #[inline]
    fn from(value: ElectrodeId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::ElectrodeId;
    use crate::SeegError;
    use rstest::rstest;

    #[rstest]
    #[case("A", "A1", 651)]
    #[case("B", "B12", 6612)]
    #[case("A", "A01", 6501)]
    #[case("LH", "L3", 763)]
    // 触点名前缀与组名无关, 只有组名首字符参与编码.
    #[case("A", "X11", 6511)]
    fn test_encode(#[case] group: &str, #[case] contact: &str, #[case] expected: i32) {
        let id = ElectrodeId::encode(group, contact).unwrap();
        assert_eq!(id.get(), expected);
        assert_eq!(id.to_string(), expected.to_string());
    }

    #[rstest]
    #[case("", "A1")]
    #[case("A", "A")]
    #[case("A", "")]
    #[case("AB", "AB12")]
    #[case("A", "A1-2")]
    #[case("A", "A99999999999")]
    fn test_encode_invalid(#[case] group: &str, #[case] contact: &str) {
        let err = ElectrodeId::encode(group, contact).unwrap_err();
        assert!(matches!(err, SeegError::InvalidElectrodeName { .. }));
    }

    #[test]
    fn test_ids_order_numerically() {
        let a = ElectrodeId::encode("A", "A2").unwrap();
        let b = ElectrodeId::encode("A", "A10").unwrap();
        assert!(a < b);
        assert_eq!(i32::from(b), 6510);
    }
}
