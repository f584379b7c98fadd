//! List element size (3 bits)
//! 列表元素大小（3 位）
//!
//! | Value | Name      | Bits per element   |
//! |-------|-----------|--------------------|
//! | 0     | Void      | 0                  |
//! | 1     | Bit       | 1                  |
//! | 2     | Byte      | 8                  |
//! | 3     | TwoBytes  | 16                 |
//! | 4     | FourBytes | 32                 |
//! | 5     | EightBytes| 64                 |
//! | 6     | Ptr       | 64 (pointer word)  |
//! | 7     | Composite | tagged struct list |

use crate::WORD;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElemSize {
  #[default]
  Void = 0,
  Bit = 1,
  Byte = 2,
  TwoBytes = 3,
  FourBytes = 4,
  EightBytes = 5,
  Ptr = 6,
  Composite = 7,
}

impl ElemSize {
  const VARIANTS: [Self; 8] = [
    Self::Void,
    Self::Bit,
    Self::Byte,
    Self::TwoBytes,
    Self::FourBytes,
    Self::EightBytes,
    Self::Ptr,
    Self::Composite,
  ];

  /// From the low 3 bits / 取低 3 位转换
  #[inline]
  pub const fn from_bits(v: u8) -> Self {
    Self::VARIANTS[(v & 7) as usize]
  }

  #[inline]
  pub const fn as_u8(self) -> u8 {
    self as u8
  }

  /// Bits per element, 0 for Composite (size comes from the tag)
  /// 每元素位数，Composite 为 0（由标签决定）
  #[inline]
  pub const fn bits(self) -> u32 {
    match self {
      Self::Void | Self::Composite => 0,
      Self::Bit => 1,
      Self::Byte => 8,
      Self::TwoBytes => 16,
      Self::FourBytes => 32,
      Self::EightBytes | Self::Ptr => 64,
    }
  }

  /// Word-padded byte size of `n` elements (not for Composite)
  /// n 个元素按字对齐的字节数（不适用于 Composite）
  #[inline]
  pub const fn list_bytes(self, n: u32) -> u64 {
    let bits = self.bits() as u64 * n as u64;
    let word_bits = WORD as u64 * 8;
    bits.div_ceil(word_bits) * WORD as u64
  }
}
