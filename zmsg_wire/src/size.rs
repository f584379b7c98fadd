//! Object size 对象大小

/// Word size in bytes / 字大小（字节）
pub const WORD: u32 = 8;

/// Round up to a whole word, None on overflow
/// 向上取整到字，溢出返回 None
#[inline]
pub const fn pad_to_word(n: u32) -> Option<u32> {
  match n.checked_add(WORD - 1) {
    Some(v) => Some(v & !(WORD - 1)),
    None => None,
  }
}

/// Struct size: data section bytes + pointer slot count
/// 结构体大小：数据段字节数 + 指针槽数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjSize {
  /// Data section size in bytes 数据段字节数
  pub data_size: u32,
  /// Pointer slots (8 bytes each) 指针槽数（每个 8 字节）
  pub ptr_count: u16,
}

impl ObjSize {
  /// Largest data section a struct pointer can describe (16-bit word count)
  /// 结构体指针可描述的最大数据段（16 位字数）
  pub const MAX_DATA: u32 = 0xffff * WORD;

  #[inline]
  pub const fn new(data_size: u32, ptr_count: u16) -> Self {
    Self {
      data_size,
      ptr_count,
    }
  }

  #[inline]
  pub const fn is_zero(&self) -> bool {
    self.data_size == 0 && self.ptr_count == 0
  }

  /// Representable by a struct pointer / 可由结构体指针表示
  #[inline]
  pub const fn is_valid(&self) -> bool {
    self.data_size <= Self::MAX_DATA
  }

  /// Copy with data size rounded up to a word
  /// 数据段向上取整到字
  #[inline]
  pub const fn padded(self) -> Self {
    Self {
      data_size: (self.data_size + WORD - 1) & !(WORD - 1),
      ptr_count: self.ptr_count,
    }
  }

  /// Pointer section size in bytes / 指针段字节数
  #[inline]
  pub const fn ptr_size(&self) -> u32 {
    self.ptr_count as u32 * WORD
  }

  /// Data + pointer section bytes / 总字节数
  #[inline]
  pub const fn total_size(&self) -> u32 {
    self.data_size + self.ptr_size()
  }

  /// Data section in words, truncated / 数据段字数
  #[inline]
  pub const fn data_words(&self) -> u16 {
    (self.data_size / WORD) as u16
  }
}
