//! Segment id and byte address
//! 段 ID 与字节地址

use zmsg_wire::WORD;

/// Segment index within a message / 消息内的段序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct SegId(pub u32);

impl SegId {
  #[inline]
  pub const fn idx(self) -> usize {
    self.0 as usize
  }
}

/// Byte offset from the start of a segment
/// 段内字节偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Addr(pub u32);

impl Addr {
  /// Caller keeps the result inside the segment
  /// 调用方保证结果在段内
  #[inline]
  pub const fn add(self, n: u32) -> Self {
    Self(self.0 + n)
  }

  /// Address of element `i` of size `sz` / 第 i 个大小为 sz 的元素地址
  #[inline]
  pub const fn element(self, i: u32, sz: u32) -> Self {
    Self(self.0 + i * sz)
  }

  #[inline]
  pub const fn from_word(w: u32) -> Self {
    Self(w * WORD)
  }

  /// Word index (address must be word aligned)
  /// 字序号（地址须按字对齐）
  #[inline]
  pub const fn word(self) -> u32 {
    self.0 / WORD
  }

  #[inline]
  pub const fn idx(self) -> usize {
    self.0 as usize
  }
}
