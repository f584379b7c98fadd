//! Pointer word (8 bytes, little endian)
//! 指针字（8 字节，小端）
//!
//! Low 32 bits: `offset_and_kind`, high 32 bits: kind specific payload.
//! 低 32 位：偏移与类型，高 32 位：类型相关负载。
//!
//! | Kind   | bits 0-1 | bits 2-31                         | bits 32-63                         |
//! |--------|----------|-----------------------------------|------------------------------------|
//! | Struct | 0        | signed word offset                | data words (16) + ptr count (16)   |
//! | List   | 1        | signed word offset                | elem size (3) + count (29)         |
//! | Far    | 2        | double flag (1) + pad word (29)   | segment id                         |
//! | Other  | 3        | 0 for capabilities                | capability index                   |

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, little_endian::U64};

use crate::{ElemSize, ObjSize, WORD};

/// List element / word count limit (29 bits)
/// 列表元素数或字数上限（29 位）
pub const MAX_LIST_LEN: u32 = (1 << 29) - 1;

/// Pointer kind (2 bits) / 指针类型（2 位）
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
  Struct = 0,
  List = 1,
  Far = 2,
  Other = 3,
}

impl Kind {
  const VARIANTS: [Self; 4] = [Self::Struct, Self::List, Self::Far, Self::Other];

  #[inline]
  pub const fn from_bits(v: u32) -> Self {
    Self::VARIANTS[(v & 3) as usize]
  }
}

/// Encoded pointer word / 编码后的指针字
#[repr(transparent)]
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct RawPtr(U64);

const _: () = assert!(size_of::<RawPtr>() == 8);

impl RawPtr {
  pub const SIZE: usize = 8;

  pub const NULL: Self = Self(U64::ZERO);

  /// Zero-sized struct: offset -1 so it differs from null
  /// 空结构体：偏移 -1，与空指针区分
  pub const EMPTY_STRUCT: Self = Self(U64::new(0xffff_fffc));

  #[inline]
  pub const fn from_u64(v: u64) -> Self {
    Self(U64::new(v))
  }

  #[inline]
  pub const fn get(self) -> u64 {
    self.0.get()
  }

  #[inline]
  const fn from_parts(lo: u32, hi: u32) -> Self {
    Self::from_u64((hi as u64) << 32 | lo as u64)
  }

  #[inline]
  const fn lo(self) -> u32 {
    self.get() as u32
  }

  #[inline]
  const fn hi(self) -> u32 {
    (self.get() >> 32) as u32
  }

  /// Decode from the first 8 bytes / 从前 8 字节解码
  #[inline]
  pub fn decode(buf: &[u8]) -> Option<Self> {
    Self::read_from_prefix(buf).ok().map(|(p, _)| p)
  }

  /// Encode into the first 8 bytes / 编码到前 8 字节
  #[inline]
  pub fn encode(&self, buf: &mut [u8]) {
    buf[..Self::SIZE].copy_from_slice(self.as_bytes());
  }

  #[inline]
  pub const fn is_null(self) -> bool {
    self.get() == 0
  }

  #[inline]
  pub const fn kind(self) -> Kind {
    Kind::from_bits(self.lo())
  }

  /// Capability pointer (kind Other with zero offset bits)
  /// 能力指针（Other 类型且偏移位为 0）
  #[inline]
  pub const fn is_cap(self) -> bool {
    self.lo() == Kind::Other as u32
  }

  /// Signed word offset from the end of the pointer (Struct / List)
  /// 相对指针末尾的有符号字偏移（结构体 / 列表）
  #[inline]
  pub const fn offset(self) -> i32 {
    (self.lo() as i32) >> 2
  }

  /// Replace the offset, keep kind and payload
  /// 替换偏移，保留类型与负载
  #[inline]
  pub const fn with_offset(self, off: i32) -> Self {
    Self::from_parts(((off as u32) << 2) | (self.lo() & 3), self.hi())
  }

  #[inline]
  pub const fn struct_size(self) -> ObjSize {
    let hi = self.hi();
    ObjSize::new((hi & 0xffff) * WORD, (hi >> 16) as u16)
  }

  #[inline]
  pub const fn elem_size(self) -> ElemSize {
    ElemSize::from_bits(self.hi() as u8)
  }

  /// Element count, or word count for Composite lists
  /// 元素数；Composite 列表为字数
  #[inline]
  pub const fn elem_count(self) -> u32 {
    self.hi() >> 3
  }

  /// Element count stored in a composite list tag
  /// Composite 列表标签中的元素数
  #[inline]
  pub const fn tag_count(self) -> u32 {
    self.lo() >> 2
  }

  #[inline]
  pub const fn is_double_far(self) -> bool {
    (self.lo() >> 2) & 1 != 0
  }

  /// Landing pad position in words / 着陆垫位置（字）
  #[inline]
  pub const fn far_pad(self) -> u32 {
    self.lo() >> 3
  }

  #[inline]
  pub const fn far_seg(self) -> u32 {
    self.hi()
  }

  #[inline]
  pub const fn cap(self) -> u32 {
    self.hi()
  }

  /// Struct pointer, `sz.data_size` must be word aligned
  /// 结构体指针，数据段须按字对齐
  #[inline]
  pub const fn new_struct(off: i32, sz: ObjSize) -> Self {
    Self::from_parts(
      ((off as u32) << 2) | Kind::Struct as u32,
      sz.data_words() as u32 | (sz.ptr_count as u32) << 16,
    )
  }

  /// List pointer, `n` is the word count for Composite
  /// 列表指针，Composite 时 n 为字数
  #[inline]
  pub const fn new_list(off: i32, es: ElemSize, n: u32) -> Self {
    Self::from_parts(
      ((off as u32) << 2) | Kind::List as u32,
      (n << 3) | es.as_u8() as u32,
    )
  }

  /// Composite list tag: element count + element size
  /// Composite 列表标签：元素数 + 元素大小
  #[inline]
  pub const fn new_tag(n: u32, sz: ObjSize) -> Self {
    Self::from_parts(
      (n << 2) | Kind::Struct as u32,
      sz.data_words() as u32 | (sz.ptr_count as u32) << 16,
    )
  }

  #[inline]
  pub const fn new_far(double: bool, pad_word: u32, seg: u32) -> Self {
    Self::from_parts(
      (pad_word << 3) | (double as u32) << 2 | Kind::Far as u32,
      seg,
    )
  }

  #[inline]
  pub const fn new_cap(idx: u32) -> Self {
    Self::from_parts(Kind::Other as u32, idx)
  }
}
