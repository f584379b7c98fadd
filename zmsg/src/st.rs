//! Struct overlay / 结构体视图
//!
//! Layout at `off`: data section (`data_size` bytes), then `ptr_count` pointer
//! slots of 8 bytes. Reads outside either section return zero values, so a
//! reader built against a newer schema sees defaults for missing fields.
//! Writes outside the struct's own size panic.
//! `off` 处布局：数据段（`data_size` 字节），随后是 `ptr_count` 个 8 字节指针槽。
//! 越界读取返回零值，新版本读取旧数据时缺失字段即为默认值。越界写入 panic。

use std::cell::Cell;

use log::warn;
use zmsg_seg::Addr;
use zmsg_wire::{ObjSize, WORD};

use crate::{CopyCtx, E, Ptr, R, Seg, Tmpl, copy_struct, read_ptr, write_ptr};

/// Byte offset into the data section / 数据段内字节偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DataOffset(pub u32);

/// Bit offset into the data section / 数据段内位偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BitOffset(pub u32);

impl BitOffset {
  /// Byte holding the bit / 所在字节
  #[inline]
  pub const fn offset(self) -> DataOffset {
    DataOffset(self.0 / 8)
  }

  #[inline]
  pub const fn mask(self) -> u8 {
    1 << (self.0 % 8)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StructFlags(u8);

impl StructFlags {
  /// Element of a composite list / 组合列表的元素
  pub const LIST_MEMBER: Self = Self(1);

  #[inline]
  pub const fn empty() -> Self {
    Self(0)
  }

  #[inline]
  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }
}

#[cold]
#[track_caller]
fn out_of_range(what: &str, at: u64, size: ObjSize) -> ! {
  panic!(
    "zmsg struct {what} {at} out of range (data {} bytes, {} ptrs)",
    size.data_size, size.ptr_count
  )
}

/// View of one struct; `Struct::default()` is the absent struct
/// 单个结构体的视图；`Struct::default()` 表示不存在
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Struct<'a> {
  seg: Option<Seg<'a>>,
  off: Addr,
  size: ObjSize,
  flags: StructFlags,
}

impl<'a> Struct<'a> {
  #[inline]
  pub(crate) fn new(seg: Seg<'a>, off: Addr, size: ObjSize, flags: StructFlags) -> Self {
    Self {
      seg: Some(seg),
      off,
      size,
      flags,
    }
  }

  /// Allocate a zeroed struct, preferring `seg`
  /// 分配清零的结构体，优先使用 seg
  pub fn alloc(seg: Seg<'a>, size: ObjSize) -> R<Self> {
    if !size.is_valid() {
      return Err(E::InvalidSize {
        data_size: size.data_size,
        ptr_count: size.ptr_count,
      });
    }
    let size = size.padded();
    let (seg, off) = seg.alloc(size.total_size())?;
    Ok(Self::new(seg, off, size, StructFlags::empty()))
  }

  /// Allocate and make it the message root / 分配并设为消息根
  pub fn alloc_root(seg: Seg<'a>, size: ObjSize) -> R<Self> {
    let s = Self::alloc(seg, size)?;
    seg.msg().set_root(s.into())?;
    Ok(s)
  }

  #[inline]
  pub fn from_ptr(p: Ptr<'a>) -> Self {
    match p {
      Ptr::Struct(s) => s,
      _ => Self::default(),
    }
  }

  /// `p` if it is a struct, else the template's struct
  /// p 为结构体时返回它，否则返回模板结构体
  pub fn from_ptr_or(p: Ptr<'a>, tmpl: &'a Tmpl) -> R<Self> {
    match p {
      Ptr::Struct(s) if s.is_valid() => Ok(s),
      _ => tmpl.get(),
    }
  }

  #[inline]
  pub fn seg(&self) -> Option<Seg<'a>> {
    self.seg
  }

  #[inline]
  pub fn addr(&self) -> Addr {
    self.off
  }

  #[inline]
  pub fn size(&self) -> ObjSize {
    self.size
  }

  #[inline]
  pub fn flags(&self) -> StructFlags {
    self.flags
  }

  /// Backed by a segment, zero-sized structs included
  /// 有段支撑，包括零大小结构体
  #[inline]
  pub fn is_valid(&self) -> bool {
    self.seg.is_some()
  }

  /// Non-zero size / 大小非零
  #[inline]
  pub fn has_data(&self) -> bool {
    !self.size.is_zero()
  }

  fn data_addr(&self, off: u32, width: u32) -> Option<(Seg<'a>, Addr)> {
    let seg = self.seg?;
    (off as u64 + width as u64 <= self.size.data_size as u64).then(|| (seg, self.off.add(off)))
  }

  #[track_caller]
  fn data_addr_mut(&self, off: u32, width: u32) -> (Seg<'a>, Addr) {
    match self.data_addr(off, width) {
      Some(r) => r,
      None => out_of_range("data offset", off as u64, self.size),
    }
  }

  fn ptr_addr(&self, i: u16) -> Option<(Seg<'a>, Addr)> {
    let seg = self.seg?;
    (i < self.size.ptr_count).then(|| (seg, self.off.add(self.size.data_size + i as u32 * WORD)))
  }

  #[inline]
  pub fn u8(&self, off: DataOffset) -> u8 {
    self.data_addr(off.0, 1).map_or(0, |(s, a)| s.read_u8(a))
  }

  #[inline]
  pub fn u16(&self, off: DataOffset) -> u16 {
    self.data_addr(off.0, 2).map_or(0, |(s, a)| s.read_u16(a))
  }

  #[inline]
  pub fn u32(&self, off: DataOffset) -> u32 {
    self.data_addr(off.0, 4).map_or(0, |(s, a)| s.read_u32(a))
  }

  #[inline]
  pub fn u64(&self, off: DataOffset) -> u64 {
    self.data_addr(off.0, 8).map_or(0, |(s, a)| s.read_u64(a))
  }

  #[track_caller]
  pub fn set_u8(&self, off: DataOffset, v: u8) {
    let (s, a) = self.data_addr_mut(off.0, 1);
    s.write_u8(a, v)
  }

  #[track_caller]
  pub fn set_u16(&self, off: DataOffset, v: u16) {
    let (s, a) = self.data_addr_mut(off.0, 2);
    s.write_u16(a, v)
  }

  #[track_caller]
  pub fn set_u32(&self, off: DataOffset, v: u32) {
    let (s, a) = self.data_addr_mut(off.0, 4);
    s.write_u32(a, v)
  }

  #[track_caller]
  pub fn set_u64(&self, off: DataOffset, v: u64) {
    let (s, a) = self.data_addr_mut(off.0, 8);
    s.write_u64(a, v)
  }

  #[inline]
  pub fn i8(&self, off: DataOffset) -> i8 {
    self.u8(off) as i8
  }

  #[inline]
  pub fn i16(&self, off: DataOffset) -> i16 {
    self.u16(off) as i16
  }

  #[inline]
  pub fn i32(&self, off: DataOffset) -> i32 {
    self.u32(off) as i32
  }

  #[inline]
  pub fn i64(&self, off: DataOffset) -> i64 {
    self.u64(off) as i64
  }

  #[inline]
  pub fn f32(&self, off: DataOffset) -> f32 {
    f32::from_bits(self.u32(off))
  }

  #[inline]
  pub fn f64(&self, off: DataOffset) -> f64 {
    f64::from_bits(self.u64(off))
  }

  #[track_caller]
  pub fn set_i8(&self, off: DataOffset, v: i8) {
    self.set_u8(off, v as u8)
  }

  #[track_caller]
  pub fn set_i16(&self, off: DataOffset, v: i16) {
    self.set_u16(off, v as u16)
  }

  #[track_caller]
  pub fn set_i32(&self, off: DataOffset, v: i32) {
    self.set_u32(off, v as u32)
  }

  #[track_caller]
  pub fn set_i64(&self, off: DataOffset, v: i64) {
    self.set_u64(off, v as u64)
  }

  #[track_caller]
  pub fn set_f32(&self, off: DataOffset, v: f32) {
    self.set_u32(off, v.to_bits())
  }

  #[track_caller]
  pub fn set_f64(&self, off: DataOffset, v: f64) {
    self.set_u64(off, v.to_bits())
  }

  #[inline]
  pub fn bit(&self, n: BitOffset) -> bool {
    self.u8(n.offset()) & n.mask() != 0
  }

  #[track_caller]
  pub fn set_bit(&self, n: BitOffset, v: bool) {
    let (s, a) = match self.data_addr(n.offset().0, 1) {
      Some(r) => r,
      None => out_of_range("bit", n.0 as u64, self.size),
    };
    let b = s.read_u8(a);
    s.write_u8(a, if v { b | n.mask() } else { b & !n.mask() })
  }

  /// Pointer slot `i`; out of range or malformed reads as null
  /// 第 i 个指针槽；越界或数据损坏时为空
  pub fn ptr(&self, i: u16) -> Ptr<'a> {
    match self.try_ptr(i) {
      Ok(p) => p,
      Err(e) => {
        warn!("zmsg struct ptr {i}: {e}");
        Ptr::Null
      }
    }
  }

  /// Pointer slot `i`; out of range is null, malformed data is an error
  /// 第 i 个指针槽；越界为空，数据损坏返回错误
  pub fn try_ptr(&self, i: u16) -> R<Ptr<'a>> {
    match self.ptr_addr(i) {
      Some((s, a)) => read_ptr(s, a),
      None => Ok(Ptr::Null),
    }
  }

  /// Set pointer slot `i`, copying content from other messages
  /// 设置第 i 个指针槽，其他消息的内容会被拷贝
  #[track_caller]
  pub fn set_ptr(&self, i: u16, p: Ptr<'_>) -> R<()> {
    let (s, a) = match self.ptr_addr(i) {
      Some(r) => r,
      None => out_of_range("ptr slot", i as u64, self.size),
    };
    let budget = Cell::new(s.msg().traverse_limit());
    write_ptr(CopyCtx::new(s.msg().copy_depth(), &budget), s, a, p)
  }

  /// Versioned copy of `src` into `self` / 将 src 按版本兼容方式拷贝到自身
  pub fn copy_from(&self, src: Struct<'_>) -> R<()> {
    let Some(s) = self.seg else {
      return Ok(());
    };
    let budget = Cell::new(s.msg().traverse_limit());
    copy_struct(CopyCtx::new(s.msg().copy_depth(), &budget), *self, src)
  }
}
