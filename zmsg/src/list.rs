//! List view / 列表视图
//!
//! Primitive lists pack elements back to back. Composite lists start with a
//! tag word (element count + struct size) followed by the element structs.
//! 基本类型列表元素紧密排列。组合列表以标签字（元素数 + 结构体大小）开头，后接元素结构体。

use std::cell::Cell;

use log::warn;
use zmsg_seg::Addr;
use zmsg_wire::{ElemSize, MAX_LIST_LEN, ObjSize, RawPtr, WORD};

use crate::{CopyCtx, E, Ptr, R, Seg, Struct, StructFlags, copy_struct, read_ptr, write_ptr};

#[cold]
#[track_caller]
fn out_of_range(what: &str, i: u32, len: u32, es: ElemSize) -> ! {
  panic!("zmsg list {what} {i} out of range (len {len}, {es:?})")
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct List<'a> {
  seg: Option<Seg<'a>>,
  /// First element, after the tag for composite lists
  /// 首元素地址，组合列表位于标签之后
  off: Addr,
  len: u32,
  es: ElemSize,
  /// Element size of composite lists / 组合列表的元素大小
  sz: ObjSize,
}

impl<'a> List<'a> {
  #[inline]
  pub(crate) fn new(seg: Seg<'a>, off: Addr, len: u32, es: ElemSize, sz: ObjSize) -> Self {
    Self {
      seg: Some(seg),
      off,
      len,
      es,
      sz,
    }
  }

  /// Same list seen through another handle of the same message
  /// 经同一消息的另一句柄看到的同一列表
  #[inline]
  pub(crate) fn rebind<'b>(&self, seg: Seg<'b>) -> List<'b> {
    List {
      seg: Some(seg),
      off: self.off,
      len: self.len,
      es: self.es,
      sz: self.sz,
    }
  }

  /// Allocate a zeroed primitive or pointer list
  /// 分配清零的基本类型或指针列表
  #[track_caller]
  pub fn alloc(seg: Seg<'a>, es: ElemSize, len: u32) -> R<Self> {
    if es == ElemSize::Composite {
      panic!("zmsg list alloc: composite lists need alloc_composite");
    }
    if len > MAX_LIST_LEN {
      return Err(E::ListTooLong(len as u64));
    }
    let bytes = u32::try_from(es.list_bytes(len)).map_err(|_| E::ListTooLong(len as u64))?;
    let (seg, off) = seg.alloc(bytes)?;
    Ok(Self::new(seg, off, len, es, ObjSize::default()))
  }

  /// Allocate a zeroed list of `len` structs of size `sz`
  /// 分配 len 个大小为 sz 的清零结构体列表
  pub fn alloc_composite(seg: Seg<'a>, sz: ObjSize, len: u32) -> R<Self> {
    if !sz.is_valid() {
      return Err(E::InvalidSize {
        data_size: sz.data_size,
        ptr_count: sz.ptr_count,
      });
    }
    let sz = sz.padded();
    let words = len as u64 * (sz.total_size() / WORD) as u64;
    if len > MAX_LIST_LEN || words > MAX_LIST_LEN as u64 {
      return Err(E::ListTooLong(len as u64));
    }
    let bytes =
      u32::try_from((words + 1) * WORD as u64).map_err(|_| E::ListTooLong(len as u64))?;
    let (seg, tag) = seg.alloc(bytes)?;
    seg.write_raw(tag, RawPtr::new_tag(len, sz));
    Ok(Self::new(seg, tag.add(WORD), len, ElemSize::Composite, sz))
  }

  #[inline]
  pub fn seg(&self) -> Option<Seg<'a>> {
    self.seg
  }

  #[inline]
  pub fn is_valid(&self) -> bool {
    self.seg.is_some()
  }

  #[inline]
  pub fn len(&self) -> u32 {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub fn elem_size(&self) -> ElemSize {
    self.es
  }

  #[inline]
  pub fn struct_size(&self) -> ObjSize {
    self.sz
  }

  /// Bytes between consecutive elements (0 for bit lists)
  /// 相邻元素间距字节数（位列表为 0）
  #[inline]
  fn stride(&self) -> u32 {
    match self.es {
      ElemSize::Composite => self.sz.total_size(),
      es => es.bits() / 8,
    }
  }

  /// Byte length of the content, excluding the tag
  /// 内容字节数，不含标签
  fn content_bytes(&self) -> u32 {
    match self.es {
      ElemSize::Composite => self.len * self.sz.total_size(),
      es => es.list_bytes(self.len) as u32,
    }
  }

  /// Pointer word describing this list, offset zero
  /// 描述本列表的指针字，偏移为零
  pub(crate) fn raw(&self) -> RawPtr {
    match self.es {
      ElemSize::Composite => RawPtr::new_list(0, self.es, self.content_bytes() / WORD),
      es => RawPtr::new_list(0, es, self.len),
    }
  }

  /// Where a pointer to this list points / 指向本列表的指针的目标地址
  pub(crate) fn ptr_target(&self) -> Addr {
    match self.es {
      ElemSize::Composite => Addr(self.off.0 - WORD),
      _ => self.off,
    }
  }

  /// Element `i` readable as `width` bytes of data
  /// 第 i 个元素可按 width 字节读取数据
  fn elem_addr(&self, i: u32, width: u32) -> Option<(Seg<'a>, Addr)> {
    let seg = self.seg?;
    let data = match self.es {
      ElemSize::Composite => self.sz.data_size,
      ElemSize::Ptr | ElemSize::Bit | ElemSize::Void => 0,
      es => es.bits() / 8,
    };
    (i < self.len && width <= data).then(|| (seg, self.off.element(i, self.stride())))
  }

  #[track_caller]
  fn elem_addr_mut(&self, i: u32, width: u32) -> (Seg<'a>, Addr) {
    match self.elem_addr(i, width) {
      Some(r) => r,
      None => out_of_range("element", i, self.len, self.es),
    }
  }

  #[inline]
  pub fn u8(&self, i: u32) -> u8 {
    self.elem_addr(i, 1).map_or(0, |(s, a)| s.read_u8(a))
  }

  #[inline]
  pub fn u16(&self, i: u32) -> u16 {
    self.elem_addr(i, 2).map_or(0, |(s, a)| s.read_u16(a))
  }

  #[inline]
  pub fn u32(&self, i: u32) -> u32 {
    self.elem_addr(i, 4).map_or(0, |(s, a)| s.read_u32(a))
  }

  #[inline]
  pub fn u64(&self, i: u32) -> u64 {
    self.elem_addr(i, 8).map_or(0, |(s, a)| s.read_u64(a))
  }

  #[track_caller]
  pub fn set_u8(&self, i: u32, v: u8) {
    let (s, a) = self.elem_addr_mut(i, 1);
    s.write_u8(a, v)
  }

  #[track_caller]
  pub fn set_u16(&self, i: u32, v: u16) {
    let (s, a) = self.elem_addr_mut(i, 2);
    s.write_u16(a, v)
  }

  #[track_caller]
  pub fn set_u32(&self, i: u32, v: u32) {
    let (s, a) = self.elem_addr_mut(i, 4);
    s.write_u32(a, v)
  }

  #[track_caller]
  pub fn set_u64(&self, i: u32, v: u64) {
    let (s, a) = self.elem_addr_mut(i, 8);
    s.write_u64(a, v)
  }

  fn bit_addr(&self, i: u32) -> Option<(Seg<'a>, Addr)> {
    let seg = self.seg?;
    (self.es == ElemSize::Bit && i < self.len).then(|| (seg, self.off.add(i / 8)))
  }

  #[inline]
  pub fn bit(&self, i: u32) -> bool {
    self
      .bit_addr(i)
      .is_some_and(|(s, a)| s.read_u8(a) & (1 << (i % 8)) != 0)
  }

  #[track_caller]
  pub fn set_bit(&self, i: u32, v: bool) {
    let (s, a) = match self.bit_addr(i) {
      Some(r) => r,
      None => out_of_range("bit", i, self.len, self.es),
    };
    let m = 1u8 << (i % 8);
    let b = s.read_u8(a);
    s.write_u8(a, if v { b | m } else { b & !m })
  }

  fn slot(&self, i: u32) -> Option<(Seg<'a>, Addr)> {
    let seg = self.seg?;
    (self.es == ElemSize::Ptr && i < self.len).then(|| (seg, self.off.element(i, WORD)))
  }

  /// Pointer element `i`; out of range or malformed reads as null
  /// 第 i 个指针元素；越界或数据损坏时为空
  pub fn ptr_at(&self, i: u32) -> Ptr<'a> {
    match self.try_ptr_at(i) {
      Ok(p) => p,
      Err(e) => {
        warn!("zmsg list ptr {i}: {e}");
        Ptr::Null
      }
    }
  }

  pub fn try_ptr_at(&self, i: u32) -> R<Ptr<'a>> {
    match self.slot(i) {
      Some((s, a)) => read_ptr(s, a),
      None => Ok(Ptr::Null),
    }
  }

  #[track_caller]
  pub fn set_ptr_at(&self, i: u32, p: Ptr<'_>) -> R<()> {
    let (s, a) = match self.slot(i) {
      Some(r) => r,
      None => out_of_range("ptr", i, self.len, self.es),
    };
    let budget = Cell::new(s.msg().traverse_limit());
    write_ptr(CopyCtx::new(s.msg().copy_depth(), &budget), s, a, p)
  }

  /// Struct element `i` of a composite list, absent when out of range
  /// 组合列表的第 i 个结构体元素，越界时为空
  pub fn struct_at(&self, i: u32) -> Struct<'a> {
    match self.seg {
      Some(seg) if self.es == ElemSize::Composite && i < self.len => {
        Struct::new(seg, self.off.element(i, self.stride()), self.sz, StructFlags::LIST_MEMBER)
      }
      _ => Struct::default(),
    }
  }
}

/// Deep copy `src` into the message of `seg`
/// 将 src 深拷贝到 seg 所在消息
pub(crate) fn copy_list<'a>(
  cc: CopyCtx<'_>,
  seg: Seg<'a>,
  src: List<'_>,
) -> R<(Seg<'a>, List<'a>)> {
  let Some(s_seg) = src.seg else {
    return Ok((seg, List::default()));
  };
  // Composite elements are charged one by one in copy_struct, here only the tag
  // 组合列表元素在 copy_struct 中逐个扣减，这里只扣标签
  cc.charge(match src.es {
    ElemSize::Composite => 1,
    _ => (src.content_bytes() as u64).div_ceil(WORD as u64),
  })?;
  let dst = match src.es {
    ElemSize::Composite => {
      let dst = List::alloc_composite(seg, src.sz, src.len)?;
      for i in 0..src.len {
        copy_struct(cc, dst.struct_at(i), src.struct_at(i))?;
      }
      dst
    }
    ElemSize::Ptr => {
      let dst = List::alloc(seg, ElemSize::Ptr, src.len)?;
      for i in 0..src.len {
        let p = src.try_ptr_at(i)?;
        if let Some((d, a)) = dst.slot(i)
          && p.is_valid()
        {
          write_ptr(cc.descend()?, d, a, p)?;
        }
      }
      dst
    }
    es => {
      let dst = List::alloc(seg, es, src.len)?;
      if let Some(d) = dst.seg {
        d.copy_from(dst.off, s_seg, src.off, dst.content_bytes());
      }
      dst
    }
  };
  Ok((dst.seg.unwrap_or(seg), dst))
}
