//! Segment handle: message reference + segment id
//! 段句柄：消息引用 + 段 ID

use std::{
  fmt::{Debug, Formatter, Result as FmtResult},
  ptr,
};

use zmsg_seg::{Addr, SegId};
use zmsg_wire::RawPtr;

use crate::{Msg, R};

#[derive(Clone, Copy)]
pub struct Seg<'a> {
  msg: &'a Msg,
  id: SegId,
}

impl Debug for Seg<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Seg")
      .field("msg", &ptr::from_ref(self.msg))
      .field("id", &self.id.0)
      .finish()
  }
}

impl PartialEq for Seg<'_> {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id && ptr::eq(self.msg, other.msg)
  }
}

impl Eq for Seg<'_> {}

impl<'a> Seg<'a> {
  #[inline]
  pub(crate) fn new(msg: &'a Msg, id: SegId) -> Self {
    Self { msg, id }
  }

  #[inline]
  pub fn msg(self) -> &'a Msg {
    self.msg
  }

  #[inline]
  pub fn id(self) -> SegId {
    self.id
  }

  #[inline]
  pub fn same_msg(self, msg: &Msg) -> bool {
    ptr::eq(self.msg, msg)
  }

  /// Used bytes / 已用字节数
  #[inline]
  pub fn len(self) -> u32 {
    self.msg.arena().seg_len(self.id).unwrap_or(0)
  }

  #[inline]
  pub fn is_empty(self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn in_bounds(self, addr: Addr, len: u64) -> bool {
    self.msg.arena().in_bounds(self.id, addr, len)
  }

  #[inline]
  pub fn read_u8(self, addr: Addr) -> u8 {
    self.msg.arena().read_u8(self.id, addr)
  }

  #[inline]
  pub fn read_u16(self, addr: Addr) -> u16 {
    self.msg.arena().read_u16(self.id, addr)
  }

  #[inline]
  pub fn read_u32(self, addr: Addr) -> u32 {
    self.msg.arena().read_u32(self.id, addr)
  }

  #[inline]
  pub fn read_u64(self, addr: Addr) -> u64 {
    self.msg.arena().read_u64(self.id, addr)
  }

  #[inline]
  pub fn write_u8(self, addr: Addr, v: u8) {
    self.msg.arena().write_u8(self.id, addr, v)
  }

  #[inline]
  pub fn write_u16(self, addr: Addr, v: u16) {
    self.msg.arena().write_u16(self.id, addr, v)
  }

  #[inline]
  pub fn write_u32(self, addr: Addr, v: u32) {
    self.msg.arena().write_u32(self.id, addr, v)
  }

  #[inline]
  pub fn write_u64(self, addr: Addr, v: u64) {
    self.msg.arena().write_u64(self.id, addr, v)
  }

  #[inline]
  pub fn read_raw(self, addr: Addr) -> RawPtr {
    self.msg.arena().read_ptr(self.id, addr)
  }

  #[inline]
  pub fn write_raw(self, addr: Addr, p: RawPtr) {
    self.msg.arena().write_ptr(self.id, addr, p)
  }

  #[inline]
  pub fn zero(self, addr: Addr, n: u32) {
    self.msg.arena().zero(self.id, addr, n)
  }

  /// Copy `n` bytes from another segment, possibly of another message
  /// 从另一个段（可属于其他消息）拷贝 n 字节
  #[inline]
  pub fn copy_from(self, addr: Addr, src: Seg<'_>, src_addr: Addr, n: u32) {
    self
      .msg
      .arena()
      .copy(self.id, addr, src.msg.arena(), src.id, src_addr, n)
  }

  /// Allocate zeroed bytes, here if possible, else anywhere in the message
  /// 分配零字节，优先本段，否则消息内任意段
  pub fn alloc(self, n: u32) -> R<(Seg<'a>, Addr)> {
    let (id, addr) = self.msg.alloc(self.id, n)?;
    Ok((Self::new(self.msg, id), addr))
  }

  /// Allocate in this segment only / 仅在本段分配
  #[inline]
  pub fn alloc_here(self, n: u32) -> R<Option<Addr>> {
    self.msg.alloc_in(self.id, n)
  }
}
