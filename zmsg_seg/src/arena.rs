//! Segment arena / 分段内存池
//!
//! Segments never move relative to their ids, so `(SegId, Addr)` stays valid
//! while the arena lives. Each access borrows the segment table only for its
//! own duration. Raw accessors panic on addresses outside the used part of a
//! segment; upper layers validate untrusted addresses with [`Arena::in_bounds`].
//! 段与 ID 的对应关系固定，`(SegId, Addr)` 在内存池存活期间有效。
//! 每次访问只在自身期间借用段表。越界的原始访问会 panic，
//! 上层须先用 [`Arena::in_bounds`] 校验不可信地址。

use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter, Result as FmtResult},
  ptr,
};

use bytes::{Buf, BufMut};
use log::debug;
use zmsg_wire::{RawPtr, WORD, pad_to_word};

use crate::{Addr, Conf, E, MAX_SEG_SIZE, ParsedConf, R, SegId};

struct Seg {
  /// Used bytes, always word aligned / 已用字节，按字对齐
  buf: Vec<u8>,
  /// Logical capacity / 逻辑容量
  cap: u32,
}

impl Seg {
  #[inline]
  fn len(&self) -> u32 {
    self.buf.len() as u32
  }

  #[inline]
  fn has_room(&self, n: u32) -> bool {
    self.len() as u64 + n as u64 <= self.cap as u64
  }
}

pub struct Arena {
  segs: RefCell<Vec<Seg>>,
  total: Cell<u64>,
  conf: ParsedConf,
}

impl Debug for Arena {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Arena")
      .field("segs", &self.seg_count())
      .field("total", &self.total.get())
      .finish()
  }
}

impl Default for Arena {
  fn default() -> Self {
    Self::new(&[])
  }
}

impl Arena {
  /// Empty arena, the first allocation opens segment 0
  /// 空内存池，首次分配时创建 0 号段
  pub fn new(conf: &[Conf]) -> Self {
    Self {
      segs: RefCell::new(Vec::new()),
      total: Cell::new(0),
      conf: ParsedConf::parse(conf),
    }
  }

  /// Wrap existing segments; they are full, new data goes to new segments
  /// 包装已有段；已有段视为满，新数据写入新段
  pub fn from_segs(segs: Vec<Vec<u8>>, conf: &[Conf]) -> R<Self> {
    let mut total = 0u64;
    let mut li = Vec::with_capacity(segs.len());
    for (i, buf) in segs.into_iter().enumerate() {
      if buf.len() % WORD as usize != 0 || buf.len() > MAX_SEG_SIZE as usize {
        return Err(E::Unaligned {
          seg: i as u32,
          len: buf.len(),
        });
      }
      total += buf.len() as u64;
      let cap = buf.len() as u32;
      li.push(Seg { buf, cap });
    }
    Ok(Self {
      segs: RefCell::new(li),
      total: Cell::new(total),
      conf: ParsedConf::parse(conf),
    })
  }

  #[inline]
  pub fn seg_count(&self) -> u32 {
    self.segs.borrow().len() as u32
  }

  #[inline]
  pub fn seg_len(&self, id: SegId) -> Option<u32> {
    self.segs.borrow().get(id.idx()).map(Seg::len)
  }

  /// Bytes allocated so far / 已分配字节数
  #[inline]
  pub fn total(&self) -> u64 {
    self.total.get()
  }

  /// Whether `[addr, addr + len)` lies in the used part of segment `id`
  /// `[addr, addr + len)` 是否位于段的已用部分
  pub fn in_bounds(&self, id: SegId, addr: Addr, len: u64) -> bool {
    self
      .seg_len(id)
      .is_some_and(|n| addr.0 as u64 + len <= n as u64)
  }

  /// Allocate `n` zeroed bytes (rounded to words) in segment `id` only
  /// 仅在段 id 中分配 n 个零字节（按字取整）
  pub fn alloc_in(&self, id: SegId, n: u32) -> Option<Addr> {
    let n = pad_to_word(n)?;
    let total = self.total.get() + n as u64;
    if total > self.conf.max_total {
      return None;
    }
    let mut segs = self.segs.borrow_mut();
    let seg = segs.get_mut(id.idx())?;
    if !seg.has_room(n) {
      return None;
    }
    let addr = Addr(seg.len());
    seg.buf.resize(seg.buf.len() + n as usize, 0);
    self.total.set(total);
    Some(addr)
  }

  /// Allocate `n` zeroed bytes, preferring segment `pref`
  /// 分配 n 个零字节，优先使用段 pref
  pub fn alloc(&self, pref: SegId, n: u32) -> R<(SegId, Addr)> {
    let n = pad_to_word(n).ok_or(E::TooLarge(n as u64))?;
    if n > MAX_SEG_SIZE {
      return Err(E::TooLarge(n as u64));
    }
    let need = self.total.get() + n as u64;
    if need > self.conf.max_total {
      return Err(E::Full {
        need,
        limit: self.conf.max_total,
      });
    }
    if let Some(addr) = self.alloc_in(pref, n) {
      return Ok((pref, addr));
    }
    let count = self.seg_count();
    if count > 0 {
      let last = SegId(count - 1);
      if last != pref
        && let Some(addr) = self.alloc_in(last, n)
      {
        return Ok((last, addr));
      }
    }
    let id = self.open_seg(n);
    let addr = self.alloc_in(id, n).ok_or(E::TooLarge(n as u64))?;
    Ok((id, addr))
  }

  /// Open a segment big enough for `n` bytes / 打开可容纳 n 字节的新段
  fn open_seg(&self, n: u32) -> SegId {
    let mut segs = self.segs.borrow_mut();
    let grow = match segs.last() {
      Some(last) => last.cap.saturating_mul(2),
      None => self.conf.first_seg_size,
    };
    let cap = grow.max(n).min(MAX_SEG_SIZE);
    let id = SegId(segs.len() as u32);
    segs.push(Seg {
      buf: Vec::with_capacity(cap as usize),
      cap,
    });
    debug!("zmsg seg open: id={}, cap={cap}", id.0);
    id
  }

  #[inline]
  fn with<T>(&self, id: SegId, addr: Addr, f: impl FnOnce(&[u8]) -> T) -> T {
    let segs = self.segs.borrow();
    f(&segs[id.idx()].buf[addr.idx()..])
  }

  #[inline]
  fn with_mut(&self, id: SegId, addr: Addr, f: impl FnOnce(&mut [u8])) {
    let mut segs = self.segs.borrow_mut();
    f(&mut segs[id.idx()].buf[addr.idx()..])
  }

  #[inline]
  pub fn read_u8(&self, id: SegId, addr: Addr) -> u8 {
    self.with(id, addr, |mut b| b.get_u8())
  }

  #[inline]
  pub fn read_u16(&self, id: SegId, addr: Addr) -> u16 {
    self.with(id, addr, |mut b| b.get_u16_le())
  }

  #[inline]
  pub fn read_u32(&self, id: SegId, addr: Addr) -> u32 {
    self.with(id, addr, |mut b| b.get_u32_le())
  }

  #[inline]
  pub fn read_u64(&self, id: SegId, addr: Addr) -> u64 {
    self.with(id, addr, |mut b| b.get_u64_le())
  }

  #[inline]
  pub fn write_u8(&self, id: SegId, addr: Addr, v: u8) {
    self.with_mut(id, addr, |mut b| b.put_u8(v))
  }

  #[inline]
  pub fn write_u16(&self, id: SegId, addr: Addr, v: u16) {
    self.with_mut(id, addr, |mut b| b.put_u16_le(v))
  }

  #[inline]
  pub fn write_u32(&self, id: SegId, addr: Addr, v: u32) {
    self.with_mut(id, addr, |mut b| b.put_u32_le(v))
  }

  #[inline]
  pub fn write_u64(&self, id: SegId, addr: Addr, v: u64) {
    self.with_mut(id, addr, |mut b| b.put_u64_le(v))
  }

  /// Read a pointer word, a short tail reads as null
  /// 读取指针字，不足 8 字节的尾部读作空
  #[inline]
  pub fn read_ptr(&self, id: SegId, addr: Addr) -> RawPtr {
    self.with(id, addr, RawPtr::decode).unwrap_or_default()
  }

  /// Write a pointer word / 写入指针字
  #[inline]
  pub fn write_ptr(&self, id: SegId, addr: Addr, p: RawPtr) {
    self.with_mut(id, addr, |b| p.encode(b))
  }

  /// Zero `n` bytes / 清零 n 字节
  pub fn zero(&self, id: SegId, addr: Addr, n: u32) {
    if n == 0 {
      return;
    }
    self.with_mut(id, addr, |b| b[..n as usize].fill(0))
  }

  /// Copy `n` bytes from `(src_arena, src, src_addr)` to `(dst, dst_addr)`
  /// 从源内存池拷贝 n 字节到本内存池
  pub fn copy(
    &self,
    dst: SegId,
    dst_addr: Addr,
    src_arena: &Arena,
    src: SegId,
    src_addr: Addr,
    n: u32,
  ) {
    if n == 0 {
      return;
    }
    let (d, s, n) = (dst_addr.idx(), src_addr.idx(), n as usize);
    if !ptr::eq(self, src_arena) {
      let from = src_arena.segs.borrow();
      let mut to = self.segs.borrow_mut();
      to[dst.idx()].buf[d..d + n].copy_from_slice(&from[src.idx()].buf[s..s + n]);
      return;
    }
    let mut segs = self.segs.borrow_mut();
    if dst == src {
      segs[dst.idx()].buf.copy_within(s..s + n, d);
      return;
    }
    let (to, from) = if dst.idx() < src.idx() {
      let (l, r) = segs.split_at_mut(src.idx());
      (&mut l[dst.idx()], &r[0])
    } else {
      let (l, r) = segs.split_at_mut(dst.idx());
      (&mut r[0], &l[src.idx()])
    };
    to.buf[d..d + n].copy_from_slice(&from.buf[s..s + n]);
  }

  /// Copy of one segment's used bytes / 单段已用字节的拷贝
  pub fn seg_bytes(&self, id: SegId) -> Option<Vec<u8>> {
    self.segs.borrow().get(id.idx()).map(|s| s.buf.clone())
  }

  /// Take all segments / 取出全部段
  pub fn into_segs(self) -> Vec<Vec<u8>> {
    self
      .segs
      .into_inner()
      .into_iter()
      .map(|s| s.buf)
      .collect()
  }
}
