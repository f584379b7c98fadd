//! Decoded pointers and pointer read / write
//! 解码后的指针与指针读写
//!
//! Reading follows far pointers and checks every target against the used part
//! of its segment. Writing copies content that lives in another message (or a
//! list element struct) first, then places a near, far or double-far pointer.
//! 读取时跟随远指针并校验所有目标都位于段的已用部分。
//! 写入时，位于其他消息的内容（或列表元素结构体）先被拷贝，再写近 / 远 / 双远指针。

use zmsg_seg::{Addr, SegId};
use zmsg_wire::{ElemSize, Kind, MAX_LIST_LEN, ObjSize, RawPtr, WORD};

use crate::{CopyCtx, E, List, R, Seg, Struct, StructFlags, copy_struct, list::copy_list};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Ptr<'a> {
  #[default]
  Null,
  Struct(Struct<'a>),
  List(List<'a>),
  /// Capability table index / 能力表索引
  Cap(u32),
}

impl<'a> From<Struct<'a>> for Ptr<'a> {
  fn from(s: Struct<'a>) -> Self {
    Self::Struct(s)
  }
}

impl<'a> From<List<'a>> for Ptr<'a> {
  fn from(l: List<'a>) -> Self {
    Self::List(l)
  }
}

impl<'a> Ptr<'a> {
  #[inline]
  pub fn is_null(&self) -> bool {
    matches!(self, Self::Null)
  }

  /// Non-null and, for structs and lists, backed by a segment
  /// 非空，且结构体与列表有段支撑
  pub fn is_valid(&self) -> bool {
    match self {
      Self::Null => false,
      Self::Struct(s) => s.is_valid(),
      Self::List(l) => l.is_valid(),
      Self::Cap(_) => true,
    }
  }

  pub fn as_struct(&self) -> Option<Struct<'a>> {
    match *self {
      Self::Struct(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<List<'a>> {
    match *self {
      Self::List(l) => Some(l),
      _ => None,
    }
  }

  pub fn kind_name(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Struct(_) => "struct",
      Self::List(_) => "list",
      Self::Cap(_) => "cap",
    }
  }
}

#[inline]
fn near_target(at: Addr, p: RawPtr) -> i64 {
  at.0 as i64 + WORD as i64 + p.offset() as i64 * WORD as i64
}

#[inline]
fn near_offset(from: Addr, to: Addr) -> i32 {
  ((to.0 as i64 - from.0 as i64 - WORD as i64) / WORD as i64) as i32
}

/// Check `[at, at + len)` lies in `seg` / 校验 `[at, at + len)` 位于段内
fn bounded(seg: Seg<'_>, at: i64, len: u64) -> R<Addr> {
  if (0..=u32::MAX as i64).contains(&at) && seg.in_bounds(Addr(at as u32), len) {
    return Ok(Addr(at as u32));
  }
  Err(E::PtrOutOfBounds {
    seg: seg.id().0,
    addr: at,
    len,
  })
}

/// Follow far pointers: (content segment, content-shaped pointer, content address)
/// 跟随远指针：返回（内容所在段，描述内容的指针，内容地址）
fn resolve<'a>(seg: Seg<'a>, at: Addr, p: RawPtr) -> R<(Seg<'a>, RawPtr, i64)> {
  if p.kind() != Kind::Far {
    return Ok((seg, p, near_target(at, p)));
  }
  let msg = seg.msg();
  let pad_seg = msg.seg(SegId(p.far_seg()))?;
  let pad = Addr::from_word(p.far_pad());
  let bad = || E::BadLandingPad {
    seg: p.far_seg(),
    word: p.far_pad(),
  };
  let double = p.is_double_far();
  let pad_len = if double { 2 * WORD } else { WORD };
  if !pad_seg.in_bounds(pad, pad_len as u64) {
    return Err(bad());
  }
  let land = pad_seg.read_raw(pad);
  if !double {
    if land.kind() == Kind::Far {
      return Err(bad());
    }
    return Ok((pad_seg, land, near_target(pad, land)));
  }
  // Double far: a plain far pointer to the content, then the tag
  // 双远指针：先是指向内容的普通远指针，再是标签
  let tag = pad_seg.read_raw(pad.add(WORD));
  if land.kind() != Kind::Far || land.is_double_far() || tag.kind() == Kind::Far {
    return Err(bad());
  }
  let content = msg.seg(SegId(land.far_seg()))?;
  Ok((content, tag, Addr::from_word(land.far_pad()).0 as i64))
}

fn decode_list<'a>(seg: Seg<'a>, p: RawPtr, at: i64) -> R<List<'a>> {
  let es = p.elem_size();
  let n = p.elem_count();
  if es != ElemSize::Composite {
    let off = bounded(seg, at, es.list_bytes(n))?;
    return Ok(List::new(seg, off, n, es, ObjSize::default()));
  }
  let words = n as u64;
  let tag_at = bounded(seg, at, (words + 1) * WORD as u64)?;
  let tag = seg.read_raw(tag_at);
  if tag.kind() != Kind::Struct {
    return Err(E::BadTag(tag.get()));
  }
  let len = tag.tag_count();
  let sz = tag.struct_size();
  if len > MAX_LIST_LEN || len as u64 * sz.total_size() as u64 > words * WORD as u64 {
    return Err(E::BadTag(tag.get()));
  }
  Ok(List::new(seg, tag_at.add(WORD), len, es, sz))
}

/// Decode the pointer word at `(seg, at)` / 解码 `(seg, at)` 处的指针字
pub fn read_ptr<'a>(seg: Seg<'a>, at: Addr) -> R<Ptr<'a>> {
  if !seg.in_bounds(at, WORD as u64) {
    return Err(E::PtrOutOfBounds {
      seg: seg.id().0,
      addr: at.0 as i64,
      len: WORD as u64,
    });
  }
  let p = seg.read_raw(at);
  if p.is_null() {
    return Ok(Ptr::Null);
  }
  let (seg, p, target) = resolve(seg, at, p)?;
  match p.kind() {
    Kind::Struct => {
      let size = p.struct_size();
      let off = bounded(seg, target, size.total_size() as u64)?;
      Ok(Ptr::Struct(Struct::new(seg, off, size, StructFlags::empty())))
    }
    Kind::List => Ok(Ptr::List(decode_list(seg, p, target)?)),
    Kind::Other if p.is_cap() => Ok(Ptr::Cap(p.cap())),
    _ => Err(E::BadPtrKind(p.get())),
  }
}

/// Encode `src` into the pointer slot `(seg, at)`
/// 将 src 编码到指针槽 `(seg, at)`
pub fn write_ptr<'a>(cc: CopyCtx<'_>, seg: Seg<'a>, at: Addr, src: Ptr<'_>) -> R<()> {
  let msg = seg.msg();
  match src {
    Ptr::Null => seg.write_raw(at, RawPtr::NULL),
    Ptr::Cap(i) => seg.write_raw(at, RawPtr::new_cap(i)),
    Ptr::Struct(s) => match s.seg() {
      None => seg.write_raw(at, RawPtr::NULL),
      Some(_) if s.size().is_zero() => seg.write_raw(at, RawPtr::EMPTY_STRUCT),
      Some(s_seg) => {
        let size = s.size();
        let (t_seg, t_addr) =
          if s_seg.same_msg(msg) && !s.flags().contains(StructFlags::LIST_MEMBER) {
            (Seg::new(msg, s_seg.id()), s.addr())
          } else {
            let (t_seg, t_addr) = seg.alloc(size.total_size())?;
            copy_struct(cc, Struct::new(t_seg, t_addr, size, StructFlags::empty()), s)?;
            (t_seg, t_addr)
          };
        place(seg, at, t_seg, t_addr, RawPtr::new_struct(0, size))?;
      }
    },
    Ptr::List(l) => match l.seg() {
      None => seg.write_raw(at, RawPtr::NULL),
      Some(l_seg) => {
        let (t_seg, l) = if l_seg.same_msg(msg) {
          let t_seg = Seg::new(msg, l_seg.id());
          (t_seg, l.rebind(t_seg))
        } else {
          copy_list(cc, seg, l)?
        };
        place(seg, at, t_seg, l.ptr_target(), l.raw())?;
      }
    },
  }
  Ok(())
}

/// Write `p` at `(seg, at)` so it reaches `(t_seg, target)`
/// 在 `(seg, at)` 写入指向 `(t_seg, target)` 的指针
fn place(seg: Seg<'_>, at: Addr, t_seg: Seg<'_>, target: Addr, p: RawPtr) -> R<()> {
  if t_seg == seg {
    seg.write_raw(at, p.with_offset(near_offset(at, target)));
    return Ok(());
  }
  if let Some(pad) = t_seg.alloc_here(WORD)? {
    t_seg.write_raw(pad, p.with_offset(near_offset(pad, target)));
    seg.write_raw(at, RawPtr::new_far(false, pad.word(), t_seg.id().0));
    return Ok(());
  }
  let (pad_seg, pad) = seg.alloc(2 * WORD)?;
  pad_seg.write_raw(pad, RawPtr::new_far(false, target.word(), t_seg.id().0));
  pad_seg.write_raw(pad.add(WORD), p.with_offset(0));
  seg.write_raw(at, RawPtr::new_far(true, pad.word(), pad_seg.id().0));
  Ok(())
}
