//! Message: arena + root pointer / 消息：内存池 + 根指针

use std::cell::Cell;

use log::{debug, warn};
use zmsg_seg::{Addr, Arena, SegId};
use zmsg_wire::WORD;

use crate::{Conf, CopyCtx, E, ParsedConf, Ptr, R, Seg, Struct, read_ptr, write_ptr};

/// Root pointer address / 根指针地址
const ROOT: Addr = Addr(0);

/// A message owns every segment; views borrow it. Not `Sync`, see the crate
/// docs for reading from several threads.
/// 消息持有全部段，视图借用消息。非 `Sync`，多线程读取见 crate 文档。
#[derive(Debug)]
pub struct Msg {
  arena: Arena,
  copy_depth: u32,
  traverse_limit: u64,
  sealed: Cell<bool>,
}

impl Msg {
  /// New message, segment 0 starts with the root pointer word
  /// 新消息，0 号段以根指针字开头
  pub fn new(conf: &[Conf]) -> R<Self> {
    let c = ParsedConf::parse(conf);
    let arena = Arena::new(&c.seg);
    arena.alloc(SegId(0), WORD)?;
    Ok(Self {
      arena,
      copy_depth: c.copy_depth,
      traverse_limit: c.traverse_limit,
      sealed: Cell::new(false),
    })
  }

  /// Read existing segments / 读取已有段
  pub fn from_segs(segs: Vec<Vec<u8>>, conf: &[Conf]) -> R<Self> {
    if segs.is_empty() {
      return Err(E::BadSegId(0));
    }
    let c = ParsedConf::parse(conf);
    Ok(Self {
      arena: Arena::from_segs(segs, &c.seg)?,
      copy_depth: c.copy_depth,
      traverse_limit: c.traverse_limit,
      sealed: Cell::new(false),
    })
  }

  #[inline]
  pub fn arena(&self) -> &Arena {
    &self.arena
  }

  #[inline]
  pub fn copy_depth(&self) -> u32 {
    self.copy_depth
  }

  /// Words one copy into this message may charge / 单次拷贝入本消息可扣减的字数
  #[inline]
  pub fn traverse_limit(&self) -> u64 {
    self.traverse_limit
  }

  #[inline]
  pub fn seg_count(&self) -> u32 {
    self.arena.seg_count()
  }

  pub fn seg(&self, id: SegId) -> R<Seg<'_>> {
    if id.0 < self.arena.seg_count() {
      Ok(Seg::new(self, id))
    } else {
      Err(E::BadSegId(id.0))
    }
  }

  /// Segment 0, present in every message / 0 号段，每个消息都有
  #[inline]
  pub fn first_seg(&self) -> Seg<'_> {
    Seg::new(self, SegId(0))
  }

  fn check_root(&self) -> R<Seg<'_>> {
    let seg = self.first_seg();
    if seg.in_bounds(ROOT, WORD as u64) {
      Ok(seg)
    } else {
      Err(E::PtrOutOfBounds {
        seg: 0,
        addr: 0,
        len: WORD as u64,
      })
    }
  }

  pub fn root(&self) -> R<Ptr<'_>> {
    read_ptr(self.check_root()?, ROOT)
  }

  /// Root as a struct, absent on any decode failure
  /// 根结构体，解码失败时为空
  pub fn root_struct(&self) -> Struct<'_> {
    match self.root() {
      Ok(p) => Struct::from_ptr(p),
      Err(e) => {
        warn!("zmsg root: {e}");
        Struct::default()
      }
    }
  }

  /// Point the root at `p`, copying it in when it lives elsewhere
  /// 将根指向 p，位于其他消息时先拷贝
  pub fn set_root(&self, p: Ptr<'_>) -> R<()> {
    if self.sealed.get() {
      return Err(E::Sealed);
    }
    let seg = self.check_root()?;
    let budget = Cell::new(self.traverse_limit);
    write_ptr(CopyCtx::new(self.copy_depth, &budget), seg, ROOT, p)?;
    debug!("zmsg root set: {}", p.kind_name());
    Ok(())
  }

  /// Forbid further allocation and root changes; in-place writes still work
  /// 禁止后续分配与根修改；原地写入仍可用
  pub fn seal(&self) {
    self.sealed.set(true);
  }

  #[inline]
  pub fn is_sealed(&self) -> bool {
    self.sealed.get()
  }

  pub(crate) fn alloc(&self, pref: SegId, n: u32) -> R<(SegId, Addr)> {
    if self.sealed.get() {
      return Err(E::Sealed);
    }
    Ok(self.arena.alloc(pref, n)?)
  }

  pub(crate) fn alloc_in(&self, id: SegId, n: u32) -> R<Option<Addr>> {
    if self.sealed.get() {
      return Err(E::Sealed);
    }
    Ok(self.arena.alloc_in(id, n))
  }

  pub fn into_segs(self) -> Vec<Vec<u8>> {
    self.arena.into_segs()
  }
}
