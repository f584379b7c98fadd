//! Versioned deep copy / 版本兼容的深拷贝
//!
//! Source and destination may have different sizes. The common prefix of each
//! section is copied, the rest of the destination is zeroed. Pointers are
//! followed recursively, bounded by the context depth limit.
//! 源与目标大小可以不同：各段公共前缀被拷贝，目标其余部分清零。
//! 指针递归跟随，深度受上下文上限约束。

use std::cell::Cell;

use log::trace;
use zmsg_wire::{ObjSize, RawPtr, WORD};

use crate::{E, R, Struct, write_ptr};

/// Recursion state of one copy / 单次拷贝的递归状态
///
/// `budget` holds the words still allowed; every level shares the same cell.
/// budget 为剩余可拷贝字数，各层共享同一个单元。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyCtx<'b> {
  depth: u32,
  limit: u32,
  budget: &'b Cell<u64>,
}

impl<'b> CopyCtx<'b> {
  #[inline]
  pub const fn new(limit: u32, budget: &'b Cell<u64>) -> Self {
    Self {
      depth: 0,
      limit,
      budget,
    }
  }

  #[inline]
  pub const fn depth(&self) -> u32 {
    self.depth
  }

  #[inline]
  pub const fn limit(&self) -> u32 {
    self.limit
  }

  /// Words left in the budget / 预算剩余字数
  #[inline]
  pub fn remaining(&self) -> u64 {
    self.budget.get()
  }

  /// Context one pointer level deeper / 深入一层指针后的上下文
  pub fn descend(&self) -> R<Self> {
    if self.depth >= self.limit {
      return Err(E::NestingTooDeep(self.limit));
    }
    Ok(Self {
      depth: self.depth + 1,
      ..*self
    })
  }

  /// Take `words` from the budget, at least one per object
  /// 从预算扣除 words 个字，每个对象至少一个
  pub fn charge(&self, words: u64) -> R<()> {
    let words = words.max(1);
    match self.budget.get().checked_sub(words) {
      Some(left) => {
        self.budget.set(left);
        Ok(())
      }
      None => {
        self.budget.set(0);
        Err(E::TraverseLimit)
      }
    }
  }
}

/// Copy `src` into `dst` across schema versions
/// 跨版本将 src 拷贝到 dst
pub fn copy_struct(cc: CopyCtx<'_>, dst: Struct<'_>, src: Struct<'_>) -> R<()> {
  let Some(d_seg) = dst.seg() else {
    return Ok(());
  };
  let ds = dst.size();
  let ss = if src.is_valid() {
    src.size()
  } else {
    ObjSize::default()
  };
  cc.charge(ss.total_size() as u64 / WORD as u64)?;

  let n = ds.data_size.min(ss.data_size);
  if let Some(s_seg) = src.seg() {
    d_seg.copy_from(dst.addr(), s_seg, src.addr(), n);
  }
  d_seg.zero(dst.addr().add(n), ds.data_size - n);

  let ptrs = dst.addr().add(ds.data_size);
  let m = ds.ptr_count.min(ss.ptr_count);
  for j in 0..m {
    let at = ptrs.add(j as u32 * WORD);
    let p = src.try_ptr(j)?;
    if !p.is_valid() {
      d_seg.write_raw(at, RawPtr::NULL);
      continue;
    }
    trace!("zmsg copy ptr {j} ({}), depth {}", p.kind_name(), cc.depth());
    write_ptr(cc.descend()?, d_seg, at, p)?;
  }
  d_seg.zero(ptrs.add(m as u32 * WORD), (ds.ptr_count - m) as u32 * WORD);
  Ok(())
}
