//! 错误定义 Error definitions
//!
//! Only data and environment failures live here. Writes past a struct's own
//! declared size are caller bugs and panic instead.
//! 这里只包含数据与环境错误；越过结构体自身大小的写入属于调用方错误，直接 panic。

use thiserror::Error;

/// 结果类型 Result type
pub type R<T> = Result<T, E>;

/// 错误类型 Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum E {
  #[error("alloc: {0}")]
  Alloc(#[from] zmsg_seg::E),

  #[error("invalid object size: data {data_size} bytes, {ptr_count} ptrs")]
  InvalidSize { data_size: u32, ptr_count: u16 },

  #[error("message sealed")]
  Sealed,

  #[error("malformed default: {0}")]
  MalformedDefault(Box<str>),

  #[error("copy nesting too deep: limit {0}")]
  NestingTooDeep(u32),

  #[error("copy exceeds traverse limit")]
  TraverseLimit,

  #[error("pointer target out of bounds: seg {seg}, addr {addr}, len {len}")]
  PtrOutOfBounds { seg: u32, addr: i64, len: u64 },

  #[error("no such segment: {0}")]
  BadSegId(u32),

  #[error("bad landing pad at seg {seg}, word {word}")]
  BadLandingPad { seg: u32, word: u32 },

  #[error("unknown pointer word: {0:#018x}")]
  BadPtrKind(u64),

  #[error("composite list tag is not a struct: {0:#018x}")]
  BadTag(u64),

  #[error("list too long: {0}")]
  ListTooLong(u64),
}

impl E {
  /// Wrap any failure while decoding a default template
  /// 包装默认模板解码失败
  #[inline]
  pub fn malformed_default(e: impl ToString) -> Self {
    Self::MalformedDefault(e.to_string().into())
  }
}
