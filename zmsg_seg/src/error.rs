//! 错误定义 Error definitions

use thiserror::Error;

/// 结果类型 Result type
pub type R<T> = Result<T, E>;

/// 错误类型 Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum E {
  #[error("allocation too large: {0} bytes")]
  TooLarge(u64),

  #[error("arena full: need {need} bytes, limit {limit}")]
  Full { need: u64, limit: u64 },

  #[error("segment {seg} length {len} is not word aligned or too large")]
  Unaligned { seg: u32, len: usize },
}
