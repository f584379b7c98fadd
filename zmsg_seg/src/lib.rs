#![cfg_attr(docsrs, feature(doc_cfg))]

//! Segment arena / 分段内存池
//!
//! Owns every byte of a message. Callers address memory by `(SegId, Addr)`
//! and never hold references into the buffers.
//! 持有消息的全部字节，调用方以 `(SegId, Addr)` 寻址，不持有缓冲区引用。

mod addr;
mod arena;
mod conf;
mod error;

pub use addr::{Addr, SegId};
pub use arena::Arena;
pub use conf::{Conf, DEFAULT_FIRST_SEG_SIZE, MAX_SEG_SIZE, ParsedConf};
pub use error::{E, R};
