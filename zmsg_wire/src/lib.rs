#![cfg_attr(docsrs, feature(doc_cfg))]

//! Wire-level building blocks for zmsg
//! zmsg 线格式基础类型
//!
//! A message is a set of segments made of 8-byte words. Objects are reached
//! through 64-bit pointer words; this crate encodes and decodes them.
//! 消息由若干 8 字节字组成的段构成，对象通过 64 位指针字访问。

mod elem;
mod raw;
mod size;

pub use elem::ElemSize;
pub use raw::{Kind, MAX_LIST_LEN, RawPtr};
pub use size::{ObjSize, WORD, pad_to_word};
