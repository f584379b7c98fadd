#![cfg_attr(docsrs, feature(doc_cfg))]

//! Struct overlay for segmented zero-copy messages
//! 分段零拷贝消息的结构体视图
//!
//! Fields are read and written in place. A struct keeps its own size, so data
//! written by an older or newer schema stays readable: missing fields read as
//! zero, extra fields are ignored, and [`copy_struct`] converts between sizes.
//! 字段原地读写。结构体自带大小，新旧版本数据均可读：缺失字段读为零，
//! 多余字段被忽略，[`copy_struct`] 在不同大小之间转换。
//!
//! # Threads / 线程
//!
//! [`Msg`] keeps its segment table in a `RefCell` and is not `Sync`, sealed
//! or not, so views never cross threads. To read a finished message from
//! several threads, hand each thread the bytes from [`Msg::into_segs`] and
//! open its own [`Msg::from_segs`]. [`Tmpl`] decodes lazily and is not `Sync`
//! either.
//! [`Msg`] 的段表位于 `RefCell` 中，无论是否封存都不是 `Sync`，视图不能跨线程。
//! 多线程读取已完成的消息时，把 [`Msg::into_segs`] 的字节交给各线程，
//! 各自用 [`Msg::from_segs`] 打开。[`Tmpl`] 惰性解码，同样不是 `Sync`。

mod conf;
mod copy;
mod error;
mod list;
mod msg;
mod ptr;
mod seg;
mod st;
mod tmpl;

pub use conf::{Conf, DEFAULT_COPY_DEPTH, DEFAULT_TRAVERSE_LIMIT, ParsedConf};
pub use copy::{CopyCtx, copy_struct};
pub use error::{E, R};
pub use list::List;
pub use msg::Msg;
pub use ptr::{Ptr, read_ptr, write_ptr};
pub use seg::Seg;
pub use st::{BitOffset, DataOffset, Struct, StructFlags};
pub use tmpl::Tmpl;
pub use zmsg_seg::{Addr, SegId};
pub use zmsg_wire::{ElemSize, Kind, ObjSize, RawPtr};
