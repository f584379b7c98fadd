//! Message configuration / 消息配置

/// Default copy nesting limit / 默认拷贝嵌套上限
pub const DEFAULT_COPY_DEPTH: u32 = 64;

/// Default copy budget in words (64 MiB) / 默认拷贝预算字数（64 MiB）
pub const DEFAULT_TRAVERSE_LIMIT: u64 = 8 << 20;

/// Message configuration options / 消息配置选项
#[derive(Debug, Clone, Copy)]
pub enum Conf {
  /// First segment size in bytes / 首段字节数
  FirstSegSize(u32),
  /// Total allocated bytes limit / 已分配字节总量上限
  MaxTotal(u64),
  /// Max pointer nesting followed by a deep copy
  /// 深拷贝可跟随的最大指针嵌套层数
  CopyDepth(u32),
  /// Max words copied by one pointer write or struct copy
  /// 单次指针写入或结构体拷贝可复制的最大字数
  TraverseLimit(u64),
}

/// Parsed config / 解析后的配置
#[derive(Debug, Clone)]
pub struct ParsedConf {
  pub seg: Vec<zmsg_seg::Conf>,
  pub copy_depth: u32,
  pub traverse_limit: u64,
}

impl ParsedConf {
  pub fn parse(conf: &[Conf]) -> Self {
    let mut c = Self {
      seg: Vec::new(),
      copy_depth: DEFAULT_COPY_DEPTH,
      traverse_limit: DEFAULT_TRAVERSE_LIMIT,
    };
    for item in conf {
      match *item {
        Conf::FirstSegSize(v) => c.seg.push(zmsg_seg::Conf::FirstSegSize(v)),
        Conf::MaxTotal(v) => c.seg.push(zmsg_seg::Conf::MaxTotal(v)),
        Conf::CopyDepth(v) => c.copy_depth = v,
        Conf::TraverseLimit(v) => c.traverse_limit = v,
      }
    }
    c
  }
}
