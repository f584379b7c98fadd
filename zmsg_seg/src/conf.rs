//! Arena configuration / 内存池配置

use zmsg_wire::WORD;

/// Default size of the first segment / 首段默认大小
pub const DEFAULT_FIRST_SEG_SIZE: u32 = 1024;

/// Segment size cap, keeps word offsets inside 29 bits
/// 段大小上限，保证字偏移不超过 29 位
pub const MAX_SEG_SIZE: u32 = 1 << 31;

/// Arena configuration options / 内存池配置选项
#[derive(Debug, Clone, Copy)]
pub enum Conf {
  /// First segment size in bytes, later segments double
  /// 首段字节数，后续段依次翻倍
  FirstSegSize(u32),
  /// Total allocated bytes limit / 已分配字节总量上限
  MaxTotal(u64),
}

/// Parsed config / 解析后的配置
#[derive(Debug, Clone, Copy)]
pub struct ParsedConf {
  pub first_seg_size: u32,
  pub max_total: u64,
}

impl Default for ParsedConf {
  fn default() -> Self {
    Self {
      first_seg_size: DEFAULT_FIRST_SEG_SIZE,
      max_total: u64::MAX,
    }
  }
}

impl ParsedConf {
  pub fn parse(conf: &[Conf]) -> Self {
    let mut c = Self::default();
    for item in conf {
      match *item {
        Conf::FirstSegSize(v) => c.first_seg_size = v,
        Conf::MaxTotal(v) => c.max_total = v,
      }
    }
    c.first_seg_size = (c.first_seg_size & !(WORD - 1)).clamp(WORD, MAX_SEG_SIZE);
    c
  }
}
