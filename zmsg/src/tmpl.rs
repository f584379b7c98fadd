//! Default template: a tiny single-segment message whose root struct supplies
//! defaults for absent pointers.
//! 默认模板：单段小消息，其根结构体为缺失指针提供默认值。

use std::{borrow::Cow, cell::OnceCell};

use crate::{E, Msg, Ptr, R, Struct};

/// Decoded lazily on first use; the decoded message is sealed
/// 首次使用时解码；解码后的消息被封存
#[derive(Debug, Default)]
pub struct Tmpl {
  bytes: Cow<'static, [u8]>,
  msg: OnceCell<R<Msg>>,
}

impl Tmpl {
  pub fn new(bytes: impl Into<Cow<'static, [u8]>>) -> Self {
    Self {
      bytes: bytes.into(),
      msg: OnceCell::new(),
    }
  }

  /// No default, absent pointers read as `Struct::default()`
  /// 无默认值，缺失指针读作 `Struct::default()`
  pub const fn empty() -> Self {
    Self {
      bytes: Cow::Borrowed(&[]),
      msg: OnceCell::new(),
    }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  fn decode(&self) -> R<Msg> {
    let msg = Msg::from_segs(vec![self.bytes.to_vec()], &[])?;
    msg.seal();
    Ok(msg)
  }

  /// Root struct of the template / 模板的根结构体
  pub fn get(&self) -> R<Struct<'_>> {
    if self.bytes.is_empty() {
      return Ok(Struct::default());
    }
    let msg = self
      .msg
      .get_or_init(|| self.decode())
      .as_ref()
      .map_err(E::malformed_default)?;
    match msg.root().map_err(E::malformed_default)? {
      Ptr::Struct(s) => Ok(s),
      _ => Ok(Struct::default()),
    }
  }
}
