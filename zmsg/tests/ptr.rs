//! Pointer slot and list tests
//! 指针槽与列表测试

use aok::{OK, Void};
use proptest::prelude::*;
use zmsg::{
  Conf, DataOffset, E, ElemSize, Kind, List, Msg, ObjSize, Ptr, RawPtr, SegId, Struct, StructFlags,
};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

/// Raw word stored in pointer slot `i` / 指针槽 i 中的原始字
fn slot_word(s: &Struct<'_>, i: u32) -> RawPtr {
  let seg = s.seg().unwrap();
  seg.read_raw(s.addr().add(s.size().data_size + i * 8))
}

fn words(li: &[u64]) -> Vec<u8> {
  li.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[test]
fn test_near_pointer() -> Void {
  let msg = Msg::new(&[])?;
  let parent = Struct::alloc_root(msg.first_seg(), ObjSize::new(8, 1))?;
  let child = Struct::alloc(msg.first_seg(), ObjSize::new(8, 0))?;
  child.set_u64(DataOffset(0), 9);
  parent.set_ptr(0, child.into())?;

  let w = slot_word(&parent, 0);
  assert_eq!(w.kind(), Kind::Struct);
  let got = parent.ptr(0).as_struct().unwrap();
  assert_eq!(got, child);
  assert_eq!(got.u64(DataOffset(0)), 9);
  OK
}

#[test]
fn test_far_pointer() -> Void {
  let msg = Msg::new(&[Conf::FirstSegSize(32)])?;
  let parent = Struct::alloc_root(msg.first_seg(), ObjSize::new(8, 1))?;
  let child = Struct::alloc(msg.first_seg(), ObjSize::new(16, 0))?;
  assert_eq!(child.seg().unwrap().id(), SegId(1));
  child.set_u64(DataOffset(8), 0xfeed);
  parent.set_ptr(0, child.into())?;

  let w = slot_word(&parent, 0);
  assert_eq!(w.kind(), Kind::Far);
  assert!(!w.is_double_far());
  assert_eq!(w.far_seg(), 1);

  let got = parent.ptr(0).as_struct().unwrap();
  assert_eq!(got.seg().unwrap().id(), SegId(1));
  assert_eq!(got.addr(), child.addr());
  assert_eq!(got.u64(DataOffset(8)), 0xfeed);
  OK
}

#[test]
fn test_double_far_pointer() -> Void {
  let msg = Msg::new(&[Conf::FirstSegSize(16)])?;
  let parent = Struct::alloc_root(msg.first_seg(), ObjSize::new(0, 1))?;
  // Fills segment 1 exactly, leaving no room for a landing pad
  let child = Struct::alloc(msg.first_seg(), ObjSize::new(32, 0))?;
  assert_eq!(child.seg().unwrap().id(), SegId(1));
  child.set_u32(DataOffset(28), 5);
  parent.set_ptr(0, child.into())?;

  let w = slot_word(&parent, 0);
  assert_eq!(w.kind(), Kind::Far);
  assert!(w.is_double_far());

  let got = parent.ptr(0).as_struct().unwrap();
  assert_eq!(got.seg().unwrap().id(), SegId(1));
  assert_eq!(got.size(), ObjSize::new(32, 0));
  assert_eq!(got.u32(DataOffset(28)), 5);
  OK
}

#[test]
fn test_empty_struct() -> Void {
  let msg = Msg::new(&[])?;
  let parent = Struct::alloc_root(msg.first_seg(), ObjSize::new(0, 1))?;
  let empty = Struct::alloc(msg.first_seg(), ObjSize::default())?;
  parent.set_ptr(0, empty.into())?;
  assert_eq!(slot_word(&parent, 0), RawPtr::EMPTY_STRUCT);

  let got = parent.ptr(0);
  assert!(got.is_valid());
  let s = got.as_struct().unwrap();
  // Present but empty / 存在但为空
  assert!(s.is_valid());
  assert!(!s.has_data());
  assert!(s.size().is_zero());
  assert!(!Struct::default().is_valid());
  assert_eq!(s.u8(DataOffset(0)), 0);
  OK
}

#[test]
fn test_cap_and_null() -> Void {
  let msg = Msg::new(&[])?;
  let s = Struct::alloc_root(msg.first_seg(), ObjSize::new(0, 2))?;
  s.set_ptr(0, Ptr::Cap(7))?;
  assert_eq!(s.ptr(0), Ptr::Cap(7));
  assert_eq!(slot_word(&s, 0), RawPtr::new_cap(7));

  s.set_ptr(1, Struct::default().into())?;
  assert!(s.ptr(1).is_null());
  s.set_ptr(0, Ptr::Null)?;
  assert!(s.ptr(0).is_null());
  OK
}

#[test]
fn test_malformed_root() -> Void {
  let root = RawPtr::new_struct(10, ObjSize::new(8, 0)).get();
  let msg = Msg::from_segs(vec![words(&[root, 0])], &[])?;
  assert!(matches!(msg.root(), Err(E::PtrOutOfBounds { seg: 0, .. })));
  assert!(!msg.root_struct().has_data());
  OK
}

#[test]
fn test_malformed_slots() -> Void {
  let root = RawPtr::new_struct(0, ObjSize::new(0, 4)).get();
  let bad_seg = RawPtr::new_far(false, 0, 5).get();
  let bad_pad = RawPtr::new_far(false, 100, 0).get();
  let bad_kind = 7u64;
  let bad_off = RawPtr::new_list(-9, ElemSize::Byte, 1).get();
  let msg = Msg::from_segs(
    vec![words(&[root, bad_seg, bad_pad, bad_kind, bad_off])],
    &[],
  )?;
  let s = msg.root_struct();
  assert_eq!(s.size(), ObjSize::new(0, 4));

  assert_eq!(s.try_ptr(0).unwrap_err(), E::BadSegId(5));
  assert_eq!(
    s.try_ptr(1).unwrap_err(),
    E::BadLandingPad { seg: 0, word: 100 }
  );
  assert_eq!(s.try_ptr(2).unwrap_err(), E::BadPtrKind(7));
  assert!(matches!(s.try_ptr(3), Err(E::PtrOutOfBounds { .. })));
  for i in 0..4 {
    assert!(s.ptr(i).is_null());
  }
  OK
}

#[test]
fn test_bad_composite_tag() -> Void {
  let root = RawPtr::new_struct(0, ObjSize::new(0, 1)).get();
  // Composite list of 1 word whose tag claims 4 one-word elements
  let list = RawPtr::new_list(0, ElemSize::Composite, 1).get();
  let tag = RawPtr::new_tag(4, ObjSize::new(8, 0)).get();
  let msg = Msg::from_segs(vec![words(&[root, list, tag, 0])], &[])?;
  let s = msg.root_struct();
  assert_eq!(s.try_ptr(0).unwrap_err(), E::BadTag(tag));
  OK
}

#[test]
fn test_primitive_lists() -> Void {
  let msg = Msg::new(&[])?;
  let seg = msg.first_seg();
  let root = Struct::alloc_root(seg, ObjSize::new(0, 2))?;

  let nums = List::alloc(seg, ElemSize::TwoBytes, 5)?;
  for i in 0..5 {
    nums.set_u16(i, i as u16 * 100);
  }
  let bits = List::alloc(seg, ElemSize::Bit, 10)?;
  bits.set_bit(9, true);
  bits.set_bit(2, true);
  root.set_ptr(0, nums.into())?;
  root.set_ptr(1, bits.into())?;

  let nums = root.ptr(0).as_list().unwrap();
  assert_eq!(nums.len(), 5);
  assert_eq!(nums.elem_size(), ElemSize::TwoBytes);
  assert_eq!(nums.u16(4), 400);
  assert_eq!(nums.u16(5), 0);
  assert_eq!(nums.u32(0), 0);

  let bits = root.ptr(1).as_list().unwrap();
  assert!(bits.bit(9));
  assert!(bits.bit(2));
  assert!(!bits.bit(3));
  assert!(!bits.bit(10));
  OK
}

#[test]
fn test_composite_list() -> Void {
  let msg = Msg::new(&[])?;
  let seg = msg.first_seg();
  let root = Struct::alloc_root(seg, ObjSize::new(0, 1))?;
  let li = List::alloc_composite(seg, ObjSize::new(4, 1), 3)?;
  assert_eq!(li.struct_size(), ObjSize::new(8, 1));
  for i in 0..3 {
    let e = li.struct_at(i);
    assert!(e.flags().contains(StructFlags::LIST_MEMBER));
    e.set_u32(DataOffset(0), i + 1);
  }
  assert_eq!(li.u32(1), 2);
  assert!(!li.struct_at(3).has_data());
  root.set_ptr(0, li.into())?;

  let got = root.ptr(0).as_list().unwrap();
  assert_eq!(got.len(), 3);
  assert_eq!(got.elem_size(), ElemSize::Composite);
  assert_eq!(got.struct_at(2).u32(DataOffset(0)), 3);
  assert_eq!(got.struct_at(2).addr(), li.struct_at(2).addr());
  OK
}

#[test]
fn test_pointer_list() -> Void {
  let msg = Msg::new(&[])?;
  let seg = msg.first_seg();
  let root = Struct::alloc_root(seg, ObjSize::new(0, 1))?;
  let li = List::alloc(seg, ElemSize::Ptr, 2)?;
  let child = Struct::alloc(seg, ObjSize::new(8, 0))?;
  child.set_u64(DataOffset(0), 11);
  li.set_ptr_at(1, child.into())?;
  root.set_ptr(0, li.into())?;

  let got = root.ptr(0).as_list().unwrap();
  assert!(got.ptr_at(0).is_null());
  assert_eq!(got.ptr_at(1).as_struct().unwrap().u64(DataOffset(0)), 11);
  assert!(got.ptr_at(2).is_null());
  OK
}

#[test]
fn test_list_member_is_copied() -> Void {
  let msg = Msg::new(&[])?;
  let seg = msg.first_seg();
  let root = Struct::alloc_root(seg, ObjSize::new(0, 1))?;
  let li = List::alloc_composite(seg, ObjSize::new(8, 0), 2)?;
  li.struct_at(1).set_u64(DataOffset(0), 4);

  root.set_ptr(0, li.struct_at(1).into())?;
  let got = root.ptr(0).as_struct().unwrap();
  assert_ne!(got.addr(), li.struct_at(1).addr());
  assert_eq!(got.u64(DataOffset(0)), 4);
  assert!(!got.flags().contains(StructFlags::LIST_MEMBER));

  li.struct_at(1).set_u64(DataOffset(0), 5);
  assert_eq!(got.u64(DataOffset(0)), 4);
  OK
}

#[test]
fn test_list_too_long() -> Void {
  let msg = Msg::new(&[])?;
  let err = List::alloc(msg.first_seg(), ElemSize::Byte, u32::MAX).unwrap_err();
  assert_eq!(err, E::ListTooLong(u32::MAX as u64));
  let err = List::alloc_composite(msg.first_seg(), ObjSize::new(8, 0), 1 << 29).unwrap_err();
  assert_eq!(err, E::ListTooLong(1 << 29));
  OK
}

#[test]
#[should_panic(expected = "out of range")]
fn test_list_write_past_end_panics() {
  let msg = Msg::new(&[]).unwrap();
  let li = List::alloc(msg.first_seg(), ElemSize::FourBytes, 2).unwrap();
  li.set_u32(2, 1);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_list_wrong_width_panics() {
  let msg = Msg::new(&[]).unwrap();
  let li = List::alloc(msg.first_seg(), ElemSize::TwoBytes, 2).unwrap();
  li.set_u64(0, 1);
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(500))]

  /// Random words decode without panicking / 随机数据解码不会 panic
  #[test]
  fn prop_random_words_never_panic(
    seg0 in prop::collection::vec(any::<u64>(), 1..16),
    seg1 in prop::collection::vec(any::<u64>(), 0..8),
  ) {
    let msg = Msg::from_segs(vec![words(&seg0), words(&seg1)], &[]).unwrap();
    let s = msg.root_struct();
    let _ = s.u64(DataOffset(0));
    for i in 0..4 {
      match s.ptr(i) {
        Ptr::Struct(c) => {
          let _ = c.u32(DataOffset(4));
          let _ = c.ptr(0);
        }
        Ptr::List(l) => {
          for j in 0..l.len().min(8) {
            let _ = l.u64(j);
            let _ = l.bit(j);
            let _ = l.ptr_at(j);
            let _ = l.struct_at(j).u8(DataOffset(0));
          }
        }
        Ptr::Cap(_) | Ptr::Null => {}
      }
    }
  }
}
