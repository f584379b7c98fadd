//! Arena tests
//! 内存池测试

use aok::{OK, Void};
use log::trace;
use zmsg_seg::{Addr, Arena, Conf, E, MAX_SEG_SIZE, SegId};
use zmsg_wire::{ObjSize, RawPtr};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

#[test]
fn test_alloc_zeroed_and_padded() -> Void {
  let arena = Arena::new(&[]);
  assert_eq!(arena.seg_count(), 0);

  let (id, a) = arena.alloc(SegId(0), 3)?;
  assert_eq!((id, a), (SegId(0), Addr(0)));
  let (_, b) = arena.alloc(SegId(0), 8)?;
  assert_eq!(b, Addr(8));
  assert_eq!(arena.seg_len(SegId(0)), Some(16));
  assert_eq!(arena.total(), 16);

  for i in 0..16 {
    assert_eq!(arena.read_u8(SegId(0), Addr(i)), 0);
  }
  OK
}

#[test]
fn test_zero_alloc() -> Void {
  let arena = Arena::new(&[]);
  arena.alloc(SegId(0), 8)?;
  let (id, a) = arena.alloc(SegId(0), 0)?;
  assert_eq!((id, a), (SegId(0), Addr(8)));
  assert_eq!(arena.total(), 8);
  OK
}

#[test]
fn test_grow_new_segment() -> Void {
  let arena = Arena::new(&[Conf::FirstSegSize(16)]);
  let (s0, _) = arena.alloc(SegId(0), 16)?;
  assert_eq!(s0, SegId(0));

  // Full, falls over to a doubled segment
  let (s1, a1) = arena.alloc(SegId(0), 8)?;
  assert_eq!((s1, a1), (SegId(1), Addr(0)));

  // Larger than the doubled size
  let (s2, _) = arena.alloc(SegId(0), 100)?;
  assert_eq!(s2, SegId(2));
  assert_eq!(arena.seg_count(), 3);
  trace!("{arena:?}");
  OK
}

#[test]
fn test_alloc_in_exact() -> Void {
  let arena = Arena::new(&[Conf::FirstSegSize(16)]);
  arena.alloc(SegId(0), 8)?;
  assert_eq!(arena.alloc_in(SegId(0), 8), Some(Addr(8)));
  assert_eq!(arena.alloc_in(SegId(0), 8), None);
  assert_eq!(arena.alloc_in(SegId(5), 8), None);
  OK
}

#[test]
fn test_max_total() -> Void {
  let arena = Arena::new(&[Conf::MaxTotal(24)]);
  arena.alloc(SegId(0), 16)?;
  let err = arena.alloc(SegId(0), 16).unwrap_err();
  assert_eq!(err, E::Full { need: 32, limit: 24 });
  assert_eq!(arena.alloc_in(SegId(0), 16), None);
  arena.alloc(SegId(0), 8)?;
  OK
}

#[test]
fn test_too_large() {
  let arena = Arena::new(&[]);
  assert_eq!(
    arena.alloc(SegId(0), u32::MAX).unwrap_err(),
    E::TooLarge(u32::MAX as u64)
  );
  assert!(matches!(
    arena.alloc(SegId(0), MAX_SEG_SIZE + 8),
    Err(E::TooLarge(_))
  ));
}

#[test]
fn test_read_write_le() -> Void {
  let arena = Arena::new(&[]);
  let (id, a) = arena.alloc(SegId(0), 16)?;
  arena.write_u16(id, a, 0x1234);
  arena.write_u32(id, a.add(4), 0xdead_beef);
  arena.write_u64(id, a.add(8), 0x0102_0304_0506_0708);

  let bytes = arena.seg_bytes(id).unwrap();
  assert_eq!(&bytes[0..2], &[0x34, 0x12]);
  assert_eq!(&bytes[4..8], &[0xef, 0xbe, 0xad, 0xde]);
  assert_eq!(bytes[8], 0x08);
  assert_eq!(bytes[15], 0x01);

  assert_eq!(arena.read_u8(id, a), 0x34);
  assert_eq!(arena.read_u16(id, a), 0x1234);
  assert_eq!(arena.read_u32(id, a.add(4)), 0xdead_beef);
  assert_eq!(arena.read_u64(id, a.add(8)), 0x0102_0304_0506_0708);
  OK
}

#[test]
fn test_ptr_word() -> Void {
  let arena = Arena::new(&[]);
  let (id, a) = arena.alloc(SegId(0), 8)?;
  let p = RawPtr::new_struct(3, ObjSize::new(8, 1));
  arena.write_ptr(id, a, p);
  assert_eq!(arena.read_ptr(id, a), p);
  assert_eq!(arena.read_u64(id, a), p.get());
  OK
}

#[test]
fn test_copy_same_segment() -> Void {
  let arena = Arena::new(&[]);
  let (id, a) = arena.alloc(SegId(0), 32)?;
  arena.write_u64(id, a, 7);
  arena.write_u64(id, a.add(8), 9);
  arena.copy(id, a.add(16), &arena, id, a, 16);
  assert_eq!(arena.read_u64(id, a.add(16)), 7);
  assert_eq!(arena.read_u64(id, a.add(24)), 9);
  OK
}

#[test]
fn test_copy_across_segments() -> Void {
  let arena = Arena::new(&[Conf::FirstSegSize(8)]);
  let (s0, a0) = arena.alloc(SegId(0), 8)?;
  let (s1, a1) = arena.alloc(SegId(0), 8)?;
  assert_ne!(s0, s1);
  arena.write_u64(s1, a1, 42);
  arena.copy(s0, a0, &arena, s1, a1, 8);
  assert_eq!(arena.read_u64(s0, a0), 42);

  arena.write_u64(s0, a0, 43);
  arena.copy(s1, a1, &arena, s0, a0, 8);
  assert_eq!(arena.read_u64(s1, a1), 43);
  OK
}

#[test]
fn test_copy_across_arenas_and_zero() -> Void {
  let src = Arena::new(&[]);
  let dst = Arena::new(&[]);
  let (s, a) = src.alloc(SegId(0), 8)?;
  let (d, b) = dst.alloc(SegId(0), 16)?;
  src.write_u64(s, a, u64::MAX);
  dst.copy(d, b, &src, s, a, 8);
  assert_eq!(dst.read_u64(d, b), u64::MAX);

  dst.write_u64(d, b.add(8), 5);
  dst.zero(d, b, 16);
  assert_eq!(dst.read_u64(d, b), 0);
  assert_eq!(dst.read_u64(d, b.add(8)), 0);
  OK
}

#[test]
fn test_from_segs() -> Void {
  let arena = Arena::from_segs(vec![vec![1; 16], vec![2; 8]], &[])?;
  assert_eq!(arena.seg_count(), 2);
  assert_eq!(arena.total(), 24);
  assert!(arena.in_bounds(SegId(0), Addr(8), 8));
  assert!(!arena.in_bounds(SegId(0), Addr(8), 9));
  assert!(!arena.in_bounds(SegId(2), Addr(0), 0));

  // Existing segments are full
  let (id, _) = arena.alloc(SegId(0), 8)?;
  assert_eq!(id, SegId(2));

  let segs = arena.into_segs();
  assert_eq!(segs[0], vec![1; 16]);
  assert_eq!(segs[1], vec![2; 8]);
  OK
}

#[test]
fn test_from_segs_unaligned() {
  let err = Arena::from_segs(vec![vec![0; 8], vec![0; 5]], &[]).unwrap_err();
  assert_eq!(err, E::Unaligned { seg: 1, len: 5 });
}
