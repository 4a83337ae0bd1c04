use super::*;
use crate::foundation::core::Rgba8;

fn frame(v: u8) -> Frame {
    Frame::solid(1, 1, Rgba8::new(v, v, v, 255)).unwrap()
}

#[test]
fn sequence_yields_in_order_then_ends() {
    let mut s = SequenceSource::new([frame(1), frame(2)]);
    assert!(s.is_active());
    assert_eq!(s.latest_frame(), Some(frame(1)));
    assert_eq!(s.latest_frame(), Some(frame(2)));
    assert!(!s.is_active());
    assert_eq!(s.latest_frame(), None);
}

#[test]
fn slot_keeps_only_the_newest_frame() {
    let mut slot = LatestFrameSlot::new();
    let publisher = slot.publisher();
    publisher.publish(frame(1));
    publisher.publish(frame(2));
    publisher.publish(frame(3));
    assert_eq!(slot.overwritten(), 2);
    assert_eq!(slot.latest_frame(), Some(frame(3)));
    assert_eq!(slot.latest_frame(), None);
}

#[test]
fn slot_delivers_pending_frame_after_end() {
    let mut slot = LatestFrameSlot::new();
    let publisher = slot.publisher();
    publisher.publish(frame(7));
    publisher.end();
    assert!(slot.is_active());
    assert_eq!(slot.latest_frame(), Some(frame(7)));
    assert!(!slot.is_active());
}

#[test]
fn slot_accepts_frames_from_another_thread() {
    let mut slot = LatestFrameSlot::new();
    let publisher = slot.publisher();
    std::thread::spawn(move || {
        for v in 0..10 {
            publisher.publish(frame(v));
        }
    })
    .join()
    .unwrap();
    assert_eq!(slot.latest_frame(), Some(frame(9)));
}
