use minijit::jit::VReg;
use minijit::jit::frame::StackFrame;

#[test]
fn test_sequential_allocation() {
    let mut frame = StackFrame::new();
    assert_eq!(frame.alloc(8, VReg(0)), 0);
    assert_eq!(frame.alloc(8, VReg(1)), 8);
    assert_eq!(frame.alloc(8, VReg(2)), 16);
    assert_eq!(frame.high_water(), 24);
}

#[test]
fn test_released_run_is_reused_first_fit() {
    let mut frame = StackFrame::new();
    assert_eq!(frame.alloc(8, VReg(0)), 0);
    assert_eq!(frame.alloc(8, VReg(1)), 8);
    frame.release(0, 8);
    assert_eq!(frame.alloc(8, VReg(2)), 0);
    assert_eq!(frame.high_water(), 16);
}

#[test]
fn test_interior_hole_must_fit_exactly_or_allocation_goes_past_it() {
    let mut frame = StackFrame::new();
    assert_eq!(frame.alloc(4, VReg(0)), 0);
    assert_eq!(frame.alloc(8, VReg(1)), 4);
    frame.release(0, 4);
    // a 4-byte hole cannot hold 8 bytes
    assert_eq!(frame.alloc(8, VReg(2)), 12);
    // but it can hold 4
    assert_eq!(frame.alloc(4, VReg(3)), 0);
    assert_eq!(frame.high_water(), 20);
}

#[test]
fn test_high_water_never_recedes() {
    let mut frame = StackFrame::new();
    let offset = frame.alloc(8, VReg(0));
    frame.release(offset, 8);
    assert_eq!(frame.high_water(), 8);
    assert_eq!(frame.alloc(8, VReg(1)), 0);
    assert_eq!(frame.high_water(), 8);
}

#[test]
fn test_cells_record_the_owner() {
    let mut frame = StackFrame::new();
    frame.alloc(8, VReg(7));
    assert!(frame.cells()[..8].iter().all(|cell| *cell == Some(VReg(7))));
}
