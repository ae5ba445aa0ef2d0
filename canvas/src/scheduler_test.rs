use super::*;

#[test]
fn first_request_asks_for_a_frame() {
    let mut sched = FrameScheduler::new();
    assert!(sched.request_redraw());
    assert!(sched.is_dirty());
    assert!(sched.frame_pending());
}

#[test]
fn burst_of_requests_coalesces_into_one_frame() {
    let mut sched = FrameScheduler::new();
    let scheduled = (0..50).filter(|_| sched.request_redraw()).count();
    assert_eq!(scheduled, 1);
    assert!(sched.begin_frame());
    assert!(!sched.begin_frame());
    assert_eq!(sched.frames_drawn(), 1);
}

#[test]
fn frame_without_request_draws_nothing() {
    let mut sched = FrameScheduler::new();
    assert!(!sched.begin_frame());
    assert_eq!(sched.frames_drawn(), 0);
}

#[test]
fn request_after_frame_schedules_again() {
    let mut sched = FrameScheduler::new();
    sched.request_redraw();
    sched.begin_frame();
    assert!(sched.request_redraw());
    assert!(sched.begin_frame());
    assert_eq!(sched.frames_drawn(), 2);
}

#[test]
fn failed_frame_request_allows_retry() {
    let mut sched = FrameScheduler::new();
    assert!(sched.request_redraw());
    sched.frame_request_failed();
    assert!(sched.request_redraw());
}
