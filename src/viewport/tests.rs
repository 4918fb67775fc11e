use super::*;
use crate::channel::ScrollToBottomMsg;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn key(code: KeyCode) -> Msg {
    Box::new(KeyMsg {
        key: code,
        modifiers: KeyModifiers::NONE,
    })
}

fn deliver<M: std::any::Any + Send>(vp: &mut Model, msg: M) -> Option<Cmd> {
    vp.update(Box::new(msg))
}

/// Delivers pending frames, layout ticks and settle ticks until the
/// viewport is quiet. Returns how many animation frames ran.
fn drive(vp: &mut Model) -> usize {
    let mut frames = 0;
    for _ in 0..500 {
        if vp.frame_timer.is_armed() {
            let frame = FrameMsg {
                id: vp.id(),
                tag: vp.frame_timer.tag(),
            };
            deliver(vp, frame);
            frames += 1;
        } else if vp.follow.awaiting_layout() {
            let layout = vp.follow.pending_layout();
            deliver(vp, layout);
        } else if vp.follow.auto_scroll_pending() {
            let settle = vp.follow.pending_settle();
            deliver(vp, settle);
        } else {
            return frames;
        }
    }
    panic!("viewport never went quiet");
}

fn settle_user(vp: &mut Model) {
    let debounce = vp.follow.pending_debounce();
    deliver(vp, debounce);
}

fn pinned_with_lines(n: usize) -> Model {
    let mut vp = Model::new(20, 5);
    for i in 0..n {
        vp.push_item(format!("line {i}"));
    }
    drive(&mut vp);
    assert_eq!(vp.follow_state(), FollowState::Pinned);
    vp
}

fn assert_at_bottom(vp: &Model) {
    let state = vp.scroll_state();
    assert_eq!(state.scroll_top, state.scroll_height - state.client_height);
    assert!(state.is_at_bottom);
}

#[test]
fn test_first_content_shows_the_bottom() {
    let vp = pinned_with_lines(10);
    let state = vp.scroll_state();
    assert_eq!(state.scroll_height, 10.0);
    assert_eq!(state.scroll_top, 5.0);
    assert!(vp.at_bottom());
    assert!(!vp.at_top());

    let view = vp.view();
    assert!(view.contains("line 5"));
    assert!(view.contains("line 9"));
    assert!(!view.contains("line 0"));
}

#[test]
fn test_pinned_follows_growth_smoothly() {
    let mut vp = pinned_with_lines(10);
    assert!(vp.push_item("multi\nline\nturn").is_some());
    assert_eq!(vp.follow_state(), FollowState::AutoScrolling);

    let frames = drive(&mut vp);
    assert!(frames > 1);
    assert_eq!(vp.follow_state(), FollowState::Pinned);
    assert_eq!(vp.scroll_state().scroll_height, 13.0);
    assert_at_bottom(&vp);
    assert!(vp.view().contains("turn"));
}

#[test]
fn test_streamed_chunks_stay_in_view() {
    let mut vp = pinned_with_lines(10);
    vp.push_item("assistant:");
    drive(&mut vp);
    for chunk in ["\nfirst", "\nsecond", "\nthird"] {
        vp.append_to_item(10, chunk);
        drive(&mut vp);
        assert_at_bottom(&vp);
    }
    assert!(vp.view().contains("third"));
    assert_eq!(vp.items()[10], "assistant:\nfirst\nsecond\nthird");
}

#[test]
fn test_scrolling_up_detaches() {
    let mut vp = pinned_with_lines(10);
    let channel = vp.channel();
    for _ in 0..3 {
        vp.update(key(KeyCode::Char('k')));
    }
    assert_eq!(vp.scroll_state().scroll_top, 2.0);
    assert!(vp.scroll_state().is_user_scrolling);
    assert!(!channel.is_at_bottom());
    settle_user(&mut vp);

    assert!(vp.push_item("new").is_none());
    drive(&mut vp);
    assert_eq!(vp.follow_state(), FollowState::UserDetached);
    assert_eq!(vp.scroll_state().scroll_top, 2.0);
    assert!(!vp.view().contains("new"));
}

#[test]
fn test_end_key_re_pins() {
    let mut vp = pinned_with_lines(10);
    vp.update(key(KeyCode::PageUp));
    settle_user(&mut vp);
    vp.push_item("new");
    assert_eq!(vp.follow_state(), FollowState::UserDetached);

    assert!(vp.update(key(KeyCode::End)).is_some());
    drive(&mut vp);
    assert_eq!(vp.follow_state(), FollowState::Pinned);
    assert_at_bottom(&vp);
    assert!(vp.channel().is_at_bottom());
    assert!(vp.view().contains("new"));
}

#[test]
fn test_key_press_aborts_auto_scroll() {
    let mut vp = pinned_with_lines(10);
    vp.push_item("x");
    assert!(vp.scroll_state().auto_scroll_pending);

    vp.update(key(KeyCode::Up));
    let state = vp.scroll_state();
    assert!(!state.auto_scroll_pending);
    assert_eq!(state.scroll_top, 4.0);
    assert!(!state.is_at_bottom);
    settle_user(&mut vp);

    vp.push_item("y");
    drive(&mut vp);
    assert_eq!(vp.follow_state(), FollowState::UserDetached);
    assert_eq!(vp.scroll_state().scroll_top, 4.0);
}

#[test]
fn test_channel_request_from_an_affordance() {
    let mut vp = pinned_with_lines(10);
    let channel = vp.channel();
    let flips = Arc::new(AtomicUsize::new(0));
    let counter = flips.clone();
    let _sub = channel.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    vp.update(key(KeyCode::Home));
    assert!(vp.at_top());
    assert_eq!(vp.scroll_percent(), 0.0);
    assert_eq!(flips.load(Ordering::SeqCst), 1);

    let request = ScrollToBottomMsg {
        id: vp.id(),
        smooth: true,
    };
    assert!(deliver(&mut vp, request).is_some());
    drive(&mut vp);
    assert_at_bottom(&vp);
    assert_eq!(vp.scroll_percent(), 1.0);
    assert_eq!(flips.load(Ordering::SeqCst), 2);
}

#[test]
fn test_messages_for_other_viewports_are_ignored() {
    let mut vp = pinned_with_lines(10);
    let other = Model::new(20, 5);
    vp.update(key(KeyCode::Home));
    settle_user(&mut vp);

    let request = ScrollToBottomMsg {
        id: other.id(),
        smooth: false,
    };
    assert!(deliver(&mut vp, request).is_none());
    let frame = FrameMsg {
        id: other.id(),
        tag: 1,
    };
    assert!(deliver(&mut vp, frame).is_none());
    assert!(vp.at_top());
}

#[test]
fn test_only_visible_items_are_measured() {
    let mut vp = Model::new(20, 5);
    let items = (0..200).map(|i| format!("row {i}")).collect();
    assert!(vp.set_items(items).is_some());
    drive(&mut vp);

    assert_eq!(vp.follow_state(), FollowState::Pinned);
    assert_at_bottom(&vp);
    assert!(vp.view().contains("row 199"));
    assert!(!vp.windowing.is_measured(100));
    assert!(vp.windowing.is_measured(199));

    let mounted = vp.mounted_items();
    assert!(mounted.len() < 40);
    assert_eq!(mounted.last().map(|item| item.index), Some(199));
}

#[test]
fn test_narrower_width_rewraps_and_follows() {
    let mut vp = pinned_with_lines(10);
    vp.push_item("aaaa bbbb cccc dddd eeee ffff");
    drive(&mut vp);
    assert_eq!(vp.scroll_state().scroll_height, 12.0);

    vp.set_size(10, 5);
    drive(&mut vp);
    assert_eq!(vp.follow_state(), FollowState::Pinned);
    assert_at_bottom(&vp);
    assert!(vp.view().contains("ffff"));
}

#[test]
fn test_destroy_mid_animation_freezes_everything() {
    let mut vp = pinned_with_lines(10);
    let channel = vp.channel();
    vp.push_item("one\ntwo\nthree");
    for _ in 0..vp.config().layout_frames {
        let layout = vp.follow.pending_layout();
        deliver(&mut vp, layout);
    }
    assert!(vp.frame_timer.is_armed());
    let frame = FrameMsg {
        id: vp.id(),
        tag: vp.frame_timer.tag(),
    };
    let settle = vp.follow.pending_settle();
    let before = vp.scroll_state();

    vp.destroy();
    assert!(deliver(&mut vp, frame).is_none());
    assert!(deliver(&mut vp, settle).is_none());
    assert!(vp.push_item("late").is_none());
    assert!(vp.update(key(KeyCode::Up)).is_none());
    assert!(vp.scroll_to_bottom(true).is_none());

    assert_eq!(vp.scroll_state().scroll_top, before.scroll_top);
    assert!(!channel.is_open());
    assert!(channel.scroll_to_bottom(true).is_none());
}

#[test]
fn test_clear_and_refill() {
    let mut vp = pinned_with_lines(10);
    vp.clear();
    assert_eq!(vp.item_count(), 0);
    assert_eq!(vp.scroll_state().scroll_height, 0.0);
    assert!(vp.mounted_items().is_empty());

    vp.push_item("again");
    drive(&mut vp);
    assert!(vp.view().contains("again"));
}

#[test]
fn test_update_item_out_of_range() {
    let mut vp = Model::new(20, 5);
    assert!(vp.update_item(3, "nope").is_none());
    assert!(vp.append_to_item(0, "nope").is_none());
    assert_eq!(vp.item_count(), 0);
}

#[test]
fn test_view_has_fixed_height() {
    let mut vp = Model::new(20, 5);
    vp.push_item("only");
    assert_eq!(vp.view().split('\n').count(), 5);
}

#[test]
fn test_wrap_rows() {
    assert_eq!(wrap_rows("", 10), vec![String::new()]);
    assert_eq!(wrap_rows("a b c", 3), vec!["a b", "c"]);
    assert_eq!(wrap_rows("x", 0), vec!["x"]);
    assert_eq!(wrap_rows("one\ntwo", 20).len(), 2);
}

#[test]
fn test_crlf_is_normalized() {
    let mut vp = Model::new(20, 5);
    vp.push_item("a\r\nb");
    assert_eq!(vp.items()[0], "a\nb");
}

#[test]
fn test_keymap_help() {
    let keymap = ViewportKeyMap::default();
    assert_eq!(keymap.short_help().len(), 5);
    assert_eq!(keymap.full_help().len(), 4);
    assert_eq!(keymap.bottom.help().desc, "bottom");
}

#[test]
fn test_growth_while_scrolling_up_detaches() {
    let mut vp = pinned_with_lines(10);
    vp.update(key(KeyCode::Char('g')));
    assert!(vp.scroll_state().is_user_scrolling);

    assert!(vp.push_item("new").is_none());
    assert_eq!(vp.follow_state(), FollowState::UserDetached);
    drive(&mut vp);
    assert!(vp.at_top());
}

#[test]
fn test_shorter_viewport_keeps_newest_in_view() {
    let mut vp = pinned_with_lines(10);
    assert!(vp.set_size(20, 3).is_some());
    drive(&mut vp);

    assert_eq!(vp.follow_state(), FollowState::Pinned);
    assert_eq!(vp.scroll_state().client_height, 3.0);
    assert_at_bottom(&vp);
    assert!(vp.channel().is_at_bottom());
    assert!(vp.view().contains("line 9"));
}

#[test]
fn test_plain_style_has_no_frame() {
    let vp = Model::new(20, 5);
    assert_eq!(frame_size(&vp.style), (0, 0));
    assert_eq!(vp.scroll_state().client_height, 5.0);
}

#[test]
fn test_border_shrinks_content_area() {
    let mut vp = Model::new(20, 7).with_style(Style::new().border(normal_border()));
    assert_eq!(frame_size(&vp.style), (2, 2));
    assert_eq!(vp.scroll_state().client_height, 5.0);

    for i in 0..10 {
        vp.push_item(format!("line {i}"));
    }
    drive(&mut vp);
    assert_at_bottom(&vp);
    assert_eq!(vp.view().split('\n').count(), 7);
}

#[test]
fn test_with_config_validates() {
    let slow_animation = Config {
        settle_delay_ms: 100,
        ..Config::terminal()
    };
    assert!(matches!(
        Model::with_config(20, 5, slow_animation),
        Err(crate::error::Error::InvalidConfig(_))
    ));
    assert!(Model::with_config(20, 5, Config::terminal()).is_ok());
}
