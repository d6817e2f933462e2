#![no_main]

use libfuzzer_sys::fuzz_target;
use scrolltrial_core::{
    AxisExtent, acceptance_window_1d, acceptance_window_2d, is_inside_window, reachable_line_range,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }
    let visible = usize::from(u16::from_le_bytes([data[0], data[1]]) % 512);
    let frame = usize::from(data[2] % 64);
    let line_count = usize::from(u16::from_le_bytes([data[3], data[4]]) % 4096);
    let unit = i64::from(data[5] % 64);
    let scroll_max = i64::from(u16::from_le_bytes([data[6], data[7]]));

    // Errors are fine; panics are not.
    let Ok((lo, hi)) = reachable_line_range(visible, frame, line_count) else {
        return;
    };
    for line in [lo, (lo + hi) / 2, hi] {
        let window = acceptance_window_1d(frame, line, visible, unit).unwrap();
        assert_eq!(window.span(), (frame as i64 - 1) * unit);
        assert!(is_inside_window(window.max(), &window));
        assert_eq!(window.distance(window.min()), 0);

        // Reachable lines intersect the scrollable range.
        assert!(window.max() >= 0);
        let scroll_lines = line_count.saturating_sub(visible) as i64;
        assert!(window.min() <= scroll_lines * unit);
    }

    if line_count > visible {
        let axis = AxisExtent::new(line_count, visible, scroll_max);
        let _ = acceptance_window_2d(frame, lo, hi, axis, axis);
    }
});
