#![no_main]

use libfuzzer_sys::fuzz_target;
use scrolltrial_core::{LineMetrics, WrappedText, line_char_span};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Cap length to keep fuzzing fast.
    if text.len() > 2048 {
        return;
    }

    let _ = LineMetrics::from_text(text);

    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    for width in [0, 1, 10, 40, 70, 200] {
        let wrapped = WrappedText::wrap(text, width);
        let metrics = wrapped.metrics();

        // Every line fits, and no visible character is lost or invented.
        assert!(
            metrics.counts().iter().all(|&c| c <= width.max(1)),
            "line wider than {width}"
        );
        let kept = wrapped.text().chars().filter(|c| !c.is_whitespace()).count();
        assert_eq!(kept, visible, "width {width} changed the visible text");

        // Spans index into the wrapped text.
        let total = wrapped.text().chars().count();
        for index in 0..metrics.line_count() {
            let (start, end) = line_char_span(index, metrics).unwrap();
            assert!(start <= end && end <= total);
        }
    }
});
