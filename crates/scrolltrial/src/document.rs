#![forbid(unsafe_code)]

//! Document sources for 1D trials.

use scrolltrial_core::{LineMetrics, WrappedText};
use scrolltrial_runtime::config::VerticalConfig;

use crate::error::Result;

const FILLER: &[&str] = &[
    "the", "participant", "scrolls", "until", "highlighted", "line", "sits", "inside", "frame",
    "while", "pointer", "wheel", "ticks", "steadily", "across", "long", "document", "of", "plain",
    "text", "with", "occasional", "paragraph", "breaks",
];

/// Deterministic filler text of `paragraphs` paragraphs.
///
/// Paragraph lengths vary so the wrapped document has ragged lines and a
/// blank line between paragraphs.
#[must_use]
pub fn filler_text(paragraphs: usize) -> String {
    let mut out = String::new();
    let mut word = 0usize;
    for p in 0..paragraphs {
        if p > 0 {
            out.push_str("\n\n");
        }
        let words = 40 + (p * 37) % 90;
        for i in 0..words {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(FILLER[word % FILLER.len()]);
            word += 1 + (p + i) % 3;
        }
    }
    out
}

/// Wrapped document for `config`: the configured text file, or filler text
/// when none is set.
pub fn load_document(config: &VerticalConfig) -> Result<WrappedText> {
    let source = match &config.text_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            tracing::info!(
                target: "scrolltrial.document",
                path = %path.display(),
                bytes = text.len(),
                "document loaded"
            );
            text
        }
        None => filler_text(60),
    };
    let wrapped = WrappedText::wrap(&source, config.wrap_width);
    tracing::debug!(
        target: "scrolltrial.document",
        lines = wrapped.metrics().line_count(),
        wrap_width = config.wrap_width,
        "document wrapped"
    );
    Ok(wrapped)
}

/// Metrics only, for callers that never display the text.
pub fn load_metrics(config: &VerticalConfig) -> Result<LineMetrics> {
    Ok(load_document(config)?.into_parts().1)
}
