//! SRT subtitle export.

use reelsync_models::{format_srt_timestamp, CaptionContent, NarrationPlacement, ScheduledEvent};

/// One subtitle entry on the output timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<&ScheduledEvent<CaptionContent>> for SubtitleEntry {
    fn from(event: &ScheduledEvent<CaptionContent>) -> Self {
        Self {
            start: event.output_start,
            end: event.output_end,
            text: event.payload.text.clone(),
        }
    }
}

impl From<&ScheduledEvent<NarrationPlacement>> for SubtitleEntry {
    fn from(event: &ScheduledEvent<NarrationPlacement>) -> Self {
        Self {
            start: event.output_start,
            end: event.output_end,
            text: event.payload.text.clone(),
        }
    }
}

/// Render entries as SRT, numbered from 1 in start order.
///
/// ```
/// use reelsync_timeline::subtitles::{to_srt, SubtitleEntry};
/// let srt = to_srt(vec![SubtitleEntry { start: 0.0, end: 1.5, text: "Hi".into() }]);
/// assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nHi\n");
/// ```
pub fn to_srt(entries: impl IntoIterator<Item = SubtitleEntry>) -> String {
    let mut entries: Vec<SubtitleEntry> = entries
        .into_iter()
        .filter(|e| !e.text.trim().is_empty())
        .collect();
    entries.sort_by(|a, b| a.start.total_cmp(&b.start));

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_srt_timestamp(entry.start),
                format_srt_timestamp(entry.end),
                entry.text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: f64, end: f64, text: &str) -> SubtitleEntry {
        SubtitleEntry {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_entries_sorted_and_numbered() {
        let srt = to_srt(vec![entry(16.3, 19.3, "second"), entry(10.0, 16.0, "first")]);
        assert_eq!(
            srt,
            "1\n00:00:10,000 --> 00:00:16,000\nfirst\n\n2\n00:00:16,300 --> 00:00:19,300\nsecond\n"
        );
    }

    #[test]
    fn test_blank_entries_skipped() {
        let srt = to_srt(vec![entry(0.0, 1.0, "  "), entry(1.0, 2.0, "kept")]);
        assert!(srt.starts_with("1\n00:00:01,000"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(to_srt(Vec::new()), "");
    }
}
