//! Filter graph builders for each render stage.

use std::path::Path;

use reelsync_models::{
    BackgroundAudio, CaptionContent, CaptionPosition, Canvas, NarrationPlacement,
    RetimeInstruction, ScheduledEvent,
};

use crate::filter_graph::{secs, Filter, FilterChain, FilterGraph};

/// Output pad of the video chain.
pub const VIDEO_OUT: &str = "vout";
/// Output pad of the audio chain.
pub const AUDIO_OUT: &str = "aout";

/// Trim + retime every segment of input 0 and concatenate them in order.
///
/// Video timestamps are divided by the speed; audio is re-tempoed through
/// the segment's `atempo` chain. Sources without audio produce a
/// video-only graph.
pub fn retime_graph(segments: &[ScheduledEvent<RetimeInstruction>], has_audio: bool) -> FilterGraph {
    let mut graph = FilterGraph::new();
    let mut concat = FilterChain::new();

    for (i, event) in segments.iter().enumerate() {
        let seg = &event.payload;
        graph.push(
            FilterChain::new()
                .input("0:v")
                .filter(
                    Filter::new("trim")
                        .arg("start", secs(seg.source_start))
                        .arg("end", secs(seg.source_end)),
                )
                .filter(Filter::new("setpts").positional(setpts_expr(seg.speed)))
                .output(format!("v{}", i)),
        );
        concat = concat.input(format!("v{}", i));

        if has_audio {
            let mut chain = FilterChain::new()
                .input("0:a")
                .filter(
                    Filter::new("atrim")
                        .arg("start", secs(seg.source_start))
                        .arg("end", secs(seg.source_end)),
                )
                .filter(Filter::new("asetpts").positional("PTS-STARTPTS"));
            for factor in seg.tempo_chain.iter().filter(|f| (**f - 1.0).abs() > 1e-9) {
                chain = chain.filter(Filter::new("atempo").positional(format!("{:.6}", factor)));
            }
            graph.push(chain.output(format!("a{}", i)));
            concat = concat.input(format!("a{}", i));
        }
    }

    let audio_streams = if has_audio { 1 } else { 0 };
    concat = concat
        .filter(
            Filter::new("concat")
                .arg("n", segments.len())
                .arg("v", 1)
                .arg("a", audio_streams),
        )
        .output(VIDEO_OUT);
    if has_audio {
        concat = concat.output(AUDIO_OUT);
    }
    graph.chain(concat)
}

fn setpts_expr(speed: f64) -> String {
    if (speed - 1.0).abs() < 1e-9 {
        "PTS-STARTPTS".to_string()
    } else {
        format!("(PTS-STARTPTS)/{:.6}", speed)
    }
}

/// Blur-fill the canvas: a scaled, cropped and blurred copy of the frame
/// fills the background, the frame itself is fitted and centered on top.
pub fn blur_fill_graph(canvas: &Canvas) -> FilterGraph {
    FilterGraph::new()
        .chain(
            FilterChain::new()
                .input("0:v")
                .filter(Filter::new("split").positional(2))
                .output("bg")
                .output("fg"),
        )
        .chain(
            FilterChain::new()
                .input("bg")
                .filter(
                    Filter::new("scale")
                        .positional(canvas.width)
                        .positional(canvas.height)
                        .arg("force_original_aspect_ratio", "increase"),
                )
                .filter(Filter::new("crop").positional(canvas.width).positional(canvas.height))
                .filter(Filter::new("boxblur").positional(canvas.blur))
                .output("bgb"),
        )
        .chain(
            FilterChain::new()
                .input("fg")
                .filter(
                    Filter::new("scale")
                        .positional(canvas.width)
                        .positional(canvas.height)
                        .arg("force_original_aspect_ratio", "decrease"),
                )
                .output("fgs"),
        )
        .chain(
            FilterChain::new()
                .input("bgb")
                .input("fgs")
                .filter(Filter::new("overlay").positional("(W-w)/2").positional("(H-h)/2"))
                .filter(Filter::new("setsar").positional(1))
                .output(VIDEO_OUT),
        )
}

/// One `drawtext` filter for a caption whose text lives in `textfile`.
pub fn drawtext_filter(
    caption: &ScheduledEvent<CaptionContent>,
    textfile: &Path,
    fontfile: &Path,
) -> Filter {
    let style = &caption.payload.style;
    let y = match style.position {
        CaptionPosition::Centered { offset_y } if offset_y < 0 => {
            format!("(h-text_h)/2-{}", offset_y.unsigned_abs())
        }
        CaptionPosition::Centered { offset_y } => format!("(h-text_h)/2+{}", offset_y),
        CaptionPosition::Top { y } => y.to_string(),
        CaptionPosition::Bottom { margin } => format!("h-text_h-{}", margin),
    };

    let mut filter = Filter::new("drawtext")
        .arg("fontfile", fontfile.to_string_lossy())
        .arg("textfile", textfile.to_string_lossy())
        .arg("expansion", "none")
        .arg("fontsize", style.size)
        .arg("fontcolor", &style.color)
        .arg("borderw", style.border_width)
        .arg("bordercolor", "black");
    if style.shadow > 0 {
        filter = filter
            .arg("shadowx", style.shadow)
            .arg("shadowy", style.shadow)
            .arg("shadowcolor", "black@0.6");
    }
    if style.box_opacity > 0.0 {
        filter = filter
            .arg("box", 1)
            .arg("boxcolor", format!("black@{:.2}", style.box_opacity))
            .arg("boxborderw", style.box_border);
    }
    filter
        .arg("x", "(w-text_w)/2")
        .arg("y", y)
        .arg(
            "enable",
            format!(
                "between(t,{},{})",
                secs(caption.output_start),
                secs(caption.output_end)
            ),
        )
}

/// Plain `-vf` style chain of drawtext filters, one per caption.
pub fn overlay_chain(filters: Vec<Filter>) -> FilterChain {
    filters
        .into_iter()
        .fold(FilterChain::new(), |chain, filter| chain.filter(filter))
}

/// Mix the background under every narration placement.
///
/// Input 0 carries the background (the rendered video's own audio, or a
/// generated silence at `background_input`); narration `i` is input
/// `first_narration_input + i`.
pub fn mix_graph(
    background: &BackgroundAudio,
    background_input: usize,
    narration: &[ScheduledEvent<NarrationPlacement>],
    first_narration_input: usize,
) -> FilterGraph {
    let mut graph = FilterGraph::new();
    let bg = FilterChain::new().input(format!("{}:a", background_input));
    let bg = match background {
        BackgroundAudio::SourceTrack { gain } => {
            bg.filter(Filter::new("volume").positional(format!("{:.3}", gain)))
        }
        BackgroundAudio::Silence => bg.filter(Filter::new("anull")),
    };

    if narration.is_empty() {
        return graph.chain(bg.output(AUDIO_OUT));
    }
    graph.push(bg.output("bg"));

    let mut mix = FilterChain::new().input("bg");
    for (i, event) in narration.iter().enumerate() {
        let placement = &event.payload;
        let label = format!("n{}", i);
        graph.push(
            FilterChain::new()
                .input(format!("{}:a", first_narration_input + i))
                .filter(
                    Filter::new("adelay")
                        .positional(format!("{}|{}", placement.delay_ms, placement.delay_ms)),
                )
                .filter(Filter::new("volume").positional(format!("{:.3}", placement.gain)))
                .output(label.clone()),
        );
        mix = mix.input(label);
    }

    graph.chain(
        mix.filter(
            Filter::new("amix")
                .arg("inputs", narration.len() + 1)
                .arg("duration", "first")
                .arg("dropout_transition", 0)
                .arg("normalize", 0),
        )
        .output(AUDIO_OUT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_models::CaptionStyle;
    use std::path::PathBuf;

    fn segment(start: f64, end: f64, speed: f64, out: (f64, f64), chain: Vec<f64>) -> ScheduledEvent<RetimeInstruction> {
        ScheduledEvent::new(
            out.0,
            out.1,
            RetimeInstruction {
                source_start: start,
                source_end: end,
                speed,
                tempo_chain: chain,
            },
        )
    }

    #[test]
    fn test_retime_graph_with_audio() {
        let graph = retime_graph(
            &[
                segment(0.0, 18.0, 4.0, (0.0, 4.5), vec![2.0, 2.0]),
                segment(18.0, 30.0, 1.0, (4.5, 16.5), vec![1.0]),
            ],
            true,
        );
        let text = graph.to_string();
        assert!(text.starts_with("[0:v]trim=start=0.000:end=18.000,setpts=(PTS-STARTPTS)/4.000000[v0]"));
        assert!(text.contains("[0:a]atrim=start=0.000:end=18.000,asetpts=PTS-STARTPTS,atempo=2.000000,atempo=2.000000[a0]"));
        assert!(text.contains("[0:a]atrim=start=18.000:end=30.000,asetpts=PTS-STARTPTS[a1]"));
        assert!(text.ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[vout][aout]"));
    }

    #[test]
    fn test_retime_graph_without_audio() {
        let text = retime_graph(&[segment(0.0, 5.0, 2.0, (0.0, 2.5), vec![2.0])], false).to_string();
        assert!(!text.contains("atrim"));
        assert!(text.ends_with("[v0]concat=n=1:v=1:a=0[vout]"));
    }

    #[test]
    fn test_blur_fill_graph() {
        let text = blur_fill_graph(&Canvas::default()).to_string();
        assert_eq!(
            text,
            "[0:v]split=2[bg][fg];\
             [bg]scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,boxblur=12[bgb];\
             [fg]scale=1080:1920:force_original_aspect_ratio=decrease[fgs];\
             [bgb][fgs]overlay=(W-w)/2:(H-h)/2,setsar=1[vout]"
        );
    }

    #[test]
    fn test_drawtext_filter() {
        let caption = ScheduledEvent::new(
            1.0,
            3.5,
            CaptionContent {
                text: "ignored, lives in the textfile".to_string(),
                style: CaptionStyle::title(),
            },
        );
        let text = drawtext_filter(&caption, Path::new("/tmp/cap_0.txt"), Path::new("/fonts/bold.ttf"))
            .to_string();
        assert!(text.starts_with("drawtext=fontfile=/fonts/bold.ttf:textfile=/tmp/cap_0.txt:expansion=none"));
        assert!(text.contains("fontcolor=#FFD700"));
        assert!(text.contains("y=(h-text_h)/2-110"));
        assert!(text.contains(r"enable=between(t\,1.000\,3.500)"));
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn test_mix_graph() {
        let narration = vec![ScheduledEvent::new(
            0.3,
            4.0,
            NarrationPlacement {
                cue_index: 0,
                text: "hello".to_string(),
                audio_path: PathBuf::from("n0.mp3"),
                delay_ms: 300,
                gain: 1.5,
            },
        )];
        let text = mix_graph(&BackgroundAudio::SourceTrack { gain: 0.3 }, 0, &narration, 1).to_string();
        assert_eq!(
            text,
            "[0:a]volume=0.300[bg];[1:a]adelay=300|300,volume=1.500[n0];\
             [bg][n0]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[aout]"
        );
    }

    #[test]
    fn test_mix_graph_silence_without_narration() {
        let text = mix_graph(&BackgroundAudio::Silence, 1, &[], 2).to_string();
        assert_eq!(text, "[1:a]anull[aout]");
    }
}
