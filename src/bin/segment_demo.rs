use dominant_segments::config::segment_demo;
use dominant_segments::diagnostics::RunReport;
use dominant_segments::image::io::{
    load_color_image, render_segments, save_color_image, write_json_file,
};
use dominant_segments::image::SegmentPalette;
use dominant_segments::{
    LogObserver, Segment, SegmentationController, SegmentationMode, SegmentationObserver,
};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = segment_demo::load_config(Path::new(&config_path))?;
    let mode = match env::args().nth(2) {
        Some(raw) => raw.parse::<SegmentationMode>().map_err(|e| e.to_string())?,
        None => config.mode,
    };

    let image = load_color_image(&config.input)?;
    let passes = if config.verbose_events {
        segment_with(SegmentationController::new(LogObserver), image.clone(), mode, &config)?
    } else {
        segment_with(SegmentationController::new(()), image.clone(), mode, &config)?
    };

    let mut summaries = Vec::with_capacity(passes.len());
    for (pass_mode, segments, report) in passes {
        let mut palette = SegmentPalette::new();
        let labels = render_segments(&image, &segments, &mut palette);
        let label_path = config.output.label_image_for(pass_mode);
        save_color_image(&labels, &label_path)?;
        println!(
            "{pass_mode}: {} segments in {:.1} ms, label image saved to {}",
            segments.len(),
            report.timings.total_ms,
            label_path.display()
        );
        summaries.push(PassSummary {
            mode: pass_mode,
            segments,
            report,
        });
    }

    write_json_file(&config.output.result_json, &DemoReport { passes: summaries })?;
    println!(
        "Saved segmentation results to {}",
        config.output.result_json.display()
    );
    Ok(())
}

type PassOutput = (SegmentationMode, Vec<Segment>, RunReport);

fn segment_with<O: SegmentationObserver>(
    controller: SegmentationController<O>,
    image: dominant_segments::image::ColorImage,
    mode: SegmentationMode,
    config: &segment_demo::SegmentDemoConfig,
) -> Result<Vec<PassOutput>, String> {
    controller.open_image(image).map_err(|e| e.to_string())?;
    let results = controller
        .segment(mode, &config.params)
        .map_err(|e| e.to_string())?;
    Ok(results
        .into_iter()
        .map(|r| (r.mode, r.segments, r.report))
        .collect())
}

fn usage() -> String {
    "Usage: segment_demo <config.json> [quick|deep|both]".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PassSummary {
    mode: SegmentationMode,
    segments: Vec<Segment>,
    report: RunReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoReport {
    passes: Vec<PassSummary>,
}
