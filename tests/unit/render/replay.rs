use super::*;

use std::sync::Mutex;

use kurbo::{Rect, Shape};

use crate::foundation::core::Rgba8Premul;
use crate::journal::Journal;
use crate::render::raster::SoftwareRasterizer;
use crate::render::tile::partition;
use crate::surface::image::ImageSurface;

#[derive(Default)]
struct Recorder {
    clips: Mutex<Vec<IntRect>>,
    fail_on: Option<usize>,
}

impl Recorder {
    fn record(&self, clip: &Clip) -> RasterResult<DrawStatus> {
        let mut clips = self.clips.lock().unwrap();
        if self.fail_on == Some(clips.len()) {
            return Err(RasterError::validation("backend refused"));
        }
        clips.push(clip.extents());
        Ok(DrawStatus::Drawn)
    }
}

impl ReplayBackend for Recorder {
    fn paint(&self, _: Operator, _: &Pattern, clip: &Clip) -> RasterResult<DrawStatus> {
        self.record(clip)
    }
    fn mask(&self, _: Operator, _: &Pattern, _: &Pattern, clip: &Clip) -> RasterResult<DrawStatus> {
        self.record(clip)
    }
    fn fill(&self, _: Operator, _: &Pattern, _: &FillParams, clip: &Clip) -> RasterResult<DrawStatus> {
        self.record(clip)
    }
    fn stroke(&self, _: Operator, _: &Pattern, _: &StrokeParams, clip: &Clip) -> RasterResult<DrawStatus> {
        self.record(clip)
    }
    fn glyphs(&self, _: Operator, _: &Pattern, _: &GlyphRun, clip: &Clip) -> RasterResult<DrawStatus> {
        self.record(clip)
    }
}

fn fill(j: &Journal, rect: Rect, color: Rgba8Premul) {
    j.log_fill(
        Operator::Over,
        &Pattern::solid(color),
        &FillParams::new(rect.to_path(0.1)),
        &Clip::from_rect(IntRect::from_size(32, 32)),
    )
    .unwrap();
}

#[test]
fn restricted_replay_culls_and_narrows_clips() {
    let j = Journal::default();
    fill(&j, Rect::new(0.0, 0.0, 8.0, 4.0), Rgba8Premul::opaque(255, 0, 0));
    fill(&j, Rect::new(0.0, 20.0, 8.0, 24.0), Rgba8Premul::opaque(0, 255, 0));
    fill(&j, Rect::new(0.0, 2.0, 8.0, 22.0), Rgba8Premul::opaque(0, 0, 255));

    let rec = Recorder::default();
    let n = replay(&j.snapshot(), Some(IntRect::new(0, 0, 32, 10)), &rec).unwrap();
    assert_eq!(n, 2);
    assert_eq!(
        *rec.clips.lock().unwrap(),
        vec![IntRect::new(0, 0, 32, 10), IntRect::new(0, 0, 32, 10)]
    );

    let rec = Recorder::default();
    assert_eq!(replay(&j.snapshot(), None, &rec).unwrap(), 3);
    assert_eq!(rec.clips.lock().unwrap()[1], IntRect::from_size(32, 32));
}

#[test]
fn backend_error_becomes_replay_error() {
    let j = Journal::default();
    fill(&j, Rect::new(0.0, 0.0, 4.0, 4.0), Rgba8Premul::opaque(255, 0, 0));
    fill(&j, Rect::new(0.0, 0.0, 4.0, 4.0), Rgba8Premul::opaque(255, 0, 0));
    let rec = Recorder {
        fail_on: Some(1),
        ..Recorder::default()
    };
    let err = replay(&j.snapshot(), None, &rec).unwrap_err();
    assert!(matches!(err, RasterError::Replay(_)));
    assert!(err.to_string().contains("fill entry 1"));
}

#[test]
fn tile_jobs_match_direct_replay() {
    let j = Journal::default();
    fill(&j, Rect::new(1.5, 1.5, 20.0, 12.0), Rgba8Premul::opaque(255, 0, 0));
    fill(&j, Rect::new(6.0, 5.25, 30.0, 28.0), Rgba8Premul { r: 0, g: 0, b: 128, a: 128 });
    let snap = j.snapshot();
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(SoftwareRasterizer);

    let direct = ImageSurface::new(32, 32).unwrap();
    replay(&snap, None, &DirectBackend::new(rasterizer.as_ref(), direct.full_view())).unwrap();

    let tiled = ImageSurface::new(32, 32).unwrap();
    let job = ReplayJob::new(snap, rasterizer);
    for tile in partition(&tiled, j.dirty_extents(), 5).unwrap() {
        job.run_tile(&tile).unwrap();
    }
    assert_eq!(direct.to_rgba8(), tiled.to_rgba8());
}
