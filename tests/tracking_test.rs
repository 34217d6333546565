use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};
use scenetrack::integration::{MemorySink, frame_stride};
use scenetrack::tracker::TrackTrajectory;
use scenetrack::{
    AdapterError, AdapterUpdate, Annotation, BoundsPolicy, CancelToken, Frame, FrameEntry,
    FrameObserver, FrameSource, FrameSourceError, MemoryFrames, MemoryStore, Rect, TrackEntry,
    TrackStatus, TrackerAdapter, TrackerConfig, TrackingError, TrackingPipeline, TrackingSession,
    TrajectoryRecorder, TrajectoryStore,
};

/// Moves the box by (+1, +1) per update; fails from frame `fail_at` on.
struct Shifting {
    bbox: Option<Rect>,
    fail_at: Option<usize>,
    init_ok: bool,
    updates: Arc<AtomicUsize>,
}

impl Shifting {
    fn new() -> Self {
        Self {
            bbox: None,
            fail_at: None,
            init_ok: true,
            updates: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TrackerAdapter for Shifting {
    fn initialize(&mut self, _frame: &Frame, bbox: Rect) -> Result<(), AdapterError> {
        if !self.init_ok {
            return Err(AdapterError::InitFailure("scripted".into()));
        }
        self.bbox = Some(bbox);
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<AdapterUpdate, AdapterError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let bbox = self.bbox.ok_or(AdapterError::NotInitialized)?;
        if self.fail_at.is_some_and(|at| frame.index() >= at) {
            return Ok(AdapterUpdate::missed(bbox));
        }
        let moved = Rect::new(bbox.x + 1.0, bbox.y + 1.0, bbox.width, bbox.height);
        self.bbox = Some(moved);
        Ok(AdapterUpdate::found(moved, 0.9))
    }
}

fn blank_frames(n: usize) -> MemoryFrames {
    MemoryFrames::new((0..n).map(|_| RgbImage::new(64, 64)))
}

fn obj1() -> Annotation {
    Annotation::new("obj1", Rect::new(10.0, 10.0, 20.0, 20.0))
}

fn session() -> TrackingSession {
    TrackingSession::new("video-1", TrackerConfig::default()).unwrap()
}

fn entry(frame: usize, x: f32, status: TrackStatus, confidence: f32) -> TrackEntry {
    TrackEntry {
        frame_index: frame,
        bbox: Rect::new(x, x, 20.0, 20.0),
        status,
        confidence,
    }
}

#[test]
fn test_shifting_object_history() {
    let result = session()
        .run(&mut blank_frames(3), &[obj1()], |_| Shifting::new(), &mut ())
        .unwrap();

    assert!(result.complete);
    assert_eq!(
        result.get("obj1").unwrap(),
        &[
            entry(0, 10.0, TrackStatus::Active, 1.0),
            entry(1, 11.0, TrackStatus::Active, 0.9),
            entry(2, 12.0, TrackStatus::Active, 0.9),
        ]
    );
}

#[test]
fn test_update_failure_freezes_box() {
    let result = session()
        .run(
            &mut blank_frames(5),
            &[obj1()],
            |_| Shifting {
                fail_at: Some(2),
                ..Shifting::new()
            },
            &mut (),
        )
        .unwrap();

    assert_eq!(
        result.get("obj1").unwrap(),
        &[
            entry(0, 10.0, TrackStatus::Active, 1.0),
            entry(1, 11.0, TrackStatus::Active, 0.9),
            entry(2, 11.0, TrackStatus::Lost, 0.0),
            entry(3, 11.0, TrackStatus::Lost, 0.0),
            entry(4, 11.0, TrackStatus::Lost, 0.0),
        ]
    );
}

#[test]
fn test_lost_track_is_not_updated_again() {
    let updates = Arc::new(AtomicUsize::new(0));
    let counter = updates.clone();
    session()
        .run(
            &mut blank_frames(10),
            &[obj1()],
            move |_| Shifting {
                fail_at: Some(3),
                updates: counter.clone(),
                ..Shifting::new()
            },
            &mut (),
        )
        .unwrap();

    // Frames 1, 2 succeed, frame 3 fails, nothing after.
    assert_eq!(updates.load(Ordering::SeqCst), 3);
}

#[test]
fn test_single_frame_session() {
    let annotations = [obj1(), Annotation::new("obj2", Rect::new(30.0, 5.0, 8.0, 12.0))];
    let result = session()
        .run(&mut blank_frames(1), &annotations, |_| Shifting::new(), &mut ())
        .unwrap();

    assert_eq!(result.frames_processed, 1);
    assert_eq!(result.get("obj1").unwrap(), &[entry(0, 10.0, TrackStatus::Active, 1.0)]);
    assert_eq!(
        result.get("obj2").unwrap(),
        &[TrackEntry::active(0, Rect::new(30.0, 5.0, 8.0, 12.0), 1.0)]
    );
}

#[test]
fn test_init_failure_degrades_one_track() {
    let bad = Annotation::new("bad", Rect::new(40.0, 40.0, 10.0, 10.0));
    let annotations = [bad.clone(), obj1()];
    let result = session()
        .run(
            &mut blank_frames(4),
            &annotations,
            |a: &Annotation| Shifting {
                init_ok: a.id != "bad",
                ..Shifting::new()
            },
            &mut (),
        )
        .unwrap();

    assert!(result.complete);
    let lost = result.get("bad").unwrap();
    assert_eq!(lost.len(), 4);
    for (i, e) in lost.iter().enumerate() {
        assert_eq!(*e, TrackEntry::lost(i, bad.bbox));
    }
    let good = result.get("obj1").unwrap();
    assert!(good.iter().all(|e| e.status == TrackStatus::Active));
    assert_eq!(good[3].bbox, Rect::new(13.0, 13.0, 20.0, 20.0));
}

#[test]
fn test_zero_width_fails_before_frames() {
    struct Untouchable;
    impl FrameSource for Untouchable {
        fn next_image(&mut self) -> Option<Result<RgbImage, FrameSourceError>> {
            panic!("frame read before validation");
        }
    }

    let annotations = [Annotation::new("obj1", Rect::new(10.0, 10.0, 0.0, 20.0))];
    let err = session()
        .run(&mut Untouchable, &annotations, |_| Shifting::new(), &mut ())
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidInput(_)));
    assert_eq!(err.http_status(), 400);
}

#[test]
fn test_out_of_frame_annotation_rejected_before_init() {
    let initialized = Arc::new(AtomicUsize::new(0));
    let counter = initialized.clone();
    let annotations = [obj1(), Annotation::new("far", Rect::new(500.0, 500.0, 5.0, 5.0))];
    let err = session()
        .run(
            &mut blank_frames(3),
            &annotations,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Shifting::new()
            },
            &mut (),
        )
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidInput(_)));
    assert_eq!(initialized.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancellation_returns_partial_result() {
    struct CancelAfter {
        token: CancelToken,
        frame: usize,
    }
    impl FrameObserver for CancelAfter {
        fn on_frame(&mut self, frame: &Frame, _entries: &[FrameEntry<'_>]) -> Result<(), TrackingError> {
            if frame.index() == self.frame {
                self.token.cancel();
            }
            Ok(())
        }
    }

    let session = session();
    let mut observer = CancelAfter {
        token: session.cancel_token(),
        frame: 2,
    };
    let result = session
        .run(&mut blank_frames(10), &[obj1()], |_| Shifting::new(), &mut observer)
        .unwrap();

    assert!(!result.complete);
    assert_eq!(result.frames_processed, 3);
    assert_eq!(result.get("obj1").unwrap().len(), 3);
}

#[test]
fn test_frame_source_failure_carries_partial_result() {
    struct Failing {
        served: usize,
    }
    impl FrameSource for Failing {
        fn next_image(&mut self) -> Option<Result<RgbImage, FrameSourceError>> {
            self.served += 1;
            if self.served > 3 {
                return Some(Err(FrameSourceError::Missing("frame_000003.jpg".into())));
            }
            Some(Ok(RgbImage::new(64, 64)))
        }
    }

    let err = session()
        .run(&mut Failing { served: 0 }, &[obj1()], |_| Shifting::new(), &mut ())
        .unwrap_err();

    assert_eq!(err.http_status(), 500);
    let TrackingError::FrameSource {
        frame_index,
        partial,
        ..
    } = err
    else {
        panic!("expected a frame source error");
    };
    assert_eq!(frame_index, 3);
    assert!(!partial.complete);
    assert_eq!(partial.get("obj1").unwrap().len(), 3);
}

#[test]
fn test_parallel_updates_match_sequential() {
    let annotations: Vec<Annotation> = (0..12)
        .map(|i| Annotation::new(format!("obj{i}"), Rect::new(i as f32, 2.0, 4.0, 4.0)))
        .collect();
    let make = |a: &Annotation| Shifting {
        fail_at: Some(3 + a.bbox.x as usize % 5),
        ..Shifting::new()
    };

    let sequential = session()
        .run(&mut blank_frames(9), &annotations, make, &mut ())
        .unwrap();
    let parallel_config = TrackerConfig {
        workers: 4,
        ..TrackerConfig::default()
    };
    let parallel = TrackingSession::new("video-1", parallel_config)
        .unwrap()
        .run(&mut blank_frames(9), &annotations, make, &mut ())
        .unwrap();

    assert_eq!(sequential, parallel);
    let ids: Vec<&str> = parallel.track_ids().collect();
    let expected: Vec<String> = (0..12).map(|i| format!("obj{i}")).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn test_pipeline_overwrites_stored_result() {
    let mut pipeline = TrackingPipeline::with_default_config(MemoryStore::new());
    let payload = r#"[{"id": "obj1", "x": 10, "y": 10, "width": 20, "height": 20}]"#;

    let first = pipeline
        .track_json("video-1", &mut blank_frames(6), payload, &mut ())
        .unwrap();
    let second = pipeline
        .track_json("video-1", &mut blank_frames(3), payload, &mut ())
        .unwrap();

    assert_eq!(first.frames_processed, 6);
    assert_eq!(pipeline.store().len(), 1);
    let stored = pipeline.trajectory("video-1").unwrap();
    assert_eq!(stored, second);
    assert_eq!(stored.get("obj1").unwrap().len(), 3);
}

#[test]
fn test_pipeline_does_not_store_cancelled_run() {
    let mut pipeline = TrackingPipeline::with_default_config(MemoryStore::new());
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = pipeline
        .track_cancellable("video-1", &mut blank_frames(4), &[obj1()], &mut (), cancel)
        .unwrap();

    assert!(!result.complete);
    assert_eq!(result.frames_processed, 1);
    assert!(pipeline.store().load("video-1").unwrap().is_none());
}

/// Noise texture so the correlation tracker has something to lock on to.
fn textured(seed: u32, x: u32, y: u32) -> u8 {
    let mut h = seed ^ x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    (h & 0xFF) as u8
}

fn moving_scene(frames: u32) -> Vec<RgbImage> {
    (0..frames)
        .map(|i| {
            let (ox, oy) = (12 + 2 * i, 16 + i);
            RgbImage::from_fn(96, 80, |x, y| {
                let inside = x >= ox && x < ox + 14 && y >= oy && y < oy + 14;
                let v = if inside {
                    textured(7, x - ox, y - oy)
                } else {
                    textured(99, x, y)
                };
                Rgb([v, v, v])
            })
        })
        .collect()
}

#[test]
fn test_end_to_end_with_correlation_backend() {
    let mut pipeline = TrackingPipeline::with_default_config(MemoryStore::new());
    let mut source = MemoryFrames::new(moving_scene(8));
    let mut recorder = TrajectoryRecorder::new(MemorySink::default(), frame_stride(30.0, 10.0));
    let annotations = [Annotation::new("ball", Rect::new(12.0, 16.0, 14.0, 14.0))];

    let result = pipeline
        .track("clip", &mut source, &annotations, &mut recorder)
        .unwrap();
    recorder.finish().unwrap();

    let history = result.get("ball").unwrap();
    assert_eq!(history.len(), 8);
    for (i, e) in history.iter().enumerate() {
        assert_eq!(e.status, TrackStatus::Active, "frame {i}");
        assert_eq!(e.bbox, Rect::new(12.0 + 2.0 * i as f32, 16.0 + i as f32, 14.0, 14.0));
    }

    // Frames 0, 3, 6 at a stride of 3.
    assert_eq!(recorder.written(), 3);
    let overlays = recorder.into_sink().frames;
    assert_eq!(overlays.len(), 3);
    assert_eq!(*overlays[1].get_pixel(18, 19), Rgb([0, 0, 255]));

    let stored: Vec<TrackTrajectory> = pipeline.trajectory("clip").unwrap().tracks().to_vec();
    assert_eq!(stored, result.tracks().to_vec());
}

#[test]
fn test_confidence_above_one_is_clamped() {
    struct Overconfident;
    impl TrackerAdapter for Overconfident {
        fn initialize(&mut self, _frame: &Frame, _bbox: Rect) -> Result<(), AdapterError> {
            Ok(())
        }

        fn update(&mut self, _frame: &Frame) -> Result<AdapterUpdate, AdapterError> {
            Ok(AdapterUpdate::found(Rect::new(10.0, 10.0, 20.0, 20.0), 1.7))
        }
    }

    let result = session()
        .run(&mut blank_frames(3), &[obj1()], |_| Overconfident, &mut ())
        .unwrap();
    let history = result.get("obj1").unwrap();
    assert!(history.iter().all(|e| e.status == TrackStatus::Active));
    assert!(history.iter().all(|e| e.confidence == 1.0));
}

#[test]
fn test_bounds_policy_for_straddling_annotation() {
    let straddling = [Annotation::new("edge", Rect::new(-4.0, 10.0, 10.0, 10.0))];

    let reject = TrackerConfig {
        bounds: BoundsPolicy::Reject,
        ..TrackerConfig::default()
    };
    let err = TrackingSession::new("video-1", reject)
        .unwrap()
        .run(&mut blank_frames(2), &straddling, |_| Shifting::new(), &mut ())
        .unwrap_err();
    assert_eq!(err.http_status(), 400);

    let result = session()
        .run(&mut blank_frames(2), &straddling, |_| Shifting::new(), &mut ())
        .unwrap();
    assert_eq!(
        result.get("edge").unwrap()[0],
        TrackEntry::active(0, Rect::new(0.0, 10.0, 6.0, 10.0), 1.0)
    );
}

#[test]
fn test_invalid_correlation_config_rejected_by_session() {
    let mut config = TrackerConfig::default();
    config.correlation.min_peak = f32::NAN;
    assert!(matches!(
        TrackingSession::new("video-1", config),
        Err(TrackingError::Config(_))
    ));
}

#[test]
fn test_static_fractional_annotation_keeps_its_box() {
    let still: Vec<RgbImage> = (0..3)
        .map(|_| {
            RgbImage::from_fn(64, 64, |x, y| {
                let v = textured(3, x, y);
                Rgb([v, v, v])
            })
        })
        .collect();
    let requested = Rect::new(20.4, 20.4, 14.6, 14.6);
    let mut pipeline = TrackingPipeline::with_default_config(MemoryStore::new());
    let result = pipeline
        .track(
            "still",
            &mut MemoryFrames::new(still),
            &[Annotation::new("obj", requested)],
            &mut (),
        )
        .unwrap();

    for e in result.get("obj").unwrap() {
        assert_eq!(e.status, TrackStatus::Active);
        assert_eq!(e.bbox, requested);
    }
}
