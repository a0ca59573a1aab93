//! Ordering invariants of region tracks under arbitrary edit sequences.

use proptest::prelude::*;
use reframe_project_model::{
    RegionPayload, RegionTrack, Spotlight, VideoCut, EDIT_EPSILON_SECS, MIN_INSERT_WIDTH_SECS,
};

#[derive(Debug, Clone)]
enum Edit {
    Add(f64),
    Start(usize, f64),
    End(usize, f64),
    Move(usize, f64),
    Remove(usize),
}

fn edit_strategy(duration: f64) -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (-5.0..duration + 5.0).prop_map(Edit::Add),
        2 => (0usize..8, -5.0..duration + 5.0).prop_map(|(i, v)| Edit::Start(i, v)),
        2 => (0usize..8, -5.0..duration + 5.0).prop_map(|(i, v)| Edit::End(i, v)),
        2 => (0usize..8, -20.0..duration + 20.0).prop_map(|(i, v)| Edit::Move(i, v)),
        1 => (0usize..8).prop_map(Edit::Remove),
    ]
}

fn apply<P: RegionPayload>(track: &mut RegionTrack<P>, edit: &Edit) {
    // Edits address regions by position; ids past the end exercise the no-op path.
    let id_at = |track: &RegionTrack<P>, i: usize| {
        track.regions().get(i).map(|r| r.id).unwrap_or(u64::MAX)
    };
    match *edit {
        Edit::Add(t) => {
            track.add_at(t);
        }
        Edit::Start(i, v) => {
            let id = id_at(&*track, i);
            track.update_start(id, v);
        }
        Edit::End(i, v) => {
            let id = id_at(&*track, i);
            track.update_end(id, v);
        }
        Edit::Move(i, v) => {
            let id = id_at(&*track, i);
            track.move_to(id, v);
        }
        Edit::Remove(i) => {
            let id = id_at(&*track, i);
            track.remove(id);
        }
    }
}

fn assert_invariants<P: RegionPayload>(track: &RegionTrack<P>) -> Result<(), TestCaseError> {
    let regions = track.regions();
    for region in regions {
        prop_assert!(region.start_secs >= 0.0, "negative start: {region:?}");
        prop_assert!(
            region.end_secs <= track.duration() + 1e-9,
            "end past duration: {region:?}"
        );
        prop_assert!(
            region.end_secs - region.start_secs >= EDIT_EPSILON_SECS - 1e-9,
            "region too short: {region:?}"
        );
    }
    for pair in regions.windows(2) {
        prop_assert!(
            pair[0].start_secs <= pair[1].start_secs,
            "unsorted: {pair:?}"
        );
        prop_assert!(
            pair[0].end_secs <= pair[1].start_secs + 1e-9,
            "overlap: {pair:?}"
        );
    }
    let mut ids: Vec<u64> = regions.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    prop_assert_eq!(ids.len(), regions.len());
    Ok(())
}

proptest! {
    #[test]
    fn video_track_stays_ordered(edits in prop::collection::vec(edit_strategy(60.0), 1..60)) {
        let mut track: RegionTrack<VideoCut> = RegionTrack::new(60.0);
        for edit in &edits {
            apply(&mut track, edit);
            assert_invariants(&track)?;
        }
    }

    #[test]
    fn spotlight_track_stays_ordered(edits in prop::collection::vec(edit_strategy(8.0), 1..60)) {
        let mut track: RegionTrack<Spotlight> = RegionTrack::new(8.0);
        for edit in &edits {
            apply(&mut track, edit);
            assert_invariants(&track)?;
        }
    }

    #[test]
    fn insert_into_narrow_gap_is_noop(gap in 0.0f64..(MIN_INSERT_WIDTH_SECS + 2.0 * 0.05 - 1e-6), frac in 0.0f64..1.0) {
        // Two regions separated by `gap`; the usable gap after margins is
        // `gap - 0.1`, always below the minimum insert width here.
        let mut track: RegionTrack<VideoCut> = RegionTrack::new(100.0);
        track.insert(0.0, 10.0, VideoCut::default()).unwrap();
        track.insert(10.0 + gap, 30.0, VideoCut::default()).unwrap();
        let before = track.clone();

        prop_assert_eq!(track.add_at(10.0 + gap * frac), None);
        prop_assert_eq!(track, before);
    }
}

#[test]
fn scenario_insert_into_empty_track() {
    let mut track: RegionTrack<VideoCut> = RegionTrack::new(100.0);
    track.add_at(50.0).unwrap();
    let region = &track.regions()[0];
    assert_eq!((region.start_secs, region.end_secs), (45.0, 55.0));
}

#[test]
fn scenario_insert_between_neighbours() {
    let mut track: RegionTrack<VideoCut> = RegionTrack::new(100.0);
    track.insert(0.0, 10.0, VideoCut::default()).unwrap();
    track.insert(20.0, 30.0, VideoCut::default()).unwrap();

    track.add_at(15.0).unwrap();

    let bounds: Vec<(f64, f64)> = track
        .regions()
        .iter()
        .map(|r| (r.start_secs, r.end_secs))
        .collect();
    assert_eq!(bounds.len(), 3);
    assert!((bounds[1].0 - 10.05).abs() < 1e-9);
    assert!((bounds[1].1 - 19.95).abs() < 1e-9);
    assert!(bounds.windows(2).all(|w| w[0].1 <= w[1].0));
}
