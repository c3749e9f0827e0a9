//! Property tests for point collections.

use meshprobe::{PointCollections, Vec3};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Add(f32),
    Remove(usize),
    Select(Option<usize>),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (-10.0f32..10.0).prop_map(Edit::Add),
        (0usize..16).prop_map(Edit::Remove),
        proptest::option::of(0usize..16).prop_map(Edit::Select),
    ]
}

proptest! {
    #[test]
    fn keys_track_points(edits in proptest::collection::vec(arb_edit(), 0..40)) {
        let mut collections = PointCollections::default();
        collections.create_for("node");
        // reference model: (key, x) in point order
        let mut model: Vec<(u32, f32)> = Vec::new();

        for edit in edits {
            match edit {
                Edit::Add(x) => {
                    let selected = collections.get("node").unwrap().selected_key();
                    let key = collections.add_point("node", Vec3::new(x, 0.0, 0.0)).unwrap();
                    match selected.and_then(|s| model.iter().position(|(k, _)| *k == s)) {
                        Some(i) => model.insert(i + 1, (key, x)),
                        None => model.push((key, x)),
                    }
                }
                Edit::Remove(i) => {
                    if let Some(&(key, _)) = model.get(i) {
                        let previous = collections.remove_point_by_key("node", key).unwrap();
                        prop_assert_eq!(previous, i.checked_sub(1).map(|p| model[p].0));
                        model.remove(i);
                    }
                }
                Edit::Select(i) => {
                    let key = i.and_then(|i| model.get(i)).map(|(k, _)| *k);
                    collections.select("node", key).unwrap();
                }
            }

            let node = collections.get("node").unwrap();
            let keys: Vec<u32> = model.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(node.point_keys(), keys.as_slice());
            prop_assert_eq!(node.len(), model.len());
            for (i, (_, x)) in model.iter().enumerate() {
                prop_assert_eq!(node.positions()[i].x, *x);
            }
        }
    }
}
