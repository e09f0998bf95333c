// Unit tests for the ternary core through its public API.
//
// These check the properties the plots rely on: shares sum to one,
// amplification moves points away from the centre, centroids stay inside
// the simplex, and nothing here ever mutates its input.

use oewg_ternary::db::models::{CategoryWeight, ItemRecord, Key};
use oewg_ternary::ternary::amplify::{amplify, amplify_point};
use oewg_ternary::ternary::bubbles::{size_bubbles, BubbleSizing};
use oewg_ternary::ternary::centroids::{
    categorical_centroids, group_centroids, CategoryCentroidStyle, GroupDefinition,
};
use oewg_ternary::ternary::proportions::{calculate_base_attributes, CountColumns};
use oewg_ternary::ternary::{ItemRow, Ternary, EPSILON};

fn columns() -> CountColumns {
    CountColumns::new("count_A", "count_G", "count_BCDE")
}

fn item(id: i64, a: f64, g: f64, m: f64) -> ItemRecord {
    ItemRecord::new(id, format!("item {id}"))
        .with("count_A", a)
        .with("count_G", g)
        .with("count_BCDE", m)
}

fn sample() -> Vec<ItemRecord> {
    vec![
        item(1, 10.0, 2.0, 5.0),
        item(2, 1.0, 12.0, 3.0),
        item(3, 0.0, 0.0, 0.0),
        item(4, 3.0, 3.0, 3.0),
        item(5, 0.5, 0.0, 7.5),
    ]
}

fn distance_from_centre(p: &Ternary) -> f64 {
    let c = Ternary::CENTER;
    ((p.us - c.us).powi(2) + (p.russia - c.russia).powi(2) + (p.middle - c.middle).powi(2)).sqrt()
}

fn in_simplex(p: &Ternary) -> bool {
    (p.sum() - 1.0).abs() < 1e-9 && p.us >= 0.0 && p.russia >= 0.0 && p.middle >= 0.0
}

#[test]
fn defined_proportions_always_sum_to_one() {
    let table = calculate_base_attributes(&sample(), &columns());
    assert_eq!(table.rows.len(), 5);
    assert_eq!(table.defined_count(), 4);
    for row in &table.rows {
        match row.proportions {
            Some(p) => assert!(in_simplex(&p)),
            None => assert_eq!(row.total_mentions, 0.0),
        }
    }
}

#[test]
fn input_records_are_not_modified() {
    let items = sample();
    let before = format!("{items:?}");
    let mut rows = calculate_base_attributes(&items, &columns()).into_defined();
    amplify(&mut rows, 2.5);
    assert_eq!(format!("{items:?}"), before);
}

#[test]
fn amplification_never_moves_points_toward_the_centre() {
    let table = calculate_base_attributes(&sample(), &columns());
    for row in table.rows.iter().filter_map(|r| r.proportions) {
        let mut previous = distance_from_centre(&row);
        for power in [1.5, 2.0, 2.5, 3.0] {
            let amplified = amplify_point(row, power);
            assert!(in_simplex(&amplified));
            let d = distance_from_centre(&amplified);
            assert!(d + EPSILON >= previous, "power {power} moved {row:?} inward");
            previous = d;
        }
    }
}

#[test]
fn power_one_is_identity() {
    let p = Ternary::new(0.2, 0.3, 0.5);
    let q = amplify_point(p, 1.0);
    assert!((p.us - q.us).abs() < 1e-12);
    assert!((p.middle - q.middle).abs() < 1e-12);
}

#[test]
fn centre_is_a_fixed_point() {
    let q = amplify_point(Ternary::CENTER, 3.0);
    assert!(distance_from_centre(&q) < 1e-12);
}

#[test]
fn group_centroids_lie_inside_the_simplex() {
    let mut rows = calculate_base_attributes(&sample(), &columns()).into_defined();
    amplify(&mut rows, 2.0);
    let groups: Vec<GroupDefinition> = ["count_A", "count_G", "count_BCDE"]
        .iter()
        .map(|col| GroupDefinition {
            name: col.to_string(),
            weight_column: Some(col.to_string()),
            label: col.to_string(),
            marker_symbol: "diamond".into(),
            marker_color: "grey".into(),
        })
        .collect();
    let centroids = group_centroids(&rows, &groups);
    assert_eq!(centroids.len(), 3);
    for c in &centroids {
        assert!(c.has_data());
        assert!(in_simplex(&c.position));
    }
    // Each focus centroid leans toward its own pole.
    assert!(centroids[0].position.us > centroids[1].position.us);
    assert!(centroids[1].position.russia > centroids[0].position.russia);
}

#[test]
fn categorical_centroid_weights_scale_invariantly() {
    let mut rows = calculate_base_attributes(&sample(), &columns()).into_defined();
    amplify(&mut rows, 2.0);
    let weights = |scale: f64| {
        vec![
            CategoryWeight { item_id: Key::Int(1), category_id: "USA".into(), weight: 3.0 * scale },
            CategoryWeight { item_id: Key::Int(2), category_id: "USA".into(), weight: 1.0 * scale },
            CategoryWeight { item_id: Key::Int(3), category_id: "USA".into(), weight: 9.0 * scale },
        ]
    };
    let style = CategoryCentroidStyle::default();
    let a = categorical_centroids(&rows, &weights(1.0), None, &style);
    let b = categorical_centroids(&rows, &weights(10.0), None, &style);
    assert_eq!(a.len(), 1);
    assert!((a[0].position.us - b[0].position.us).abs() < 1e-12);
    // Item 3 has no defined proportions and contributes nothing.
    assert_eq!(a[0].total_weight, 4.0);
    assert_eq!(a[0].label, "Centroid: USA");
}

#[test]
fn categorical_centroid_is_the_weighted_mean_of_its_items() {
    let row = |id: i64, p: Ternary| {
        let mut row = ItemRow::new(ItemRecord::new(id, format!("item {id}")));
        row.amplified = Some(p);
        row
    };
    let rows = vec![
        row(1, Ternary::new(0.5, 0.3, 0.2)),
        row(2, Ternary::new(0.1, 0.6, 0.3)),
        row(3, Ternary::new(0.2, 0.2, 0.6)),
    ];
    let weights = vec![
        CategoryWeight { item_id: Key::Int(1), category_id: "BRA".into(), weight: 2.0 },
        CategoryWeight { item_id: Key::Int(2), category_id: "BRA".into(), weight: 3.0 },
        CategoryWeight { item_id: Key::Int(3), category_id: "BRA".into(), weight: 5.0 },
    ];
    let centroids = categorical_centroids(&rows, &weights, None, &CategoryCentroidStyle::default());
    assert_eq!(centroids.len(), 1);

    // (2*0.5 + 3*0.1 + 5*0.2)/10, (2*0.3 + 3*0.6 + 5*0.2)/10, (2*0.2 + 3*0.3 + 5*0.6)/10
    let c = &centroids[0];
    assert!((c.position.us - 0.23).abs() < 1e-12);
    assert!((c.position.russia - 0.34).abs() < 1e-12);
    assert!((c.position.middle - 0.43).abs() < 1e-12);
    assert_eq!(c.total_weight, 10.0);
    assert_eq!(c.category_id, Some(Key::from("BRA")));
}

#[test]
fn bubble_sizes_are_monotone_in_mentions() {
    let mut rows = calculate_base_attributes(&sample(), &columns()).rows;
    size_bubbles(&mut rows, &BubbleSizing::default());
    let mut by_mentions: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.total_mentions, r.size_px.unwrap_or(f64::NAN)))
        .collect();
    by_mentions.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in by_mentions.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
    assert_eq!(by_mentions.first().map(|p| p.1), Some(1.0));
    assert_eq!(by_mentions.last().map(|p| p.1), Some(75.0));
}

#[test]
fn corner_items_stay_at_corners_and_group_centroid_follows_its_item() {
    let items = vec![item(1, 10.0, 0.0, 0.0), item(2, 0.0, 10.0, 0.0), item(3, 0.0, 0.0, 10.0)];
    let mut rows = calculate_base_attributes(&items, &columns()).into_defined();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].proportions, Some(Ternary::new(1.0, 0.0, 0.0)));
    assert_eq!(rows[1].proportions, Some(Ternary::new(0.0, 1.0, 0.0)));
    assert_eq!(rows[2].proportions, Some(Ternary::new(0.0, 0.0, 1.0)));

    amplify(&mut rows, 2.0);
    for row in &rows {
        assert_eq!(row.amplified, row.proportions);
    }

    let russia = GroupDefinition {
        name: "Russia_Focus".into(),
        weight_column: Some("count_G".into()),
        label: "Russia Centroid (Amplified)".into(),
        marker_symbol: "diamond".into(),
        marker_color: "red".into(),
    };
    let centroids = group_centroids(&rows, &[russia]);
    assert_eq!(centroids[0].position, Ternary::new(0.0, 1.0, 0.0));
    assert_eq!(centroids[0].total_weight, 10.0);
}
