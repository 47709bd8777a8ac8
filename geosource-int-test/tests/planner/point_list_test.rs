use std::collections::HashSet;

use geosource::{
    BoundingBox, ClusterLeavesRequest, Coordinate, DistanceMetric, ErrorKind, FeatureId,
    PointList, PointListRequest, SourceStore,
};
use geosource_int_test::test_util::{
    cleanup, create_test_context, five_points, point_collection, random_points, run_test,
    TestContext,
};

/// Coordinates of the first leaf of every group, in list order.
fn representatives(list: &PointList, coords: &[(f64, f64)]) -> Vec<Coordinate> {
    let mut result = Vec::new();
    let mut previous: Option<FeatureId> = None;
    for id in &list.ordered_ids {
        let group = list.cluster_of[id];
        if previous != Some(group) {
            let (x, y) = coords[*id as usize];
            result.push(Coordinate::new(x, y));
            previous = Some(group);
        }
    }
    result
}

fn assert_sorted_by(list: &PointList, coords: &[(f64, f64)], center: Coordinate, metric: DistanceMetric) {
    let distances: Vec<f64> = representatives(list, coords)
        .iter()
        .map(|p| metric.distance(p, &center))
        .collect();
    assert!(
        distances.windows(2).all(|w| w[0] <= w[1]),
        "groups out of order: {:?}",
        distances
    );
}

#[test]
fn test_unclustered_points_are_listed_alone() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let list = ctx
                .store()
                .plan(&PointListRequest::new("places", BoundingBox::world(), 16.0))?;

            assert_eq!(list.len(), 5);
            for id in &list.ordered_ids {
                assert_eq!(list.cluster_of[id], *id);
            }
            // closest to the window center first, the far point last
            assert_eq!(list.ordered_ids.first(), Some(&0));
            assert_eq!(list.ordered_ids.last(), Some(&4));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_clusters_are_listed_leaf_by_leaf() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let list = ctx
                .store()
                .plan(&PointListRequest::new("places", BoundingBox::world(), 0.0))?;

            assert_eq!(list.len(), 5);
            let group = list.cluster_of[&0];
            assert_ne!(group, 0);
            for id in 0..4 {
                assert_eq!(list.cluster_of[&id], group);
            }
            assert_eq!(list.cluster_of[&4], 4);
            // members of a group stay together
            let position = |id: FeatureId| list.ordered_ids.iter().position(|i| *i == id);
            let mut spots: Vec<usize> = (0..4).filter_map(position).collect();
            spots.sort_unstable();
            assert_eq!(spots[3] - spots[0], 3);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_world_window_lists_every_point_once() {
    run_test(
        || create_test_context(),
        |ctx| {
            let count = 1500;
            let coords = random_points(count, &BoundingBox::new(-170.0, -80.0, 170.0, 80.0), 3);
            ctx.ingest_clustered("random", &point_collection(&coords))?;

            for zoom in [0.0, 2.5, 5.0, 9.0, 17.0] {
                let list = ctx
                    .store()
                    .plan(&PointListRequest::new("random", BoundingBox::world(), zoom))?;
                assert_eq!(list.len(), count, "zoom {}", zoom);
                let unique: HashSet<FeatureId> = list.ordered_ids.iter().copied().collect();
                assert_eq!(unique.len(), count);
                assert_eq!(list.cluster_of.len(), count);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_group_sizes_match_cluster_leaves() {
    run_test(
        || create_test_context(),
        |ctx| {
            let coords = random_points(800, &BoundingBox::new(-40.0, -40.0, 40.0, 40.0), 21);
            ctx.ingest_clustered("random", &point_collection(&coords))?;
            let store = ctx.store();
            let list = store.plan(&PointListRequest::new(
                "random",
                BoundingBox::new(-20.0, -20.0, 20.0, 20.0),
                3.0,
            ))?;

            let groups: HashSet<FeatureId> = list.cluster_of.values().copied().collect();
            for group in groups {
                let members = list.cluster_of.values().filter(|g| **g == group).count();
                if list.cluster_of.get(&group) == Some(&group) {
                    assert_eq!(members, 1);
                    continue;
                }
                let leaves = store.cluster_leaves(&ClusterLeavesRequest {
                    source_id: "random".to_string(),
                    cluster_id: group,
                    limit: usize::MAX,
                    offset: 0,
                })?;
                assert_eq!(leaves.len(), members);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_max_count_caps_the_list() {
    run_test(
        || create_test_context(),
        |ctx| {
            let count = 500;
            let coords = random_points(count, &BoundingBox::new(-60.0, -60.0, 60.0, 60.0), 8);
            ctx.ingest_clustered("random", &point_collection(&coords))?;
            let store = ctx.store();

            for (zoom, max_count) in [(1.0, 0), (1.0, 7), (4.0, 100), (12.0, 333), (3.0, 10_000)] {
                let request =
                    PointListRequest::new("random", BoundingBox::world(), zoom).with_max_count(max_count);
                let list = store.plan(&request)?;
                assert_eq!(list.len(), max_count.min(count));
                assert_eq!(list.cluster_of.len(), list.len());
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_groups_move_away_from_center() {
    run_test(
        || create_test_context(),
        |ctx| {
            let coords = random_points(1000, &BoundingBox::new(-90.0, -60.0, 90.0, 60.0), 12);
            ctx.ingest_clustered("random", &point_collection(&coords))?;
            let store = ctx.store();

            let center = Coordinate::new(15.0, -10.0);
            for metric in [DistanceMetric::SquaredPlanar, DistanceMetric::Haversine] {
                for zoom in [1.0, 4.0, 8.0] {
                    let request = PointListRequest::new("random", BoundingBox::world(), zoom)
                        .with_center(center)
                        .with_distance_metric(metric);
                    let list = store.plan(&request)?;
                    assert_sorted_by(&list, &coords, center, metric);
                }
            }

            // without a center the window center is used
            let window = BoundingBox::new(0.0, 0.0, 40.0, 40.0);
            let list = store.plan(&PointListRequest::new("random", window, 6.0))?;
            assert!(!list.is_empty());
            assert_sorted_by(&list, &coords, Coordinate::new(20.0, 20.0), DistanceMetric::SquaredPlanar);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_zoom_is_floored_and_clamped() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let store = ctx.store();

            // 0.9 is planned at zoom 0, where the corners are one cluster
            let low = store.plan(&PointListRequest::new("places", BoundingBox::world(), 0.9))?;
            assert_ne!(low.cluster_of[&0], 0);

            // clamped up to minzoom 16, where every point stands alone
            let clamped = store.plan(
                &PointListRequest::new("places", BoundingBox::world(), 0.0).with_zoom_range(16, 20),
            )?;
            assert!(clamped.ordered_ids.iter().all(|id| clamped.cluster_of[id] == *id));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_store_metric_is_the_default() {
    // planar puts (0, 65) first, along the parallel (60, 80) is closer
    let coords = [(60.0, 80.0), (0.0, 65.0)];
    let center = Coordinate::new(0.0, 80.0);
    let request = PointListRequest::new("polar", BoundingBox::world(), 16.0).with_center(center);

    run_test(
        || {
            Ok(TestContext::new(
                SourceStore::builder()
                    .distance_metric(DistanceMetric::Haversine)
                    .build()?,
            ))
        },
        |ctx| {
            ctx.ingest_clustered("polar", &point_collection(&coords))?;
            assert_eq!(ctx.store().plan(&request)?.ordered_ids, vec![0, 1]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    );

    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("polar", &point_collection(&coords))?;
            let store = ctx.store();
            assert_eq!(store.plan(&request)?.ordered_ids, vec![1, 0]);
            let haversine = request.clone().with_distance_metric(DistanceMetric::Haversine);
            assert_eq!(store.plan(&haversine)?.ordered_ids, vec![0, 1]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    );
}

#[test]
fn test_tour_lists_the_same_points() {
    run_test(
        || create_test_context(),
        |ctx| {
            let coords = random_points(600, &BoundingBox::new(-50.0, -50.0, 50.0, 50.0), 99);
            ctx.ingest_clustered("random", &point_collection(&coords))?;
            let store = ctx.store();

            let sorted = PointListRequest::new("random", BoundingBox::world(), 4.0).with_max_count(250);
            let toured = sorted.clone().with_approx_tour(true);
            let a = store.plan(&sorted)?;
            let b = store.plan(&toured)?;

            assert_eq!(a.len(), b.len());
            assert_eq!(a.cluster_of, b.cluster_of);
            let set_a: HashSet<FeatureId> = a.ordered_ids.iter().copied().collect();
            let set_b: HashSet<FeatureId> = b.ordered_ids.iter().copied().collect();
            assert_eq!(set_a, set_b);
            // the tour order is reproducible
            assert_eq!(store.plan(&toured)?.ordered_ids, b.ordered_ids);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_point_list_request_from_host_message() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let request: PointListRequest = serde_json::from_str(
                r#"{
                    "sourceId": "places",
                    "bbox": [-5, -5, 5, 5],
                    "zoom": 15.2,
                    "minzoom": 0,
                    "maxzoom": 18,
                    "maxCount": 3
                }"#,
            )?;
            let list = ctx.store().plan(&request)?;
            assert_eq!(list.len(), 3);
            assert!(!list.ordered_ids.contains(&4));

            let message = serde_json::to_value(&list)?;
            assert_eq!(message["orderedIds"].as_array().map(|a| a.len()), Some(3));
            assert!(message["clusterOf"].is_object());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_invalid_point_list_requests() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let store = ctx.store();

            let nan_zoom = PointListRequest::new("places", BoundingBox::world(), f64::NAN);
            assert_eq!(store.plan(&nan_zoom).unwrap_err().kind(), ErrorKind::InvalidInput);

            let open_window = PointListRequest::new(
                "places",
                BoundingBox::new(f64::NEG_INFINITY, 0.0, 1.0, 1.0),
                3.0,
            );
            assert_eq!(store.plan(&open_window).unwrap_err().kind(), ErrorKind::InvalidInput);

            let inverted = PointListRequest::new("places", BoundingBox::world(), 3.0).with_zoom_range(10, 2);
            assert_eq!(store.plan(&inverted).unwrap_err().kind(), ErrorKind::InvalidInput);

            // an unknown source is not an error
            let unknown = PointListRequest::new("nowhere", BoundingBox::world(), f64::NAN);
            assert!(store.plan(&unknown)?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
