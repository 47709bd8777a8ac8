use geosource::mvt::{decode, decode_geometry, decode_properties, GeomType};
use geosource::{BoundingBox, ClusterLeavesRequest, TilePoint, TileRequest};
use geosource_int_test::test_util::{
    cleanup, create_test_context, five_points, point_collection, random_points, run_test,
};
use serde_json::json;

#[test]
fn test_world_tile_holds_cluster_and_outlier() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("places", 0, 0, 0, 14))?
                .expect("world tile");

            let tile = decode(&encoded.data)?;
            let layer = &tile.layers[0];
            assert_eq!(layer.extent, Some(512));
            assert_eq!(layer.features.len(), 2);

            let mut clusters = 0;
            for feature in &layer.features {
                assert_eq!(feature.r#type(), GeomType::Point);
                let properties = decode_properties(layer, feature);
                if properties.get("cluster") == Some(&json!(true)) {
                    clusters += 1;
                    assert_eq!(properties.get("point_count"), Some(&json!(4)));
                    assert_eq!(properties.get("point_count_abbreviated"), Some(&json!(4)));
                    assert_eq!(properties.get("cluster_id"), feature.id.map(|id| json!(id)).as_ref());
                } else {
                    assert_eq!(feature.id, Some(4));
                    assert_eq!(properties.get("index"), Some(&json!(4)));
                }
            }
            assert_eq!(clusters, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_deep_tile_shows_single_point_at_corner() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            // lng 0 / lat 0 is the top-left corner of 16/32768/32768
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("places", 16, 32768, 32768, 16))?
                .expect("tile at the origin");

            let tile = decode(&encoded.data)?;
            let layer = &tile.layers[0];
            assert_eq!(layer.features.len(), 1);
            let feature = &layer.features[0];
            assert_eq!(feature.id, Some(0));
            assert_eq!(decode_geometry(&feature.geometry)?, vec![vec![TilePoint::new(0, 0)]]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_tile_point_counts_add_up() {
    run_test(
        || create_test_context(),
        |ctx| {
            let count = 2000;
            let coords = random_points(count, &BoundingBox::new(-100.0, -60.0, 100.0, 60.0), 17);
            ctx.ingest_clustered("random", &point_collection(&coords))?;
            let store = ctx.store();

            let encoded = store
                .tile_for(&TileRequest::new("random", 0, 0, 0, 14))?
                .expect("world tile");

            let mut total = 0u64;
            for feature in &encoded.features {
                match feature.properties.get("point_count").and_then(|v| v.as_u64()) {
                    Some(point_count) => {
                        total += point_count;
                        let leaves = store.cluster_leaves(&ClusterLeavesRequest {
                            source_id: "random".to_string(),
                            cluster_id: feature.id.expect("cluster id"),
                            limit: usize::MAX,
                            offset: 0,
                        })?;
                        assert_eq!(leaves.len() as u64, point_count);
                    }
                    None => total += 1,
                }
            }
            assert_eq!(total, count as u64);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_cluster_leaves_pages() {
    run_test(
        || create_test_context(),
        |ctx| {
            let coords = random_points(300, &BoundingBox::new(-1.0, -1.0, 1.0, 1.0), 5);
            ctx.ingest_clustered("dense", &point_collection(&coords))?;
            let store = ctx.store();

            let encoded = store
                .tile_for(&TileRequest::new("dense", 0, 0, 0, 14))?
                .expect("world tile");
            assert_eq!(encoded.features.len(), 1);
            let cluster_id = encoded.features[0].id.expect("cluster id");

            let page = |limit, offset| {
                store.cluster_leaves(&ClusterLeavesRequest {
                    source_id: "dense".to_string(),
                    cluster_id,
                    limit,
                    offset,
                })
            };
            let all = page(300, 0)?;
            assert_eq!(all.len(), 300);
            let second = page(100, 100)?;
            assert_eq!(second.len(), 100);
            assert_eq!(second[0].id, all[100].id);
            assert_eq!(page(100, 290)?.len(), 10);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_expansion_zoom_splits_cluster() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let store = ctx.store();
            let list = store.plan(&geosource::PointListRequest::new("places", BoundingBox::world(), 0.0))?;
            let cluster_id = list.cluster_of[&0];

            let zoom = store
                .cluster_expansion_zoom(&geosource::ClusterExpansionZoomRequest {
                    source_id: "places".to_string(),
                    cluster_id,
                })?
                .expect("cluster source");

            // at the expansion zoom the four corners are no longer a single group
            let expanded = store.plan(&geosource::PointListRequest::new(
                "places",
                BoundingBox::world(),
                f64::from(zoom),
            ))?;
            let groups: std::collections::HashSet<_> =
                (0..4u64).map(|id| expanded.cluster_of[&id]).collect();
            assert!(groups.len() > 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
