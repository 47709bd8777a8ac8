use geosource::{
    BoundingBox, ClusterChildrenRequest, ClusterExpansionZoomRequest, ClusterLeavesRequest,
    PointListRequest, RemoveRequest, TileId, TileRequest,
};
use geosource_int_test::test_util::{
    cleanup, create_test_context, five_points, point_collection, run_test, shapes_collection,
};

#[test]
fn test_removed_source_queries_are_empty() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            ctx.ingest_tiled("shapes", &shapes_collection())?;

            store.remove(&RemoveRequest::new("places"));
            store.remove(&RemoveRequest::new("shapes"));

            assert!(store.tile_for(&TileRequest::new("places", 0, 0, 0, 14))?.is_none());
            assert!(store.tile_for(&TileRequest::new("shapes", 0, 0, 0, 14))?.is_none());

            let list = store.plan(&PointListRequest::new("places", BoundingBox::world(), 0.0))?;
            assert!(list.ordered_ids.is_empty());
            assert!(list.cluster_of.is_empty());

            let children = store.cluster_children(&ClusterChildrenRequest {
                source_id: "places".to_string(),
                cluster_id: 100,
            })?;
            assert!(children.is_empty());
            let leaves = store.cluster_leaves(&ClusterLeavesRequest {
                source_id: "places".to_string(),
                cluster_id: 100,
                limit: 10,
                offset: 0,
            })?;
            assert!(leaves.is_empty());
            let zoom = store.cluster_expansion_zoom(&ClusterExpansionZoomRequest {
                source_id: "places".to_string(),
                cluster_id: 100,
            })?;
            assert!(zoom.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_unknown_source_is_acknowledged() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.store().remove(&RemoveRequest::new("never-added"));
            assert!(ctx.store().source_ids().is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_resets_loaded_tiles() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            let request = TileRequest::new("shapes", 0, 0, 0, 14);
            let root = TileId::new(0, 0, 0);

            ctx.ingest_tiled("shapes", &shapes_collection())?;
            store.tile_for(&request)?;
            assert!(store.is_tile_loaded("shapes", root));

            store.remove(&RemoveRequest::new("shapes"));
            assert!(!store.is_tile_loaded("shapes", root));

            ctx.ingest_tiled("shapes", &shapes_collection())?;
            assert!(!store.is_tile_loaded("shapes", root));
            let tile = store.tile_for(&request)?.expect("tile after re-ingest");
            assert!(!tile.reloaded);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_request_from_host_message() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_clustered("places", &point_collection(&five_points()))?;
            let request: RemoveRequest = serde_json::from_str(r#"{"sourceId": "places"}"#)?;
            ctx.store().remove(&request);
            assert!(!ctx.store().contains_source("places"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_concurrent_remove_never_errors() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            ctx.ingest_tiled("shapes", &shapes_collection())?;

            let reader = store.clone();
            let handle = std::thread::spawn(move || {
                let mut failures = 0;
                for _ in 0..50 {
                    if reader.tile_for(&TileRequest::new("shapes", 1, 0, 0, 14)).is_err() {
                        failures += 1;
                    }
                }
                failures
            });
            store.remove(&RemoveRequest::new("shapes"));
            // a concurrent remove turns reads into misses, never into errors
            assert_eq!(handle.join().expect("reader thread"), 0);
            assert!(store.tile_for(&TileRequest::new("shapes", 1, 0, 0, 14))?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
