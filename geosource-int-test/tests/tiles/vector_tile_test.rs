use geosource::mvt::{decode_geometry, decode_properties, GeomType, Tile};
use geosource::projection::{project_x, project_y};
use geosource::{ErrorKind, IngestRequest, SourceStore, TileGeometry, TileOptions, TilePoint, TileRequest};
use geosource_int_test::test_util::{cleanup, create_test_context, run_test, shapes_collection, TestContext};
use prost::Message;
use serde_json::json;

fn shoelace(ring: &[TilePoint]) -> i64 {
    ring.windows(2)
        .map(|w| i64::from(w[0].x) * i64::from(w[1].y) - i64::from(w[1].x) * i64::from(w[0].y))
        .sum()
}

#[test]
fn test_tile_decodes_to_its_raw_features() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("shapes", 0, 0, 0, 14))?
                .expect("world tile");

            let tile = Tile::decode(encoded.data.as_slice())?;
            assert_eq!(tile.layers.len(), 1);
            let layer = &tile.layers[0];
            assert_eq!(layer.version, 2);
            assert_eq!(layer.name, "_geojsonTileLayer");
            assert_eq!(layer.extent, Some(4096));
            assert_eq!(layer.features.len(), encoded.features.len());
            assert_eq!(layer.features.len(), 3);

            for raw in &encoded.features {
                let id = raw.id.expect("feature id");
                let feature = layer
                    .features
                    .iter()
                    .find(|f| f.id == Some(id))
                    .expect("encoded feature");
                let parts = decode_geometry(&feature.geometry)?;
                match &raw.geometry {
                    TileGeometry::LineString(lines) => {
                        assert_eq!(feature.r#type(), GeomType::Linestring);
                        assert_eq!(&parts, lines);
                    }
                    TileGeometry::Polygon(rings) => {
                        assert_eq!(feature.r#type(), GeomType::Polygon);
                        assert_eq!(&parts, rings);
                    }
                    TileGeometry::Point(_) => panic!("no points in this source"),
                }
                assert_eq!(decode_properties(layer, feature), raw.properties);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_property_values_are_typed() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("shapes", 0, 0, 0, 14))?
                .expect("world tile");
            let tile = Tile::decode(encoded.data.as_slice())?;
            let layer = &tile.layers[0];

            let mut keys = layer.keys.clone();
            keys.sort();
            assert_eq!(keys, vec!["depth", "kind", "lanes", "open"]);

            // "road", "park", "lake", 2, true and 12.5
            assert_eq!(layer.values.len(), 6);
            assert!(layer.values.iter().any(|v| v.uint_value == Some(2)));
            assert!(layer.values.iter().any(|v| v.bool_value == Some(true)));
            assert!(layer.values.iter().any(|v| v.double_value == Some(12.5)));

            let lake = layer.features.iter().find(|f| f.id == Some(2)).expect("lake");
            let properties = decode_properties(layer, lake);
            assert_eq!(properties.get("kind"), Some(&json!("lake")));
            assert_eq!(properties.get("depth"), Some(&json!(12.5)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_polygon_rings_wind_for_tile_space() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("shapes", 0, 0, 0, 14))?
                .expect("world tile");

            for feature in &encoded.features {
                if let TileGeometry::Polygon(rings) = &feature.geometry {
                    assert!(shoelace(&rings[0]) > 0, "exterior of {:?}", feature.id);
                    for hole in &rings[1..] {
                        assert!(shoelace(hole) < 0, "hole of {:?}", feature.id);
                    }
                }
            }
            // the park keeps its hole
            let park = encoded.features.iter().find(|f| f.id == Some(1)).expect("park");
            let TileGeometry::Polygon(rings) = &park.geometry else {
                panic!("park is a polygon");
            };
            assert_eq!(rings.len(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_deep_tile_along_a_line() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;

            // halfway along the road segment from (0, 5) to (20, 20) in Mercator space
            let z = 12u8;
            let scale = f64::from(1u32 << z);
            let x = ((project_x(0.0) + project_x(20.0)) / 2.0 * scale).floor() as u32;
            let y = ((project_y(5.0) + project_y(20.0)) / 2.0 * scale).floor() as u32;

            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("shapes", z, x, y, 14))?
                .expect("tile on the road");
            let road = encoded.features.iter().find(|f| f.id == Some(0)).expect("road");
            let TileGeometry::LineString(parts) = &road.geometry else {
                panic!("road is a line");
            };
            assert!(!parts.is_empty());
            // clipped to the tile plus its buffer
            assert!(parts
                .iter()
                .flatten()
                .all(|p| p.x >= -64 && p.x <= 4160 && p.y >= -64 && p.y <= 4160));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_overzoomed_tiles_reuse_max_zoom_tile() {
    run_test(
        || create_test_context(),
        |ctx| {
            let store = ctx.store();
            store.ingest(
                IngestRequest::new("shapes")
                    .with_data(shapes_collection())
                    .tiled(TileOptions::default().with_max_zoom(6)),
            )?;

            // 6/50/29 lies inside the lake at lng 100..110 / lat 10..20
            let direct = store
                .tile_for(&TileRequest::new("shapes", 6, 50, 29, 6))?
                .expect("lake tile");
            let deep = store
                .tile_for(&TileRequest::new("shapes", 9, 50 * 8 + 3, 29 * 8 + 5, 6))?
                .expect("overzoomed lake tile");
            assert!(deep.reloaded);
            assert_eq!(direct.data, deep.data);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_tiles_outside_data_are_none() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;
            let store = ctx.store();
            // south pacific
            assert!(store.tile_for(&TileRequest::new("shapes", 5, 2, 22, 14))?.is_none());
            // out of range at its zoom
            assert!(store.tile_for(&TileRequest::new("shapes", 2, 4, 0, 14))?.is_none());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_custom_layer_name() {
    run_test(
        || Ok(TestContext::new(SourceStore::builder().layer_name("shapes").build()?)),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("shapes", 0, 0, 0, 14))?
                .expect("world tile");
            let tile = Tile::decode(encoded.data.as_slice())?;
            assert_eq!(tile.layers[0].name, "shapes");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_layer_name_is_rejected() {
    let result = SourceStore::builder().layer_name("").build();
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::InvalidInput));
}

#[test]
fn test_raw_features_as_feature_collection() {
    run_test(
        || create_test_context(),
        |ctx| {
            ctx.ingest_tiled("shapes", &shapes_collection())?;
            let encoded = ctx
                .store()
                .tile_for(&TileRequest::new("shapes", 0, 0, 0, 14))?
                .expect("world tile");

            let collection = encoded.raw_features();
            assert_eq!(collection.features.len(), 3);
            let kinds: Vec<&str> = collection
                .features
                .iter()
                .filter_map(|f| f.property("kind").and_then(|v| v.as_str()))
                .collect();
            assert_eq!(kinds.len(), 3);

            let message = serde_json::to_value(&encoded)?;
            assert_eq!(message["rawFeatures"]["type"], "FeatureCollection");
            assert_eq!(
                message["encodedTile"].as_array().map(|a| a.len()),
                Some(encoded.data.len())
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
