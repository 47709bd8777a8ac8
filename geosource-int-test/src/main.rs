use geosource::{
    BoundingBox, ClusterOptions, GeoResult, IngestRequest, PointListRequest, SourceStore,
    TileRequest,
};
use geosource_int_test::test_util::{point_collection, random_points};

fn main() -> GeoResult<()> {
    println!("Starting stress test...");
    let store = SourceStore::new();

    let count = 200000;
    let data = point_collection(&random_points(count, &BoundingBox::new(-180.0, -85.0, 180.0, 85.0), 42));

    let start = std::time::Instant::now();
    store.ingest(
        IngestRequest::new("stress")
            .with_data(data)
            .clustered(ClusterOptions::default()),
    )?;
    println!("Indexed {} points in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let mut tiles = 0;
    for z in 0..=4u8 {
        let side = 1u32 << z;
        for x in 0..side {
            for y in 0..side {
                if store.tile_for(&TileRequest::new("stress", z, x, y, 14))?.is_some() {
                    tiles += 1;
                }
            }
        }
    }
    println!("Encoded {} tiles in {:?}", tiles, start.elapsed());

    let start = std::time::Instant::now();
    let request = PointListRequest::new("stress", BoundingBox::new(-30.0, -30.0, 30.0, 30.0), 4.0)
        .with_max_count(2000);
    let list = store.plan(&request)?;
    println!("Planned {} points in {:?}", list.ordered_ids.len(), start.elapsed());

    let start = std::time::Instant::now();
    let list = store.plan(&request.with_approx_tour(true))?;
    println!("Toured {} points in {:?}", list.ordered_ids.len(), start.elapsed());

    Ok(())
}
