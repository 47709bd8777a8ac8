use geosource::{
    BoundingBox, ClusterOptions, GeoError, GeoResult, IngestRequest, LoadRequest, SourceStore,
    TileOptions,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::time::Instant;

/// Runs a test between a setup and a teardown step.
///
/// The teardown runs whether the test body fails or not. Panics inside any
/// step are caught and reported together with the captured backtrace.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> GeoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> GeoResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> GeoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => match after(ctx) {
                    Ok(_) => Ok(()),
                    Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
                },
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();
    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", panic_err.type_id())
            };
            (format!("Panic: {}", err_msg), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed: {}", error);
}

/// A store under test plus the documents a fake loader can serve.
#[derive(Clone)]
pub struct TestContext {
    store: SourceStore,
}

impl TestContext {
    pub fn new(store: SourceStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> SourceStore {
        self.store.clone()
    }

    /// Ingests `data` as a cluster source with default options.
    pub fn ingest_clustered(&self, source_id: &str, data: &str) -> GeoResult<()> {
        self.store.ingest(
            IngestRequest::new(source_id)
                .with_data(data)
                .clustered(ClusterOptions::default()),
        )
    }

    /// Ingests `data` as a tile source with default options.
    pub fn ingest_tiled(&self, source_id: &str, data: &str) -> GeoResult<()> {
        self.store.ingest(
            IngestRequest::new(source_id)
                .with_data(data)
                .tiled(TileOptions::default()),
        )
    }
}

pub fn create_test_context() -> GeoResult<TestContext> {
    Ok(TestContext::new(SourceStore::new()))
}

/// Creates a context whose store resolves `request` ingests from `documents`
/// keyed by url. Unknown urls fail with `LoadFailed`.
pub fn create_loader_test_context(documents: HashMap<String, String>) -> GeoResult<TestContext> {
    let store = SourceStore::builder()
        .loader(move |request: &LoadRequest| -> GeoResult<String> {
            documents
                .get(&request.url)
                .cloned()
                .ok_or_else(|| GeoError::LoadFailed(format!("Nothing at {}", request.url)))
        })
        .build()?;
    Ok(TestContext::new(store))
}

/// Removes every source from the store.
pub fn cleanup(ctx: TestContext) -> GeoResult<()> {
    let store = ctx.store();
    for source_id in store.source_ids() {
        store.remove(&geosource::RemoveRequest::new(source_id));
    }
    if !store.source_ids().is_empty() {
        return Err(GeoError::InvalidInput("Sources left after cleanup".to_string()));
    }
    Ok(())
}

fn point_feature(x: f64, y: f64, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {"type": "Point", "coordinates": [x, y]}
    })
}

fn collection(features: Vec<Value>) -> String {
    json!({"type": "FeatureCollection", "features": features}).to_string()
}

/// A feature collection of points at `coords`, each carrying its position
/// as `index`.
pub fn point_collection(coords: &[(f64, f64)]) -> String {
    collection(
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| point_feature(x, y, json!({"index": i})))
            .collect(),
    )
}

/// The four corners of a one degree square plus a far away point.
pub fn five_points() -> Vec<(f64, f64)> {
    vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (50.0, 50.0)]
}

/// `count` random points inside `bbox`, reproducible through `seed`.
pub fn random_points(count: usize, bbox: &BoundingBox, seed: u64) -> Vec<(f64, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (
                rng.gen_range(bbox.min_x..bbox.max_x),
                rng.gen_range(bbox.min_y..bbox.max_y),
            )
        })
        .collect()
}

/// A mix of lines and polygons, including one polygon with a hole and one
/// with clockwise exterior winding.
pub fn shapes_collection() -> String {
    collection(vec![
        json!({
            "type": "Feature",
            "properties": {"kind": "road", "lanes": 2},
            "geometry": {"type": "LineString", "coordinates": [[-20.0, -20.0], [0.0, 5.0], [20.0, 20.0]]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "park", "open": true},
            "geometry": {"type": "Polygon", "coordinates": [
                [[-30.0, -30.0], [30.0, -30.0], [30.0, 30.0], [-30.0, 30.0], [-30.0, -30.0]],
                [[-5.0, -5.0], [-5.0, 5.0], [5.0, 5.0], [5.0, -5.0], [-5.0, -5.0]]
            ]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "lake", "depth": 12.5},
            "geometry": {"type": "Polygon", "coordinates": [
                [[100.0, 10.0], [100.0, 20.0], [110.0, 20.0], [110.0, 10.0], [100.0, 10.0]]
            ]}
        }),
    ])
}
