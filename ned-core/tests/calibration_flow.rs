use std::sync::Arc;

use ned_core::calibration::Calibration;
use ned_core::config::{GridPoint, SweepGrid};
use ned_core::dataset::{load_dataset, parse_dataset, parse_legacy_dataset};
use ned_core::embeddings::WordVectors;
use ned_core::fusion::{decide, score, Decision, FusionWeights};
use ned_core::locations::GazetteerLocations;
use ned_core::report::{write_report, BAD_EXAMPLES_FILE, GOOD_EXAMPLES_FILE, RESULTS_FILE};
use ned_core::signature::{SignatureStore, SpatialSignature, TemporalSignature};
use ned_core::{NedEngine, Similarity};
use serde_json::json;

fn labeled_dataset() -> serde_json::Value {
    json!([
        {
            "sentence": "Bush spoke in Washington about the Gulf.",
            "year": 1991,
            "annotations": [
                {"anchor": "Bush", "taIdentRef": "http://dbpedia.org/resource/George_H._W._Bush"},
                {"anchor": "Washington", "taIdentRef": "http://dbpedia.org/resource/Washington,_D.C."}
            ],
            "annotations_dbpedia": [
                {"URI": "http://dbpedia.org/resource/George_W._Bush", "surfaceForm": "Bush", "similarityScore": 0.85},
                {"URI": "http://dbpedia.org/resource/Washington,_D.C.", "surfaceForm": "Washington", "similarityScore": 0.95}
            ]
        },
        {
            "sentence": "Napoleon entered Moscow.",
            "year": 1812,
            "annotations": [
                {"anchor": "Napoleon", "taIdentRef": "http://dbpedia.org/resource/Napoleon"},
                {"anchor": "Moscow", "taIdentRef": "http://dbpedia.org/resource/Moscow"}
            ],
            "annotations_dbpedia": [
                {"URI": "http://dbpedia.org/resource/Napoleon_(film)", "surfaceForm": "Napoleon", "similarityScore": 0.7},
                {"URI": "http://dbpedia.org/resource/Moscow", "surfaceForm": "Moscow", "similarityScore": 0.99}
            ]
        },
        {"sentence": "registro sem ano", "annotations": []}
    ])
}

fn engine() -> NedEngine {
    let mut store = SignatureStore::new();
    store.insert_temporal("George_W._Bush", TemporalSignature::new(vec![2001, 2003, 2008], vec![9.0, 7.0, 5.0]));
    store.insert_temporal("Washington,_D.C.", TemporalSignature::new(vec![1790, 1865, 1991], vec![3.0, 2.0, 2.0]));
    store.insert_temporal("Napoleon_(film)", TemporalSignature::new(vec![1927], vec![6.0]));
    store.insert_temporal("Moscow", TemporalSignature::new(vec![1812, 1917], vec![5.0, 4.0]));
    store.insert_spatial(
        "Moscow",
        SpatialSignature::new(vec!["Moscow".into(), "Russia".into()], vec![8.0, 2.0]),
    );
    store.insert_spatial(
        "George_W._Bush",
        SpatialSignature::new(vec!["Texas".into()], vec![5.0]),
    );

    let mut vectors = WordVectors::new();
    vectors.insert("moscow", vec![0.9, 0.1, 0.0]).unwrap();
    vectors.insert("russia", vec![0.8, 0.2, 0.0]).unwrap();
    vectors.insert("washington", vec![0.0, 0.2, 0.9]).unwrap();
    vectors.insert("texas", vec![0.1, 0.9, 0.2]).unwrap();

    let gazetteer: GazetteerLocations = ["Moscow", "Washington", "Texas"].into_iter().collect();
    NedEngine::new(Arc::new(store), Arc::new(vectors), Arc::new(gazetteer))
}

#[test]
fn test_single_annotation_scenario() {
    let weights = FusionWeights::new(0.3, 0.3, 0.9).unwrap();
    let fs = score(0.8, Similarity::Available(0.6), Similarity::Unavailable, &weights);
    assert!((fs - 0.6).abs() < 1e-12);
    assert_eq!(decide(fs, 0.5), Decision::Keep);
    assert_eq!(decide(fs, 0.7), Decision::Drop);

    let dataset = json!([{
        "sentence": "A single sentence.",
        "year": 1995,
        "annotations": [{"anchor": "sentence", "taIdentRef": "http://dbpedia.org/resource/Sentence"}],
        "annotations_dbpedia": [{
            "URI": "http://dbpedia.org/resource/Sentence_(law)",
            "surfaceForm": "sentence",
            "similarityScore": 0.8,
            "temporalSimilarity": 0.6,
            "spatialSimilarity": -1
        }]
    }]);
    // Arquivo antigo: -1 marca a similaridade espacial ausente
    let docs = parse_legacy_dataset(dataset).unwrap();
    let cal = Calibration::new(&docs);

    let keep = GridPoint { threshold: 0.5, alpha: 0.3, beta: 0.3, gamma: 0.9 };
    let result = cal.evaluate(&keep).unwrap();
    assert_eq!(result.missed_detections, 1);
    assert_eq!(result.removals(), 0);

    let drop = GridPoint { threshold: 0.7, ..keep };
    let result = cal.evaluate(&drop).unwrap();
    assert_eq!(result.correct_removals, 1);
    assert_eq!(result.missed_detections, 0);
}

#[test]
fn test_enrich_then_calibrate_is_deterministic() {
    let docs = parse_dataset(labeled_dataset()).unwrap();
    assert_eq!(docs.len(), 2);

    let enriched = engine().enrich(&docs);
    let bush = &enriched[0].linked_annotations()[0];
    assert!(bush.temporal.is_available());
    assert!(bush.spatial.is_available());
    // Washington não tem assinatura espacial
    assert_eq!(enriched[0].linked_annotations()[1].spatial, Similarity::Unavailable);
    // Napoleon_(film) não tem assinatura espacial; Moscow tem
    assert!(enriched[1].linked_annotations()[1].spatial.is_available());

    let grid = SweepGrid::single(0.6, 0.4, 0.3, 0.8);
    let cal = Calibration::new(&enriched);
    let first = cal.sweep(&grid).unwrap();
    for _ in 0..3 {
        let again = Calibration::new(&enriched).sweep(&grid).unwrap();
        assert_eq!(again.best, first.best);
        assert_eq!(again.good_examples, first.good_examples);
        assert_eq!(again.bad_examples, first.bad_examples);
    }
    assert_eq!(first.baseline_accuracy, Some(0.5));
}

#[test]
fn test_default_grid_sweep_and_reports() {
    let docs = engine().enrich(&parse_dataset(labeled_dataset()).unwrap());
    let report = Calibration::new(&docs).sweep(&SweepGrid::default()).unwrap();

    assert_eq!(report.results.len(), SweepGrid::default().len());
    let best = report.best.accuracy.unwrap();
    assert!(report
        .results
        .iter()
        .all(|r| r.accuracy.map_or(true, |a| a <= best)));
    assert!(best >= report.baseline_accuracy.unwrap());

    let dir = tempfile::tempdir().unwrap();
    let written = write_report(dir.path(), &report).unwrap();
    assert_eq!(written.len(), 3);
    for name in [RESULTS_FILE, GOOD_EXAMPLES_FILE, BAD_EXAMPLES_FILE] {
        assert!(dir.path().join(name).exists());
    }

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap()).unwrap();
    assert_eq!(saved["results"].as_array().unwrap().len(), report.results.len());
}

#[test]
fn test_load_dataset_from_file_skips_bad_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nyt.json");
    std::fs::write(&path, labeled_dataset().to_string()).unwrap();
    assert_eq!(load_dataset(&path).unwrap().len(), 2);
}
