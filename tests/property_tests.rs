use perceptomap::identity::IdentityResolver;
use perceptomap::kmeans::{self, KmeansParams};
use perceptomap::{run, suggest, Column, DataSet, PipelineConfig, Value, MIN_GROUP_SIZE};
use proptest::prelude::*;

fn ratings(rows: &[Vec<f64>]) -> DataSet {
    let dims = rows[0].len();
    let columns = (0..dims).map(|j| Column::numeric(format!("r{}", j))).collect();
    let rows = rows
        .iter()
        .map(|r| r.iter().map(|&x| Value::Number(x)).collect())
        .collect();
    DataSet::new(columns, rows).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_brand_in_one_group(
        rows in prop::collection::vec(prop::collection::vec(0.0f64..10.0, 3), 2..12),
        k in 2usize..6,
        seed in any::<u64>(),
    ) {
        let data = ratings(&rows);
        let config = PipelineConfig { k, ..Default::default() }.with_seed(seed);
        match run(&data, &config) {
            Ok(map) => {
                prop_assert!(k <= rows.len());
                prop_assert_eq!(map.labels.len(), rows.len());
                prop_assert_eq!(map.coords().nrows(), rows.len());
                prop_assert_eq!(map.assignments().len(), rows.len());
                for &c in map.assignments() {
                    prop_assert!(c < k);
                }
                prop_assert_eq!(map.clustering.cluster_sizes().iter().sum::<usize>(), rows.len());
            }
            Err(perceptomap::Error::ClusterCount { requested, available }) => {
                prop_assert!(requested > available);
                prop_assert!(k > rows.len());
            }
            Err(e) => prop_assert!(false, "unexpected error {}", e),
        }
    }

    #[test]
    fn prop_kmeans_deterministic(
        points in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 2), 3..20),
        seed in any::<u64>(),
    ) {
        let flat: Vec<f64> = points.iter().flatten().copied().collect();
        let data = ndarray::Array2::from_shape_vec((points.len(), 2), flat).unwrap();
        let params = KmeansParams::default().with_seed(seed);
        let a = kmeans::fit(&data, 3, &params).unwrap();
        let b = kmeans::fit(&data, 3, &params).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_suggestions_exactly_small_groups(
        assignments in prop::collection::vec(0usize..5, 0..30),
    ) {
        let labels: Vec<String> = (0..assignments.len()).map(|i| format!("B{}", i)).collect();
        let out = suggest(&assignments, &labels, MIN_GROUP_SIZE);
        let sizes = kmeans::cluster_sizes(&assignments, 5);
        let expected: Vec<usize> = (0..5).filter(|&c| sizes[c] > 0 && sizes[c] < MIN_GROUP_SIZE).collect();
        let got: Vec<usize> = out.iter().map(|s| s.cluster).collect();
        prop_assert_eq!(got, expected);
        for s in &out {
            prop_assert_eq!(s.members.len(), sizes[s.cluster]);
        }
    }

    #[test]
    fn prop_synthesized_labels(n in 0usize..40) {
        let rows: Vec<Vec<Value>> = (0..n).map(|i| vec![Value::Number(i as f64)]).collect();
        let data = DataSet::new(vec![Column::numeric("style")], rows).unwrap();
        let labels = IdentityResolver::new(&data).labels(&data);
        let expected: Vec<String> = (0..n).map(|i| format!("Brand {}", i)).collect();
        prop_assert_eq!(labels, expected);
    }
}
