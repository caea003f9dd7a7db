//! Integration tests for the multiclass reduction
//!
//! These tests train complete machines on synthetic Gaussian blobs and
//! check behaviour that only shows up end to end: accuracy, partition
//! sizes, failure handling and persistence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rsvm_multiclass::api::{quick, MulticlassSVM};
use rsvm_multiclass::coding::CodingMatrix;
use rsvm_multiclass::strategy::Partition;
use rsvm_multiclass::{
    BinaryTrainingError, Dataset, Decoder, Ecoc, EncoderConfig, KernelSvm, LinearSvm, MachineState,
    MulticlassDataset, MulticlassError, MulticlassMachine, OneVsOne, OneVsRest, RBFKernel,
    RandomDenseEncoder, RandomSparseEncoder, Sample, SerializableMachine, SparseVector, Strategy,
    StrategyConfig, TrainedSvm,
};
use tempfile::NamedTempFile;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Standard normal draw (Box-Muller)
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// One isotropic blob per class, centred at 6 * e_class
fn blobs(sizes: &[usize], spread: f64, seed: u64) -> MulticlassDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let dim = sizes.len();
    let mut samples = Vec::new();

    for (class, &size) in sizes.iter().enumerate() {
        for _ in 0..size {
            let point: Vec<f64> = (0..dim)
                .map(|d| {
                    let center = if d == class { 6.0 } else { 0.0 };
                    center + spread * gaussian(&mut rng)
                })
                .collect();
            samples.push(Sample::new(SparseVector::from_dense(&point), class));
        }
    }
    MulticlassDataset::new(samples).expect("blobs are a valid dataset")
}

/// Concentric rings in the plane, one per class
fn rings(per_class: usize, n_classes: usize, seed: u64) -> MulticlassDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::new();

    for class in 0..n_classes {
        let radius = 1.0 + 2.5 * class as f64;
        for _ in 0..per_class {
            let angle = rng.gen_range(0.0..2.0 * std::f64::consts::PI);
            let r = radius + 0.2 * gaussian(&mut rng);
            let point = [r * angle.cos(), r * angle.sin()];
            samples.push(Sample::new(SparseVector::from_dense(&point), class));
        }
    }
    MulticlassDataset::new(samples).expect("rings are a valid dataset")
}

fn accuracy<S: Strategy>(
    machine: &MulticlassMachine<LinearSvm, S>,
    data: &MulticlassDataset,
) -> f64 {
    let predictions = machine.predict_dataset(data).expect("machine is trained");
    let correct = predictions
        .iter()
        .zip(data.samples())
        .filter(|(&p, s)| p == s.label)
        .count();
    correct as f64 / data.len() as f64
}

#[test]
fn test_one_vs_rest_three_blobs() {
    init_logging();
    let train = blobs(&[40, 40, 40], 0.8, 1);
    let test = blobs(&[30, 30, 30], 0.8, 2);

    let mut machine = MulticlassMachine::new(LinearSvm::new(), OneVsRest::new());
    machine.train(&train).expect("Training should succeed");

    assert_eq!(machine.state(), MachineState::Trained);
    assert_eq!(machine.submachines().len(), 3);
    assert!(machine.submachines().iter().all(|s| s.n_samples() == 120));

    let acc = accuracy(&machine, &test);
    assert!(acc >= 0.95, "held-out accuracy too low: {acc}");
}

#[test]
fn test_one_vs_one_partition_sizes() {
    init_logging();
    let sizes = [20, 30, 25, 15];
    let train = blobs(&sizes, 0.8, 3);

    let mut machine = MulticlassMachine::new(LinearSvm::new(), OneVsOne::new());
    machine.train(&train).expect("Training should succeed");

    assert_eq!(machine.submachines().len(), 6);
    for sub in machine.submachines() {
        let (i, j) = OneVsOne::pair_for_row(sub.row, 4).expect("row within range");
        assert_eq!(sub.n_positive, sizes[i]);
        assert_eq!(sub.n_negative, sizes[j]);
        assert_eq!(sub.n_samples(), sizes[i] + sizes[j]);
    }

    let acc = accuracy(&machine, &blobs(&[25; 4], 0.8, 4));
    assert!(acc >= 0.95, "held-out accuracy too low: {acc}");
}

#[test]
fn test_ecoc_dense_and_sparse_codes() {
    init_logging();
    let train = blobs(&[30; 5], 0.8, 5);
    let test = blobs(&[20; 5], 0.8, 6);

    let dense = Ecoc::with_encoder(RandomDenseEncoder::new(7).with_max_trials(500))
        .decoded_with(Decoder::Hamming);
    let mut machine = MulticlassMachine::new(LinearSvm::new(), dense);
    machine.train(&train).expect("dense ECOC should train");
    // ceil(10 ln 5)
    assert_eq!(machine.submachines().len(), 17);
    let acc = accuracy(&machine, &test);
    assert!(acc >= 0.95, "dense ECOC accuracy too low: {acc}");

    let sparse = Ecoc::with_encoder(RandomSparseEncoder::new(7).with_max_trials(500));
    let mut machine = MulticlassMachine::new(LinearSvm::new(), sparse);
    machine.train(&train).expect("sparse ECOC should train");
    // ceil(15 ln 5)
    assert_eq!(machine.submachines().len(), 25);

    // Each sub-machine separates exactly the classes its row colors
    let matrix = machine.coding_matrix().expect("trained machine has a matrix");
    for sample in train.samples() {
        let outputs = machine.outputs(&sample.features).unwrap();
        for (row, score) in outputs.iter().enumerate() {
            let code = matrix.get(row, sample.label);
            if code != 0 {
                assert!(score * f64::from(code) > 0.0, "row {row} misclassifies");
            }
        }
    }
    let acc = accuracy(&machine, &test);
    assert!(acc >= 0.95, "sparse ECOC accuracy too low: {acc}");
}

#[test]
fn test_fixed_sparse_code() {
    let train = blobs(&[30; 4], 0.8, 18);
    let test = blobs(&[20; 4], 0.8, 19);

    // Every pair of classes is split by at least two rows
    let code = Ecoc::from_rows(vec![
        vec![1, -1, 0, 0],
        vec![0, 0, 1, -1],
        vec![1, 0, -1, 0],
        vec![0, 1, 0, -1],
        vec![1, 0, 0, -1],
        vec![0, 1, -1, 0],
        vec![1, 1, -1, -1],
        vec![1, -1, 1, -1],
    ])
    .unwrap();
    let mut machine = MulticlassMachine::new(LinearSvm::new(), code);
    machine.train(&train).expect("fixed sparse code should train");

    assert_eq!(machine.submachines()[0].n_samples(), 60);
    assert_eq!(machine.submachines()[6].n_samples(), 120);
    let acc = accuracy(&machine, &test);
    assert!(acc >= 0.95, "fixed sparse code accuracy too low: {acc}");
}

#[test]
fn test_single_colored_row_rejected() {
    let err = Ecoc::from_rows(vec![vec![1, -1, -1], vec![-1, -1, -1]]).unwrap_err();
    assert!(matches!(err, MulticlassError::Configuration(_)));

    // K = 1 has no binary sub-problem at all
    let train = blobs(&[10], 0.5, 7);
    let mut machine = MulticlassMachine::new(LinearSvm::new(), OneVsRest::new());
    assert!(matches!(
        machine.train(&train),
        Err(MulticlassError::Configuration(_))
    ));
    assert_eq!(machine.state(), MachineState::Uninitialized);

    let far_label = MulticlassDataset::from_dense(&[vec![1.0], vec![-1.0]], &[0, usize::MAX])
        .unwrap();
    assert!(matches!(
        machine.train(&far_label),
        Err(MulticlassError::Configuration(_))
    ));
    assert_eq!(machine.state(), MachineState::Uninitialized);
}

/// Drops the negative samples of its last row
struct DropsNegatives;

impl Strategy for DropsNegatives {
    fn coding_matrix(&self, n_classes: usize) -> rsvm_multiclass::Result<CodingMatrix> {
        CodingMatrix::one_vs_rest(n_classes)
    }

    fn partition(&self, matrix: &CodingMatrix, row: usize, labels: &[usize]) -> Partition {
        let full = Partition::from_row(matrix.row(row), labels);
        if row + 1 < matrix.n_rows() {
            return full;
        }
        let (indices, targets) = full
            .indices
            .into_iter()
            .zip(full.targets)
            .filter(|&(_, t)| t > 0.0)
            .unzip();
        Partition { indices, targets }
    }

    fn decoder(&self) -> Decoder {
        Decoder::Hamming
    }

    fn name(&self) -> &str {
        "drops-negatives"
    }
}

#[test]
fn test_degenerate_partition_reported() {
    let train = blobs(&[10, 10, 10], 0.5, 8);
    let mut machine = MulticlassMachine::new(LinearSvm::new(), DropsNegatives);

    match machine.train(&train) {
        Err(MulticlassError::DegenerateSubproblem { row, reason }) => {
            assert_eq!(row, 2);
            assert!(reason.contains("negative"));
        }
        other => panic!("expected a degenerate sub-problem, got {:?}", other.err()),
    }
    assert_eq!(machine.state(), MachineState::Uninitialized);
    assert!(machine.submachines().is_empty());
}

#[test]
fn test_failing_learner_reports_lowest_row() {
    let train = blobs(&[15, 15, 15, 15], 0.8, 9);
    let strict = LinearSvm::new()
        .with_epsilon(0.0)
        .with_max_iterations(1)
        .strict();
    let mut machine = MulticlassMachine::new(strict, OneVsOne::new()).with_threads(3);

    match machine.train(&train) {
        Err(MulticlassError::SubmachineTraining { row, source }) => {
            assert_eq!(row, 0);
            assert_eq!(source, BinaryTrainingError::NonConvergence { iterations: 1 });
        }
        other => panic!("expected a training failure, got {:?}", other.err()),
    }
    assert_eq!(machine.state(), MachineState::Uninitialized);
    assert!(machine.coding_matrix().is_none());

    let probe = &train.samples()[0].features;
    assert!(matches!(
        machine.predict(probe),
        Err(MulticlassError::InvalidState { .. })
    ));
}

#[test]
fn test_state_machine() {
    let train = blobs(&[10, 10], 0.5, 10);
    let mut machine = MulticlassMachine::new(LinearSvm::new(), OneVsRest::new());
    let probe = train.samples()[0].features.clone();

    assert!(matches!(
        machine.predict(&probe),
        Err(MulticlassError::InvalidState {
            state: MachineState::Uninitialized,
            ..
        })
    ));

    machine.train(&train).expect("Training should succeed");
    assert_eq!(machine.predict(&probe).unwrap(), 0);

    assert!(matches!(
        machine.train(&train),
        Err(MulticlassError::InvalidState {
            operation: "train",
            state: MachineState::Trained,
        })
    ));
    // the failed retrain leaves the trained model in place
    assert!(machine.is_trained());
}

#[test]
fn test_thread_count_does_not_change_model() {
    let train = blobs(&[20, 20, 20], 0.8, 11);
    let test = blobs(&[10, 10, 10], 0.8, 12);

    let mut sequential = MulticlassMachine::new(LinearSvm::new(), OneVsOne::new()).with_threads(1);
    let mut parallel = MulticlassMachine::new(LinearSvm::new(), OneVsOne::new()).with_threads(4);
    sequential.train(&train).unwrap();
    parallel.train(&train).unwrap();

    for x in test.feature_vectors() {
        assert_eq!(sequential.outputs(&x).unwrap(), parallel.outputs(&x).unwrap());
    }
}

#[test]
fn test_detailed_prediction_costs() {
    let train = blobs(&[20, 20, 20], 0.5, 13);
    let mut machine = MulticlassMachine::new(LinearSvm::new(), OneVsRest::new());
    machine.train(&train).unwrap();

    for sample in train.samples().iter().take(10) {
        let prediction = machine.predict_detailed(&sample.features).unwrap();
        assert_eq!(prediction.outputs.len(), 3);
        assert_eq!(prediction.costs.len(), 3);

        let best = prediction
            .costs
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        assert_eq!(prediction.costs[prediction.class], best);
        assert_eq!(prediction.class, sample.label);
    }
}

#[test]
fn test_kernel_svm_on_rings() {
    init_logging();
    let train = rings(40, 3, 14);
    let test = rings(30, 3, 15);

    let learner = KernelSvm::new(RBFKernel::new(0.5)).with_c(10.0);
    let mut machine = MulticlassMachine::new(learner, OneVsOne::new());
    machine.train(&train).expect("Training should succeed");

    let predictions = machine.predict_batch(&test.feature_vectors()).unwrap();
    let correct = predictions
        .iter()
        .zip(test.samples())
        .filter(|(&p, s)| p == s.label)
        .count();
    let acc = correct as f64 / test.len() as f64;
    assert!(acc >= 0.9, "RBF accuracy on rings too low: {acc}");

    // Persist and reload the kernel machine
    let saved = SerializableMachine::from_machine(&machine).unwrap();
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    saved.save_to_file(temp_file.path()).unwrap();

    let loaded: SerializableMachine<KernelSvm<RBFKernel>, TrainedSvm<RBFKernel>> =
        SerializableMachine::load_from_file(temp_file.path()).unwrap();
    let restored = loaded.into_machine().unwrap();
    assert_eq!(restored.strategy().decoder(), Decoder::Voting);
    assert_eq!(
        restored.predict_batch(&test.feature_vectors()).unwrap(),
        predictions
    );
}

#[test]
fn test_high_level_api_workflow() {
    init_logging();
    let train = blobs(&[25, 25, 25, 25], 0.8, 16);
    let test = blobs(&[15, 15, 15, 15], 0.8, 17);

    let model = MulticlassSVM::new()
        .with_c(1.0)
        .with_strategy(StrategyConfig::Ecoc {
            encoder: EncoderConfig::RandomDense {
                code_length: Some(12),
                max_trials: 200,
                seed: 5,
            },
            decoder: Some(Decoder::margin_loss()),
        })
        .with_threads(2)
        .train(&train)
        .expect("Training should succeed");

    let metrics = model.evaluate_detailed(&test).unwrap();
    assert!(metrics.accuracy() >= 0.95);
    assert!(metrics.macro_f1() >= 0.9);
    assert_eq!(model.info().n_submachines, 12);

    let ovo = quick::train_one_vs_one(&train).unwrap();
    assert!(ovo.evaluate(&test).unwrap() >= 0.95);
}
