use hnfeat::core::io::pdb::{PdbFile, PdbReadOptions};
use hnfeat::core::io::tables;
use hnfeat::core::io::traits::EnsembleFile;
use hnfeat::core::models::structure::{Structure, StructureBuilder};
use hnfeat::engine::config::{FeaturizationConfig, FeaturizationConfigBuilder, LeadingSlot};
use hnfeat::engine::progress::ProgressReporter;
use hnfeat::engine::state::SkipReason;
use hnfeat::workflows::featurize::{self, EnsembleSizing};
use nalgebra::{Point3, Rotation3, Vector3};
use std::io::Cursor;
use tempfile::tempdir;

const RESIDUES: [&str; 10] = [
    "MET", "ALA", "GLY", "SER", "LEU", "PRO", "LYS", "ASP", "PHE", "VAL",
];
const PROLINE_INDEX: usize = 5;

fn atom_line(serial: usize, name: &str, res_name: &str, res_seq: usize, pos: [f64; 3], b: f64) -> String {
    format!(
        "ATOM  {:>5} {:<4} {:>3} A{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
        serial, name, res_name, res_seq, pos[0], pos[1], pos[2], 1.0, b
    )
}

type Residue = (&'static str, Vec<(&'static str, Point3<f64>, f64)>);

/// Backbone atoms of an extended zig-zag strand, with a per-model deterministic
/// perturbation and a rigid rotation.
fn strand(model: usize, rotation: &Rotation3<f64>) -> Vec<Residue> {
    let mut residues = Vec::new();
    let mut serial = 0;
    for (i, res_name) in RESIDUES.iter().enumerate() {
        let x0 = i as f64 * 3.8;
        let flip = if i % 2 == 0 { 1.0 } else { -1.0 };
        let mut atoms: Vec<(&str, [f64; 3])> = vec![
            ("N", [x0, 0.0, 0.0]),
            ("H", [x0, -1.0 * flip, 0.0]),
            ("CA", [x0 + 1.2, 0.8 * flip, 0.1]),
            ("C", [x0 + 2.6, 0.4 * flip, -0.1]),
            ("O", [x0 + 3.0, 1.5 * flip, 0.3]),
            ("CB", [x0 + 1.3, 1.6 * flip, 1.3]),
        ];
        if *res_name == "GLY" {
            atoms.retain(|(name, _)| *name != "CB");
        }
        if *res_name == "PRO" {
            atoms.retain(|(name, _)| *name != "H");
        }
        let mut placed = Vec::new();
        for (name, pos) in atoms {
            serial += 1;
            let phase = (model + 1) as f64 * 1.7 + serial as f64 * 0.37;
            let jitter = Vector3::new(phase.sin(), (phase * 1.3).cos(), (phase * 0.7).sin()) * 0.05;
            let p = rotation * (Vector3::new(pos[0], pos[1], pos[2]) + jitter);
            placed.push((name, Point3::from(p), 70.0 + (serial % 20) as f64));
        }
        residues.push((*res_name, placed));
    }
    residues
}

fn model_lines(model: usize, rotation: &Rotation3<f64>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut serial = 0;
    for (i, (res_name, atoms)) in strand(model, rotation).into_iter().enumerate() {
        for (name, p, b) in atoms {
            serial += 1;
            lines.push(atom_line(serial, name, res_name, i + 1, [p.x, p.y, p.z], b));
        }
    }
    lines.push("HETATM  999  O   HOH A 101      20.000  20.000  20.000  1.00  0.00".to_string());
    lines
}

fn build_models(count: usize, rotation: &Rotation3<f64>) -> Vec<Structure> {
    (0..count)
        .map(|model| {
            let mut builder = StructureBuilder::new();
            for (i, (res_name, atoms)) in strand(model, rotation).into_iter().enumerate() {
                builder.start_residue(i as isize + 1, None, res_name, 'A');
                for (name, p, b) in atoms {
                    builder.add_atom(name, p, 1.0, b);
                }
            }
            builder.build()
        })
        .collect()
}

fn ensemble_pdb(models: usize, rotation: &Rotation3<f64>) -> String {
    let mut text = vec!["REMARK synthetic strand ensemble".to_string()];
    for model in 0..models {
        text.push(format!("MODEL     {:>4}", model + 1));
        text.extend(model_lines(model, rotation));
        text.push("ENDMDL".to_string());
    }
    text.push("END".to_string());
    text.join("\n")
}

fn read_models(text: &str) -> Vec<Structure> {
    PdbFile::read_from(&mut Cursor::new(text.as_bytes()), &PdbReadOptions::default()).unwrap()
}

fn config(ensemble_size: usize) -> FeaturizationConfig {
    FeaturizationConfigBuilder::new()
        .ensemble_size(ensemble_size)
        .neighbor_count(8)
        .top_k(6)
        .include_confidence(true)
        .build()
        .unwrap()
}

fn csv_bytes(result: &featurize::FeaturizationResult) -> (Vec<u8>, Vec<u8>) {
    let mut aggregated = Vec::new();
    tables::write_aggregated_table(&result.aggregated, &mut aggregated).unwrap();
    let mut features = Vec::new();
    tables::write_feature_table(&result.features, &mut features).unwrap();
    (aggregated, features)
}

#[test]
fn ensemble_is_featurized_into_fixed_width_rows() {
    let models = read_models(&ensemble_pdb(4, &Rotation3::identity()));
    assert_eq!(models.len(), 4);
    assert!(models.iter().all(|m| m.residue_count() == RESIDUES.len()));

    let result = featurize::run(&models, &config(4), &ProgressReporter::new()).unwrap();

    let anchors: Vec<usize> = result.features.rows.iter().map(|r| r.res_index).collect();
    assert_eq!(anchors, vec![1, 2, 3, 4, 6, 7, 8, 9]);
    assert_eq!(result.features.columns.len(), 1 + 6 * 7);
    for row in &result.features.rows {
        assert_eq!(row.values.len() + 1, result.features.columns.len());
    }
    for rows in result.aggregated.neighbors.values() {
        assert_eq!(rows.len(), 6);
        assert!(rows.windows(2).all(|w| w[0].metric >= w[1].metric));
        for row in rows {
            assert!(row.metric > 0.0);
            assert!((1..=4).contains(&row.model_count));
            assert!((0.0..=1.0).contains(&row.confidence));
        }
    }

    let per_model_skips: Vec<(usize, SkipReason)> = result
        .skips
        .iter()
        .filter(|s| s.model_index == 0)
        .filter_map(|s| s.residue_index.map(|r| (r, s.reason)))
        .collect();
    assert!(per_model_skips.contains(&(PROLINE_INDEX, SkipReason::MissingAmideAtoms)));
    assert!(per_model_skips.iter().any(|(r, reason)| *r == 0
        && matches!(reason, SkipReason::Orientation(_))));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let models = read_models(&ensemble_pdb(3, &Rotation3::identity()));
    let first = featurize::run(&models, &config(3), &ProgressReporter::new()).unwrap();
    let second = featurize::run(&models, &config(3), &ProgressReporter::new()).unwrap();
    assert_eq!(csv_bytes(&first), csv_bytes(&second));
}

#[test]
fn model_order_does_not_change_the_result() {
    let models = read_models(&ensemble_pdb(4, &Rotation3::identity()));
    let forward = featurize::run(&models, &config(4), &ProgressReporter::new()).unwrap();

    let reversed: Vec<Structure> = models.into_iter().rev().collect();
    let backward = featurize::run(&reversed, &config(4), &ProgressReporter::new()).unwrap();

    assert_eq!(forward.aggregated, backward.aggregated);
    assert_eq!(csv_bytes(&forward), csv_bytes(&backward));
}

#[test]
fn features_are_invariant_under_rigid_rotation() {
    let rotation = Rotation3::from_euler_angles(0.4, -1.1, 2.3);
    let plain = build_models(2, &Rotation3::identity());
    let rotated = build_models(2, &rotation);

    let a = featurize::run(&plain, &config(2), &ProgressReporter::new()).unwrap();
    let b = featurize::run(&rotated, &config(2), &ProgressReporter::new()).unwrap();

    assert_eq!(a.aggregated.anchors, b.aggregated.anchors);
    for (x, y) in a.aggregated.rows().zip(b.aggregated.rows()) {
        assert_eq!(x.key(), y.key());
        assert!((x.metric - y.metric).abs() < 1e-9);
        assert!((x.direction - y.direction).norm() < 1e-9);
    }
}

#[test]
fn anchor_slot_layout_extends_rows_by_one_slot() {
    let models = read_models(&ensemble_pdb(2, &Rotation3::identity()));
    let mut cfg = config(2);
    cfg.encoding.leading_slot = LeadingSlot::AnchorResidue;
    let result = featurize::run(&models, &cfg, &ProgressReporter::new()).unwrap();
    assert_eq!(result.features.columns.len(), 1 + 7 * 7);
    assert!(result.features.columns.contains(&"metric_n_7".to_string()));
}

#[test]
fn checkpoints_reaggregate_to_the_same_features() {
    let dir = tempdir().unwrap();
    let models = read_models(&ensemble_pdb(3, &Rotation3::identity()));
    let cfg = config(3);
    let full = featurize::run(&models, &cfg, &ProgressReporter::new()).unwrap();

    let mut restored = Vec::new();
    for table in &full.model_tables {
        let path = dir.path().join(format!("model_{}.csv", table.model_index));
        tables::write_neighbor_table_to_path(table, &path).unwrap();
        restored.push(tables::read_neighbor_table_from_path(&path, table.model_index).unwrap());
    }
    assert_eq!(restored, full.model_tables);

    let (aggregated, features) =
        featurize::aggregate_tables(&restored, &cfg, &ProgressReporter::new()).unwrap();
    assert_eq!(aggregated, full.aggregated);
    assert_eq!(features, full.features);
}

#[test]
fn batch_reports_failures_per_input() {
    let dir = tempdir().unwrap();
    let good_a = dir.path().join("a.pdb");
    let good_b = dir.path().join("b.pdb");
    let broken = dir.path().join("broken.pdb");
    std::fs::write(&good_a, ensemble_pdb(2, &Rotation3::identity())).unwrap();
    std::fs::write(&good_b, ensemble_pdb(3, &Rotation3::identity())).unwrap();
    std::fs::write(&broken, "REMARK no atoms\nEND\n").unwrap();

    let inputs = vec![good_a.clone(), broken.clone(), good_b.clone()];
    let outcomes = featurize::run_batch(
        &inputs,
        &config(1),
        EnsembleSizing::PerInput,
        &ProgressReporter::new(),
    )
    .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].source, good_a);
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[1].result.is_err());
    let b = outcomes[2].result.as_ref().unwrap();
    assert_eq!(b.model_tables.len(), 3);
    assert!(b.aggregated.rows().all(|r| (1..=3).contains(&r.model_count)));

    let fixed = featurize::run_batch(
        &inputs,
        &config(2),
        EnsembleSizing::Configured,
        &ProgressReporter::new(),
    )
    .unwrap();
    assert!(fixed[0].result.is_ok());
    assert!(fixed[2].result.is_err());
}
