use crate::core::io::traits::EnsembleFile;
use crate::core::models::structure::{Structure, StructureBuilder};
use nalgebra::Point3;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Shortest ATOM line that still carries the x/y/z columns.
const MIN_ATOM_LINE_LEN: usize = 54;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdbReadOptions {
    /// Chain to featurize. `None` selects the first chain seen in the file.
    pub chain_id: Option<char>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for an ATOM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    columns: &str,
    default: f64,
) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_float(line, line_num, start, end, columns)
    }
}

struct AtomLine<'a> {
    name: &'a str,
    res_name: &'a str,
    chain_id: char,
    res_seq: isize,
    insertion_code: Option<char>,
    position: Point3<f64>,
    occupancy: f64,
    b_factor: f64,
}

fn parse_atom_line(line: &str, line_num: usize) -> Result<AtomLine<'_>, PdbError> {
    if line.len() < MIN_ATOM_LINE_LEN {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }

    let name = slice_and_trim(line, 12, 16);
    if name.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }
    let res_name = slice_and_trim(line, 17, 20);
    if res_name.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "18-20".into(),
            },
        });
    }

    let res_seq_str = slice_and_trim(line, 22, 26);
    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "23-26".into(),
            value: res_seq_str.into(),
        },
    })?;

    let x = parse_float(line, line_num, 30, 38, "31-38")?;
    let y = parse_float(line, line_num, 38, 46, "39-46")?;
    let z = parse_float(line, line_num, 46, 54, "47-54")?;
    let occupancy = parse_optional_float(line, line_num, 54, 60, "55-60", 1.0)?;
    let b_factor = parse_optional_float(line, line_num, 60, 66, "61-66", 0.0)?;

    Ok(AtomLine {
        name,
        res_name,
        chain_id: column_char(line, 21).unwrap_or(' '),
        res_seq,
        insertion_code: column_char(line, 26),
        position: Point3::new(x, y, z),
        occupancy,
        b_factor,
    })
}

/// Accumulates the models of one PDB stream.
struct EnsembleAccumulator {
    models: Vec<Structure>,
    current: Option<StructureBuilder>,
    current_residue: Option<(isize, Option<char>, String)>,
}

impl EnsembleAccumulator {
    fn new() -> Self {
        Self {
            models: Vec::new(),
            current: None,
            current_residue: None,
        }
    }

    fn open_model(&mut self) {
        self.close_model();
        self.current = Some(StructureBuilder::new());
    }

    fn close_model(&mut self) {
        if let Some(builder) = self.current.take() {
            self.models.push(builder.build());
        }
        self.current_residue = None;
    }

    fn add(&mut self, atom: &AtomLine<'_>) {
        let builder = self.current.get_or_insert_with(StructureBuilder::new);
        let key = (atom.res_seq, atom.insertion_code, atom.res_name.to_string());
        if self.current_residue.as_ref() != Some(&key) {
            builder.start_residue(atom.res_seq, atom.insertion_code, atom.res_name, atom.chain_id);
            self.current_residue = Some(key);
        }
        if builder
            .add_atom(atom.name, atom.position, atom.occupancy, atom.b_factor)
            .is_none()
        {
            trace!(
                atom = atom.name,
                residue = atom.res_seq,
                "Dropping alternate location of atom"
            );
        }
    }
}

pub struct PdbFile;

impl EnsembleFile for PdbFile {
    type Options = PdbReadOptions;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
        options: &Self::Options,
    ) -> Result<Vec<Structure>, Self::Error> {
        let mut ensemble = EnsembleAccumulator::new();
        let mut selected_chain = options.chain_id;
        let mut saw_atom = false;
        let mut matched_chain = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "MODEL" => ensemble.open_model(),
                "ENDMDL" => ensemble.close_model(),
                "ATOM" => {
                    let atom = parse_atom_line(&line, line_num)?;
                    saw_atom = true;
                    let chain = *selected_chain.get_or_insert(atom.chain_id);
                    if atom.chain_id != chain {
                        continue;
                    }
                    matched_chain = true;
                    ensemble.add(&atom);
                }
                "END" => break,
                _ => {}
            }
        }
        ensemble.close_model();

        if !saw_atom {
            return Err(PdbError::MissingRecord("ATOM records".into()));
        }
        if !matched_chain {
            let chain = selected_chain.map(String::from).unwrap_or_default();
            return Err(PdbError::MissingRecord(format!(
                "ATOM records for chain '{}'",
                chain
            )));
        }

        debug!(
            models = ensemble.models.len(),
            chain = ?selected_chain,
            "Parsed PDB ensemble"
        );
        Ok(ensemble.models)
    }
}

impl PdbFile {
    /// Reads an ensemble from either a multi-model PDB file or a directory of
    /// `.pdb` files, each contributing its models in file-name order.
    pub fn read_ensemble<P: AsRef<Path>>(
        path: P,
        options: &PdbReadOptions,
    ) -> Result<Vec<Structure>, PdbError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Self::read_from_path(path, options);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdb"))
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(PdbError::MissingRecord(format!(
                "PDB files in directory '{}'",
                path.display()
            )));
        }

        let mut models = Vec::new();
        for file in &files {
            models.extend(Self::read_from_path(file, options)?);
        }
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use crate::core::models::residue::ResidueType;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[allow(clippy::too_many_arguments)]
    fn atom_line(
        serial: usize,
        name: &str,
        alt: char,
        res_name: &str,
        chain: char,
        res_seq: isize,
        pos: (f64, f64, f64),
        b: f64,
    ) -> String {
        format!(
            "ATOM  {:>5} {:<4}{}{:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
            serial, name, alt, res_name, chain, res_seq, pos.0, pos.1, pos.2, 1.0, b
        )
    }

    fn read(content: &str, options: &PdbReadOptions) -> Result<Vec<Structure>, PdbError> {
        PdbFile::read_from(&mut Cursor::new(content.as_bytes()), options)
    }

    #[test]
    fn single_model_without_model_records_is_read() {
        let content = [
            atom_line(1, "N", ' ', "ALA", 'A', 1, (0.0, 0.0, 0.0), 80.0),
            atom_line(2, "CA", ' ', "ALA", 'A', 1, (1.458, 0.0, 0.0), 81.0),
            atom_line(3, "N", ' ', "GLY", 'A', 2, (3.0, 1.0, 0.0), 82.0),
            "END".to_string(),
        ]
        .join("\n");

        let models = read(&content, &PdbReadOptions::default()).unwrap();
        assert_eq!(models.len(), 1);
        let model = &models[0];
        assert_eq!(model.residue_count(), 2);
        assert_eq!(model.atom_count(), 3);

        let ala = model.residue_at(0).unwrap();
        assert_eq!(ala.residue_type, Some(ResidueType::Alanine));
        let ca = model.residue_atom(ala, "CA").unwrap();
        assert_eq!(ca.element, Some(Element::C));
        assert!((ca.position.x - 1.458).abs() < 1e-9);
        assert!((ca.b_factor - 81.0).abs() < 1e-9);
    }

    #[test]
    fn model_blocks_become_separate_structures() {
        let content = [
            "MODEL        1".to_string(),
            atom_line(1, "N", ' ', "ALA", 'A', 1, (0.0, 0.0, 0.0), 0.0),
            "ENDMDL".to_string(),
            "MODEL        2".to_string(),
            atom_line(1, "N", ' ', "ALA", 'A', 1, (0.5, 0.0, 0.0), 0.0),
            "ENDMDL".to_string(),
            "END".to_string(),
        ]
        .join("\n");

        let models = read(&content, &PdbReadOptions::default()).unwrap();
        assert_eq!(models.len(), 2);
        let n2 = models[1]
            .residue_atom(models[1].residue_at(0).unwrap(), "N")
            .unwrap();
        assert!((n2.position.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hetatm_and_other_chains_are_skipped() {
        let content = [
            atom_line(1, "N", ' ', "ALA", 'A', 1, (0.0, 0.0, 0.0), 0.0),
            atom_line(2, "N", ' ', "GLY", 'B', 1, (9.0, 0.0, 0.0), 0.0),
            "HETATM    3  O   HOH A 101       5.000   5.000   5.000  1.00  0.00".to_string(),
            atom_line(4, "N", ' ', "SER", 'A', 2, (3.0, 0.0, 0.0), 0.0),
        ]
        .join("\n");

        let models = read(&content, &PdbReadOptions::default()).unwrap();
        let names: Vec<&str> = models[0].residues().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ALA", "SER"]);

        let chain_b = read(&content, &PdbReadOptions { chain_id: Some('B') }).unwrap();
        let names: Vec<&str> = chain_b[0].residues().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["GLY"]);
    }

    #[test]
    fn first_alternate_location_wins() {
        let content = [
            atom_line(1, "OG", 'A', "SER", 'A', 1, (1.0, 0.0, 0.0), 0.0),
            atom_line(2, "OG", 'B', "SER", 'A', 1, (2.0, 0.0, 0.0), 0.0),
        ]
        .join("\n");
        let models = read(&content, &PdbReadOptions::default()).unwrap();
        let residue = models[0].residue_at(0).unwrap();
        assert_eq!(residue.atoms().len(), 1);
        let og = models[0].residue_atom(residue, "OG").unwrap();
        assert!((og.position.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn insertion_codes_start_new_residues() {
        let mut with_icode = atom_line(2, "N", ' ', "GLY", 'A', 52, (3.0, 0.0, 0.0), 0.0);
        with_icode.replace_range(26..27, "A");
        let content = [
            atom_line(1, "N", ' ', "ALA", 'A', 52, (0.0, 0.0, 0.0), 0.0),
            with_icode,
        ]
        .join("\n");
        let models = read(&content, &PdbReadOptions::default()).unwrap();
        assert_eq!(models[0].residue_count(), 2);
        assert_eq!(models[0].residue_at(1).unwrap().insertion_code, Some('A'));
    }

    #[test]
    fn malformed_coordinate_reports_line_and_columns() {
        let mut bad = atom_line(1, "N", ' ', "ALA", 'A', 1, (0.0, 0.0, 0.0), 0.0);
        bad.replace_range(30..38, "   abc  ");
        let content = format!("REMARK test\n{}", bad);
        let err = read(&content, &PdbReadOptions::default()).unwrap_err();
        match err {
            PdbError::Parse {
                line,
                kind: PdbParseErrorKind::InvalidFloat { columns, value },
            } => {
                assert_eq!(line, 2);
                assert_eq!(columns, "31-38");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_line_is_rejected() {
        let err = read("ATOM      1  N   ALA A   1", &PdbReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::LineTooShort,
                ..
            }
        ));
    }

    #[test]
    fn file_without_atoms_is_rejected() {
        let err = read("REMARK nothing here\nEND\n", &PdbReadOptions::default()).unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));

        let content = atom_line(1, "N", ' ', "ALA", 'A', 1, (0.0, 0.0, 0.0), 0.0);
        let err = read(&content, &PdbReadOptions { chain_id: Some('Z') }).unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));
    }

    #[test]
    fn read_ensemble_accepts_directory_of_models() {
        let dir = tempdir().unwrap();
        for (i, x) in [(2, 2.0), (1, 1.0)] {
            let line = atom_line(1, "N", ' ', "ALA", 'A', 1, (x, 0.0, 0.0), 0.0);
            fs::write(dir.path().join(format!("model_{i}.pdb")), line).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let models = PdbFile::read_ensemble(dir.path(), &PdbReadOptions::default()).unwrap();
        assert_eq!(models.len(), 2);
        let first = models[0]
            .residue_atom(models[0].residue_at(0).unwrap(), "N")
            .unwrap();
        assert!((first.position.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn read_ensemble_rejects_empty_directory() {
        let dir = tempdir().unwrap();
        let err = PdbFile::read_ensemble(dir.path(), &PdbReadOptions::default()).unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));
    }
}
