//! Trained gesture templates.
//!
//! Persisted as two CSV files written side by side:
//! - `gesture_data.csv`: one row per template, each cell a pixel landmark `(x, y)`
//! - `gesture_names.csv`: a single row with the template names in the same order
//!
//! Descriptors are built once at load time and the library is read-only afterwards.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use crate::classifier::{GestureClassifier, Label};
use crate::descriptor::GestureDescriptor;
use crate::error::{GestureError, GestureResult};
use crate::types::{Landmarks, Point2};

#[derive(Debug, Clone)]
pub struct GestureTemplate {
    pub name: String,
    pub descriptor: GestureDescriptor,
    /// Landmarks the descriptor was built from; kept for saving and verification
    pub sample: Landmarks,
}

/// A stored sample that does not classify as its own name
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyMismatch {
    pub index: usize,
    pub expected: String,
    pub got: Label,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: Vec<GestureTemplate>,
}

impl TemplateLibrary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a library from named landmark samples, preserving their order.
    pub fn from_samples(
        samples: Vec<(String, Landmarks)>,
        landmark_count: usize,
    ) -> GestureResult<Self> {
        let mut templates = Vec::with_capacity(samples.len());
        for (row, (name, sample)) in samples.into_iter().enumerate() {
            if sample.len() != landmark_count {
                return Err(GestureError::Configuration(format!(
                    "template {} ({:?}) has {} landmarks, expected {}",
                    row,
                    name,
                    sample.len(),
                    landmark_count
                )));
            }
            let descriptor = GestureDescriptor::build(&sample).map_err(|e| {
                GestureError::Configuration(format!("template {} ({:?}): {}", row, name, e))
            })?;
            templates.push(GestureTemplate {
                name,
                descriptor,
                sample,
            });
        }
        Ok(Self { templates })
    }

    /// Load the two-file template set from disk.
    pub fn load(data_path: &Path, names_path: &Path, landmark_count: usize) -> GestureResult<Self> {
        let data = open(data_path)?;
        let names = open(names_path)?;
        let library = Self::from_readers(data, names, landmark_count)?;
        info!(
            "Loaded {} gesture templates from {}",
            library.len(),
            data_path.display()
        );
        Ok(library)
    }

    pub fn from_readers<D: Read, N: Read>(
        data: D,
        names: N,
        landmark_count: usize,
    ) -> GestureResult<Self> {
        let samples = read_samples(data)?;
        let names = read_names(names)?;

        if samples.len() != names.len() {
            return Err(GestureError::Configuration(format!(
                "{} landmark records but {} gesture names",
                samples.len(),
                names.len()
            )));
        }

        Self::from_samples(names.into_iter().zip(samples).collect(), landmark_count)
    }

    /// Write the library in the same two-file format `load` reads.
    pub fn save(&self, data_path: &Path, names_path: &Path) -> GestureResult<()> {
        let data = create(data_path)?;
        let names = create(names_path)?;
        self.to_writers(data, names)
    }

    pub fn to_writers<D: Write, N: Write>(&self, data: D, names: N) -> GestureResult<()> {
        let mut data_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(data);
        for template in &self.templates {
            let cells: Vec<String> = template
                .sample
                .points
                .iter()
                .map(|p| format!("({}, {})", p.x, p.y))
                .collect();
            data_writer.write_record(&cells).map_err(csv_error)?;
        }
        data_writer.flush().map_err(|e| GestureError::Configuration(e.to_string()))?;

        let mut names_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(names);
        if !self.templates.is_empty() {
            names_writer
                .write_record(self.templates.iter().map(|t| t.name.as_str()))
                .map_err(csv_error)?;
        }
        names_writer.flush().map_err(|e| GestureError::Configuration(e.to_string()))?;
        Ok(())
    }

    /// Reclassify every stored sample against the library itself.
    ///
    /// An empty result means each template is recognized as its own name.
    pub fn verify(&self, classifier: &GestureClassifier) -> Vec<VerifyMismatch> {
        self.templates
            .iter()
            .enumerate()
            .filter_map(|(index, template)| {
                let got = classifier.classify(&template.descriptor, self);
                if got.as_str() == template.name {
                    None
                } else {
                    Some(VerifyMismatch {
                        index,
                        expected: template.name.clone(),
                        got,
                    })
                }
            })
            .collect()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.templates.get(index).map(|t| t.name.as_str())
    }

    pub fn get(&self, index: usize) -> Option<&GestureTemplate> {
        self.templates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GestureTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn open(path: &Path) -> GestureResult<File> {
    File::open(path).map_err(|e| {
        GestureError::Configuration(format!("cannot open {}: {}", path.display(), e))
    })
}

fn create(path: &Path) -> GestureResult<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GestureError::Configuration(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
    }
    File::create(path).map_err(|e| {
        GestureError::Configuration(format!("cannot create {}: {}", path.display(), e))
    })
}

fn csv_error(e: csv::Error) -> GestureError {
    GestureError::Configuration(format!("template csv: {}", e))
}

fn read_samples<R: Read>(data: R) -> GestureResult<Vec<Landmarks>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let points = record
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                parse_point(cell).ok_or_else(|| {
                    GestureError::Configuration(format!(
                        "row {}, column {}: {:?} is not an (x, y) pair",
                        row, col, cell
                    ))
                })
            })
            .collect::<GestureResult<Vec<Point2>>>()?;
        samples.push(Landmarks::new(points));
    }
    Ok(samples)
}

fn read_names<R: Read>(names: R) -> GestureResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(names);

    match reader.records().next() {
        Some(record) => {
            let record = record.map_err(csv_error)?;
            Ok(record.iter().map(|s| s.trim().to_string()).collect())
        }
        None => Ok(Vec::new()),
    }
}

/// Parse a pair literal such as `(412, 388)`.
fn parse_point(cell: &str) -> Option<Point2> {
    let inner = cell.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = inner.split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Point2::new(x, y))
}
