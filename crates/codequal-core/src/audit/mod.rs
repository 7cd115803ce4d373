use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub mod file_scanner;
pub mod pipeline;

/// Structured assessment of a single source file, as returned by the model.
///
/// Small models routinely omit fields or emit partial objects, so every field
/// defaults to a neutral value (0 for counts, empty for collections) instead
/// of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Overall quality rating on a 0–10 scale.
    #[serde(default)]
    pub code_quality_rating: u8,
    /// Free-text justification for the rating.
    #[serde(default)]
    pub rating_reason: String,
    /// Frameworks and libraries the model recognised in the file.
    #[serde(default)]
    pub tech_stack: Vec<TechEntry>,
    #[serde(default)]
    pub total_functions: u32,
    #[serde(default)]
    pub function_names: Vec<String>,
    /// Combined count of loops and recursive calls.
    #[serde(default)]
    pub total_loops: u32,
    #[serde(default)]
    pub total_classes: u32,
    #[serde(default)]
    pub class_names: Vec<String>,
}

/// One technology/library entry in a file's tech stack.
///
/// Models answer either with a bare name (`"flask"`) or with an object
/// carrying a short description; both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TechEntry {
    Described {
        name: String,
        #[serde(default)]
        description: String,
    },
    Bare(String),
}

impl TechEntry {
    pub fn name(&self) -> &str {
        match self {
            TechEntry::Described { name, .. } => name,
            TechEntry::Bare(name) => name,
        }
    }
}

/// Why a file ended up without an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Read,
    Gateway,
    Extraction,
}

/// Record of a file that could not be analysed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub detail: String,
}

/// Accumulated project-level report.
///
/// Aggregation keeps one entry per attempted file in every list (per-file
/// attribution rather than running totals), so index `i` of any list refers
/// to `files[i]`. Files that failed contribute the neutral defaults, which
/// keeps `quality_ratings.len()` equal to the number of files attempted.
/// Summed totals are derived on demand and never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectReport {
    pub files: Vec<PathBuf>,
    pub quality_ratings: Vec<u8>,
    pub tech_stack: Vec<Vec<TechEntry>>,
    pub total_functions: Vec<u32>,
    pub function_names: Vec<Vec<String>>,
    pub total_loops: Vec<u32>,
    pub total_classes: Vec<u32>,
    pub class_names: Vec<Vec<String>>,
    pub failures: Vec<FileFailure>,
}

impl ProjectReport {
    /// Fold one successful analysis into the report.
    pub fn record(&mut self, path: &Path, analysis: AnalysisResult) {
        self.files.push(path.to_path_buf());
        self.quality_ratings.push(analysis.code_quality_rating);
        self.tech_stack.push(analysis.tech_stack);
        self.total_functions.push(analysis.total_functions);
        self.function_names.push(analysis.function_names);
        self.total_loops.push(analysis.total_loops);
        self.total_classes.push(analysis.total_classes);
        self.class_names.push(analysis.class_names);
    }

    /// Record a file whose analysis failed. The file still occupies one slot
    /// in every per-file list, filled with the neutral defaults.
    pub fn record_failure(&mut self, path: &Path, kind: FailureKind, detail: impl Into<String>) {
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            kind,
            detail: detail.into(),
        });
        self.record(path, AnalysisResult::default());
    }

    /// Number of files handed to the pipeline, successful or not.
    pub fn files_attempted(&self) -> usize {
        self.files.len()
    }

    /// Mean quality rating across all attempted files, `None` when empty.
    pub fn mean_rating(&self) -> Option<f32> {
        if self.quality_ratings.is_empty() {
            return None;
        }
        let sum: u32 = self.quality_ratings.iter().map(|&r| u32::from(r)).sum();
        Some(sum as f32 / self.quality_ratings.len() as f32)
    }

    pub fn summed_functions(&self) -> u64 {
        self.total_functions.iter().map(|&n| u64::from(n)).sum()
    }

    pub fn summed_loops(&self) -> u64 {
        self.total_loops.iter().map(|&n| u64::from(n)).sum()
    }

    pub fn summed_classes(&self) -> u64 {
        self.total_classes.iter().map(|&n| u64::from(n)).sum()
    }

    /// Distinct technology names across all files, in first-seen order.
    pub fn tech_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for entries in &self.tech_stack {
            for entry in entries {
                if seen.insert(entry.name()) {
                    names.push(entry.name());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_result_defaults_missing_fields() {
        let parsed: AnalysisResult =
            serde_json::from_str(r#"{"code_quality_rating": 7}"#).unwrap();
        assert_eq!(parsed.code_quality_rating, 7);
        assert_eq!(parsed.total_functions, 0);
        assert!(parsed.function_names.is_empty());
        assert!(parsed.tech_stack.is_empty());
        assert!(parsed.rating_reason.is_empty());
    }

    #[test]
    fn tech_entry_accepts_both_shapes() {
        let entries: Vec<TechEntry> = serde_json::from_str(
            r#"["flask", {"name": "requests", "description": "HTTP client"}, {"name": "pytest"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name(), "flask");
        assert_eq!(entries[1].name(), "requests");
        assert_eq!(entries[2].name(), "pytest");
        assert!(matches!(&entries[2], TechEntry::Described { description, .. } if description.is_empty()));
    }

    #[test]
    fn record_failure_keeps_lists_aligned() {
        let mut report = ProjectReport::default();
        report.record(
            Path::new("a.py"),
            AnalysisResult {
                code_quality_rating: 8,
                total_functions: 3,
                ..AnalysisResult::default()
            },
        );
        report.record_failure(Path::new("b.py"), FailureKind::Gateway, "connection refused");
        report.record(
            Path::new("c.js"),
            AnalysisResult {
                code_quality_rating: 6,
                ..AnalysisResult::default()
            },
        );

        assert_eq!(report.files_attempted(), 3);
        assert_eq!(report.quality_ratings, vec![8, 0, 6]);
        assert_eq!(report.total_functions, vec![3, 0, 0]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Gateway);
        for list_len in [
            report.tech_stack.len(),
            report.function_names.len(),
            report.total_loops.len(),
            report.class_names.len(),
        ] {
            assert_eq!(list_len, report.files_attempted());
        }
    }

    #[test]
    fn tech_names_deduplicate_across_files() {
        let mut report = ProjectReport::default();
        report.record(
            Path::new("a.py"),
            AnalysisResult {
                tech_stack: vec![TechEntry::Bare("flask".into()), TechEntry::Bare("redis".into())],
                ..AnalysisResult::default()
            },
        );
        report.record(
            Path::new("b.py"),
            AnalysisResult {
                tech_stack: vec![TechEntry::Described {
                    name: "flask".into(),
                    description: "web framework".into(),
                }],
                ..AnalysisResult::default()
            },
        );
        assert_eq!(report.tech_names(), vec!["flask", "redis"]);
    }

    #[test]
    fn mean_rating_empty_and_filled() {
        let mut report = ProjectReport::default();
        assert!(report.mean_rating().is_none());
        report.record(
            Path::new("a.py"),
            AnalysisResult {
                code_quality_rating: 4,
                ..AnalysisResult::default()
            },
        );
        report.record_failure(Path::new("b.py"), FailureKind::Read, "denied");
        assert!((report.mean_rating().unwrap() - 2.0).abs() < f32::EPSILON);
    }
}
