//! Read-only ECET reference datasets.

use serde::{Deserialize, Serialize};

/// One of the published ECET datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcetDataset {
    Syllabus,
    Tests,
    Papers,
}

impl EcetDataset {
    pub const ALL: [EcetDataset; 3] = [Self::Syllabus, Self::Tests, Self::Papers];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "syllabus" => Some(Self::Syllabus),
            "tests" => Some(Self::Tests),
            "papers" => Some(Self::Papers),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syllabus => "syllabus",
            Self::Tests => "tests",
            Self::Papers => "papers",
        }
    }

    /// File name inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Syllabus => "ecet-syllabus.json",
            Self::Tests => "ecet-tests.json",
            Self::Papers => "ecet-papers.json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dataset_parses_from_its_name() {
        for dataset in EcetDataset::ALL {
            assert_eq!(EcetDataset::parse(dataset.as_str()), Some(dataset));
            assert!(dataset.file_name().starts_with("ecet-"));
        }
        assert_eq!(EcetDataset::parse("results"), None);
    }
}
