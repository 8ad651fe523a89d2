use std::collections::BTreeMap;

use crate::pipeline::processing::diagnose::Diagnoser;
use crate::types::{Defect, Record};

/// Defect counts for a batch, without healing or inference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefectHistogram {
    pub total: usize,
    pub counts: BTreeMap<Defect, usize>,
}

impl DefectHistogram {
    pub fn count(&self, defect: Defect) -> usize {
        self.counts.get(&defect).copied().unwrap_or(0)
    }

    /// Share of records with any defect
    pub fn defect_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.count(Defect::None)) as f64 / self.total as f64
    }
}

pub fn diagnose_batch(diagnoser: &Diagnoser, records: &[Record]) -> DefectHistogram {
    let mut histogram = DefectHistogram {
        total: records.len(),
        counts: Defect::ALL.iter().map(|d| (*d, 0)).collect(),
    };
    for record in records {
        *histogram.counts.entry(diagnoser.diagnose(&record.text)).or_default() += 1;
    }
    histogram
}
