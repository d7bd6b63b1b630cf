use std::fmt;

/// Dataset split a record is exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
}

impl Split {
    /// Name of the image directory of this split
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "valid",
        }
    }

    /// File name of the COCO document of this split
    pub fn annotation_file_name(self) -> &'static str {
        match self {
            Split::Train => "instances_train.json",
            Split::Validation => "instances_val.json",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => f.write_str("train"),
            Split::Validation => f.write_str("val"),
        }
    }
}

/// Pick the split of the next record.
///
/// `ingested` counts records already exported to either split; the first
/// `val_count` of them go to validation, every later one to training.
pub fn route(ingested: usize, val_count: usize) -> Split {
    if ingested < val_count {
        Split::Validation
    } else {
        Split::Train
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_threshold() {
        let splits: Vec<Split> = (0..5).map(|n| route(n, 2)).collect();
        assert_eq!(
            splits,
            vec![
                Split::Validation,
                Split::Validation,
                Split::Train,
                Split::Train,
                Split::Train
            ]
        );
    }

    #[test]
    fn test_route_zero_threshold_is_all_train() {
        assert_eq!(route(0, 0), Split::Train);
        assert_eq!(route(100, 0), Split::Train);
    }

    #[test]
    fn test_split_names() {
        assert_eq!(Split::Validation.dir_name(), "valid");
        assert_eq!(Split::Validation.annotation_file_name(), "instances_val.json");
        assert_eq!(Split::Train.dir_name(), "train");
        assert_eq!(Split::Train.to_string(), "train");
    }
}
