use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;

use crate::error::{Error, Result};

const UNKNOWN: &str = "?";

/// DeepLabV3 (PASCAL VOC) class names, used when no segmentation label file is given.
const PASCAL_VOC: [&str; 21] = [
    "background", "aeroplane", "bicycle", "bird", "boat", "bottle", "bus", "car", "cat",
    "chair", "cow", "diningtable", "dog", "horse", "motorbike", "person", "pottedplant",
    "sheep", "sofa", "train", "tv",
];

type LabelMap = HashMap<i32, String>;

/// Class names keyed by class id.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    labels: LabelMap,
}

impl Labels {
    /// Reads `"<id> <name>"` lines; blank lines are skipped.
    pub fn from_file(filename: &Path) -> Result<Self> {
        let text = read_to_string(filename)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut labels = LabelMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let lineno = lineno + 1;
            let (num, class) = line.split_once(char::is_whitespace).ok_or_else(|| {
                Error::Label(format!("line {lineno}: expected \"<id> <name>\""))
            })?;
            let class_num = num.parse::<i32>().map_err(|err| {
                Error::Label(format!("line {lineno}: bad class id {num:?}: {err}"))
            })?;
            labels.insert(class_num, class.trim().to_string());
        }
        Ok(Self { labels })
    }

    pub fn pascal_voc() -> Self {
        let labels = PASCAL_VOC
            .iter()
            .enumerate()
            .map(|(i, name)| (i as i32, name.to_string()))
            .collect();
        Self { labels }
    }

    pub fn lookup(&self, class_num: i32) -> Option<&str> {
        self.labels.get(&class_num).map(String::as_str)
    }

    /// Class name, or `"?"` for ids missing from the file.
    pub fn name(&self, class_num: i32) -> String {
        self.lookup(class_num).unwrap_or(UNKNOWN).to_string()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_coco_style() {
        let labels = Labels::parse("0 person\n1 bicycle\n\n2 car\n12 stop sign\n").unwrap();
        assert_eq!(labels.len(), 4);
        assert_eq!(labels.lookup(0), Some("person"));
        assert_eq!(labels.lookup(12), Some("stop sign"));
        assert_eq!(labels.name(99), "?");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Labels::parse("person\n").is_err());
        assert!(Labels::parse("x person\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 person").unwrap();
        writeln!(file, "17 dog").unwrap();
        let labels = Labels::from_file(file.path()).unwrap();
        assert_eq!(labels.name(17), "dog");
        assert!(Labels::from_file(Path::new("/nonexistent/labels.txt")).is_err());
    }

    #[test]
    fn test_pascal_voc_defaults() {
        let labels = Labels::pascal_voc();
        assert_eq!(labels.len(), 21);
        assert_eq!(labels.name(15), "person");
    }
}
