use crate::error::{Result, TransitionError};
use serde::{Deserialize, Serialize};

/// Integer class code as stored in the raster band.
pub type ClassCode = i32;

/// Reserved background code, never counted.
pub const BACKGROUND: ClassCode = 0;

/// One named class of the enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub code: ClassCode,
    pub label: String,
    pub color: String,
}

/// The closed class domain 1..K plus the codes excluded from percentage views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScheme {
    pub classes: Vec<ClassEntry>,
    #[serde(default)]
    pub excluded: Vec<ClassCode>,
}

const LCZ_CLASSES: [(&str, &str); 17] = [
    ("1. Compact high-rise", "#8C0000"),
    ("2. Compact mid-rise", "#D10000"),
    ("3. Compact low-rise", "#FF0000"),
    ("4. Open high-rise", "#BF4D00"),
    ("5. Open mid-rise", "#FF6600"),
    ("6. Open low-rise", "#FF9955"),
    ("7. Lightweight low-rise", "#FAEE05"),
    ("8. Large low-rise", "#BCBCBC"),
    ("9. Sparsely built", "#FFCCAA"),
    ("10. Heavy industry", "#555555"),
    ("A. Dense trees", "#006A00"),
    ("B. Scattered trees", "#00AA00"),
    ("C. Bush, scrub", "#648525"),
    ("D. Low plants", "#B9DB79"),
    ("E. Bare rock or paved", "#000000"),
    ("F. Bare soil or sand", "#FBF7AE"),
    ("G. Water", "#6A6ACD"),
];

impl Default for ClassScheme {
    fn default() -> Self {
        Self::lcz()
    }
}

impl ClassScheme {
    /// The 17 Local Climate Zone classes with the WUDAPT palette.
    pub fn lcz() -> Self {
        let classes = LCZ_CLASSES
            .iter()
            .enumerate()
            .map(|(i, (label, color))| ClassEntry {
                code: i as ClassCode + 1,
                label: label.to_string(),
                color: color.to_string(),
            })
            .collect();
        Self {
            classes,
            excluded: Vec::new(),
        }
    }

    /// Unlabelled scheme with codes 1..=k, mostly for tests and ad-hoc rasters.
    pub fn numbered(k: usize) -> Self {
        let classes = (1..=k as ClassCode)
            .map(|code| ClassEntry {
                code,
                label: format!("Class {}", code),
                color: "#808080".to_string(),
            })
            .collect();
        Self {
            classes,
            excluded: Vec::new(),
        }
    }

    /// Codes must be exactly 1..=K in order so they can index a K×K matrix.
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(TransitionError::Config("class scheme is empty".to_string()));
        }
        for (i, entry) in self.classes.iter().enumerate() {
            let expected = i as ClassCode + 1;
            if entry.code != expected {
                return Err(TransitionError::Config(format!(
                    "class codes must run 1..={} in order, found {} at position {}",
                    self.classes.len(),
                    entry.code,
                    i + 1
                )));
            }
        }
        for &code in &self.excluded {
            if !self.contains(code) {
                return Err(TransitionError::Config(format!(
                    "excluded class {} is not part of the scheme",
                    code
                )));
            }
        }
        Ok(())
    }

    /// K, the number of named classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = ClassCode> + '_ {
        self.classes.iter().map(|c| c.code)
    }

    pub fn contains(&self, code: ClassCode) -> bool {
        code >= 1 && code as usize <= self.classes.len()
    }

    pub fn is_excluded(&self, code: ClassCode) -> bool {
        self.excluded.contains(&code)
    }

    /// Codes of the scheme minus the exclusion list, in enumeration order.
    pub fn retained_codes(&self) -> Vec<ClassCode> {
        self.codes().filter(|&c| !self.is_excluded(c)).collect()
    }

    pub fn entry(&self, code: ClassCode) -> Option<&ClassEntry> {
        self.classes.iter().find(|c| c.code == code)
    }

    pub fn label(&self, code: ClassCode) -> Option<&str> {
        self.entry(code).map(|c| c.label.as_str())
    }

    pub fn color(&self, code: ClassCode) -> Option<&str> {
        self.entry(code).map(|c| c.color.as_str())
    }

    pub fn with_excluded(mut self, excluded: Vec<ClassCode>) -> Self {
        self.excluded = excluded;
        self
    }
}
