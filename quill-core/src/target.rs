//! Placement targets

use crate::error::AnnotationError;
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Program elements an annotation type may be placed on.
    ///
    /// A schema may allow several targets; a placement context is a single
    /// bit. Containment is tested with [`Target::allows`], never equality.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Target: u8 {
        const CLASS = 0b0000_0001;
        const METHOD = 0b0000_0010;
        const PROPERTY = 0b0000_0100;
        const FUNCTION = 0b0000_1000;
        /// Nested inside another annotation's arguments
        const ANNOTATION = 0b0001_0000;
        const ALL = Self::CLASS.bits()
            | Self::METHOD.bits()
            | Self::PROPERTY.bits()
            | Self::FUNCTION.bits()
            | Self::ANNOTATION.bits();
    }
}

const NAMES: [(Target, &str); 5] = [
    (Target::CLASS, "class"),
    (Target::METHOD, "method"),
    (Target::PROPERTY, "property"),
    (Target::FUNCTION, "function"),
    (Target::ANNOTATION, "annotation"),
];

impl Target {
    /// Look up a target by its lowercase name (`"all"` included).
    pub fn from_target_name(name: &str) -> Option<Target> {
        if name == "all" {
            return Some(Target::ALL);
        }
        NAMES.iter().find(|(_, n)| *n == name).map(|(t, _)| *t)
    }

    /// Whether an annotation declaring `self` may be placed in `context`.
    pub fn allows(self, context: Target) -> bool {
        self.intersects(context)
    }
}

impl FromStr for Target {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::from_target_name(s).ok_or_else(|| AnnotationError::UnknownTargetName {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Target::ALL {
            return write!(f, "all");
        }
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(t, _)| self.contains(*t))
            .map(|(_, n)| *n)
            .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
