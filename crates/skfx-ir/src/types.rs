//! Core value types shared by every pipeline stage.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::IrError;

/// A byte range into a pass source text.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
}

impl Span {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Builds a span covering `start..end`.
    pub const fn from_range(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end - start,
        }
    }

    /// One past the last byte.
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns the text this span covers.
    ///
    /// Panics if the span lies outside `text`; spans are only ever applied
    /// to the text they were scanned from.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end()]
    }

    /// Returns `true` if `other` lies completely inside `self`.
    pub const fn contains(&self, other: Span) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }
}

/// A programmable pipeline stage.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub enum StageKind {
    Vertex,
    Fragment,
    Compute,
}

impl StageKind {
    /// All stages, in pipeline order.
    pub const ALL: [StageKind; 3] = [StageKind::Vertex, StageKind::Fragment, StageKind::Compute];

    /// Name of the user entry method for this stage (`vert`, `frag`, `comp`).
    pub const fn entry_name(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::Fragment => "frag",
            Self::Compute => "comp",
        }
    }

    /// Maps an entry method name back to its stage.
    pub fn from_entry_name(name: &str) -> Option<Self> {
        match name {
            "vert" => Some(Self::Vertex),
            "frag" => Some(Self::Fragment),
            "comp" => Some(Self::Compute),
            _ => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        })
    }
}

impl FromStr for StageKind {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vert" | "vertex" => Ok(Self::Vertex),
            "frag" | "fragment" => Ok(Self::Fragment),
            "comp" | "compute" => Ok(Self::Compute),
            _ => Err(IrError::UnknownStage(s.to_string())),
        }
    }
}

/// Whether an effect renders geometry or dispatches compute work.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize)]
pub enum EffectKind {
    #[default]
    Graphics,
    Compute,
}

impl EffectKind {
    /// Stages a pass of this kind must provide an entry method for.
    pub const fn required_stages(self) -> &'static [StageKind] {
        match self {
            Self::Graphics => &[StageKind::Vertex, StageKind::Fragment],
            Self::Compute => &[StageKind::Compute],
        }
    }

    /// Returns `true` if `stage` belongs to this kind of pass.
    pub fn accepts(self, stage: StageKind) -> bool {
        self.required_stages().contains(&stage)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Graphics => "graphics",
            Self::Compute => "compute",
        })
    }
}

impl FromStr for EffectKind {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "graphics" => Ok(Self::Graphics),
            "compute" => Ok(Self::Compute),
            _ => Err(IrError::UnknownEffectKind(s.to_string())),
        }
    }
}

/// Array suffix of a declaration.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize)]
pub enum ArraySize {
    /// `name[N]`.
    Constant(u32),
    /// `name[]`, only meaningful for storage buffers.
    Runtime,
}

impl ArraySize {
    /// Number of elements the layout rules should account for.
    pub const fn element_count(self) -> u32 {
        match self {
            Self::Constant(n) => n,
            Self::Runtime => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_slice_and_bounds() {
        let text = "uniform float x;";
        let span = Span::from_range(8, 13);
        assert_eq!(span.slice(text), "float");
        assert_eq!(span.end(), 13);
        assert!(Span::new(0, 16).contains(span));
        assert!(!span.contains(Span::new(0, 16)));
    }

    #[test]
    fn stage_entry_names_round_trip() {
        for stage in StageKind::ALL {
            assert_eq!(StageKind::from_entry_name(stage.entry_name()), Some(stage));
        }
        assert_eq!(StageKind::from_entry_name("main"), None);
    }

    #[test]
    fn parse_stage_and_kind() {
        assert_eq!("fragment".parse::<StageKind>(), Ok(StageKind::Fragment));
        assert_eq!("comp".parse::<StageKind>(), Ok(StageKind::Compute));
        assert_eq!(
            "geom".parse::<StageKind>(),
            Err(IrError::UnknownStage("geom".into()))
        );
        assert_eq!("compute".parse::<EffectKind>(), Ok(EffectKind::Compute));
        assert!("mesh".parse::<EffectKind>().is_err());
    }

    #[test]
    fn kind_required_stages() {
        assert!(EffectKind::Graphics.accepts(StageKind::Vertex));
        assert!(EffectKind::Graphics.accepts(StageKind::Fragment));
        assert!(!EffectKind::Graphics.accepts(StageKind::Compute));
        assert_eq!(EffectKind::Compute.required_stages(), &[StageKind::Compute]);
    }

    #[test]
    fn runtime_array_counts_one_element() {
        assert_eq!(ArraySize::Runtime.element_count(), 1);
        assert_eq!(ArraySize::Constant(8).element_count(), 8);
    }
}
