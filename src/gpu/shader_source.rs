//=========================================================================
// Shader Source Parser
//=========================================================================
//
// Splits a combined shader text into its vertex and fragment sections.
//
// Format:
// ```text
//   #type vertex
//   ...vertex stage source...
//   #type fragment
//   ...fragment stage source...
// ```
//
// Exactly two markers, order independent. Each section runs from the line
// after its marker to the next marker (or end of text).
//
//=========================================================================

//=== External Dependencies ===============================================

use std::str::FromStr;

//=== Internal Dependencies ===============================================

use crate::error::ShaderSourceError;
use super::device::ShaderStage;

const MARKER: &str = "#type";

//=== ShaderSource ========================================================

/// Vertex and fragment stage text of one shader program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Parses a combined `#type`-sectioned source.
    pub fn parse(source: &str) -> Result<Self, ShaderSourceError> {
        let mut sections: Vec<(ShaderStage, Vec<&str>)> = Vec::with_capacity(2);
        let mut markers = 0usize;

        for line in source.lines() {
            if let Some(rest) = line.trim_start().strip_prefix(MARKER) {
                markers += 1;
                let stage = parse_stage(rest)?;
                if sections.iter().any(|(s, _)| *s == stage) {
                    return Err(ShaderSourceError::DuplicateSection(stage.to_string()));
                }
                sections.push((stage, Vec::new()));
                continue;
            }

            match sections.last_mut() {
                Some((_, lines)) => lines.push(line),
                None if line.trim().is_empty() => {}
                None => return Err(ShaderSourceError::UnmarkedPreamble),
            }
        }

        if markers != 2 {
            return Err(ShaderSourceError::MarkerCount(markers));
        }

        let mut vertex = String::new();
        let mut fragment = String::new();
        for (stage, lines) in sections {
            let text = lines.join("\n");
            match stage {
                ShaderStage::Vertex => vertex = text,
                ShaderStage::Fragment => fragment = text,
            }
        }

        Ok(Self { vertex, fragment })
    }

    /// Source text of one stage.
    pub fn stage(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

impl FromStr for ShaderSource {
    type Err = ShaderSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

//--- Internal Helpers ----------------------------------------------------

/// Reads the kind token following `#type`.
fn parse_stage(rest: &str) -> Result<ShaderStage, ShaderSourceError> {
    // "#typevertex" is not a marker for a known kind
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(ShaderSourceError::UnexpectedToken(format!("{MARKER}{rest}")));
    }

    let mut tokens = rest.split_whitespace();
    let stage = match tokens.next() {
        Some("vertex") => ShaderStage::Vertex,
        Some("fragment") => ShaderStage::Fragment,
        Some(other) => return Err(ShaderSourceError::UnexpectedToken(other.to_owned())),
        None => return Err(ShaderSourceError::UnexpectedToken(String::new())),
    };

    // The kind must be the last token on the marker line
    match tokens.next() {
        Some(extra) => Err(ShaderSourceError::UnexpectedToken(extra.to_owned())),
        None => Ok(stage),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
