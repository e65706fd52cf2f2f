//! Display implementations and text dumps for debugging.

use std::fmt;

use crate::document::{EffectDocument, EffectDocumentPass, StructMember};
use crate::param::{EffectAnalysisResult, EffectParameterFlags, EffectParameterInfo};
use crate::types::ArraySize;

impl fmt::Display for EffectParameterFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl fmt::Display for ArraySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(n) => write!(f, "[{n}]"),
            Self::Runtime => f.write_str("[]"),
        }
    }
}

impl fmt::Display for EffectParameterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (size {}, {})",
            self.name, self.ty, self.size, self.flags
        )
    }
}

impl fmt::Display for StructMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)?;
        if let Some(array) = self.array {
            write!(f, "{array}")?;
        }
        Ok(())
    }
}

/// Dump an analysis result as human-readable text.
pub fn dump_analysis(result: &EffectAnalysisResult) -> String {
    let mut out = String::new();

    out.push_str("Parameters:\n");
    for (index, param) in result.parameters.iter().enumerate() {
        out.push_str(&format!("  [{index}] {param}\n"));
    }

    if !result.stages.is_empty() {
        out.push_str("\nStage Varyings:\n");
        for stage in &result.stages {
            out.push_str(&format!("  {}: {}\n", stage.name, stage.ty));
        }
    }

    out
}

/// Dump the declarations of every pass in a document.
pub fn dump_document(document: &EffectDocument) -> String {
    let mut out = format!("Effect {}\n", document.name);
    for pass in &document.passes {
        dump_pass(&mut out, pass);
    }
    out
}

fn dump_pass(out: &mut String, pass: &EffectDocumentPass) {
    out.push_str(&format!("\nPass {}:\n", pass.name));

    for st in &pass.structs {
        let members: Vec<String> = st.members.iter().map(|m| m.to_string()).collect();
        out.push_str(&format!("  struct {} {{ {} }}\n", st.name, members.join("; ")));
    }
    for attrib in &pass.attribs {
        out.push_str(&format!("  attrib {} {}\n", attrib.ty, attrib.name));
    }
    for member in &pass.members {
        let readonly = if member.read_only { "readonly " } else { "" };
        out.push_str(&format!(
            "  {readonly}{} {} {}\n",
            member.qualifier,
            member.ty,
            member.identifier()
        ));
    }
    for method in &pass.methods {
        let params: Vec<String> = method
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect();
        let stage = match method.stage {
            Some(stage) => format!(" [{stage}]"),
            None => String::new(),
        };
        out.push_str(&format!(
            "  {} {}({}){stage}\n",
            method.return_type,
            method.name,
            params.join(", ")
        ));
    }
}
