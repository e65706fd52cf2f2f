//! Declarations scanned out of an effect document.

use serde::Serialize;

use crate::types::{ArraySize, Span, StageKind};

/// A parsed effect document: a name and one or more passes.
#[derive(Clone, Debug, Default)]
pub struct EffectDocument {
    pub name: String,
    pub passes: Vec<EffectDocumentPass>,
}

impl EffectDocument {
    /// Looks a pass up by name.
    pub fn pass(&self, name: &str) -> Option<&EffectDocumentPass> {
        self.passes.iter().find(|p| p.name == name)
    }
}

/// One pass of an effect document.
///
/// All spans index into [`EffectDocumentPass::source`], which holds the pass
/// body only (the text between the braces of `pass Name { ... }`, or the
/// whole document for an implicit pass).
#[derive(Clone, Debug, Default)]
pub struct EffectDocumentPass {
    pub name: String,
    pub source: String,
    pub structs: Vec<EffectStructInfo>,
    pub attribs: Vec<EffectAttrib>,
    pub members: Vec<EffectMember>,
    pub methods: Vec<EffectMethod>,
}

impl EffectDocumentPass {
    /// Returns the entry method for `stage`, if the pass declares one.
    pub fn entry(&self, stage: StageKind) -> Option<&EffectMethod> {
        self.methods.iter().find(|m| m.stage == Some(stage))
    }

    /// Stages with an entry method, in pipeline order.
    pub fn stages(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|&s| self.entry(s).is_some())
            .collect()
    }

    /// Looks up a struct declared in this pass.
    pub fn find_struct(&self, name: &str) -> Option<&EffectStructInfo> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Returns the text covered by `span`.
    pub fn text(&self, span: Span) -> &str {
        span.slice(&self.source)
    }
}

/// `struct Name { ... };`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectStructInfo {
    pub name: String,
    pub members: Vec<StructMember>,
    pub span: Span,
}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StructMember {
    pub ty: String,
    pub name: String,
    pub array: Option<ArraySize>,
}

/// `attrib Type Name;` -- a per-vertex input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectAttrib {
    pub ty: String,
    pub name: String,
    pub span: Span,
}

/// A qualified top-level declaration: `Qualifier Type Name[N];`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectMember {
    /// Qualifier as written, with `extern` already folded into `uniform`.
    pub qualifier: String,
    /// `readonly buffer ...`.
    pub read_only: bool,
    pub ty: String,
    pub name: String,
    pub array: Option<ArraySize>,
    pub span: Span,
}

impl EffectMember {
    /// The declared identifier including its array suffix (`lights[4]`).
    pub fn identifier(&self) -> String {
        match self.array {
            Some(ArraySize::Constant(n)) => format!("{}[{n}]", self.name),
            Some(ArraySize::Runtime) => format!("{}[]", self.name),
            None => self.name.clone(),
        }
    }
}

/// A function declaration. Entry methods carry the stage they implement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectMethod {
    pub name: String,
    pub return_type: String,
    pub params: Vec<MethodParam>,
    /// Stage this method is the entry point of, if any.
    pub stage: Option<StageKind>,
    /// Everything from the return type through the closing brace.
    pub span: Span,
    /// The braces and everything between them.
    pub body: Span,
}

/// A function parameter; storage qualifiers such as `inout` are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodParam {
    pub ty: String,
    pub name: String,
}
