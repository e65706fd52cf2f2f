//! Per-stage source generation.
//!
//! Every stage is laid out the same way: header, struct definitions, the
//! stage interface, resource declarations, the remaining user code and a
//! synthesized `main()` that calls the entry method. The
//! [`StageTranspiler`] implementations only differ in their interface and
//! in what `main()` does before the entry call.

use skfx_ir::{EffectDocumentPass, EffectMember, Span, StageKind};
use skfx_parser::{declares_workgroup_size, scan_outputs};

use crate::TranspileError;
use crate::bindings::BindingMap;
use crate::header::write_header;
use crate::resources::write_resources;

/// Prefix of the vertex-to-fragment copies of vertex attributes.
pub const PASSTHROUGH_PREFIX: &str = "v_internal_";

/// Position a vertex entry method starts from before it runs.
pub const DEFAULT_POSITION: &str = "vec4(0.0)";

/// Everything a stage transpiler reads.
#[derive(Clone, Copy, Debug)]
pub struct StageContext<'a> {
    pub pass: &'a EffectDocumentPass,
    pub bindings: &'a BindingMap,
}

impl<'a> StageContext<'a> {
    fn varyings(&self) -> impl Iterator<Item = &'a EffectMember> {
        self.pass.members.iter().filter(|m| m.qualifier == "stage")
    }
}

/// Generates the complete GLSL source of one stage.
pub trait StageTranspiler {
    /// The stage this transpiler generates.
    fn stage(&self) -> StageKind;

    /// Writes the `in`/`out` declarations of the stage.
    fn write_interface(&self, ctx: &StageContext<'_>, out: &mut String);

    /// Statements `main()` runs before calling the entry method.
    fn main_prologue(&self, _ctx: &StageContext<'_>) -> Vec<String> {
        Vec::new()
    }

    /// Generates the stage source.
    fn transpile(&self, ctx: &StageContext<'_>) -> Result<String, TranspileError> {
        let stage = self.stage();
        let entry = ctx
            .pass
            .entry(stage)
            .ok_or_else(|| TranspileError::MissingEntryPoint {
                pass: ctx.pass.name.clone(),
                stage,
            })?;

        let mut out = String::new();
        write_header(&mut out);
        for st in &ctx.pass.structs {
            out.push_str(ctx.pass.text(st.span));
            out.push('\n');
        }
        if !ctx.pass.structs.is_empty() {
            out.push('\n');
        }
        self.write_interface(ctx, &mut out);
        write_resources(ctx.pass, ctx.bindings, &mut out);

        let user_code = user_code(ctx.pass, stage);
        out.push_str(user_code.trim());
        out.push_str("\n\nvoid main() {\n");
        for statement in self.main_prologue(ctx) {
            out.push_str(&format!("    {statement}\n"));
        }
        out.push_str(&format!("    {}();\n}}\n", entry.name));
        Ok(out)
    }
}

/// The pass text with every declaration the generator re-emits, and every
/// entry method of another stage, cut out.
pub fn user_code(pass: &EffectDocumentPass, stage: StageKind) -> String {
    let mut cuts: Vec<Span> = pass
        .attribs
        .iter()
        .map(|a| a.span)
        .chain(pass.members.iter().map(|m| m.span))
        .chain(pass.structs.iter().map(|s| s.span))
        .chain(
            pass.methods
                .iter()
                .filter(|m| m.stage.is_some_and(|s| s != stage))
                .map(|m| m.span),
        )
        .collect();
    cuts.sort_by_key(|span| span.start);

    let source = pass.source.as_str();
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for cut in cuts {
        if cut.start < pos {
            continue;
        }
        out.push_str(&source[pos..cut.start]);
        pos = cut.end();
    }
    out.push_str(&source[pos..]);
    out
}

fn interpolation(ty: &str) -> &'static str {
    if skfx_analysis::is_integer_type(ty) {
        "flat "
    } else {
        ""
    }
}

/// Vertex stage: attribute inputs, their passthrough copies and the
/// `stage` outputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexTranspiler;

impl StageTranspiler for VertexTranspiler {
    fn stage(&self) -> StageKind {
        StageKind::Vertex
    }

    fn write_interface(&self, ctx: &StageContext<'_>, out: &mut String) {
        let attribs = &ctx.pass.attribs;
        for (location, attrib) in attribs.iter().enumerate() {
            let flat = interpolation(&attrib.ty);
            out.push_str(&format!(
                "layout(location={location}) in {} {};\n",
                attrib.ty, attrib.name
            ));
            out.push_str(&format!(
                "layout(location={location}) {flat}out {} {PASSTHROUGH_PREFIX}{};\n",
                attrib.ty, attrib.name
            ));
        }
        for (i, varying) in ctx.varyings().enumerate() {
            out.push_str(&format!(
                "layout(location={}) {}out {} {};\n",
                attribs.len() + i,
                interpolation(&varying.ty),
                varying.ty,
                varying.identifier()
            ));
        }
        out.push('\n');
    }

    fn main_prologue(&self, ctx: &StageContext<'_>) -> Vec<String> {
        // The position output must be written on every path.
        let mut statements = vec![format!("gl_Position = {DEFAULT_POSITION};")];
        statements.extend(
            ctx.pass
                .attribs
                .iter()
                .map(|a| format!("{PASSTHROUGH_PREFIX}{0} = {0};", a.name)),
        );
        statements
    }
}

/// Fragment stage: passthrough and `stage` inputs plus one colour output
/// per `SK_COLORn` index up to the highest one the entry method writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FragmentTranspiler;

impl FragmentTranspiler {
    /// Number of colour outputs the entry method needs.
    pub fn output_count(pass: &EffectDocumentPass) -> usize {
        let Some(entry) = pass.entry(StageKind::Fragment) else {
            return 0;
        };
        scan_outputs(pass.text(entry.body), entry.body.start)
            .iter()
            .map(|output| usize::from(output.index) + 1)
            .max()
            .unwrap_or(0)
    }
}

impl StageTranspiler for FragmentTranspiler {
    fn stage(&self) -> StageKind {
        StageKind::Fragment
    }

    fn write_interface(&self, ctx: &StageContext<'_>, out: &mut String) {
        let attribs = &ctx.pass.attribs;
        for (location, attrib) in attribs.iter().enumerate() {
            out.push_str(&format!(
                "layout(location={location}) {}in {} {PASSTHROUGH_PREFIX}{};\n",
                interpolation(&attrib.ty),
                attrib.ty,
                attrib.name
            ));
            out.push_str(&format!(
                "#define {0} {PASSTHROUGH_PREFIX}{0}\n",
                attrib.name
            ));
        }
        for (i, varying) in ctx.varyings().enumerate() {
            out.push_str(&format!(
                "layout(location={}) {}in {} {};\n",
                attribs.len() + i,
                interpolation(&varying.ty),
                varying.ty,
                varying.identifier()
            ));
        }
        for index in 0..Self::output_count(ctx.pass) {
            out.push_str(&format!(
                "layout(location={index}) out vec4 SK_COLOR{index};\n"
            ));
        }
        out.push('\n');
    }
}

/// Compute stage: no interface besides the workgroup size, which defaults
/// to one invocation when the source does not declare it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComputeTranspiler;

impl StageTranspiler for ComputeTranspiler {
    fn stage(&self) -> StageKind {
        StageKind::Compute
    }

    fn write_interface(&self, ctx: &StageContext<'_>, out: &mut String) {
        if !declares_workgroup_size(&ctx.pass.source) {
            out.push_str("layout(local_size_x = 1) in;\n\n");
        }
    }
}

/// The transpiler for `stage`.
pub fn transpiler_for(stage: StageKind) -> &'static dyn StageTranspiler {
    match stage {
        StageKind::Vertex => &VertexTranspiler,
        StageKind::Fragment => &FragmentTranspiler,
        StageKind::Compute => &ComputeTranspiler,
    }
}
