//! Alignment and size computation.
//!
//! Alignment follows a std140-like model: scalars are 4 bytes, vectors and
//! matrices use their table entry, and a struct is the sum of its members
//! rounded up to a multiple of 16. Array members contribute `n * 16` when
//! the element is a scalar and `n * alignment(element)` otherwise.

use std::collections::HashMap;

use skfx_ir::{ArraySize, EffectDocumentPass};

use crate::AnalysisError;
use crate::tables::{builtin_alignment, is_scalar, opaque_kind};

/// Per-element stride of a scalar array.
const SCALAR_ARRAY_STRIDE: u32 = 16;

const STRUCT_ROUNDING: u32 = 16;

/// Rounds a struct's summed member alignment up to the next multiple of
/// 16. A sum that is already a multiple of 16 is kept as is.
pub fn round_struct_alignment(sum: u32) -> u32 {
    match sum % STRUCT_ROUNDING {
        0 => sum,
        rem => sum.saturating_add(STRUCT_ROUNDING - rem),
    }
}

/// Resolves type alignments for one pass, memoizing struct results by name.
pub struct LayoutCalculator<'p> {
    pass: &'p EffectDocumentPass,
    cache: HashMap<&'p str, u32>,
    /// Structs currently being resolved, outermost first.
    in_progress: Vec<&'p str>,
}

impl<'p> LayoutCalculator<'p> {
    pub fn new(pass: &'p EffectDocumentPass) -> Self {
        Self {
            pass,
            cache: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Alignment of a single value of type `ty`. Opaque types are 0.
    pub fn alignment(&mut self, ty: &str) -> Result<u32, AnalysisError> {
        if let Some(alignment) = builtin_alignment(ty) {
            return Ok(alignment);
        }
        if opaque_kind(ty).is_some() {
            return Ok(0);
        }
        let pass = self.pass;
        let Some(st) = pass.find_struct(ty) else {
            return Err(AnalysisError::UnknownType {
                ty: ty.to_string(),
                context: "layout".into(),
            });
        };
        let name = st.name.as_str();
        if let Some(&cached) = self.cache.get(name) {
            return Ok(cached);
        }
        if self.in_progress.contains(&name) {
            return Err(AnalysisError::RecursiveStruct(name.to_string()));
        }

        self.in_progress.push(name);
        let mut sum = 0u32;
        for member in &st.members {
            let contribution = self.array_size(&member.ty, member.array);
            match contribution {
                Ok(bytes) => sum = sum.saturating_add(bytes),
                Err(err) => {
                    self.in_progress.pop();
                    return Err(err);
                }
            }
        }
        self.in_progress.pop();

        let alignment = round_struct_alignment(sum);
        log::trace!("struct {name}: members sum to {sum}, aligned to {alignment}");
        self.cache.insert(name, alignment);
        Ok(alignment)
    }

    /// Byte size of a (possibly array) value of type `ty`. Runtime-sized
    /// arrays count as a single element.
    pub fn array_size(&mut self, ty: &str, array: Option<ArraySize>) -> Result<u32, AnalysisError> {
        match array {
            None => self.alignment(ty),
            Some(size) => {
                let count = size.element_count();
                let stride = if is_scalar(ty) {
                    SCALAR_ARRAY_STRIDE
                } else {
                    self.alignment(ty)?
                };
                Ok(count.saturating_mul(stride))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(source: &str) -> EffectDocumentPass {
        skfx_parser::parse("test", source).unwrap().passes.remove(0)
    }

    fn struct_alignment(source: &str, name: &str) -> Result<u32, AnalysisError> {
        let pass = pass(source);
        LayoutCalculator::new(&pass).alignment(name)
    }

    #[test]
    fn rounding_rule() {
        assert_eq!(round_struct_alignment(0), 0);
        assert_eq!(round_struct_alignment(4), 16);
        assert_eq!(round_struct_alignment(20), 32);
        assert_eq!(round_struct_alignment(32), 32);
        assert_eq!(round_struct_alignment(52), 64);
    }

    #[test]
    fn fixed_struct_shapes() {
        let shapes = [
            ("struct S { float a; };", 16),
            ("struct S { vec2 a; vec2 b; };", 16),
            ("struct S { vec3 x; float y; };", 32),
            ("struct S { vec4 a; vec4 b; };", 32),
            ("struct S { mat3x2 m; float f; };", 64),
            ("struct S { mat4 m; };", 64),
            ("struct S { float w[3]; vec2 uv; };", 64),
        ];
        for (source, expected) in shapes {
            assert_eq!(struct_alignment(source, "S").unwrap(), expected, "{source}");
        }
    }

    #[test]
    fn nested_structs_are_memoized() {
        let source = "struct A { vec3 x; float y; };\nstruct B { A a; float z; A more[2]; };";
        let pass = pass(source);
        let mut calc = LayoutCalculator::new(&pass);
        // B = 32 + 4 + 2 * 32 = 100 -> 112
        assert_eq!(calc.alignment("B").unwrap(), 112);
        assert_eq!(calc.cache.get("A"), Some(&32));
    }

    #[test]
    fn direct_recursion_is_reported() {
        let err = struct_alignment("struct Node { float v; Node next; };", "Node").unwrap_err();
        assert_eq!(err, AnalysisError::RecursiveStruct("Node".into()));
    }

    #[test]
    fn transitive_recursion_is_reported() {
        let source = "struct A { B b; };\nstruct B { C c; };\nstruct C { A a; };";
        let err = struct_alignment(source, "A").unwrap_err();
        assert!(matches!(err, AnalysisError::RecursiveStruct(_)));
    }

    #[test]
    fn runtime_array_counts_one_element() {
        let pass = pass("struct P { vec4 pos; };");
        let mut calc = LayoutCalculator::new(&pass);
        assert_eq!(calc.array_size("P", Some(ArraySize::Runtime)).unwrap(), 16);
        assert_eq!(calc.array_size("float", Some(ArraySize::Runtime)).unwrap(), 16);
        assert_eq!(calc.array_size("vec2", Some(ArraySize::Constant(3))).unwrap(), 24);
    }

    #[test]
    fn huge_arrays_saturate() {
        let pass = pass("");
        let mut calc = LayoutCalculator::new(&pass);
        let size = calc
            .array_size("mat4", Some(ArraySize::Constant(u32::MAX)))
            .unwrap();
        assert_eq!(size, u32::MAX);
    }
}
