// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use rpn_tape::trace::TraceStep;
use std::collections::HashMap;
use std::string::String;

/// Optional label resolver for instruction zones.
///
/// Return `None` to fall back to the bare mnemonic.
pub trait LabelResolver {
    /// Resolve a label for the instruction in `step`.
    fn instr_label(&mut self, _step: &TraceStep<'_>) -> Option<String> {
        None
    }
}

/// Default resolver: zones are labelled by mnemonic only.
#[derive(Default, Debug)]
pub struct DefaultLabelResolver;

impl LabelResolver for DefaultLabelResolver {}

/// Resolver that labels zones with the full overload signature, e.g. `ADD(int32,int8)=>(int32)`.
///
/// Labels are cached per opcode.
#[derive(Default, Debug)]
pub struct SignatureResolver {
    cache: HashMap<u16, String>,
}

impl LabelResolver for SignatureResolver {
    fn instr_label(&mut self, step: &TraceStep<'_>) -> Option<String> {
        if let Some(label) = self.cache.get(&step.pcode) {
            return Some(label.clone());
        }
        let names = |tds: &[rpn_tape::TypeDescriptor]| {
            tds.iter().map(|td| td.name()).collect::<Vec<_>>().join(",")
        };
        let record = step.record;
        let label = format!(
            "{}({})=>({})",
            record.name(),
            names(record.inputs()),
            names(record.outputs())
        );
        self.cache.insert(step.pcode, label.clone());
        Some(label)
    }
}

pub(crate) fn default_instr_label(step: &TraceStep<'_>) -> String {
    step.record.name().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpn_tape::{FunctionRegistry, TypeDescriptor as T};

    #[test]
    fn signature_labels_are_cached_per_opcode() {
        let registry = FunctionRegistry::standard().unwrap();
        let pcode = registry
            .find("ADD", &[T::Int8, T::Int32], &[T::Int32])
            .unwrap();
        let step = TraceStep {
            counter: 1,
            stack_offset: 2,
            code_offset: 0,
            pcode,
            record: registry.record(pcode).unwrap(),
        };
        let mut resolver = SignatureResolver::default();
        assert_eq!(
            resolver.instr_label(&step).as_deref(),
            Some("ADD(int8,int32)=>(int32)")
        );
        assert_eq!(resolver.cache.len(), 1);
        assert_eq!(default_instr_label(&step), "ADD");
        assert_eq!(DefaultLabelResolver.instr_label(&step), None);
    }
}
