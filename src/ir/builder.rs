//! Component D: assembles a [`Module`] from an opened [`Container`].
//!
//! Grounded on the teacher library's `schema/assembly.rs` two-pass
//! structure (`read_types` then `read_methods`, each walking a table's rows
//! and slicing the next table by the following row's `_list` index) —
//! trimmed to the eleven materialized table kinds and the single-block
//! method bodies this IR uses in v1 (§3, §4.1).

use crate::error::{CodegenError, CompileError};
use crate::il;
use crate::ir::module::{BasicBlock, Field, Method, Module, Type, TypeClass, ENTRY_BLOCK_LABEL};
use crate::metadata::heaps::read_field_signature_type;
use crate::metadata::tables::{FieldAttributes, TableKind, TypeDefRow};
use crate::metadata::Container;
use crate::types::{CompositeField, TypeResolver};

/// Decodes a `TypeDefOrRef` coded index (tag width 2) back into a
/// `(table, one_based_row)` pair, per ECMA-335 II.24.2.6.
fn decode_type_def_or_ref(value: u32) -> (u8, usize) {
    ((value & 0x3) as u8, (value >> 2) as usize)
}

fn classify_type(container: &Container, row: &TypeDefRow) -> TypeClass {
    if row.extends == 0 {
        return TypeClass::ReferenceType;
    }
    let (tag, row_index) = decode_type_def_or_ref(row.extends);
    if tag != 1 || row_index == 0 {
        return TypeClass::ReferenceType;
    }
    let Some(type_ref) = container.tables.type_ref.get(row_index - 1) else {
        return TypeClass::ReferenceType;
    };
    let name = container.strings.get(type_ref.type_name).unwrap_or("");
    if name == "ValueType" || name == "Enum" {
        TypeClass::ValueType
    } else {
        TypeClass::ReferenceType
    }
}

fn field_range(type_defs: &[TypeDefRow], field_count: usize, index: usize) -> (usize, usize) {
    let start = type_defs[index].field_list as usize;
    let end = type_defs
        .get(index + 1)
        .map(|t| t.field_list as usize)
        .unwrap_or(field_count + 1);
    (start, end)
}

fn method_range(type_defs: &[TypeDefRow], method_count: usize, index: usize) -> (usize, usize) {
    let start = type_defs[index].method_list as usize;
    let end = type_defs
        .get(index + 1)
        .map(|t| t.method_list as usize)
        .unwrap_or(method_count + 1);
    (start, end)
}

pub fn build_module(container: &Container) -> Result<Module, CompileError> {
    let mut module = Module::new();
    let resolver = TypeResolver::new();

    let type_defs = &container.tables.type_def;
    let fields = &container.tables.field;
    let methods = &container.tables.method_def;

    for (index, row) in type_defs.iter().enumerate() {
        let name = container.strings.get(row.type_name)?;
        let namespace = container.strings.get(row.type_namespace)?;
        if name.starts_with('<') {
            continue;
        }
        let full_name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };

        let (field_start, field_end) = field_range(type_defs, fields.len(), index);
        let mut composite_fields = Vec::new();
        for field in &fields[(field_start.saturating_sub(1)).min(fields.len())
            ..(field_end.saturating_sub(1)).min(fields.len())]
        {
            let field_name = container.strings.get(field.name)?;
            let signature = container.blobs.get(field.signature)?;
            let element = read_field_signature_type(signature)?;
            composite_fields.push(CompositeField {
                name: field_name.to_string(),
                element,
                is_instance_field: !field
                    .flags
                    .intersects(FieldAttributes::STATIC | FieldAttributes::LITERAL),
            });
        }

        let layout = resolver
            .layout_composite(&full_name, &composite_fields)
            .map_err(CodegenError::from)?;
        let ir_fields = layout
            .fields
            .into_iter()
            .map(|f| Field {
                name: f.name,
                type_name: format!("{:?}", f.kind),
                offset: f.offset,
            })
            .collect();

        module.types.insert(
            full_name.clone(),
            Type {
                name: name.to_string(),
                full_name,
                size: layout.size,
                fields: ir_fields,
                class: classify_type(container, row),
            },
        );

        let (method_start, method_end) = method_range(type_defs, methods.len(), index);
        let method_slice_start = (method_start.saturating_sub(1)).min(methods.len());
        let method_slice_end = (method_end.saturating_sub(1)).min(methods.len());
        for (offset, method_row) in methods[method_slice_start..method_slice_end].iter().enumerate() {
            // One-based row index within the `MethodDef` table, packed into a
            // metadata token the same way a `call` instruction's operand is.
            let row_index = (method_slice_start + offset + 1) as u32;
            let token = ((TableKind::MethodDef as u32) << 24) | row_index;

            let method_name = container.strings.get(method_row.name)?;
            let method_full_name = format!("{name}::{method_name}");

            let Some(body) = container.method_body(method_row)? else {
                continue;
            };
            let instructions = il::decode(&body);
            let is_entry_point = method_name == "Main";

            let block = BasicBlock {
                label: ENTRY_BLOCK_LABEL.to_string(),
                instructions,
                successors: Vec::new(),
                predecessors: Vec::new(),
            };

            if is_entry_point {
                module.entry_point = Some(method_full_name.clone());
            }

            module.methods.push(Method {
                name: method_name.to_string(),
                full_name: method_full_name,
                is_static: true,
                is_entry_point,
                blocks: vec![block],
                token,
            });
        }
    }

    Ok(module)
}
