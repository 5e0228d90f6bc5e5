//! Type Resolver (component E): sizes and field layouts for managed types
//! on a 16-bit-address, no-alignment target.
//!
//! Grounded on the teacher library's `schema/type.rs` (`PrimitiveType`,
//! size table), trimmed of the generics/interface-resolution machinery that
//! library needs and this one-pass compiler doesn't: fields of class or
//! value-type kind aren't resolved into their own nested layout here, they
//! collapse to pointer width, matching how the target's stack-machine
//! lowering (§4.5.4) already treats every non-primitive operand as a 16-bit
//! reference.

use crate::error::TypeError;
use crate::metadata::heaps::FieldElementType;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    IntPtr,
    UIntPtr,
    String,
}

impl PrimitiveType {
    /// Fixed sizes per §4.3. `IntPtr`/`UIntPtr` collapse to 16 bits on this
    /// 16-bit-address target; `String` is a managed reference, also 16 bits.
    pub fn size(self) -> u16 {
        use PrimitiveType::*;
        match self {
            Boolean | SByte | Byte => 1,
            Char | Int16 | UInt16 | IntPtr | UIntPtr | String => 2,
            Int32 | UInt32 | Single => 4,
            Int64 | UInt64 | Double => 8,
        }
    }

    pub fn is_floating_point(self) -> bool {
        matches!(self, PrimitiveType::Single | PrimitiveType::Double)
    }
}

impl From<&FieldElementType> for FieldKind {
    fn from(value: &FieldElementType) -> Self {
        match value {
            FieldElementType::Boolean => FieldKind::Primitive(PrimitiveType::Boolean),
            FieldElementType::Char => FieldKind::Primitive(PrimitiveType::Char),
            FieldElementType::I1 => FieldKind::Primitive(PrimitiveType::SByte),
            FieldElementType::U1 => FieldKind::Primitive(PrimitiveType::Byte),
            FieldElementType::I2 => FieldKind::Primitive(PrimitiveType::Int16),
            FieldElementType::U2 => FieldKind::Primitive(PrimitiveType::UInt16),
            FieldElementType::I4 => FieldKind::Primitive(PrimitiveType::Int32),
            FieldElementType::U4 => FieldKind::Primitive(PrimitiveType::UInt32),
            FieldElementType::I8 => FieldKind::Primitive(PrimitiveType::Int64),
            FieldElementType::U8 => FieldKind::Primitive(PrimitiveType::UInt64),
            FieldElementType::R4 => FieldKind::Primitive(PrimitiveType::Single),
            FieldElementType::R8 => FieldKind::Primitive(PrimitiveType::Double),
            FieldElementType::IntPtr => FieldKind::Primitive(PrimitiveType::IntPtr),
            FieldElementType::UIntPtr => FieldKind::Primitive(PrimitiveType::UIntPtr),
            FieldElementType::String => FieldKind::Primitive(PrimitiveType::String),
            FieldElementType::SzArray(element) => FieldKind::Array {
                element_size: resolve_element_size(element),
            },
            FieldElementType::Class => FieldKind::Reference,
        }
    }
}

fn resolve_element_size(element: &FieldElementType) -> u16 {
    match FieldKind::from(element) {
        FieldKind::Primitive(p) => p.size(),
        FieldKind::Array { .. } | FieldKind::Reference => 2,
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    Array { element_size: u16 },
    /// A class or value-type field. Both collapse to a 2-byte reference —
    /// this compiler never inlines nested value-type storage.
    Reference,
}

impl FieldKind {
    pub fn size(&self) -> u16 {
        match self {
            FieldKind::Primitive(p) => p.size(),
            FieldKind::Array { .. } | FieldKind::Reference => 2,
        }
    }
}

/// One non-skipped field of a composite type, as seen by the resolver.
#[derive(Debug, Clone)]
pub struct CompositeField {
    pub name: String,
    pub element: FieldElementType,
    /// `Literal` or `Static` fields are skipped from instance layout (§4.3).
    pub is_instance_field: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub name: String,
    pub kind: FieldKind,
    pub offset: u16,
}

#[derive(Debug, Clone)]
pub struct CompositeLayout {
    pub size: u16,
    pub fields: Vec<ResolvedField>,
}

/// Memoizes composite sizes by type name so recursive field references (a
/// type holding a reference to itself) don't re-walk the same layout twice.
/// Per §5, this cache is owned by one compilation and discarded with it.
pub struct TypeResolver {
    cache: RefCell<HashMap<String, u16>>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn primitive_size(&self, primitive: PrimitiveType) -> u16 {
        primitive.size()
    }

    /// Packs `fields` in declaration order with no padding (alignment = 1).
    /// A composite with no non-constant fields has size 1.
    pub fn layout_composite(
        &self,
        type_name: &str,
        fields: &[CompositeField],
    ) -> Result<CompositeLayout, TypeError> {
        let mut offset: u16 = 0;
        let mut resolved = Vec::new();

        for field in fields.iter().filter(|f| f.is_instance_field) {
            let kind = FieldKind::from(&field.element);
            if let FieldKind::Primitive(p) = kind {
                if p.is_floating_point() {
                    return Err(TypeError::Unsupported(format!("{type_name}.{}", field.name)));
                }
            }
            let size = kind.size();
            resolved.push(ResolvedField {
                name: field.name.clone(),
                kind,
                offset,
            });
            offset = offset
                .checked_add(size)
                .ok_or_else(|| TypeError::BadLayout(type_name.to_string()))?;
        }

        let size = offset.max(1);
        self.cache.borrow_mut().insert(type_name.to_string(), size);
        Ok(CompositeLayout {
            size,
            fields: resolved,
        })
    }

    pub fn cached_size(&self, type_name: &str) -> Option<u16> {
        self.cache.borrow().get(type_name).copied()
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_composite_has_size_one() {
        let resolver = TypeResolver::new();
        let layout = resolver.layout_composite("Empty", &[]).unwrap();
        assert_eq!(layout.size, 1);
        assert!(layout.fields.is_empty());
    }

    #[test]
    fn literal_fields_are_skipped_and_dont_affect_offsets() {
        let resolver = TypeResolver::new();
        let fields = vec![
            CompositeField {
                name: "CONST".to_string(),
                element: FieldElementType::I4,
                is_instance_field: false,
            },
            CompositeField {
                name: "x".to_string(),
                element: FieldElementType::I2,
                is_instance_field: true,
            },
            CompositeField {
                name: "y".to_string(),
                element: FieldElementType::U1,
                is_instance_field: true,
            },
        ];
        let layout = resolver.layout_composite("Point", &fields).unwrap();
        assert_eq!(layout.size, 3);
        assert_eq!(layout.fields[0].offset, 0);
        assert_eq!(layout.fields[1].offset, 2);
    }

    #[test]
    fn floating_point_fields_are_unsupported() {
        let resolver = TypeResolver::new();
        let fields = vec![CompositeField {
            name: "f".to_string(),
            element: FieldElementType::R8,
            is_instance_field: true,
        }];
        assert!(matches!(
            resolver.layout_composite("Has", &fields),
            Err(TypeError::Unsupported(_))
        ));
    }
}
