//! Type representation for the Lark IR.
//!
//! After the front-end finishes, every type is a fully-resolved
//! [`IrType`]: a classifier (class or type parameter) plus nullability
//! and type arguments. There are no inference variables at this stage.

use crate::builtins;
use crate::decl::{ClassId, Module, TypeParamId};

/// What a type refers to: a class or an in-scope type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassifierRef {
    Class(ClassId),
    TypeParam(TypeParamId),
}

/// A resolved IR type.
#[derive(Clone, Debug, PartialEq)]
pub struct IrType {
    pub classifier: ClassifierRef,
    pub nullable: bool,
    pub arguments: Vec<IrType>,
}

impl IrType {
    /// A non-nullable class type with no type arguments.
    pub fn class_of(class: ClassId) -> IrType {
        IrType {
            classifier: ClassifierRef::Class(class),
            nullable: false,
            arguments: Vec::new(),
        }
    }

    /// A nullable class type with no type arguments.
    pub fn nullable_class_of(class: ClassId) -> IrType {
        IrType {
            classifier: ClassifierRef::Class(class),
            nullable: true,
            arguments: Vec::new(),
        }
    }

    /// A reference to an in-scope type parameter.
    pub fn type_param(param: TypeParamId) -> IrType {
        IrType {
            classifier: ClassifierRef::TypeParam(param),
            nullable: false,
            arguments: Vec::new(),
        }
    }

    /// Attach type arguments.
    pub fn with_arguments(mut self, arguments: Vec<IrType>) -> IrType {
        self.arguments = arguments;
        self
    }

    /// The classifier as a class, if it is one.
    pub fn class(&self) -> Option<ClassId> {
        match self.classifier {
            ClassifierRef::Class(class) => Some(class),
            ClassifierRef::TypeParam(_) => None,
        }
    }

    fn class_fq_name<'m>(&self, module: &'m Module) -> Option<&'m str> {
        self.class().map(|c| module.class(c).fq_name.as_str())
    }

    /// Whether this is a non-nullable primitive value type.
    pub fn is_primitive(&self, module: &Module) -> bool {
        !self.nullable
            && self
                .class_fq_name(module)
                .is_some_and(|fq| builtins::PRIMITIVES.contains(&fq))
    }

    /// Whether this is the text type, nullable or not.
    pub fn is_string(&self, module: &Module) -> bool {
        self.class_fq_name(module) == Some(builtins::STRING)
    }

    /// Whether this is the non-nullable universal base type.
    pub fn is_any(&self, module: &Module) -> bool {
        !self.nullable && self.class_fq_name(module) == Some(builtins::ANY)
    }

    /// The class behind an unsigned wrapped-primitive type, if this is one.
    pub fn unsigned_class(&self, module: &Module) -> Option<ClassId> {
        let class = self.class()?;
        if builtins::UNSIGNED.contains(&module.class(class).fq_name.as_str()) {
            Some(class)
        } else {
            None
        }
    }
}
