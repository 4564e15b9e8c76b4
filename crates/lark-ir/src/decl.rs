//! Declaration arena for the Lark IR.
//!
//! All declarations of a compilation unit live in one [`Module`], addressed
//! by copyable typed ids. Expressions refer to declarations by id, which
//! makes reference identity a plain id comparison and keeps the expression
//! tree free of back-pointers.
//!
//! Ids are only meaningful for the module that issued them; indexing with
//! an id from another module is a programming error.

use crate::expr::{Body, Expr, Statement};
use crate::types::IrType;

/// Identifies a function (or constructor) in the [`Module`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// Identifies a class, interface, singleton object, or enum class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// Identifies a property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyId(pub u32);

/// Identifies a field (a property's backing storage or a foreign static).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(pub u32);

/// Identifies a local variable or value parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableId(pub u32);

/// Identifies an enum entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumEntryId(pub u32);

/// Identifies a type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamId(pub u32);

/// Identifies an anonymous initializer block of a class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InitializerId(pub u32);

/// Identifies a loop expression. Break and continue name their target loop
/// through this id; the front-end issues one per loop node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoopId(pub u32);

/// The declaration that structurally contains another declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclRef {
    Function(FunctionId),
    Class(ClassId),
    /// Top level of a source file.
    File,
}

/// A member slot in a class body, in declaration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberDecl {
    Function(FunctionId),
    Property(PropertyId),
    Field(FieldId),
    EnumEntry(EnumEntryId),
    Initializer(InitializerId),
}

/// Distinguishes plain functions from constructors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Simple,
    Constructor { is_primary: bool },
}

/// Where a declaration came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclOrigin {
    /// Written in Lark source.
    Defined,
    /// Synthesized backing storage for a property.
    PropertyBackingField,
    /// Stub for a foreign platform declaration.
    ForeignStub,
}

/// A function or constructor declaration.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub fq_name: String,
    pub kind: FunctionKind,
    pub parent: DeclRef,
    pub value_params: Vec<VariableId>,
    pub has_dispatch_receiver: bool,
    pub has_extension_receiver: bool,
    /// Set when this function is a property accessor.
    pub corresponding_property: Option<PropertyId>,
    pub return_type: IrType,
    pub body: Option<Body>,
}

/// The flavor of a class declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    /// A singleton object.
    Object,
    Enum,
}

/// A class-like declaration with its members in declaration order.
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub fq_name: String,
    pub kind: ClassKind,
    /// Wrapped-primitive (inline) class: wraps exactly one value and is
    /// represented without allocation where erasure allows.
    pub is_inline: bool,
    pub parent: DeclRef,
    pub declarations: Vec<MemberDecl>,
}

/// A property declaration. Accessors and backing storage are separate
/// declarations linked by id.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub parent: DeclRef,
    pub is_const: bool,
    pub getter: Option<FunctionId>,
    pub setter: Option<FunctionId>,
    pub backing_field: Option<FieldId>,
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub fq_name: String,
    pub ty: IrType,
    pub parent: DeclRef,
    pub origin: DeclOrigin,
    pub is_static: bool,
    pub is_final: bool,
    pub corresponding_property: Option<PropertyId>,
    pub initializer: Option<Expr>,
}

/// A local variable or value parameter.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    /// The declaration whose body introduces this variable.
    pub parent: DeclRef,
}

/// One entry of an enum class.
#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub name: String,
    pub parent: ClassId,
    /// The enum-constructor call that initializes this entry.
    pub initializer: Option<Expr>,
}

/// A type parameter of a function or class.
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: String,
    pub parent: DeclRef,
}

/// An anonymous initializer block in a class body.
#[derive(Debug, Clone)]
pub struct AnonymousInitializer {
    pub is_static: bool,
    pub body: Vec<Statement>,
}

/// The declaration arena for one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub properties: Vec<Property>,
    pub fields: Vec<Field>,
    pub variables: Vec<Variable>,
    pub enum_entries: Vec<EnumEntry>,
    pub type_params: Vec<TypeParam>,
    pub initializers: Vec<AnonymousInitializer>,
}

impl Module {
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.0 as usize]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0 as usize]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    pub fn enum_entry(&self, id: EnumEntryId) -> &EnumEntry {
        &self.enum_entries[id.0 as usize]
    }

    pub fn type_param(&self, id: TypeParamId) -> &TypeParam {
        &self.type_params[id.0 as usize]
    }

    pub fn initializer(&self, id: InitializerId) -> &AnonymousInitializer {
        &self.initializers[id.0 as usize]
    }

    // ── Construction (front-end and tests) ───────────────────────────

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        self.functions.push(function);
        FunctionId(self.functions.len() as u32 - 1)
    }

    pub fn add_class(&mut self, class: Class) -> ClassId {
        self.classes.push(class);
        ClassId(self.classes.len() as u32 - 1)
    }

    pub fn add_property(&mut self, property: Property) -> PropertyId {
        self.properties.push(property);
        PropertyId(self.properties.len() as u32 - 1)
    }

    pub fn add_field(&mut self, field: Field) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() as u32 - 1)
    }

    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        self.variables.push(variable);
        VariableId(self.variables.len() as u32 - 1)
    }

    pub fn add_enum_entry(&mut self, entry: EnumEntry) -> EnumEntryId {
        self.enum_entries.push(entry);
        EnumEntryId(self.enum_entries.len() as u32 - 1)
    }

    pub fn add_type_param(&mut self, param: TypeParam) -> TypeParamId {
        self.type_params.push(param);
        TypeParamId(self.type_params.len() as u32 - 1)
    }

    pub fn add_initializer(&mut self, init: AnonymousInitializer) -> InitializerId {
        self.initializers.push(init);
        InitializerId(self.initializers.len() as u32 - 1)
    }

    // ── Member queries ───────────────────────────────────────────────

    /// Member functions of a class, in declaration order.
    pub fn member_functions(&self, class: ClassId) -> impl Iterator<Item = FunctionId> + '_ {
        self.class(class).declarations.iter().filter_map(|m| match m {
            MemberDecl::Function(f) => Some(*f),
            _ => None,
        })
    }

    /// Member properties of a class, in declaration order.
    pub fn member_properties(&self, class: ClassId) -> impl Iterator<Item = PropertyId> + '_ {
        self.class(class).declarations.iter().filter_map(|m| match m {
            MemberDecl::Property(p) => Some(*p),
            _ => None,
        })
    }

    /// Member fields of a class, in declaration order.
    pub fn member_fields(&self, class: ClassId) -> impl Iterator<Item = FieldId> + '_ {
        self.class(class).declarations.iter().filter_map(|m| match m {
            MemberDecl::Field(f) => Some(*f),
            _ => None,
        })
    }

    /// Anonymous initializer blocks of a class, in declaration order.
    pub fn anonymous_initializers(&self, class: ClassId) -> impl Iterator<Item = InitializerId> + '_ {
        self.class(class).declarations.iter().filter_map(|m| match m {
            MemberDecl::Initializer(i) => Some(*i),
            _ => None,
        })
    }

    /// Constructors of a class, in declaration order.
    pub fn constructors(&self, class: ClassId) -> impl Iterator<Item = FunctionId> + '_ {
        self.member_functions(class)
            .filter(|f| matches!(self.function(*f).kind, FunctionKind::Constructor { .. }))
    }

    /// Primary constructors of a class. Well-formed IR has exactly one for
    /// a concrete class; callers that require uniqueness must check.
    pub fn primary_constructors(&self, class: ClassId) -> impl Iterator<Item = FunctionId> + '_ {
        self.member_functions(class).filter(|f| {
            matches!(
                self.function(*f).kind,
                FunctionKind::Constructor { is_primary: true }
            )
        })
    }

    /// The single backing field of a wrapped-primitive class, if the class
    /// declares exactly one field.
    pub fn inline_class_backing_field(&self, class: ClassId) -> Option<FieldId> {
        let mut fields = self.member_fields(class);
        let field = fields.next()?;
        if fields.next().is_some() {
            return None;
        }
        Some(field)
    }
}
